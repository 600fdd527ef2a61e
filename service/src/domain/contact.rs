//! Contact details shared by vendors, work orders and payments.

use std::{str::FromStr, sync::LazyLock};

use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;

/// Full name of a person.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PersonName(String);

impl PersonName {
    /// Creates a new [`PersonName`] out of the provided trimmed `name`.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.len() <= 256)
            .then(|| Self(name.to_owned()))
    }
}

impl FromStr for PersonName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `PersonName`")
    }
}

/// E-mail address.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the provided trimmed `address` is valid.
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Option<Self> {
        /// Loose `local@domain.tld` shape, without whitespace.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
        });

        let address = address.as_ref().trim();
        (address.len() <= 320 && REGEX.is_match(address))
            .then(|| Self(address.to_owned()))
    }

    /// Indicates whether this [`Email`] names the same mailbox as the
    /// `other` one, ignoring the letter case.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the provided trimmed `number` is valid.
    #[must_use]
    pub fn new(number: impl AsRef<str>) -> Option<Self> {
        /// Optional `+`, then digits with common separators.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?\d[\d\s().-]{5,24}$").expect("valid regex")
        });

        let number = number.as_ref().trim();
        REGEX.is_match(number).then(|| Self(number.to_owned()))
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

#[cfg(test)]
mod spec {
    use super::{Email, Phone, PersonName};

    #[test]
    fn validates_email() {
        assert_eq!(
            AsRef::<str>::as_ref(&Email::new(" vendor@example.co.id ").unwrap()),
            "vendor@example.co.id",
        );
        assert!(Email::new("vendor@localhost").is_none());
        assert!(Email::new("vendor example@mail.com").is_none());
        assert!(Email::new("").is_none());
    }

    #[test]
    fn compares_email_case_insensitively() {
        let a = Email::new("Vendor@Example.com").unwrap();
        let b = Email::new("vendor@example.com").unwrap();

        assert!(a.is_same(&b));
    }

    #[test]
    fn validates_phone() {
        assert!(Phone::new("+62 812-3456-7890").is_some());
        assert!(Phone::new("(021) 555 0123").is_none());
        assert!(Phone::new("021 555 0123").is_some());
        assert!(Phone::new("call me").is_none());
    }

    #[test]
    fn trims_person_name() {
        assert_eq!(
            AsRef::<str>::as_ref(&PersonName::new("  Admin User ").unwrap()),
            "Admin User",
        );
        assert!(PersonName::new("   ").is_none());
    }
}
