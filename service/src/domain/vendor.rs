//! [`Vendor`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::contact::{Email, Phone};
#[cfg(doc)]
use crate::domain::WorkOrder;

/// Contractor a [`WorkOrder`] is issued to.
///
/// Identified by its [`Email`]. The [`AccessToken`] gates the read-only
/// vendor portal.
#[derive(Clone, Debug)]
pub struct Vendor {
    /// ID of this [`Vendor`].
    pub id: Id,

    /// [`Name`] of this [`Vendor`].
    pub name: Name,

    /// [`Email`] of this [`Vendor`].
    pub email: Option<Email>,

    /// [`Phone`] of this [`Vendor`].
    pub phone: Option<Phone>,

    /// [`AccessToken`] of this [`Vendor`] to the vendor portal.
    pub access_token: Option<AccessToken>,

    /// [`DateTime`] when this [`Vendor`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Vendor`].
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, FromStr, Hash, Into, PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of a [`Vendor`], like a company name.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] out of the provided trimmed `name`.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.len() <= 256)
            .then(|| Self(name.to_owned()))
    }
}

impl std::str::FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `vendor::Name`")
    }
}

/// Opaque token granting a [`Vendor`] access to the vendor portal.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct AccessToken(String);

impl AccessToken {
    /// Generates a new random [`AccessToken`].
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wraps the provided `token` as it was received from a client.
    ///
    /// [`None`] is returned if it's blank.
    #[must_use]
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let token = token.as_ref().trim();
        (!token.is_empty() && token.len() <= 128)
            .then(|| Self(token.to_owned()))
    }
}

impl std::str::FromStr for AccessToken {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `AccessToken`")
    }
}

/// [`DateTime`] when a [`Vendor`] was created.
pub type CreationDateTime = DateTimeOf<(Vendor, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::AccessToken;

    #[test]
    fn generates_distinct_tokens() {
        let a = AccessToken::generate();
        let b = AccessToken::generate();

        assert_ne!(a, b);
        assert_eq!(a.as_ref().len(), 32);
        assert!(a.as_ref().bytes().all(|c| c.is_ascii_hexdigit()));
    }
}
