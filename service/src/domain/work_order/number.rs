//! [`Number`] allocation.

use std::str::FromStr;

use common::Date;
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::WorkOrder;

/// Document number of a [`WorkOrder`], like `ELX/SPK/20260121/003`.
///
/// Immutable once assigned.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Allocates the next [`Number`] for the provided `today` date.
    ///
    /// `existing` are the numbers already issued for the same [`DateSegment`].
    /// They are trusted to belong to it: the sequence is one past the
    /// greatest numeric suffix among them, or `1` when none parses.
    /// Entries with a non-numeric suffix are skipped.
    #[must_use]
    pub fn allocate<I>(prefix: &Prefix, today: Date, existing: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let segment = DateSegment::new(prefix, today);
        let next = existing
            .into_iter()
            .filter_map(|n| suffix(n.as_ref()))
            .max()
            .map_or(1, |max| max.saturating_add(1));

        Self(format!("{segment}{next:03}"))
    }

    /// Returns the sequence suffix of this [`Number`], if it has a numeric
    /// one.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        suffix(&self.0)
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, _) = s.rsplit_once('/').ok_or("invalid `Number`")?;
        if head.is_empty() || suffix(s).is_none() {
            return Err("invalid `Number`");
        }
        Ok(Self(s.to_owned()))
    }
}

/// Extracts the numeric suffix (the segment after the last `/`).
fn suffix(number: &str) -> Option<u64> {
    let last = number.rsplit('/').next()?;
    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    last.parse().ok()
}

/// Configurable leading part of every [`Number`], like `ELX/SPK`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct Prefix(String);

impl Prefix {
    /// Creates a new [`Prefix`] if the provided `prefix` is valid.
    ///
    /// A valid [`Prefix`] is non-empty, has no whitespace and doesn't start
    /// or end with a `/`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Option<Self> {
        let prefix = prefix.into();
        let valid = !prefix.is_empty()
            && !prefix.starts_with('/')
            && !prefix.ends_with('/')
            && !prefix.chars().any(char::is_whitespace);
        valid.then_some(Self(prefix))
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Self("ELX/SPK".into())
    }
}

impl FromStr for Prefix {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Prefix`")
    }
}

/// Part of a [`Number`] identifying its issue date: `{prefix}/{YYYYMMDD}/`.
///
/// Every [`Number`] issued on the same date starts with it.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
pub struct DateSegment(String);

impl DateSegment {
    /// Creates a new [`DateSegment`] out of the provided [`Prefix`] and
    /// [`Date`].
    #[must_use]
    pub fn new(prefix: &Prefix, date: Date) -> Self {
        Self(format!("{prefix}/{}/", date.compact()))
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use super::{DateSegment, Number, Prefix};

    fn today() -> Date {
        Date::from_ymd(2026, 1, 21).unwrap()
    }

    fn allocate(existing: &[&str]) -> String {
        Number::allocate(&Prefix::default(), today(), existing).to_string()
    }

    #[test]
    fn is_deterministic() {
        let existing = ["ELX/SPK/20260121/004", "ELX/SPK/20260121/002"];

        assert_eq!(allocate(&existing), allocate(&existing));
        assert_eq!(allocate(&existing), "ELX/SPK/20260121/005");
    }

    #[test]
    fn continues_after_greatest_suffix() {
        assert_eq!(
            allocate(&[
                "ELX/SPK/20260121/001",
                "ELX/SPK/20260121/005",
                "ELX/SPK/20260121/002",
            ]),
            "ELX/SPK/20260121/006",
        );
    }

    #[test]
    fn skips_malformed_suffixes() {
        assert_eq!(
            allocate(&["ELX/SPK/20260121/001", "ELX/SPK/20260121/abc"]),
            "ELX/SPK/20260121/002",
        );
        assert_eq!(
            allocate(&["ELX/SPK/20260121/", "ELX/SPK/20260121/7x", "garbage"]),
            "ELX/SPK/20260121/001",
        );
    }

    #[test]
    fn starts_at_one() {
        assert_eq!(allocate(&[]), "ELX/SPK/20260121/001");
    }

    #[test]
    fn pads_to_three_digits_only() {
        assert_eq!(allocate(&["ELX/SPK/20260121/006"]), "ELX/SPK/20260121/007");
        assert_eq!(allocate(&["ELX/SPK/20260121/999"]), "ELX/SPK/20260121/1000");
        assert_eq!(
            allocate(&["ELX/SPK/20260121/1000"]),
            "ELX/SPK/20260121/1001",
        );
    }

    #[test]
    fn uses_configured_prefix() {
        let prefix = Prefix::new("ACME/WO").unwrap();
        let segment = DateSegment::new(&prefix, today());

        assert_eq!(segment.as_ref(), "ACME/WO/20260121/");
        assert_eq!(
            Number::allocate(&prefix, today(), ["ACME/WO/20260121/041"])
                .to_string(),
            "ACME/WO/20260121/042",
        );
    }

    #[test]
    fn rejects_invalid_prefix() {
        assert!(Prefix::new("").is_none());
        assert!(Prefix::new("ELX/SPK/").is_none());
        assert!(Prefix::new("ELX SPK").is_none());
    }

    #[test]
    fn exposes_sequence() {
        let n = Number::allocate(&Prefix::default(), today(), ["x/041"]);

        assert_eq!(n.sequence(), Some(42));
        assert_eq!(
            "ELX/SPK/20260121/003".parse::<Number>().unwrap().sequence(),
            Some(3),
        );
        assert!("003".parse::<Number>().is_err());
        assert!("ELX/SPK/20260121/abc".parse::<Number>().is_err());
    }
}
