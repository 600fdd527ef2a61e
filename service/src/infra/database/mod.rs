//! [`Database`]-related implementations.

#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the uniqueness constraint over work order numbers.
pub const WORK_ORDER_NUMBER_CONSTRAINT: &str = "work_orders_number_key";

/// [`Database`] error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    /// Write rejected by the named uniqueness constraint.
    #[display("Uniqueness constraint `{_0}` violated")]
    UniqueViolation(#[error(not(source))] String),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the provided
    /// uniqueness constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(c) if c == constraint)
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for Error {
    /// Recognizes uniqueness violations, so callers may retry them without
    /// knowing the [`Database`] implementation.
    fn from(e: postgres::Error) -> Self {
        match e.violated_unique_constraint() {
            Some(constraint) => Self::UniqueViolation(constraint.to_owned()),
            None => Self::Postgres(e),
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{Error, WORK_ORDER_NUMBER_CONSTRAINT};

    #[test]
    fn matches_violated_constraint_by_name() {
        let err = Error::UniqueViolation(WORK_ORDER_NUMBER_CONSTRAINT.into());

        assert!(err.is_unique_violation("work_orders_number_key"));
        assert!(!err.is_unique_violation("payments_term_order_key"));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn keeps_other_postgres_errors() {
        let err = Error::from(super::postgres::Error::TxFinished);

        assert!(matches!(err, Error::Postgres(_)));
        assert!(!err.is_unique_violation(WORK_ORDER_NUMBER_CONSTRAINT));
    }
}
