//! [`Error`]-related definitions.

use std::{convert::Infallible, fmt};

use derive_more::Error as StdError;
use itertools::Itertools as _;
use juniper::IntoFieldError;
use service::{domain::payment::term, infra::database};
use tracerr::{Trace, Traced};

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// GraphQL API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let mut ext = juniper::Object::with_capacity(1);
        drop(
            ext.add_field("code", juniper::Value::scalar(self.code.to_owned())),
        );
        drop(
            ext.add_field(
                "backtrace",
                juniper::Value::list(
                    self.backtrace
                        .iter()
                        .flat_map(|trace| trace.iter())
                        .map(|frame| juniper::Value::scalar(frame.to_string()))
                        .collect(),
                ),
            ),
        );
        juniper::FieldError::new(self.message, juniper::Value::object(ext))
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for Infallible {
    fn try_as_error(&self) -> Option<Error> {
        match *self {}
    }
}

impl AsError for term::Invalid {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::EmptyTermSet => "PAYMENT_TERMS_EMPTY",
            Self::EmptyName { .. } => "PAYMENT_TERM_NAME_EMPTY",
            Self::NameTooLong { .. } => "PAYMENT_TERM_NAME_TOO_LONG",
            Self::ZeroOrder { .. } => "PAYMENT_TERM_ORDER_ZERO",
            Self::OrderOutOfRange { .. } => "PAYMENT_TERM_ORDER_OUT_OF_RANGE",
            Self::DuplicateOrder { .. } => "PAYMENT_TERM_ORDER_DUPLICATED",
            Self::NegativeAmount { .. } => "PAYMENT_TERM_AMOUNT_NEGATIVE",
            Self::AmountOverflow => "PAYMENT_TERMS_AMOUNT_OVERFLOW",
            Self::PercentageTotalMismatch { .. } => {
                "PAYMENT_TERMS_PERCENTAGE_MISMATCH"
            }
            Self::TotalMismatch { .. } => "PAYMENT_TERMS_TOTAL_MISMATCH",
        };
        Some(Error {
            code,
            status_code: http::StatusCode::BAD_REQUEST,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;
    use service::domain::payment::term;

    use super::AsError as _;

    #[test]
    fn reports_payment_terms_mismatch_as_bad_request() {
        let err = term::Invalid::TotalMismatch {
            total: Decimal::ONE_HUNDRED,
            expected: Decimal::TEN,
        }
        .as_error();

        assert_eq!(err.code, "PAYMENT_TERMS_TOTAL_MISMATCH");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Payment terms sum up to 100, expected 10");
    }

    #[test]
    fn hides_database_errors() {
        let err = service::infra::database::Error::UniqueViolation(
            "work_orders_number_key".into(),
        )
        .as_error();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
    }
}
