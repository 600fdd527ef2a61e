//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Percentage in the `[0, 100]` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// The whole, `100%`.
    pub const FULL: Self = Self(Decimal::ONE_HUNDRED);

    /// Creates a new [`Percent`] by checking the provided value is
    /// in the `[0, 100]` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Creates a new [`Percent`] clamping the provided value into the
    /// `[0, 100]` range.
    #[must_use]
    pub fn saturating(val: Decimal) -> Self {
        Self(val.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    /// Returns the numeric value of this [`Percent`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Applies this [`Percent`] to the provided amount.
    ///
    /// [`None`] is returned if the result doesn't fit into a [`Decimal`].
    #[must_use]
    pub fn of(self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.0)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .or_else(|| {
                amount
                    .checked_div(Decimal::ONE_HUNDRED)?
                    .checked_mul(self.0)
            })
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Percentage in the `[0, 100]` range, as a decimal string.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(m: &Percent) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn saturates_out_of_range() {
        assert_eq!(Percent::saturating(decimal("-5")).value(), Decimal::ZERO);
        assert_eq!(Percent::saturating(decimal("120")), Percent::FULL);
        assert_eq!(Percent::saturating(decimal("33.5")).value(), decimal("33.5"));
    }

    #[test]
    fn applies_to_amount() {
        let p = Percent::from_str("30").unwrap();

        assert_eq!(p.of(decimal("100000000")), Some(decimal("30000000")));
        assert_eq!(Percent::FULL.of(decimal("12.34")), Some(decimal("12.34")));
        assert_eq!(
            Percent::from_str("12.5").unwrap().of(decimal("80")),
            Some(decimal("10")),
        );
    }

    #[test]
    fn applies_to_huge_amounts() {
        let huge = decimal("10000000000000000000000000000");

        assert_eq!(Percent::FULL.of(huge), Some(huge));
        assert!(Percent::from_str("50").unwrap().of(Decimal::MAX).is_some());
    }

    #[test]
    fn rejects_out_of_range_strings() {
        assert!(Percent::from_str("100.01").is_err());
        assert!(Percent::from_str("-0.1").is_err());
        assert!(Percent::from_str("abc").is_err());
        assert!(Percent::from_str("0").is_ok());
    }
}
