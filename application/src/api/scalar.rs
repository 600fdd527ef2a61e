//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use derive_more::{AsRef, Display, From, Into};
use juniper::{
    GraphQLScalar, GraphQLType, InputValue, ParseScalarResult,
    ParseScalarValue, ScalarToken, ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Represents the target type as a GraphQL string scalar, going through the
/// [`FromStr`]/[`Display`] impls of the `As` type, which the target type
/// wraps via [`TryFrom`] and [`AsRef`].
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into a string scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from a string scalar [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the input is not a string, or it's rejected by `As` parsing or by
    /// the target type conversion.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("<unnamed>");
        let s = input.as_string_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{name}`: expected string input \
                 value, found: {input}",
            )
        })?;
        s.parse::<As>()
            .map_err(|e| {
                format!("Cannot parse input scalar `{name}` from \"{s}\": {e}")
            })?
            .try_into()
            .map_err(|e| format!("Cannot parse input scalar `{name}`: {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Exact decimal number, passed as a string like `"1500000.50"` to avoid
/// floating point rounding.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = Via::<rust_decimal::Decimal>)]
pub struct Decimal(rust_decimal::Decimal);

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};
    use rust_decimal::Decimal as Inner;

    use super::{Decimal, Via};

    #[test]
    fn parses_decimal_from_string() {
        let input = InputValue::<DefaultScalarValue>::scalar("1500000.50");

        let parsed: Decimal =
            Via::<Inner>::from_input(&input).expect("valid decimal");

        assert_eq!(Inner::from(parsed), "1500000.5".parse::<Inner>().unwrap());
    }

    #[test]
    fn rejects_non_string_decimal() {
        let input = InputValue::<DefaultScalarValue>::scalar(15);

        let err = Via::<Inner>::from_input::<Decimal, _>(&input).unwrap_err();

        assert!(err.contains("expected string"), "{err}");
    }
}
