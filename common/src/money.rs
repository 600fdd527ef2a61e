//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Returns a human-readable representation of this [`Money`], like
    /// `IDR 100,000,000` or `USD 1,234.50`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let decimals = self.currency.decimals();
        let rounded = self
            .amount
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{:.*}", decimals as usize, rounded.abs());

        let (int, frac) = text.split_once('.').unwrap_or((&text, ""));
        let mut grouped = String::with_capacity(int.len() + int.len() / 3);
        for (i, c) in int.chars().enumerate() {
            if i > 0 && (int.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        if frac.is_empty() {
            format!("{} {sign}{grouped}", self.currency)
        } else {
            format!("{} {sign}{grouped}.{frac}", self.currency)
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{}{currency}", amount.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Indonesian Rupiah."]
        Idr = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Singapore Dollar."]
        Sgd = 3,

        #[doc = "Euro."]
        Eur = 4,

        #[doc = "Malaysian Ringgit."]
        Myr = 5,
    }
}

impl Currency {
    /// Number of fractional digits this [`Currency`] is displayed with.
    #[must_use]
    pub const fn decimals(self) -> u32 {
        match self {
            Self::Idr => 0,
            Self::Usd | Self::Sgd | Self::Eur | Self::Myr => 2,
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn money(amount: &str, currency: Currency) -> Money {
        Money {
            amount: amount.parse::<Decimal>().unwrap(),
            currency,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("100000000IDR").unwrap(),
            money("100000000", Currency::Idr),
        );
        assert_eq!(
            Money::from_str("123.45SGD").unwrap(),
            money("123.45", Currency::Sgd),
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45RUB").is_err());
        assert!(Money::from_str("12,5IDR").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45", Currency::Usd).to_string(), "123.45USD");
        assert_eq!(money("123.00", Currency::Eur).to_string(), "123EUR");
        assert_eq!(money("1000000", Currency::Idr).to_string(), "1000000IDR");
    }

    #[test]
    fn formats_with_currency_precision() {
        assert_eq!(
            money("100000000", Currency::Idr).formatted(),
            "IDR 100,000,000",
        );
        assert_eq!(money("999.6", Currency::Idr).formatted(), "IDR 1,000");
        assert_eq!(money("1234.5", Currency::Usd).formatted(), "USD 1,234.50");
        assert_eq!(money("12", Currency::Myr).formatted(), "MYR 12.00");
        assert_eq!(money("-1500", Currency::Eur).formatted(), "EUR -1,500.00");
    }
}
