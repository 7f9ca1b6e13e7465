//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

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
    /// Number of decimal places every computed [`Money`] is rounded to.
    pub const SCALE: u32 = 2;

    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Indicates whether this [`Money`] amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Multiplies this [`Money`] by the provided `factor`, rounding the
    /// result to [`Money::SCALE`] decimal places (half away from zero).
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn times(self, factor: Decimal) -> Option<Self> {
        let amount = self.amount.checked_mul(factor)?.round_dp_with_strategy(
            Self::SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        );
        Some(Self {
            amount,
            currency: self.currency,
        })
    }

    /// Adds the provided [`Money`] to this one.
    ///
    /// [`None`] is returned on overflow or if the [`Currency`]s differ.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then_some(())?;
        Some(Self {
            amount: self.amount.checked_add(rhs.amount)?,
            currency: self.currency,
        })
    }

    /// Sums up the provided [`Money`] amounts.
    ///
    /// [`None`] is returned if there is nothing to sum, on overflow, or if
    /// the [`Currency`]s differ.
    pub fn sum(amounts: impl IntoIterator<Item = Self>) -> Option<Self> {
        let mut amounts = amounts.into_iter();
        let first = amounts.next()?;
        amounts.try_fold(first, Self::checked_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(int) => write!(f, "{int}{currency}"),
            None => write!(f, "{}{currency}", amount.normalize()),
        }
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
        #[doc = "Brazilian Real."]
        Brl = 1,

        #[doc = "US Dollar."]
        Usd = 2,
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
    /// - `currency` is a three-letter currency code (`BRL` or `USD`).
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

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn brl(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Brl,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("123.45BRL").unwrap(), brl("123.45"));
        assert_eq!(
            Money::from_str("10USD").unwrap(),
            Money {
                amount: decimal("10"),
                currency: Currency::Usd,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Br").is_err());
        assert!(Money::from_str("123.45EUR").is_err());
        assert!(Money::from_str("123.45Real").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(brl("123.45").to_string(), "123.45BRL");
        assert_eq!(brl("123.40").to_string(), "123.4BRL");
        assert_eq!(brl("123.00").to_string(), "123BRL");
        assert_eq!(brl("123").to_string(), "123BRL");
    }

    #[test]
    fn times_rounds_to_cents() {
        assert_eq!(
            brl("3.50").times(decimal("412.3")).unwrap(),
            brl("1443.05"),
        );
        assert_eq!(brl("0.333").times(decimal("1")).unwrap(), brl("0.33"));
        assert_eq!(brl("0.005").times(decimal("1")).unwrap(), brl("0.01"));
    }

    #[test]
    fn sums_same_currency_only() {
        assert_eq!(
            Money::sum([brl("100"), brl("120"), brl("90")]),
            Some(brl("310")),
        );
        assert_eq!(Money::sum([]), None);
        assert_eq!(
            Money::sum([
                brl("1"),
                Money {
                    amount: decimal("1"),
                    currency: Currency::Usd,
                },
            ]),
            None,
        );
    }

    #[test]
    fn positivity() {
        assert!(brl("0.01").is_positive());
        assert!(!Money::zero(Currency::Brl).is_positive());
        assert!(!brl("-5").is_positive());
    }
}
