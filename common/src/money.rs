//! [`Money`]-related definitions.

use std::{fmt, iter, ops, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

use crate::Percent;

/// Amount of money in US dollars.
///
/// Keeps the full [`Decimal`] precision of all the arithmetic performed on
/// it. Rounding to cents happens only when it's displayed.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Money(Decimal);

impl Money {
    /// Zero [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Number of fractional digits [`Money`] is displayed with.
    pub const DISPLAY_SCALE: u32 = 2;

    /// Creates a new [`Money`] from the provided `amount`.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a new [`Money`] from the provided number of `cents`.
    #[must_use]
    pub const fn from_cents(cents: u32) -> Self {
        Self(Decimal::from_parts(cents, 0, 0, false, 2))
    }

    /// Returns the exact amount of this [`Money`].
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns this [`Money`] rounded to cents, with midpoints rounded away
    /// from zero.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self(self.0.round_dp_with_strategy(
            Self::DISPLAY_SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Returns this [`Money`] as a [`f64`], without rounding.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded().0)
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .map(Self)
            .map_err(|_| "invalid amount")
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl ops::Mul<Percent> for Money {
    type Output = Self;

    fn mul(self, rhs: Percent) -> Self::Output {
        Self(self.0 * rhs.ratio())
    }
}

impl iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Amount of US dollars in `{major}.{minor}` format, where `minor` always
    /// has exactly two digits.
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

    use super::Money;
    use crate::Percent;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(money("123.45").amount(), Decimal::new(12345, 2));
        assert_eq!(money("13.986").amount(), Decimal::new(13986, 3));
        assert_eq!(money("0").amount(), Decimal::ZERO);

        assert!(Money::from_str("123.45USD").is_err());
        assert!(Money::from_str("").is_err());
        assert!(Money::from_str("twelve").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45").to_string(), "123.45");
        assert_eq!(money("123").to_string(), "123.00");
        assert_eq!(money("123.4").to_string(), "123.40");
        assert_eq!(money("0").to_string(), "0.00");

        assert_eq!(money("13.986").to_string(), "13.99");
        assert_eq!(money("9.4905").to_string(), "9.49");
        assert_eq!(money("1.4985").to_string(), "1.50");
        assert_eq!(money("2.4975").to_string(), "2.50");
        assert_eq!(money("83.916").to_string(), "83.92");
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(money("0.125").rounded(), money("0.13"));
        assert_eq!(money("0.135").rounded(), money("0.14"));
        assert_eq!(money("-0.125").rounded(), money("-0.13"));
    }

    #[test]
    fn keeps_full_precision() {
        let base = Money::from_cents(999);
        let fee = base * Percent::whole(15);

        assert_eq!(fee, money("1.4985"));
        assert_eq!(base + fee, money("11.4885"));
        assert_eq!(base - fee, money("8.4915"));
    }

    #[test]
    fn to_f64() {
        assert!((money("1.4985").to_f64() - 1.4985).abs() < 1e-9);
        assert!((money("8.985").to_f64() - 8.985).abs() < 1e-9);
    }

    #[test]
    fn sums() {
        let total: Money = [money("1.4985"), money("2.4975")].into_iter().sum();

        assert_eq!(total, money("3.996"));
    }
}
