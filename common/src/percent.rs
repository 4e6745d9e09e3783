//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};

/// Floating-point percentage.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a new [`Percent`] by checking the provided values is
    /// greater than `0` and less than `100`.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        if val < Decimal::ZERO || val > Decimal::ONE_HUNDRED {
            None
        } else {
            #[expect(
                clippy::allow_attributes,
                reason = "TODO: Remove once clippy is fixed"
            )]
            #[allow(unsafe_code, reason = "invariants checked already")]
            Some(unsafe { Self::new_unchecked(val) })
        }
    }

    /// Creates a new [`Percent`] without performing any validation.
    ///
    /// # Safety
    ///
    /// The provided value must be greater than `0` and less than `100`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(val: Decimal) -> Self {
        Self(val)
    }

    /// Creates a new [`Percent`] from the provided whole number of percents.
    ///
    /// # Panics
    ///
    /// If the provided `val` is greater than `100`. In `const` context this
    /// fails the compilation instead.
    #[expect(clippy::cast_lossless, reason = "`From` is not `const`")]
    #[must_use]
    pub const fn whole(val: u8) -> Self {
        assert!(val <= 100, "`Percent` cannot be greater than 100");
        Self(Decimal::from_parts(val as u32, 0, 0, false, 0))
    }

    /// Returns the value of this [`Percent`] (`15` for `15%`).
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the ratio this [`Percent`] represents (`0.15` for `15%`).
    #[must_use]
    pub fn ratio(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Returns the ratio this [`Percent`] represents as a [`f64`].
    #[must_use]
    pub fn ratio_f64(&self) -> f64 {
        self.ratio().to_f64().unwrap_or_default()
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

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    #[test]
    fn from_str() {
        assert_eq!(Percent::from_str("15").unwrap(), Percent::whole(15));
        assert_eq!(Percent::from_str("0").unwrap(), Percent::whole(0));
        assert_eq!(Percent::from_str("100").unwrap(), Percent::whole(100));

        assert!(Percent::from_str("-1").is_err());
        assert!(Percent::from_str("100.5").is_err());
        assert!(Percent::from_str("fifteen").is_err());
    }

    #[test]
    fn ratio() {
        assert_eq!(Percent::whole(15).ratio(), Decimal::new(15, 2));
        assert_eq!(Percent::whole(25).ratio(), Decimal::new(25, 2));
        assert_eq!(Percent::whole(0).ratio(), Decimal::ZERO);
        assert_eq!(Percent::whole(100).ratio(), Decimal::ONE);

        assert!((Percent::whole(20).ratio_f64() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    #[should_panic = "`Percent` cannot be greater than 100"]
    fn whole_overflow() {
        _ = Percent::whole(101);
    }
}
