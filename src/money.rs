//! Monetary amount type.
//!
//! Wraps `rust_decimal` and keeps full precision through every arithmetic
//! operation. Rounding to cents happens only when a value is displayed or
//! serialized.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A monetary amount accumulated at full decimal precision.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use family_tally::Money;
///
/// let third = Money::from_str("100").unwrap().share(1, 3);
/// assert_eq!(third.to_string(), "33.33");
/// assert_ne!(third, third.rounded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Number of decimal places used for display.
    pub const DISPLAY_SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// One cent, the default tolerance for treating a balance as settled.
    pub const DEFAULT_EPSILON: Self = Money(Decimal::from_parts(1, 0, 0, false, 2));

    pub fn new(value: Decimal) -> Self {
        Money(value)
    }

    pub fn from_i64(value: i64) -> Self {
        Money(Decimal::from(value))
    }

    /// Returns the underlying full-precision decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `amount * count / total`.
    ///
    /// Callers must guarantee `0 <= count <= total` and `total != 0`. When
    /// `amount * count` does not fit a decimal the fraction is taken first,
    /// which keeps the product bounded by `amount`.
    pub fn share(&self, count: i64, total: i64) -> Self {
        let count = Decimal::from(count);
        let total = Decimal::from(total);
        match self.0.checked_mul(count) {
            Some(product) => Money(product / total),
            None => Money(self.0 * (count / total)),
        }
    }

    /// Rounds to cents using round-half-to-even.
    pub fn rounded(&self) -> Self {
        let mut rounded = self
            .0
            .round_dp_with_strategy(Self::DISPLAY_SCALE, RoundingStrategy::MidpointNearestEven);
        if rounded.is_zero() {
            // Drops the sign of values such as -0.001.
            rounded = Decimal::ZERO;
        }
        rounded.rescale(Self::DISPLAY_SCALE);
        Money(rounded)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Money(decimal))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded().0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}
