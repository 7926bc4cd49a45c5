use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const INR_CURRENCY_CODE: &str = "INR";
pub const INR_CURRENCY_CODE_LOWER: &str = "inr";

/// The number of minor currency units (paise) in one rupee.
const MINOR_UNITS_PER_UNIT: i64 = 100;

//--------------------------------------       Money        ---------------------------------------------------------
/// An exact amount of money in whole rupees.
///
/// Payment gateways report captured amounts in minor units (paise). Use [`Money::minor_units`] when comparing against
/// gateway payloads rather than converting the gateway value back into rupees, so that a truncated conversion can
/// never mask a mismatch.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
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
        Self(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The amount expressed in minor units (paise), as reported by the payment gateway.
    pub fn minor_units(&self) -> i64 {
        self.0 * MINOR_UNITS_PER_UNIT
    }

    pub fn from_minor_units(minor: i64) -> Self {
        Self(minor / MINOR_UNITS_PER_UNIT)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_is_exact() {
        let a = Money::from(1000);
        let b = Money::from(200);
        assert_eq!(a - b, Money::from(800));
        assert_eq!(a + b, Money::from(1200));
        assert_eq!(b * 5, a);
        assert_eq!([a, b].into_iter().sum::<Money>(), Money::from(1200));
    }

    #[test]
    fn minor_units_round_trip() {
        let price = Money::from(499);
        assert_eq!(price.minor_units(), 49_900);
        assert_eq!(Money::from_minor_units(49_900), price);
    }

    #[test]
    fn displays_with_currency_symbol() {
        assert_eq!(Money::from(1500).to_string(), "₹1500");
    }
}
