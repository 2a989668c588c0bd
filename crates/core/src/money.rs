//! Money
//!
//! Amounts are carried as integer minor units (paise) and only converted to
//! major units at the store boundary, where the remote records hold plain JSON
//! numbers such as `20` or `12.5`.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};
use serde_json::Value;
use thiserror::Error;

const MINOR_PER_MAJOR: u64 = 100;

/// A non-negative amount in minor currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Build an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Build an amount from whole major units.
    #[must_use]
    pub const fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(MINOR_PER_MAJOR))
    }

    /// Minor units.
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert a major-unit decimal, rounding to two places.
    ///
    /// Returns `None` for negative or unrepresentable values.
    #[must_use]
    pub fn from_decimal(major: Decimal) -> Option<Self> {
        if major.is_sign_negative() && !major.is_zero() {
            return None;
        }

        major
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .map(Self)
    }

    /// The amount in major units.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(MINOR_PER_MAJOR)
    }

    /// Read a remote field leniently: missing, non-numeric and negative values
    /// all become zero.
    #[must_use]
    pub fn coerce(value: Option<&Value>) -> Self {
        value
            .and_then(decimal_from_value)
            .and_then(Self::from_decimal)
            .unwrap_or_default()
    }

    /// `self * quantity`, saturating.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity)))
    }

    /// `self - other`, clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// `percent`% of this amount, rounded half away from zero to the nearest
    /// minor unit.
    #[must_use]
    pub fn percent(self, percent: u8) -> Self {
        let applied = Decimal::from(self.0) * Decimal::from(percent) / Decimal::ONE_HUNDRED;

        applied
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .map_or(Self(u64::MAX), Self)
    }
}

/// An amount string that is not a non-negative decimal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a non-negative amount")]
pub struct ParseAmountError(String);

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parse major units, e.g. `45.50`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(raw.trim())
            .ok()
            .and_then(Self::from_decimal)
            .ok_or_else(|| ParseAmountError(raw.to_string()))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minor = i64::try_from(self.0).unwrap_or(i64::MAX);

        fmt::Display::fmt(&Money::from_minor(minor, iso::INR), f)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_MAJOR == 0 {
            return serializer.serialize_u64(self.0 / MINOR_PER_MAJOR);
        }

        match self.to_decimal().to_f64() {
            Some(major) => serializer.serialize_f64(major),
            None => Err(serde::ser::Error::custom("amount is not representable")),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative amount in major units")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Amount, E> {
        Ok(Amount::from_major(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Amount, E> {
        u64::try_from(value)
            .ok()
            .map(Amount::from_major)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Amount, E> {
        Decimal::from_f64(value)
            .and_then(Amount::from_decimal)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Float(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Amount, E> {
        Decimal::from_str(value.trim())
            .ok()
            .and_then(Amount::from_decimal)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

/// Interpret a JSON value as a decimal number, accepting numeric strings.
pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => {
            if let Some(unsigned) = number.as_u64() {
                Some(Decimal::from(unsigned))
            } else if let Some(signed) = number.as_i64() {
                Some(Decimal::from(signed))
            } else {
                number.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(Amount::from_major(100).percent(10), Amount::from_major(10));
        assert_eq!(Amount::from_minor(5).percent(10), Amount::from_minor(1));
        assert_eq!(Amount::from_minor(4).percent(10), Amount::ZERO);
    }

    #[test]
    fn coerce_defaults_to_zero() {
        assert_eq!(Amount::coerce(None), Amount::ZERO);
        assert_eq!(Amount::coerce(Some(&json!("abc"))), Amount::ZERO);
        assert_eq!(Amount::coerce(Some(&json!(-5))), Amount::ZERO);
        assert_eq!(Amount::coerce(Some(&json!(null))), Amount::ZERO);
    }

    #[test]
    fn coerce_accepts_numbers_and_numeric_strings() {
        assert_eq!(Amount::coerce(Some(&json!(20))), Amount::from_major(20));
        assert_eq!(Amount::coerce(Some(&json!(12.5))), Amount::from_minor(12_50));
        assert_eq!(Amount::coerce(Some(&json!("7.25"))), Amount::from_minor(7_25));
    }

    #[test]
    fn serializes_whole_amounts_as_integers() -> TestResult {
        assert_eq!(serde_json::to_value(Amount::from_major(40))?, json!(40));
        assert_eq!(serde_json::to_value(Amount::from_minor(40_50))?, json!(40.5));

        Ok(())
    }

    #[test]
    fn parses_major_unit_strings() -> TestResult {
        assert_eq!(" 45.50 ".parse::<Amount>()?, Amount::from_minor(45_50));
        assert_eq!("20".parse::<Amount>()?, Amount::from_major(20));
        assert!("-3".parse::<Amount>().is_err());
        assert!("ten".parse::<Amount>().is_err());

        Ok(())
    }

    #[test]
    fn deserializes_major_units() -> TestResult {
        let amount: Amount = serde_json::from_value(json!(19.99))?;

        assert_eq!(amount, Amount::from_minor(19_99));
        assert!(serde_json::from_value::<Amount>(json!(-1)).is_err());

        Ok(())
    }

    #[test]
    fn subtraction_clamps_at_zero() {
        let total = Amount::from_major(5).saturating_sub(Amount::from_major(8));

        assert_eq!(total, Amount::ZERO);
    }
}
