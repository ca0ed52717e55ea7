//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PriceError {
    /// The input string is not a valid decimal number.
    #[error("invalid decimal amount: {0}")]
    InvalidAmount(String),
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A monetary amount.
///
/// Wraps [`Decimal`] so prices never go through floating point. Serializes
/// as a decimal string (e.g. `"25.00"`) and deserializes from either a
/// string or a JSON number. Scale is preserved: `"25.00"` stays `"25.00"`.
///
/// ## Examples
///
/// ```
/// use camellia_core::Price;
///
/// let unit = Price::parse("25.00").unwrap();
/// let total = unit.times(3);
/// assert_eq!(total.to_string(), "75.00");
///
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a raw decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a `Price` from a decimal string, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::InvalidAmount`] if the string is not a decimal
    /// number, or [`PriceError::Negative`] for amounts below zero.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s).map_err(|_| PriceError::InvalidAmount(s.to_owned()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The line total for `quantity` units at this price.
    #[must_use]
    pub fn times(&self, quantity: i64) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        assert!(Price::parse("0").is_ok());
        assert!(Price::parse("25.00").is_ok());
        assert!(Price::parse("119.99").is_ok());
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!(matches!(Price::parse("-1"), Err(PriceError::Negative)));
        assert!(matches!(Price::parse("-0.01"), Err(PriceError::Negative)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Price::parse("abc"),
            Err(PriceError::InvalidAmount(_))
        ));
        assert!(matches!(Price::parse(""), Err(PriceError::InvalidAmount(_))));
    }

    #[test]
    fn test_scale_preserved() {
        let price = Price::parse("55.00").unwrap();
        assert_eq!(price.to_string(), "55.00");
    }

    #[test]
    fn test_times() {
        let unit = Price::parse("55.00").unwrap();
        assert_eq!(unit.times(3).to_string(), "165.00");
        assert_eq!(unit.times(0), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Price = ["10.50", "4.25", "0.25"]
            .iter()
            .map(|s| Price::parse(s).unwrap())
            .sum();
        assert_eq!(total.to_string(), "15.00");
    }

    #[test]
    fn test_serde_as_string() {
        let price = Price::parse("25.00").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"25.00\"");

        let from_string: Price = serde_json::from_str("\"25.00\"").unwrap();
        assert_eq!(from_string, price);

        let from_number: Price = serde_json::from_str("25.00").unwrap();
        assert_eq!(from_number.as_decimal(), price.as_decimal());
    }
}
