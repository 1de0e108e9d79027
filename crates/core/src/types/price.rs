//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// More than two digits after the decimal point.
    #[error("price can have at most 2 decimal places")]
    TooPrecise,
    /// The amount does not fit the `numeric(12,2)` column.
    #[error("price cannot exceed 9999999999.99")]
    TooLarge,
}

/// A product price in the store's currency.
///
/// Prices are stored in `numeric(12,2)` columns, so the amount is limited to
/// two fractional digits, must not be negative and must be at most
/// [`Price::MAX`].
///
/// ```
/// use storekeep_core::Price;
///
/// let price = Price::parse("19.9").unwrap();
/// assert_eq!(price.display(), "$19.90");
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("0.001").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of fractional digits.
    pub const SCALE: u32 = 2;

    /// Largest amount a `numeric(12,2)` column holds.
    pub const MAX: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has more than two
    /// fractional digits, or exceeds [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }
        if amount > Self::MAX {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Parse a price from user input such as `"12"` or `"12.50"`.
    ///
    /// # Errors
    ///
    /// See [`PriceError`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(trimmed).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display (e.g., `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(Price::parse("12").map(|p| p.display()), Ok("$12.00".to_owned()));
        assert_eq!(Price::parse(" 7.5 ").map(|p| p.display()), Ok("$7.50".to_owned()));
        assert_eq!(Price::parse("0").map(|p| p.display()), Ok("$0.00".to_owned()));
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        assert!(Price::parse("3.1000").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
        assert_eq!(Price::parse("1.005"), Err(PriceError::TooPrecise));
    }

    #[test]
    fn test_upper_bound_matches_column() {
        assert_eq!(Price::MAX, Decimal::new(999_999_999_999, 2));
        assert!(Price::parse("9999999999.99").is_ok());
        assert_eq!(Price::parse("10000000000"), Err(PriceError::TooLarge));
        assert_eq!(
            Price::parse("123456789012345678901234"),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_display_without_symbol() {
        let price = Price::parse("42.1").expect("valid");
        assert_eq!(price.to_string(), "42.10");
    }
}
