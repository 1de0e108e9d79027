//! Hex color values for the `Color` catalog entity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HexColorError {
    /// The input string is empty.
    #[error("color cannot be empty")]
    Empty,
    /// The input does not start with `#`.
    #[error("color must start with #")]
    MissingHash,
    /// Wrong number of hex digits.
    #[error("color must have 3 or 6 hex digits")]
    BadLength,
    /// A character is not a hex digit.
    #[error("color contains a non-hex character: {0}")]
    InvalidDigit(char),
}

/// A CSS hex color such as `#fff` or `#1a2b3c`.
///
/// The value is stored exactly as entered (after trimming) so the dashboard
/// shows what the merchant typed.
///
/// ```
/// use storekeep_core::HexColor;
///
/// assert!(HexColor::parse("#000").is_ok());
/// assert!(HexColor::parse("#A1b2C3").is_ok());
/// assert!(HexColor::parse("red").is_err());
/// assert!(HexColor::parse("#12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    /// Parse a `HexColor` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is `#` followed by exactly 3 or 6
    /// hexadecimal digits.
    pub fn parse(s: &str) -> Result<Self, HexColorError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(HexColorError::Empty);
        }

        let digits = trimmed
            .strip_prefix('#')
            .ok_or(HexColorError::MissingHash)?;

        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(HexColorError::InvalidDigit(bad));
        }

        if !matches!(digits.len(), 3 | 6) {
            return Err(HexColorError::BadLength);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the color as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `HexColor` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HexColor {
    type Err = HexColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long_forms() {
        assert_eq!(HexColor::parse("#abc").map(|c| c.into_inner()), Ok("#abc".to_owned()));
        assert_eq!(
            HexColor::parse(" #00FF7f ").map(|c| c.into_inner()),
            Ok("#00FF7f".to_owned())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(HexColor::parse(""), Err(HexColorError::Empty));
        assert_eq!(HexColor::parse("abc"), Err(HexColorError::MissingHash));
        assert_eq!(HexColor::parse("#abcd"), Err(HexColorError::BadLength));
        assert_eq!(HexColor::parse("#"), Err(HexColorError::BadLength));
        assert_eq!(HexColor::parse("#ggg"), Err(HexColorError::InvalidDigit('g')));
    }
}
