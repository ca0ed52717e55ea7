//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("phone number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("phone number contains an invalid character: {0:?}")]
    InvalidCharacter(char),
    /// The input does not contain enough digits.
    #[error("phone number must contain at least {min} digits")]
    TooFewDigits {
        /// Minimum number of digits.
        min: usize,
    },
}

/// A phone number.
///
/// Stored exactly as entered (no normalization) but validated to look like a
/// dialable number: digits with an optional leading `+` and common grouping
/// punctuation.
///
/// ## Constraints
///
/// - Length: 1-32 characters
/// - Allowed characters: digits, `+`, `-`, spaces, parentheses
/// - At least 7 digits overall
///
/// ## Examples
///
/// ```
/// use camellia_core::Phone;
///
/// assert!(Phone::parse("+1 (555) 123-4567").is_ok());
/// assert!(Phone::parse("5551234567").is_ok());
///
/// assert!(Phone::parse("").is_err());        // empty
/// assert!(Phone::parse("call me").is_err()); // letters
/// assert!(Phone::parse("12345").is_err());   // too few digits
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Maximum length of a phone number.
    pub const MAX_LENGTH: usize = 32;

    /// Minimum number of digits a phone number must contain.
    pub const MIN_DIGITS: usize = 7;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty or longer than 32 characters
    /// - Contains characters other than digits, `+`, `-`, spaces or parentheses
    /// - Contains fewer than 7 digits
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_digit() && !matches!(c, '+' | '-' | ' ' | '(' | ')'))
        {
            return Err(PhoneError::InvalidCharacter(c));
        }

        let digits = s.chars().filter(char::is_ascii_digit).count();
        if digits < Self::MIN_DIGITS {
            return Err(PhoneError::TooFewDigits {
                min: Self::MIN_DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_phones() {
        assert!(Phone::parse("5551234567").is_ok());
        assert!(Phone::parse("+15551234567").is_ok());
        assert!(Phone::parse("+1 (555) 123-4567").is_ok());
        assert!(Phone::parse("020 7946 0958").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "9".repeat(40);
        assert!(matches!(
            Phone::parse(&long),
            Err(PhoneError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_character() {
        assert!(matches!(
            Phone::parse("555-CALL-NOW"),
            Err(PhoneError::InvalidCharacter('C'))
        ));
        assert!(matches!(
            Phone::parse("555.123.4567"),
            Err(PhoneError::InvalidCharacter('.'))
        ));
    }

    #[test]
    fn test_parse_too_few_digits() {
        assert!(matches!(
            Phone::parse("12345"),
            Err(PhoneError::TooFewDigits { min: 7 })
        ));
        assert!(matches!(
            Phone::parse("+() -"),
            Err(PhoneError::TooFewDigits { .. })
        ));
    }

    #[test]
    fn test_display_preserves_formatting() {
        let phone = Phone::parse("+1 (555) 123-4567").unwrap();
        assert_eq!(format!("{phone}"), "+1 (555) 123-4567");
    }

    #[test]
    fn test_serde_roundtrip() {
        let phone = Phone::parse("+15551234567").unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"+15551234567\"");

        let parsed: Phone = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, phone);
    }
}
