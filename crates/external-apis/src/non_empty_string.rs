// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Non-empty string validation utilities
//!
//! [`NonEmptyString`] is used for every credential, contract id and other
//! identifier a client needs. An API key that is present but blank would only
//! surface as a 401 at request time; rejecting it while building the client
//! turns that into a startup error instead.
//!
//! ```rust
//! use external_apis::NonEmptyString;
//!
//! let api_key = NonEmptyString::new("sk-1234567890").expect("valid API key");
//! assert_eq!(api_key.as_str(), "sk-1234567890");
//!
//! assert!(NonEmptyString::new("").is_err());
//! assert!(NonEmptyString::new("   \t\n  ").is_err());
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, de};

/// A string with at least one non-whitespace character
///
/// Uses `Box<str>` internally; the value is immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyString(Box<str>);

impl NonEmptyString {
    /// Create a new `NonEmptyString` from any string-like input
    ///
    /// Leading and trailing whitespace is kept as given; only blank input is rejected.
    ///
    /// ```rust
    /// use external_apis::NonEmptyString;
    ///
    /// assert!(NonEmptyString::new("minter.testnet").is_ok());
    /// assert!(NonEmptyString::new(" padded ").is_ok());
    /// assert!(NonEmptyString::new("\t").is_err());
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.trim().is_empty() {
            Err("String cannot be empty or whitespace-only".to_string())
        } else {
            Ok(NonEmptyString(s.into_boxed_str()))
        }
    }

    /// Get a string slice of the contained value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NonEmptyString {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for NonEmptyString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_input() {
        assert!(NonEmptyString::new("").is_err());
        assert!(NonEmptyString::new(" ").is_err());
        assert!(NonEmptyString::new("\n\t").is_err());
    }

    #[test]
    fn keeps_original_text() {
        let value = NonEmptyString::new(" key ").unwrap();
        assert_eq!(value.as_str(), " key ");
        assert_eq!(value.to_string(), " key ");
        assert_eq!(value.as_ref(), " key ");
    }

    #[test]
    fn parses_from_str() {
        let parsed: NonEmptyString = "nft.testnet".parse().unwrap();
        assert_eq!(parsed.as_str(), "nft.testnet");
        assert!("".parse::<NonEmptyString>().is_err());
    }

    #[test]
    fn deserializes_with_validation() {
        let ok: NonEmptyString = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.as_str(), "abc");
        assert!(serde_json::from_str::<NonEmptyString>("\"  \"").is_err());
    }
}
