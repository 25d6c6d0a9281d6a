//! Currency identifiers for fxquote.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CurrencyError;

/// Three-letter uppercase currency code (ISO 4217 shaped).
///
/// Only syntax is checked: the code need not exist in any registry. Equality
/// is exact, so `"usd"` never parses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and validate a currency code.
    pub fn parse(code: &str) -> Result<Self, CurrencyError> {
        if code.is_empty() {
            return Err(CurrencyError::Empty);
        }
        if code.chars().count() != 3 {
            return Err(CurrencyError::InvalidLength(code.to_string()));
        }
        if !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CurrencyError::InvalidCharacters(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn gbp() -> Self {
        Self("GBP".to_string())
    }

    pub fn jpy() -> Self {
        Self("JPY".to_string())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An ordered `from -> to` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub from: CurrencyCode,
    /// Currency being converted to.
    pub to: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { from, to }
    }

    /// Whether both sides are the same currency.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// The reversed pair.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_code() {
        let code = CurrencyCode::parse("USD").unwrap();
        assert_eq!(code.code(), "USD");
        assert_eq!(code, CurrencyCode::usd());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(CurrencyCode::parse(""), Err(CurrencyError::Empty));
        assert!(matches!(
            CurrencyCode::parse("US"),
            Err(CurrencyError::InvalidLength(_))
        ));
        assert!(matches!(
            CurrencyCode::parse("USDT"),
            Err(CurrencyError::InvalidLength(_))
        ));
        assert!(matches!(
            CurrencyCode::parse("usd"),
            Err(CurrencyError::InvalidCharacters(_))
        ));
        assert!(matches!(
            CurrencyCode::parse("U$D"),
            Err(CurrencyError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_serde_validates() {
        let code: CurrencyCode = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(code, CurrencyCode::gbp());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"GBP\"");

        assert!(serde_json::from_str::<CurrencyCode>("\"gbp\"").is_err());
    }

    #[test]
    fn test_pair() {
        let pair = CurrencyPair::new(CurrencyCode::eur(), CurrencyCode::usd());
        assert_eq!(pair.to_string(), "EUR/USD");
        assert!(!pair.is_identity());
        assert_eq!(pair.inverse().to_string(), "USD/EUR");
        assert!(CurrencyPair::new(CurrencyCode::jpy(), CurrencyCode::jpy()).is_identity());
    }
}
