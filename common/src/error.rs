//! Error types shared across fxquote crates.

use thiserror::Error;

/// A currency code failed syntactic validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Currency code is empty")]
    Empty,

    #[error("Currency code must be 3 letters: {0:?}")]
    InvalidLength(String),

    #[error("Currency code must be uppercase ASCII letters: {0:?}")]
    InvalidCharacters(String),
}
