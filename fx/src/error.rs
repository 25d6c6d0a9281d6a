//! FX engine error types.

use fxquote_common::{CurrencyCode, CurrencyError};
use std::fmt;
use thiserror::Error;

/// Message shown to end users whenever no provider could produce a rate.
pub const USER_FACING_FAILURE: &str = "could not load FX rates";

/// Errors that can occur in the FX engine.
///
/// Only [`InvalidAmount`](FxError::InvalidAmount),
/// [`InvalidCurrency`](FxError::InvalidCurrency) and
/// [`AllProvidersExhausted`](FxError::AllProvidersExhausted) leave the
/// resolver; the rest are recovered by fallback.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// Amount is NaN or infinite.
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    /// Currency code failed validation.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(#[from] CurrencyError),

    /// One provider call failed.
    #[error("Rate provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    /// Requested currency absent from an anchor snapshot.
    #[error("Rate for {currency} missing from {anchor} snapshot")]
    MissingRate {
        currency: CurrencyCode,
        anchor: CurrencyCode,
    },

    /// Derived rate is not a finite positive number.
    #[error("Unusable rate {rate} for {from}/{to}")]
    InvalidRate {
        from: CurrencyCode,
        to: CurrencyCode,
        rate: f64,
    },

    /// Every configured source failed.
    #[error("could not load FX rates")]
    AllProvidersExhausted { failures: Vec<ProviderFailure> },

    /// Invalid resolver configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FxError {
    pub fn provider(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        FxError::Provider {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is meant to reach the caller of the resolver.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            FxError::InvalidAmount(_)
                | FxError::InvalidCurrency(_)
                | FxError::AllProvidersExhausted { .. }
        )
    }

    /// Message safe to show to end users. Never names a provider.
    pub fn user_message(&self) -> String {
        match self {
            FxError::InvalidAmount(_) => "Enter a valid amount.".to_string(),
            FxError::InvalidCurrency(_) => "Select a valid currency.".to_string(),
            _ => USER_FACING_FAILURE.to_string(),
        }
    }

    /// Stable code for logs and machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::InvalidAmount(_) => "INVALID_AMOUNT",
            FxError::InvalidCurrency(_) => "INVALID_CURRENCY",
            FxError::Provider { .. } => "PROVIDER_ERROR",
            FxError::MissingRate { .. } => "MISSING_RATE",
            FxError::InvalidRate { .. } => "INVALID_RATE",
            FxError::AllProvidersExhausted { .. } => "ALL_PROVIDERS_EXHAUSTED",
            FxError::Config(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Per-provider failures behind an exhausted resolution.
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            FxError::AllProvidersExhausted { failures } => failures,
            _ => &[],
        }
    }
}

/// One source's failure, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: FxError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_is_generic() {
        let err = FxError::AllProvidersExhausted {
            failures: vec![ProviderFailure {
                provider: "exchangerate.host".to_string(),
                error: FxError::provider("exchangerate.host", "HTTP 503"),
            }],
        };

        assert_eq!(err.to_string(), "could not load FX rates");
        assert_eq!(err.user_message(), "could not load FX rates");
        assert!(!err.to_string().contains("exchangerate.host"));
        assert_eq!(err.failures().len(), 1);
        assert!(err.failures()[0].to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_surfaced_kinds() {
        assert!(FxError::InvalidAmount(f64::NAN).is_surfaced());
        assert!(FxError::InvalidCurrency(CurrencyError::Empty).is_surfaced());
        assert!(FxError::AllProvidersExhausted { failures: vec![] }.is_surfaced());

        assert!(!FxError::provider("p", "boom").is_surfaced());
        assert!(!FxError::MissingRate {
            currency: CurrencyCode::jpy(),
            anchor: CurrencyCode::eur(),
        }
        .is_surfaced());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FxError::InvalidAmount(f64::NAN).error_code(), "INVALID_AMOUNT");
        assert_eq!(FxError::Config("x".into()).error_code(), "CONFIGURATION_ERROR");
        assert_eq!(
            FxError::provider("p", "boom").user_message(),
            "could not load FX rates"
        );
    }
}
