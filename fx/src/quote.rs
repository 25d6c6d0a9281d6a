//! Resolved conversion returned to consumers.

use fxquote_common::{CurrencyCode, CurrencyPair, HistoryPoint, Timestamp, TrendChanges};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed quote: `amount from = converted to` at `rate`.
///
/// Values are exact; display rounding belongs to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Unique quote ID.
    pub id: Uuid,
    /// Amount requested, in `from`.
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// `1 from = rate to`.
    pub rate: f64,
    /// Resolution time. Never a provider-supplied date.
    pub as_of: Timestamp,
    /// Provider that produced the rate.
    pub source: String,
    /// `amount * rate`.
    pub converted: f64,
    /// Daily history for the pair, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryPoint>>,
    /// Trend over the history, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<TrendChanges>,
}

impl Quote {
    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from.clone(), self.to.clone())
    }

    /// `1 to = inverse_rate from`.
    pub fn inverse_rate(&self) -> f64 {
        1.0 / self.rate
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }
}
