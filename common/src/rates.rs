//! Rate value types produced by providers and consumed by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::monetary::CurrencyCode;
use crate::time::{now, Timestamp};

/// Source tag for same-currency quotes that never touch a provider.
pub const IDENTITY_SOURCE: &str = "identity";

/// "1 unit of `from` equals `rate` units of `to`."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Conversion rate.
    pub rate: f64,
    /// When the rate was obtained.
    pub as_of: Timestamp,
    /// Provider identifier.
    pub source: String,
}

impl RateQuote {
    /// Create a quote stamped with the current time.
    pub fn new(rate: f64, source: impl Into<String>) -> Self {
        Self {
            rate,
            as_of: now(),
            source: source.into(),
        }
    }

    /// The 1:1 quote for converting a currency into itself.
    pub fn identity() -> Self {
        Self::new(1.0, IDENTITY_SOURCE)
    }
}

/// A full rate table relative to one anchor currency, as returned by a single
/// provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSnapshot {
    /// Currency every rate is quoted against.
    pub anchor: CurrencyCode,
    /// `1 anchor = rates[code] code`.
    pub rates: HashMap<CurrencyCode, f64>,
    /// When the snapshot was fetched.
    pub as_of: Timestamp,
    /// Provider identifier.
    pub source: String,
    /// Date reported by the feed itself, if any. Informational only.
    pub provider_date: Option<NaiveDate>,
}

impl AnchorSnapshot {
    pub fn new(
        anchor: CurrencyCode,
        rates: HashMap<CurrencyCode, f64>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            anchor,
            rates,
            as_of: now(),
            source: source.into(),
            provider_date: None,
        }
    }

    pub fn with_provider_date(mut self, date: Option<NaiveDate>) -> Self {
        self.provider_date = date;
        self
    }

    /// Rate for `code` relative to the anchor. The anchor itself is always 1.
    pub fn factor(&self, code: &CurrencyCode) -> Option<f64> {
        if *code == self.anchor {
            return Some(1.0);
        }
        self.rates.get(code).copied()
    }

    /// Number of quoted currencies.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// One day of a pair's time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub rate: f64,
}

impl HistoryPoint {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }
}

/// Percentage changes over the 1, 7 and 30 point windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendChanges {
    pub d1: Option<f64>,
    pub d7: Option<f64>,
    pub d30: Option<f64>,
}

impl TrendChanges {
    /// No window has a computable change.
    pub fn is_empty(&self) -> bool {
        self.d1.is_none() && self.d7.is_none() && self.d30.is_none()
    }
}
