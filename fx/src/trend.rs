//! Pair history and percentage trend over fixed windows.

use std::sync::Arc;
use std::time::Duration;

use fxquote_common::{
    constants, today, window_start, CurrencyCode, DurationExt, HistoryPoint, TrendChanges,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::provider::HistoryProvider;

/// Time series plus derived changes. Empty when fewer than two usable points
/// were available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryTrend {
    pub history: Vec<HistoryPoint>,
    pub changes: TrendChanges,
}

impl HistoryTrend {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Build from raw provider points: drops non-finite rates, orders by date,
    /// and computes changes. Yields the empty trend below two points.
    pub fn from_points(mut points: Vec<HistoryPoint>) -> Self {
        points.retain(|p| p.rate.is_finite());
        // Stable, so repeated dates keep provider order and the later one stays last.
        points.sort_by_key(|p| p.date);

        if points.len() < 2 {
            return Self::empty();
        }

        let changes = trend_changes(&points);
        Self {
            history: points,
            changes,
        }
    }
}

/// Percentage change for each of [`constants::TREND_WINDOWS`]. `points` must
/// already be ordered by date.
pub fn trend_changes(points: &[HistoryPoint]) -> TrendChanges {
    let [d1, d7, d30] = constants::TREND_WINDOWS.map(|w| change_over(points, w));
    TrendChanges { d1, d7, d30 }
}

/// `(last - ref) / ref * 100` with `ref = points[max(len - 1 - window, 0)]`.
fn change_over(points: &[HistoryPoint], window: usize) -> Option<f64> {
    let last = points.last()?.rate;
    let reference = points.get((points.len() - 1).saturating_sub(window))?.rate;

    if reference == 0.0 || !reference.is_finite() || !last.is_finite() {
        return None;
    }

    Some((last - reference) / reference * 100.0)
}

/// Fetches a pair's daily series and derives its trend. Never fails: any
/// provider problem degrades to the empty trend.
pub struct TrendAnalyzer {
    provider: Arc<dyn HistoryProvider>,
    timeout: Duration,
}

impl TrendAnalyzer {
    pub fn new(provider: Arc<dyn HistoryProvider>) -> Self {
        Self {
            provider,
            timeout: constants::provider_timeout().as_std(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    /// History for the last `window_days` calendar days (clamped to
    /// `1..=MAX_HISTORY_WINDOW_DAYS`) ending today.
    pub async fn history_and_trend(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        window_days: u32,
    ) -> HistoryTrend {
        if from == to {
            return HistoryTrend::empty();
        }

        let days = window_days.clamp(1, constants::MAX_HISTORY_WINDOW_DAYS);
        let end = today();
        let start = window_start(end, days);

        let fetched = tokio::time::timeout(
            self.timeout,
            self.provider.fetch_series(from, to, start, end),
        )
        .await;

        let points = match fetched {
            Ok(Ok(points)) => points,
            Ok(Err(e)) => {
                warn!(provider = self.provider.id(), error = %e, "History fetch failed");
                return HistoryTrend::empty();
            }
            Err(_) => {
                warn!(
                    provider = self.provider.id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "History fetch timed out"
                );
                return HistoryTrend::empty();
            }
        };

        let trend = HistoryTrend::from_points(points);
        if trend.is_empty() {
            debug!(from = %from, to = %to, "Not enough history for a trend");
        }
        trend
    }

    /// Default-window convenience.
    pub async fn default_history_and_trend(&self, from: &CurrencyCode, to: &CurrencyCode) -> HistoryTrend {
        self.history_and_trend(from, to, constants::DEFAULT_HISTORY_WINDOW_DAYS)
            .await
    }
}
