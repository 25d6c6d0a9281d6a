//! Time-series feed: `GET /timeseries?base=&symbols=&start_date=&end_date=`.

use async_trait::async_trait;
use chrono::NaiveDate;
use fxquote_common::{CurrencyCode, HistoryPoint};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::{check_success, format_date, parse_date, usable_rate, FeedClient};
use crate::error::{FxError, FxResult};
use crate::provider::HistoryProvider;

/// `{"rates": {"YYYY-MM-DD": {"USD": 1.08}}}`
#[derive(Debug, Deserialize)]
pub(crate) struct TimeseriesResponse {
    success: Option<bool>,
    rates: Option<HashMap<String, HashMap<String, Value>>>,
    error: Option<Value>,
}

impl TimeseriesResponse {
    /// Days without a usable `to` rate or with an unparseable date are skipped.
    pub(crate) fn into_points(self, provider: &str, to: &CurrencyCode) -> FxResult<Vec<HistoryPoint>> {
        check_success(provider, self.success, self.error.as_ref())?;

        let days = self
            .rates
            .ok_or_else(|| FxError::provider(provider, "payload has no rates"))?;

        let mut points: Vec<HistoryPoint> = days
            .iter()
            .filter_map(|(date, rates)| {
                let date = parse_date(date)?;
                let rate = usable_rate(rates.get(to.code())?)?;
                Some(HistoryPoint::new(date, rate))
            })
            .collect();
        points.sort_by_key(|p| p.date);

        Ok(points)
    }
}

/// Feed serving daily rates for a pair over a date range.
pub struct TimeseriesFeedProvider {
    client: FeedClient,
}

impl TimeseriesFeedProvider {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        Ok(Self {
            client: FeedClient::new(id, base_url, timeout)?,
        })
    }
}

#[async_trait]
impl HistoryProvider for TimeseriesFeedProvider {
    fn id(&self) -> &str {
        self.client.id()
    }

    async fn fetch_series(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FxResult<Vec<HistoryPoint>> {
        let response: TimeseriesResponse = self
            .client
            .get_json(
                "timeseries",
                &[
                    ("base", from.to_string()),
                    ("symbols", to.to_string()),
                    ("start_date", format_date(start)),
                    ("end_date", format_date(end)),
                ],
            )
            .await?;
        response.into_points(self.client.id(), to)
    }
}
