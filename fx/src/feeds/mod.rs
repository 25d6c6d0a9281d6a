//! HTTP JSON rate feeds.
//!
//! Each feed translates one wire format into the engine's value types and
//! issues exactly one request per call. Retries and fallback live elsewhere.

mod anchor_feed;
mod pair_feed;
mod timeseries_feed;

pub use anchor_feed::AnchorFeedProvider;
pub use pair_feed::PairFeedProvider;
pub use timeseries_feed::TimeseriesFeedProvider;

use chrono::NaiveDate;
use fxquote_common::CurrencyCode;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Date format used by every supported feed.
const FEED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Thin reqwest wrapper bound to one provider.
#[derive(Debug, Clone)]
pub(crate) struct FeedClient {
    id: String,
    base_url: String,
    client: Client,
}

impl FeedClient {
    pub(crate) fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> FxResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FxError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// GET `{base_url}/{path}` and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> FxResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(provider = %self.id, url = %url, "Requesting feed");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FxError::provider(&self.id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::provider(&self.id, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FxError::provider(&self.id, e))?;

        decode(&self.id, &body)
    }
}

/// Decode a JSON payload, mapping failures to a provider error.
pub(crate) fn decode<T: DeserializeOwned>(provider: &str, body: &str) -> FxResult<T> {
    serde_json::from_str(body)
        .map_err(|e| FxError::provider(provider, format!("malformed payload: {}", e)))
}

/// Reject payloads that flag themselves as failed.
pub(crate) fn check_success(provider: &str, success: Option<bool>, error: Option<&Value>) -> FxResult<()> {
    if success == Some(false) {
        let detail = error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no detail".to_string());
        return Err(FxError::provider(
            provider,
            format!("provider reported failure: {}", detail),
        ));
    }
    Ok(())
}

/// A usable wire rate: a finite, non-negative number.
pub(crate) fn usable_rate(value: &Value) -> Option<f64> {
    value.as_f64().filter(|r| r.is_finite() && *r >= 0.0)
}

/// Keep only entries with a well-formed code and a usable rate.
pub(crate) fn normalize_rates(raw: &HashMap<String, Value>) -> HashMap<CurrencyCode, f64> {
    raw.iter()
        .filter_map(|(code, value)| {
            let code = CurrencyCode::parse(code).ok()?;
            Some((code, usable_rate(value)?))
        })
        .collect()
}

pub(crate) fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, FEED_DATE_FORMAT).ok()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(FEED_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_rates_drops_unusable() {
        let raw: HashMap<String, Value> = serde_json::from_value(json!({
            "USD": 1.08,
            "GBP": "0.86",
            "JPY": null,
            "XXX": -1.0,
            "zar": 20.1,
            "CHF": 0.0
        }))
        .unwrap();

        let rates = normalize_rates(&raw);

        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get(&CurrencyCode::usd()), Some(&1.08));
        assert_eq!(rates.get(&CurrencyCode::parse("CHF").unwrap()), Some(&0.0));
    }

    #[test]
    fn test_check_success() {
        assert!(check_success("p", None, None).is_ok());
        assert!(check_success("p", Some(true), None).is_ok());

        let err = check_success("p", Some(false), Some(&json!({"code": 101}))).unwrap_err();
        assert!(err.to_string().contains("101"));
    }

    #[test]
    fn test_decode_malformed() {
        let result: FxResult<Value> = decode("p", "<html>oops</html>");
        assert!(matches!(result, Err(FxError::Provider { .. })));
    }

    #[test]
    fn test_dates() {
        let date = parse_date("2024-01-08").unwrap();
        assert_eq!(format_date(date), "2024-01-08");
        assert!(parse_date("08/01/2024").is_none());
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = FeedClient::new("p", "https://example.test/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "https://example.test");
        assert_eq!(client.id(), "p");
    }
}
