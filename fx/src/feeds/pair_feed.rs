//! Direct pair feed: `GET /latest?from=CODE&to=CODE`.

use async_trait::async_trait;
use fxquote_common::{CurrencyCode, RateQuote};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::{check_success, usable_rate, FeedClient};
use crate::error::{FxError, FxResult};
use crate::provider::PairRateProvider;

/// Pair response. Feeds either return `rates[to]` (optionally scaled by
/// `amount`) or a bare `result`/`rate` number.
#[derive(Debug, Deserialize)]
pub(crate) struct PairResponse {
    success: Option<bool>,
    amount: Option<f64>,
    rates: Option<HashMap<String, Value>>,
    result: Option<Value>,
    rate: Option<Value>,
    error: Option<Value>,
}

impl PairResponse {
    pub(crate) fn into_quote(
        self,
        provider: &str,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> FxResult<RateQuote> {
        check_success(provider, self.success, self.error.as_ref())?;

        let quoted = self
            .rates
            .as_ref()
            .and_then(|rates| rates.get(to.code()))
            .or(self.result.as_ref())
            .or(self.rate.as_ref())
            .ok_or_else(|| FxError::provider(provider, format!("payload has no {} rate", to)))?;

        let quoted = usable_rate(quoted)
            .ok_or_else(|| FxError::provider(provider, format!("unusable {} rate: {}", to, quoted)))?;

        let amount = self.amount.unwrap_or(1.0);
        let rate = quoted / amount;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(FxError::InvalidRate {
                from: from.clone(),
                to: to.clone(),
                rate,
            });
        }

        Ok(RateQuote::new(rate, provider))
    }
}

/// Feed that converts a pair natively, bypassing cross-rate derivation.
pub struct PairFeedProvider {
    client: FeedClient,
}

impl PairFeedProvider {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        Ok(Self {
            client: FeedClient::new(id, base_url, timeout)?,
        })
    }
}

#[async_trait]
impl PairRateProvider for PairFeedProvider {
    fn id(&self) -> &str {
        self.client.id()
    }

    async fn fetch_cross_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> FxResult<RateQuote> {
        let response: PairResponse = self
            .client
            .get_json("latest", &[("from", from.to_string()), ("to", to.to_string())])
            .await?;
        response.into_quote(self.client.id(), from, to)
    }
}
