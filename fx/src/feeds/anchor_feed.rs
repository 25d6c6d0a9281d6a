//! Anchor-based feed: `GET /latest?base=CODE`.

use async_trait::async_trait;
use fxquote_common::{AnchorSnapshot, CurrencyCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::{check_success, normalize_rates, parse_date, FeedClient};
use crate::error::{FxError, FxResult};
use crate::provider::AnchorRateProvider;

/// `/latest` response. Every field is optional on the wire; validation
/// happens in [`into_snapshot`](LatestResponse::into_snapshot).
#[derive(Debug, Deserialize)]
pub(crate) struct LatestResponse {
    success: Option<bool>,
    base: Option<String>,
    date: Option<String>,
    rates: Option<HashMap<String, Value>>,
    error: Option<Value>,
}

impl LatestResponse {
    pub(crate) fn into_snapshot(self, provider: &str, anchor: &CurrencyCode) -> FxResult<AnchorSnapshot> {
        check_success(provider, self.success, self.error.as_ref())?;

        if let Some(base) = &self.base {
            if base != anchor.code() {
                return Err(FxError::provider(
                    provider,
                    format!("requested base {}, feed returned {}", anchor, base),
                ));
            }
        }

        let raw = self
            .rates
            .ok_or_else(|| FxError::provider(provider, "payload has no rates"))?;
        let rates = normalize_rates(&raw);
        if rates.is_empty() {
            return Err(FxError::provider(provider, "payload has no usable rates"));
        }

        let provider_date = self.date.as_deref().and_then(parse_date);
        Ok(AnchorSnapshot::new(anchor.clone(), rates, provider).with_provider_date(provider_date))
    }
}

/// Feed returning the full table quoted against a fixed anchor (e.g. the
/// EUR-based ECB reference rates).
pub struct AnchorFeedProvider {
    client: FeedClient,
    anchor: CurrencyCode,
}

impl AnchorFeedProvider {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        anchor: CurrencyCode,
        timeout: Duration,
    ) -> FxResult<Self> {
        Ok(Self {
            client: FeedClient::new(id, base_url, timeout)?,
            anchor,
        })
    }
}

#[async_trait]
impl AnchorRateProvider for AnchorFeedProvider {
    fn id(&self) -> &str {
        self.client.id()
    }

    fn anchor(&self) -> &CurrencyCode {
        &self.anchor
    }

    async fn fetch_anchor_rates(&self, anchor: &CurrencyCode) -> FxResult<AnchorSnapshot> {
        let response: LatestResponse = self
            .client
            .get_json("latest", &[("base", anchor.to_string())])
            .await?;
        response.into_snapshot(self.client.id(), anchor)
    }
}
