//! Engine configuration.

use std::time::Duration;

use fxquote_common::{constants, CurrencyCode, DurationExt};

use crate::cache::RateCacheConfig;

/// Where a provider lives and what it reports itself as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    /// Identifier used as the quote `source` and in logs.
    pub id: String,
    /// Base URL; request paths are appended to it.
    pub base_url: String,
}

impl ProviderEndpoint {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
        }
    }
}

/// Configuration for the FX engine.
///
/// Rate sources are tried anchor feed first, then pair feed.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Anchor-based feed (`/latest?base=`).
    pub anchor_provider: Option<ProviderEndpoint>,
    /// Anchor the anchor feed is queried with.
    pub anchor_currency: CurrencyCode,
    /// Direct pair feed (`/latest?from=&to=`).
    pub pair_provider: Option<ProviderEndpoint>,
    /// Time-series feed (`/timeseries`).
    pub history_provider: Option<ProviderEndpoint>,
    /// Bound on each provider call.
    pub provider_timeout: Duration,
    /// Cache configuration.
    pub cache: RateCacheConfig,
    /// Calendar days of history attached to quotes.
    pub history_window_days: u32,
    /// Whether quotes carry history at all.
    pub history_enabled: bool,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            anchor_provider: Some(ProviderEndpoint::new(
                "exchangerate.host",
                "https://api.exchangerate.host",
            )),
            anchor_currency: CurrencyCode::eur(),
            pair_provider: Some(ProviderEndpoint::new(
                "frankfurter",
                "https://api.frankfurter.app",
            )),
            history_provider: Some(ProviderEndpoint::new(
                "exchangerate.host",
                "https://api.exchangerate.host",
            )),
            provider_timeout: constants::provider_timeout().as_std(),
            cache: RateCacheConfig::default(),
            history_window_days: constants::DEFAULT_HISTORY_WINDOW_DAYS,
            history_enabled: true,
        }
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` on top of the defaults. An empty URL
    /// disables that provider; unparseable values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("FX_ANCHOR_URL") {
            config.anchor_provider = endpoint_override(config.anchor_provider, url);
        }

        if let Some(code) = lookup("FX_ANCHOR_CURRENCY") {
            if let Ok(code) = CurrencyCode::parse(&code) {
                config.anchor_currency = code;
            }
        }

        if let Some(url) = lookup("FX_PAIR_URL") {
            config.pair_provider = endpoint_override(config.pair_provider, url);
        }

        if let Some(url) = lookup("FX_HISTORY_URL") {
            config.history_provider = endpoint_override(config.history_provider, url);
        }

        if let Some(ms) = lookup("FX_PROVIDER_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.provider_timeout = Duration::from_millis(ms);
            }
        }

        if let Some(secs) = lookup("FX_CACHE_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.cache.freshness_window = chrono::Duration::seconds(secs);
            }
        }

        if let Some(days) = lookup("FX_HISTORY_DAYS") {
            if let Ok(days) = days.parse() {
                config.history_window_days = days;
            }
        }

        if let Some(enabled) = lookup("FX_HISTORY_ENABLED") {
            config.history_enabled = !matches!(enabled.as_str(), "0" | "false" | "no" | "off");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.anchor_provider.is_none() && self.pair_provider.is_none() {
            return Err("At least one rate provider must be configured".to_string());
        }

        for endpoint in [&self.anchor_provider, &self.pair_provider, &self.history_provider]
            .into_iter()
            .flatten()
        {
            if endpoint.id.is_empty() {
                return Err("Provider id cannot be empty".to_string());
            }
            if !(endpoint.base_url.starts_with("http://") || endpoint.base_url.starts_with("https://")) {
                return Err(format!(
                    "Provider {} has a non-HTTP base URL: {}",
                    endpoint.id, endpoint.base_url
                ));
            }
        }

        if self.provider_timeout.is_zero() {
            return Err("Provider timeout cannot be zero".to_string());
        }

        if self.cache.freshness_window <= chrono::Duration::zero() {
            return Err("Cache freshness window must be positive".to_string());
        }

        if self.history_window_days == 0
            || self.history_window_days > constants::MAX_HISTORY_WINDOW_DAYS
        {
            return Err(format!(
                "History window must be between 1 and {} days",
                constants::MAX_HISTORY_WINDOW_DAYS
            ));
        }

        Ok(())
    }
}

fn endpoint_override(current: Option<ProviderEndpoint>, url: String) -> Option<ProviderEndpoint> {
    if url.trim().is_empty() {
        return None;
    }
    let id = current
        .map(|e| e.id)
        .unwrap_or_else(|| host_of(&url).to_string());
    Some(ProviderEndpoint::new(id, url))
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.split(['/', '?', ':']).next().unwrap_or(rest)
}
