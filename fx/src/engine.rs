//! Resolution facade: the single entry point consumers call.

use std::sync::Arc;

use fxquote_common::{now, CurrencyCode};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::{CacheStats, RateCache, RateCacheConfig, SharedRateCache};
use crate::config::FxEngineConfig;
use crate::error::{FxError, FxResult};
use crate::feeds::{AnchorFeedProvider, PairFeedProvider, TimeseriesFeedProvider};
use crate::orchestrator::{FallbackOrchestrator, RateSource};
use crate::quote::Quote;
use crate::trend::{HistoryTrend, TrendAnalyzer};

/// The main FX engine.
pub struct FxEngine {
    orchestrator: FallbackOrchestrator,
    analyzer: Option<TrendAnalyzer>,
    history_window_days: u32,
}

impl FxEngine {
    /// Create an engine from already-built parts.
    pub fn new(orchestrator: FallbackOrchestrator, analyzer: Option<TrendAnalyzer>) -> Self {
        Self {
            orchestrator,
            analyzer,
            history_window_days: fxquote_common::constants::DEFAULT_HISTORY_WINDOW_DAYS,
        }
    }

    pub fn with_history_window(mut self, days: u32) -> Self {
        self.history_window_days = days;
        self
    }

    /// Build the HTTP-backed engine described by `config`.
    pub fn from_config(config: &FxEngineConfig) -> FxResult<Self> {
        config.validate().map_err(FxError::Config)?;

        let mut sources = Vec::new();
        if let Some(endpoint) = &config.anchor_provider {
            sources.push(RateSource::Anchor(Arc::new(AnchorFeedProvider::new(
                endpoint.id.clone(),
                endpoint.base_url.clone(),
                config.anchor_currency.clone(),
                config.provider_timeout,
            )?)));
        }
        if let Some(endpoint) = &config.pair_provider {
            sources.push(RateSource::Pair(Arc::new(PairFeedProvider::new(
                endpoint.id.clone(),
                endpoint.base_url.clone(),
                config.provider_timeout,
            )?)));
        }

        let cache = Arc::new(RateCache::with_config(RateCacheConfig {
            fetch_timeout: config.provider_timeout,
            ..config.cache.clone()
        }));
        let orchestrator =
            FallbackOrchestrator::new(sources, cache).with_timeout(config.provider_timeout);

        let analyzer = match (&config.history_provider, config.history_enabled) {
            (Some(endpoint), true) => Some(
                TrendAnalyzer::new(Arc::new(TimeseriesFeedProvider::new(
                    endpoint.id.clone(),
                    endpoint.base_url.clone(),
                    config.provider_timeout,
                )?))
                .with_timeout(config.provider_timeout),
            ),
            _ => None,
        };

        Ok(Self::new(orchestrator, analyzer).with_history_window(config.history_window_days))
    }

    /// Quote `amount` of `from` in `to`, validating raw input first.
    pub async fn quote(&self, amount: f64, from: &str, to: &str) -> FxResult<Quote> {
        check_amount(amount)?;
        let from = CurrencyCode::parse(from)?;
        let to = CurrencyCode::parse(to)?;
        self.quote_codes(amount, &from, &to).await
    }

    /// Quote with already-validated currency codes.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn quote_codes(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> FxResult<Quote> {
        check_amount(amount)?;

        let (resolved, trend) = tokio::join!(self.orchestrator.resolve(from, to), self.trend(from, to));

        let rate = match resolved {
            Ok(rate) => rate,
            Err(e) => {
                for failure in e.failures() {
                    warn!(provider = %failure.provider, error = %failure.error, "Quote failed");
                }
                return Err(e);
            }
        };

        let (history, changes) = match trend {
            Some(trend) if !trend.is_empty() => (Some(trend.history), Some(trend.changes)),
            _ => (None, None),
        };

        let quote = Quote {
            id: Uuid::now_v7(),
            amount,
            from: from.clone(),
            to: to.clone(),
            rate: rate.rate,
            as_of: now(),
            source: rate.source,
            converted: amount * rate.rate,
            history,
            changes,
        };

        info!(
            quote_id = %quote.id,
            rate = quote.rate,
            source = %quote.source,
            has_history = quote.has_history(),
            "Quote resolved"
        );

        Ok(quote)
    }

    /// Converted amount only.
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> FxResult<f64> {
        Ok(self.quote(amount, from, to).await?.converted)
    }

    async fn trend(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<HistoryTrend> {
        let analyzer = self.analyzer.as_ref()?;
        Some(
            analyzer
                .history_and_trend(from, to, self.history_window_days)
                .await,
        )
    }

    pub fn cache(&self) -> &SharedRateCache {
        self.orchestrator.cache()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.orchestrator.cache().stats()
    }

    /// Identifiers of the rate sources, in fallback order.
    pub fn provider_ids(&self) -> Vec<String> {
        self.orchestrator
            .sources()
            .iter()
            .map(|s| s.id().to_string())
            .collect()
    }
}

fn check_amount(amount: f64) -> FxResult<()> {
    if !amount.is_finite() {
        return Err(FxError::InvalidAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderEndpoint;
    use crate::provider::{MockAnchorProvider, MockHistoryProvider, MockPairProvider};
    use chrono::NaiveDate;
    use fxquote_common::{CurrencyError, HistoryPoint};
    use std::time::Duration;

    fn ecb() -> Arc<MockAnchorProvider> {
        Arc::new(
            MockAnchorProvider::new("ecb", CurrencyCode::eur())
                .with_rate("EUR", 1.0)
                .with_rate("USD", 1.08)
                .with_rate("GBP", 0.86),
        )
    }

    fn setup_engine(provider: Arc<MockAnchorProvider>) -> FxEngine {
        let orchestrator = FallbackOrchestrator::new(
            vec![RateSource::Anchor(provider)],
            Arc::new(RateCache::new()),
        );
        FxEngine::new(orchestrator, None)
    }

    fn history() -> Arc<MockHistoryProvider> {
        let provider = Arc::new(MockHistoryProvider::new("hist"));
        provider.set_points(vec![
            HistoryPoint::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 1.05),
            HistoryPoint::new(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(), 1.08),
        ]);
        provider
    }

    #[tokio::test]
    async fn test_quote_eur_usd() {
        let engine = setup_engine(ecb());

        let quote = engine.quote(100.0, "EUR", "USD").await.unwrap();

        assert_eq!(quote.rate, 1.08);
        assert!((quote.converted - 108.0).abs() < 1e-9);
        assert_eq!(quote.source, "ecb");
        assert!(quote.history.is_none());
    }

    #[tokio::test]
    async fn test_quote_cross_gbp_usd() {
        let engine = setup_engine(ecb());

        let quote = engine.quote(100.0, "GBP", "USD").await.unwrap();

        assert!((quote.rate - 1.2558).abs() < 1e-4);
        assert!((quote.converted - 125.58).abs() < 1e-2);
    }

    #[tokio::test]
    async fn test_invalid_amount_makes_no_calls() {
        let provider = ecb();
        let engine = setup_engine(provider.clone());

        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = engine.quote(amount, "EUR", "USD").await;
            assert!(matches!(result, Err(FxError::InvalidAmount(_))));
        }

        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_currency_makes_no_calls() {
        let provider = ecb();
        let engine = setup_engine(provider.clone());

        assert!(matches!(
            engine.quote(1.0, "", "USD").await,
            Err(FxError::InvalidCurrency(CurrencyError::Empty))
        ));
        assert!(matches!(
            engine.quote(1.0, "EUR", "usd").await,
            Err(FxError::InvalidCurrency(_))
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_same_currency_is_identity() {
        let provider = ecb();
        let engine = setup_engine(provider.clone());

        let quote = engine.quote(42.5, "JPY", "JPY").await.unwrap();

        assert_eq!(quote.rate, 1.0);
        assert_eq!(quote.converted, 42.5);
        assert_eq!(quote.source, "identity");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_is_surfaced_generically() {
        let provider = ecb();
        provider.set_failing(true);
        let engine = setup_engine(provider);

        let err = engine.quote(10.0, "EUR", "USD").await.unwrap_err();

        assert!(matches!(err, FxError::AllProvidersExhausted { .. }));
        assert_eq!(err.user_message(), "could not load FX rates");
        assert_eq!(err.failures()[0].provider, "ecb");
    }

    #[tokio::test]
    async fn test_falls_back_to_pair_provider() {
        let anchor = ecb();
        anchor.set_failing(true);
        let pair = Arc::new(MockPairProvider::new("pair"));
        pair.set_rate(&CurrencyCode::eur(), &CurrencyCode::usd(), 1.09);

        let orchestrator = FallbackOrchestrator::new(
            vec![RateSource::Anchor(anchor), RateSource::Pair(pair)],
            Arc::new(RateCache::new()),
        );
        let engine = FxEngine::new(orchestrator, None);

        let quote = engine.quote(100.0, "EUR", "USD").await.unwrap();

        assert_eq!(quote.source, "pair");
        assert!((quote.converted - 109.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_history_attached() {
        let orchestrator = FallbackOrchestrator::new(
            vec![RateSource::Anchor(ecb())],
            Arc::new(RateCache::new()),
        );
        let engine = FxEngine::new(orchestrator, Some(TrendAnalyzer::new(history())));

        let quote = engine.quote(100.0, "EUR", "USD").await.unwrap();

        let history = quote.history.unwrap();
        assert_eq!(history.len(), 2);
        let d7 = quote.changes.unwrap().d7.unwrap();
        assert!((d7 - 2.857).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_quote() {
        let hist = history();
        hist.set_failing(true);
        let orchestrator = FallbackOrchestrator::new(
            vec![RateSource::Anchor(ecb())],
            Arc::new(RateCache::new()),
        );
        let engine = FxEngine::new(orchestrator, Some(TrendAnalyzer::new(hist.clone())));

        let quote = engine.quote(100.0, "EUR", "USD").await.unwrap();

        assert_eq!(hist.calls(), 1);
        assert!(quote.history.is_none());
        assert!(quote.changes.is_none());
    }

    #[tokio::test]
    async fn test_as_of_is_resolution_time() {
        let engine = setup_engine(ecb());

        let before = now();
        let quote = engine.quote(1.0, "EUR", "GBP").await.unwrap();
        let after = now();

        assert!(quote.as_of >= before);
        assert!(quote.as_of <= after);
    }

    #[tokio::test]
    async fn test_concurrent_quotes_share_anchor_fetch() {
        let provider = ecb();
        provider.set_delay(Duration::from_millis(30));
        let engine = Arc::new(setup_engine(provider.clone()));

        let quotes = futures::future::join_all([("EUR", "USD"), ("GBP", "USD"), ("USD", "GBP")].map(
            |(from, to)| {
                let engine = engine.clone();
                async move { engine.quote(1.0, from, to).await }
            },
        ))
        .await;

        assert!(quotes.iter().all(|q| q.is_ok()));
        assert_eq!(provider.calls(), 1);
        assert_eq!(engine.cache_stats().fresh_entries, 1);
    }

    #[tokio::test]
    async fn test_convert() {
        let engine = setup_engine(ecb());
        let converted = engine.convert(50.0, "USD", "EUR").await.unwrap();
        assert!((converted - 50.0 / 1.08).abs() < 1e-9);
    }

    #[test]
    fn test_from_config() {
        let engine = FxEngine::from_config(&FxEngineConfig::default()).unwrap();
        assert_eq!(engine.provider_ids(), vec!["exchangerate.host", "frankfurter"]);
        assert!(engine.analyzer.is_some());

        let config = FxEngineConfig {
            history_enabled: false,
            pair_provider: Some(ProviderEndpoint::new("local", "http://127.0.0.1:9")),
            ..Default::default()
        };
        let engine = FxEngine::from_config(&config).unwrap();
        assert_eq!(engine.provider_ids(), vec!["exchangerate.host", "local"]);
        assert!(engine.analyzer.is_none());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = FxEngineConfig {
            provider_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            FxEngine::from_config(&config),
            Err(FxError::Config(_))
        ));
    }
}
