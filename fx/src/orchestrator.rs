//! Ordered provider fallback.

use std::sync::Arc;
use std::time::Duration;

use fxquote_common::{constants, not_after_now, CurrencyCode, DurationExt, RateQuote};
use tracing::{debug, instrument, warn};

use crate::cache::SharedRateCache;
use crate::cross_rate::cross_rate;
use crate::error::{FxError, FxResult, ProviderFailure};
use crate::provider::{AnchorRateProvider, PairRateProvider};

/// One entry in the fallback chain.
#[derive(Clone)]
pub enum RateSource {
    /// Full table against an anchor; served through the cache and cross-rate
    /// derivation.
    Anchor(Arc<dyn AnchorRateProvider>),
    /// Native pair quote.
    Pair(Arc<dyn PairRateProvider>),
}

impl RateSource {
    pub fn id(&self) -> &str {
        match self {
            RateSource::Anchor(p) => p.id(),
            RateSource::Pair(p) => p.id(),
        }
    }
}

/// Tries each source in priority order and returns the first success.
///
/// Sources are never raced and never retried here; a failure or timeout moves
/// on to the next source.
pub struct FallbackOrchestrator {
    sources: Vec<RateSource>,
    cache: SharedRateCache,
    provider_timeout: Duration,
}

impl FallbackOrchestrator {
    pub fn new(sources: Vec<RateSource>, cache: SharedRateCache) -> Self {
        Self {
            sources,
            cache,
            provider_timeout: constants::provider_timeout().as_std(),
        }
    }

    /// Bound each pair provider attempt. Anchor fetches are bounded by the
    /// cache so that a timed-out refresh can still serve a stale snapshot.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn sources(&self) -> &[RateSource] {
        &self.sources
    }

    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    /// Resolve `1 from = rate to`.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn resolve(&self, from: &CurrencyCode, to: &CurrencyCode) -> FxResult<RateQuote> {
        if from == to {
            return Ok(RateQuote::identity());
        }

        let mut failures = Vec::new();

        for source in &self.sources {
            let attempt = self.attempt(source, from, to).await;

            match attempt {
                Ok(quote) => {
                    debug!(provider = source.id(), rate = quote.rate, "Resolved rate");
                    return Ok(quote);
                }
                Err(e) => {
                    warn!(
                        provider = source.id(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                    failures.push(ProviderFailure {
                        provider: source.id().to_string(),
                        error: e,
                    });
                }
            }
        }

        warn!(attempted = failures.len(), "All providers exhausted");
        Err(FxError::AllProvidersExhausted { failures })
    }

    async fn attempt(
        &self,
        source: &RateSource,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> FxResult<RateQuote> {
        match source {
            RateSource::Anchor(provider) => {
                let snapshot = self
                    .cache
                    .get_or_fetch(provider.anchor(), provider.clone())
                    .await?;
                let rate = cross_rate(&snapshot, from, to)?;
                Ok(RateQuote {
                    rate,
                    as_of: not_after_now(snapshot.as_of),
                    source: snapshot.source.clone(),
                })
            }
            RateSource::Pair(provider) => {
                tokio::time::timeout(self.provider_timeout, provider.fetch_cross_rate(from, to))
                    .await
                    .unwrap_or_else(|_| {
                        Err(FxError::provider(
                            provider.id(),
                            format!("timed out after {}ms", self.provider_timeout.as_millis()),
                        ))
                    })
            }
        }
    }
}
