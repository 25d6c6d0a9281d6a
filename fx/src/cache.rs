//! Anchor snapshot cache with freshness window, single-flight refresh and
//! serve-stale-on-error.

use chrono::Duration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use fxquote_common::{
    constants, is_within, now, AnchorSnapshot, CurrencyCode, DurationExt, Timestamp,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::provider::AnchorRateProvider;

/// Cached snapshot entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<AnchorSnapshot>,
    stored_at: Timestamp,
}

impl CacheEntry {
    fn new(snapshot: Arc<AnchorSnapshot>) -> Self {
        Self {
            snapshot,
            stored_at: now(),
        }
    }

    fn is_fresh(&self, window: Duration) -> bool {
        is_within(self.stored_at, window)
    }
}

type SharedFetch = Shared<BoxFuture<'static, FxResult<Arc<AnchorSnapshot>>>>;

/// An outstanding refresh that concurrent callers join.
struct InFlight {
    generation: u64,
    fetch: SharedFetch,
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a stored snapshot is served without refetching.
    pub freshness_window: Duration,
    /// Upper bound on one provider fetch. Expiry counts as a failed refresh.
    pub fetch_timeout: StdDuration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: constants::cache_freshness_window(),
            fetch_timeout: constants::provider_timeout().as_std(),
        }
    }
}

/// Thread-safe anchor snapshot cache, keyed by anchor currency.
///
/// One snapshot serves every pair that can be derived from it. Stale entries
/// are never removed by a failed refresh; they are served until a fetch
/// succeeds.
pub struct RateCache {
    entries: Arc<DashMap<CurrencyCode, CacheEntry>>,
    in_flight: DashMap<CurrencyCode, InFlight>,
    generation: AtomicU64,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
            config,
        }
    }

    /// Return the fresh snapshot for `anchor`, fetching through `provider` on a
    /// miss or expiry.
    ///
    /// Concurrent callers missing on the same anchor share one fetch and its
    /// outcome. If the fetch fails and any earlier snapshot exists, that
    /// snapshot is returned instead of the error.
    pub async fn get_or_fetch(
        &self,
        anchor: &CurrencyCode,
        provider: Arc<dyn AnchorRateProvider>,
    ) -> FxResult<Arc<AnchorSnapshot>> {
        if let Some(snapshot) = self.get_fresh(anchor) {
            debug!(anchor = %anchor, "Cache hit");
            return Ok(snapshot);
        }

        let (generation, fetch) = match self.in_flight.entry(anchor.clone()) {
            Entry::Occupied(entry) => {
                debug!(anchor = %anchor, "Joining in-flight fetch");
                (entry.get().generation, entry.get().fetch.clone())
            }
            Entry::Vacant(entry) => {
                // A fetch may have landed between the first check and taking the slot.
                if let Some(snapshot) = self.get_fresh(anchor) {
                    return Ok(snapshot);
                }

                debug!(anchor = %anchor, provider = provider.id(), "Cache miss, fetching");
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let fetch = Self::refresh(
                    self.entries.clone(),
                    anchor.clone(),
                    provider,
                    self.config.fetch_timeout,
                )
                .boxed()
                .shared();
                entry.insert(InFlight {
                    generation,
                    fetch: fetch.clone(),
                });
                (generation, fetch)
            }
        };

        let result = fetch.await;
        self.in_flight
            .remove_if(anchor, |_, in_flight| in_flight.generation == generation);
        result
    }

    async fn refresh(
        entries: Arc<DashMap<CurrencyCode, CacheEntry>>,
        anchor: CurrencyCode,
        provider: Arc<dyn AnchorRateProvider>,
        timeout: StdDuration,
    ) -> FxResult<Arc<AnchorSnapshot>> {
        let fetched = tokio::time::timeout(timeout, provider.fetch_anchor_rates(&anchor))
            .await
            .unwrap_or_else(|_| {
                Err(FxError::provider(
                    provider.id(),
                    format!("timed out after {}ms", timeout.as_millis()),
                ))
            });
        let fetched = fetched.and_then(|snapshot| {
            if snapshot.anchor != anchor {
                return Err(FxError::provider(
                    provider.id(),
                    format!("asked for {} rates, got {}", anchor, snapshot.anchor),
                ));
            }
            Ok(snapshot)
        });

        match fetched {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                entries.insert(anchor.clone(), CacheEntry::new(snapshot.clone()));
                debug!(anchor = %anchor, rates = snapshot.len(), "Stored snapshot");
                Ok(snapshot)
            }
            Err(e) => match entries.get(&anchor) {
                Some(stale) => {
                    warn!(
                        anchor = %anchor,
                        provider = provider.id(),
                        stored_at = %stale.stored_at,
                        error = %e,
                        "Refresh failed, serving stale snapshot"
                    );
                    Ok(stale.snapshot.clone())
                }
                None => Err(e),
            },
        }
    }

    fn get_fresh(&self, anchor: &CurrencyCode) -> Option<Arc<AnchorSnapshot>> {
        self.entries
            .get(anchor)
            .filter(|entry| entry.is_fresh(self.config.freshness_window))
            .map(|entry| entry.snapshot.clone())
    }

    /// Snapshot for `anchor` regardless of age.
    pub fn peek(&self, anchor: &CurrencyCode) -> Option<Arc<AnchorSnapshot>> {
        self.entries.get(anchor).map(|entry| entry.snapshot.clone())
    }

    /// Store a snapshot directly, replacing any entry for its anchor.
    pub fn insert(&self, snapshot: AnchorSnapshot) -> Arc<AnchorSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.entries
            .insert(snapshot.anchor.clone(), CacheEntry::new(snapshot.clone()));
        snapshot
    }

    /// Drop the entry for `anchor`.
    pub fn invalidate(&self, anchor: &CurrencyCode) {
        self.entries.remove(anchor);
    }

    /// Clear all cached snapshots.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let (total, fresh) = self.entries.iter().fold((0, 0), |(total, fresh), entry| {
            let is_fresh = entry.is_fresh(self.config.freshness_window);
            (total + 1, fresh + usize::from(is_fresh))
        });

        CacheStats {
            total_entries: total,
            fresh_entries: fresh,
            stale_entries: total - fresh,
            in_flight: self.in_flight.len(),
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
    pub in_flight: usize,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
