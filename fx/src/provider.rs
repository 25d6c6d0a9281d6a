//! Rate provider traits and test doubles.

use async_trait::async_trait;
use chrono::NaiveDate;
use fxquote_common::{AnchorSnapshot, CurrencyCode, HistoryPoint, RateQuote};

use crate::error::FxResult;

/// A provider that returns a full rate table relative to an anchor currency.
#[async_trait]
pub trait AnchorRateProvider: Send + Sync {
    /// Provider identifier, used as the `source` of derived quotes.
    fn id(&self) -> &str;

    /// The anchor currency this feed is queried with.
    fn anchor(&self) -> &CurrencyCode;

    /// Fetch every rate quoted against `anchor`. One outbound request.
    async fn fetch_anchor_rates(&self, anchor: &CurrencyCode) -> FxResult<AnchorSnapshot>;
}

/// A provider that quotes a pair directly.
#[async_trait]
pub trait PairRateProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Fetch the `from -> to` rate. One outbound request.
    async fn fetch_cross_rate(&self, from: &CurrencyCode, to: &CurrencyCode)
        -> FxResult<RateQuote>;
}

/// A provider capable of daily time-series queries.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Daily `from -> to` rates between `start` and `end` inclusive. Order is
    /// not guaranteed.
    async fn fetch_series(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FxResult<Vec<HistoryPoint>>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockAnchorProvider, MockHistoryProvider, MockPairProvider};

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::FxError;
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Shared knobs for every mock: call counting, forced failure, latency.
    #[derive(Default)]
    struct Behaviour {
        calls: AtomicUsize,
        failing: AtomicBool,
        delay_ms: AtomicU64,
    }

    impl Behaviour {
        async fn enter(&self, id: &str) -> FxResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(FxError::provider(id, "mock failure"));
            }
            Ok(())
        }
    }

    macro_rules! behaviour_accessors {
        () => {
            /// Number of fetches issued so far.
            pub fn calls(&self) -> usize {
                self.behaviour.calls.load(Ordering::SeqCst)
            }

            /// Make every subsequent fetch fail.
            pub fn set_failing(&self, failing: bool) {
                self.behaviour.failing.store(failing, Ordering::SeqCst);
            }

            /// Delay every subsequent fetch.
            pub fn set_delay(&self, delay: Duration) {
                self.behaviour
                    .delay_ms
                    .store(delay.as_millis() as u64, Ordering::SeqCst);
            }
        };
    }

    /// Mock anchor-based provider.
    pub struct MockAnchorProvider {
        id: String,
        anchor: CurrencyCode,
        rates: DashMap<CurrencyCode, f64>,
        behaviour: Behaviour,
    }

    impl MockAnchorProvider {
        pub fn new(id: impl Into<String>, anchor: CurrencyCode) -> Self {
            Self {
                id: id.into(),
                anchor,
                rates: DashMap::new(),
                behaviour: Behaviour::default(),
            }
        }

        /// Set `1 anchor = rate code`.
        pub fn set_rate(&self, code: CurrencyCode, rate: f64) {
            self.rates.insert(code, rate);
        }

        /// Builder form of [`set_rate`](Self::set_rate).
        pub fn with_rate(self, code: &str, rate: f64) -> Self {
            if let Ok(code) = CurrencyCode::parse(code) {
                self.set_rate(code, rate);
            }
            self
        }

        behaviour_accessors!();
    }

    #[async_trait]
    impl AnchorRateProvider for MockAnchorProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn anchor(&self) -> &CurrencyCode {
            &self.anchor
        }

        async fn fetch_anchor_rates(&self, anchor: &CurrencyCode) -> FxResult<AnchorSnapshot> {
            self.behaviour.enter(&self.id).await?;

            if *anchor != self.anchor {
                return Err(FxError::provider(
                    &self.id,
                    format!("unsupported anchor {}", anchor),
                ));
            }

            let rates = self
                .rates
                .iter()
                .map(|r| (r.key().clone(), *r.value()))
                .collect();
            Ok(AnchorSnapshot::new(anchor.clone(), rates, self.id.clone()))
        }
    }

    /// Mock direct-pair provider.
    pub struct MockPairProvider {
        id: String,
        rates: DashMap<String, f64>,
        behaviour: Behaviour,
    }

    impl MockPairProvider {
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                rates: DashMap::new(),
                behaviour: Behaviour::default(),
            }
        }

        pub fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) {
            self.rates.insert(format!("{}/{}", from, to), rate);
        }

        behaviour_accessors!();
    }

    #[async_trait]
    impl PairRateProvider for MockPairProvider {
        fn id(&self) -> &str {
            &self.id
        }

        async fn fetch_cross_rate(
            &self,
            from: &CurrencyCode,
            to: &CurrencyCode,
        ) -> FxResult<RateQuote> {
            self.behaviour.enter(&self.id).await?;

            self.rates
                .get(&format!("{}/{}", from, to))
                .map(|r| RateQuote::new(*r, self.id.clone()))
                .ok_or_else(|| FxError::provider(&self.id, format!("no rate for {}/{}", from, to)))
        }
    }

    /// Mock time-series provider returning a fixed set of points.
    pub struct MockHistoryProvider {
        id: String,
        points: Mutex<Vec<HistoryPoint>>,
        behaviour: Behaviour,
    }

    impl MockHistoryProvider {
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                points: Mutex::new(Vec::new()),
                behaviour: Behaviour::default(),
            }
        }

        pub fn set_points(&self, points: Vec<HistoryPoint>) {
            *self.points.lock() = points;
        }

        behaviour_accessors!();
    }

    #[async_trait]
    impl HistoryProvider for MockHistoryProvider {
        fn id(&self) -> &str {
            &self.id
        }

        async fn fetch_series(
            &self,
            _from: &CurrencyCode,
            _to: &CurrencyCode,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> FxResult<Vec<HistoryPoint>> {
            self.behaviour.enter(&self.id).await?;
            Ok(self.points.lock().clone())
        }
    }
}
