//! FxQuote FX Engine
//!
//! Resolves exchange rates for a currency pair from an ordered set of external
//! providers.
//!
//! # Features
//!
//! - Ordered provider fallback, first success wins
//! - Anchor snapshot cache with a freshness window, single-flight refresh and
//!   serve-stale-on-error
//! - Cross-rate derivation from anchor-based feeds
//! - Best-effort daily history with 1, 7 and 30 point trend changes
//!
//! # Example
//!
//! ```rust,ignore
//! use fxquote_fx::{FxEngine, FxEngineConfig};
//!
//! let engine = FxEngine::from_config(&FxEngineConfig::from_env())?;
//!
//! let quote = engine.quote(100.0, "GBP", "USD").await?;
//! println!("{} {} = {} {}", quote.amount, quote.from, quote.converted, quote.to);
//! ```

pub mod engine;
pub mod config;
pub mod provider;
pub mod feeds;
pub mod cache;
pub mod cross_rate;
pub mod orchestrator;
pub mod trend;
pub mod quote;
pub mod error;

pub use engine::FxEngine;
pub use config::{FxEngineConfig, ProviderEndpoint};
pub use provider::{AnchorRateProvider, HistoryProvider, PairRateProvider};
pub use cache::{RateCache, RateCacheConfig, SharedRateCache};
pub use cross_rate::cross_rate;
pub use orchestrator::{FallbackOrchestrator, RateSource};
pub use trend::{trend_changes, HistoryTrend, TrendAnalyzer};
pub use quote::Quote;
pub use error::{FxError, FxResult, ProviderFailure};
