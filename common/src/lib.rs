//! FxQuote Common Types
//!
//! Shared types for the fxquote engine: currency codes, rate quotes, anchor
//! snapshots, history points, and time helpers.

pub mod monetary;
pub mod rates;
pub mod error;
pub mod time;

pub use monetary::*;
pub use rates::*;
pub use error::*;
pub use time::*;
