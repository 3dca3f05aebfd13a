//! # cdash-md
//!
//! Market data acquisition and normalization.
//!
//! ## Architecture
//!
//! ```text
//! MarketDataParams ──► PriorityClient ──► endpoint 1 ──(fail / timeout)──► endpoint 2 ──► ...
//!                                             │
//!                                             ▼
//!                       raw JSON ──► NormalizerRegistry ──► Vec<CanonicalCurrency>
//! ```
//!
//! Each source shape provides a [`Normalizer`]; the [`registry`] maps a
//! [`SourceKind`] to its normalizer and the [`detect`] module infers the
//! kind of an untyped payload. The [`priority`] client runs endpoint
//! handlers in priority order with per-endpoint timeouts.
//!
//! ## Modules
//!
//! - [`coingecko`] — numeric REST API shape
//! - [`scraping`] — text-scraped listing shape
//! - [`detect`] — source auto-detection heuristic
//! - [`registry`] — normalizer registry and batch normalization
//! - [`priority`] — priority fallback client
//! - [`json_util`] — lenient JSON field helpers

pub mod coingecko;
pub mod detect;
pub mod json_util;
pub mod priority;
pub mod registry;
pub mod scraping;

use cdash_core::{CanonicalCurrency, SourceKind};
use serde_json::Value;

pub use priority::{
    AttemptError, CancelSignal, EndpointFailure, EndpointHandler, FetchError, PriorityClient,
    SourceEndpoint, handler_fn,
};
pub use registry::{NormalizeError, NormalizerRegistry};

/// Converter for one raw source shape.
///
/// Implementations are pure: the same input always yields the same output,
/// and neither method panics on malformed data.
pub trait Normalizer: Send + Sync {
    /// The source shape this normalizer understands.
    fn kind(&self) -> SourceKind;

    /// `true` only if `raw` is an array whose every element carries the
    /// required fields with the right JSON types.
    fn validate(&self, raw: &Value) -> bool;

    /// Convert every element. Malformed numeric sub-fields degrade to the
    /// display defaults instead of failing the batch.
    fn normalize(&self, raw: &[Value]) -> Vec<CanonicalCurrency>;
}
