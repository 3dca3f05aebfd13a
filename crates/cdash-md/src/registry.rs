//! Normalizer registry — maps a [`SourceKind`] to its [`Normalizer`].
//!
//! The registry is an explicitly constructed value (share it via `Arc`), so
//! tests and embedders can build isolated registries. Adding a source shape
//! means registering one more normalizer under a new kind; neither the
//! detector nor the existing normalizers change.

use std::sync::Arc;

use ahash::AHashMap;
use cdash_core::{CanonicalCurrency, SourceKind};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::Normalizer;
use crate::coingecko::CoinGeckoNormalizer;
use crate::detect::detect_data_source;
use crate::scraping::ScrapingNormalizer;

/// Batch normalization failures. A batch is never partially normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The payload matches no known source shape.
    #[error("unable to detect data source from provided data")]
    UnknownSource,

    /// No normalizer is registered for the kind.
    #[error("no normalizer found for data source: {0}")]
    NoNormalizer(SourceKind),

    /// The payload failed the normalizer's structural checks.
    #[error("data validation failed for source: {0}")]
    Validation(SourceKind),
}

/// Registry of normalizers keyed by source kind.
#[derive(Clone, Default)]
pub struct NormalizerRegistry {
    normalizers: AHashMap<SourceKind, Arc<dyn Normalizer>>,
}

impl NormalizerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in CoinGecko and scraping normalizers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CoinGeckoNormalizer);
        registry.register(ScrapingNormalizer);
        registry
    }

    /// Register a normalizer under its own [`Normalizer::kind`].
    pub fn register(&mut self, normalizer: impl Normalizer + 'static) {
        self.register_normalizer(normalizer.kind(), normalizer);
    }

    /// Register (or replace) the normalizer for `kind`.
    pub fn register_normalizer(&mut self, kind: SourceKind, normalizer: impl Normalizer + 'static) {
        debug!("[registry] registering normalizer for '{kind}'");
        self.normalizers.insert(kind, Arc::new(normalizer));
    }

    pub fn get_normalizer(
        &self,
        kind: &SourceKind,
    ) -> Result<Arc<dyn Normalizer>, NormalizeError> {
        self.normalizers
            .get(kind)
            .cloned()
            .ok_or_else(|| NormalizeError::NoNormalizer(kind.clone()))
    }

    /// Labels of every registered kind, sorted.
    pub fn registered_sources(&self) -> Vec<String> {
        let mut labels: Vec<String> =
            self.normalizers.keys().map(|k| k.label().to_string()).collect();
        labels.sort();
        labels
    }

    /// Detect the source shape, validate, then normalize.
    pub fn normalize_data(&self, raw: &Value) -> Result<Vec<CanonicalCurrency>, NormalizeError> {
        let kind = detect_data_source(raw).ok_or(NormalizeError::UnknownSource)?;
        debug!("[registry] detected source '{kind}'");
        self.normalize_data_with_source(raw, &kind)
    }

    /// Validate and normalize with a caller-supplied source kind.
    pub fn normalize_data_with_source(
        &self,
        raw: &Value,
        kind: &SourceKind,
    ) -> Result<Vec<CanonicalCurrency>, NormalizeError> {
        let normalizer = self.get_normalizer(kind)?;
        if !normalizer.validate(raw) {
            return Err(NormalizeError::Validation(kind.clone()));
        }
        let items = raw.as_array().ok_or_else(|| NormalizeError::Validation(kind.clone()))?;
        Ok(normalizer.normalize(items))
    }
}

impl std::fmt::Debug for NormalizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizerRegistry").field("sources", &self.registered_sources()).finish()
    }
}
