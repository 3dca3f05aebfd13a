//! Configuration parsing for the cdash backend.
//!
//! Everything is read from a single JSON file. The top-level structure holds
//! logging metadata, fallback-client settings, custom-entry storage and an
//! `endpoints` array where each entry describes one data source in the
//! priority chain.
//!
//! # Example config
//!
//! ```json
//! {
//!   "app": { "module_name": "cdash", "log_path": "/tmp/log" },
//!   "fallback_enabled": true,
//!   "custom_store_path": "custom-cryptos.json",
//!   "endpoints": [
//!     { "name": "CoinGecko", "kind": "coingecko", "priority": 1, "timeout_ms": 8000 },
//!     { "name": "Scraping-Fallback", "kind": "scrape", "priority": 2,
//!       "url": "http://localhost:3000/api/crypto/scrape" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::CdashError;

/// Per-endpoint timeout when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Placeholder logo used for records without an image.
pub const DEFAULT_PLACEHOLDER_LOGO: &str = "/images/coin-placeholder.webp";

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Module metadata (name, log path).
    pub app: Option<ModuleMeta>,

    /// When `false`, only the highest-priority endpoint is attempted.
    pub fallback_enabled: Option<bool>,

    /// Optional bound on the total duration of one priority fetch.
    pub overall_deadline_ms: Option<u64>,

    /// JSON file backing user-submitted entries. In-memory only when unset.
    pub custom_store_path: Option<String>,

    /// Logo URL for records that arrive without one.
    pub placeholder_logo: Option<String>,

    /// Data sources, in any order (the client sorts by priority).
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl AppConfig {
    pub fn module_name(&self) -> String {
        self.app.as_ref().and_then(|m| m.module_name.clone()).unwrap_or_else(|| "cdash".to_string())
    }

    pub fn log_path(&self) -> Option<String> {
        self.app.as_ref().and_then(|m| m.log_path.clone())
    }

    pub fn effective_fallback_enabled(&self) -> bool {
        self.fallback_enabled.unwrap_or(true)
    }

    pub fn overall_deadline(&self) -> Option<Duration> {
        self.overall_deadline_ms.map(Duration::from_millis)
    }

    pub fn effective_placeholder_logo(&self) -> String {
        self.placeholder_logo.clone().unwrap_or_else(|| DEFAULT_PLACEHOLDER_LOGO.to_string())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), CdashError> {
        for (idx, ep) in self.endpoints.iter().enumerate() {
            if ep.name.trim().is_empty() {
                return Err(CdashError::Config(format!("endpoints[{idx}]: name must not be empty")));
            }
            if ep.timeout_ms == Some(0) {
                let msg = format!("endpoint '{}': timeout_ms must be > 0", ep.name);
                return Err(CdashError::Config(msg));
            }
        }
        Ok(())
    }
}

/// Module metadata block.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleMeta {
    pub module_name: Option<String>,
    pub log_path: Option<String>,
}

/// A single data-source endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Provenance label, reported as `source` on success.
    pub name: String,

    /// Handler type: `"coingecko"` or `"scrape"`.
    pub kind: String,

    /// Lower is tried first (default depends on the kind).
    pub priority: Option<i32>,

    /// Per-attempt deadline in milliseconds (default depends on the kind).
    pub timeout_ms: Option<u64>,

    /// REST base URL (`coingecko` kind).
    pub base_url: Option<String>,

    /// Feed URL returning scraped rows as JSON (`scrape` kind).
    pub url: Option<String>,

    /// Extra HTTP headers (e.g. an API key header).
    pub headers: Option<HashMap<String, String>>,
}

impl EndpointConfig {
    pub fn effective_timeout(&self) -> Duration {
        self.timeout_or(DEFAULT_TIMEOUT_MS)
    }

    /// Configured timeout, or `default_ms` when unset.
    pub fn timeout_or(&self, default_ms: u64) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(default_ms))
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    tracing::debug!("[config] {} endpoint(s) in {}", config.endpoints.len(), path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "app": { "module_name": "dash", "log_path": "/tmp/log" },
        "overall_deadline_ms": 20000,
        "endpoints": [
            { "name": "CoinGecko", "kind": "coingecko", "priority": 1, "timeout_ms": 8000 },
            { "name": "Scraping-Fallback", "kind": "scrape", "priority": 2,
              "url": "http://localhost:3000/api/crypto/scrape" }
        ]
    }"#;

    #[test]
    fn parses_sample() {
        let cfg: AppConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.module_name(), "dash");
        assert_eq!(cfg.log_path().as_deref(), Some("/tmp/log"));
        assert!(cfg.effective_fallback_enabled());
        assert_eq!(cfg.overall_deadline(), Some(Duration::from_secs(20)));
        assert_eq!(cfg.endpoints.len(), 2);
        assert_eq!(cfg.endpoints[0].effective_timeout(), Duration::from_millis(8000));
        assert_eq!(cfg.endpoints[1].effective_timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(cfg.endpoints[1].timeout_or(2500), Duration::from_millis(2500));
        assert_eq!(cfg.endpoints[1].priority, Some(2));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn defaults_for_empty_config() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.module_name(), "cdash");
        assert_eq!(cfg.effective_placeholder_logo(), DEFAULT_PLACEHOLDER_LOGO);
        assert!(cfg.endpoints.is_empty());
        assert!(cfg.overall_deadline().is_none());
    }

    #[test]
    fn rejects_zero_timeout() {
        let json = r#"{"endpoints":[{"name":"a","kind":"scrape","timeout_ms":0}]}"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(cfg.validate(), Err(CdashError::Config(_))));
    }
}
