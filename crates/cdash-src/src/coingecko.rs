//! CoinGecko-style numeric REST source.
//!
//! # REST endpoints
//!
//! | Operation      | Method | Path             |
//! |----------------|--------|------------------|
//! | Market listing | GET    | `/coins/markets` |
//!
//! Request parameters are forwarded verbatim as the query string. The JSON
//! body is normalized with [`SourceKind::CoinGecko`]; a non-2xx status, a
//! non-JSON body or a failed validation fails the attempt.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cdash_core::error::CdashError;
use cdash_core::{CanonicalCurrency, MarketDataParams, SourceKind};
use cdash_md::{CancelSignal, EndpointHandler, NormalizerRegistry};
use serde_json::Value;
use tracing::debug;

/// Public API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Per-attempt timeout when the endpoint config sets none.
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Handler for the `/coins/markets` listing.
pub struct CoinGeckoHandler {
    http: reqwest::Client,
    /// REST base URL, without trailing slash.
    base_url: String,
    /// Extra request headers (e.g. `x-cg-demo-api-key`).
    headers: HashMap<String, String>,
    registry: Arc<NormalizerRegistry>,
}

impl CoinGeckoHandler {
    pub fn new(base_url: impl Into<String>, registry: Arc<NormalizerRegistry>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: HashMap::new(),
            registry,
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Full request URL for `params`.
    pub fn markets_url(&self, params: &MarketDataParams) -> String {
        let query = params
            .to_query_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/coins/markets?{query}", self.base_url)
    }

    /// Normalize a decoded response body.
    fn decode(&self, body: &Value) -> Result<Vec<CanonicalCurrency>> {
        Ok(self.registry.normalize_data_with_source(body, &SourceKind::CoinGecko)?)
    }
}

#[async_trait]
impl EndpointHandler for CoinGeckoHandler {
    async fn fetch(
        &self,
        params: &MarketDataParams,
        _cancel: CancelSignal,
    ) -> Result<Vec<CanonicalCurrency>> {
        let url = self.markets_url(params);
        debug!("[coingecko] GET {url}");

        let mut req = self.http.get(&url).header("accept", "application/json");
        for (name, value) in &self.headers {
            req = req.header(name, value);
        }

        let resp = req.send().await.context("coin markets request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CdashError::Http(format!("HTTP {}", status.as_u16())).into());
        }

        let text = resp.text().await.context("failed to read coin markets body")?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| CdashError::Parse(format!("coin markets body: {e}")))?;
        let data = self.decode(&body)?;
        debug!("[coingecko] normalized {} record(s)", data.len());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdash_core::ParamValue;
    use serde_json::json;

    fn handler() -> CoinGeckoHandler {
        let registry = Arc::new(NormalizerRegistry::with_defaults());
        CoinGeckoHandler::new("https://api.example.com/v3/", registry)
    }

    #[test]
    fn builds_markets_url() {
        let params = MarketDataParams::new("usd")
            .with_order("market_cap_desc")
            .with_page(20, 2)
            .with_extra("sparkline", ParamValue::Bool(false));
        assert_eq!(
            handler().markets_url(&params),
            concat!(
                "https://api.example.com/v3/coins/markets",
                "?vs_currency=usd&order=market_cap_desc&per_page=20&page=2&sparkline=false",
            )
        );
    }

    #[test]
    fn encodes_query_values() {
        let params = MarketDataParams::new("usd")
            .with_extra("ids", ParamValue::Str("bitcoin,ethereum".into()));
        assert!(handler().markets_url(&params).ends_with("ids=bitcoin%2Cethereum"));
    }

    #[test]
    fn decodes_listing() {
        let body = json!([{
            "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
            "image": "https://example.com/btc.png",
            "current_price": 1234.5, "market_cap": 2_500_000_000.0, "market_cap_rank": 1,
            "total_volume": 999, "price_change_percentage_24h": 2.1
        }]);
        let out = handler().decode(&body).unwrap();
        assert_eq!(out[0].price, "$1,234.50");
        assert_eq!(out[0].market_cap.as_deref(), Some("$2.50B"));
        assert_eq!(out[0].change24h, "+2.10%");
    }

    #[test]
    fn rejects_error_bodies() {
        let err = handler().decode(&json!({"status": {"error_code": 429}})).unwrap_err();
        assert_eq!(err.to_string(), "data validation failed for source: coinGecko");
    }
}
