//! Endpoint registry: builds priority-client endpoints from config.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use cdash_core::config::{AppConfig, EndpointConfig};
use cdash_md::{NormalizerRegistry, PriorityClient, SourceEndpoint};
use tracing::info;

use crate::coingecko::{self, CoinGeckoHandler};
use crate::scrape::{self, HttpListingScraper, ScrapeFeedHandler};

const COINGECKO_PRIORITY: i32 = 1;
const SCRAPE_PRIORITY: i32 = 2;

/// Create a [`SourceEndpoint`] based on the `kind` field in the config.
pub fn build_endpoint(
    config: &EndpointConfig,
    registry: Arc<NormalizerRegistry>,
) -> Result<SourceEndpoint> {
    let kind = config.kind.to_lowercase();
    let headers = config.headers.clone().unwrap_or_default();

    let endpoint = match kind.as_str() {
        "coingecko" => {
            let base_url = config.base_url.as_deref().unwrap_or(coingecko::DEFAULT_BASE_URL);
            let handler = CoinGeckoHandler::new(base_url, registry).with_headers(headers);
            let priority = config.priority.unwrap_or(COINGECKO_PRIORITY);
            SourceEndpoint::new(&config.name, priority, Arc::new(handler))
                .with_timeout(config.timeout_or(coingecko::DEFAULT_TIMEOUT_MS))
        }
        "scrape" => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| anyhow!("endpoint '{}': scrape kind requires `url`", config.name))?;
            let scraper = HttpListingScraper::new(url).with_headers(headers);
            let handler = ScrapeFeedHandler::new(Arc::new(scraper), registry);
            let priority = config.priority.unwrap_or(SCRAPE_PRIORITY);
            SourceEndpoint::new(&config.name, priority, Arc::new(handler))
                .with_timeout(config.timeout_or(scrape::DEFAULT_TIMEOUT_MS))
        }
        other => return Err(anyhow!("Unknown endpoint kind: {other}")),
    };

    Ok(endpoint)
}

/// Build a fully configured [`PriorityClient`] from the app config.
pub fn build_client(
    config: &AppConfig,
    registry: Arc<NormalizerRegistry>,
) -> Result<PriorityClient> {
    let mut client = PriorityClient::new();
    if let Some(deadline) = config.overall_deadline() {
        client = client.with_overall_deadline(deadline);
    }
    client.set_fallback_enabled(config.effective_fallback_enabled());

    for (idx, ep) in config.endpoints.iter().enumerate() {
        let endpoint = build_endpoint(ep, Arc::clone(&registry))
            .map_err(|e| anyhow!("endpoints[{idx}]: {e}"))?;
        info!("[registry] endpoints[{idx}]: '{}' (kind={})", ep.name, ep.kind);
        client.add_endpoint(endpoint);
    }

    Ok(client)
}
