//! Scraped-listing fallback source.
//!
//! The listing rows come from an opaque [`ListingScraper`]; how a scraper
//! extracts them (HTML selectors, a sidecar service) is not this crate's
//! concern. Rows arrive as display strings in the scraped shape:
//!
//! ```json
//! { "id": "Bitcoin_…", "rank": "1", "name": "Bitcoin", "symbol": "BTC",
//!   "price": "$64,012.33", "change24h": "1.25%", "volume24h": "$31.4B",
//!   "marketCap": "$1.26T", "image": "https://…" }
//! ```
//!
//! [`ScrapeFeedHandler`] paginates client-side, assigns ids to rows that lack
//! one and normalizes with [`SourceKind::Scraping`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cdash_core::error::CdashError;
use cdash_core::{CanonicalCurrency, MarketDataParams, SourceKind};
use cdash_md::{CancelSignal, EndpointHandler, NormalizerRegistry};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Per-attempt timeout when the endpoint config sets none.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const DEFAULT_PER_PAGE: u32 = 100;

/// Source of raw scraped listing rows.
#[async_trait]
pub trait ListingScraper: Send + Sync {
    /// The full listing, in rank order.
    async fn scrape(&self) -> Result<Vec<Value>>;
}

/// Scraper that GETs a JSON array of rows from a feed URL.
pub struct HttpListingScraper {
    http: reqwest::Client,
    url: String,
    headers: HashMap<String, String>,
}

impl HttpListingScraper {
    pub fn new(url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), url: url.into(), headers: HashMap::new() }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

#[async_trait]
impl ListingScraper for HttpListingScraper {
    async fn scrape(&self) -> Result<Vec<Value>> {
        let mut req = self.http.get(&self.url);
        for (name, value) in &self.headers {
            req = req.header(name, value);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("scrape feed request to {} failed", self.url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CdashError::Http(format!("HTTP {}", status.as_u16())).into());
        }

        let body: Value = resp.json().await.context("scrape feed body is not JSON")?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => {
                let kind = kind_of(&other);
                Err(CdashError::Parse(format!("expected a JSON array of rows, got {kind}")).into())
            }
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Endpoint handler over a [`ListingScraper`].
pub struct ScrapeFeedHandler {
    scraper: Arc<dyn ListingScraper>,
    registry: Arc<NormalizerRegistry>,
}

impl ScrapeFeedHandler {
    pub fn new(scraper: Arc<dyn ListingScraper>, registry: Arc<NormalizerRegistry>) -> Self {
        Self { scraper, registry }
    }
}

#[async_trait]
impl EndpointHandler for ScrapeFeedHandler {
    async fn fetch(
        &self,
        params: &MarketDataParams,
        _cancel: CancelSignal,
    ) -> Result<Vec<CanonicalCurrency>> {
        let rows = self.scraper.scrape().await?;
        let total = rows.len();

        let mut page: Vec<Value> = paginate(rows, params.per_page, params.page);
        page.iter_mut().for_each(assign_id);
        debug!("[scrape] {} of {total} row(s) on requested page", page.len());

        Ok(self.registry.normalize_data_with_source(&Value::Array(page), &SourceKind::Scraping)?)
    }
}

/// Slice `[(page-1)*per_page, +per_page)`; page numbers start at 1 and
/// page 0 is an empty page.
fn paginate(rows: Vec<Value>, per_page: Option<u32>, page: Option<u32>) -> Vec<Value> {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE) as usize;
    let Some(skipped_pages) = (page.unwrap_or(1) as usize).checked_sub(1) else {
        return Vec::new();
    };
    let start = skipped_pages.saturating_mul(per_page);
    rows.into_iter().skip(start).take(per_page).collect()
}

/// Give an id-less row the id `"{name}_{uuid}"`.
fn assign_id(row: &mut Value) {
    let Some(obj) = row.as_object_mut() else {
        return;
    };
    let has_id = obj.get("id").and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    if !has_id {
        let name = obj.get("name").and_then(Value::as_str).unwrap_or("unknown");
        let id = format!("{name}_{}", Uuid::new_v4());
        obj.insert("id".into(), Value::String(id));
    }
}
