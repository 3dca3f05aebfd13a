//! Request orchestration.
//!
//! Sits between the CLI and the priority client: builds request params with
//! listing defaults, prepends stored custom entries to the fetched listing,
//! fills missing logos and maps every outcome to a JSON envelope.
//!
//! ```text
//! markets(params)
//!   ├─ fetch_crypto_data ── Err ──► { success: false, error, details }
//!   ├─ resolve missing logos (concurrently)
//!   └─ custom ++ listing ─────────► { success, data, source, customCount, timestamp }
//! ```

use std::sync::Arc;

use cdash_core::{CanonicalCurrency, MarketDataParams, time_util};
use cdash_md::PriorityClient;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::logo::LogoResolver;
use crate::store::{CustomCryptoStore, NewCryptoForm, StoredCrypto};

pub const DEFAULT_VS_CURRENCY: &str = "usd";
pub const DEFAULT_ORDER: &str = "market_cap_desc";
pub const DEFAULT_PER_PAGE: u32 = 100;

const UNAVAILABLE: &str = "All data sources are currently unavailable";

/// Listing request params with defaults applied. Zero page values count as unset.
pub fn listing_params(
    vs_currency: &str,
    order: &str,
    per_page: u32,
    page: u32,
) -> MarketDataParams {
    let vs_currency = if vs_currency.is_empty() { DEFAULT_VS_CURRENCY } else { vs_currency };
    let order = if order.is_empty() { DEFAULT_ORDER } else { order };
    let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
    MarketDataParams::new(vs_currency).with_order(order).with_page(per_page, page.max(1))
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// `{ success: true, ... }` or `{ success: false, error, details }`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Ok(T),
    Err(ErrorBody),
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub details: String,
}

impl ErrorBody {
    fn new(error: &str, details: impl ToString) -> Self {
        Self { success: false, error: error.to_string(), details: details.to_string() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketsBody {
    pub success: bool,
    pub data: Vec<CanonicalCurrency>,
    pub source: String,
    pub custom_count: usize,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct CustomListBody {
    pub success: bool,
    pub data: Vec<CanonicalCurrency>,
    pub count: usize,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct CustomAddedBody {
    pub success: bool,
    pub data: StoredCrypto,
    pub message: String,
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// MarketService
// ---------------------------------------------------------------------------

pub struct MarketService {
    client: Arc<PriorityClient>,
    store: Arc<RwLock<CustomCryptoStore>>,
    logos: Arc<dyn LogoResolver>,
    placeholder_logo: String,
}

impl MarketService {
    pub fn new(
        client: Arc<PriorityClient>,
        store: Arc<RwLock<CustomCryptoStore>>,
        logos: Arc<dyn LogoResolver>,
        placeholder_logo: impl Into<String>,
    ) -> Self {
        Self { client, store, logos, placeholder_logo: placeholder_logo.into() }
    }

    pub fn client(&self) -> &PriorityClient {
        &self.client
    }

    /// Fetched listing with custom entries in front.
    pub async fn markets(&self, params: &MarketDataParams) -> Envelope<MarketsBody> {
        let result = match self.client.fetch_crypto_data(params).await {
            Ok(r) => r,
            Err(e) => {
                error!("[service] {e}");
                return Envelope::Err(ErrorBody::new(UNAVAILABLE, e));
            }
        };

        let listing = self.resolve_logos(result.data).await;
        let custom: Vec<CanonicalCurrency> =
            self.store.read().await.all().iter().map(StoredCrypto::to_canonical).collect();
        let custom_count = custom.len();

        info!(
            "[service] {} listed + {custom_count} custom record(s) from '{}'",
            listing.len(),
            result.source
        );

        let mut data = custom;
        data.extend(listing);
        Envelope::Ok(MarketsBody {
            success: true,
            data,
            source: result.source,
            custom_count,
            timestamp: result.timestamp,
        })
    }

    pub async fn custom_list(&self) -> Envelope<CustomListBody> {
        let data: Vec<CanonicalCurrency> =
            self.store.read().await.all().iter().map(StoredCrypto::to_canonical).collect();
        let count = data.len();
        Envelope::Ok(CustomListBody { success: true, count, data, timestamp: time_util::now_ms() })
    }

    /// Validate and store a submitted entry.
    pub async fn add_custom(&self, form: NewCryptoForm) -> Envelope<CustomAddedBody> {
        let form = match form.validate() {
            Ok(f) => f,
            Err(e) => {
                warn!("[service] rejected submission: {e}");
                return Envelope::Err(ErrorBody::new("Validation failed", e));
            }
        };

        let entry = StoredCrypto::from_form(form, &self.placeholder_logo);
        if let Err(e) = self.store.write().await.add(entry.clone()) {
            error!("[service] failed to store '{}': {e}", entry.id);
            return Envelope::Err(ErrorBody::new("Failed to create cryptocurrency", e));
        }

        info!("[service] added custom entry '{}'", entry.id);
        Envelope::Ok(CustomAddedBody {
            success: true,
            data: entry,
            message: "Cryptocurrency added successfully".into(),
            timestamp: time_util::now_ms(),
        })
    }

    /// Fill `image` on records that lack one; lookups run concurrently.
    async fn resolve_logos(&self, records: Vec<CanonicalCurrency>) -> Vec<CanonicalCurrency> {
        let logos = &*self.logos;
        join_all(records.into_iter().map(|mut record| async move {
            if record.needs_logo() {
                record.image = Some(logos.resolve(&record.symbol, &record.name).await);
            }
            record
        }))
        .await
    }
}
