//! The canonical currency record every data source converges to.
//!
//! All fields are **display-ready strings**: the normalizers own numeric
//! formatting, abbreviation and rounding, so consumers can render a record
//! without touching numbers again.

use serde::{Deserialize, Serialize};

/// A normalized, display-ready cryptocurrency listing row.
///
/// Serialized with camelCase keys (`change24h`, `volume24h`, `marketCap`);
/// `image` and `marketCap` are omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCurrency {
    /// Stable unique identifier (source-provided or derived).
    pub id: String,
    /// Market-cap rank as display text, `"0"` when unknown.
    pub rank: String,
    pub name: String,
    /// Ticker, always upper-case.
    pub symbol: String,
    /// Currency-prefixed display price (e.g. `"$1,234.50"`).
    pub price: String,
    /// Logo URL. `None` is valid; the orchestration layer resolves it later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Signed percentage (e.g. `"+1.23%"`).
    pub change24h: String,
    /// Abbreviated volume (e.g. `"$2.50B"`).
    pub volume24h: String,
    /// Abbreviated market cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,
}

impl CanonicalCurrency {
    /// Returns `true` if the record has no usable logo URL.
    pub fn needs_logo(&self) -> bool {
        self.image.as_deref().is_none_or(|s| s.trim().is_empty())
    }
}
