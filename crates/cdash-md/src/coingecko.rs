//! Normalizer for the numeric REST market-data shape (CoinGecko `/coins/markets`).
//!
//! Raw fields used:
//!
//! | Raw field                     | Canonical field | Rule                         |
//! |-------------------------------|-----------------|------------------------------|
//! | `market_cap_rank`             | `rank`          | text, `"0"` when absent      |
//! | `current_price`               | `price`         | [`format_price`]             |
//! | `price_change_percentage_24h` | `change24h`     | [`format_percentage`]        |
//! | `total_volume`                | `volume24h`     | [`format_abbreviated`]       |
//! | `market_cap`                  | `marketCap`     | [`format_abbreviated`]       |

use cdash_core::format::{format_abbreviated, format_percentage, format_price};
use cdash_core::{CanonicalCurrency, SourceKind};
use serde_json::Value;

use crate::Normalizer;
use crate::json_util::{display_text, is_number, is_str, parse_f64_field, str_field};

/// Normalizer for [`SourceKind::CoinGecko`] payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinGeckoNormalizer;

impl Normalizer for CoinGeckoNormalizer {
    fn kind(&self) -> SourceKind {
        SourceKind::CoinGecko
    }

    fn validate(&self, raw: &Value) -> bool {
        let Some(items) = raw.as_array() else {
            return false;
        };
        items.iter().all(|item| {
            is_str(item, "id")
                && is_str(item, "name")
                && is_str(item, "symbol")
                && is_number(item, "current_price")
                && is_str(item, "image")
        })
    }

    fn normalize(&self, raw: &[Value]) -> Vec<CanonicalCurrency> {
        raw.iter().map(normalize_item).collect()
    }
}

fn normalize_item(item: &Value) -> CanonicalCurrency {
    CanonicalCurrency {
        id: str_field(item, "id").unwrap_or_default().to_string(),
        rank: display_text(item.get("market_cap_rank")).unwrap_or_else(|| "0".to_string()),
        name: str_field(item, "name").unwrap_or_default().to_string(),
        symbol: str_field(item, "symbol").unwrap_or_default().to_uppercase(),
        price: format_price(parse_f64_field(item, "current_price")),
        image: str_field(item, "image").map(str::to_string),
        change24h: format_percentage(parse_f64_field(item, "price_change_percentage_24h")),
        volume24h: format_abbreviated(parse_f64_field(item, "total_volume")),
        market_cap: Some(format_abbreviated(parse_f64_field(item, "market_cap"))),
    }
}
