//! Source-shape auto-detection.
//!
//! The heuristic relies on incidental field-name overlap, so it is kept in
//! its own module and only used when the caller does not know the source.
//! Only the **first** element is inspected.

use cdash_core::SourceKind;
use serde_json::Value;

use crate::json_util::{has_key, is_str};

/// Keys that identify the numeric REST shape (presence only).
const COINGECKO_KEYS: [&str; 4] =
    ["current_price", "market_cap_rank", "price_change_percentage_24h", "total_volume"];

/// Keys that identify the scraped shape; `rank` must also be a string.
const SCRAPING_KEYS: [&str; 3] = ["rank", "change24h", "volume24h"];

/// Infer the source shape of a raw payload.
///
/// Returns `None` ("unknown") for non-arrays, empty arrays, and first
/// elements matching neither signature.
pub fn detect_data_source(raw: &Value) -> Option<SourceKind> {
    let sample = raw.as_array()?.first()?;

    if COINGECKO_KEYS.iter().all(|k| has_key(sample, k)) {
        return Some(SourceKind::CoinGecko);
    }

    if SCRAPING_KEYS.iter().all(|k| has_key(sample, k)) && is_str(sample, "rank") {
        return Some(SourceKind::Scraping);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_coingecko_by_presence() {
        let raw = json!([{
            "current_price": null,
            "market_cap_rank": 3,
            "price_change_percentage_24h": 0.5,
            "total_volume": "n/a"
        }]);
        assert_eq!(detect_data_source(&raw), Some(SourceKind::CoinGecko));
    }

    #[test]
    fn detects_scraped_with_string_rank() {
        let raw = json!([{ "rank": "4", "change24h": "1%", "volume24h": "$1B" }]);
        assert_eq!(detect_data_source(&raw), Some(SourceKind::Scraping));

        let numeric_rank = json!([{ "rank": 4, "change24h": "1%", "volume24h": "$1B" }]);
        assert_eq!(detect_data_source(&numeric_rank), None);
    }

    #[test]
    fn only_first_element_counts() {
        let raw = json!([{ "foo": 1 }, { "rank": "1", "change24h": "", "volume24h": "" }]);
        assert_eq!(detect_data_source(&raw), None);
    }

    #[test]
    fn unknown_inputs() {
        assert_eq!(detect_data_source(&json!([])), None);
        assert_eq!(detect_data_source(&json!({"rank": "1"})), None);
        assert_eq!(detect_data_source(&json!([1, 2, 3])), None);
        assert_eq!(detect_data_source(&Value::Null), None);
    }
}
