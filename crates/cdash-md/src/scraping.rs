//! Normalizer for the text-scraped listing shape.
//!
//! Scraped rows already carry display strings (`"$64,012.33"`, `"1.2%"`,
//! `"$31.4B"`), so instead of formatting numbers this normalizer sanitizes
//! text: it strips stray characters, enforces the `$` prefix on monetary
//! fields, the `%` suffix on percentages, and an explicit sign on non-zero
//! percentages.

use cdash_core::format::{DEFAULT_AMOUNT, DEFAULT_PERCENTAGE};
use cdash_core::{CanonicalCurrency, SourceKind};
use serde_json::Value;

use crate::Normalizer;
use crate::json_util::{is_str, str_field};

/// Normalizer for [`SourceKind::Scraping`] payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapingNormalizer;

impl Normalizer for ScrapingNormalizer {
    fn kind(&self) -> SourceKind {
        SourceKind::Scraping
    }

    fn validate(&self, raw: &Value) -> bool {
        let Some(items) = raw.as_array() else {
            return false;
        };
        items.iter().all(|item| {
            is_str(item, "id")
                && is_str(item, "name")
                && is_str(item, "symbol")
                && is_str(item, "price")
                && is_str(item, "rank")
        })
    }

    fn normalize(&self, raw: &[Value]) -> Vec<CanonicalCurrency> {
        raw.iter().map(normalize_item).collect()
    }
}

fn normalize_item(item: &Value) -> CanonicalCurrency {
    CanonicalCurrency {
        id: text(item, "id").to_string(),
        rank: text(item, "rank").to_string(),
        name: text(item, "name").to_string(),
        symbol: text(item, "symbol").to_uppercase(),
        price: clean_price(text(item, "price")),
        image: str_field(item, "image").map(str::to_string),
        change24h: clean_percentage(text(item, "change24h")),
        volume24h: clean_amount(text(item, "volume24h")),
        market_cap: str_field(item, "marketCap").filter(|s| !s.is_empty()).map(clean_amount),
    }
}

fn text<'a>(item: &'a Value, key: &str) -> &'a str {
    str_field(item, key).unwrap_or_default()
}

/// Keep digits, `.`, `,` and `$`; force a `$` prefix; merge extra decimal points.
pub fn clean_price(price: &str) -> String {
    if price.trim().is_empty() {
        return DEFAULT_AMOUNT.to_string();
    }

    let mut cleaned: String =
        price.chars().filter(|&c| c.is_ascii_digit() || matches!(c, '.' | ',' | '$')).collect();
    if !cleaned.starts_with('$') {
        cleaned.insert(0, '$');
    }

    // "$1.234.56" → "$1.23456"
    if let Some((head, tail)) = cleaned.split_once('.') {
        if tail.contains('.') {
            cleaned = format!("{head}.{}", tail.replace('.', ""));
        }
    }
    cleaned
}

/// Keep digits, `.`, `,`, `+`, `-` and `%`; force a `%` suffix and a sign.
///
/// Values starting with `0` are left unsigned (`"0.00%"`).
pub fn clean_percentage(percentage: &str) -> String {
    if percentage.trim().is_empty() {
        return DEFAULT_PERCENTAGE.to_string();
    }

    let mut cleaned: String = percentage
        .chars()
        .filter(|&c| c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-' | '%'))
        .collect();
    if !cleaned.ends_with('%') {
        cleaned.push('%');
    }
    if !(cleaned.starts_with('+') || cleaned.starts_with('-') || cleaned.starts_with('0')) {
        cleaned.insert(0, '+');
    }
    cleaned
}

/// Keep digits, `.`, `,`, `$` and magnitude suffixes `KMBT`; force a `$` prefix.
pub fn clean_amount(amount: &str) -> String {
    if amount.trim().is_empty() {
        return DEFAULT_AMOUNT.to_string();
    }

    let mut cleaned: String = amount
        .chars()
        .filter(|&c| c.is_ascii_digit() || matches!(c, '.' | ',' | '$' | 'K' | 'M' | 'B' | 'T'))
        .collect();
    if !cleaned.starts_with('$') {
        cleaned.insert(0, '$');
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "id": "Bitcoin_3f1c",
            "rank": "1",
            "name": "Bitcoin",
            "symbol": "btc",
            "price": "$64,012.33",
            "change24h": "1.25%",
            "volume24h": "31.4B USD",
            "marketCap": "$1.26T",
            "image": "https://s2.coinmarketcap.com/static/img/coins/64x64/1.png"
        })
    }

    #[test]
    fn normalizes_row() {
        let out = ScrapingNormalizer.normalize(&[row()]);
        let c = &out[0];
        assert_eq!(c.id, "Bitcoin_3f1c");
        assert_eq!(c.rank, "1");
        assert_eq!(c.symbol, "BTC");
        assert_eq!(c.price, "$64,012.33");
        assert_eq!(c.change24h, "+1.25%");
        assert_eq!(c.volume24h, "$31.4B");
        assert_eq!(c.market_cap.as_deref(), Some("$1.26T"));
    }

    #[test]
    fn blank_fields_fall_back() {
        let mut r = row();
        r["price"] = json!("  ");
        r["change24h"] = json!("");
        r["volume24h"] = json!("");
        r["marketCap"] = json!("");
        let c = &ScrapingNormalizer.normalize(&[r])[0];
        assert_eq!(c.price, "$0");
        assert_eq!(c.change24h, "0.00%");
        assert_eq!(c.volume24h, "$0");
        assert_eq!(c.market_cap, None);
    }

    #[test]
    fn price_sanitizing() {
        assert_eq!(clean_price("64,012.33 USD"), "$64,012.33");
        assert_eq!(clean_price("$1.234.56"), "$1.23456");
        assert_eq!(clean_price("€0.98"), "$0.98");
    }

    #[test]
    fn percentage_sign_rules() {
        assert_eq!(clean_percentage("-2.10%"), "-2.10%");
        assert_eq!(clean_percentage("▲ 3.5"), "+3.5%");
        assert_eq!(clean_percentage("0.00"), "0.00%");
        assert_eq!(clean_percentage("+0.4%"), "+0.4%");
    }

    #[test]
    fn amount_keeps_suffixes() {
        assert_eq!(clean_amount("1.2M"), "$1.2M");
        assert_eq!(clean_amount("$45,600,000"), "$45,600,000");
        assert_eq!(clean_amount("12.5 k"), "$12.5");
    }

    #[test]
    fn validate_requires_string_rank_and_price() {
        assert!(ScrapingNormalizer.validate(&json!([row()])));
        let mut r = row();
        r["rank"] = json!(1);
        assert!(!ScrapingNormalizer.validate(&json!([r])));
        assert!(!ScrapingNormalizer.validate(&json!({"rows": []})));
    }

    #[test]
    fn missing_market_cap_is_none() {
        let mut r = row();
        r.as_object_mut().unwrap().remove("marketCap");
        assert_eq!(ScrapingNormalizer.normalize(&[r])[0].market_cap, None);
    }
}
