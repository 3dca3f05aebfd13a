//! Shared JSON helpers used by all normalizers.
//!
//! Raw payloads stay untyped (`serde_json::Value`) until a normalizer has
//! validated them, so these helpers read fields leniently: a wrong type is
//! reported as `None` rather than an error.

use serde_json::Value;

/// Parse a JSON value (string or number) as `f64`.
///
/// Handles the common provider pattern where numeric values may be encoded
/// as either JSON strings (`"30000.5"`) or native numbers (`30000.5`).
#[inline]
pub fn parse_str_f64(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    if let Some(s) = v.as_str() {
        fast_float2::parse(s.trim()).ok()
    } else {
        v.as_f64()
    }
}

/// Parse a named field on a JSON object as `f64` (string or number).
#[inline]
pub fn parse_f64_field(v: &Value, key: &str) -> Option<f64> {
    parse_str_f64(v.get(key))
}

/// Borrow a named string field.
#[inline]
pub fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)?.as_str()
}

/// `true` if the object carries `key`, whatever its value (including `null`).
#[inline]
pub fn has_key(v: &Value, key: &str) -> bool {
    v.as_object().is_some_and(|o| o.contains_key(key))
}

/// `true` if `key` holds a JSON string.
#[inline]
pub fn is_str(v: &Value, key: &str) -> bool {
    v.get(key).is_some_and(Value::is_string)
}

/// `true` if `key` holds a JSON number.
#[inline]
pub fn is_number(v: &Value, key: &str) -> bool {
    v.get(key).is_some_and(Value::is_number)
}

/// Render a rank-like field as display text.
///
/// Integers print without a fraction, other numbers in their shortest form,
/// strings pass through. Missing, `null`, empty, or any other type yields
/// `None`.
pub fn display_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn f64_from_string_or_number() {
        let v = json!({"a": "30000.5", "b": 12, "c": "n/a", "d": null});
        assert_eq!(parse_f64_field(&v, "a"), Some(30000.5));
        assert_eq!(parse_f64_field(&v, "b"), Some(12.0));
        assert_eq!(parse_f64_field(&v, "c"), None);
        assert_eq!(parse_f64_field(&v, "d"), None);
        assert_eq!(parse_f64_field(&v, "missing"), None);
    }

    #[test]
    fn has_key_counts_null() {
        let v = json!({"rank": null});
        assert!(has_key(&v, "rank"));
        assert!(!has_key(&v, "other"));
        assert!(!has_key(&json!([1, 2]), "rank"));
    }

    #[test]
    fn display_text_variants() {
        assert_eq!(display_text(Some(&json!(1))).as_deref(), Some("1"));
        assert_eq!(display_text(Some(&json!(3.0))).as_deref(), Some("3"));
        assert_eq!(display_text(Some(&json!(2.5))).as_deref(), Some("2.5"));
        assert_eq!(display_text(Some(&json!("12"))).as_deref(), Some("12"));
        assert_eq!(display_text(Some(&json!(""))), None);
        assert_eq!(display_text(Some(&Value::Null)), None);
        assert_eq!(display_text(None), None);
    }
}
