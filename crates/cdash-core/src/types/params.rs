//! Market-data request parameters and the fetch result envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::currency::CanonicalCurrency;

/// A primitive query-parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Parameters of a market listing request.
///
/// Forwarded verbatim to every endpoint handler. Besides the well-known
/// fields, arbitrary primitive `extra` parameters are passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataParams {
    pub vs_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Passthrough parameters (e.g. `sparkline=false`).
    #[serde(flatten)]
    pub extra: BTreeMap<String, ParamValue>,
}

impl MarketDataParams {
    pub fn new(vs_currency: impl Into<String>) -> Self {
        Self {
            vs_currency: vs_currency.into(),
            order: None,
            per_page: None,
            page: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_page(mut self, per_page: u32, page: u32) -> Self {
        self.per_page = Some(per_page);
        self.page = Some(page);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Flatten into `(key, value)` query pairs.
    ///
    /// Well-known fields come first in a fixed order, followed by `extra`
    /// in key order, so the output is deterministic.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("vs_currency".to_string(), self.vs_currency.clone())];
        if let Some(order) = &self.order {
            pairs.push(("order".into(), order.clone()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page".into(), per_page.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".into(), page.to_string()));
        }
        for (k, v) in &self.extra {
            pairs.push((k.clone(), v.to_string()));
        }
        pairs
    }
}

impl Default for MarketDataParams {
    fn default() -> Self {
        Self::new("usd")
    }
}

/// Outcome of a successful priority fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub data: Vec<CanonicalCurrency>,
    /// Name of the endpoint that satisfied the request (provenance).
    pub source: String,
    /// Completion time, milliseconds since Unix epoch.
    pub timestamp: u64,
}
