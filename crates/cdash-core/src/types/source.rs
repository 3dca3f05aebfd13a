//! Source-shape identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The raw record layout a payload arrives in, before normalization.
///
/// `CoinGecko` and `Scraping` are built in. Additional shapes are identified
/// by label through `Other` and only need a normalizer registered under that
/// label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SourceKind {
    /// Numeric REST market-data API shape (`current_price`, `total_volume`, ...).
    CoinGecko,
    /// Text-scraped listing shape (display strings for every field).
    Scraping,
    Other(String),
}

impl SourceKind {
    pub fn label(&self) -> &str {
        match self {
            Self::CoinGecko => "coinGecko",
            Self::Scraping => "scraping",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for SourceKind {
    fn from(label: &str) -> Self {
        match label {
            "coinGecko" => Self::CoinGecko,
            "scraping" => Self::Scraping,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for SourceKind {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<SourceKind> for String {
    fn from(kind: SourceKind) -> Self {
        kind.label().to_string()
    }
}

impl FromStr for SourceKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        assert_eq!(SourceKind::from("coinGecko"), SourceKind::CoinGecko);
        assert_eq!(SourceKind::from("scraping"), SourceKind::Scraping);
        assert_eq!(SourceKind::from("coinPaprika"), SourceKind::Other("coinPaprika".into()));
        assert_eq!(SourceKind::Other("x".into()).to_string(), "x");
    }
}
