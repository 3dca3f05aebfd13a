//! Logo resolution for records that arrive without an image.

use async_trait::async_trait;

/// Resolves a logo URL for a coin.
#[async_trait]
pub trait LogoResolver: Send + Sync {
    async fn resolve(&self, symbol: &str, name: &str) -> String;
}

/// Resolver that always answers with one configured URL.
#[derive(Debug, Clone)]
pub struct PlaceholderLogo {
    url: String,
}

impl PlaceholderLogo {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl LogoResolver for PlaceholderLogo {
    async fn resolve(&self, _symbol: &str, _name: &str) -> String {
        self.url.clone()
    }
}
