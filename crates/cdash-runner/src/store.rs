//! User-submitted ("custom") cryptocurrency entries.
//!
//! Entries are kept newest-first. When a backing file is configured the whole
//! list is loaded on open and rewritten after every mutation; otherwise the
//! store lives in memory only.

use std::path::{Path, PathBuf};

use cdash_core::{CanonicalCurrency, time_util};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Rank given to custom entries so they sort after every listed coin.
pub const CUSTOM_RANK: u32 = 999_999;

const NAME_MAX: usize = 100;
const SYMBOL_MAX: usize = 10;
const DESCRIPTION_MAX: usize = 500;

/// Custom-entry persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },

    #[error("malformed custom store {}: {source}", .path.display())]
    Malformed { path: PathBuf, source: serde_json::Error },

    #[error("failed to encode custom store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Submission form validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("name must be between 1 and 100 characters")]
    Name,

    #[error("symbol must be between 1 and 10 characters")]
    Symbol,

    #[error("description must be at most 500 characters")]
    Description,

    #[error("{field} is not a valid URL")]
    InvalidUrl { field: &'static str },
}

/// A "submit a new coin" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCryptoForm {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

impl NewCryptoForm {
    /// Check field constraints and upper-case the symbol.
    pub fn validate(mut self) -> Result<Self, FormError> {
        let name_len = self.name.chars().count();
        if !(1..=NAME_MAX).contains(&name_len) {
            return Err(FormError::Name);
        }
        let symbol_len = self.symbol.chars().count();
        if !(1..=SYMBOL_MAX).contains(&symbol_len) {
            return Err(FormError::Symbol);
        }
        if self.description.as_deref().is_some_and(|d| d.chars().count() > DESCRIPTION_MAX) {
            return Err(FormError::Description);
        }

        for (field, value) in [
            ("image", &self.image),
            ("website", &self.website),
            ("twitter", &self.twitter),
            ("github", &self.github),
        ] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                if Url::parse(v).is_err() {
                    return Err(FormError::InvalidUrl { field });
                }
            }
        }

        self.symbol = self.symbol.to_uppercase();
        Ok(self)
    }
}

/// A stored custom entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCrypto {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: String,
    pub market_cap: String,
    pub total_volume: String,
    pub price_change_percentage_24h: String,
    pub market_cap_rank: u32,
    pub is_custom: bool,
    pub description: String,
    pub website: String,
    pub twitter: String,
    pub github: String,
    /// Epoch millis.
    pub created_at: u64,
    /// Epoch millis.
    pub last_updated: u64,
}

impl StoredCrypto {
    /// Build an entry from a validated form, filling listing defaults.
    pub fn from_form(form: NewCryptoForm, placeholder_logo: &str) -> Self {
        let now = time_util::now_ms();
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            id: form.symbol.to_lowercase(),
            image: non_empty(form.image).unwrap_or_else(|| placeholder_logo.to_string()),
            symbol: form.symbol,
            name: form.name,
            current_price: "$0.00".into(),
            market_cap: "0".into(),
            total_volume: "0".into(),
            price_change_percentage_24h: "0.00%".into(),
            market_cap_rank: CUSTOM_RANK,
            is_custom: true,
            description: form.description.unwrap_or_default(),
            website: form.website.unwrap_or_default(),
            twitter: form.twitter.unwrap_or_default(),
            github: form.github.unwrap_or_default(),
            created_at: now,
            last_updated: now,
        }
    }

    /// The listing-row view of this entry.
    pub fn to_canonical(&self) -> CanonicalCurrency {
        CanonicalCurrency {
            id: self.id.clone(),
            rank: self.market_cap_rank.to_string(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            price: self.current_price.clone(),
            image: Some(self.image.clone()),
            change24h: self.price_change_percentage_24h.clone(),
            volume24h: self.total_volume.clone(),
            market_cap: Some(self.market_cap.clone()),
        }
    }
}

/// Newest-first list of custom entries with optional file persistence.
#[derive(Debug, Default)]
pub struct CustomCryptoStore {
    entries: Vec<StoredCrypto>,
    path: Option<PathBuf>,
}

impl CustomCryptoStore {
    /// An empty store that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries: Vec<StoredCrypto> = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|source| StoreError::Malformed { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        info!("[store] loaded {} custom entr(ies) from {}", entries.len(), path.display());
        Ok(Self { entries, path: Some(path) })
    }

    /// Insert at the front. On a failed save the store is left unchanged.
    pub fn add(&mut self, entry: StoredCrypto) -> Result<(), StoreError> {
        debug!("[store] adding '{}'", entry.id);
        let mut staged = Vec::with_capacity(self.entries.len() + 1);
        staged.push(entry);
        staged.extend(self.entries.iter().cloned());
        self.commit(staged)
    }

    pub fn all(&self) -> &[StoredCrypto] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry with the given id.
    pub fn get_by_id(&self, id: &str) -> Option<&StoredCrypto> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Remove the newest entry with `id`. Returns whether one was removed.
    ///
    /// On a failed save the entry stays in place.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(idx) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        let mut staged = self.entries.clone();
        staged.remove(idx);
        self.commit(staged)?;
        Ok(true)
    }

    /// Persist `staged`, then make it the live list.
    fn commit(&mut self, staged: Vec<StoredCrypto>) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            let text = serde_json::to_string_pretty(&staged)?;
            std::fs::write(path, text)
                .map_err(|source| StoreError::Write { path: path.clone(), source })?;
        }
        self.entries = staged;
        Ok(())
    }
}
