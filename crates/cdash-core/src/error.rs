//! Typed error definitions shared across cdash crates.
//!
//! [`CdashError`] covers the ambient failures (configuration, transport,
//! payload parsing). Pipeline-specific errors live next to the code that raises
//! them (`cdash_md::NormalizeError`, `cdash_md::FetchError`). All variants
//! implement `std::error::Error` via `thiserror`, so they compose with
//! `anyhow::Result`.

use thiserror::Error;

/// Domain-specific errors for the cdash system.
#[derive(Debug, Error)]
pub enum CdashError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Upstream HTTP request or response error.
    #[error("http error: {0}")]
    Http(String),

    /// Raw payload could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}
