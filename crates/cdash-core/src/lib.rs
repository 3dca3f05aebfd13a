//! # cdash-core
//!
//! Core crate for the cdash crypto dashboard backend, providing:
//!
//! - **Types** (`types`) — canonical currency record, request params, source kinds
//! - **Formatting** (`format`) — display rules for prices, percentages and amounts
//! - **Configuration** (`config`) — JSON config deserialization
//! - **Error types** (`error`) — domain-specific `CdashError` via thiserror
//! - **Time utilities** (`time_util`) — epoch-millisecond timestamps
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod time_util;
pub mod types;

// Re-export types at crate root for convenience.
pub use types::*;
