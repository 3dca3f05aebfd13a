//! # cdash-runner
//!
//! Orchestration layer behind the `cdash-runner` binary: custom-entry
//! storage, logo resolution and the JSON envelopes printed by the CLI.

pub mod logo;
pub mod service;
pub mod store;

pub use logo::{LogoResolver, PlaceholderLogo};
pub use service::{Envelope, MarketService, listing_params};
pub use store::{CustomCryptoStore, FormError, NewCryptoForm, StoreError, StoredCrypto};
