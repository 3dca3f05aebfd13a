//! # cdash-src
//!
//! Concrete data-source endpoint handlers for the priority fallback client.
//!
//! Each source implements [`cdash_md::EndpointHandler`]: it fetches raw
//! provider data for a [`MarketDataParams`](cdash_core::MarketDataParams)
//! request and runs it through the shared normalizer registry with an
//! explicit source kind.
//!
//! ## Supported sources
//!
//! | Kind        | Module      | Transport                  | Default priority / timeout |
//! |-------------|-------------|----------------------------|----------------------------|
//! | `coingecko` | `coingecko` | REST `GET /coins/markets`  | 1 / 8000 ms                |
//! | `scrape`    | `scrape`    | [`ListingScraper`] feed    | 2 / 10000 ms               |
//!
//! Endpoints are built from config entries via [`registry::build_endpoint`].

pub mod coingecko;
pub mod registry;
pub mod scrape;

pub use coingecko::CoinGeckoHandler;
pub use registry::{build_client, build_endpoint};
pub use scrape::{HttpListingScraper, ListingScraper, ScrapeFeedHandler};
