//! Data types flowing through the cdash pipeline.
//!
//! - [`currency`] — the canonical, display-ready currency record
//! - [`params`] — market-data request parameters and fetch results
//! - [`source`] — source-shape identifiers used by the normalizer registry

pub mod currency;
pub mod params;
pub mod source;

pub use currency::*;
pub use params::*;
pub use source::*;
