//! Enrichment adapters - implementations of the EnrichmentProvider port.

mod http_provider;
mod mock_provider;

pub use http_provider::{HttpEnrichmentConfig, HttpEnrichmentProvider};
pub use mock_provider::MockEnrichmentProvider;
