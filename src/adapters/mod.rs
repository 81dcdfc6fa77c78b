//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `enrichment` - HTTP and mock enrichment providers
//! - `extraction` - parser service client and local pattern extractor
//! - `memory` - in-memory repositories for tests and local runs
//! - `postgres` - PostgreSQL repositories

pub mod enrichment;
pub mod extraction;
pub mod memory;
pub mod postgres;
