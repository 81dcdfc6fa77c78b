//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `FINWATCH` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use finwatch::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Running {} analysis workers", config.pipeline.worker_count);
//! ```

mod database;
mod enrichment;
mod error;
mod extraction;
mod pipeline;
mod runtime;

pub use database::DatabaseConfig;
pub use enrichment::EnrichmentConfig;
pub use error::{ConfigError, ValidationError};
pub use extraction::ExtractionConfig;
pub use pipeline::PipelineConfig;
pub use runtime::{Environment, RuntimeConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Worker pool, timeouts and rerun policy
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Parser service or local extractor
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Optional enrichment service
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FINWATCH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FINWATCH__PIPELINE__WORKER_COUNT=8` -> `pipeline.worker_count = 8`
    /// - `FINWATCH__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FINWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.pipeline.validate()?;
        self.extraction.validate()?;
        self.enrichment.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.runtime.is_production()
    }
}
