//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Queue capacity must be at least 1")]
    NoQueueCapacity,

    #[error("Intake batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Invalid {0} timeout (must be 1-300 seconds)")]
    InvalidTimeout(&'static str),

    #[error("Invalid {0} URL (must start with http:// or https://)")]
    InvalidServiceUrl(&'static str),
}
