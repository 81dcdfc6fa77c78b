//! Analysis pipeline configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::extraction::ExtractionConfig;
use crate::application::{IntakeConfig, OrchestratorConfig, WorkerPoolConfig};
use crate::domain::analysis::RerunConstraintPolicy;

/// Worker pool, timeouts and rerun behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent analysis workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Jobs that may wait for a worker before submissions are rejected
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Upper bound on one enrichment call, in seconds
    #[serde(default = "default_enrichment_timeout")]
    pub enrichment_timeout_secs: u64,

    /// Which constraints a rerun evaluates
    #[serde(default)]
    pub rerun_constraint_policy: RerunConstraintPolicy,

    /// Time given to in-flight analyses on shutdown, in seconds
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// How often storage is polled for new work, in seconds; 0 disables polling
    #[serde(default = "default_intake_interval")]
    pub intake_interval_secs: u64,

    /// Rows read per intake step
    #[serde(default = "default_intake_batch_size")]
    pub intake_batch_size: u32,
}

impl PipelineConfig {
    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_secs(self.enrichment_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn worker_pool(&self) -> WorkerPoolConfig {
        WorkerPoolConfig {
            worker_count: self.worker_count,
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            enrichment_timeout: self.enrichment_timeout(),
        }
    }

    /// Intake settings, or `None` when polling is disabled.
    pub fn intake(&self, extraction: &ExtractionConfig) -> Option<IntakeConfig> {
        if self.intake_interval_secs == 0 {
            return None;
        }
        Some(IntakeConfig {
            poll_interval: Duration::from_secs(self.intake_interval_secs),
            batch_size: self.intake_batch_size,
            upload_dir: extraction.upload_dir.clone(),
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_count == 0 {
            return Err(ValidationError::NoWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::NoQueueCapacity);
        }
        if self.enrichment_timeout_secs == 0 || self.enrichment_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("enrichment"));
        }
        if self.intake_batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            enrichment_timeout_secs: default_enrichment_timeout(),
            rerun_constraint_policy: RerunConstraintPolicy::default(),
            shutdown_grace_secs: default_shutdown_grace(),
            intake_interval_secs: default_intake_interval(),
            intake_batch_size: default_intake_batch_size(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

fn default_enrichment_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_intake_interval() -> u64 {
    5
}

fn default_intake_batch_size() -> u32 {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.enrichment_timeout(), Duration::from_secs(30));
        assert_eq!(config.rerun_constraint_policy, RerunConstraintPolicy::Frozen);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_converts_to_component_configs() {
        let config = PipelineConfig {
            worker_count: 2,
            queue_capacity: 8,
            enrichment_timeout_secs: 5,
            ..Default::default()
        };
        let pool = config.worker_pool();
        assert_eq!((pool.worker_count, pool.queue_capacity), (2, 8));
        assert_eq!(
            config.orchestrator().enrichment_timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_validation_rejects_empty_pool() {
        let no_workers = PipelineConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert_eq!(no_workers.validate(), Err(ValidationError::NoWorkers));

        let no_queue = PipelineConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert_eq!(no_queue.validate(), Err(ValidationError::NoQueueCapacity));
    }

    #[test]
    fn test_validation_enrichment_timeout_bounds() {
        for secs in [0, 301] {
            let config = PipelineConfig {
                enrichment_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::InvalidTimeout("enrichment"))
            );
        }
    }

    #[test]
    fn test_intake_uses_upload_dir_and_can_be_disabled() {
        let extraction = ExtractionConfig {
            upload_dir: "/srv/filings".into(),
            ..Default::default()
        };

        let intake = PipelineConfig::default().intake(&extraction).unwrap();
        assert_eq!(intake.poll_interval, Duration::from_secs(5));
        assert_eq!(intake.batch_size, 32);
        assert_eq!(intake.upload_dir, std::path::PathBuf::from("/srv/filings"));

        let disabled = PipelineConfig {
            intake_interval_secs: 0,
            ..Default::default()
        };
        assert!(disabled.intake(&extraction).is_none());

        let no_batch = PipelineConfig {
            intake_batch_size: 0,
            ..Default::default()
        };
        assert_eq!(no_batch.validate(), Err(ValidationError::InvalidBatchSize));
    }
}
