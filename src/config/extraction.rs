//! Metric extraction configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Which extractor documents go through
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Root URL of the parser service; unset means local extraction only
    pub base_url: Option<String>,

    /// Parser request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Use the local pattern extractor instead of the parser service
    #[serde(default)]
    pub use_pattern_extractor: bool,

    /// Root of stored uploads, laid out as `<upload_dir>/<document id>/<filename>`
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The parser service URL, unless the local extractor is selected.
    pub fn service_url(&self) -> Option<&str> {
        if self.use_pattern_extractor {
            return None;
        }
        self.base_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.service_url() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidServiceUrl("extraction"));
            }
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("extraction"));
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
            use_pattern_extractor: false,
            upload_dir: default_upload_dir(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_no_service() {
        let config = ExtractionConfig::default();
        assert_eq!(config.service_url(), None);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pattern_extractor_overrides_service() {
        let config = ExtractionConfig {
            base_url: Some("http://parser:8001".to_string()),
            use_pattern_extractor: true,
            ..Default::default()
        };
        assert_eq!(config.service_url(), None);
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let config = ExtractionConfig {
            base_url: Some("parser:8001".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidServiceUrl("extraction"))
        );
    }
}
