//! Enrichment provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::enrichment::HttpEnrichmentConfig;

/// Optional enrichment service
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Whether analyses may request enrichment at all
    #[serde(default)]
    pub enabled: bool,

    /// Root URL of the enrichment service
    pub base_url: Option<String>,

    /// Bearer token for the enrichment service
    pub api_key: Option<Secret<String>>,

    /// Model identifier forwarded to the service
    #[serde(default = "default_model")]
    pub model: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Adapter config, or `None` when enrichment is disabled.
    pub fn http_config(&self) -> Option<HttpEnrichmentConfig> {
        if !self.enabled {
            return None;
        }
        let base_url = self.base_url.as_deref()?;
        let api_key = self
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().clone())
            .unwrap_or_default();
        Some(
            HttpEnrichmentConfig::new(base_url, api_key)
                .with_model(self.model.clone())
                .with_timeout(self.timeout()),
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        let url = self
            .base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ValidationError::MissingRequired("ENRICHMENT_BASE_URL"))?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::InvalidServiceUrl("enrichment"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("enrichment"));
        }
        Ok(())
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "default".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> EnrichmentConfig {
        EnrichmentConfig {
            enabled: true,
            base_url: Some("https://enrich.example.com/".to_string()),
            api_key: Some(Secret::new("ek-test".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_by_default() {
        let config = EnrichmentConfig::default();
        assert!(config.http_config().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_builds_adapter_config() {
        let http = enabled().http_config().unwrap();
        assert_eq!(http.base_url, "https://enrich.example.com");
        assert_eq!(http.model, "default");
        assert_eq!(http.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_enabled_requires_base_url() {
        let config = EnrichmentConfig {
            base_url: None,
            ..enabled()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("ENRICHMENT_BASE_URL"))
        );
    }

    #[test]
    fn test_api_key_is_redacted_in_debug() {
        let debug = format!("{:?}", enabled());
        assert!(!debug.contains("ek-test"));
    }
}
