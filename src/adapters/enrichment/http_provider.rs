//! HTTP Enrichment Provider - calls a remote enrichment service.
//!
//! # Protocol
//!
//! `POST {base_url}/enrich` with a bearer token and a JSON body
//! `{analysis_id, document_id, model, metrics[]}`. A successful response
//! decodes as `{insights, additional_metrics[]}`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpEnrichmentConfig::new("https://enrich.internal", api_key)
//!     .with_model("fin-insights-v2")
//!     .with_timeout(Duration::from_secs(20));
//! let provider = HttpEnrichmentProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::metric::Metric;
use crate::ports::{EnrichmentError, EnrichmentProvider, EnrichmentRequest, EnrichmentResult};

/// Configuration for the HTTP enrichment provider.
#[derive(Debug, Clone)]
pub struct HttpEnrichmentConfig {
    api_key: Secret<String>,
    /// Service root, without trailing slash.
    pub base_url: String,
    /// Model identifier forwarded to the service.
    pub model: String,
    /// Transport-level request timeout.
    pub timeout: Duration,
}

impl HttpEnrichmentConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "default".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Remote enrichment over HTTP.
pub struct HttpEnrichmentProvider {
    config: HttpEnrichmentConfig,
    client: Client,
}

impl HttpEnrichmentProvider {
    /// # Errors
    ///
    /// - `Unavailable` if the HTTP client cannot be built
    pub fn new(config: HttpEnrichmentConfig) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EnrichmentError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn enrich_url(&self) -> String {
        format!("{}/enrich", self.config.base_url)
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, EnrichmentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(EnrichmentError::AuthenticationFailed),
            429 => Err(EnrichmentError::RateLimited {
                retry_after_secs: parse_retry_after(&error_body),
            }),
            500..=599 => Err(EnrichmentError::Unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(EnrichmentError::Network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }
}

#[async_trait]
impl EnrichmentProvider for HttpEnrichmentProvider {
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<EnrichmentResult, EnrichmentError> {
        let body = WireRequest {
            analysis_id: request.analysis_id.to_string(),
            document_id: request.document_id.to_string(),
            model: &self.config.model,
            metrics: &request.metrics,
        };

        let response = self
            .client
            .post(self.enrich_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    EnrichmentError::Network(format!("Connection failed: {}", e))
                } else {
                    EnrichmentError::Network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;
        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Parse(format!("Failed to parse response: {}", e)))?;

        let result = wire.into_result();
        debug!(
            analysis_id = %request.analysis_id,
            additional_metrics = result.additional_metrics.len(),
            "Enrichment response decoded"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    analysis_id: String,
    document_id: String,
    model: &'a str,
    metrics: &'a [Metric],
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    insights: serde_json::Value,
    #[serde(default)]
    additional_metrics: Vec<WireMetric>,
}

#[derive(Debug, Deserialize)]
struct WireMetric {
    name: String,
    value: f64,
    unit: Option<String>,
    period: Option<String>,
    source: Option<String>,
    confidence: Option<f64>,
}

impl WireResponse {
    /// Converts the wire form, dropping metrics that fail validation.
    fn into_result(self) -> EnrichmentResult {
        let additional_metrics = self
            .additional_metrics
            .into_iter()
            .filter_map(|wire| match wire.into_metric() {
                Ok(metric) => Some(metric),
                Err(e) => {
                    warn!(error = %e, "Dropping invalid enrichment metric");
                    None
                }
            })
            .collect();

        EnrichmentResult {
            insights: self.insights,
            additional_metrics,
        }
    }
}

impl WireMetric {
    fn into_metric(self) -> Result<Metric, crate::domain::foundation::ValidationError> {
        let mut metric = Metric::new(self.name, self.value)?.with_source(
            self.source.unwrap_or_else(|| "enrichment".to_string()),
        );
        if let Some(unit) = self.unit {
            metric = metric.with_unit(unit);
        }
        if let Some(period) = self.period {
            metric = metric.with_period(period);
        }
        if let Some(confidence) = self.confidence {
            metric = metric.with_confidence(confidence)?;
        }
        Ok(metric)
    }
}

/// Reads `retry_after` (seconds) from a JSON error body, defaulting to 30.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|body| body.get("retry_after").and_then(|v| v.as_u64()))
        .and_then(|secs| u32::try_from(secs).ok())
        .unwrap_or(30)
}
