//! HTTP Extraction Service - delegates parsing to the document-parser service.
//!
//! # Protocol
//!
//! `POST {base_url}/parse` with `{document_id, file_path, file_type}`.
//! The service answers `{document_id, metrics[], tables[], confidence,
//! success, error?}`. A 404 means the file is missing, a 400 means the file
//! type is unsupported, and `success = false` carries the parser's error.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::metric::{Metric, DEFAULT_PERIOD, DEFAULT_UNIT, DOCUMENT_SOURCE};
use crate::ports::{ExtractionError, ExtractionOutput, ExtractionRequest, ExtractionService};

/// Remote extractor over HTTP.
pub struct HttpExtractionService {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl HttpExtractionService {
    /// # Errors
    ///
    /// - `Network` if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn parse_url(&self) -> String {
        format!("{}/parse", self.base_url)
    }

    async fn handle_response_status(
        &self,
        response: Response,
        request: &ExtractionRequest,
    ) -> Result<Response, ExtractionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            404 => Err(ExtractionError::FileNotFound(
                request.file_path.display().to_string(),
            )),
            400 => Err(ExtractionError::UnsupportedFileType(
                request.file_type.to_string(),
            )),
            _ => Err(ExtractionError::ServiceFailure(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionOutput, ExtractionError> {
        let body = ParseRequest {
            document_id: request.document_id.to_string(),
            file_path: request.file_path.display().to_string(),
            file_type: request.file_type.as_str(),
        };

        let response = self
            .client
            .post(self.parse_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Network(format!(
                        "Parser did not answer within {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    ExtractionError::Network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response, request).await?;
        let parsed: ParseResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Parse(format!("Failed to parse response: {}", e)))?;

        parsed.into_output()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    document_id: String,
    file_path: String,
    file_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    metrics: Vec<WireMetric>,
    #[serde(default)]
    tables: Vec<serde_json::Value>,
    #[serde(default)]
    confidence: f64,
    success: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMetric {
    name: String,
    value: f64,
    #[serde(default = "default_unit")]
    unit: String,
    #[serde(default = "default_period")]
    period: String,
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

fn default_source() -> String {
    DOCUMENT_SOURCE.to_string()
}

fn default_confidence() -> f64 {
    1.0
}

impl ParseResponse {
    fn into_output(self) -> Result<ExtractionOutput, ExtractionError> {
        if !self.success {
            return Err(ExtractionError::ServiceFailure(
                self.error
                    .unwrap_or_else(|| "parser reported failure without a message".to_string()),
            ));
        }

        let metrics: Vec<Metric> = self
            .metrics
            .into_iter()
            .filter_map(|wire| {
                let name = wire.name.clone();
                let built = Metric::new(wire.name, wire.value).and_then(|m| {
                    m.with_unit(wire.unit)
                        .with_period(wire.period)
                        .with_source(wire.source)
                        .with_confidence(wire.confidence)
                });
                match built {
                    Ok(metric) => Some(metric),
                    Err(e) => {
                        warn!(metric = %name, error = %e, "Dropping invalid extracted metric");
                        None
                    }
                }
            })
            .collect();

        debug!(metric_count = metrics.len(), "Parser response decoded");
        Ok(ExtractionOutput {
            metrics,
            confidence: self.confidence.clamp(0.0, 1.0),
            tables_found: self.tables.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> ParseResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn successful_response_becomes_output() {
        let output = decode(json!({
            "document_id": "d-1",
            "extracted_text": "...",
            "tables": [{"type": "extracted_table"}],
            "metrics": [
                {"name": "revenue", "value": 1200.0, "unit": "millions",
                 "period": "current", "source": "document_extraction", "confidence": 0.7}
            ],
            "confidence": 0.8,
            "success": true
        }))
        .into_output()
        .unwrap();

        assert_eq!(output.metrics.len(), 1);
        assert_eq!(output.metrics[0].unit(), "millions");
        assert_eq!(output.metrics[0].confidence(), 0.7);
        assert_eq!(output.confidence, 0.8);
        assert_eq!(output.tables_found, 1);
    }

    #[test]
    fn unsuccessful_response_is_service_failure() {
        let err = decode(json!({
            "document_id": "d-1",
            "metrics": [],
            "confidence": 0.0,
            "success": false,
            "error": "PDF parsing failed: encrypted"
        }))
        .into_output()
        .unwrap_err();

        assert_eq!(
            err,
            ExtractionError::ServiceFailure("PDF parsing failed: encrypted".to_string())
        );
    }

    #[test]
    fn invalid_metrics_are_dropped() {
        let output = decode(json!({
            "metrics": [
                {"name": " ", "value": 3.0},
                {"name": "eps", "value": 2.4}
            ],
            "confidence": 0.9,
            "success": true
        }))
        .into_output()
        .unwrap();

        assert_eq!(output.metrics.len(), 1);
        assert_eq!(output.metrics[0].name(), "eps");
        assert_eq!(output.metrics[0].period(), DEFAULT_PERIOD);
    }

    #[test]
    fn parse_url_trims_trailing_slash() {
        let service = HttpExtractionService::new("http://parser:8001/", Duration::from_secs(5)).unwrap();
        assert_eq!(service.parse_url(), "http://parser:8001/parse");
    }
}
