//! Metric value object - one named financial measurement.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Unit used when extraction could not infer one.
pub const DEFAULT_UNIT: &str = "units";

/// Period used when extraction could not infer one.
pub const DEFAULT_PERIOD: &str = "current";

/// Source tag for metrics parsed out of a filing.
pub const DOCUMENT_SOURCE: &str = "document_extraction";

/// A named, valued financial measurement.
///
/// Identity within one extraction batch is `(name, period)`; several metrics
/// may share a name across periods or sources.
///
/// # Invariants
///
/// - `name` is non-empty
/// - `value` is finite
/// - `confidence` is within `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    name: String,
    value: f64,
    unit: String,
    period: String,
    source: String,
    confidence: f64,
}

impl Metric {
    /// Creates a metric with default unit, period and source and full confidence.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if name is blank
    /// - `InvalidFormat` if value is NaN or infinite
    pub fn new(name: impl Into<String>, value: f64) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("metric.name"));
        }
        if !value.is_finite() {
            return Err(ValidationError::invalid_format(
                "metric.value",
                format!("value for '{}' must be finite, got {}", name, value),
            ));
        }

        Ok(Self {
            name,
            value,
            unit: DEFAULT_UNIT.to_string(),
            period: DEFAULT_PERIOD.to_string(),
            source: DOCUMENT_SOURCE.to_string(),
            confidence: 1.0,
        })
    }

    /// Sets the unit of measurement.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the reporting period.
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    /// Sets the producing source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the extraction confidence.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if confidence is outside `[0, 1]`
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::out_of_range(
                "metric.confidence",
                0.0,
                1.0,
                confidence,
            ));
        }
        self.confidence = confidence;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}
