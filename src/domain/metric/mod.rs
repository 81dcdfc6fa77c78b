//! Metric module - extracted financial measurements.

#[allow(clippy::module_inception)]
mod metric;
mod snapshot;

pub use metric::{Metric, DEFAULT_PERIOD, DEFAULT_UNIT, DOCUMENT_SOURCE};
pub use snapshot::MetricSnapshot;
