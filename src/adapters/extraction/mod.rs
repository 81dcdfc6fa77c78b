//! Extraction adapters - implementations of the ExtractionService port.
//!
//! - `HttpExtractionService` - the remote document-parser service (all formats)
//! - `PatternMetricExtractor` - local regex extraction for text and CSV

mod http_service;
mod pattern_extractor;

pub use http_service::HttpExtractionService;
pub use pattern_extractor::PatternMetricExtractor;
