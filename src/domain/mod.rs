//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, state machine, errors)
//! - `metric` - Extracted measurements and extraction snapshots
//! - `constraint` - Threshold rules and the pure evaluation engine
//! - `alert` - Alert records and the violation-to-alert mapper
//! - `analysis` - Analysis aggregate and its write-once lifecycle
//! - `document` - Uploaded filings and their extraction lifecycle

pub mod alert;
pub mod analysis;
pub mod constraint;
pub mod document;
pub mod foundation;
pub mod metric;
