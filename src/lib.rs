//! Finwatch - Financial filing analysis pipeline
//!
//! Extracts metrics from uploaded filings, evaluates them against
//! user-defined threshold constraints and records an alert for every
//! violation. Analyses run on a bounded background worker pool and always
//! end COMPLETED or FAILED.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
