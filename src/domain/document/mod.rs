//! Document module - uploaded filings and their extraction lifecycle.

#[allow(clippy::module_inception)]
mod document;
mod file_type;
mod status;

pub use document::Document;
pub use file_type::FileType;
pub use status::DocumentStatus;
