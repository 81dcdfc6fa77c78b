//! Document handlers.

mod extract_document;

pub use extract_document::{
    ExtractDocumentCommand, ExtractDocumentError, ExtractDocumentHandler, ExtractDocumentResult,
};
