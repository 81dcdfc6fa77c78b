//! Supported filing formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Format of an uploaded filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Pdf,
    Excel,
    Csv,
    Text,
}

impl FileType {
    /// Resolves the type from a file extension (`report.XLSX` -> Excel).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "file_type",
                    format!("'{}' has no extension", path.display()),
                )
            })?;
        ext.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Excel => "excel",
            FileType::Csv => "csv",
            FileType::Text => "text",
        }
    }

    /// Whether the format carries tabular data.
    pub fn is_structured(&self) -> bool {
        matches!(self, FileType::Excel | FileType::Csv)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "excel" | "xlsx" | "xls" => Ok(FileType::Excel),
            "csv" => Ok(FileType::Csv),
            "text" | "txt" => Ok(FileType::Text),
            other => Err(ValidationError::invalid_format(
                "file_type",
                format!("unsupported file type '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_extensions() {
        assert_eq!("PDF".parse::<FileType>().unwrap(), FileType::Pdf);
        assert_eq!("xls".parse::<FileType>().unwrap(), FileType::Excel);
        assert_eq!(".csv".parse::<FileType>().unwrap(), FileType::Csv);
        assert_eq!("txt".parse::<FileType>().unwrap(), FileType::Text);
    }

    #[test]
    fn resolves_from_path() {
        assert_eq!(FileType::from_path("/tmp/10-K.XLSX").unwrap(), FileType::Excel);
        assert!(FileType::from_path("/tmp/notes").is_err());
        assert!(FileType::from_path("/tmp/slides.pptx").is_err());
    }

    #[test]
    fn structured_formats() {
        assert!(FileType::Csv.is_structured());
        assert!(FileType::Excel.is_structured());
        assert!(!FileType::Pdf.is_structured());
    }
}
