//! Pattern Metric Extractor - local, regex-based metric extraction.
//!
//! Reads plain-text and CSV filings from disk and scans them for well-known
//! financial figures ("net income: $1,204 million", "current ratio 1.8").
//! Binary formats (PDF, spreadsheets) need the remote parser.
//!
//! Every hit becomes a metric with period `current`, source
//! `document_extraction` and confidence 0.7. The unit comes from the text
//! that follows the number.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use tracing::debug;

use crate::domain::document::FileType;
use crate::domain::metric::{Metric, DEFAULT_PERIOD, DOCUMENT_SOURCE};
use crate::ports::{ExtractionError, ExtractionOutput, ExtractionRequest, ExtractionService};

/// Confidence attached to each pattern hit.
const MATCH_CONFIDENCE: f64 = 0.7;

/// Overall confidence for tabular sources.
const STRUCTURED_CONFIDENCE: f64 = 0.9;

/// Overall confidence for free text.
const UNSTRUCTURED_CONFIDENCE: f64 = 0.8;

/// Minimum consecutive numeric rows to count as a table.
const MIN_TABLE_ROWS: usize = 3;

const AMOUNT: &str = r"([0-9,]+\.?[0-9]*)(?:\s*(?:million|billion|thousand|m|b|k)\b)?";
const PERCENT: &str = r"([0-9,]+\.?[0-9]*)%?";
const PLAIN: &str = r"([0-9,]+\.?[0-9]*)";

/// (metric name, label alternation, separator class, value pattern)
const PATTERNS: &[(&str, &str, &str, &str)] = &[
    ("revenue", "revenue|sales|net sales|total revenue", r"[\s:$]*", AMOUNT),
    ("net_income", "net income|net profit|net earnings", r"[\s:$]*", AMOUNT),
    ("eps", "earnings per share|eps", r"[\s:$]*", PLAIN),
    ("pe_ratio", "p/e ratio|pe ratio|price.earnings", r"[\s:]*", PLAIN),
    ("pb_ratio", "p/b ratio|pb ratio|price.book", r"[\s:]*", PLAIN),
    ("debt_to_equity", "debt.to.equity|debt/equity|d/e", r"[\s:]*", PLAIN),
    ("current_ratio", "current ratio", r"[\s:]*", PLAIN),
    ("gross_margin", "gross margin|gross profit margin", r"[\s:]*", PERCENT),
    ("operating_margin", "operating margin|operating profit margin", r"[\s:]*", PERCENT),
    ("net_margin", "net margin|net profit margin", r"[\s:]*", PERCENT),
    ("roe", "return on equity|roe", r"[\s:]*", PERCENT),
    ("roa", "return on assets|roa", r"[\s:]*", PERCENT),
    ("cash_flow", "cash flow|operating cash flow", r"[\s:$]*", AMOUNT),
    ("market_cap", "market cap|market capitalization", r"[\s:$]*", AMOUNT),
];

static METRIC_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    PATTERNS
        .iter()
        .filter_map(|(name, labels, separator, value)| {
            let pattern = format!(r"(?i)\b(?:{}){}{}", labels, separator, value);
            Regex::new(&pattern).ok().map(|re| (*name, re))
        })
        .collect()
});

static TABLE_ROW: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s+\d+.*\d+.*\d+").ok());

/// Local extractor for text-like filings.
#[derive(Debug, Clone, Default)]
pub struct PatternMetricExtractor;

impl PatternMetricExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Scans text for every known metric pattern.
    ///
    /// Hits whose number cannot be parsed (a lone comma, say) are skipped.
    pub fn extract_metrics(text: &str) -> Vec<Metric> {
        let mut metrics = Vec::new();

        for (name, pattern) in METRIC_PATTERNS.iter() {
            for captures in pattern.captures_iter(text) {
                let (Some(whole), Some(number)) = (captures.get(0), captures.get(1)) else {
                    continue;
                };
                let Ok(value) = number.as_str().replace(',', "").parse::<f64>() else {
                    continue;
                };

                let suffix = &whole.as_str()[number.end() - whole.start()..];
                let unit = determine_unit(whole.as_str(), suffix);

                let metric = Metric::new(*name, value)
                    .and_then(|m| m.with_confidence(MATCH_CONFIDENCE))
                    .map(|m| {
                        m.with_unit(unit)
                            .with_period(DEFAULT_PERIOD)
                            .with_source(DOCUMENT_SOURCE)
                    });
                if let Ok(metric) = metric {
                    metrics.push(metric);
                }
            }
        }

        metrics
    }

    /// Counts runs of at least three consecutive numeric rows.
    pub fn count_tables(text: &str) -> usize {
        let Some(row) = TABLE_ROW.as_ref() else {
            return 0;
        };

        let mut tables = 0;
        let mut run = 0;
        for line in text.lines() {
            if row.is_match(line) {
                run += 1;
            } else {
                if run >= MIN_TABLE_ROWS {
                    tables += 1;
                }
                run = 0;
            }
        }
        if run >= MIN_TABLE_ROWS {
            tables += 1;
        }
        tables
    }
}

/// Picks a unit from the text following the number, then from the label.
fn determine_unit(matched: &str, suffix: &str) -> &'static str {
    let suffix = suffix.trim().to_ascii_lowercase();
    if suffix.starts_with("billion") || suffix == "b" {
        "billions"
    } else if suffix.starts_with("million") || suffix == "m" {
        "millions"
    } else if suffix.starts_with("thousand") || suffix == "k" {
        "thousands"
    } else if suffix.contains('%') {
        "percentage"
    } else if matched.to_ascii_lowercase().contains("ratio") {
        "ratio"
    } else {
        "units"
    }
}

/// Flattens CSV rows into whitespace-separated text so label/value
/// patterns match across cells.
///
/// Follows RFC 4180 quoting: quoted cells keep their commas, `""` inside a
/// quoted cell is a literal quote, and a line break inside quotes stays in
/// the cell (flattened to a space). An unterminated quote runs to the end
/// of the input.
fn csv_to_text(csv: &str) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = csv.chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            ('"', _) => quoted = !quoted,
            (',', false) => row.push(std::mem::take(&mut cell)),
            ('\r', false) => {}
            ('\n', false) => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            ('\r' | '\n', true) => {
                if !cell.ends_with(' ') {
                    cell.push(' ');
                }
            }
            _ => cell.push(ch),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    rows.iter()
        .map(|cells| {
            cells
                .iter()
                .map(|c| c.trim())
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ExtractionService for PatternMetricExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionOutput, ExtractionError> {
        if !matches!(request.file_type, FileType::Csv | FileType::Text) {
            return Err(ExtractionError::UnsupportedFileType(
                request.file_type.to_string(),
            ));
        }

        let raw = tokio::fs::read_to_string(&request.file_path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    ExtractionError::FileNotFound(request.file_path.display().to_string())
                }
                _ => ExtractionError::ServiceFailure(format!(
                    "Failed to read {}: {}",
                    request.file_path.display(),
                    e
                )),
            })?;

        let text = if request.file_type == FileType::Csv {
            csv_to_text(&raw)
        } else {
            raw
        };

        let metrics = Self::extract_metrics(&text);
        let tables_found = if request.file_type.is_structured() {
            1
        } else {
            Self::count_tables(&text)
        };
        let confidence = if request.file_type.is_structured() {
            STRUCTURED_CONFIDENCE
        } else {
            UNSTRUCTURED_CONFIDENCE
        };

        debug!(
            document_id = %request.document_id,
            metric_count = metrics.len(),
            tables_found,
            "Pattern extraction finished"
        );

        Ok(ExtractionOutput {
            metrics,
            confidence,
            tables_found,
        })
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}
