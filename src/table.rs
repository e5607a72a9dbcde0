use crate::segment::{Dimension, ReportSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

mod entities;

pub use entities::{
    DataTable, ORIGINAL_LABEL, PRESENTATION_VALUE, ReportRow, RowId, SEGMENT_FILTER,
    SEGMENT_VALUE, SUMMARY_ROW_ID,
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read report document '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse report document: {0}")]
    Parse(String),
}

/// A rendered report: its dimension metadata and its table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDocument {
    /// API method of the report (e.g. "DevicesDetection.getType")
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
    pub table: DataTable,
}

impl ReportSource for ReportDocument {
    fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }
}

/// Parse a report document from JSON text.
///
/// Strict JSON is tried first; hand written documents with comments or
/// trailing commas are accepted through JSON5.
pub fn parse_report_document(text: &str) -> Result<ReportDocument, DocumentError> {
    match serde_json::from_str::<ReportDocument>(text) {
        Ok(document) => Ok(document),
        Err(json_err) => json5::from_str::<ReportDocument>(text)
            .map_err(|_| DocumentError::Parse(json_err.to_string())),
    }
}

pub fn load_report_document(path: &Path) -> Result<ReportDocument, DocumentError> {
    let raw = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_report_document(&raw)
}

/// Parse a row path such as `0/2/1` into indices. Every part must be an
/// index, so `0//1` is rejected.
pub fn parse_row_path(path: &str) -> Option<Vec<usize>> {
    path.split('/')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect()
}
