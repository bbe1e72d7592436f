//! JSON payloads for the HTTP surface.
//!
//! The filter response carries both output CSVs inline plus short
//! previews, so the frontend renders and offers downloads without a
//! second round trip.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{CsvResult, SchemaError};
use crate::models::{FilterCounts, Table, Variant};
use crate::parser::serialize_csv;
use crate::transform::pipeline::{FilterReport, EXCLUDED_FILE_NAME, KEPT_FILE_NAME};

/// Rows shown in each preview block.
const PREVIEW_ROWS: usize = 10;

/// Response sent to frontend after CSV upload and filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResponse {
    /// Random identifier for this run
    pub job_id: String,

    /// Status: always "ready"; failures answer with an error payload
    pub status: String,

    /// Rule set that was applied
    pub variant: Variant,

    /// RFC 3339 timestamp of the run
    pub processed_at: String,

    /// Row accounting
    pub counts: FilterCounts,

    /// Metadata about the parsed input
    pub csv_info: CsvMetadata,

    /// First rows of the kept output, one object per row
    pub kept_preview: Vec<Value>,

    /// First rows of the excluded output
    pub excluded_preview: Vec<Value>,

    /// Full kept output as CSV text
    pub kept_csv: String,

    /// Full excluded output as CSV text
    pub excluded_csv: String,

    /// Suggested download name for the kept output
    pub kept_file_name: String,

    /// Suggested download name for the excluded output
    pub excluded_file_name: String,
}

/// Parse metadata block of the filter response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl FilterResponse {
    /// Build the response from a finished report.
    pub fn from_report(report: FilterReport, variant: Variant) -> CsvResult<Self> {
        let kept_csv = serialize_csv(&report.kept)?;
        let excluded_csv = serialize_csv(&report.excluded)?;

        Ok(FilterResponse {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            variant,
            processed_at: Utc::now().to_rfc3339(),
            counts: report.counts,
            csv_info: CsvMetadata {
                encoding: report.csv_info.encoding,
                delimiter: report.csv_info.delimiter.to_string(),
                row_count: report.csv_info.row_count,
                columns: report.csv_info.headers,
            },
            kept_preview: preview_rows(&report.kept, PREVIEW_ROWS),
            excluded_preview: preview_rows(&report.excluded, PREVIEW_ROWS),
            kept_csv,
            excluded_csv,
            kept_file_name: KEPT_FILE_NAME.to_string(),
            excluded_file_name: EXCLUDED_FILE_NAME.to_string(),
        })
    }
}

/// First `limit` rows of a table as JSON objects keyed by column name.
pub fn preview_rows(table: &Table, limit: usize) -> Vec<Value> {
    table
        .rows()
        .take(limit)
        .map(|row| {
            let mut obj = Map::new();
            for (header, cell) in table.headers().iter().zip(row.cells()) {
                obj.insert(header.clone(), Value::String(cell.clone()));
            }
            Value::Object(obj)
        })
        .collect()
}

/// Create a generic error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

/// Error payload for a failed column check.
///
/// Carries both column lists so the frontend can show the user exactly
/// what the file has and what it lacks.
pub fn schema_error_response(err: &SchemaError) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": err.to_string(),
        "missingColumns": err.missing,
        "presentColumns": err.present,
    })
}
