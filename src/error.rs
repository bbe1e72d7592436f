//! Error types for the loyalsift filtering pipeline.
//!
//! Two things can go wrong before any row is classified:
//!
//! - [`CsvError`] - the input could not be decoded or parsed as CSV
//! - [`SchemaError`] - the input parsed but lacks required columns
//!
//! Both are terminal for the invocation: nothing is retried, no rows are
//! partially processed, and the caller recovers by supplying a corrected
//! file. Once a table has passed validation, filtering and reshaping are
//! total functions and produce no further errors.
//!
//! Error conversion is automatic via `From` implementations, allowing `?`
//! to work across layer boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading raw bytes into a table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read the input file.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV (broken record).
    #[error("invalid CSV: {0}")]
    Malformed(#[from] csv::Error),

    /// A quoted field was opened but never closed.
    #[error("invalid CSV: unterminated quoted field starting on line {0}")]
    UnterminatedQuote(usize),

    /// A caller-supplied delimiter the byte-oriented reader cannot use.
    #[error("invalid delimiter '{0}': must be an ASCII character")]
    NonAsciiDelimiter(char),

    /// Input had no header row at all.
    #[error("CSV file is empty")]
    EmptyFile,
}

// =============================================================================
// Schema Validation Errors
// =============================================================================

/// Required columns are absent from the input header.
///
/// Carries the complete list of missing names and the complete list of
/// columns actually present, so the caller can show the user both sides.
#[derive(Debug, Clone, Error)]
#[error(
    "missing required columns: {}; columns present: {}",
    missing.join(", "),
    present.join(", ")
)]
pub struct SchemaError {
    /// Required columns not found in the header.
    pub missing: Vec<String>,
    /// Every column the input actually has, in header order.
    pub present: Vec<String>,
}

// =============================================================================
// Loader Errors
// =============================================================================

/// Everything the loader can report: parse failure or schema failure.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Input could not be parsed; aborts before validation.
    #[error(transparent)]
    Parse(#[from] CsvError),

    /// Input parsed but is missing required columns; aborts before filtering.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV parse/serialize operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for the loader.
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_both_sides() {
        let err = SchemaError {
            missing: vec!["Customer ID".into(), "Banned".into()],
            present: vec!["First Name".into(), "Last Name".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Customer ID, Banned"));
        assert!(msg.contains("First Name, Last Name"));
    }

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> LoadError
        let csv_err = CsvError::EmptyFile;
        let load_err: LoadError = csv_err.into();
        assert!(load_err.to_string().contains("empty"));

        // SchemaError -> LoadError
        let schema_err = SchemaError {
            missing: vec!["Medical Id".into()],
            present: vec![],
        };
        let load_err: LoadError = schema_err.into();
        assert!(load_err.to_string().contains("Medical Id"));
    }
}
