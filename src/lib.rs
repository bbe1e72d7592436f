//! # Loyalsift - customer export cleanup for loyalty imports
//!
//! Loyalsift takes a raw customer CSV export from the point-of-sale system,
//! drops rows flagged by the exclusion rules (placeholder names, unusable
//! drivers licenses), and reshapes the survivors into the loyalty
//! platform's import layout.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Predicate  │────▶│ Import CSV + │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  + Reshape  │     │ excluded CSV │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use loyalsift::{filter_file, FilterOptions};
//!
//! fn main() {
//!     let report = filter_file("export.csv", &FilterOptions::default()).unwrap();
//!     println!("kept {} of {} rows", report.counts.kept, report.counts.total);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types for loading and validation
//! - [`models`] - Table storage, rule-set variants, counters
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Predicates, reshaping, and pipeline
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, CsvResult, LoadError, LoadResult, SchemaError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{FilterCounts, Row, Table, Variant};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_table,
    parse_bytes,
    parse_bytes_auto,
    parse_decoded,
    parse_file_auto,
    serialize_csv,
    validate_columns,
    ParsedTable,
};

// =============================================================================
// Re-exports - Predicates and reshaping
// =============================================================================

pub use transform::{
    license_ok,
    reshape_table,
    rules_for,
    Derivation,
    ExclusionFilter,
    ReshapeRule,
    LOYALTY_IMPORT_RULES,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    filter_and_reshape,
    filter_bytes,
    filter_file,
    partition_rows,
    CsvInfo,
    FilterOptions,
    FilterOutcome,
    FilterReport,
    EXCLUDED_FILE_NAME,
    KEPT_FILE_NAME,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    error_response,
    schema_error_response,
    CsvMetadata,
    FilterResponse,
};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
