//! Domain models for the filtering pipeline.
//!
//! This module contains the core data structures shared by the loader, the
//! filter engine, and the external surfaces:
//!
//! - [`Table`] - string-typed tabular data with one shared header
//! - [`Row`] - borrowed, name-addressed view of one table row
//! - [`Variant`] - the configured rule set (required columns + exclusion terms)
//! - [`FilterCounts`] - total/kept/excluded summary for one invocation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Table
// =============================================================================

/// In-memory tabular data: one ordered header, row-major string cells.
///
/// Every row holds exactly `headers.len()` cells; [`Table::push_row`]
/// enforces this by padding short rows with `""` and dropping cells beyond
/// the header. Cell text is stored verbatim - no trimming, no typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given column schema.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, normalizing it to the header width.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    /// Column names, in output order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Index of a column by exact name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Borrowed view of the row at `idx`.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds.
    pub fn row(&self, idx: usize) -> Row<'_> {
        Row {
            headers: &self.headers,
            cells: &self.rows[idx],
        }
    }

    /// Iterate all rows in input order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row {
            headers: &self.headers,
            cells,
        })
    }

    /// Required column names absent from this table's header.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| (*name).to_string())
            .collect()
    }
}

// =============================================================================
// Row
// =============================================================================

/// Borrowed view of one table row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell value for `name`, if the column exists.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|idx| self.cells[idx].as_str())
    }

    /// Cell value for `name`, or `""` when the column is absent.
    ///
    /// The loader guarantees required columns exist before the engine runs,
    /// so lookups of required columns always hit; the empty fallback keeps
    /// name matching null-safe for anything else.
    pub fn value(&self, name: &str) -> &'a str {
        self.get(name).unwrap_or("")
    }

    /// Raw cells in header order.
    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}

// =============================================================================
// Variant
// =============================================================================

/// Exclusion terms shared by both rule sets.
const BASE_EXCLUSION_TERMS: [&str; 4] = ["canceled", "cancelled", "test", "testing"];

/// Extended adds `customer`, as shipped in the production rule.
const EXTENDED_EXCLUSION_TERMS: [&str; 5] =
    ["canceled", "cancelled", "test", "testing", "customer"];

/// Columns the minimal rule set needs: just enough to filter.
const MINIMAL_REQUIRED_COLUMNS: [&str; 3] =
    ["First Name", "Last Name", "Customer Drivers License"];

/// Columns the extended rule set needs: everything the loyalty-platform
/// import schema derives from.
const EXTENDED_REQUIRED_COLUMNS: [&str; 20] = [
    "First Name",
    "Last Name",
    "Customer Drivers License",
    "Customer ID",
    "Gender",
    "Date of Birth",
    "Email",
    "Opted In",
    "Phone",
    "Street Address",
    "City",
    "State",
    "Zip Code",
    "Reward Points ($) Balance",
    "Customer Source",
    "Customer Drivers License Expiration Date",
    "Medical Id",
    "Customer Medical Id Expiration Date",
    "Customer Profile Notes",
    "Banned",
];

/// One of the two configured rule sets.
///
/// `Minimal` filters only and leaves the schema untouched. `Extended`
/// additionally excludes the term `customer` and projects kept rows into
/// the loyalty-platform import schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Filter only; outputs keep the original schema.
    Minimal,
    /// Filter plus reshape into the import schema; extra `customer` term.
    Extended,
}

impl Variant {
    /// Columns that must be present before any row is processed.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Variant::Minimal => &MINIMAL_REQUIRED_COLUMNS,
            Variant::Extended => &EXTENDED_REQUIRED_COLUMNS,
        }
    }

    /// Name substrings that exclude a row, matched case-insensitively.
    pub fn exclusion_terms(self) -> &'static [&'static str] {
        match self {
            Variant::Minimal => &BASE_EXCLUSION_TERMS,
            Variant::Extended => &EXTENDED_EXCLUSION_TERMS,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Minimal => write!(f, "minimal"),
            Variant::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Variant::Minimal),
            "extended" => Ok(Variant::Extended),
            other => Err(format!(
                "unknown variant '{other}' (expected 'minimal' or 'extended')"
            )),
        }
    }
}

// =============================================================================
// Counts
// =============================================================================

/// Summary counters for one filter invocation.
///
/// Always satisfies `total == kept + excluded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCounts {
    /// Rows in the validated input.
    pub total: usize,
    /// Rows passing every predicate check.
    pub kept: usize,
    /// Rows failing at least one check.
    pub excluded: usize,
}
