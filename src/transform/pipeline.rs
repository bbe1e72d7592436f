//! High-level pipeline API for the export cleanup.
//!
//! This module combines all steps: parsing with auto-detection, required-
//! column validation, row partitioning, and (for the extended rule set)
//! reshaping kept rows into the loyalty import layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use loyalsift::{filter_file, FilterOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = filter_file("export.csv", &FilterOptions::default())?;
//!     println!("kept {} of {} rows", report.counts.kept, report.counts.total);
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{CsvError, LoadResult};
use crate::models::{FilterCounts, Table, Variant};
use crate::parser::{self, ParsedTable};
use crate::transform::predicate::ExclusionFilter;
use crate::transform::reshape::{reshape_table, rules_for};

/// Download name for the kept-rows CSV.
pub const KEPT_FILE_NAME: &str = "filtered_output.csv";

/// Download name for the excluded-rows CSV.
pub const EXCLUDED_FILE_NAME: &str = "excluded_rows.csv";

/// Options for the filter pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Rule set to apply
    pub variant: Variant,

    /// Delimiter override; `None` auto-detects from the header line
    pub delimiter: Option<char>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            variant: Variant::Extended,
            delimiter: None,
        }
    }
}

/// Result of a complete filter run
#[derive(Debug, Clone)]
pub struct FilterReport {
    /// Rows that passed every rule, reshaped when the rule set says so
    pub kept: Table,

    /// Rows that tripped a rule, in the original input schema
    pub excluded: Table,

    /// Row accounting; `total == kept + excluded` always holds
    pub counts: FilterCounts,

    /// What the parser detected about the input
    pub csv_info: CsvInfo,
}

/// Kept and excluded halves of one table, plus the row accounting.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub kept: Table,
    pub excluded: Table,
    pub counts: FilterCounts,
}

/// Parse metadata: detected encoding and delimiter, input schema, row count.
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Split rows into kept and excluded, preserving input order on both sides.
///
/// Both returned tables share the input schema. Every input row lands in
/// exactly one of the two.
pub fn partition_rows(table: &Table, variant: Variant) -> (Table, Table) {
    let filter = ExclusionFilter::new(variant);
    let mut kept = Table::new(table.headers().to_vec());
    let mut excluded = Table::new(table.headers().to_vec());

    for row in table.rows() {
        if filter.keeps(&row) {
            kept.push_row(row.cells().to_vec());
        } else {
            excluded.push_row(row.cells().to_vec());
        }
    }

    (kept, excluded)
}

/// Filter an already-validated table.
///
/// Partitions rows by the exclusion rules, then reshapes the kept side
/// when the rule set defines an import layout. Reshaping never changes
/// which rows are kept, only their columns.
pub fn filter_and_reshape(table: &Table, variant: Variant) -> FilterOutcome {
    log_info("🧹 Applying exclusion rules...");
    let (kept, excluded) = partition_rows(table, variant);
    let counts = FilterCounts {
        total: table.row_count(),
        kept: kept.row_count(),
        excluded: excluded.row_count(),
    };
    log_success(format!("Kept {} of {} rows", counts.kept, counts.total));
    if counts.excluded > 0 {
        log_warning(format!("{} rows tripped an exclusion rule", counts.excluded));
    }

    let kept = match rules_for(variant) {
        Some(rules) => {
            log_info("📦 Reshaping kept rows into the import layout...");
            let reshaped = reshape_table(&kept, rules);
            log_success(format!(
                "{} columns in import layout",
                reshaped.headers().len()
            ));
            reshaped
        }
        None => kept,
    };

    FilterOutcome {
        kept,
        excluded,
        counts,
    }
}

/// Filter a CSV file.
///
/// This is the main entry point for the pipeline. It:
/// 1. Parses the CSV with auto-detection
/// 2. Checks the rule set's required columns
/// 3. Partitions rows by the exclusion rules
/// 4. Reshapes kept rows into the import layout (extended rule set)
pub fn filter_file<P: AsRef<Path>>(path: P, options: &FilterOptions) -> LoadResult<FilterReport> {
    let bytes = std::fs::read(path.as_ref()).map_err(CsvError::from)?;
    filter_bytes(&bytes, options)
}

/// Filter raw CSV bytes.
///
/// Same as [`filter_file`] but accepts in-memory bytes, as handed over by
/// an HTTP upload.
pub fn filter_bytes(bytes: &[u8], options: &FilterOptions) -> LoadResult<FilterReport> {
    log_info("📖 Reading CSV export...");
    let parsed = parser::parse_bytes(bytes, options.delimiter)?;
    log_success(format!("Encoding: {}", parsed.encoding));
    log_success(format!(
        "Delimiter: '{}'",
        format_delimiter(parsed.delimiter)
    ));
    log_success(format!("Read {} rows", parsed.table.row_count()));

    filter_parsed(parsed, options)
}

/// Internal: filter an already-parsed table
fn filter_parsed(parsed: ParsedTable, options: &FilterOptions) -> LoadResult<FilterReport> {
    let ParsedTable {
        table,
        encoding,
        delimiter,
    } = parsed;

    let csv_info = CsvInfo {
        encoding,
        delimiter,
        headers: table.headers().to_vec(),
        row_count: table.row_count(),
    };

    log_info(format!("📋 CSV has {} columns:", table.headers().len()));
    for (i, col) in table.headers().iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    let required = options.variant.required_columns();
    log_info(format!(
        "🔎 Checking required columns ({} rule set)...",
        options.variant
    ));
    parser::validate_columns(&table, required)?;
    log_success(format!("All {} required columns present", required.len()));

    let FilterOutcome {
        kept,
        excluded,
        counts,
    } = filter_and_reshape(&table, options.variant);

    Ok(FilterReport {
        kept,
        excluded,
        counts,
        csv_info,
    })
}

/// Delimiter as something printable inside a log line.
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;

    fn default_row(first: &str, last: &str, license: &str) -> Vec<String> {
        Variant::Extended
            .required_columns()
            .iter()
            .map(|col| match *col {
                "First Name" => first.to_string(),
                "Last Name" => last.to_string(),
                "Customer Drivers License" => license.to_string(),
                "Customer ID" => format!("C-{first}"),
                "Street Address" => "12 Main St".to_string(),
                "City" => "Springfield".to_string(),
                "Reward Points ($) Balance" => "120".to_string(),
                _ => "x".to_string(),
            })
            .collect()
    }

    fn extended_csv(rows: &[Vec<String>]) -> Vec<u8> {
        let mut text = Variant::Extended.required_columns().join(",");
        for row in rows {
            text.push('\n');
            text.push_str(&row.join(","));
        }
        text.into_bytes()
    }

    #[test]
    fn test_default_options() {
        let opts = FilterOptions::default();
        assert_eq!(opts.variant, Variant::Extended);
        assert!(opts.delimiter.is_none());
    }

    #[test]
    fn test_end_to_end_extended() {
        let bytes = extended_csv(&[
            default_row("John", "Doe", "D100"),
            default_row("Test", "Doe", "D200"),
            default_row("Jane", "Roe", "N/A"),
        ]);

        let report = filter_bytes(&bytes, &FilterOptions::default()).unwrap();

        assert_eq!(report.counts.total, 3);
        assert_eq!(report.counts.kept, 1);
        assert_eq!(report.counts.excluded, 2);

        // Reshaping changed the columns, not the membership
        assert_eq!(report.kept.row_count(), report.counts.kept);
        assert_eq!(report.excluded.row_count(), report.counts.excluded);

        // Kept output is reshaped into the import layout
        assert_eq!(report.kept.headers()[0], "external ID");
        assert_eq!(report.kept.row(0).value("external ID"), "C-John");
        assert_eq!(
            report.kept.row(0).value("Address"),
            "12 Main St, Springfield"
        );

        // Excluded output keeps the original schema and input order
        assert_eq!(
            report.excluded.headers(),
            Variant::Extended.required_columns()
        );
        assert_eq!(report.excluded.row(0).value("First Name"), "Test");
        assert_eq!(report.excluded.row(1).value("First Name"), "Jane");
    }

    #[test]
    fn test_filter_and_reshape_on_loaded_table() {
        let mut table = Table::new(
            Variant::Extended
                .required_columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        table.push_row(default_row("John", "Doe", "D100"));
        table.push_row(default_row("Testing", "Smith", "D200"));

        let outcome = filter_and_reshape(&table, Variant::Extended);

        assert_eq!(outcome.counts.total, 2);
        assert_eq!(outcome.counts.kept, 1);
        assert_eq!(outcome.counts.excluded, 1);
        assert_eq!(outcome.kept.headers()[0], "external ID");
        assert_eq!(outcome.excluded.row(0).value("Last Name"), "Smith");
    }

    #[test]
    fn test_counts_add_up() {
        let bytes = extended_csv(&[
            default_row("John", "Doe", "D100"),
            default_row("Testing", "Doe", "D200"),
            default_row("Jane", "Roe", "D300"),
            default_row("Jim", "Cancelled", "D400"),
        ]);

        let report = filter_bytes(&bytes, &FilterOptions::default()).unwrap();
        assert_eq!(
            report.counts.total,
            report.counts.kept + report.counts.excluded
        );
    }

    #[test]
    fn test_kept_order_is_stable() {
        let bytes = extended_csv(&[
            default_row("John", "Doe", "D100"),
            default_row("Jane", "Roe", "D200"),
            default_row("Jim", "Poe", "D300"),
        ]);

        let report = filter_bytes(&bytes, &FilterOptions::default()).unwrap();
        assert_eq!(report.counts.kept, 3);
        assert_eq!(report.kept.row(0).value("First Name"), "John");
        assert_eq!(report.kept.row(1).value("First Name"), "Jane");
        assert_eq!(report.kept.row(2).value("First Name"), "Jim");
    }

    #[test]
    fn test_partition_keeps_relative_order_on_both_sides() {
        let mut table = Table::new(vec![
            "First Name".into(),
            "Last Name".into(),
            "Customer Drivers License".into(),
        ]);
        table.push_row(vec!["Ann".into(), "Lee".into(), "D1".into()]);
        table.push_row(vec!["Test".into(), "Lee".into(), "D2".into()]);
        table.push_row(vec!["Bob".into(), "Ray".into(), "D3".into()]);
        table.push_row(vec!["Cancelled".into(), "Ray".into(), "D4".into()]);
        table.push_row(vec!["Cara".into(), "Fox".into(), "D5".into()]);

        let (kept, excluded) = partition_rows(&table, Variant::Minimal);

        let first_names = |t: &Table| -> Vec<String> {
            t.rows().map(|r| r.value("First Name").to_string()).collect()
        };
        assert_eq!(first_names(&kept), ["Ann", "Bob", "Cara"]);
        assert_eq!(first_names(&excluded), ["Test", "Cancelled"]);
    }

    #[test]
    fn test_extra_column_dropped_from_kept_side_only() {
        let mut header = Variant::Extended.required_columns().to_vec();
        header.push("Loyalty Tier");
        let mut text = header.join(",");
        let mut keepable = default_row("John", "Doe", "D100");
        keepable.push("Gold".to_string());
        let mut excludable = default_row("Test", "Doe", "D200");
        excludable.push("Silver".to_string());
        for row in [&keepable, &excludable] {
            text.push('\n');
            text.push_str(&row.join(","));
        }

        let report = filter_bytes(text.as_bytes(), &FilterOptions::default()).unwrap();

        // The import layout has no slot for the extra column
        assert_eq!(report.kept.headers().len(), 30);
        assert!(!report.kept.headers().contains(&"Loyalty Tier".to_string()));
        // The excluded side keeps the full input schema
        assert_eq!(report.excluded.headers().len(), 21);
        assert_eq!(report.excluded.row(0).value("Loyalty Tier"), "Silver");
    }

    #[test]
    fn test_minimal_keeps_original_schema() {
        let bytes =
            b"First Name,Last Name,Customer Drivers License,Extra\nJohn,Doe,D100,keep me\n";
        let options = FilterOptions {
            variant: Variant::Minimal,
            delimiter: None,
        };

        let report = filter_bytes(bytes, &options).unwrap();

        assert_eq!(
            report.kept.headers(),
            &["First Name", "Last Name", "Customer Drivers License", "Extra"]
        );
        assert_eq!(report.kept.row(0).value("Extra"), "keep me");
    }

    #[test]
    fn test_customer_not_excluded_under_minimal() {
        let bytes = b"First Name,Last Name,Customer Drivers License\nCustomer,Doe,D100\n";
        let options = FilterOptions {
            variant: Variant::Minimal,
            delimiter: None,
        };

        let report = filter_bytes(bytes, &options).unwrap();
        assert_eq!(report.counts.kept, 1);
    }

    #[test]
    fn test_missing_columns_fail_before_filtering() {
        let bytes = b"First Name,Last Name\nTest,Doe\n";
        let err = filter_bytes(bytes, &FilterOptions::default()).unwrap_err();

        match err {
            LoadError::Schema(schema) => {
                assert!(schema
                    .missing
                    .contains(&"Customer Drivers License".to_string()));
                assert_eq!(schema.present, vec!["First Name", "Last Name"]);
            }
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[test]
    fn test_header_only_file() {
        let bytes = extended_csv(&[]);
        let report = filter_bytes(&bytes, &FilterOptions::default()).unwrap();

        assert_eq!(report.counts.total, 0);
        assert_eq!(report.counts.kept, 0);
        assert_eq!(report.counts.excluded, 0);
        // Layout headers are still emitted for the kept side
        assert_eq!(report.kept.headers().len(), 30);
    }

    #[test]
    fn test_filter_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, extended_csv(&[default_row("John", "Doe", "D100")])).unwrap();

        let report = filter_file(&path, &FilterOptions::default()).unwrap();
        assert_eq!(report.counts.kept, 1);
        assert_eq!(report.csv_info.delimiter, ',');
        assert_eq!(report.csv_info.row_count, 1);
    }
}
