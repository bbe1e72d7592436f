//! Reshaping kept rows into the loyalty import layout.
//!
//! The import layout is a fixed list of [`ReshapeRule`]s, one per output
//! column in output order. Each rule names its target column and how the
//! cell derives from the source row. Derivations are total: missing or
//! blank source cells produce `""` or the rule's fallback, never an error.

use crate::models::{Row, Table, Variant};

/// How a target cell derives from the source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Copy a source column verbatim.
    Copy { source: &'static str },

    /// Fixed value for every row.
    Literal { value: &'static str },

    /// Join source columns with a separator, blank cells included.
    Concat {
        sources: &'static [&'static str],
        separator: &'static str,
    },

    /// Copy a source column, dropping every listed character.
    StripChars {
        source: &'static str,
        chars: &'static str,
    },

    /// One fixed value when the probe cell holds text, another when blank.
    PresenceFlag {
        probe: &'static str,
        present: &'static str,
        blank: &'static str,
    },

    /// Copy the probe cell as-is when it holds text, else a fallback.
    PresentOr {
        probe: &'static str,
        fallback: &'static str,
    },

    /// Copy a source column truncated to a maximum character count.
    Truncate {
        source: &'static str,
        max_chars: usize,
    },
}

impl Derivation {
    /// Compute the output cell for one row.
    pub fn apply(&self, row: &Row) -> String {
        match self {
            Derivation::Copy { source } => row.value(source).to_string(),
            Derivation::Literal { value } => (*value).to_string(),
            Derivation::Concat { sources, separator } => sources
                .iter()
                .map(|source| row.value(source))
                .collect::<Vec<_>>()
                .join(separator),
            Derivation::StripChars { source, chars } => row
                .value(source)
                .chars()
                .filter(|c| !chars.contains(*c))
                .collect(),
            Derivation::PresenceFlag {
                probe,
                present,
                blank,
            } => {
                if row.value(probe).trim().is_empty() {
                    (*blank).to_string()
                } else {
                    (*present).to_string()
                }
            }
            // Presence is judged on the trimmed cell, but the copied value
            // keeps its original whitespace.
            Derivation::PresentOr { probe, fallback } => {
                let raw = row.value(probe);
                if raw.trim().is_empty() {
                    (*fallback).to_string()
                } else {
                    raw.to_string()
                }
            }
            Derivation::Truncate { source, max_chars } => {
                row.value(source).chars().take(*max_chars).collect()
            }
        }
    }
}

/// One column of the import layout: target name plus its derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReshapeRule {
    pub target: &'static str,
    pub derivation: Derivation,
}

const fn copy(target: &'static str, source: &'static str) -> ReshapeRule {
    ReshapeRule {
        target,
        derivation: Derivation::Copy { source },
    }
}

const fn literal(target: &'static str, value: &'static str) -> ReshapeRule {
    ReshapeRule {
        target,
        derivation: Derivation::Literal { value },
    }
}

/// The loyalty import layout. Order here is the output column order.
pub static LOYALTY_IMPORT_RULES: &[ReshapeRule] = &[
    copy("external ID", "Customer ID"),
    copy("First Name", "First Name"),
    copy("Last Name", "Last Name"),
    copy("Gender", "Gender"),
    copy("Date of Birth", "Date of Birth"),
    copy("Email", "Email"),
    copy("Email Opt-In", "Opted In"),
    copy("Phone", "Phone"),
    literal("SMS Opt-In", "N"),
    literal("Push Opt-In", "N"),
    ReshapeRule {
        target: "Address",
        derivation: Derivation::Concat {
            sources: &["Street Address", "City"],
            separator: ", ",
        },
    },
    copy("State", "State"),
    copy("Zip", "Zip Code"),
    literal("Minimum Loyalty Level", "None"),
    ReshapeRule {
        target: "Point Balance",
        derivation: Derivation::StripChars {
            source: "Reward Points ($) Balance",
            chars: "$,",
        },
    },
    copy("Referral Source", "Customer Source"),
    literal("Created In Store", "Y"),
    literal("Doctor", "N/A"),
    literal("Doctor License", "N/A"),
    literal("Primary Document Type", "Driver's License"),
    copy("Primary Document Number", "Customer Drivers License"),
    copy("Expiration Date", "Customer Drivers License Expiration Date"),
    ReshapeRule {
        target: "Medical Document Type",
        derivation: Derivation::PresenceFlag {
            probe: "Medical Id",
            present: "MMID",
            blank: "None",
        },
    },
    ReshapeRule {
        target: "Medical Document Number",
        derivation: Derivation::PresentOr {
            probe: "Medical Id",
            fallback: "None",
        },
    },
    copy(
        "Medical Document Expiration Date",
        "Customer Medical Id Expiration Date",
    ),
    literal("Medical Document Renewal Rate", ""),
    literal("Medical Document Issue Date", ""),
    literal("Image URL", ""),
    ReshapeRule {
        target: "Notes",
        derivation: Derivation::Truncate {
            source: "Customer Profile Notes",
            max_chars: 500,
        },
    },
    copy("Banned", "Banned"),
];

/// Reshape rules for the variant, when it defines an import layout.
pub fn rules_for(variant: Variant) -> Option<&'static [ReshapeRule]> {
    match variant {
        Variant::Minimal => None,
        Variant::Extended => Some(LOYALTY_IMPORT_RULES),
    }
}

/// Apply a rule list to every row, producing the import-layout table.
///
/// Row count and row order carry over from the input table.
pub fn reshape_table(table: &Table, rules: &[ReshapeRule]) -> Table {
    let headers = rules.iter().map(|rule| rule.target.to_string()).collect();
    let mut out = Table::new(headers);

    for row in table.rows() {
        out.push_row(
            rules
                .iter()
                .map(|rule| rule.derivation.apply(&row))
                .collect(),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_table(overrides: &[(&str, &str)]) -> Table {
        let defaults: &[(&str, &str)] = &[
            ("First Name", "John"),
            ("Last Name", "Doe"),
            ("Customer Drivers License", "D1234567"),
            ("Customer ID", "C100"),
            ("Gender", "M"),
            ("Date of Birth", "01/01/1990"),
            ("Email", "john@example.com"),
            ("Opted In", "Yes"),
            ("Phone", "555-0100"),
            ("Street Address", "12 Main St"),
            ("City", "Springfield"),
            ("State", "IL"),
            ("Zip Code", "62704"),
            ("Reward Points ($) Balance", "$1,250.00"),
            ("Customer Source", "Walk-in"),
            ("Customer Drivers License Expiration Date", "01/01/2030"),
            ("Medical Id", ""),
            ("Customer Medical Id Expiration Date", ""),
            ("Customer Profile Notes", "regular"),
            ("Banned", "No"),
        ];

        let columns = Variant::Extended.required_columns();
        let headers: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let cells: Vec<String> = columns
            .iter()
            .map(|col| {
                overrides
                    .iter()
                    .chain(defaults.iter())
                    .find(|(name, _)| name == col)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default()
            })
            .collect();

        let mut table = Table::new(headers);
        table.push_row(cells);
        table
    }

    #[test]
    fn test_output_columns_in_order() {
        let out = reshape_table(&source_table(&[]), LOYALTY_IMPORT_RULES);

        let expected: Vec<&str> = vec![
            "external ID",
            "First Name",
            "Last Name",
            "Gender",
            "Date of Birth",
            "Email",
            "Email Opt-In",
            "Phone",
            "SMS Opt-In",
            "Push Opt-In",
            "Address",
            "State",
            "Zip",
            "Minimum Loyalty Level",
            "Point Balance",
            "Referral Source",
            "Created In Store",
            "Doctor",
            "Doctor License",
            "Primary Document Type",
            "Primary Document Number",
            "Expiration Date",
            "Medical Document Type",
            "Medical Document Number",
            "Medical Document Expiration Date",
            "Medical Document Renewal Rate",
            "Medical Document Issue Date",
            "Image URL",
            "Notes",
            "Banned",
        ];
        assert_eq!(out.headers(), expected.as_slice());
    }

    #[test]
    fn test_renames_and_literals() {
        let out = reshape_table(&source_table(&[]), LOYALTY_IMPORT_RULES);
        let row = out.row(0);

        assert_eq!(row.value("external ID"), "C100");
        assert_eq!(row.value("Email Opt-In"), "Yes");
        assert_eq!(row.value("Zip"), "62704");
        assert_eq!(row.value("SMS Opt-In"), "N");
        assert_eq!(row.value("Push Opt-In"), "N");
        assert_eq!(row.value("Minimum Loyalty Level"), "None");
        assert_eq!(row.value("Created In Store"), "Y");
        assert_eq!(row.value("Doctor"), "N/A");
        assert_eq!(row.value("Primary Document Type"), "Driver's License");
        assert_eq!(row.value("Primary Document Number"), "D1234567");
        assert_eq!(row.value("Image URL"), "");
    }

    #[test]
    fn test_address_concat() {
        let out = reshape_table(&source_table(&[]), LOYALTY_IMPORT_RULES);
        assert_eq!(out.row(0).value("Address"), "12 Main St, Springfield");
    }

    #[test]
    fn test_address_concat_keeps_blank_parts() {
        let out = reshape_table(&source_table(&[("City", "")]), LOYALTY_IMPORT_RULES);
        assert_eq!(out.row(0).value("Address"), "12 Main St, ");
    }

    #[test]
    fn test_point_balance_strips_currency_marks() {
        let out = reshape_table(&source_table(&[]), LOYALTY_IMPORT_RULES);
        assert_eq!(out.row(0).value("Point Balance"), "1250.00");
    }

    #[test]
    fn test_medical_fields_when_blank() {
        let out = reshape_table(&source_table(&[("Medical Id", "  ")]), LOYALTY_IMPORT_RULES);
        let row = out.row(0);

        assert_eq!(row.value("Medical Document Type"), "None");
        assert_eq!(row.value("Medical Document Number"), "None");
    }

    #[test]
    fn test_medical_fields_when_present() {
        let out = reshape_table(
            &source_table(&[("Medical Id", " MM-4521 ")]),
            LOYALTY_IMPORT_RULES,
        );
        let row = out.row(0);

        assert_eq!(row.value("Medical Document Type"), "MMID");
        // Copied verbatim, surrounding whitespace and all
        assert_eq!(row.value("Medical Document Number"), " MM-4521 ");
    }

    #[test]
    fn test_notes_truncated_to_500_chars() {
        let long = "x".repeat(600);
        let out = reshape_table(
            &source_table(&[("Customer Profile Notes", &long)]),
            LOYALTY_IMPORT_RULES,
        );
        assert_eq!(out.row(0).value("Notes"), "x".repeat(500));

        let exact = "y".repeat(500);
        let out = reshape_table(
            &source_table(&[("Customer Profile Notes", &exact)]),
            LOYALTY_IMPORT_RULES,
        );
        assert_eq!(out.row(0).value("Notes"), exact);

        let out = reshape_table(
            &source_table(&[("Customer Profile Notes", "short note")]),
            LOYALTY_IMPORT_RULES,
        );
        assert_eq!(out.row(0).value("Notes"), "short note");
    }

    #[test]
    fn test_notes_truncation_counts_chars_not_bytes() {
        let accented = "é".repeat(510);
        let out = reshape_table(
            &source_table(&[("Customer Profile Notes", &accented)]),
            LOYALTY_IMPORT_RULES,
        );
        assert_eq!(out.row(0).value("Notes").chars().count(), 500);
    }

    #[test]
    fn test_row_order_preserved() {
        let mut table = source_table(&[]);
        table.push_row(
            source_table(&[("Customer ID", "C200"), ("First Name", "Jane")])
                .row(0)
                .cells()
                .to_vec(),
        );

        let out = reshape_table(&table, LOYALTY_IMPORT_RULES);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.row(0).value("external ID"), "C100");
        assert_eq!(out.row(1).value("external ID"), "C200");
        assert_eq!(out.row(1).value("First Name"), "Jane");
    }

    #[test]
    fn test_rules_only_for_extended() {
        assert!(rules_for(Variant::Minimal).is_none());
        assert_eq!(
            rules_for(Variant::Extended).map(|r| r.len()),
            Some(LOYALTY_IMPORT_RULES.len())
        );
    }

    #[test]
    fn test_layout_width() {
        assert_eq!(LOYALTY_IMPORT_RULES.len(), 30);
    }
}
