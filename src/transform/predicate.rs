//! Row-level keep/exclude rules.
//!
//! A row survives when every rule passes: neither name cell contains an
//! exclusion term and the drivers license holds a usable value. Term
//! matching is case-insensitive substring containment, so "Tester" and
//! "CANCELLED ACCT" both trip the name rule, and so does a term embedded
//! in a longer name such as "Protester".

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Row, Variant};

// Terms are plain lowercase words, so joining with '|' needs no escaping.
fn compile_terms(terms: &[&str]) -> Regex {
    let pattern = format!("(?i){}", terms.join("|"));
    Regex::new(&pattern).expect("Invalid exclusion pattern")
}

static BASE_TERMS: Lazy<Regex> = Lazy::new(|| compile_terms(Variant::Minimal.exclusion_terms()));
static EXTENDED_TERMS: Lazy<Regex> =
    Lazy::new(|| compile_terms(Variant::Extended.exclusion_terms()));

/// Compiled keep/exclude rules for one variant.
#[derive(Debug, Clone, Copy)]
pub struct ExclusionFilter {
    terms: &'static Regex,
}

impl ExclusionFilter {
    pub fn new(variant: Variant) -> Self {
        let terms = match variant {
            Variant::Minimal => &*BASE_TERMS,
            Variant::Extended => &*EXTENDED_TERMS,
        };
        Self { terms }
    }

    /// True when the row passes every rule and belongs in the kept output.
    ///
    /// Missing cells read as `""`, which fails the license rule and passes
    /// the name rules, same as a blank cell would.
    pub fn keeps(&self, row: &Row) -> bool {
        self.name_ok(row.value("First Name"))
            && self.name_ok(row.value("Last Name"))
            && license_ok(row.value("Customer Drivers License"))
    }

    fn name_ok(&self, value: &str) -> bool {
        !self.terms.is_match(value)
    }
}

/// A license cell counts as usable when it holds something other than
/// whitespace and is not a literal N/A marker (any casing).
pub fn license_ok(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.to_uppercase() != "N/A"
}
