//! Filtering and reshaping module.
//!
//! This module handles the export cleanup:
//! - Predicate: row-level keep/exclude rules
//! - Reshape: kept rows into the loyalty import layout
//! - Pipeline: main filter pipeline

pub mod pipeline;
pub mod predicate;
pub mod reshape;

pub use pipeline::*;
pub use predicate::{license_ok, ExclusionFilter};
pub use reshape::{reshape_table, rules_for, Derivation, ReshapeRule, LOYALTY_IMPORT_RULES};
