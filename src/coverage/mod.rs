//! Coverage module
//!
//! Provides:
//! - The per-class `CoverageItem` model
//! - Cobertura XML parsing with partial-class merging
//! - Report-wide totals and threshold validation

mod cobertura;
mod threshold;

pub use cobertura::*;
pub use threshold::*;

use serde::Serialize;

/// Aggregated coverage for one fully-qualified class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageItem {
    /// Dotted name, e.g. `App.Domain.Widget`
    pub name: String,
    pub file_name: String,
    pub coverable_lines: u64,
    pub covered_lines: u64,
    /// Zero-hit line numbers in document order, not deduplicated
    pub uncovered_line_numbers: Vec<u32>,
    pub branches: u64,
    pub covered_branches: u64,
    /// Branch lines with at least one uncovered condition
    pub uncovered_branch_line_numbers: Vec<u32>,
}

impl CoverageItem {
    pub fn new(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    /// Segment after the last `.`, or the whole name
    pub fn class_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((_, class_name)) => class_name,
            None => &self.name,
        }
    }

    /// Segment before the last `.`, or `""`
    pub fn class_namespace(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((namespace, _)) => namespace,
            None => "",
        }
    }

    /// Fold another part of the same class into this one.
    ///
    /// Counters are summed and line lists concatenated, ours first.
    pub fn merge(&mut self, other: CoverageItem) {
        self.coverable_lines += other.coverable_lines;
        self.covered_lines += other.covered_lines;
        self.branches += other.branches;
        self.covered_branches += other.covered_branches;
        self.uncovered_line_numbers.extend(other.uncovered_line_numbers);
        self.uncovered_branch_line_numbers.extend(other.uncovered_branch_line_numbers);
    }
}
