//! Cobertura Report - console coverage tables
//!
//! A library for turning Cobertura XML coverage into a console report:
//! - Per-class line and branch coverage, with partial classes merged
//! - Optional filtering by Cobertura package
//! - Namespace-grouped table with subtotal rows
//! - Compact uncovered-line ranges and threshold coloring

pub mod config;
pub mod coverage;
pub mod error;
pub mod report;

pub use config::{Config, FormatterConfig, ReportFormat};
pub use coverage::{parse_cobertura, parse_cobertura_string, CoverageItem, CoverageTotals};
pub use error::{ReportError, Result};
pub use report::{format_coverage_items, format_json};
