//! Report-wide totals and the coverage gate

use colored::Colorize;

use super::CoverageItem;

/// Line and branch counts summed over a set of items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageTotals {
    pub lines_covered: u64,
    pub lines_total: u64,
    pub branches_covered: u64,
    pub branches_total: u64,
}

impl CoverageTotals {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a CoverageItem>) -> Self {
        items.into_iter().fold(Self::default(), |mut totals, item| {
            totals.lines_covered += item.covered_lines;
            totals.lines_total += item.coverable_lines;
            totals.branches_covered += item.covered_branches;
            totals.branches_total += item.branches;
            totals
        })
    }

    /// `None` when there are no coverable lines
    pub fn line_percentage(&self) -> Option<f64> {
        ratio(self.lines_covered, self.lines_total)
    }

    /// `None` when there are no branches
    pub fn branch_percentage(&self) -> Option<f64> {
        ratio(self.branches_covered, self.branches_total)
    }
}

fn ratio(covered: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some((covered as f64 / total as f64) * 100.0)
}

/// Result of threshold validation
#[derive(Debug, Clone)]
pub struct ThresholdResult {
    pub passed: bool,
    pub line_coverage: Option<f64>,
    pub branch_coverage: Option<f64>,
    pub line_threshold: f64,
    pub line_delta: Option<f64>,
}

impl ThresholdResult {
    pub fn print_summary(&self) {
        match self.line_coverage {
            Some(coverage) => {
                let delta = coverage - self.line_threshold;
                let status = if delta >= 0.0 { "✓".green() } else { "✗".red() };
                let delta_str = if delta >= 0.0 {
                    format!("+{:.1}%", delta).green()
                } else {
                    format!("{:.1}%", delta).red()
                };

                println!(
                    "  {} Line coverage: {:.1}% (threshold: {:.1}%, {})",
                    status, coverage, self.line_threshold, delta_str
                );
            }
            None => println!("  {} Line coverage: {}", "→".dimmed(), "n/a".dimmed()),
        }

        if let Some(coverage) = self.branch_coverage {
            println!("  {} Branch coverage: {:.1}%", "•".dimmed(), coverage);
        }
    }
}

/// Validate line coverage against a minimum percentage.
///
/// A report with no coverable lines passes.
pub fn validate_threshold(totals: &CoverageTotals, line_threshold: f64) -> ThresholdResult {
    let line_coverage = totals.line_percentage();

    ThresholdResult {
        passed: line_coverage.map_or(true, |cov| cov >= line_threshold),
        line_coverage,
        branch_coverage: totals.branch_percentage(),
        line_threshold,
        line_delta: line_coverage.map(|cov| cov - line_threshold),
    }
}
