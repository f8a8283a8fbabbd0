//! Row classification and styling

use colored::Colorize;

/// Coverage health of a table row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Healthy,
    Warning,
}

/// Classify a row from its rendered `% Lines` and `% Branches` cells.
///
/// `n/a` cells never trigger a warning, and neither does a missing or zero
/// threshold.
pub fn classify(
    line_percent: &str,
    branch_percent: &str,
    warning_threshold: Option<f64>,
) -> RowStatus {
    let Some(threshold) = warning_threshold.filter(|t| *t > 0.0) else {
        return RowStatus::Healthy;
    };

    let below = |cell: &str| {
        cell.strip_suffix('%')
            .and_then(|value| value.parse::<f64>().ok())
            .is_some_and(|value| value < threshold)
    };

    if below(line_percent) || below(branch_percent) {
        RowStatus::Warning
    } else {
        RowStatus::Healthy
    }
}

/// Wraps a fully rendered row for its status
pub trait RowStyle {
    fn paint(&self, status: RowStatus, row: String) -> String;
}

/// Leaves rows untouched
pub struct PlainStyle;

impl RowStyle for PlainStyle {
    fn paint(&self, _status: RowStatus, row: String) -> String {
        row
    }
}

/// Green for healthy rows, yellow for warnings.
///
/// Escapes come from `colored`, which emits nothing when `NO_COLOR` is set or
/// stdout is not a terminal unless `colored::control::set_override` is used.
pub struct TerminalStyle;

impl RowStyle for TerminalStyle {
    fn paint(&self, status: RowStatus, row: String) -> String {
        match status {
            RowStatus::Healthy => row.as_str().green().to_string(),
            RowStatus::Warning => row.as_str().yellow().to_string(),
        }
    }
}

pub fn row_style(colorize: bool) -> &'static dyn RowStyle {
    if colorize {
        &TerminalStyle
    } else {
        &PlainStyle
    }
}
