//! Console report for parsed coverage
//!
//! Renders a four-column table grouped by namespace:
//!
//! ```text
//! ------------|-----------|--------------|---------------------
//! Class Name  |  % Lines  |  % Branches  |  Uncovered Line #s
//! ------------|-----------|--------------|---------------------
//! A.B         |      65%  |         50%  |
//!   First     |      65%  |         50%  |  10-11
//! ------------|-----------|--------------|---------------------
//! ```
//!
//! Each namespace gets a subtotal row above its classes. Classes without a
//! namespace are listed first, unindented and without a subtotal.

mod ranges;
mod style;

pub use ranges::compact_number_ranges;
pub use style::{classify, row_style, PlainStyle, RowStatus, RowStyle, TerminalStyle};

use serde::Serialize;

use crate::config::FormatterConfig;
use crate::coverage::CoverageItem;
use crate::error::{ReportError, Result};

const HEADERS: [&str; 4] = ["Class Name", "% Lines", "% Branches", "Uncovered Line #s"];
const COLUMN_SEPARATOR: &str = "  |  ";
const MEMBER_INDENT: &str = "  ";

/// Character budget of the `Uncovered Line #s` cell
pub const UNCOVERED_LINES_MAX_LENGTH: usize = 17;

/// `covered / total` as a whole percentage, or `n/a` when `total` is zero
pub fn percent(covered: u64, total: u64) -> String {
    if total == 0 {
        return "n/a".to_string();
    }
    format!("{:.0}%", covered as f64 / total as f64 * 100.0)
}

/// Format coverage items as a console table.
///
/// Fails with [`ReportError::NoCoverageData`] when `items` is empty.
pub fn format_coverage_items(items: &[CoverageItem], config: &FormatterConfig) -> Result<String> {
    format_with_style(items, config.warning_threshold, row_style(config.colorize))
}

/// Same layout as [`format_coverage_items`] with a caller-supplied row style
pub fn format_with_style(
    items: &[CoverageItem],
    warning_threshold: Option<f64>,
    style: &dyn RowStyle,
) -> Result<String> {
    if items.is_empty() {
        return Err(ReportError::NoCoverageData);
    }

    let mut table = TableWriter {
        layout: Layout::for_items(items),
        style,
        warning_threshold,
        output: String::new(),
    };

    table.write_rule();
    table.write_header();
    table.write_rule();

    for (namespace, members) in group_by_namespace(items) {
        let indent = if namespace.is_empty() { "" } else { MEMBER_INDENT };

        if !namespace.is_empty() {
            let lines = percent(
                members.iter().map(|i| i.covered_lines).sum(),
                members.iter().map(|i| i.coverable_lines).sum(),
            );
            let branches = percent(
                members.iter().map(|i| i.covered_branches).sum(),
                members.iter().map(|i| i.branches).sum(),
            );
            table.write_row([namespace, &lines, &branches, ""]);
        }

        for item in members {
            let label = format!("{}{}", indent, item.class_name());
            let lines = percent(item.covered_lines, item.coverable_lines);
            let branches = percent(item.covered_branches, item.branches);
            let uncovered =
                compact_number_ranges(&item.uncovered_line_numbers, UNCOVERED_LINES_MAX_LENGTH);
            table.write_row([&label, &lines, &branches, &uncovered]);
        }
    }

    table.write_rule();

    Ok(table.output)
}

/// Accumulates the rendered table
struct TableWriter<'s> {
    layout: Layout,
    style: &'s dyn RowStyle,
    warning_threshold: Option<f64>,
    output: String,
}

impl TableWriter<'_> {
    fn write_rule(&mut self) {
        self.output.push_str(&self.layout.separator());
        self.output.push('\n');
    }

    fn write_header(&mut self) {
        self.output.push_str(&self.layout.row(HEADERS));
        self.output.push('\n');
    }

    /// Data rows are styled as a whole from their two percentage cells
    fn write_row(&mut self, cells: [&str; 4]) {
        let status = classify(cells[1], cells[2], self.warning_threshold);
        let row = self.style.paint(status, self.layout.row(cells));
        self.output.push_str(&row);
        self.output.push('\n');
    }
}

/// Sort by namespace (stable) and collect runs sharing one
fn group_by_namespace(items: &[CoverageItem]) -> Vec<(&str, Vec<&CoverageItem>)> {
    let mut sorted: Vec<&CoverageItem> = items.iter().collect();
    sorted.sort_by(|a, b| a.class_namespace().cmp(b.class_namespace()));

    let mut groups: Vec<(&str, Vec<&CoverageItem>)> = Vec::new();
    for item in sorted {
        match groups.last_mut() {
            Some((namespace, members)) if *namespace == item.class_namespace() => {
                members.push(item)
            }
            _ => groups.push((item.class_namespace(), vec![item])),
        }
    }
    groups
}

struct Layout {
    widths: [usize; 4],
}

impl Layout {
    /// The name column fits the header and every class and namespace label;
    /// the others are as wide as their headers.
    fn for_items(items: &[CoverageItem]) -> Self {
        let mut widths = HEADERS.map(|header| header.chars().count());
        let longest_name = items
            .iter()
            .map(|item| {
                item.class_name()
                    .chars()
                    .count()
                    .max(item.class_namespace().chars().count())
            })
            .max()
            .unwrap_or(0);
        widths[0] = widths[0].max(longest_name);
        Self { widths }
    }

    fn separator(&self) -> String {
        let [first, rest @ ..] = self.widths;
        let mut parts = vec!["-".repeat(first + 2)];
        parts.extend(rest.iter().map(|width| "-".repeat(width + 4)));
        parts.join("|")
    }

    fn row(&self, cells: [&str; 4]) -> String {
        let [name, lines, branches, uncovered] = cells;
        let [w0, w1, w2, w3] = self.widths;
        [
            format!("{:<w0$}", name),
            format!("{:>w1$}", lines),
            format!("{:>w2$}", branches),
            format!("{:<w3$}", uncovered),
        ]
        .join(COLUMN_SEPARATOR)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonItem<'a> {
    class_name: &'a str,
    class_namespace: &'a str,
    #[serde(flatten)]
    item: &'a CoverageItem,
}

/// Render items as pretty-printed JSON, including the derived class name
/// and namespace.
pub fn format_json(items: &[CoverageItem]) -> Result<String> {
    if items.is_empty() {
        return Err(ReportError::NoCoverageData);
    }

    let view: Vec<JsonItem> = items
        .iter()
        .map(|item| JsonItem {
            class_name: item.class_name(),
            class_namespace: item.class_namespace(),
            item,
        })
        .collect();

    Ok(serde_json::to_string_pretty(&view)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::Colorize;

    fn item(
        name: &str,
        coverable: u64,
        covered: u64,
        branches: u64,
        covered_branches: u64,
        uncovered: &[u32],
    ) -> CoverageItem {
        CoverageItem {
            coverable_lines: coverable,
            covered_lines: covered,
            uncovered_line_numbers: uncovered.to_vec(),
            branches,
            covered_branches,
            ..CoverageItem::new(name, format!("{name}.cs"))
        }
    }

    fn table(lines: &[&str]) -> String {
        let mut expected = lines.join("\n");
        expected.push('\n');
        expected
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(65, 100), "65%");
        assert_eq!(percent(31, 32), "97%");
        assert_eq!(percent(0, 4), "0%");
        assert_eq!(percent(0, 0), "n/a");
        assert_eq!(percent(7, 0), "n/a");
        assert_eq!(percent(4_000_000_000, 8_000_000_000), "50%");
    }

    #[test]
    fn test_subtotal_of_large_branch_counts() {
        let items = vec![
            item("A.B.First", 1, 1, 4_000_000_000, 4_000_000_000, &[]),
            item("A.B.Second", 1, 1, 4_000_000_000, 2_000_000_000, &[]),
        ];
        let output = format_coverage_items(&items, &FormatterConfig::no_color()).unwrap();

        let subtotal = output.lines().nth(3).unwrap();
        assert!(subtotal.starts_with("A.B"));
        assert!(subtotal.contains("75%"));
    }

    #[test]
    fn test_format_groups_namespace_with_subtotal() {
        let items = vec![
            item("A.B.First", 100, 65, 12, 6, &[10, 11]),
            item("A.B.Second", 100, 65, 12, 6, &[10, 11]),
        ];

        let result = format_coverage_items(&items, &FormatterConfig::no_color()).unwrap();

        let expected = table(&[
            "------------|-----------|--------------|---------------------",
            "Class Name  |  % Lines  |  % Branches  |  Uncovered Line #s",
            "------------|-----------|--------------|---------------------",
            "A.B         |      65%  |         50%  |                   ",
            "  First     |      65%  |         50%  |  10-11            ",
            "  Second    |      65%  |         50%  |  10-11            ",
            "------------|-----------|--------------|---------------------",
        ]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_format_class_without_namespace() {
        let items = vec![item("Program", 10, 5, 0, 0, &[])];

        let result = format_coverage_items(&items, &FormatterConfig::no_color()).unwrap();

        let expected = table(&[
            "------------|-----------|--------------|---------------------",
            "Class Name  |  % Lines  |  % Branches  |  Uncovered Line #s",
            "------------|-----------|--------------|---------------------",
            "Program     |      50%  |         n/a  |                   ",
            "------------|-----------|--------------|---------------------",
        ]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_format_sorts_namespaces_and_widens_name_column() {
        let items = vec![
            item("SampleApp.Domain.Services.SomeService", 32, 31, 12, 9, &[40]),
            item(
                "SampleApp.Api.Program",
                4,
                0,
                0,
                0,
                &[1, 2, 3, 5, 8, 9, 10, 12, 20, 21],
            ),
            item("Startup", 2, 2, 2, 1, &[]),
        ];

        let result = format_coverage_items(&items, &FormatterConfig::no_color()).unwrap();

        let expected = table(&[
            "---------------------------|-----------|--------------|---------------------",
            "Class Name                 |  % Lines  |  % Branches  |  Uncovered Line #s",
            "---------------------------|-----------|--------------|---------------------",
            "Startup                    |     100%  |         50%  |                   ",
            "SampleApp.Api              |       0%  |         n/a  |                   ",
            "  Program                  |       0%  |         n/a  |  1-3, 5, 8-10...  ",
            "SampleApp.Domain.Services  |      97%  |         75%  |                   ",
            "  SomeService              |      97%  |         75%  |  40               ",
            "---------------------------|-----------|--------------|---------------------",
        ]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_format_keeps_member_order_within_namespace() {
        let items = vec![
            item("N.Zeta", 1, 1, 0, 0, &[]),
            item("Other.Alpha", 1, 1, 0, 0, &[]),
            item("N.Alpha", 1, 1, 0, 0, &[]),
        ];

        let result = format_coverage_items(&items, &FormatterConfig::no_color()).unwrap();
        let labels: Vec<&str> = result
            .lines()
            .skip(3)
            .take(5)
            .filter_map(|line| line.split('|').next())
            .map(str::trim_end)
            .collect();

        assert_eq!(
            labels,
            vec!["N", "  Zeta", "  Alpha", "Other", "  Alpha"]
        );
    }

    #[test]
    fn test_format_empty_items_is_an_error() {
        let err = format_coverage_items(&[], &FormatterConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::NoCoverageData));
    }

    #[test]
    fn test_colorize_wraps_rows_by_threshold() {
        colored::control::set_override(true);

        let items = vec![
            item("A.Full", 10, 10, 4, 4, &[]),
            item("A.Half", 10, 5, 0, 0, &[1, 2, 3, 4, 5]),
            item("A.NoBranches", 10, 10, 0, 0, &[]),
        ];
        let config = FormatterConfig {
            colorize: true,
            warning_threshold: Some(90.0),
        };

        let plain = format_coverage_items(&items, &FormatterConfig::no_color()).unwrap();
        let colored = format_coverage_items(&items, &config).unwrap();

        let plain: Vec<&str> = plain.lines().collect();
        let colored: Vec<&str> = colored.lines().collect();
        assert_eq!(plain.len(), colored.len());

        // Separators and header are never styled
        for index in [0, 1, 2, 7] {
            assert_eq!(colored[index], plain[index]);
        }
        // Subtotal: 25/30 lines = 83%
        assert_eq!(colored[3], plain[3].yellow().to_string());
        assert_eq!(colored[4], plain[4].green().to_string());
        assert_eq!(colored[5], plain[5].yellow().to_string());
        assert_eq!(colored[6], plain[6].green().to_string());
    }

    #[test]
    fn test_colorize_without_threshold_is_all_healthy() {
        colored::control::set_override(true);

        let items = vec![item("A.Low", 10, 1, 10, 1, &[])];
        let config = FormatterConfig {
            colorize: true,
            warning_threshold: None,
        };

        let plain = format_coverage_items(&items, &FormatterConfig::no_color()).unwrap();
        let colored = format_coverage_items(&items, &config).unwrap();

        for (colored, plain) in colored.lines().zip(plain.lines()).skip(3).take(2) {
            assert_eq!(colored, plain.green().to_string());
        }
    }

    struct Brackets;

    impl RowStyle for Brackets {
        fn paint(&self, status: RowStatus, row: String) -> String {
            match status {
                RowStatus::Healthy => format!("[{row}]"),
                RowStatus::Warning => format!("<{row}>"),
            }
        }
    }

    #[test]
    fn test_custom_row_style_shares_layout() {
        let items = vec![item("Program", 10, 5, 0, 0, &[])];

        let result = format_with_style(&items, Some(90.0), &Brackets).unwrap();
        let row = result.lines().nth(3).unwrap();

        assert_eq!(
            row,
            "<Program     |      50%  |         n/a  |                   >"
        );
    }

    #[test]
    fn test_format_json_includes_derived_names() {
        let mut widget = item("App.Domain.Widget", 4, 3, 2, 1, &[7]);
        widget.uncovered_branch_line_numbers = vec![5];

        let json = format_json(&[widget]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let first = &value[0];
        assert_eq!(first["className"], "Widget");
        assert_eq!(first["classNamespace"], "App.Domain");
        assert_eq!(first["name"], "App.Domain.Widget");
        assert_eq!(first["fileName"], "App.Domain.Widget.cs");
        assert_eq!(first["coverableLines"], 4);
        assert_eq!(first["uncoveredLineNumbers"], serde_json::json!([7]));
        assert_eq!(first["uncoveredBranchLineNumbers"], serde_json::json!([5]));
    }

    #[test]
    fn test_format_json_empty_items_is_an_error() {
        assert!(matches!(format_json(&[]), Err(ReportError::NoCoverageData)));
    }
}
