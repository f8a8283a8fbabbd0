//! Cobertura XML format parser

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use super::CoverageItem;
use crate::error::{ReportError, Result};

/// Parse a Cobertura XML file
pub fn parse_cobertura(path: &Path, package_filter: Option<&str>) -> Result<Vec<CoverageItem>> {
    let content = fs::read_to_string(path)?;
    parse_cobertura_string(&content, package_filter)
}

/// Parse Cobertura XML content from a string.
///
/// When `package_filter` is set, only `<package>` elements whose `name`
/// attribute equals it are read. Classes sharing a name are merged into the
/// first one seen.
pub fn parse_cobertura_string(
    content: &str,
    package_filter: Option<&str>,
) -> Result<Vec<CoverageItem>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut state = ParseState::new(package_filter);
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                saw_root = true;
                state.open(e, false, reader.buffer_position())?;
                state.stack.push(e.name().as_ref().to_vec());
            }
            Ok(Event::Empty(ref e)) => {
                saw_root = true;
                state.open(e, true, reader.buffer_position())?;
            }
            Ok(Event::End(ref e)) => {
                state.close(e.name().as_ref());
                state.stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(source) => {
                return Err(ReportError::Xml {
                    position: reader.buffer_position(),
                    source,
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ReportError::EmptyDocument);
    }
    if !state.stack.is_empty() {
        return Err(ReportError::UnexpectedEof {
            open: state.stack.len(),
        });
    }

    Ok(state.index.into_items())
}

/// Keyed upsert of class parts, keeping first-seen order
#[derive(Default)]
struct ItemIndex {
    items: Vec<CoverageItem>,
    by_name: HashMap<String, usize>,
}

impl ItemIndex {
    fn upsert(&mut self, item: CoverageItem) {
        match self.by_name.get(&item.name) {
            Some(&index) => self.items[index].merge(item),
            None => {
                self.by_name.insert(item.name.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    fn into_items(self) -> Vec<CoverageItem> {
        self.items
    }
}

/// A `<class>` whose lines are still being read
struct OpenClass {
    item: CoverageItem,
    depth: usize,
}

/// A `<line>` whose `<conditions>` are still being read
struct OpenLine {
    number: u32,
    hits: u64,
    branch: Option<(u32, u32)>,
    conditions: usize,
    depth: usize,
}

struct ParseState<'f> {
    filter: Option<&'f str>,
    stack: Vec<Vec<u8>>,
    /// One entry per open `<package>`: whether it passed the filter
    packages: Vec<bool>,
    class: Option<OpenClass>,
    line: Option<OpenLine>,
    index: ItemIndex,
}

impl<'f> ParseState<'f> {
    fn new(filter: Option<&'f str>) -> Self {
        Self {
            filter,
            stack: Vec::new(),
            packages: Vec::new(),
            class: None,
            line: None,
            index: ItemIndex::default(),
        }
    }

    fn parent_is(&self, path: &[&[u8]]) -> bool {
        let len = self.stack.len();
        len >= path.len()
            && self.stack[len - path.len()..]
                .iter()
                .zip(path)
                .all(|(open, expected)| open.as_slice() == *expected)
    }

    /// Handle an opening (or self-closing) element. Runs before the element
    /// is pushed onto the stack.
    fn open(&mut self, e: &BytesStart, is_empty: bool, position: usize) -> Result<()> {
        match e.name().as_ref() {
            b"package" => {
                if !is_empty {
                    let included = match self.filter {
                        None => true,
                        Some(filter) => {
                            attribute(e, "name", position)?.as_deref() == Some(filter)
                        }
                    };
                    self.packages.push(included);
                }
            }
            b"class" => {
                let in_package = self.parent_is(&[b"package", b"classes"])
                    && self.packages.last() == Some(&true);
                if !in_package || self.class.is_some() {
                    return Ok(());
                }

                let raw_name = required(e, "class", "name", position)?;
                // Nested and compiler-generated types: Outer/<Inner>d__1
                let name = match raw_name.split_once('/') {
                    Some((head, _)) => head,
                    None => raw_name.as_str(),
                };
                let file_name = attribute(e, "filename", position)?.unwrap_or_default();
                let item = CoverageItem::new(name, file_name);

                if is_empty {
                    self.index.upsert(item);
                } else {
                    self.class = Some(OpenClass {
                        item,
                        depth: self.stack.len() + 1,
                    });
                }
            }
            b"line" => {
                let Some(class_depth) = self.class.as_ref().map(|c| c.depth) else {
                    return Ok(());
                };
                // Only class/lines/line; method lines repeat the same data
                if self.line.is_some()
                    || self.stack.len() != class_depth + 1
                    || !self.parent_is(&[b"lines"])
                {
                    return Ok(());
                }

                let line = read_line(e, self.stack.len() + 1, position)?;
                if is_empty {
                    self.record_line(line);
                } else {
                    self.line = Some(line);
                }
            }
            b"condition" => {
                let depth = self.stack.len();
                let under_line = self.parent_is(&[b"conditions"]);
                if let Some(line) = self.line.as_mut() {
                    if under_line && depth == line.depth + 1 {
                        line.conditions += 1;
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Handle a closing element. Runs before the element is popped.
    fn close(&mut self, name: &[u8]) {
        let depth = self.stack.len();
        match name {
            b"line" => {
                if self.line.as_ref().is_some_and(|l| l.depth == depth) {
                    if let Some(line) = self.line.take() {
                        self.record_line(line);
                    }
                }
            }
            b"class" => {
                if self.class.as_ref().is_some_and(|c| c.depth == depth) {
                    if let Some(class) = self.class.take() {
                        self.index.upsert(class.item);
                    }
                }
            }
            b"package" => {
                self.packages.pop();
            }
            _ => {}
        }
    }

    fn record_line(&mut self, line: OpenLine) {
        let Some(class) = self.class.as_mut() else {
            return;
        };
        let item = &mut class.item;

        item.coverable_lines += 1;
        if line.hits > 0 {
            item.covered_lines += 1;
        } else {
            item.uncovered_line_numbers.push(line.number);
        }

        if let Some((covered, total)) = line.branch {
            item.covered_branches += u64::from(covered);
            item.branches += u64::from(total);

            if line.conditions > 0
                && covered < total
                && !item.uncovered_branch_line_numbers.contains(&line.number)
            {
                item.uncovered_branch_line_numbers.push(line.number);
            }
        }
    }
}

fn read_line(e: &BytesStart, depth: usize, position: usize) -> Result<OpenLine> {
    let number = required(e, "line", "number", position)?;
    let number = parse_number("line", "number", number, position)?;
    let hits = required(e, "line", "hits", position)?;
    let hits = parse_number("line", "hits", hits, position)?;

    // Coverlet writes "True"; other spellings are not branch lines
    let branch = if attribute(e, "branch", position)?.as_deref() == Some("True") {
        let value = required(e, "line", "condition-coverage", position)?;
        match split_condition_coverage(&value) {
            Some(counts) => Some(counts),
            None => return Err(ReportError::ConditionCoverage { value, position }),
        }
    } else {
        None
    };

    Ok(OpenLine {
        number,
        hits,
        branch,
        conditions: 0,
        depth,
    })
}

/// Extract `(covered, total)` from text like `"50% (1/2)"`.
///
/// Counts where more branches are covered than exist are rejected.
pub fn split_condition_coverage(value: &str) -> Option<(u32, u32)> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)%\s*\((\d+)/(\d+)\)").expect("condition-coverage pattern is valid")
    });

    let captures = pattern.captures(value)?;
    let covered: u32 = captures[2].parse().ok()?;
    let total: u32 = captures[3].parse().ok()?;
    (covered <= total).then_some((covered, total))
}

fn attribute(e: &BytesStart, key: &str, position: usize) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ReportError::Xml {
            position,
            source: err.into(),
        })?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|source| ReportError::Xml { position, source })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required(
    e: &BytesStart,
    element: &'static str,
    key: &'static str,
    position: usize,
) -> Result<String> {
    attribute(e, key, position)?.ok_or(ReportError::MissingAttribute {
        element,
        attribute: key,
        position,
    })
}

fn parse_number<T: FromStr>(
    element: &'static str,
    key: &'static str,
    value: String,
    position: usize,
) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ReportError::InvalidAttribute {
            element,
            attribute: key,
            value,
            position,
        })
}
