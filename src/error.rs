//! Error types for coverage parsing and report formatting

use thiserror::Error;

/// Errors produced while reading a Cobertura document or rendering a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Malformed coverage XML at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Coverage XML has no root element")]
    EmptyDocument,

    #[error("Coverage XML ended unexpectedly ({open} unclosed element(s))")]
    UnexpectedEof { open: usize },

    #[error("<{element}> at byte {position} is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
        position: usize,
    },

    #[error("<{element}> at byte {position} has invalid {attribute}=\"{value}\"")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
        position: usize,
    },

    #[error("Unparseable condition-coverage \"{value}\" at byte {position}")]
    ConditionCoverage { value: String, position: usize },

    #[error("No coverage data to format")]
    NoCoverageData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// True for malformed XML and missing or invalid attributes
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ReportError::Xml { .. }
                | ReportError::EmptyDocument
                | ReportError::UnexpectedEof { .. }
                | ReportError::MissingAttribute { .. }
                | ReportError::InvalidAttribute { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
