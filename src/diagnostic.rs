//! Parse errors, warnings, and the aggregated parse result.

use std::fmt;

use serde::Serialize;

use crate::token::{Span, Token};

/// Classifies a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseErrorKind {
    /// Static argument missing its closing `"`.
    UnterminatedString,
    /// Dynamic argument missing its closing `>`.
    UnterminatedDynamicParam,
    /// A second `#` heading in the same file.
    MultipleSpecHeadings,
    /// `##` heading seen before any `#` heading.
    ScenarioBeforeSpecHeading,
    /// Two scenarios share a heading.
    DuplicateScenario { heading: String },
    /// A second `tags:` line for the same spec or scenario.
    TagsDefinedTwice { scope: &'static str },
    /// `table:` reference that is empty or could not be loaded.
    UnresolvableTable { reason: String },
    /// Step text contains a `{static}`, `{dynamic}` or `{special}` marker.
    ReservedParameterMarker,
    /// `<name>` matches no column of the data table.
    UnresolvedDynamicParam { name: String },
    /// `<file:>` or `<table:>` without a path.
    MalformedSpecialParam { value: String },
    /// Document with no items at all.
    NoElements,
    /// Document without a `#` heading.
    HeadingNotFound,
    /// `#` heading with empty text.
    HeadingTooShort,
    /// Data table with headers but no rows.
    DataTableNeedsRow,
    /// Document without any scenario.
    NeedsScenario,
    /// Scenario without any step.
    ScenarioNeedsStep { scenario: String },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "String not terminated"),
            Self::UnterminatedDynamicParam => {
                write!(f, "Dynamic parameter not terminated, expected '>'")
            }
            Self::MultipleSpecHeadings => {
                write!(f, "Multiple spec headings found in same file")
            }
            Self::ScenarioBeforeSpecHeading => {
                write!(f, "Scenario should be defined after the spec heading")
            }
            Self::DuplicateScenario { heading } => write!(
                f,
                "Duplicate scenario definition '{heading}' found in the same specification"
            ),
            Self::TagsDefinedTwice { scope } => {
                write!(f, "Tags can be defined only once per {scope}")
            }
            Self::UnresolvableTable { reason } => {
                write!(f, "Could not resolve table. {reason}")
            }
            Self::ReservedParameterMarker => write!(
                f,
                "Step text should not have '{{static}}' or '{{dynamic}}' or '{{special}}'"
            ),
            Self::UnresolvedDynamicParam { name } => {
                write!(f, "Dynamic parameter <{name}> could not be resolved")
            }
            Self::MalformedSpecialParam { value } => {
                write!(f, "Special parameter <{value}> is missing its path")
            }
            Self::NoElements => write!(f, "Spec does not have any elements"),
            Self::HeadingNotFound => write!(f, "Spec heading not found"),
            Self::HeadingTooShort => {
                write!(f, "Spec heading should have at least one character")
            }
            Self::DataTableNeedsRow => {
                write!(f, "Data table should have at least 1 data row")
            }
            Self::NeedsScenario => write!(f, "Spec should have atleast one scenario"),
            Self::ScenarioNeedsStep { scenario } => {
                write!(f, "'{scenario}' Scenario should have atleast one step")
            }
        }
    }
}

/// An error that makes the document invalid. Parsing carries on past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{file}:{} {kind}{}", span.start, render_line_text(line_text.as_deref()))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub file: String,
    pub span: Span,
    pub line_text: Option<String>,
}

fn render_line_text(line_text: Option<&str>) -> String {
    line_text.map_or_else(String::new, |text| format!(" => '{text}'"))
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, file: &str, span: Span) -> Self {
        Self {
            kind,
            file: file.to_string(),
            span,
            line_text: None,
        }
    }

    /// Error positioned on `token`, quoting its source text.
    #[must_use]
    pub fn at(kind: ParseErrorKind, file: &str, token: &Token) -> Self {
        Self {
            kind,
            file: file.to_string(),
            span: token.span,
            line_text: Some(token.line_text()),
        }
    }
}

/// Classifies a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WarningKind {
    /// A second data table for the same spec or scenario, kept as a comment.
    MultipleDataTables,
    /// `table:` reference outside the spec section, kept as a comment.
    DataTableNotAssociated,
    /// Scenario-level data table while the feature is disabled.
    ScenarioDataTableDisabled,
    /// `<name>` in a table cell left as literal text.
    UnresolvedTableCell { name: String },
    /// `Priority` tag whose suffix is not a number.
    InvalidPriorityTag { tag: String },
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleDataTables => {
                write!(f, "Multiple data table present, ignoring table")
            }
            Self::DataTableNotAssociated => {
                write!(f, "Data table not associated with spec or scenario")
            }
            Self::ScenarioDataTableDisabled => write!(
                f,
                "Scenario data tables are not enabled, ignoring table"
            ),
            Self::UnresolvedTableCell { name } => write!(
                f,
                "Dynamic param <{name}> could not be resolved, Treating it as static param"
            ),
            Self::InvalidPriorityTag { tag } => {
                write!(f, "Unable to get priority level from tag: {tag}")
            }
        }
    }
}

/// A recoverable anomaly. Never affects validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub file: String,
    pub span: Span,
}

impl Warning {
    #[must_use]
    pub fn new(kind: WarningKind, file: &str, span: Span) -> Self {
        Self {
            kind,
            file: file.to_string(),
            span,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.file, self.span.start, self.kind)
    }
}

/// Diagnostics gathered while building one document, or while handling one
/// token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ParseResult {
    pub file_name: String,
    pub parse_errors: Vec<ParseError>,
    pub warnings: Vec<Warning>,
}

impl ParseResult {
    #[must_use]
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn error(error: ParseError) -> Self {
        Self {
            parse_errors: vec![error],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn warning(warning: Warning) -> Self {
        Self {
            warnings: vec![warning],
            ..Self::default()
        }
    }

    /// False as soon as any error has been recorded.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.parse_errors.is_empty()
    }

    /// Append the diagnostics of `other`, keeping their order.
    pub fn merge(&mut self, other: Self) {
        self.parse_errors.extend(other.parse_errors);
        self.warnings.extend(other.warnings);
    }

    /// Insert errors ahead of the ones already collected.
    pub fn prepend_errors(&mut self, errors: Vec<ParseError>) {
        let rest = std::mem::replace(&mut self.parse_errors, errors);
        self.parse_errors.extend(rest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_line_text() {
        let err = ParseError {
            kind: ParseErrorKind::MultipleSpecHeadings,
            file: "a.spec".to_string(),
            span: Span::line(4),
            line_text: Some("# Again".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "a.spec:4 Multiple spec headings found in same file => '# Again'"
        );
    }

    #[test]
    fn display_without_line_text() {
        let err = ParseError::new(ParseErrorKind::NoElements, "a.spec", Span::line(1));
        assert_eq!(err.to_string(), "a.spec:1 Spec does not have any elements");
    }

    #[test]
    fn ok_tracks_errors() {
        let mut result = ParseResult::new("a.spec");
        assert!(result.ok());
        result.merge(ParseResult::warning(Warning::new(
            WarningKind::MultipleDataTables,
            "a.spec",
            Span::line(2),
        )));
        assert!(result.ok());
        result.merge(ParseResult::error(ParseError::new(
            ParseErrorKind::HeadingNotFound,
            "a.spec",
            Span::line(1),
        )));
        assert!(!result.ok());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn prepend_keeps_order() {
        let mut result = ParseResult::error(ParseError::new(
            ParseErrorKind::NeedsScenario,
            "a.spec",
            Span::line(3),
        ));
        result.prepend_errors(vec![ParseError::new(
            ParseErrorKind::UnterminatedString,
            "a.spec",
            Span::line(1),
        )]);
        assert_eq!(result.parse_errors[0].kind, ParseErrorKind::UnterminatedString);
        assert_eq!(result.parse_errors[1].kind, ParseErrorKind::NeedsScenario);
    }
}
