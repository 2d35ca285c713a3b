//! Structural checks on a built document.

use crate::ast::{Heading, Specification};
use crate::diagnostic::{ParseError, ParseErrorKind};
use crate::token::Span;

/// Check the document's structure, stopping at the first failure.
///
/// A document without items or without a heading is given an empty heading
/// so callers can always read one.
///
/// # Errors
///
/// Returns the first violated rule: no items, no heading, a blank heading,
/// a declared data table without rows, no scenarios, or a scenario without
/// steps.
pub fn validate(spec: &mut Specification) -> Result<(), ParseError> {
    let file = spec.file_name.clone();
    let first_line = Span::line(1);

    if spec.items.is_empty() {
        spec.heading = Some(Heading::default());
        return Err(ParseError::new(ParseErrorKind::NoElements, &file, first_line));
    }

    let Some(heading) = spec.heading.as_ref() else {
        spec.heading = Some(Heading::default());
        return Err(ParseError::new(
            ParseErrorKind::HeadingNotFound,
            &file,
            first_line,
        ));
    };

    if heading.value.trim().is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::HeadingTooShort,
            &file,
            heading.span,
        ));
    }

    let table = &spec.data_table.table;
    if table.is_initialized() && table.row_count() == 0 {
        return Err(ParseError::new(
            ParseErrorKind::DataTableNeedsRow,
            &file,
            table.span,
        ));
    }

    if spec.scenarios.is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::NeedsScenario,
            &file,
            heading.span,
        ));
    }

    if let Some(scenario) = spec.scenarios.iter().find(|s| s.steps.is_empty()) {
        return Err(ParseError::new(
            ParseErrorKind::ScenarioNeedsStep {
                scenario: scenario.heading.value.clone(),
            },
            &file,
            scenario.span,
        ));
    }

    Ok(())
}
