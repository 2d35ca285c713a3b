//! Token converters.
//!
//! Each converter handles one construct. The builder hands every token to
//! every converter in registration order; a converter checks the token kind
//! and the current [`ParseState`] and, when it applies, updates the state
//! and the document and reports its diagnostics.

use tracing::debug;

use crate::ast::{Comment, Heading, Scenario, Specification, Tags, TearDown};
use crate::config::ParserConfig;
use crate::diagnostic::{ParseError, ParseErrorKind, ParseResult, Warning, WarningKind};
use crate::lexical::all_cells_are_separators;
use crate::state::ParseState;
use crate::step::{create_step, resolve_table_cells};
use crate::table::{ArgLookup, DataTable, Table};
use crate::token::{Span, Token, TokenKind};

type Predicate = fn(&Token, ParseState) -> bool;
type Apply = fn(&Token, &mut ParseState, &mut Specification, &ParserConfig) -> ParseResult;

/// One token handler.
pub struct Converter {
    pub name: &'static str,
    applies: Predicate,
    apply: Apply,
}

impl Converter {
    const fn new(name: &'static str, applies: Predicate, apply: Apply) -> Self {
        Self {
            name,
            applies,
            apply,
        }
    }

    /// Handle `token` if this converter applies to it in `state`.
    pub fn convert(
        &self,
        token: &Token,
        state: &mut ParseState,
        spec: &mut Specification,
        config: &ParserConfig,
    ) -> ParseResult {
        if !(self.applies)(token, *state) {
            return ParseResult::default();
        }
        (self.apply)(token, state, spec, config)
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter").field("name", &self.name).finish()
    }
}

/// The converter chain, in the order tokens visit it.
#[must_use]
pub fn converters() -> Vec<Converter> {
    vec![
        Converter::new(
            "spec heading",
            |token, _| token.kind == TokenKind::Spec,
            convert_spec_heading,
        ),
        Converter::new(
            "scenario heading",
            |token, _| token.kind == TokenKind::Scenario,
            convert_scenario_heading,
        ),
        Converter::new(
            "scenario step",
            |token, state| token.kind == TokenKind::Step && state.is_in(&[ParseState::SCENARIO]),
            convert_scenario_step,
        ),
        Converter::new(
            "context step",
            |token, state| {
                token.kind == TokenKind::Step
                    && state.is_in(&[ParseState::SPEC])
                    && !state.is_in(&[ParseState::SCENARIO, ParseState::TEAR_DOWN])
            },
            convert_context_step,
        ),
        Converter::new(
            "comment",
            |token, _| token.kind == TokenKind::Comment,
            convert_comment,
        ),
        Converter::new(
            "table header",
            |token, state| {
                token.kind == TokenKind::TableHeader && state.is_in_any(&[ParseState::SPEC])
            },
            convert_table_header,
        ),
        Converter::new(
            "table row",
            |token, _| token.kind == TokenKind::TableRow,
            convert_table_row,
        ),
        Converter::new("tags", |token, _| token.kind == TokenKind::Tag, convert_tags),
        Converter::new(
            "data table keyword",
            |token, _| token.kind == TokenKind::DataTable,
            convert_data_table_keyword,
        ),
        Converter::new(
            "tear down",
            |token, _| token.kind == TokenKind::TearDown,
            convert_tear_down,
        ),
        Converter::new(
            "tear down step",
            |token, state| token.kind == TokenKind::Step && state.is_in(&[ParseState::TEAR_DOWN]),
            convert_tear_down_step,
        ),
    ]
}

fn error(kind: ParseErrorKind, spec: &Specification, token: &Token) -> ParseResult {
    ParseResult::error(ParseError::at(kind, &spec.file_name, token))
}

fn warning(kind: WarningKind, spec: &Specification, token: &Token) -> ParseResult {
    ParseResult::warning(Warning::new(kind, &spec.file_name, token.span))
}

fn raw_comment(token: &Token) -> Comment {
    Comment {
        value: token.line_text(),
        line: token.span.start,
    }
}

/// Keep a table line as free text, on the scenario when inside one.
fn keep_as_comment(spec: &mut Specification, state: ParseState, comment: Comment) {
    if state.is_in(&[ParseState::SCENARIO]) {
        if let Some(scenario) = spec.latest_scenario_mut() {
            scenario.add_comment(comment);
            return;
        }
    }
    spec.add_comment(comment);
}

fn convert_spec_heading(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    if spec.heading.is_some() {
        return error(ParseErrorKind::MultipleSpecHeadings, spec, token);
    }
    spec.set_heading(Heading::new(&token.value, token.span));
    state.add(&[ParseState::SPEC]);
    ParseResult::default()
}

fn convert_scenario_heading(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    if spec.heading.is_none() {
        return error(ParseErrorKind::ScenarioBeforeSpecHeading, spec, token);
    }
    let wanted = token.value.to_lowercase();
    if let Some(existing) = spec
        .scenarios
        .iter()
        .find(|s| s.heading.value.to_lowercase() == wanted)
    {
        let heading = existing.heading.value.clone();
        return error(ParseErrorKind::DuplicateScenario { heading }, spec, token);
    }

    let line = token.span.start;
    if let Some(previous) = spec.latest_scenario_mut() {
        previous.span.end = line.saturating_sub(1);
    }
    let mut scenario = Scenario::new(Heading::new(&token.value, token.span));
    scenario.span = Span::line(line);
    spec.add_scenario(scenario);

    state.retain(&[ParseState::SPEC]);
    state.add(&[ParseState::SCENARIO]);
    ParseResult::default()
}

fn convert_scenario_step(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    let (step, result) = create_step(spec, spec.scenarios.last(), token);
    if !result.ok() {
        return result;
    }
    if let (Some(step), Some(scenario)) = (step, spec.latest_scenario_mut()) {
        scenario.add_step(step);
    }
    state.retain(&[ParseState::SPEC, ParseState::SCENARIO]);
    state.add(&[ParseState::STEP]);
    result
}

fn convert_context_step(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    let (step, result) = create_step(spec, None, token);
    if !result.ok() {
        return result;
    }
    if let Some(step) = step {
        spec.add_context(step);
    }
    state.retain(&[ParseState::SPEC]);
    state.add(&[ParseState::CONTEXT]);
    result
}

fn convert_comment(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    let comment = Comment {
        value: token.value.clone(),
        line: token.span.start,
    };
    if state.is_in(&[ParseState::SCENARIO]) {
        if let Some(scenario) = spec.latest_scenario_mut() {
            scenario.add_comment(comment);
        }
    } else {
        spec.add_comment(comment);
    }
    state.retain(&[ParseState::SPEC, ParseState::SCENARIO, ParseState::TEAR_DOWN]);
    state.add(&[ParseState::COMMENT]);
    ParseResult::default()
}

fn convert_table_header(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    config: &ParserConfig,
) -> ParseResult {
    let table = Table::new(token.args.clone(), token.span.start);

    if state.is_in(&[ParseState::STEP]) {
        if let Some(step) = spec
            .latest_scenario_mut()
            .and_then(Scenario::latest_step_mut)
        {
            step.add_inline_table(table);
        }
    } else if state.is_in(&[ParseState::CONTEXT]) {
        if let Some(step) = spec.latest_context_mut() {
            step.add_inline_table(table);
        }
    } else if state.is_in(&[ParseState::TEAR_DOWN]) {
        match spec.latest_tear_down_step_mut() {
            Some(step) => step.add_inline_table(table),
            None => spec.add_comment(raw_comment(token)),
        }
    } else if state.is_in(&[ParseState::SCENARIO]) {
        let ignored = if config.allow_scenario_datatable {
            spec.latest_scenario_mut().and_then(|scenario| {
                if scenario.data_table.is_declared() {
                    Some(WarningKind::MultipleDataTables)
                } else {
                    scenario.set_data_table(DataTable::inline(table));
                    None
                }
            })
        } else {
            Some(WarningKind::ScenarioDataTableDisabled)
        };
        if let Some(kind) = ignored {
            debug!(line = token.span.start, %kind, "ignoring scenario table");
            keep_as_comment(spec, *state, raw_comment(token));
            return warning(kind, spec, token);
        }
    } else if spec.data_table.is_declared() {
        spec.add_comment(raw_comment(token));
        return warning(WarningKind::MultipleDataTables, spec, token);
    } else {
        spec.set_data_table(DataTable::inline(table));
    }

    state.retain(&[
        ParseState::SPEC,
        ParseState::SCENARIO,
        ParseState::STEP,
        ParseState::CONTEXT,
        ParseState::TEAR_DOWN,
    ]);
    state.add(&[ParseState::TABLE]);
    ParseResult::default()
}

fn convert_table_row(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    config: &ParserConfig,
) -> ParseResult {
    let mut result = ParseResult::default();
    let line = token.span.start;
    let file = spec.file_name.clone();

    if !state.is_in(&[ParseState::TABLE]) {
        keep_as_comment(spec, *state, raw_comment(token));
    } else if all_cells_are_separators(&token.args)
        && !state.is_in(&[ParseState::TABLE_SEPARATOR])
    {
        state.add(&[ParseState::TABLE_SEPARATOR]);
    } else if state.is_in(&[ParseState::STEP]) {
        let Some(scenario) = spec.scenarios.last() else {
            return result;
        };
        let mut tables = vec![&spec.data_table.table];
        if scenario.data_table.is_declared() {
            tables.push(&scenario.data_table.table);
        }
        let (cells, warnings) = resolve_table_cells(token, &ArgLookup::from_tables(&tables), &file);
        result.warnings = warnings;
        if let Some(table) = spec
            .latest_scenario_mut()
            .and_then(Scenario::latest_step_mut)
            .and_then(|step| step.inline_table_mut())
        {
            table.add_row(cells, line);
        }
    } else if state.is_in(&[ParseState::CONTEXT]) {
        let lookup = ArgLookup::from_tables(&[&spec.data_table.table]);
        let (cells, warnings) = resolve_table_cells(token, &lookup, &file);
        result.warnings = warnings;
        if let Some(table) = spec
            .latest_context_mut()
            .and_then(|step| step.inline_table_mut())
        {
            table.add_row(cells, line);
        }
    } else if state.is_in(&[ParseState::TEAR_DOWN]) {
        if spec.tear_down_steps.is_empty() {
            spec.add_comment(raw_comment(token));
        } else {
            let lookup = ArgLookup::from_tables(&[&spec.data_table.table]);
            let (cells, warnings) = resolve_table_cells(token, &lookup, &file);
            result.warnings = warnings;
            if let Some(table) = spec
                .latest_tear_down_step_mut()
                .and_then(|step| step.inline_table_mut())
            {
                table.add_row(cells, line);
            }
        }
    } else {
        let in_scenario_table =
            state.is_in(&[ParseState::SCENARIO]) && config.allow_scenario_datatable;
        let table = if in_scenario_table {
            spec.latest_scenario_mut().map(|s| &mut s.data_table.table)
        } else {
            Some(&mut spec.data_table.table)
        };
        if let Some(table) = table {
            let lookup = ArgLookup::from_tables(&[&*table]);
            let (cells, warnings) = resolve_table_cells(token, &lookup, &file);
            result.warnings = warnings;
            table.add_row(cells, line);
        }
    }

    state.retain(&[
        ParseState::SPEC,
        ParseState::SCENARIO,
        ParseState::STEP,
        ParseState::CONTEXT,
        ParseState::TEAR_DOWN,
        ParseState::TABLE,
        ParseState::TABLE_SEPARATOR,
    ]);
    result
}

fn convert_tags(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    let values = token.args.clone();
    let line = token.span.start;
    let continuing = state.is_in(&[ParseState::TAGS]);
    let in_scenario = state.is_in(&[ParseState::SCENARIO]);

    let existing = if in_scenario {
        spec.scenarios.last().and_then(|s| s.tags.as_ref())
    } else {
        spec.tags.as_ref()
    };
    if !continuing && existing.is_some_and(|tags| !tags.is_empty()) {
        let scope = if in_scenario { "scenario" } else { "specification" };
        return error(ParseErrorKind::TagsDefinedTwice { scope }, spec, token);
    }

    if in_scenario {
        let Some(scenario) = spec.latest_scenario_mut() else {
            return ParseResult::default();
        };
        match scenario.tags.as_mut() {
            Some(tags) if continuing => tags.add(values, line),
            _ => scenario.set_tags(Tags::new(values, token.span)),
        }
    } else {
        match spec.tags.as_mut() {
            Some(tags) if continuing => tags.add(values, line),
            _ => spec.set_tags(Tags::new(values, token.span)),
        }
    }

    state.add(&[ParseState::TAGS]);
    ParseResult::default()
}

fn convert_data_table_keyword(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    if token.value.is_empty() {
        let reason = "table reference is empty".to_string();
        return error(ParseErrorKind::UnresolvableTable { reason }, spec, token);
    }

    let comment = Comment {
        value: token.value.clone(),
        line: token.span.start,
    };
    if !state.is_in(&[ParseState::SPEC]) {
        spec.add_comment(comment);
        return warning(WarningKind::DataTableNotAssociated, spec, token);
    }
    if spec.data_table.is_declared() {
        spec.add_comment(comment);
        return warning(WarningKind::MultipleDataTables, spec, token);
    }

    spec.set_data_table(DataTable::external(&token.value, token.span.start));
    state.retain(&[ParseState::SPEC]);
    state.add(&[ParseState::KEYWORD]);
    ParseResult::default()
}

fn convert_tear_down(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    state.retain(&[ParseState::SPEC]);
    state.add(&[ParseState::TEAR_DOWN]);
    spec.add_tear_down(TearDown {
        value: token.value.clone(),
        line: token.span.start,
    });
    ParseResult::default()
}

fn convert_tear_down_step(
    token: &Token,
    state: &mut ParseState,
    spec: &mut Specification,
    _: &ParserConfig,
) -> ParseResult {
    let (step, result) = create_step(spec, None, token);
    if !result.ok() {
        return result;
    }
    if let Some(step) = step {
        spec.add_tear_down_step(step);
    }
    state.retain(&[ParseState::SPEC, ParseState::TEAR_DOWN]);
    result
}
