//! Pretty-printer that serializes a specification back into canonical text.
//!
//! Blocks are separated by a blank line; runs of steps and runs of comments
//! stay together. Tables are padded to their widest cell.

use std::fmt::Write as _;

use crate::ast::{
    Item, PARAMETER_PLACEHOLDER, Scenario, ScenarioItem, Specification, Step, StepArg, Tags,
};
use crate::lexical::unescape;
use crate::table::{CellKind, DataTable, Table, TableCell};

/// Narrowest separator cell. Three dashes would be read as text.
const MIN_COLUMN_WIDTH: usize = 4;

/// Kind of the previous block, used to decide on blank lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Step,
    Comment,
    Other,
}

struct Writer {
    out: String,
    last: Option<Block>,
}

impl Writer {
    const fn new() -> Self {
        Self {
            out: String::new(),
            last: None,
        }
    }

    fn start(&mut self, block: Block) {
        match self.last {
            Some(last) if last == block && block != Block::Other => {}
            Some(_) => self.out.push('\n'),
            None => {}
        }
        self.last = Some(block);
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }
}

/// Format a specification as markdown.
#[must_use]
pub fn format(spec: &Specification) -> String {
    let mut w = Writer::new();

    for item in &spec.items {
        match item {
            Item::Heading => {
                if let Some(heading) = &spec.heading {
                    w.start(Block::Other);
                    w.line(&format!("# {}", heading.value));
                }
            }
            Item::Comment(comment) => {
                w.start(Block::Comment);
                w.line(comment.value.trim_end());
            }
            Item::Tags => {
                if let Some(tags) = &spec.tags {
                    format_tags(&mut w, tags);
                }
            }
            Item::DataTable => format_data_table(&mut w, &spec.data_table),
            Item::Context(index) => {
                if let Some(step) = spec.contexts.get(*index) {
                    format_step(&mut w, step);
                }
            }
            Item::Scenario(ordinal) => {
                if let Some(scenario) = spec.scenario_by_ordinal(*ordinal) {
                    format_scenario(&mut w, scenario);
                }
            }
            Item::TearDown(index) => {
                if let Some(tear_down) = spec.tear_down.get(*index) {
                    w.start(Block::Other);
                    w.line(&tear_down.value);
                }
            }
            Item::TearDownStep(index) => {
                if let Some(step) = spec.tear_down_steps.get(*index) {
                    format_step(&mut w, step);
                }
            }
        }
    }

    w.out
}

fn format_scenario(w: &mut Writer, scenario: &Scenario) {
    w.start(Block::Other);
    w.line(&format!("## {}", scenario.heading.value));

    for item in &scenario.items {
        match item {
            ScenarioItem::Comment(comment) => {
                w.start(Block::Comment);
                w.line(comment.value.trim_end());
            }
            ScenarioItem::Tags => {
                if let Some(tags) = &scenario.tags {
                    format_tags(w, tags);
                }
            }
            ScenarioItem::DataTable => format_data_table(w, &scenario.data_table),
            ScenarioItem::Step(index) => {
                if let Some(step) = scenario.steps.get(*index) {
                    format_step(w, step);
                }
            }
        }
    }
}

fn format_tags(w: &mut Writer, tags: &Tags) {
    if tags.is_empty() {
        return;
    }
    w.start(Block::Other);
    let values: Vec<&str> = tags.values().collect();
    w.line(&format!("tags: {}", values.join(", ")));
}

fn format_data_table(w: &mut Writer, data_table: &DataTable) {
    if let Some(reference) = &data_table.reference {
        w.start(Block::Other);
        w.line(&format!("table: {reference}"));
    } else if data_table.table.is_initialized() {
        w.start(Block::Other);
        format_table(w, &data_table.table, "");
    }
}

fn format_step(w: &mut Writer, step: &Step) {
    w.start(Block::Step);
    w.line(&format!("* {}", step_text(step)));
    if let Some(table) = step.inline_table() {
        format_table(w, table, "   ");
    }
}

/// The step as written, with arguments put back in place of `{}`.
#[must_use]
pub fn step_text(step: &Step) -> String {
    let mut out = String::new();
    let mut args = step.args.iter();
    let mut pieces = step.value.split(PARAMETER_PLACEHOLDER);
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for piece in pieces {
        match args.next() {
            Some(arg) => write_arg(&mut out, arg),
            None => out.push_str(PARAMETER_PLACEHOLDER),
        }
        out.push_str(piece);
    }

    let mut out = out.trim_end().to_string();
    if let Some(suffix) = &step.suffix {
        let _ = write!(out, " [{suffix}]");
    }
    out
}

fn write_arg(out: &mut String, arg: &StepArg) {
    match arg {
        StepArg::Static(value) => {
            let _ = write!(out, "\"{}\"", unescape(value));
        }
        StepArg::Dynamic(name) => {
            let _ = write!(out, "<{name}>");
        }
        StepArg::Special { kind, path } => {
            let _ = write!(out, "<{}:{path}>", kind.scheme());
        }
        StepArg::Table(_) => {}
    }
}

fn cell_text(cell: &TableCell) -> String {
    match cell.kind {
        CellKind::Static => cell.value.replace('|', "\\|"),
        CellKind::Dynamic | CellKind::Special => format!("<{}>", cell.value),
    }
}

fn format_table(w: &mut Writer, table: &Table, indent: &str) {
    let headers: Vec<String> = table.headers.iter().map(|h| h.replace('|', "\\|")).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .chain(headers.get(col))
                .map(|text| text.chars().count())
                .max()
                .unwrap_or(0)
                .max(MIN_COLUMN_WIDTH)
        })
        .collect();

    let render = |cells: &[String]| {
        let mut line = String::from(indent);
        line.push('|');
        for (col, width) in widths.iter().enumerate() {
            let text = cells.get(col).map_or("", String::as_str);
            let _ = write!(line, "{text:<width$}|");
        }
        line
    };

    w.line(&render(&headers));
    let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    w.line(&render(&separator));
    for row in &rows {
        w.line(&render(row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SpecialKind;

    #[test]
    fn step_text_restores_arguments() {
        let step = Step {
            value: "copy {} from {} to {}".to_string(),
            args: vec![
                StepArg::Static("say \"hi\"".to_string()),
                StepArg::Dynamic("src".to_string()),
                StepArg::Special {
                    kind: SpecialKind::File,
                    path: "out.txt".to_string(),
                },
            ],
            suffix: Some("continue".to_string()),
            ..Step::default()
        };
        assert_eq!(
            step_text(&step),
            "copy \"say \\\"hi\\\"\" from <src> to <file:out.txt> [continue]"
        );
    }

    #[test]
    fn inline_table_placeholder_is_dropped() {
        let mut step = Step {
            value: "check".to_string(),
            ..Step::default()
        };
        step.add_inline_table(Table::new(vec!["id".to_string()], 1));
        assert_eq!(step_text(&step), "check");
    }

    #[test]
    fn table_columns_are_padded() {
        let mut table = Table::new(vec!["id".to_string(), "name".to_string()], 1);
        table.add_row(
            vec![TableCell::literal("1"), TableCell::literal("Ada Lovelace")],
            3,
        );
        let mut w = Writer::new();
        format_table(&mut w, &table, "");
        assert_eq!(
            w.out,
            "|id  |name        |\n|----|------------|\n|1   |Ada Lovelace|\n"
        );
    }
}
