use crate::ast::{
    ArgKind, Comment, Heading, Item, PARAMETER_PLACEHOLDER, Scenario, ScenarioItem, SpecialKind,
    Specification, Step, StepArg, Tags, TearDown,
};
use crate::diagnostic::ParseErrorKind;
use crate::lexer::parse_step_text;
use crate::step::extract_step_value_and_parameter_types;
use crate::table::{DataTable, Table, TableCell};
use crate::token::Span;

/// Marker line opening the tear-down section.
const TEAR_DOWN_MARKER: &str = "___";

fn push_tag(tags: &mut Option<Tags>, value: &str) -> bool {
    match tags {
        Some(tags) => {
            match tags.raw_values.last_mut() {
                Some(line) => line.push(value.to_string()),
                None => tags.raw_values.push(vec![value.to_string()]),
            }
            false
        }
        None => {
            *tags = Some(Tags::new(vec![value.to_string()], Span::default()));
            true
        }
    }
}

fn special_arg(raw: &str) -> Option<StepArg> {
    let (scheme, path) = raw.split_once(':')?;
    SpecialKind::from_scheme(scheme.trim()).map(|kind| StepArg::Special {
        kind,
        path: path.trim().to_string(),
    })
}

impl Specification {
    /// Create a specification with a heading.
    #[must_use]
    pub fn titled(file_name: &str, heading: &str) -> Self {
        let mut spec = Self::empty(file_name);
        spec.set_heading(Heading::new(heading, Span::default()));
        spec
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, value: &str) -> Self {
        if push_tag(&mut self.tags, value) {
            self.items.push(Item::Tags);
        }
        self
    }

    /// Add a line of free text.
    #[must_use]
    pub fn comment(mut self, text: &str) -> Self {
        self.add_comment(Comment {
            value: text.to_string(),
            line: 0,
        });
        self
    }

    /// Set the data table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.set_data_table(DataTable::inline(table));
        self
    }

    /// Refer to an external data table.
    #[must_use]
    pub fn external_table(mut self, reference: &str) -> Self {
        self.set_data_table(DataTable::external(reference, 0));
        self
    }

    /// Add a context step.
    #[must_use]
    pub fn context(mut self, step: Step) -> Self {
        self.add_context(step);
        self
    }

    /// Add a scenario.
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.add_scenario(scenario);
        self
    }

    /// Add a tear-down step, opening the tear-down section if needed.
    #[must_use]
    pub fn tear_down_step(mut self, step: Step) -> Self {
        if self.tear_down.is_empty() {
            self.add_tear_down(TearDown {
                value: TEAR_DOWN_MARKER.to_string(),
                line: 0,
            });
        }
        self.add_tear_down_step(step);
        self
    }
}

impl Scenario {
    /// Create a scenario with a heading.
    #[must_use]
    pub fn named(heading: &str) -> Self {
        Self::new(Heading::new(heading, Span::default()))
    }

    /// Add a step.
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.add_step(step);
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, value: &str) -> Self {
        if push_tag(&mut self.tags, value) {
            self.items.push(ScenarioItem::Tags);
        }
        self
    }

    /// Add a line of free text.
    #[must_use]
    pub fn comment(mut self, text: &str) -> Self {
        self.add_comment(Comment {
            value: text.to_string(),
            line: 0,
        });
        self
    }

    /// Set the scenario's own data table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.set_data_table(DataTable::inline(table));
        self
    }
}

impl Step {
    /// Create a step from text with `{}` placeholders. Add one argument per
    /// placeholder with the `with_*` methods.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            line_text: value.to_string(),
            ..Self::default()
        }
    }

    /// Create a step from text written as in a spec file, e.g.
    /// `greet "Ada" as <role>`.
    ///
    /// # Errors
    ///
    /// Returns the error kind for an unterminated string or dynamic
    /// parameter.
    pub fn parse(text: &str) -> Result<Self, ParseErrorKind> {
        let (marked, raw_args) = parse_step_text(text)?;
        let (value, kinds) = extract_step_value_and_parameter_types(&marked);
        let args = kinds
            .into_iter()
            .zip(raw_args)
            .map(|(kind, raw)| match (kind, special_arg(&raw)) {
                (ArgKind::Static, _) => StepArg::Static(raw),
                (_, Some(special)) => special,
                _ => StepArg::Dynamic(raw),
            })
            .collect();
        Ok(Self {
            value,
            line_text: text.to_string(),
            args,
            ..Self::default()
        })
    }

    /// Append a literal argument.
    #[must_use]
    pub fn with_static(mut self, value: &str) -> Self {
        self.args.push(StepArg::Static(value.to_string()));
        self
    }

    /// Append a data table column reference.
    #[must_use]
    pub fn with_dynamic(mut self, name: &str) -> Self {
        self.args.push(StepArg::Dynamic(name.to_string()));
        self
    }

    /// Append a `file:` or `table:` reference.
    #[must_use]
    pub fn with_special(mut self, kind: SpecialKind, path: &str) -> Self {
        self.args.push(StepArg::Special {
            kind,
            path: path.to_string(),
        });
        self
    }

    /// Attach an inline table.
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.add_inline_table(table);
        self
    }

    /// Set the trailing annotation.
    #[must_use]
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    /// Number of `{}` placeholders in the value.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.value.matches(PARAMETER_PLACEHOLDER).count()
    }
}

impl Table {
    /// Create a table from its header names.
    #[must_use]
    pub fn with_headers(headers: &[&str]) -> Self {
        Self::new(headers.iter().map(ToString::to_string).collect(), 0)
    }

    /// Add a row of literal cells.
    #[must_use]
    pub fn row(mut self, cells: &[&str]) -> Self {
        let cells = cells.iter().map(|c| TableCell::literal(*c)).collect();
        self.rows.push(cells);
        self
    }
}
