//! Document tree produced by the parser.

use serde::Serialize;

use crate::table::{DataTable, Table};
use crate::token::Span;

/// A parsed specification file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Specification {
    pub file_name: String,
    /// Top-level content in source order.
    pub items: Vec<Item>,
    pub heading: Option<Heading>,
    pub tags: Option<Tags>,
    pub scenarios: Vec<Scenario>,
    /// Steps declared before the first scenario, run before each scenario.
    pub contexts: Vec<Step>,
    pub data_table: DataTable,
    pub tear_down: Vec<TearDown>,
    pub tear_down_steps: Vec<Step>,
}

/// Top-level entry of a specification, in source order.
///
/// Variants without data refer to the single owned field of the same name on
/// [`Specification`]; indexed variants point into `contexts`,
/// `tear_down_steps`, or at a scenario by its [`Scenario::ordinal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Item {
    Heading,
    Comment(Comment),
    Tags,
    DataTable,
    Context(usize),
    Scenario(usize),
    TearDown(usize),
    TearDownStep(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Heading {
    pub value: String,
    pub span: Span,
}

impl Heading {
    #[must_use]
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub value: String,
    pub line: usize,
}

/// Tags, one entry per tag line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Tags {
    pub raw_values: Vec<Vec<String>>,
    pub span: Span,
}

impl Tags {
    #[must_use]
    pub fn new(values: Vec<String>, span: Span) -> Self {
        Self {
            raw_values: vec![values],
            span,
        }
    }

    /// Add a continuation line.
    pub fn add(&mut self, values: Vec<String>, line: usize) {
        self.raw_values.push(values);
        self.span.end = line;
    }

    /// Every tag, flattened across lines.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.raw_values.iter().flatten().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.raw_values.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TearDown {
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Scenario {
    pub heading: Heading,
    /// Position in source order, stable across prioritization.
    pub ordinal: usize,
    pub items: Vec<ScenarioItem>,
    pub steps: Vec<Step>,
    pub tags: Option<Tags>,
    pub data_table: DataTable,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScenarioItem {
    Comment(Comment),
    Tags,
    DataTable,
    Step(usize),
}

/// Argument kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgKind {
    Static,
    Dynamic,
    Special,
    Table,
}

/// Kind of an unresolved external reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialKind {
    File,
    Table,
}

impl SpecialKind {
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "file" => Some(Self::File),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Table => "table",
        }
    }
}

/// A resolved step argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepArg {
    /// Literal `"value"`.
    Static(String),
    /// `<name>`, a data table column.
    Dynamic(String),
    /// `<file:path>` or `<table:path>`.
    Special { kind: SpecialKind, path: String },
    /// Inline table following the step.
    Table(Table),
}

impl StepArg {
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        match self {
            Self::Static(_) => ArgKind::Static,
            Self::Dynamic(_) => ArgKind::Dynamic,
            Self::Special { .. } => ArgKind::Special,
            Self::Table(_) => ArgKind::Table,
        }
    }
}

/// Placeholder standing for one argument in [`Step::value`].
pub const PARAMETER_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Step {
    /// Step text with every argument replaced by `{}`.
    pub value: String,
    /// Source text as written.
    pub line_text: String,
    pub span: Span,
    pub args: Vec<StepArg>,
    pub suffix: Option<String>,
    pub has_inline_table: bool,
    pub is_concept: bool,
    pub concept_steps: Vec<Self>,
}

impl Step {
    /// Attach an inline table as the last argument.
    pub fn add_inline_table(&mut self, table: Table) {
        self.value.push(' ');
        self.value.push_str(PARAMETER_PLACEHOLDER);
        self.args.push(StepArg::Table(table));
        self.has_inline_table = true;
    }

    #[must_use]
    pub fn inline_table(&self) -> Option<&Table> {
        if !self.has_inline_table {
            return None;
        }
        match self.args.last() {
            Some(StepArg::Table(table)) => Some(table),
            _ => None,
        }
    }

    pub fn inline_table_mut(&mut self) -> Option<&mut Table> {
        if !self.has_inline_table {
            return None;
        }
        match self.args.last_mut() {
            Some(StepArg::Table(table)) => Some(table),
            _ => None,
        }
    }
}

impl Specification {
    #[must_use]
    pub fn empty(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            ..Self::default()
        }
    }

    pub fn set_heading(&mut self, heading: Heading) {
        self.heading = Some(heading);
        self.items.push(Item::Heading);
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.items.push(Item::Comment(comment));
    }

    pub fn set_tags(&mut self, tags: Tags) {
        self.tags = Some(tags);
        self.items.push(Item::Tags);
    }

    pub fn set_data_table(&mut self, data_table: DataTable) {
        self.data_table = data_table;
        self.items.push(Item::DataTable);
    }

    pub fn add_context(&mut self, step: Step) {
        self.items.push(Item::Context(self.contexts.len()));
        self.contexts.push(step);
    }

    /// Add a scenario, assigning its ordinal.
    pub fn add_scenario(&mut self, mut scenario: Scenario) {
        let ordinal = self
            .scenarios
            .iter()
            .map(|s| s.ordinal + 1)
            .max()
            .unwrap_or(0);
        scenario.ordinal = ordinal;
        self.items.push(Item::Scenario(ordinal));
        self.scenarios.push(scenario);
    }

    pub fn add_tear_down(&mut self, tear_down: TearDown) {
        self.items.push(Item::TearDown(self.tear_down.len()));
        self.tear_down.push(tear_down);
    }

    pub fn add_tear_down_step(&mut self, step: Step) {
        self.items.push(Item::TearDownStep(self.tear_down_steps.len()));
        self.tear_down_steps.push(step);
    }

    /// The most recently added scenario.
    pub fn latest_scenario_mut(&mut self) -> Option<&mut Scenario> {
        self.scenarios.last_mut()
    }

    pub fn latest_context_mut(&mut self) -> Option<&mut Step> {
        self.contexts.last_mut()
    }

    pub fn latest_tear_down_step_mut(&mut self) -> Option<&mut Step> {
        self.tear_down_steps.last_mut()
    }

    #[must_use]
    pub fn scenario_by_ordinal(&self, ordinal: usize) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.ordinal == ordinal)
    }

    /// Every step that can carry a concept invocation.
    pub fn steps_mut(&mut self) -> impl Iterator<Item = &mut Step> {
        self.contexts
            .iter_mut()
            .chain(self.scenarios.iter_mut().flat_map(|s| s.steps.iter_mut()))
            .chain(self.tear_down_steps.iter_mut())
    }
}

impl Scenario {
    #[must_use]
    pub fn new(heading: Heading) -> Self {
        let span = heading.span;
        Self {
            heading,
            span,
            ..Self::default()
        }
    }

    pub fn add_step(&mut self, step: Step) {
        self.items.push(ScenarioItem::Step(self.steps.len()));
        self.steps.push(step);
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.items.push(ScenarioItem::Comment(comment));
    }

    pub fn set_tags(&mut self, tags: Tags) {
        self.tags = Some(tags);
        self.items.push(ScenarioItem::Tags);
    }

    pub fn set_data_table(&mut self, data_table: DataTable) {
        self.data_table = data_table;
        self.items.push(ScenarioItem::DataTable);
    }

    pub fn latest_step_mut(&mut self) -> Option<&mut Step> {
        self.steps.last_mut()
    }

    /// Every tag on this scenario.
    pub fn tag_values(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().flat_map(Tags::values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_ordinals_follow_insertion() {
        let mut spec = Specification::empty("a.spec");
        spec.add_scenario(Scenario::new(Heading::new("one", Span::line(3))));
        spec.add_scenario(Scenario::new(Heading::new("two", Span::line(6))));
        assert_eq!(spec.scenarios[0].ordinal, 0);
        assert_eq!(spec.scenarios[1].ordinal, 1);
        assert_eq!(spec.items, vec![Item::Scenario(0), Item::Scenario(1)]);
    }

    #[test]
    fn inline_table_appends_placeholder() {
        let mut step = Step {
            value: "check users".to_string(),
            ..Step::default()
        };
        step.add_inline_table(Table::new(vec!["id".to_string()], 4));
        assert_eq!(step.value, "check users {}");
        assert!(step.inline_table().is_some());
        assert_eq!(step.args[0].kind(), ArgKind::Table);
    }

    #[test]
    fn tags_flatten_across_lines() {
        let mut tags = Tags::new(vec!["a".to_string(), "b".to_string()], Span::line(2));
        tags.add(vec!["c".to_string()], 3);
        assert_eq!(tags.values().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags.span, Span::new(2, 3));
    }
}
