//! Concepts: named steps that expand into a sequence of other steps.
//!
//! A concept source holds one or more definitions:
//!
//! ```text
//! # log in as <user>
//! * open the login page
//! * type <user> into "username"
//! ```
//!
//! The heading is the concept's signature; its `<params>` stand for the
//! arguments of the calling step. Sources are parsed from text, the caller
//! is responsible for reading them.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{ArgKind, Specification, Step, StepArg};
use crate::lexical::all_cells_are_separators;
use crate::lexer::{parse_step_text, tokenize};
use crate::step::{
    create_step_using_lookup, extract_step_value_and_parameter_types, resolve_table_cells,
};
use crate::table::{ArgLookup, Table};
use crate::token::{Token, TokenKind};

/// Fatal error while loading or expanding concepts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConceptError {
    #[error("{file}:{line} invalid concept: {message}")]
    Invalid {
        file: String,
        line: usize,
        message: String,
    },

    #[error("{file}:{line} duplicate concept definition '{concept}'")]
    Duplicate {
        file: String,
        line: usize,
        concept: String,
    },

    #[error("{file}:{line} concept '{concept}' expects {expected} argument(s), found {found}")]
    ArgumentMismatch {
        file: String,
        line: usize,
        concept: String,
        expected: usize,
        found: usize,
    },

    #[error("{file}: circular concept reference {chain}")]
    Circular { file: String, chain: String },
}

/// One concept definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub file_name: String,
    /// The signature. Its arguments are the parameter names.
    pub step: Step,
    pub steps: Vec<Step>,
}

impl Concept {
    /// Parse a source holding exactly one concept.
    ///
    /// # Errors
    ///
    /// Returns [`ConceptError::Invalid`] if the text is malformed or does not
    /// define exactly one concept.
    pub fn parse(file: &str, text: &str) -> Result<Self, ConceptError> {
        let mut concepts = Self::parse_all(file, text)?;
        match (concepts.pop(), concepts.is_empty()) {
            (Some(concept), true) => Ok(concept),
            (Some(concept), false) => Err(ConceptError::Invalid {
                file: file.to_string(),
                line: concept.step.span.start,
                message: "expected a single concept".to_string(),
            }),
            (None, _) => Err(ConceptError::Invalid {
                file: file.to_string(),
                line: 1,
                message: "no concept heading found".to_string(),
            }),
        }
    }

    /// Parse every concept in a source.
    ///
    /// # Errors
    ///
    /// Returns [`ConceptError::Invalid`] for lexer errors, steps outside a
    /// concept, non-dynamic parameters in a signature, or step arguments
    /// that name no parameter.
    pub fn parse_all(file: &str, text: &str) -> Result<Vec<Self>, ConceptError> {
        let (tokens, errors) = tokenize(text, file);
        if let Some(err) = errors.first() {
            return Err(invalid(file, err.span.start, err.kind.to_string()));
        }

        let mut concepts: Vec<Self> = Vec::new();
        let mut params: Vec<String> = Vec::new();
        let mut in_table = false;

        for token in &tokens {
            match token.kind {
                TokenKind::Spec => {
                    let (step, names) = signature(file, token)?;
                    params = names;
                    in_table = false;
                    concepts.push(Self {
                        file_name: file.to_string(),
                        step,
                        steps: Vec::new(),
                    });
                }
                TokenKind::Step => {
                    let concept = concepts.last_mut().ok_or_else(|| {
                        invalid(file, token.span.start, "step outside of a concept".to_string())
                    })?;
                    let lookup = ArgLookup::from_params(&params);
                    let (step, result) = create_step_using_lookup(token, &lookup, file);
                    if let Some(err) = result.parse_errors.first() {
                        return Err(invalid(file, err.span.start, err.kind.to_string()));
                    }
                    if let Some(mut step) = step {
                        step.suffix.clone_from(&token.suffix);
                        concept.steps.push(step);
                    }
                    in_table = false;
                }
                TokenKind::TableHeader => {
                    if let Some(step) = concepts.last_mut().and_then(|c| c.steps.last_mut()) {
                        step.add_inline_table(Table::new(token.args.clone(), token.span.start));
                        in_table = true;
                    }
                }
                TokenKind::TableRow if in_table => add_row(&mut concepts, &params, token, file),
                _ => {}
            }
        }
        Ok(concepts)
    }

    /// Parameter names, in signature order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.step.args.iter().filter_map(|arg| match arg {
            StepArg::Dynamic(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

fn invalid(file: &str, line: usize, message: String) -> ConceptError {
    ConceptError::Invalid {
        file: file.to_string(),
        line,
        message,
    }
}

fn signature(file: &str, token: &Token) -> Result<(Step, Vec<String>), ConceptError> {
    let line = token.span.start;
    let (marked, names) =
        parse_step_text(&token.value).map_err(|kind| invalid(file, line, kind.to_string()))?;
    let (value, kinds) = extract_step_value_and_parameter_types(&marked);
    if kinds.iter().any(|kind| *kind != ArgKind::Dynamic) {
        return Err(invalid(
            file,
            line,
            "concept parameters must be written as <name>".to_string(),
        ));
    }
    let step = Step {
        value,
        line_text: token.value.clone(),
        span: token.span,
        args: names.iter().cloned().map(StepArg::Dynamic).collect(),
        ..Step::default()
    };
    Ok((step, names))
}

fn add_row(concepts: &mut [Concept], params: &[String], token: &Token, file: &str) {
    let Some(table) = concepts
        .last_mut()
        .and_then(|c| c.steps.last_mut())
        .and_then(Step::inline_table_mut)
    else {
        return;
    };
    if all_cells_are_separators(&token.args) && table.rows.is_empty() {
        return;
    }
    let (cells, _) = resolve_table_cells(token, &ArgLookup::from_params(params), file);
    table.add_row(cells, token.span.start);
}

/// Concepts keyed by their signature's step value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptDictionary {
    concepts: HashMap<String, Concept>,
}

impl ConceptDictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and add every concept in it.
    ///
    /// # Errors
    ///
    /// Fails if the text is not a valid concept source or redefines a
    /// concept already in the dictionary.
    pub fn load(&mut self, file: &str, text: &str) -> Result<usize, ConceptError> {
        let concepts = Concept::parse_all(file, text)?;
        let count = concepts.len();
        for concept in concepts {
            self.add(concept)?;
        }
        debug!(file, count, "loaded concepts");
        Ok(count)
    }

    /// # Errors
    ///
    /// Returns [`ConceptError::Duplicate`] if a concept with the same
    /// signature exists.
    pub fn add(&mut self, concept: Concept) -> Result<(), ConceptError> {
        if self.concepts.contains_key(&concept.step.value) {
            return Err(ConceptError::Duplicate {
                file: concept.file_name,
                line: concept.step.span.start,
                concept: concept.step.line_text,
            });
        }
        self.concepts.insert(concept.step.value.clone(), concept);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, value: &str) -> Option<&Concept> {
        self.concepts.get(value)
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.concepts.contains_key(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Expand every context, scenario and tear-down step that invokes a
    /// concept. Nested concepts expand recursively.
    ///
    /// # Errors
    ///
    /// Fails on an argument count mismatch or a concept that ends up
    /// invoking itself.
    pub fn expand(&self, spec: &mut Specification) -> Result<(), ConceptError> {
        if self.is_empty() {
            return Ok(());
        }
        let file = spec.file_name.clone();
        let mut stack = Vec::new();
        for step in spec.steps_mut() {
            self.expand_step(step, &file, &mut stack)?;
        }
        Ok(())
    }

    fn expand_step(
        &self,
        step: &mut Step,
        file: &str,
        stack: &mut Vec<String>,
    ) -> Result<(), ConceptError> {
        let Some(concept) = self.concepts.get(&step.value) else {
            return Ok(());
        };
        if stack.contains(&step.value) {
            let mut chain: Vec<&str> = stack.iter().map(String::as_str).collect();
            chain.push(&step.value);
            return Err(ConceptError::Circular {
                file: file.to_string(),
                chain: chain.join(" -> "),
            });
        }

        let params: Vec<&str> = concept.params().collect();
        if params.len() != step.args.len() {
            return Err(ConceptError::ArgumentMismatch {
                file: file.to_string(),
                line: step.span.start,
                concept: concept.step.line_text.clone(),
                expected: params.len(),
                found: step.args.len(),
            });
        }

        stack.push(step.value.clone());
        let mut expanded = Vec::with_capacity(concept.steps.len());
        for inner in &concept.steps {
            let mut inner = substitute(inner, &params, &step.args);
            self.expand_step(&mut inner, file, stack)?;
            expanded.push(inner);
        }
        stack.pop();

        debug!(concept = %step.value, steps = expanded.len(), "expanded concept");
        step.is_concept = true;
        step.concept_steps = expanded;
        Ok(())
    }
}

/// Replace references to concept parameters with the caller's arguments.
fn substitute(step: &Step, params: &[&str], values: &[StepArg]) -> Step {
    let mut step = step.clone();
    for arg in &mut step.args {
        if let StepArg::Dynamic(name) = arg {
            if let Some(value) = params
                .iter()
                .position(|param| *param == name.as_str())
                .and_then(|index| values.get(index))
            {
                *arg = value.clone();
            }
        }
    }
    step
}
