//! Document builder.
//!
//! Walks tokens through the converter chain, then reorders scenarios,
//! expands concepts and validates the result. Diagnostics from every stage
//! end up in one [`ParseResult`]; only concept expansion can fail outright.

use tracing::debug;

use crate::ast::Specification;
use crate::concept::{ConceptDictionary, ConceptError};
use crate::config::ParserConfig;
use crate::converter::converters;
use crate::diagnostic::ParseResult;
use crate::lexer::tokenize_with;
use crate::prioritize::prioritize;
use crate::state::ParseState;
use crate::token::Token;
use crate::validate::validate;

/// Builds [`Specification`]s from text or tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecParser {
    config: ParserConfig,
}

impl SpecParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Tokenize, build, expand concepts and validate.
    ///
    /// Errors appear in the result in this order: lexer errors, the
    /// validation error, then errors from building.
    ///
    /// # Errors
    ///
    /// Returns [`ConceptError`] if concept expansion fails.
    pub fn parse(
        &self,
        text: &str,
        concepts: &ConceptDictionary,
        file: &str,
    ) -> Result<(Specification, ParseResult), ConceptError> {
        let (tokens, lex_errors) = tokenize_with(&self.config, text, file);
        let (spec, mut result) = self.create_specification(&tokens, concepts, file)?;
        result.prepend_errors(lex_errors);
        Ok((spec, result))
    }

    /// Tokenize and build without concept expansion or validation.
    #[must_use]
    pub fn parse_spec_text(&self, text: &str, file: &str) -> (Specification, ParseResult) {
        let (tokens, lex_errors) = tokenize_with(&self.config, text, file);
        let (spec, mut result) = self.build(&tokens, file);
        result.prepend_errors(lex_errors);
        (spec, result)
    }

    /// Build from tokens produced elsewhere, expand concepts and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConceptError`] if concept expansion fails.
    pub fn create_specification(
        &self,
        tokens: &[Token],
        concepts: &ConceptDictionary,
        file: &str,
    ) -> Result<(Specification, ParseResult), ConceptError> {
        let (mut spec, mut result) = self.build(tokens, file);
        concepts.expand(&mut spec)?;
        if let Err(err) = validate(&mut spec) {
            debug!(file, %err, "validation failed");
            result.prepend_errors(vec![err]);
        }
        Ok((spec, result))
    }

    fn build(&self, tokens: &[Token], file: &str) -> (Specification, ParseResult) {
        let chain = converters();
        let mut state = ParseState::INITIAL;
        let mut spec = Specification::empty(file);
        let mut result = ParseResult::new(file);

        for token in tokens {
            for converter in &chain {
                result.merge(converter.convert(token, &mut state, &mut spec, &self.config));
            }
        }

        let last_line = tokens.last().map(|token| token.span.start);
        let (spec, warnings) = prioritize(spec, last_line);
        result.warnings.extend(warnings);

        debug!(
            file,
            tokens = tokens.len(),
            scenarios = spec.scenarios.len(),
            errors = result.parse_errors.len(),
            warnings = result.warnings.len(),
            "built specification"
        );
        (spec, result)
    }
}

/// Parse with the default configuration and no concepts.
///
/// # Errors
///
/// Returns [`ConceptError`] under the same conditions as
/// [`SpecParser::parse`]; with no concepts there is nothing to expand.
pub fn parse(text: &str, file: &str) -> Result<(Specification, ParseResult), ConceptError> {
    SpecParser::new().parse(text, &ConceptDictionary::new(), file)
}
