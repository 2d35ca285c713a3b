//! Lexer, parser, validator, and formatter for markdown acceptance-test
//! specifications.
//!
//! A specification is a markdown file with a `#` heading, optional tags and
//! data table, context steps, `##` scenarios made of `*` steps, and an
//! optional tear-down section. Parsing never stops at the first problem:
//! every error and warning in a file is collected into a [`ParseResult`]
//! next to the document.
//!
//! # Quick start
//!
//! ## Parse and re-format a specification
//!
//! ```
//! use specfile_rs::{format, parse};
//!
//! let input = "# Search\n\n## Find a book\n\n* search for \"rust\"\n";
//! let (spec, result) = parse(input, "search.spec").unwrap();
//! assert!(result.ok());
//! assert_eq!(format(&spec), input);
//! ```
//!
//! ## Build a specification programmatically
//!
//! ```
//! use specfile_rs::{Scenario, Specification, Step, format};
//!
//! let spec = Specification::titled("login.spec", "Login")
//!     .tag("smoke")
//!     .scenario(Scenario::named("Valid user")
//!         .step(Step::new("log in as {}").with_static("ada")));
//!
//! let output = format(&spec);
//! assert!(output.contains("* log in as \"ada\""));
//! ```
//!
//! ## Expand concepts
//!
//! ```
//! use specfile_rs::{ConceptDictionary, SpecParser};
//!
//! let mut concepts = ConceptDictionary::new();
//! concepts.load("login.cpt", "# log in as <user>\n* open the login page\n").unwrap();
//!
//! let input = "# Login\n\n## Admin\n\n* log in as \"root\"\n";
//! let (spec, result) = SpecParser::new().parse(input, &concepts, "login.spec").unwrap();
//! assert!(result.ok());
//! assert!(spec.scenarios[0].steps[0].is_concept);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod concept;
pub mod config;
pub mod converter;
pub mod diagnostic;
pub mod formatter;
pub mod lexer;
pub mod lexical;
pub mod parser;
pub mod prioritize;
pub mod state;
pub mod step;
pub mod table;
pub mod token;
pub mod validate;

pub use ast::{
    ArgKind, Comment, Heading, Item, Scenario, ScenarioItem, SpecialKind, Specification, Step,
    StepArg, Tags, TearDown,
};
pub use concept::{Concept, ConceptDictionary, ConceptError};
pub use config::{ConfigError, ParserConfig};
pub use diagnostic::{ParseError, ParseErrorKind, ParseResult, Warning, WarningKind};
pub use formatter::format;
pub use lexer::{tokenize, tokenize_with};
pub use parser::{SpecParser, parse};
pub use state::ParseState;
pub use step::create_step_using_lookup;
pub use table::{ArgLookup, CellKind, DataTable, Table, TableCell};
pub use token::{Span, Token, TokenKind};

/// Parse text into a document without expanding concepts or validating.
#[must_use]
pub fn parse_spec_text(input: &str, file: &str) -> (Specification, ParseResult) {
    SpecParser::new().parse_spec_text(input, file)
}
