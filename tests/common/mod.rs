#![allow(dead_code)]

use specfile_rs::{
    ConceptDictionary, ParseResult, ParserConfig, SpecParser, Specification, format, parse,
    parse_spec_text,
};

/// Parse `input` and assert it produced no errors.
pub fn parse_ok(input: &str) -> Specification {
    let (spec, result) = parse(input, "test.spec").expect("concept expansion");
    assert!(
        result.ok(),
        "unexpected errors: {:#?}\n--- input ---\n{input}",
        result.parse_errors
    );
    spec
}

/// Parse `input` with a configuration, without concepts.
pub fn parse_with(config: ParserConfig, input: &str) -> (Specification, ParseResult) {
    SpecParser::with_config(config)
        .parse(input, &ConceptDictionary::new(), "test.spec")
        .expect("concept expansion")
}

/// Error messages without the file prefix.
pub fn error_messages(result: &ParseResult) -> Vec<String> {
    result
        .parse_errors
        .iter()
        .map(|e| e.kind.to_string())
        .collect()
}

pub fn scenario_names(spec: &Specification) -> Vec<&str> {
    spec.scenarios
        .iter()
        .map(|s| s.heading.value.as_str())
        .collect()
}

/// Format `input` after parsing it and assert the text is unchanged.
pub fn roundtrip(input: &str) {
    let spec = parse_ok(input);
    let output = format(&spec);
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Format a document, parse it back, and assert formatting again is
/// stable.
pub fn assert_format_stable(original: &Specification) {
    let formatted = format(original);
    let (reparsed, result) = parse_spec_text(&formatted, "test.spec");
    assert!(
        result.parse_errors.is_empty(),
        "formatted output does not parse: {:#?}\n--- formatted ---\n{formatted}",
        result.parse_errors
    );
    let again = format(&reparsed);
    assert_eq!(
        formatted, again,
        "format is not stable\n--- first ---\n{formatted}\n--- second ---\n{again}"
    );
}
