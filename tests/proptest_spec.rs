//! Property-based tests with proptest.
//!
//! Generate random documents with the builder API, format them, parse them
//! back, and verify formatting is stable. We compare formatted text rather
//! than trees because parsing records spans the builder never sets.

use proptest::prelude::*;
use specfile_rs::lexical::{is_table_separator_line, unescape};
use specfile_rs::{
    ConceptDictionary, Scenario, SpecParser, Specification, Step, Table, format, parse,
    parse_spec_text,
};

// -- Leaf strategies --

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_map(|s| s)
}

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..=4).prop_map(|w| w.join(" "))
}

fn heading() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,10}( [a-z]{1,8}){0,2}".prop_map(|s| s)
}

/// Quoted argument content. Quotes, backslashes, tabs and other
/// non-printable characters exercise escaping.
fn static_value() -> impl Strategy<Value = String> {
    r#"[a-zA-Z0-9 .,'"\\\t\x07\x1b\x{301}é-]{0,16}"#.prop_map(|s| s)
}

fn tag() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}".prop_map(|s| s)
}

/// Columns every generated document declares, so dynamic arguments resolve.
const COLUMNS: [&str; 2] = ["id", "name"];

#[derive(Debug, Clone)]
enum Arg {
    Static(String),
    Dynamic(usize),
}

fn arg() -> impl Strategy<Value = Arg> {
    prop_oneof![
        static_value().prop_map(Arg::Static),
        (0..COLUMNS.len()).prop_map(Arg::Dynamic),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    (
        words(),
        prop::collection::vec((arg(), word()), 0..=3),
        prop::option::of(words()),
    )
        .prop_map(|(lead, args, suffix)| {
            let mut value = lead;
            for (_, tail) in &args {
                value.push_str(" {} ");
                value.push_str(tail);
            }
            let mut step = Step::new(&value);
            for (arg, _) in args {
                step = match arg {
                    Arg::Static(text) => step.with_static(&text),
                    Arg::Dynamic(index) => step.with_dynamic(COLUMNS[index]),
                };
            }
            match suffix {
                Some(suffix) => step.with_suffix(&suffix),
                None => step,
            }
        })
}

fn scenario(index: usize) -> impl Strategy<Value = Scenario> {
    (
        heading(),
        prop::collection::vec(tag(), 0..=3),
        prop::option::of(words()),
        prop::collection::vec(step(), 1..=4),
    )
        .prop_map(move |(name, tags, comment, steps)| {
            let mut scenario = Scenario::named(&format!("{name} {index}"));
            for tag in &tags {
                scenario = scenario.tag(tag);
            }
            if let Some(comment) = comment {
                scenario = scenario.comment(&comment);
            }
            steps.into_iter().fold(scenario, Scenario::step)
        })
}

fn scenarios() -> impl Strategy<Value = Vec<Scenario>> {
    (1usize..=4).prop_flat_map(|count| (0..count).map(scenario).collect::<Vec<_>>())
}

fn table() -> impl Strategy<Value = Table> {
    prop::collection::vec((word(), words()), 1..=3).prop_map(|rows| {
        rows.iter().fold(Table::with_headers(&COLUMNS), |table, (id, name)| {
            table.row(&[id.as_str(), name.as_str()])
        })
    })
}

fn specification() -> impl Strategy<Value = Specification> {
    (
        heading(),
        prop::collection::vec(tag(), 0..=3),
        prop::option::of(words()),
        table(),
        prop::collection::vec(step(), 0..=2),
        scenarios(),
        prop::collection::vec(step(), 0..=2),
    )
        .prop_map(|(title, tags, comment, table, contexts, scenarios, tear_down)| {
            let mut spec = Specification::titled("gen.spec", &title);
            for tag in &tags {
                spec = spec.tag(tag);
            }
            if let Some(comment) = comment {
                spec = spec.comment(&comment);
            }
            spec = spec.table(table);
            spec = contexts.into_iter().fold(spec, Specification::context);
            spec = scenarios.into_iter().fold(spec, Specification::scenario);
            tear_down
                .into_iter()
                .fold(spec, Specification::tear_down_step)
        })
}

// -- Properties --

proptest! {
    #[test]
    fn long_dash_runs_are_separators(n in 4usize..40) {
        prop_assert!(is_table_separator_line(&"-".repeat(n)));
    }

    #[test]
    fn mixed_text_is_not_a_separator(left in "-{0,3}", right in "-{0,3}", middle in "[a-z=_]") {
        let text = format!("{left}{middle}{right}");
        prop_assert!(!is_table_separator_line(&text));
    }

    #[test]
    fn unescape_leaves_no_control_characters(text in any::<String>()) {
        let out = unescape(&text);
        prop_assert!(!out.chars().any(char::is_control), "{out:?}");
    }

    #[test]
    fn arbitrary_text_never_fails_the_parse(text in any::<String>()) {
        prop_assert!(parse(&text, "any.spec").is_ok());
    }

    #[test]
    fn parsing_is_deterministic(text in "([#*|a-z <>\"\\-_:]{0,20}\n){0,12}") {
        let first = parse_spec_text(&text, "d.spec");
        let second = parse_spec_text(&text, "d.spec");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn generated_documents_parse_cleanly(spec in specification()) {
        let text = format(&spec);
        let (_, result) = SpecParser::new()
            .parse(&text, &ConceptDictionary::new(), "gen.spec")
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert!(result.ok(), "{:#?}\n{}", result.parse_errors, text);
        prop_assert!(result.warnings.is_empty(), "{:#?}\n{}", result.warnings, text);
    }

    #[test]
    fn static_arguments_survive_formatting(table in table(), step in step()) {
        let spec = Specification::titled("gen.spec", "Args")
            .table(table)
            .scenario(Scenario::named("S").step(step.clone()));
        let formatted = format(&spec);
        let (reparsed, result) = parse_spec_text(&formatted, "gen.spec");
        prop_assert!(result.ok(), "{:#?}\n{}", result.parse_errors, formatted);
        prop_assert_eq!(&reparsed.scenarios[0].steps[0].args, &step.args);
    }

    #[test]
    fn format_is_stable(spec in specification()) {
        let formatted = format(&spec);
        let (reparsed, _) = parse_spec_text(&formatted, "gen.spec");
        let again = format(&reparsed);
        prop_assert_eq!(formatted, again);
    }
}
