//! Building steps from step tokens.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{ArgKind, PARAMETER_PLACEHOLDER, Scenario, SpecialKind, Specification, Step, StepArg};
use crate::diagnostic::{ParseError, ParseErrorKind, ParseResult, Warning, WarningKind};
use crate::table::{ArgLookup, CellKind, TableCell};
use crate::token::Token;

static PARAMETER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(static|dynamic|special)\}").unwrap_or_else(|_| unreachable!())
});

static DYNAMIC_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(.*)>$").unwrap_or_else(|_| unreachable!()));

/// Replace the kind markers left by the lexer with `{}` and return the
/// kinds in order.
#[must_use]
pub fn extract_step_value_and_parameter_types(value: &str) -> (String, Vec<ArgKind>) {
    let kinds = PARAMETER_MARKER
        .captures_iter(value)
        .filter_map(|caps| match caps.get(1).map(|m| m.as_str()) {
            Some("static") => Some(ArgKind::Static),
            Some("dynamic") => Some(ArgKind::Dynamic),
            Some("special") => Some(ArgKind::Special),
            _ => None,
        })
        .collect();
    let value = PARAMETER_MARKER
        .replace_all(value, PARAMETER_PLACEHOLDER)
        .into_owned();
    (value, kinds)
}

/// Build a step for `token`, resolving dynamic arguments against the
/// document table and, inside a scenario, the scenario table.
#[must_use]
pub fn create_step(
    spec: &Specification,
    scenario: Option<&Scenario>,
    token: &Token,
) -> (Option<Step>, ParseResult) {
    let mut tables = vec![&spec.data_table.table];
    if let Some(scenario) = scenario {
        tables.push(&scenario.data_table.table);
    }
    let lookup = ArgLookup::from_tables(&tables);
    let (step, result) = create_step_using_lookup(token, &lookup, &spec.file_name);
    let step = step.map(|mut step| {
        step.suffix.clone_from(&token.suffix);
        step
    });
    (step, result)
}

/// Build a step from a step token and an argument lookup.
///
/// The step is rejected when the number of kind markers in its text does not
/// match the number of arguments the lexer found, which happens when the
/// text itself contains a literal `{static}`, `{dynamic}` or `{special}`.
/// Otherwise every argument is resolved and all of their errors are
/// reported together; the step is still returned.
#[must_use]
pub fn create_step_using_lookup(
    token: &Token,
    lookup: &ArgLookup,
    file: &str,
) -> (Option<Step>, ParseResult) {
    let (value, kinds) = extract_step_value_and_parameter_types(&token.value);
    if kinds.len() != token.args.len() {
        return (
            None,
            ParseResult::error(ParseError::at(
                ParseErrorKind::ReservedParameterMarker,
                file,
                token,
            )),
        );
    }

    let mut result = ParseResult::default();
    let args = kinds
        .iter()
        .zip(&token.args)
        .map(|(kind, arg)| {
            let (step_arg, error) = create_step_arg(arg, *kind, token, lookup, file);
            if let Some(error) = error {
                result.parse_errors.push(error);
            }
            step_arg
        })
        .collect();

    let step = Step {
        value,
        line_text: token.line_text().trim().to_string(),
        span: token.span,
        args,
        ..Step::default()
    };
    (Some(step), result)
}

fn create_step_arg(
    arg: &str,
    kind: ArgKind,
    token: &Token,
    lookup: &ArgLookup,
    file: &str,
) -> (StepArg, Option<ParseError>) {
    match kind {
        ArgKind::Static => (StepArg::Static(arg.to_string()), None),
        ArgKind::Special => match special_reference(arg) {
            Some((kind, path)) if path.is_empty() => (
                StepArg::Special {
                    kind,
                    path: String::new(),
                },
                Some(ParseError::at(
                    ParseErrorKind::MalformedSpecialParam {
                        value: arg.to_string(),
                    },
                    file,
                    token,
                )),
            ),
            Some((kind, path)) => (
                StepArg::Special {
                    kind,
                    path: path.to_string(),
                },
                None,
            ),
            None => resolve_dynamic(arg, token, lookup, file),
        },
        ArgKind::Dynamic | ArgKind::Table => resolve_dynamic(arg, token, lookup, file),
    }
}

fn resolve_dynamic(
    arg: &str,
    token: &Token,
    lookup: &ArgLookup,
    file: &str,
) -> (StepArg, Option<ParseError>) {
    let step_arg = StepArg::Dynamic(arg.to_string());
    if lookup.is_concept_header() || lookup.contains(arg) {
        return (step_arg, None);
    }
    let error = ParseError::at(
        ParseErrorKind::UnresolvedDynamicParam {
            name: arg.to_string(),
        },
        file,
        token,
    );
    (step_arg, Some(error))
}

/// Split `file:path` / `table:path`. Unknown schemes are not special.
fn special_reference(arg: &str) -> Option<(SpecialKind, &str)> {
    let (scheme, path) = arg.split_once(':')?;
    SpecialKind::from_scheme(scheme.trim()).map(|kind| (kind, path.trim()))
}

/// Resolve the cells of a table row. `<name>` cells become dynamic when the
/// lookup knows the column and stay static with a warning otherwise.
#[must_use]
pub fn resolve_table_cells(
    token: &Token,
    lookup: &ArgLookup,
    file: &str,
) -> (Vec<TableCell>, Vec<Warning>) {
    let mut warnings = Vec::new();
    let cells = token
        .args
        .iter()
        .map(|raw| {
            let Some(name) = DYNAMIC_CELL
                .captures(raw)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
            else {
                return TableCell::literal(raw.as_str());
            };
            if special_reference(name).is_some() {
                TableCell::new(name, CellKind::Special)
            } else if lookup.contains(name) {
                TableCell::new(name, CellKind::Dynamic)
            } else {
                warnings.push(Warning::new(
                    WarningKind::UnresolvedTableCell {
                        name: name.to_string(),
                    },
                    file,
                    token.span,
                ));
                TableCell::literal(raw.as_str())
            }
        })
        .collect();
    (cells, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::table::Table;

    fn step_token(text: &str) -> Token {
        let (mut tokens, errors) = tokenize(text, "t.spec");
        assert!(errors.is_empty(), "{errors:?}");
        tokens.remove(0)
    }

    fn users() -> Table {
        let mut table = Table::new(vec!["name".to_string()], 1);
        table.add_row(vec![TableCell::literal("ada")], 2);
        table
    }

    #[test]
    fn extracts_kinds_in_order() {
        let (value, kinds) =
            extract_step_value_and_parameter_types("a {static} b {dynamic} c {special}");
        assert_eq!(value, "a {} b {} c {}");
        assert_eq!(
            kinds,
            vec![ArgKind::Static, ArgKind::Dynamic, ArgKind::Special]
        );
    }

    #[test]
    fn plain_step() {
        let token = step_token("* open the app");
        let (step, result) = create_step_using_lookup(&token, &ArgLookup::default(), "t.spec");
        let step = step.unwrap();
        assert!(result.ok());
        assert_eq!(step.value, "open the app");
        assert_eq!(step.line_text, "open the app");
        assert!(step.args.is_empty());
    }

    #[test]
    fn resolves_static_and_dynamic() {
        let token = step_token("* greet \"Ada\" as <name>");
        let table = users();
        let lookup = ArgLookup::from_tables(&[&table]);
        let (step, result) = create_step_using_lookup(&token, &lookup, "t.spec");
        assert!(result.ok());
        let step = step.unwrap();
        assert_eq!(step.value, "greet {} as {}");
        assert_eq!(
            step.args,
            vec![
                StepArg::Static("Ada".to_string()),
                StepArg::Dynamic("name".to_string())
            ]
        );
    }

    #[test]
    fn reserved_marker_is_rejected() {
        let token = step_token("* write {static} literally");
        let (step, result) = create_step_using_lookup(&token, &ArgLookup::default(), "t.spec");
        assert!(step.is_none());
        assert_eq!(
            result.parse_errors[0].kind,
            ParseErrorKind::ReservedParameterMarker
        );
        assert_eq!(
            result.parse_errors[0].line_text.as_deref(),
            Some("write {static} literally")
        );
    }

    #[test]
    fn collects_every_unresolved_argument() {
        let token = step_token("* move <from> to <to>");
        let (step, result) = create_step_using_lookup(&token, &ArgLookup::default(), "t.spec");
        assert!(step.is_some());
        assert_eq!(result.parse_errors.len(), 2);
        assert_eq!(
            result.parse_errors[1].kind,
            ParseErrorKind::UnresolvedDynamicParam {
                name: "to".to_string()
            }
        );
    }

    #[test]
    fn special_arguments() {
        let token = step_token("* load <file:data.json> and <table:users.csv>");
        let (step, result) = create_step_using_lookup(&token, &ArgLookup::default(), "t.spec");
        assert!(result.ok());
        let step = step.unwrap();
        assert_eq!(
            step.args[0],
            StepArg::Special {
                kind: SpecialKind::File,
                path: "data.json".to_string()
            }
        );
        assert_eq!(step.args[1].kind(), ArgKind::Special);
    }

    #[test]
    fn special_without_path_is_malformed() {
        let token = step_token("* load <file:>");
        let (_, result) = create_step_using_lookup(&token, &ArgLookup::default(), "t.spec");
        assert!(matches!(
            result.parse_errors[0].kind,
            ParseErrorKind::MalformedSpecialParam { .. }
        ));
    }

    #[test]
    fn unknown_scheme_falls_back_to_dynamic() {
        let token = step_token("* open <url:home>");
        let lookup = ArgLookup::from_params(&["url:home"]);
        let (step, result) = create_step_using_lookup(&token, &lookup, "t.spec");
        assert!(result.ok());
        assert_eq!(step.unwrap().args[0], StepArg::Dynamic("url:home".to_string()));
    }

    #[test]
    fn concept_header_resolves_any_dynamic() {
        let token = step_token("* log in as <user>");
        let (_, result) =
            create_step_using_lookup(&token, &ArgLookup::concept_header(), "t.spec");
        assert!(result.ok());
    }

    #[test]
    fn table_cells() {
        let (tokens, _) = tokenize("|<name>|<city>|<file:a.txt>|plain|", "t.spec");
        let table = users();
        let lookup = ArgLookup::from_tables(&[&table]);
        let (cells, warnings) = resolve_table_cells(&tokens[0], &lookup, "t.spec");
        assert_eq!(cells[0], TableCell::new("name", CellKind::Dynamic));
        assert_eq!(cells[1], TableCell::literal("<city>"));
        assert_eq!(cells[2].kind, CellKind::Special);
        assert_eq!(cells[3], TableCell::literal("plain"));
        assert_eq!(warnings.len(), 1);
    }
}
