//! Line lexer for specification text.
//!
//! Each source line becomes at most one token; setext underlines and
//! multi-line steps fold into the token before them. Lexing never fails:
//! malformed step arguments are reported as [`ParseError`]s next to the
//! tokens.

use std::str::Chars;

use crate::config::ParserConfig;
use crate::diagnostic::{ParseError, ParseErrorKind};
use crate::lexical::is_underline;
use crate::state::ParseState;
use crate::token::{Token, TokenKind};

pub const STATIC_MARKER: &str = "{static}";
pub const DYNAMIC_MARKER: &str = "{dynamic}";
pub const SPECIAL_MARKER: &str = "{special}";

/// Tokenize specification text with the default configuration.
#[must_use]
pub fn tokenize(input: &str, file: &str) -> (Vec<Token>, Vec<ParseError>) {
    Lexer::new(&ParserConfig::default(), file).tokenize(input)
}

/// Tokenize specification text.
#[must_use]
pub fn tokenize_with(
    config: &ParserConfig,
    input: &str,
    file: &str,
) -> (Vec<Token>, Vec<ParseError>) {
    Lexer::new(config, file).tokenize(input)
}

struct Lexer<'a> {
    config: &'a ParserConfig,
    file: &'a str,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
    state: ParseState,
    /// Errors reported for the most recent token, dropped if the token is
    /// extended by a continuation line.
    last_token_errors: usize,
}

impl<'a> Lexer<'a> {
    const fn new(config: &'a ParserConfig, file: &'a str) -> Self {
        Self {
            config,
            file,
            tokens: Vec::new(),
            errors: Vec::new(),
            state: ParseState::INITIAL,
            last_token_errors: 0,
        }
    }

    fn tokenize(mut self, input: &str) -> (Vec<Token>, Vec<ParseError>) {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);

        for (index, line) in input.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                self.state.add(&[ParseState::NEW_LINE]);
                continue;
            }

            let token = if let Some(rest) = scenario_heading(trimmed) {
                Token::new(TokenKind::Scenario, rest.trim(), line, line_no)
            } else if let Some(rest) = spec_heading(trimmed) {
                Token::new(TokenKind::Spec, rest.trim(), line, line_no)
            } else if is_underline(trimmed, '=') {
                self.promote_or_comment(TokenKind::Spec, line, line_no)
            } else if is_underline(trimmed, '-') {
                self.promote_or_comment(TokenKind::Scenario, line, line_no)
            } else if let Some(text) = step_text(trimmed) {
                Token::new(TokenKind::Step, text, text, line_no)
            } else if let Some(rest) = self.tag_text(trimmed) {
                Token::new(TokenKind::Tag, rest.trim(), line, line_no)
            } else if is_table_row(trimmed) {
                let kind = if self.state.is_in(&[ParseState::TABLE]) {
                    TokenKind::TableRow
                } else {
                    TokenKind::TableHeader
                };
                Token::new(kind, trimmed, line, line_no)
            } else if let Some(rest) = strip_prefix_ignore_case(trimmed, "table:") {
                Token::new(TokenKind::DataTable, rest.trim(), line, line_no)
            } else if trimmed.len() >= 3 && is_underline(trimmed, '_') {
                Token::new(TokenKind::TearDown, trimmed, line, line_no)
            } else if let Some(step) = self.continue_step(line, line_no) {
                step
            } else {
                Token::new(TokenKind::Comment, line.trim_end(), line, line_no)
            };

            self.accept(token);
        }

        (self.tokens, self.errors)
    }

    /// A setext underline turns the comment above it into a heading.
    fn promote_or_comment(&mut self, kind: TokenKind, line: &str, line_no: usize) -> Token {
        if self.state.is_in(&[ParseState::COMMENT]) {
            if let Some(mut previous) = self.tokens.pop() {
                previous.kind = kind;
                previous.value = previous.value.trim().to_string();
                previous.span.end = line_no;
                return previous;
            }
        }
        Token::new(TokenKind::Comment, line.trim_end(), line, line_no)
    }

    fn tag_text<'l>(&self, trimmed: &'l str) -> Option<&'l str> {
        strip_prefix_ignore_case(trimmed, "tags:")
            .or_else(|| self.state.is_in(&[ParseState::TAGS]).then_some(trimmed))
    }

    /// With multi-line steps enabled, a plain line right after a step
    /// extends it.
    fn continue_step(&mut self, line: &str, line_no: usize) -> Option<Token> {
        if !self.config.allow_multiline_step || self.state.is_in(&[ParseState::NEW_LINE]) {
            return None;
        }
        if self.tokens.last()?.kind != TokenKind::Step {
            return None;
        }
        let mut step = self.tokens.pop()?;
        let keep = self.errors.len().saturating_sub(self.last_token_errors);
        self.errors.truncate(keep);
        step.lines.push(line.trim().to_string());
        step.value = step.line_text().trim().to_string();
        step.span.end = line_no;
        Some(step)
    }

    fn accept(&mut self, mut token: Token) {
        let before = self.errors.len();
        match token.kind {
            TokenKind::Step => self.process_step(&mut token),
            TokenKind::Tag => {
                token.args = split_tags(&token.value);
            }
            TokenKind::TableHeader | TokenKind::TableRow => {
                token.args = split_cells(&token.value);
            }
            _ => {}
        }
        self.last_token_errors = self.errors.len() - before;

        self.state = match token.kind {
            TokenKind::TableHeader | TokenKind::TableRow => ParseState::TABLE,
            TokenKind::Comment => ParseState::COMMENT,
            TokenKind::Tag if token.value.ends_with(',') => ParseState::TAGS,
            _ => ParseState::INITIAL,
        };
        self.tokens.push(token);
    }

    fn process_step(&mut self, token: &mut Token) {
        let (text, suffix) = split_suffix(&token.value);
        token.suffix = suffix;
        match parse_step_text(&text) {
            Ok((value, args)) => {
                token.value = value;
                token.args = args;
            }
            Err(kind) => {
                token.value = text;
                self.errors.push(ParseError::at(kind, self.file, token));
            }
        }
    }
}

fn spec_heading(line: &str) -> Option<&str> {
    line.strip_prefix('#').filter(|rest| !rest.starts_with('#'))
}

fn scenario_heading(line: &str) -> Option<&str> {
    line.strip_prefix("##").filter(|rest| !rest.starts_with('#'))
}

fn step_text(line: &str) -> Option<&str> {
    line.strip_prefix('*')
        .filter(|rest| !rest.starts_with('*'))
        .map(str::trim)
}

fn is_table_row(line: &str) -> bool {
    line.len() > 1 && line.starts_with('|') && line.ends_with('|')
}

fn strip_prefix_ignore_case<'l>(line: &'l str, prefix: &str) -> Option<&'l str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        line.get(prefix.len()..)
    } else {
        None
    }
}

fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Cells between the outer pipes, trimmed. `\|` is a literal pipe.
fn split_cells(row: &str) -> Vec<String> {
    let inner = row
        .strip_prefix('|')
        .and_then(|r| r.strip_suffix('|'))
        .unwrap_or(row);

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(ch),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

/// Split a trailing `[annotation]` off a step.
fn split_suffix(text: &str) -> (String, Option<String>) {
    let trimmed = text.trim_end();
    if let Some(body) = trimmed.strip_suffix(']') {
        if let Some(open) = body.rfind('[') {
            let (head, annotation) = body.split_at(open);
            let annotation = annotation.trim_start_matches('[').trim();
            if !head.trim().is_empty() && !annotation.is_empty() {
                return (head.trim_end().to_string(), Some(annotation.to_string()));
            }
        }
    }
    (trimmed.to_string(), None)
}

/// Replace every argument in a step with its kind marker.
///
/// `"text"` is static, `<name>` dynamic, and `<scheme:path>` special.
/// Inside a static argument the escapes written by
/// [`unescape`](crate::lexical::unescape) are decoded: `\"`, `\\`, `\n`,
/// `\t`, `\r`, `\0`, `\'` and `\u{..}`. Any other backslash is kept.
///
/// # Errors
///
/// Returns the error kind for an unterminated string or dynamic parameter.
pub fn parse_step_text(text: &str) -> Result<(String, Vec<String>), ParseErrorKind> {
    let mut value = String::new();
    let mut args = Vec::new();
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                let mut arg = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => decode_escape(&mut chars, &mut arg),
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => arg.push(c),
                    }
                }
                if !closed {
                    return Err(ParseErrorKind::UnterminatedString);
                }
                value.push_str(STATIC_MARKER);
                args.push(arg);
            }
            '<' => {
                let mut arg = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '>' {
                        closed = true;
                        break;
                    }
                    arg.push(c);
                }
                if !closed {
                    return Err(ParseErrorKind::UnterminatedDynamicParam);
                }
                if is_special(&arg) {
                    value.push_str(SPECIAL_MARKER);
                } else {
                    value.push_str(DYNAMIC_MARKER);
                }
                args.push(arg);
            }
            _ => value.push(ch),
        }
    }

    Ok((value, args))
}

fn decode_escape(chars: &mut Chars<'_>, out: &mut String) {
    match chars.next() {
        Some('n') => out.push('\n'),
        Some('t') => out.push('\t'),
        Some('r') => out.push('\r'),
        Some('0') => out.push('\0'),
        Some(c @ ('"' | '\\' | '\'')) => out.push(c),
        Some('u') => {
            let rest = chars.as_str();
            match decode_unicode(rest).and_then(|(ch, used)| Some((ch, rest.get(used..)?))) {
                Some((ch, tail)) => {
                    out.push(ch);
                    *chars = tail.chars();
                }
                None => out.push_str("\\u"),
            }
        }
        Some(other) => {
            out.push('\\');
            out.push(other);
        }
        None => out.push('\\'),
    }
}

/// `{hex}` at the start of `rest`: the character and the bytes consumed.
fn decode_unicode(rest: &str) -> Option<(char, usize)> {
    let body = rest.strip_prefix('{')?;
    let close = body.find('}')?;
    let code = u32::from_str_radix(body.get(..close)?, 16).ok()?;
    Some((char::from_u32(code)?, close + 2))
}

/// `scheme:rest` where the scheme is a non-empty alphabetic word.
fn is_special(arg: &str) -> bool {
    arg.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input, "t.spec").0.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn headings_and_steps() {
        let (tokens, errors) = tokenize("# Spec\n## Scenario\n* do it\n", "t.spec");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Spec);
        assert_eq!(tokens[0].value, "Spec");
        assert_eq!(tokens[1].kind, TokenKind::Scenario);
        assert_eq!(tokens[1].value, "Scenario");
        assert_eq!(tokens[2].kind, TokenKind::Step);
        assert_eq!(tokens[2].value, "do it");
        assert_eq!(tokens[2].span.start, 3);
    }

    #[test]
    fn setext_headings() {
        let (tokens, _) = tokenize("Spec\n====\nScenario\n--------\n", "t.spec");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Spec);
        assert_eq!(tokens[0].value, "Spec");
        assert_eq!(tokens[0].span.end, 2);
        assert_eq!(tokens[1].kind, TokenKind::Scenario);
    }

    #[test]
    fn front_matter_delimiter_stays_a_comment() {
        assert_eq!(
            kinds("---\ntitle: x\n---\n"),
            vec![TokenKind::Comment, TokenKind::Comment, TokenKind::Comment]
        );
    }

    #[test]
    fn step_arguments() {
        let (tokens, errors) = tokenize(
            "* greet \"Ada\" in <city> with <file:hello.txt>",
            "t.spec",
        );
        assert!(errors.is_empty());
        assert_eq!(
            tokens[0].value,
            "greet {static} in {dynamic} with {special}"
        );
        assert_eq!(tokens[0].args, ["Ada", "city", "file:hello.txt"]);
    }

    #[test]
    fn escaped_quote_in_static_argument() {
        let (tokens, _) = tokenize(r#"* say "a \"b\"""#, "t.spec");
        assert_eq!(tokens[0].args, [r#"a "b""#]);
    }

    #[test]
    fn debug_escapes_are_decoded() {
        let (tokens, _) = tokenize(r#"* say "a\tb\u{1b}c\u{301}\0""#, "t.spec");
        assert_eq!(tokens[0].args, ["a\tb\u{1b}c\u{301}\0"]);
    }

    #[test]
    fn unknown_escapes_are_kept() {
        let (tokens, _) = tokenize(r#"* say "C:\qux \u{zz} \u12""#, "t.spec");
        assert_eq!(tokens[0].args, [r"C:\qux \u{zz} \u12"]);
    }

    #[test]
    fn unterminated_string() {
        let (tokens, errors) = tokenize("* say \"hello", "t.spec");
        assert_eq!(tokens.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn unterminated_dynamic_param() {
        let (_, errors) = tokenize("* use <name", "t.spec");
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedDynamicParam);
    }

    #[test]
    fn step_suffix() {
        let (tokens, _) = tokenize("* open the door [continue on failure]", "t.spec");
        assert_eq!(tokens[0].value, "open the door");
        assert_eq!(tokens[0].suffix.as_deref(), Some("continue on failure"));
    }

    #[test]
    fn tags_with_continuation() {
        let (tokens, _) = tokenize("tags: a, b,\nc\n", "t.spec");
        assert_eq!(tokens[0].kind, TokenKind::Tag);
        assert_eq!(tokens[0].args, ["a", "b"]);
        assert_eq!(tokens[1].kind, TokenKind::Tag);
        assert_eq!(tokens[1].args, ["c"]);
    }

    #[test]
    fn table_header_then_rows() {
        let (tokens, _) = tokenize("|id|name|\n|----|----|\n|1|ada|\n", "t.spec");
        assert_eq!(tokens[0].kind, TokenKind::TableHeader);
        assert_eq!(tokens[0].args, ["id", "name"]);
        assert_eq!(tokens[1].kind, TokenKind::TableRow);
        assert_eq!(tokens[2].args, ["1", "ada"]);
    }

    #[test]
    fn escaped_pipe_in_cell() {
        assert_eq!(split_cells(r"|a\|b|c|"), ["a|b", "c"]);
    }

    #[test]
    fn data_table_and_tear_down() {
        let (tokens, _) = tokenize("Table: users.csv\n___\n", "t.spec");
        assert_eq!(tokens[0].kind, TokenKind::DataTable);
        assert_eq!(tokens[0].value, "users.csv");
        assert_eq!(tokens[1].kind, TokenKind::TearDown);
    }

    #[test]
    fn multiline_step_when_enabled() {
        let config = ParserConfig {
            allow_multiline_step: true,
            ..ParserConfig::default()
        };
        let (tokens, errors) = tokenize_with(&config, "* say \"hello\nworld\"\n", "t.spec");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].args, ["hello world"]);
        assert_eq!(tokens[0].span.end, 2);
    }

    #[test]
    fn multiline_step_disabled_by_default() {
        assert_eq!(
            kinds("* first\nsecond\n"),
            vec![TokenKind::Step, TokenKind::Comment]
        );
    }

    #[test]
    fn bom_is_ignored() {
        assert_eq!(kinds("\u{FEFF}# Spec"), vec![TokenKind::Spec]);
    }
}
