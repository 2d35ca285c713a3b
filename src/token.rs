use serde::Serialize;

/// Inclusive range of source lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// A span covering a single line.
    #[must_use]
    pub const fn line(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// Specification heading (`# ...` or `===` underline).
    Spec,
    /// Scenario heading (`## ...` or `----` underline).
    Scenario,
    /// Free text.
    Comment,
    /// Step (`* ...`).
    Step,
    /// Tag line (`tags: a, b`).
    Tag,
    /// First row of a table.
    TableHeader,
    /// Any following table row, separator rows included.
    TableRow,
    /// External data table reference (`table: path`).
    DataTable,
    /// Tear-down marker (`___`).
    TearDown,
}

/// A single classified line (or group of lines) of specification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub lines: Vec<String>,
    pub args: Vec<String>,
    pub span: Span,
    pub suffix: Option<String>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, value: impl Into<String>, line: &str, line_no: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            lines: vec![line.to_string()],
            args: Vec::new(),
            span: Span::line(line_no),
            suffix: None,
        }
    }

    /// The raw source text, multi-line tokens joined by a single space.
    #[must_use]
    pub fn line_text(&self) -> String {
        self.lines.join(" ")
    }
}
