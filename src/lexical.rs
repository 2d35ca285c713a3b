//! Stateless text helpers shared by the lexer, converters and formatter.

/// Markdown front matter delimiter. Excluded from underline detection so a
/// YAML header is not taken for a table separator or scenario underline.
const FRONT_MATTER_DELIMITER: &str = "---";

/// True if `text` is non-empty and made only of `ch`.
///
/// Exactly `---` never counts. This also means a table written with
/// three-dash column separators (`|---|---|`) has its separator row read as
/// data.
#[must_use]
pub fn is_underline(text: &str, ch: char) -> bool {
    if text.is_empty() || text == FRONT_MATTER_DELIMITER {
        return false;
    }
    text.chars().all(|c| c == ch)
}

/// True for a table header separator cell such as `----`.
#[must_use]
pub fn is_table_separator_line(text: &str) -> bool {
    is_underline(text, '-')
}

/// True if the row has at least one non-empty cell and every non-empty
/// cell is a separator.
#[must_use]
pub fn all_cells_are_separators<S: AsRef<str>>(cells: &[S]) -> bool {
    let mut non_empty = cells.iter().map(AsRef::as_ref).filter(|c| !c.is_empty());
    let Some(first) = non_empty.next() else {
        return false;
    };
    is_table_separator_line(first) && non_empty.all(is_table_separator_line)
}

/// Escape control characters, quotes and backslashes so the text can be
/// embedded on a single line. The surrounding quotes are not included.
#[must_use]
pub fn unescape(raw: &str) -> String {
    let quoted = format!("{raw:?}");
    quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(&quoted)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("----", true)]
    #[case("--------------", true)]
    #[case("---", false)]
    #[case("--", true)]
    #[case("-", true)]
    #[case("", false)]
    #[case("--x-", false)]
    #[case("====", false)]
    fn separator_lines(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_table_separator_line(text), expected, "{text:?}");
    }

    #[test]
    fn underline_with_other_characters() {
        assert!(is_underline("====", '='));
        assert!(is_underline("___", '_'));
        assert!(!is_underline("==-=", '='));
    }

    #[test]
    fn cells_all_separators() {
        assert!(all_cells_are_separators(&["----", "-----"]));
        assert!(all_cells_are_separators(&["----", ""]));
    }

    #[test]
    fn cells_not_separators() {
        assert!(!all_cells_are_separators::<&str>(&[]));
        assert!(!all_cells_are_separators(&["", ""]));
        assert!(!all_cells_are_separators(&["----", "name"]));
        assert!(!all_cells_are_separators(&["---", "---"]));
    }

    #[test]
    fn unescape_newline_and_quote() {
        let out = unescape("say \"hi\"\nbye");
        assert_eq!(out, "say \\\"hi\\\"\\nbye");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn unescape_plain_text_is_unchanged() {
        assert_eq!(unescape("plain text"), "plain text");
    }

    #[test]
    fn unescape_tab_and_backslash() {
        assert_eq!(unescape("a\tb\\c"), "a\\tb\\\\c");
    }
}
