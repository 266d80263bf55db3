//! Comment filtering for run-file text.

/// Marker that turns a run-file line into a comment.
pub const COMMENT_MARKER: &str = "--";

/// A non-comment run-file line with its 1-based physical line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLine<'a> {
    /// 1-based line number in the run file.
    pub number: usize,
    /// Raw line text without the line terminator.
    pub text: &'a str,
}

/// Lazily yield every line of `text` that is not a comment.
///
/// A line is a comment iff it starts with `--`; leading whitespace is not
/// stripped, so `  -- note` is a (malformed) directive.  Blank lines are kept
/// so that they surface as parse errors rather than being silently dropped.
pub fn run_lines(text: &str) -> impl Iterator<Item = RunLine<'_>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.starts_with(COMMENT_MARKER))
        .map(|(idx, line)| RunLine {
            number: idx + 1,
            text: line,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        run_lines(input).map(|l| l.text).collect()
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(
            texts("SQL: SELECT 1\n-- comment\nSQL: SELECT 2\n"),
            vec!["SQL: SELECT 1", "SQL: SELECT 2"]
        );
    }

    #[test]
    fn line_numbers_count_comments() {
        let lines: Vec<usize> = run_lines("-- header\n--\nSQL: SELECT 1")
            .map(|l| l.number)
            .collect();
        assert_eq!(lines, vec![3]);
    }

    #[test]
    fn blank_lines_are_preserved() {
        assert_eq!(texts("SQL: SELECT 1\n\nSQL: SELECT 2"), vec!["SQL: SELECT 1", "", "SQL: SELECT 2"]);
    }

    #[test]
    fn indented_marker_is_not_a_comment() {
        assert_eq!(texts("  -- not a comment"), vec!["  -- not a comment"]);
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        assert_eq!(texts("SQL: SELECT 1\r\n-- c\r\n"), vec!["SQL: SELECT 1"]);
    }

    #[test]
    fn single_dash_is_not_a_comment() {
        assert_eq!(texts("- SQL: x"), vec!["- SQL: x"]);
    }
}
