//! Line classification and argument splitting.
//!
//! Every input line is one of three things:
//!
//! ```text
//! \\name            alias invocation   ──▶ redispatch the alias text
//! \KEYWORD args...  shell command      ──▶ CommandRegistry
//! anything else     statement          ──▶ QueryBackend ──▶ envelope
//! ```

use crate::aliases::ALIAS_SIGIL;
use crate::error::{ShellError, ShellResult};

/// A classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Nothing to run.
    Empty,
    /// `\\name`: run the alias text.
    Alias(&'a str),
    /// `\KEYWORD rest`: a shell command. The keyword is lowercased.
    Command { keyword: String, rest: &'a str },
    /// A statement for the query service.
    Statement(&'a str),
}

/// Classify a line, dropping surrounding whitespace and trailing `;`.
pub fn classify(line: &str) -> Line<'_> {
    let line = strip_terminator(line);
    if line.is_empty() {
        return Line::Empty;
    }

    if let Some(name) = line.strip_prefix(ALIAS_SIGIL) {
        return Line::Alias(name.trim());
    }

    if line.starts_with('\\') {
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };
        return Line::Command {
            keyword: keyword.to_lowercase(),
            rest,
        };
    }

    Line::Statement(line)
}

/// Trim whitespace and any trailing `;` terminators.
pub fn strip_terminator(line: &str) -> &str {
    line.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Split command arguments.
///
/// Runs of whitespace separate arguments. With `quoted` set, double quotes
/// group words into one argument and stay part of it, so `"a b"` reaches the
/// command as `"a b"`; `\"` is a literal quote. Quotes must balance.
pub fn split_args(rest: &str, quoted: bool) -> ShellResult<Vec<String>> {
    if !quoted {
        return Ok(rest.split_whitespace().map(str::to_string).collect());
    }

    let total = rest.matches('"').count();
    let escaped = rest.matches("\\\"").count();
    if total % 2 != 0 || escaped % 2 != 0 {
        return Err(ShellError::UnbalancedQuote);
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = rest.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                current.push(c);
                if let Some(quote) = chars.next() {
                    current.push(quote);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(ShellError::UnbalancedQuote);
    }
    if !current.is_empty() {
        args.push(current);
    }
    Ok(args)
}

/// Split a script into `;`-terminated units.
///
/// Semicolons inside single, double or back quotes do not split. Text after
/// the last `;` is kept as a final unit. Blank units are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (None, '\'' | '"' | '`') => {
                quote = Some(c);
                current.push(c);
            }
            (None, ';') => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Line::Empty)]
    #[case("  ;  ", Line::Empty)]
    #[case("\\\\foo;", Line::Alias("foo"))]
    #[case("select 1;", Line::Statement("select 1"))]
    #[case("  SELECT  *  FROM b ", Line::Statement("SELECT  *  FROM b"))]
    fn test_classify(#[case] input: &str, #[case] expected: Line) {
        assert_eq!(classify(input), expected);
    }

    #[test]
    fn test_classify_command_lowercases_keyword_only() {
        assert_eq!(
            classify("\\SET   -$Name   Value ;"),
            Line::Command { keyword: "\\set".to_string(), rest: "-$Name   Value" }
        );
        assert_eq!(
            classify("\\EXIT"),
            Line::Command { keyword: "\\exit".to_string(), rest: "" }
        );
    }

    #[test]
    fn test_plain_split_collapses_whitespace() {
        assert_eq!(split_args("a   b\tc", false).unwrap(), vec!["a", "b", "c"]);
        assert!(split_args("   ", false).unwrap().is_empty());
    }

    #[test]
    fn test_quoted_split_groups_words() {
        assert_eq!(
            split_args("$x \"hello   world\" 3", true).unwrap(),
            vec!["$x", "\"hello   world\"", "3"]
        );
    }

    #[test]
    fn test_quoted_split_keeps_escaped_quotes() {
        assert_eq!(
            split_args(r#""say \"hi\"" x"#, true).unwrap(),
            vec![r#""say \"hi\"""#, "x"]
        );
    }

    #[rstest]
    #[case("\"open")]
    #[case("a \"b\" \"c")]
    #[case(r#""a \" b""#)]
    fn test_unbalanced_quotes(#[case] input: &str) {
        assert!(matches!(split_args(input, true), Err(ShellError::UnbalancedQuote)));
    }

    #[test]
    fn test_unbalanced_quotes_ignored_without_quoting() {
        assert_eq!(split_args("\"open", false).unwrap(), vec!["\"open"]);
    }

    #[test]
    fn test_split_statements() {
        let script = "\\SET -$r 1;\nselect ';' as semi;\n\nselect \"a;b\"; \\ECHO -$r";
        assert_eq!(
            split_statements(script),
            vec!["\\SET -$r 1", "select ';' as semi", "select \"a;b\"", "\\ECHO -$r"]
        );
    }

    #[test]
    fn test_split_statements_escaped_quote() {
        assert_eq!(split_statements(r#"select "a\";b"; x"#), vec![r#"select "a\";b""#, "x"]);
    }
}
