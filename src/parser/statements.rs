//! Locating `main` and splitting its body into raw statements
//!
//! The tracer never builds an AST. It finds the body of `main` in the token
//! stream and cuts it into flat statements at `;`, `{` and `}`. A brace that
//! directly follows `=` opens an array initializer and stays inside the
//! statement. Scanning stops at the brace that closes `main`, or at the end of
//! the input when that brace is missing.

use super::lexer::{Token, TokenKind};

/// One statement of `main`'s body, ready for the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    /// 1-based line of the statement's first token
    pub line: usize,
    /// 1-based column of the statement's first token
    pub column: usize,
    /// Original source text, without the terminating `;`
    pub text: String,
    pub tokens: Vec<TokenKind>,
}

/// Index of the first token inside `main`'s body, if a definition exists.
///
/// Accepts `int main(...) {` and `void main(...) {`; prototypes such as
/// `int main(void);` are skipped.
pub fn find_main_body(tokens: &[Token]) -> Option<usize> {
    let mut i = 0;

    while i + 2 < tokens.len() {
        let is_main_header = matches!(tokens[i].kind, TokenKind::Int | TokenKind::Void)
            && matches!(&tokens[i + 1].kind, TokenKind::Ident(name) if name == "main")
            && tokens[i + 2].kind == TokenKind::LParen;

        if is_main_header {
            let close = matching_close(tokens, i + 2, &TokenKind::LParen, &TokenKind::RParen)?;
            if tokens.get(close + 1).map(|t| &t.kind) == Some(&TokenKind::LBrace) {
                return Some(close + 2);
            }
            i = close + 1;
        } else {
            i += 1;
        }
    }

    None
}

/// Split `main`'s body into statements. Returns `None` when there is no `main`.
pub fn main_body(source: &str, tokens: &[Token]) -> Option<Vec<RawStatement>> {
    let start = find_main_body(tokens)?;
    Some(split_statements(source, &tokens[start..]))
}

/// Split a body token run (starting just after the opening brace) into
/// statements, stopping at the matching closing brace.
pub fn split_statements(source: &str, body: &[Token]) -> Vec<RawStatement> {
    let mut statements = Vec::new();
    let mut current: Vec<&Token> = Vec::new();
    let mut depth = 1usize;
    let mut i = 0;

    while i < body.len() {
        let token = &body[i];

        match token.kind {
            TokenKind::LBrace if current.last().is_some_and(|t| t.kind == TokenKind::Eq) => {
                // Array initializer: keep the whole `{ ... }` in this statement
                let close = matching_close(body, i, &TokenKind::LBrace, &TokenKind::RBrace)
                    .unwrap_or(body.len() - 1);
                current.extend(&body[i..=close]);
                i = close;
            }
            TokenKind::LBrace => {
                flush(source, &mut current, &mut statements);
                depth += 1;
            }
            TokenKind::RBrace => {
                flush(source, &mut current, &mut statements);
                depth -= 1;
                if depth == 0 {
                    return statements;
                }
            }
            TokenKind::Semicolon => flush(source, &mut current, &mut statements),
            _ => current.push(token),
        }

        i += 1;
    }

    flush(source, &mut current, &mut statements);
    statements
}

fn flush(source: &str, current: &mut Vec<&Token>, statements: &mut Vec<RawStatement>) {
    let (Some(first), Some(last)) = (current.first(), current.last()) else {
        return;
    };

    let text = source
        .get(first.span.start..last.span.end)
        .unwrap_or_default()
        .to_string();

    statements.push(RawStatement {
        line: first.location.line,
        column: first.location.column,
        text,
        tokens: current.iter().map(|t| t.kind.clone()).collect(),
    });
    current.clear();
}

/// Index of the token closing the bracket opened at `open_index`.
fn matching_close(
    tokens: &[Token],
    open_index: usize,
    open: &TokenKind,
    close: &TokenKind,
) -> Option<usize> {
    let mut depth = 0usize;

    for (offset, token) in tokens[open_index..].iter().enumerate() {
        if &token.kind == open {
            depth += 1;
        } else if &token.kind == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(open_index + offset);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn body(source: &str) -> Option<Vec<RawStatement>> {
        main_body(source, &tokenize(source))
    }

    fn texts(source: &str) -> Vec<String> {
        body(source)
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    #[test]
    fn test_multiline_main() {
        let source = "#include <stdio.h>\n\nint main() {\n    int x = 5;\n    x = 6;\n    return 0;\n}\n";
        let statements = body(source).unwrap();

        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].line, 4);
        assert_eq!(statements[0].text, "int x = 5");
        assert_eq!(statements[1].line, 5);
        assert_eq!(statements[1].column, 5);
        assert_eq!(statements[2].text, "return 0");
    }

    #[test]
    fn test_single_line_main() {
        assert_eq!(
            texts("int main(){ int x = 5; int *p = &x; *p = 20; return 0; }"),
            vec!["int x = 5", "int *p = &x", "*p = 20", "return 0"]
        );
    }

    #[test]
    fn test_preamble_is_skipped() {
        let source = "int g = 3;\nint helper(int a) { a = 2; return a; }\nint main(void) { int y; }";
        assert_eq!(texts(source), vec!["int y"]);
    }

    #[test]
    fn test_prototype_is_not_the_body() {
        let source = "int main(void);\nint main(void) {\n  int z = 1;\n}";
        assert_eq!(texts(source), vec!["int z = 1"]);
    }

    #[test]
    fn test_void_main_and_brace_on_next_line() {
        assert_eq!(texts("void main()\n{\n  int a;\n}"), vec!["int a"]);
    }

    #[test]
    fn test_array_initializer_stays_in_statement() {
        let statements = body("int main() { int arr[3] = {1, 2, 3}; arr[0] = 4; }").unwrap();

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].text, "int arr[3] = {1, 2, 3}");
        assert_eq!((statements[1].line, statements[1].column), (1, 38));
        assert_eq!(statements[0].tokens.last(), Some(&TokenKind::RBrace));
    }

    #[test]
    fn test_nested_blocks_split_but_scan_continues() {
        let source = "int main() {\n  int x = 1;\n  if (x) {\n    x = 2;\n  }\n  x = 3;\n}";
        assert_eq!(texts(source), vec!["int x = 1", "if (x)", "x = 2", "x = 3"]);
    }

    #[test]
    fn test_scan_stops_at_closing_brace_of_main() {
        let source = "int main() { int x = 1; }\nint after() { int y = 2; }";
        assert_eq!(texts(source), vec!["int x = 1"]);
    }

    #[test]
    fn test_missing_main() {
        assert!(body("int helper() { return 1; }").is_none());
        assert!(body("").is_none());
    }

    #[test]
    fn test_unterminated_main_runs_to_end_of_input() {
        assert_eq!(texts("int main() {\n int x = 1;\n x = 2"), vec!["int x = 1", "x = 2"]);
    }
}
