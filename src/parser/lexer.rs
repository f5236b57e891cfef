//! Lexer (tokenizer) for traced C source
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! statement splitter. The lexer never fails: characters it does not know
//! become [`TokenKind::Unknown`], and unterminated literals or comments simply
//! run to the end of the line or input. Statements containing such tokens do
//! not match any recognized shape and are skipped downstream.
//!
//! `#include` and other preprocessor directives are skipped, as are `//` and
//! `/* */` comments.

use std::ops::Range;

/// A position in the source text (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Token variants produced by the lexer.
///
/// Only the keywords the recognizer cares about get their own variant; every
/// other word (including `if`, `while`, `char`) is an [`TokenKind::Ident`] and
/// falls through the recognizer untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A numeric word exactly as written (`42`, `0x1f`, `3.5`, `12abc`).
    /// Validation happens in the recognizer so malformed literals become
    /// non-matches rather than lexer errors.
    Number(String),
    CharLiteral(String),
    StringLiteral(String),
    Ident(String),

    // Keywords
    Int,
    Void,
    Return,
    Sizeof,

    // Punctuation used by statement shapes
    Star,      // *
    Amp,       // &
    Eq,        // =
    Minus,     // -
    Comma,     // ,
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;

    /// Any other operator (`+`, `==`, `+=`, `->`, `++`, ...).
    Operator(String),

    /// A character outside the C subset (`@`, `$`, a stray backtick, ...).
    Unknown(char),
}

/// A token with its location and byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    pub span: Range<usize>,
}

/// Two-character operators, longest match first.
const COMPOUND_OPERATORS: [&str; 16] = [
    "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "->", "<<",
    ">>",
];

/// Lexer for C source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    byte_offset: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            byte_offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            match self.peek() {
                None => break,
                Some('#') => self.skip_to_line_end(),
                Some(_) => tokens.push(self.next_token()),
            }
        }

        tokens
    }

    fn next_token(&mut self) -> Token {
        let location = self.current_location();
        let start = self.byte_offset;

        let kind = match self.advance() {
            Some('"') => self.quoted_literal('"'),
            Some('\'') => self.quoted_literal('\''),
            Some(ch) if ch.is_ascii_digit() => self.number(ch),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.identifier_or_keyword(ch),
            Some(ch) => self.punctuation(ch),
            None => TokenKind::Unknown('\0'),
        };

        Token {
            kind,
            location,
            span: start..self.byte_offset,
        }
    }

    fn punctuation(&mut self, ch: char) -> TokenKind {
        if let Some(next) = self.peek() {
            let pair: String = [ch, next].iter().collect();
            if COMPOUND_OPERATORS.contains(&pair.as_str()) {
                self.advance();
                return TokenKind::Operator(pair);
            }
        }

        match ch {
            '*' => TokenKind::Star,
            '&' => TokenKind::Amp,
            '=' => TokenKind::Eq,
            '-' => TokenKind::Minus,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            '+' | '/' | '%' | '<' | '>' | '!' | '^' | '~' | '|' | '.' | '?' | ':' => {
                TokenKind::Operator(ch.to_string())
            }
            other => TokenKind::Unknown(other),
        }
    }

    /// String or char literal body. Escapes are kept verbatim; an unterminated
    /// literal stops at the end of the line.
    fn quoted_literal(&mut self, quote: char) -> TokenKind {
        let mut body = String::new();

        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
            if ch == quote {
                break;
            }
            body.push(ch);
            if ch == '\\' {
                if let Some(escaped) = self.peek().filter(|c| *c != '\n') {
                    self.advance();
                    body.push(escaped);
                }
            }
        }

        if quote == '"' {
            TokenKind::StringLiteral(body)
        } else {
            TokenKind::CharLiteral(body)
        }
    }

    /// Numeric word: a digit followed by any run of alphanumerics, `_` or `.`
    fn number(&mut self, first_digit: char) -> TokenKind {
        let mut text = String::new();
        text.push(first_digit);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::Number(text)
    }

    fn identifier_or_keyword(&mut self, first_char: char) -> TokenKind {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "int" => TokenKind::Int,
            "void" => TokenKind::Void,
            "return" => TokenKind::Return,
            "sizeof" => TokenKind::Sizeof,
            _ => TokenKind::Ident(ident),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => self.skip_to_line_end(),
                Some('/') if self.peek_ahead(1) == Some('*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    /// Skips a `//` comment or a preprocessor line, leaving the newline.
    fn skip_to_line_end(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skips `/* ... */`; an unterminated comment swallows the rest of the input.
    fn skip_block_comment(&mut self) {
        self.advance(); // '/'
        self.advance(); // '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        self.byte_offset += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("int main() { return 0; }");

        assert_eq!(
            tokens,
            vec![
                TokenKind::Int,
                TokenKind::Ident("main".to_string()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Number("0".to_string()),
                TokenKind::Semicolon,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn test_pointer_spellings_tokenize_alike() {
        assert_eq!(kinds("int *p"), kinds("int* p"));
        assert_eq!(kinds("int * p"), kinds("int*p"));
    }

    #[test]
    fn test_compound_operators() {
        let tokens = kinds("x += 1; y == 2; p->q; i++");

        assert!(tokens.contains(&TokenKind::Operator("+=".to_string())));
        assert!(tokens.contains(&TokenKind::Operator("==".to_string())));
        assert!(tokens.contains(&TokenKind::Operator("->".to_string())));
        assert!(tokens.contains(&TokenKind::Operator("++".to_string())));
    }

    #[test]
    fn test_negative_assignment_without_spaces() {
        assert_eq!(
            kinds("x=-5"),
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Eq,
                TokenKind::Minus,
                TokenKind::Number("5".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_and_preprocessor_skipped() {
        let tokens = kinds("#include <stdio.h>\nint x; // c\nint y; /* block\ncomment */ int z;");

        assert_eq!(
            tokens
                .iter()
                .filter(|t| matches!(t, TokenKind::Ident(_)))
                .count(),
            3
        );
        assert!(!tokens.iter().any(|t| matches!(t, TokenKind::Unknown(_))));
    }

    #[test]
    fn test_malformed_number_kept_whole() {
        assert_eq!(kinds("12abc"), vec![TokenKind::Number("12abc".to_string())]);
        assert_eq!(kinds("3.5"), vec![TokenKind::Number("3.5".to_string())]);
    }

    #[test]
    fn test_string_literal_with_escapes() {
        let tokens = kinds(r#"printf("%d\n", x);"#);
        assert_eq!(tokens[2], TokenKind::StringLiteral(r"%d\n".to_string()));
        assert_eq!(tokens[3], TokenKind::Comma);
    }

    #[test]
    fn test_unknown_characters_do_not_abort() {
        let tokens = kinds("int @x = 1;");
        assert!(tokens.contains(&TokenKind::Unknown('@')));
        assert_eq!(tokens.last(), Some(&TokenKind::Semicolon));
    }

    #[test]
    fn test_unterminated_string_stops_at_line_end() {
        let tokens = kinds("printf(\"oops\nint x;");
        assert!(tokens.contains(&TokenKind::Int));
    }

    #[test]
    fn test_locations_and_spans() {
        let source = "int x;\n  x = 7;";
        let tokens = tokenize(source);
        let seven = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Number("7".to_string()))
            .unwrap();

        assert_eq!(seven.location, SourceLocation::new(2, 7));
        assert_eq!(&source[seven.span.clone()], "7");
    }
}
