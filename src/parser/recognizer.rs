//! Statement shape recognition
//!
//! Each raw statement is classified into at most one [`Statement`] by trying a
//! fixed table of matchers, most specific first. The first matcher that
//! accepts the whole token run wins; a statement nobody accepts is skipped.
//!
//! Only decimal integer literals (optionally negated) are accepted as values.
//! Expressions, other function calls and control-flow keywords never match.
//!
//! `name[i] = v` is ambiguous on its own: it is an array element write when
//! `name` is a known array and a heap write through a pointer otherwise, so
//! matchers can consult a [`SymbolTable`].

use super::lexer::TokenKind;

/// Function names treated as output statements
pub const OUTPUT_CALLS: [&str; 3] = ["printf", "puts", "putchar"];

/// What kind of stack entity a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Scalar,
    Pointer,
    Array,
}

/// Read-only view of the names declared so far.
pub trait SymbolTable {
    fn symbol_kind(&self, name: &str) -> Option<SymbolKind>;
}

/// Requested size of a `malloc` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocSize {
    /// `malloc(20)`
    Bytes(usize),
    /// `malloc(sizeof(int) * 5)`, `malloc(5 * sizeof(int))`, `malloc(sizeof(int))`
    Ints(usize),
    /// Anything else; the tracer substitutes its configured default
    Unknown,
}

/// A recognized statement shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `int name[N]` or `int name[N] = {v0, v1, ...}`
    ArrayDecl {
        name: String,
        len: usize,
        init: Option<Vec<i32>>,
    },
    /// `name[i] = v` where `name` is a known array
    ArrayElementAssign { name: String, index: i64, value: i32 },
    /// `int *name = malloc(...)`
    Malloc { name: String, size: AllocSize },
    /// `free(name)`
    Free { name: String },
    /// `int name` or `int name = v`
    ScalarDecl { name: String, init: Option<i32> },
    /// `int *name = &target`
    AddressOf { name: String, target: String },
    /// `*name = v`
    DerefAssign { name: String, value: i32 },
    /// `name[i] = v` where `name` is not a known array
    PointerIndexAssign { name: String, index: i64, value: i32 },
    /// `name = v`
    Assign { name: String, value: i32 },
    /// Any call to one of [`OUTPUT_CALLS`]
    Output { callee: String },
}

impl Statement {
    /// Short shape name for logs
    pub fn shape(&self) -> &'static str {
        match self {
            Statement::ArrayDecl { init: Some(_), .. } => "array declaration with initializer",
            Statement::ArrayDecl { init: None, .. } => "array declaration",
            Statement::ArrayElementAssign { .. } => "array element assignment",
            Statement::Malloc { .. } => "allocation",
            Statement::Free { .. } => "deallocation",
            Statement::ScalarDecl { init: Some(_), .. } => "scalar initialization",
            Statement::ScalarDecl { init: None, .. } => "scalar declaration",
            Statement::AddressOf { .. } => "pointer declaration",
            Statement::DerefAssign { .. } => "dereference assignment",
            Statement::PointerIndexAssign { .. } => "pointer index assignment",
            Statement::Assign { .. } => "assignment",
            Statement::Output { .. } => "output",
        }
    }
}

type Matcher = fn(&[TokenKind], &dyn SymbolTable) -> Option<Statement>;

/// Matchers in priority order
const MATCHERS: [Matcher; 12] = [
    array_decl_with_init,
    array_decl,
    array_element_assign,
    malloc_decl,
    free_call,
    scalar_decl_with_init,
    scalar_decl,
    address_of_decl,
    deref_assign,
    pointer_index_assign,
    assign,
    output_call,
];

/// Classify one statement, or `None` if it has no recognized shape.
pub fn recognize(tokens: &[TokenKind], symbols: &dyn SymbolTable) -> Option<Statement> {
    MATCHERS.iter().find_map(|matcher| matcher(tokens, symbols))
}

/// `return ...` ends the trace; it is checked before any shape.
pub fn is_return(tokens: &[TokenKind]) -> bool {
    tokens.first() == Some(&TokenKind::Return)
}

fn array_decl_with_init(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Int, TokenKind::Ident(name), TokenKind::LBracket, TokenKind::Number(len), TokenKind::RBracket, TokenKind::Eq, TokenKind::LBrace, values @ .., TokenKind::RBrace] => {
            Some(Statement::ArrayDecl {
                name: name.clone(),
                len: parse_length(len)?,
                init: Some(initializer_list(values)?),
            })
        }
        _ => None,
    }
}

fn array_decl(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Int, TokenKind::Ident(name), TokenKind::LBracket, TokenKind::Number(len), TokenKind::RBracket] => {
            Some(Statement::ArrayDecl {
                name: name.clone(),
                len: parse_length(len)?,
                init: None,
            })
        }
        _ => None,
    }
}

fn array_element_assign(tokens: &[TokenKind], symbols: &dyn SymbolTable) -> Option<Statement> {
    let (name, index, value) = indexed_assignment(tokens)?;
    if symbols.symbol_kind(name) != Some(SymbolKind::Array) {
        return None;
    }
    Some(Statement::ArrayElementAssign {
        name: name.to_string(),
        index,
        value,
    })
}

fn malloc_decl(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    let [TokenKind::Int, TokenKind::Star, TokenKind::Ident(name), TokenKind::Eq, rest @ ..] = tokens
    else {
        return None;
    };

    // Optional `(int *)` cast
    let call = match rest {
        [TokenKind::LParen, TokenKind::Int, TokenKind::Star, TokenKind::RParen, call @ ..] => call,
        call => call,
    };

    match call {
        [TokenKind::Ident(callee), TokenKind::LParen, args @ .., TokenKind::RParen]
            if callee == "malloc" =>
        {
            Some(Statement::Malloc {
                name: name.clone(),
                size: alloc_size(args),
            })
        }
        _ => None,
    }
}

fn free_call(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Ident(callee), TokenKind::LParen, TokenKind::Ident(name), TokenKind::RParen]
            if callee == "free" =>
        {
            Some(Statement::Free { name: name.clone() })
        }
        _ => None,
    }
}

fn scalar_decl_with_init(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Int, TokenKind::Ident(name), TokenKind::Eq, value @ ..] => {
            Some(Statement::ScalarDecl {
                name: name.clone(),
                init: Some(int_value(value)?),
            })
        }
        _ => None,
    }
}

fn scalar_decl(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Int, TokenKind::Ident(name)] => Some(Statement::ScalarDecl {
            name: name.clone(),
            init: None,
        }),
        _ => None,
    }
}

fn address_of_decl(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Int, TokenKind::Star, TokenKind::Ident(name), TokenKind::Eq, TokenKind::Amp, TokenKind::Ident(target)] => {
            Some(Statement::AddressOf {
                name: name.clone(),
                target: target.clone(),
            })
        }
        _ => None,
    }
}

fn deref_assign(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Star, TokenKind::Ident(name), TokenKind::Eq, value @ ..] => {
            Some(Statement::DerefAssign {
                name: name.clone(),
                value: int_value(value)?,
            })
        }
        _ => None,
    }
}

fn pointer_index_assign(tokens: &[TokenKind], symbols: &dyn SymbolTable) -> Option<Statement> {
    let (name, index, value) = indexed_assignment(tokens)?;
    if symbols.symbol_kind(name) == Some(SymbolKind::Array) {
        return None;
    }
    Some(Statement::PointerIndexAssign {
        name: name.to_string(),
        index,
        value,
    })
}

fn assign(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    match tokens {
        [TokenKind::Ident(name), TokenKind::Eq, value @ ..] => Some(Statement::Assign {
            name: name.clone(),
            value: int_value(value)?,
        }),
        _ => None,
    }
}

fn output_call(tokens: &[TokenKind], _: &dyn SymbolTable) -> Option<Statement> {
    tokens.windows(2).find_map(|pair| match pair {
        [TokenKind::Ident(callee), TokenKind::LParen] if OUTPUT_CALLS.contains(&callee.as_str()) => {
            Some(Statement::Output {
                callee: callee.clone(),
            })
        }
        _ => None,
    })
}

/// `name [ index ] = value`
fn indexed_assignment(tokens: &[TokenKind]) -> Option<(&str, i64, i32)> {
    let [TokenKind::Ident(name), TokenKind::LBracket, rest @ ..] = tokens else {
        return None;
    };

    let close = rest.iter().position(|t| *t == TokenKind::RBracket)?;
    let index = index_value(&rest[..close])?;

    match &rest[close + 1..] {
        [TokenKind::Eq, value @ ..] => Some((name.as_str(), index, int_value(value)?)),
        _ => None,
    }
}

fn alloc_size(args: &[TokenKind]) -> AllocSize {
    let sized = match args {
        [TokenKind::Sizeof, TokenKind::LParen, TokenKind::Int, TokenKind::RParen] => Some(AllocSize::Ints(1)),
        [TokenKind::Sizeof, TokenKind::LParen, TokenKind::Int, TokenKind::RParen, TokenKind::Star, TokenKind::Number(count)]
        | [TokenKind::Number(count), TokenKind::Star, TokenKind::Sizeof, TokenKind::LParen, TokenKind::Int, TokenKind::RParen] => {
            parse_count(count).map(AllocSize::Ints)
        }
        [TokenKind::Number(bytes)] => parse_count(bytes).map(AllocSize::Bytes),
        _ => None,
    };

    sized.unwrap_or(AllocSize::Unknown)
}

/// Comma-separated integer literals, trailing comma allowed, empty list allowed.
fn initializer_list(tokens: &[TokenKind]) -> Option<Vec<i32>> {
    let tokens = tokens.strip_suffix(&[TokenKind::Comma]).unwrap_or(tokens);
    if tokens.is_empty() {
        return Some(Vec::new());
    }

    tokens
        .split(|t| *t == TokenKind::Comma)
        .map(int_value)
        .collect()
}

/// An optionally negated decimal literal that fits `i32`
fn int_value(tokens: &[TokenKind]) -> Option<i32> {
    let value = signed_decimal(tokens)?;
    i32::try_from(value).ok()
}

fn index_value(tokens: &[TokenKind]) -> Option<i64> {
    signed_decimal(tokens)
}

fn signed_decimal(tokens: &[TokenKind]) -> Option<i64> {
    match tokens {
        [TokenKind::Number(text)] => parse_decimal(text),
        [TokenKind::Minus, TokenKind::Number(text)] => parse_decimal(text).map(|v| -v),
        _ => None,
    }
}

/// Plain decimal digits only: no hex, octal-looking leading zeros, suffixes or
/// fractions.
pub fn parse_decimal(text: &str) -> Option<i64> {
    let is_decimal = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'));

    if is_decimal {
        text.parse().ok()
    } else {
        None
    }
}

fn parse_count(text: &str) -> Option<usize> {
    parse_decimal(text).and_then(|v| usize::try_from(v).ok())
}

fn parse_length(text: &str) -> Option<usize> {
    parse_count(text).filter(|len| *len > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;
    use rustc_hash::FxHashMap;

    #[derive(Default)]
    struct Symbols(FxHashMap<String, SymbolKind>);

    impl Symbols {
        fn with(mut self, name: &str, kind: SymbolKind) -> Self {
            self.0.insert(name.to_string(), kind);
            self
        }
    }

    impl SymbolTable for Symbols {
        fn symbol_kind(&self, name: &str) -> Option<SymbolKind> {
            self.0.get(name).copied()
        }
    }

    fn classify_with(source: &str, symbols: &Symbols) -> Option<Statement> {
        let tokens: Vec<TokenKind> = tokenize(source).into_iter().map(|t| t.kind).collect();
        recognize(&tokens, symbols)
    }

    fn classify(source: &str) -> Option<Statement> {
        classify_with(source, &Symbols::default())
    }

    #[test]
    fn test_array_declarations() {
        assert_eq!(
            classify("int arr[5] = {1, -2, 3}"),
            Some(Statement::ArrayDecl {
                name: "arr".to_string(),
                len: 5,
                init: Some(vec![1, -2, 3]),
            })
        );
        assert_eq!(
            classify("int arr[4]"),
            Some(Statement::ArrayDecl {
                name: "arr".to_string(),
                len: 4,
                init: None,
            })
        );
        assert_eq!(
            classify("int arr[2] = {}"),
            Some(Statement::ArrayDecl {
                name: "arr".to_string(),
                len: 2,
                init: Some(vec![]),
            })
        );
        assert_eq!(
            classify("int arr[2] = {7,}").and_then(|s| match s {
                Statement::ArrayDecl { init, .. } => init,
                _ => None,
            }),
            Some(vec![7])
        );
    }

    #[test]
    fn test_array_declaration_rejects_bad_sizes_and_values() {
        assert_eq!(classify("int arr[0]"), None);
        assert_eq!(classify("int arr[n]"), None);
        assert_eq!(classify("int arr[3] = {1, x, 3}"), None);
        assert_eq!(classify("int arr[3] = {1 + 1}"), None);
    }

    #[test]
    fn test_indexed_write_depends_on_symbol_kind() {
        let arrays = Symbols::default().with("a", SymbolKind::Array);
        let pointers = Symbols::default().with("a", SymbolKind::Pointer);

        assert_eq!(
            classify_with("a[1] = 9", &arrays),
            Some(Statement::ArrayElementAssign {
                name: "a".to_string(),
                index: 1,
                value: 9,
            })
        );
        assert_eq!(
            classify_with("a[1] = 9", &pointers),
            Some(Statement::PointerIndexAssign {
                name: "a".to_string(),
                index: 1,
                value: 9,
            })
        );
        assert!(matches!(
            classify("a[-1] = 9"),
            Some(Statement::PointerIndexAssign { index: -1, .. })
        ));
    }

    #[test]
    fn test_malloc_size_forms() {
        let size_of = |src: &str| match classify(src) {
            Some(Statement::Malloc { size, .. }) => Some(size),
            _ => None,
        };

        assert_eq!(size_of("int *p = malloc(sizeof(int) * 5)"), Some(AllocSize::Ints(5)));
        assert_eq!(size_of("int *p = malloc(3 * sizeof(int))"), Some(AllocSize::Ints(3)));
        assert_eq!(size_of("int *p = (int *)malloc(sizeof(int))"), Some(AllocSize::Ints(1)));
        assert_eq!(size_of("int* p = malloc(12)"), Some(AllocSize::Bytes(12)));
        assert_eq!(size_of("int *p = malloc(n * 4)"), Some(AllocSize::Unknown));
        assert_eq!(size_of("int *p = calloc(4, 4)"), None);
    }

    #[test]
    fn test_free() {
        assert_eq!(
            classify("free(p)"),
            Some(Statement::Free {
                name: "p".to_string()
            })
        );
        assert_eq!(classify("free(p + 1)"), None);
    }

    #[test]
    fn test_scalar_declarations() {
        assert_eq!(
            classify("int x = -42"),
            Some(Statement::ScalarDecl {
                name: "x".to_string(),
                init: Some(-42),
            })
        );
        assert_eq!(
            classify("int x"),
            Some(Statement::ScalarDecl {
                name: "x".to_string(),
                init: None,
            })
        );
    }

    #[test]
    fn test_literal_rules() {
        assert_eq!(classify("int x = 5 + 3"), None);
        assert_eq!(classify("int x = y"), None);
        assert_eq!(classify("int x = 0x10"), None);
        assert_eq!(classify("int x = 010"), None);
        assert_eq!(classify("int x = 3.5"), None);
        assert_eq!(classify("int x = 2147483648"), None);
        assert!(classify("int x = -2147483648").is_some());
        assert!(classify("int x = 0").is_some());
    }

    #[test]
    fn test_pointer_statements() {
        assert_eq!(
            classify("int *p = &x"),
            Some(Statement::AddressOf {
                name: "p".to_string(),
                target: "x".to_string(),
            })
        );
        assert_eq!(
            classify("*p = 20"),
            Some(Statement::DerefAssign {
                name: "p".to_string(),
                value: 20,
            })
        );
        assert_eq!(classify("*p = *q"), None);
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            classify("x = 7"),
            Some(Statement::Assign {
                name: "x".to_string(),
                value: 7,
            })
        );
        assert_eq!(classify("x = x + 1"), None);
        assert_eq!(classify("x += 1"), None);
    }

    #[test]
    fn test_output_calls() {
        assert_eq!(
            classify(r#"printf("%d\n", x)"#),
            Some(Statement::Output {
                callee: "printf".to_string()
            })
        );
        assert!(matches!(classify("puts(\"hi\")"), Some(Statement::Output { .. })));
        // The keyword inside a string literal is not a call
        assert_eq!(classify(r#"x = "printf(""#), None);
    }

    #[test]
    fn test_control_flow_is_ignored() {
        assert_eq!(classify("if (x > 0)"), None);
        assert_eq!(classify("while (1)"), None);
        assert_eq!(classify("for (i = 0"), None);
    }

    #[test]
    fn test_return_detection() {
        let tokens: Vec<TokenKind> = tokenize("return 0").into_iter().map(|t| t.kind).collect();
        assert!(is_return(&tokens));
        assert!(!is_return(&[TokenKind::Ident("returned".to_string())]));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("0"), Some(0));
        assert_eq!(parse_decimal("123"), Some(123));
        assert_eq!(parse_decimal("0123"), None);
        assert_eq!(parse_decimal("12u"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("99999999999999999999999"), None);
    }
}
