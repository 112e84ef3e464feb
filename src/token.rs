//! Token model for the Loom DSL lexer.
//!
//! Every token knows its source position so the parser and evaluator can
//! produce caret-pointer diagnostics without re-scanning the source.

use std::fmt;

/// Classification of a single token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Decimal(f64),
    Str(String),
    Identifier(String),

    // Keywords
    Schema,
    Dataset,
    Contract,
    Context,
    Distribution,
    Let,
    Import,
    From,
    With,
    Of,
    Per,
    In,
    As,
    If,
    Else,
    And,
    Or,
    Not,
    Match,
    Any,
    Unique,
    Private,
    Optional,
    Assume,
    Invariant,
    Implements,
    Refine,
    Then,
    Violating,
    True,
    False,
    Null,
    Return,

    // Punctuation / operators
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    DotDot,
    Pipe,
    Question,
    Eq,
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    FatArrow,
    At,

    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{n}"),
            TokenKind::Decimal(n) => write!(f, "{n}"),
            TokenKind::Str(s) => write!(f, "{s:?}"),
            TokenKind::Identifier(s) => write!(f, "{s}"),
            TokenKind::Newline => write!(f, "<newline>"),
            TokenKind::Eof => write!(f, "<eof>"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// The closed keyword set, used by the lexer and by plugin keyword hooks.
pub const KEYWORDS: &[(&str, fn() -> TokenKind)] = &[
    ("schema", || TokenKind::Schema),
    ("dataset", || TokenKind::Dataset),
    ("contract", || TokenKind::Contract),
    ("context", || TokenKind::Context),
    ("distribution", || TokenKind::Distribution),
    ("let", || TokenKind::Let),
    ("import", || TokenKind::Import),
    ("from", || TokenKind::From),
    ("with", || TokenKind::With),
    ("of", || TokenKind::Of),
    ("per", || TokenKind::Per),
    ("in", || TokenKind::In),
    ("as", || TokenKind::As),
    ("if", || TokenKind::If),
    ("else", || TokenKind::Else),
    ("and", || TokenKind::And),
    ("or", || TokenKind::Or),
    ("not", || TokenKind::Not),
    ("match", || TokenKind::Match),
    ("any", || TokenKind::Any),
    ("unique", || TokenKind::Unique),
    ("private", || TokenKind::Private),
    ("optional", || TokenKind::Optional),
    ("assume", || TokenKind::Assume),
    ("invariant", || TokenKind::Invariant),
    ("implements", || TokenKind::Implements),
    ("refine", || TokenKind::Refine),
    ("then", || TokenKind::Then),
    ("violating", || TokenKind::Violating),
    ("true", || TokenKind::True),
    ("false", || TokenKind::False),
    ("null", || TokenKind::Null),
    ("return", || TokenKind::Return),
];

/// Looks up a bare identifier against the closed keyword set, falling back to
/// a plugin-registered keyword table (see [`crate::plugin::PluginRegistry`]).
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(name, _)| *name == ident)
        .map(|(_, ctor)| ctor())
}

/// A single lexed token, with the line/column of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.kind, self.line, self.column)
    }
}
