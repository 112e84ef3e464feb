//! # Lexer
//!
//! UTF-8 source text → token stream (spec §4.D). Newlines are emitted as
//! tokens; the parser filters them but the positions survive for
//! diagnostics. Identifiers accept Unicode letters, not just ASCII, per
//! spec §4.D's "a conformant implementation should accept Unicode letters."

use crate::error::{LoomError, LoomResult, Span};
use crate::plugin::PluginRegistry;
use crate::token::{lookup_keyword, Token, TokenKind};

/// Lexes a complete Loom source file into a token stream terminated by EOF.
///
/// `registry` supplies the optional plugin keyword table (component C):
/// plugin-registered keywords are tried after the closed built-in set, so a
/// plugin cannot shadow a language keyword.
pub fn lex(source: &str, registry: &PluginRegistry) -> LoomResult<Vec<Token>> {
    Lexer::new(source, registry).run()
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    registry: &'a PluginRegistry,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, registry: &'a PluginRegistry) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            registry,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> LoomResult<Vec<Token>> {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    self.tokens
                        .push(Token::new(TokenKind::Newline, "\n", line, column));
                }
                '/' if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment()?,
                '"' => self.lex_string()?,
                c if c.is_ascii_digit() => self.lex_number()?,
                c if is_identifier_start(c) => self.lex_identifier_or_keyword(),
                _ => self.lex_punctuation()?,
            }
        }
        let (line, column) = (self.line, self.column);
        self.tokens.push(Token::new(TokenKind::Eof, "", line, column));
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if let Some(c) = c {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> LoomResult<()> {
        let start = Span::new(self.line, self.column);
        self.advance(); // '/'
        self.advance(); // '*'
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                (None, _) => {
                    return Err(LoomError::UnterminatedString { span: start });
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn lex_string(&mut self) -> LoomResult<()> {
        let start = Span::new(self.line, self.column);
        let mut lexeme = String::new();
        lexeme.push(self.advance().expect("caller peeked '\"'"));
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(LoomError::UnterminatedString { span: start }),
                Some('"') => {
                    lexeme.push('"');
                    break;
                }
                Some('\\') => {
                    lexeme.push('\\');
                    match self.advance() {
                        Some('n') => {
                            value.push('\n');
                            lexeme.push('n');
                        }
                        Some('t') => {
                            value.push('\t');
                            lexeme.push('t');
                        }
                        Some('r') => {
                            value.push('\r');
                            lexeme.push('r');
                        }
                        Some('"') => {
                            value.push('"');
                            lexeme.push('"');
                        }
                        Some('\\') => {
                            value.push('\\');
                            lexeme.push('\\');
                        }
                        Some(other) => {
                            value.push(other);
                            lexeme.push(other);
                        }
                        None => return Err(LoomError::UnterminatedString { span: start }),
                    }
                }
                Some(c) => {
                    value.push(c);
                    lexeme.push(c);
                }
            }
        }
        self.tokens.push(Token::new(
            TokenKind::Str(value),
            lexeme,
            start.line,
            start.column,
        ));
        Ok(())
    }

    fn lex_number(&mut self) -> LoomResult<()> {
        let start = Span::new(self.line, self.column);
        let mut raw = String::new();
        let mut is_decimal = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    raw.push(c);
                }
                self.advance();
            } else if c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) && !is_decimal
            {
                is_decimal = true;
                raw.push('.');
                self.advance();
            } else {
                break;
            }
        }
        let lexeme = raw.clone();
        if is_decimal {
            let value: f64 = raw
                .parse()
                .map_err(|_| LoomError::InvalidNumber { span: start, text: lexeme.clone() })?;
            self.tokens
                .push(Token::new(TokenKind::Decimal(value), lexeme, start.line, start.column));
        } else {
            let value: i64 = raw
                .parse()
                .map_err(|_| LoomError::InvalidNumber { span: start, text: lexeme.clone() })?;
            self.tokens
                .push(Token::new(TokenKind::Int(value), lexeme, start.line, start.column));
        }
        Ok(())
    }

    fn lex_identifier_or_keyword(&mut self) {
        let start = Span::new(self.line, self.column);
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if is_identifier_continue(c) {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = lookup_keyword(&ident)
            .or_else(|| self.registry.lookup_keyword(&ident))
            .unwrap_or_else(|| TokenKind::Identifier(ident.clone()));
        self.tokens
            .push(Token::new(kind, ident, start.line, start.column));
    }

    fn lex_punctuation(&mut self) -> LoomResult<()> {
        let start = Span::new(self.line, self.column);
        let c = self.advance().expect("caller peeked a char");
        macro_rules! two_char {
            ($second:expr, $two:expr, $one:expr) => {{
                if self.peek() == Some($second) {
                    self.advance();
                    ($two, format!("{}{}", c, $second))
                } else {
                    ($one, c.to_string())
                }
            }};
        }
        let (kind, lexeme) = match c {
            '(' => (TokenKind::LParen, c.to_string()),
            ')' => (TokenKind::RParen, c.to_string()),
            '{' => (TokenKind::LBrace, c.to_string()),
            '}' => (TokenKind::RBrace, c.to_string()),
            '[' => (TokenKind::LBracket, c.to_string()),
            ']' => (TokenKind::RBracket, c.to_string()),
            ',' => (TokenKind::Comma, c.to_string()),
            ':' => (TokenKind::Colon, c.to_string()),
            '.' => two_char!('.', TokenKind::DotDot, TokenKind::Dot),
            '|' => (TokenKind::Pipe, c.to_string()),
            '?' => (TokenKind::Question, c.to_string()),
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    (TokenKind::EqEq, "==".to_string())
                } else if self.peek() == Some('>') {
                    self.advance();
                    (TokenKind::FatArrow, "=>".to_string())
                } else {
                    (TokenKind::Eq, c.to_string())
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    (TokenKind::NotEq, "!=".to_string())
                } else {
                    return Err(LoomError::UnknownCharacter { span: start, ch: c });
                }
            }
            '<' => two_char!('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => two_char!('=', TokenKind::GtEq, TokenKind::Gt),
            '+' => (TokenKind::Plus, c.to_string()),
            '-' => (TokenKind::Minus, c.to_string()),
            '*' => (TokenKind::Star, c.to_string()),
            '/' => (TokenKind::Slash, c.to_string()),
            '%' => (TokenKind::Percent, c.to_string()),
            '^' => (TokenKind::Caret, c.to_string()),
            '@' => (TokenKind::At, c.to_string()),
            other => return Err(LoomError::UnknownCharacter { span: start, ch: other }),
        };
        self.tokens
            .push(Token::new(kind, lexeme, start.line, start.column));
        Ok(())
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_ok(src: &str) -> Vec<Token> {
        lex(src, &PluginRegistry::new()).expect("lex")
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex_ok(src)
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Newline))
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let ks = kinds("schema Invoice { amount: decimal }");
        assert_eq!(
            ks,
            vec![
                TokenKind::Schema,
                TokenKind::Identifier("Invoice".into()),
                TokenKind::LBrace,
                TokenKind::Identifier("amount".into()),
                TokenKind::Colon,
                TokenKind::Identifier("decimal".into()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_number_with_underscore_separator() {
        let ks = kinds("1_000");
        assert_eq!(ks, vec![TokenKind::Int(1000), TokenKind::Eof]);
    }

    #[test]
    fn lexes_decimal() {
        let ks = kinds("3.14");
        assert_eq!(ks, vec![TokenKind::Decimal(3.14), TokenKind::Eof]);
    }

    #[test]
    fn lexes_range_dotdot_distinct_from_dot() {
        let ks = kinds("1..10");
        assert_eq!(
            ks,
            vec![TokenKind::Int(1), TokenKind::DotDot, TokenKind::Int(10), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_string_with_escapes() {
        let toks = lex_ok(r#""a\nb""#);
        assert_eq!(toks[0].kind, TokenKind::Str("a\nb".to_string()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex(r#""abc"#, &PluginRegistry::new()).unwrap_err();
        assert!(matches!(err, LoomError::UnterminatedString { .. }));
    }

    #[test]
    fn skips_line_and_block_comments() {
        let ks = kinds("1 // comment\n/* block */ 2");
        assert_eq!(ks, vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]);
    }

    #[test]
    fn tracks_line_and_column() {
        let toks = lex_ok("a\nb");
        let b = toks.iter().find(|t| t.lexeme == "b").unwrap();
        assert_eq!(b.line, 2);
        assert_eq!(b.column, 1);
    }

    #[test]
    fn newline_tokens_are_preserved() {
        let toks = lex_ok("a\nb");
        assert!(toks.iter().any(|t| matches!(t.kind, TokenKind::Newline)));
    }

    #[test]
    fn unicode_identifiers_are_accepted() {
        let ks = kinds("café");
        assert_eq!(ks, vec![TokenKind::Identifier("café".into()), TokenKind::Eof]);
    }

    #[test]
    fn unknown_character_is_an_error() {
        let err = lex("let x = 1 ~ 2", &PluginRegistry::new()).unwrap_err();
        assert!(matches!(err, LoomError::UnknownCharacter { ch: '~', .. }));
    }
}
