//! # Parser (spec §4.F)
//!
//! Token stream → [`crate::ast::Program`]. The statement parser is a classic
//! recursive-descent walk; the expression parser (in [`expr`]) is
//! precedence-climbing (Pratt-style). Field-type parsing lives in
//! [`field_type`] since it has its own small grammar (generator calls,
//! schema references, collections, ranges, nullability).
//!
//! Newlines are filtered out of the cursor at construction time — the lexer
//! preserves them for diagnostics, but the statement grammar here treats
//! statement separators as "newline, comma, or semicolon, zero or more,"
//! which is simplest to implement by just skipping blank lines.

mod expr;
mod field_type;

use crate::ast::*;
use crate::error::{LoomError, LoomResult, Span};
use crate::plugin::PluginRegistry;
use crate::token::{Token, TokenKind};

/// Parses a complete token stream (as produced by [`crate::lexer::lex`]) into
/// a [`Program`].
pub fn parse(tokens: Vec<Token>, registry: &PluginRegistry) -> LoomResult<Program> {
    let mut cursor = TokenCursor::new(tokens);
    let mut program = Program::new();
    cursor.skip_separators();
    while !cursor.at_eof() {
        let stmt = parse_statement(&mut cursor, registry)?;
        program.statements.push(stmt);
        cursor.skip_separators();
    }
    Ok(program)
}

/// A mutable position into a token stream, shared by the statement and
/// expression parsers. Exposed (not private) so that plugin statement-parser
/// hooks (spec §4.C) can consume tokens using the same cursor the core
/// parser uses.
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    fn new(tokens: Vec<Token>) -> Self {
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Newline))
            .collect();
        TokenCursor { tokens, pos: 0 }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Comma) {
            self.pos += 1;
        }
    }

    pub fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream always has EOF"))
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().expect("token stream always has EOF"))
    }

    pub fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        Span::new(self.peek().line, self.peek().column)
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !tok.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: &TokenKind, expected: &str) -> LoomResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(LoomError::ExpectedToken {
                span: self.span(),
                expected: expected.to_string(),
            })
        }
    }

    fn expect_identifier(&mut self) -> LoomResult<String> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(LoomError::UnexpectedToken {
                span: self.span(),
                found: other.to_string(),
                expected: "identifier".to_string(),
            }),
        }
    }

    fn unexpected(&self, expected: &str) -> LoomError {
        LoomError::UnexpectedToken {
            span: self.span(),
            found: self.peek_kind().to_string(),
            expected: expected.to_string(),
        }
    }

    // -- helpers shared with expr.rs / field_type.rs --

    fn peek_token_kind(&self) -> &TokenKind {
        self.peek_kind()
    }

    fn current_span(&self) -> Span {
        self.span()
    }

    fn check_pipe(&self) -> bool {
        self.check(&TokenKind::Pipe)
    }

    fn matches_pipe(&mut self) -> bool {
        self.matches(&TokenKind::Pipe)
    }

    fn check_rbracket(&self) -> bool {
        self.check(&TokenKind::RBracket)
    }

    fn expect_rbracket(&mut self) -> LoomResult<Token> {
        self.expect(&TokenKind::RBracket, "']'")
    }

    fn skip_commas(&mut self) {
        self.skip_separators();
    }

    /// A weighted superposition option is `number ':' value`; this is only a
    /// weight when a colon directly follows the numeric literal, since a
    /// bare number is also a legal unweighted option value.
    fn try_parse_weight(&mut self) -> Option<f64> {
        let weight = match self.peek_kind().clone() {
            TokenKind::Int(n) if matches!(self.peek_at(1).kind, TokenKind::Colon) => n as f64,
            TokenKind::Decimal(n) if matches!(self.peek_at(1).kind, TokenKind::Colon) => n,
            _ => return None,
        };
        self.advance(); // number
        self.advance(); // ':'
        Some(weight)
    }

    /// Consumes a following identifier only if its lexeme matches `word`
    /// (used for soft/contextual keywords like `where` that aren't part of
    /// the closed keyword set).
    fn matches_identifier_lexeme(&mut self, word: &str) -> bool {
        if matches!(self.peek_kind(), TokenKind::Identifier(s) if s == word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_is_dot_identifier(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Dot)
            && matches!(self.peek_at(1).kind, TokenKind::Identifier(_))
    }
}

fn parse_statement(cur: &mut TokenCursor, registry: &PluginRegistry) -> LoomResult<Statement> {
    if let Some(parser) = registry.statement_parser_for(&cur.peek().lexeme) {
        return parser(cur);
    }
    match cur.peek_kind() {
        TokenKind::Let => parse_let(cur),
        TokenKind::Import => parse_import(cur),
        TokenKind::Schema => parse_schema(cur).map(Statement::Schema),
        TokenKind::Context => parse_context(cur).map(Statement::Context),
        TokenKind::Distribution => parse_distribution(cur).map(Statement::Distribution),
        TokenKind::Contract => parse_contract(cur).map(Statement::Contract),
        TokenKind::Dataset => parse_dataset(cur).map(Statement::Dataset),
        _ => Err(cur.unexpected("a top-level statement")),
    }
}

fn parse_let(cur: &mut TokenCursor) -> LoomResult<Statement> {
    cur.advance(); // let
    let name = cur.expect_identifier()?;
    cur.expect(&TokenKind::Eq, "'='")?;
    let expr = expr::parse_expr(cur)?;
    Ok(Statement::Let { name, expr })
}

fn parse_import(cur: &mut TokenCursor) -> LoomResult<Statement> {
    cur.advance(); // import
    let name = cur.expect_identifier()?;
    cur.expect(&TokenKind::From, "'from'")?;
    let path = match cur.peek_kind().clone() {
        TokenKind::Str(s) => {
            cur.advance();
            s
        }
        _ => return Err(cur.unexpected("a string path")),
    };
    Ok(Statement::Import { name, path })
}

fn parse_qualified_name(cur: &mut TokenCursor) -> LoomResult<Vec<String>> {
    let mut parts = vec![cur.expect_identifier()?];
    while cur.matches(&TokenKind::Dot) {
        parts.push(cur.expect_identifier()?);
    }
    Ok(parts)
}

fn parse_schema(cur: &mut TokenCursor) -> LoomResult<SchemaDefinition> {
    cur.advance(); // schema
    let name = cur.expect_identifier()?;
    let mut schema = SchemaDefinition {
        name,
        ..Default::default()
    };

    if cur.matches(&TokenKind::From) {
        schema.base = Some(cur.expect_identifier()?);
    }
    if cur.matches(&TokenKind::Implements) {
        loop {
            schema.contracts.push(cur.expect_identifier()?);
            if !cur.matches(&TokenKind::Comma) {
                break;
            }
        }
    }
    while cur.matches(&TokenKind::With) {
        schema.contexts.push(parse_context_application(cur)?);
        cur.matches(&TokenKind::Comma);
    }

    cur.expect(&TokenKind::LBrace, "'{'")?;
    cur.skip_separators();
    while !cur.check(&TokenKind::RBrace) {
        match cur.peek_kind() {
            TokenKind::Assume => schema.assumes.push(parse_assume(cur)?),
            TokenKind::Invariant => schema.invariants.push(parse_inline_invariant(cur)?),
            TokenKind::Refine => schema.refine_block.push(parse_refine(cur)?),
            TokenKind::Then => schema.then_block.extend(parse_then(cur)?),
            _ => schema.fields.push(parse_field(cur)?),
        }
        cur.skip_separators();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(schema)
}

fn parse_context_application(cur: &mut TokenCursor) -> LoomResult<ContextApplication> {
    let name = cur.expect_identifier()?;
    let mut args = Vec::new();
    if cur.matches(&TokenKind::LParen) {
        if !cur.check(&TokenKind::RParen) {
            loop {
                args.push(expr::parse_expr(cur)?);
                if !cur.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        cur.expect(&TokenKind::RParen, "')'")?;
    }
    Ok(ContextApplication { name, args })
}

fn parse_assume(cur: &mut TokenCursor) -> LoomResult<AssumeClause> {
    cur.advance(); // assume
    let condition = if cur.matches(&TokenKind::If) {
        Some(expr::parse_expr(cur)?)
    } else {
        None
    };
    let constraints = if cur.matches(&TokenKind::LBrace) {
        let mut cs = Vec::new();
        cur.skip_separators();
        while !cur.check(&TokenKind::RBrace) {
            cs.push(expr::parse_expr(cur)?);
            cur.skip_separators();
        }
        cur.expect(&TokenKind::RBrace, "'}'")?;
        cs
    } else {
        vec![expr::parse_expr(cur)?]
    };
    Ok(AssumeClause { condition, constraints })
}

fn parse_inline_invariant(cur: &mut TokenCursor) -> LoomResult<InlineInvariant> {
    cur.advance(); // invariant
    let condition = if cur.matches(&TokenKind::If) {
        Some(expr::parse_expr(cur)?)
    } else {
        None
    };
    let constraints = if cur.matches(&TokenKind::LBrace) {
        let mut cs = Vec::new();
        cur.skip_separators();
        while !cur.check(&TokenKind::RBrace) {
            cs.push(expr::parse_expr(cur)?);
            cur.skip_separators();
        }
        cur.expect(&TokenKind::RBrace, "'}'")?;
        cs
    } else {
        vec![expr::parse_expr(cur)?]
    };
    let message = match cur.peek_kind().clone() {
        TokenKind::Str(s) => {
            cur.advance();
            Some(s)
        }
        _ => None,
    };
    Ok(InlineInvariant { condition, constraints, message })
}

fn parse_refine(cur: &mut TokenCursor) -> LoomResult<RefineClause> {
    cur.advance(); // refine
    let condition = if cur.matches(&TokenKind::If) {
        Some(expr::parse_expr(cur)?)
    } else {
        None
    };
    cur.expect(&TokenKind::LBrace, "'{'")?;
    let mut fields = Vec::new();
    cur.skip_separators();
    while !cur.check(&TokenKind::RBrace) {
        fields.push(cur.expect_identifier()?);
        cur.skip_separators();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(RefineClause { condition, fields })
}

fn parse_then(cur: &mut TokenCursor) -> LoomResult<Vec<Mutation>> {
    cur.advance(); // then
    cur.expect(&TokenKind::LBrace, "'{'")?;
    let mut mutations = Vec::new();
    cur.skip_separators();
    while !cur.check(&TokenKind::RBrace) {
        let target = parse_qualified_name(cur)?;
        let op = if cur.matches(&TokenKind::Eq) {
            MutationOp::Assign
        } else if let TokenKind::Plus = cur.peek_kind() {
            // '+=' is lexed as Plus then Eq since '+' has no two-char form.
            cur.advance();
            cur.expect(&TokenKind::Eq, "'='")?;
            MutationOp::AddAssign
        } else {
            return Err(cur.unexpected("'=' or '+='"));
        };
        let value = expr::parse_expr(cur)?;
        mutations.push(Mutation { target, op, value });
        cur.skip_separators();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(mutations)
}

fn parse_field(cur: &mut TokenCursor) -> LoomResult<FieldDefinition> {
    let mut unique = false;
    let mut private = false;
    let mut optional = false;
    loop {
        match cur.peek_kind() {
            TokenKind::Unique => {
                unique = true;
                cur.advance();
            }
            TokenKind::Private => {
                private = true;
                cur.advance();
            }
            TokenKind::Optional => {
                optional = true;
                cur.advance();
            }
            _ => break,
        }
    }
    let name = cur.expect_identifier()?;
    cur.expect(&TokenKind::Colon, "':'")?;

    let (field_type, computed, distribution) = if cur.matches(&TokenKind::Eq) {
        let e = expr::parse_expr(cur)?;
        (FieldType::ExpressionType(Box::new(e.clone())), true, Some(e))
    } else {
        (field_type::parse_field_type(cur)?, false, None)
    };

    let condition = if cur.matches(&TokenKind::If) {
        Some(expr::parse_expr(cur)?)
    } else {
        None
    };

    Ok(FieldDefinition {
        name,
        field_type,
        optional,
        unique,
        private,
        computed,
        condition,
        distribution,
    })
}

fn parse_contract(cur: &mut TokenCursor) -> LoomResult<ContractDefinition> {
    cur.advance(); // contract
    let name = cur.expect_identifier()?;
    cur.expect(&TokenKind::LBrace, "'{'")?;
    let mut invariants = Vec::new();
    cur.skip_separators();
    while !cur.check(&TokenKind::RBrace) {
        invariants.push(parse_inline_invariant(cur)?);
        cur.skip_separators();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(ContractDefinition { name, invariants })
}

fn parse_context(cur: &mut TokenCursor) -> LoomResult<ContextDefinition> {
    cur.advance(); // context
    let name = cur.expect_identifier()?;
    cur.expect(&TokenKind::LBrace, "'{'")?;
    let mut affects = Vec::new();
    cur.skip_separators();
    while !cur.check(&TokenKind::RBrace) {
        // `affects field => value`
        if matches!(cur.peek_kind(), TokenKind::Identifier(s) if s == "affects") {
            cur.advance();
        }
        let field = cur.expect_identifier()?;
        cur.expect(&TokenKind::FatArrow, "'=>'")?;
        let value = expr::parse_expr(cur)?;
        affects.push((field, value));
        cur.skip_separators();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(ContextDefinition { name, affects })
}

fn parse_distribution(cur: &mut TokenCursor) -> LoomResult<DistributionDefinition> {
    cur.advance(); // distribution
    let name = cur.expect_identifier()?;
    cur.expect(&TokenKind::LBrace, "'{'")?;
    let mut entries = Vec::new();
    cur.skip_separators();
    while !cur.check(&TokenKind::RBrace) {
        let key = expr::parse_expr(cur)?;
        cur.expect(&TokenKind::Colon, "':'")?;
        let pct = parse_percent(cur)?;
        entries.push((key, pct));
        cur.skip_separators();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(DistributionDefinition { name, entries })
}

fn parse_percent(cur: &mut TokenCursor) -> LoomResult<f64> {
    let value = match cur.peek_kind().clone() {
        TokenKind::Decimal(v) => {
            cur.advance();
            v
        }
        TokenKind::Int(v) => {
            cur.advance();
            v as f64
        }
        _ => return Err(cur.unexpected("a numeric percentage")),
    };
    Ok(value)
}

fn parse_dataset(cur: &mut TokenCursor) -> LoomResult<DatasetDefinition> {
    cur.advance(); // dataset
    let name = cur.expect_identifier()?;
    let mut contexts = Vec::new();
    while cur.matches(&TokenKind::With) {
        contexts.push(cur.expect_identifier()?);
        cur.matches(&TokenKind::Comma);
    }
    let violating = cur.matches(&TokenKind::Violating);

    cur.expect(&TokenKind::LBrace, "'{'")?;
    let mut collections = Vec::new();
    let mut validation = Vec::new();
    cur.skip_separators();
    while !cur.check(&TokenKind::RBrace) {
        if matches!(cur.peek_kind(), TokenKind::Identifier(s) if s == "validate") {
            cur.advance();
            cur.expect(&TokenKind::LBrace, "'{'")?;
            cur.skip_separators();
            while !cur.check(&TokenKind::RBrace) {
                validation.push(expr::parse_expr(cur)?);
                cur.skip_separators();
            }
            cur.expect(&TokenKind::RBrace, "'}'")?;
        } else {
            collections.push(parse_collection_entry(cur)?);
        }
        cur.skip_separators();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(DatasetDefinition {
        name,
        collections,
        contexts,
        validation,
        violating,
    })
}

fn parse_collection_entry(cur: &mut TokenCursor) -> LoomResult<CollectionEntry> {
    let name = cur.expect_identifier()?;
    cur.expect(&TokenKind::Colon, "':'")?;
    let cardinality = field_type::parse_cardinality(cur)?;
    let per_parent = if cur.matches(&TokenKind::Per) {
        Some(cur.expect_identifier()?)
    } else {
        None
    };
    cur.expect(&TokenKind::Star, "'*'")?;
    let schema_ref = cur.expect_identifier()?;
    Ok(CollectionEntry {
        name,
        cardinality,
        schema_ref,
        per_parent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Program {
        let registry = PluginRegistry::new();
        let tokens = lex(src, &registry).expect("lex");
        parse(tokens, &registry).expect("parse")
    }

    #[test]
    fn parses_simple_schema_and_dataset() {
        let program = parse_src(
            r#"
            schema Invoice { amount: decimal in 1..1000, status: 0.7:"paid"|0.3:"draft" }
            dataset T { invoices: 50 * Invoice }
            "#,
        );
        assert_eq!(program.schemas().count(), 1);
        assert_eq!(program.datasets().count(), 1);
        let schema = program.schemas().next().unwrap();
        assert_eq!(schema.name, "Invoice");
        assert_eq!(schema.fields.len(), 2);
    }

    #[test]
    fn parses_assume_and_contract() {
        let program = parse_src(
            r#"
            contract P { invariant due > 0 }
            schema I implements P { issued: int in 1..20, due: int in 1..30, assume due >= issued }
            dataset T violating { items: 50 * I }
            "#,
        );
        let schema = program.schemas().next().unwrap();
        assert_eq!(schema.contracts, vec!["P".to_string()]);
        assert_eq!(schema.assumes.len(), 1);
        let dataset = program.datasets().next().unwrap();
        assert!(dataset.violating);
    }

    #[test]
    fn parses_computed_field() {
        let program = parse_src("schema O { q: int in 1..5, p: int in 1..10, total: = q * p }");
        let schema = program.schemas().next().unwrap();
        let total = schema.fields.iter().find(|f| f.name == "total").unwrap();
        assert!(total.computed);
    }

    #[test]
    fn parses_per_parent_cardinality() {
        let program = parse_src(
            r#"
            schema C { id: unique int in 1..100 }
            schema I { parent_id: = ^c.id, n: int in 1..3 }
            dataset T { c: 4 * C, i: 2..3 per c * I }
            "#,
        );
        let dataset = program.datasets().next().unwrap();
        let i = dataset.collections.iter().find(|c| c.name == "i").unwrap();
        assert_eq!(i.per_parent.as_deref(), Some("c"));
    }

    #[test]
    fn unexpected_token_is_an_error() {
        let registry = PluginRegistry::new();
        let tokens = lex("schema", &registry).unwrap();
        let err = parse(tokens, &registry).unwrap_err();
        assert!(matches!(err, LoomError::UnexpectedToken { .. } | LoomError::ExpectedToken { .. }));
    }
}
