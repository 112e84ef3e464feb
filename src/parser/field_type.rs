//! Field-type grammar (spec §4.F, "Field type parsing"): generator calls,
//! schema references, collections, ranges, nullable suffix, and ordered
//! sequences. Expression-typed fields (`= expr`) are recognized by the
//! caller in [`super::parse_field`] before this module is ever reached.

use crate::ast::{Cardinality, Expr, FieldType, PrimitiveKind};
use crate::error::{LoomError, LoomResult};
use crate::token::TokenKind;

use super::expr::parse_superposition_option;
use super::TokenCursor;

pub fn parse_field_type(cur: &mut TokenCursor) -> LoomResult<FieldType> {
    let base = parse_field_type_base(cur)?;
    if cur.matches(&TokenKind::Question) {
        Ok(FieldType::Nullable(Box::new(base)))
    } else {
        Ok(base)
    }
}

fn parse_field_type_base(cur: &mut TokenCursor) -> LoomResult<FieldType> {
    // A weight prefix (`number ':'`) is an unambiguous superposition lead —
    // checked before `starts_cardinality` since an integer weight (`1:a|2:b`)
    // would otherwise be mistaken for a cardinality.
    if is_weight_prefixed(cur) {
        return parse_field_type_superposition(cur);
    }
    if starts_cardinality(cur) {
        return parse_collection(cur);
    }
    match cur.peek_token_kind().clone() {
        TokenKind::LBracket => parse_ordered_sequence(cur),
        TokenKind::Identifier(name) => parse_named_type(cur, name),
        // Unweighted superposition options (`"paid"|"draft"`) or a bare
        // literal field type — both route through the same option grammar
        // as the weighted case (spec §3, `Superposition{options:[{weight?,value}]}`).
        TokenKind::Str(_) | TokenKind::Decimal(_) | TokenKind::True | TokenKind::False | TokenKind::Null => {
            parse_field_type_superposition(cur)
        }
        other => Err(LoomError::UnexpectedToken {
            span: cur.current_span(),
            found: other.to_string(),
            expected: "a field type".to_string(),
        }),
    }
}

fn starts_cardinality(cur: &mut TokenCursor) -> bool {
    matches!(cur.peek_token_kind(), TokenKind::Int(_) | TokenKind::LParen)
}

fn is_weight_prefixed(cur: &mut TokenCursor) -> bool {
    matches!(cur.peek_token_kind(), TokenKind::Int(_) | TokenKind::Decimal(_))
        && matches!(cur.peek_at(1).kind, TokenKind::Colon)
}

/// `weight:value | weight:value | …` in field-type position, the same
/// option grammar `expr::parse_superposition`'s tier uses in expression
/// position — reused via [`parse_superposition_option`] since each option's
/// value is itself an ordinary expression. A single unweighted option with
/// no following `|` is not a superposition at all; it's an expression-typed
/// field (a bare literal default value).
fn parse_field_type_superposition(cur: &mut TokenCursor) -> LoomResult<FieldType> {
    let first = parse_superposition_option(cur)?;
    if !cur.check_pipe() {
        return Ok(match first.weight {
            None => FieldType::ExpressionType(Box::new(first.value)),
            Some(_) => FieldType::Superposition { options: vec![first] },
        });
    }
    let mut options = vec![first];
    while cur.matches_pipe() {
        options.push(parse_superposition_option(cur)?);
    }
    Ok(FieldType::Superposition { options })
}

pub fn parse_cardinality(cur: &mut TokenCursor) -> LoomResult<Cardinality> {
    if cur.matches(&TokenKind::LParen) {
        let expr = super::expr::parse_expr(cur)?;
        cur.expect(&TokenKind::RParen, "')'")?;
        return Ok(Cardinality::Dynamic(Box::new(expr)));
    }
    let min = parse_int_literal(cur)?;
    if cur.matches(&TokenKind::DotDot) {
        let max = parse_int_literal(cur)?;
        Ok(Cardinality::Static { min, max })
    } else {
        Ok(Cardinality::exact(min))
    }
}

fn parse_int_literal(cur: &mut TokenCursor) -> LoomResult<i64> {
    match cur.peek_token_kind().clone() {
        TokenKind::Int(n) => {
            cur.advance();
            Ok(n)
        }
        other => Err(LoomError::UnexpectedToken {
            span: cur.current_span(),
            found: other.to_string(),
            expected: "an integer cardinality".to_string(),
        }),
    }
}

fn parse_collection(cur: &mut TokenCursor) -> LoomResult<FieldType> {
    let cardinality = parse_cardinality(cur)?;
    if !cur.matches(&TokenKind::Star) {
        cur.expect(&TokenKind::Of, "'*' or 'of'")?;
    }
    let element = parse_field_type(cur)?;
    Ok(FieldType::Collection {
        cardinality,
        element: Box::new(element),
    })
}

fn parse_ordered_sequence(cur: &mut TokenCursor) -> LoomResult<FieldType> {
    cur.advance(); // '['
    let mut elements = Vec::new();
    if !cur.check(&TokenKind::RBracket) {
        loop {
            elements.push(super::expr::parse_expr(cur)?);
            if !cur.matches(&TokenKind::Comma) {
                break;
            }
        }
    }
    cur.expect(&TokenKind::RBracket, "']'")?;
    Ok(FieldType::OrderedSequenceType(elements))
}

fn parse_named_type(cur: &mut TokenCursor, name: String) -> LoomResult<FieldType> {
    cur.advance(); // identifier
    let primitive = PrimitiveKind::from_name(&name);

    if cur.matches(&TokenKind::LParen) {
        if let Some(kind) = primitive {
            let precision = if !cur.check(&TokenKind::RParen) {
                Some(parse_int_literal(cur)? as u32)
            } else {
                None
            };
            cur.expect(&TokenKind::RParen, "')'")?;
            return Ok(FieldType::Primitive { kind, precision });
        }
        let mut args = Vec::new();
        if !cur.check(&TokenKind::RParen) {
            loop {
                args.push(super::expr::parse_expr(cur)?);
                if !cur.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        cur.expect(&TokenKind::RParen, "')'")?;
        return Ok(FieldType::Generator { name, args });
    }

    if let Some(kind) = primitive {
        if cur.matches(&TokenKind::In) {
            let (min, max) = parse_range_bounds(cur)?;
            return Ok(FieldType::Range { base: kind, min, max });
        }
        return Ok(FieldType::Primitive { kind, precision: None });
    }

    let mut path = vec![name];
    while cur.peek_is_dot_identifier() {
        cur.advance(); // '.'
        path.push(cur.expect_identifier()?);
    }
    if path.len() == 1 {
        Ok(FieldType::SchemaRef(path.into_iter().next().unwrap()))
    } else {
        Ok(FieldType::Reference { path })
    }
}

/// Parses `min..max` after the `in` keyword. The expression parser already
/// produces a `Range` node for bare `a..b`, so the common case is a single
/// `parse_expr` call; this falls back to treating a bare expression with no
/// `..` as an open-ended upper-bound-only range (`in min..` is not legal
/// source, so in practice this path is only hit on malformed input and the
/// caller's later evaluation will reject a non-range result).
fn parse_range_bounds(cur: &mut TokenCursor) -> LoomResult<(Option<Box<Expr>>, Option<Box<Expr>>)> {
    let expr = super::expr::parse_expr(cur)?;
    match expr {
        Expr::Range { min, max } => Ok((min, max)),
        other => Ok((Some(Box::new(other)), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::plugin::PluginRegistry;

    fn field_type_of(src: &str) -> FieldType {
        let registry = PluginRegistry::new();
        let tokens = lex(src, &registry).unwrap();
        let mut cur = TokenCursor::new(tokens);
        parse_field_type(&mut cur).unwrap()
    }

    #[test]
    fn parses_primitive_range() {
        let ft = field_type_of("decimal in 1..1000");
        assert!(matches!(ft, FieldType::Range { base: PrimitiveKind::Decimal, .. }));
    }

    #[test]
    fn parses_collection_with_star() {
        let ft = field_type_of("3 * Address");
        assert!(matches!(ft, FieldType::Collection { .. }));
    }

    #[test]
    fn parses_nullable_schema_ref() {
        let ft = field_type_of("Address?");
        assert!(matches!(ft, FieldType::Nullable(_)));
    }

    #[test]
    fn parses_generator_call() {
        let ft = field_type_of("faker.company()");
        match ft {
            FieldType::Generator { name, args } => {
                assert_eq!(name, "faker.company");
                assert!(args.is_empty());
            }
            other => panic!("expected Generator, got {other:?}"),
        }
    }

    #[test]
    fn parses_decimal_weighted_superposition() {
        let ft = field_type_of(r#"0.7:"paid"|0.3:"draft""#);
        match ft {
            FieldType::Superposition { options } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].weight, Some(0.7));
                assert_eq!(options[1].weight, Some(0.3));
            }
            other => panic!("expected Superposition, got {other:?}"),
        }
    }

    #[test]
    fn parses_integer_weighted_superposition() {
        let ft = field_type_of("1:a|2:b");
        match ft {
            FieldType::Superposition { options } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].weight, Some(1.0));
                assert_eq!(options[1].weight, Some(2.0));
            }
            other => panic!("expected Superposition, got {other:?}"),
        }
    }

    #[test]
    fn parses_unweighted_superposition() {
        let ft = field_type_of(r#""paid"|"draft""#);
        match ft {
            FieldType::Superposition { options } => {
                assert_eq!(options.len(), 2);
                assert!(options.iter().all(|o| o.weight.is_none()));
            }
            other => panic!("expected Superposition, got {other:?}"),
        }
    }
}
