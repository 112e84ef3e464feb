//! Expression grammar (spec §4.F): precedence-climbing over the tiers
//! ternary → or → and → not → comparison → additive → multiplicative →
//! unary → postfix → primary, lowest to highest.

use crate::ast::{BinaryOp, Expr, LogicalOp, MatchArm, SuperpositionOption, UnaryOp};
use crate::error::{LoomError, LoomResult};
use crate::token::TokenKind;
use crate::value::Value;

use super::TokenCursor;

pub fn parse_expr(cur: &mut TokenCursor) -> LoomResult<Expr> {
    parse_superposition(cur)
}

/// `weight:value | weight:value | …`. A bare expression with no `|` is
/// returned unwrapped; one or more pipes builds a `Superposition`.
fn parse_superposition(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let first = parse_superposition_option(cur)?;
    if !cur.check_pipe() {
        return Ok(match first.weight {
            None => first.value,
            Some(_) => Expr::Superposition { options: vec![first] },
        });
    }
    let mut options = vec![first];
    while cur.matches_pipe() {
        options.push(parse_superposition_option(cur)?);
    }
    Ok(Expr::Superposition { options })
}

/// Reused by [`super::field_type`] to parse the same `weight:value` option
/// grammar in field-type position (`status: 0.7:"paid"|0.3:"draft"`).
pub(super) fn parse_superposition_option(cur: &mut TokenCursor) -> LoomResult<SuperpositionOption> {
    let weight = cur.try_parse_weight();
    let value = parse_ternary(cur)?;
    Ok(SuperpositionOption { weight, value })
}

fn parse_ternary(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let condition = parse_or(cur)?;
    if cur.matches(&TokenKind::Question) {
        let then_branch = parse_expr(cur)?;
        cur.expect(&TokenKind::Colon, "':' in ternary expression")?;
        let else_branch = parse_ternary(cur)?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    } else {
        Ok(condition)
    }
}

fn parse_or(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let mut left = parse_and(cur)?;
    while cur.matches(&TokenKind::Or) {
        let right = parse_and(cur)?;
        left = Expr::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_and(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let mut left = parse_logical_not(cur)?;
    while cur.matches(&TokenKind::And) {
        let right = parse_logical_not(cur)?;
        left = Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

/// The `not` tier sits between `and` and comparison so that `not a == b`
/// parses as `not (a == b)`, matching the precedence table in spec §4.F.
fn parse_logical_not(cur: &mut TokenCursor) -> LoomResult<Expr> {
    if cur.matches(&TokenKind::Not) {
        let operand = parse_logical_not(cur)?;
        Ok(Expr::Not(Box::new(operand)))
    } else {
        parse_comparison(cur)
    }
}

fn parse_comparison(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let mut left = parse_additive(cur)?;
    loop {
        let op = match cur.peek_token_kind() {
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::GtEq => BinaryOp::Ge,
            _ => break,
        };
        cur.advance();
        let right = parse_additive(cur)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_additive(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let mut left = parse_multiplicative(cur)?;
    loop {
        let op = match cur.peek_token_kind() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            _ => break,
        };
        cur.advance();
        let right = parse_multiplicative(cur)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_multiplicative(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let mut left = parse_unary(cur)?;
    loop {
        let op = match cur.peek_token_kind() {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => {
                // Modulo desugars to a call so the evaluator's arithmetic
                // dispatch (spec §4.H) doesn't need a dedicated BinaryOp.
                cur.advance();
                let right = parse_unary(cur)?;
                left = Expr::Call {
                    callee: "mod".to_string(),
                    args: vec![left, right],
                };
                continue;
            }
            _ => break,
        };
        cur.advance();
        let right = parse_unary(cur)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_unary(cur: &mut TokenCursor) -> LoomResult<Expr> {
    match cur.peek_token_kind() {
        TokenKind::Plus => {
            cur.advance();
            Ok(Expr::Unary {
                op: UnaryOp::Plus,
                operand: Box::new(parse_unary(cur)?),
            })
        }
        TokenKind::Minus => {
            cur.advance();
            Ok(Expr::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(parse_unary(cur)?),
            })
        }
        TokenKind::Not => {
            cur.advance();
            Ok(Expr::Not(Box::new(parse_unary(cur)?)))
        }
        _ => parse_range(cur),
    }
}

/// `min..max`, bound tightly above the arithmetic tiers so `1..x+1` parses
/// as `1..(x+1)`.
fn parse_range(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let first = parse_postfix(cur)?;
    if cur.matches(&TokenKind::DotDot) {
        let max = parse_postfix(cur)?;
        Ok(Expr::Range {
            min: Some(Box::new(first)),
            max: Some(Box::new(max)),
        })
    } else {
        Ok(first)
    }
}

fn parse_postfix(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let mut expr = parse_primary(cur)?;
    loop {
        if cur.matches(&TokenKind::Dot) {
            let field = cur.expect_identifier()?;
            expr = Expr::Binary {
                op: BinaryOp::Dot,
                left: Box::new(expr),
                right: Box::new(Expr::Identifier(field)),
            };
        } else {
            break;
        }
    }
    Ok(expr)
}

fn parse_primary(cur: &mut TokenCursor) -> LoomResult<Expr> {
    match cur.peek_token_kind().clone() {
        TokenKind::Int(n) => {
            cur.advance();
            Ok(Expr::Literal(Value::Int(n)))
        }
        TokenKind::Decimal(n) => {
            cur.advance();
            Ok(Expr::Literal(Value::Decimal(n)))
        }
        TokenKind::Str(s) => {
            cur.advance();
            Ok(Expr::Literal(Value::Str(s)))
        }
        TokenKind::True => {
            cur.advance();
            Ok(Expr::Literal(Value::Bool(true)))
        }
        TokenKind::False => {
            cur.advance();
            Ok(Expr::Literal(Value::Bool(false)))
        }
        TokenKind::Null => {
            cur.advance();
            Ok(Expr::Literal(Value::Null))
        }
        TokenKind::LParen => {
            cur.advance();
            let inner = parse_expr(cur)?;
            cur.expect(&TokenKind::RParen, "')'")?;
            Ok(inner)
        }
        TokenKind::LBracket => {
            cur.advance();
            let mut elements = Vec::new();
            if !cur.check_rbracket() {
                loop {
                    elements.push(parse_expr(cur)?);
                    if !cur.matches(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            cur.expect_rbracket()?;
            Ok(Expr::OrderedSequence { elements })
        }
        TokenKind::Caret => {
            cur.advance();
            let path = super::parse_qualified_name(cur)?;
            Ok(Expr::ParentRef { path })
        }
        TokenKind::Match => parse_match(cur),
        TokenKind::Any => parse_any_of(cur),
        TokenKind::Identifier(_) => parse_identifier_or_call(cur),
        other => Err(LoomError::UnexpectedToken {
            span: cur.current_span(),
            found: other.to_string(),
            expected: "an expression".to_string(),
        }),
    }
}

fn parse_match(cur: &mut TokenCursor) -> LoomResult<Expr> {
    cur.advance(); // match
    let value = parse_or(cur)?;
    cur.expect(&TokenKind::LBrace, "'{'")?;
    let mut arms = Vec::new();
    cur.skip_commas();
    while !cur.check(&TokenKind::RBrace) {
        let pattern = parse_or(cur)?;
        cur.expect(&TokenKind::FatArrow, "'=>'")?;
        let result = parse_or(cur)?;
        arms.push(MatchArm { pattern, result });
        cur.skip_commas();
    }
    cur.expect(&TokenKind::RBrace, "'}'")?;
    Ok(Expr::Match { value: Box::new(value), arms })
}

fn parse_any_of(cur: &mut TokenCursor) -> LoomResult<Expr> {
    cur.advance(); // any
    cur.expect(&TokenKind::Of, "'of'")?;
    let collection = parse_postfix(cur)?;
    let condition = if cur.matches_identifier_lexeme("where") {
        Some(Box::new(parse_or(cur)?))
    } else {
        None
    };
    Ok(Expr::AnyOf {
        collection: Box::new(collection),
        condition,
    })
}

fn parse_identifier_or_call(cur: &mut TokenCursor) -> LoomResult<Expr> {
    let mut parts = vec![cur.expect_identifier()?];
    while cur.peek_is_dot_identifier() {
        cur.advance(); // '.'
        parts.push(cur.expect_identifier()?);
    }
    if cur.matches(&TokenKind::LParen) {
        let mut args = Vec::new();
        if !cur.check(&TokenKind::RParen) {
            loop {
                args.push(parse_expr(cur)?);
                if !cur.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        cur.expect(&TokenKind::RParen, "')'")?;
        return Ok(Expr::Call {
            callee: parts.join("."),
            args,
        });
    }
    if parts.len() == 1 {
        Ok(Expr::Identifier(parts.into_iter().next().unwrap()))
    } else {
        Ok(Expr::QualifiedName(parts))
    }
}
