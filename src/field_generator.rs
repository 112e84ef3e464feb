//! # Field generator (spec §4.I)
//!
//! Materializes a value for a single [`FieldType`]. Dispatch is structural
//! (`match`), never callback-based, so there is exactly one direction of
//! control flow between this module and the evaluator: this module calls
//! into [`crate::evaluator`], never the reverse (spec §9).

use crate::ast::{Cardinality, Expr, FieldDefinition, FieldType, SuperpositionOption};
use crate::context::GenerationContext;
use crate::error::{LoomError, LoomResult};
use crate::evaluator::{evaluate, resolve_if_range};
use crate::instance_generator;
use crate::plugin::call_plugin;
use crate::primitives::{date_from_year, generate_primitive};
use crate::value::Value;

/// Public entry point: generates a value for `field`, honoring its `unique`
/// modifier with bounded retries (spec §4.I "Uniqueness").
pub fn generate_field_value(field: &FieldDefinition, schema_name: &str, ctx: &mut GenerationContext) -> LoomResult<Value> {
    if !field.unique {
        return generate(&field.field_type, schema_name, &field.name, ctx);
    }
    let key = format!("{schema_name}.{}", field.name);
    let mut last = Value::Null;
    for _ in 0..ctx.retry_limits.unique {
        let candidate = generate(&field.field_type, schema_name, &field.name, ctx)?;
        if ctx.try_claim_unique(&key, &candidate) {
            return Ok(candidate);
        }
        last = candidate;
    }
    ctx.warnings.unique_exhaustion(&key);
    if ctx.options.strict {
        return Err(LoomError::StrictModeViolation(format!("unique exhaustion for {key}")));
    }
    Ok(last)
}

/// Core structural dispatch over [`FieldType`], with no uniqueness handling.
pub fn generate(field_type: &FieldType, schema_name: &str, field_name: &str, ctx: &mut GenerationContext) -> LoomResult<Value> {
    match field_type {
        FieldType::Primitive { kind, precision } => {
            Ok(generate_primitive(*kind, *precision, schema_name, field_name, ctx))
        }
        FieldType::Range { base, min, max } => generate_range(*base, min, max, ctx),
        FieldType::Superposition { options } => generate_superposition(options, ctx),
        FieldType::Collection { cardinality, element } => {
            generate_collection(cardinality, element, schema_name, field_name, ctx)
        }
        FieldType::Reference { path } => generate_reference(path, ctx),
        FieldType::SchemaRef(name) => {
            instance_generator::generate_instance(name, None, ctx).map(Value::Object)
        }
        FieldType::ExpressionType(expr) => evaluate(expr, ctx),
        FieldType::Generator { name, args } => {
            let values = args.iter().map(|a| evaluate(a, ctx)).collect::<LoomResult<Vec<_>>>()?;
            call_plugin(&ctx.registry.clone(), name, &values, ctx)
        }
        FieldType::OrderedSequenceType(elements) => generate_ordered_sequence(elements, schema_name, field_name, ctx),
        FieldType::Nullable(inner) => {
            if ctx.rng.coin(0.5) {
                Ok(Value::Null)
            } else {
                generate(inner, schema_name, field_name, ctx)
            }
        }
    }
}

fn generate_range(
    base: crate::ast::PrimitiveKind,
    min: &Option<Box<Expr>>,
    max: &Option<Box<Expr>>,
    ctx: &mut GenerationContext,
) -> LoomResult<Value> {
    use crate::ast::PrimitiveKind;

    let min_v = match min {
        Some(e) => evaluate(e, ctx)?,
        None => Value::Int(0),
    };
    let max_v = match max {
        Some(e) => evaluate(e, ctx)?,
        None => Value::Int(crate::primitives::DEFAULT_MAX),
    };

    match base {
        PrimitiveKind::Date => {
            let lo_year = min_v.as_i64().unwrap_or(2020);
            let hi_year = max_v.as_i64().unwrap_or(lo_year);
            let lo = date_from_year(lo_year.min(hi_year));
            let hi = date_from_year(lo_year.max(hi_year));
            let span = (hi - lo).num_days().max(0);
            let offset = ctx.rng.random_int(0, span);
            Ok(Value::Date(lo + chrono::Duration::days(offset)))
        }
        PrimitiveKind::Decimal => {
            let lo = min_v.as_f64().unwrap_or(0.0);
            let hi = max_v.as_f64().unwrap_or(lo);
            Ok(Value::Decimal(ctx.rng.random_decimal(lo.min(hi), lo.max(hi))))
        }
        _ => {
            let lo = min_v.as_i64().unwrap_or(0);
            let hi = max_v.as_i64().unwrap_or(lo);
            Ok(Value::Int(ctx.rng.random_int(lo.min(hi), lo.max(hi))))
        }
    }
}

fn generate_superposition(options: &[SuperpositionOption], ctx: &mut GenerationContext) -> LoomResult<Value> {
    evaluate(&Expr::Superposition { options: options.to_vec() }, ctx)
}

fn generate_collection(
    cardinality: &Cardinality,
    element: &FieldType,
    schema_name: &str,
    field_name: &str,
    ctx: &mut GenerationContext,
) -> LoomResult<Value> {
    let n = resolve_cardinality(cardinality, ctx)?;
    let mut items = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let item = if let FieldType::SchemaRef(schema) = element {
            let parent = ctx.current.clone().map(Value::Object);
            let previous_parent = ctx.parent.take();
            ctx.parent = parent;
            let record = instance_generator::generate_instance(schema, None, ctx)?;
            ctx.parent = previous_parent;
            Value::Object(record)
        } else {
            generate(element, schema_name, field_name, ctx)?
        };
        items.push(item);
    }
    Ok(Value::List(items))
}

fn generate_reference(path: &[String], ctx: &mut GenerationContext) -> LoomResult<Value> {
    let expr = if path.len() == 1 {
        Expr::Identifier(path[0].clone())
    } else {
        Expr::QualifiedName(path.to_vec())
    };
    evaluate(&expr, ctx)
}

fn generate_ordered_sequence(
    elements: &[Expr],
    schema_name: &str,
    field_name: &str,
    ctx: &mut GenerationContext,
) -> LoomResult<Value> {
    if elements.is_empty() {
        return Ok(Value::Null);
    }
    let key = format!("{schema_name}.{field_name}");
    let idx = ctx.next_ordered_index(&key, elements.len());
    resolve_if_range(evaluate(&elements[idx], ctx)?, ctx)
}

/// Static `{min,max}` picks uniformly; dynamic evaluates the expression — a
/// number is floored, a range is resolved to a uniform integer; anything
/// else is a fatal `cardinality-error`. Negative counts are rejected (spec
/// §4.I "Cardinality resolution").
pub fn resolve_cardinality(cardinality: &Cardinality, ctx: &mut GenerationContext) -> LoomResult<i64> {
    let n = match cardinality {
        Cardinality::Static { min, max } => ctx.rng.random_int(*min, *max),
        Cardinality::Dynamic(expr) => {
            let value = resolve_if_range(evaluate(expr, ctx)?, ctx)?;
            match value {
                Value::Int(n) => n,
                Value::Decimal(n) => n.floor() as i64,
                other => {
                    return Err(LoomError::DynamicCardinalityTypeError { got: other.type_name().to_string() })
                }
            }
        }
    };
    if n < 0 {
        return Err(LoomError::CardinalityError { message: format!("negative cardinality {n}") });
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{PrimitiveKind, Program};
    use crate::context::GeneratorOptions;
    use crate::plugin::PluginRegistry;

    fn ctx() -> GenerationContext {
        GenerationContext::new(&Program::new(), 5, PluginRegistry::new(), GeneratorOptions::default())
    }

    #[test]
    fn static_cardinality_within_bounds() {
        let mut c = ctx();
        for _ in 0..20 {
            let n = resolve_cardinality(&Cardinality::Static { min: 2, max: 5 }, &mut c).unwrap();
            assert!((2..=5).contains(&n));
        }
    }

    #[test]
    fn negative_dynamic_cardinality_is_an_error() {
        let mut c = ctx();
        let card = Cardinality::Dynamic(Box::new(Expr::Literal(Value::Int(-1))));
        assert!(matches!(resolve_cardinality(&card, &mut c), Err(LoomError::CardinalityError { .. })));
    }

    #[test]
    fn range_field_for_decimal_respects_bounds() {
        let mut c = ctx();
        let ft = FieldType::Range {
            base: PrimitiveKind::Decimal,
            min: Some(Box::new(Expr::Literal(Value::Int(1)))),
            max: Some(Box::new(Expr::Literal(Value::Int(10)))),
        };
        let v = generate(&ft, "S", "f", &mut c).unwrap();
        if let Value::Decimal(n) = v {
            assert!((1.0..=10.0).contains(&n));
        } else {
            panic!("expected decimal");
        }
    }

    #[test]
    fn collection_produces_requested_cardinality() {
        let mut c = ctx();
        let ft = FieldType::Collection {
            cardinality: Cardinality::exact(4),
            element: Box::new(FieldType::Primitive { kind: PrimitiveKind::Int, precision: None }),
        };
        let v = generate(&ft, "S", "items", &mut c).unwrap();
        assert_eq!(v.as_list().unwrap().len(), 4);
    }

    #[test]
    fn ordered_sequence_cycles_modulo_length() {
        let mut c = ctx();
        let elements = vec![
            Expr::Literal(Value::Str("a".into())),
            Expr::Literal(Value::Str("b".into())),
        ];
        let v1 = generate_ordered_sequence(&elements, "S", "f", &mut c).unwrap();
        let v2 = generate_ordered_sequence(&elements, "S", "f", &mut c).unwrap();
        let v3 = generate_ordered_sequence(&elements, "S", "f", &mut c).unwrap();
        assert_eq!(v1.to_string(), "a");
        assert_eq!(v2.to_string(), "b");
        assert_eq!(v3.to_string(), "a");
    }
}
