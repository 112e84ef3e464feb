//! # Primitive value generation (spec §4.I, "Primitive")
//!
//! Shared by the evaluator (an identifier used as a bare type reference,
//! spec §4.H) and the field generator (a field typed as a bare primitive),
//! so the two never call back into each other (spec §9, "Callback cycles
//! between evaluator and field generator").

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::Word;
use fake::faker::name::en::Name;
use fake::Fake;

use crate::ast::PrimitiveKind;
use crate::context::GenerationContext;
use crate::value::Value;

/// Default upper bound for unconstrained int/decimal primitives.
pub const DEFAULT_MAX: i64 = 1000;

const EARLIEST_DATE: (i32, u32, u32) = (2020, 1, 1);

pub fn generate_primitive(
    kind: PrimitiveKind,
    precision: Option<u32>,
    schema_name: &str,
    field_name: &str,
    ctx: &mut GenerationContext,
) -> Value {
    match kind {
        PrimitiveKind::Int => Value::Int(ctx.rng.random_int(0, DEFAULT_MAX)),
        PrimitiveKind::Decimal => {
            let raw = ctx.rng.random_decimal(0.0, DEFAULT_MAX as f64);
            Value::Decimal(round_to(raw, precision.unwrap_or(2)))
        }
        PrimitiveKind::String => Value::Str(generate_string(schema_name, field_name, ctx)),
        PrimitiveKind::Date => Value::Date(generate_date(ctx)),
        PrimitiveKind::Boolean => Value::Bool(ctx.rng.coin(0.5)),
    }
}

/// Name-heuristic text generator: the field/schema name steers which
/// `fake` faker is used, giving more realistic output than a flat word
/// generator without requiring a schema to say so explicitly.
fn generate_string(schema_name: &str, field_name: &str, ctx: &mut GenerationContext) -> String {
    let lower_field = field_name.to_ascii_lowercase();
    let lower_schema = schema_name.to_ascii_lowercase();
    if lower_field.contains("company") || lower_field.contains("org") || lower_schema.contains("company") {
        CompanyName().fake_with_rng(&mut ctx.rng)
    } else if lower_field.contains("name") || lower_field.contains("person") {
        Name().fake_with_rng(&mut ctx.rng)
    } else if lower_field.contains("product") || lower_field.contains("item") {
        let words: Vec<String> = (0..2).map(|_| Word().fake_with_rng::<String, _>(&mut ctx.rng)).collect();
        words.join(" ")
    } else {
        Word().fake_with_rng(&mut ctx.rng)
    }
}

fn generate_date(ctx: &mut GenerationContext) -> NaiveDate {
    let (y, m, d) = EARLIEST_DATE;
    let earliest = NaiveDate::from_ymd_opt(y, m, d).expect("valid constant date");
    let today = Utc::now().date_naive();
    let span_days = (today - earliest).num_days().max(0);
    let offset = ctx.rng.random_int(0, span_days);
    earliest + ChronoDuration::days(offset)
}

/// Resolves a primitive/range date bound given as years (spec §4.I, "for
/// date, interprets the bounds as years").
pub fn date_from_year(year: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(year as i32, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::context::GeneratorOptions;
    use crate::plugin::PluginRegistry;

    fn ctx() -> GenerationContext {
        GenerationContext::new(&Program::new(), 7, PluginRegistry::new(), GeneratorOptions::default())
    }

    #[test]
    fn int_primitive_is_in_default_range() {
        let mut c = ctx();
        for _ in 0..50 {
            let v = generate_primitive(PrimitiveKind::Int, None, "S", "f", &mut c);
            assert!(matches!(v, Value::Int(n) if (0..=DEFAULT_MAX).contains(&n)));
        }
    }

    #[test]
    fn decimal_respects_precision() {
        let mut c = ctx();
        let v = generate_primitive(PrimitiveKind::Decimal, Some(2), "S", "f", &mut c);
        if let Value::Decimal(n) = v {
            let scaled = (n * 100.0).round();
            assert!((n * 100.0 - scaled).abs() < 1e-6);
        } else {
            panic!("expected decimal");
        }
    }

    #[test]
    fn date_is_within_expected_span() {
        let mut c = ctx();
        let earliest = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let v = generate_primitive(PrimitiveKind::Date, None, "S", "f", &mut c);
        if let Value::Date(d) = v {
            assert!(d >= earliest);
        } else {
            panic!("expected date");
        }
    }

    #[test]
    fn company_heuristic_fires_on_field_name() {
        let mut c = ctx();
        let v = generate_string("Invoice", "company_name", &mut c);
        assert!(!v.is_empty());
    }
}
