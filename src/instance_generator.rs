//! # Instance generator (spec §4.J)
//!
//! Produces one record for a schema: orders fields (scalars, then
//! collections, then computed fields in topological order), enforces
//! `assume`/contract constraints by rejection sampling, applies `refine` and
//! `then` blocks, and strips `private` fields from the result.
//!
//! States per instance: `empty → scalars-filled → collections-filled →
//! computed-filled → refined → validated → finalized`. The state names
//! themselves aren't reified as a type — the function below is linear and
//! each stage corresponds to one step — but a failed `validated` attempt
//! does return all the way to `empty`, resetting this schema's unique
//! claims so retries don't deadlock on a previous attempt's leftovers.

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::ast::{Expr, FieldDefinition, FieldType, SchemaDefinition};
use crate::context::GenerationContext;
use crate::error::{LoomError, LoomResult};
use crate::evaluator::evaluate;
use crate::field_generator::generate_field_value;
use crate::value::Value;

/// Generates one instance of `schema_name`. `overrides`, when given,
/// supplies pre-computed values for named fields (e.g. a context's
/// `affects` clause) — those fields are neither generated nor subject to
/// their own `condition`/`optional` dropping.
pub fn generate_instance(
    schema_name: &str,
    overrides: Option<&IndexMap<String, Value>>,
    ctx: &mut GenerationContext,
) -> LoomResult<IndexMap<String, Value>> {
    let schema = ctx
        .schema(schema_name)
        .cloned()
        .ok_or_else(|| LoomError::UnknownSchema { name: schema_name.to_string() })?;

    let previous_schema_name = ctx.current_schema_name.replace(schema_name.to_string());
    let overrides = overrides.cloned().unwrap_or_default();

    let mut last_attempt: Option<IndexMap<String, Value>> = None;
    let mut accepted = false;

    for _ in 0..ctx.retry_limits.instance.max(1) {
        let record = generate_one_attempt(&schema, &overrides, ctx)?;
        ctx.current = Some(record.clone());

        let contracts_ok = check_contracts(&schema, ctx)?;
        let assumes_ok = check_assumes(&schema, ctx);
        let accept = contracts_ok && (if ctx.violating { !assumes_ok } else { assumes_ok });

        last_attempt = Some(record);
        if accept {
            accepted = true;
            break;
        }
        ctx.reset_unique_values_for_schema(schema_name);
    }

    let mut record = last_attempt.expect("retry_limits.instance >= 1 guarantees at least one attempt");
    if !accepted {
        ctx.warnings.constraint_retry_exhaustion(schema_name);
        if ctx.options.strict {
            ctx.current_schema_name = previous_schema_name;
            return Err(LoomError::StrictModeViolation(format!(
                "constraint retry exhaustion for schema {schema_name}"
            )));
        }
    }
    ctx.current = Some(record.clone());

    apply_then_block(&schema, schema_name, &mut record, ctx);
    strip_private(&schema, &mut record);

    ctx.current_schema_name = previous_schema_name;
    Ok(record)
}

fn generate_one_attempt(
    schema: &SchemaDefinition,
    overrides: &IndexMap<String, Value>,
    ctx: &mut GenerationContext,
) -> LoomResult<IndexMap<String, Value>> {
    let mut record: IndexMap<String, Value> = IndexMap::new();
    ctx.current = Some(record.clone());

    // Scalars first, in declaration order. Activity (condition/optional) is
    // decided right before each field would be generated, against the
    // record as built so far — not in a single up-front pass, since a
    // later field's condition may reference an earlier one.
    for field in schema.fields.iter().filter(|f| f.is_scalar() && !f.computed) {
        ctx.current = Some(record.clone());
        if !field_is_active(field, overrides, ctx) {
            continue;
        }
        let value = resolve_field(field, overrides, schema.name.as_str(), ctx)?;
        record.insert(field.name.clone(), value);
    }

    // Then collections, so scalar-time references see empty collections.
    for field in schema.fields.iter().filter(|f| matches!(f.field_type, FieldType::Collection { .. })) {
        ctx.current = Some(record.clone());
        if !field_is_active(field, overrides, ctx) {
            continue;
        }
        let value = resolve_field(field, overrides, schema.name.as_str(), ctx)?;
        record.insert(field.name.clone(), value);
    }
    ctx.current = Some(record.clone());

    // Then computed fields, topologically ordered over their own cross-references.
    let computed: Vec<&FieldDefinition> = schema
        .fields
        .iter()
        .filter(|f| f.computed && field_is_active(f, overrides, ctx))
        .collect();
    let order = order_computed_fields(&computed)?;
    for name in order {
        let field = computed.iter().find(|f| f.name == name).expect("name came from this field set");
        let expr = field.distribution.as_ref().ok_or_else(|| LoomError::ComputedCycle {
            fields: vec![field.name.clone()],
        })?;
        let value = evaluate(expr, ctx)?;
        record.insert(field.name.clone(), value);
        ctx.current = Some(record.clone());
    }

    apply_refine_block(schema, &mut record, ctx);
    backfill_base_fields(schema, &mut record, ctx)?;

    Ok(record)
}

fn field_is_active(field: &FieldDefinition, overrides: &IndexMap<String, Value>, ctx: &mut GenerationContext) -> bool {
    if overrides.contains_key(&field.name) {
        return true;
    }
    if let Some(condition) = &field.condition {
        match evaluate(condition, ctx) {
            Ok(v) => {
                if !v.truthy() {
                    return false;
                }
            }
            Err(_) => return false,
        }
    }
    if field.optional && !ctx.rng.coin(ctx.options.optional_field_probability) {
        return false;
    }
    true
}

fn resolve_field(
    field: &FieldDefinition,
    overrides: &IndexMap<String, Value>,
    schema_name: &str,
    ctx: &mut GenerationContext,
) -> LoomResult<Value> {
    if let Some(v) = overrides.get(&field.name) {
        return Ok(v.clone());
    }
    generate_field_value(field, schema_name, ctx)
}

/// Orders computed fields by Kahn's algorithm over identifier references
/// that happen to name another computed field in the same schema. A cycle
/// is a fatal `computed-cycle` (spec §4.J step 2).
fn order_computed_fields(fields: &[&FieldDefinition]) -> LoomResult<Vec<String>> {
    let mut graph = DiGraph::<String, ()>::new();
    let mut nodes = IndexMap::new();
    for field in fields {
        let idx = graph.add_node(field.name.clone());
        nodes.insert(field.name.clone(), idx);
    }
    for field in fields {
        if let Some(expr) = &field.distribution {
            for dep in referenced_identifiers(expr) {
                if let Some(&dep_idx) = nodes.get(&dep) {
                    if dep != field.name {
                        graph.add_edge(dep_idx, nodes[&field.name], ());
                    }
                }
            }
        }
    }
    toposort(&graph, None)
        .map(|order| order.into_iter().map(|idx| graph[idx].clone()).collect())
        .map_err(|cycle| LoomError::ComputedCycle { fields: vec![graph[cycle.node_id()].clone()] })
}

/// Collects every bare identifier name mentioned anywhere in `expr`,
/// including dotted-path heads — a coarse over-approximation of data
/// dependencies, which is sound for cycle detection (extra edges can only
/// make toposort fail where it needn't, never miss a real cycle).
fn referenced_identifiers(expr: &Expr) -> Vec<String> {
    let mut out = Vec::new();
    collect_identifiers(expr, &mut out);
    out
}

fn collect_identifiers(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Identifier(name) => out.push(name.clone()),
        Expr::QualifiedName(parts) => {
            if let Some(head) = parts.first() {
                out.push(head.clone());
            }
        }
        Expr::Binary { left, right, .. } => {
            collect_identifiers(left, out);
            collect_identifiers(right, out);
        }
        Expr::Logical { left, right, .. } => {
            collect_identifiers(left, out);
            collect_identifiers(right, out);
        }
        Expr::Not(e) | Expr::Unary { operand: e, .. } => collect_identifiers(e, out),
        Expr::Range { min, max } => {
            if let Some(e) = min {
                collect_identifiers(e, out);
            }
            if let Some(e) = max {
                collect_identifiers(e, out);
            }
        }
        Expr::Superposition { options } => {
            for opt in options {
                collect_identifiers(&opt.value, out);
            }
        }
        Expr::Call { args, .. } => {
            for a in args {
                collect_identifiers(a, out);
            }
        }
        Expr::Ternary { condition, then_branch, else_branch } => {
            collect_identifiers(condition, out);
            collect_identifiers(then_branch, out);
            collect_identifiers(else_branch, out);
        }
        Expr::Match { value, arms } => {
            collect_identifiers(value, out);
            for arm in arms {
                collect_identifiers(&arm.pattern, out);
                collect_identifiers(&arm.result, out);
            }
        }
        Expr::AnyOf { collection, condition } => {
            collect_identifiers(collection, out);
            if let Some(c) = condition {
                collect_identifiers(c, out);
            }
        }
        Expr::OrderedSequence { elements } => {
            for e in elements {
                collect_identifiers(e, out);
            }
        }
        Expr::Literal(_) | Expr::ParentRef { .. } => {}
    }
}

fn apply_refine_block(schema: &SchemaDefinition, record: &mut IndexMap<String, Value>, ctx: &mut GenerationContext) {
    for clause in &schema.refine_block {
        let holds = match &clause.condition {
            Some(cond) => evaluate(cond, ctx).map(|v| v.truthy()).unwrap_or(false),
            None => true,
        };
        if !holds {
            continue;
        }
        for field_name in &clause.fields {
            let Some(field) = schema.fields.iter().find(|f| &f.name == field_name) else {
                continue;
            };
            if field.unique {
                if let Some(old) = record.get(field_name) {
                    let key = format!("{}.{}", schema.name, field_name);
                    ctx.release_unique(&key, old);
                }
            }
            if let Ok(value) = generate_field_value(field, &schema.name, ctx) {
                record.insert(field_name.clone(), value);
                ctx.current = Some(record.clone());
            }
        }
    }
}

/// Any field declared on the schema's `base` that wasn't otherwise assigned
/// is filled in directly (spec §4.J step 4). There is no separate
/// imported-schema table in this crate — `base` names another schema
/// compiled alongside this one, so its missing fields are generated the
/// same way an ordinary field would be.
fn backfill_base_fields(schema: &SchemaDefinition, record: &mut IndexMap<String, Value>, ctx: &mut GenerationContext) -> LoomResult<()> {
    let Some(base_name) = &schema.base else {
        return Ok(());
    };
    let Some(base_schema) = ctx.schema(base_name).cloned() else {
        return Ok(());
    };
    for field in &base_schema.fields {
        if record.contains_key(&field.name) {
            continue;
        }
        let value = generate_field_value(field, base_name, ctx)?;
        record.insert(field.name.clone(), value);
        ctx.current = Some(record.clone());
    }
    Ok(())
}

/// Exposed `pub(crate)` so [`crate::dataset`] can run the same check against
/// externally supplied data (spec §6 `Generator::validate`).
pub(crate) fn check_assumes(schema: &SchemaDefinition, ctx: &mut GenerationContext) -> bool {
    for assume in &schema.assumes {
        let guard_holds = match &assume.condition {
            Some(cond) => evaluate(cond, ctx).map(|v| v.truthy()).unwrap_or(false),
            None => true,
        };
        if !guard_holds {
            continue;
        }
        for constraint in &assume.constraints {
            let ok = evaluate(constraint, ctx).map(|v| v.truthy()).unwrap_or(false);
            if !ok {
                return false;
            }
        }
    }
    true
}

/// Contract invariants are enforced identically to `assume` clauses but are
/// never bypassed by `violating` (spec §4.J step 5). A contract a schema
/// `implements` but that isn't declared anywhere emits `contract-missing`
/// (non-fatal by default, elevated to fatal in strict mode — spec §7).
pub(crate) fn check_contracts(schema: &SchemaDefinition, ctx: &mut GenerationContext) -> LoomResult<bool> {
    for contract_name in &schema.contracts {
        let Some(contract) = ctx.contract(contract_name).cloned() else {
            ctx.warnings.contract_missing(contract_name, &schema.name);
            if ctx.options.strict {
                return Err(LoomError::StrictModeViolation(format!(
                    "schema {} implements unknown contract {contract_name:?}",
                    schema.name
                )));
            }
            continue;
        };
        for invariant in &contract.invariants {
            let guard_holds = match &invariant.condition {
                Some(cond) => evaluate(cond, ctx).map(|v| v.truthy()).unwrap_or(false),
                None => true,
            };
            if !guard_holds {
                continue;
            }
            for constraint in &invariant.constraints {
                let ok = evaluate(constraint, ctx).map(|v| v.truthy()).unwrap_or(false);
                if !ok {
                    return Ok(false);
                }
            }
        }
    }
    for invariant in &schema.invariants {
        let guard_holds = match &invariant.condition {
            Some(cond) => evaluate(cond, ctx).map(|v| v.truthy()).unwrap_or(false),
            None => true,
        };
        if !guard_holds {
            continue;
        }
        for constraint in &invariant.constraints {
            let ok = evaluate(constraint, ctx).map(|v| v.truthy()).unwrap_or(false);
            if !ok {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn apply_then_block(schema: &SchemaDefinition, schema_name: &str, record: &mut IndexMap<String, Value>, ctx: &mut GenerationContext) {
    use crate::ast::MutationOp;

    for mutation in &schema.then_block {
        let new_value = match evaluate(&mutation.value, ctx) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let Some((head, rest)) = mutation.target.split_first() else {
            continue;
        };
        if !rest.is_empty() {
            // Qualified targets into nested records aren't addressable for
            // direct mutation without a mutable nested-path walker; treat as
            // unresolved (spec §4.J step 6: "unresolvable targets ... skipped").
            ctx.warnings.mutation_target_not_found(&format!("{schema_name}.{}", mutation.target.join(".")));
            continue;
        }
        match record.get_mut(head) {
            Some(slot) => {
                *slot = match mutation.op {
                    MutationOp::Assign => new_value,
                    MutationOp::AddAssign => add_values(slot, &new_value),
                };
            }
            None => {
                ctx.warnings.mutation_target_not_found(&format!("{schema_name}.{head}"));
            }
        }
    }
}

fn add_values(current: &Value, delta: &Value) -> Value {
    match (current, delta) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
        (Value::Decimal(a), Value::Decimal(b)) => Value::Decimal(a + b),
        (Value::Int(a), Value::Decimal(b)) => Value::Decimal(*a as f64 + b),
        (Value::Decimal(a), Value::Int(b)) => Value::Decimal(a + *b as f64),
        (Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
        (Value::List(a), Value::List(b)) => {
            let mut combined = a.clone();
            combined.extend(b.clone());
            Value::List(combined)
        }
        _ => delta.clone(),
    }
}

fn strip_private(schema: &SchemaDefinition, record: &mut IndexMap<String, Value>) {
    for field in &schema.fields {
        if field.private {
            record.shift_remove(&field.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::{FieldBuilder, SchemaBuilder};
    use crate::ast::{PrimitiveKind, Program, Statement};
    use crate::context::GeneratorOptions;
    use crate::plugin::PluginRegistry;

    fn program_with(schemas: Vec<SchemaDefinition>) -> Program {
        Program {
            statements: schemas.into_iter().map(Statement::Schema).collect(),
        }
    }

    #[test]
    fn generates_scalar_fields_in_declaration_order() {
        let schema = SchemaBuilder::new("Widget")
            .field(FieldBuilder::primitive("id", PrimitiveKind::Int).build())
            .field(FieldBuilder::primitive("label", PrimitiveKind::String).build())
            .build();
        let program = program_with(vec![schema]);
        let mut ctx = GenerationContext::new(&program, 3, PluginRegistry::new(), GeneratorOptions::default());
        let record = generate_instance("Widget", None, &mut ctx).unwrap();
        assert!(record.contains_key("id"));
        assert!(record.contains_key("label"));
    }

    #[test]
    fn private_fields_are_stripped() {
        let schema = SchemaBuilder::new("Secret")
            .field(FieldBuilder::primitive("internal_id", PrimitiveKind::Int).private().build())
            .field(FieldBuilder::primitive("name", PrimitiveKind::String).build())
            .build();
        let program = program_with(vec![schema]);
        let mut ctx = GenerationContext::new(&program, 3, PluginRegistry::new(), GeneratorOptions::default());
        let record = generate_instance("Secret", None, &mut ctx).unwrap();
        assert!(!record.contains_key("internal_id"));
        assert!(record.contains_key("name"));
    }

    #[test]
    fn assume_clause_is_satisfied_by_rejection_sampling() {
        let schema = SchemaBuilder::new("Scored")
            .field(FieldBuilder::primitive("score", PrimitiveKind::Int).build())
            .assume(
                None,
                vec![Expr::Binary {
                    op: crate::ast::BinaryOp::Ge,
                    left: Box::new(Expr::Identifier("score".into())),
                    right: Box::new(Expr::Literal(Value::Int(0))),
                }],
            )
            .build();
        let program = program_with(vec![schema]);
        let mut ctx = GenerationContext::new(&program, 11, PluginRegistry::new(), GeneratorOptions::default());
        let record = generate_instance("Scored", None, &mut ctx).unwrap();
        assert!(record.get("score").unwrap().as_i64().unwrap() >= 0);
    }

    #[test]
    fn constraint_retry_exhaustion_is_fatal_in_strict_mode() {
        let schema = SchemaBuilder::new("Impossible")
            .field(FieldBuilder::primitive("n", PrimitiveKind::Int).build())
            .assume(None, vec![Expr::Literal(Value::Bool(false))])
            .build();
        let program = program_with(vec![schema]);
        let mut ctx = GenerationContext::new(
            &program,
            1,
            PluginRegistry::new(),
            GeneratorOptions { strict: true, ..GeneratorOptions::default() },
        );
        assert!(matches!(
            generate_instance("Impossible", None, &mut ctx),
            Err(LoomError::StrictModeViolation(_))
        ));
    }

    #[test]
    fn unknown_schema_is_an_error() {
        let program = program_with(vec![]);
        let mut ctx = GenerationContext::new(&program, 1, PluginRegistry::new(), GeneratorOptions::default());
        assert!(matches!(generate_instance("Nope", None, &mut ctx), Err(LoomError::UnknownSchema { .. })));
    }

    #[test]
    fn computed_field_sees_generated_scalars() {
        let computed_field = FieldBuilder::computed(
            "total",
            Expr::Binary {
                op: crate::ast::BinaryOp::Add,
                left: Box::new(Expr::Identifier("base".into())),
                right: Box::new(Expr::Literal(Value::Int(1))),
            },
        )
        .build();
        let schema = SchemaBuilder::new("Line")
            .field(FieldBuilder::primitive("base", PrimitiveKind::Int).build())
            .field(computed_field)
            .build();
        let program = program_with(vec![schema]);
        let mut ctx = GenerationContext::new(&program, 4, PluginRegistry::new(), GeneratorOptions::default());
        let record = generate_instance("Line", None, &mut ctx).unwrap();
        let base = record.get("base").unwrap().as_i64().unwrap();
        let total = record.get("total").unwrap().as_i64().unwrap();
        assert_eq!(total, base + 1);
    }
}
