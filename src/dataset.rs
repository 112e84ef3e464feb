//! # Dataset driver (spec §4.K) and the public `Generator` contract (spec §6)
//!
//! Resolves a dataset's collections in dependency order (a collection with
//! `per parent` depends on its parent collection; everything else falls
//! back to declaration order), threads `ctx.parent`/`ctx.previous` the way
//! [`crate::instance_generator`] threads `ctx.current`, and evaluates the
//! dataset-level `validate` block once every collection is materialized.
//!
//! [`Generator`] is the only entry point non-core callers are meant to use
//! (spec §6, "Consumer interface") — it owns context construction so a
//! caller never has to build a [`GenerationContext`] by hand.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{DatasetDefinition, Expr, MatchArm, Program, SchemaDefinition};
use crate::context::{GenerationContext, GeneratorOptions, RetryLimits};
use crate::error::{LoomError, LoomResult};
use crate::evaluator::evaluate;
use crate::field_generator::resolve_cardinality;
use crate::instance_generator::{self, check_assumes, check_contracts};
use crate::plugin::PluginRegistry;
use crate::value::Value;
use crate::warnings::Warning;

/// One failed predicate in a dataset's `validate` block.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub predicate: String,
    pub reason: String,
}

/// The result of evaluating a dataset's `validate` block against its
/// materialized collections (spec §4.K step 4).
#[derive(Debug, Clone, Default)]
pub struct DatasetValidationResult {
    pub failures: Vec<ValidationFailure>,
}

impl DatasetValidationResult {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One record, in one collection, that failed its schema's `assume`
/// clauses or contract invariants under [`Generator::validate`].
#[derive(Debug, Clone)]
pub struct RecordValidationFailure {
    pub collection: String,
    pub index: usize,
    pub schema: String,
    pub reason: String,
}

/// The result of [`Generator::validate`]: external, already-materialized
/// data checked against a schema's `assume`/contract constraints without
/// generating anything (SPEC_FULL supplement: `Generator::validate` fully
/// wired).
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub failures: Vec<RecordValidationFailure>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The outcome of one [`Generator::generate`] call. `error`, when set,
/// means a fatal error aborted the dataset partway through; `collections`
/// still holds every collection that finished before the abort (spec §7,
/// "partial collections are returned to the caller with the error
/// attached").
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    pub collections: IndexMap<String, Vec<Value>>,
    pub warnings: Vec<Warning>,
    pub validation: DatasetValidationResult,
    pub error: Option<LoomError>,
}

/// The sole operation non-core code calls to produce data (spec §6).
pub struct Generator;

impl Generator {
    /// Generates the first dataset declared in `program`, with default
    /// options and an empty plugin registry.
    pub fn generate(program: &Program, seed: u64) -> LoomResult<GenerationOutcome> {
        Generator::generate_with(program, seed, PluginRegistry::new(), GeneratorOptions::default())
    }

    pub fn generate_with(
        program: &Program,
        seed: u64,
        registry: PluginRegistry,
        options: GeneratorOptions,
    ) -> LoomResult<GenerationOutcome> {
        let dataset = program.datasets().next().ok_or(LoomError::NoDatasetDefined)?;
        run_dataset(program, dataset, seed, registry, options, RetryLimits::default())
    }

    /// Generates a specific dataset by name, for programs that declare more
    /// than one.
    pub fn generate_dataset(
        program: &Program,
        dataset_name: &str,
        seed: u64,
        registry: PluginRegistry,
        options: GeneratorOptions,
    ) -> LoomResult<GenerationOutcome> {
        let dataset = program
            .datasets()
            .find(|d| d.name == dataset_name)
            .ok_or_else(|| LoomError::UnknownDataset { name: dataset_name.to_string() })?;
        run_dataset(program, dataset, seed, registry, options, RetryLimits::default())
    }

    /// Like [`Generator::generate_with`], but with caller-supplied retry
    /// limits instead of [`RetryLimits::default`] (spec §9, "retry limits
    /// are configuration, not hardcoded constants").
    pub fn generate_with_retry_limits(
        program: &Program,
        seed: u64,
        registry: PluginRegistry,
        options: GeneratorOptions,
        retry_limits: RetryLimits,
    ) -> LoomResult<GenerationOutcome> {
        let dataset = program.datasets().next().ok_or(LoomError::NoDatasetDefined)?;
        run_dataset(program, dataset, seed, registry, options, retry_limits)
    }

    /// Record-level `assume`/contract validation of externally supplied
    /// data (spec §6). `mapping` names the schema each collection is
    /// checked against.
    pub fn validate(
        program: &Program,
        data: &IndexMap<String, Vec<IndexMap<String, Value>>>,
        mapping: &IndexMap<String, String>,
    ) -> ValidationResult {
        validate_external(program, data, mapping)
    }
}

fn run_dataset(
    program: &Program,
    dataset: &DatasetDefinition,
    seed: u64,
    registry: PluginRegistry,
    options: GeneratorOptions,
    retry_limits: RetryLimits,
) -> LoomResult<GenerationOutcome> {
    let mut ctx = GenerationContext::new(program, seed, registry, options);
    ctx.retry_limits = retry_limits;
    ctx.violating = dataset.violating;

    let order = order_collections(dataset)?;
    let mut error = None;
    for entry in order {
        if ctx.is_cancelled() {
            break;
        }
        if let Err(e) = materialize_collection(dataset, entry, &mut ctx) {
            error = Some(e);
            break;
        }
    }

    let validation = if error.is_none() {
        evaluate_dataset_validation(dataset, &mut ctx)
    } else {
        DatasetValidationResult::default()
    };

    Ok(GenerationOutcome {
        collections: ctx.collections.clone(),
        warnings: ctx.warnings.drain(),
        validation,
        error,
    })
}

/// Topologically orders `dataset`'s collections by the `perParent`
/// relation, ties broken by declaration order (spec §4.K step 1, "the base
/// case is declaration order"). `petgraph::algo::toposort` doesn't promise
/// that tie-break, so this scans in fixed-point passes instead.
fn order_collections(dataset: &DatasetDefinition) -> LoomResult<Vec<&crate::ast::CollectionEntry>> {
    let mut placed_names: HashSet<&str> = HashSet::new();
    let mut placed = Vec::with_capacity(dataset.collections.len());
    let mut remaining: Vec<&crate::ast::CollectionEntry> = dataset.collections.iter().collect();

    while !remaining.is_empty() {
        let mut next_remaining = Vec::new();
        let mut progressed = false;
        for entry in remaining {
            let ready = match &entry.per_parent {
                None => true,
                Some(parent) => placed_names.contains(parent.as_str()),
            };
            if ready {
                placed_names.insert(entry.name.as_str());
                placed.push(entry);
                progressed = true;
            } else {
                next_remaining.push(entry);
            }
        }
        if !progressed {
            return Err(LoomError::ComputedCycle {
                fields: next_remaining.iter().map(|e| e.name.clone()).collect(),
            });
        }
        remaining = next_remaining;
    }
    Ok(placed)
}

fn materialize_collection(
    dataset: &DatasetDefinition,
    entry: &crate::ast::CollectionEntry,
    ctx: &mut GenerationContext,
) -> LoomResult<()> {
    let schema = ctx
        .schema(&entry.schema_ref)
        .cloned()
        .ok_or_else(|| LoomError::UnknownSchema { name: entry.schema_ref.clone() })?;
    let overrides = resolve_context_overrides(dataset, &schema, ctx)?;
    ctx.collections.entry(entry.name.clone()).or_default();

    let mut seen = 0usize;
    match &entry.per_parent {
        None => {
            let n = resolve_cardinality(&entry.cardinality, ctx)?;
            for _ in 0..n {
                if ctx.is_cancelled() {
                    break;
                }
                append_item(entry, &overrides, &mut seen, ctx)?;
            }
        }
        Some(parent_name) => {
            let parents: Vec<Value> = ctx.collection(parent_name).map(|s| s.to_vec()).unwrap_or_default();
            for parent in parents {
                if ctx.is_cancelled() {
                    break;
                }
                let previous_parent = ctx.parent.replace(parent);
                let n = resolve_cardinality(&entry.cardinality, ctx)?;
                for _ in 0..n {
                    if ctx.is_cancelled() {
                        break;
                    }
                    append_item(entry, &overrides, &mut seen, ctx)?;
                }
                ctx.parent = previous_parent;
            }
        }
    }
    ctx.previous = None;
    Ok(())
}

fn append_item(
    entry: &crate::ast::CollectionEntry,
    overrides: &IndexMap<String, Value>,
    seen: &mut usize,
    ctx: &mut GenerationContext,
) -> LoomResult<()> {
    ctx.previous = if *seen == 0 {
        None
    } else {
        ctx.collections.get(&entry.name).and_then(|v| v.last().cloned())
    };
    let record = instance_generator::generate_instance(&entry.schema_ref, Some(overrides), ctx)?;
    ctx.collections.entry(entry.name.clone()).or_default().push(Value::Object(record));
    *seen += 1;
    Ok(())
}

/// Computes the field overrides contributed by a dataset's `with Ctx` and a
/// schema's own `with Ctx(args)` applications (SPEC_FULL supplement: context
/// `affects` overrides are actually applied, not just parsed). Schema-level
/// contexts take precedence over dataset-level ones. `args` on a schema's
/// [`ContextApplication`] is accepted syntactically but unused here —
/// `ContextDefinition::affects` isn't parameterized (spec GLOSSARY: contexts
/// are "treated as syntactic sugar").
fn resolve_context_overrides(
    dataset: &DatasetDefinition,
    schema: &SchemaDefinition,
    ctx: &mut GenerationContext,
) -> LoomResult<IndexMap<String, Value>> {
    let mut overrides = IndexMap::new();
    for name in &dataset.contexts {
        apply_context(name, &mut overrides, ctx)?;
    }
    for application in &schema.contexts {
        apply_context(&application.name, &mut overrides, ctx)?;
    }
    Ok(overrides)
}

fn apply_context(name: &str, overrides: &mut IndexMap<String, Value>, ctx: &mut GenerationContext) -> LoomResult<()> {
    let context = ctx
        .context_definition(name)
        .cloned()
        .ok_or_else(|| LoomError::UnknownContext { name: name.to_string() })?;
    for (field, expr) in &context.affects {
        let value = evaluate(expr, ctx)?;
        overrides.insert(field.clone(), value);
    }
    Ok(())
}

fn evaluate_dataset_validation(dataset: &DatasetDefinition, ctx: &mut GenerationContext) -> DatasetValidationResult {
    let mut failures = Vec::new();
    for predicate in &dataset.validation {
        let text = expr_to_text(predicate);
        match evaluate(predicate, ctx) {
            Ok(v) if v.truthy() => {}
            Ok(_) => failures.push(ValidationFailure {
                predicate: text,
                reason: "evaluated to a falsy value".to_string(),
            }),
            Err(e) => failures.push(ValidationFailure { predicate: text, reason: e.to_string() }),
        }
    }
    DatasetValidationResult { failures }
}

fn validate_external(
    program: &Program,
    data: &IndexMap<String, Vec<IndexMap<String, Value>>>,
    mapping: &IndexMap<String, String>,
) -> ValidationResult {
    let mut ctx = GenerationContext::new(program, 0, PluginRegistry::new(), GeneratorOptions::default());
    let mut failures = Vec::new();

    for (collection, records) in data {
        let Some(schema_name) = mapping.get(collection) else {
            failures.push(RecordValidationFailure {
                collection: collection.clone(),
                index: 0,
                schema: String::new(),
                reason: format!("no schema mapping given for collection {collection:?}"),
            });
            continue;
        };
        let Some(schema) = ctx.schema(schema_name).cloned() else {
            failures.push(RecordValidationFailure {
                collection: collection.clone(),
                index: 0,
                schema: schema_name.clone(),
                reason: format!("unknown schema {schema_name:?}"),
            });
            continue;
        };
        for (index, record) in records.iter().enumerate() {
            ctx.current = Some(record.clone());
            let assumes_ok = check_assumes(&schema, &mut ctx);
            let contracts_ok = check_contracts(&schema, &mut ctx).unwrap_or(false);
            if !assumes_ok || !contracts_ok {
                failures.push(RecordValidationFailure {
                    collection: collection.clone(),
                    index,
                    schema: schema_name.clone(),
                    reason: if !contracts_ok {
                        "contract invariant violated".to_string()
                    } else {
                        "assume clause violated".to_string()
                    },
                });
            }
        }
    }
    ctx.current = None;
    ValidationResult { failures }
}

/// A compact, non-exhaustive rendering of an expression for diagnostic text
/// (spec §4.K step 4: "the predicate rendered as text"). Not a parser round
/// trip — just enough for a human to recognize which predicate failed.
fn expr_to_text(expr: &Expr) -> String {
    use crate::ast::{BinaryOp, LogicalOp, UnaryOp};

    match expr {
        Expr::Literal(v) => v.to_string(),
        Expr::Identifier(name) => name.clone(),
        Expr::QualifiedName(parts) => parts.join("."),
        Expr::Binary { op, left, right } => {
            let sym = match op {
                BinaryOp::Add => "+",
                BinaryOp::Sub => "-",
                BinaryOp::Mul => "*",
                BinaryOp::Div => "/",
                BinaryOp::Eq => "==",
                BinaryOp::NotEq => "!=",
                BinaryOp::Lt => "<",
                BinaryOp::Gt => ">",
                BinaryOp::Le => "<=",
                BinaryOp::Ge => ">=",
                BinaryOp::Dot => ".",
            };
            format!("{} {sym} {}", expr_to_text(left), expr_to_text(right))
        }
        Expr::Logical { op, left, right } => {
            let sym = match op {
                LogicalOp::And => "&&",
                LogicalOp::Or => "||",
            };
            format!("{} {sym} {}", expr_to_text(left), expr_to_text(right))
        }
        Expr::Not(e) => format!("!{}", expr_to_text(e)),
        Expr::Unary { op, operand } => {
            let sym = match op {
                UnaryOp::Plus => "+",
                UnaryOp::Minus => "-",
            };
            format!("{sym}{}", expr_to_text(operand))
        }
        Expr::Range { min, max } => format!(
            "{}..{}",
            min.as_ref().map(|e| expr_to_text(e)).unwrap_or_default(),
            max.as_ref().map(|e| expr_to_text(e)).unwrap_or_default()
        ),
        Expr::Superposition { .. } => "<superposition>".to_string(),
        Expr::Call { callee, args } => {
            format!("{callee}({})", args.iter().map(expr_to_text).collect::<Vec<_>>().join(", "))
        }
        Expr::Ternary { condition, then_branch, else_branch } => {
            format!(
                "{} ? {} : {}",
                expr_to_text(condition),
                expr_to_text(then_branch),
                expr_to_text(else_branch)
            )
        }
        Expr::Match { value, arms } => format!("match {} {{ {} arms }}", expr_to_text(value), arms_len(arms)),
        Expr::ParentRef { path } => format!("^{}", path.join(".")),
        Expr::AnyOf { collection, .. } => format!("any of {}", expr_to_text(collection)),
        Expr::OrderedSequence { elements } => format!("[{}]", elements.iter().map(expr_to_text).collect::<Vec<_>>().join(", ")),
    }
}

fn arms_len(arms: &[MatchArm]) -> usize {
    arms.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::{DatasetBuilder, FieldBuilder, SchemaBuilder};
    use crate::ast::{BinaryOp, Cardinality, CollectionEntry, ContextApplication, ContextDefinition, PrimitiveKind, Statement};

    fn program(statements: Vec<Statement>) -> Program {
        Program { statements }
    }

    fn invoice_schema() -> SchemaDefinition {
        SchemaBuilder::new("Invoice")
            .field(
                FieldBuilder::new(
                    "amount",
                    crate::ast::FieldType::Range {
                        base: PrimitiveKind::Decimal,
                        min: Some(Box::new(Expr::Literal(Value::Int(1)))),
                        max: Some(Box::new(Expr::Literal(Value::Int(1000)))),
                    },
                )
                .build(),
            )
            .build()
    }

    #[test]
    fn generate_produces_requested_cardinality() {
        let dataset = DatasetBuilder::new("T").collection("invoices", Cardinality::exact(50), "Invoice").build();
        let p = program(vec![Statement::Schema(invoice_schema()), Statement::Dataset(dataset)]);
        let outcome = Generator::generate(&p, 42).unwrap();
        assert!(outcome.error.is_none());
        let invoices = outcome.collections.get("invoices").unwrap();
        assert_eq!(invoices.len(), 50);
        for record in invoices {
            let amount = record.as_object().unwrap().get("amount").unwrap().as_f64().unwrap();
            assert!((1.0..=1000.0).contains(&amount));
        }
    }

    #[test]
    fn determinism_same_seed_same_output() {
        let dataset = DatasetBuilder::new("T").collection("invoices", Cardinality::exact(10), "Invoice").build();
        let p = program(vec![Statement::Schema(invoice_schema()), Statement::Dataset(dataset)]);
        let a = Generator::generate(&p, 7).unwrap();
        let b = Generator::generate(&p, 7).unwrap();
        assert_eq!(format!("{:?}", a.collections), format!("{:?}", b.collections));
    }

    #[test]
    fn per_parent_collection_links_to_its_parent() {
        let parent = SchemaBuilder::new("C")
            .field(FieldBuilder::primitive("id", PrimitiveKind::Int).unique().build())
            .build();
        let child = SchemaBuilder::new("I")
            .field(
                FieldBuilder::new(
                    "parent_id",
                    crate::ast::FieldType::ExpressionType(Box::new(Expr::ParentRef { path: vec!["id".to_string()] })),
                )
                .build(),
            )
            .build();
        let dataset = DatasetBuilder::new("T")
            .collection("c", Cardinality::exact(4), "C")
            .collection_per_parent("i", Cardinality::Static { min: 2, max: 3 }, "I", "c")
            .build();
        let p = program(vec![Statement::Schema(parent), Statement::Schema(child), Statement::Dataset(dataset)]);
        let outcome = Generator::generate(&p, 11).unwrap();
        assert!(outcome.error.is_none());

        let parents = outcome.collections.get("c").unwrap();
        let children = outcome.collections.get("i").unwrap();
        assert!(children.len() >= 8 && children.len() <= 12);

        let parent_ids: HashSet<i64> = parents
            .iter()
            .map(|p| p.as_object().unwrap().get("id").unwrap().as_i64().unwrap())
            .collect();
        for child in children {
            let parent_id = child.as_object().unwrap().get("parent_id").unwrap().as_i64().unwrap();
            assert!(parent_ids.contains(&parent_id));
        }
    }

    #[test]
    fn collections_are_ordered_with_per_parent_after_parent() {
        let entries = vec![
            CollectionEntry {
                name: "i".to_string(),
                cardinality: Cardinality::exact(1),
                schema_ref: "I".to_string(),
                per_parent: Some("c".to_string()),
            },
            CollectionEntry {
                name: "c".to_string(),
                cardinality: Cardinality::exact(1),
                schema_ref: "C".to_string(),
                per_parent: None,
            },
        ];
        let dataset = DatasetDefinition {
            name: "T".to_string(),
            collections: entries,
            contexts: vec![],
            validation: vec![],
            violating: false,
        };
        let order = order_collections(&dataset).unwrap();
        assert_eq!(order[0].name, "c");
        assert_eq!(order[1].name, "i");
    }

    #[test]
    fn unresolvable_per_parent_relation_is_a_cycle_error() {
        let entries = vec![CollectionEntry {
            name: "i".to_string(),
            cardinality: Cardinality::exact(1),
            schema_ref: "I".to_string(),
            per_parent: Some("missing".to_string()),
        }];
        let dataset = DatasetDefinition {
            name: "T".to_string(),
            collections: entries,
            contexts: vec![],
            validation: vec![],
            violating: false,
        };
        assert!(matches!(order_collections(&dataset), Err(LoomError::ComputedCycle { .. })));
    }

    #[test]
    fn violating_dataset_allows_assume_breach_but_not_contract() {
        let contract = crate::ast::ContractDefinition {
            name: "P".to_string(),
            invariants: vec![crate::ast::InlineInvariant {
                condition: None,
                constraints: vec![Expr::Binary {
                    op: BinaryOp::Gt,
                    left: Box::new(Expr::Identifier("due".to_string())),
                    right: Box::new(Expr::Literal(Value::Int(0))),
                }],
                message: None,
            }],
        };
        let schema = SchemaBuilder::new("I")
            .field(
                FieldBuilder::new(
                    "issued",
                    crate::ast::FieldType::Range {
                        base: PrimitiveKind::Int,
                        min: Some(Box::new(Expr::Literal(Value::Int(1)))),
                        max: Some(Box::new(Expr::Literal(Value::Int(20)))),
                    },
                )
                .build(),
            )
            .field(
                FieldBuilder::new(
                    "due",
                    crate::ast::FieldType::Range {
                        base: PrimitiveKind::Int,
                        min: Some(Box::new(Expr::Literal(Value::Int(1)))),
                        max: Some(Box::new(Expr::Literal(Value::Int(30)))),
                    },
                )
                .build(),
            )
            .assume(
                None,
                vec![Expr::Binary {
                    op: BinaryOp::Ge,
                    left: Box::new(Expr::Identifier("due".to_string())),
                    right: Box::new(Expr::Identifier("issued".to_string())),
                }],
            )
            .implements("P")
            .build();
        let dataset = DatasetBuilder::new("T").collection("items", Cardinality::exact(50), "I").violating().build();
        let p = program(vec![Statement::Contract(contract), Statement::Schema(schema), Statement::Dataset(dataset)]);
        let outcome = Generator::generate(&p, 3).unwrap();
        let items = outcome.collections.get("items").unwrap();
        for item in items {
            let due = item.as_object().unwrap().get("due").unwrap().as_i64().unwrap();
            assert!(due > 0);
        }
    }

    #[test]
    fn schema_context_override_is_applied() {
        let context = ContextDefinition {
            name: "Forced".to_string(),
            affects: vec![("amount".to_string(), Expr::Literal(Value::Decimal(42.0)))],
        };
        let mut schema = invoice_schema();
        schema.contexts.push(ContextApplication { name: "Forced".to_string(), args: vec![] });
        let dataset = DatasetBuilder::new("T").collection("invoices", Cardinality::exact(5), "Invoice").build();
        let p = program(vec![Statement::Context(context), Statement::Schema(schema), Statement::Dataset(dataset)]);
        let outcome = Generator::generate(&p, 1).unwrap();
        for record in outcome.collections.get("invoices").unwrap() {
            let amount = record.as_object().unwrap().get("amount").unwrap().as_f64().unwrap();
            assert_eq!(amount, 42.0);
        }
    }

    #[test]
    fn dataset_validation_block_reports_failing_predicate() {
        let dataset = DatasetDefinition {
            name: "T".to_string(),
            collections: vec![crate::ast::CollectionEntry {
                name: "invoices".to_string(),
                cardinality: Cardinality::exact(3),
                schema_ref: "Invoice".to_string(),
                per_parent: None,
            }],
            contexts: vec![],
            validation: vec![Expr::Literal(Value::Bool(false))],
            violating: false,
        };
        let p = program(vec![Statement::Schema(invoice_schema()), Statement::Dataset(dataset)]);
        let outcome = Generator::generate(&p, 1).unwrap();
        assert!(!outcome.validation.is_valid());
        assert_eq!(outcome.validation.failures.len(), 1);
    }

    #[test]
    fn validate_flags_records_that_break_assume_clauses() {
        let schema = SchemaBuilder::new("I")
            .field(FieldBuilder::primitive("due", PrimitiveKind::Int).build())
            .assume(
                None,
                vec![Expr::Binary {
                    op: BinaryOp::Gt,
                    left: Box::new(Expr::Identifier("due".to_string())),
                    right: Box::new(Expr::Literal(Value::Int(0))),
                }],
            )
            .build();
        let p = program(vec![Statement::Schema(schema)]);

        let mut record = IndexMap::new();
        record.insert("due".to_string(), Value::Int(-1));
        let mut data = IndexMap::new();
        data.insert("items".to_string(), vec![record]);
        let mut mapping = IndexMap::new();
        mapping.insert("items".to_string(), "I".to_string());

        let result = Generator::validate(&p, &data, &mapping);
        assert!(!result.is_valid());
        assert_eq!(result.failures[0].collection, "items");
    }

    #[test]
    fn generate_without_a_dataset_is_an_error() {
        let p = program(vec![Statement::Schema(invoice_schema())]);
        assert!(matches!(Generator::generate(&p, 1), Err(LoomError::NoDatasetDefined)));
    }
}
