//! # Expression evaluator (spec §4.H)
//!
//! A mostly-pure evaluator over [`crate::ast::Expr`] against a
//! [`GenerationContext`]: the only mutation it performs is through the
//! context (RNG draws, sequence counters, unique-value claims, warnings).
//! Call dispatch order is fixed and total, matching the tiers in spec §4.H:
//! aggregates → math → distributions → date → string → sequence →
//! predicates → `unique` → plugin registry.

use indexmap::IndexMap;

use crate::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::context::GenerationContext;
use crate::error::{LoomError, LoomResult};
use crate::plugin::call_plugin;
use crate::primitives::generate_primitive;
use crate::value::Value;

pub fn evaluate(expr: &Expr, ctx: &mut GenerationContext) -> LoomResult<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Identifier(name) => evaluate_identifier(name, ctx),
        Expr::QualifiedName(parts) => evaluate_qualified_name(parts, ctx),
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, ctx),
        Expr::Logical { op, left, right } => evaluate_logical(*op, left, right, ctx),
        Expr::Not(operand) => Ok(Value::Bool(!evaluate(operand, ctx)?.truthy())),
        Expr::Unary { op, operand } => evaluate_unary(*op, operand, ctx),
        Expr::Range { min, max } => evaluate_range(min, max, ctx),
        Expr::Superposition { options } => evaluate_superposition(options, ctx),
        Expr::Call { callee, args } => evaluate_call(callee, args, ctx),
        Expr::Ternary { condition, then_branch, else_branch } => {
            if evaluate(condition, ctx)?.truthy() {
                evaluate(then_branch, ctx)
            } else {
                evaluate(else_branch, ctx)
            }
        }
        Expr::Match { value, arms } => evaluate_match(value, arms, ctx),
        Expr::ParentRef { path } => Ok(evaluate_parent_ref(path, ctx)),
        Expr::AnyOf { collection, condition } => evaluate_any_of(collection, condition.as_deref(), ctx),
        Expr::OrderedSequence { elements } => {
            let values = elements
                .iter()
                .map(|e| evaluate(e, ctx))
                .collect::<LoomResult<Vec<_>>>()?;
            Ok(Value::List(values))
        }
    }
}

fn evaluate_identifier(name: &str, ctx: &mut GenerationContext) -> LoomResult<Value> {
    if let Some(kind) = crate::ast::PrimitiveKind::from_name(name) {
        let schema = ctx.current_schema_name.clone().unwrap_or_default();
        return Ok(generate_primitive(kind, None, &schema, name, ctx));
    }
    if let Some(binding) = ctx.binding(name).cloned() {
        return evaluate(&binding, ctx);
    }
    if ctx.collection(name).is_some() {
        return Ok(Value::List(ctx.collection(name).unwrap().to_vec()));
    }
    Ok(lookup_current_field(ctx, name))
}

fn lookup_current_field(ctx: &GenerationContext, name: &str) -> Value {
    ctx.current
        .as_ref()
        .and_then(|rec| rec.get(name))
        .cloned()
        .unwrap_or(Value::Null)
}

fn evaluate_qualified_name(parts: &[String], ctx: &mut GenerationContext) -> LoomResult<Value> {
    let (head, tail) = parts.split_first().expect("qualified name has at least one segment");
    if let Some(binding) = ctx.binding(head).cloned() {
        let base = evaluate(&binding, ctx)?;
        return Ok(walk_path(&base, tail));
    }
    if let Some(items) = ctx.collection(head) {
        let items = items.to_vec();
        let projected: Vec<Value> = items
            .iter()
            .map(|item| walk_path(item, tail))
            .filter(|v| !v.is_null())
            .collect();
        return Ok(Value::List(projected));
    }
    let base = lookup_current_field(ctx, head);
    Ok(walk_path(&base, tail))
}

/// Walks a dotted field path through nested objects, returning `Null` as
/// soon as any step is absent or not an object.
fn walk_path(start: &Value, path: &[String]) -> Value {
    let mut current = start.clone();
    for segment in path {
        current = match current.as_object().and_then(|o| o.get(segment)) {
            Some(v) => v.clone(),
            None => return Value::Null,
        };
    }
    current
}

fn evaluate_parent_ref(path: &[String], ctx: &GenerationContext) -> Value {
    match &ctx.parent {
        Some(parent) => walk_path(parent, path),
        None => Value::Null,
    }
}

fn evaluate_binary(op: BinaryOp, left: &Expr, right: &Expr, ctx: &mut GenerationContext) -> LoomResult<Value> {
    if op == BinaryOp::Dot {
        let base = evaluate(left, ctx)?;
        let field = match right {
            Expr::Identifier(name) => name.as_str(),
            other => return Err(LoomError::ArithmeticError {
                message: format!("member access right-hand side must be a field name, got {other:?}"),
            }),
        };
        return Ok(base.as_object().and_then(|o| o.get(field)).cloned().unwrap_or(Value::Null));
    }

    let l = evaluate(left, ctx)?;
    let r = evaluate(right, ctx)?;

    if matches!(op, BinaryOp::Eq) {
        return Ok(Value::Bool(l.values_equal(&r)));
    }
    if matches!(op, BinaryOp::NotEq) {
        return Ok(Value::Bool(!l.values_equal(&r)));
    }
    if matches!(op, BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge) {
        let ordering = l
            .partial_cmp_value(&r)
            .ok_or_else(|| LoomError::ArithmeticError {
                message: format!("cannot compare {} and {}", l.type_name(), r.type_name()),
            })?;
        let result = match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Ge => ordering.is_ge(),
            _ => unreachable!(),
        };
        return Ok(Value::Bool(result));
    }

    // Date ± duration (spec §4.H Binary, §9 "Date arithmetic").
    if let (Value::Date(d), Value::Duration(dur)) = (&l, &r) {
        let delta = chrono::Duration::days(dur.days);
        let result = match op {
            BinaryOp::Add => *d + delta,
            BinaryOp::Sub => *d - delta,
            _ => return Err(arithmetic_type_error(op, &l, &r)),
        };
        return Ok(Value::Date(result));
    }

    if let (Value::Str(a), Value::Str(b)) = (&l, &r) {
        if op == BinaryOp::Add {
            return Ok(Value::Str(format!("{a}{b}")));
        }
    }

    let a = l.as_f64().ok_or_else(|| arithmetic_type_error(op, &l, &r))?;
    let b = r.as_f64().ok_or_else(|| arithmetic_type_error(op, &l, &r))?;
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(LoomError::ArithmeticError { message: "division by zero".to_string() });
            }
            a / b
        }
        _ => unreachable!("comparisons handled above"),
    };
    Ok(numeric_result(l, r, result))
}

fn arithmetic_type_error(op: BinaryOp, l: &Value, r: &Value) -> LoomError {
    LoomError::ArithmeticError {
        message: format!("cannot apply {op:?} to {} and {}", l.type_name(), r.type_name()),
    }
}

/// Keeps integer arithmetic in `Int` when both operands were integral.
fn numeric_result(l: Value, r: Value, result: f64) -> Value {
    if matches!(l, Value::Int(_)) && matches!(r, Value::Int(_)) && result.fract() == 0.0 {
        Value::Int(result as i64)
    } else {
        Value::Decimal(result)
    }
}

fn evaluate_logical(op: LogicalOp, left: &Expr, right: &Expr, ctx: &mut GenerationContext) -> LoomResult<Value> {
    let l = evaluate(left, ctx)?;
    match op {
        LogicalOp::And => {
            if !l.truthy() {
                Ok(Value::Bool(false))
            } else {
                Ok(Value::Bool(evaluate(right, ctx)?.truthy()))
            }
        }
        LogicalOp::Or => {
            if l.truthy() {
                Ok(Value::Bool(true))
            } else {
                Ok(Value::Bool(evaluate(right, ctx)?.truthy()))
            }
        }
    }
}

fn evaluate_unary(op: UnaryOp, operand: &Expr, ctx: &mut GenerationContext) -> LoomResult<Value> {
    let v = evaluate(operand, ctx)?;
    let n = v.as_f64().ok_or_else(|| LoomError::ArithmeticError {
        message: format!("cannot apply unary operator to {}", v.type_name()),
    })?;
    let result = match op {
        UnaryOp::Plus => n,
        UnaryOp::Minus => -n,
    };
    Ok(numeric_result(v.clone(), v, result))
}

fn evaluate_range(min: &Option<Box<Expr>>, max: &Option<Box<Expr>>, ctx: &mut GenerationContext) -> LoomResult<Value> {
    let min_v = match min {
        Some(e) => evaluate(e, ctx)?,
        None => Value::Null,
    };
    let max_v = match max {
        Some(e) => evaluate(e, ctx)?,
        None => Value::Null,
    };
    Ok(Value::Range { min: Box::new(min_v), max: Box::new(max_v) })
}

/// Weighted pick (spec §4.H "Superposition"). Unweighted options share the
/// remainder equally; explicit weights that sum to more than 1 are
/// normalized, not clamped (spec §9 Open question).
fn evaluate_superposition(options: &[crate::ast::SuperpositionOption], ctx: &mut GenerationContext) -> LoomResult<Value> {
    if options.is_empty() {
        return Ok(Value::Null);
    }
    let explicit_sum: f64 = options.iter().filter_map(|o| o.weight).sum();
    let unweighted_count = options.iter().filter(|o| o.weight.is_none()).count();
    let normalizer = if explicit_sum > 1.0 { explicit_sum } else { 1.0 };
    let remainder = (1.0 - explicit_sum).max(0.0);
    let share = if unweighted_count > 0 { remainder / unweighted_count as f64 } else { 0.0 };

    let weights: Vec<f64> = options
        .iter()
        .map(|o| o.weight.map(|w| w / normalizer).unwrap_or(share))
        .collect();
    let total: f64 = weights.iter().sum();
    let mut roll = ctx.rng.random() * total;
    let mut chosen = options.last().expect("non-empty");
    for (option, weight) in options.iter().zip(weights.iter()) {
        if roll < *weight {
            chosen = option;
            break;
        }
        roll -= weight;
    }
    let value = evaluate(&chosen.value, ctx)?;
    resolve_if_range(value, ctx)
}

/// If a picked option (or any evaluated expression landing here) is an
/// unresolved `Range`, draws a concrete uniform value from it.
pub fn resolve_if_range(value: Value, ctx: &mut GenerationContext) -> LoomResult<Value> {
    match value {
        Value::Range { min, max } => {
            let lo = min.as_i64().unwrap_or(0);
            let hi = max.as_i64().unwrap_or(lo);
            Ok(Value::Int(ctx.rng.random_int(lo.min(hi), lo.max(hi))))
        }
        other => Ok(other),
    }
}

fn evaluate_match(value: &Expr, arms: &[crate::ast::MatchArm], ctx: &mut GenerationContext) -> LoomResult<Value> {
    let subject = evaluate(value, ctx)?;
    for arm in arms {
        let pattern = evaluate(&arm.pattern, ctx)?;
        if subject.values_equal(&pattern) {
            return evaluate(&arm.result, ctx);
        }
    }
    Ok(Value::Null)
}

fn evaluate_any_of(collection: &Expr, condition: Option<&Expr>, ctx: &mut GenerationContext) -> LoomResult<Value> {
    let items = match evaluate(collection, ctx)? {
        Value::List(v) => v,
        other => return Ok(other),
    };
    let candidates: Vec<Value> = match condition {
        None => items,
        Some(cond) => {
            let mut kept = Vec::new();
            for item in items {
                if with_scoped_current(ctx, item.clone(), |ctx| evaluate(cond, ctx))?.truthy() {
                    kept.push(item);
                }
            }
            kept
        }
    };
    Ok(ctx.rng.random_choice(&candidates).cloned().unwrap_or(Value::Null))
}

/// Temporarily binds `ctx.current` to `item` (an object-like candidate) for
/// the duration of `f`, restoring the previous value afterward — used by
/// `any of … where …` and the predicate functions (spec §4.H).
fn with_scoped_current<T>(
    ctx: &mut GenerationContext,
    item: Value,
    f: impl FnOnce(&mut GenerationContext) -> LoomResult<T>,
) -> LoomResult<T> {
    let previous = ctx.current.take();
    ctx.current = item.as_object().cloned().or_else(|| {
        let mut m = IndexMap::new();
        m.insert("value".to_string(), item);
        Some(m)
    });
    let result = f(ctx);
    ctx.current = previous;
    result
}

// ============================================================================
// Call dispatch (spec §4.H): aggregates, math, distributions, date, string,
// sequence, predicates, unique, then plugin registry. Order is fixed.
// ============================================================================

fn evaluate_call(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Value> {
    if let Some(v) = try_aggregate(callee, args, ctx)? {
        return Ok(v);
    }
    if let Some(v) = try_math(callee, args, ctx)? {
        return Ok(v);
    }
    if let Some(v) = try_distribution(callee, args, ctx)? {
        return Ok(v);
    }
    if let Some(v) = try_date(callee, args, ctx)? {
        return Ok(v);
    }
    if let Some(v) = try_string(callee, args, ctx)? {
        return Ok(v);
    }
    if let Some(v) = try_sequence(callee, args, ctx)? {
        return Ok(v);
    }
    if let Some(v) = try_predicate(callee, args, ctx)? {
        return Ok(v);
    }
    if callee == "unique" {
        return evaluate_unique(args, ctx);
    }
    if callee == "mod" {
        let a = evaluate(&args[0], ctx)?.as_f64().unwrap_or(0.0);
        let b = evaluate(&args[1], ctx)?.as_f64().unwrap_or(1.0);
        return Ok(Value::Int((a as i64).rem_euclid(b.max(1.0) as i64)));
    }

    let values = args.iter().map(|a| evaluate(a, ctx)).collect::<LoomResult<Vec<_>>>()?;
    match call_plugin(&ctx.registry.clone(), callee, &values, ctx) {
        // Spec §4.C "Failure modes": an unknown generator is fatal in
        // strict mode; in lenient mode the evaluator surfaces a typed
        // error value instead of aborting the whole generation run.
        Err(LoomError::UnknownGenerator { name }) if !ctx.options.strict => {
            Ok(Value::Error(format!("unknown-generator:{name}")))
        }
        other => other,
    }
}

fn list_arg(args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Vec<Value>> {
    let first = args.first().ok_or_else(|| LoomError::ArithmeticError {
        message: "expected a collection argument".to_string(),
    })?;
    match evaluate(first, ctx)? {
        Value::List(v) => Ok(v),
        other => Ok(vec![other]),
    }
}

fn numeric_values(items: &[Value]) -> Vec<f64> {
    items.iter().filter_map(|v| v.as_f64()).collect()
}

fn try_aggregate(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Option<Value>> {
    let result = match callee {
        "count" => Value::Int(list_arg(args, ctx)?.len() as i64),
        "sum" => Value::Decimal(numeric_values(&list_arg(args, ctx)?).iter().sum()),
        "avg" => {
            let nums = numeric_values(&list_arg(args, ctx)?);
            if nums.is_empty() {
                Value::Null
            } else {
                Value::Decimal(nums.iter().sum::<f64>() / nums.len() as f64)
            }
        }
        "min" => numeric_values(&list_arg(args, ctx)?)
            .into_iter()
            .fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |a| a.min(n))))
            .map(Value::Decimal)
            .unwrap_or(Value::Null),
        "max" => numeric_values(&list_arg(args, ctx)?)
            .into_iter()
            .fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |a| a.max(n))))
            .map(Value::Decimal)
            .unwrap_or(Value::Null),
        "product" => {
            let nums = numeric_values(&list_arg(args, ctx)?);
            Value::Decimal(nums.iter().product())
        }
        "first" => list_arg(args, ctx)?.into_iter().next().unwrap_or(Value::Null),
        "last" => list_arg(args, ctx)?.into_iter().last().unwrap_or(Value::Null),
        "median" => {
            let mut nums = numeric_values(&list_arg(args, ctx)?);
            if nums.is_empty() {
                Value::Null
            } else {
                nums.sort_by(|a, b| a.partial_cmp(b).unwrap());
                let mid = nums.len() / 2;
                if nums.len() % 2 == 0 {
                    Value::Decimal((nums[mid - 1] + nums[mid]) / 2.0)
                } else {
                    Value::Decimal(nums[mid])
                }
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn try_math(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Option<Value>> {
    let arg_value = |i: usize, ctx: &mut GenerationContext| -> LoomResult<f64> {
        Ok(evaluate(&args[i], ctx)?.as_f64().unwrap_or(0.0))
    };
    let result = match callee {
        "round" => Value::Int(arg_value(0, ctx)?.round() as i64),
        "floor" => Value::Int(arg_value(0, ctx)?.floor() as i64),
        "ceil" => Value::Int(arg_value(0, ctx)?.ceil() as i64),
        "abs" => Value::Decimal(arg_value(0, ctx)?.abs()),
        "sqrt" => Value::Decimal(arg_value(0, ctx)?.sqrt()),
        "pow" => Value::Decimal(arg_value(0, ctx)?.powf(arg_value(1, ctx)?)),
        _ => return Ok(None),
    };
    Ok(Some(result))
}

/// `dist(name)`: weighted pick from a top-level `distribution` block, using
/// the same weighted-pick semantics as an inline superposition.
fn try_distribution(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Option<Value>> {
    if callee != "dist" {
        return Ok(None);
    }
    let name = match args.first() {
        Some(Expr::Identifier(n)) => n.clone(),
        Some(other) => evaluate(other, ctx)?.to_string(),
        None => return Ok(Some(Value::Null)),
    };
    let Some(dist) = ctx.distribution(&name).cloned() else {
        return Ok(Some(Value::Null));
    };
    let options: Vec<crate::ast::SuperpositionOption> = dist
        .entries
        .into_iter()
        .map(|(value, weight)| crate::ast::SuperpositionOption { weight: Some(weight / 100.0), value })
        .collect();
    Ok(Some(evaluate_superposition(&options, ctx)?))
}

fn try_date(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Option<Value>> {
    let result = match callee {
        "today" => Value::Date(chrono::Utc::now().date_naive()),
        "year" => match evaluate(&args[0], ctx)? {
            Value::Date(d) => Value::Int(chrono::Datelike::year(&d) as i64),
            _ => Value::Null,
        },
        "month" => match evaluate(&args[0], ctx)? {
            Value::Date(d) => Value::Int(chrono::Datelike::month(&d) as i64),
            _ => Value::Null,
        },
        "day" => match evaluate(&args[0], ctx)? {
            Value::Date(d) => Value::Int(chrono::Datelike::day(&d) as i64),
            _ => Value::Null,
        },
        "addDays" => {
            let date = evaluate(&args[0], ctx)?;
            let days = evaluate(&args[1], ctx)?.as_i64().unwrap_or(0);
            match date {
                Value::Date(d) => Value::Date(d + chrono::Duration::days(days)),
                _ => Value::Null,
            }
        }
        // Constructs the first-class duration value that `date ± duration`
        // (the Binary handler above) consumes (spec §9 "Date arithmetic").
        "days" => Value::Duration(crate::value::Duration::days(
            evaluate(&args[0], ctx)?.as_i64().unwrap_or(0),
        )),
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn try_string(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Option<Value>> {
    let str_arg = |i: usize, ctx: &mut GenerationContext| -> LoomResult<String> {
        Ok(evaluate(&args[i], ctx)?.to_string())
    };
    let result = match callee {
        "concat" => {
            let mut out = String::new();
            for a in args {
                out.push_str(&evaluate(a, ctx)?.to_string());
            }
            Value::Str(out)
        }
        "upper" => Value::Str(str_arg(0, ctx)?.to_uppercase()),
        "lower" => Value::Str(str_arg(0, ctx)?.to_lowercase()),
        "trim" => Value::Str(str_arg(0, ctx)?.trim().to_string()),
        "length" => Value::Int(str_arg(0, ctx)?.chars().count() as i64),
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn try_sequence(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Option<Value>> {
    let result = match callee {
        "sequence" => {
            let prefix = evaluate(&args[0], ctx)?.to_string();
            let start = args.get(1).map(|e| evaluate(e, ctx)).transpose()?.and_then(|v| v.as_i64()).unwrap_or(1);
            let n = ctx.next_sequence(&format!("str:{prefix}"), start);
            Value::Str(format!("{prefix}{n}"))
        }
        "sequenceInt" => {
            let name = evaluate(&args[0], ctx)?.to_string();
            let start = args.get(1).map(|e| evaluate(e, ctx)).transpose()?.and_then(|v| v.as_i64()).unwrap_or(1);
            Value::Int(ctx.next_sequence(&format!("int:{name}"), start))
        }
        "previous" => {
            let field = evaluate(&args[0], ctx)?.to_string();
            match &ctx.previous {
                Some(prev) => prev.as_object().and_then(|o| o.get(&field)).cloned().unwrap_or(Value::Null),
                None => Value::Null,
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

/// `all/some/none/filter` receive *unevaluated* argument expressions; each
/// item in the collection is evaluated against the predicate with a scoped
/// `current` (spec §4.H).
fn try_predicate(callee: &str, args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Option<Value>> {
    if !matches!(callee, "all" | "some" | "none" | "filter") {
        return Ok(None);
    }
    let items = list_arg(&args[..1], ctx)?;
    let predicate = &args[1];
    let mut matched = Vec::new();
    for item in &items {
        if with_scoped_current(ctx, item.clone(), |ctx| evaluate(predicate, ctx))?.truthy() {
            matched.push(item.clone());
        }
    }
    let result = match callee {
        "all" => Value::Bool(matched.len() == items.len()),
        "some" => Value::Bool(!matched.is_empty()),
        "none" => Value::Bool(matched.is_empty()),
        "filter" => Value::List(matched),
        _ => unreachable!(),
    };
    Ok(Some(result))
}

/// `unique(key, expr)` (spec §4.H): retries until a fresh value is produced
/// or `retryLimits.unique` is exhausted.
fn evaluate_unique(args: &[Expr], ctx: &mut GenerationContext) -> LoomResult<Value> {
    let key = evaluate(&args[0], ctx)?.to_string();
    let expr = &args[1];
    let mut last = Value::Null;
    for _ in 0..ctx.retry_limits.unique {
        let candidate = resolve_if_range(evaluate(expr, ctx)?, ctx)?;
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
