//! # Generation context (spec §3, §4.G)
//!
//! The mutable runtime scaffolding threaded by reference into the evaluator,
//! field generator, instance generator, and dataset driver. Persistent
//! state (schemas, bindings, contracts, contexts, distributions) survives a
//! [`GenerationContext::reset`]; runtime state does not.
//!
//! A context is owned by exactly one dataset-driver invocation and is never
//! shared concurrently (spec §3 Invariants) — there is no `Arc`/`Mutex`
//! anywhere in this type, by design: two concurrent generation runs get two
//! contexts.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::ast::{ContextDefinition, ContractDefinition, DistributionDefinition, Expr, Program, SchemaDefinition};
use crate::plugin::PluginRegistry;
use crate::rng::SeededRng;
use crate::value::Value;
use crate::warnings::WarningSink;

/// Bounds on rejection-sampling retries (spec §4.J, §4.H `unique`).
#[derive(Debug, Clone, Copy)]
pub struct RetryLimits {
    pub instance: u32,
    pub unique: u32,
}

impl Default for RetryLimits {
    fn default() -> Self {
        RetryLimits { instance: 50, unique: 1000 }
    }
}

/// Policy knobs (spec §9, "Optional-field inclusion probability is a policy
/// knob"). Populated from [`crate::config::Config`] at the binary boundary;
/// library callers may construct directly.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    pub strict: bool,
    pub optional_field_probability: f64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            strict: false,
            optional_field_probability: 0.7,
        }
    }
}

/// Two reset granularities (spec §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Clears runtime state, keeps schemas/bindings/contracts/contexts.
    RuntimeOnly,
    /// Clears everything, including the compiled program tables.
    Full,
}

/// The full mutable scaffolding passed by `&mut` reference into generation.
pub struct GenerationContext {
    // -- persistent (program-derived) --
    schemas: IndexMap<String, SchemaDefinition>,
    bindings: IndexMap<String, Expr>,
    contracts: IndexMap<String, ContractDefinition>,
    contexts: IndexMap<String, ContextDefinition>,
    distributions: IndexMap<String, DistributionDefinition>,

    // -- runtime --
    pub collections: IndexMap<String, Vec<Value>>,
    pub parent: Option<Value>,
    pub current: Option<IndexMap<String, Value>>,
    pub previous: Option<Value>,
    pub current_schema_name: Option<String>,
    pub violating: bool,
    unique_values: HashMap<String, HashSet<String>>,
    sequences: HashMap<String, i64>,
    ordered_sequence_indices: HashMap<String, usize>,
    pub rng: SeededRng,
    pub retry_limits: RetryLimits,
    pub options: GeneratorOptions,
    pub warnings: WarningSink,
    pub registry: PluginRegistry,
    cancelled: bool,
}

impl GenerationContext {
    pub fn new(program: &Program, seed: u64, registry: PluginRegistry, options: GeneratorOptions) -> Self {
        let mut schemas = IndexMap::new();
        let mut bindings = IndexMap::new();
        let mut contracts = IndexMap::new();
        let mut contexts = IndexMap::new();
        let mut distributions = IndexMap::new();
        for schema in program.schemas() {
            schemas.insert(schema.name.clone(), schema.clone());
        }
        for (name, expr) in program.bindings() {
            bindings.insert(name.to_string(), expr.clone());
        }
        for contract in program.contracts() {
            contracts.insert(contract.name.clone(), contract.clone());
        }
        for context in program.contexts() {
            contexts.insert(context.name.clone(), context.clone());
        }
        for distribution in program.distributions() {
            distributions.insert(distribution.name.clone(), distribution.clone());
        }

        GenerationContext {
            schemas,
            bindings,
            contracts,
            contexts,
            distributions,
            collections: IndexMap::new(),
            parent: None,
            current: None,
            previous: None,
            current_schema_name: None,
            violating: false,
            unique_values: HashMap::new(),
            sequences: HashMap::new(),
            ordered_sequence_indices: HashMap::new(),
            rng: SeededRng::new(seed),
            retry_limits: RetryLimits::default(),
            options,
            warnings: WarningSink::new(),
            registry,
            cancelled: false,
        }
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaDefinition> {
        self.schemas.get(name)
    }

    pub fn binding(&self, name: &str) -> Option<&Expr> {
        self.bindings.get(name)
    }

    pub fn contract(&self, name: &str) -> Option<&ContractDefinition> {
        self.contracts.get(name)
    }

    pub fn context_definition(&self, name: &str) -> Option<&ContextDefinition> {
        self.contexts.get(name)
    }

    pub fn distribution(&self, name: &str) -> Option<&DistributionDefinition> {
        self.distributions.get(name)
    }

    pub fn collection(&self, name: &str) -> Option<&[Value]> {
        self.collections.get(name).map(|v| v.as_slice())
    }

    /// Inserts `value` into the unique set for `key` (`"Schema.field"`).
    /// Returns `true` if the value was newly inserted (i.e. it was unique).
    pub fn try_claim_unique(&mut self, key: &str, value: &Value) -> bool {
        self.unique_values
            .entry(key.to_string())
            .or_default()
            .insert(value.unique_key())
    }

    /// Removes a previously claimed unique value, used when `refine`
    /// regenerates a `unique` field (spec §4.J step 3).
    pub fn release_unique(&mut self, key: &str, value: &Value) {
        if let Some(set) = self.unique_values.get_mut(key) {
            set.remove(&value.unique_key());
        }
    }

    /// Clears every unique-value entry scoped to `schema_name` (spec §4.J
    /// state machine: a failed `validated` attempt resets uniqueValues for
    /// fields of this schema so retries don't deadlock on stale claims).
    pub fn reset_unique_values_for_schema(&mut self, schema_name: &str) {
        let prefix = format!("{schema_name}.");
        self.unique_values.retain(|key, _| !key.starts_with(&prefix));
    }

    pub fn next_sequence(&mut self, name: &str, start: i64) -> i64 {
        let counter = self.sequences.entry(name.to_string()).or_insert(start);
        let value = *counter;
        *counter += 1;
        value
    }

    pub fn next_ordered_index(&mut self, key: &str, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let idx = self.ordered_sequence_indices.entry(key.to_string()).or_insert(0);
        let value = *idx % len;
        *idx += 1;
        value
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Resets runtime state, optionally also clearing the compiled program
    /// tables (spec §4.G "Two reset modes").
    pub fn reset(&mut self, mode: ResetMode) {
        self.collections.clear();
        self.parent = None;
        self.current = None;
        self.previous = None;
        self.current_schema_name = None;
        self.violating = false;
        self.unique_values.clear();
        self.sequences.clear();
        self.ordered_sequence_indices.clear();
        self.rng.reseed();
        self.warnings = WarningSink::new();
        self.cancelled = false;
        if mode == ResetMode::Full {
            self.schemas.clear();
            self.bindings.clear();
            self.contracts.clear();
            self.contexts.clear();
            self.distributions.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_ctx() -> GenerationContext {
        GenerationContext::new(&Program::new(), 1, PluginRegistry::new(), GeneratorOptions::default())
    }

    #[test]
    fn unique_claim_is_false_on_duplicate() {
        let mut ctx = empty_ctx();
        assert!(ctx.try_claim_unique("S.id", &Value::Int(1)));
        assert!(!ctx.try_claim_unique("S.id", &Value::Int(1)));
        assert!(ctx.try_claim_unique("S.id", &Value::Int(2)));
    }

    #[test]
    fn releasing_unique_allows_reclaim() {
        let mut ctx = empty_ctx();
        ctx.try_claim_unique("S.id", &Value::Int(1));
        ctx.release_unique("S.id", &Value::Int(1));
        assert!(ctx.try_claim_unique("S.id", &Value::Int(1)));
    }

    #[test]
    fn sequence_counter_increments_from_start() {
        let mut ctx = empty_ctx();
        assert_eq!(ctx.next_sequence("seq", 5), 5);
        assert_eq!(ctx.next_sequence("seq", 5), 6);
    }

    #[test]
    fn ordered_index_wraps_modulo_length() {
        let mut ctx = empty_ctx();
        assert_eq!(ctx.next_ordered_index("k", 3), 0);
        assert_eq!(ctx.next_ordered_index("k", 3), 1);
        assert_eq!(ctx.next_ordered_index("k", 3), 2);
        assert_eq!(ctx.next_ordered_index("k", 3), 0);
    }

    #[test]
    fn reset_runtime_only_preserves_schemas() {
        let mut ctx = empty_ctx();
        ctx.collections.insert("c".to_string(), vec![Value::Int(1)]);
        ctx.reset(ResetMode::RuntimeOnly);
        assert!(ctx.collections.is_empty());
    }
}
