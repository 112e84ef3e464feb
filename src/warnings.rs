//! # Warning sink (spec §4.B)
//!
//! A collector of structured, non-fatal diagnostics. Owned by a single
//! dataset-driver call; the core never writes to process-global stderr —
//! callers drain the sink after generation (spec §6,
//! `WarningSink::drain() -> [Warning]`). Each recorded warning is also
//! mirrored as a `tracing::warn!` event for operators tailing logs, but the
//! sink itself is the durable, queryable record (see SPEC_FULL's AMBIENT —
//! Logging section).

use serde::Serialize;

/// The closed set of warning kinds the core ever emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    UniqueExhaustion,
    ConstraintRetryExhaustion,
    MutationTargetNotFound,
    ContractMissing,
    PluginLoad,
    /// Best-effort static unsatisfiability lint (SPEC_FULL supplement); never
    /// changes observable generation behavior for satisfiable clauses.
    UnsatisfiableAssume,
}

/// A single structured warning with a human message and a JSON payload.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub payload: serde_json::Value,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>, payload: serde_json::Value) -> Self {
        Warning {
            kind,
            message: message.into(),
            payload,
        }
    }
}

/// Collects warnings for the duration of one dataset-driver run.
#[derive(Debug, Clone, Default)]
pub struct WarningSink {
    warnings: Vec<Warning>,
}

impl WarningSink {
    pub fn new() -> Self {
        WarningSink::default()
    }

    pub fn record(&mut self, warning: Warning) {
        tracing::warn!(
            kind = ?warning.kind,
            message = %warning.message,
            "generation warning"
        );
        self.warnings.push(warning);
    }

    pub fn unique_exhaustion(&mut self, key: &str) {
        self.record(Warning::new(
            WarningKind::UniqueExhaustion,
            format!("exhausted unique retries for {key}"),
            serde_json::json!({ "key": key }),
        ));
    }

    pub fn constraint_retry_exhaustion(&mut self, schema: &str) {
        self.record(Warning::new(
            WarningKind::ConstraintRetryExhaustion,
            format!("exhausted constraint retries for schema {schema}"),
            serde_json::json!({ "schema": schema }),
        ));
    }

    pub fn mutation_target_not_found(&mut self, target: &str) {
        self.record(Warning::new(
            WarningKind::MutationTargetNotFound,
            format!("then-block mutation target {target:?} could not be resolved"),
            serde_json::json!({ "target": target }),
        ));
    }

    pub fn contract_missing(&mut self, contract: &str, schema: &str) {
        self.record(Warning::new(
            WarningKind::ContractMissing,
            format!("schema {schema} implements unknown contract {contract:?}"),
            serde_json::json!({ "contract": contract, "schema": schema }),
        ));
    }

    pub fn plugin_load(&mut self, name: &str, message: &str) {
        self.record(Warning::new(
            WarningKind::PluginLoad,
            format!("plugin {name:?} failed to load: {message}"),
            serde_json::json!({ "plugin": name, "message": message }),
        ));
    }

    pub fn unsatisfiable_assume(&mut self, schema: &str, reason: &str) {
        self.record(Warning::new(
            WarningKind::UnsatisfiableAssume,
            format!("assume clause on schema {schema} looks unsatisfiable: {reason}"),
            serde_json::json!({ "schema": schema, "reason": reason }),
        ));
    }

    /// Drains and returns all recorded warnings, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.warnings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_sink() {
        let mut sink = WarningSink::new();
        sink.unique_exhaustion("Schema.field");
        assert_eq!(sink.len(), 1);
        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn warnings_carry_structured_payload() {
        let mut sink = WarningSink::new();
        sink.mutation_target_not_found("order.total");
        let w = &sink.iter().next().unwrap();
        assert_eq!(w.payload["target"], "order.total");
    }
}
