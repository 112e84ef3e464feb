//! # Loom — a deterministic test-data generation DSL
//!
//! Loom compiles a small declarative language — schemas, datasets, contracts,
//! contexts, distributions — into reproducible synthetic records. Given the
//! same source and seed, [`dataset::Generator::generate`] always produces
//! byte-identical output; that determinism is the core design constraint
//! everything else in this crate is built to preserve.
//!
//! ## Pipeline
//!
//! ```text
//! source text
//!     ↓
//! [lexer]              → token stream
//!     ↓
//! [parser]             → ast::Program
//!     ↓
//! [dataset::Generator]  owns a context::GenerationContext and drives:
//!     ├─ instance_generator  (one record of one schema)
//!     │    ├─ field_generator   (one field's value)
//!     │    │    └─ evaluator     (expressions, distributions, superpositions)
//!     │    └─ evaluator          (assume/contract/refine/then)
//!     └─ dataset validation block
//!     ↓
//! map<collection name, [record]>  +  warnings::Warning stream
//! ```
//!
//! Every stage above is single-owner: a [`context::GenerationContext`] is
//! built once per [`dataset::Generator::generate`] call and never shared
//! across threads (see `context` module docs for why).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use loom_dsl::{compile, dataset::Generator};
//!
//! let source = r#"
//!     schema Invoice { amount: decimal in 1..1000, status: 0.7:"paid"|0.3:"draft" }
//!     dataset T { invoices: 50 * Invoice }
//! "#;
//!
//! let program = compile(source)?;
//! let outcome = Generator::generate(&program, 42)?;
//! for record in &outcome.collections["invoices"] {
//!     println!("{record:?}");
//! }
//! for warning in &outcome.warnings {
//!     eprintln!("warning: {}", warning.message);
//! }
//! ```
//!
//! ## Module organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `token`, `lexer` | source text → tokens (spec §4.D) |
//! | `ast` | the parsed program's IR (spec §4.E) |
//! | `parser` | tokens → `ast::Program` (spec §4.F) |
//! | `value` | the runtime `Value` type shared by every stage |
//! | `rng` | seeded, reproducible randomness (spec §4.A) |
//! | `warnings` | structured non-fatal diagnostics (spec §4.B) |
//! | `plugin` | named generator functions + lexer/parser hooks (spec §4.C) |
//! | `context` | the mutable scaffolding threaded through generation (spec §4.G) |
//! | `evaluator` | expression evaluation (spec §4.H) |
//! | `primitives` | bare primitive value generation |
//! | `field_generator` | one field's value (spec §4.I) |
//! | `instance_generator` | one schema instance (spec §4.J) |
//! | `dataset` | the dataset driver and public `Generator` contract (spec §4.K, §6) |
//! | `config` | layered runtime configuration (`loom.toml` + `LOOM_*` env vars) |
//! | `error` | the fatal error taxonomy (spec §7) |

pub mod ast;
pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod field_generator;
pub mod instance_generator;
pub mod lexer;
pub mod parser;
pub mod plugin;
pub mod primitives;
pub mod rng;
pub mod token;
pub mod value;
pub mod warnings;

pub use ast::Program;
pub use config::Config;
pub use context::{GenerationContext, GeneratorOptions, ResetMode, RetryLimits};
pub use dataset::{
    DatasetValidationResult, GenerationOutcome, Generator, RecordValidationFailure, ValidationFailure, ValidationResult,
};
pub use error::{LoomError, LoomResult, Span};
pub use plugin::PluginRegistry;
pub use rng::SeededRng;
pub use value::Value;
pub use warnings::{Warning, WarningKind, WarningSink};

/// Parses `source` into a [`Program`], the single pipeline entry point a
/// host embedding this crate is expected to call before handing the result
/// to [`Generator::generate`]. Plugin lexer/parser hooks, if any, are
/// consulted from `registry`.
pub fn compile_with(source: &str, registry: &PluginRegistry) -> LoomResult<Program> {
    let tokens = lexer::lex(source, registry)?;
    parser::parse(tokens, registry)
}

/// [`compile_with`] with an empty plugin registry — the common case for
/// source that doesn't use any plugin-registered keywords or statements.
pub fn compile(source: &str) -> LoomResult<Program> {
    compile_with(source, &PluginRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_then_generate_end_to_end() {
        let source = r#"
            schema Invoice {
                amount: decimal in 1..1000,
                status: 0.7:"paid" | 0.3:"draft"
            }
            dataset T {
                invoices: 50 * Invoice
            }
        "#;
        let program = compile(source).expect("valid source compiles");
        let outcome = Generator::generate(&program, 42).expect("generation succeeds");
        let invoices = &outcome.collections["invoices"];
        assert_eq!(invoices.len(), 50);
        for record in invoices {
            let obj = record.as_object().unwrap();
            let amount = obj["amount"].as_f64().unwrap();
            assert!((1.0..=1000.0).contains(&amount));
            let status = obj["status"].to_string();
            assert!(status == "paid" || status == "draft");
        }
    }

    #[test]
    fn same_seed_is_deterministic_end_to_end() {
        let source = r#"
            schema I { issued: int in 1..20, due: int in 1..30, assume due >= issued }
            dataset T { items: 100 * I }
        "#;
        let program = compile(source).unwrap();
        let a = Generator::generate(&program, 7).unwrap();
        let b = Generator::generate(&program, 7).unwrap();
        assert_eq!(format!("{:?}", a.collections), format!("{:?}", b.collections));
    }
}
