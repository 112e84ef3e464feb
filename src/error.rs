//! Typed error taxonomy for the Loom core (spec §7).
//!
//! Every fatal error carries enough structure for a caller to render a
//! caret-pointer source snippet without the core doing any I/O itself. The
//! core never panics on malformed input and never writes to process-global
//! stderr; `unwrap`/`expect` are confined to tests.

use thiserror::Error;

/// A source position, attached to every error that originates from a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The full error taxonomy from spec §7: parse, semantic, generation, and
/// plugin errors. Constraint failures (`constraint-retry-exhaustion`,
/// `unique-exhaustion`, `contract-missing`) are non-fatal by default and are
/// represented as [`crate::warnings::Warning`]s instead; they only appear
/// here when strict mode elevates them to fatal via
/// [`LoomError::StrictModeViolation`].
#[derive(Debug, Clone, Error)]
pub enum LoomError {
    // ---- Parse errors ----
    #[error("{span}: unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        span: Span,
        found: String,
        expected: String,
    },

    #[error("{span}: expected {expected}")]
    ExpectedToken { span: Span, expected: String },

    #[error("{span}: unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("{span}: invalid number literal {text:?}")]
    InvalidNumber { span: Span, text: String },

    #[error("{span}: unknown character {ch:?}")]
    UnknownCharacter { span: Span, ch: char },

    // ---- Semantic errors ----
    #[error("unknown schema {name:?}")]
    UnknownSchema { name: String },

    #[error("unknown generator {name:?}")]
    UnknownGenerator { name: String },

    #[error("unknown context {name:?}")]
    UnknownContext { name: String },

    #[error("unknown dataset {name:?}")]
    UnknownDataset { name: String },

    #[error("program defines no dataset")]
    NoDatasetDefined,

    // ---- Generation errors ----
    #[error("cycle detected among computed fields: {fields:?}")]
    ComputedCycle { fields: Vec<String> },

    #[error("cardinality error: {message}")]
    CardinalityError { message: String },

    #[error("arithmetic error: {message}")]
    ArithmeticError { message: String },

    #[error("dynamic cardinality type error: expected number or range, got {got}")]
    DynamicCardinalityTypeError { got: String },

    #[error("generation was cancelled")]
    Cancelled,

    // ---- Plugin errors ----
    #[error("plugin {generator:?} failed: {message}")]
    PluginError { generator: String, message: String },

    // ---- Strict-mode elevation of otherwise-non-fatal constraint failures ----
    #[error("strict mode: {0}")]
    StrictModeViolation(String),
}

pub type LoomResult<T> = Result<T, LoomError>;
