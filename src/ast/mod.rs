//! # AST model (spec §3, §4.E)
//!
//! A strict tagged-variant IR: expressions and field types are distinct sum
//! types, dispatched structurally (`match`) rather than through virtual
//! dispatch, so the compiler enforces exhaustiveness on every variant (spec
//! §9, "Dynamic dispatch over expressions"). The AST is immutable once
//! parsed and survives the entire generation run (spec §3, Lifecycle).
//!
//! ## Builders
//!
//! For programmatic construction of AST nodes in tests, see the
//! [`builders`] module, which provides fluent APIs like `SchemaBuilder` and
//! `DatasetBuilder`.

pub mod builders;

use serde::{Deserialize, Serialize};

use crate::error::Span;
use crate::value::Value;

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    /// Member access (`a.b`), e.g. a collection projection like `order.total`.
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// One option in a superposition (weighted choice): spec §3, "Superposition{options:[{weight?,value}]}".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperpositionOption {
    pub weight: Option<f64>,
    pub value: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Expr,
    pub result: Expr,
}

/// A single expression node, tagged by variant. Every node's span is
/// tracked separately in [`Spanned`] where diagnostics need it; the
/// expression tree itself stays lean for structural pattern matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),
    Identifier(String),
    QualifiedName(Vec<String>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Range {
        min: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    Superposition {
        options: Vec<SuperpositionOption>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Match {
        value: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    ParentRef {
        path: Vec<String>,
    },
    AnyOf {
        collection: Box<Expr>,
        condition: Option<Box<Expr>>,
    },
    OrderedSequence {
        elements: Vec<Expr>,
    },
}

/// Pairs a node with the source span it started at, for parse-time
/// diagnostics that need to point back at source. Only used where the
/// parser needs to remember a position past the node's own construction
/// (e.g. for later semantic-error reporting); the expression tree proper
/// does not carry spans inline to keep pattern matches exhaustive and flat.
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Spanned { node, span }
    }
}

// ============================================================================
// Field types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Int,
    Decimal,
    String,
    Date,
    Boolean,
}

impl PrimitiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(PrimitiveKind::Int),
            "decimal" => Some(PrimitiveKind::Decimal),
            "string" => Some(PrimitiveKind::String),
            "date" => Some(PrimitiveKind::Date),
            "boolean" => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }
}

/// Static `{min,max}` or a dynamically-evaluated expression (spec §3,
/// Cardinality).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Cardinality {
    Static { min: i64, max: i64 },
    Dynamic(Box<Expr>),
}

impl Cardinality {
    pub fn exact(n: i64) -> Self {
        Cardinality::Static { min: n, max: n }
    }
}

/// A field's declared type, dispatched structurally by the field generator
/// (spec §4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldType {
    Primitive {
        kind: PrimitiveKind,
        precision: Option<u32>,
    },
    Range {
        base: PrimitiveKind,
        min: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    Superposition {
        options: Vec<SuperpositionOption>,
    },
    Collection {
        cardinality: Cardinality,
        element: Box<FieldType>,
    },
    Reference {
        path: Vec<String>,
    },
    ExpressionType(Box<Expr>),
    Generator {
        name: String,
        args: Vec<Expr>,
    },
    OrderedSequenceType(Vec<Expr>),
    /// A schema reference by name, e.g. a field typed `Address` where
    /// `Address` is another schema. Distinguished from `Reference` (a path
    /// through bindings/collections/current) by being a bare capitalized
    /// identifier resolved against the schema table.
    SchemaRef(String),
    /// `T | null`, the desugaring of a trailing `?` on a field type.
    Nullable(Box<FieldType>),
}

// ============================================================================
// Fields, schemas, contracts, datasets
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub optional: bool,
    pub unique: bool,
    pub private: bool,
    pub computed: bool,
    pub condition: Option<Expr>,
    /// Holds the computed expression when `computed` is set (spec §3:
    /// "computed ⇒ the expression is held in `distribution`").
    pub distribution: Option<Expr>,
}

impl FieldDefinition {
    pub fn is_scalar(&self) -> bool {
        !self.computed && !matches!(self.field_type, FieldType::Collection { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumeClause {
    pub condition: Option<Expr>,
    pub constraints: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineInvariant {
    pub condition: Option<Expr>,
    pub constraints: Vec<Expr>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineClause {
    pub condition: Option<Expr>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationOp {
    Assign,
    AddAssign,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutation {
    pub target: Vec<String>,
    pub op: MutationOp,
    pub value: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextApplication {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchemaDefinition {
    pub name: String,
    pub base: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub assumes: Vec<AssumeClause>,
    pub invariants: Vec<InlineInvariant>,
    pub contracts: Vec<String>,
    pub contexts: Vec<ContextApplication>,
    pub refine_block: Vec<RefineClause>,
    pub then_block: Vec<Mutation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub name: String,
    pub invariants: Vec<InlineInvariant>,
}

/// `context Name { affects field => value, ... }` (spec GLOSSARY: a named
/// set of field-value overrides and derivations applied to a schema or
/// dataset that references it via `with Ctx(args)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDefinition {
    pub name: String,
    pub affects: Vec<(String, Expr)>,
}

/// `distribution Name { range: percent, ... }` — SPEC_FULL supplement: a
/// named weighted table usable anywhere a superposition is legal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionDefinition {
    pub name: String,
    pub entries: Vec<(Expr, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub name: String,
    pub cardinality: Cardinality,
    pub schema_ref: String,
    pub per_parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub name: String,
    pub collections: Vec<CollectionEntry>,
    pub contexts: Vec<String>,
    pub validation: Vec<Expr>,
    pub violating: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    Let { name: String, expr: Expr },
    Import { name: String, path: String },
    Schema(SchemaDefinition),
    Context(ContextDefinition),
    Distribution(DistributionDefinition),
    Contract(ContractDefinition),
    Dataset(DatasetDefinition),
    /// A plugin-registered statement, already fully parsed by its hook.
    Custom { name: String, payload: serde_json::Value },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &SchemaDefinition> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Schema(s) => Some(s),
            _ => None,
        })
    }

    pub fn datasets(&self) -> impl Iterator<Item = &DatasetDefinition> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Dataset(d) => Some(d),
            _ => None,
        })
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractDefinition> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Contract(c) => Some(c),
            _ => None,
        })
    }

    pub fn contexts(&self) -> impl Iterator<Item = &ContextDefinition> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Context(c) => Some(c),
            _ => None,
        })
    }

    pub fn distributions(&self) -> impl Iterator<Item = &DistributionDefinition> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Distribution(d) => Some(d),
            _ => None,
        })
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Let { name, expr } => Some((name.as_str(), expr)),
            _ => None,
        })
    }
}
