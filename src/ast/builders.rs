//! Builder patterns for AST construction.
//!
//! Fluent APIs for constructing AST nodes programmatically, particularly
//! useful for tests that want to build a schema or dataset without going
//! through the parser.
//!
//! ## Example
//!
//! ```
//! use loom_dsl::ast::builders::{FieldBuilder, SchemaBuilder};
//! use loom_dsl::ast::PrimitiveKind;
//!
//! let schema = SchemaBuilder::new("Invoice")
//!     .field(FieldBuilder::primitive("amount", PrimitiveKind::Decimal).build())
//!     .build();
//! assert_eq!(schema.name, "Invoice");
//! ```

use super::{
    AssumeClause, Cardinality, CollectionEntry, DatasetDefinition, Expr, FieldDefinition,
    FieldType, PrimitiveKind, SchemaDefinition,
};

/// Builder for a single [`FieldDefinition`].
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: FieldDefinition,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldBuilder {
            field: FieldDefinition {
                name: name.into(),
                field_type,
                optional: false,
                unique: false,
                private: false,
                computed: false,
                condition: None,
                distribution: None,
            },
        }
    }

    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, FieldType::Primitive { kind, precision: None })
    }

    pub fn computed(name: impl Into<String>, expr: Expr) -> Self {
        let mut b = Self::new(name, FieldType::ExpressionType(Box::new(expr.clone())));
        b.field.computed = true;
        b.field.distribution = Some(expr);
        b
    }

    pub fn unique(mut self) -> Self {
        self.field.unique = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.field.optional = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.field.private = true;
        self
    }

    pub fn condition(mut self, expr: Expr) -> Self {
        self.field.condition = Some(expr);
        self
    }

    pub fn build(self) -> FieldDefinition {
        self.field
    }
}

/// Builder for a [`SchemaDefinition`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    schema: SchemaDefinition,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        SchemaBuilder {
            schema: SchemaDefinition {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.schema.fields.push(field);
        self
    }

    pub fn assume(mut self, condition: Option<Expr>, constraints: Vec<Expr>) -> Self {
        self.schema.assumes.push(AssumeClause { condition, constraints });
        self
    }

    pub fn implements(mut self, contract: impl Into<String>) -> Self {
        self.schema.contracts.push(contract.into());
        self
    }

    pub fn build(self) -> SchemaDefinition {
        self.schema
    }
}

/// Builder for a [`DatasetDefinition`].
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    dataset: DatasetDefinition,
}

impl DatasetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        DatasetBuilder {
            dataset: DatasetDefinition {
                name: name.into(),
                collections: Vec::new(),
                contexts: Vec::new(),
                validation: Vec::new(),
                violating: false,
            },
        }
    }

    pub fn collection(mut self, name: impl Into<String>, cardinality: Cardinality, schema_ref: impl Into<String>) -> Self {
        self.dataset.collections.push(CollectionEntry {
            name: name.into(),
            cardinality,
            schema_ref: schema_ref.into(),
            per_parent: None,
        });
        self
    }

    pub fn collection_per_parent(
        mut self,
        name: impl Into<String>,
        cardinality: Cardinality,
        schema_ref: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        self.dataset.collections.push(CollectionEntry {
            name: name.into(),
            cardinality,
            schema_ref: schema_ref.into(),
            per_parent: Some(parent.into()),
        });
        self
    }

    pub fn violating(mut self) -> Self {
        self.dataset.violating = true;
        self
    }

    pub fn build(self) -> DatasetDefinition {
        self.dataset
    }
}
