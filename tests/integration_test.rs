//! End-to-end pipeline tests: source text -> compile -> Generator::generate.

use loom_dsl::ast::Statement;
use loom_dsl::dataset::Generator;
use loom_dsl::error::LoomError;
use loom_dsl::{compile, GeneratorOptions, PluginRegistry};

#[test]
fn test_compiles_schema_and_dataset() {
    let program = compile(
        r#"
        schema Invoice {
            amount: decimal in 1..1000,
            status: 0.7:"paid" | 0.3:"draft"
        }
        dataset T { invoices: 50 * Invoice }
        "#,
    )
    .unwrap();
    assert_eq!(program.schemas().count(), 1);
    assert_eq!(program.datasets().count(), 1);
}

#[test]
fn test_generate_produces_requested_cardinality() {
    let program = compile(
        r#"
        schema Invoice { amount: decimal in 1..1000 }
        dataset T { invoices: 25 * Invoice }
        "#,
    )
    .unwrap();
    let outcome = Generator::generate(&program, 1).unwrap();
    assert!(outcome.error.is_none());
    assert_eq!(outcome.collections["invoices"].len(), 25);
}

#[test]
fn test_cross_field_assume_is_respected() {
    let program = compile(
        r#"
        schema Invoice {
            issued: int in 1..20,
            due: int in 1..30,
            assume due >= issued
        }
        dataset T { invoices: 200 * Invoice }
        "#,
    )
    .unwrap();
    let outcome = Generator::generate(&program, 9).unwrap();
    assert!(outcome.error.is_none());
    for record in &outcome.collections["invoices"] {
        let obj = record.as_object().unwrap();
        let issued = obj["issued"].as_i64().unwrap();
        let due = obj["due"].as_i64().unwrap();
        assert!(due >= issued);
    }
}

#[test]
fn test_violating_dataset_keeps_contract_but_drops_assume() {
    let program = compile(
        r#"
        contract Positive { invariant due > 0 }
        schema Invoice implements Positive {
            issued: int in 1..20,
            due: int in 1..30,
            assume due >= issued
        }
        dataset T violating { invoices: 100 * Invoice }
        "#,
    )
    .unwrap();
    let outcome = Generator::generate(&program, 4).unwrap();
    assert!(outcome.error.is_none());
    for record in &outcome.collections["invoices"] {
        let due = record.as_object().unwrap()["due"].as_i64().unwrap();
        assert!(due > 0);
    }
}

#[test]
fn test_computed_field_sees_its_declared_dependency() {
    let program = compile(
        r#"
        schema Order {
            quantity: int in 1..5,
            price: int in 1..10,
            total: = quantity * price
        }
        dataset T { orders: 30 * Order }
        "#,
    )
    .unwrap();
    let outcome = Generator::generate(&program, 2).unwrap();
    for record in &outcome.collections["orders"] {
        let obj = record.as_object().unwrap();
        let q = obj["quantity"].as_i64().unwrap();
        let p = obj["price"].as_i64().unwrap();
        let total = obj["total"].as_i64().unwrap();
        assert_eq!(total, q * p);
    }
}

#[test]
fn test_per_parent_collection_references_its_parent() {
    let program = compile(
        r#"
        schema Customer { id: unique int in 1..1000 }
        schema Order { customer_id: = ^id }
        dataset T {
            customers: 5 * Customer,
            orders: 2..4 per customers * Order
        }
        "#,
    )
    .unwrap();
    let outcome = Generator::generate(&program, 13).unwrap();
    assert!(outcome.error.is_none());

    let customer_ids: Vec<i64> = outcome.collections["customers"]
        .iter()
        .map(|c| c.as_object().unwrap()["id"].as_i64().unwrap())
        .collect();
    for order in &outcome.collections["orders"] {
        let customer_id = order.as_object().unwrap()["customer_id"].as_i64().unwrap();
        assert!(customer_ids.contains(&customer_id));
    }
}

#[test]
fn test_unknown_dataset_name_is_an_error() {
    let program = compile(
        r#"
        schema Invoice { amount: int in 1..10 }
        dataset T { invoices: 1 * Invoice }
        "#,
    )
    .unwrap();
    let err = Generator::generate_dataset(&program, "Nope", 1, PluginRegistry::new(), GeneratorOptions::default())
        .unwrap_err();
    assert!(matches!(err, LoomError::UnknownDataset { name } if name == "Nope"));
}

#[test]
fn test_let_binding_parses_to_a_top_level_statement() {
    let program = compile("let base = 100\nschema S { n: int in 1..5 }\ndataset T { items: 1 * S }").unwrap();
    assert!(program.statements.iter().any(|s| matches!(s, Statement::Let { name, .. } if name == "base")));
}

#[test]
fn test_malformed_source_is_a_parse_error() {
    let err = compile("schema {").unwrap_err();
    assert!(matches!(err, LoomError::UnexpectedToken { .. } | LoomError::ExpectedToken { .. }));
}
