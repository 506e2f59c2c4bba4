//! SPARQL JSON results serialization.

use serde_json::{Value, json};

use crate::query::{CompiledQuery, Operator};
use crate::testing::{ex, pattern, processor, var};
use crate::types::{Edge, Literal, Term};

/// Setup:
/// - a name "Alice"
/// - a age 30
/// - a label "chat"@fr
///
/// Expected: one binding per row, terms tagged by kind, with `datatype`
/// only on non-string typed literals and `xml:lang` on language strings.
#[test]
fn test_select_results_shape() {
    let processor = processor([
        Edge::new(ex("a"), ex("name"), Term::string("Alice")),
        Edge::new(ex("a"), ex("age"), Term::integer(30)),
        Edge::new(ex("a"), ex("label"), Term::Literal(Literal::lang_string("chat", "fr"))),
    ]);
    let query = CompiledQuery::select(Operator::bgp(vec![
        pattern(var("s"), "name", var("name")),
        pattern(var("s"), "age", var("age")),
        pattern(var("s"), "label", var("label")),
    ]))
    .project(&["s", "name", "age", "label"])
    .compile();

    let results = processor.query(&query).unwrap();
    let value: Value = serde_json::to_value(&results).unwrap();

    assert_eq!(value["head"]["vars"], json!(["s", "name", "age", "label"]));
    let rows = value["results"]["bindings"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["s"], json!({"type": "uri", "value": "http://ex/a"}));
    assert_eq!(row["name"], json!({"type": "literal", "value": "Alice"}));
    assert_eq!(
        row["age"],
        json!({
            "type": "literal",
            "value": "30",
            "datatype": "http://www.w3.org/2001/XMLSchema#integer"
        })
    );
    assert_eq!(
        row["label"],
        json!({"type": "literal", "value": "chat", "xml:lang": "fr"})
    );
}

#[test]
fn test_unbound_variables_are_omitted() {
    let processor = processor([Edge::new(ex("a"), ex("p"), Term::blank("b0"))]);
    let query = CompiledQuery::select(
        Operator::bgp(vec![pattern(var("s"), "p", var("o"))])
            .optional(Operator::bgp(vec![pattern(var("o"), "q", var("missing"))])),
    )
    .project(&["s", "o", "missing"])
    .compile();

    let results = processor.query(&query).unwrap();
    let value = serde_json::to_value(&results).unwrap();
    assert_eq!(value["head"]["vars"], json!(["s", "o", "missing"]));
    let row = &value["results"]["bindings"][0];
    assert_eq!(row["o"], json!({"type": "bnode", "value": "b0"}));
    assert!(row.get("missing").is_none());
}
