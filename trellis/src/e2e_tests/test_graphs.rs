//! Named graphs and the default graph.

use crate::hook::{HookKind, HookValue};
use crate::query::{CompiledQuery, Operator};
use crate::testing::{ex, pattern, processor, var};
use crate::types::{Edge, Term};
use crate::QueryProcessor;

/// - a p b in g1 and in g2
/// - c p d in g2
/// - a p c in no named graph
fn quads() -> QueryProcessor {
    processor([
        Edge::in_graph(ex("a"), ex("p"), ex("b"), ex("g1")),
        Edge::in_graph(ex("a"), ex("p"), ex("b"), ex("g2")),
        Edge::in_graph(ex("c"), ex("p"), ex("d"), ex("g2")),
        Edge::new(ex("a"), ex("p"), ex("c")),
    ])
}

fn p_pattern() -> Operator {
    Operator::bgp(vec![pattern(var("s"), "p", var("o"))])
}

fn column(processor: &QueryProcessor, op: Operator, name: &str) -> Vec<Term> {
    let results = processor.query(&CompiledQuery::select(op).compile()).unwrap();
    results
        .iter()
        .filter_map(|row| row.get_by_name(name).cloned())
        .collect()
}

/// Outside GRAPH, a triple stored in two named graphs is one solution.
#[test]
fn test_default_graph_is_a_set_union() {
    let processor = quads();
    assert_eq!(
        column(&processor, p_pattern(), "o"),
        vec![ex("b"), ex("d"), ex("c")]
    );
}

#[test]
fn test_graph_with_a_constant_name() {
    let processor = quads();
    assert_eq!(
        column(&processor, Operator::graph(ex("g2"), p_pattern()), "o"),
        vec![ex("b"), ex("d")]
    );
    assert_eq!(
        column(&processor, Operator::graph(ex("g1"), p_pattern()), "o"),
        vec![ex("b")]
    );
    assert!(column(&processor, Operator::graph(ex("missing"), p_pattern()), "o").is_empty());
}

/// `GRAPH ?g { ?s p ?o }` visits each named graph in first-seen order and
/// binds `?g` to it. The edge outside any named graph is not visited.
#[test]
fn test_graph_variable_iterates_named_graphs() {
    let processor = quads();
    let query = CompiledQuery::select(Operator::graph(var("g"), p_pattern())).compile();
    let results = processor.query(&query).unwrap();
    let rows: Vec<(Term, Term)> = results
        .iter()
        .map(|row| {
            (
                row.get_by_name("g").cloned().unwrap(),
                row.get_by_name("o").cloned().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (ex("g1"), ex("b")),
            (ex("g2"), ex("b")),
            (ex("g2"), ex("d")),
        ]
    );
}

#[test]
fn test_graph_hook_replaces_result() {
    let mut processor = quads();
    processor.hooks_mut().on(HookKind::Graph, |call| {
        let rows = call.solutions(2).unwrap_or_default();
        Ok(Some(HookValue::Solutions(
            rows.iter()
                .filter(|row| row.get_by_name("g") != Some(&ex("g1")))
                .cloned()
                .collect(),
        )))
    });
    assert_eq!(
        column(&processor, Operator::graph(var("g"), p_pattern()), "g"),
        vec![ex("g2"), ex("g2")]
    );
}
