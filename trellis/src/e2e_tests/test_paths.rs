//! Property paths.

use std::num::NonZeroUsize;

use crate::config::EngineConfig;
use crate::eval::EvaluationError;
use crate::graph::MemoryGraph;
use crate::hook::{HookKind, HookValue};
use crate::processor::QueryProcessor;
use crate::query::{CompiledQuery, Operator, PathExpr};
use crate::testing::{edge, ex, init_tracing, processor, var};
use crate::types::Term;
use crate::QueryError;

fn p() -> PathExpr {
    PathExpr::predicate(ex("p"))
}

fn objects(processor: &QueryProcessor, op: Operator, name: &str) -> Vec<Term> {
    let results = processor.query(&CompiledQuery::select(op).compile()).unwrap();
    results
        .iter()
        .filter_map(|row| row.get_by_name(name).cloned())
        .collect()
}

/// `a (p)+ ?x` over `a -p-> b -p-> a` terminates and yields b and a once
/// each.
#[test]
fn test_one_or_more_on_a_cycle() {
    let processor = processor([edge("a", "p", "b"), edge("b", "p", "a")]);
    let reached = objects(
        &processor,
        Operator::path(ex("a"), p().one_or_more(), var("x")),
        "x",
    );
    assert_eq!(reached, vec![ex("b"), ex("a")]);
}

#[test]
fn test_zero_or_more_includes_the_start() {
    let processor = processor([edge("a", "p", "b"), edge("b", "p", "c")]);
    let reached = objects(
        &processor,
        Operator::path(ex("a"), p().zero_or_more(), var("x")),
        "x",
    );
    assert_eq!(reached, vec![ex("a"), ex("b"), ex("c")]);

    let reached = objects(
        &processor,
        Operator::path(ex("a"), p().zero_or_one(), var("x")),
        "x",
    );
    assert_eq!(reached, vec![ex("a"), ex("b")]);
}

#[test]
fn test_sequence_alternative_and_inverse() {
    let processor = processor([
        edge("a", "p", "b"),
        edge("b", "q", "c"),
        edge("a", "r", "d"),
    ]);
    let q = PathExpr::predicate(ex("q"));
    let r = PathExpr::predicate(ex("r"));

    let reached = objects(&processor, Operator::path(ex("a"), p().then(q.clone()), var("x")), "x");
    assert_eq!(reached, vec![ex("c")]);

    let reached = objects(&processor, Operator::path(ex("a"), p().or(r), var("x")), "x");
    assert_eq!(reached, vec![ex("b"), ex("d")]);

    let reached = objects(&processor, Operator::path(ex("c"), q.inverse(), var("x")), "x");
    assert_eq!(reached, vec![ex("b")]);

    let reached = objects(
        &processor,
        Operator::path(ex("a"), PathExpr::Negated(vec![ex("p")]), var("x")),
        "x",
    );
    assert_eq!(reached, vec![ex("d")]);
}

#[test]
fn test_bound_object_walks_backwards() {
    let processor = processor([edge("a", "p", "b"), edge("b", "p", "c")]);
    let reached = objects(
        &processor,
        Operator::path(var("x"), p().one_or_more(), ex("c")),
        "x",
    );
    assert_eq!(reached, vec![ex("b"), ex("a")]);
}

#[test]
fn test_same_variable_at_both_ends() {
    let processor = processor([
        edge("a", "p", "b"),
        edge("b", "p", "a"),
        edge("c", "p", "d"),
    ]);
    let reached = objects(
        &processor,
        Operator::path(var("x"), p().one_or_more(), var("x")),
        "x",
    );
    assert_eq!(reached, vec![ex("a"), ex("b")]);
}

#[test]
fn test_visited_limit() {
    init_tracing();
    let config = EngineConfig {
        max_path_visited: NonZeroUsize::new(2).unwrap(),
        ..EngineConfig::default()
    };
    let processor = QueryProcessor::with_config(
        MemoryGraph::from_edges([
            edge("a", "p", "b"),
            edge("b", "p", "c"),
            edge("c", "p", "d"),
        ]),
        config,
    );
    let query =
        CompiledQuery::select(Operator::path(ex("a"), p().one_or_more(), var("x"))).compile();
    let err = processor.query(&query).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Evaluation(EvaluationError::PathLimitExceeded { limit: 2, .. })
    ));
}

#[test]
fn test_step_hook_vetoes_an_edge() {
    let mut processor = processor([edge("a", "p", "b"), edge("b", "p", "c")]);
    processor.hooks_mut().on(HookKind::Step, |call| {
        let to_c = call.term(4) == Some(&ex("c"));
        Ok(to_c.then_some(HookValue::Bool(false)))
    });
    let reached = objects(
        &processor,
        Operator::path(ex("a"), p().one_or_more(), var("x")),
        "x",
    );
    assert_eq!(reached, vec![ex("b")]);
}
