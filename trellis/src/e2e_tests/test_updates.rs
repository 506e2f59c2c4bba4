//! Updates, loads and the graph lock.

use std::sync::{Arc, Mutex};

use crate::access::AccessLevel;
use crate::config::EngineConfig;
use crate::eval::EvaluationError;
use crate::graph::{GraphStore, LoadError, LockMode, MemoryGraph};
use crate::hook::HookKind;
use crate::processor::QueryProcessor;
use crate::query::{CompiledQuery, Operator};
use crate::testing::{edge, empty_processor, ex, init_tracing, pattern, processor, var};
use crate::types::{Edge, Term};
use crate::QueryError;

fn ages() -> Vec<Edge> {
    vec![
        Edge::new(ex("a"), ex("age"), Term::integer(30)),
        Edge::new(ex("b"), ex("age"), Term::integer(40)),
    ]
}

/// `DELETE { ?s age ?v } INSERT { ?s years ?v } WHERE { ?s age ?v }`
fn rename_age() -> Arc<CompiledQuery> {
    CompiledQuery::update(
        vec![pattern(var("s"), "age", var("v"))],
        vec![pattern(var("s"), "years", var("v"))],
        Operator::bgp(vec![pattern(var("s"), "age", var("v"))]),
    )
    .text("rename age")
    .compile()
}

fn count(processor: &QueryProcessor, predicate: &str) -> usize {
    let query =
        CompiledQuery::select(Operator::bgp(vec![pattern(var("s"), predicate, var("o"))])).compile();
    processor.query(&query).unwrap().len()
}

fn one_edge(_: &str, store: &mut dyn GraphStore) -> Result<usize, LoadError> {
    Ok(usize::from(store.insert(edge("loaded", "p", "x"))))
}

/// Setup: two `age` edges.
/// Expected: both deleted, both re-inserted under `years`, four changes
/// in total.
#[test]
fn test_delete_insert_where() {
    let processor = processor(ages());
    let result = processor.update(&rename_age()).unwrap();
    assert_eq!(result.nb_delete(), 2);
    assert_eq!(result.nb_insert(), 2);
    assert_eq!(result.nb_update(), 4);
    assert_eq!(count(&processor, "age"), 0);
    assert_eq!(count(&processor, "years"), 2);

    // Nothing left to rename.
    assert_eq!(processor.update(&rename_age()).unwrap().nb_update(), 0);
}

#[test]
fn test_insert_and_delete_data() {
    let processor = empty_processor();
    let data = vec![pattern(ex("a"), "p", ex("b"))];
    let inserted = processor
        .update(&CompiledQuery::insert_data(data.clone()).compile())
        .unwrap();
    assert_eq!(inserted.nb_insert(), 1);
    assert_eq!(count(&processor, "p"), 1);

    let deleted = processor
        .update(&CompiledQuery::delete_data(data).compile())
        .unwrap();
    assert_eq!(deleted.nb_delete(), 1);
    assert_eq!(count(&processor, "p"), 0);
}

#[test]
fn test_update_hook_order() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut processor = processor(ages());
    for kind in [
        HookKind::BeforeUpdate,
        HookKind::Delete,
        HookKind::Insert,
        HookKind::Update,
        HookKind::AfterUpdate,
    ] {
        let events = Arc::clone(&events);
        processor.hooks_mut().on(kind, move |call| {
            events.lock().unwrap().push(call.kind.name());
            Ok(None)
        });
    }
    processor.update(&rename_age()).unwrap();
    assert_eq!(
        *events.lock().unwrap(),
        [
            "beforeUpdate",
            "delete",
            "delete",
            "insert",
            "insert",
            "update",
            "afterUpdate"
        ]
    );
}

#[test]
fn test_public_level_cannot_update() {
    init_tracing();
    let config = EngineConfig {
        access_level: AccessLevel::Public,
        ..EngineConfig::default()
    };
    let processor = QueryProcessor::with_config(MemoryGraph::from_edges(ages()), config);
    let err = processor.update(&rename_age()).unwrap_err();
    assert!(matches!(err, QueryError::Safety(ref e) if e.target == "rename age"));
    assert_eq!(count(&processor, "age"), 2);
}

fn rejected(hook: &str) -> QueryError {
    QueryError::Evaluation(EvaluationError::Malformed {
        operator: hook.to_owned(),
        message: "rejected".to_owned(),
    })
}

/// Setup: two `age` edges; a `delete` handler that fails.
/// Expected: the error reaches the caller and the graph is unchanged, so
/// running the update again after removing the handler applies it once.
#[test]
fn test_failing_delete_hook_rolls_back() {
    let mut processor = processor(ages());
    processor
        .hooks_mut()
        .on(HookKind::Delete, |_| Err(rejected("delete")));
    let err = processor.update(&rename_age()).unwrap_err();
    assert_eq!(err, rejected("delete"));
    assert_eq!(count(&processor, "age"), 2);
    assert_eq!(count(&processor, "years"), 0);

    processor.hooks_mut().remove(HookKind::Delete, HookKind::Delete.arity());
    assert_eq!(processor.update(&rename_age()).unwrap().nb_update(), 4);
    assert_eq!(count(&processor, "years"), 2);
}

#[test]
fn test_failing_after_update_hook_rolls_back() {
    let mut processor = processor(ages());
    processor
        .hooks_mut()
        .on(HookKind::AfterUpdate, |_| Err(rejected("afterUpdate")));
    let insert = CompiledQuery::insert_data(vec![pattern(ex("c"), "age", Term::integer(50))])
        .compile();
    assert!(processor.update(&insert).is_err());
    assert!(processor.update(&rename_age()).is_err());
    assert_eq!(count(&processor, "age"), 2);
    assert_eq!(count(&processor, "years"), 0);
}

/// Setup: the test thread holds the read lock.
/// Expected: a load from the same thread fails fast instead of
/// deadlocking.
#[test]
fn test_load_while_holding_the_lock() {
    let processor = empty_processor();
    let guard = processor.graph().read("test").unwrap();
    let err = processor.load(&one_edge, "http://ex/data.ttl").unwrap_err();
    match err {
        QueryError::LockConflict(conflict) => assert_eq!(conflict.requested, LockMode::Write),
        other => panic!("expected a lock conflict, got {other}"),
    }
    drop(guard);
    assert_eq!(processor.load(&one_edge, "http://ex/data.ttl").unwrap(), 1);
}

#[test]
fn test_update_from_a_hook_conflicts() {
    let mut processor = processor(ages());
    let update = rename_age();
    processor
        .hooks_mut()
        .on(HookKind::After, move |call| call.query(&update).map(|_| None));
    let query =
        CompiledQuery::select(Operator::bgp(vec![pattern(var("s"), "age", var("v"))])).compile();
    let err = processor.query(&query).unwrap_err();
    assert!(matches!(err, QueryError::LockConflict(_)));
    assert_eq!(count(&processor, "age"), 2);
}

#[test]
fn test_load_fires_hooks_and_counts_edges() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut processor = empty_processor();
    for kind in [HookKind::BeforeLoad, HookKind::AfterLoad] {
        let events = Arc::clone(&events);
        processor.hooks_mut().on(kind, move |call| {
            let path = call.text(0).unwrap_or_default();
            events.lock().unwrap().push(format!("{} {path}", call.kind));
            Ok(None)
        });
    }
    let added = processor.load(&one_edge, "https://ex/data.ttl").unwrap();
    assert_eq!(added, 1);
    assert_eq!(count(&processor, "p"), 1);
    assert_eq!(
        *events.lock().unwrap(),
        [
            "beforeLoad https://ex/data.ttl",
            "afterLoad https://ex/data.ttl"
        ]
    );
}

#[test]
fn test_local_load_needs_private_level() {
    let processor = empty_processor();
    let err = processor.load(&one_edge, "/tmp/data.ttl").unwrap_err();
    assert!(matches!(err, QueryError::Safety(_)));
    assert_eq!(count(&processor, "p"), 0);

    init_tracing();
    let config = EngineConfig {
        access_level: AccessLevel::Private,
        ..EngineConfig::default()
    };
    let private = QueryProcessor::with_config(MemoryGraph::new(), config);
    assert_eq!(private.load(&one_edge, "/tmp/data.ttl").unwrap(), 1);
}

#[test]
fn test_loader_failure_is_reported() {
    let processor = empty_processor();
    let failing = |path: &str, _: &mut dyn GraphStore| -> Result<usize, LoadError> {
        Err(LoadError::new(path, "unexpected end of input"))
    };
    let err = processor.load(&failing, "http://ex/broken.ttl").unwrap_err();
    assert_eq!(
        err,
        QueryError::Load(LoadError::new("http://ex/broken.ttl", "unexpected end of input"))
    );
}
