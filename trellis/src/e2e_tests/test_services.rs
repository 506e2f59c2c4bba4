//! Federated `SERVICE` calls: paging, timeouts, failures and access.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::access::AccessLevel;
use crate::binding::Binding;
use crate::config::EngineConfig;
use crate::eval::{EvaluationError, ServiceError};
use crate::graph::MemoryGraph;
use crate::hook::{HookArg, HookKind, HookValue};
use crate::processor::QueryProcessor;
use crate::query::{CompiledQuery, Operator};
use crate::testing::{empty_processor, ex, init_tracing};
use crate::types::{Term, Variable};
use crate::QueryError;

fn numbers(n: i64) -> Operator {
    Operator::values(&["n"], (1..=n).map(|i| vec![Some(Term::integer(i))]).collect())
}

fn echo(_: &Operator, input: &[Binding]) -> Result<Vec<Binding>, ServiceError> {
    Ok(input.to_vec())
}

fn down(_: &Operator, _: &[Binding]) -> Result<Vec<Binding>, ServiceError> {
    Err(ServiceError::Failed("connection refused".to_owned()))
}

fn slow(_: &Operator, input: &[Binding]) -> Result<Vec<Binding>, ServiceError> {
    std::thread::sleep(Duration::from_millis(300));
    Ok(input.to_vec())
}

fn remote(endpoint: &str, silent: bool) -> Operator {
    Operator::service(ex(endpoint), Operator::empty(), silent)
}

/// Setup: a `slice` hook returning 2 and five input solutions.
/// Expected: the endpoint sees pages of 2, 2 and 1, and every input row
/// survives the join.
#[test]
fn test_slice_hook_pages_input() {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let mut processor = empty_processor();
    {
        let pages = Arc::clone(&pages);
        processor.services_mut().register(
            ex("remote").label(),
            move |_: &Operator, input: &[Binding]| {
                pages.lock().unwrap().push(input.len());
                Ok(input.to_vec())
            },
        );
    }
    processor
        .hooks_mut()
        .on(HookKind::Slice, |_| Ok(Some(HookValue::Int(2))));

    let query = CompiledQuery::select(numbers(5).join(remote("remote", false))).compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(*pages.lock().unwrap(), vec![2, 2, 1]);
}

#[test]
fn test_invalid_slice_falls_back_to_default() {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let mut processor = empty_processor();
    {
        let pages = Arc::clone(&pages);
        processor.services_mut().register(
            ex("remote").label(),
            move |_: &Operator, input: &[Binding]| {
                pages.lock().unwrap().push(input.len());
                Ok(input.to_vec())
            },
        );
    }
    processor
        .hooks_mut()
        .on(HookKind::Slice, |_| Ok(Some(HookValue::Int(0))));
    let query = CompiledQuery::select(numbers(5).join(remote("remote", false))).compile();
    assert_eq!(processor.query(&query).unwrap().len(), 5);
    assert_eq!(*pages.lock().unwrap(), vec![5]);
}

#[test]
fn test_timeout_hook_bounds_the_call() {
    let mut processor = empty_processor();
    processor.services_mut().register(ex("slow").label(), slow);
    processor
        .hooks_mut()
        .on(HookKind::Timeout, |_| Ok(Some(HookValue::Int(20))));

    let err = processor
        .query(&CompiledQuery::select(remote("slow", false)).compile())
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Evaluation(EvaluationError::ServiceTimeout { timeout_ms: 20, .. })
    ));
}

#[test]
fn test_configured_timeout() {
    init_tracing();
    let config = EngineConfig {
        service_timeout_ms: 20,
        ..EngineConfig::default()
    };
    let mut processor = QueryProcessor::with_config(MemoryGraph::new(), config);
    processor.services_mut().register(ex("slow").label(), slow);
    let err = processor
        .query(&CompiledQuery::select(remote("slow", false)).compile())
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Evaluation(EvaluationError::ServiceTimeout { .. })
    ));
}

#[test]
fn test_silent_failure_yields_one_empty_solution() {
    let mut processor = empty_processor();
    processor.services_mut().register(ex("down").label(), down);
    let results = processor
        .query(&CompiledQuery::select(remote("down", true)).compile())
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results.rows()[0].is_empty());

    let err = processor
        .query(&CompiledQuery::select(remote("down", false)).compile())
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Evaluation(EvaluationError::ServiceFailed { .. })
    ));
}

#[test]
fn test_error_hook_recovers_a_failed_call() {
    let mut processor = empty_processor();
    processor.services_mut().register(ex("down").label(), down);
    processor.hooks_mut().on(HookKind::Error, |call| {
        let is_service = matches!(call.arg(0), Some(HookArg::Operator(Operator::Service { .. })));
        let fallback = Binding::new().with(Variable::new("x"), Term::string("fallback"));
        Ok(is_service.then(|| HookValue::Solutions(vec![fallback])))
    });
    let results = processor
        .query(&CompiledQuery::select(remote("down", false)).compile())
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results.rows()[0].get_by_name("x"), Some(&Term::string("fallback")));
}

#[test]
fn test_unknown_service() {
    let processor = empty_processor();
    let err = processor
        .query(&CompiledQuery::select(remote("nowhere", false)).compile())
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::Evaluation(EvaluationError::UnknownService {
            endpoint: "http://ex/nowhere".to_owned(),
        })
    );
}

/// Silence covers failures of the call, not access violations.
#[test]
fn test_public_level_forbids_services() {
    init_tracing();
    let config = EngineConfig {
        access_level: AccessLevel::Public,
        ..EngineConfig::default()
    };
    let mut processor = QueryProcessor::with_config(MemoryGraph::new(), config);
    processor.services_mut().register(ex("remote").label(), echo);
    let err = processor
        .query(&CompiledQuery::select(remote("remote", true)).compile())
        .unwrap_err();
    assert!(matches!(err, QueryError::Safety(_)));
}

#[test]
fn test_service_hook_replaces_rows() {
    let mut processor = empty_processor();
    processor.services_mut().register(ex("remote").label(), echo);
    processor.hooks_mut().on(HookKind::Service, |call| {
        let rows = call.solutions(2).unwrap_or_default();
        let even = rows
            .iter()
            .filter(|row| {
                row.get_by_name("n")
                    .and_then(Term::as_literal)
                    .and_then(crate::types::Literal::as_i64)
                    .is_some_and(|n| n % 2 == 0)
            })
            .cloned()
            .collect();
        Ok(Some(HookValue::Solutions(even)))
    });
    let query = CompiledQuery::select(numbers(5).join(remote("remote", false))).compile();
    let results = processor.query(&query).unwrap();
    let values: Vec<_> = results.iter().filter_map(|r| r.get_by_name("n").cloned()).collect();
    assert_eq!(values, vec![Term::integer(2), Term::integer(4)]);
}
