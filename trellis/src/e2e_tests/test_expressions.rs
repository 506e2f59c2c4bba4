//! Filters, BIND, VALUES, EXISTS and user functions.

use crate::eval::EvaluationError;
use crate::hook::{HookKind, HookValue};
use crate::query::{ArithOp, Builtin, CompareOp, CompiledQuery, Expr, Operator};
use crate::testing::{edge, ex, pattern, processor, var};
use crate::types::{Edge, Term};
use crate::{Bindings, QueryError, QueryProcessor};

const DOUBLE: &str = "http://ex/fn/double";

fn people() -> QueryProcessor {
    processor([
        Edge::new(ex("a"), ex("age"), Term::integer(30)),
        Edge::new(ex("b"), ex("age"), Term::string("unknown")),
        edge("a", "knows", "b"),
    ])
}

fn ages() -> Operator {
    Operator::bgp(vec![pattern(var("s"), "age", var("v"))])
}

fn column(results: &Bindings, name: &str) -> Vec<Option<Term>> {
    results.iter().map(|row| row.get_by_name(name).cloned()).collect()
}

fn double(args: &[Term]) -> Result<Term, String> {
    let n = args
        .first()
        .and_then(Term::as_literal)
        .and_then(crate::types::Literal::as_i64)
        .ok_or_else(|| "expected an integer".to_owned())?;
    Ok(Term::integer(n * 2))
}

#[test]
fn test_user_function() {
    let mut processor = people();
    processor.functions_mut().define(DOUBLE, double);
    let query = CompiledQuery::select(ages().extend("d", Expr::call(DOUBLE, vec![Expr::var("v")])))
        .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(column(&results, "d"), vec![Some(Term::integer(60)), None]);
}

#[test]
fn test_function_hook_overrides_the_registry() {
    let mut processor = people();
    processor.functions_mut().define(DOUBLE, double);
    processor
        .hooks_mut()
        .on(HookKind::Function, |_| Ok(Some(HookValue::Int(7))));
    let query = CompiledQuery::select(ages().extend("d", Expr::call(DOUBLE, vec![Expr::var("v")])))
        .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(
        column(&results, "d"),
        vec![Some(Term::integer(7)), Some(Term::integer(7))]
    );
}

#[test]
fn test_unknown_function_aborts() {
    let processor = people();
    let query = CompiledQuery::select(
        ages().filter(Expr::call("http://ex/fn/missing", vec![Expr::var("v")])),
    )
    .compile();
    let err = processor.query(&query).unwrap_err();
    assert_eq!(
        err,
        QueryError::Evaluation(EvaluationError::UnknownFunction {
            name: "http://ex/fn/missing".to_owned(),
        })
    );
}

#[test]
fn test_error_hook_recovers_a_failing_function() {
    let mut processor = people();
    processor.functions_mut().define(DOUBLE, double);
    processor
        .hooks_mut()
        .on(HookKind::Error, |_| Ok(Some(HookValue::Int(0))));
    let query = CompiledQuery::select(ages().extend("d", Expr::call(DOUBLE, vec![Expr::var("v")])))
        .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(
        column(&results, "d"),
        vec![Some(Term::integer(60)), Some(Term::integer(0))]
    );
}

/// A BIND whose expression fails leaves the variable unbound; a BIND onto
/// an already bound variable keeps the row as it is.
#[test]
fn test_bind_edge_cases() {
    let processor = people();
    let plus_one = Expr::arith(ArithOp::Add, Expr::var("v"), Expr::constant(Term::integer(1)));
    let query = CompiledQuery::select(ages().extend("next", plus_one)).compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(column(&results, "next"), vec![Some(Term::integer(31)), None]);

    let query = CompiledQuery::select(
        ages().extend("v", Expr::constant(Term::integer(0))),
    )
    .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(
        column(&results, "v"),
        vec![Some(Term::integer(30)), Some(Term::string("unknown"))]
    );
}

#[test]
fn test_bind_hook_overrides_the_value() {
    let mut processor = people();
    processor.hooks_mut().on(HookKind::Bind, |call| {
        Ok(call.term(2).is_none().then(|| HookValue::Term(Term::string("n/a"))))
    });
    let plus_one = Expr::arith(ArithOp::Add, Expr::var("v"), Expr::constant(Term::integer(1)));
    let query = CompiledQuery::select(ages().extend("next", plus_one)).compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(
        column(&results, "next"),
        vec![Some(Term::integer(31)), Some(Term::string("n/a"))]
    );
}

#[test]
fn test_values_with_undef() {
    let processor = people();
    let values = Operator::values(
        &["s", "label"],
        vec![
            vec![Some(ex("a")), Some(Term::string("first"))],
            vec![Some(ex("b")), None],
        ],
    );
    let query = CompiledQuery::select(values.join(ages())).compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(column(&results, "label"), vec![Some(Term::string("first")), None]);
    assert_eq!(column(&results, "s"), vec![Some(ex("a")), Some(ex("b"))]);
}

#[test]
fn test_malformed_values() {
    let processor = people();
    let values = Operator::values(&["s", "label"], vec![vec![Some(ex("a"))]]);
    let err = processor
        .query(&CompiledQuery::select(values).compile())
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Evaluation(EvaluationError::Malformed { .. })
    ));
}

#[test]
fn test_exists_and_not_exists() {
    let processor = people();
    let knows_someone = Operator::bgp(vec![pattern(var("s"), "knows", var("other"))]);

    let query = CompiledQuery::select(ages().filter(Expr::Exists(Box::new(knows_someone.clone()))))
        .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(column(&results, "s"), vec![Some(ex("a"))]);
    assert!(results.rows()[0].get_by_name("other").is_none());

    let query = CompiledQuery::select(ages().filter(Expr::NotExists(Box::new(knows_someone))))
        .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(column(&results, "s"), vec![Some(ex("b"))]);
}

/// Comparing a string with an integer has no answer; the filter drops the
/// row without failing the query.
#[test]
fn test_incomparable_filter_is_false() {
    let processor = people();
    let query = CompiledQuery::select(ages().filter(Expr::compare(
        CompareOp::Gt,
        Expr::var("v"),
        Expr::constant(Term::integer(18)),
    )))
    .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(column(&results, "s"), vec![Some(ex("a"))]);
}

#[test]
fn test_unbound_variable_in_filter() {
    let processor = people();
    let query = CompiledQuery::select(ages().filter(
        Expr::Builtin(Builtin::Bound, vec![Expr::var("missing")]).negate(),
    ))
    .compile();
    assert_eq!(processor.query(&query).unwrap().len(), 2);

    let query = CompiledQuery::select(ages().filter(Expr::compare(
        CompareOp::Eq,
        Expr::var("missing"),
        Expr::var("v"),
    )))
    .compile();
    assert!(processor.query(&query).unwrap().is_empty());
}

#[test]
fn test_overload_supplies_a_comparison() {
    let mut processor = people();
    processor.hooks_mut().on(HookKind::Overload, |call| {
        let unknown = call.term(2) == Some(&Term::string("unknown"));
        Ok(unknown.then_some(HookValue::Bool(true)))
    });
    let query = CompiledQuery::select(ages().filter(Expr::compare(
        CompareOp::Gt,
        Expr::var("v"),
        Expr::constant(Term::integer(18)),
    )))
    .compile();
    let results = processor.query(&query).unwrap();
    assert_eq!(column(&results, "s"), vec![Some(ex("a")), Some(ex("b"))]);
}
