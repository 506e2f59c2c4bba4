//! Operator overloading.
//!
//! When the term model has no answer for an operator (ordering two terms of
//! different kinds, arithmetic on non-numerics, calling an unknown
//! function), the evaluator offers the operation to the `overload`,
//! `compare` or `error` hook before failing.
//!
//! # Invariants
//!
//! - While one of these handlers runs, none of the three is offered again
//!   in the same call chain. A handler that itself compares terms sees the
//!   built-in semantics. The flag travels in [`EvalState`], so nested
//!   queries started from the handler inherit it.

use std::cmp::Ordering;

use crate::error::QueryError;
use crate::eval::{EvalState, Session};
use crate::hook::{HookArg, HookKind, Visitor};
use crate::query::Expr;
use crate::types::Term;

/// A visitor flagged as running inside an overload, or `None` when the
/// call chain already is.
fn guarded<'s>(session: &'s Session<'s>, state: EvalState, kind: HookKind) -> Option<Visitor<'s>> {
    if state.in_overload {
        tracing::trace!("{kind} not offered: already inside an overload");
        return None;
    }
    let state = EvalState {
        in_overload: true,
        ..state
    };
    let visitor = Visitor::new(session, state);
    visitor.is_active(kind).then_some(visitor)
}

/// Offer a binary operation to the `overload` hook.
///
/// `result` is the built-in result if there is one.
pub fn overload(
    session: &Session<'_>,
    state: EvalState,
    expr: &Expr,
    result: Option<&Term>,
    left: &Term,
    right: &Term,
) -> Result<Option<Term>, QueryError> {
    let Some(visitor) = guarded(session, state, HookKind::Overload) else {
        return Ok(None);
    };
    visitor.value(
        HookKind::Overload,
        &[
            HookArg::Expr(expr),
            HookArg::Term(result),
            HookArg::Term(Some(left)),
            HookArg::Term(Some(right)),
        ],
    )
}

/// Offer an ordering the term model cannot decide to the `compare` hook.
///
/// The handler answers with an integer whose sign is the ordering.
pub fn compare(
    session: &Session<'_>,
    state: EvalState,
    left: &Term,
    right: &Term,
) -> Result<Option<Ordering>, QueryError> {
    let Some(visitor) = guarded(session, state, HookKind::Compare) else {
        return Ok(None);
    };
    let args = [
        HookArg::Int(0),
        HookArg::Term(Some(left)),
        HookArg::Term(Some(right)),
    ];
    Ok(visitor
        .call(HookKind::Compare, &args)?
        .and_then(|value| value.as_int())
        .map(|n| n.cmp(&0)))
}

/// Offer a failed call to the `error` hook, which may supply a value.
pub fn error(
    session: &Session<'_>,
    state: EvalState,
    expr: &Expr,
    args: &[Term],
) -> Result<Option<Term>, QueryError> {
    let Some(visitor) = guarded(session, state, HookKind::Error) else {
        return Ok(None);
    };
    visitor.value(HookKind::Error, &[HookArg::Expr(expr), HookArg::Terms(args)])
}
