//! Typed façade over the registry used by the evaluator.
//!
//! Each method fires one hook and folds its return value into the type the
//! call site needs, falling back to the built-in default when the hook is
//! inactive, returns nothing, or returns a value of the wrong shape.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::{HookArg, HookCall, HookKind, HookValue};
use crate::binding::Binding;
use crate::error::QueryError;
use crate::eval::{EvalState, Session};
use crate::types::{Edge, Term};

/// Dispatches hook calls for one evaluation.
#[derive(Clone, Copy)]
pub struct Visitor<'s> {
    session: &'s Session<'s>,
    state: EvalState,
}

fn mismatch(kind: HookKind, value: &HookValue) {
    tracing::warn!("{} hook returned a value of the wrong type, ignored: {value:?}", kind.name());
}

impl<'s> Visitor<'s> {
    pub(crate) const fn new(session: &'s Session<'s>, state: EvalState) -> Self {
        Self { session, state }
    }

    #[must_use]
    pub fn is_active(&self, kind: HookKind) -> bool {
        self.session.hooks.is_active(kind)
    }

    /// Fire `kind` and return the handler's raw value.
    pub fn call(
        &self,
        kind: HookKind,
        args: &[HookArg<'_>],
    ) -> Result<Option<HookValue>, QueryError> {
        let Some(handler) = self.session.hooks.handler(kind) else {
            return Ok(None);
        };
        debug_assert_eq!(args.len(), kind.arity(), "{kind} called with wrong arity");
        let call = HookCall::new(kind, args, self.session, self.state);
        handler(&call)
    }

    /// Fire a side-effect-only hook.
    pub fn notify(&self, kind: HookKind, args: &[HookArg<'_>]) -> Result<(), QueryError> {
        self.call(kind, args).map(|_| ())
    }

    /// Fire a boolean hook; `default` unless the handler overrides it.
    pub fn decide(
        &self,
        kind: HookKind,
        args: &[HookArg<'_>],
        default: bool,
    ) -> Result<bool, QueryError> {
        Ok(match self.call(kind, args)? {
            None => default,
            Some(value) => value.as_bool().unwrap_or_else(|| {
                mismatch(kind, &value);
                default
            }),
        })
    }

    /// Fire a hook that may replace a solution sequence.
    pub fn solutions(
        &self,
        kind: HookKind,
        args: &[HookArg<'_>],
    ) -> Result<Option<Vec<Binding>>, QueryError> {
        Ok(match self.call(kind, args)? {
            Some(HookValue::Solutions(rows)) => Some(rows),
            Some(value) => {
                mismatch(kind, &value);
                None
            }
            None => None,
        })
    }

    /// Fire a hook that may replace a value.
    pub fn value(&self, kind: HookKind, args: &[HookArg<'_>]) -> Result<Option<Term>, QueryError> {
        Ok(match self.call(kind, args)? {
            Some(value @ (HookValue::Solutions(_) | HookValue::Edges(_))) => {
                mismatch(kind, &value);
                None
            }
            Some(value) => value.into_term(),
            None => None,
        })
    }

    /// Fire a hook that may replace a list of edges.
    pub fn edges(&self, kind: HookKind, args: &[HookArg<'_>]) -> Result<Option<Vec<Edge>>, QueryError> {
        Ok(match self.call(kind, args)? {
            Some(HookValue::Edges(edges)) => Some(edges),
            Some(value) => {
                mismatch(kind, &value);
                None
            }
            None => None,
        })
    }

    /// Service page size.
    ///
    /// A non-positive override is not a page size: it is logged and the
    /// configured default is used instead.
    pub fn slice(&self, endpoint: &Term, input: &[Binding]) -> Result<NonZeroUsize, QueryError> {
        let default = self.session.config.slice_default;
        let args = [HookArg::Term(Some(endpoint)), HookArg::Solutions(input)];
        Ok(match self.call(HookKind::Slice, &args)? {
            None => default,
            Some(value) => match value.as_int() {
                Some(n) => usize::try_from(n)
                    .ok()
                    .and_then(NonZeroUsize::new)
                    .unwrap_or_else(|| {
                        tracing::warn!("invalid slice {n} for {endpoint}, using default");
                        default
                    }),
                None => {
                    mismatch(HookKind::Slice, &value);
                    default
                }
            },
        })
    }

    /// Service timeout; `None` means no limit.
    pub fn timeout(&self, endpoint: &Term) -> Result<Option<Duration>, QueryError> {
        let default = self.session.config.service_timeout_ms;
        let millis = match self.call(HookKind::Timeout, &[HookArg::Term(Some(endpoint))])? {
            None => default,
            Some(value) => match value.as_int().map(u64::try_from) {
                Some(Ok(ms)) => ms,
                Some(Err(_)) => {
                    tracing::warn!("negative timeout for {endpoint}, using default");
                    default
                }
                None => {
                    mismatch(HookKind::Timeout, &value);
                    default
                }
            },
        };
        Ok((millis > 0).then(|| Duration::from_millis(millis)))
    }
}
