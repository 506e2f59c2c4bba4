//! The hook protocol.
//!
//! External code registers handlers under a `(HookKind, arity)` pair. The
//! evaluator calls them at fixed moments of evaluation through a
//! [`Visitor`]. Hooks are additive overrides: when no handler is
//! registered, the kind is masked, or the handler returns `None`, the
//! evaluator applies its built-in semantics.
//!
//! A handler receives a [`HookCall`]: the arguments plus a handle on the
//! running evaluation, so it can run nested queries against the graph the
//! evaluation already holds instead of locking it again.
//!
//! # Example
//!
//! ```ignore
//! use trellis::hook::{HookKind, HookValue};
//!
//! processor.hooks_mut().on(HookKind::Candidate, |call| {
//!     let secret = call.edge(2).is_some_and(|e| e.predicate == secret_predicate);
//!     Ok(secret.then_some(HookValue::Bool(false)))
//! });
//! ```

mod kind;
mod registry;
mod visitor;

use std::sync::Arc;

pub use kind::HookKind;
pub use registry::{Handler, HookRegistry};
pub use visitor::Visitor;

use crate::access::{self, AccessLevel, Feature};
use crate::binding::{Binding, Bindings};
use crate::error::QueryError;
use crate::eval::{EvalState, Evaluator, Session};
use crate::graph::{LockConflictError, LockMode};
use crate::query::{CompiledQuery, Expr, Operator, PathExpr, TriplePattern};
use crate::types::{Edge, Term};

/// One argument passed to a hook.
#[derive(Debug, Clone, Copy)]
pub enum HookArg<'a> {
    Query(&'a Arc<CompiledQuery>),
    Bindings(&'a Bindings),
    Solutions(&'a [Binding]),
    Binding(&'a Binding),
    /// The active graph; `None` is the default graph.
    Graph(Option<&'a Term>),
    Pattern(&'a TriplePattern),
    Edge(&'a Edge),
    Edges(&'a [Edge]),
    Operator(&'a Operator),
    Expr(&'a Expr),
    Path(&'a PathExpr),
    /// A value; `None` when unbound or when evaluation produced no value.
    Term(Option<&'a Term>),
    Terms(&'a [Term]),
    Bool(bool),
    Int(i64),
    Text(&'a str),
}

/// A value returned by a hook to override the default.
#[derive(Debug, Clone, PartialEq)]
pub enum HookValue {
    Bool(bool),
    Int(i64),
    Term(Term),
    Solutions(Vec<Binding>),
    Edges(Vec<Edge>),
}

impl HookValue {
    /// The value as a boolean: `Bool` directly, a `Term` by its effective
    /// boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Term(t) => t.effective_boolean(),
            _ => None,
        }
    }

    /// The value as an integer: `Int` directly, or an integer literal.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Term(t) => t.as_literal().and_then(crate::types::Literal::as_i64),
            _ => None,
        }
    }

    /// The value as a term; booleans and integers become literals.
    #[must_use]
    pub fn into_term(self) -> Option<Term> {
        match self {
            Self::Term(t) => Some(t),
            Self::Bool(b) => Some(Term::boolean(b)),
            Self::Int(n) => Some(Term::integer(n)),
            Self::Solutions(_) | Self::Edges(_) => None,
        }
    }
}

/// A hook invocation as seen by its handler.
pub struct HookCall<'a> {
    pub kind: HookKind,
    pub args: &'a [HookArg<'a>],
    session: &'a Session<'a>,
    state: EvalState,
}

impl<'a> HookCall<'a> {
    pub(crate) const fn new(
        kind: HookKind,
        args: &'a [HookArg<'a>],
        session: &'a Session<'a>,
        state: EvalState,
    ) -> Self {
        Self {
            kind,
            args,
            session,
            state,
        }
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&HookArg<'a>> {
        self.args.get(index)
    }

    #[must_use]
    pub fn term(&self, index: usize) -> Option<&'a Term> {
        match *self.args.get(index)? {
            HookArg::Term(t) | HookArg::Graph(t) => t,
            _ => None,
        }
    }

    #[must_use]
    pub fn edge(&self, index: usize) -> Option<&'a Edge> {
        match *self.args.get(index)? {
            HookArg::Edge(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn pattern(&self, index: usize) -> Option<&'a TriplePattern> {
        match *self.args.get(index)? {
            HookArg::Pattern(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn solutions(&self, index: usize) -> Option<&'a [Binding]> {
        match *self.args.get(index)? {
            HookArg::Solutions(rows) => Some(rows),
            HookArg::Bindings(b) => Some(b.rows()),
            _ => None,
        }
    }

    #[must_use]
    pub fn bool(&self, index: usize) -> Option<bool> {
        match *self.args.get(index)? {
            HookArg::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn int(&self, index: usize) -> Option<i64> {
        match *self.args.get(index)? {
            HookArg::Int(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self, index: usize) -> Option<&'a str> {
        match *self.args.get(index)? {
            HookArg::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this call happens inside an `overload`, `compare` or `error`
    /// handler.
    #[must_use]
    pub const fn in_overload(&self) -> bool {
        self.state.in_overload
    }

    #[must_use]
    pub const fn access_level(&self) -> AccessLevel {
        self.session.config.access_level
    }

    /// Run a query against the graph the current evaluation holds.
    ///
    /// The nested query does not lock the graph again. Updates cannot run
    /// this way: the evaluation only holds read access.
    pub fn query(&self, query: &Arc<CompiledQuery>) -> Result<Bindings, QueryError> {
        self.query_with(query, &Binding::new())
    }

    /// [`query`](Self::query) seeded with an initial binding.
    pub fn query_with(
        &self,
        query: &Arc<CompiledQuery>,
        initial: &Binding,
    ) -> Result<Bindings, QueryError> {
        if query.is_update() {
            access::check(self.access_level(), Feature::Update, "nested update")?;
            return Err(QueryError::LockConflict(LockConflictError {
                requested: LockMode::Write,
                operation: "update from a hook".to_owned(),
            }));
        }
        let state = self.state.nested(self.session.config.max_nesting)?;
        Evaluator::new(self.session, state).run(query, initial)
    }

    /// Ask to load `path` from inside an evaluation.
    ///
    /// Loading needs the write lock the running evaluation excludes, so a
    /// permitted load still fails with a lock conflict.
    pub fn load(&self, path: &str) -> Result<(), QueryError> {
        access::check(self.access_level(), Feature::for_path(path), path)?;
        Err(QueryError::LockConflict(LockConflictError {
            requested: LockMode::Write,
            operation: format!("load {path}"),
        }))
    }
}
