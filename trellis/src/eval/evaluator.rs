use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{EvalState, EvaluationError, ExprError, ServiceError, Session};
use crate::access::{self, Feature};
use crate::algebra;
use crate::binding::{Binding, Bindings};
use crate::error::QueryError;
use crate::graph::{EdgePattern, GraphScope};
use crate::hook::{HookArg, HookKind, Visitor};
use crate::query::{CompiledQuery, Expr, Operator, PatternTerm, TriplePattern};
use crate::types::{Edge, Term, Variable};

/// Identifies one (sub)query invocation's variable scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct EnvId(usize);

/// Duplicate-elimination key: the whole solution, or a key a hook supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) enum DistinctKey {
    Row(Binding),
    Custom(Term),
}

/// Evaluates compiled queries against a session's graph.
///
/// One evaluator serves one top-level query and all of its subqueries.
/// Queries started from hooks get an evaluator of their own.
pub struct Evaluator<'s> {
    pub(super) session: &'s Session<'s>,
    pub(super) state: EvalState,
    root: Option<Arc<CompiledQuery>>,
    pub(super) distinct: HashMap<EnvId, HashSet<DistinctKey>>,
    next_env: usize,
}

pub(super) const fn graph_arg(scope: &GraphScope) -> HookArg<'_> {
    HookArg::Graph(scope.name())
}

fn edge_pattern(pattern: &TriplePattern, row: &Binding) -> EdgePattern {
    EdgePattern::new(
        pattern.subject.resolve(row).cloned(),
        pattern.predicate.resolve(row).cloned(),
        pattern.object.resolve(row).cloned(),
    )
}

impl<'s> Evaluator<'s> {
    #[must_use]
    pub fn new(session: &'s Session<'s>, state: EvalState) -> Self {
        Self {
            session,
            state,
            root: None,
            distinct: HashMap::new(),
            next_env: 0,
        }
    }

    pub(super) const fn visitor(&self) -> Visitor<'s> {
        Visitor::new(self.session, self.state)
    }

    /// Evaluate `query` seeded with `initial`.
    ///
    /// The first query an evaluator runs at depth zero is its top-level
    /// query: it gets `init`, `before` and `after`. Every other query,
    /// including queries started from hooks, gets `start` and `finish`.
    pub fn run(
        &mut self,
        query: &Arc<CompiledQuery>,
        initial: &Binding,
    ) -> Result<Bindings, QueryError> {
        self.execute(query, &GraphScope::Default, initial)
    }

    fn new_env(&mut self) -> EnvId {
        self.next_env += 1;
        EnvId(self.next_env)
    }

    pub(super) fn execute(
        &mut self,
        query: &Arc<CompiledQuery>,
        scope: &GraphScope,
        initial: &Binding,
    ) -> Result<Bindings, QueryError> {
        let visitor = self.visitor();
        if self.root.is_none() && self.state.depth == 0 {
            self.root = Some(Arc::clone(query));
            visitor.notify(HookKind::Init, &[HookArg::Query(query)])?;
        }
        let mut bindings = Bindings::new(query);
        let top = self.root.as_ref().is_some_and(|root| bindings.is_for(root));
        let env = self.new_env();
        let (begin, end) = if top {
            (HookKind::Before, HookKind::After)
        } else {
            (HookKind::Start, HookKind::Finish)
        };
        visitor.notify(begin, &[HookArg::Bindings(&bindings)])?;
        tracing::debug!(
            "evaluating {} query (depth {}): {}",
            if top { "top-level" } else { "nested" },
            self.state.depth,
            query.root
        );

        let rows = self.eval(&query.root, scope, initial)?;
        let solutions = rows.len();
        self.apply_modifiers(query, env, scope, rows, &mut bindings)?;
        self.distinct.remove(&env);

        tracing::debug!("{solutions} solutions, {} after modifiers", bindings.len());
        visitor.notify(end, &[HookArg::Bindings(&bindings)])?;
        Ok(bindings)
    }

    /// Evaluate one operator under `seed`.
    ///
    /// Every returned solution extends `seed`.
    pub(super) fn eval(
        &mut self,
        op: &Operator,
        scope: &GraphScope,
        seed: &Binding,
    ) -> Result<Vec<Binding>, QueryError> {
        let visitor = self.visitor();
        if visitor.is_active(HookKind::Statement)
            && !visitor.decide(
                HookKind::Statement,
                &[graph_arg(scope), HookArg::Operator(op)],
                true,
            )?
        {
            tracing::trace!("{} skipped by statement hook", op.name());
            return Ok(vec![seed.clone()]);
        }
        match op {
            Operator::Bgp(patterns) => self.bgp(op, patterns, scope, seed),
            Operator::Join(left, right) => {
                let l = self.eval(left, scope, seed)?;
                let r = match right.as_ref() {
                    Operator::Service {
                        endpoint,
                        body,
                        silent,
                    } => self.service(right, endpoint, body, *silent, &l)?,
                    _ => self.eval(right, scope, seed)?,
                };
                let rows = algebra::join(&l, &r);
                self.replace_pair(HookKind::Join, op, scope, &l, &r, rows)
            }
            Operator::Optional {
                left,
                right,
                filter,
            } => {
                let l = self.eval(left, scope, seed)?;
                let r = self.eval(right, scope, seed)?;
                let rows = match filter {
                    None => algebra::left_join(&l, &r, |_| true),
                    Some(expr) => {
                        algebra::try_left_join(&l, &r, |row| self.filter_holds(expr, scope, row))?
                    }
                };
                self.replace_pair(HookKind::Optional, op, scope, &l, &r, rows)
            }
            Operator::Minus(left, right) => {
                let l = self.eval(left, scope, seed)?;
                let r = self.eval(right, scope, &Binding::new())?;
                let rows = algebra::minus(&l, &r);
                self.replace_pair(HookKind::Minus, op, scope, &l, &r, rows)
            }
            Operator::Union(left, right) => {
                let l = self.eval(left, scope, seed)?;
                let r = self.eval(right, scope, seed)?;
                let rows = algebra::union(&l, &r);
                self.replace_pair(HookKind::Union, op, scope, &l, &r, rows)
            }
            Operator::Graph { name, body } => self.graph(op, name, body, scope, seed),
            Operator::Service {
                endpoint,
                body,
                silent,
            } => self.service(op, endpoint, body, *silent, std::slice::from_ref(seed)),
            Operator::Path {
                subject,
                path,
                object,
            } => self.path(op, subject, path, object, scope, seed),
            Operator::Filter { expr, body } => {
                let rows = self.eval(body, scope, seed)?;
                let mut kept = Vec::with_capacity(rows.len());
                for row in rows {
                    if self.filter_holds(expr, scope, &row)? {
                        kept.push(row);
                    }
                }
                Ok(kept)
            }
            Operator::Extend {
                body,
                variable,
                expr,
            } => self.extend(op, body, variable, expr, scope, seed),
            Operator::Values { variables, rows } => self.values(op, variables, rows, scope, seed),
            Operator::SubQuery(query) => {
                let result = self.execute(query, scope, &Binding::new())?;
                let rows = algebra::join(std::slice::from_ref(seed), result.rows());
                self.replace(HookKind::Query, op, scope, rows)
            }
        }
    }

    /// Let a `(graph, operator, solutions)` hook replace a result.
    fn replace(
        &self,
        kind: HookKind,
        op: &Operator,
        scope: &GraphScope,
        rows: Vec<Binding>,
    ) -> Result<Vec<Binding>, QueryError> {
        let visitor = self.visitor();
        if !visitor.is_active(kind) {
            return Ok(rows);
        }
        let args = [graph_arg(scope), HookArg::Operator(op), HookArg::Solutions(&rows)];
        Ok(visitor.solutions(kind, &args)?.unwrap_or(rows))
    }

    /// Let a `(graph, operator, left, right)` hook replace a result.
    fn replace_pair(
        &self,
        kind: HookKind,
        op: &Operator,
        scope: &GraphScope,
        left: &[Binding],
        right: &[Binding],
        rows: Vec<Binding>,
    ) -> Result<Vec<Binding>, QueryError> {
        let args = [
            graph_arg(scope),
            HookArg::Operator(op),
            HookArg::Solutions(left),
            HookArg::Solutions(right),
        ];
        Ok(self.visitor().solutions(kind, &args)?.unwrap_or(rows))
    }

    fn bgp(
        &self,
        op: &Operator,
        patterns: &[TriplePattern],
        scope: &GraphScope,
        seed: &Binding,
    ) -> Result<Vec<Binding>, QueryError> {
        let visitor = self.visitor();
        let check_candidates = visitor.is_active(HookKind::Candidate);
        let mut rows = vec![seed.clone()];
        for pattern in patterns {
            let produced: Option<Vec<Arc<Edge>>> = if visitor.is_active(HookKind::Produce) {
                visitor
                    .edges(
                        HookKind::Produce,
                        &[graph_arg(scope), HookArg::Pattern(pattern)],
                    )?
                    .map(|edges| edges.into_iter().map(Arc::new).collect())
            } else {
                None
            };
            let mut next = Vec::new();
            for row in &rows {
                let fetched;
                let candidates: &[Arc<Edge>] = if let Some(edges) = &produced {
                    edges
                } else {
                    fetched = self
                        .session
                        .graph
                        .candidates(scope, &edge_pattern(pattern, row));
                    &fetched
                };
                for edge in candidates {
                    if check_candidates
                        && !visitor.decide(
                            HookKind::Candidate,
                            &[
                                graph_arg(scope),
                                HookArg::Pattern(pattern),
                                HookArg::Edge(edge.as_ref()),
                            ],
                            true,
                        )?
                    {
                        tracing::trace!("candidate {edge} rejected by hook");
                        continue;
                    }
                    if let Some(extended) = pattern.match_edge(edge, row) {
                        next.push(extended);
                    }
                }
            }
            rows = next;
            if rows.is_empty() {
                break;
            }
        }
        self.replace(HookKind::Bgp, op, scope, rows)
    }

    fn graph(
        &mut self,
        op: &Operator,
        name: &PatternTerm,
        body: &Operator,
        scope: &GraphScope,
        seed: &Binding,
    ) -> Result<Vec<Binding>, QueryError> {
        let rows = if let Some(graph) = name.resolve(seed) {
            self.eval(body, &GraphScope::Named(graph.clone()), seed)?
        } else if let Some(var) = name.as_variable() {
            let mut rows = Vec::new();
            for graph in self.session.graph.named_graphs() {
                let seed = seed.with(var.clone(), graph.clone());
                rows.extend(self.eval(body, &GraphScope::Named(graph), &seed)?);
            }
            rows
        } else {
            Vec::new()
        };
        self.replace(HookKind::Graph, op, scope, rows)
    }

    fn service(
        &mut self,
        op: &Operator,
        endpoint: &Term,
        body: &Operator,
        silent: bool,
        input: &[Binding],
    ) -> Result<Vec<Binding>, QueryError> {
        access::check(
            self.session.config.access_level,
            Feature::Service,
            endpoint.label(),
        )?;
        let visitor = self.visitor();
        let slice = visitor.slice(endpoint, input)?;
        let timeout = visitor.timeout(endpoint)?;
        let rows = match self.call_service(endpoint, body, input, slice.get(), timeout) {
            Ok(rows) => rows,
            Err(error) if silent => {
                tracing::debug!("silent service {endpoint} failed: {error}");
                vec![Binding::new()]
            }
            Err(error) => {
                let args = [
                    HookArg::Operator(op),
                    HookArg::Terms(std::slice::from_ref(endpoint)),
                ];
                match visitor.solutions(HookKind::Error, &args)? {
                    Some(rows) => rows,
                    None => return Err(error.into()),
                }
            }
        };
        let args = [
            HookArg::Term(Some(endpoint)),
            HookArg::Operator(op),
            HookArg::Solutions(&rows),
        ];
        Ok(visitor.solutions(HookKind::Service, &args)?.unwrap_or(rows))
    }

    fn call_service(
        &self,
        endpoint: &Term,
        body: &Operator,
        input: &[Binding],
        slice: usize,
        timeout: Option<std::time::Duration>,
    ) -> Result<Vec<Binding>, EvaluationError> {
        let Some(service) = self.session.services.get(endpoint) else {
            return Err(EvaluationError::UnknownService {
                endpoint: endpoint.label().to_owned(),
            });
        };
        let mut out = Vec::new();
        for page in input.chunks(slice) {
            tracing::debug!("sending {} bindings to service {endpoint}", page.len());
            let rows = self
                .session
                .runtime
                .call(service, body, page, timeout)
                .map_err(|e| match e {
                    ServiceError::Timeout(limit) => EvaluationError::ServiceTimeout {
                        endpoint: endpoint.label().to_owned(),
                        timeout_ms: limit.as_millis(),
                    },
                    ServiceError::Failed(message) => EvaluationError::ServiceFailed {
                        endpoint: endpoint.label().to_owned(),
                        message,
                    },
                })?;
            out.extend(rows);
        }
        Ok(out)
    }

    /// Evaluate a filter condition: the effective boolean value, `false` on
    /// a soft error, then the `filter` hook.
    pub(super) fn filter_holds(
        &mut self,
        expr: &Expr,
        scope: &GraphScope,
        row: &Binding,
    ) -> Result<bool, QueryError> {
        let default = match self.eval_expr(expr, row, scope, None) {
            Ok(term) => term.effective_boolean().unwrap_or(false),
            Err(ExprError::Fatal(e)) => return Err(*e),
            Err(e) => {
                tracing::trace!("filter {expr} is false: {e}");
                false
            }
        };
        self.visitor().decide(
            HookKind::Filter,
            &[graph_arg(scope), HookArg::Expr(expr), HookArg::Bool(default)],
            default,
        )
    }

    fn extend(
        &mut self,
        op: &Operator,
        body: &Operator,
        variable: &Variable,
        expr: &Expr,
        scope: &GraphScope,
        seed: &Binding,
    ) -> Result<Vec<Binding>, QueryError> {
        let rows = self.eval(body, scope, seed)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            if row.contains(variable) {
                out.push(row);
                continue;
            }
            let value = self.eval_expr(expr, &row, scope, None).soft()?;
            let value = self
                .visitor()
                .value(
                    HookKind::Bind,
                    &[graph_arg(scope), HookArg::Operator(op), HookArg::Term(value.as_ref())],
                )?
                .or(value);
            out.push(match value {
                Some(term) => row.with(variable.clone(), term),
                None => row,
            });
        }
        Ok(out)
    }

    fn values(
        &self,
        op: &Operator,
        variables: &[Variable],
        data: &[Vec<Option<Term>>],
        scope: &GraphScope,
        seed: &Binding,
    ) -> Result<Vec<Binding>, QueryError> {
        let mut rows = Vec::with_capacity(data.len());
        for cells in data {
            if cells.len() != variables.len() {
                return Err(EvaluationError::Malformed {
                    operator: op.to_string(),
                    message: format!(
                        "row has {} values for {} variables",
                        cells.len(),
                        variables.len()
                    ),
                }
                .into());
            }
            let row = Binding::from_pairs(
                variables
                    .iter()
                    .zip(cells)
                    .filter_map(|(v, cell)| cell.as_ref().map(|t| (v.clone(), t.clone()))),
            );
            if let Some(merged) = seed.merge(&row) {
                rows.push(merged);
            }
        }
        self.replace(HookKind::Values, op, scope, rows)
    }
}

/// Folds soft expression errors into "no value".
pub(super) trait SoftResult {
    fn soft(self) -> Result<Option<Term>, QueryError>;
}

impl SoftResult for Result<Term, ExprError> {
    fn soft(self) -> Result<Option<Term>, QueryError> {
        match self {
            Ok(term) => Ok(Some(term)),
            Err(ExprError::Fatal(e)) => Err(*e),
            Err(e) => {
                tracing::trace!("expression left unbound: {e}");
                Ok(None)
            }
        }
    }
}
