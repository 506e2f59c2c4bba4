//! Property path traversal.
//!
//! A path is walked from a start node to the set of nodes it reaches.
//! Repetition is a breadth-first closure with a visited set per origin, so
//! cycles terminate; the visited set is bounded by `max_path_visited`.
//! Results are deduplicated per origin, in discovery order.

use std::collections::{HashSet, VecDeque};

use super::evaluator::graph_arg;
use super::{EvaluationError, Evaluator};
use crate::binding::Binding;
use crate::error::QueryError;
use crate::graph::{EdgePattern, GraphScope, Producer};
use crate::hook::{HookArg, HookKind, Visitor};
use crate::query::{Operator, PathExpr, PatternTerm};
use crate::types::Term;

fn push_unique(out: &mut Vec<Term>, term: Term) {
    if !out.contains(&term) {
        out.push(term);
    }
}

/// Bind `position` to `term` in `row`; `None` on disagreement.
fn bind(row: &Binding, position: &PatternTerm, term: &Term) -> Option<Binding> {
    match position {
        PatternTerm::Term(constant) => (constant == term).then(|| row.clone()),
        PatternTerm::Var(var) => match row.get(var) {
            Some(bound) => (bound == term).then(|| row.clone()),
            None => Some(row.with(var.clone(), term.clone())),
        },
    }
}

struct Walker<'a, 's> {
    visitor: Visitor<'s>,
    graph: &'s dyn Producer,
    scope: &'a GraphScope,
    op: &'a Operator,
    limit: usize,
    check_steps: bool,
}

impl Walker<'_, '_> {
    fn reach(&self, path: &PathExpr, from: &Term) -> Result<Vec<Term>, QueryError> {
        match path {
            PathExpr::Predicate(p) => self.step(path, from, Some(p), &[], true),
            PathExpr::Negated(excluded) => self.step(path, from, None, excluded, true),
            PathExpr::Inverse(inner) => match inner.as_ref() {
                PathExpr::Predicate(p) => self.step(path, from, Some(p), &[], false),
                PathExpr::Negated(excluded) => self.step(path, from, None, excluded, false),
                other => self.reach(&other.reversed(), from),
            },
            PathExpr::Sequence(first, second) => {
                let mut out = Vec::new();
                for middle in self.reach(first, from)? {
                    for end in self.reach(second, &middle)? {
                        push_unique(&mut out, end);
                    }
                }
                Ok(out)
            }
            PathExpr::Alternative(left, right) => {
                let mut out = self.reach(left, from)?;
                for end in self.reach(right, from)? {
                    push_unique(&mut out, end);
                }
                Ok(out)
            }
            PathExpr::ZeroOrOne(inner) => {
                let mut out = vec![from.clone()];
                for end in self.reach(inner, from)? {
                    push_unique(&mut out, end);
                }
                Ok(out)
            }
            PathExpr::ZeroOrMore(inner) => self.closure(path, inner, from, true),
            PathExpr::OneOrMore(inner) => self.closure(path, inner, from, false),
        }
    }

    /// One edge away from `from`, forwards or backwards.
    fn step(
        &self,
        path: &PathExpr,
        from: &Term,
        predicate: Option<&Term>,
        excluded: &[Term],
        forward: bool,
    ) -> Result<Vec<Term>, QueryError> {
        let pattern = if forward {
            EdgePattern::new(Some(from.clone()), predicate.cloned(), None)
        } else {
            EdgePattern::new(None, predicate.cloned(), Some(from.clone()))
        };
        let mut out = Vec::new();
        for edge in self.graph.candidates(self.scope, &pattern) {
            if excluded.contains(&edge.predicate) {
                continue;
            }
            let to = if forward { &edge.object } else { &edge.subject };
            if self.check_steps
                && !self.visitor.decide(
                    HookKind::Step,
                    &[
                        graph_arg(self.scope),
                        HookArg::Operator(self.op),
                        HookArg::Path(path),
                        HookArg::Term(Some(from)),
                        HookArg::Term(Some(to)),
                    ],
                    true,
                )?
            {
                tracing::trace!("step {from} -> {to} vetoed");
                continue;
            }
            push_unique(&mut out, to.clone());
        }
        Ok(out)
    }

    fn closure(
        &self,
        path: &PathExpr,
        inner: &PathExpr,
        from: &Term,
        reflexive: bool,
    ) -> Result<Vec<Term>, QueryError> {
        let mut visited: HashSet<Term> = HashSet::new();
        let mut out = Vec::new();
        if reflexive {
            visited.insert(from.clone());
            out.push(from.clone());
        }
        let mut frontier = VecDeque::from([from.clone()]);
        while let Some(node) = frontier.pop_front() {
            for next in self.reach(inner, &node)? {
                if !visited.insert(next.clone()) {
                    continue;
                }
                if visited.len() > self.limit {
                    tracing::warn!("path {path} from {from} exceeded {} visited nodes", self.limit);
                    return Err(EvaluationError::PathLimitExceeded {
                        path: path.to_string(),
                        limit: self.limit,
                    }
                    .into());
                }
                out.push(next.clone());
                frontier.push_back(next);
            }
        }
        Ok(out)
    }
}

impl Evaluator<'_> {
    pub(super) fn path(
        &self,
        op: &Operator,
        subject: &PatternTerm,
        path: &PathExpr,
        object: &PatternTerm,
        scope: &GraphScope,
        seed: &Binding,
    ) -> Result<Vec<Binding>, QueryError> {
        let visitor = self.visitor();
        let walker = Walker {
            visitor,
            graph: self.session.graph,
            scope,
            op,
            limit: self.session.config.max_path_visited.get(),
            check_steps: visitor.is_active(HookKind::Step),
        };
        let mut matches: Vec<(Term, Term)> = Vec::new();
        match (subject.resolve(seed), object.resolve(seed)) {
            (Some(s), _) => {
                for o in walker.reach(path, s)? {
                    matches.push((s.clone(), o));
                }
            }
            (None, Some(o)) => {
                for s in walker.reach(&path.reversed(), o)? {
                    matches.push((s, o.clone()));
                }
            }
            (None, None) => {
                for origin in self.session.graph.nodes(scope) {
                    for o in walker.reach(path, &origin)? {
                        matches.push((origin.clone(), o));
                    }
                }
            }
        }

        let notify = visitor.is_active(HookKind::Path);
        let mut rows = Vec::new();
        for (s, o) in &matches {
            let Some(row) = bind(seed, subject, s).and_then(|row| bind(&row, object, o)) else {
                continue;
            };
            if notify {
                visitor.notify(
                    HookKind::Path,
                    &[
                        graph_arg(scope),
                        HookArg::Operator(op),
                        HookArg::Path(path),
                        HookArg::Term(Some(s)),
                        HookArg::Term(Some(o)),
                    ],
                )?;
            }
            rows.push(row);
        }
        tracing::trace!("path {path}: {} matches", rows.len());
        Ok(rows)
    }
}
