//! Invariant checking for simulation runs.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use std::sync::Arc;

use crate::binding::Binding;
use crate::types::{self, Edge, Term};

/// An invariant violation detected during simulation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Iteration where it was detected.
    pub iteration: usize,
    /// Additional context.
    pub context: String,
}

/// Whether `row` agrees with every binding of `base`.
fn extends(row: &Binding, base: &Binding) -> bool {
    base.iter().all(|(var, term)| row.get(var) == Some(term))
}

/// Collects violations across checks.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    violations: Vec<InvariantViolation>,
}

impl InvariantChecker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn add_violation(&mut self, iteration: usize, description: &str, context: String) {
        self.violations.push(InvariantViolation {
            description: description.to_owned(),
            iteration,
            context,
        });
    }

    /// Every left solution is present in the result, extended or as is.
    pub fn check_optional_keeps_left(
        &mut self,
        iteration: usize,
        left: &[Binding],
        result: &[Binding],
    ) {
        if result.len() < left.len() {
            self.add_violation(
                iteration,
                "optional returned fewer rows than its left side",
                format!("left {} rows, result {} rows", left.len(), result.len()),
            );
        }
        for row in left {
            if !result.iter().any(|r| extends(r, row)) {
                self.add_violation(
                    iteration,
                    "optional dropped a left row",
                    format!("{row:?}"),
                );
            }
        }
    }

    /// A left solution sharing no variable with any right solution
    /// survives, and every survivor came from the left side.
    pub fn check_minus_keeps_disjoint(
        &mut self,
        iteration: usize,
        left: &[Binding],
        right: &[Binding],
        result: &[Binding],
    ) {
        for row in left {
            let disjoint = right.iter().all(|r| !row.shares_variable(r));
            if disjoint && !result.contains(row) {
                self.add_violation(
                    iteration,
                    "minus removed a row disjoint from the right side",
                    format!("{row:?}"),
                );
            }
        }
        if let Some(extra) = result.iter().find(|r| !left.contains(r)) {
            self.add_violation(iteration, "minus produced a row not on the left", format!("{extra:?}"));
        }
    }

    pub fn check_distinct_idempotent(&mut self, iteration: usize, once: &[Binding], twice: &[Binding]) {
        if once != twice {
            self.add_violation(
                iteration,
                "distinct is not idempotent",
                format!("once {once:?}, twice {twice:?}"),
            );
        }
        for (i, row) in once.iter().enumerate() {
            if once[..i].contains(row) {
                self.add_violation(iteration, "distinct kept a duplicate", format!("{row:?}"));
            }
        }
    }

    /// Path results from one origin are deduplicated.
    pub fn check_path_results(&mut self, iteration: usize, reached: &[Term]) {
        for (i, term) in reached.iter().enumerate() {
            if reached[..i].contains(term) {
                self.add_violation(iteration, "path reported a node twice", format!("{term}"));
            }
        }
    }

    /// Terms of different kinds fail to compare; same-kind comparisons are
    /// antisymmetric when they succeed.
    pub fn check_comparison(&mut self, iteration: usize, a: &Term, b: &Term) {
        let forward = types::compare(a, b);
        if a.kind() != b.kind() {
            if forward.is_ok() {
                self.add_violation(
                    iteration,
                    "terms of different kinds compared",
                    format!("{a} vs {b}"),
                );
            }
            return;
        }
        if let (Ok(x), Ok(y)) = (forward, types::compare(b, a)) {
            if x != y.reverse() {
                self.add_violation(iteration, "comparison is not antisymmetric", format!("{a} vs {b}"));
            }
        }
    }

    /// Triple terms over the same edge in two different graphs are the same
    /// term.
    pub fn check_triple_ignores_graph(&mut self, iteration: usize, edge: &Edge, graph: Term) {
        let in_graph = Arc::new(Edge::in_graph(
            edge.subject.clone(),
            edge.predicate.clone(),
            edge.object.clone(),
            graph,
        ));
        let plain = Arc::new(edge.clone());
        let (x, y) = (Term::triple(&plain), Term::triple(&in_graph));
        if !types::same_term(&x, &y) || !types::equals_value(&x, &y) {
            self.add_violation(
                iteration,
                "triple term identity depends on the graph",
                format!("{x} vs {y}"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variable;

    fn row(pairs: &[(&str, i64)]) -> Binding {
        Binding::from_pairs(pairs.iter().map(|(v, n)| (Variable::new(v), Term::integer(*n))))
    }

    #[test]
    fn test_detects_dropped_optional_row() {
        let mut checker = InvariantChecker::new();
        checker.check_optional_keeps_left(0, &[row(&[("x", 1)]), row(&[("x", 2)])], &[row(&[("x", 1)])]);
        assert!(checker.has_violations());
    }

    #[test]
    fn test_accepts_extended_optional_rows() {
        let mut checker = InvariantChecker::new();
        checker.check_optional_keeps_left(
            0,
            &[row(&[("x", 1)])],
            &[row(&[("x", 1), ("y", 1)]), row(&[("x", 1), ("y", 2)])],
        );
        assert!(!checker.has_violations());
    }

    #[test]
    fn test_detects_duplicate_after_distinct() {
        let mut checker = InvariantChecker::new();
        let rows = [row(&[("x", 1)]), row(&[("x", 1)])];
        checker.check_distinct_idempotent(3, &rows, &rows);
        assert_eq!(checker.violations()[0].iteration, 3);
    }
}
