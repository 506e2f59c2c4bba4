//! Term equality and ordering.
//!
//! Three relations are defined over terms:
//!
//! - `same_term`: syntactic identity. Total; never fails.
//! - `equals_value`: datatype-aware equality. Total; cross-kind pairs are
//!   simply unequal.
//! - `compare`: a strict weak order within a term kind. Cross-kind pairs
//!   fail with `ComparisonError`; no order is ever made up for them.
//!
//! `compare_terms` folds the failure into `TermOrdering::Incomparable` so
//! each call site can pick its own fallback.

use std::cmp::Ordering;
use std::fmt;

use super::term::{Term, TermKind};

/// Error returned when two terms have no defined order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonError {
    pub left: TermKind,
    pub right: TermKind,
}

impl fmt::Display for ComparisonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot compare {} with {}", self.left, self.right)
    }
}

impl std::error::Error for ComparisonError {}

/// Outcome of comparing two terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOrdering {
    Less,
    Equal,
    Greater,
    Incomparable,
}

impl TermOrdering {
    /// The ordering, if there is one.
    #[must_use]
    pub const fn ordering(self) -> Option<Ordering> {
        match self {
            Self::Less => Some(Ordering::Less),
            Self::Equal => Some(Ordering::Equal),
            Self::Greater => Some(Ordering::Greater),
            Self::Incomparable => None,
        }
    }
}

impl From<Ordering> for TermOrdering {
    fn from(ord: Ordering) -> Self {
        match ord {
            Ordering::Less => Self::Less,
            Ordering::Equal => Self::Equal,
            Ordering::Greater => Self::Greater,
        }
    }
}

const fn failure(a: &Term, b: &Term) -> ComparisonError {
    ComparisonError {
        left: a.kind(),
        right: b.kind(),
    }
}

/// Order two terms of the same kind.
///
/// IRIs and blank nodes order by label; literals by value with numeric
/// promotion; triple terms by their wrapped edges without graph, falling
/// back to label order when either edge is gone.
pub fn compare(a: &Term, b: &Term) -> Result<Ordering, ComparisonError> {
    match (a, b) {
        (Term::Iri(x), Term::Iri(y)) => Ok(x.as_str().cmp(y.as_str())),
        (Term::Blank(x), Term::Blank(y)) => Ok(x.label().cmp(y.label())),
        (Term::Literal(x), Term::Literal(y)) => x.compare_value(y).ok_or_else(|| failure(a, b)),
        (Term::Triple(x), Term::Triple(y)) => match (x.edge(), y.edge()) {
            (Some(e1), Some(e2)) => e1.compare_without_graph(&e2),
            _ => Ok(x.label().cmp(y.label())),
        },
        _ => Err(failure(a, b)),
    }
}

/// `compare` as a tri-state outcome.
#[must_use]
pub fn compare_terms(a: &Term, b: &Term) -> TermOrdering {
    compare(a, b).map_or(TermOrdering::Incomparable, TermOrdering::from)
}

/// Datatype-aware equality. Never fails.
#[must_use]
pub fn equals_value(a: &Term, b: &Term) -> bool {
    match (a, b) {
        (Term::Literal(x), Term::Literal(y)) => x.equals_value(y),
        (Term::Triple(x), Term::Triple(y)) => match (x.edge(), y.edge()) {
            (Some(e1), Some(e2)) => e1.equals_without_graph(&e2),
            _ => x.label() == y.label(),
        },
        _ => a == b,
    }
}

/// Syntactic identity. Triple terms compare their canonical labels, which
/// leave out the graph.
#[must_use]
pub fn same_term(a: &Term, b: &Term) -> bool {
    a == b
}
