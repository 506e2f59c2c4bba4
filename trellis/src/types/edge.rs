//! Edges: (subject, predicate, object[, graph]) tuples.

use std::cmp::Ordering;
use std::fmt;

use super::compare::{ComparisonError, compare, equals_value, same_term};
use super::term::Term;

/// An asserted edge.
///
/// `graph` is `None` for edges in the default graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Option<Term>,
}

impl Edge {
    /// Create an edge in the default graph.
    #[must_use]
    pub const fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: None,
        }
    }

    /// Create an edge in a named graph.
    #[must_use]
    pub const fn in_graph(subject: Term, predicate: Term, object: Term, graph: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: Some(graph),
        }
    }

    /// Syntactic identity of subject, predicate and object; graph ignored.
    #[must_use]
    pub fn same_term_without_graph(&self, other: &Self) -> bool {
        same_term(&self.subject, &other.subject)
            && same_term(&self.predicate, &other.predicate)
            && same_term(&self.object, &other.object)
    }

    /// Value equality of subject, predicate and object; graph ignored.
    #[must_use]
    pub fn equals_without_graph(&self, other: &Self) -> bool {
        equals_value(&self.subject, &other.subject)
            && equals_value(&self.predicate, &other.predicate)
            && equals_value(&self.object, &other.object)
    }

    /// Lexicographic order over subject, predicate, object; graph ignored.
    pub fn compare_without_graph(&self, other: &Self) -> Result<Ordering, ComparisonError> {
        let ord = compare(&self.subject, &other.subject)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
        let ord = compare(&self.predicate, &other.predicate)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
        compare(&self.object, &other.object)
    }

    /// Lexicographic order including the graph, default graph first.
    pub fn compare_with_graph(&self, other: &Self) -> Result<Ordering, ComparisonError> {
        let ord = self.compare_without_graph(other)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
        match (&self.graph, &other.graph) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (Some(g1), Some(g2)) => compare(g1, g2),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.graph {
            Some(g) => write!(
                f,
                "{} {} {} {}",
                self.subject, self.predicate, self.object, g
            ),
            None => write!(f, "{} {} {}", self.subject, self.predicate, self.object),
        }
    }
}
