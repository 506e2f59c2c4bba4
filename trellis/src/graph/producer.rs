//! The storage-side capabilities the evaluator consumes.

use std::sync::Arc;

use crate::types::{Edge, Term};

/// Which graph pattern matching is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphScope {
    /// The default graph: the union of every graph in the store.
    Default,
    /// One named graph.
    Named(Term),
}

impl GraphScope {
    /// Whether `edge` is visible in this scope.
    #[must_use]
    pub fn contains(&self, edge: &Edge) -> bool {
        match self {
            Self::Default => true,
            Self::Named(name) => edge.graph.as_ref() == Some(name),
        }
    }

    /// The graph name, if this is a named scope.
    #[must_use]
    pub const fn name(&self) -> Option<&Term> {
        match self {
            Self::Default => None,
            Self::Named(name) => Some(name),
        }
    }
}

/// A partially bound edge: `None` positions match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
}

impl EdgePattern {
    #[must_use]
    pub const fn new(subject: Option<Term>, predicate: Option<Term>, object: Option<Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Whether `edge` agrees with every bound position (same-term).
    #[must_use]
    pub fn matches(&self, edge: &Edge) -> bool {
        self.subject.as_ref().is_none_or(|s| *s == edge.subject)
            && self.predicate.as_ref().is_none_or(|p| *p == edge.predicate)
            && self.object.as_ref().is_none_or(|o| *o == edge.object)
    }
}

/// Supplies candidate edges for a pattern.
///
/// Implementations must return candidates in a stable order and must not
/// change while an evaluation is reading them.
pub trait Producer: Send + Sync {
    /// Edges in `scope` matching `pattern`. In the default scope a triple
    /// stored in several graphs is returned once.
    fn candidates(&self, scope: &GraphScope, pattern: &EdgePattern) -> Vec<Arc<Edge>>;

    /// Names of the named graphs, in first-seen order.
    fn named_graphs(&self) -> Vec<Term>;

    /// Every subject and object in `scope`, in first-seen order.
    fn nodes(&self, scope: &GraphScope) -> Vec<Term>;
}

/// A mutable graph store.
pub trait GraphStore: Producer {
    /// Add an edge. Returns `false` if it was already present.
    fn insert(&mut self, edge: Edge) -> bool;

    /// Remove an edge. Returns `false` if it was absent.
    fn delete(&mut self, edge: &Edge) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
