//! In-memory graph store.
//!
//! Edges are kept in insertion order so candidate order is deterministic.
//! A hash set alongside the list rejects duplicates.

use std::collections::HashSet;
use std::sync::Arc;

use super::producer::{EdgePattern, GraphScope, GraphStore, Producer};
use crate::types::{Edge, Term};

#[derive(Debug, Default)]
pub struct MemoryGraph {
    edges: Vec<Arc<Edge>>,
    present: HashSet<Arc<Edge>>,
}

impl MemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from edges, skipping duplicates.
    #[must_use]
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.insert(edge);
        }
        graph
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Edge>> {
        self.edges.iter()
    }

    #[must_use]
    pub fn contains(&self, edge: &Edge) -> bool {
        self.present.contains(edge)
    }
}

impl Producer for MemoryGraph {
    fn candidates(&self, scope: &GraphScope, pattern: &EdgePattern) -> Vec<Arc<Edge>> {
        let matching = self
            .edges
            .iter()
            .filter(|e| scope.contains(e) && pattern.matches(e));
        match scope {
            GraphScope::Named(_) => matching.map(Arc::clone).collect(),
            GraphScope::Default => {
                // First occurrence wins when a triple is in several graphs.
                let mut seen = HashSet::new();
                matching
                    .filter(|e| seen.insert((&e.subject, &e.predicate, &e.object)))
                    .map(Arc::clone)
                    .collect()
            }
        }
    }

    fn named_graphs(&self) -> Vec<Term> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter_map(|e| e.graph.as_ref())
            .filter(|g| seen.insert(*g))
            .cloned()
            .collect()
    }

    fn nodes(&self, scope: &GraphScope) -> Vec<Term> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for edge in self.edges.iter().filter(|e| scope.contains(e)) {
            for node in [&edge.subject, &edge.object] {
                if seen.insert(node) {
                    out.push(node.clone());
                }
            }
        }
        out
    }
}

impl GraphStore for MemoryGraph {
    fn insert(&mut self, edge: Edge) -> bool {
        if self.present.contains(&edge) {
            return false;
        }
        let edge = Arc::new(edge);
        self.present.insert(Arc::clone(&edge));
        self.edges.push(edge);
        true
    }

    fn delete(&mut self, edge: &Edge) -> bool {
        if !self.present.remove(edge) {
            return false;
        }
        self.edges.retain(|e| e.as_ref() != edge);
        true
    }

    fn len(&self) -> usize {
        self.edges.len()
    }
}
