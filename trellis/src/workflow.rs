//! Running a set of queries as one unit.
//!
//! Queries run in ascending `ast.priority`; ties keep insertion order.

use std::sync::Arc;

use crate::binding::{Binding, Bindings};
use crate::error::QueryError;
use crate::graph::GraphStore;
use crate::processor::QueryProcessor;
use crate::query::{CompiledQuery, PatternTerm};
use crate::types::{Edge, Term};

/// Results of [`QueryWorkflow::process`], in execution order.
#[derive(Debug)]
pub struct WorkflowResult {
    pub results: Vec<Bindings>,
    /// Whether some update inserted or deleted at least one edge.
    pub changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryWorkflow {
    queries: Vec<Arc<CompiledQuery>>,
}

impl QueryWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, query: Arc<CompiledQuery>) {
        let at = self
            .queries
            .partition_point(|q| q.ast.priority <= query.ast.priority);
        self.queries.insert(at, query);
    }

    #[must_use]
    pub fn queries(&self) -> &[Arc<CompiledQuery>] {
        &self.queries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Run every query in order. The first error stops the workflow.
    pub fn process<G: GraphStore>(
        &self,
        processor: &QueryProcessor<G>,
    ) -> Result<WorkflowResult, QueryError> {
        let mut results = Vec::with_capacity(self.queries.len());
        let mut changed = false;
        for query in &self.queries {
            let result = processor.query(query)?;
            changed |= result.nb_update() > 0;
            results.push(result);
        }
        tracing::debug!("workflow ran {} queries, changed: {changed}", results.len());
        Ok(WorkflowResult { results, changed })
    }

    /// The first CONSTRUCT query whose template produces `predicate`.
    #[must_use]
    pub fn producer_of(&self, predicate: &Term) -> Option<&Arc<CompiledQuery>> {
        self.queries.iter().find(|q| {
            q.is_construct()
                && q.template()
                    .iter()
                    .any(|p| matches!(&p.predicate, PatternTerm::Term(t) if t == predicate))
        })
    }

    /// Compute the `predicate` edges on demand: run the CONSTRUCT query
    /// that produces them, seeded with `initial`.
    ///
    /// Returns `None` when no query produces `predicate`.
    pub fn construct_for<G: GraphStore>(
        &self,
        processor: &QueryProcessor<G>,
        predicate: &Term,
        initial: &Binding,
    ) -> Result<Option<Vec<Edge>>, QueryError> {
        let Some(query) = self.producer_of(predicate) else {
            return Ok(None);
        };
        let edges = processor.construct_with(query, initial)?;
        Ok(Some(
            edges.into_iter().filter(|e| &e.predicate == predicate).collect(),
        ))
    }
}
