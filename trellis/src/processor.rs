//! The query processor: entry point for queries, updates and loads.
//!
//! Owns the graph behind a [`SharedGraph`] together with everything an
//! evaluation needs (hooks, functions, services, configuration). Queries
//! run under the read lock, updates and loads under the write lock.
//!
//! # Example
//!
//! ```ignore
//! use trellis::processor::QueryProcessor;
//! use trellis::query::{CompiledQuery, Operator, PatternTerm, TriplePattern};
//!
//! let processor = QueryProcessor::new(MemoryGraph::from_edges(edges));
//! let query = CompiledQuery::select(Operator::bgp(vec![TriplePattern::new(
//!     PatternTerm::var("s"),
//!     knows.clone(),
//!     PatternTerm::var("o"),
//! )]))
//! .compile();
//! let results = processor.query(&query)?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::access::{self, Feature};
use crate::binding::{Binding, Bindings};
use crate::config::EngineConfig;
use crate::error::QueryError;
use crate::eval::{
    EvalState, EvaluationError, Evaluator, FunctionRegistry, ServiceRegistry, ServiceRuntime,
    Session,
};
use crate::graph::{GraphStore, Loader, MemoryGraph, Producer, SharedGraph};
use crate::hook::{HookArg, HookKind, HookRegistry, Visitor};
use crate::query::{CompiledQuery, PatternTerm, QueryForm, TriplePattern};
use crate::types::{Edge, Term};

/// Runs compiled queries against one graph.
#[derive(Debug)]
pub struct QueryProcessor<G = MemoryGraph> {
    graph: SharedGraph<G>,
    hooks: HookRegistry,
    functions: FunctionRegistry,
    services: ServiceRegistry,
    config: EngineConfig,
    runtime: ServiceRuntime,
    blank_counter: AtomicUsize,
}

impl Default for QueryProcessor<MemoryGraph> {
    fn default() -> Self {
        Self::new(MemoryGraph::new())
    }
}

fn fresh_blank(position: &PatternTerm, suffix: usize) -> PatternTerm {
    match position {
        PatternTerm::Term(Term::Blank(b)) => {
            PatternTerm::Term(Term::blank(format!("{}_{suffix}", b.label())))
        }
        other => other.clone(),
    }
}

impl<G: GraphStore> QueryProcessor<G> {
    #[must_use]
    pub fn new(graph: G) -> Self {
        Self::with_config(graph, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(graph: G, config: EngineConfig) -> Self {
        Self {
            graph: SharedGraph::new(graph),
            hooks: HookRegistry::new(),
            functions: FunctionRegistry::new(),
            services: ServiceRegistry::new(),
            config,
            runtime: ServiceRuntime::new(),
            blank_counter: AtomicUsize::new(0),
        }
    }

    /// A processor configured from `TRELLIS_*` environment variables.
    pub fn from_env(graph: G) -> Result<Self, QueryError> {
        Ok(Self::with_config(graph, EngineConfig::from_env()?))
    }

    pub const fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    #[must_use]
    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub const fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub const fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn graph(&self) -> &SharedGraph<G> {
        &self.graph
    }

    fn session<'a>(&'a self, graph: &'a dyn Producer) -> Session<'a> {
        Session {
            graph,
            hooks: &self.hooks,
            functions: &self.functions,
            services: &self.services,
            config: &self.config,
            runtime: &self.runtime,
        }
    }

    fn notify(&self, graph: &G, kind: HookKind, args: &[HookArg<'_>]) -> Result<(), QueryError> {
        let session = self.session(graph);
        Visitor::new(&session, EvalState::default()).notify(kind, args)
    }

    /// Evaluate a query. Updates are routed to [`update`](Self::update).
    pub fn query(&self, query: &Arc<CompiledQuery>) -> Result<Bindings, QueryError> {
        self.query_with(query, &Binding::new())
    }

    /// Evaluate a query seeded with `initial`.
    pub fn query_with(
        &self,
        query: &Arc<CompiledQuery>,
        initial: &Binding,
    ) -> Result<Bindings, QueryError> {
        if query.is_update() {
            return self.update_with(query, initial);
        }
        let guard = self.graph.read("query")?;
        let session = self.session(&*guard);
        let result = Evaluator::new(&session, EvalState::default()).run(query, initial)?;
        tracing::debug!("query returned {} solutions", result.len());
        Ok(result)
    }

    /// Whether the query has at least one solution.
    pub fn ask(&self, query: &Arc<CompiledQuery>) -> Result<bool, QueryError> {
        Ok(!self.query(query)?.is_empty())
    }

    /// Evaluate a CONSTRUCT query and return the edges it builds.
    pub fn construct(&self, query: &Arc<CompiledQuery>) -> Result<Vec<Edge>, QueryError> {
        self.construct_with(query, &Binding::new())
    }

    pub fn construct_with(
        &self,
        query: &Arc<CompiledQuery>,
        initial: &Binding,
    ) -> Result<Vec<Edge>, QueryError> {
        let result = self.query_with(query, initial)?;
        Ok(self.instantiate(query.template(), result.rows()))
    }

    /// Instantiate `template` once per row.
    ///
    /// Rows that leave a template variable unbound produce no edge for that
    /// pattern. Blank nodes are renamed per row. Duplicates are dropped.
    fn instantiate(&self, template: &[TriplePattern], rows: &[Binding]) -> Vec<Edge> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in rows {
            let suffix = self.blank_counter.fetch_add(1, Ordering::Relaxed);
            for pattern in template {
                let pattern = TriplePattern {
                    subject: fresh_blank(&pattern.subject, suffix),
                    predicate: pattern.predicate.clone(),
                    object: fresh_blank(&pattern.object, suffix),
                };
                if let Some(edge) = pattern.instantiate(row, None) {
                    if seen.insert(edge.clone()) {
                        out.push(edge);
                    }
                }
            }
        }
        out
    }

    /// Run an update: evaluate WHERE, then delete and insert the
    /// instantiated templates.
    pub fn update(&self, query: &Arc<CompiledQuery>) -> Result<Bindings, QueryError> {
        self.update_with(query, &Binding::new())
    }

    fn update_with(
        &self,
        query: &Arc<CompiledQuery>,
        initial: &Binding,
    ) -> Result<Bindings, QueryError> {
        let QueryForm::Update { delete, insert } = &query.form else {
            return Err(EvaluationError::Malformed {
                operator: query.root.to_string(),
                message: "not an update".to_owned(),
            }
            .into());
        };
        let target = query.ast.text.as_deref().unwrap_or("update");
        access::check(self.config.access_level, Feature::Update, target)?;
        let mut guard = self.graph.write("update")?;

        let (mut result, to_delete, to_insert) = {
            let session = self.session(&*guard);
            Visitor::new(&session, EvalState::default())
                .notify(HookKind::BeforeUpdate, &[HookArg::Query(query)])?;
            let result = Evaluator::new(&session, EvalState::default()).run(query, initial)?;
            let to_delete = self.instantiate(delete, result.rows());
            let to_insert = self.instantiate(insert, result.rows());
            (result, to_delete, to_insert)
        };

        let deleted: Vec<Edge> = to_delete.into_iter().filter(|e| guard.delete(e)).collect();
        let inserted: Vec<Edge> = to_insert
            .into_iter()
            .filter(|e| guard.insert(e.clone()))
            .collect();
        result.record_delete(deleted.len());
        result.record_insert(inserted.len());

        if let Err(e) = self.notify_update(&guard, query, &deleted, &inserted, &result) {
            for edge in &inserted {
                guard.delete(edge);
            }
            for edge in deleted {
                guard.insert(edge);
            }
            tracing::warn!("update rolled back: {e}");
            return Err(e);
        }
        tracing::info!(
            "update deleted {} and inserted {} edges",
            deleted.len(),
            inserted.len()
        );
        Ok(result)
    }

    /// Fire the post-change update hooks. The caller undoes the change if
    /// one fails.
    fn notify_update(
        &self,
        graph: &G,
        query: &Arc<CompiledQuery>,
        deleted: &[Edge],
        inserted: &[Edge],
        result: &Bindings,
    ) -> Result<(), QueryError> {
        let session = self.session(graph);
        let visitor = Visitor::new(&session, EvalState::default());
        for edge in deleted {
            visitor.notify(HookKind::Delete, &[HookArg::Edge(edge)])?;
        }
        for edge in inserted {
            visitor.notify(
                HookKind::Insert,
                &[HookArg::Graph(edge.graph.as_ref()), HookArg::Edge(edge)],
            )?;
        }
        visitor.notify(
            HookKind::Update,
            &[
                HookArg::Query(query),
                HookArg::Edges(deleted),
                HookArg::Edges(inserted),
            ],
        )?;
        visitor.notify(HookKind::AfterUpdate, &[HookArg::Bindings(result)])
    }

    /// Load `path` into the graph through `loader`.
    pub fn load(&self, loader: &dyn Loader, path: &str) -> Result<usize, QueryError> {
        access::check(self.config.access_level, Feature::for_path(path), path)?;
        let mut guard = self.graph.write("load")?;
        self.notify(&guard, HookKind::BeforeLoad, &[HookArg::Text(path)])?;
        let added = loader.load(path, &mut *guard)?;
        self.notify(&guard, HookKind::AfterLoad, &[HookArg::Text(path)])?;
        tracing::info!("loaded {added} edges from {path}");
        Ok(added)
    }
}
