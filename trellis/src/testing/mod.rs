//! Shared fixtures for tests.

use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::graph::MemoryGraph;
use crate::processor::QueryProcessor;
use crate::query::{PatternTerm, TriplePattern};
use crate::types::{Edge, Term};

static TRACING: Once = Once::new();

/// Install a test subscriber once per process. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "trellis=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// An IRI in the example namespace.
pub fn ex(local: &str) -> Term {
    Term::iri(format!("http://ex/{local}"))
}

pub fn var(name: &str) -> PatternTerm {
    PatternTerm::var(name)
}

/// `?s <p> ?o` style pattern with the predicate in the example namespace.
pub fn pattern(subject: impl Into<PatternTerm>, predicate: &str, object: impl Into<PatternTerm>) -> TriplePattern {
    TriplePattern::new(subject, ex(predicate), object)
}

pub fn edge(subject: &str, predicate: &str, object: &str) -> Edge {
    Edge::new(ex(subject), ex(predicate), ex(object))
}

/// A processor over the given edges, with tracing enabled.
pub fn processor(edges: impl IntoIterator<Item = Edge>) -> QueryProcessor {
    init_tracing();
    QueryProcessor::new(MemoryGraph::from_edges(edges))
}

pub fn empty_processor() -> QueryProcessor {
    init_tracing();
    QueryProcessor::default()
}
