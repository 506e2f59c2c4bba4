#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods))]

// Life of a query:
// 1. A compiled query (form + operator tree + modifiers) reaches the processor
// 2. The processor takes the graph lock (read for queries, write for updates)
// 3. The evaluator walks the operator tree:
//     - Pattern matching pulls candidate edges from the producer
//     - Solutions are combined with join / left join / minus / union
//     - Hooks fire around every operator and may veto or replace results
//     - Comparisons with no built-in answer go to the overload resolver
// 4. Solution modifiers: grouping, projection, ordering, distinct, slicing
// 5. Updates apply their delete/insert templates, then release the lock
//
// System components:
//  - Term model and solution algebra
//  - Hook protocol
//  - Evaluator (operators, paths, expressions, services)
//  - Graph store and lock

pub mod access;
pub mod algebra;
pub mod binding;
pub mod config;
pub mod constants;
pub mod error;
pub mod eval;
pub mod graph;
pub mod hook;
pub mod overload;
pub mod processor;
pub mod query;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod simulation;
#[cfg(test)]
mod testing;

pub use binding::{Binding, Bindings};
pub use error::QueryError;
pub use processor::QueryProcessor;
