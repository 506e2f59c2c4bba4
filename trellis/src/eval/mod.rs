//! The algebra evaluator.
//!
//! A recursive interpreter over a compiled query's operator tree. It reads
//! candidate edges from a [`Producer`], combines solutions with the
//! functions in [`crate::algebra`], and fires the hook protocol around every
//! operator.
//!
//! Everything an evaluation needs from outside is bundled in a [`Session`];
//! everything it changes as it runs lives in the [`Evaluator`] itself
//! (distinct tables) or in the [`EvalState`] it threads through calls
//! (re-entrancy guard, nesting depth). Nothing is process-global.
//!
//! # Invariants
//!
//! - The graph is only read; updates are applied by the processor after
//!   evaluation
//! - Solution order is deterministic for a deterministic producer and
//!   deterministic hooks

mod error;
mod evaluator;
mod expr;
mod function;
mod modifiers;
mod path;
mod service;

use std::num::NonZeroUsize;

pub use error::EvaluationError;
pub use evaluator::Evaluator;
pub use expr::ExprError;
pub use function::{FunctionRegistry, UserFunction};
pub use service::{ServiceEndpoint, ServiceError, ServiceRegistry, ServiceRuntime};

use crate::config::EngineConfig;
use crate::graph::Producer;
use crate::hook::HookRegistry;

/// Collaborators of one evaluation. All read-only.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub graph: &'a dyn Producer,
    pub hooks: &'a HookRegistry,
    pub functions: &'a FunctionRegistry,
    pub services: &'a ServiceRegistry,
    pub config: &'a EngineConfig,
    pub runtime: &'a ServiceRuntime,
}

/// Per-call-chain evaluation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalState {
    /// Set while an `overload`, `compare` or `error` handler runs.
    pub in_overload: bool,
    /// Number of enclosing hook-initiated queries.
    pub depth: usize,
}

impl EvalState {
    /// State for a query started from inside a hook.
    pub fn nested(self, limit: NonZeroUsize) -> Result<Self, EvaluationError> {
        let depth = self.depth + 1;
        if depth > limit.get() {
            tracing::warn!("nested query depth {depth} exceeds limit {}", limit.get());
            return Err(EvaluationError::NestingTooDeep { limit: limit.get() });
        }
        Ok(Self { depth, ..self })
    }
}
