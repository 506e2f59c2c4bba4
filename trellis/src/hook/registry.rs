//! Handler registry keyed by `(HookKind, arity)`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::{HookCall, HookKind, HookValue};
use crate::error::QueryError;

/// A hook handler. Returns `Ok(None)` to keep the default behavior.
pub type Handler =
    Arc<dyn Fn(&HookCall<'_>) -> Result<Option<HookValue>, QueryError> + Send + Sync>;

/// Registered handlers and per-kind masking.
#[derive(Clone, Default)]
pub struct HookRegistry {
    handlers: HashMap<(HookKind, usize), Handler>,
    masked: HashSet<HookKind>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `(kind, arity)`, replacing any previous one.
    ///
    /// A handler whose arity differs from the kind's is stored but never
    /// called.
    pub fn register(&mut self, kind: HookKind, arity: usize, handler: Handler) {
        if arity != kind.arity() {
            tracing::warn!(
                "{} hook registered with arity {arity}, expected {}; it will not be called",
                kind.name(),
                kind.arity()
            );
        } else {
            tracing::debug!("{} hook registered", kind.name());
        }
        self.handlers.insert((kind, arity), handler);
    }

    /// Register a handler under the kind's own arity.
    pub fn on<F>(&mut self, kind: HookKind, handler: F)
    where
        F: Fn(&HookCall<'_>) -> Result<Option<HookValue>, QueryError> + Send + Sync + 'static,
    {
        self.register(kind, kind.arity(), Arc::new(handler));
    }

    pub fn remove(&mut self, kind: HookKind, arity: usize) -> Option<Handler> {
        self.handlers.remove(&(kind, arity))
    }

    /// Whether a handler is registered under `(kind, arity)`.
    #[must_use]
    pub fn define(&self, kind: HookKind, arity: usize) -> bool {
        self.handlers.contains_key(&(kind, arity))
    }

    /// Whether events of `kind` are delivered.
    #[must_use]
    pub fn accept(&self, kind: HookKind) -> bool {
        !self.masked.contains(&kind)
    }

    /// Mask or unmask events of `kind`.
    pub fn set_accept(&mut self, kind: HookKind, accept: bool) {
        if accept {
            self.masked.remove(&kind);
        } else {
            self.masked.insert(kind);
        }
    }

    /// Whether hook point `kind` would call a handler.
    #[must_use]
    pub fn is_active(&self, kind: HookKind) -> bool {
        self.accept(kind) && self.define(kind, kind.arity())
    }

    /// The handler that would run for `kind`, if any.
    #[must_use]
    pub fn handler(&self, kind: HookKind) -> Option<&Handler> {
        if !self.accept(kind) {
            return None;
        }
        self.handlers.get(&(kind, kind.arity()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self
            .handlers
            .keys()
            .map(|(kind, arity)| format!("{kind}/{arity}"))
            .collect();
        keys.sort();
        f.debug_struct("HookRegistry")
            .field("handlers", &keys)
            .field("masked", &self.masked)
            .finish()
    }
}
