//! The graph's reader/writer lock.
//!
//! Queries hold the read lock for a whole evaluation; updates and loads
//! hold the write lock. Code running inside an evaluation (hooks, nested
//! queries) reuses the graph reference it was handed instead of locking
//! again. Locking the same graph a second time from the thread that already
//! holds it would deadlock `std::sync::RwLock`, so that case fails fast with
//! `LockConflictError`.
//!
//! # Invariants
//!
//! - A thread holds at most one guard per `SharedGraph`
//! - The held-lock record is cleared when the guard drops, even on unwind

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::QueryError;

thread_local! {
    static HELD: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
}

/// Lock mode requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// The current thread already holds this graph's lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConflictError {
    pub requested: LockMode,
    /// What the lock was requested for, e.g. a load path.
    pub operation: String,
}

impl fmt::Display for LockConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lock for {} requested while the graph lock is already held",
            self.requested, self.operation
        )
    }
}

impl std::error::Error for LockConflictError {}

/// A graph shared between threads behind one reader/writer lock.
#[derive(Debug, Default)]
pub struct SharedGraph<G> {
    inner: RwLock<G>,
}

/// Read access to a [`SharedGraph`].
pub struct ReadGuard<'a, G> {
    guard: RwLockReadGuard<'a, G>,
    _held: Held,
}

/// Write access to a [`SharedGraph`].
pub struct WriteGuard<'a, G> {
    guard: RwLockWriteGuard<'a, G>,
    _held: Held,
}

struct Held(usize);

impl Drop for Held {
    fn drop(&mut self) {
        let key = self.0;
        HELD.with(|held| {
            held.borrow_mut().remove(&key);
        });
    }
}

impl<G> SharedGraph<G> {
    pub const fn new(graph: G) -> Self {
        Self {
            inner: RwLock::new(graph),
        }
    }

    fn key(&self) -> usize {
        std::ptr::from_ref(self).cast::<()>().addr()
    }

    /// Whether the current thread holds this graph's lock.
    #[must_use]
    pub fn is_held(&self) -> bool {
        let key = self.key();
        HELD.with(|held| held.borrow().contains(&key))
    }

    fn claim(&self, requested: LockMode, operation: &str) -> Result<Held, QueryError> {
        let key = self.key();
        let fresh = HELD.with(|held| held.borrow_mut().insert(key));
        if fresh {
            Ok(Held(key))
        } else {
            tracing::warn!("{operation}: {requested} lock requested while this thread holds the graph lock");
            Err(QueryError::LockConflict(LockConflictError {
                requested,
                operation: operation.to_owned(),
            }))
        }
    }

    /// Acquire the read lock.
    pub fn read(&self, operation: &str) -> Result<ReadGuard<'_, G>, QueryError> {
        let held = self.claim(LockMode::Read, operation)?;
        let guard = self.inner.read().map_err(|_| QueryError::LockPoisoned)?;
        Ok(ReadGuard {
            guard,
            _held: held,
        })
    }

    /// Acquire the write lock.
    pub fn write(&self, operation: &str) -> Result<WriteGuard<'_, G>, QueryError> {
        let held = self.claim(LockMode::Write, operation)?;
        let guard = self.inner.write().map_err(|_| QueryError::LockPoisoned)?;
        Ok(WriteGuard {
            guard,
            _held: held,
        })
    }

    pub fn into_inner(self) -> Result<G, QueryError> {
        self.inner.into_inner().map_err(|_| QueryError::LockPoisoned)
    }
}

impl<G> Deref for ReadGuard<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        &self.guard
    }
}

impl<G> Deref for WriteGuard<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        &self.guard
    }
}

impl<G> DerefMut for WriteGuard<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        &mut self.guard
    }
}
