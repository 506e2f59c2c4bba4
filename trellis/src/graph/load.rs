//! The ingestion collaborator's interface.
//!
//! Parsing is not part of this crate: a `Loader` receives the write-locked
//! store and a path and adds edges to it. The processor wraps each call in
//! the access check and the `beforeLoad`/`afterLoad` notifications.

use std::fmt;

use super::producer::GraphStore;

/// Error reported by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub path: String,
    pub message: String,
}

impl LoadError {
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {}", self.path, self.message)
    }
}

impl std::error::Error for LoadError {}

/// Adds the content at `path` to a store; returns the number of edges added.
pub trait Loader {
    fn load(&self, path: &str, store: &mut dyn GraphStore) -> Result<usize, LoadError>;
}

impl<F> Loader for F
where
    F: Fn(&str, &mut dyn GraphStore) -> Result<usize, LoadError>,
{
    fn load(&self, path: &str, store: &mut dyn GraphStore) -> Result<usize, LoadError> {
        self(path, store)
    }
}
