//! Top-level error returned to query callers.

use std::fmt;

use crate::access::SafetyError;
use crate::config::ConfigError;
use crate::eval::EvaluationError;
use crate::graph::{LoadError, LockConflictError};

/// Error returned by [`QueryProcessor`](crate::processor::QueryProcessor)
/// operations. An error aborts the query or update that raised it; the
/// graph is left as it was before the failing update.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Evaluation failed (malformed tree, unknown function, service failure).
    Evaluation(EvaluationError),
    /// The graph lock was requested by a thread that already holds it.
    LockConflict(LockConflictError),
    /// The access level forbids the operation.
    Safety(SafetyError),
    /// The ingestion collaborator failed.
    Load(LoadError),
    Config(ConfigError),
    /// The graph lock was poisoned by a panicking thread.
    LockPoisoned,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluation(e) => write!(f, "evaluation error: {e}"),
            Self::LockConflict(e) => write!(f, "lock conflict: {e}"),
            Self::Safety(e) => write!(f, "safety error: {e}"),
            Self::Load(e) => write!(f, "load error: {e}"),
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::LockPoisoned => write!(f, "graph lock poisoned"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Evaluation(e) => Some(e),
            Self::LockConflict(e) => Some(e),
            Self::Safety(e) => Some(e),
            Self::Load(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::LockPoisoned => None,
        }
    }
}

impl From<EvaluationError> for QueryError {
    fn from(e: EvaluationError) -> Self {
        Self::Evaluation(e)
    }
}

impl From<LockConflictError> for QueryError {
    fn from(e: LockConflictError) -> Self {
        Self::LockConflict(e)
    }
}

impl From<SafetyError> for QueryError {
    fn from(e: SafetyError) -> Self {
        Self::Safety(e)
    }
}

impl From<LoadError> for QueryError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ConfigError> for QueryError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
