use std::fmt;

/// Error that aborts the evaluation of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The operator tree cannot be evaluated as given.
    Malformed { operator: String, message: String },
    /// A call names a function that is neither registered nor handled by a
    /// hook.
    UnknownFunction { name: String },
    /// No endpoint is registered for a `SERVICE` IRI.
    UnknownService { endpoint: String },
    ServiceFailed { endpoint: String, message: String },
    ServiceTimeout { endpoint: String, timeout_ms: u128 },
    /// A `*`/`+` traversal visited more nodes than allowed from one origin.
    PathLimitExceeded { path: String, limit: usize },
    /// Hook-initiated queries nested deeper than allowed.
    NestingTooDeep { limit: usize },
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { operator, message } => {
                write!(f, "malformed operator {operator}: {message}")
            }
            Self::UnknownFunction { name } => write!(f, "unknown function <{name}>"),
            Self::UnknownService { endpoint } => write!(f, "no service registered for {endpoint}"),
            Self::ServiceFailed { endpoint, message } => {
                write!(f, "service {endpoint} failed: {message}")
            }
            Self::ServiceTimeout {
                endpoint,
                timeout_ms,
            } => write!(f, "service {endpoint} timed out after {timeout_ms}ms"),
            Self::PathLimitExceeded { path, limit } => {
                write!(f, "path {path} visited more than {limit} nodes")
            }
            Self::NestingTooDeep { limit } => {
                write!(f, "nested queries exceed the depth limit of {limit}")
            }
        }
    }
}

impl std::error::Error for EvaluationError {}
