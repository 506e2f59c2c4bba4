//! Query variables.

use std::fmt;
use std::sync::Arc;

/// A query variable, named without the leading `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Arc<str>);

impl Variable {
    /// Create a variable. A leading `?` or `$` is stripped.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let name = name
            .strip_prefix('?')
            .or_else(|| name.strip_prefix('$'))
            .unwrap_or(name);
        Self(Arc::from(name))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
