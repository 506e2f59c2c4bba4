//! User functions, callable from expressions by IRI.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::Term;

/// A user function. An `Err` is reported to the `error` hook and then
/// surfaces as an expression error.
pub type UserFunction = Arc<dyn Fn(&[Term]) -> Result<Term, String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, UserFunction>,
}

impl FunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Term]) -> Result<Term, String> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UserFunction> {
        self.functions.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry").field("functions", &names).finish()
    }
}
