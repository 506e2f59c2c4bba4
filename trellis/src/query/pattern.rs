//! Triple patterns.

use std::fmt;

use crate::binding::Binding;
use crate::types::{Edge, Term, Variable};

/// One position of a triple pattern: a constant or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternTerm {
    Var(Variable),
    Term(Term),
}

impl PatternTerm {
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Var(Variable::new(name))
    }

    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Var(v) => Some(v),
            Self::Term(_) => None,
        }
    }

    /// The constant, or the variable's value in `binding`.
    #[must_use]
    pub fn resolve<'a>(&'a self, binding: &'a Binding) -> Option<&'a Term> {
        match self {
            Self::Term(t) => Some(t),
            Self::Var(v) => binding.get(v),
        }
    }
}

impl From<Term> for PatternTerm {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl From<Variable> for PatternTerm {
    fn from(var: Variable) -> Self {
        Self::Var(var)
    }
}

impl fmt::Display for PatternTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(v) => write!(f, "{v}"),
            Self::Term(t) => write!(f, "{t}"),
        }
    }
}

/// A triple pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

impl TriplePattern {
    #[must_use]
    pub fn new(
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Variables of the pattern, in position order, without repeats.
    #[must_use]
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = Vec::new();
        for position in [&self.subject, &self.predicate, &self.object] {
            if let Some(v) = position.as_variable() {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
        }
        vars
    }

    /// Extend `binding` so that this pattern matches `edge`.
    ///
    /// Returns `None` when a constant or an already-bound variable disagrees
    /// with the edge, including a variable repeated in the pattern that the
    /// edge gives two different values.
    #[must_use]
    pub fn match_edge(&self, edge: &Edge, binding: &Binding) -> Option<Binding> {
        let mut current = binding.clone();
        for (position, term) in [
            (&self.subject, &edge.subject),
            (&self.predicate, &edge.predicate),
            (&self.object, &edge.object),
        ] {
            match position {
                PatternTerm::Term(constant) => {
                    if constant != term {
                        return None;
                    }
                }
                PatternTerm::Var(var) => match current.get(var) {
                    Some(bound) if bound != term => return None,
                    Some(_) => {}
                    None => current = current.with(var.clone(), term.clone()),
                },
            }
        }
        Some(current)
    }

    /// Instantiate the pattern as an edge; `None` if a variable is unbound
    /// or the result would not be a valid edge (literal subject/predicate).
    #[must_use]
    pub fn instantiate(&self, binding: &Binding, graph: Option<&Term>) -> Option<Edge> {
        let subject = self.subject.resolve(binding)?;
        let predicate = self.predicate.resolve(binding)?;
        let object = self.object.resolve(binding)?;
        if subject.is_literal() || !predicate.is_iri() {
            return None;
        }
        Some(Edge {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: object.clone(),
            graph: graph.cloned(),
        })
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}
