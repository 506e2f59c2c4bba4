//! Property path expressions.

use std::fmt;

use crate::types::Term;

/// A regular expression over predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathExpr {
    /// A single predicate step.
    Predicate(Term),
    /// `^p`: traverse in reverse.
    Inverse(Box<PathExpr>),
    /// `p1 / p2`
    Sequence(Box<PathExpr>, Box<PathExpr>),
    /// `p1 | p2`
    Alternative(Box<PathExpr>, Box<PathExpr>),
    /// `p*`
    ZeroOrMore(Box<PathExpr>),
    /// `p+`
    OneOrMore(Box<PathExpr>),
    /// `p?`
    ZeroOrOne(Box<PathExpr>),
    /// `!(p1 | ... | pn)`: any single predicate not in the set.
    Negated(Vec<Term>),
}

impl PathExpr {
    #[must_use]
    pub const fn predicate(term: Term) -> Self {
        Self::Predicate(term)
    }

    #[must_use]
    pub fn inverse(self) -> Self {
        Self::Inverse(Box::new(self))
    }

    #[must_use]
    pub fn then(self, next: Self) -> Self {
        Self::Sequence(Box::new(self), Box::new(next))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Alternative(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn zero_or_more(self) -> Self {
        Self::ZeroOrMore(Box::new(self))
    }

    #[must_use]
    pub fn one_or_more(self) -> Self {
        Self::OneOrMore(Box::new(self))
    }

    #[must_use]
    pub fn zero_or_one(self) -> Self {
        Self::ZeroOrOne(Box::new(self))
    }

    /// The path traversed backwards.
    #[must_use]
    pub fn reversed(&self) -> Self {
        match self {
            Self::Predicate(_) | Self::Negated(_) => Self::Inverse(Box::new(self.clone())),
            Self::Inverse(inner) => inner.as_ref().clone(),
            Self::Sequence(a, b) => Self::Sequence(Box::new(b.reversed()), Box::new(a.reversed())),
            Self::Alternative(a, b) => {
                Self::Alternative(Box::new(a.reversed()), Box::new(b.reversed()))
            }
            Self::ZeroOrMore(inner) => Self::ZeroOrMore(Box::new(inner.reversed())),
            Self::OneOrMore(inner) => Self::OneOrMore(Box::new(inner.reversed())),
            Self::ZeroOrOne(inner) => Self::ZeroOrOne(Box::new(inner.reversed())),
        }
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(p) => write!(f, "{p}"),
            Self::Inverse(p) => write!(f, "^({p})"),
            Self::Sequence(a, b) => write!(f, "({a} / {b})"),
            Self::Alternative(a, b) => write!(f, "({a} | {b})"),
            Self::ZeroOrMore(p) => write!(f, "({p})*"),
            Self::OneOrMore(p) => write!(f, "({p})+"),
            Self::ZeroOrOne(p) => write!(f, "({p})?"),
            Self::Negated(set) => {
                write!(f, "!(")?;
                for (i, p) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
        }
    }
}
