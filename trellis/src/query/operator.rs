//! The operator tree: the algebra a compiled query evaluates.

use std::fmt;
use std::sync::Arc;

use super::CompiledQuery;
use super::expr::Expr;
use super::path::PathExpr;
use super::pattern::{PatternTerm, TriplePattern};
use crate::types::{Term, Variable};

/// An algebra operator.
#[derive(Debug, Clone)]
pub enum Operator {
    /// Basic graph pattern. The empty BGP yields one empty solution.
    Bgp(Vec<TriplePattern>),
    Join(Box<Operator>, Box<Operator>),
    /// Left join; `filter` is the `OPTIONAL { ... FILTER(..) }` condition.
    Optional {
        left: Box<Operator>,
        right: Box<Operator>,
        filter: Option<Expr>,
    },
    Minus(Box<Operator>, Box<Operator>),
    Union(Box<Operator>, Box<Operator>),
    /// Evaluate `body` in a named graph, or in each named graph when `name`
    /// is a variable.
    Graph {
        name: PatternTerm,
        body: Box<Operator>,
    },
    /// Delegate `body` to a registered endpoint.
    Service {
        endpoint: Term,
        body: Box<Operator>,
        silent: bool,
    },
    Path {
        subject: PatternTerm,
        path: PathExpr,
        object: PatternTerm,
    },
    Filter {
        expr: Expr,
        body: Box<Operator>,
    },
    /// `BIND(expr AS ?variable)`
    Extend {
        body: Box<Operator>,
        variable: Variable,
        expr: Expr,
    },
    /// `VALUES`; `None` cells are `UNDEF`.
    Values {
        variables: Vec<Variable>,
        rows: Vec<Vec<Option<Term>>>,
    },
    SubQuery(Arc<CompiledQuery>),
}

impl Operator {
    /// The join identity: a single empty solution.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Bgp(Vec::new())
    }

    #[must_use]
    pub const fn bgp(patterns: Vec<TriplePattern>) -> Self {
        Self::Bgp(patterns)
    }

    #[must_use]
    pub fn join(self, right: Self) -> Self {
        Self::Join(Box::new(self), Box::new(right))
    }

    #[must_use]
    pub fn optional(self, right: Self) -> Self {
        Self::Optional {
            left: Box::new(self),
            right: Box::new(right),
            filter: None,
        }
    }

    #[must_use]
    pub fn optional_filter(self, right: Self, filter: Expr) -> Self {
        Self::Optional {
            left: Box::new(self),
            right: Box::new(right),
            filter: Some(filter),
        }
    }

    #[must_use]
    pub fn minus(self, right: Self) -> Self {
        Self::Minus(Box::new(self), Box::new(right))
    }

    #[must_use]
    pub fn union(self, right: Self) -> Self {
        Self::Union(Box::new(self), Box::new(right))
    }

    #[must_use]
    pub fn filter(self, expr: Expr) -> Self {
        Self::Filter {
            expr,
            body: Box::new(self),
        }
    }

    #[must_use]
    pub fn extend(self, variable: &str, expr: Expr) -> Self {
        Self::Extend {
            body: Box::new(self),
            variable: Variable::new(variable),
            expr,
        }
    }

    #[must_use]
    pub fn graph(name: impl Into<PatternTerm>, body: Self) -> Self {
        Self::Graph {
            name: name.into(),
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn service(endpoint: Term, body: Self, silent: bool) -> Self {
        Self::Service {
            endpoint,
            body: Box::new(body),
            silent,
        }
    }

    #[must_use]
    pub fn path(
        subject: impl Into<PatternTerm>,
        path: PathExpr,
        object: impl Into<PatternTerm>,
    ) -> Self {
        Self::Path {
            subject: subject.into(),
            path,
            object: object.into(),
        }
    }

    #[must_use]
    pub fn values(variables: &[&str], rows: Vec<Vec<Option<Term>>>) -> Self {
        Self::Values {
            variables: variables.iter().map(|v| Variable::new(v)).collect(),
            rows,
        }
    }

    #[must_use]
    pub const fn subquery(query: Arc<CompiledQuery>) -> Self {
        Self::SubQuery(query)
    }

    /// Short operator name, as used for hook dispatch and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bgp(_) => "bgp",
            Self::Join(..) => "join",
            Self::Optional { .. } => "optional",
            Self::Minus(..) => "minus",
            Self::Union(..) => "union",
            Self::Graph { .. } => "graph",
            Self::Service { .. } => "service",
            Self::Path { .. } => "path",
            Self::Filter { .. } => "filter",
            Self::Extend { .. } => "bind",
            Self::Values { .. } => "values",
            Self::SubQuery(_) => "query",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bgp(patterns) => {
                write!(f, "bgp(")?;
                for (i, p) in patterns.iter().enumerate() {
                    if i > 0 {
                        write!(f, " . ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
            Self::Join(a, b) => write!(f, "join({a}, {b})"),
            Self::Optional {
                left,
                right,
                filter,
            } => match filter {
                Some(expr) => write!(f, "optional({left}, {right}, {expr})"),
                None => write!(f, "optional({left}, {right})"),
            },
            Self::Minus(a, b) => write!(f, "minus({a}, {b})"),
            Self::Union(a, b) => write!(f, "union({a}, {b})"),
            Self::Graph { name, body } => write!(f, "graph({name}, {body})"),
            Self::Service {
                endpoint,
                body,
                silent,
            } => {
                let kind = if *silent { "service silent" } else { "service" };
                write!(f, "{kind}({endpoint}, {body})")
            }
            Self::Path {
                subject,
                path,
                object,
            } => write!(f, "path({subject} {path} {object})"),
            Self::Filter { expr, body } => write!(f, "filter({expr}, {body})"),
            Self::Extend {
                body,
                variable,
                expr,
            } => write!(f, "bind({body}, {expr} as {variable})"),
            Self::Values { variables, rows } => {
                write!(f, "values(")?;
                for v in variables {
                    write!(f, "{v} ")?;
                }
                write!(f, "; {} rows)", rows.len())
            }
            Self::SubQuery(q) => write!(f, "query({})", q.root),
        }
    }
}
