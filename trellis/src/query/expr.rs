//! Filter, projection and ordering expressions.

use std::fmt;

use super::operator::Operator;
use crate::types::{Term, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bound,
    SameTerm,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    IsTriple,
    Str,
    Lang,
    Datatype,
    Strlen,
    Ucase,
    Lcase,
    Contains,
    StrStarts,
    Concat,
    If,
    Coalesce,
    Abs,
}

impl Builtin {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bound => "bound",
            Self::SameTerm => "sameTerm",
            Self::IsIri => "isIRI",
            Self::IsBlank => "isBlank",
            Self::IsLiteral => "isLiteral",
            Self::IsNumeric => "isNumeric",
            Self::IsTriple => "isTriple",
            Self::Str => "str",
            Self::Lang => "lang",
            Self::Datatype => "datatype",
            Self::Strlen => "strlen",
            Self::Ucase => "ucase",
            Self::Lcase => "lcase",
            Self::Contains => "contains",
            Self::StrStarts => "strstarts",
            Self::Concat => "concat",
            Self::If => "if",
            Self::Coalesce => "coalesce",
            Self::Abs => "abs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
    Sample,
    GroupConcat,
}

/// An aggregate call. `expr == None` is `COUNT(*)`.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub expr: Option<Box<Expr>>,
    pub distinct: bool,
    /// `GROUP_CONCAT` separator; a single space when absent.
    pub separator: Option<String>,
}

/// An expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Var(Variable),
    Const(Term),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Builtin(Builtin, Vec<Expr>),
    /// Call of a user function, by IRI.
    Call(String, Vec<Expr>),
    Exists(Box<Operator>),
    NotExists(Box<Operator>),
    Aggregate(Aggregate),
}

impl Expr {
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Var(Variable::new(name))
    }

    #[must_use]
    pub const fn constant(term: Term) -> Self {
        Self::Const(term)
    }

    #[must_use]
    pub fn compare(op: CompareOp, left: Self, right: Self) -> Self {
        Self::Compare(op, Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn arith(op: ArithOp, left: Self, right: Self) -> Self {
        Self::Arith(op, Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[must_use]
    pub fn call(name: &str, args: Vec<Self>) -> Self {
        Self::Call(name.to_owned(), args)
    }

    #[must_use]
    pub fn aggregate(function: AggregateFunction, expr: Option<Self>) -> Self {
        Self::Aggregate(Aggregate {
            function,
            expr: expr.map(Box::new),
            distinct: false,
            separator: None,
        })
    }

    /// Whether an aggregate occurs anywhere in this expression.
    #[must_use]
    pub fn has_aggregate(&self) -> bool {
        match self {
            Self::Aggregate(_) => true,
            Self::Var(_) | Self::Const(_) | Self::Exists(_) | Self::NotExists(_) => false,
            Self::Not(e) | Self::Neg(e) => e.has_aggregate(),
            Self::And(a, b) | Self::Or(a, b) | Self::Compare(_, a, b) | Self::Arith(_, a, b) => {
                a.has_aggregate() || b.has_aggregate()
            }
            Self::Builtin(_, args) | Self::Call(_, args) => args.iter().any(Self::has_aggregate),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(v) => write!(f, "{v}"),
            Self::Const(t) => write!(f, "{t}"),
            Self::Not(e) => write!(f, "!({e})"),
            Self::And(a, b) => write!(f, "({a} && {b})"),
            Self::Or(a, b) => write!(f, "({a} || {b})"),
            Self::Compare(op, a, b) => write!(f, "({a} {} {b})", op.symbol()),
            Self::Arith(op, a, b) => write!(f, "({a} {} {b})", op.symbol()),
            Self::Neg(e) => write!(f, "-({e})"),
            Self::Builtin(b, args) => {
                write!(f, "{}(", b.name())?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Self::Call(name, args) => {
                write!(f, "<{name}>(")?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Self::Exists(op) => write!(f, "exists {{ {op} }}"),
            Self::NotExists(op) => write!(f, "not exists {{ {op} }}"),
            Self::Aggregate(agg) => {
                write!(f, "{:?}(", agg.function)?;
                if agg.distinct {
                    write!(f, "distinct ")?;
                }
                match &agg.expr {
                    Some(e) => write!(f, "{e})"),
                    None => write!(f, "*)"),
                }
            }
        }
    }
}
