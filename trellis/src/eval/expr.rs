//! Expression evaluation.
//!
//! Errors come in two strengths. Soft errors (unbound variable, type error,
//! incomparable operands, division by zero) make a FILTER false and leave a
//! BIND or projected variable unbound. [`ExprError::Fatal`] aborts the
//! query.

use std::cmp::Ordering;
use std::fmt;

use super::{EvaluationError, Evaluator};
use crate::binding::Binding;
use crate::error::QueryError;
use crate::graph::GraphScope;
use crate::hook::{HookArg, HookKind};
use crate::overload;
use crate::query::{Aggregate, AggregateFunction, ArithOp, Builtin, CompareOp, Expr};
use crate::types::{self, ComparisonError, Datatype, Literal, Term, Variable};

#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    Unbound(Variable),
    TypeError(String),
    Incomparable(ComparisonError),
    DivisionByZero,
    /// Not recoverable inside the expression.
    Fatal(Box<QueryError>),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound(v) => write!(f, "{v} is unbound"),
            Self::TypeError(message) => write!(f, "type error: {message}"),
            Self::Incomparable(e) => write!(f, "{e}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Fatal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ExprError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Incomparable(e) => Some(e),
            Self::Fatal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<QueryError> for ExprError {
    fn from(e: QueryError) -> Self {
        Self::Fatal(Box::new(e))
    }
}

impl From<EvaluationError> for ExprError {
    fn from(e: EvaluationError) -> Self {
        Self::Fatal(Box::new(e.into()))
    }
}

fn type_error(message: impl Into<String>) -> ExprError {
    ExprError::TypeError(message.into())
}

fn count(n: usize) -> Term {
    Term::integer(i64::try_from(n).unwrap_or(i64::MAX))
}

const fn holds(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
    }
}

/// Numeric arithmetic with type promotion.
///
/// Integer division yields a decimal. Only double division by zero is
/// defined (infinity or NaN).
fn arithmetic(op: ArithOp, left: &Literal, right: &Literal) -> Result<Term, ExprError> {
    let datatype = left
        .promoted(right)
        .ok_or_else(|| type_error(format!("{left} {} {right} is not numeric", op.symbol())))?;
    let ill_formed = || type_error(format!("ill-formed numeric operand in {left} {} {right}", op.symbol()));
    if datatype == Datatype::Integer && op != ArithOp::Div {
        let (x, y) = (left.as_i64().ok_or_else(ill_formed)?, right.as_i64().ok_or_else(ill_formed)?);
        let value = match op {
            ArithOp::Add => x.checked_add(y),
            ArithOp::Sub => x.checked_sub(y),
            _ => x.checked_mul(y),
        };
        return value
            .map(Term::integer)
            .ok_or_else(|| type_error("integer overflow"));
    }
    let (x, y) = (left.as_f64().ok_or_else(ill_formed)?, right.as_f64().ok_or_else(ill_formed)?);
    let value = match op {
        ArithOp::Add => x + y,
        ArithOp::Sub => x - y,
        ArithOp::Mul => x * y,
        ArithOp::Div => {
            if y == 0.0 && datatype != Datatype::Double {
                return Err(ExprError::DivisionByZero);
            }
            x / y
        }
    };
    Ok(Term::from(if datatype == Datatype::Double {
        Literal::double(value)
    } else {
        Literal::decimal(value)
    }))
}

fn string_literal(term: &Term) -> Result<&Literal, ExprError> {
    match term.as_literal() {
        Some(lit) if matches!(lit.datatype(), Datatype::String | Datatype::LangString) => Ok(lit),
        _ => Err(type_error(format!("{term} is not a string"))),
    }
}

/// A string with the language tag of `like`, if any.
fn string_like(like: &Literal, lexical: String) -> Term {
    Term::from(match like.lang() {
        Some(lang) => Literal::lang_string(lexical, lang),
        None => Literal::string(lexical),
    })
}

impl Evaluator<'_> {
    /// Evaluate `expr` against `row`.
    ///
    /// `group` holds the solutions of the current group when the
    /// expression is evaluated for an aggregate query.
    pub(super) fn eval_expr(
        &mut self,
        expr: &Expr,
        row: &Binding,
        scope: &GraphScope,
        group: Option<&[Binding]>,
    ) -> Result<Term, ExprError> {
        match expr {
            Expr::Var(v) => row.get(v).cloned().ok_or_else(|| ExprError::Unbound(v.clone())),
            Expr::Const(term) => Ok(term.clone()),
            Expr::Not(e) => Ok(Term::boolean(!self.eval_ebv(e, row, scope, group)?)),
            Expr::And(a, b) => self.logical(false, a, b, row, scope, group),
            Expr::Or(a, b) => self.logical(true, a, b, row, scope, group),
            Expr::Compare(op, a, b) => {
                let x = self.eval_expr(a, row, scope, group)?;
                let y = self.eval_expr(b, row, scope, group)?;
                self.comparison(expr, *op, &x, &y)
            }
            Expr::Arith(op, a, b) => {
                let x = self.eval_expr(a, row, scope, group)?;
                let y = self.eval_expr(b, row, scope, group)?;
                let numeric = match (x.as_literal(), y.as_literal()) {
                    (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => Some((l, r)),
                    _ => None,
                };
                if let Some((l, r)) = numeric {
                    return arithmetic(*op, l, r);
                }
                overload::overload(self.session, self.state, expr, None, &x, &y)?.ok_or_else(|| {
                    type_error(format!("cannot apply {} to {x} and {y}", op.symbol()))
                })
            }
            Expr::Neg(e) => {
                let x = self.eval_expr(e, row, scope, group)?;
                match x.as_literal() {
                    Some(lit) if lit.is_numeric() => {
                        arithmetic(ArithOp::Sub, &Literal::integer(0), lit)
                    }
                    _ => Err(type_error(format!("cannot negate {x}"))),
                }
            }
            Expr::Builtin(builtin, args) => self.builtin(expr, *builtin, args, row, scope, group),
            Expr::Call(name, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, row, scope, group)?);
                }
                self.call(expr, name, &values)
            }
            Expr::Exists(op) => Ok(Term::boolean(!self.eval(op, scope, row)?.is_empty())),
            Expr::NotExists(op) => Ok(Term::boolean(self.eval(op, scope, row)?.is_empty())),
            Expr::Aggregate(aggregate) => {
                let group = group.ok_or_else(|| type_error(format!("{expr} outside of a group")))?;
                self.aggregate(expr, aggregate, scope, group)
            }
        }
    }

    fn eval_ebv(
        &mut self,
        expr: &Expr,
        row: &Binding,
        scope: &GraphScope,
        group: Option<&[Binding]>,
    ) -> Result<bool, ExprError> {
        let term = self.eval_expr(expr, row, scope, group)?;
        term.effective_boolean()
            .ok_or_else(|| type_error(format!("{term} has no effective boolean value")))
    }

    /// Three-valued `&&` (`decisive == false`) and `||` (`decisive == true`).
    fn logical(
        &mut self,
        decisive: bool,
        a: &Expr,
        b: &Expr,
        row: &Binding,
        scope: &GraphScope,
        group: Option<&[Binding]>,
    ) -> Result<Term, ExprError> {
        let left = self.eval_ebv(a, row, scope, group);
        match left {
            Ok(v) if v == decisive => return Ok(Term::boolean(decisive)),
            Err(ExprError::Fatal(e)) => return Err(ExprError::Fatal(e)),
            _ => {}
        }
        let right = self.eval_ebv(b, row, scope, group);
        match (left, right) {
            (_, Err(ExprError::Fatal(e))) => Err(ExprError::Fatal(e)),
            (_, Ok(v)) if v == decisive => Ok(Term::boolean(decisive)),
            (Err(e), _) | (_, Err(e)) => Err(e),
            (Ok(_), Ok(_)) => Ok(Term::boolean(!decisive)),
        }
    }

    fn comparison(&self, expr: &Expr, op: CompareOp, x: &Term, y: &Term) -> Result<Term, ExprError> {
        if matches!(op, CompareOp::Eq | CompareOp::Ne) {
            let equal = types::equals_value(x, y);
            return Ok(Term::boolean(equal == (op == CompareOp::Eq)));
        }
        match types::compare(x, y) {
            Ok(ordering) => Ok(Term::boolean(holds(op, ordering))),
            Err(e) => overload::overload(self.session, self.state, expr, None, x, y)?
                .ok_or(ExprError::Incomparable(e)),
        }
    }

    /// Resolve a function call: the `function` hook, then the registry,
    /// then the `error` hook.
    fn call(&self, expr: &Expr, name: &str, values: &[Term]) -> Result<Term, ExprError> {
        let visitor = self.visitor();
        if let Some(term) =
            visitor.value(HookKind::Function, &[HookArg::Expr(expr), HookArg::Terms(values)])?
        {
            return Ok(term);
        }
        let failure = match self.session.functions.get(name) {
            Some(function) => match function(values) {
                Ok(term) => return Ok(term),
                Err(message) => type_error(format!("<{name}> failed: {message}")),
            },
            None => ExprError::from(EvaluationError::UnknownFunction {
                name: name.to_owned(),
            }),
        };
        tracing::debug!("{expr}: {failure}");
        match overload::error(self.session, self.state, expr, values)? {
            Some(term) => Ok(term),
            None => Err(failure),
        }
    }

    fn builtin(
        &mut self,
        expr: &Expr,
        builtin: Builtin,
        args: &[Expr],
        row: &Binding,
        scope: &GraphScope,
        group: Option<&[Binding]>,
    ) -> Result<Term, ExprError> {
        let arity = match builtin {
            Builtin::Concat | Builtin::Coalesce => None,
            Builtin::SameTerm | Builtin::Contains | Builtin::StrStarts => Some(2),
            Builtin::If => Some(3),
            _ => Some(1),
        };
        if arity.is_some_and(|n| n != args.len()) {
            return Err(EvaluationError::Malformed {
                operator: expr.to_string(),
                message: format!("{} takes {} arguments", builtin.name(), arity.unwrap_or_default()),
            }
            .into());
        }
        match builtin {
            Builtin::Bound => match &args[0] {
                Expr::Var(v) => Ok(Term::boolean(row.contains(v))),
                other => Err(type_error(format!("bound({other}) needs a variable"))),
            },
            Builtin::If => {
                if self.eval_ebv(&args[0], row, scope, group)? {
                    self.eval_expr(&args[1], row, scope, group)
                } else {
                    self.eval_expr(&args[2], row, scope, group)
                }
            }
            Builtin::Coalesce => {
                for arg in args {
                    match self.eval_expr(arg, row, scope, group) {
                        Ok(term) => return Ok(term),
                        Err(ExprError::Fatal(e)) => return Err(ExprError::Fatal(e)),
                        Err(_) => {}
                    }
                }
                Err(type_error("coalesce: no argument has a value"))
            }
            _ => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, row, scope, group)?);
                }
                apply_builtin(builtin, &values)
            }
        }
    }

    fn aggregate(
        &mut self,
        expr: &Expr,
        aggregate: &Aggregate,
        scope: &GraphScope,
        group: &[Binding],
    ) -> Result<Term, ExprError> {
        let mut values = Vec::new();
        if let Some(inner) = &aggregate.expr {
            for row in group {
                match self.eval_expr(inner, row, scope, None) {
                    Ok(term) => values.push(term),
                    Err(ExprError::Fatal(e)) => return Err(ExprError::Fatal(e)),
                    Err(_) => {}
                }
            }
        }
        if aggregate.distinct {
            let mut unique: Vec<Term> = Vec::with_capacity(values.len());
            for term in values {
                if !unique.iter().any(|t| types::same_term(t, &term)) {
                    unique.push(term);
                }
            }
            values = unique;
        }
        let result = match aggregate.function {
            AggregateFunction::Count if aggregate.expr.is_none() => Ok(count(if aggregate.distinct {
                let mut unique: Vec<&Binding> = Vec::with_capacity(group.len());
                for row in group {
                    if !unique.contains(&row) {
                        unique.push(row);
                    }
                }
                unique.len()
            } else {
                group.len()
            })),
            AggregateFunction::Count => Ok(count(values.len())),
            AggregateFunction::Sum => sum(&values),
            AggregateFunction::Avg => {
                if values.is_empty() {
                    Ok(Term::integer(0))
                } else {
                    let total = sum(&values)?;
                    match (total.as_literal(), count(values.len()).as_literal()) {
                        (Some(t), Some(n)) => arithmetic(ArithOp::Div, t, n),
                        _ => Err(type_error("avg of non-numeric values")),
                    }
                }
            }
            AggregateFunction::Min => extreme(&values, Ordering::Less),
            AggregateFunction::Max => extreme(&values, Ordering::Greater),
            AggregateFunction::Sample => values
                .first()
                .cloned()
                .ok_or_else(|| type_error("sample of an empty group")),
            AggregateFunction::GroupConcat => {
                let separator = aggregate.separator.as_deref().unwrap_or(" ");
                let parts: Vec<&str> = values.iter().map(Term::label).collect();
                Ok(Term::string(parts.join(separator)))
            }
        };
        let args = [HookArg::Expr(expr), HookArg::Term(result.as_ref().ok())];
        match self.visitor().value(HookKind::Aggregate, &args)? {
            Some(term) => Ok(term),
            None => result,
        }
    }
}

fn sum(values: &[Term]) -> Result<Term, ExprError> {
    let mut total = Term::integer(0);
    for value in values {
        total = match (total.as_literal(), value.as_literal()) {
            (Some(t), Some(v)) if v.is_numeric() => arithmetic(ArithOp::Add, t, v)?,
            _ => return Err(type_error(format!("cannot sum {value}"))),
        };
    }
    Ok(total)
}

/// The least (`Less`) or greatest (`Greater`) value.
fn extreme(values: &[Term], wanted: Ordering) -> Result<Term, ExprError> {
    let mut best: Option<&Term> = None;
    for value in values {
        best = Some(match best {
            None => value,
            Some(current) => {
                if types::compare(value, current).map_err(ExprError::Incomparable)? == wanted {
                    value
                } else {
                    current
                }
            }
        });
    }
    best.cloned().ok_or_else(|| type_error("extreme of an empty group"))
}

fn apply_builtin(builtin: Builtin, values: &[Term]) -> Result<Term, ExprError> {
    let Some(first) = values.first() else {
        return Ok(Term::string(""));
    };
    match builtin {
        Builtin::SameTerm => Ok(Term::boolean(types::same_term(first, &values[1]))),
        Builtin::IsIri => Ok(Term::boolean(first.is_iri())),
        Builtin::IsBlank => Ok(Term::boolean(first.is_blank())),
        Builtin::IsLiteral => Ok(Term::boolean(first.is_literal())),
        Builtin::IsNumeric => Ok(Term::boolean(
            first.as_literal().is_some_and(|lit| lit.as_f64().is_some()),
        )),
        Builtin::IsTriple => Ok(Term::boolean(first.is_triple())),
        Builtin::Str => match first {
            Term::Iri(_) | Term::Literal(_) => Ok(Term::string(first.label())),
            _ => Err(type_error(format!("str({first}) is undefined"))),
        },
        Builtin::Lang => first
            .as_literal()
            .map(|lit| Term::string(lit.lang().unwrap_or_default()))
            .ok_or_else(|| type_error(format!("lang({first}) is undefined"))),
        Builtin::Datatype => first
            .as_literal()
            .map(|lit| Term::iri(lit.datatype().iri()))
            .ok_or_else(|| type_error(format!("datatype({first}) is undefined"))),
        Builtin::Strlen => Ok(count(string_literal(first)?.lexical().chars().count())),
        Builtin::Ucase => {
            let lit = string_literal(first)?;
            Ok(string_like(lit, lit.lexical().to_uppercase()))
        }
        Builtin::Lcase => {
            let lit = string_literal(first)?;
            Ok(string_like(lit, lit.lexical().to_lowercase()))
        }
        Builtin::Contains => {
            let (haystack, needle) = (string_literal(first)?, string_literal(&values[1])?);
            Ok(Term::boolean(haystack.lexical().contains(needle.lexical())))
        }
        Builtin::StrStarts => {
            let (haystack, prefix) = (string_literal(first)?, string_literal(&values[1])?);
            Ok(Term::boolean(haystack.lexical().starts_with(prefix.lexical())))
        }
        Builtin::Concat => {
            let mut out = String::new();
            for value in values {
                out.push_str(string_literal(value)?.lexical());
            }
            Ok(Term::string(out))
        }
        Builtin::Abs => match first.as_literal() {
            Some(lit) if lit.datatype() == &Datatype::Integer => lit
                .as_i64()
                .and_then(i64::checked_abs)
                .map(Term::integer)
                .ok_or_else(|| type_error(format!("abs({first}) overflows"))),
            Some(lit) if lit.is_numeric() => {
                let n = lit.as_f64().ok_or_else(|| type_error(format!("ill-formed {first}")))?;
                Ok(Term::from(if lit.datatype() == &Datatype::Double {
                    Literal::double(n.abs())
                } else {
                    Literal::decimal(n.abs())
                }))
            }
            _ => Err(type_error(format!("abs({first}) is not numeric"))),
        },
        Builtin::Bound | Builtin::If | Builtin::Coalesce => {
            Err(type_error(format!("{} is evaluated lazily", builtin.name())))
        }
    }
}
