//! Compiled queries.
//!
//! A `CompiledQuery` pairs static surface properties (`Ast`: scheduling
//! priority, source text, form) with the operator tree and the solution
//! modifiers. It is immutable once compiled and shared behind an `Arc`, so
//! the same compiled query can run concurrently and identity comparison
//! (`Arc::ptr_eq`) tells a query's own events from its subqueries'.
//!
//! # Example
//!
//! ```ignore
//! use trellis::query::{CompiledQuery, Operator, PatternTerm, TriplePattern};
//! use trellis::types::Term;
//!
//! let query = CompiledQuery::select(Operator::bgp(vec![TriplePattern::new(
//!     PatternTerm::var("x"),
//!     Term::iri("http://ex/knows"),
//!     PatternTerm::var("y"),
//! )]))
//! .project(&["x", "y"])
//! .compile();
//! ```

pub mod expr;
pub mod operator;
pub mod path;
pub mod pattern;

use std::sync::Arc;

pub use expr::{Aggregate, AggregateFunction, ArithOp, Builtin, CompareOp, Expr};
pub use operator::Operator;
pub use path::PathExpr;
pub use pattern::{PatternTerm, TriplePattern};

use crate::types::Variable;

/// Static properties of the query's surface syntax.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    /// Scheduling priority; lower runs first in a workflow.
    pub priority: i32,
    /// Source text, kept for diagnostics.
    pub text: Option<String>,
}

/// What the query returns.
#[derive(Debug, Clone)]
pub enum QueryForm {
    Select,
    Ask,
    /// Instantiate the template once per solution.
    Construct(Vec<TriplePattern>),
    /// `DELETE {..} INSERT {..} WHERE {..}`.
    Update {
        delete: Vec<TriplePattern>,
        insert: Vec<TriplePattern>,
    },
}

/// A projected column: a variable, optionally computed by an expression.
#[derive(Debug, Clone)]
pub struct Projection {
    pub variable: Variable,
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct OrderKey {
    pub expr: Expr,
    pub descending: bool,
}

/// Solution modifiers, applied in the order the fields are declared.
#[derive(Debug, Clone, Default)]
pub struct Modifiers {
    /// Empty means `SELECT *`.
    pub projection: Vec<Projection>,
    pub group_by: Vec<Variable>,
    pub having: Vec<Expr>,
    pub order_by: Vec<OrderKey>,
    pub distinct: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Modifiers {
    /// Whether the query aggregates, explicitly or through an aggregate in
    /// the projection.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        !self.group_by.is_empty()
            || self
                .projection
                .iter()
                .any(|p| p.expr.as_ref().is_some_and(Expr::has_aggregate))
    }

    /// The projected variables, in order.
    #[must_use]
    pub fn selected(&self) -> Vec<Variable> {
        self.projection.iter().map(|p| p.variable.clone()).collect()
    }
}

/// A compiled query: surface properties, form, operator tree and modifiers.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub ast: Ast,
    pub form: QueryForm,
    pub root: Operator,
    pub modifiers: Modifiers,
}

impl CompiledQuery {
    fn with_form(form: QueryForm, root: Operator) -> Self {
        Self {
            ast: Ast::default(),
            form,
            root,
            modifiers: Modifiers::default(),
        }
    }

    #[must_use]
    pub fn select(root: Operator) -> Self {
        Self::with_form(QueryForm::Select, root)
    }

    #[must_use]
    pub fn ask(root: Operator) -> Self {
        Self::with_form(QueryForm::Ask, root)
    }

    #[must_use]
    pub fn construct(template: Vec<TriplePattern>, root: Operator) -> Self {
        Self::with_form(QueryForm::Construct(template), root)
    }

    /// `DELETE {delete} INSERT {insert} WHERE {root}`.
    #[must_use]
    pub fn update(delete: Vec<TriplePattern>, insert: Vec<TriplePattern>, root: Operator) -> Self {
        Self::with_form(QueryForm::Update { delete, insert }, root)
    }

    /// `INSERT DATA {..}`: an update over the empty WHERE clause.
    #[must_use]
    pub fn insert_data(insert: Vec<TriplePattern>) -> Self {
        Self::update(Vec::new(), insert, Operator::empty())
    }

    /// `DELETE DATA {..}`
    #[must_use]
    pub fn delete_data(delete: Vec<TriplePattern>) -> Self {
        Self::update(delete, Vec::new(), Operator::empty())
    }

    #[must_use]
    pub fn project(mut self, variables: &[&str]) -> Self {
        self.modifiers
            .projection
            .extend(variables.iter().map(|v| Projection {
                variable: Variable::new(v),
                expr: None,
            }));
        self
    }

    /// Project `expr AS ?variable`.
    #[must_use]
    pub fn project_expr(mut self, variable: &str, expr: Expr) -> Self {
        self.modifiers.projection.push(Projection {
            variable: Variable::new(variable),
            expr: Some(expr),
        });
        self
    }

    #[must_use]
    pub fn group_by(mut self, variables: &[&str]) -> Self {
        self.modifiers
            .group_by
            .extend(variables.iter().map(|v| Variable::new(v)));
        self
    }

    #[must_use]
    pub fn having(mut self, expr: Expr) -> Self {
        self.modifiers.having.push(expr);
        self
    }

    #[must_use]
    pub fn order_by(mut self, expr: Expr, descending: bool) -> Self {
        self.modifiers.order_by.push(OrderKey { expr, descending });
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.modifiers.distinct = true;
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.modifiers.offset = offset;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.modifiers.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.ast.priority = priority;
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.ast.text = Some(text.into());
        self
    }

    /// Freeze the query for sharing.
    #[must_use]
    pub fn compile(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub const fn is_construct(&self) -> bool {
        matches!(self.form, QueryForm::Construct(_))
    }

    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self.form, QueryForm::Update { .. })
    }

    /// The template of a CONSTRUCT query, or the insert template of an
    /// update.
    #[must_use]
    pub fn template(&self) -> &[TriplePattern] {
        match &self.form {
            QueryForm::Construct(template) => template,
            QueryForm::Update { insert, .. } => insert,
            QueryForm::Select | QueryForm::Ask => &[],
        }
    }
}
