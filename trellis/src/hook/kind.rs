//! Hook kinds and their fixed arities.

use std::fmt;

/// A named extension point.
///
/// Each kind has one arity; a handler registered under any other arity is
/// never called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookKind {
    /// `(query)`: once per top-level query, before evaluation.
    Init,
    /// `(bindings)`: top-level query start; the set is still empty.
    Before,
    /// `(bindings)`: top-level query end.
    After,
    /// `(bindings)`: subquery start.
    Start,
    /// `(bindings)`: subquery end.
    Finish,
    /// `(query)`
    BeforeUpdate,
    /// `(bindings)`
    AfterUpdate,
    /// `(path)`
    BeforeLoad,
    /// `(path)`
    AfterLoad,
    /// `(graph, edge)`: an update inserted an edge.
    Insert,
    /// `(edge)`: an update deleted an edge.
    Delete,
    /// `(query, deleted, inserted)`
    Update,
    /// `(graph, pattern)`: may return replacement candidate edges.
    Produce,
    /// `(graph, pattern, edge)`: may reject the candidate.
    Candidate,
    /// `(graph, operator)`: may skip the operator.
    Statement,
    /// `(graph, operator, solutions)`
    Bgp,
    /// `(graph, operator, left, right)`
    Join,
    /// `(graph, operator, left, right)`
    Optional,
    /// `(graph, operator, left, right)`
    Minus,
    /// `(graph, operator, left, right)`
    Union,
    /// `(graph, operator, solutions)`
    Graph,
    /// `(endpoint, operator, solutions)`
    Service,
    /// `(graph, operator, solutions)`: after a subquery.
    Query,
    /// `(graph, operator, solutions)`
    Values,
    /// `(graph, operator, value)`
    Bind,
    /// `(graph, pattern, path, subject, object)`: one completed match.
    Path,
    /// `(graph, pattern, path, from, to)`: may veto the step.
    Step,
    /// `(graph, expression, default)`
    Filter,
    /// `(expression, default)`
    Having,
    /// `(expression, value)`
    Select,
    /// `(expression, value)`
    Aggregate,
    /// `(bindings)`: may reorder the whole result.
    OrderBy,
    /// `(query, binding)`: may supply a custom dedup key.
    Distinct,
    /// `(bindings, binding)`: may reject a final solution.
    Result,
    /// `(bindings)`: whether to keep accepting rows.
    Limit,
    /// `(endpoint, bindings)`: service page size.
    Slice,
    /// `(endpoint)`: service timeout in milliseconds.
    Timeout,
    /// `(call, arguments)`: may replace a user function's result.
    Function,
    /// `(expression, arguments)`: may supply a recovery value.
    Error,
    /// `(expression, result, left, right)`
    Overload,
    /// `(default, left, right)`: sort-time comparison.
    Compare,
}

impl HookKind {
    pub const ALL: [Self; 41] = [
        Self::Init,
        Self::Before,
        Self::After,
        Self::Start,
        Self::Finish,
        Self::BeforeUpdate,
        Self::AfterUpdate,
        Self::BeforeLoad,
        Self::AfterLoad,
        Self::Insert,
        Self::Delete,
        Self::Update,
        Self::Produce,
        Self::Candidate,
        Self::Statement,
        Self::Bgp,
        Self::Join,
        Self::Optional,
        Self::Minus,
        Self::Union,
        Self::Graph,
        Self::Service,
        Self::Query,
        Self::Values,
        Self::Bind,
        Self::Path,
        Self::Step,
        Self::Filter,
        Self::Having,
        Self::Select,
        Self::Aggregate,
        Self::OrderBy,
        Self::Distinct,
        Self::Result,
        Self::Limit,
        Self::Slice,
        Self::Timeout,
        Self::Function,
        Self::Error,
        Self::Overload,
        Self::Compare,
    ];

    /// Number of arguments the hook is called with.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Init
            | Self::Before
            | Self::After
            | Self::Start
            | Self::Finish
            | Self::BeforeUpdate
            | Self::AfterUpdate
            | Self::BeforeLoad
            | Self::AfterLoad
            | Self::Delete
            | Self::OrderBy
            | Self::Limit
            | Self::Timeout => 1,
            Self::Insert
            | Self::Produce
            | Self::Statement
            | Self::Having
            | Self::Select
            | Self::Aggregate
            | Self::Distinct
            | Self::Result
            | Self::Slice
            | Self::Function
            | Self::Error => 2,
            Self::Update
            | Self::Candidate
            | Self::Bgp
            | Self::Graph
            | Self::Service
            | Self::Query
            | Self::Values
            | Self::Bind
            | Self::Filter
            | Self::Compare => 3,
            Self::Join | Self::Optional | Self::Minus | Self::Union | Self::Overload => 4,
            Self::Path | Self::Step => 5,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Before => "before",
            Self::After => "after",
            Self::Start => "start",
            Self::Finish => "finish",
            Self::BeforeUpdate => "beforeUpdate",
            Self::AfterUpdate => "afterUpdate",
            Self::BeforeLoad => "beforeLoad",
            Self::AfterLoad => "afterLoad",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Produce => "produce",
            Self::Candidate => "candidate",
            Self::Statement => "statement",
            Self::Bgp => "bgp",
            Self::Join => "join",
            Self::Optional => "optional",
            Self::Minus => "minus",
            Self::Union => "union",
            Self::Graph => "graph",
            Self::Service => "service",
            Self::Query => "query",
            Self::Values => "values",
            Self::Bind => "bind",
            Self::Path => "path",
            Self::Step => "step",
            Self::Filter => "filter",
            Self::Having => "having",
            Self::Select => "select",
            Self::Aggregate => "aggregate",
            Self::OrderBy => "orderby",
            Self::Distinct => "distinct",
            Self::Result => "result",
            Self::Limit => "limit",
            Self::Slice => "slice",
            Self::Timeout => "timeout",
            Self::Function => "function",
            Self::Error => "error",
            Self::Overload => "overload",
            Self::Compare => "compare",
        }
    }

    /// Look up a kind by its hook name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
