//! Terms: the values that appear in edges and bindings.
//!
//! A term is an IRI, a literal, a blank node, or a triple term (a term that
//! denotes an edge, used for nested statements).
//!
//! `PartialEq`/`Hash` on `Term` are *same-term* identity, never value
//! equality. Value-aware equality and ordering live in `types::compare`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use super::edge::Edge;
use super::literal::{Datatype, Literal};

/// An IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(Arc<str>);

impl Iri {
    #[must_use]
    pub fn new(iri: impl Into<Arc<str>>) -> Self {
        Self(iri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// A blank node.
///
/// The `variable` flag marks blank nodes that stand for variables while a
/// query or template is being built; it plays no part in identity.
#[derive(Debug, Clone)]
pub struct BlankNode {
    label: Arc<str>,
    variable: bool,
}

impl BlankNode {
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            variable: false,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn is_variable(&self) -> bool {
        self.variable
    }

    pub const fn set_variable(&mut self, variable: bool) {
        self.variable = variable;
    }
}

impl PartialEq for BlankNode {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for BlankNode {}

impl Hash for BlankNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

/// A term that denotes an edge.
///
/// The wrapped edge is held weakly: the triple term can look it up while the
/// graph keeps it alive but never extends its lifetime. The label is the
/// canonical form of the edge's subject, predicate and object, so two triple
/// terms over edges that differ only by graph get the same label. Identity
/// and hashing use the label alone, live edge or not.
#[derive(Debug, Clone)]
pub struct TripleTerm {
    label: Arc<str>,
    edge: Weak<Edge>,
}

impl TripleTerm {
    /// Build a triple term for an edge.
    #[must_use]
    pub fn of(edge: &Arc<Edge>) -> Self {
        Self {
            label: Arc::from(format!(
                "<< {} {} {} >>",
                canonical(&edge.subject),
                canonical(&edge.predicate),
                canonical(&edge.object)
            )),
            edge: Arc::downgrade(edge),
        }
    }

    /// Build a triple term that only carries a label.
    #[must_use]
    pub fn detached(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            edge: Weak::new(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The wrapped edge, if it is still alive.
    #[must_use]
    pub fn edge(&self) -> Option<Arc<Edge>> {
        self.edge.upgrade()
    }
}

impl PartialEq for TripleTerm {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for TripleTerm {}

impl Hash for TripleTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

fn escape(lexical: &str) -> String {
    lexical.replace('\\', "\\\\").replace('"', "\\\"")
}

/// N-Triples form of a term. Unlike `Display`, literals always carry their
/// datatype, so distinct terms never share a form.
fn canonical(term: &Term) -> String {
    match term {
        Term::Literal(lit) => match (lit.datatype(), lit.lang()) {
            (Datatype::String, _) => format!("\"{}\"", escape(lit.lexical())),
            (Datatype::LangString, Some(lang)) => format!("\"{}\"@{lang}", escape(lit.lexical())),
            (dt, _) => format!("\"{}\"^^<{}>", escape(lit.lexical()), dt.iri()),
        },
        other => other.to_string(),
    }
}

/// A term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
    Blank(BlankNode),
    Triple(TripleTerm),
}

/// Kind of a term, used to reject cross-kind comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Iri,
    Literal,
    Blank,
    Triple,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Iri => "iri",
            Self::Literal => "literal",
            Self::Blank => "blank node",
            Self::Triple => "triple term",
        };
        f.write_str(name)
    }
}

impl Term {
    #[must_use]
    pub fn iri(iri: impl Into<Arc<str>>) -> Self {
        Self::Iri(Iri::new(iri))
    }

    #[must_use]
    pub fn blank(label: impl Into<Arc<str>>) -> Self {
        Self::Blank(BlankNode::new(label))
    }

    #[must_use]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::Literal(Literal::string(s))
    }

    #[must_use]
    pub fn integer(n: i64) -> Self {
        Self::Literal(Literal::integer(n))
    }

    #[must_use]
    pub fn double(n: f64) -> Self {
        Self::Literal(Literal::double(n))
    }

    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::Literal(Literal::boolean(b))
    }

    #[must_use]
    pub fn typed(lexical: impl Into<Arc<str>>, datatype_iri: &str) -> Self {
        Self::Literal(Literal::typed(lexical, Datatype::from_iri(datatype_iri)))
    }

    /// A triple term wrapping `edge`.
    #[must_use]
    pub fn triple(edge: &Arc<Edge>) -> Self {
        Self::Triple(TripleTerm::of(edge))
    }

    #[must_use]
    pub const fn kind(&self) -> TermKind {
        match self {
            Self::Iri(_) => TermKind::Iri,
            Self::Literal(_) => TermKind::Literal,
            Self::Blank(_) => TermKind::Blank,
            Self::Triple(_) => TermKind::Triple,
        }
    }

    /// The label: IRI string, lexical form, or blank/triple label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Iri(iri) => iri.as_str(),
            Self::Literal(lit) => lit.lexical(),
            Self::Blank(b) => b.label(),
            Self::Triple(t) => t.label(),
        }
    }

    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    #[must_use]
    pub const fn is_triple(&self) -> bool {
        matches!(self, Self::Triple(_))
    }

    /// Effective boolean value, or `None` when the term has none.
    #[must_use]
    pub fn effective_boolean(&self) -> Option<bool> {
        let lit = self.as_literal()?;
        if let Some(b) = lit.as_bool() {
            return Some(b);
        }
        if lit.is_numeric() {
            return lit.as_f64().map(|n| n != 0.0 && !n.is_nan());
        }
        match lit.datatype() {
            Datatype::String | Datatype::LangString => Some(!lit.lexical().is_empty()),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "{iri}"),
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Blank(b) => write!(f, "_:{}", b.label()),
            Self::Triple(t) => write!(f, "{}", t.label()),
        }
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}
