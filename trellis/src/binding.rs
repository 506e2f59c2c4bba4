//! Solutions and solution sequences.
//!
//! A `Binding` is one solution: an immutable map from variables to terms.
//! A `Bindings` is an ordered sequence of solutions that also records the
//! query it was produced for and how many edges an update touched.
//!
//! The owning query is compared by identity (`Arc::ptr_eq`): that is how
//! the hook protocol tells the top-level query's results from a subquery's.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::query::CompiledQuery;
use crate::types::{Term, Variable, same_term};

/// One solution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    values: BTreeMap<Variable, Term>,
}

impl Binding {
    /// The empty solution (the identity of join).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a solution from pairs. Later pairs win on duplicate variables.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Variable, Term)>) -> Self {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    /// A copy of this solution with one more assignment.
    #[must_use]
    pub fn with(&self, variable: Variable, term: Term) -> Self {
        let mut values = self.values.clone();
        values.insert(variable, term);
        Self { values }
    }

    #[must_use]
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.values.get(variable)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Term> {
        self.values.get(&Variable::new(name))
    }

    #[must_use]
    pub fn contains(&self, variable: &Variable) -> bool {
        self.values.contains_key(variable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.values.iter()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.values.keys()
    }

    /// Two solutions are compatible if they agree on every shared variable.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.values.iter().all(|(var, term)| {
            large
                .values
                .get(var)
                .is_none_or(|other_term| same_term(term, other_term))
        })
    }

    /// Whether the two solutions bind at least one common variable.
    #[must_use]
    pub fn shares_variable(&self, other: &Self) -> bool {
        self.values.keys().any(|var| other.values.contains_key(var))
    }

    /// The union of two compatible solutions, or `None` if they conflict.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Option<Self> {
        if !self.is_compatible(other) {
            return None;
        }
        let mut values = self.values.clone();
        for (var, term) in &other.values {
            values.entry(var.clone()).or_insert_with(|| term.clone());
        }
        Some(Self { values })
    }

    /// Keep only the given variables.
    #[must_use]
    pub fn project(&self, variables: &[Variable]) -> Self {
        Self {
            values: variables
                .iter()
                .filter_map(|var| self.values.get(var).map(|t| (var.clone(), t.clone())))
                .collect(),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, term)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var} = {term}")?;
        }
        write!(f, "}}")
    }
}

/// An ordered sequence of solutions produced for one (sub)query.
#[derive(Debug, Clone)]
pub struct Bindings {
    rows: Vec<Binding>,
    query: Arc<CompiledQuery>,
    select: Vec<Variable>,
    nb_insert: usize,
    nb_delete: usize,
}

impl Bindings {
    /// An empty sequence owned by `query`.
    #[must_use]
    pub fn new(query: &Arc<CompiledQuery>) -> Self {
        Self::with_rows(query, Vec::new())
    }

    #[must_use]
    pub fn with_rows(query: &Arc<CompiledQuery>, rows: Vec<Binding>) -> Self {
        Self {
            rows,
            query: Arc::clone(query),
            select: Vec::new(),
            nb_insert: 0,
            nb_delete: 0,
        }
    }

    /// The query these solutions were produced for.
    #[must_use]
    pub const fn query(&self) -> &Arc<CompiledQuery> {
        &self.query
    }

    /// Whether these solutions belong to exactly this query instance.
    #[must_use]
    pub fn is_for(&self, query: &Arc<CompiledQuery>) -> bool {
        Arc::ptr_eq(&self.query, query)
    }

    #[must_use]
    pub fn rows(&self) -> &[Binding] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Binding> {
        self.rows
    }

    pub fn push(&mut self, row: Binding) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.rows.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Binding> {
        self.rows.get(index)
    }

    /// Projected variables, in order.
    ///
    /// Falls back to every variable bound in any row (sorted) when no
    /// projection was recorded.
    #[must_use]
    pub fn variables(&self) -> Vec<Variable> {
        if !self.select.is_empty() {
            return self.select.clone();
        }
        let all: BTreeSet<&Variable> = self.rows.iter().flat_map(Binding::variables).collect();
        all.into_iter().cloned().collect()
    }

    pub(crate) fn set_select(&mut self, select: Vec<Variable>) {
        self.select = select;
    }

    #[must_use]
    pub const fn nb_insert(&self) -> usize {
        self.nb_insert
    }

    #[must_use]
    pub const fn nb_delete(&self) -> usize {
        self.nb_delete
    }

    /// Total number of edges an update inserted or deleted.
    #[must_use]
    pub const fn nb_update(&self) -> usize {
        self.nb_insert + self.nb_delete
    }

    pub(crate) const fn record_insert(&mut self, n: usize) {
        self.nb_insert += n;
    }

    pub(crate) const fn record_delete(&mut self, n: usize) {
        self.nb_delete += n;
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Iri(iri) => {
                map.serialize_entry("type", "uri")?;
                map.serialize_entry("value", iri.as_str())?;
            }
            Self::Blank(b) => {
                map.serialize_entry("type", "bnode")?;
                map.serialize_entry("value", b.label())?;
            }
            Self::Triple(t) => {
                map.serialize_entry("type", "triple")?;
                map.serialize_entry("value", t.label())?;
            }
            Self::Literal(lit) => {
                map.serialize_entry("type", "literal")?;
                map.serialize_entry("value", lit.lexical())?;
                if let Some(lang) = lit.lang() {
                    map.serialize_entry("xml:lang", lang)?;
                } else if *lit.datatype() != crate::types::Datatype::String {
                    map.serialize_entry("datatype", &lit.datatype().iri())?;
                }
            }
        }
        map.end()
    }
}

impl Serialize for Binding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (var, term) in &self.values {
            map.serialize_entry(var.name(), term)?;
        }
        map.end()
    }
}

struct Head<'a>(&'a [Variable]);

impl Serialize for Head<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("vars", &VarNames(self.0))?;
        map.end()
    }
}

struct VarNames<'a>(&'a [Variable]);

impl Serialize for VarNames<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for var in self.0 {
            seq.serialize_element(var.name())?;
        }
        seq.end()
    }
}

struct Results<'a>(&'a [Binding]);

impl Serialize for Results<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("bindings", self.0)?;
        map.end()
    }
}

impl Serialize for Bindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let vars = self.variables();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("head", &Head(&vars))?;
        map.serialize_entry("results", &Results(&self.rows))?;
        map.end()
    }
}
