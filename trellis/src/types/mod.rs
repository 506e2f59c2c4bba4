//! The term model: terms, literals, edges, variables and their
//! equality/ordering contracts.

pub mod compare;
pub mod edge;
pub mod literal;
pub mod term;
pub mod variable;

pub use compare::{ComparisonError, TermOrdering, compare, compare_terms, equals_value, same_term};
pub use edge::Edge;
pub use literal::{Datatype, Family, Literal};
pub use term::{BlankNode, Iri, Term, TermKind, TripleTerm};
pub use variable::Variable;
