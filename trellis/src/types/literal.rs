//! Literal values and their datatypes.
//!
//! A literal is a lexical form plus a datatype (and a language tag for
//! language-tagged strings). Numeric and temporal literals are compared by
//! value; everything else compares by lexical form within one datatype.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::constants::XSD;

/// Datatype of a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// `xsd:string` (and plain literals).
    String,
    /// `rdf:langString`.
    LangString,
    /// `xsd:integer`.
    Integer,
    /// `xsd:decimal`.
    Decimal,
    /// `xsd:double`.
    Double,
    /// `xsd:boolean`.
    Boolean,
    /// `xsd:dateTime`.
    DateTime,
    /// `xsd:date`.
    Date,
    /// Any other datatype IRI.
    Other(Arc<str>),
}

/// Comparison family of a datatype.
///
/// Literals are only ordered against literals of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Numeric,
    Text,
    Boolean,
    Temporal,
    Opaque,
}

impl Datatype {
    /// Resolve a datatype IRI.
    #[must_use]
    pub fn from_iri(iri: &str) -> Self {
        let Some(local) = iri.strip_prefix(XSD) else {
            if iri == "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString" {
                return Self::LangString;
            }
            return Self::Other(Arc::from(iri));
        };
        match local {
            "string" => Self::String,
            "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
            | "positiveInteger" | "negativeInteger" | "nonPositiveInteger" => Self::Integer,
            "decimal" => Self::Decimal,
            "double" | "float" => Self::Double,
            "boolean" => Self::Boolean,
            "dateTime" => Self::DateTime,
            "date" => Self::Date,
            _ => Self::Other(Arc::from(iri)),
        }
    }

    /// The datatype IRI.
    #[must_use]
    pub fn iri(&self) -> String {
        match self {
            Self::String => format!("{XSD}string"),
            Self::LangString => "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString".to_owned(),
            Self::Integer => format!("{XSD}integer"),
            Self::Decimal => format!("{XSD}decimal"),
            Self::Double => format!("{XSD}double"),
            Self::Boolean => format!("{XSD}boolean"),
            Self::DateTime => format!("{XSD}dateTime"),
            Self::Date => format!("{XSD}date"),
            Self::Other(iri) => iri.as_ref().to_owned(),
        }
    }

    #[must_use]
    pub const fn family(&self) -> Family {
        match self {
            Self::Integer | Self::Decimal | Self::Double => Family::Numeric,
            Self::String | Self::LangString => Family::Text,
            Self::Boolean => Family::Boolean,
            Self::DateTime | Self::Date => Family::Temporal,
            Self::Other(_) => Family::Opaque,
        }
    }

    /// Rank used for numeric type promotion (integer < decimal < double).
    const fn numeric_rank(&self) -> u8 {
        match self {
            Self::Integer => 0,
            Self::Decimal => 1,
            _ => 2,
        }
    }
}

/// A literal term.
///
/// # Invariants
///
/// - `lang` is `Some` iff `datatype` is `Datatype::LangString`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Datatype,
    lang: Option<Arc<str>>,
}

impl Literal {
    /// Create a typed literal.
    #[must_use]
    pub fn typed(lexical: impl Into<Arc<str>>, datatype: Datatype) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
            lang: None,
        }
    }

    /// Create an `xsd:string` literal.
    #[must_use]
    pub fn string(lexical: impl Into<Arc<str>>) -> Self {
        Self::typed(lexical, Datatype::String)
    }

    /// Create a language-tagged string. The tag is lower-cased.
    #[must_use]
    pub fn lang_string(lexical: impl Into<Arc<str>>, lang: &str) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Datatype::LangString,
            lang: Some(Arc::from(lang.to_ascii_lowercase())),
        }
    }

    #[must_use]
    pub fn integer(n: i64) -> Self {
        Self::typed(n.to_string(), Datatype::Integer)
    }

    #[must_use]
    pub fn double(n: f64) -> Self {
        Self::typed(format_double(n), Datatype::Double)
    }

    #[must_use]
    pub fn decimal(n: f64) -> Self {
        Self::typed(format_double(n), Datatype::Decimal)
    }

    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::typed(if b { "true" } else { "false" }, Datatype::Boolean)
    }

    #[must_use]
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    #[must_use]
    pub const fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self.datatype.family(), Family::Numeric)
    }

    /// Numeric value, if this is a well-formed numeric literal.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        if !self.is_numeric() {
            return None;
        }
        self.lexical.trim().parse::<f64>().ok()
    }

    /// Integer value, if this is a well-formed `xsd:integer`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self.datatype {
            Datatype::Integer => self.lexical.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Boolean value, if this is a well-formed `xsd:boolean`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match (&self.datatype, self.lexical.as_ref()) {
            (Datatype::Boolean, "true" | "1") => Some(true),
            (Datatype::Boolean, "false" | "0") => Some(false),
            _ => None,
        }
    }

    fn as_instant(&self) -> Option<DateTime<FixedOffset>> {
        match self.datatype {
            Datatype::DateTime => DateTime::parse_from_rfc3339(self.lexical.trim()).ok(),
            Datatype::Date => NaiveDate::parse_from_str(self.lexical.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().fixed_offset()),
            _ => None,
        }
    }

    /// Order two literals by value.
    ///
    /// Returns `None` when the literals belong to different families, when
    /// two language strings carry different tags, when two opaque literals
    /// have different datatypes, or when a lexical form is ill-formed.
    #[must_use]
    pub fn compare_value(&self, other: &Self) -> Option<Ordering> {
        let family = self.datatype.family();
        if family != other.datatype.family() {
            return None;
        }
        match family {
            Family::Numeric => {
                if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
                    return Some(a.cmp(&b));
                }
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            Family::Text => {
                if self.lang != other.lang {
                    return None;
                }
                Some(self.lexical.cmp(&other.lexical))
            }
            Family::Boolean => Some(self.as_bool()?.cmp(&other.as_bool()?)),
            Family::Temporal => Some(self.as_instant()?.cmp(&other.as_instant()?)),
            Family::Opaque => {
                (self.datatype == other.datatype).then(|| self.lexical.cmp(&other.lexical))
            }
        }
    }

    /// Value equality: numerics by value, everything else by datatype,
    /// language tag and lexical form.
    #[must_use]
    pub fn equals_value(&self, other: &Self) -> bool {
        match self.datatype.family() {
            Family::Numeric | Family::Temporal | Family::Boolean => {
                self.compare_value(other) == Some(Ordering::Equal)
            }
            Family::Text | Family::Opaque => self == other,
        }
    }

    /// The datatype a numeric operation on `self` and `other` produces.
    #[must_use]
    pub fn promoted(&self, other: &Self) -> Option<Datatype> {
        if !self.is_numeric() || !other.is_numeric() {
            return None;
        }
        let rank = self.datatype.numeric_rank().max(other.datatype.numeric_rank());
        Some(match rank {
            0 => Datatype::Integer,
            1 => Datatype::Decimal,
            _ => Datatype::Double,
        })
    }
}

/// Render a float the way `xsd:double` lexical forms usually look.
fn format_double(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.datatype, &self.lang) {
            (Datatype::String, _) => write!(f, "\"{}\"", self.lexical),
            (Datatype::LangString, Some(lang)) => write!(f, "\"{}\"@{lang}", self.lexical),
            (Datatype::Integer | Datatype::Decimal | Datatype::Double | Datatype::Boolean, _) => {
                write!(f, "{}", self.lexical)
            }
            (dt, _) => write!(f, "\"{}\"^^<{}>", self.lexical, dt.iri()),
        }
    }
}
