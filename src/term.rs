//! RDF term model and XSD datatype families.
//!
//! Every IRI, blank node, and literal in the input graph is interned once and
//! identified by a [`NodeId`] everywhere else in the engine. The XSD constant
//! sets below decide which literal populations are eligible for multimodal
//! clustering.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Well-known RDF namespace.
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// Well-known RDFS namespace.
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
/// Well-known XSD namespace.
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// The `rdf:type` predicate, which anchors class membership.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
/// The `rdfs:label` predicate. Labels describe entities rather than relate
/// them, so they are never mined as pattern predicates.
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// Numeric XSD datatypes.
pub const XSD_NUMERIC: &[&str] = &[
    "http://www.w3.org/2001/XMLSchema#decimal",
    "http://www.w3.org/2001/XMLSchema#double",
    "http://www.w3.org/2001/XMLSchema#float",
    "http://www.w3.org/2001/XMLSchema#integer",
    "http://www.w3.org/2001/XMLSchema#int",
    "http://www.w3.org/2001/XMLSchema#long",
    "http://www.w3.org/2001/XMLSchema#short",
    "http://www.w3.org/2001/XMLSchema#byte",
    "http://www.w3.org/2001/XMLSchema#nonNegativeInteger",
    "http://www.w3.org/2001/XMLSchema#nonPositiveInteger",
    "http://www.w3.org/2001/XMLSchema#negativeInteger",
    "http://www.w3.org/2001/XMLSchema#positiveInteger",
    "http://www.w3.org/2001/XMLSchema#unsignedInt",
    "http://www.w3.org/2001/XMLSchema#unsignedLong",
    "http://www.w3.org/2001/XMLSchema#unsignedShort",
    "http://www.w3.org/2001/XMLSchema#unsignedByte",
];

/// Textual XSD datatypes. A literal with no explicit datatype is treated as
/// `xsd:string` per RDF 1.1.
pub const XSD_STRING: &[&str] = &[
    "http://www.w3.org/2001/XMLSchema#string",
    "http://www.w3.org/2001/XMLSchema#normalizedString",
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString",
];

/// Point-in-time XSD datatypes.
pub const XSD_DATETIME: &[&str] = &[
    "http://www.w3.org/2001/XMLSchema#date",
    "http://www.w3.org/2001/XMLSchema#dateTime",
    "http://www.w3.org/2001/XMLSchema#dateTimeStamp",
];

/// Recurring date-fragment XSD datatypes (gYear, gMonth, ...).
pub const XSD_DATEFRAG: &[&str] = &[
    "http://www.w3.org/2001/XMLSchema#gYear",
    "http://www.w3.org/2001/XMLSchema#gYearMonth",
    "http://www.w3.org/2001/XMLSchema#gMonth",
    "http://www.w3.org/2001/XMLSchema#gMonthDay",
    "http://www.w3.org/2001/XMLSchema#gDay",
];

/// True if `datatype` belongs to a family that supports multimodal clustering.
pub fn is_clusterable(datatype: &str) -> bool {
    XSD_NUMERIC.contains(&datatype)
        || XSD_STRING.contains(&datatype)
        || is_temporal(datatype)
}

/// True if `datatype` is a point-in-time or date-fragment type.
pub fn is_temporal(datatype: &str) -> bool {
    XSD_DATETIME.contains(&datatype) || XSD_DATEFRAG.contains(&datatype)
}

/// Unique, niche-optimized identifier for an interned term.
///
/// Uses `NonZeroU64` so that `Option<NodeId>` is the same size as `NodeId`
/// (the niche optimization lets the compiler use 0 as the `None` discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// Create a `NodeId` from a raw `u64`.
    ///
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(NodeId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// An RDF term: IRI, blank node, or literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// An IRI reference.
    Iri(String),
    /// A blank node with its local label.
    BNode(String),
    /// A literal with its lexical form and optional datatype IRI.
    Literal {
        /// The lexical form, unescaped.
        lexical: String,
        /// Datatype IRI; `None` means a plain (string) literal.
        datatype: Option<String>,
    },
}

impl Term {
    /// Create an IRI term.
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    /// Create a literal term with an explicit datatype.
    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
        }
    }

    /// Create a plain (string) literal term.
    pub fn plain_literal(lexical: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: None,
        }
    }

    /// True if this term is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// The effective datatype IRI of a literal, defaulting to `xsd:string`
    /// for plain literals. `None` for IRIs and blank nodes.
    pub fn datatype(&self) -> Option<&str> {
        match self {
            Term::Literal { datatype, .. } => Some(
                datatype
                    .as_deref()
                    .unwrap_or("http://www.w3.org/2001/XMLSchema#string"),
            ),
            _ => None,
        }
    }

    /// Render in N-Triples syntax.
    pub fn to_ntriples(&self) -> String {
        match self {
            Term::Iri(iri) => format!("<{iri}>"),
            Term::BNode(label) => format!("_:{label}"),
            Term::Literal { lexical, datatype } => {
                let escaped = lexical.replace('\\', "\\\\").replace('"', "\\\"");
                match datatype {
                    Some(dt) => format!("\"{escaped}\"^^<{dt}>"),
                    None => format!("\"{escaped}\""),
                }
            }
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "{iri}"),
            Term::BNode(label) => write!(f, "_:{label}"),
            Term::Literal { lexical, .. } => write!(f, "\"{lexical}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_niche_optimization() {
        // Option<NodeId> should be the same size as NodeId thanks to NonZeroU64.
        assert_eq!(
            std::mem::size_of::<Option<NodeId>>(),
            std::mem::size_of::<NodeId>()
        );
    }

    #[test]
    fn node_id_zero_is_none() {
        assert!(NodeId::new(0).is_none());
        assert!(NodeId::new(1).is_some());
        assert_eq!(NodeId::new(42).unwrap().get(), 42);
    }

    #[test]
    fn plain_literal_defaults_to_string() {
        let term = Term::plain_literal("hello");
        assert_eq!(
            term.datatype(),
            Some("http://www.w3.org/2001/XMLSchema#string")
        );
    }

    #[test]
    fn iri_has_no_datatype() {
        assert_eq!(Term::iri("http://example.org/a").datatype(), None);
    }

    #[test]
    fn datatype_families() {
        assert!(is_clusterable("http://www.w3.org/2001/XMLSchema#integer"));
        assert!(is_clusterable("http://www.w3.org/2001/XMLSchema#gYear"));
        assert!(is_temporal("http://www.w3.org/2001/XMLSchema#dateTime"));
        assert!(!is_temporal("http://www.w3.org/2001/XMLSchema#integer"));
        assert!(!is_clusterable("http://www.w3.org/2001/XMLSchema#anyURI"));
    }

    #[test]
    fn ntriples_rendering() {
        assert_eq!(
            Term::iri("http://example.org/a").to_ntriples(),
            "<http://example.org/a>"
        );
        assert_eq!(
            Term::typed_literal("5", "http://www.w3.org/2001/XMLSchema#integer").to_ntriples(),
            "\"5\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
        assert_eq!(
            Term::plain_literal("say \"hi\"").to_ntriples(),
            "\"say \\\"hi\\\"\""
        );
    }
}
