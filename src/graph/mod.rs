//! Knowledge graph: interned terms with relation-indexed adjacency.
//!
//! The graph is loaded once (from N-Triples via [`ntriples`]), after which the
//! index is read-only and shared across all mining workers.
//!
//! - **Index layer** ([`KnowledgeGraph`](index::KnowledgeGraph)): per-predicate
//!   adjacency, class membership, and bidirectional term interning
//! - **Loader** ([`ntriples`]): line-based N-Triples parser feeding the index

pub mod index;
pub mod ntriples;

pub use index::KnowledgeGraph;

use crate::term::NodeId;

/// A triple (subject, predicate, object) over interned node IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triple {
    /// The subject of the triple.
    pub subject: NodeId,
    /// The predicate (relation) of the triple.
    pub predicate: NodeId,
    /// The object of the triple.
    pub object: NodeId,
}

impl Triple {
    /// Create a new triple.
    pub fn new(subject: NodeId, predicate: NodeId, object: NodeId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}
