//! In-memory knowledge graph with relation-indexed adjacency.
//!
//! Uses `DashMap` for the term interner and the per-predicate adjacency lists,
//! so loading can insert concurrently and the mining phase can read from many
//! rayon workers without further synchronization.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::error::GraphError;
use crate::term::{NodeId, RDF_TYPE, Term};

use super::Triple;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// In-memory knowledge graph with bidirectional term interning and three
/// secondary indexes: predicate adjacency, class membership, and entity types.
///
/// Immutable once loaded; all lookups are safe to call concurrently.
pub struct KnowledgeGraph {
    /// Term → NodeId interning.
    term_to_id: DashMap<Term, NodeId>,
    /// NodeId → Term reverse lookup.
    id_to_term: DashMap<NodeId, Term>,
    /// Predicate index: predicate NodeId → list of (subject, object) pairs.
    adjacency: DashMap<NodeId, Vec<(NodeId, NodeId)>>,
    /// Class index: class NodeId → member entity NodeIds. Repeated type
    /// statements leave duplicates here; readers count distinct members.
    class_index: DashMap<NodeId, Vec<NodeId>>,
    /// Entity type index: entity NodeId → class NodeIds, in insertion order.
    entity_types: DashMap<NodeId, Vec<NodeId>>,
    /// The interned `rdf:type` predicate, set on first type statement.
    rdf_type: AtomicU64,
    /// Next NodeId to allocate (IDs start at 1, 0 is the NonZero niche).
    next_id: AtomicU64,
    /// Triple count.
    triple_count: AtomicUsize,
}

impl KnowledgeGraph {
    /// Create a new empty knowledge graph.
    pub fn new() -> Self {
        Self {
            term_to_id: DashMap::new(),
            id_to_term: DashMap::new(),
            adjacency: DashMap::new(),
            class_index: DashMap::new(),
            entity_types: DashMap::new(),
            rdf_type: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            triple_count: AtomicUsize::new(0),
        }
    }

    /// Intern a term, returning its stable NodeId.
    pub fn intern(&self, term: &Term) -> NodeId {
        if let Some(id) = self.term_to_id.get(term) {
            return *id.value();
        }
        // entry() keeps concurrent interning of the same term to one ID.
        let id = *self.term_to_id.entry(term.clone()).or_insert_with(|| {
            let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
            NodeId::new(raw).expect("node ID space exhausted")
        });
        self.id_to_term.entry(id).or_insert_with(|| term.clone());
        id
    }

    /// Insert a triple given as raw terms, interning all three positions.
    pub fn insert(&self, subject: &Term, predicate: &Term, object: &Term) -> Triple {
        let s = self.intern(subject);
        let p = self.intern(predicate);
        let o = self.intern(object);

        self.adjacency.entry(p).or_default().push((s, o));

        if matches!(predicate, Term::Iri(iri) if iri == RDF_TYPE) {
            self.rdf_type.store(p.get(), Ordering::Relaxed);
            self.class_index.entry(o).or_default().push(s);
            self.entity_types.entry(s).or_default().push(o);
        }

        self.triple_count.fetch_add(1, Ordering::Relaxed);
        Triple::new(s, p, o)
    }

    /// The interned `rdf:type` predicate, if any type statement was seen.
    pub fn rdf_type_id(&self) -> Option<NodeId> {
        NodeId::new(self.rdf_type.load(Ordering::Relaxed))
    }

    /// All (subject, object) pairs linked by the given predicate.
    pub fn relation_adjacency(&self, predicate: NodeId) -> Vec<(NodeId, NodeId)> {
        self.adjacency
            .get(&predicate)
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }

    /// All predicates occurring in the graph.
    pub fn predicates(&self) -> Vec<NodeId> {
        self.adjacency.iter().map(|e| *e.key()).collect()
    }

    /// Number of distinct predicates.
    pub fn num_relations(&self) -> usize {
        self.adjacency.len()
    }

    /// All classes with their distinct instance counts.
    pub fn classes(&self) -> Vec<(NodeId, usize)> {
        self.class_index
            .iter()
            .map(|e| {
                let members: HashSet<NodeId> = e.value().iter().copied().collect();
                (*e.key(), members.len())
            })
            .collect()
    }

    /// The set of entities declared to be instances of a class.
    pub fn instances_of_class(&self, class: NodeId) -> HashSet<NodeId> {
        self.class_index
            .get(&class)
            .map(|v| v.value().iter().copied().collect())
            .unwrap_or_default()
    }

    /// The classes an entity is declared an instance of, in statement order.
    pub fn types_of(&self, entity: NodeId) -> Vec<NodeId> {
        self.entity_types
            .get(&entity)
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }

    /// The effective datatype of a literal node, or `None` for IRIs/bnodes.
    pub fn literal_datatype(&self, id: NodeId) -> Option<String> {
        self.id_to_term
            .get(&id)
            .and_then(|t| t.value().datatype().map(String::from))
    }

    /// Look up the term for a node ID.
    pub fn term(&self, id: NodeId) -> GraphResult<Term> {
        self.id_to_term
            .get(&id)
            .map(|t| t.value().clone())
            .ok_or(GraphError::NodeNotFound { id: id.get() })
    }

    /// Look up the node ID for a term, if interned.
    pub fn id(&self, term: &Term) -> Option<NodeId> {
        self.term_to_id.get(term).map(|id| *id.value())
    }

    /// Number of interned terms.
    pub fn node_count(&self) -> usize {
        self.id_to_term.len()
    }

    /// Number of triples.
    pub fn triple_count(&self) -> usize {
        self.triple_count.load(Ordering::Relaxed)
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("nodes", &self.node_count())
            .field("relations", &self.num_relations())
            .field("triples", &self.triple_count())
            .finish()
    }
}
