//! Graph patterns and typed variables.
//!
//! A [`GraphPattern`] is a rooted tree of [`Assertion`]s sharing one root
//! variable. Patterns are immutable: extending one produces a new pattern that
//! shares its parent's assertions through `Arc`, so growth never deep-copies.
//!
//! Variable occurrences carry a [`VarId`] identity so that two occurrences of
//! the same class inside one pattern stay distinct endpoints, while hashing
//! uses identity-free descriptors so that structurally equal patterns collide.

pub mod support;

use std::collections::{HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::cluster::{NumericCluster, StringCluster};
use crate::term::{NodeId, Term};

/// Identity of a variable occurrence within a run.
pub type VarId = u32;

/// Thread-safe allocator for variable occurrence identities.
///
/// Safe to share across workers via `Arc<VarAllocator>`.
#[derive(Debug)]
pub struct VarAllocator {
    next: AtomicU32,
}

impl VarAllocator {
    /// Create a new allocator starting from 0.
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
        }
    }

    /// Allocate a fresh variable identity.
    pub fn fresh(&self) -> VarId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for VarAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A typed variable occurring in a pattern.
///
/// Only [`Variable::ObjectType`] denotes an open endpoint that can be extended
/// further; all other variants are leaves.
#[derive(Debug, Clone)]
pub enum Variable {
    /// Binds to entities of a class.
    ObjectType {
        /// The class term.
        class: Term,
        /// Occurrence identity.
        var: VarId,
    },
    /// Binds to a literal of a given datatype.
    DataType {
        /// Datatype IRI.
        datatype: String,
        /// Occurrence identity.
        var: VarId,
    },
    /// Binds to a literal belonging to a numeric/temporal cluster.
    MultiModalNumeric {
        /// Datatype IRI.
        datatype: String,
        /// The cluster this variable ranges over.
        cluster: NumericCluster,
        /// Occurrence identity.
        var: VarId,
    },
    /// Binds to a literal belonging to a string cluster.
    MultiModalString {
        /// Datatype IRI.
        datatype: String,
        /// The cluster this variable ranges over.
        cluster: StringCluster,
        /// Occurrence identity.
        var: VarId,
    },
}

impl Variable {
    /// The occurrence identity.
    pub fn var(&self) -> VarId {
        match self {
            Variable::ObjectType { var, .. }
            | Variable::DataType { var, .. }
            | Variable::MultiModalNumeric { var, .. }
            | Variable::MultiModalString { var, .. } => *var,
        }
    }

    /// True if this variable is an open endpoint.
    pub fn is_extendable(&self) -> bool {
        matches!(self, Variable::ObjectType { .. })
    }

    /// The class term for object-type variables.
    pub fn class(&self) -> Option<&Term> {
        match self {
            Variable::ObjectType { class, .. } => Some(class),
            _ => None,
        }
    }

    /// Identity-free descriptor used for hashing and structural comparison.
    pub fn descriptor(&self) -> String {
        match self {
            Variable::ObjectType { class, .. } => format!("obj:{class}"),
            Variable::DataType { datatype, .. } => format!("dt:{datatype}"),
            Variable::MultiModalNumeric { datatype, cluster, .. } => {
                format!("num:{datatype}:{}", cluster.descriptor())
            }
            Variable::MultiModalString { datatype, cluster, .. } => {
                format!("str:{datatype}:{}", cluster.descriptor())
            }
        }
    }

    /// Clone this variable under a fresh occurrence identity.
    pub fn reinstantiate(&self, var: VarId) -> Variable {
        let mut copy = self.clone();
        match &mut copy {
            Variable::ObjectType { var: v, .. }
            | Variable::DataType { var: v, .. }
            | Variable::MultiModalNumeric { var: v, .. }
            | Variable::MultiModalString { var: v, .. } => *v = var,
        }
        copy
    }
}

/// Right-hand side of an assertion: a typed variable or a bound constant.
#[derive(Debug, Clone)]
pub enum AssertionRhs {
    /// A typed variable.
    Variable(Variable),
    /// A bound entity or literal value.
    Bound(Term),
}

impl AssertionRhs {
    /// The variable, if this side is one.
    pub fn variable(&self) -> Option<&Variable> {
        match self {
            AssertionRhs::Variable(v) => Some(v),
            AssertionRhs::Bound(_) => None,
        }
    }

    /// Identity-free descriptor used for hashing.
    pub fn descriptor(&self) -> String {
        match self {
            AssertionRhs::Variable(v) => v.descriptor(),
            AssertionRhs::Bound(t) => format!("bound:{}", t.to_ntriples()),
        }
    }
}

/// A directed edge of a pattern: `(lhs_variable, predicate, rhs)`.
///
/// Carries the depth at which it was added plus the graph-level evidence
/// needed to evaluate joint support: `domain` is the set of lhs entities
/// satisfying the edge, and `inv_map` maps every rhs node back to the lhs
/// entities reaching it. Both are behind `Arc` so grafting an assertion into
/// another pattern shares rather than copies them.
#[derive(Debug, Clone)]
pub struct Assertion {
    /// Identity of the variable this edge hangs off.
    pub lhs: VarId,
    /// The predicate term.
    pub predicate: Term,
    /// Variable or bound constant on the object side.
    pub rhs: AssertionRhs,
    /// Depth at which this assertion entered its pattern.
    pub depth: usize,
    /// Entities satisfying the edge on the subject side.
    pub domain: Arc<HashSet<NodeId>>,
    /// rhs node → subject entities reaching it.
    pub inv_map: Arc<HashMap<NodeId, HashSet<NodeId>>>,
}

impl Assertion {
    /// Create a new assertion.
    pub fn new(
        lhs: VarId,
        predicate: Term,
        rhs: AssertionRhs,
        depth: usize,
        domain: HashSet<NodeId>,
        inv_map: HashMap<NodeId, HashSet<NodeId>>,
    ) -> Self {
        Self {
            lhs,
            predicate,
            rhs,
            depth,
            domain: Arc::new(domain),
            inv_map: Arc::new(inv_map),
        }
    }

    /// Identity-free descriptor of the (predicate, rhs) edge shape.
    pub fn descriptor(&self) -> String {
        format!("{}>{}", self.predicate, self.rhs.descriptor())
    }
}

/// A rooted tree of assertions sharing one root variable.
///
/// Immutable after creation; see [`GraphPattern::extended`] for derivation.
#[derive(Debug, Clone)]
pub struct GraphPattern {
    /// The root class variable.
    pub root: Variable,
    /// All assertions, in the order they entered the pattern.
    pub assertions: Vec<Arc<Assertion>>,
    /// Root bindings satisfying the conjunction of all assertions.
    pub domain: HashSet<NodeId>,
    /// Deterministic digest over (root type, assertion structure).
    pub hash: u64,
}

impl GraphPattern {
    /// Create a depth-0 pattern from a root variable and a single assertion.
    pub fn root_pattern(root: Variable, assertion: Assertion) -> Self {
        let assertions = vec![Arc::new(assertion)];
        let domain = support::evaluate(root.var(), &assertions);
        let hash = digest(&root, &assertions);
        Self {
            root,
            assertions,
            domain,
            hash,
        }
    }

    /// Derive a new pattern by grafting `base` onto the endpoint variable.
    ///
    /// The base assertion keeps its graph evidence (shared via `Arc`) but is
    /// re-anchored at `endpoint`, stamped with `depth`, and its rhs variable
    /// (if any) re-instantiated under a fresh identity.
    pub fn extended(&self, endpoint: VarId, base: &Assertion, depth: usize, fresh: VarId) -> Self {
        let rhs = match &base.rhs {
            AssertionRhs::Variable(v) => AssertionRhs::Variable(v.reinstantiate(fresh)),
            AssertionRhs::Bound(t) => AssertionRhs::Bound(t.clone()),
        };
        let grafted = Assertion {
            lhs: endpoint,
            predicate: base.predicate.clone(),
            rhs,
            depth,
            domain: Arc::clone(&base.domain),
            inv_map: Arc::clone(&base.inv_map),
        };

        let mut assertions = self.assertions.clone();
        assertions.push(Arc::new(grafted));
        let domain = support::evaluate(self.root.var(), &assertions);
        let hash = digest(&self.root, &assertions);
        Self {
            root: self.root.clone(),
            assertions,
            domain,
            hash,
        }
    }

    /// Number of distinct root bindings satisfying the pattern.
    pub fn support(&self) -> usize {
        self.domain.len()
    }

    /// Total number of assertions across all depths.
    pub fn length(&self) -> usize {
        self.assertions.len()
    }

    /// Largest number of sibling assertions sharing one parent endpoint.
    pub fn width(&self) -> usize {
        let mut counts: HashMap<VarId, usize> = HashMap::new();
        for a in &self.assertions {
            *counts.entry(a.lhs).or_insert(0) += 1;
        }
        counts.values().copied().max().unwrap_or(0)
    }

    /// Assertions introduced at the given depth, in insertion order.
    pub fn assertions_at(&self, depth: usize) -> Vec<&Arc<Assertion>> {
        self.assertions.iter().filter(|a| a.depth == depth).collect()
    }

    /// The assertion that created this pattern from its parent.
    pub fn creating_assertion(&self) -> &Arc<Assertion> {
        self.assertions.last().expect("pattern has no assertions")
    }

    /// True if an assertion with the same edge shape already sits at `depth`.
    pub fn contains_at_depth(&self, extension: &Assertion, depth: usize) -> bool {
        let descriptor = extension.descriptor();
        self.assertions
            .iter()
            .any(|a| a.depth == depth && a.descriptor() == descriptor)
    }

    /// Canonical root-relative path for every variable occurrence.
    ///
    /// Paths are what make assertion order irrelevant to the digest: an
    /// assertion is named by where it hangs, not by when it was added.
    pub fn var_paths(&self) -> HashMap<VarId, String> {
        var_paths(&self.root, &self.assertions)
    }

    /// Deterministic hash for a prospective `(pattern, endpoint, extension)`
    /// growth step, used for cross-worker deduplication.
    pub fn predict_hash(&self, endpoint: VarId, extension: &Assertion) -> u64 {
        let paths = self.var_paths();
        let endpoint_path = paths
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| format!("?{endpoint}"));
        let mut hasher = DefaultHasher::new();
        self.hash.hash(&mut hasher);
        endpoint_path.hash(&mut hasher);
        extension.descriptor().hash(&mut hasher);
        hasher.finish()
    }
}

fn var_paths(root: &Variable, assertions: &[Arc<Assertion>]) -> HashMap<VarId, String> {
    let mut paths = HashMap::new();
    paths.insert(root.var(), "r".to_string());
    // Assertions are appended parent-first, so one pass resolves every lhs.
    for a in assertions {
        if let AssertionRhs::Variable(v) = &a.rhs {
            let lhs_path = paths.get(&a.lhs).cloned().unwrap_or_default();
            paths.insert(
                v.var(),
                format!("{lhs_path}/{}>{}", a.predicate, v.descriptor()),
            );
        }
    }
    paths
}

fn digest(root: &Variable, assertions: &[Arc<Assertion>]) -> u64 {
    let paths = var_paths(root, assertions);
    let mut parts: Vec<String> = assertions
        .iter()
        .map(|a| {
            let lhs_path = paths.get(&a.lhs).cloned().unwrap_or_default();
            format!("{lhs_path}|{}|{}|{}", a.predicate, a.rhs.descriptor(), a.depth)
        })
        .collect();
    parts.sort();

    let mut hasher = DefaultHasher::new();
    root.descriptor().hash(&mut hasher);
    for part in &parts {
        part.hash(&mut hasher);
    }
    hasher.finish()
}

impl PartialEq for GraphPattern {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for GraphPattern {}

impl Hash for GraphPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl std::fmt::Display for GraphPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [length={} width={} support={}]",
            self.root.descriptor(),
            self.length(),
            self.width(),
            self.support()
        )
    }
}
