//! Combinatorial subtree extension.
//!
//! Turns an accepted (pattern, candidate-set) pair into the set of grown
//! patterns: every subset of the candidates that keeps the pattern inside the
//! support, length, and width bounds. The enumeration is branch-and-bound —
//! a subset is only ever reached through accepted prefixes, so a failed
//! support or bound check prunes all of its supersets at once (support is
//! monotone non-increasing under extension).

use std::collections::HashSet;
use std::sync::Arc;

use crate::pattern::{Assertion, GraphPattern, VarAllocator, VarId};

/// Grow `pattern` by all bound-respecting, support-valid subsets of
/// `candidates`, each grafted at its endpoint with depth `depth`.
pub fn extend_pattern(
    pattern: &GraphPattern,
    candidates: &[(VarId, Arc<Assertion>)],
    depth: usize,
    max_length: usize,
    max_width: usize,
    min_support: usize,
    vars: &VarAllocator,
) -> HashSet<GraphPattern> {
    let mut accepted: HashSet<GraphPattern> = HashSet::new();
    // Parents for the subset walk: the unextended pattern plus every grown
    // pattern accepted so far. Candidates are consumed left to right, so each
    // subset is built exactly once.
    let mut parents: Vec<GraphPattern> = vec![pattern.clone()];

    for (endpoint, base) in candidates {
        let mut batch = Vec::new();
        for parent in &parents {
            if parent.length() + 1 >= max_length {
                continue;
            }
            let grown = parent.extended(*endpoint, base, depth, vars.fresh());
            if grown.width() >= max_width || grown.support() < min_support {
                continue;
            }
            if accepted.contains(&grown) {
                continue;
            }
            batch.push(grown);
        }
        for grown in batch {
            accepted.insert(grown.clone());
            parents.push(grown);
        }
    }

    accepted
}
