//! Candidate generation: sampled, globally-deduplicated extension proposals.
//!
//! For a pattern at a given depth, enumerates the legal (endpoint, extension)
//! pairs from the Root Pattern Index, applies the stochastic exploration caps,
//! and claims each surviving pair in the depth's shared [`VisitedSet`] so that
//! no combination is proposed twice across concurrently running workers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::Rng;
use rand::rngs::StdRng;

use crate::pattern::{Assertion, GraphPattern, VarId};
use crate::term::Term;

use super::roots::RootPatternIndex;

/// Depth-scoped set of claimed growth-step hashes, shared by all workers of
/// one depth pass and discarded at the depth boundary.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<u64>>,
}

impl VisitedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim a growth-step hash.
    ///
    /// Returns `true` if the hash was new and is now recorded. The membership
    /// check, the redundancy verdict, and the insert form one critical
    /// section; splitting them would let two workers claim the same hash.
    pub fn try_claim(&self, hash: u64, redundant: bool) -> bool {
        let mut inner = self.inner.lock().expect("visited lock poisoned");
        if redundant || inner.contains(&hash) {
            return false;
        }
        inner.insert(hash);
        true
    }

    /// Number of claimed hashes.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("visited lock poisoned").len()
    }

    /// True if nothing has been claimed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute the accepted (endpoint, extension) pairs for this pattern.
///
/// At depth 0 the only endpoint is the pattern's root; deeper passes extend
/// the object-type variables introduced at the previous depth. Data-type and
/// multimodal variables are leaves and never become endpoints.
pub fn compute_candidates(
    index: &RootPatternIndex,
    pattern: &GraphPattern,
    depth: usize,
    p_explore: f64,
    p_extend: f64,
    visited: &VisitedSet,
    rng: &mut StdRng,
) -> Vec<(VarId, Arc<Assertion>)> {
    let endpoints: Vec<(VarId, Term)> = if depth == 0 {
        match pattern.root.class() {
            Some(class) => vec![(pattern.root.var(), class.clone())],
            None => Vec::new(),
        }
    } else {
        pattern
            .assertions_at(depth - 1)
            .into_iter()
            .filter_map(|a| a.rhs.variable())
            .filter(|v| v.is_extendable())
            .filter_map(|v| v.class().map(|c| (v.var(), c.clone())))
            .collect()
    };

    let mut accepted = Vec::new();
    for (endpoint, class) in endpoints {
        // No known extensions for this class: deterministic skip.
        let Some(bases) = index.get(&class) else {
            continue;
        };

        // Stochastic exploration cap, once per endpoint.
        if rng.gen_range(0.0..1.0) > p_explore {
            continue;
        }

        for base_pattern in bases {
            // Per-candidate stochastic cap.
            if rng.gen_range(0.0..1.0) > p_extend {
                continue;
            }

            let extension = base_pattern.creating_assertion();
            let hash = pattern.predict_hash(endpoint, extension);
            let redundant = pattern.contains_at_depth(extension, depth);
            if visited.try_claim(hash, redundant) {
                accepted.push((endpoint, Arc::clone(extension)));
            }
        }
    }

    accepted
}
