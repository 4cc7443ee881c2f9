//! Joint-support evaluation over a pattern's assertion tree.
//!
//! Support is the number of distinct root bindings satisfying the conjunction
//! of all assertions. It is computed bottom-up: an assertion is *satisfied* by
//! the lhs entities that reach at least one rhs node which itself survives all
//! constraints hanging off the rhs variable. The root's feasible set is the
//! intersection of its children's satisfying sets.
//!
//! Because every added assertion only ever intersects, support is monotone
//! non-increasing under extension.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::term::NodeId;

use super::{Assertion, AssertionRhs, VarId};

/// Compute the root domain of a pattern given its assertion tree.
pub fn evaluate(root_var: VarId, assertions: &[Arc<Assertion>]) -> HashSet<NodeId> {
    let mut children: HashMap<VarId, Vec<&Arc<Assertion>>> = HashMap::new();
    for a in assertions {
        children.entry(a.lhs).or_default().push(a);
    }

    let Some(root_children) = children.get(&root_var) else {
        return HashSet::new();
    };

    let mut domain: Option<HashSet<NodeId>> = None;
    for child in root_children {
        let sat = satisfying(child, &children);
        domain = Some(match domain {
            None => sat,
            Some(current) => current.intersection(&sat).copied().collect(),
        });
    }
    domain.unwrap_or_default()
}

/// The lhs entities satisfying `assertion` together with its whole subtree.
fn satisfying(
    assertion: &Assertion,
    children: &HashMap<VarId, Vec<&Arc<Assertion>>>,
) -> HashSet<NodeId> {
    // Feasible rhs nodes: everything the edge reaches, narrowed by any
    // constraints attached to the rhs variable.
    let mut feasible: HashSet<NodeId> = assertion.inv_map.keys().copied().collect();
    if let AssertionRhs::Variable(v) = &assertion.rhs {
        if let Some(subtree) = children.get(&v.var()) {
            for child in subtree {
                let sat = satisfying(child, children);
                feasible.retain(|o| sat.contains(o));
            }
        }
    }

    let mut out = HashSet::new();
    for o in &feasible {
        if let Some(subjects) = assertion.inv_map.get(o) {
            out.extend(subjects.iter().copied());
        }
    }
    out
}
