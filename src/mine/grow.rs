//! The iterative-deepening growth driver.
//!
//! Deepens the Root Pattern Index one depth at a time, fanning the frontier
//! of each class out across rayon workers. Both strategies share the same
//! per-depth body; they differ only in loop nesting. Breadth-first finishes
//! every class at depth `d` before any class reaches `d + 1`, so the visited
//! set of a depth spans all classes. Depth-first exhausts one class to the
//! final depth before starting the next, so each class carries its own
//! per-depth visited sets.
//!
//! Accepted patterns stream out the moment a worker produces them; nothing is
//! buffered until the end of the run.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Mutex;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{MineError, SeshatResult};
use crate::pattern::{GraphPattern, VarAllocator};
use crate::query::write_query;
use crate::term::Term;

use super::candidates::{VisitedSet, compute_candidates};
use super::extend::extend_pattern;
use super::roots::RootPatternIndex;
use super::{MineConfig, Strategy};

/// Where accepted patterns go, as numbered SPARQL queries.
pub struct QueryStream {
    /// The output sink.
    pub writer: Box<dyn Write + Send>,
    /// Namespace under which patterns are named.
    pub namespace: String,
    /// Prefix map used to compact IRIs.
    pub prefixes: Vec<(String, String)>,
}

/// Output state shared by all workers: the optional sink plus the running
/// pattern number. One mutex guards both so numbering stays gapless.
struct StreamState {
    sink: Option<QueryStream>,
    count: usize,
}

impl StreamState {
    fn emit(&mut self, pattern: &GraphPattern) -> Result<(), MineError> {
        match &mut self.sink {
            Some(stream) => {
                self.count = write_query(
                    &mut stream.writer,
                    pattern,
                    self.count,
                    &stream.namespace,
                    &stream.prefixes,
                )
                .map_err(|source| MineError::WriteFailed {
                    number: self.count,
                    source,
                })?;
            }
            None => self.count += 1,
        }
        Ok(())
    }
}

/// Grow every root pattern up to `cfg.depths`, streaming accepted patterns to
/// `sink` as they are found. Returns the total number of accepted patterns.
pub fn generate(
    index: &RootPatternIndex,
    cfg: &MineConfig,
    vars: &VarAllocator,
    sink: Option<QueryStream>,
) -> SeshatResult<usize> {
    let stream = Mutex::new(StreamState { sink, count: 0 });

    match cfg.strategy {
        Strategy::Bfs => generate_bf(index, cfg, vars, &stream)?,
        Strategy::Dfs => generate_df(index, cfg, vars, &stream)?,
    }

    let mut state = stream.into_inner().expect("stream lock poisoned");
    if let Some(query_stream) = &mut state.sink {
        query_stream.writer.flush().map_err(|source| MineError::WriteFailed {
            number: state.count,
            source,
        })?;
    }
    info!(patterns = state.count, "generation finished");
    Ok(state.count)
}

/// Breadth-first: one shared visited set per depth, spanning every class.
fn generate_bf(
    index: &RootPatternIndex,
    cfg: &MineConfig,
    vars: &VarAllocator,
    stream: &Mutex<StreamState>,
) -> SeshatResult<()> {
    let mut classes: Vec<&Term> = index.keys().collect();
    classes.sort();

    let mut frontiers: HashMap<&Term, HashSet<GraphPattern>> = HashMap::new();
    for depth in 0..cfg.depths {
        let visited = VisitedSet::new();
        for class in &classes {
            let frontier = match frontiers.remove(*class) {
                Some(f) => f,
                None if depth == 0 => HashSet::new(),
                // Exhausted at an earlier depth.
                None => continue,
            };
            let derivatives =
                process_depth(index, class, &frontier, depth, cfg, vars, &visited, stream)?;
            debug!(
                class = %class,
                depth,
                derived = derivatives.len(),
                "depth pass complete"
            );
            if !derivatives.is_empty() {
                frontiers.insert(*class, derivatives);
            }
        }
        info!(depth, claimed = visited.len(), live = frontiers.len(), "depth finished");
        if frontiers.is_empty() {
            break;
        }
    }
    Ok(())
}

/// Depth-first: each class runs to the final depth before the next starts.
fn generate_df(
    index: &RootPatternIndex,
    cfg: &MineConfig,
    vars: &VarAllocator,
    stream: &Mutex<StreamState>,
) -> SeshatResult<()> {
    let mut classes: Vec<&Term> = index.keys().collect();
    classes.sort();

    for class in classes {
        let mut frontier = HashSet::new();
        for depth in 0..cfg.depths {
            let visited = VisitedSet::new();
            frontier =
                process_depth(index, class, &frontier, depth, cfg, vars, &visited, stream)?;
            if frontier.is_empty() {
                break;
            }
        }
        debug!(class = %class, "class exhausted");
    }
    Ok(())
}

/// The shared per-depth body for one class.
///
/// At depth 0 the frontier is ignored and the class's root patterns take its
/// place: every root is emitted and every root is submitted for extension —
/// a bound or literal rhs closes that endpoint, but the root variable itself
/// stays open, so literal-only conjunctions still form. Roots ending in an
/// extendable variable are additionally kept as derivatives so that chains
/// can deepen even when no sibling was added. Deeper passes extend the
/// previous depth's derivatives.
///
/// Each frontier pattern becomes one rayon task that runs candidate
/// generation and extension back to back, so extension of one pattern
/// overlaps candidate generation of the next. The RNG is reseeded per
/// (seed, pattern, depth), which keeps runs with the same seed reproducible
/// regardless of worker scheduling.
#[allow(clippy::too_many_arguments)]
fn process_depth(
    index: &RootPatternIndex,
    class: &Term,
    frontier: &HashSet<GraphPattern>,
    depth: usize,
    cfg: &MineConfig,
    vars: &VarAllocator,
    visited: &VisitedSet,
    stream: &Mutex<StreamState>,
) -> SeshatResult<HashSet<GraphPattern>> {
    let mut seed: HashSet<GraphPattern> = HashSet::new();
    let roots_frontier;
    let patterns: &HashSet<GraphPattern> = if depth == 0 {
        let roots = index.get(class).cloned().unwrap_or_default();
        let mut state = stream.lock().expect("stream lock poisoned");
        for root in &roots {
            state.emit(root)?;
        }
        drop(state);
        for root in &roots {
            let extendable = root
                .creating_assertion()
                .rhs
                .variable()
                .is_some_and(|v| v.is_extendable());
            if extendable {
                seed.insert(root.clone());
            }
        }
        roots_frontier = roots.into_iter().collect::<HashSet<_>>();
        &roots_frontier
    } else {
        frontier
    };

    let derivatives: Mutex<HashSet<GraphPattern>> = Mutex::new(seed.clone());
    patterns
        .par_iter()
        .filter(|p| p.length() < cfg.max_length && p.width() < cfg.max_width)
        .try_for_each(|pattern| -> SeshatResult<()> {
            let mut rng = StdRng::seed_from_u64(
                cfg.seed ^ pattern.hash ^ (depth as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15),
            );
            let candidates = compute_candidates(
                index,
                pattern,
                depth,
                cfg.p_explore,
                cfg.p_extend,
                visited,
                &mut rng,
            );
            if candidates.is_empty() {
                return Ok(());
            }
            let grown = extend_pattern(
                pattern,
                &candidates,
                depth,
                cfg.max_length,
                cfg.max_width,
                cfg.min_support,
                vars,
            );
            if grown.is_empty() {
                return Ok(());
            }

            let fresh: Vec<GraphPattern> = {
                let mut all = derivatives.lock().expect("derivatives lock poisoned");
                grown
                    .into_iter()
                    .filter(|g| all.insert(g.clone()))
                    .collect()
            };
            if fresh.is_empty() {
                return Ok(());
            }
            let mut state = stream.lock().expect("stream lock poisoned");
            for pattern in &fresh {
                state.emit(pattern)?;
            }
            Ok(())
        })
        .map_err(|e| MineError::WorkerFailed {
            class: class.to_string(),
            message: e.to_string(),
        })?;

    Ok(derivatives.into_inner().expect("derivatives lock poisoned"))
}
