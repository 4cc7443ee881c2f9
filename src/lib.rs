//! # seshat
//!
//! Frequent graph-pattern discovery over RDF knowledge graphs.
//!
//! Given an N-Triples graph, seshat builds one depth-0 pattern per
//! sufficiently supported (class, predicate, shape) combination and grows
//! these roots by iterative deepening, in parallel, under user-set support,
//! length, and width bounds. Accepted patterns stream out as SPARQL queries
//! that retrieve their matches from any endpoint hosting the graph.
//!
//! ## Library usage
//!
//! ```no_run
//! use seshat::graph::ntriples::load_ntriples;
//! use seshat::mine::{MineConfig, grow, roots};
//! use seshat::pattern::VarAllocator;
//!
//! let kg = load_ntriples(std::path::Path::new("graph.nt")).unwrap();
//! let cfg = MineConfig::default();
//! let vars = VarAllocator::new();
//! let index = roots::init_root_patterns(&kg, &cfg, &vars).unwrap();
//! let found = grow::generate(&index, &cfg, &vars, None).unwrap();
//! println!("{found} patterns");
//! ```

pub mod cluster;
pub mod error;
pub mod graph;
pub mod mine;
pub mod pattern;
pub mod query;
pub mod term;
