//! The pattern-growth search engine.
//!
//! Mining proceeds in two phases. [`roots`] builds the Root Pattern Index:
//! one depth-0 pattern per sufficiently frequent (class, predicate, shape)
//! combination. [`grow`] then deepens those roots iteratively, fanning each
//! depth out across rayon workers: [`candidates`] proposes sampled,
//! globally-deduplicated extension pairs and [`extend`] turns an accepted
//! candidate set into grown patterns under the support/length/width bounds.

pub mod candidates;
pub mod extend;
pub mod grow;
pub mod roots;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which kinds of root patterns to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Instance-level patterns with bound object values only.
    A,
    /// Schema-level patterns with typed variables only.
    T,
    /// Both.
    AT,
}

impl Mode {
    /// True if bound-value (instance) patterns are generated.
    pub fn abox(self) -> bool {
        matches!(self, Mode::A | Mode::AT)
    }

    /// True if typed-variable (schema) patterns are generated.
    pub fn tbox(self) -> bool {
        matches!(self, Mode::T | Mode::AT)
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Mode::A),
            "T" => Ok(Mode::T),
            "AT" | "TA" => Ok(Mode::AT),
            _ => Err(ConfigError::EmptyMode),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::A => write!(f, "A"),
            Mode::T => write!(f, "T"),
            Mode::AT => write!(f, "AT"),
        }
    }
}

/// Frontier orchestration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Process every class at depth d before any class reaches depth d+1.
    Bfs,
    /// Exhaust one class to its maximum depth before starting the next.
    Dfs,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" => Ok(Strategy::Bfs),
            "dfs" => Ok(Strategy::Dfs),
            other => Err(format!("unknown strategy {other:?}, expected bfs or dfs")),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Bfs => write!(f, "bfs"),
            Strategy::Dfs => write!(f, "dfs"),
        }
    }
}

/// Run parameters for one mining run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineConfig {
    /// Number of growth rounds (inclusive maximum depth).
    pub depths: usize,
    /// Minimum number of distinct root bindings a pattern must keep.
    pub min_support: usize,
    /// Probability of exploring an endpoint during candidate generation.
    pub p_explore: f64,
    /// Probability of considering each individual extension candidate.
    pub p_extend: f64,
    /// Exclusive upper bound on pattern length (assertion count).
    pub max_length: usize,
    /// Exclusive upper bound on pattern width (siblings per endpoint).
    pub max_width: usize,
    /// A-box / T-box generation mode.
    pub mode: Mode,
    /// Cluster textual literal populations.
    pub textual: bool,
    /// Cluster numeric literal populations.
    pub numerical: bool,
    /// Cluster temporal literal populations.
    pub temporal: bool,
    /// Frontier orchestration strategy.
    pub strategy: Strategy,
    /// Seed for the sampling RNG; reruns with the same seed and p = 1 accept
    /// the same candidate sets.
    pub seed: u64,
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            depths: 3,
            min_support: 2,
            p_explore: 1.0,
            p_extend: 1.0,
            max_length: 5,
            max_width: 3,
            mode: Mode::AT,
            textual: false,
            numerical: false,
            temporal: false,
            strategy: Strategy::Bfs,
            seed: 42,
        }
    }
}

impl MineConfig {
    /// Validate all parameters. Called before any work starts so that
    /// configuration errors never surface mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("p_explore", self.p_explore), ("p_extend", self.p_extend)] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if self.depths < 1 {
            return Err(ConfigError::Depths { value: self.depths });
        }
        if self.min_support < 1 {
            return Err(ConfigError::MinSupport {
                value: self.min_support,
            });
        }
        for (name, value) in [("max_length", self.max_length), ("max_width", self.max_width)] {
            if value < 1 {
                return Err(ConfigError::Bounds { name, value });
            }
        }
        Ok(())
    }

    /// True if any literal modality is enabled.
    pub fn multimodal(&self) -> bool {
        self.textual || self.numerical || self.temporal
    }
}
