//! Engine configuration.
//!
//! Read once at [`crate::orchestrator::Orchestrator::new`] and never
//! observed mid-call: the orchestrator owns an immutable copy for the
//! lifetime of the call, matching §5/§6.4 of the design — there is no
//! global mutable configuration state.

use serde::{Deserialize, Serialize};

/// Which primary solver the orchestrator should invoke.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Fast friendship-graph-driven heuristic.
    Greedy,
    /// Constraint-satisfaction optimizer with a weighted soft objective.
    Cso,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Cso
    }
}

/// Objective weights for the CSO solver's soft penalty terms.
///
/// Defaults match the design's §4.3 weighting: friendship shortfall
/// weighted highest, cluster violations weighted heavily (since cluster
/// cohesion is normally a hard constraint and only falls back to a soft
/// penalty when a cluster contains a separation pair), and the three
/// demographic balance terms weighted more lightly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Weights {
    /// Weight of unsatisfied friendship presence, per missing friend.
    pub w_f: f64,
    /// Weight of gender-count squared-deviation imbalance.
    pub w_g: f64,
    /// Weight of academic-level squared-deviation imbalance.
    pub w_a: f64,
    /// Weight of behavior-level squared-deviation imbalance.
    pub w_b: f64,
    /// Weight of cluster cohesion violations (only when demoted to soft).
    pub w_c: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            w_f: 10.0,
            w_g: 3.0,
            w_a: 3.0,
            w_b: 2.0,
            w_c: 20.0,
        }
    }
}

/// Top-level configuration surface for the assignment engine.
///
/// # Example
///
/// ```
/// use assign_core::config::EngineConfig;
///
/// let config = EngineConfig {
///     timeout_seconds: 5,
///     ..Default::default()
/// };
/// assert!(config.fallback_enabled);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Primary solver to invoke; default [`Algorithm::Cso`].
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Wall-clock deadline, in seconds, for the CSO solver.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Whether a failed CSO run may fall back to Greedy once.
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
    /// Validator's lower bound on `floor(N / K)`.
    #[serde(default = "default_min_class_size")]
    pub min_class_size: usize,
    /// Soft-objective weights used by the CSO solver.
    #[serde(default)]
    pub weights: Weights,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_fallback_enabled() -> bool {
    true
}

fn default_min_class_size() -> usize {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            algorithm: Algorithm::default(),
            timeout_seconds: default_timeout_seconds(),
            fallback_enabled: default_fallback_enabled(),
            min_class_size: default_min_class_size(),
            weights: Weights::default(),
        }
    }
}
