//! The two interchangeable solver strategies and the trait they share.
//!
//! Grounded in §9's "tagged variant or trait/interface, not a class
//! hierarchy" guidance, and in the teacher's own single-capability-set
//! dispatch in `run_solver_with_progress` (`Box<dyn algorithms::Solver>`
//! chosen by a `solver_type` tag).

mod cost;
pub mod cso;
mod dsu;
pub mod greedy;

use crate::config::Algorithm;
use crate::error::EngineError;
use crate::models::Assignment;
use crate::roster::Roster;
use std::time::Instant;

/// Shared capability both solvers implement: produce a complete
/// [`Assignment`] for `roster` into `k` classes, respecting `deadline`.
///
/// The Greedy solver has no suspension points and ignores `deadline`
/// except as a sanity check; the CSO solver polls it during its search
/// loop (§5).
pub trait Solver {
    /// Which [`Algorithm`] tag this solver implements.
    fn algorithm(&self) -> Algorithm;

    /// Produces an assignment, or a solver-specific [`EngineError`].
    fn solve(&self, roster: &Roster, k: usize, deadline: Instant) -> Result<Assignment, EngineError>;
}
