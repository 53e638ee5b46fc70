//! Strategy orchestrator: the single entry point that wires the
//! validator, a primary solver, the evaluator, and an optional
//! one-shot Greedy fallback into one call.
//!
//! Grounded in the teacher's `run_solver_with_progress`, which performs
//! the same "pick a solver by config, run it, score the result" control
//! flow, minus the progress-callback plumbing this crate has no caller
//! for.

use crate::config::{Algorithm, EngineConfig};
use crate::error::{EngineError, ErrorCode};
use crate::evaluator;
use crate::models::{AssignmentMetadata, AssignmentResponse, RawRoster};
use crate::roster::Roster;
use crate::solver::cso::CsoSolver;
use crate::solver::greedy::GreedySolver;
use crate::solver::Solver;
use crate::validator;
use std::time::{Duration, Instant};

/// Owns an immutable [`EngineConfig`] for the lifetime of each
/// [`assign`](Orchestrator::assign) call. Holds no other state —
/// nothing here survives between calls.
pub struct Orchestrator {
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Orchestrator { config }
    }

    /// Runs the full pipeline: validate, solve, evaluate, and (on a
    /// failed CSO run, if configured) fall back to Greedy once.
    pub fn assign(&self, raw: &RawRoster, k: usize) -> Result<AssignmentResponse, EngineError> {
        let roster = validator::validate(raw, k, self.config.min_class_size)?;

        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_seconds);
        let primary: Box<dyn Solver> = match self.config.algorithm {
            Algorithm::Greedy => Box::new(GreedySolver),
            Algorithm::Cso => Box::new(CsoSolver::new(self.config.weights)),
        };

        let start = Instant::now();
        let primary_result = primary.solve(&roster, k, deadline);
        let elapsed = start.elapsed().as_secs_f64();

        let (assignment, strategy_used, fallback_used, fallback_reason) = match primary_result {
            Ok(assignment) => (assignment, primary.algorithm(), false, None),
            Err(primary_err) if self.config.fallback_enabled && primary.algorithm() != Algorithm::Greedy => {
                log::warn!(
                    "primary solver {:?} failed ({:?}), falling back to greedy",
                    primary.algorithm(),
                    primary_err.code
                );
                let fallback_deadline = Instant::now() + Duration::from_secs(self.config.timeout_seconds);
                let fallback_assignment = GreedySolver.solve(&roster, k, fallback_deadline)?;
                (
                    fallback_assignment,
                    Algorithm::Greedy,
                    true,
                    Some(fallback_reason_tag(primary_err.code).to_string()),
                )
            }
            Err(primary_err) => return Err(primary_err),
        };

        let record = evaluator::evaluate(
            &roster,
            &assignment,
            &self.config.weights,
            elapsed,
            strategy_used,
            fallback_used,
            fallback_reason,
        );

        build_response(&roster, &assignment, record)
    }
}

/// Maps a primary solver failure to one of the fallback reason tags a
/// caller can branch on (`timeout`, `infeasible`, `unavailable`),
/// rather than forwarding the English debug message.
fn fallback_reason_tag(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::OptimizationTimeout => "timeout",
        ErrorCode::NoSolutionFound | ErrorCode::AssignmentFailed => "infeasible",
        _ => "unavailable",
    }
}

fn build_response(
    roster: &Roster,
    assignment: &crate::models::Assignment,
    record: crate::models::EvaluationRecord,
) -> Result<AssignmentResponse, EngineError> {
    if assignment.len() != roster.len() {
        return Err(EngineError::new(
            ErrorCode::InternalServerError,
            "solver returned an assignment of the wrong length",
        ));
    }

    let classes = assignment
        .classes()
        .into_iter()
        .map(|class| {
            class
                .into_iter()
                .map(|idx| roster.name_of(idx).to_string())
                .collect()
        })
        .collect();

    Ok(AssignmentResponse {
        classes,
        metadata: AssignmentMetadata {
            strategy_used: record.strategy_used,
            execution_time_seconds: record.execution_time,
            solution_quality: record.quality,
            fallback_used: record.fallback_used,
            fallback_reason: record.fallback_reason,
            hard_constraints_satisfied: record.hard_violations.is_empty(),
            violations: record.soft_metrics,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Level, RawStudent};

    fn student(name: &str, friends: &[&str]) -> RawStudent {
        RawStudent {
            name: name.to_string(),
            school: String::new(),
            gender: Gender::Female,
            academic: Level::Medium,
            behavior: Level::Medium,
            friends: friends.iter().map(|s| s.to_string()).collect(),
            not_with: None,
            cluster_id: None,
            comments: String::new(),
        }
    }

    #[test]
    fn assigns_a_trivial_roster_with_greedy() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"]),
                student("B", &["A"]),
                student("C", &["D"]),
                student("D", &["C"]),
            ],
        };
        let config = EngineConfig { algorithm: Algorithm::Greedy, ..Default::default() };
        let orchestrator = Orchestrator::new(config);
        let response = orchestrator.assign(&raw, 2).expect("assignment should succeed");
        assert_eq!(response.classes.len(), 2);
        assert!(response.metadata.hard_constraints_satisfied);
    }

    #[test]
    fn assigns_a_trivial_roster_with_cso() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"]),
                student("B", &["A"]),
                student("C", &["D"]),
                student("D", &["C"]),
            ],
        };
        let config = EngineConfig {
            algorithm: Algorithm::Cso,
            timeout_seconds: 2,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(config);
        let response = orchestrator.assign(&raw, 2).expect("assignment should succeed");
        assert_eq!(response.classes.len(), 2);
        assert!(response.metadata.hard_constraints_satisfied);
    }

    #[test]
    fn propagates_validation_errors() {
        let raw = RawRoster { students: vec![] };
        let orchestrator = Orchestrator::new(EngineConfig::default());
        let err = orchestrator.assign(&raw, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyStudentData);
    }

    #[test]
    fn falls_back_to_greedy_when_cso_cannot_find_a_solution() {
        // A(friend=B), B(friend=A), C(friend=A): C can never get a
        // same-class friend once separated from A's class under k=3.
        let raw = RawRoster {
            students: vec![
                student("A", &["B"]),
                student("B", &["A"]),
                student("C", &["A"]),
            ],
        };
        let config = EngineConfig {
            algorithm: Algorithm::Cso,
            timeout_seconds: 1,
            min_class_size: 1,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(config);
        let response = orchestrator.assign(&raw, 3).expect("fallback should still produce a response");
        assert!(response.metadata.fallback_used);
        assert_eq!(response.metadata.strategy_used, Algorithm::Greedy);
    }
}
