//! Property-based tests for the assignment engine.
//!
//! These exercise the validator and both solvers against randomly
//! generated rosters, checking invariants that must hold regardless of
//! the specific friendship graph: every student is placed exactly
//! once, class counts match `k`, and Greedy/CSO honor the size band
//! they each promise.

mod common;

use assign_core::config::Weights;
use assign_core::models::{Gender, Level, RawRoster, RawStudent};
use assign_core::solver::cso::CsoSolver;
use assign_core::solver::greedy::GreedySolver;
use assign_core::solver::Solver;
use assign_core::validator;
use proptest::prelude::*;
use std::time::{Duration, Instant};

const MAX_STUDENTS: usize = 24;
const MAX_CLASSES: usize = 6;

fn gender_strategy() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Male), Just(Gender::Female)]
}

fn level_strategy() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::High), Just(Level::Medium), Just(Level::Low)]
}

/// Generates a roster of `n` students (`n` in `4..=MAX_STUDENTS`) with a
/// random friendship graph (each student names 0-2 friends by index,
/// converted to a name after generation) and a class count `k` that
/// always divides evenly enough for a valid band to exist.
fn roster_and_k_strategy() -> impl Strategy<Value = (RawRoster, usize)> {
    (4..=MAX_STUDENTS).prop_flat_map(|n| {
        let genders = proptest::collection::vec(gender_strategy(), n);
        let academics = proptest::collection::vec(level_strategy(), n);
        let behaviors = proptest::collection::vec(level_strategy(), n);
        // Each student's friend list: 1-2 indices into 0..n. Validation
        // requires every student to name at least one friend, so any
        // index that would collide with self is nudged to the next one.
        let friend_indices = proptest::collection::vec(
            proptest::collection::vec(0..n, 1..=2),
            n,
        );
        let k = 1..=(MAX_CLASSES.min(n));
        (Just(n), genders, academics, behaviors, friend_indices, k)
    }).prop_map(|(n, genders, academics, behaviors, friend_indices, k)| {
        let names: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
        let students = (0..n)
            .map(|i| {
                let friends: Vec<String> = friend_indices[i]
                    .iter()
                    .copied()
                    .map(|j| if j == i { (i + 1) % n } else { j })
                    .map(|j| names[j].clone())
                    .collect();
                RawStudent {
                    name: names[i].clone(),
                    school: String::new(),
                    gender: genders[i],
                    academic: academics[i],
                    behavior: behaviors[i],
                    friends,
                    not_with: None,
                    cluster_id: None,
                    comments: String::new(),
                }
            })
            .collect();
        (RawRoster { students }, k)
    })
}

proptest! {
    /// Property: a valid roster always validates, and the validated
    /// roster's student count matches the input.
    #[test]
    fn validation_preserves_student_count((raw, k) in roster_and_k_strategy()) {
        let n = raw.students.len();
        let result = validator::validate(&raw, k, 1);
        prop_assert!(result.is_ok(), "validation failed: {:?}", result.err());
        prop_assert_eq!(result.unwrap().len(), n);
    }

    /// Property: Greedy always places every student exactly once, into
    /// exactly `k` classes (some possibly empty only when n < k, which
    /// the generator excludes).
    #[test]
    fn greedy_always_produces_a_total_partition((raw, k) in roster_and_k_strategy()) {
        let n = raw.students.len();
        let roster = validator::validate(&raw, k, 1).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let assignment = GreedySolver.solve(&roster, k, deadline)
            .expect("greedy should always find some placement");

        prop_assert_eq!(assignment.len(), n);
        prop_assert_eq!(assignment.k(), k);
        for idx in 0..n {
            prop_assert!(assignment.class_of(idx) < k);
        }
    }

    /// Property: Greedy's soft cap (max - min <= 2, roughly) never
    /// degenerates into an empty class when n >= k.
    #[test]
    fn greedy_never_leaves_a_class_empty_when_n_at_least_k((raw, k) in roster_and_k_strategy()) {
        let n = raw.students.len();
        prop_assume!(n >= k);
        let roster = validator::validate(&raw, k, 1).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let assignment = GreedySolver.solve(&roster, k, deadline).unwrap();

        let mut counts = vec![0usize; k];
        for idx in 0..n {
            counts[assignment.class_of(idx)] += 1;
        }
        prop_assert!(counts.iter().all(|&c| c > 0), "some class got no students: {:?}", counts);
    }

    /// Property: when CSO finds a solution at all, it respects the
    /// strict size band `floor(n/k) <= size <= ceil(n/k)`.
    #[test]
    fn cso_respects_the_size_band_when_it_succeeds((raw, k) in roster_and_k_strategy()) {
        let n = raw.students.len();
        let roster = validator::validate(&raw, k, 1).unwrap();
        let deadline = Instant::now() + Duration::from_millis(500);
        let solver = CsoSolver::new(Weights::default());

        if let Ok(assignment) = solver.solve(&roster, k, deadline) {
            let band_low = n / k;
            let band_high = n.div_ceil(k);
            let mut counts = vec![0usize; k];
            for idx in 0..n {
                counts[assignment.class_of(idx)] += 1;
            }
            for &count in &counts {
                prop_assert!(
                    count >= band_low && count <= band_high,
                    "class size {count} outside band [{band_low}, {band_high}]"
                );
            }
        }
    }
}

#[cfg(test)]
mod edge_cases {
    use super::*;

    #[test]
    fn minimum_viable_roster() {
        let raw = common::ring_roster(2);
        let roster = validator::validate(&raw, 2, 1).unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);
        let assignment = GreedySolver.solve(&roster, 2, deadline).unwrap();
        assert_eq!(assignment.len(), 2);
    }

    #[test]
    fn ring_friendship_graph_is_handled_by_both_solvers() {
        let raw = common::ring_roster(12);
        let roster = validator::validate(&raw, 3, 1).unwrap();

        let greedy_deadline = Instant::now() + Duration::from_secs(2);
        let greedy_result = GreedySolver.solve(&roster, 3, greedy_deadline);
        assert!(greedy_result.is_ok());

        let cso = CsoSolver::new(Weights::default());
        let cso_deadline = Instant::now() + Duration::from_secs(2);
        let cso_result = cso.solve(&roster, 3, cso_deadline);
        assert!(cso_result.is_ok());
    }
}
