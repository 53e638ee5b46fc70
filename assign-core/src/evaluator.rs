//! Solution evaluator: scores any candidate assignment against the
//! hard and soft criteria of §4.4, independent of how it was produced.
//!
//! The evaluator holds no state of its own (unlike the teacher's
//! `State`, which caches incremental scores across moves for
//! performance inside the hot search loop — see
//! `solver/scoring/mod.rs`). Here scoring runs once per candidate, so a
//! plain from-scratch pass is both simpler and genuinely stateless,
//! matching §3's "deterministic and stateless" requirement for the
//! evaluator.

use crate::config::{Algorithm, Weights};
use crate::models::{Assignment, EvaluationRecord, HardViolation, SoftMetrics};
use crate::roster::Roster;

/// Scores `assignment` against `roster`, producing a complete
/// [`EvaluationRecord`].
///
/// `execution_time` and `strategy_used`/`fallback_*` are supplied by the
/// caller (normally the orchestrator) rather than measured here, so that
/// calling the evaluator twice on the same assignment is guaranteed to
/// produce bit-identical records except for that one field — the
/// round-trip property of §8.
pub fn evaluate(
    roster: &Roster,
    assignment: &Assignment,
    weights: &Weights,
    execution_time: f64,
    strategy_used: Algorithm,
    fallback_used: bool,
    fallback_reason: Option<String>,
) -> EvaluationRecord {
    let hard_violations = hard_violations(roster, assignment);
    let soft_metrics = soft_metrics(roster, assignment);
    let quality = quality_score(&hard_violations, &soft_metrics, weights);

    EvaluationRecord {
        quality,
        hard_violations,
        soft_metrics,
        execution_time,
        strategy_used,
        fallback_used,
        fallback_reason,
    }
}

/// Hard-constraint violations: zero-friend students, co-placed
/// separation pairs, and split clusters.
fn hard_violations(roster: &Roster, assignment: &Assignment) -> Vec<HardViolation> {
    let mut violations = Vec::new();

    for idx in 0..roster.len() {
        let class = assignment.class_of(idx);
        let has_friend_in_class = roster
            .neighbors(idx)
            .iter()
            .any(|&friend_idx| assignment.class_of(friend_idx) == class);
        if !has_friend_in_class {
            violations.push(HardViolation::ZeroFriendStudent {
                student: roster.name_of(idx).to_string(),
            });
        }
    }

    for &(a, b) in roster.separations() {
        if assignment.class_of(a) == assignment.class_of(b) {
            violations.push(HardViolation::SeparationViolation {
                a: roster.name_of(a).to_string(),
                b: roster.name_of(b).to_string(),
            });
        }
    }

    for cluster in roster.non_singleton_clusters() {
        let first_class = assignment.class_of(cluster[0]);
        if cluster[1..]
            .iter()
            .any(|&idx| assignment.class_of(idx) != first_class)
        {
            let cluster_id = roster
                .student(cluster[0])
                .cluster_id
                .expect("non-singleton cluster members always carry a cluster_id");
            violations.push(HardViolation::ClusterSplit { cluster_id });
        }
    }

    violations
}

/// Soft-objective measurements: friendship satisfaction, demographic
/// imbalance per attribute, and class-size imbalance.
fn soft_metrics(roster: &Roster, assignment: &Assignment) -> SoftMetrics {
    let n = roster.len();

    let friend_satisfaction = if n == 0 {
        1.0
    } else {
        let total: f64 = (0..n)
            .map(|idx| {
                let neighbors = roster.neighbors(idx);
                if neighbors.is_empty() {
                    1.0
                } else {
                    let class = assignment.class_of(idx);
                    let satisfied = neighbors
                        .iter()
                        .filter(|&&friend_idx| assignment.class_of(friend_idx) == class)
                        .count();
                    satisfied as f64 / neighbors.len() as f64
                }
            })
            .sum();
        total / n as f64
    };

    let gender_codes: Vec<usize> = roster
        .students()
        .iter()
        .map(|s| s.gender as usize)
        .collect();
    let academic_codes: Vec<usize> = roster
        .students()
        .iter()
        .map(|s| s.academic as usize)
        .collect();
    let behavior_codes: Vec<usize> = roster
        .students()
        .iter()
        .map(|s| s.behavior as usize)
        .collect();

    let gender_imbalance = category_imbalance(assignment, &gender_codes, 2);
    let academic_imbalance = category_imbalance(assignment, &academic_codes, 3);
    let behavior_imbalance = category_imbalance(assignment, &behavior_codes, 3);

    let separation_violations = roster
        .separations()
        .iter()
        .filter(|&&(a, b)| assignment.class_of(a) == assignment.class_of(b))
        .count();

    let cluster_violations = roster
        .non_singleton_clusters()
        .filter(|cluster| {
            let first_class = assignment.class_of(cluster[0]);
            cluster[1..]
                .iter()
                .any(|&idx| assignment.class_of(idx) != first_class)
        })
        .count();

    let sizes = assignment.class_sizes();
    let size_imbalance = sizes.iter().max().copied().unwrap_or(0) - sizes.iter().min().copied().unwrap_or(0);

    SoftMetrics {
        friend_satisfaction,
        gender_imbalance,
        academic_imbalance,
        behavior_imbalance,
        cluster_violations,
        separation_violations,
        size_imbalance,
    }
}

/// Normalized deviation of per-class, per-category counts from a
/// perfectly uniform distribution, heuristically scaled to land roughly
/// in `[0.0, 1.0]` for typical rosters.
///
/// This is not a formally bounded statistic — it is the same kind of
/// squared-deviation-from-mean measure the CSO solver's soft objective
/// penalizes (§4.3), just normalized here for human-readable reporting.
fn category_imbalance(assignment: &Assignment, category_of: &[usize], num_categories: usize) -> f64 {
    let k = assignment.k();
    if k == 0 {
        return 0.0;
    }
    let mut counts = vec![vec![0usize; num_categories]; k];
    for (idx, &cat) in category_of.iter().enumerate() {
        counts[assignment.class_of(idx)][cat] += 1;
    }
    let totals: Vec<usize> = (0..num_categories)
        .map(|c| counts.iter().map(|row| row[c]).sum())
        .collect();

    let mut sq_dev_sum = 0.0;
    let mut normalizer = 0.0;
    for c in 0..num_categories {
        let expected = totals[c] as f64 / k as f64;
        if expected <= 0.0 {
            continue;
        }
        for row in &counts {
            let actual = row[c] as f64;
            sq_dev_sum += (actual - expected).powi(2);
        }
        normalizer += expected.powi(2) * k as f64;
    }
    if normalizer <= 0.0 {
        0.0
    } else {
        (sq_dev_sum / normalizer).sqrt().min(1.0)
    }
}

/// Composite quality score: 100 minus 20 per hard-violation category
/// present, minus the weighted, normalized soft penalties, clamped to
/// `[0, 100]`.
fn quality_score(hard_violations: &[HardViolation], soft: &SoftMetrics, weights: &Weights) -> u8 {
    let zero_friend_present = hard_violations
        .iter()
        .any(|v| matches!(v, HardViolation::ZeroFriendStudent { .. }));
    let separation_present = hard_violations
        .iter()
        .any(|v| matches!(v, HardViolation::SeparationViolation { .. }));
    let cluster_present = hard_violations
        .iter()
        .any(|v| matches!(v, HardViolation::ClusterSplit { .. }));

    let hard_penalty = 20.0
        * (zero_friend_present as u8 + separation_present as u8 + cluster_present as u8) as f64;

    let weight_sum = weights.w_f + weights.w_g + weights.w_a + weights.w_b;
    let soft_penalty = if weight_sum <= 0.0 {
        0.0
    } else {
        let raw = weights.w_f * (1.0 - soft.friend_satisfaction)
            + weights.w_g * soft.gender_imbalance
            + weights.w_a * soft.academic_imbalance
            + weights.w_b * soft.behavior_imbalance;
        (raw / weight_sum) * 40.0
    };

    let quality = 100.0 - hard_penalty - soft_penalty;
    quality.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Level, RawRoster, RawStudent};
    use crate::validator::validate;

    fn student(name: &str, friends: &[&str], not_with: Option<&str>) -> RawStudent {
        RawStudent {
            name: name.to_string(),
            school: String::new(),
            gender: Gender::Female,
            academic: Level::Medium,
            behavior: Level::Medium,
            friends: friends.iter().map(|s| s.to_string()).collect(),
            not_with: not_with.map(|s| s.to_string()),
            cluster_id: None,
            comments: String::new(),
        }
    }

    #[test]
    fn scenario_a_trivial_balanced_scores_perfectly() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"], None),
                student("B", &["A"], None),
                student("C", &["D"], None),
                student("D", &["C"], None),
            ],
        };
        let roster = validate(&raw, 2, 2).unwrap();
        let a = roster.index_of("A").unwrap();
        let b = roster.index_of("B").unwrap();
        let c = roster.index_of("C").unwrap();
        let d = roster.index_of("D").unwrap();
        let mut classes = vec![0usize; 4];
        classes[a] = 0;
        classes[b] = 0;
        classes[c] = 1;
        classes[d] = 1;
        let assignment = Assignment::new(classes, 2);

        let record = evaluate(
            &roster,
            &assignment,
            &Weights::default(),
            0.01,
            Algorithm::Greedy,
            false,
            None,
        );
        assert!(record.hard_violations.is_empty());
        assert_eq!(record.quality, 100);
    }

    #[test]
    fn adding_a_hard_violation_never_increases_quality() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"], None),
                student("B", &["A"], None),
                student("C", &["D"], None),
                student("D", &["C"], None),
            ],
        };
        let roster = validate(&raw, 2, 2).unwrap();
        let a = roster.index_of("A").unwrap();
        let b = roster.index_of("B").unwrap();
        let c = roster.index_of("C").unwrap();
        let d = roster.index_of("D").unwrap();

        let mut good = vec![0usize; 4];
        good[a] = 0;
        good[b] = 0;
        good[c] = 1;
        good[d] = 1;
        let good_assignment = Assignment::new(good, 2);
        let good_record = evaluate(
            &roster,
            &good_assignment,
            &Weights::default(),
            0.0,
            Algorithm::Greedy,
            false,
            None,
        );

        let mut worse = vec![0usize; 4];
        worse[a] = 0;
        worse[b] = 1;
        worse[c] = 1;
        worse[d] = 1;
        let worse_assignment = Assignment::new(worse, 2);
        let worse_record = evaluate(
            &roster,
            &worse_assignment,
            &Weights::default(),
            0.0,
            Algorithm::Greedy,
            false,
            None,
        );

        assert!(worse_record.quality <= good_record.quality);
    }

    #[test]
    fn evaluating_twice_is_bit_identical_except_execution_time() {
        let raw = RawRoster {
            students: vec![student("A", &["B"], None), student("B", &["A"], None)],
        };
        let roster = validate(&raw, 1, 1).unwrap();
        let assignment = Assignment::new(vec![0, 0], 1);

        let first = evaluate(
            &roster,
            &assignment,
            &Weights::default(),
            1.23,
            Algorithm::Cso,
            false,
            None,
        );
        let second = evaluate(
            &roster,
            &assignment,
            &Weights::default(),
            9.87,
            Algorithm::Cso,
            false,
            None,
        );

        assert_eq!(first.quality, second.quality);
        assert_eq!(first.hard_violations, second.hard_violations);
        assert_eq!(first.soft_metrics, second.soft_metrics);
    }
}
