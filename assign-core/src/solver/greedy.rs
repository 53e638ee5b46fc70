//! The Greedy solver: a fast, friendship-graph-driven heuristic.
//!
//! Implements §4.2 of the design: connected components of the
//! friendship graph are computed first (via [`super::dsu::Dsu`]), fixed
//! clusters are placed as blocks, then remaining students are processed
//! in ascending order of "neighborhood availability" and placed in
//! small move groups with their still-unassigned friends. A bounded
//! local-improvement pass closes out any students left with zero
//! same-class friends.
//!
//! Placement cost is the shared heuristic in [`super::cost`], grounded
//! in the teacher's incremental delta-cost move evaluation.

use super::cost::{placement_cost, ClassStatsTracker};
use super::dsu::Dsu;
use super::Solver;
use crate::config::Algorithm;
use crate::error::{EngineError, ErrorCode};
use crate::models::Assignment;
use crate::roster::{Roster, Student};
use std::collections::HashSet;
use std::time::Instant;

/// Friendship-graph-driven heuristic solver. Deterministic: identical
/// input and configuration always produce identical output (§5, §8).
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedySolver;

impl Solver for GreedySolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Greedy
    }

    fn solve(&self, roster: &Roster, k: usize, _deadline: Instant) -> Result<Assignment, EngineError> {
        solve(roster, k)
    }
}

/// Soft cap on a class's size during placement: `ceil(n/k) + 1`,
/// relaxed only when no class satisfies it.
fn soft_cap(n: usize, k: usize) -> usize {
    n.div_ceil(k) + 1
}

fn solve(roster: &Roster, k: usize) -> Result<Assignment, EngineError> {
    let n = roster.len();
    log::debug!("greedy solver: {} students into {} classes", n, k);

    // Step 1: connected components of G, logged for diagnostics.
    let mut dsu = Dsu::new(n);
    for idx in 0..n {
        for &neighbor in roster.neighbors(idx) {
            dsu.union(idx, neighbor);
        }
    }
    let component_count = (0..n).map(|idx| dsu.find(idx)).collect::<std::collections::HashSet<_>>().len();
    log::debug!("friendship graph has {} connected component(s)", component_count);

    // Step 2: empty classes.
    let expected_size = n as f64 / k as f64;
    let cap = soft_cap(n, k);
    let mut class_of: Vec<Option<usize>> = vec![None; n];
    let mut tracker = ClassStatsTracker::empty(k);

    // Step 3: place fixed clusters first.
    for cluster in roster.non_singleton_clusters() {
        let has_separation_conflict = cluster.iter().enumerate().any(|(i, &a)| {
            cluster[i + 1..]
                .iter()
                .any(|&b| roster.is_separated(a, b))
        });
        if has_separation_conflict {
            log::warn!(
                "cluster containing a separation pair was split: {:?}",
                cluster.iter().map(|&i| roster.name_of(i)).collect::<Vec<_>>()
            );
            // Split: fall through, members are placed individually by
            // the general move-group pass below.
            continue;
        }
        place_group(roster, cluster, &mut class_of, &mut tracker, expected_size, cap, true);
    }

    // Step 4-6: process remaining students by ascending availability.
    // `blocked` holds seeds whose move group could not be placed at all
    // (e.g. a separation pair inside the group itself) — without it,
    // `next_student_to_place` would keep re-selecting the same
    // never-placeable seed forever.
    let mut blocked: HashSet<usize> = HashSet::new();
    loop {
        let next = next_student_to_place(roster, &class_of, &blocked);
        let Some(seed) = next else { break };
        let mut group = vec![seed];
        let mut candidates: Vec<usize> = roster
            .neighbors(seed)
            .iter()
            .copied()
            .filter(|&f| class_of[f].is_none())
            .collect();
        candidates.sort_by_key(|&f| (unassigned_degree(roster, &class_of, f), roster.name_of(f).to_string()));
        for &f in candidates.iter().take(2) {
            if !group.contains(&f) {
                group.push(f);
            }
        }
        let placed = place_group(roster, &group, &mut class_of, &mut tracker, expected_size, cap, false);
        if !placed {
            blocked.insert(seed);
        }
    }

    let unplaced: Vec<&str> = (0..n)
        .filter(|&idx| class_of[idx].is_none())
        .map(|idx| roster.name_of(idx))
        .collect();
    if !unplaced.is_empty() {
        return Err(EngineError::with_param(
            ErrorCode::AssignmentFailed,
            "greedy solver could not place every student under the configured constraints",
            "unplacedCount",
            unplaced.len(),
        ));
    }

    let mut class_of: Vec<usize> = class_of.into_iter().map(|c| c.unwrap()).collect();
    redistribute_to_empty_classes(roster, &mut class_of, k);

    let mut assignment = Assignment::new(class_of, k);

    local_improvement(roster, &mut assignment);

    Ok(assignment)
}

/// Guarantees every class in `0..k` holds at least one student whenever
/// `class_of.len() >= k`, by moving one student at a time from the
/// currently largest class into the next empty one. A student leaving
/// their class can never create a separation violation (the class they
/// join is empty), so this never introduces a hard-constraint failure.
fn redistribute_to_empty_classes(roster: &Roster, class_of: &mut [usize], k: usize) {
    loop {
        let mut counts = vec![0usize; k];
        for &c in class_of.iter() {
            counts[c] += 1;
        }
        let Some(empty_class) = counts.iter().position(|&count| count == 0) else {
            break;
        };
        let Some(donor_class) = counts
            .iter()
            .enumerate()
            .max_by_key(|&(_, &count)| count)
            .map(|(idx, _)| idx)
        else {
            break;
        };
        if counts[donor_class] <= 1 {
            break;
        }

        let donor_student = (0..class_of.len())
            .filter(|&idx| class_of[idx] == donor_class)
            .min_by_key(|&idx| {
                let same_class_friends = roster
                    .neighbors(idx)
                    .iter()
                    .filter(|&&f| class_of[f] == donor_class)
                    .count();
                (same_class_friends, roster.name_of(idx).to_string())
            })
            .expect("donor class has at least 2 students");
        class_of[donor_student] = empty_class;
    }
}

/// Picks the next unassigned, non-blocked student: fewest
/// still-unassigned friends first, ties broken by descending total
/// degree, then by name.
fn next_student_to_place(roster: &Roster, class_of: &[Option<usize>], blocked: &HashSet<usize>) -> Option<usize> {
    (0..roster.len())
        .filter(|&idx| class_of[idx].is_none() && !blocked.contains(&idx))
        .min_by_key(|&idx| {
            (
                unassigned_degree(roster, class_of, idx),
                std::cmp::Reverse(roster.degree(idx)),
                roster.name_of(idx).to_string(),
            )
        })
}

fn unassigned_degree(roster: &Roster, class_of: &[Option<usize>], idx: usize) -> usize {
    roster
        .neighbors(idx)
        .iter()
        .filter(|&&n| class_of[n].is_none())
        .count()
}

/// Places every student in `group` into whichever class minimizes total
/// placement cost, subject to the separation constraint and (unless
/// `allow_relax_cap_only` forces a last-resort pass) the soft size cap.
/// Returns whether the group was placed.
fn place_group(
    roster: &Roster,
    group: &[usize],
    class_of: &mut [Option<usize>],
    tracker: &mut ClassStatsTracker,
    expected_size: f64,
    cap: usize,
    is_cluster: bool,
) -> bool {
    let k = tracker.k();

    let best = (0..k)
        .filter(|&c| respects_separation(roster, group, class_of, c))
        .filter(|&c| tracker.stats(c).size + group.len() <= cap)
        .map(|c| (c, group_cost(roster, group, class_of, tracker, c, expected_size)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    let chosen = best.or_else(|| {
        // Relax the soft cap as a last resort.
        (0..k)
            .filter(|&c| respects_separation(roster, group, class_of, c))
            .map(|c| (c, group_cost(roster, group, class_of, tracker, c, expected_size)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
    });

    let Some((class, _)) = chosen else {
        // No class honors the separation constraint for this group —
        // pathological separation density. Leave the group unassigned;
        // the caller reports ASSIGNMENT_FAILED.
        if is_cluster {
            log::warn!("could not place cluster without a separation conflict");
        }
        return false;
    };

    for &student_idx in group {
        class_of[student_idx] = Some(class);
        tracker.place(roster.student(student_idx), class);
    }
    true
}

fn respects_separation(roster: &Roster, group: &[usize], class_of: &[Option<usize>], class: usize) -> bool {
    let already_in_class: Vec<usize> = (0..roster.len())
        .filter(|&idx| class_of[idx] == Some(class))
        .collect();
    group.iter().all(|&member| {
        !already_in_class
            .iter()
            .any(|&other| roster.is_separated(member, other))
            && !group
                .iter()
                .any(|&peer| peer != member && roster.is_separated(member, peer))
    })
}

/// Total placement cost of adding `group` to `class`, accounting for
/// intra-group synergy (members placed earlier in the group count as
/// "already placed friends" for members placed later).
fn group_cost(
    roster: &Roster,
    group: &[usize],
    class_of: &[Option<usize>],
    tracker: &ClassStatsTracker,
    class: usize,
    expected_size: f64,
) -> f64 {
    let mut scratch = tracker.stats(class).clone();
    let mut placed_in_scratch: Vec<usize> = Vec::new();
    let mut total = 0.0;

    for &member in group {
        let already_placed_friends = roster
            .neighbors(member)
            .iter()
            .filter(|&&n| class_of[n] == Some(class) || placed_in_scratch.contains(&n))
            .count();
        let student: &Student = roster.student(member);
        total += placement_cost(&scratch, student, already_placed_friends, expected_size);
        scratch_add(&mut scratch, student);
        placed_in_scratch.push(member);
    }
    total
}

fn scratch_add(stats: &mut super::cost::ClassStats, student: &Student) {
    stats.size += 1;
    stats.gender_counts[student.gender as usize] += 1;
    stats.academic_counts[student.academic as usize] += 1;
    stats.behavior_counts[student.behavior as usize] += 1;
}

/// Fixed-iteration local improvement: for each zero-friend student,
/// attempt one beneficial, constraint-safe swap with a student in
/// another class.
fn local_improvement(roster: &Roster, assignment: &mut Assignment) {
    const PASSES: usize = 2;
    for _ in 0..PASSES {
        let mut improved_any = false;
        for student_idx in 0..roster.len() {
            if same_class_friend_count(roster, assignment, student_idx) > 0 {
                continue;
            }
            if let Some(partner) = find_beneficial_swap(roster, assignment, student_idx) {
                let class_a = assignment.class_of(student_idx);
                let class_b = assignment.class_of(partner);
                assignment.set_class_of(student_idx, class_b);
                assignment.set_class_of(partner, class_a);
                improved_any = true;
            }
        }
        if !improved_any {
            break;
        }
    }
}

fn same_class_friend_count(roster: &Roster, assignment: &Assignment, idx: usize) -> usize {
    let class = assignment.class_of(idx);
    roster
        .neighbors(idx)
        .iter()
        .filter(|&&f| assignment.class_of(f) == class)
        .count()
}

fn total_friend_satisfaction_count(roster: &Roster, assignment: &Assignment) -> usize {
    (0..roster.len())
        .map(|idx| same_class_friend_count(roster, assignment, idx))
        .sum()
}

fn find_beneficial_swap(roster: &Roster, assignment: &Assignment, student_idx: usize) -> Option<usize> {
    let own_class = assignment.class_of(student_idx);
    let before = total_friend_satisfaction_count(roster, assignment);

    for other_idx in 0..roster.len() {
        let other_class = assignment.class_of(other_idx);
        if other_class == own_class {
            continue;
        }
        // Would this swap place `student_idx` next to a friend?
        let would_have_friend = roster
            .neighbors(student_idx)
            .iter()
            .any(|&f| assignment.class_of(f) == other_class && f != other_idx);
        if !would_have_friend {
            continue;
        }
        // Separation check in the new classes.
        let creates_separation = roster.is_separated(student_idx, other_idx)
            || class_members(assignment, other_class)
                .iter()
                .any(|&m| m != other_idx && roster.is_separated(student_idx, m))
            || class_members(assignment, own_class)
                .iter()
                .any(|&m| m != student_idx && roster.is_separated(other_idx, m));
        if creates_separation {
            continue;
        }

        let mut hypothetical = assignment.clone();
        hypothetical.set_class_of(student_idx, other_class);
        hypothetical.set_class_of(other_idx, own_class);
        let after = total_friend_satisfaction_count(roster, &hypothetical);
        if after >= before {
            return Some(other_idx);
        }
    }
    None
}

fn class_members(assignment: &Assignment, class: usize) -> Vec<usize> {
    (0..assignment.len())
        .filter(|&idx| assignment.class_of(idx) == class)
        .collect()
}
