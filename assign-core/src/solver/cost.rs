//! Shared per-class bookkeeping and placement-cost heuristics used by
//! both the Greedy and CSO solvers.
//!
//! Grounded in the teacher's incremental scoring helpers
//! (`solver/scoring/mod.rs`'s `get_attribute_counts` /
//! `calculate_penalty_from_counts`): rather than rescoring an entire
//! assignment on every candidate placement, each solver keeps a running
//! per-class histogram and asks this module for the marginal cost of
//! adding (or removing) a student.

use crate::roster::{Roster, Student};

/// Running demographic and size counters for one class.
#[derive(Debug, Clone, Default)]
pub struct ClassStats {
    pub size: usize,
    /// Indexed by `Gender as usize`.
    pub gender_counts: [usize; 2],
    /// Indexed by `Level as usize` (shared by academic and behavior).
    pub academic_counts: [usize; 3],
    pub behavior_counts: [usize; 3],
}

impl ClassStats {
    fn add(&mut self, student: &Student) {
        self.size += 1;
        self.gender_counts[student.gender as usize] += 1;
        self.academic_counts[student.academic as usize] += 1;
        self.behavior_counts[student.behavior as usize] += 1;
    }

    fn remove(&mut self, student: &Student) {
        self.size -= 1;
        self.gender_counts[student.gender as usize] -= 1;
        self.academic_counts[student.academic as usize] -= 1;
        self.behavior_counts[student.behavior as usize] -= 1;
    }
}

/// Per-class running statistics for an in-progress or complete
/// assignment, updated incrementally as students are placed or moved.
#[derive(Debug, Clone)]
pub struct ClassStatsTracker {
    stats: Vec<ClassStats>,
}

impl ClassStatsTracker {
    /// Creates a tracker with `k` empty classes.
    pub fn empty(k: usize) -> Self {
        ClassStatsTracker {
            stats: vec![ClassStats::default(); k],
        }
    }

    /// Creates a tracker already populated from a complete assignment.
    pub fn from_assignment(roster: &Roster, class_of: &[usize], k: usize) -> Self {
        let mut tracker = ClassStatsTracker::empty(k);
        for (idx, &class) in class_of.iter().enumerate() {
            tracker.stats[class].add(roster.student(idx));
        }
        tracker
    }

    pub fn stats(&self, class: usize) -> &ClassStats {
        &self.stats[class]
    }

    pub fn k(&self) -> usize {
        self.stats.len()
    }

    pub fn place(&mut self, student: &Student, class: usize) {
        self.stats[class].add(student);
    }

    pub fn remove(&mut self, student: &Student, class: usize) {
        self.stats[class].remove(student);
    }

    pub fn move_student(&mut self, student: &Student, from: usize, to: usize) {
        if from == to {
            return;
        }
        self.stats[from].remove(student);
        self.stats[to].add(student);
    }
}

/// Marginal placement cost of adding one student to a class, given its
/// current stats. Lower is better. Combines a size term (prefer
/// smaller classes), per-attribute squared-deviation-from-balanced
/// terms, and a friend-presence bonus (negative cost) for already
/// co-assigned friends.
///
/// This mirrors the shape of the teacher's delta-cost move evaluation
/// (`solver/moves/swap.rs`'s `calculate_swap_cost_delta`) without
/// needing the full incremental move machinery: the Greedy solver only
/// ever adds students to classes, never has to undo a placement.
pub fn placement_cost(
    stats: &ClassStats,
    student: &Student,
    already_placed_friends: usize,
    expected_size: f64,
) -> f64 {
    const SIZE_WEIGHT: f64 = 1.0;
    const GENDER_WEIGHT: f64 = 0.5;
    const ACADEMIC_WEIGHT: f64 = 0.5;
    const BEHAVIOR_WEIGHT: f64 = 0.3;
    const FRIEND_WEIGHT: f64 = 5.0;

    let size_term = SIZE_WEIGHT * (stats.size as f64 - expected_size).max(0.0);

    let gender_term = GENDER_WEIGHT
        * attribute_deviation(&stats.gender_counts, student.gender as usize, stats.size);
    let academic_term = ACADEMIC_WEIGHT
        * attribute_deviation(&stats.academic_counts, student.academic as usize, stats.size);
    let behavior_term = BEHAVIOR_WEIGHT
        * attribute_deviation(&stats.behavior_counts, student.behavior as usize, stats.size);

    let friend_term = FRIEND_WEIGHT * already_placed_friends as f64;

    size_term + gender_term + academic_term + behavior_term - friend_term
}

/// How much adding one more member of `category` would push a class's
/// share of that category away from a flat 1/len(counts) split.
fn attribute_deviation(counts: &[usize], category: usize, class_size: usize) -> f64 {
    let num_categories = counts.len() as f64;
    let expected_share = 1.0 / num_categories;
    let current = counts[category] as f64;
    let next_size = (class_size + 1) as f64;
    let next_share = (current + 1.0) / next_size;
    (next_share - expected_share).abs()
}
