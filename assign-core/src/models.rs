//! Public data types for the assignment engine's request/response contract.
//!
//! These types are the boundary between the engine and its callers
//! (§6 of the design). They are plain serializable records; the HTTP
//! layer, CSV ingestion, and CLI argument parsing that produce and
//! consume them are out of scope for this crate.

use crate::config::Algorithm;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// A student's gender, as used by the gender-balance soft objective.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

/// A three-level rating used for both academic and behavioral attributes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    High,
    Medium,
    Low,
}

/// One student record as received from the caller, prior to validation.
///
/// `friends` and `not_with` are taken verbatim from the request; they
/// may contain duplicates, self-references, or names not present in the
/// roster. Normalization (duplicate/self-reference removal) happens
/// during [`crate::roster::Roster`] construction, per §3 of the design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStudent {
    /// Unique non-empty identifier within a roster.
    pub name: String,
    /// Opaque string, not used by the engine.
    #[serde(default)]
    pub school: String,
    pub gender: Gender,
    pub academic: Level,
    pub behavior: Level,
    /// Up to four friend names, in preference order.
    #[serde(default)]
    pub friends: Vec<String>,
    /// Optional single separation partner.
    #[serde(default)]
    pub not_with: Option<String>,
    /// Absent means "unclustered".
    #[serde(default)]
    pub cluster_id: Option<u32>,
    /// Opaque string, not used by the engine.
    #[serde(default)]
    pub comments: String,
}

/// The unvalidated input to an assignment request: a roster plus the
/// desired number of classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRoster {
    pub students: Vec<RawStudent>,
}

/// A complete partition of student indices into `k` classes.
///
/// Internally a total function from student index to class index in
/// `[0, k)`. See [`crate::roster::Roster`] for the index ↔ name
/// mapping this is defined over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    class_of: Vec<usize>,
    k: usize,
}

impl Assignment {
    /// Builds an assignment from a per-student class vector.
    ///
    /// # Panics
    ///
    /// Panics if any entry is `>= k`. This is an internal invariant the
    /// solvers must uphold by construction; it is not a user-facing
    /// validation failure.
    pub fn new(class_of: Vec<usize>, k: usize) -> Self {
        assert!(
            class_of.iter().all(|&c| c < k),
            "assignment contains a class index out of range"
        );
        Assignment { class_of, k }
    }

    /// Number of classes this assignment partitions students into.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of students this assignment covers.
    pub fn len(&self) -> usize {
        self.class_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_of.is_empty()
    }

    /// The class index assigned to student index `student_idx`.
    pub fn class_of(&self, student_idx: usize) -> usize {
        self.class_of[student_idx]
    }

    /// Reassigns a student to a new class in place.
    pub fn set_class_of(&mut self, student_idx: usize, class_idx: usize) {
        assert!(class_idx < self.k);
        self.class_of[student_idx] = class_idx;
    }

    /// Raw per-student class vector.
    pub fn as_slice(&self) -> &[usize] {
        &self.class_of
    }

    /// Groups student indices by class, in class order `0..k`.
    pub fn classes(&self) -> Vec<Vec<usize>> {
        let mut classes = vec![Vec::new(); self.k];
        for (student_idx, &class_idx) in self.class_of.iter().enumerate() {
            classes[class_idx].push(student_idx);
        }
        classes
    }

    /// Per-class sizes, in class order `0..k`.
    pub fn class_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.k];
        for &c in &self.class_of {
            sizes[c] += 1;
        }
        sizes
    }
}

/// A single hard-constraint violation found by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum HardViolation {
    /// A student with zero same-class friends.
    ZeroFriendStudent { student: String },
    /// A separation pair placed in the same class.
    SeparationViolation { a: String, b: String },
    /// A cluster that was split across more than one class.
    ClusterSplit { cluster_id: u32 },
}

/// Soft-objective measurements computed by the evaluator.
///
/// All imbalance fields are normalized deviations from a perfectly
/// uniform distribution; `0.0` is ideal, larger values are worse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SoftMetrics {
    /// Mean over students of (same-class friends / total friends).
    pub friend_satisfaction: f64,
    pub gender_imbalance: f64,
    pub academic_imbalance: f64,
    pub behavior_imbalance: f64,
    pub cluster_violations: usize,
    pub separation_violations: usize,
    /// `max_k size_k - min_k size_k`.
    pub size_imbalance: usize,
}

/// The result of scoring a candidate assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRecord {
    /// Composite quality score in `0..=100`.
    pub quality: u8,
    pub hard_violations: Vec<HardViolation>,
    pub soft_metrics: SoftMetrics,
    /// Wall-clock time the solver took to produce the scored assignment.
    pub execution_time: f64,
    pub strategy_used: Algorithm,
    pub fallback_used: bool,
    pub fallback_reason: Option<String>,
}

/// The response returned by a successful assignment call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResponse {
    /// `classes[k]` is the list of student names placed in class `k`.
    pub classes: Vec<Vec<String>>,
    pub metadata: AssignmentMetadata,
}

/// Summary metadata describing how an assignment was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentMetadata {
    pub strategy_used: Algorithm,
    pub execution_time_seconds: f64,
    pub solution_quality: u8,
    pub fallback_used: bool,
    pub fallback_reason: Option<String>,
    pub hard_constraints_satisfied: bool,
    pub violations: SoftMetrics,
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
