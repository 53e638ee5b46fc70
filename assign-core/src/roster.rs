//! The validated, immutable roster model and its derived indexes.
//!
//! A [`Roster`] is never constructed directly from caller input — it is
//! produced by [`crate::validator::validate`], which performs the
//! ordered precondition checks of §4.1 before interning names to dense
//! indices and building the friendship graph, separation set, and
//! cluster partition described in §3. This mirrors the teacher's
//! `State::new` (`solver-core/src/solver/construction.rs`), which
//! likewise folds validation and index construction into one pass
//! rather than validating a second time after the fact.

use crate::models::{Gender, Level};
use std::collections::{HashMap, HashSet};

/// A single, normalized student record, indexed by position in the
/// roster's student vector.
#[derive(Debug, Clone)]
pub struct Student {
    pub name: String,
    pub school: String,
    pub gender: Gender,
    pub academic: Level,
    pub behavior: Level,
    /// Normalized friend indices: self-references and duplicates removed,
    /// dangling names already rejected by the validator.
    pub friends: Vec<usize>,
    /// Normalized separation partner index, if any.
    pub not_with: Option<usize>,
    pub cluster_id: Option<u32>,
    pub comments: String,
}

/// The validated roster: students plus the derived friendship graph,
/// separation set, and cluster partition used by every solver and the
/// evaluator.
#[derive(Debug, Clone)]
pub struct Roster {
    students: Vec<Student>,
    name_to_idx: HashMap<String, usize>,
    /// Undirected friendship graph `G`, symmetric closure, no self-loops
    /// or parallel edges: `graph[i]` is the sorted, deduplicated set of
    /// indices adjacent to student `i`.
    graph: Vec<Vec<usize>>,
    /// Separation pairs `{a, b}`, canonicalized so `a < b`.
    separations: Vec<(usize, usize)>,
    separation_set: HashSet<(usize, usize)>,
    /// Cluster groups sharing a non-absent `cluster_id`, in ascending
    /// `cluster_id` order. Singleton clusters are included; callers that
    /// care about cohesion (the Greedy/CSO solvers) filter those out
    /// themselves since a singleton cluster has no cohesion constraint.
    clusters: Vec<Vec<usize>>,
}

/// Canonicalizes an unordered pair so the smaller index comes first.
fn canon_pair(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Roster {
    /// Builds a roster's derived indexes from already-normalized student
    /// records (friend/not-with fields already resolved to indices,
    /// deduplicated, and self-reference-free).
    ///
    /// This is `pub(crate)` because only the validator is allowed to
    /// produce a `Roster`: every hard precondition in §4.1 must have
    /// already been checked against the raw input.
    pub(crate) fn from_normalized(students: Vec<Student>, name_to_idx: HashMap<String, usize>) -> Self {
        let n = students.len();
        let mut graph: Vec<HashSet<usize>> = vec![HashSet::new(); n];
        for (i, student) in students.iter().enumerate() {
            for &j in &student.friends {
                if i != j {
                    graph[i].insert(j);
                    graph[j].insert(i);
                }
            }
        }
        let graph: Vec<Vec<usize>> = graph
            .into_iter()
            .map(|neighbors| {
                let mut v: Vec<usize> = neighbors.into_iter().collect();
                v.sort_unstable();
                v
            })
            .collect();

        let mut separation_set = HashSet::new();
        for (i, student) in students.iter().enumerate() {
            if let Some(j) = student.not_with {
                separation_set.insert(canon_pair(i, j));
            }
        }
        let mut separations: Vec<(usize, usize)> = separation_set.iter().copied().collect();
        separations.sort_unstable();

        let mut cluster_groups: HashMap<u32, Vec<usize>> = HashMap::new();
        for (i, student) in students.iter().enumerate() {
            if let Some(cid) = student.cluster_id {
                cluster_groups.entry(cid).or_default().push(i);
            }
        }
        let mut cluster_ids: Vec<u32> = cluster_groups.keys().copied().collect();
        cluster_ids.sort_unstable();
        let clusters = cluster_ids
            .into_iter()
            .map(|cid| cluster_groups.remove(&cid).unwrap())
            .collect();

        Roster {
            students,
            name_to_idx,
            graph,
            separations,
            separation_set,
            clusters,
        }
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn student(&self, idx: usize) -> &Student {
        &self.students[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_idx.get(name).copied()
    }

    pub fn name_of(&self, idx: usize) -> &str {
        &self.students[idx].name
    }

    /// Friends of student `idx` in the symmetric closure of `G`.
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.graph[idx]
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.graph[idx].len()
    }

    /// All separation pairs, canonicalized `a < b`.
    pub fn separations(&self) -> &[(usize, usize)] {
        &self.separations
    }

    /// Whether `{a, b}` is a separation pair.
    pub fn is_separated(&self, a: usize, b: usize) -> bool {
        self.separation_set.contains(&canon_pair(a, b))
    }

    /// Cluster groups, in ascending `cluster_id` order. Includes
    /// singleton clusters.
    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Clusters containing at least two students — the ones cohesion
    /// constraints actually apply to.
    pub fn non_singleton_clusters(&self) -> impl Iterator<Item = &Vec<usize>> {
        self.clusters.iter().filter(|c| c.len() > 1)
    }
}
