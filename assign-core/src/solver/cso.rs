//! The Constraint-Satisfaction Optimizer: a deadline-bounded simulated
//! annealing local search over complete assignments.
//!
//! No MILP/CP-SAT backend is available anywhere in this crate's
//! dependency stack, so the CSO contract — hard constraints, a weighted
//! soft objective, a deadline, and well-defined failure modes — is
//! honored by an unconstrained-penalty local search instead, grounded
//! in the teacher's own `SimulatedAnnealingParams` / `StopConditions`
//! vocabulary (`models.rs`) and its per-move delta-cost evaluation
//! style (`solver/moves/swap.rs`, `solver/moves/transfer.rs`,
//! `solver/moves/clique_swap.rs`).
//!
//! Exactly-one-class and the class-size band are invariants of the move
//! operators themselves — a move is only ever generated if it preserves
//! them, so they can never be violated by construction. Separation,
//! friend-presence and cluster cohesion are enforced through heavy
//! (but finite) penalty weights during search, then checked for zero
//! violations before the solver reports success.

use super::cost::ClassStatsTracker;
use super::greedy::GreedySolver;
use super::Solver;
use crate::config::{Algorithm, Weights};
use crate::error::{EngineError, ErrorCode};
use crate::models::Assignment;
use crate::roster::Roster;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Instant;

/// Default seed used when a caller doesn't supply one — determinism is
/// part of this solver's documented contract (§5), so a fixed default
/// beats an unseeded RNG.
const DEFAULT_SEED: u64 = 0x5EED_1234_ABCD_EF00;

const INITIAL_TEMPERATURE: f64 = 12.0;
const COOLING_RATE: f64 = 0.995;
const MIN_TEMPERATURE: f64 = 0.01;
const ITERATIONS_PER_TEMPERATURE_STEP: u64 = 40;
const DEADLINE_CHECK_INTERVAL: u64 = 256;
const MAX_MOVE_GENERATION_ATTEMPTS: u32 = 24;

/// A heavy, finite penalty applied per hard-constraint violation during
/// search. Large enough that the annealer strongly prefers feasible
/// neighborhoods, but finite so a temporarily-infeasible move is never
/// rejected outright — only made unlikely to be accepted once cold.
const HARD_PENALTY: f64 = 1_000.0;

/// Constraint-satisfaction optimizer: simulated annealing with swap,
/// transfer, and clique-swap moves over a weighted penalty objective.
#[derive(Debug, Clone)]
pub struct CsoSolver {
    weights: Weights,
    seed: u64,
}

impl CsoSolver {
    /// Builds a solver using the configured objective weights and the
    /// default deterministic seed.
    pub fn new(weights: Weights) -> Self {
        CsoSolver { weights, seed: DEFAULT_SEED }
    }

    /// Builds a solver with an explicit seed, for reproducible tests or
    /// callers that want a different deterministic run.
    pub fn with_seed(weights: Weights, seed: u64) -> Self {
        CsoSolver { weights, seed }
    }
}

impl Solver for CsoSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Cso
    }

    fn solve(&self, roster: &Roster, k: usize, deadline: Instant) -> Result<Assignment, EngineError> {
        solve(roster, k, deadline, &self.weights, self.seed)
    }
}

fn solve(
    roster: &Roster,
    k: usize,
    deadline: Instant,
    weights: &Weights,
    seed: u64,
) -> Result<Assignment, EngineError> {
    let n = roster.len();
    log::debug!("cso solver: {} students into {} classes, seed={:#x}", n, k, seed);

    let band_low = n / k;
    let band_high = n.div_ceil(k);

    let conflicted_clusters = conflicted_cluster_indices(roster);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut class_of = initial_state(roster, k, band_low, band_high);
    let mut tracker = ClassStatsTracker::from_assignment(roster, &class_of, k);

    let mut current_cost = total_cost(roster, &class_of, &tracker, weights, &conflicted_clusters);
    let mut best_class_of = class_of.clone();
    let mut best_cost = current_cost;

    // With k < 2 there is only one possible assignment and no move
    // operator can ever produce a candidate (every move requires at
    // least two distinct classes) — searching would just busy-spin
    // until the deadline, so resolve immediately from the initial state.
    if k < 2 {
        log::debug!("cso solver: k={} admits no moves, resolving from the initial state", k);
        return if hard_feasible(roster, &best_class_of, &conflicted_clusters) {
            Ok(Assignment::new(best_class_of, k))
        } else {
            Err(EngineError::new(
                ErrorCode::NoSolutionFound,
                "no feasible assignment exists with a single class",
            ))
        };
    }

    let mut temperature = INITIAL_TEMPERATURE;
    let mut iterations: u64 = 0;

    loop {
        if iterations % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
            break;
        }
        iterations += 1;

        let Some(mv) = generate_move(roster, &class_of, k, band_low, band_high, &mut rng) else {
            continue;
        };

        let before = local_cost(roster, &class_of, &tracker, weights, &mv, &conflicted_clusters);
        apply_move(roster, &mut class_of, &mut tracker, &mv);
        let after = local_cost(roster, &class_of, &tracker, weights, &mv, &conflicted_clusters);
        let delta = after - before;

        let accept = delta <= 0.0 || rng.random::<f64>() < (-delta / temperature).exp();

        if accept {
            current_cost += delta;
            if current_cost < best_cost {
                best_cost = current_cost;
                best_class_of = class_of.clone();
            }
        } else {
            revert_move(roster, &mut class_of, &mut tracker, &mv);
        }

        if iterations % ITERATIONS_PER_TEMPERATURE_STEP == 0 {
            temperature = (temperature * COOLING_RATE).max(MIN_TEMPERATURE);
        }
    }

    log::debug!(
        "cso solver: ran {} iterations, best cost {:.3}",
        iterations,
        best_cost
    );

    if hard_feasible(roster, &best_class_of, &conflicted_clusters) {
        return Ok(Assignment::new(best_class_of, k));
    }

    if iterations == 0 {
        Err(EngineError::with_param(
            ErrorCode::OptimizationTimeout,
            "deadline elapsed before the optimizer could run any search iterations",
            "timeoutSeconds",
            0i64,
        ))
    } else {
        Err(EngineError::new(
            ErrorCode::NoSolutionFound,
            "search deadline reached without finding a hard-constraint-feasible assignment",
        ))
    }
}

/// A single atomic reassignment: one student moving from one class to
/// another. `swap`, `transfer`, and `clique_swap` are all expressed as a
/// small batch of these.
struct Reassignment {
    student: usize,
    from: usize,
    to: usize,
}

struct Move {
    reassignments: Vec<Reassignment>,
}

fn apply_move(roster: &Roster, class_of: &mut [usize], tracker: &mut ClassStatsTracker, mv: &Move) {
    for r in &mv.reassignments {
        class_of[r.student] = r.to;
        tracker.move_student(roster.student(r.student), r.from, r.to);
    }
}

fn revert_move(roster: &Roster, class_of: &mut [usize], tracker: &mut ClassStatsTracker, mv: &Move) {
    for r in mv.reassignments.iter().rev() {
        class_of[r.student] = r.from;
        tracker.move_student(roster.student(r.student), r.to, r.from);
    }
}

/// Builds a starting assignment: the Greedy solver's output repaired to
/// the strict size band if it overshoots, or a deterministic
/// cluster-respecting round-robin if Greedy itself fails.
fn initial_state(roster: &Roster, k: usize, band_low: usize, band_high: usize) -> Vec<usize> {
    let from_greedy = GreedySolver
        .solve(roster, k, Instant::now() + std::time::Duration::from_secs(5))
        .map(|a| a.as_slice().to_vec());

    let mut class_of = from_greedy.unwrap_or_else(|_| round_robin(roster, k));
    repair_to_band(&mut class_of, k, band_low, band_high);
    class_of
}

/// Assigns clusters (as blocks) then individual students to classes in
/// simple round-robin order — always respects the size band exactly.
fn round_robin(roster: &Roster, k: usize) -> Vec<usize> {
    let n = roster.len();
    let mut class_of = vec![usize::MAX; n];
    let mut next_class = 0usize;
    for cluster in roster.non_singleton_clusters() {
        for &member in cluster {
            class_of[member] = next_class;
        }
        next_class = (next_class + 1) % k;
    }
    for idx in 0..n {
        if class_of[idx] == usize::MAX {
            class_of[idx] = next_class;
            next_class = (next_class + 1) % k;
        }
    }
    class_of
}

/// Moves students one at a time from over-band classes to under-band
/// classes until every class size is within `[band_low, band_high]`.
fn repair_to_band(class_of: &mut [usize], k: usize, band_low: usize, band_high: usize) {
    let mut sizes = vec![0usize; k];
    for &c in class_of.iter() {
        sizes[c] += 1;
    }
    loop {
        let Some(over) = (0..k).find(|&c| sizes[c] > band_high) else { break };
        let Some(under) = (0..k).find(|&c| sizes[c] < band_low) else { break };
        let Some(idx) = class_of.iter().position(|&c| c == over) else { break };
        class_of[idx] = under;
        sizes[over] -= 1;
        sizes[under] += 1;
    }
}

/// Indices (into `roster.non_singleton_clusters()`'s iteration order) of
/// clusters that contain an internal separation pair — these can never
/// be kept together and are exempted from the cohesion requirement, the
/// same precedence rule the Greedy solver applies.
fn conflicted_cluster_indices(roster: &Roster) -> HashSet<usize> {
    roster
        .non_singleton_clusters()
        .enumerate()
        .filter(|(_, cluster)| {
            cluster
                .iter()
                .enumerate()
                .any(|(i, &a)| cluster[i + 1..].iter().any(|&b| roster.is_separated(a, b)))
        })
        .map(|(ci, _)| ci)
        .collect()
}

/// Whether every non-exempt hard constraint holds: every student has a
/// same-class friend, no separation pair is co-placed, and every
/// non-conflicted cluster is kept whole.
fn hard_feasible(roster: &Roster, class_of: &[usize], conflicted: &HashSet<usize>) -> bool {
    let zero_friend = (0..roster.len()).any(|s| {
        let neighbors = roster.neighbors(s);
        !neighbors.is_empty() && !neighbors.iter().any(|&f| class_of[f] == class_of[s])
    });
    if zero_friend {
        return false;
    }
    let separated = roster
        .separations()
        .iter()
        .any(|&(a, b)| class_of[a] == class_of[b]);
    if separated {
        return false;
    }
    roster
        .non_singleton_clusters()
        .enumerate()
        .filter(|(ci, _)| !conflicted.contains(ci))
        .all(|(_, cluster)| cluster.iter().all(|&s| class_of[s] == class_of[cluster[0]]))
}

/// Full penalty-sum cost of a complete assignment. Called once, at the
/// start of a run, to seed `current_cost`; every move thereafter is
/// scored via [`local_cost`]'s narrower recomputation.
fn total_cost(
    roster: &Roster,
    class_of: &[usize],
    tracker: &ClassStatsTracker,
    weights: &Weights,
    conflicted: &HashSet<usize>,
) -> f64 {
    let friend: f64 = (0..roster.len())
        .map(|s| friend_penalty(roster, class_of, weights, s))
        .sum();
    let separation = separation_penalty(roster, class_of);
    let cluster = cluster_penalty(roster, class_of, weights, conflicted);
    let demographic = demographic_cost(tracker, weights);
    friend + separation + cluster + demographic
}

/// Cost contribution restricted to the students touched by `mv` (plus
/// their friendship-graph neighbors, whose satisfaction fraction can
/// also change) and the handful of classes whose demographic counts
/// `mv` affects. This is what makes each iteration a delta evaluation
/// rather than a full rescore.
fn local_cost(
    roster: &Roster,
    class_of: &[usize],
    tracker: &ClassStatsTracker,
    weights: &Weights,
    mv: &Move,
    conflicted: &HashSet<usize>,
) -> f64 {
    let mut touched: HashSet<usize> = HashSet::new();
    for r in &mv.reassignments {
        touched.insert(r.student);
        touched.extend(roster.neighbors(r.student).iter().copied());
    }

    let friend: f64 = touched
        .iter()
        .map(|&s| friend_penalty(roster, class_of, weights, s))
        .sum();

    let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();
    let separation: f64 = touched
        .iter()
        .filter_map(|&s| roster.student(s).not_with.map(|partner| (s, partner)))
        .filter(|&(a, b)| seen_pairs.insert(canon(a, b)))
        .filter(|&(a, b)| class_of[a] == class_of[b])
        .count() as f64
        * HARD_PENALTY;

    let mut seen_clusters: HashSet<usize> = HashSet::new();
    let cluster: f64 = roster
        .non_singleton_clusters()
        .enumerate()
        .filter(|(ci, cluster)| {
            !conflicted.contains(ci) && cluster.iter().any(|m| touched.contains(m)) && seen_clusters.insert(*ci)
        })
        .filter(|(_, cluster)| cluster.iter().any(|&s| class_of[s] != class_of[cluster[0]]))
        .count() as f64
        * weights.w_c
        * (HARD_PENALTY / 20.0);

    let affected_classes: HashSet<usize> = mv
        .reassignments
        .iter()
        .flat_map(|r| [r.from, r.to])
        .collect();
    let demographic = demographic_cost_for_classes(tracker, weights, &affected_classes);

    friend + separation + cluster + demographic
}

fn canon(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn friend_penalty(roster: &Roster, class_of: &[usize], weights: &Weights, s: usize) -> f64 {
    let neighbors = roster.neighbors(s);
    if neighbors.is_empty() {
        return 0.0;
    }
    let class = class_of[s];
    let satisfied = neighbors.iter().filter(|&&f| class_of[f] == class).count();
    let fraction = satisfied as f64 / neighbors.len() as f64;
    let shortfall = weights.w_f * (1.0 - fraction);
    if satisfied == 0 {
        shortfall + HARD_PENALTY
    } else {
        shortfall
    }
}

fn separation_penalty(roster: &Roster, class_of: &[usize]) -> f64 {
    roster
        .separations()
        .iter()
        .filter(|&&(a, b)| class_of[a] == class_of[b])
        .count() as f64
        * HARD_PENALTY
}

fn cluster_penalty(roster: &Roster, class_of: &[usize], weights: &Weights, conflicted: &HashSet<usize>) -> f64 {
    roster
        .non_singleton_clusters()
        .enumerate()
        .filter(|(ci, _)| !conflicted.contains(ci))
        .filter(|(_, cluster)| cluster.iter().any(|&s| class_of[s] != class_of[cluster[0]]))
        .count() as f64
        * weights.w_c
        * (HARD_PENALTY / 20.0)
}

fn demographic_cost(tracker: &ClassStatsTracker, weights: &Weights) -> f64 {
    let k = tracker.k();
    let classes: Vec<usize> = (0..k).collect();
    demographic_cost_for_classes(tracker, weights, &classes.into_iter().collect())
}

/// Squared-deviation-from-uniform cost, summed only over the classes in
/// `classes` (the rest of the sum is unchanged by a move that never
/// touches them, so the caller only needs the delta over this subset).
fn demographic_cost_for_classes(tracker: &ClassStatsTracker, weights: &Weights, classes: &HashSet<usize>) -> f64 {
    let k = tracker.k();
    if k == 0 || classes.is_empty() {
        return 0.0;
    }

    let mut gender_totals = [0usize; 2];
    let mut academic_totals = [0usize; 3];
    let mut behavior_totals = [0usize; 3];
    for c in 0..k {
        let s = tracker.stats(c);
        for g in 0..2 {
            gender_totals[g] += s.gender_counts[g];
        }
        for a in 0..3 {
            academic_totals[a] += s.academic_counts[a];
            behavior_totals[a] += s.behavior_counts[a];
        }
    }

    let gender = category_cost(tracker, &gender_totals, classes, k, |s| &s.gender_counts);
    let academic = category_cost(tracker, &academic_totals, classes, k, |s| &s.academic_counts);
    let behavior = category_cost(tracker, &behavior_totals, classes, k, |s| &s.behavior_counts);

    weights.w_g * gender + weights.w_a * academic + weights.w_b * behavior
}

fn category_cost(
    tracker: &ClassStatsTracker,
    totals: &[usize],
    classes: &HashSet<usize>,
    k: usize,
    extractor: impl Fn(&super::cost::ClassStats) -> &[usize],
) -> f64 {
    let mut cost = 0.0;
    for (cat, &total) in totals.iter().enumerate() {
        let expected = total as f64 / k as f64;
        if expected <= 0.0 {
            continue;
        }
        for &c in classes {
            let actual = extractor(tracker.stats(c))[cat] as f64;
            cost += (actual - expected).powi(2);
        }
    }
    cost
}

/// Proposes one random, band-respecting move: a swap, a transfer, or
/// (when the roster has non-singleton clusters) a clique-swap that
/// relocates an entire cluster to one target class. Returns `None` if
/// no feasible move of the chosen kind could be found within a bounded
/// number of attempts — the caller simply retries on the next
/// iteration rather than stalling.
fn generate_move(
    roster: &Roster,
    class_of: &[usize],
    k: usize,
    band_low: usize,
    band_high: usize,
    rng: &mut ChaCha8Rng,
) -> Option<Move> {
    let n = roster.len();
    if n == 0 || k < 2 {
        return None;
    }
    let has_clusters = roster.non_singleton_clusters().next().is_some();
    let kind: u8 = rng.random_range(0..if has_clusters { 3u8 } else { 2u8 });

    for _ in 0..MAX_MOVE_GENERATION_ATTEMPTS {
        let candidate = match kind {
            0 => generate_swap(n, class_of, rng),
            1 => generate_transfer(n, k, class_of, class_of_sizes(class_of, k), band_low, band_high, rng),
            _ => generate_clique_swap(roster, k, class_of, band_low, band_high, rng),
        };
        if candidate.is_some() {
            return candidate;
        }
    }
    None
}

fn class_of_sizes(class_of: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; k];
    for &c in class_of {
        sizes[c] += 1;
    }
    sizes
}

fn generate_swap(n: usize, class_of: &[usize], rng: &mut ChaCha8Rng) -> Option<Move> {
    let i = rng.random_range(0..n);
    let j = rng.random_range(0..n);
    if i == j || class_of[i] == class_of[j] {
        return None;
    }
    Some(Move {
        reassignments: vec![
            Reassignment { student: i, from: class_of[i], to: class_of[j] },
            Reassignment { student: j, from: class_of[j], to: class_of[i] },
        ],
    })
}

fn generate_transfer(
    n: usize,
    k: usize,
    class_of: &[usize],
    sizes: Vec<usize>,
    band_low: usize,
    band_high: usize,
    rng: &mut ChaCha8Rng,
) -> Option<Move> {
    let student = rng.random_range(0..n);
    let from = class_of[student];
    let to = rng.random_range(0..k);
    if to == from {
        return None;
    }
    if sizes[from] - 1 < band_low || sizes[to] + 1 > band_high {
        return None;
    }
    Some(Move {
        reassignments: vec![Reassignment { student, from, to }],
    })
}

fn generate_clique_swap(
    roster: &Roster,
    k: usize,
    class_of: &[usize],
    band_low: usize,
    band_high: usize,
    rng: &mut ChaCha8Rng,
) -> Option<Move> {
    let clusters: Vec<&Vec<usize>> = roster.non_singleton_clusters().collect();
    if clusters.is_empty() {
        return None;
    }
    let cluster = clusters[rng.random_range(0..clusters.len())];
    let target = rng.random_range(0..k);

    let reassignments: Vec<Reassignment> = cluster
        .iter()
        .filter(|&&s| class_of[s] != target)
        .map(|&s| Reassignment { student: s, from: class_of[s], to: target })
        .collect();
    if reassignments.is_empty() {
        return None;
    }

    let mut sizes = class_of_sizes(class_of, k);
    for r in &reassignments {
        sizes[r.from] -= 1;
    }
    sizes[target] += reassignments.len();
    let sources_ok = reassignments.iter().all(|r| sizes[r.from] >= band_low || r.from == target);
    if !sources_ok || sizes[target] > band_high {
        return None;
    }

    Some(Move { reassignments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Level, RawRoster, RawStudent};
    use crate::validator::validate;
    use std::time::Duration;

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
    fn scenario_a_trivial_balanced() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"]),
                student("B", &["A"]),
                student("C", &["D"]),
                student("D", &["C"]),
            ],
        };
        let roster = validate(&raw, 2, 2).unwrap();
        let solver = CsoSolver::new(Weights::default());
        let assignment = solver
            .solve(&roster, 2, Instant::now() + Duration::from_secs(2))
            .unwrap();
        let a = roster.index_of("A").unwrap();
        let b = roster.index_of("B").unwrap();
        let c = roster.index_of("C").unwrap();
        let d = roster.index_of("D").unwrap();
        assert_eq!(assignment.class_of(a), assignment.class_of(b));
        assert_eq!(assignment.class_of(c), assignment.class_of(d));
    }

    #[test]
    fn respects_the_size_band() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B", "C"]),
                student("B", &["A"]),
                student("C", &["A", "D"]),
                student("D", &["C"]),
                student("E", &["F"]),
                student("F", &["E"]),
            ],
        };
        let roster = validate(&raw, 3, 2).unwrap();
        let solver = CsoSolver::new(Weights::default());
        let assignment = solver
            .solve(&roster, 3, Instant::now() + Duration::from_secs(2))
            .unwrap();
        let sizes = assignment.class_sizes();
        assert!(sizes.iter().all(|&s| s == 2));
    }

    #[test]
    fn scenario_d_infeasible_friend_graph_reports_no_solution() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"]),
                student("B", &["A"]),
                student("C", &["A"]),
            ],
        };
        let roster = validate(&raw, 3, 1).unwrap();
        let solver = CsoSolver::new(Weights::default());
        let err = solver
            .solve(&roster, 3, Instant::now() + Duration::from_millis(200))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoSolutionFound);
    }

    #[test]
    fn deterministic_for_a_fixed_seed() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B", "C"]),
                student("B", &["A"]),
                student("C", &["A", "D"]),
                student("D", &["C"]),
            ],
        };
        let roster = validate(&raw, 2, 2).unwrap();
        let solver = CsoSolver::with_seed(Weights::default(), 42);
        let first = solver
            .solve(&roster, 2, Instant::now() + Duration::from_millis(500))
            .unwrap();
        let second = solver
            .solve(&roster, 2, Instant::now() + Duration::from_millis(500))
            .unwrap();
        assert_eq!(first.as_slice(), second.as_slice());
    }
}
