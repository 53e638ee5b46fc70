//! Shared test utilities for assign-core integration tests.

use assign_core::models::{Gender, Level, RawRoster, RawStudent};

#[allow(dead_code)]
pub fn student(name: &str, friends: &[&str]) -> RawStudent {
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

#[allow(dead_code)]
pub fn student_full(
    name: &str,
    gender: Gender,
    academic: Level,
    behavior: Level,
    friends: &[&str],
    not_with: Option<&str>,
    cluster_id: Option<u32>,
) -> RawStudent {
    RawStudent {
        name: name.to_string(),
        school: String::new(),
        gender,
        academic,
        behavior,
        friends: friends.iter().map(|s| s.to_string()).collect(),
        not_with: not_with.map(|s| s.to_string()),
        cluster_id,
        comments: String::new(),
    }
}

/// Builds a roster of `n` students named `p0..p{n-1}`, each friends with
/// the next student in a ring (`p0`-`p1`, `p1`-`p2`, ..., wrapping
/// around), so the friendship graph is always connected.
#[allow(dead_code)]
pub fn ring_roster(n: usize) -> RawRoster {
    let names: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
    let students = (0..n)
        .map(|i| {
            let next = &names[(i + 1) % n];
            student(&names[i], &[next])
        })
        .collect();
    RawRoster { students }
}

/// Builds a roster of `n` students with no friends, separations, or
/// clusters at all.
#[allow(dead_code)]
pub fn bare_roster(n: usize) -> RawRoster {
    let students = (0..n).map(|i| student(&format!("p{i}"), &[])).collect();
    RawRoster { students }
}

/// Asserts every student index `0..n` appears in exactly one class of
/// `classes`, and that no class is empty.
#[allow(dead_code)]
pub fn assert_is_a_partition(classes: &[Vec<String>], expected_students: &[String]) {
    let mut seen = std::collections::HashSet::new();
    for class in classes {
        for name in class {
            assert!(
                seen.insert(name.clone()),
                "student {name} appears in more than one class"
            );
        }
    }
    let expected: std::collections::HashSet<_> = expected_students.iter().cloned().collect();
    assert_eq!(seen, expected, "assignment does not cover exactly the roster");
}
