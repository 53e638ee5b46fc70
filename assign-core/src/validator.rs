//! Input validator.
//!
//! Runs the ordered, cheap, deterministic precondition checks of §4.1
//! before any solver sees the roster. Each failure short-circuits with a
//! single structured [`EngineError`] — the first failing precondition
//! wins, there is no multi-error aggregation. On success, returns the
//! fully normalized, index-built [`Roster`].
//!
//! Grounded in the teacher's `State::new` (`construction.rs`), which
//! likewise performs validation and index construction as a single
//! pass rather than validating twice.

use crate::error::{EngineError, ErrorCode};
use crate::models::RawRoster;
use crate::roster::{Roster, Student};
use std::collections::{HashMap, HashSet};

/// Runs every ordered precondition check and, on success, builds the
/// validated [`Roster`].
///
/// # Errors
///
/// Returns the first failing check's [`EngineError`], in the order
/// listed in §4.1 of the design: empty roster, missing required
/// fields, duplicate names, invalid `k`, friendless students, unknown
/// friend/separation names, then isolated students.
pub fn validate(raw: &RawRoster, k: usize, min_class_size: usize) -> Result<Roster, EngineError> {
    log::debug!(
        "validating roster of {} students for k={}, min_class_size={}",
        raw.students.len(),
        k,
        min_class_size
    );

    // 1. Non-empty roster.
    if raw.students.is_empty() {
        return Err(EngineError::with_param(
            ErrorCode::EmptyStudentData,
            "roster contains no students",
            "count",
            0usize,
        ));
    }

    // 2. Required fields present per student.
    //
    // `gender`, `academic`, and `behavior` are non-optional typed fields,
    // so a record that deserialized successfully already has them; the
    // only field that can be present-but-invalid at this layer is an
    // empty `name`.
    for student in &raw.students {
        if student.name.trim().is_empty() {
            return Err(EngineError::with_param(
                ErrorCode::MissingRequiredFields,
                "a student record is missing a name",
                "fields",
                vec!["name".to_string()],
            ));
        }
    }

    // 3. Unique names.
    let mut name_to_idx: HashMap<String, usize> = HashMap::new();
    let mut duplicates: Vec<String> = Vec::new();
    let mut seen_duplicate: HashSet<String> = HashSet::new();
    for (idx, student) in raw.students.iter().enumerate() {
        if name_to_idx.insert(student.name.clone(), idx).is_some() {
            if seen_duplicate.insert(student.name.clone()) {
                duplicates.push(student.name.clone());
            }
        }
    }
    if !duplicates.is_empty() {
        duplicates.sort();
        return Err(EngineError::with_param(
            ErrorCode::DuplicateStudentNames,
            "roster contains duplicate student names",
            "duplicates",
            duplicates,
        ));
    }

    let n = raw.students.len();

    // 4. K validation.
    if k == 0 {
        return Err(EngineError::with_param(
            ErrorCode::InvalidClassCount,
            "class count must be a positive integer",
            "classesNumber",
            k,
        ));
    }
    if k > n {
        return Err(EngineError::with_param(
            ErrorCode::TooManyClasses,
            "class count exceeds the number of students",
            "classesNumber",
            k,
        )
        .param("studentCount", n));
    }
    if n / k < min_class_size {
        return Err(EngineError::with_param(
            ErrorCode::ClassSizeTooSmall,
            "average class size would fall below the configured minimum",
            "averageClassSize",
            (n / k) as i64,
        )
        .param("minClassSize", min_class_size));
    }

    // Normalize friend/not-with fields: drop self-references and
    // duplicate entries before the friend-related checks run.
    let normalized_friends: Vec<Vec<String>> = raw
        .students
        .iter()
        .map(|s| normalize_names(&s.name, &s.friends))
        .collect();
    let normalized_not_with: Vec<Option<String>> = raw
        .students
        .iter()
        .map(|s| match &s.not_with {
            Some(n) if n != &s.name => Some(n.clone()),
            _ => None,
        })
        .collect();

    // 5. Each student lists at least one friend.
    for (idx, student) in raw.students.iter().enumerate() {
        if normalized_friends[idx].is_empty() {
            return Err(EngineError::with_param(
                ErrorCode::StudentNoFriends,
                "student lists no friends",
                "studentName",
                student.name.clone(),
            ));
        }
    }

    // 6. Every listed friend/not-with name exists in the roster.
    for (idx, student) in raw.students.iter().enumerate() {
        for friend_name in &normalized_friends[idx] {
            if !name_to_idx.contains_key(friend_name) {
                return Err(EngineError::with_param(
                    ErrorCode::UnknownFriend,
                    "student lists a friend not present in the roster",
                    "studentName",
                    student.name.clone(),
                )
                .param("friendName", friend_name.clone()));
            }
        }
        if let Some(partner) = &normalized_not_with[idx] {
            if !name_to_idx.contains_key(partner) {
                return Err(EngineError::with_param(
                    ErrorCode::UnknownFriend,
                    "student's separation partner is not present in the roster",
                    "studentName",
                    student.name.clone(),
                )
                .param("friendName", partner.clone()));
            }
        }
    }

    // Build the normalized, index-based student records.
    let students: Vec<Student> = raw
        .students
        .iter()
        .enumerate()
        .map(|(idx, s)| Student {
            name: s.name.clone(),
            school: s.school.clone(),
            gender: s.gender,
            academic: s.academic,
            behavior: s.behavior,
            friends: normalized_friends[idx]
                .iter()
                .map(|name| name_to_idx[name])
                .collect(),
            not_with: normalized_not_with[idx]
                .as_ref()
                .map(|name| name_to_idx[name]),
            cluster_id: s.cluster_id,
            comments: s.comments.clone(),
        })
        .collect();

    let roster = Roster::from_normalized(students, name_to_idx);

    // 7. No isolated student in G after symmetric closure.
    let isolated: Vec<String> = (0..roster.len())
        .filter(|&idx| roster.degree(idx) == 0)
        .map(|idx| roster.name_of(idx).to_string())
        .collect();
    if !isolated.is_empty() {
        return Err(EngineError::with_param(
            ErrorCode::IsolatedStudents,
            "roster contains students with no friend in the symmetric friendship graph",
            "students",
            isolated,
        ));
    }

    log::debug!(
        "roster validated: {} students, {} separation pairs, {} clusters",
        roster.len(),
        roster.separations().len(),
        roster.clusters().len()
    );
    Ok(roster)
}

/// Removes self-references and duplicate entries from a friend list,
/// preserving first-occurrence order.
fn normalize_names(owner_name: &str, names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for name in names {
        if name == owner_name {
            continue;
        }
        if seen.insert(name.clone()) {
            result.push(name.clone());
        }
    }
    result
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
    fn rejects_empty_roster() {
        let raw = RawRoster { students: vec![] };
        let err = validate(&raw, 1, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyStudentData);
    }

    #[test]
    fn rejects_duplicate_names() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"]),
                student("B", &["A"]),
                student("A", &["B"]),
            ],
        };
        let err = validate(&raw, 1, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateStudentNames);
    }

    #[test]
    fn rejects_too_many_classes() {
        let raw = RawRoster {
            students: vec![student("A", &["B"]), student("B", &["A"])],
        };
        let err = validate(&raw, 3, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooManyClasses);
    }

    #[test]
    fn rejects_class_size_too_small() {
        let raw = RawRoster {
            students: vec![student("A", &["B"]), student("B", &["A"])],
        };
        let err = validate(&raw, 2, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::ClassSizeTooSmall);
    }

    #[test]
    fn rejects_student_with_no_friends() {
        let raw = RawRoster {
            students: vec![student("A", &[]), student("B", &["A"])],
        };
        let err = validate(&raw, 1, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::StudentNoFriends);
    }

    #[test]
    fn rejects_unknown_friend() {
        let raw = RawRoster {
            students: vec![student("A", &["Ghost"]), student("B", &["A"])],
        };
        let err = validate(&raw, 1, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFriend);
    }

    #[test]
    fn rejects_self_only_friend_as_isolated() {
        // "A" lists only itself; normalization drops the self-reference,
        // which then fails at STUDENT_NO_FRIENDS before ever reaching
        // the isolation check — the documented behavior for the open
        // question in §9.
        let raw = RawRoster {
            students: vec![student("A", &["A"]), student("B", &["B"])],
        };
        let err = validate(&raw, 1, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::StudentNoFriends);
    }

    #[test]
    fn accepts_valid_roster() {
        let raw = RawRoster {
            students: vec![
                student("A", &["B"]),
                student("B", &["A"]),
                student("C", &["D"]),
                student("D", &["C"]),
            ],
        };
        let roster = validate(&raw, 2, 2).expect("valid roster should pass");
        assert_eq!(roster.len(), 4);
    }
}
