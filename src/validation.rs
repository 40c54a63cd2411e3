//! Input validation for allocation datasets.
//!
//! Checks structural integrity of persons, courses, sessions, requests,
//! and assignments before a run. Detects:
//! - Duplicate IDs
//! - References to unknown persons, courses, or sessions
//! - Preference ranks outside 1..=8 and repeated preferences
//! - More than one special request per person
//! - Sessions with no teaching weeks
//! - Assignment records out of step with `assigned` flags
//! - Units whose rows are held by different persons

use std::collections::{HashMap, HashSet};

use crate::models::{Dataset, Preference, UnitKey};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A record references a person that doesn't exist.
    UnknownPerson,
    /// A record references a course that doesn't exist.
    UnknownCourse,
    /// An assignment references a session that doesn't exist.
    UnknownSession,
    /// A preference rank lies outside 1..=8.
    InvalidRank,
    /// A person ranks the same course twice.
    DuplicatePreference,
    /// A person has more than one special request.
    DuplicateRequest,
    /// A session runs in no teaching week.
    EmptyWeeks,
    /// A session has more than one assignment.
    DuplicateAssignment,
    /// A session's `assigned` flag disagrees with its assignment records.
    InconsistentFlag,
    /// Rows of one unit are held by different persons.
    SplitUnit,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a dataset before allocation.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(data: &Dataset) -> ValidationResult {
    let mut errors = Vec::new();

    let mut person_ids = HashSet::new();
    for p in &data.persons {
        if !person_ids.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate person ID: {}", p.id),
            ));
        }
    }

    let mut course_ids = HashSet::new();
    for c in &data.courses {
        if !course_ids.insert(c.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate course ID: {}", c.id),
            ));
        }
    }

    let mut session_ids = HashSet::new();
    for s in &data.sessions {
        if !session_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate session ID: {}", s.id),
            ));
        }
        if !course_ids.contains(s.course.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownCourse,
                format!("Session '{}' references unknown course '{}'", s.id, s.course),
            ));
        }
        if s.weeks.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyWeeks,
                format!("Session '{}' has no teaching weeks", s.id),
            ));
        }
    }

    // Special requests
    let mut requesters = HashSet::new();
    for c in &data.constraints {
        if !person_ids.contains(c.person.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownPerson,
                format!("Special request references unknown person '{}'", c.person),
            ));
        }
        if !requesters.insert(c.person.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateRequest,
                format!("Person '{}' has more than one special request", c.person),
            ));
        }
        if let Some(lock) = &c.lock {
            if !course_ids.contains(lock.course.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownCourse,
                    format!(
                        "Course lock for '{}' references unknown course '{}'",
                        c.person, lock.course
                    ),
                ));
            }
        }
    }

    // Preferences
    let mut ranked = HashSet::new();
    for pref in &data.preferences {
        check_preference(pref, &person_ids, &course_ids, &mut errors);
        if !ranked.insert((pref.person.as_str(), pref.course.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicatePreference,
                format!("Person '{}' ranks course '{}' twice", pref.person, pref.course),
            ));
        }
    }

    // Assignments
    let mut holders: HashMap<&str, &str> = HashMap::new();
    for a in &data.assignments {
        if !person_ids.contains(a.person.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownPerson,
                format!("Assignment references unknown person '{}'", a.person),
            ));
        }
        if !session_ids.contains(a.session.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownSession,
                format!("Assignment references unknown session '{}'", a.session),
            ));
        }
        if holders.insert(a.session.as_str(), a.person.as_str()).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateAssignment,
                format!("Session '{}' is assigned more than once", a.session),
            ));
        }
    }

    let mut unit_holder: HashMap<UnitKey, &str> = HashMap::new();
    for s in &data.sessions {
        let holder = holders.get(s.id.as_str()).copied();
        if s.assigned != holder.is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentFlag,
                format!(
                    "Session '{}' is flagged {} but has {} assignment",
                    s.id,
                    if s.assigned { "assigned" } else { "unassigned" },
                    if holder.is_some() { "an" } else { "no" }
                ),
            ));
        }
        if let Some(person) = holder {
            let key = s.unit_key();
            match unit_holder.get(&key) {
                Some(&other) if other != person => {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::SplitUnit,
                        format!("Lab group '{key}' is split between '{other}' and '{person}'"),
                    ));
                }
                Some(_) => {}
                None => {
                    unit_holder.insert(key, person);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_preference(
    pref: &Preference,
    person_ids: &HashSet<&str>,
    course_ids: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    if !person_ids.contains(pref.person.as_str()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownPerson,
            format!("Preference references unknown person '{}'", pref.person),
        ));
    }
    if !course_ids.contains(pref.course.as_str()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownCourse,
            format!("Preference references unknown course '{}'", pref.course),
        ));
    }
    if !pref.is_valid_rank() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidRank,
            format!(
                "Preference of '{}' for '{}' has rank {} (expected 1-8)",
                pref.person, pref.course, pref.rank
            ),
        ));
    }
}
