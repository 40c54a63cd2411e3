//! Operations exposed to collaborators.
//!
//! - [`run_allocation`]: bulk search and write-back
//! - [`validate_group_assignment`]: hard-constraint check for one manual edit
//! - [`assign_group`] / [`unassign_group`]: manual edits
//! - [`compute_current_score`]: score of whatever is persisted
//! - [`statistics`]: dashboard counts

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allocation::{ConstraintChecker, MultiStartSearch, Roster, Violation};
use crate::config::{SearchConfig, Weights};
use crate::error::{AllocationError, StoreError};
use crate::models::{Dataset, UnitKey};
use crate::scoring::PenaltyScorer;
use crate::snapshot::Snapshot;
use crate::store::{AllocationStore, NewAssignment};

/// Dashboard statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    /// Persons holding at least one assignment.
    pub persons_assigned: usize,
    /// Persons on duty.
    pub total_persons: usize,
    /// On-duty persons whose held units reach their lab load.
    pub load_met: usize,
    pub total_courses: usize,
    /// Distinct `(course, group)` units.
    pub total_units: usize,
    /// Units with at least one assigned row.
    pub assigned_units: usize,
    /// `assigned_units / total_units` as a percentage, one decimal.
    pub assignment_percentage: f64,
    /// Best search score, one decimal; only set by a run.
    pub best_score: Option<f64>,
}

/// Outcome of a manual-edit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(Violation),
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// Human-readable reason, naming the violated rule when invalid.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => f.write_str("Allocation is valid"),
            Verdict::Invalid(v) => write!(f, "{v}"),
        }
    }
}

#[inline]
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Runs a full allocation and persists the new links of the best trial.
///
/// With `clear_existing`, persisted assignments are ignored by the search
/// and replaced in the same write as the new links. No store write
/// happens unless the search succeeds.
pub fn run_allocation<S: AllocationStore>(
    store: &mut S,
    clear_existing: bool,
    config: &SearchConfig,
) -> Result<AllocationSummary, AllocationError> {
    let weights = store.weights()?;
    let mut data = store.load()?;
    if clear_existing {
        data.assignments.clear();
        for session in &mut data.sessions {
            session.assigned = false;
        }
    }

    let snapshot = Snapshot::build(&data)?;
    let outcome = MultiStartSearch::new(&snapshot, &weights)
        .with_config(config.clone())
        .run()?;

    let batch: Vec<NewAssignment> = outcome
        .roster
        .links()
        .filter(|&(_, u)| snapshot.unit(u).owner.is_none())
        .map(|(p, u)| NewAssignment::new(snapshot.person(p).id.clone(), snapshot.unit(u).key.clone()))
        .collect();

    let created = if clear_existing {
        store.replace_all(&batch)?
    } else {
        store.commit(&batch)?
    };
    info!(
        units = batch.len(),
        rows = created,
        score = outcome.score,
        "Allocation persisted"
    );

    let mut summary = statistics(&store.load()?);
    summary.best_score = Some(round1(outcome.score));
    Ok(summary)
}

/// Checks giving every row of `(course, group)` to `person`.
///
/// Load counts the person's persisted rows outside this group; the edit is
/// refused once that count reaches the lab load.
pub fn validate_group_assignment(
    data: &Dataset,
    person: &str,
    course: &str,
    group: &str,
) -> Result<Verdict, StoreError> {
    let snapshot = Snapshot::build(data)?;
    let p = snapshot
        .person_index(person)
        .ok_or_else(|| StoreError::UnknownPerson(person.to_string()))?;
    let key = UnitKey::new(course, group);
    let u = snapshot
        .unit_index(&key)
        .ok_or(StoreError::UnknownUnit(key))?;

    let candidate = &snapshot.unit(u).rows;
    let held: Vec<usize> = snapshot
        .rows_owned_by(p)
        .into_iter()
        .filter(|r| !candidate.contains(r))
        .collect();

    let capacity = snapshot.person(p).capacity;
    if held.len() >= capacity as usize {
        return Ok(Verdict::Invalid(Violation::Capacity { capacity }));
    }

    Ok(match ConstraintChecker::new(&snapshot).check_placement(p, candidate, &held) {
        Ok(()) => Verdict::Valid,
        Err(v) => Verdict::Invalid(v),
    })
}

/// Validates then applies a manual group assignment.
///
/// The store is untouched when the verdict is invalid.
pub fn assign_group<S: AllocationStore>(
    store: &mut S,
    person: &str,
    course: &str,
    group: &str,
) -> Result<Verdict, StoreError> {
    let verdict = validate_group_assignment(&store.load()?, person, course, group)?;
    if verdict.is_ok() {
        store.replace_group(person, &UnitKey::new(course, group))?;
    }
    Ok(verdict)
}

/// Removes a group's assignments. Returns the number of records removed.
pub fn unassign_group<S: AllocationStore>(
    store: &mut S,
    course: &str,
    group: &str,
) -> Result<usize, StoreError> {
    store.remove_group(&UnitKey::new(course, group))
}

/// Scores the persisted assignments, to one decimal.
///
/// Only persons holding an assignment are scored. Returns 0 when nothing is
/// persisted or the data cannot be resolved.
pub fn compute_current_score(data: &Dataset, weights: &Weights) -> f64 {
    if data.assignments.is_empty() {
        return 0.0;
    }
    let snapshot = match Snapshot::build(data) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Could not score current assignments");
            return 0.0;
        }
    };

    let roster = Roster::new(
        snapshot
            .persons()
            .map(|p| (p, snapshot.units_owned_by(p)))
            .filter(|(_, units)| !units.is_empty())
            .collect(),
    );
    if roster.is_empty() {
        return 0.0;
    }
    round1(PenaltyScorer::new(weights).score(&snapshot, &roster))
}

/// Dashboard counts over a dataset.
pub fn statistics(data: &Dataset) -> AllocationSummary {
    let persons_assigned = data
        .assignments
        .iter()
        .map(|a| a.person.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let total_persons = data.persons.iter().filter(|p| p.on_duty).count();

    let load_met = data
        .persons
        .iter()
        .filter(|p| p.on_duty)
        .filter(|p| {
            let units: BTreeSet<UnitKey> = data
                .assignments_of(&p.id)
                .filter_map(|a| data.session(&a.session))
                .map(|s| s.unit_key())
                .collect();
            units.len() >= p.capacity as usize
        })
        .count();

    let total_units = data
        .sessions
        .iter()
        .map(|s| (s.course.as_str(), s.group.as_str()))
        .collect::<BTreeSet<_>>()
        .len();
    let assigned_units = data
        .sessions
        .iter()
        .filter(|s| s.assigned)
        .map(|s| (s.course.as_str(), s.group.as_str()))
        .collect::<BTreeSet<_>>()
        .len();

    let assignment_percentage = if total_units == 0 {
        0.0
    } else {
        round1(assigned_units as f64 / total_units as f64 * 100.0)
    };

    AllocationSummary {
        persons_assigned,
        total_persons,
        load_met,
        total_courses: data.courses.len(),
        total_units,
        assigned_units,
        assignment_percentage,
        best_score: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Assignment, Availability, BlackoutSlot, Course, Day, HalfDay, Person, SessionRow,
        SpecialConstraint,
    };
    use crate::store::MemoryStore;

    fn row(id: &str, group: &str, day: &str, time: &str, weeks: &[u8]) -> SessionRow {
        SessionRow::parse(id, "CS101", group, day, time, weeks).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new()
            .with_person(Person::new("p").with_capacity(2))
            .with_course(Course::new("CS101", 2, 13))
            .with_session(row("a", "A", "MON", "1000-1200", &[1, 2, 3]))
            .with_session(row("b", "B", "MON", "1100-1300", &[3]))
            .with_session(row("c", "C", "TUE", "0900-1100", &[1]))
            .with_session(row("d", "D", "WED", "0900-1100", &[1]))
    }

    #[test]
    fn test_validate_reports_clash() {
        let data = dataset().with_assignment(Assignment::new("a", "p"));
        let verdict = validate_group_assignment(&data, "p", "CS101", "B").unwrap();
        assert!(!verdict.is_ok());
        assert_eq!(
            verdict.reason(),
            "Time clash with existing assignment on MON 1000-1200 (Teaching Wk: 1, 2, 3)"
        );

        let ok = validate_group_assignment(&data, "p", "CS101", "C").unwrap();
        assert!(ok.is_ok());
        assert_eq!(ok.reason(), "Allocation is valid");
    }

    #[test]
    fn test_validate_reports_capacity() {
        let data = dataset()
            .with_assignment(Assignment::new("c", "p"))
            .with_assignment(Assignment::new("d", "p"));
        let verdict = validate_group_assignment(&data, "p", "CS101", "A").unwrap();
        assert_eq!(verdict, Verdict::Invalid(Violation::Capacity { capacity: 2 }));

        // Re-validating a group the person already holds excludes its rows
        let verdict = validate_group_assignment(&data, "p", "CS101", "C").unwrap();
        assert!(verdict.is_ok());
    }

    #[test]
    fn test_validate_reports_days_and_blackout() {
        let data = dataset()
            .with_constraint(
                SpecialConstraint::new("p")
                    .with_availability(
                        Availability::new()
                            .with_max_days(1)
                            .with_blackout(BlackoutSlot::new(Day::Mon, HalfDay::Am)),
                    )
                    .approved(),
            )
            .with_assignment(Assignment::new("c", "p"));
        assert_eq!(
            validate_group_assignment(&data, "p", "CS101", "D").unwrap().reason(),
            "Exceeds maximum teaching days (1)"
        );

        let data = Dataset {
            assignments: Vec::new(),
            ..data
        };
        assert_eq!(
            validate_group_assignment(&data, "p", "CS101", "A").unwrap().reason(),
            "Assigned during unavailable time slot (MON-AM)"
        );
    }

    #[test]
    fn test_validate_unknown_references() {
        let data = dataset();
        assert_eq!(
            validate_group_assignment(&data, "ghost", "CS101", "A").unwrap_err(),
            StoreError::UnknownPerson("ghost".into())
        );
        assert_eq!(
            validate_group_assignment(&data, "p", "CS101", "Z").unwrap_err(),
            StoreError::UnknownUnit(UnitKey::new("CS101", "Z"))
        );
    }

    #[test]
    fn test_assign_group_only_when_valid() {
        let mut store = MemoryStore::new(dataset().with_assignment(Assignment::new("a", "p")));
        let verdict = assign_group(&mut store, "p", "CS101", "B").unwrap();
        assert!(!verdict.is_ok());
        assert!(store.dataset().assignment_for("b").is_none());

        let verdict = assign_group(&mut store, "p", "CS101", "C").unwrap();
        assert!(verdict.is_ok());
        assert_eq!(store.dataset().assignment_for("c").unwrap().person, "p");
        assert!(store.dataset().session("c").unwrap().assigned);

        assert_eq!(unassign_group(&mut store, "CS101", "C").unwrap(), 1);
        assert!(!store.dataset().session("c").unwrap().assigned);
    }

    #[test]
    fn test_current_score() {
        let weights = Weights::default();
        assert!(compute_current_score(&dataset(), &weights).abs() < 1e-10);

        let data = dataset().with_assignment(Assignment::new("c", "p"));
        // One unranked course, nothing else
        assert!((compute_current_score(&data, &weights) - 16.0 * 25.0).abs() < 1e-10);

        let broken = dataset().with_assignment(Assignment::new("zz", "p"));
        assert!(compute_current_score(&broken, &weights).abs() < 1e-10);
    }

    #[test]
    fn test_statistics() {
        let mut data = dataset()
            .with_person(Person::new("off").off_duty())
            .with_assignment(Assignment::new("c", "p"))
            .with_assignment(Assignment::new("d", "p"));
        data.sessions[2].assigned = true;
        data.sessions[3].assigned = true;

        let stats = statistics(&data);
        assert_eq!(stats.persons_assigned, 1);
        assert_eq!(stats.total_persons, 1);
        assert_eq!(stats.load_met, 1);
        assert_eq!(stats.total_courses, 1);
        assert_eq!(stats.total_units, 4);
        assert_eq!(stats.assigned_units, 2);
        assert!((stats.assignment_percentage - 50.0).abs() < 1e-10);
        assert_eq!(stats.best_score, None);

        assert!(statistics(&Dataset::new()).assignment_percentage.abs() < 1e-10);
    }

    #[test]
    fn test_run_allocation_persists_new_links() {
        let mut data = dataset().with_assignment(Assignment::new("a", "p"));
        data.sessions[0].assigned = true;
        let mut store =
            MemoryStore::new(data).with_weights(Weights::default().with_trial_count(4));
        let summary = run_allocation(&mut store, false, &SearchConfig::new().with_seed(1)).unwrap();

        let data = store.dataset();
        // Pre-existing link untouched and not duplicated
        assert_eq!(data.assignments.iter().filter(|a| a.session == "a").count(), 1);
        assert_eq!(data.assignments_of("p").count(), 2);
        for a in &data.assignments {
            assert!(data.session(&a.session).unwrap().assigned);
        }
        assert_eq!(summary.load_met, 1);
        assert!(summary.best_score.is_some());
    }

    #[test]
    fn test_run_allocation_setup_error_leaves_store() {
        let data = Dataset::new()
            .with_person(Person::new("p").off_duty())
            .with_course(Course::new("CS101", 2, 13))
            .with_session(row("a", "A", "MON", "1000-1200", &[1]))
            .with_assignment(Assignment::new("a", "p"));
        let mut store = MemoryStore::new(data);
        let err = run_allocation(&mut store, true, &SearchConfig::new()).unwrap_err();
        assert_eq!(err, AllocationError::NoEligiblePersons);
        assert_eq!(store.dataset().assignments.len(), 1);
    }
}
