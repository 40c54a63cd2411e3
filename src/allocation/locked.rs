//! Locked-request pre-pass.
//!
//! Approved course locks are honoured before the general search so that
//! pre-committed persons are not starved by it. For each lock the person
//! first takes odd/even pairs of the locked course while at least two
//! units are still owed, then single units until the count is met.

use tracing::debug;

use super::Trial;
use crate::snapshot::PersonIndex;

/// Applies every approved lock whose person is in `persons`.
pub fn assign_locked(trial: &mut Trial<'_>, persons: &[PersonIndex]) {
    let snapshot = trial.snapshot();
    for lock in snapshot.locks() {
        if !persons.contains(&lock.person) {
            continue;
        }
        let person = lock.person;
        let mut owed = lock.unit_count as usize;
        let units = trial.course_units(lock.course);

        for pair in trial.pairs_among(&units) {
            if owed <= 1 {
                break;
            }
            if trial.try_assign_pair(person, pair) {
                owed -= 2;
            }
        }

        for unit in units {
            if owed == 0 {
                break;
            }
            if trial.try_assign(person, unit) {
                owed -= 1;
            }
        }

        if owed > 0 {
            debug!(
                person = %snapshot.person(person).id,
                course = %snapshot.course(lock.course).id,
                owed,
                "Course lock only partly met"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Dataset, Person, SessionRow, SpecialConstraint, UnitKey};
    use crate::snapshot::{Snapshot, UnitIndex};

    fn row(id: &str, course: &str, group: &str, day: &str, time: &str, weeks: &[u8]) -> SessionRow {
        SessionRow::parse(id, course, group, day, time, weeks).unwrap()
    }

    fn dataset(lock_count: u32, approved: bool) -> Dataset {
        let lock = SpecialConstraint::new("p").with_lock("CS101", lock_count);
        Dataset::new()
            .with_person(Person::new("p").with_capacity(4))
            .with_course(Course::new("CS101", 2, 13))
            .with_course(Course::new("CS102", 2, 13))
            .with_session(row("x", "CS102", "X", "FRI", "0800-1000", &[1]))
            .with_session(row("s", "CS101", "S", "TUE", "0800-1000", &[1, 2]))
            .with_session(row("o", "CS101", "O", "MON", "1000-1200", &[1, 3, 5]))
            .with_session(row("e", "CS101", "E", "MON", "1000-1200", &[2, 4, 6]))
            .with_constraint(if approved { lock.approved() } else { lock })
    }

    fn unit(snap: &Snapshot, course: &str, group: &str) -> UnitIndex {
        snap.unit_index(&UnitKey::new(course, group)).unwrap()
    }

    #[test]
    fn test_lock_takes_pair_first() {
        let snap = Snapshot::build(&dataset(2, true)).unwrap();
        let mut trial = Trial::new(&snap, snap.units().collect(), &[]);
        let p = PersonIndex(0);
        assign_locked(&mut trial, &[p]);

        assert_eq!(
            trial.held(p),
            &[unit(&snap, "CS101", "O"), unit(&snap, "CS101", "E")]
        );
    }

    #[test]
    fn test_lock_single_unit_skips_pairing() {
        let snap = Snapshot::build(&dataset(1, true)).unwrap();
        let mut trial = Trial::new(&snap, snap.units().collect(), &[]);
        let p = PersonIndex(0);
        assign_locked(&mut trial, &[p]);

        // Natural order: S is the first CS101 unit
        assert_eq!(trial.held(p), &[unit(&snap, "CS101", "S")]);
    }

    #[test]
    fn test_lock_stops_at_requested_count() {
        let snap = Snapshot::build(&dataset(3, true)).unwrap();
        let mut trial = Trial::new(&snap, snap.units().collect(), &[]);
        let p = PersonIndex(0);
        assign_locked(&mut trial, &[p]);

        assert_eq!(trial.held(p).len(), 3);
        assert!(trial.is_available(unit(&snap, "CS102", "X")));
    }

    #[test]
    fn test_unapproved_or_ineligible_lock_ignored() {
        let snap = Snapshot::build(&dataset(2, false)).unwrap();
        let mut trial = Trial::new(&snap, snap.units().collect(), &[]);
        assign_locked(&mut trial, &[PersonIndex(0)]);
        assert!(trial.held(PersonIndex(0)).is_empty());

        let snap = Snapshot::build(&dataset(2, true)).unwrap();
        let mut trial = Trial::new(&snap, snap.units().collect(), &[]);
        assign_locked(&mut trial, &[]);
        assert!(trial.held(PersonIndex(0)).is_empty());
    }
}
