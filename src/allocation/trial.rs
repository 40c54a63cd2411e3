//! Working state of one search trial.

use tracing::trace;

use super::{find_pairs, ConstraintChecker};
use crate::snapshot::{CourseIndex, PersonIndex, Snapshot, UnitIndex};

/// The unit pool and per-person holdings while one trial runs.
///
/// The pool keeps a fixed iteration order; taking a unit only flags it as
/// unavailable, so a rolled-back unit returns to its original position.
#[derive(Debug, Clone)]
pub struct Trial<'a> {
    snapshot: &'a Snapshot,
    checker: ConstraintChecker<'a>,
    order: Vec<UnitIndex>,
    available: Vec<bool>,
    held: Vec<Vec<UnitIndex>>,
}

impl<'a> Trial<'a> {
    /// Starts a trial over the units in `order`, with each person holding
    /// `base[person]`.
    pub fn new(snapshot: &'a Snapshot, order: Vec<UnitIndex>, base: &[Vec<UnitIndex>]) -> Self {
        let mut available = vec![false; snapshot.unit_count()];
        for &u in &order {
            available[u.0] = true;
        }
        let mut held = vec![Vec::new(); snapshot.person_count()];
        for (slot, units) in held.iter_mut().zip(base) {
            slot.clone_from(units);
        }
        Self {
            snapshot,
            checker: ConstraintChecker::new(snapshot),
            order,
            available,
            held,
        }
    }

    #[inline]
    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    /// Units `person` holds, in the order they were taken.
    #[inline]
    pub fn held(&self, person: PersonIndex) -> &[UnitIndex] {
        &self.held[person.0]
    }

    #[inline]
    pub fn is_available(&self, unit: UnitIndex) -> bool {
        self.available[unit.0]
    }

    /// Unused lab load, in units.
    pub fn remaining(&self, person: PersonIndex) -> usize {
        (self.snapshot.person(person).capacity as usize).saturating_sub(self.held(person).len())
    }

    #[inline]
    pub fn is_full(&self, person: PersonIndex) -> bool {
        self.remaining(person) == 0
    }

    /// Available units, in pool order.
    pub fn available_units(&self) -> Vec<UnitIndex> {
        self.order
            .iter()
            .copied()
            .filter(|&u| self.available[u.0])
            .collect()
    }

    /// Available units of one course, in pool order.
    pub fn course_units(&self, course: CourseIndex) -> Vec<UnitIndex> {
        self.order
            .iter()
            .copied()
            .filter(|&u| self.available[u.0] && self.snapshot.unit(u).course == course)
            .collect()
    }

    /// Odd/even pairs among `units`.
    pub fn pairs_among(&self, units: &[UnitIndex]) -> Vec<(UnitIndex, UnitIndex)> {
        find_pairs(units.iter().map(|&u| {
            let (day, time, weeks) = self.snapshot.unit_slot(u);
            (u, day, time, weeks)
        }))
    }

    /// Gives `unit` to `person` if it is available and admissible.
    pub fn try_assign(&mut self, person: PersonIndex, unit: UnitIndex) -> bool {
        if !self.available[unit.0] {
            return false;
        }
        if let Err(violation) = self.checker.check(person, unit, &self.held[person.0]) {
            trace!(
                person = %self.snapshot.person(person).id,
                unit = %self.snapshot.unit(unit).key,
                %violation,
                "Rejected"
            );
            return false;
        }
        self.available[unit.0] = false;
        self.held[person.0].push(unit);
        trace!(
            person = %self.snapshot.person(person).id,
            unit = %self.snapshot.unit(unit).key,
            "Assigned"
        );
        true
    }

    /// Gives both units of a pair to `person`, or neither.
    pub fn try_assign_pair(&mut self, person: PersonIndex, pair: (UnitIndex, UnitIndex)) -> bool {
        if !self.try_assign(person, pair.0) {
            return false;
        }
        if self.try_assign(person, pair.1) {
            return true;
        }
        self.held[person.0].pop();
        self.available[pair.0 .0] = true;
        false
    }

    /// Final holdings of `persons`, in that order.
    pub fn into_roster(self, persons: &[PersonIndex]) -> Roster {
        let mut held = self.held;
        Roster {
            entries: persons
                .iter()
                .map(|&p| (p, std::mem::take(&mut held[p.0])))
                .collect(),
        }
    }
}

/// A complete candidate solution: each searched person with the units
/// they hold, including pre-existing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<(PersonIndex, Vec<UnitIndex>)>,
}

impl Roster {
    pub fn new(entries: Vec<(PersonIndex, Vec<UnitIndex>)>) -> Self {
        Self { entries }
    }

    /// `(person, units)` in person-priority order.
    pub fn iter(&self) -> impl Iterator<Item = (PersonIndex, &[UnitIndex])> + '_ {
        self.entries.iter().map(|(p, u)| (*p, u.as_slice()))
    }

    /// Every `(person, unit)` link.
    pub fn links(&self) -> impl Iterator<Item = (PersonIndex, UnitIndex)> + '_ {
        self.entries
            .iter()
            .flat_map(|(p, units)| units.iter().map(move |&u| (*p, u)))
    }

    pub fn units_of(&self, person: PersonIndex) -> &[UnitIndex] {
        self.entries
            .iter()
            .find(|(p, _)| *p == person)
            .map(|(_, u)| u.as_slice())
            .unwrap_or(&[])
    }

    /// Number of persons covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
