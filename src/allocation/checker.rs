//! Hard-constraint checker.
//!
//! # Rules
//!
//! Checked in order, first failure wins:
//!
//! 1. **Capacity**: held units plus the candidate's rows must not exceed
//!    the person's lab load.
//! 2. **Time clash**: no candidate row may share a day, an overlapping
//!    clock range, and an overlapping week set with a held row.
//! 3. **Teaching days**: with an approved availability limit, the new
//!    distinct days must not push the total past `max_teaching_days`.
//! 4. **Blackout**: with an approved availability limit, no candidate row
//!    may start in a blacked-out half-day.

use std::collections::BTreeSet;
use std::fmt;

use crate::models::{BlackoutSlot, Day, TimeRange, WeekSet};
use crate::snapshot::{PersonIndex, Snapshot, UnitIndex};

/// Why a placement is inadmissible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The person's lab load would be exceeded.
    Capacity { capacity: u32 },
    /// A held row meets at the same time in a shared week.
    TimeClash {
        day: Day,
        time: TimeRange,
        weeks: WeekSet,
    },
    /// A new teaching day would exceed the approved limit.
    TooManyTeachingDays { max: u8 },
    /// A row starts in a blacked-out half-day.
    Blackout { slot: BlackoutSlot },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Capacity { capacity } => {
                write!(f, "Person is already at maximum lab load ({capacity})")
            }
            Violation::TimeClash { day, time, weeks } => write!(
                f,
                "Time clash with existing assignment on {day} {time} (Teaching Wk: {weeks})"
            ),
            Violation::TooManyTeachingDays { max } => {
                write!(f, "Exceeds maximum teaching days ({max})")
            }
            Violation::Blackout { slot } => {
                write!(f, "Assigned during unavailable time slot ({slot})")
            }
        }
    }
}

/// Evaluates hard constraints against a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintChecker<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// Checks giving `unit` to `person`, who currently holds `held`.
    pub fn check(
        &self,
        person: PersonIndex,
        unit: UnitIndex,
        held: &[UnitIndex],
    ) -> Result<(), Violation> {
        let capacity = self.snapshot.person(person).capacity;
        let candidate = &self.snapshot.unit(unit).rows;
        if held.len() + candidate.len() > capacity as usize {
            return Err(Violation::Capacity { capacity });
        }

        let held_rows: Vec<usize> = held
            .iter()
            .flat_map(|&u| self.snapshot.unit(u).rows.iter().copied())
            .collect();
        self.check_placement(person, candidate, &held_rows)
    }

    /// Whether `check` fails.
    #[inline]
    pub fn violates(&self, person: PersonIndex, unit: UnitIndex, held: &[UnitIndex]) -> bool {
        self.check(person, unit, held).is_err()
    }

    /// Rules 2-4 for arbitrary candidate and held rows.
    ///
    /// Capacity is left to the caller, since the bulk run and manual edits
    /// count load differently.
    pub fn check_placement(
        &self,
        person: PersonIndex,
        candidate: &[usize],
        held_rows: &[usize],
    ) -> Result<(), Violation> {
        for &c in candidate {
            let row = self.snapshot.row(c);
            for &h in held_rows {
                let other = self.snapshot.row(h);
                if row.day == other.day
                    && row.time.overlaps(&other.time)
                    && row.weeks.overlaps(&other.weeks)
                {
                    return Err(Violation::TimeClash {
                        day: other.day,
                        time: other.time,
                        weeks: other.weeks,
                    });
                }
            }
        }

        let Some(availability) = self.snapshot.person(person).availability.as_ref() else {
            return Ok(());
        };

        let current: BTreeSet<Day> = held_rows.iter().map(|&h| self.snapshot.row(h).day).collect();
        let new_days = candidate
            .iter()
            .map(|&c| self.snapshot.row(c).day)
            .filter(|d| !current.contains(d))
            .collect::<BTreeSet<_>>()
            .len();
        if new_days > 0 && current.len() + new_days > availability.max_teaching_days as usize {
            return Err(Violation::TooManyTeachingDays {
                max: availability.max_teaching_days,
            });
        }

        for &c in candidate {
            let row = self.snapshot.row(c);
            let slot = BlackoutSlot::of(row.day, &row.time);
            if availability.is_blacked_out(&slot) {
                return Err(Violation::Blackout { slot });
            }
        }

        Ok(())
    }
}
