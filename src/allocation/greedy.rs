//! Greedy allocator.
//!
//! # Algorithm
//!
//! Persons are visited in priority order. Each fills remaining lab load
//! from, in turn:
//!
//! a. courses they already hold (continuity);
//! b. preferences by rank 1 through 8, past courses first within a rank;
//! c. any admissible unit left in the pool.
//!
//! Within phases a and b each course is tried as odd/even pairs first,
//! then as single units. Pairs are skipped once a single unit of load is
//! left.
//!
//! # Complexity
//! O(p * u * r) checks, where p=persons, u=units, r=rows held per person.

use std::cmp::Reverse;

use super::Trial;
use crate::models::{BEST_RANK, WORST_RANK};
use crate::snapshot::{CourseIndex, PersonIndex, Snapshot, UnitIndex};

/// Sorts persons for the greedy pass.
///
/// Persons with an approved availability limit come first, then larger
/// remaining load. The sort is stable, so dataset order breaks ties.
pub fn priority_order(snapshot: &Snapshot, persons: &mut [PersonIndex], base: &[Vec<UnitIndex>]) {
    persons.sort_by_key(|&p| {
        let held = base.get(p.0).map_or(0, Vec::len);
        let remaining = (snapshot.person(p).capacity as usize).saturating_sub(held);
        (snapshot.person(p).availability.is_none(), Reverse(remaining))
    });
}

/// Runs phases a-c for every person in `order`.
pub fn allocate_greedy(trial: &mut Trial<'_>, order: &[PersonIndex]) {
    for &person in order {
        if trial.is_full(person) {
            continue;
        }

        let mut held_courses: Vec<CourseIndex> = Vec::new();
        for &u in trial.held(person) {
            let course = trial.snapshot().unit(u).course;
            if !held_courses.contains(&course) {
                held_courses.push(course);
            }
        }
        for course in held_courses {
            if trial.is_full(person) {
                break;
            }
            fill_from_course(trial, person, course);
        }

        let snapshot = trial.snapshot();
        let entry = snapshot.person(person);
        for rank in BEST_RANK..=WORST_RANK {
            if trial.is_full(person) {
                break;
            }
            let mut courses: Vec<CourseIndex> = entry
                .preferences
                .iter()
                .filter(|&&(_, r)| r == rank)
                .map(|&(c, _)| c)
                .collect();
            courses.sort_by_key(|&c| !entry.has_taught(c));
            for course in courses {
                if trial.is_full(person) {
                    break;
                }
                fill_from_course(trial, person, course);
            }
        }

        for unit in trial.available_units() {
            if trial.is_full(person) {
                break;
            }
            trial.try_assign(person, unit);
        }
    }
}

fn fill_from_course(trial: &mut Trial<'_>, person: PersonIndex, course: CourseIndex) {
    let units = trial.course_units(course);
    for pair in trial.pairs_among(&units) {
        if trial.remaining(person) <= 1 {
            break;
        }
        trial.try_assign_pair(person, pair);
    }
    for unit in units {
        if trial.is_full(person) {
            break;
        }
        trial.try_assign(person, unit);
    }
}
