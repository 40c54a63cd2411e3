//! Weighted penalty score of a roster.
//!
//! # Terms
//!
//! | Term | Definition |
//! |------|-----------|
//! | Odd/even split | Ordered pairs of units at one (day, time), opposite parity, different persons |
//! | Course variety | Per person, distinct courses − 1 |
//! | Preference | Per person and course, rank − 1, or 16 when unranked |
//! | Workload spread | Population std-dev of (Σ hours·weeks) / capacity |
//! | Past bonus | Per person, distinct courses they taught before |
//!
//! Total = Σ term × weight − bonus × weight. Lower is better. Terms are not
//! normalized; weights are tuned to balance them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::allocation::Roster;
use crate::config::Weights;
use crate::models::{Day, Parity, TimeRange};
use crate::snapshot::{CourseIndex, PersonIndex, Snapshot, UnitIndex};

/// Preference penalty for a course the person did not rank at all.
///
/// Twice the worst ranked penalty, so any ranked course is preferred.
pub const UNRANKED_PENALTY: u64 = 16;

/// Raw term totals and the weighted score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub odd_even_split: u64,
    pub course_variety: u64,
    pub preference: u64,
    pub workload_spread: f64,
    pub past_bonus: u64,
    /// Weighted total.
    pub total: f64,
}

/// Scores rosters against fixed weights.
#[derive(Debug, Clone)]
pub struct PenaltyScorer {
    weights: Weights,
}

impl PenaltyScorer {
    /// Creates a scorer over a copy of `weights`.
    pub fn new(weights: &Weights) -> Self {
        Self {
            weights: weights.clone(),
        }
    }

    /// Weighted total only.
    pub fn score(&self, snapshot: &Snapshot, roster: &Roster) -> f64 {
        self.breakdown(snapshot, roster).total
    }

    /// Every term plus the weighted total.
    pub fn breakdown(&self, snapshot: &Snapshot, roster: &Roster) -> PenaltyBreakdown {
        let odd_even_split = split_pairs(snapshot, roster);
        let mut course_variety = 0;
        let mut preference = 0;
        let mut past_bonus = 0;

        for (person, units) in roster.iter() {
            if units.is_empty() {
                continue;
            }
            let entry = snapshot.person(person);
            let courses = distinct_courses(snapshot, units);

            course_variety += courses.len() as u64 - 1;
            for &course in &courses {
                preference += match entry.rank_of(course) {
                    Some(rank) => u64::from(rank.saturating_sub(1)),
                    None => UNRANKED_PENALTY,
                };
                if entry.has_taught(course) {
                    past_bonus += 1;
                }
            }
        }

        let workload_spread = workload_spread(snapshot, roster);

        let w = &self.weights;
        let total = odd_even_split as f64 * w.odd_even_pair_weight as f64
            + course_variety as f64 * w.course_variety_weight as f64
            + preference as f64 * w.preference_weight as f64
            + workload_spread * w.workload_distribution_weight as f64
            - past_bonus as f64 * w.past_assignments_weight as f64;

        PenaltyBreakdown {
            odd_even_split,
            course_variety,
            preference,
            workload_spread,
            past_bonus,
            total,
        }
    }
}

fn distinct_courses(snapshot: &Snapshot, units: &[UnitIndex]) -> BTreeSet<CourseIndex> {
    units.iter().map(|&u| snapshot.unit(u).course).collect()
}

/// Counts ordered cross-person odd/even pairs sharing a slot.
fn split_pairs(snapshot: &Snapshot, roster: &Roster) -> u64 {
    type SlotEntry = (UnitIndex, PersonIndex, Option<Parity>);
    let mut slots: BTreeMap<(Day, TimeRange), Vec<SlotEntry>> = BTreeMap::new();

    for (person, unit) in roster.links() {
        for &r in &snapshot.unit(unit).rows {
            let row = snapshot.row(r);
            let entries = slots.entry((row.day, row.time)).or_default();
            // A unit's first row at a slot speaks for it
            if !entries.iter().any(|(u, _, _)| *u == unit) {
                entries.push((unit, person, row.weeks.parity()));
            }
        }
    }

    let mut count = 0;
    for entries in slots.values() {
        for (i, &(_, p1, w1)) in entries.iter().enumerate() {
            for (j, &(_, p2, w2)) in entries.iter().enumerate() {
                if i == j || p1 == p2 {
                    continue;
                }
                if matches!(
                    (w1, w2),
                    (Some(Parity::Odd), Some(Parity::Even)) | (Some(Parity::Even), Some(Parity::Odd))
                ) {
                    count += 1;
                }
            }
        }
    }
    count
}

/// Population standard deviation of workload-to-capacity ratios.
fn workload_spread(snapshot: &Snapshot, roster: &Roster) -> f64 {
    let mut ratios = Vec::with_capacity(roster.len());
    for (person, units) in roster.iter() {
        let entry = snapshot.person(person);
        if entry.capacity == 0 {
            warn!(person = %entry.id, "Zero lab load; left out of workload spread");
            continue;
        }
        let workload: u64 = units
            .iter()
            .flat_map(|&u| snapshot.unit(u).rows.iter())
            .map(|&r| u64::from(snapshot.row_workload(r)))
            .sum();
        ratios.push(workload as f64 / entry.capacity as f64);
    }

    if ratios.len() < 2 {
        return 0.0;
    }
    let n = ratios.len() as f64;
    let mean = ratios.iter().sum::<f64>() / n;
    let variance = ratios.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let spread = variance.sqrt();
    if spread.is_finite() {
        spread
    } else {
        warn!(variance, "Workload spread not finite; scoring it as zero");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Dataset, Person, Preference, SessionRow, UnitKey};

    fn row(id: &str, course: &str, group: &str, day: &str, time: &str, weeks: &[u8]) -> SessionRow {
        SessionRow::parse(id, course, group, day, time, weeks).unwrap()
    }

    fn unit(snap: &Snapshot, course: &str, group: &str) -> UnitIndex {
        snap.unit_index(&UnitKey::new(course, group)).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new()
            .with_person(Person::new("p").with_capacity(2).with_past_course("CS101"))
            .with_person(Person::new("q").with_capacity(2))
            .with_course(Course::new("CS101", 2, 10))
            .with_course(Course::new("CS102", 1, 10))
            .with_session(row("o", "CS101", "O", "MON", "1000-1200", &[1, 3, 5]))
            .with_session(row("e", "CS101", "E", "MON", "1000-1200", &[2, 4, 6]))
            .with_session(row("x", "CS102", "X", "TUE", "1000-1200", &[1]))
            .with_preference(Preference::new("p", "CS101", 2))
            .with_preference(Preference::new("q", "CS101", 1))
    }

    fn only(weights: Weights, field: &str) -> Weights {
        let mut w = weights.zeroed();
        match field {
            "odd_even" => w.odd_even_pair_weight = 1,
            "variety" => w.course_variety_weight = 1,
            "preference" => w.preference_weight = 1,
            "workload" => w.workload_distribution_weight = 1,
            "past" => w.past_assignments_weight = 1,
            _ => {}
        }
        w
    }

    #[test]
    fn test_split_pair_counts_both_orders() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let (p, q) = (PersonIndex(0), PersonIndex(1));
        let split = Roster::new(vec![
            (p, vec![unit(&snap, "CS101", "O")]),
            (q, vec![unit(&snap, "CS101", "E")]),
        ]);
        let together = Roster::new(vec![
            (p, vec![unit(&snap, "CS101", "O"), unit(&snap, "CS101", "E")]),
            (q, vec![]),
        ]);

        let scorer = PenaltyScorer::new(&only(Weights::default(), "odd_even"));
        assert_eq!(scorer.breakdown(&snap, &split).odd_even_split, 2);
        assert!((scorer.score(&snap, &split) - 2.0).abs() < 1e-10);
        assert_eq!(scorer.breakdown(&snap, &together).odd_even_split, 0);
    }

    #[test]
    fn test_unranked_course_penalty() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let roster = Roster::new(vec![(PersonIndex(0), vec![unit(&snap, "CS102", "X")])]);
        let b = PenaltyScorer::new(&Weights::default()).breakdown(&snap, &roster);
        assert_eq!(b.preference, UNRANKED_PENALTY);
        assert_eq!(b.course_variety, 0);
        assert_eq!(b.past_bonus, 0);
    }

    #[test]
    fn test_variety_preference_and_bonus() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let roster = Roster::new(vec![(
            PersonIndex(0),
            vec![unit(&snap, "CS101", "O"), unit(&snap, "CS102", "X")],
        )]);
        let b = PenaltyScorer::new(&Weights::default()).breakdown(&snap, &roster);
        assert_eq!(b.course_variety, 1);
        assert_eq!(b.preference, 1 + UNRANKED_PENALTY);
        assert_eq!(b.past_bonus, 1);
        // Single person: no spread
        assert!(b.workload_spread.abs() < 1e-10);
        let expected = 30.0 + 17.0 * 25.0 - 15.0;
        assert!((b.total - expected).abs() < 1e-10);
    }

    #[test]
    fn test_workload_spread_population() {
        let snap = Snapshot::build(&dataset()).unwrap();
        // p: 20/2 = 10, q: 0/2 = 0 → mean 5, std-dev 5
        let roster = Roster::new(vec![
            (PersonIndex(0), vec![unit(&snap, "CS101", "O")]),
            (PersonIndex(1), vec![]),
        ]);
        let scorer = PenaltyScorer::new(&only(Weights::default(), "workload"));
        assert!((scorer.breakdown(&snap, &roster).workload_spread - 5.0).abs() < 1e-10);
        assert!((scorer.score(&snap, &roster) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_zero_capacity_left_out_of_spread() {
        let data = dataset().with_person(Person::new("z").with_capacity(0));
        let snap = Snapshot::build(&data).unwrap();
        let roster = Roster::new(vec![
            (PersonIndex(0), vec![unit(&snap, "CS101", "O")]),
            (PersonIndex(2), vec![]),
        ]);
        let b = PenaltyScorer::new(&Weights::default()).breakdown(&snap, &roster);
        assert!(b.workload_spread.abs() < 1e-10);
        assert!(b.total.is_finite());
    }

    #[test]
    fn test_score_deterministic_and_bonus_monotonic() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let roster = Roster::new(vec![
            (PersonIndex(0), vec![unit(&snap, "CS101", "O")]),
            (PersonIndex(1), vec![unit(&snap, "CS101", "E")]),
        ]);
        let scorer = PenaltyScorer::new(&Weights::default());
        assert_eq!(scorer.score(&snap, &roster), scorer.score(&snap, &roster));

        let mut last = f64::INFINITY;
        for weight in [0, 15, 30, 100] {
            let w = Weights::default().with_past_assignments_weight(weight);
            let s = PenaltyScorer::new(&w).score(&snap, &roster);
            assert!(s <= last);
            last = s;
        }
    }
}
