//! Multi-start search driver.
//!
//! # Algorithm
//!
//! 1. Eligible persons are those on duty; none is a setup error.
//! 2. Persisted assignments of eligible persons become their starting
//!    holdings. Persisted units leave the pool. Persons already at full
//!    load drop out; if none remain that is a setup error.
//! 3. Each trial copies the pool and holdings, runs the locked pre-pass
//!    then the greedy pass, and scores the result.
//! 4. The lowest score wins, ties going to the lower trial index.
//!
//! Trial 0 uses the natural pool order. Trial `i > 0` shuffles it with
//! its own ChaCha stream derived from the run seed, so a seeded run gives
//! the same result however trials are spread over threads.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, warn};

use super::{allocate_greedy, assign_locked, priority_order, Roster, Trial};
use crate::config::{SearchConfig, Weights};
use crate::error::AllocationError;
use crate::scoring::PenaltyScorer;
use crate::snapshot::{PersonIndex, Snapshot, UnitIndex};

/// Best roster found by a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub roster: Roster,
    pub score: f64,
    /// Index of the winning trial.
    pub best_trial: usize,
    /// Trials run.
    pub trials: usize,
    /// Seed the shuffles were drawn from.
    pub seed: u64,
}

/// Runs randomized restarts of the pre-pass and greedy allocator.
#[derive(Debug, Clone)]
pub struct MultiStartSearch<'a> {
    snapshot: &'a Snapshot,
    scorer: PenaltyScorer,
    trials: usize,
    config: SearchConfig,
}

impl<'a> MultiStartSearch<'a> {
    /// Creates a search using `weights` for scoring and trial count.
    ///
    /// A trial count of zero still runs one trial.
    pub fn new(snapshot: &'a Snapshot, weights: &Weights) -> Self {
        Self {
            snapshot,
            scorer: PenaltyScorer::new(weights),
            trials: weights.trial_count.max(1) as usize,
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs every trial and returns the best roster.
    pub fn run(&self) -> Result<SearchOutcome, AllocationError> {
        let snapshot = self.snapshot;
        let eligible: Vec<PersonIndex> = snapshot
            .persons()
            .filter(|&p| snapshot.person(p).on_duty)
            .collect();
        if eligible.is_empty() {
            return Err(AllocationError::NoEligiblePersons);
        }

        let base: Vec<Vec<UnitIndex>> = snapshot
            .persons()
            .map(|p| {
                if snapshot.person(p).on_duty {
                    snapshot.units_owned_by(p)
                } else {
                    Vec::new()
                }
            })
            .collect();

        let mut persons: Vec<PersonIndex> = eligible
            .into_iter()
            .filter(|&p| base[p.0].len() < snapshot.person(p).capacity as usize)
            .collect();
        if persons.is_empty() {
            return Err(AllocationError::NoCapacityRemaining);
        }
        priority_order(snapshot, &mut persons, &base);

        let pool: Vec<UnitIndex> = snapshot
            .units()
            .filter(|&u| snapshot.unit(u).owner.is_none())
            .collect();
        let seed = self.config.seed.unwrap_or_else(rand::random);

        info!(
            persons = persons.len(),
            units = pool.len(),
            trials = self.trials,
            seed,
            "Starting allocation search"
        );

        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| AllocationError::WorkerPool(e.to_string()))?;

        let best = workers.install(|| {
            (0..self.trials)
                .into_par_iter()
                .filter_map(|i| {
                    if self.config.is_cancelled() {
                        return None;
                    }
                    let roster = self.run_trial(i, seed, &pool, &base, &persons);
                    let score = self.scorer.score(snapshot, &roster);
                    debug!(trial = i, score, "Trial finished");
                    Some((i, score, roster))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        });

        if self.config.is_cancelled() {
            warn!("Allocation search cancelled");
            return Err(AllocationError::Cancelled);
        }
        let Some((best_trial, score, roster)) = best else {
            return Err(AllocationError::Cancelled);
        };

        info!(best_trial, score, "Allocation search finished");
        Ok(SearchOutcome {
            roster,
            score,
            best_trial,
            trials: self.trials,
            seed,
        })
    }

    fn run_trial(
        &self,
        index: usize,
        seed: u64,
        pool: &[UnitIndex],
        base: &[Vec<UnitIndex>],
        persons: &[PersonIndex],
    ) -> Roster {
        let mut order = pool.to_vec();
        if index > 0 {
            order.shuffle(&mut trial_rng(seed, index));
        }
        let mut trial = Trial::new(self.snapshot, order, base);
        assign_locked(&mut trial, persons);
        allocate_greedy(&mut trial, persons);
        trial.into_roster(persons)
    }
}

fn trial_rng(seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::ConstraintChecker;
    use crate::models::{Assignment, Course, Dataset, Person, Preference, SessionRow};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn row(id: &str, course: &str, group: &str, day: &str, time: &str, weeks: &[u8]) -> SessionRow {
        SessionRow::parse(id, course, group, day, time, weeks).unwrap()
    }

    fn dataset() -> Dataset {
        let mut data = Dataset::new()
            .with_person(Person::new("p1").with_capacity(3).with_past_course("CS101"))
            .with_person(Person::new("p2").with_capacity(3))
            .with_person(Person::new("p3").with_capacity(2))
            .with_course(Course::new("CS101", 2, 13))
            .with_course(Course::new("CS102", 2, 13))
            .with_preference(Preference::new("p2", "CS102", 1))
            .with_preference(Preference::new("p3", "CS101", 1));
        let days = ["MON", "TUE", "WED", "THU", "FRI"];
        for (i, day) in days.iter().enumerate() {
            data = data
                .with_session(row(&format!("a{i}"), "CS101", &format!("A{i}"), day, "0900-1100", &[1, 3, 5]))
                .with_session(row(&format!("b{i}"), "CS101", &format!("B{i}"), day, "0900-1100", &[2, 4, 6]))
                .with_session(row(&format!("c{i}"), "CS102", &format!("C{i}"), day, "1000-1200", &[1, 2]));
        }
        data
    }

    fn seeded() -> SearchConfig {
        SearchConfig::new().with_seed(7).with_threads(2)
    }

    #[test]
    fn test_search_respects_hard_constraints() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let outcome = MultiStartSearch::new(&snap, &Weights::default().with_trial_count(8))
            .with_config(seeded())
            .run()
            .unwrap();

        let checker = ConstraintChecker::new(&snap);
        let mut seen = std::collections::HashSet::new();
        for (person, units) in outcome.roster.iter() {
            assert!(units.len() <= snap.person(person).capacity as usize);
            for (i, &u) in units.iter().enumerate() {
                assert!(seen.insert(u), "unit held twice");
                let others: Vec<usize> = units
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .flat_map(|(_, &o)| snap.unit(o).rows.clone())
                    .collect();
                assert!(checker
                    .check_placement(person, &snap.unit(u).rows, &others)
                    .is_ok());
            }
        }
        assert_eq!(outcome.trials, 8);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let weights = Weights::default().with_trial_count(6);
        let a = MultiStartSearch::new(&snap, &weights).with_config(seeded()).run().unwrap();
        let b = MultiStartSearch::new(&snap, &weights)
            .with_config(SearchConfig::new().with_seed(7).with_threads(1))
            .run()
            .unwrap();
        assert_eq!(a.roster, b.roster);
        assert_eq!(a.best_trial, b.best_trial);
        assert!((a.score - b.score).abs() < 1e-10);
    }

    #[test]
    fn test_best_is_no_worse_than_natural_order() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let single = MultiStartSearch::new(&snap, &Weights::default().with_trial_count(1))
            .with_config(seeded())
            .run()
            .unwrap();
        let many = MultiStartSearch::new(&snap, &Weights::default().with_trial_count(10))
            .with_config(seeded())
            .run()
            .unwrap();
        assert_eq!(single.best_trial, 0);
        assert!(many.score <= single.score);
    }

    #[test]
    fn test_zero_trials_runs_once() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let outcome = MultiStartSearch::new(&snap, &Weights::default().with_trial_count(0))
            .with_config(seeded())
            .run()
            .unwrap();
        assert_eq!(outcome.trials, 1);
    }

    #[test]
    fn test_setup_errors() {
        let off = Dataset::new()
            .with_person(Person::new("p").off_duty())
            .with_course(Course::new("CS101", 2, 13));
        let snap = Snapshot::build(&off).unwrap();
        assert_eq!(
            MultiStartSearch::new(&snap, &Weights::default()).run().unwrap_err(),
            AllocationError::NoEligiblePersons
        );

        let full = Dataset::new()
            .with_person(Person::new("p").with_capacity(1))
            .with_course(Course::new("CS101", 2, 13))
            .with_session(row("s", "CS101", "A", "MON", "0900-1100", &[1]))
            .with_assignment(Assignment::new("s", "p"));
        let snap = Snapshot::build(&full).unwrap();
        assert_eq!(
            MultiStartSearch::new(&snap, &Weights::default()).run().unwrap_err(),
            AllocationError::NoCapacityRemaining
        );
    }

    #[test]
    fn test_existing_holdings_kept() {
        let data = dataset().with_assignment(Assignment::new("c0", "p1"));
        let snap = Snapshot::build(&data).unwrap();
        let outcome = MultiStartSearch::new(&snap, &Weights::default().with_trial_count(3))
            .with_config(seeded())
            .run()
            .unwrap();
        let p1 = snap.person_index("p1").unwrap();
        let c0 = snap.unit(snap.row(2).unit).key.clone();
        assert!(outcome
            .roster
            .units_of(p1)
            .iter()
            .any(|&u| snap.unit(u).key == c0));
    }

    #[test]
    fn test_cancelled_before_start() {
        let snap = Snapshot::build(&dataset()).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let err = MultiStartSearch::new(&snap, &Weights::default())
            .with_config(seeded().with_cancel_flag(flag))
            .run()
            .unwrap_err();
        assert_eq!(err, AllocationError::Cancelled);
    }
}
