//! Special requests and teaching preferences.
//!
//! A person may file at most one special request, bundling two independent
//! sub-requests that an administrator approves separately:
//!
//! - a course lock: commit the person to N units of a given course before
//!   the general search runs;
//! - an availability limit: a cap on distinct teaching days and a set of
//!   blacked-out half-days.
//!
//! Unapproved sub-requests are stored but never enforced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::BlackoutSlot;

/// Default cap on distinct teaching days (a full working week).
pub const DEFAULT_MAX_TEACHING_DAYS: u8 = 5;

/// Lowest (best) preference rank.
pub const BEST_RANK: u8 = 1;
/// Highest (worst) preference rank.
pub const WORST_RANK: u8 = 8;

/// A person's special request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecialConstraint {
    /// Requesting person.
    pub person: String,
    #[serde(default)]
    pub lock: Option<CourseLock>,
    #[serde(default)]
    pub availability: Option<Availability>,
}

/// Request to be pre-committed to a number of units of one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseLock {
    pub course: String,
    /// Number of units the person agreed to take.
    pub unit_count: u32,
    /// Faculty member who arranged the lock.
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub approved: bool,
}

/// Request limiting when a person can teach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default = "default_max_teaching_days")]
    pub max_teaching_days: u8,
    #[serde(default)]
    pub blackout: BTreeSet<BlackoutSlot>,
    #[serde(default)]
    pub approved: bool,
}

fn default_max_teaching_days() -> u8 {
    DEFAULT_MAX_TEACHING_DAYS
}

impl Default for Availability {
    fn default() -> Self {
        Self {
            max_teaching_days: DEFAULT_MAX_TEACHING_DAYS,
            blackout: BTreeSet::new(),
            approved: false,
        }
    }
}

impl SpecialConstraint {
    pub fn new(person: impl Into<String>) -> Self {
        Self {
            person: person.into(),
            ..Default::default()
        }
    }

    /// Attaches a course lock (unapproved).
    pub fn with_lock(mut self, course: impl Into<String>, unit_count: u32) -> Self {
        self.lock = Some(CourseLock {
            course: course.into(),
            unit_count,
            contact: String::new(),
            approved: false,
        });
        self
    }

    /// Attaches an availability limit (unapproved).
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self
    }

    /// Approves whichever sub-requests are present.
    pub fn approved(mut self) -> Self {
        if let Some(lock) = self.lock.as_mut() {
            lock.approved = true;
        }
        if let Some(av) = self.availability.as_mut() {
            av.approved = true;
        }
        self
    }

    /// The course lock, if present and approved.
    pub fn approved_lock(&self) -> Option<&CourseLock> {
        self.lock.as_ref().filter(|l| l.approved)
    }

    /// The availability limit, if present and approved.
    pub fn approved_availability(&self) -> Option<&Availability> {
        self.availability.as_ref().filter(|a| a.approved)
    }
}

impl Availability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_days(mut self, days: u8) -> Self {
        self.max_teaching_days = days;
        self
    }

    pub fn with_blackout(mut self, slot: BlackoutSlot) -> Self {
        self.blackout.insert(slot);
        self
    }

    pub fn is_blacked_out(&self, slot: &BlackoutSlot) -> bool {
        self.blackout.contains(slot)
    }
}

/// A ranked teaching preference; rank 1 is most preferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub person: String,
    pub course: String,
    pub rank: u8,
}

impl Preference {
    pub fn new(person: impl Into<String>, course: impl Into<String>, rank: u8) -> Self {
        Self {
            person: person.into(),
            course: course.into(),
            rank,
        }
    }

    /// Whether the rank lies in `1..=8`.
    pub fn is_valid_rank(&self) -> bool {
        (BEST_RANK..=WORST_RANK).contains(&self.rank)
    }
}
