//! In-memory arena for one allocation run.
//!
//! A [`Snapshot`] is built once from a [`Dataset`] and never mutated. It
//! resolves every string reference into a typed index so the checker,
//! allocator, and scorer work without lookups by id. Only approved
//! sub-requests survive into the snapshot.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::error::StoreError;
use crate::models::{
    group_sessions, Availability, Dataset, Day, TimeRange, UnitKey, WeekSet,
};

/// Position of a person in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonIndex(pub usize);

/// Position of a session unit in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitIndex(pub usize);

/// Position of a course in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CourseIndex(pub usize);

/// A person as the engine sees them.
#[derive(Debug, Clone)]
pub struct PersonEntry {
    pub id: String,
    pub on_duty: bool,
    pub capacity: u32,
    /// Past courses that exist in this dataset.
    pub past_courses: BTreeSet<CourseIndex>,
    /// Approved availability limit, if any.
    pub availability: Option<Availability>,
    /// `(course, rank)` in the order the preferences were recorded.
    pub preferences: Vec<(CourseIndex, u8)>,
}

impl PersonEntry {
    /// Rank the person gave `course`, if any.
    pub fn rank_of(&self, course: CourseIndex) -> Option<u8> {
        self.preferences
            .iter()
            .find(|(c, _)| *c == course)
            .map(|&(_, rank)| rank)
    }

    #[inline]
    pub fn has_taught(&self, course: CourseIndex) -> bool {
        self.past_courses.contains(&course)
    }
}

#[derive(Debug, Clone)]
pub struct CourseEntry {
    pub id: String,
    /// `hours * weeks` contributed by each session row.
    pub workload: u32,
}

/// One session row with its references resolved.
#[derive(Debug, Clone)]
pub struct RowEntry {
    pub id: String,
    pub course: CourseIndex,
    pub unit: UnitIndex,
    pub day: Day,
    pub time: TimeRange,
    pub weeks: WeekSet,
    /// Holder of the persisted assignment for this row.
    pub owner: Option<PersonIndex>,
}

#[derive(Debug, Clone)]
pub struct UnitEntry {
    pub key: UnitKey,
    pub course: CourseIndex,
    /// Row positions, in timetable order.
    pub rows: Vec<usize>,
    /// Holder of the unit's persisted assignment.
    pub owner: Option<PersonIndex>,
}

/// An approved course lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRequest {
    pub person: PersonIndex,
    pub course: CourseIndex,
    pub unit_count: u32,
}

/// Immutable, index-addressed view of a dataset.
#[derive(Debug, Clone)]
pub struct Snapshot {
    persons: Vec<PersonEntry>,
    courses: Vec<CourseEntry>,
    rows: Vec<RowEntry>,
    units: Vec<UnitEntry>,
    locks: Vec<LockRequest>,
    person_ids: HashMap<String, PersonIndex>,
    course_ids: HashMap<String, CourseIndex>,
    unit_ids: HashMap<UnitKey, UnitIndex>,
}

impl Snapshot {
    /// Resolves a dataset into an arena.
    ///
    /// Fails on references to unknown persons, courses, or sessions. Past
    /// courses missing from the dataset are dropped silently; duplicate
    /// requests and preferences keep their first occurrence.
    pub fn build(data: &Dataset) -> Result<Self, StoreError> {
        let mut course_ids = HashMap::new();
        let mut courses = Vec::with_capacity(data.courses.len());
        for course in &data.courses {
            if course_ids.contains_key(&course.id) {
                warn!(course = %course.id, "Duplicate course id; keeping first");
                continue;
            }
            course_ids.insert(course.id.clone(), CourseIndex(courses.len()));
            courses.push(CourseEntry {
                id: course.id.clone(),
                workload: course.workload(),
            });
        }

        let mut person_ids = HashMap::new();
        let mut persons = Vec::with_capacity(data.persons.len());
        for person in &data.persons {
            if person_ids.contains_key(&person.id) {
                warn!(person = %person.id, "Duplicate person id; keeping first");
                continue;
            }
            person_ids.insert(person.id.clone(), PersonIndex(persons.len()));
            persons.push(PersonEntry {
                id: person.id.clone(),
                on_duty: person.on_duty,
                capacity: person.capacity,
                past_courses: person
                    .past_courses
                    .iter()
                    .filter_map(|c| course_ids.get(c).copied())
                    .collect(),
                availability: None,
                preferences: Vec::new(),
            });
        }

        let person_of = |id: &str| {
            person_ids
                .get(id)
                .copied()
                .ok_or_else(|| StoreError::UnknownPerson(id.to_string()))
        };
        let course_of = |id: &str| {
            course_ids
                .get(id)
                .copied()
                .ok_or_else(|| StoreError::UnknownCourse(id.to_string()))
        };

        let mut locks = Vec::new();
        let mut has_request = vec![false; persons.len()];
        for constraint in &data.constraints {
            let p = person_of(&constraint.person)?;
            if std::mem::replace(&mut has_request[p.0], true) {
                warn!(person = %constraint.person, "More than one special request; keeping first");
                continue;
            }
            if let Some(lock) = constraint.approved_lock() {
                locks.push(LockRequest {
                    person: p,
                    course: course_of(&lock.course)?,
                    unit_count: lock.unit_count,
                });
            }
            persons[p.0].availability = constraint.approved_availability().cloned();
        }

        for pref in &data.preferences {
            let p = person_of(&pref.person)?;
            let c = course_of(&pref.course)?;
            let entry = &mut persons[p.0];
            if entry.rank_of(c).is_some() {
                warn!(person = %pref.person, course = %pref.course, "Duplicate preference; keeping first");
                continue;
            }
            entry.preferences.push((c, pref.rank));
        }

        let grouped = group_sessions(&data.sessions);
        let mut units = Vec::with_capacity(grouped.len());
        let mut unit_ids = HashMap::with_capacity(grouped.len());
        let mut row_unit = vec![UnitIndex(0); data.sessions.len()];
        for unit in grouped {
            let idx = UnitIndex(units.len());
            for &r in &unit.rows {
                row_unit[r] = idx;
            }
            unit_ids.insert(unit.key.clone(), idx);
            units.push(UnitEntry {
                course: course_of(&unit.key.course)?,
                key: unit.key,
                rows: unit.rows,
                owner: None,
            });
        }

        let mut session_ids = HashMap::with_capacity(data.sessions.len());
        let mut rows = Vec::with_capacity(data.sessions.len());
        for (i, session) in data.sessions.iter().enumerate() {
            if session_ids.contains_key(session.id.as_str()) {
                warn!(session = %session.id, "Duplicate session id; keeping first");
            } else {
                session_ids.insert(session.id.as_str(), i);
            }
            rows.push(RowEntry {
                id: session.id.clone(),
                course: units[row_unit[i].0].course,
                unit: row_unit[i],
                day: session.day,
                time: session.time,
                weeks: session.weeks,
                owner: None,
            });
        }

        for assignment in &data.assignments {
            let r = *session_ids
                .get(assignment.session.as_str())
                .ok_or_else(|| StoreError::UnknownSession(assignment.session.clone()))?;
            let p = person_of(&assignment.person)?;
            if rows[r].owner.is_some() {
                warn!(session = %assignment.session, "Session assigned twice; keeping first");
                continue;
            }
            rows[r].owner = Some(p);
        }

        for unit in &mut units {
            unit.owner = unit.rows.iter().find_map(|&r| rows[r].owner);
        }

        Ok(Self {
            persons,
            courses,
            rows,
            units,
            locks,
            person_ids,
            course_ids,
            unit_ids,
        })
    }

    #[inline]
    pub fn person(&self, p: PersonIndex) -> &PersonEntry {
        &self.persons[p.0]
    }

    #[inline]
    pub fn course(&self, c: CourseIndex) -> &CourseEntry {
        &self.courses[c.0]
    }

    #[inline]
    pub fn unit(&self, u: UnitIndex) -> &UnitEntry {
        &self.units[u.0]
    }

    #[inline]
    pub fn row(&self, r: usize) -> &RowEntry {
        &self.rows[r]
    }

    /// All person indices, in dataset order.
    pub fn persons(&self) -> impl Iterator<Item = PersonIndex> + '_ {
        (0..self.persons.len()).map(PersonIndex)
    }

    /// All unit indices, in order of first appearance.
    pub fn units(&self) -> impl Iterator<Item = UnitIndex> + '_ {
        (0..self.units.len()).map(UnitIndex)
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Approved course locks, in request order.
    pub fn locks(&self) -> &[LockRequest] {
        &self.locks
    }

    pub fn person_index(&self, id: &str) -> Option<PersonIndex> {
        self.person_ids.get(id).copied()
    }

    pub fn course_index(&self, id: &str) -> Option<CourseIndex> {
        self.course_ids.get(id).copied()
    }

    pub fn unit_index(&self, key: &UnitKey) -> Option<UnitIndex> {
        self.unit_ids.get(key).copied()
    }

    /// Day, time, and weeks of the unit's lead row.
    pub fn unit_slot(&self, u: UnitIndex) -> (Day, TimeRange, WeekSet) {
        let lead = &self.rows[self.units[u.0].rows[0]];
        (lead.day, lead.time, lead.weeks)
    }

    /// Units whose persisted assignment belongs to `p`, in unit order.
    pub fn units_owned_by(&self, p: PersonIndex) -> Vec<UnitIndex> {
        self.units()
            .filter(|&u| self.units[u.0].owner == Some(p))
            .collect()
    }

    /// Rows with a persisted assignment to `p`, in row order.
    pub fn rows_owned_by(&self, p: PersonIndex) -> Vec<usize> {
        (0..self.rows.len())
            .filter(|&r| self.rows[r].owner == Some(p))
            .collect()
    }

    /// Workload one row adds to whoever teaches it.
    #[inline]
    pub fn row_workload(&self, r: usize) -> u32 {
        self.courses[self.rows[r].course.0].workload
    }
}
