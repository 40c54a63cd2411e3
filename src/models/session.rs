//! Session rows and session units.
//!
//! A timetable lists one row per recurring lab meeting. Rows that share a
//! course and group label form a [`SessionUnit`]: the atomic object the
//! allocator hands out. A unit is held by at most one person and its rows
//! never split between persons.

use serde::{Deserialize, Serialize};

use super::{Day, FormatError, TimeRange, WeekSet};

/// One recurring lab meeting from the timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    /// Unique row identifier.
    pub id: String,
    /// Course this session belongs to.
    pub course: String,
    /// Lab group label within the course.
    pub group: String,
    pub day: Day,
    pub time: TimeRange,
    /// Room; carried for display, ignored by the allocator.
    #[serde(default)]
    pub venue: String,
    /// Teaching weeks this meeting runs.
    pub weeks: WeekSet,
    /// Whether an assignment record exists for this row.
    #[serde(default)]
    pub assigned: bool,
}

impl SessionRow {
    pub fn new(
        id: impl Into<String>,
        course: impl Into<String>,
        group: impl Into<String>,
        day: Day,
        time: TimeRange,
        weeks: WeekSet,
    ) -> Self {
        Self {
            id: id.into(),
            course: course.into(),
            group: group.into(),
            day,
            time,
            venue: String::new(),
            weeks,
            assigned: false,
        }
    }

    /// Builds a row from raw timetable fields.
    ///
    /// Intended for data entry: malformed day, time, or week values are
    /// rejected here so the allocator only ever sees well-formed rows.
    pub fn parse(
        id: impl Into<String>,
        course: impl Into<String>,
        group: impl Into<String>,
        day: &str,
        time: &str,
        weeks: &[u8],
    ) -> Result<Self, FormatError> {
        Ok(Self::new(
            id,
            course,
            group,
            day.parse()?,
            TimeRange::parse(time)?,
            WeekSet::from_weeks(weeks.iter().copied())?,
        ))
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    /// Grouping key of the unit this row belongs to.
    pub fn unit_key(&self) -> UnitKey {
        UnitKey::new(&self.course, &self.group)
    }
}

/// `(course, group label)`: identifies a session unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub course: String,
    pub group: String,
}

impl UnitKey {
    pub fn new(course: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            course: course.into(),
            group: group.into(),
        }
    }
}

impl std::fmt::Display for UnitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.course, self.group)
    }
}

/// The rows of one `(course, group)` unit, by position in the row list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUnit {
    pub key: UnitKey,
    /// Indices into the row slice the unit was grouped from, in row order.
    pub rows: Vec<usize>,
}

/// Partitions rows into units keyed by `(course, group)`.
///
/// Units appear in order of their first row; rows within a unit keep
/// their input order. Every row lands in exactly one unit.
pub fn group_sessions(rows: &[SessionRow]) -> Vec<SessionUnit> {
    let mut index: std::collections::HashMap<UnitKey, usize> = std::collections::HashMap::new();
    let mut units: Vec<SessionUnit> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let key = row.unit_key();
        match index.get(&key) {
            Some(&u) => units[u].rows.push(i),
            None => {
                index.insert(key.clone(), units.len());
                units.push(SessionUnit { key, rows: vec![i] });
            }
        }
    }

    units
}
