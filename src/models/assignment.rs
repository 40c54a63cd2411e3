//! Assignment records and the dataset they live in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Course, Person, Preference, SessionRow, SpecialConstraint};

/// A persisted link between a person and one session row.
///
/// All rows of a unit carry an assignment to the same person. At most one
/// assignment exists per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned session row.
    pub session: String,
    /// Person teaching it.
    pub person: String,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Creates an assignment stamped with the current time.
    pub fn new(session: impl Into<String>, person: impl Into<String>) -> Self {
        Self::at(session, person, Utc::now())
    }

    pub fn at(session: impl Into<String>, person: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            session: session.into(),
            person: person.into(),
            created_at,
        }
    }
}

/// Everything an allocation run reads, as loaded from a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub sessions: Vec<SessionRow>,
    #[serde(default)]
    pub constraints: Vec<SpecialConstraint>,
    #[serde(default)]
    pub preferences: Vec<Preference>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_person(mut self, person: Person) -> Self {
        self.persons.push(person);
        self
    }

    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    pub fn with_session(mut self, session: SessionRow) -> Self {
        self.sessions.push(session);
        self
    }

    pub fn with_constraint(mut self, constraint: SpecialConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_preference(mut self, preference: Preference) -> Self {
        self.preferences.push(preference);
        self
    }

    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn session(&self, id: &str) -> Option<&SessionRow> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// The person's special request, if any.
    pub fn constraint_for(&self, person: &str) -> Option<&SpecialConstraint> {
        self.constraints.iter().find(|c| c.person == person)
    }

    /// The assignment covering a session row, if any.
    pub fn assignment_for(&self, session: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.session == session)
    }

    /// All assignments held by a person.
    pub fn assignments_of<'a>(&'a self, person: &'a str) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments.iter().filter(move |a| a.person == person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, TimeRange, WeekSet};

    #[test]
    fn test_dataset_lookups() {
        let data = Dataset::new()
            .with_person(Person::new("p1"))
            .with_course(Course::new("CS101", 2, 13))
            .with_session(SessionRow::new(
                "s1",
                "CS101",
                "B01",
                Day::Mon,
                TimeRange::new((9, 0), (11, 0)),
                WeekSet::full(),
            ))
            .with_assignment(Assignment::new("s1", "p1"));

        assert!(data.person("p1").is_some());
        assert!(data.person("p2").is_none());
        assert_eq!(data.course("CS101").unwrap().workload(), 26);
        assert_eq!(data.assignment_for("s1").unwrap().person, "p1");
        assert_eq!(data.assignments_of("p1").count(), 1);
        assert!(data.constraint_for("p1").is_none());
    }

    #[test]
    fn test_dataset_json_round_trip() {
        let data = Dataset::new().with_person(Person::new("p1").with_capacity(3));
        let json = serde_json::to_string(&data).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back.persons[0].capacity, 3);
        assert!(back.sessions.is_empty());
    }
}
