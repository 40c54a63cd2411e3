//! Person model.
//!
//! Persons are the staff who teach lab sessions. Only persons with the
//! duty flag set take part in an allocation run; their capacity bounds
//! how many session units they can hold.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A person who can be assigned lab duty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    /// Unique person identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Eligible for allocation at all.
    #[serde(default = "default_on_duty")]
    pub on_duty: bool,
    /// Maximum number of session units (lab load).
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Courses taught in earlier semesters.
    #[serde(default)]
    pub past_courses: BTreeSet<String>,
}

fn default_on_duty() -> bool {
    true
}

fn default_capacity() -> u32 {
    4
}

impl Person {
    /// Creates an on-duty person with the default capacity of 4.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            on_duty: true,
            capacity: default_capacity(),
            past_courses: BTreeSet::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Marks the person as excluded from allocation.
    pub fn off_duty(mut self) -> Self {
        self.on_duty = false;
        self
    }

    /// Records a course taught in the past.
    pub fn with_past_course(mut self, course: impl Into<String>) -> Self {
        self.past_courses.insert(course.into());
        self
    }

    pub fn has_taught(&self, course: &str) -> bool {
        self.past_courses.contains(course)
    }
}
