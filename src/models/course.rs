//! Course model.

use serde::{Deserialize, Serialize};

/// A course whose lab sessions need staffing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier (e.g. `"CS2040/CS2040C"`).
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Contact hours per session.
    pub hours: u32,
    /// Number of weeks the course runs.
    pub weeks: u32,
    /// Target number of lab groups.
    #[serde(default)]
    pub group_count: Option<u32>,
}

impl Course {
    pub fn new(id: impl Into<String>, hours: u32, weeks: u32) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            hours,
            weeks,
            group_count: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_group_count(mut self, count: u32) -> Self {
        self.group_count = Some(count);
        self
    }

    /// Teaching hours one session row contributes over the semester.
    #[inline]
    pub fn workload(&self) -> u32 {
        self.hours * self.weeks
    }

    /// Short code: the part before the first `/`, if any.
    pub fn short_code(&self) -> &str {
        self.id.split('/').next().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_workload() {
        let c = Course::new("CS101", 2, 13).with_title("Programming");
        assert_eq!(c.workload(), 26);
        assert_eq!(c.title, "Programming");
        assert_eq!(c.group_count, None);
    }

    #[test]
    fn test_short_code() {
        assert_eq!(Course::new("CS2040/CS2040C", 2, 10).short_code(), "CS2040");
        assert_eq!(Course::new("MA1101", 2, 10).short_code(), "MA1101");
    }
}
