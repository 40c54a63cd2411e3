//! Lab-duty domain models.
//!
//! Plain data records describing who can teach, what needs teaching, and
//! the standing requests that shape an allocation. All records are
//! serde-serializable so collaborators can load and store them freely.
//!
//! # Domain Mappings
//!
//! | u-roster | Meaning |
//! |----------|---------|
//! | Person | Staff member with a lab load |
//! | Course | Course offering lab sessions |
//! | SessionRow | One recurring lab meeting |
//! | SessionUnit | All meetings of one course group (assigned as a whole) |
//! | Assignment | Persisted person ↔ meeting link |

mod assignment;
mod course;
mod person;
mod request;
mod session;
mod time;

pub use assignment::{Assignment, Dataset};
pub use course::Course;
pub use person::Person;
pub use request::{
    Availability, CourseLock, Preference, SpecialConstraint, BEST_RANK,
    DEFAULT_MAX_TEACHING_DAYS, WORST_RANK,
};
pub use session::{group_sessions, SessionRow, SessionUnit, UnitKey};
pub use time::{
    parse_teaching_weeks, BlackoutSlot, Day, FormatError, HalfDay, Parity, TimeRange, WeekSet,
    TEACHING_WEEKS,
};
