//! Error types.
//!
//! Setup and store failures are errors. Hard-constraint violations are not:
//! they are ordinary outcomes of the search and of manual edits, and are
//! reported as [`Violation`](crate::allocation::Violation) values instead.

use std::fmt;

use crate::config::ConfigError;
use crate::models::UnitKey;

/// Reasons an allocation run aborts.
///
/// Every variant is raised before any assignment is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// No person has the duty flag set.
    NoEligiblePersons,
    /// Every eligible person already holds a full load.
    NoCapacityRemaining,
    /// The run was cancelled between trials.
    Cancelled,
    /// The trial worker pool could not be started.
    WorkerPool(String),
    /// The store rejected a read or write.
    Store(StoreError),
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::NoEligiblePersons => {
                write!(f, "No eligible persons for allocation (none are on duty)")
            }
            AllocationError::NoCapacityRemaining => {
                write!(f, "No persons with remaining lab load capacity")
            }
            AllocationError::Cancelled => write!(f, "Allocation run cancelled"),
            AllocationError::WorkerPool(msg) => write!(f, "Could not start worker pool: {msg}"),
            AllocationError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AllocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AllocationError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for AllocationError {
    fn from(e: StoreError) -> Self {
        AllocationError::Store(e)
    }
}

/// Failures reading from or writing to an [`AllocationStore`](crate::store::AllocationStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UnknownPerson(String),
    UnknownCourse(String),
    UnknownSession(String),
    /// No session rows carry this `(course, group)`.
    UnknownUnit(UnitKey),
    Config(ConfigError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnknownPerson(id) => write!(f, "Unknown person '{id}'"),
            StoreError::UnknownCourse(id) => write!(f, "Unknown course '{id}'"),
            StoreError::UnknownSession(id) => write!(f, "Unknown session '{id}'"),
            StoreError::UnknownUnit(key) => write!(f, "No sessions for lab group '{key}'"),
            StoreError::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for StoreError {
    fn from(e: ConfigError) -> Self {
        StoreError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AllocationError::NoEligiblePersons.to_string(),
            "No eligible persons for allocation (none are on duty)"
        );
        assert_eq!(
            StoreError::UnknownUnit(UnitKey::new("CS101", "B09")).to_string(),
            "No sessions for lab group 'CS101-B09'"
        );
    }

    #[test]
    fn test_error_conversion_and_source() {
        let err: AllocationError = StoreError::UnknownPerson("p9".into()).into();
        assert!(matches!(err, AllocationError::Store(StoreError::UnknownPerson(_))));
        assert!(err.source().is_some());
        assert!(AllocationError::Cancelled.source().is_none());
    }
}
