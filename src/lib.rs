//! Teaching-lab duty allocation.
//!
//! Assigns recurring lab sessions to on-duty staff under hard scheduling
//! constraints while minimizing a weighted penalty over soft preferences.
//! The engine is a best-of-N randomized greedy heuristic, not an exact
//! solver, and does not guarantee every session is covered.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Person`, `Course`, `SessionRow`,
//!   `SpecialConstraint`, `Preference`, `Assignment`, time and week primitives
//! - **`allocation`**: Constraint checker, pairing, locked pre-pass, greedy
//!   allocator, multi-start search
//! - **`scoring`**: Weighted penalty score and breakdown
//! - **`service`**: Bulk run, manual edit validation, current score, statistics
//! - **`store`**: Persistence seam and the in-memory store
//! - **`validation`**: Input integrity checks (duplicate IDs, dangling refs)
//!
//! # Example
//!
//! ```
//! use u_roster::config::{SearchConfig, Weights};
//! use u_roster::models::{Course, Dataset, Person, Preference, SessionRow};
//! use u_roster::service::run_allocation;
//! use u_roster::store::MemoryStore;
//!
//! let data = Dataset::new()
//!     .with_person(Person::new("alice").with_capacity(2))
//!     .with_course(Course::new("CS1010", 2, 13))
//!     .with_session(SessionRow::parse("s1", "CS1010", "B01", "MON", "1000-1200", &[1, 3, 5]).unwrap())
//!     .with_session(SessionRow::parse("s2", "CS1010", "B02", "MON", "1000-1200", &[2, 4, 6]).unwrap())
//!     .with_preference(Preference::new("alice", "CS1010", 1));
//!
//! let mut store = MemoryStore::new(data).with_weights(Weights::default().with_trial_count(4));
//! let summary = run_allocation(&mut store, false, &SearchConfig::new().with_seed(42)).unwrap();
//! assert_eq!(summary.assigned_units, 2);
//! ```
//!
//! # References
//!
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

pub mod allocation;
pub mod config;
pub mod error;
pub mod models;
pub mod scoring;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod validation;
