//! Allocation engine.
//!
//! # Modules
//!
//! - **`checker`**: hard-constraint admissibility of a placement
//! - **`pairing`**: odd/even week pairs at a shared slot
//! - **`trial`**: per-trial unit pool and holdings
//! - **`locked`**: pre-pass for approved course locks
//! - **`greedy`**: continuity, preference, and fallback fill
//! - **`search`**: randomized multi-start driver
//!
//! # Reference
//! Burke & Petrovic (2002), "Recent research directions in automated
//! timetabling", EJOR 140(2)

mod checker;
mod greedy;
mod locked;
mod pairing;
mod search;
mod trial;

pub use checker::{ConstraintChecker, Violation};
pub use greedy::{allocate_greedy, priority_order};
pub use locked::assign_locked;
pub use pairing::find_pairs;
pub use search::{MultiStartSearch, SearchOutcome};
pub use trial::{Roster, Trial};
