//! Solution quality.
//!
//! - **`penalty`**: weighted penalty score of a roster and its per-term
//!   breakdown.

mod penalty;

pub use penalty::{PenaltyBreakdown, PenaltyScorer, UNRANKED_PENALTY};
