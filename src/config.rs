//! Allocation configuration.
//!
//! [`Weights`] is the persisted singleton that tunes the penalty scorer and
//! the number of search trials. Absent fields fall back to their defaults,
//! so an empty document yields the default configuration.
//!
//! [`SearchConfig`] holds per-run knobs that are never persisted: the RNG
//! seed, the worker-thread cap, and a cancellation flag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Penalty weights and trial count.
///
/// All weights are non-negative integers; the scorer does not normalize
/// sub-penalties, so weights are expected to be tuned to balance them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Odd/even pairs at one slot split across persons.
    pub odd_even_pair_weight: u32,
    /// Distinct courses per person beyond the first.
    pub course_variety_weight: u32,
    /// Assigned courses ranked low or absent from preferences.
    pub preference_weight: u32,
    /// Spread of workload-to-capacity ratios.
    pub workload_distribution_weight: u32,
    /// Bonus per assigned course the person taught before.
    pub past_assignments_weight: u32,
    /// Randomized search trials per run.
    pub trial_count: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            odd_even_pair_weight: 40,
            course_variety_weight: 30,
            preference_weight: 25,
            workload_distribution_weight: 20,
            past_assignments_weight: 15,
            trial_count: 30,
        }
    }
}

impl Weights {
    /// Parses weights from JSON, defaulting absent fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads weights from a JSON file.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Serializes weights as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_trial_count(mut self, trials: u32) -> Self {
        self.trial_count = trials;
        self
    }

    pub fn with_past_assignments_weight(mut self, weight: u32) -> Self {
        self.past_assignments_weight = weight;
        self
    }

    /// Zeroes every weight, leaving the trial count.
    pub fn zeroed(self) -> Self {
        Self {
            odd_even_pair_weight: 0,
            course_variety_weight: 0,
            preference_weight: 0,
            workload_distribution_weight: 0,
            past_assignments_weight: 0,
            trial_count: self.trial_count,
        }
    }
}

/// Failure to read or parse configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Could not read configuration: {msg}"),
            ConfigError::Parse(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per-run search settings.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Seed for trial shuffles; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Worker threads for trials; 0 uses every available core.
    pub threads: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Attaches a flag that aborts the run when set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Whether the attached cancellation flag is set.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let w = Weights::default();
        assert_eq!(w.odd_even_pair_weight, 40);
        assert_eq!(w.course_variety_weight, 30);
        assert_eq!(w.preference_weight, 25);
        assert_eq!(w.workload_distribution_weight, 20);
        assert_eq!(w.past_assignments_weight, 15);
        assert_eq!(w.trial_count, 30);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let w = Weights::from_json_str(r#"{"trial_count": 5, "preference_weight": 50}"#).unwrap();
        assert_eq!(w.trial_count, 5);
        assert_eq!(w.preference_weight, 50);
        assert_eq!(w.odd_even_pair_weight, 40);

        assert_eq!(Weights::from_json_str("{}").unwrap(), Weights::default());
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = Weights::from_json_str(r#"{"trial_count": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let w = Weights::default().with_trial_count(7);
        let json = w.to_json_string().unwrap();
        assert_eq!(Weights::from_json_str(&json).unwrap(), w);
    }

    #[test]
    fn test_missing_file() {
        let err = Weights::from_json_path("/nonexistent/weights.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let cfg = SearchConfig::new().with_cancel_flag(flag.clone());
        assert!(!cfg.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(cfg.is_cancelled());
        assert!(!SearchConfig::new().is_cancelled());
    }
}
