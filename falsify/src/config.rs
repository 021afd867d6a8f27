//! Run configuration and engine-wide defaults.

use std::fmt;

/// Default number of iterations for a linear property run.
pub const DEFAULT_NUM_RUNS: u32 = 100;
/// Discard cap, expressed as a multiple of the iteration count.
pub const DEFAULT_DISCARD_RATIO: u32 = 10;
/// Default retry cap for `filter`ed generators before the run is exhausted.
pub const DEFAULT_FILTER_RETRIES: u32 = 1000;
/// Default tolerance for pruning a filtered shrink tree: this many
/// consecutive rejected candidates cut the rest of a path.
pub const DEFAULT_FILTER_TOLERANCE: usize = 5;
/// Default minimum length for containers and strings.
pub const DEFAULT_MIN_SIZE: usize = 0;
/// Default maximum length for containers and strings.
pub const DEFAULT_MAX_SIZE: usize = 200;
/// Probability that an optional generator produces `Some`.
pub const DEFAULT_SOME_PROBABILITY: f64 = 0.95;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Iteration count must be greater than zero.
    InvalidNumRuns(u32),
    /// Discard ratio must be greater than zero.
    InvalidDiscardRatio(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumRuns(n) => {
                write!(f, "invalid iteration count: {} (must be > 0)", n)
            }
            ConfigError::InvalidDiscardRatio(n) => {
                write!(f, "invalid discard ratio: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per-property run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Number of passing iterations required for the run to succeed.
    pub num_runs: u32,
    /// Seed for the random source; `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Discard cap multiplier: a run aborts with `Exhausted` once
    /// `num_runs * discard_ratio` iterations have been discarded.
    pub discard_ratio: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_runs: DEFAULT_NUM_RUNS,
            seed: None,
            discard_ratio: DEFAULT_DISCARD_RATIO,
        }
    }
}

impl Config {
    /// Create a validated configuration.
    pub fn new(num_runs: u32) -> Result<Self, ConfigError> {
        if num_runs == 0 {
            return Err(ConfigError::InvalidNumRuns(num_runs));
        }
        Ok(Self {
            num_runs,
            ..Self::default()
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_runs == 0 {
            return Err(ConfigError::InvalidNumRuns(self.num_runs));
        }
        if self.discard_ratio == 0 {
            return Err(ConfigError::InvalidDiscardRatio(self.discard_ratio));
        }
        Ok(())
    }

    /// Absolute number of discards tolerated before the run is exhausted.
    pub fn discard_limit(&self) -> u32 {
        self.num_runs.saturating_mul(self.discard_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.num_runs, 100);
        assert_eq!(config.seed, None);
        assert_eq!(config.discard_limit(), 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_runs() {
        assert_eq!(Config::new(0), Err(ConfigError::InvalidNumRuns(0)));
        let mut config = Config::default();
        config.discard_ratio = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDiscardRatio(0))
        );
    }
}
