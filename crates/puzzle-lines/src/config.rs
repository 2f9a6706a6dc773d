//! Pipeline policy: search depth, time budgets and ply targets.

use std::time::Duration;

use crate::error::BatchError;

/// Engine search depth for every analysis call
pub const DEFAULT_DEPTH: u32 = 22;

/// Budget for the first full-variation call of a line
pub const FIRST_CALL_MS: u64 = 3000;

/// Budget for every subsequent full-variation call
pub const NEXT_CALL_MS: u64 = 1500;

/// Per-ply budget for the first stepwise attempt (tier 3)
pub const STEPWISE_FAST_MS: u64 = 1000;

/// Per-ply budget for the later stepwise attempts (tiers 4 and 5)
pub const STEPWISE_SLOW_MS: u64 = 1200;

/// Plies the full-variation extender aims for
pub const WANT_PLIES: usize = 12;

/// Minimum line length every tier tries to reach
pub const MIN_PLIES: usize = 12;

/// Maximum puzzle line length (in half-moves)
pub const MAX_PLIES: usize = 20;

/// Lines shorter than this are discarded instead of becoming puzzles
pub const HARD_FLOOR: usize = 12;

/// Puzzles generated per output category
pub const PUZZLES_PER_CATEGORY: usize = 30;

/// Slack added to each budget before the client cancels a call outright
pub const CLIENT_GRACE_MS: u64 = 250;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub depth: u32,
    pub first_call: Duration,
    pub next_call: Duration,
    pub stepwise_fast: Duration,
    pub stepwise_slow: Duration,
    pub want_plies: usize,
    pub min_plies: usize,
    pub max_plies: usize,
    pub hard_floor: usize,
    pub quota: usize,
    pub grace: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            first_call: Duration::from_millis(FIRST_CALL_MS),
            next_call: Duration::from_millis(NEXT_CALL_MS),
            stepwise_fast: Duration::from_millis(STEPWISE_FAST_MS),
            stepwise_slow: Duration::from_millis(STEPWISE_SLOW_MS),
            want_plies: WANT_PLIES,
            min_plies: MIN_PLIES,
            max_plies: MAX_PLIES,
            hard_floor: HARD_FLOOR,
            quota: PUZZLES_PER_CATEGORY,
            grace: Duration::from_millis(CLIENT_GRACE_MS),
        }
    }
}

impl PipelineConfig {
    /// Reject combinations the pipeline cannot honor.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.depth == 0 {
            return Err(BatchError::InvalidConfig("depth must be at least 1"));
        }
        let budgets = [
            self.first_call,
            self.next_call,
            self.stepwise_fast,
            self.stepwise_slow,
        ];
        if budgets.iter().any(Duration::is_zero) {
            return Err(BatchError::InvalidConfig("time budgets must be positive"));
        }
        if self.min_plies == 0 || self.want_plies == 0 {
            return Err(BatchError::InvalidConfig("ply targets must be positive"));
        }
        if self.want_plies < self.min_plies {
            return Err(BatchError::InvalidConfig(
                "want_plies must not be below min_plies",
            ));
        }
        if self.max_plies < self.min_plies || self.max_plies < self.want_plies {
            return Err(BatchError::InvalidConfig(
                "max_plies must not be below the ply targets",
            ));
        }
        if self.hard_floor == 0 || self.hard_floor > self.max_plies {
            return Err(BatchError::InvalidConfig(
                "hard_floor must be between 1 and max_plies",
            ));
        }
        Ok(())
    }
}
