//! Progress events for callers that want to watch a batch.

use serde::Serialize;

use crate::enforcer::Tier;
use crate::seed::Category;

/// What happened to one seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    Accepted,
    Duplicate,
    /// A line was found but it is shorter than the hard floor
    BelowFloor,
    /// No tier produced a move
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub category: Category,
    /// Position of the seed in its category queue
    pub seed_index: usize,
    pub total_seeds: usize,
    /// Tier that produced the line, if one did
    pub tier: Option<Tier>,
    pub outcome: SeedOutcome,
    /// The line was reused from an earlier seed with the same position
    pub cached: bool,
    pub plies: usize,
}

/// Receives one event per processed seed.
pub trait ProgressObserver {
    fn on_progress(&mut self, event: &ProgressEvent);
}

impl<F: FnMut(&ProgressEvent)> ProgressObserver for F {
    fn on_progress(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}
