//! Progress logging

use puzzle_lines::{ProgressEvent, ProgressObserver, SeedOutcome};
use tracing::{debug, info};

/// Logs accepted puzzles at info and everything else at debug.
#[derive(Debug, Default)]
pub struct TracingProgress {
    events: usize,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> usize {
        self.events
    }
}

impl ProgressObserver for TracingProgress {
    fn on_progress(&mut self, event: &ProgressEvent) {
        self.events += 1;
        let tier = event.tier.map(|t| t.as_str()).unwrap_or("none");
        match event.outcome {
            SeedOutcome::Accepted => info!(
                category = %event.category,
                seed = event.seed_index + 1,
                total = event.total_seeds,
                tier,
                plies = event.plies,
                cached = event.cached,
                "Puzzle accepted"
            ),
            outcome => debug!(
                category = %event.category,
                seed = event.seed_index + 1,
                total = event.total_seeds,
                ?outcome,
                tier,
                plies = event.plies,
                "Seed skipped"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzle_lines::{Category, Tier};

    #[test]
    fn test_counts_events() {
        let mut progress = TracingProgress::new();
        let mut event = ProgressEvent {
            category: Category::Endgame,
            seed_index: 0,
            total_seeds: 2,
            tier: Some(Tier::Primary),
            outcome: SeedOutcome::Accepted,
            cached: false,
            plies: 14,
        };
        progress.on_progress(&event);
        event.outcome = SeedOutcome::Failed;
        event.tier = None;
        progress.on_progress(&event);
        assert_eq!(progress.events(), 2);
    }
}
