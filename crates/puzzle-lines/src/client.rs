//! Analysis boundary: the engine trait and the timeout guard around it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::AnalysisError;

/// Result of a single position analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Principal variation in UCI notation
    pub pv: Vec<String>,
    /// Centipawn score from the side to move
    pub cp: Option<i32>,
    /// Mate in N (positive = side to move mates)
    pub mate: Option<i32>,
    /// Depth the reported line was searched to
    pub depth: Option<u32>,
}

/// An engine that can analyze one position at a time.
///
/// Calls take `&mut self`: an engine is an exclusive resource and no two
/// lines may query it concurrently. Each call is independent; no search
/// state carries over from the previous one.
#[async_trait]
pub trait PositionAnalyzer: Send {
    /// Analyze `fen` to `depth`. Implementations should give up once
    /// `budget` has elapsed and return [`AnalysisError::Timeout`].
    async fn analyze(
        &mut self,
        fen: &str,
        depth: u32,
        budget: Duration,
    ) -> Result<Analysis, AnalysisError>;
}

/// Call counters, used to tell an unavailable engine from bad seeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientStats {
    pub calls: usize,
    pub successes: usize,
    pub timeouts: usize,
    pub failures: usize,
}

/// Guards an analyzer with a hard per-call deadline and a non-empty PV
/// contract.
pub struct AnalysisClient<'a, A: ?Sized> {
    engine: &'a mut A,
    depth: u32,
    grace: Duration,
    stats: ClientStats,
}

impl<'a, A: PositionAnalyzer + ?Sized> AnalysisClient<'a, A> {
    pub fn new(engine: &'a mut A, depth: u32, grace: Duration) -> Self {
        Self {
            engine,
            depth,
            grace,
            stats: ClientStats::default(),
        }
    }

    /// Analyze `fen` and return a non-empty principal variation.
    ///
    /// The engine gets `budget` plus the grace margin; after that the call
    /// is dropped and reported as a timeout of `budget`.
    pub async fn analyze_deep(
        &mut self,
        fen: &str,
        budget: Duration,
    ) -> Result<Vec<String>, AnalysisError> {
        self.stats.calls += 1;
        let budget_ms = budget.as_millis() as u64;

        let outcome = match tokio::time::timeout(
            budget + self.grace,
            self.engine.analyze(fen, self.depth, budget),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout { budget_ms }),
        };

        let outcome = outcome.and_then(|analysis| {
            if analysis.pv.is_empty() {
                Err(AnalysisError::EmptyPv)
            } else {
                Ok(analysis.pv)
            }
        });

        match &outcome {
            Ok(pv) => {
                self.stats.successes += 1;
                debug!(fen, budget_ms, pv_len = pv.len(), "Analysis complete");
            }
            Err(AnalysisError::Timeout { .. }) => {
                self.stats.timeouts += 1;
                debug!(fen, budget_ms, "Analysis timed out");
            }
            Err(e) => {
                self.stats.failures += 1;
                debug!(fen, budget_ms, error = %e, "Analysis failed");
            }
        }

        outcome
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }
}
