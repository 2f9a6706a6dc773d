//! One-ply-at-a-time extension.
//!
//! Slower than [`crate::extend::extend_pv`] but each call is cheap: only
//! the engine's top move is kept and the next position is analyzed from
//! scratch with a small, uniform budget.

use std::time::Duration;

use chess_core::{has_legal_moves, MoveError};
use tracing::debug;

use crate::client::{AnalysisClient, PositionAnalyzer};
use crate::error::StopReason;
use crate::line::{ExtensionResult, LineSource, MoveLine};

/// Extend from `start_fen` one ply per call until `min_plies` or
/// `max_plies` is reached or a call fails.
///
/// Failures end the loop and whatever accumulated is returned, possibly
/// nothing; callers treat a short result as insufficient. Only an
/// unparseable start position is an error.
pub async fn stepwise_extend<A: PositionAnalyzer + ?Sized>(
    client: &mut AnalysisClient<'_, A>,
    start_fen: &str,
    min_plies: usize,
    max_plies: usize,
    per_ply: Duration,
) -> Result<ExtensionResult, MoveError> {
    let mut line = MoveLine::new(start_fen)?;

    let stop = loop {
        if line.len() >= min_plies {
            break StopReason::Target;
        }
        if line.len() >= max_plies {
            break StopReason::Ceiling;
        }
        if !has_legal_moves(line.end_fen())? {
            break StopReason::Terminal;
        }

        let best = match client.analyze_deep(line.end_fen(), per_ply).await {
            Ok(pv) => pv.into_iter().next(),
            Err(e) => break StopReason::from(&e),
        };
        let Some(best) = best else {
            break StopReason::EmptyPv;
        };

        if let Err(e) = line.push(&best) {
            debug!(plies = line.len(), error = %e, "Stepwise move rejected");
            break StopReason::IllegalMove;
        }
    };

    debug!(
        plies = line.len(),
        ?stop,
        per_ply_ms = per_ply.as_millis() as u64,
        "Stepwise extension done"
    );

    Ok(ExtensionResult {
        reached_target: line.len() >= min_plies,
        line,
        source: LineSource::Stepwise,
        stop,
    })
}
