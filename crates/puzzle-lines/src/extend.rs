//! Full-variation line extension.
//!
//! Asks the engine for a whole principal variation, keeps every move of it
//! that applies, and re-queries from the end of the line until the wanted
//! length or the ceiling is reached.

use chess_core::has_legal_moves;
use tracing::{debug, warn};

use crate::client::{AnalysisClient, PositionAnalyzer};
use crate::config::PipelineConfig;
use crate::error::{LineError, StopReason};
use crate::line::{ExtensionResult, LineSource, MoveLine};

/// Grow a line from `start_fen` toward `want_plies`, never past
/// `max_plies`.
///
/// The first call gets `config.first_call`, later calls `config.next_call`.
/// A failed call ends the extension: with moves already accumulated the
/// partial line is returned, with none the failure is returned so the
/// caller can move on to a cheaper strategy.
pub async fn extend_pv<A: PositionAnalyzer + ?Sized>(
    client: &mut AnalysisClient<'_, A>,
    start_fen: &str,
    want_plies: usize,
    max_plies: usize,
    config: &PipelineConfig,
) -> Result<ExtensionResult, LineError> {
    let mut line = MoveLine::new(start_fen)?;
    let mut calls = 0usize;

    let stop = loop {
        if line.len() >= want_plies {
            break StopReason::Target;
        }
        if line.len() >= max_plies {
            break StopReason::Ceiling;
        }
        if !has_legal_moves(line.end_fen())? {
            break StopReason::Terminal;
        }

        let budget = if calls == 0 {
            config.first_call
        } else {
            config.next_call
        };
        calls += 1;

        let pv = match client.analyze_deep(line.end_fen(), budget).await {
            Ok(pv) => pv,
            Err(e) if line.is_empty() => return Err(e.into()),
            Err(e) => {
                debug!(plies = line.len(), error = %e, "Keeping partial line");
                break StopReason::from(&e);
            }
        };

        if let Some(err) = consume_pv(&mut line, &pv, max_plies) {
            if line.is_empty() {
                return Err(err.into());
            }
            warn!(plies = line.len(), error = %err, "Engine line left legal play");
            break StopReason::IllegalMove;
        }
    };

    if line.is_empty() {
        return Err(LineError::EmptyResult { cause: Some(stop) });
    }

    Ok(ExtensionResult {
        reached_target: line.len() >= want_plies,
        line,
        source: LineSource::Primary,
        stop,
    })
}

/// Append PV moves until the ceiling; returns the first move that failed.
fn consume_pv(
    line: &mut MoveLine,
    pv: &[String],
    max_plies: usize,
) -> Option<chess_core::MoveError> {
    for uci in pv {
        if line.len() >= max_plies {
            break;
        }
        if let Err(e) = line.push(uci) {
            return Some(e);
        }
    }
    None
}
