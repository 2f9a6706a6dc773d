//! Pipeline error types

use chess_core::MoveError;
use serde::Serialize;
use thiserror::Error;

/// Failure of a single analysis call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Analysis timed out after {budget_ms} ms")]
    Timeout { budget_ms: u64 },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine returned an empty principal variation")]
    EmptyPv,
}

/// Why an extension tier stopped adding moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The requested ply count was reached
    Target,
    /// The ply ceiling was reached before the target
    Ceiling,
    /// Checkmate or stalemate, no legal move left
    Terminal,
    Timeout,
    EngineError,
    EmptyPv,
    IllegalMove,
}

impl From<&AnalysisError> for StopReason {
    fn from(err: &AnalysisError) -> Self {
        match err {
            AnalysisError::Timeout { .. } => StopReason::Timeout,
            AnalysisError::Engine(_) => StopReason::EngineError,
            AnalysisError::EmptyPv => StopReason::EmptyPv,
        }
    }
}

/// Failure of an extension tier or of the whole enforcer for one seed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("Analysis failed before any move was found: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Illegal move: {0}")]
    IllegalMove(#[from] MoveError),

    #[error("No moves produced (last stop: {cause:?})")]
    EmptyResult { cause: Option<StopReason> },
}

impl LineError {
    /// The stop reason this failure corresponds to.
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            LineError::Analysis(e) => Some(StopReason::from(e)),
            LineError::IllegalMove(_) => Some(StopReason::IllegalMove),
            LineError::EmptyResult { cause } => *cause,
        }
    }
}

/// Batch-level failures, surfaced to the caller of the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Failed to persist puzzle {puzzle_id} ({saved} already saved): {reason}")]
    Persistence {
        puzzle_id: String,
        saved: usize,
        reason: String,
    },

    #[error("Analysis engine unavailable: {attempted} seeds attempted, no analysis succeeded")]
    EngineUnavailable { attempted: usize },
}
