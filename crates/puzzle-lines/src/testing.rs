//! Scripted analyzer for tests.
//!
//! Answers from a table of known lines: every position along a registered
//! line maps to the moves that follow it. A per-call script can override
//! the answer with timeouts, engine errors, stalls or truncated PVs, and
//! every call is logged so tests can assert tier order and budgets.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chess_core::{normalize_fen, MoveError};

use crate::client::{Analysis, PositionAnalyzer};
use crate::error::AnalysisError;
use crate::line::MoveLine;

/// Scripted answer for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The full known continuation from the queried position
    Line,
    /// The first `n` moves of the known continuation
    Pv(usize),
    /// Exactly these moves, known or not
    Moves(Vec<String>),
    Timeout,
    EngineError,
    /// Never answer; the client deadline has to cut the call
    Stall,
}

/// One logged call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub fen: String,
    pub depth: u32,
    pub budget: Duration,
}

#[derive(Debug, Clone)]
pub struct ScriptedAnalyzer {
    book: HashMap<String, Vec<String>>,
    script: VecDeque<Reply>,
    fallback: Reply,
    calls: Vec<Call>,
}

impl Default for ScriptedAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedAnalyzer {
    /// An analyzer that knows no lines and answers [`Reply::Line`].
    pub fn new() -> Self {
        Self {
            book: HashMap::new(),
            script: VecDeque::new(),
            fallback: Reply::Line,
            calls: Vec::new(),
        }
    }

    /// Register `moves` from `start_fen`; every position along the line
    /// answers with the remainder of it.
    pub fn with_line(mut self, start_fen: &str, moves: &[&str]) -> Result<Self, MoveError> {
        let line = MoveLine::replay(start_fen, moves)?;
        let mut fen = line.start_fen().to_string();
        for (i, uci) in moves.iter().enumerate() {
            self.book.insert(
                normalize_fen(&fen),
                moves[i..].iter().map(|m| m.to_string()).collect(),
            );
            fen = chess_core::apply_uci(&fen, uci)?.fen;
        }
        Ok(self)
    }

    /// Queue replies for the next calls, in order.
    pub fn script(mut self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.script.extend(replies);
        self
    }

    /// Reply used once the script is exhausted.
    pub fn fallback(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Budgets of all calls so far, in milliseconds.
    pub fn budgets_ms(&self) -> Vec<u64> {
        self.calls
            .iter()
            .map(|c| c.budget.as_millis() as u64)
            .collect()
    }

    fn known(&self, fen: &str) -> Vec<String> {
        self.book
            .get(&normalize_fen(fen))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PositionAnalyzer for ScriptedAnalyzer {
    async fn analyze(
        &mut self,
        fen: &str,
        depth: u32,
        budget: Duration,
    ) -> Result<Analysis, AnalysisError> {
        self.calls.push(Call {
            fen: fen.to_string(),
            depth,
            budget,
        });

        let reply = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let pv = match reply {
            Reply::Line => self.known(fen),
            Reply::Pv(n) => self.known(fen).into_iter().take(n).collect(),
            Reply::Moves(moves) => moves,
            Reply::Timeout => {
                return Err(AnalysisError::Timeout {
                    budget_ms: budget.as_millis() as u64,
                })
            }
            Reply::EngineError => {
                return Err(AnalysisError::Engine("scripted engine failure".into()))
            }
            Reply::Stall => {
                tokio::time::sleep(budget * 10).await;
                return Err(AnalysisError::Engine("stalled call was not cancelled".into()));
            }
        };

        Ok(Analysis {
            pv,
            cp: None,
            mate: None,
            depth: Some(depth),
        })
    }
}

/// The standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A quiet Giuoco Pianissimo, 26 legal plies from [`START_FEN`].
pub const ITALIAN_GAME: [&str; 26] = [
    "e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "c2c3", "g8f6", "d2d3", "d7d6", "e1g1",
    "e8g8", "f1e1", "a7a6", "c4b3", "c5a7", "h2h3", "h7h6", "b1d2", "f8e8", "d2f1", "c8e6",
    "b3c2", "d6d5", "e4d5", "e6d5",
];

/// Analyzer that knows [`ITALIAN_GAME`] from every position along it.
pub fn italian_analyzer() -> ScriptedAnalyzer {
    match ScriptedAnalyzer::new().with_line(START_FEN, &ITALIAN_GAME) {
        Ok(engine) => engine,
        Err(e) => panic!("fixture line is not legal: {e}"),
    }
}
