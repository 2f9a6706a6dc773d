//! Validated move lines and the result type every extension tier returns.

use chess_core::{apply_uci, parse_position, MoveError};
use serde::{Deserialize, Serialize};

use crate::error::StopReason;

/// An ordered sequence of UCI moves from a starting position.
///
/// A move only enters the line after it has been legally applied to the
/// position reached by the moves before it, so replaying a `MoveLine`
/// from its start never fails. Lines only grow, except for
/// [`MoveLine::truncate`] which cuts a valid suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveLine {
    start_fen: String,
    moves: Vec<String>,
    sans: Vec<String>,
    /// Position after each move
    #[serde(skip)]
    positions: Vec<String>,
}

impl MoveLine {
    /// An empty line starting at `start_fen`.
    pub fn new(start_fen: &str) -> Result<Self, MoveError> {
        parse_position(start_fen)?;
        Ok(Self {
            start_fen: start_fen.trim().to_string(),
            moves: Vec::new(),
            sans: Vec::new(),
            positions: Vec::new(),
        })
    }

    /// Build a line by applying `moves` in order from `start_fen`.
    pub fn replay<S: AsRef<str>>(start_fen: &str, moves: &[S]) -> Result<Self, MoveError> {
        let mut line = Self::new(start_fen)?;
        for uci in moves {
            line.push(uci.as_ref())?;
        }
        Ok(line)
    }

    /// Apply `uci` to the end position and append it.
    pub fn push(&mut self, uci: &str) -> Result<(), MoveError> {
        let applied = apply_uci(self.end_fen(), uci)?;
        self.moves.push(uci.trim().to_string());
        self.sans.push(applied.san);
        self.positions.push(applied.fen);
        Ok(())
    }

    /// Append every move of `tail`, replaying it from this line's end.
    ///
    /// On error the moves that did apply stay appended.
    pub fn concat(&mut self, tail: &MoveLine) -> Result<(), MoveError> {
        for uci in &tail.moves {
            self.push(uci)?;
        }
        Ok(())
    }

    /// Keep at most `plies` moves.
    pub fn truncate(&mut self, plies: usize) {
        self.moves.truncate(plies);
        self.sans.truncate(plies);
        self.positions.truncate(plies);
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn end_fen(&self) -> &str {
        self.positions.last().unwrap_or(&self.start_fen)
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn sans(&self) -> &[String] {
        &self.sans
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Which fallback tier family produced a line. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    Primary,
    Stepwise,
    Enforced,
}

impl LineSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineSource::Primary => "primary",
            LineSource::Stepwise => "stepwise",
            LineSource::Enforced => "enforced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionResult {
    pub line: MoveLine,
    pub reached_target: bool,
    pub source: LineSource,
    pub stop: StopReason,
}
