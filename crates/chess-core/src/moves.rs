//! Move application: the only way a UCI move enters a puzzle line.
//!
//! Every function here applies moves through shakmaty's legality check,
//! so a move that comes back `Ok` is guaranteed playable in the given
//! position.

use shakmaty::{san::San, uci::UciMove, Chess, Position};
use thiserror::Error;

use crate::fen::{parse_position, position_fen};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Malformed UCI move '{uci}'")]
    MalformedUci { uci: String },

    #[error("Illegal move {uci} in position {fen}")]
    Illegal { fen: String, uci: String },
}

/// Result of applying a single move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// Position after the move
    pub fen: String,
    /// The move in SAN, with `+`/`#` suffix
    pub san: String,
}

/// Apply a UCI move to a FEN position.
pub fn apply_uci(fen: &str, uci: &str) -> Result<AppliedMove, MoveError> {
    let mut pos = parse_position(fen)?;
    let san = play_uci(&mut pos, fen, uci)?;
    Ok(AppliedMove {
        fen: position_fen(&pos),
        san,
    })
}

/// Replay a sequence of UCI moves from `start_fen`.
///
/// Returns the SAN of every move and the final position, or the first
/// move that fails to apply.
pub fn replay_uci<S: AsRef<str>>(
    start_fen: &str,
    moves: &[S],
) -> Result<(Vec<String>, String), MoveError> {
    let mut pos = parse_position(start_fen)?;
    let mut sans = Vec::with_capacity(moves.len());

    for uci in moves {
        let before = position_fen(&pos);
        sans.push(play_uci(&mut pos, &before, uci.as_ref())?);
    }

    Ok((sans, position_fen(&pos)))
}

/// True if the side to move has at least one legal move.
pub fn has_legal_moves(fen: &str) -> Result<bool, MoveError> {
    let pos = parse_position(fen)?;
    Ok(!pos.legal_moves().is_empty())
}

fn play_uci(pos: &mut Chess, fen: &str, uci: &str) -> Result<String, MoveError> {
    let uci_move: UciMove = uci.trim().parse().map_err(|_| MoveError::MalformedUci {
        uci: uci.to_string(),
    })?;
    let legal_move = uci_move.to_move(&*pos).map_err(|_| MoveError::Illegal {
        fen: fen.to_string(),
        uci: uci.to_string(),
    })?;

    let mut san = San::from_move(&*pos, legal_move.clone()).to_string();
    pos.play_unchecked(legal_move);

    if pos.is_checkmate() {
        san.push('#');
    } else if pos.is_check() {
        san.push('+');
    }

    Ok(san)
}
