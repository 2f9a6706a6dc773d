//! Chess primitives shared by the puzzle pipeline and the worker.

pub mod fen;
pub mod moves;

pub use fen::{normalize_fen, parse_position, position_fen};
pub use moves::{apply_uci, has_legal_moves, replay_uci, AppliedMove, MoveError};
