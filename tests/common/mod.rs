#![allow(dead_code)]

use chess_core::replay_uci;
use puzzle_lines::testing::{ITALIAN_GAME, START_FEN};
use puzzle_lines::{Category, SeedPosition, SeedQueue};

/// Position after the first `plies` moves of the fixture game.
pub fn fen_after(plies: usize) -> String {
    replay_uci(START_FEN, &ITALIAN_GAME[..plies])
        .expect("fixture game is legal")
        .1
}

/// A legal position the scripted analyzer knows nothing about, so every
/// call on it comes back with an empty variation. `n` varies the move
/// counters so each one is a distinct FEN.
pub fn dead_fen(n: usize) -> String {
    format!("8/8/8/4k3/8/8/4P3/4K3 w - - 0 {}", n + 1)
}

/// Seed for a fixture position with a unique id.
pub fn live_seed(category: Category, plies: usize, id: &str) -> SeedPosition {
    SeedPosition::new(fen_after(plies), category).with_puzzle_id(id)
}

pub fn dead_seed(category: Category, n: usize) -> SeedPosition {
    SeedPosition::new(dead_fen(n), category).with_puzzle_id(format!("dead-{n}"))
}

pub fn queue(category: Category, seeds: Vec<SeedPosition>) -> SeedQueue {
    SeedQueue { category, seeds }
}
