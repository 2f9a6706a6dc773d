//! Puzzle generation worker: hosts the line pipeline on a local Stockfish
//! process, reading seeds from Postgres or a JSON file.

pub mod config;
pub mod db;
pub mod error;
pub mod progress;
pub mod seeds;
pub mod sink;
pub mod stockfish;
