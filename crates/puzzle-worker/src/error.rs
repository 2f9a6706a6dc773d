//! Worker error types

use puzzle_lines::BatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Secrets Manager error: {0}")]
    SecretsManager(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
