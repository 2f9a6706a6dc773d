//! Puzzle persistence boundary.

use async_trait::async_trait;
use thiserror::Error;

use crate::puzzle::Puzzle;
use crate::seed::Category;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Stores accepted puzzles. Called once per puzzle; failures are not
/// retried.
#[async_trait]
pub trait PuzzleSink: Send {
    async fn save(
        &mut self,
        puzzle: &Puzzle,
        category: Category,
        index: usize,
    ) -> Result<(), SinkError>;
}

/// Keeps puzzles in memory, in save order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub saved: Vec<(Category, usize, Puzzle)>,
    /// Fail every save after this many succeeded
    pub fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_category(&self, category: Category) -> Vec<&Puzzle> {
        self.saved
            .iter()
            .filter(|(c, _, _)| *c == category)
            .map(|(_, _, p)| p)
            .collect()
    }
}

#[async_trait]
impl PuzzleSink for MemorySink {
    async fn save(
        &mut self,
        puzzle: &Puzzle,
        category: Category,
        index: usize,
    ) -> Result<(), SinkError> {
        if self.fail_after.is_some_and(|limit| self.saved.len() >= limit) {
            return Err(SinkError("storage unavailable".into()));
        }
        self.saved.push((category, index, puzzle.clone()));
        Ok(())
    }
}
