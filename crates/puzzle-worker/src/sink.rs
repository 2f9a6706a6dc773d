//! JSON-lines output for runs without a database

use std::io::Write;

use async_trait::async_trait;
use puzzle_lines::{Category, Puzzle, PuzzleSink, SinkError};
use serde::Serialize;

#[derive(Serialize)]
struct PuzzleRecord<'a> {
    category: Category,
    index: usize,
    #[serde(flatten)]
    puzzle: &'a Puzzle,
}

/// Writes one JSON object per accepted puzzle.
pub struct JsonLinesSink<W> {
    out: W,
    written: usize,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> PuzzleSink for JsonLinesSink<W> {
    async fn save(
        &mut self,
        puzzle: &Puzzle,
        category: Category,
        index: usize,
    ) -> Result<(), SinkError> {
        let record = PuzzleRecord {
            category,
            index,
            puzzle,
        };
        let line = serde_json::to_string(&record).map_err(|e| SinkError(e.to_string()))?;
        writeln!(self.out, "{line}").map_err(|e| SinkError(e.to_string()))?;
        self.out.flush().map_err(|e| SinkError(e.to_string()))?;
        self.written += 1;
        Ok(())
    }
}
