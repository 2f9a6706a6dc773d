//! Database queries for seed fetching and puzzle storage

use async_trait::async_trait;
use puzzle_lines::{group_seeds, Category, Puzzle, PuzzleSink, SeedPosition, SeedQueue, SinkError};
use sqlx::PgPool;
use tracing::warn;

use crate::error::WorkerError;

type SeedRow = (String, String, Option<String>, Option<String>, Option<String>);

/// Fetch a user's seed positions, grouped into per-category queues in
/// collection order. Rows with an unknown category are skipped.
pub async fn fetch_seeds(pool: &PgPool, user_id: i64) -> Result<Vec<SeedQueue>, WorkerError> {
    let rows: Vec<SeedRow> = sqlx::query_as(
        r#"SELECT fen, category, correct_move, puzzle_id, eco
        FROM puzzle_seeds
        WHERE user_id = $1
        ORDER BY id"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(group_seeds(seeds_from_rows(rows)))
}

fn seeds_from_rows(rows: Vec<SeedRow>) -> Vec<SeedPosition> {
    rows.into_iter()
        .filter_map(|(fen, category, correct_move, puzzle_id, eco)| {
            let category: Category = match category.parse() {
                Ok(category) => category,
                Err(e) => {
                    warn!(fen = %fen, error = %e, "Skipping seed");
                    return None;
                }
            };
            Some(SeedPosition {
                fen,
                category,
                correct_move: correct_move.filter(|m| !m.trim().is_empty()),
                puzzle_id,
                eco,
            })
        })
        .collect()
}

/// Writes accepted puzzles to `generated_puzzles`, one row per
/// (user, category, index). Re-running a batch overwrites its rows.
pub struct PgPuzzleSink {
    pool: PgPool,
    user_id: i64,
}

impl PgPuzzleSink {
    pub fn new(pool: PgPool, user_id: i64) -> Self {
        Self { pool, user_id }
    }

    async fn upsert(
        &self,
        puzzle: &Puzzle,
        category: Category,
        index: usize,
    ) -> Result<(), WorkerError> {
        let idx = i32::try_from(index)
            .map_err(|_| WorkerError::Seed(format!("puzzle index {index} out of range")))?;
        let ply_count = i32::try_from(puzzle.ply_count)
            .map_err(|_| WorkerError::Seed(format!("ply count {} out of range", puzzle.ply_count)))?;

        sqlx::query(
            r#"INSERT INTO generated_puzzles (
                user_id, category, idx, puzzle_id, fen,
                moves, sans, ply_count, source, tier, generated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, category, idx) DO UPDATE SET
                puzzle_id = EXCLUDED.puzzle_id,
                fen = EXCLUDED.fen,
                moves = EXCLUDED.moves,
                sans = EXCLUDED.sans,
                ply_count = EXCLUDED.ply_count,
                source = EXCLUDED.source,
                tier = EXCLUDED.tier,
                generated_at = EXCLUDED.generated_at"#,
        )
        .bind(self.user_id)
        .bind(category.as_str())
        .bind(idx)
        .bind(&puzzle.id)
        .bind(puzzle.line.start_fen())
        .bind(serde_json::json!(puzzle.line.moves()))
        .bind(serde_json::json!(puzzle.line.sans()))
        .bind(ply_count)
        .bind(puzzle.source.as_str())
        .bind(i16::from(puzzle.tier.number()))
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PuzzleSink for PgPuzzleSink {
    async fn save(
        &mut self,
        puzzle: &Puzzle,
        category: Category,
        index: usize,
    ) -> Result<(), SinkError> {
        self.upsert(puzzle, category, index)
            .await
            .map_err(|e| SinkError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_grouped_and_unknown_skipped() {
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let rows: Vec<SeedRow> = vec![
            (start.into(), "opening".into(), Some("e2e4".into()), None, Some("C50".into())),
            (start.into(), "tactics".into(), None, None, None),
            (start.into(), "Weakness".into(), Some("  ".into()), Some("w-1".into()), None),
        ];
        let seeds = seeds_from_rows(rows);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].category, Category::Opening);
        assert_eq!(seeds[0].correct_move.as_deref(), Some("e2e4"));
        assert_eq!(seeds[1].category, Category::Weakness);
        assert_eq!(seeds[1].correct_move, None);

        let queues = group_seeds(seeds);
        assert_eq!(queues.len(), 2);
        assert_eq!(queues[0].category, Category::Weakness);
    }
}
