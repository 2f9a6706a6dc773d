//! Finished puzzles.

use serde::Serialize;

use crate::enforcer::{EnforcedLine, Tier};
use crate::line::{LineSource, MoveLine};
use crate::seed::{Category, SeedPosition};

/// A seed plus the verified line that solves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Puzzle {
    pub id: String,
    pub seed: SeedPosition,
    pub line: MoveLine,
    pub ply_count: usize,
    /// Diagnostics: which tier family and tier produced the line
    pub source: LineSource,
    pub tier: Tier,
    pub reached_target: bool,
}

impl Puzzle {
    /// Build a puzzle from an enforced line. Seeds without an upstream
    /// id get `<category>-<index>`.
    pub fn from_line(
        seed: &SeedPosition,
        enforced: EnforcedLine,
        category: Category,
        index: usize,
    ) -> Self {
        let id = match &seed.puzzle_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => format!("{category}-{index}"),
        };
        let line = enforced.result.line;
        Self {
            id,
            seed: seed.clone(),
            ply_count: line.len(),
            line,
            source: enforced.result.source,
            tier: enforced.tier,
            reached_target: enforced.result.reached_target,
        }
    }

    /// Solver's moves: the side to move in the seed plays even plies.
    pub fn solver_moves(&self) -> impl Iterator<Item = &String> {
        self.line.moves().iter().step_by(2)
    }

    /// Opponent replies (odd plies).
    pub fn opponent_moves(&self) -> impl Iterator<Item = &String> {
        self.line.moves().iter().skip(1).step_by(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StopReason;
    use crate::line::ExtensionResult;
    use crate::testing::{ITALIAN_GAME, START_FEN};

    fn enforced(plies: usize) -> EnforcedLine {
        EnforcedLine {
            result: ExtensionResult {
                line: MoveLine::replay(START_FEN, &ITALIAN_GAME[..plies]).unwrap(),
                reached_target: plies >= 12,
                source: LineSource::Primary,
                stop: StopReason::Target,
            },
            tier: Tier::Primary,
        }
    }

    #[test]
    fn test_id_falls_back_to_category_and_index() {
        let seed = SeedPosition::new(START_FEN, Category::Opening);
        let puzzle = Puzzle::from_line(&seed, enforced(12), Category::Opening, 7);
        assert_eq!(puzzle.id, "opening-7");
        assert_eq!(puzzle.ply_count, 12);

        let named = seed.with_puzzle_id("lichess-0042");
        let puzzle = Puzzle::from_line(&named, enforced(12), Category::Opening, 7);
        assert_eq!(puzzle.id, "lichess-0042");
    }

    #[test]
    fn test_solver_and_opponent_moves_alternate() {
        let seed = SeedPosition::new(START_FEN, Category::Mistake);
        let puzzle = Puzzle::from_line(&seed, enforced(4), Category::Mistake, 0);
        let solver: Vec<&String> = puzzle.solver_moves().collect();
        let opponent: Vec<&String> = puzzle.opponent_moves().collect();
        assert_eq!(solver, ["e2e4", "g1f3"]);
        assert_eq!(opponent, ["e7e5", "b8c6"]);
    }

    #[test]
    fn test_serializes_line_and_diagnostics() {
        let seed = SeedPosition::new(START_FEN, Category::Mistake);
        let puzzle = Puzzle::from_line(&seed, enforced(2), Category::Mistake, 0);
        let json = serde_json::to_value(&puzzle).unwrap();
        assert_eq!(json["line"]["moves"], serde_json::json!(["e2e4", "e7e5"]));
        assert_eq!(json["line"]["sans"], serde_json::json!(["e4", "e5"]));
        assert_eq!(json["source"], "primary");
        assert_eq!(json["tier"], "primary");
        assert_eq!(json["seed"]["category"], "mistake");
    }
}
