//! Seed positions and the per-category queues they arrive in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Puzzle output category. Declaration order is the order batches are
/// generated in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Weakness,
    Mistake,
    Opening,
    Endgame,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Weakness,
        Category::Mistake,
        Category::Opening,
        Category::Endgame,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Weakness => "weakness",
            Category::Mistake => "mistake",
            Category::Opening => "opening",
            Category::Endgame => "endgame",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown puzzle category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weakness" => Ok(Category::Weakness),
            "mistake" => Ok(Category::Mistake),
            "opening" => Ok(Category::Opening),
            "endgame" => Ok(Category::Endgame),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// A starting position a puzzle is built around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPosition {
    pub fen: String,
    pub category: Category,
    /// The move the player should have found, in UCI
    #[serde(default)]
    pub correct_move: Option<String>,
    /// Stable identifier from the upstream collector
    #[serde(default)]
    pub puzzle_id: Option<String>,
    #[serde(default)]
    pub eco: Option<String>,
}

impl SeedPosition {
    pub fn new(fen: impl Into<String>, category: Category) -> Self {
        Self {
            fen: fen.into(),
            category,
            correct_move: None,
            puzzle_id: None,
            eco: None,
        }
    }

    pub fn with_correct_move(mut self, uci: impl Into<String>) -> Self {
        self.correct_move = Some(uci.into());
        self
    }

    pub fn with_puzzle_id(mut self, id: impl Into<String>) -> Self {
        self.puzzle_id = Some(id.into());
        self
    }

    pub fn with_eco(mut self, eco: impl Into<String>) -> Self {
        self.eco = Some(eco.into());
        self
    }

    /// Deduplication key: the puzzle id if known, else `ECO|FEN`.
    pub fn identity_key(&self) -> String {
        match &self.puzzle_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => format!(
                "{}|{}",
                self.eco.as_deref().unwrap_or("").trim(),
                self.fen.trim()
            ),
        }
    }
}

/// Ordered candidates for one output category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedQueue {
    pub category: Category,
    pub seeds: Vec<SeedPosition>,
}

/// Split a flat seed list into per-category queues, keeping the input
/// order inside each queue. Empty categories are omitted.
pub fn group_seeds(seeds: Vec<SeedPosition>) -> Vec<SeedQueue> {
    let mut queues: Vec<SeedQueue> = Category::ALL
        .iter()
        .map(|&category| SeedQueue {
            category,
            seeds: Vec::new(),
        })
        .collect();

    for seed in seeds {
        if let Some(queue) = queues.iter_mut().find(|q| q.category == seed.category) {
            queue.seeds.push(seed);
        }
    }

    queues.retain(|q| !q.seeds.is_empty());
    queues
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    #[test]
    fn test_identity_key_prefers_puzzle_id() {
        let seed = SeedPosition::new(FEN, Category::Mistake)
            .with_eco("B00")
            .with_puzzle_id("abc123");
        assert_eq!(seed.identity_key(), "abc123");
    }

    #[test]
    fn test_identity_key_falls_back_to_eco_and_fen() {
        let seed = SeedPosition::new(FEN, Category::Opening).with_eco("B00");
        assert_eq!(seed.identity_key(), format!("B00|{FEN}"));

        let blank_id = SeedPosition::new(FEN, Category::Opening).with_puzzle_id("  ");
        assert_eq!(blank_id.identity_key(), format!("|{FEN}"));
    }

    #[test]
    fn test_category_round_trips_through_strings() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert_eq!("Endgame".parse::<Category>(), Ok(Category::Endgame));
        assert!("tactics".parse::<Category>().is_err());
    }

    #[test]
    fn test_seed_deserializes_with_optional_fields() {
        let seed: SeedPosition =
            serde_json::from_str(&format!(r#"{{"fen":"{FEN}","category":"endgame"}}"#)).unwrap();
        assert_eq!(seed.category, Category::Endgame);
        assert!(seed.correct_move.is_none());
    }

    #[test]
    fn test_group_seeds_keeps_order_and_drops_empty() {
        let seeds = vec![
            SeedPosition::new("a", Category::Endgame),
            SeedPosition::new("b", Category::Mistake),
            SeedPosition::new("c", Category::Endgame),
        ];
        let queues = group_seeds(seeds);
        assert_eq!(queues.len(), 2);
        assert_eq!(queues[0].category, Category::Mistake);
        assert_eq!(queues[1].category, Category::Endgame);
        let fens: Vec<&str> = queues[1].seeds.iter().map(|s| s.fen.as_str()).collect();
        assert_eq!(fens, vec!["a", "c"]);
    }
}
