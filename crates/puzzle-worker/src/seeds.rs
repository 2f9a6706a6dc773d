//! Seed loading from a JSON-lines file

use std::path::Path;

use puzzle_lines::{group_seeds, SeedPosition, SeedQueue};

use crate::error::WorkerError;

/// Read one `SeedPosition` object per line. Blank lines and lines
/// starting with `#` are ignored.
pub fn read_seeds_file(path: &Path) -> Result<Vec<SeedQueue>, WorkerError> {
    let contents = std::fs::read_to_string(path)?;
    parse_seeds(&contents)
}

pub fn parse_seeds(contents: &str) -> Result<Vec<SeedQueue>, WorkerError> {
    let mut seeds = Vec::new();
    for (n, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let seed: SeedPosition = serde_json::from_str(line)
            .map_err(|e| WorkerError::Seed(format!("line {}: {e}", n + 1)))?;
        seeds.push(seed);
    }
    Ok(group_seeds(seeds))
}
