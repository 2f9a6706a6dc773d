//! Puzzle line extension pipeline.
//!
//! Turns a seed position (a player's mistake, or a curated opening or
//! endgame position) into a verified, multi-ply move line suitable for an
//! interactive puzzle, using a slow and unreliable analysis engine.
//!
//! Layers, leaf first:
//! - [`client`]: the analysis boundary and its per-call timeout guard
//! - [`extend`]: full-variation line extension
//! - [`stepwise`]: one-ply-at-a-time extension with smaller budgets
//! - [`enforcer`]: the five-tier minimum-line state machine
//! - [`orchestrator`]: batch generation, deduplication and position reuse

pub mod client;
pub mod config;
pub mod enforcer;
pub mod error;
pub mod extend;
pub mod line;
pub mod orchestrator;
pub mod progress;
pub mod puzzle;
pub mod seed;
pub mod sink;
pub mod stepwise;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{Analysis, AnalysisClient, ClientStats, PositionAnalyzer};
pub use config::PipelineConfig;
pub use enforcer::{enforce_min_line, EnforcedLine, Tier};
pub use error::{AnalysisError, BatchError, LineError, StopReason};
pub use extend::extend_pv;
pub use line::{ExtensionResult, LineSource, MoveLine};
pub use orchestrator::{BatchReport, CategoryReport, DedupSet, LineCache, PuzzleBatch};
pub use progress::{NoProgress, ProgressEvent, ProgressObserver, SeedOutcome};
pub use puzzle::Puzzle;
pub use seed::{group_seeds, Category, SeedPosition, SeedQueue};
pub use sink::{MemorySink, PuzzleSink, SinkError};
pub use stepwise::stepwise_extend;
