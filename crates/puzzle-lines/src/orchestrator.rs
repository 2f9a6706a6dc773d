//! Batch orchestration: seeds in, deduplicated puzzles out.
//!
//! Seeds are processed one at a time in queue order. The deduplication
//! set and the position-reuse cache belong to the batch and are only
//! written once a seed's pipeline has fully resolved and its puzzle has
//! been saved.

use std::collections::{BTreeMap, HashMap, HashSet};

use chess_core::normalize_fen;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::{AnalysisClient, ClientStats, PositionAnalyzer};
use crate::config::PipelineConfig;
use crate::enforcer::{enforce_min_line, EnforcedLine, Tier};
use crate::error::{BatchError, StopReason};
use crate::line::{ExtensionResult, LineSource, MoveLine};
use crate::progress::{ProgressEvent, ProgressObserver, SeedOutcome};
use crate::puzzle::Puzzle;
use crate::seed::{Category, SeedQueue};
use crate::sink::PuzzleSink;

/// Identity keys of accepted puzzles, per output category.
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    keys: HashMap<Category, HashSet<String>>,
}

impl DedupSet {
    pub fn contains(&self, category: Category, key: &str) -> bool {
        self.keys
            .get(&category)
            .is_some_and(|keys| keys.contains(key))
    }

    /// Returns false if the key was already present.
    pub fn insert(&mut self, category: Category, key: String) -> bool {
        self.keys.entry(category).or_default().insert(key)
    }

    pub fn len(&self, category: Category) -> usize {
        self.keys.get(&category).map_or(0, HashSet::len)
    }
}

#[derive(Debug, Clone)]
struct CachedLine {
    moves: Vec<String>,
    tier: Tier,
    source: LineSource,
    reached_target: bool,
    stop: StopReason,
}

impl From<&EnforcedLine> for CachedLine {
    fn from(enforced: &EnforcedLine) -> Self {
        Self {
            moves: enforced.result.line.moves().to_vec(),
            tier: enforced.tier,
            source: enforced.result.source,
            reached_target: enforced.result.reached_target,
            stop: enforced.result.stop,
        }
    }
}

/// Accepted lines keyed by normalized FEN, reused when a position recurs.
#[derive(Debug, Clone, Default)]
pub struct LineCache {
    lines: HashMap<String, CachedLine>,
}

impl LineCache {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The cached line for `fen`, replayed from `fen` itself so it is
    /// valid for this seed.
    pub fn lookup(&self, fen: &str) -> Option<EnforcedLine> {
        let cached = self.lines.get(&normalize_fen(fen))?;
        let line = MoveLine::replay(fen, &cached.moves).ok()?;
        Some(EnforcedLine {
            result: ExtensionResult {
                line,
                reached_target: cached.reached_target,
                source: cached.source,
                stop: cached.stop,
            },
            tier: cached.tier,
        })
    }

    fn insert(&mut self, fen: &str, line: CachedLine) {
        self.lines.insert(normalize_fen(fen), line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    /// Seeds taken off the queue
    pub consumed: usize,
    /// Seeds that ran through the line pipeline
    pub analyzed: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub below_floor: usize,
    pub failed: usize,
    pub cached: usize,
    /// Accepted puzzles per producing tier
    pub tiers: BTreeMap<Tier, usize>,
}

impl CategoryReport {
    fn new(category: Category) -> Self {
        Self {
            category,
            consumed: 0,
            analyzed: 0,
            accepted: 0,
            duplicates: 0,
            below_floor: 0,
            failed: 0,
            cached: 0,
            tiers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub categories: Vec<CategoryReport>,
    pub analysis: ClientStats,
}

impl BatchReport {
    pub fn total_accepted(&self) -> usize {
        self.categories.iter().map(|c| c.accepted).sum()
    }

    pub fn total_analyzed(&self) -> usize {
        self.categories.iter().map(|c| c.analyzed).sum()
    }

    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// One batch-generation run. Owns the deduplication set and the
/// position-reuse cache for its lifetime.
#[derive(Debug, Clone)]
pub struct PuzzleBatch {
    config: PipelineConfig,
    dedup: DedupSet,
    cache: LineCache,
}

impl PuzzleBatch {
    pub fn new(config: PipelineConfig) -> Result<Self, BatchError> {
        config.validate()?;
        Ok(Self {
            config,
            dedup: DedupSet::default(),
            cache: LineCache::default(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dedup(&self) -> &DedupSet {
        &self.dedup
    }

    pub fn cache(&self) -> &LineCache {
        &self.cache
    }

    /// Generate up to `config.quota` puzzles for each queue, in order.
    ///
    /// Bad seeds are skipped. The run only fails when the sink fails, or
    /// when seeds were analyzed but the engine never answered once and no
    /// puzzle came out.
    pub async fn run<A, S, P>(
        &mut self,
        engine: &mut A,
        queues: &[SeedQueue],
        sink: &mut S,
        progress: &mut P,
    ) -> Result<BatchReport, BatchError>
    where
        A: PositionAnalyzer + ?Sized,
        S: PuzzleSink + ?Sized,
        P: ProgressObserver + ?Sized,
    {
        let mut client = AnalysisClient::new(engine, self.config.depth, self.config.grace);
        let mut report = BatchReport::default();

        for queue in queues {
            let saved_before = report.total_accepted();
            let category = self
                .run_category(&mut client, queue, sink, progress, saved_before)
                .await?;
            report.categories.push(category);
        }

        report.analysis = client.stats();
        let attempted = report.total_analyzed();
        if report.total_accepted() == 0 && attempted > 0 && report.analysis.successes == 0 {
            warn!(attempted, "No analysis call succeeded during the batch");
            return Err(BatchError::EngineUnavailable { attempted });
        }

        info!(
            accepted = report.total_accepted(),
            analyzed = attempted,
            calls = report.analysis.calls,
            timeouts = report.analysis.timeouts,
            "Batch complete"
        );
        Ok(report)
    }

    async fn run_category<A, S, P>(
        &mut self,
        client: &mut AnalysisClient<'_, A>,
        queue: &SeedQueue,
        sink: &mut S,
        progress: &mut P,
        saved_before: usize,
    ) -> Result<CategoryReport, BatchError>
    where
        A: PositionAnalyzer + ?Sized,
        S: PuzzleSink + ?Sized,
        P: ProgressObserver + ?Sized,
    {
        let category = queue.category;
        let total_seeds = queue.seeds.len();
        let quota = self.config.quota;
        let mut report = CategoryReport::new(category);
        info!(%category, total_seeds, quota, "Generating puzzles");

        for (seed_index, seed) in queue.seeds.iter().enumerate() {
            if report.accepted >= quota {
                break;
            }
            report.consumed += 1;

            let mut event = ProgressEvent {
                category,
                seed_index,
                total_seeds,
                tier: None,
                outcome: SeedOutcome::Duplicate,
                cached: false,
                plies: 0,
            };

            let key = seed.identity_key();
            if self.dedup.contains(category, &key) {
                report.duplicates += 1;
                progress.on_progress(&event);
                continue;
            }

            let (enforced, cached) = match self.cache.lookup(&seed.fen) {
                Some(enforced) => (enforced, true),
                None => {
                    report.analyzed += 1;
                    match enforce_min_line(client, seed, &self.config).await {
                        Ok(enforced) => (enforced, false),
                        Err(e) => {
                            debug!(%category, seed_index, error = %e, "Seed produced no line");
                            report.failed += 1;
                            event.outcome = SeedOutcome::Failed;
                            progress.on_progress(&event);
                            continue;
                        }
                    }
                }
            };

            let tier = enforced.tier;
            event.tier = Some(tier);
            event.cached = cached;
            event.plies = enforced.result.line.len();
            if cached {
                report.cached += 1;
            }

            if event.plies < self.config.hard_floor {
                debug!(%category, seed_index, plies = event.plies, "Line below hard floor");
                report.below_floor += 1;
                event.outcome = SeedOutcome::BelowFloor;
                progress.on_progress(&event);
                continue;
            }

            let cache_entry = (!cached).then(|| CachedLine::from(&enforced));
            let index = report.accepted;
            let puzzle = Puzzle::from_line(seed, enforced, category, index);

            sink.save(&puzzle, category, index)
                .await
                .map_err(|e| BatchError::Persistence {
                    puzzle_id: puzzle.id.clone(),
                    saved: saved_before + report.accepted,
                    reason: e.0,
                })?;

            self.dedup.insert(category, key);
            if let Some(entry) = cache_entry {
                self.cache.insert(&seed.fen, entry);
            }
            report.accepted += 1;
            *report.tiers.entry(tier).or_default() += 1;

            event.outcome = SeedOutcome::Accepted;
            progress.on_progress(&event);
        }

        if report.accepted < quota {
            info!(
                %category,
                accepted = report.accepted,
                quota,
                "Seed queue exhausted before quota"
            );
        } else {
            info!(%category, accepted = report.accepted, "Category quota met");
        }

        Ok(report)
    }
}
