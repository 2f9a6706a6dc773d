//! Minimum-line enforcement.
//!
//! A graduated fallback state machine. Tiers run strictly in order, each
//! slower but more likely to succeed than the one before; partial lines
//! from earlier tiers are kept and reused, never thrown away:
//!
//! 1. full-variation extension from the seed
//! 2. the seed's known correct move, then full-variation extension
//! 3. stepwise extension from the seed at the fast per-ply budget
//! 4. the longest partial so far, topped up stepwise at the slow budget
//! 5. stepwise extension from the seed at the slow budget

use chess_core::has_legal_moves;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{AnalysisClient, PositionAnalyzer};
use crate::config::PipelineConfig;
use crate::error::{LineError, StopReason};
use crate::extend::extend_pv;
use crate::line::{ExtensionResult, LineSource, MoveLine};
use crate::seed::SeedPosition;
use crate::stepwise::stepwise_extend;

/// The fallback tier a line came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    CorrectMove,
    Stepwise,
    TopUp,
    StepwiseRetry,
}

impl Tier {
    /// 1-based position in the fallback order.
    pub fn number(&self) -> u8 {
        match self {
            Tier::Primary => 1,
            Tier::CorrectMove => 2,
            Tier::Stepwise => 3,
            Tier::TopUp => 4,
            Tier::StepwiseRetry => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::CorrectMove => "correct_move",
            Tier::Stepwise => "stepwise",
            Tier::TopUp => "top_up",
            Tier::StepwiseRetry => "stepwise_retry",
        }
    }

    fn source(&self) -> LineSource {
        match self {
            Tier::Primary => LineSource::Primary,
            Tier::Stepwise | Tier::StepwiseRetry => LineSource::Stepwise,
            Tier::CorrectMove | Tier::TopUp => LineSource::Enforced,
        }
    }
}

/// Final line for a seed and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcedLine {
    pub result: ExtensionResult,
    pub tier: Tier,
}

struct Candidate {
    line: MoveLine,
    tier: Tier,
    stop: StopReason,
}

#[derive(Default)]
struct Best(Option<Candidate>);

impl Best {
    fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |c| c.line.len())
    }

    /// Keep `line` if it is strictly longer than the current best.
    fn offer(&mut self, line: MoveLine, tier: Tier, stop: StopReason) {
        if line.len() > self.len() {
            self.0 = Some(Candidate { line, tier, stop });
        }
    }

    fn line(&self) -> Option<&MoveLine> {
        self.0.as_ref().map(|c| &c.line)
    }

    /// Finish with the best line once it meets `floor`.
    fn settle(&mut self, floor: usize, max_plies: usize) -> Option<EnforcedLine> {
        if self.len() < floor {
            return None;
        }
        self.0.take().map(|c| finish(c, true, max_plies))
    }
}

fn finish(candidate: Candidate, reached_target: bool, max_plies: usize) -> EnforcedLine {
    let mut line = candidate.line;
    line.truncate(max_plies);
    let source = if reached_target {
        candidate.tier.source()
    } else {
        LineSource::Enforced
    };
    EnforcedLine {
        result: ExtensionResult {
            line,
            reached_target,
            source,
            stop: candidate.stop,
        },
        tier: candidate.tier,
    }
}

/// Produce a line of at least `config.min_plies` for `seed` if any tier
/// can.
///
/// When every tier falls short the longest partial is returned with
/// `reached_target = false`; the caller decides whether it is usable.
/// Only when no tier produced a single move is an error returned.
pub async fn enforce_min_line<A: PositionAnalyzer + ?Sized>(
    client: &mut AnalysisClient<'_, A>,
    seed: &SeedPosition,
    config: &PipelineConfig,
) -> Result<EnforcedLine, LineError> {
    let floor = config.min_plies;
    let max = config.max_plies;

    if !has_legal_moves(&seed.fen)? {
        return Err(LineError::EmptyResult {
            cause: Some(StopReason::Terminal),
        });
    }

    let mut best = Best::default();

    // Tier 1: the cheap path. A full result goes out unchanged.
    match extend_pv(client, &seed.fen, config.want_plies, max, config).await {
        Ok(result) if result.reached_target && result.line.len() >= floor => {
            debug!(plies = result.line.len(), "Primary extension reached target");
            return Ok(EnforcedLine {
                result,
                tier: Tier::Primary,
            });
        }
        Ok(result) => best.offer(result.line, Tier::Primary, result.stop),
        Err(e) => debug!(error = %e, "Primary extension produced nothing"),
    }
    if let Some(done) = best.settle(floor, max) {
        return Ok(done);
    }

    // Tier 2: force the known correct move, extend after it.
    if let Some(correct) = seed.correct_move.as_deref() {
        match MoveLine::replay(&seed.fen, &[correct]) {
            Ok(mut line) => {
                let stop = match extend_pv(
                    client,
                    line.end_fen(),
                    config.want_plies.saturating_sub(1),
                    max.saturating_sub(1),
                    config,
                )
                .await
                {
                    Ok(result) => {
                        line.concat(&result.line)?;
                        result.stop
                    }
                    Err(e) => e.stop_reason().unwrap_or(StopReason::EmptyPv),
                };
                best.offer(line, Tier::CorrectMove, stop);
                if let Some(done) = best.settle(floor, max) {
                    return Ok(done);
                }
            }
            Err(e) => {
                warn!(fen = %seed.fen, correct, error = %e, "Seed's correct move is illegal");
            }
        }
    }

    // Tier 3: stepwise from the seed, fast budget.
    let fast = stepwise_extend(client, &seed.fen, floor, max, config.stepwise_fast).await?;
    best.offer(fast.line, Tier::Stepwise, fast.stop);
    if let Some(done) = best.settle(floor, max) {
        return Ok(done);
    }

    // Tier 4: top up the longest partial, slow budget.
    let base = match best.line() {
        Some(line) => line.clone(),
        None => MoveLine::new(&seed.fen)?,
    };
    let top_up = stepwise_extend(
        client,
        base.end_fen(),
        floor - base.len(),
        max.saturating_sub(base.len()),
        config.stepwise_slow,
    )
    .await?;
    let mut combined = base;
    combined.concat(&top_up.line)?;
    best.offer(combined, Tier::TopUp, top_up.stop);
    if let Some(done) = best.settle(floor, max) {
        return Ok(done);
    }

    // Tier 5: stepwise from the seed again, slow budget.
    let retry = stepwise_extend(client, &seed.fen, floor, max, config.stepwise_slow).await?;
    let last_stop = retry.stop;
    best.offer(retry.line, Tier::StepwiseRetry, retry.stop);
    if let Some(done) = best.settle(floor, max) {
        return Ok(done);
    }

    match best.0 {
        Some(candidate) => {
            debug!(
                plies = candidate.line.len(),
                tier = candidate.tier.as_str(),
                "All tiers fell short, keeping longest partial"
            );
            Ok(finish(candidate, false, max))
        }
        None => Err(LineError::EmptyResult {
            cause: Some(last_stop),
        }),
    }
}
