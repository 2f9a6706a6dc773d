//! End-to-end pipeline behavior against a scripted engine.

mod common;

use std::time::Duration;

use chess_core::replay_uci;
use common::{dead_fen, dead_seed, fen_after, live_seed, queue};
use puzzle_lines::testing::{italian_analyzer, Reply, ScriptedAnalyzer, ITALIAN_GAME, START_FEN};
use puzzle_lines::{
    enforce_min_line, AnalysisClient, BatchError, Category, LineError, LineSource, MemorySink,
    NoProgress, PipelineConfig, ProgressEvent, PuzzleBatch, SeedOutcome, SeedPosition,
    StopReason, Tier,
};

#[tokio::test]
async fn test_full_success_returns_primary_line_unmodified() {
    let mut engine = italian_analyzer().script([Reply::Pv(14)]);
    let config = PipelineConfig::default();
    let mut client = AnalysisClient::new(&mut engine, config.depth, config.grace);
    let seed = SeedPosition::new(START_FEN, Category::Opening);

    let enforced = enforce_min_line(&mut client, &seed, &config).await.unwrap();
    assert_eq!(enforced.tier, Tier::Primary);
    assert_eq!(enforced.result.source, LineSource::Primary);
    assert!(enforced.result.reached_target);
    assert_eq!(enforced.result.line.moves(), &ITALIAN_GAME[..14]);
    assert_eq!(client.stats().calls, 1);
}

#[tokio::test]
async fn test_timeout_after_partial_falls_through_to_enforced_line() {
    // Two single-move answers, then the third call times out
    let mut engine = italian_analyzer().script([Reply::Pv(1), Reply::Pv(1), Reply::Timeout]);
    let config = PipelineConfig::default();
    let seed = SeedPosition::new(START_FEN, Category::Mistake).with_correct_move("e2e4");

    let enforced = {
        let mut client = AnalysisClient::new(&mut engine, config.depth, config.grace);
        enforce_min_line(&mut client, &seed, &config).await.unwrap()
    };
    assert_eq!(enforced.tier, Tier::CorrectMove);
    assert_eq!(enforced.result.source, LineSource::Enforced);
    assert!(enforced.result.line.len() >= 12);
    assert!(enforced.result.line.len() <= config.max_plies);
    assert_eq!(enforced.result.line.moves()[0], "e2e4");

    let budgets = engine.budgets_ms();
    assert_eq!(&budgets[..3], &[3000u64, 1500, 1500]);
    // The correct-move extension starts over with a first-call budget
    assert_eq!(budgets[3], 3000);
}

#[tokio::test]
async fn test_total_failure_skips_the_seed() {
    let mut engine = italian_analyzer();
    let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
    let mut sink = MemorySink::new();
    let seeds = vec![
        live_seed(Category::Endgame, 0, "e-0"),
        dead_seed(Category::Endgame, 0),
        live_seed(Category::Endgame, 4, "e-1"),
    ];

    let report = batch
        .run(&mut engine, &[queue(Category::Endgame, seeds)], &mut sink, &mut NoProgress)
        .await
        .unwrap();

    let endgames = report.category(Category::Endgame).unwrap();
    assert_eq!(endgames.consumed, 3);
    assert_eq!(endgames.accepted, 2);
    assert_eq!(endgames.failed, 1);
    let ids: Vec<&str> = sink
        .in_category(Category::Endgame)
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, ["e-0", "e-1"]);

    // Tiers 1, 3, 4 and 5 each tried the dead seed once
    let dead_calls = engine.calls().iter().filter(|c| c.fen == dead_fen(0)).count();
    assert_eq!(dead_calls, 4);
}

#[tokio::test]
async fn test_quota_limited_batch_ships_short() {
    let mut engine = italian_analyzer();
    let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
    let mut sink = MemorySink::new();

    let mut seeds = Vec::new();
    let mut dead = 0;
    for i in 0..30 {
        if i % 6 == 5 {
            seeds.push(dead_seed(Category::Weakness, dead));
            dead += 1;
        } else {
            seeds.push(live_seed(Category::Weakness, i % 15, &format!("w-{i}")));
        }
    }
    assert_eq!(dead, 5);

    let report = batch
        .run(&mut engine, &[queue(Category::Weakness, seeds)], &mut sink, &mut NoProgress)
        .await
        .unwrap();

    let weakness = report.category(Category::Weakness).unwrap();
    assert_eq!(weakness.consumed, 30);
    assert_eq!(weakness.accepted, 25);
    assert_eq!(weakness.failed, 5);
    assert!(weakness.cached > 0);
    assert_eq!(sink.in_category(Category::Weakness).len(), 25);

    let indexes: Vec<usize> = sink.saved.iter().map(|(_, index, _)| *index).collect();
    assert_eq!(indexes, (0..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_quota_stops_consuming_seeds() {
    let mut engine = italian_analyzer();
    let config = PipelineConfig {
        quota: 3,
        ..PipelineConfig::default()
    };
    let mut batch = PuzzleBatch::new(config).unwrap();
    let mut sink = MemorySink::new();
    let seeds = (0..6)
        .map(|i| live_seed(Category::Opening, i, &format!("o-{i}")))
        .collect();

    let report = batch
        .run(&mut engine, &[queue(Category::Opening, seeds)], &mut sink, &mut NoProgress)
        .await
        .unwrap();
    let opening = report.category(Category::Opening).unwrap();
    assert_eq!(opening.accepted, 3);
    assert_eq!(opening.consumed, 3);
}

#[tokio::test]
async fn test_engine_unavailable_is_a_batch_failure() {
    let mut engine = italian_analyzer().fallback(Reply::Timeout);
    let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
    let mut sink = MemorySink::new();
    let seeds = vec![
        live_seed(Category::Mistake, 0, "m-0"),
        live_seed(Category::Mistake, 2, "m-1"),
    ];

    let result = batch
        .run(&mut engine, &[queue(Category::Mistake, seeds)], &mut sink, &mut NoProgress)
        .await;
    assert!(matches!(
        result,
        Err(BatchError::EngineUnavailable { attempted: 2 })
    ));
    assert!(sink.saved.is_empty());
}

#[tokio::test]
async fn test_exhausted_queue_is_not_engine_failure() {
    // The engine answers, it just has nothing to say about these seeds
    let mut engine = ScriptedAnalyzer::new().fallback(Reply::Moves(vec!["e1d1".into()]));
    let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
    let mut sink = MemorySink::new();
    let seeds = vec![dead_seed(Category::Endgame, 0)];

    let report = batch
        .run(&mut engine, &[queue(Category::Endgame, seeds)], &mut sink, &mut NoProgress)
        .await
        .unwrap();
    assert_eq!(report.total_accepted(), 0);
    assert_eq!(report.category(Category::Endgame).unwrap().below_floor, 1);
}

#[tokio::test]
async fn test_accepted_puzzles_replay_legally() {
    let mut engine = italian_analyzer().script([
        Reply::Pv(3),
        Reply::Timeout,
        Reply::Moves(vec!["e2e4".into(), "a1a8".into()]),
    ]);
    let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
    let mut sink = MemorySink::new();
    let seeds = (0..5)
        .map(|i| live_seed(Category::Mistake, i * 2, &format!("m-{i}")))
        .collect();

    batch
        .run(&mut engine, &[queue(Category::Mistake, seeds)], &mut sink, &mut NoProgress)
        .await
        .unwrap();

    assert!(!sink.saved.is_empty());
    for (_, _, puzzle) in &sink.saved {
        let (sans, end) = replay_uci(&puzzle.seed.fen, puzzle.line.moves()).unwrap();
        assert_eq!(sans, puzzle.line.sans());
        assert_eq!(end, puzzle.line.end_fen());
        assert!(puzzle.ply_count >= 12 && puzzle.ply_count <= 20);
    }
}

#[tokio::test]
async fn test_deduplicated_keys_are_distinct_per_category() {
    let mut engine = italian_analyzer();
    let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
    let mut sink = MemorySink::new();
    let seeds = vec![
        live_seed(Category::Opening, 0, "dup"),
        live_seed(Category::Opening, 2, "dup"),
        SeedPosition::new(fen_after(4), Category::Opening).with_eco("C50"),
        SeedPosition::new(fen_after(4), Category::Opening).with_eco("C50"),
        SeedPosition::new(fen_after(4), Category::Opening).with_eco("C53"),
    ];

    let report = batch
        .run(&mut engine, &[queue(Category::Opening, seeds)], &mut sink, &mut NoProgress)
        .await
        .unwrap();
    let opening = report.category(Category::Opening).unwrap();
    assert_eq!(opening.accepted, 3);
    assert_eq!(opening.duplicates, 2);

    let mut keys: Vec<String> = sink.saved.iter().map(|(_, _, p)| p.seed.identity_key()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 3);
}

#[tokio::test]
async fn test_rerun_with_fresh_batch_has_same_distribution() {
    let seeds: Vec<SeedPosition> = (0..8)
        .map(|i| {
            if i % 3 == 2 {
                dead_seed(Category::Endgame, i)
            } else {
                live_seed(Category::Endgame, i, &format!("e-{i}"))
            }
        })
        .collect();
    let queues = [queue(Category::Endgame, seeds)];

    let mut distributions = Vec::new();
    for _ in 0..2 {
        let mut engine = italian_analyzer();
        let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
        let mut sink = MemorySink::new();
        let report = batch
            .run(&mut engine, &queues, &mut sink, &mut NoProgress)
            .await
            .unwrap();
        let sizes: Vec<usize> = sink.saved.iter().map(|(_, _, p)| p.ply_count).collect();
        distributions.push((report.category(Category::Endgame).cloned(), sizes));
    }
    assert_eq!(distributions[0], distributions[1]);
}

#[tokio::test]
async fn test_progress_reports_every_consumed_seed() {
    let mut engine = italian_analyzer();
    let mut batch = PuzzleBatch::new(PipelineConfig::default()).unwrap();
    let mut sink = MemorySink::new();
    let seeds = vec![
        live_seed(Category::Mistake, 0, "m-0"),
        live_seed(Category::Mistake, 0, "m-0"),
        dead_seed(Category::Mistake, 1),
    ];

    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut observer = |event: &ProgressEvent| events.push(event.clone());
    batch
        .run(&mut engine, &[queue(Category::Mistake, seeds)], &mut sink, &mut observer)
        .await
        .unwrap();

    let outcomes: Vec<SeedOutcome> = events.iter().map(|e| e.outcome).collect();
    assert_eq!(
        outcomes,
        [SeedOutcome::Accepted, SeedOutcome::Duplicate, SeedOutcome::Failed]
    );
    assert!(events.iter().all(|e| e.total_seeds == 3));
}

#[tokio::test]
async fn test_terminal_seed_fails_without_engine_calls() {
    let mut engine = italian_analyzer();
    let config = PipelineConfig::default();
    let mut client = AnalysisClient::new(&mut engine, config.depth, Duration::ZERO);
    // Fool's mate, white is checkmated
    let mated = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    let seed = SeedPosition::new(mated, Category::Mistake);

    let result = enforce_min_line(&mut client, &seed, &config).await;
    assert!(matches!(
        result,
        Err(LineError::EmptyResult {
            cause: Some(StopReason::Terminal)
        })
    ));
    assert_eq!(client.stats().calls, 0);
}
