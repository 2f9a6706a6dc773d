//! Puzzle Worker
//!
//! Extends seed positions into verified puzzle lines with a local
//! Stockfish and stores them per category.
//!
//!   puzzle-worker --user 42              seeds from Postgres, puzzles to Postgres
//!   puzzle-worker --seeds-file seeds.jsonl   seeds from a file, puzzles to stdout

use std::path::PathBuf;

use puzzle_lines::{BatchReport, PuzzleBatch, PuzzleSink, SeedQueue};
use puzzle_worker::config::WorkerConfig;
use puzzle_worker::db::{self, PgPuzzleSink};
use puzzle_worker::error::WorkerError;
use puzzle_worker::progress::TracingProgress;
use puzzle_worker::seeds::read_seeds_file;
use puzzle_worker::sink::JsonLinesSink;
use puzzle_worker::stockfish::StockfishEngine;
use tracing::{error, info};

#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    User(i64),
    SeedsFile(PathBuf),
}

const USAGE: &str = "usage: puzzle-worker (--user <id> | --seeds-file <path>)";

/// Parse `--user <id>` or `--seeds-file <path>` from CLI args
fn parse_args(args: &[String]) -> Result<RunMode, WorkerError> {
    let mut mode = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let next = match arg.as_str() {
            "--user" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| WorkerError::Usage(USAGE.into()))?;
                let id = raw
                    .trim()
                    .parse()
                    .map_err(|_| WorkerError::Usage(format!("invalid user id '{raw}'")))?;
                RunMode::User(id)
            }
            "--seeds-file" => {
                let path = iter
                    .next()
                    .ok_or_else(|| WorkerError::Usage(USAGE.into()))?;
                RunMode::SeedsFile(PathBuf::from(path))
            }
            other => return Err(WorkerError::Usage(format!("unknown argument '{other}'; {USAGE}"))),
        };
        if mode.replace(next).is_some() {
            return Err(WorkerError::Usage(USAGE.into()));
        }
    }
    mode.ok_or_else(|| WorkerError::Usage(USAGE.into()))
}

async fn run_batch<S: PuzzleSink>(
    config: &WorkerConfig,
    queues: &[SeedQueue],
    sink: &mut S,
) -> Result<BatchReport, WorkerError> {
    let mut engine = StockfishEngine::new(
        &config.stockfish_path,
        config.engine_threads,
        config.engine_hash_mb,
    )
    .await?;
    info!(stockfish_path = %config.stockfish_path, "Stockfish ready");

    let mut batch = PuzzleBatch::new(config.pipeline.clone())?;
    let mut progress = TracingProgress::new();
    let result = batch.run(&mut engine, queues, sink, &mut progress).await;
    engine.quit().await;
    Ok(result?)
}

fn log_report(report: &BatchReport) {
    for category in &report.categories {
        info!(
            category = %category.category,
            accepted = category.accepted,
            consumed = category.consumed,
            duplicates = category.duplicates,
            below_floor = category.below_floor,
            failed = category.failed,
            cached = category.cached,
            "Category summary"
        );
    }
    info!(
        accepted = report.total_accepted(),
        calls = report.analysis.calls,
        timeouts = report.analysis.timeouts,
        failures = report.analysis.failures,
        "Worker finished"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout carries puzzles in file mode
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let mode = parse_args(&args)?;

    let config = WorkerConfig::load(matches!(mode, RunMode::User(_))).await?;
    info!(
        depth = config.pipeline.depth,
        quota = config.pipeline.quota,
        min_plies = config.pipeline.min_plies,
        hard_floor = config.pipeline.hard_floor,
        "Worker starting"
    );

    let report = match mode {
        RunMode::User(user_id) => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(WorkerError::Config("DATABASE_URL not resolved"))?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(2)
                .connect(database_url)
                .await?;
            info!("Connected to database");

            let queues = db::fetch_seeds(&pool, user_id).await?;
            info!(user_id, categories = queues.len(), "Seeds loaded");
            let mut sink = PgPuzzleSink::new(pool, user_id);
            run_batch(&config, &queues, &mut sink).await
        }
        RunMode::SeedsFile(path) => {
            let queues = read_seeds_file(&path)?;
            info!(path = %path.display(), categories = queues.len(), "Seeds loaded");
            let mut sink = JsonLinesSink::new(std::io::stdout());
            run_batch(&config, &queues, &mut sink).await
        }
    };

    match report {
        Ok(report) => {
            log_report(&report);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Puzzle generation failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("puzzle-worker")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_user() {
        assert_eq!(parse_args(&args(&["--user", "42"])).unwrap(), RunMode::User(42));
    }

    #[test]
    fn test_parse_seeds_file() {
        assert_eq!(
            parse_args(&args(&["--seeds-file", "seeds.jsonl"])).unwrap(),
            RunMode::SeedsFile(PathBuf::from("seeds.jsonl"))
        );
    }

    #[test]
    fn test_rejects_missing_and_conflicting_modes() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--user"])).is_err());
        assert!(parse_args(&args(&["--user", "abc"])).is_err());
        assert!(parse_args(&args(&["--user", "1", "--seeds-file", "x"])).is_err());
        assert!(parse_args(&args(&["--depth", "20"])).is_err());
    }
}
