//! Worker configuration from environment variables and AWS Secrets Manager

use std::env;
use std::str::FromStr;

use aws_sdk_secretsmanager::Client as SecretsClient;
use puzzle_lines::PipelineConfig;
use tracing::info;

use crate::error::WorkerError;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Database connection URL (fetched from Secrets Manager in prod).
    /// `None` when seeds come from a file and results go to stdout.
    pub database_url: Option<String>,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Stockfish `Threads` option
    pub engine_threads: u32,

    /// Stockfish `Hash` option in MB
    pub engine_hash_mb: u32,

    /// Depth, budgets and ply targets for the line pipeline
    pub pipeline: PipelineConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    /// In production, fetches DATABASE_URL from AWS Secrets Manager.
    pub async fn load(require_db: bool) -> Result<Self, WorkerError> {
        let lookup = |key: &str| env::var(key).ok();

        let stockfish_path = env::var("STOCKFISH_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());
        let engine_threads = parse_or("ENGINE_THREADS", 1, &lookup)?;
        let engine_hash_mb = parse_or("ENGINE_HASH_MB", 128, &lookup)?;
        let pipeline = pipeline_from(&lookup)?;

        let database_url = if !require_db {
            None
        } else if env::var("LOCAL_DEV").is_ok() {
            // Local development: use DATABASE_URL directly
            info!("Local dev mode: using DATABASE_URL from environment");
            Some(
                env::var("DATABASE_URL")
                    .map_err(|_| WorkerError::Config("DATABASE_URL not set (LOCAL_DEV mode)"))?,
            )
        } else {
            // Production: fetch from Secrets Manager
            let secret_arn = env::var("DB_SECRET_ARN")
                .map_err(|_| WorkerError::Config("DB_SECRET_ARN not set"))?;

            info!(secret_arn = %secret_arn, "Fetching database URL from Secrets Manager");
            Some(fetch_database_url_from_secrets(&secret_arn).await?)
        };

        Ok(Self {
            database_url,
            stockfish_path,
            engine_threads,
            engine_hash_mb,
            pipeline,
        })
    }
}

/// Build the pipeline policy, overriding defaults with whatever keys are set.
fn pipeline_from<F>(lookup: &F) -> Result<PipelineConfig, WorkerError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = PipelineConfig::default();
    let config = PipelineConfig {
        depth: parse_or("ANALYSIS_DEPTH", defaults.depth, lookup)?,
        quota: parse_or("PUZZLES_PER_CATEGORY", defaults.quota, lookup)?,
        min_plies: parse_or("PUZZLE_MIN_PLIES", defaults.min_plies, lookup)?,
        want_plies: parse_or("PUZZLE_MIN_PLIES", defaults.want_plies, lookup)?,
        max_plies: parse_or("PUZZLE_MAX_PLIES", defaults.max_plies, lookup)?,
        hard_floor: parse_or("PUZZLE_HARD_FLOOR", defaults.hard_floor, lookup)?,
        ..defaults
    };
    config.validate()?;
    Ok(config)
}

fn parse_or<T, F>(key: &'static str, default: T, lookup: &F) -> Result<T, WorkerError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| WorkerError::Usage(format!("{key} is not a valid number: {raw}"))),
        None => Ok(default),
    }
}

/// Fetch database URL from AWS Secrets Manager
async fn fetch_database_url_from_secrets(secret_arn: &str) -> Result<String, WorkerError> {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = SecretsClient::new(&config);

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| WorkerError::SecretsManager(e.to_string()))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| WorkerError::SecretsManager("Secret has no string value".into()))?;

    database_url_from_secret(secret_string)
}

/// A secret is either a plain connection string or a JSON object with
/// either a `url` field or the RDS-style connection components.
fn database_url_from_secret(secret_string: &str) -> Result<String, WorkerError> {
    if secret_string.starts_with("postgresql://") || secret_string.starts_with("postgres://") {
        return Ok(secret_string.to_string());
    }

    let secret: serde_json::Value = serde_json::from_str(secret_string)
        .map_err(|e| WorkerError::SecretsManager(format!("Failed to parse secret JSON: {e}")))?;

    if let Some(url) = secret.get("url").or(secret.get("DATABASE_URL")) {
        return url
            .as_str()
            .map(String::from)
            .ok_or_else(|| WorkerError::SecretsManager("Database URL is not a string".into()));
    }

    let field = |name: &'static str| {
        secret
            .get(name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| WorkerError::SecretsManager(format!("Missing '{name}' in secret")))
    };
    let host = field("host")?;
    let username = field("username")?;
    let password = field("password")?;
    let database = field("dbname").or_else(|_| field("database"))?;
    let port = secret.get("port").and_then(|v| v.as_u64()).unwrap_or(5432);

    Ok(format!(
        "postgresql://{username}:{password}@{host}:{port}/{database}"
    ))
}
