//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use async_trait::async_trait;
use puzzle_lines::{Analysis, AnalysisError, PositionAnalyzer};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::error::WorkerError;

/// Stockfish engine instance. Generic over its pipes so any UCI speaker
/// can stand in for the child process.
pub struct StockfishEngine<R = BufReader<ChildStdout>, W = ChildStdin> {
    process: Option<Child>,
    stdin: W,
    stdout: R,
    /// Bytes of a line whose read was cancelled midway
    partial: String,
    /// A search was started and its `bestmove` never read
    searching: bool,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, threads: u32, hash_mb: u32) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self::from_pipes(BufReader::new(stdout), stdin);
        engine.process = Some(process);
        engine.init(threads, hash_mb).await?;
        Ok(engine)
    }
}

impl<R, W> StockfishEngine<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap an already running engine. Call [`Self::init`] before searching.
    pub fn from_pipes(stdout: R, stdin: W) -> Self {
        Self {
            process: None,
            stdin,
            stdout,
            partial: String::new(),
            searching: false,
        }
    }

    /// UCI handshake and analysis options
    pub async fn init(&mut self, threads: u32, hash_mb: u32) -> Result<(), WorkerError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        self.send(&format!("setoption name Threads value {threads}"))
            .await?;
        self.send(&format!("setoption name Hash value {hash_mb}"))
            .await?;
        self.send("setoption name UCI_AnalyseMode value true").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        Ok(())
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one trimmed line; EOF means the process died.
    ///
    /// Bytes read before a cancellation stay in `partial`, so the next
    /// call resumes the same line.
    async fn read_line(&mut self) -> Result<String, WorkerError> {
        let read = self
            .stdout
            .read_line(&mut self.partial)
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(WorkerError::Stockfish("Stockfish closed its output".into()));
        }
        let line = self.partial.trim().to_string();
        self.partial.clear();
        Ok(line)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        loop {
            let line = self.read_line().await?;
            debug!(line = %line, "SF >");
            if line == expected {
                return Ok(());
            }
        }
    }

    /// Stop a search that was cut off by the caller's deadline and drain
    /// its output. The engine answers `isready` before the search thread
    /// prints its `bestmove`, so the `bestmove` has to be read first.
    async fn resync(&mut self) -> Result<(), WorkerError> {
        warn!("Resynchronizing Stockfish after an abandoned search");
        self.send("stop").await?;
        loop {
            let line = self.read_line().await?;
            if line.starts_with("bestmove") {
                break;
            }
        }
        self.searching = false;
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        Ok(())
    }

    /// Search `fen` to `depth`, giving up after `movetime`, and return the
    /// deepest principal variation.
    pub async fn search(
        &mut self,
        fen: &str,
        depth: u32,
        movetime: Duration,
    ) -> Result<Analysis, WorkerError> {
        if self.searching {
            self.resync().await?;
        }

        let movetime_ms = movetime.as_millis().max(1);
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth} movetime {movetime_ms}"))
            .await?;
        self.searching = true;

        let mut analysis = Analysis::default();
        loop {
            let line = self.read_line().await?;

            if line.starts_with("info") && line.contains(" pv ") {
                if parse_multipv_index(&line).unwrap_or(1) != 1 {
                    continue;
                }
                analysis.depth = parse_depth(&line).or(analysis.depth);
                analysis.cp = parse_cp(&line);
                analysis.mate = parse_mate(&line);
                analysis.pv = parse_pv(&line);
            } else if line.starts_with("bestmove") {
                self.searching = false;
                if analysis.pv.is_empty() {
                    if let Some(best) = parse_bestmove(&line) {
                        analysis.pv = vec![best];
                    }
                }
                break;
            }
        }

        Ok(analysis)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        if let Some(process) = self.process.as_mut() {
            let _ = process.wait().await;
        }
    }
}

#[async_trait]
impl<R, W> PositionAnalyzer for StockfishEngine<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// The engine is told to stop at `budget`; the caller's deadline
    /// backs that up. A search cut off there is stopped and drained at
    /// the start of the next call.
    async fn analyze(
        &mut self,
        fen: &str,
        depth: u32,
        budget: Duration,
    ) -> Result<Analysis, AnalysisError> {
        self.search(fen, depth, budget)
            .await
            .map_err(|e| AnalysisError::Engine(e.to_string()))
    }
}

/// Find the value following `key` in an info line
fn parse_field<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next()?.parse().ok();
        }
        if part == "pv" {
            return None;
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_field(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_field(line, "mate")
}

/// Parse search depth from info line
fn parse_depth(line: &str) -> Option<u32> {
    parse_field(line, "depth")
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    parse_field(line, "multipv")
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    line.split_whitespace()
        .skip_while(|part| *part != "pv")
        .skip(1)
        .take_while(|part| !part.starts_with("bmc") && *part != "string")
        .map(str::to_string)
        .collect()
}

/// Parse the move from a `bestmove` line; `(none)` means no legal move
fn parse_bestmove(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(1)
        .filter(|mv| *mv != "(none)")
        .map(str::to_string)
}
