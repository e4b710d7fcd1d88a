//! Per-worker batch commit logs.
//!
//! Each load run gets its own directory under the configured logs directory,
//! and each worker appends to `<worker id>.log` inside it. Every line records
//! one committed batch as `<cumulative count>,<timestamp>`.

use crate::error::LoaderError;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const RUN_DIR_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Path of the directory for a run started at `started_at`.
pub fn run_directory(logs_dir: &Path, started_at: DateTime<Local>) -> PathBuf {
    logs_dir.join(started_at.format(RUN_DIR_FORMAT).to_string())
}

/// Create the directory for a run started at `started_at`.
pub async fn create_run_directory(
    logs_dir: &Path,
    started_at: DateTime<Local>,
) -> Result<PathBuf, LoaderError> {
    let dir = run_directory(logs_dir, started_at);
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Format one log line (without the trailing newline).
pub fn format_line(committed: u64, committed_at: DateTime<Local>) -> String {
    format!("{},{}", committed, committed_at.format(TIMESTAMP_FORMAT))
}

/// Append-only log of one worker's committed batches.
pub struct BatchLog {
    path: PathBuf,
    file: tokio::fs::File,
}

impl BatchLog {
    /// Open (or create) the log for `worker_id` inside `run_dir`.
    pub async fn open(run_dir: &Path, worker_id: usize) -> Result<Self, LoaderError> {
        let path = run_dir.join(format!("{worker_id}.log"));
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| LoaderError::BatchLog {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self { path, file })
    }

    /// Append one committed batch.
    pub async fn record(
        &mut self,
        committed: u64,
        committed_at: DateTime<Local>,
    ) -> Result<(), LoaderError> {
        let line = format!("{}\n", format_line(committed, committed_at));
        self.write(line.as_bytes())
            .await
            .map_err(|source| LoaderError::BatchLog {
                path: self.path.display().to_string(),
                source,
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(bytes).await?;
        self.file.flush().await
    }
}
