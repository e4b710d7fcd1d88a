//! Per-worker and per-run load results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a worker's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerStatus {
    Completed,
    Failed { error: String },
}

/// Result of one worker's shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Worker (shard) index
    pub worker_id: usize,
    /// Statements in the worker's shard
    pub assigned: u64,
    /// Statements executed against the database
    pub submitted: u64,
    /// Statements in committed transactions
    pub committed: u64,
    /// Number of transactions committed
    pub commits: u64,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Completion time
    pub completed_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Outcome
    #[serde(flatten)]
    pub status: WorkerStatus,
}

impl WorkerReport {
    pub fn is_success(&self) -> bool {
        self.status == WorkerStatus::Completed
    }

    /// Error message if the worker failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            WorkerStatus::Completed => None,
            WorkerStatus::Failed { error } => Some(error),
        }
    }

    /// Calculate committed statements per second.
    pub fn statements_per_second(&self) -> f64 {
        if self.duration_ms > 0 {
            self.committed as f64 / (self.duration_ms as f64 / 1000.0)
        } else {
            0.0
        }
    }
}

/// Aggregated result of a load run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Total number of workers
    pub total_workers: usize,
    /// Workers that committed their whole shard
    pub completed_workers: usize,
    /// Workers that stopped early
    pub failed_workers: usize,
    /// Statements handed to the loader
    pub total_statements: u64,
    /// Statements in committed transactions across all workers
    pub total_committed: u64,
    /// Wall clock duration of the whole run in milliseconds
    pub wall_clock_ms: u64,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Run completion time
    pub completed_at: DateTime<Utc>,
    /// Individual worker reports, ordered by worker id
    pub workers: Vec<WorkerReport>,
}

impl LoadReport {
    /// Aggregate worker reports into a run report.
    pub fn from_workers(
        mut workers: Vec<WorkerReport>,
        started_at: DateTime<Utc>,
        wall_clock: Duration,
    ) -> Self {
        workers.sort_by_key(|w| w.worker_id);

        let completed_workers = workers.iter().filter(|w| w.is_success()).count();
        Self {
            total_workers: workers.len(),
            completed_workers,
            failed_workers: workers.len() - completed_workers,
            total_statements: workers.iter().map(|w| w.assigned).sum(),
            total_committed: workers.iter().map(|w| w.committed).sum(),
            wall_clock_ms: wall_clock.as_millis() as u64,
            started_at,
            completed_at: Utc::now(),
            workers,
        }
    }

    /// Whether every worker committed its whole shard.
    pub fn is_success(&self) -> bool {
        self.failed_workers == 0
    }

    /// Reports of the workers that stopped early.
    pub fn failures(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().filter(|w| !w.is_success())
    }

    /// Wall clock duration of the run in seconds.
    pub fn wall_clock_secs(&self) -> f64 {
        self.wall_clock_ms as f64 / 1000.0
    }

    /// Aggregate throughput over the wall clock duration.
    pub fn statements_per_second(&self) -> f64 {
        if self.wall_clock_ms > 0 {
            self.total_committed as f64 / self.wall_clock_secs()
        } else {
            0.0
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(worker_id: usize, assigned: u64, committed: u64, status: WorkerStatus) -> WorkerReport {
        WorkerReport {
            worker_id,
            assigned,
            submitted: committed,
            committed,
            commits: committed / 10 + 1,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            duration_ms: 1000,
            status,
        }
    }

    #[test]
    fn test_worker_throughput() {
        let report = worker(0, 500, 500, WorkerStatus::Completed);
        assert_eq!(report.statements_per_second(), 500.0);
        assert!(report.is_success());
        assert_eq!(report.error(), None);
    }

    #[test]
    fn test_aggregation() {
        let workers = vec![
            worker(1, 100, 40, WorkerStatus::Failed { error: "boom".into() }),
            worker(0, 100, 100, WorkerStatus::Completed),
        ];
        let report = LoadReport::from_workers(workers, Utc::now(), Duration::from_secs(2));

        assert_eq!(report.total_workers, 2);
        assert_eq!(report.completed_workers, 1);
        assert_eq!(report.failed_workers, 1);
        assert_eq!(report.total_statements, 200);
        assert_eq!(report.total_committed, 140);
        assert_eq!(report.statements_per_second(), 70.0);
        assert!(!report.is_success());
        assert_eq!(report.workers[0].worker_id, 0);

        let failed: Vec<usize> = report.failures().map(|w| w.worker_id).collect();
        assert_eq!(failed, vec![1]);
    }

    #[test]
    fn test_report_json() {
        let report = LoadReport::from_workers(
            vec![worker(0, 10, 5, WorkerStatus::Failed { error: "rejected".into() })],
            Utc::now(),
            Duration::from_millis(10),
        );
        let json = report.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["workers"][0]["status"], "failed");
        assert_eq!(value["workers"][0]["error"], "rejected");

        let parsed: LoadReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.workers[0].error(), Some("rejected"));
    }
}
