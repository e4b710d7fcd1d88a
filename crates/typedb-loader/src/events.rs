//! Progress events sent from workers to the coordinator.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, error, info};

/// Something that happened inside a load worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoadEvent {
    /// Worker received its shard.
    WorkerStarted { worker_id: usize, assigned: u64 },
    /// A transaction was committed; `committed` is the cumulative count.
    BatchCommitted {
        worker_id: usize,
        committed: u64,
        committed_at: DateTime<Local>,
    },
    /// Periodic progress marker.
    Progress { worker_id: usize, submitted: u64 },
    /// Worker committed its whole shard.
    WorkerFinished {
        worker_id: usize,
        committed: u64,
        elapsed_ms: u64,
    },
    /// Worker stopped early.
    WorkerFailed {
        worker_id: usize,
        submitted: u64,
        committed: u64,
        error: String,
    },
}

impl LoadEvent {
    pub fn worker_id(&self) -> usize {
        match self {
            LoadEvent::WorkerStarted { worker_id, .. }
            | LoadEvent::BatchCommitted { worker_id, .. }
            | LoadEvent::Progress { worker_id, .. }
            | LoadEvent::WorkerFinished { worker_id, .. }
            | LoadEvent::WorkerFailed { worker_id, .. } => *worker_id,
        }
    }

    /// Write the event to the tracing log.
    pub fn log(&self) {
        match self {
            LoadEvent::WorkerStarted {
                worker_id,
                assigned,
            } => debug!(worker_id, assigned, "Worker started"),
            LoadEvent::BatchCommitted {
                worker_id,
                committed,
                ..
            } => debug!(worker_id, committed, "Batch committed"),
            LoadEvent::Progress {
                worker_id,
                submitted,
            } => info!("Worker {}: {} queries added", worker_id, submitted),
            LoadEvent::WorkerFinished {
                worker_id,
                committed,
                elapsed_ms,
            } => info!(
                "Worker {} finished: {} statements committed in {}ms",
                worker_id, committed, elapsed_ms
            ),
            LoadEvent::WorkerFailed {
                worker_id,
                submitted,
                committed,
                error,
            } => error!(
                "Worker {} failed after {} submitted / {} committed statements: {}",
                worker_id, submitted, committed, error
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = LoadEvent::Progress {
            worker_id: 2,
            submitted: 1000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "progress");
        assert_eq!(json["worker_id"], 2);
        assert_eq!(json["submitted"], 1000);
        assert_eq!(event.worker_id(), 2);
    }
}
