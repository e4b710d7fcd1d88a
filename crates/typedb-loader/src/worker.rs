//! Transactional load worker.
//!
//! A worker streams one shard of statements into the database through a single
//! session. Statements are executed in shard order inside a write transaction
//! that is committed and replaced every `batch_size` statements, and the final
//! partial batch is committed once the shard is exhausted.

use crate::batch_log::BatchLog;
use crate::driver::{DriverSession, GraphDriver, SessionType, Transaction, TransactionType};
use crate::error::LoaderError;
use crate::events::LoadEvent;
use crate::metrics::{WorkerReport, WorkerStatus};
use chrono::{Local, Utc};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Everything a worker needs to load its shard.
#[derive(Debug, Clone)]
pub struct WorkerTask {
    /// Worker (shard) index
    pub worker_id: usize,
    /// Target database name
    pub database: String,
    /// Statements to load, in order
    pub statements: Vec<String>,
    /// Statements per transaction
    pub batch_size: usize,
    /// Statements between progress events (0 disables them)
    pub progress_interval: u64,
    /// Run directory for the batch log, if logging is enabled
    pub log_dir: Option<PathBuf>,
}

/// Counters kept by a running worker.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    submitted: u64,
    committed: u64,
    commits: u64,
}

/// Load one shard and report how it went.
///
/// Errors never escape: a failed worker returns a report with
/// [`WorkerStatus::Failed`] and the counts reached before the failure.
pub async fn run_worker<D>(
    driver: &D,
    task: WorkerTask,
    events: &UnboundedSender<LoadEvent>,
) -> WorkerReport
where
    D: GraphDriver + ?Sized,
{
    let started_at = Utc::now();
    let start = Instant::now();
    let worker_id = task.worker_id;
    let assigned = task.statements.len() as u64;
    let mut counters = Counters::default();

    emit(events, LoadEvent::WorkerStarted { worker_id, assigned });

    let result = if task.batch_size == 0 {
        Err(LoaderError::Config("batch_size must be at least 1".into()))
    } else if task.statements.is_empty() {
        debug!(worker_id, "No statements assigned, skipping session");
        Ok(())
    } else {
        load_shard(driver, &task, events, &mut counters).await
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = match result {
        Ok(()) => {
            emit(
                events,
                LoadEvent::WorkerFinished {
                    worker_id,
                    committed: counters.committed,
                    elapsed_ms: duration_ms,
                },
            );
            WorkerStatus::Completed
        }
        Err(e) => {
            let error = e.to_string();
            emit(
                events,
                LoadEvent::WorkerFailed {
                    worker_id,
                    submitted: counters.submitted,
                    committed: counters.committed,
                    error: error.clone(),
                },
            );
            WorkerStatus::Failed { error }
        }
    };

    WorkerReport {
        worker_id,
        assigned,
        submitted: counters.submitted,
        committed: counters.committed,
        commits: counters.commits,
        started_at,
        completed_at: Utc::now(),
        duration_ms,
        status,
    }
}

async fn load_shard<D>(
    driver: &D,
    task: &WorkerTask,
    events: &UnboundedSender<LoadEvent>,
    counters: &mut Counters,
) -> Result<(), LoaderError>
where
    D: GraphDriver + ?Sized,
{
    let mut batch_log = match &task.log_dir {
        Some(dir) => Some(BatchLog::open(dir, task.worker_id).await?),
        None => None,
    };

    let mut session = driver.session(&task.database, SessionType::Data).await?;
    let result = stream_statements(
        session.as_mut(),
        task,
        events,
        batch_log.as_mut(),
        counters,
    )
    .await;

    let closed = session.close().await;
    match result {
        Ok(()) => closed.map_err(LoaderError::from),
        Err(e) => {
            if let Err(close_err) = closed {
                warn!(
                    "Worker {}: failed to close session after error: {:#}",
                    task.worker_id, close_err
                );
            }
            Err(e)
        }
    }
}

async fn stream_statements(
    session: &mut dyn DriverSession,
    task: &WorkerTask,
    events: &UnboundedSender<LoadEvent>,
    mut batch_log: Option<&mut BatchLog>,
    counters: &mut Counters,
) -> Result<(), LoaderError> {
    let worker_id = task.worker_id;
    let batch_size = task.batch_size as u64;

    let mut transaction = session.transaction(TransactionType::Write).await?;

    for statement in &task.statements {
        if let Err(e) = transaction.insert(statement).await {
            discard(transaction, worker_id).await;
            return Err(e.into());
        }
        counters.submitted += 1;
        let counter = counters.submitted;

        if counter % batch_size == 0 {
            transaction.commit().await?;
            counters.committed = counter;
            counters.commits += 1;
            record_commit(worker_id, counter, batch_log.as_deref_mut(), events).await?;

            transaction = session.transaction(TransactionType::Write).await?;
        }

        if task.progress_interval > 0 && counter % task.progress_interval == 0 {
            emit(
                events,
                LoadEvent::Progress {
                    worker_id,
                    submitted: counter,
                },
            );
        }
    }

    // The final commit is reported but not written to the batch log.
    let final_batch = counters.submitted - counters.committed;
    transaction.commit().await?;
    counters.committed = counters.submitted;
    counters.commits += 1;
    if final_batch > 0 {
        record_commit(worker_id, counters.committed, None, events).await?;
    }

    info!(
        "Worker {}: {} statements committed in {} transactions",
        worker_id, counters.committed, counters.commits
    );
    Ok(())
}

async fn record_commit(
    worker_id: usize,
    committed: u64,
    batch_log: Option<&mut BatchLog>,
    events: &UnboundedSender<LoadEvent>,
) -> Result<(), LoaderError> {
    let committed_at = Local::now();
    if let Some(log) = batch_log {
        log.record(committed, committed_at).await?;
    }
    emit(
        events,
        LoadEvent::BatchCommitted {
            worker_id,
            committed,
            committed_at,
        },
    );
    Ok(())
}

async fn discard(transaction: Box<dyn Transaction>, worker_id: usize) {
    if let Err(e) = transaction.close().await {
        warn!("Worker {}: failed to close transaction: {:#}", worker_id, e);
    }
}

fn emit(events: &UnboundedSender<LoadEvent>, event: LoadEvent) {
    if events.send(event).is_err() {
        debug!("Event receiver dropped, event discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDriver;
    use tokio::sync::mpsc;

    fn task(statements: usize, batch_size: usize) -> WorkerTask {
        WorkerTask {
            worker_id: 0,
            database: "test".to_string(),
            statements: (0..statements)
                .map(|i| format!("insert $x isa thing, has n {i};"))
                .collect(),
            batch_size,
            progress_interval: 1000,
            log_dir: None,
        }
    }

    #[tokio::test]
    async fn test_commit_cadence() {
        for (len, batch) in [(1, 50), (49, 50), (50, 50), (120, 50), (7, 1), (10, 3)] {
            let driver = MemoryDriver::new();
            let (tx, _rx) = mpsc::unbounded_channel();

            let report = run_worker(&driver, task(len, batch), &tx).await;

            assert!(report.is_success());
            let commits = driver.commits();
            assert_eq!(commits.len(), len / batch + 1, "len={len} batch={batch}");
            assert_eq!(report.commits, commits.len() as u64);
            assert_eq!(report.committed, len as u64);
            for intermediate in &commits[..commits.len() - 1] {
                assert_eq!(intermediate.statements.len(), batch);
            }
            assert_eq!(commits.last().unwrap().statements.len(), len % batch);
        }
    }

    #[tokio::test]
    async fn test_empty_shard_opens_no_session() {
        let driver = MemoryDriver::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let report = run_worker(&driver, task(0, 50), &tx).await;

        assert!(report.is_success());
        assert_eq!(report.commits, 0);
        assert_eq!(driver.sessions_opened(), 0);
        assert!(driver.commits().is_empty());
    }

    #[tokio::test]
    async fn test_single_open_transaction_per_session() {
        let driver = MemoryDriver::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        run_worker(&driver, task(25, 4), &tx).await;

        assert_eq!(driver.max_open_transactions_per_session(), 1);
        assert_eq!(driver.open_transactions(), 0);
        assert_eq!(driver.leaked_transactions(), 0);
        assert_eq!(driver.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_failed_statement_stops_worker() {
        let bad = "insert $x isa thing, has n 7;";
        let driver = MemoryDriver::new().fail_on_statement(bad);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = run_worker(&driver, task(20, 5), &tx).await;
        drop(tx);

        assert!(!report.is_success());
        assert_eq!(report.submitted, 7);
        assert_eq!(report.committed, 5);
        assert!(report.error().unwrap().contains("rejected"));
        assert_eq!(driver.committed_statements().len(), 5);
        assert_eq!(driver.discarded_transactions(), 1);
        assert_eq!(driver.open_transactions(), 0);
        assert_eq!(driver.sessions_closed(), 1);

        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = Some(event);
        }
        assert!(matches!(
            last,
            Some(LoadEvent::WorkerFailed {
                submitted: 7,
                committed: 5,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_zero_batch_size_fails_worker() {
        let driver = MemoryDriver::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let report = run_worker(&driver, task(1, 0), &tx).await;

        assert!(!report.is_success());
        assert!(report.error().unwrap().contains("batch_size"));
        assert_eq!(report.submitted, 0);
        assert_eq!(driver.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_last_good_batch() {
        // (statements, batch size, failing commit, committed before failure)
        for (len, batch, failing, committed) in [(20, 5, 3, 10), (12, 5, 3, 10), (4, 5, 1, 0)] {
            let driver = MemoryDriver::new().fail_on_commit(failing);
            let (tx, _rx) = mpsc::unbounded_channel();

            let report = run_worker(&driver, task(len, batch), &tx).await;

            assert!(!report.is_success(), "len={len}");
            assert!(report.error().unwrap().contains("commit"));
            assert_eq!(report.committed, committed, "len={len}");
            assert_eq!(report.commits, failing as u64 - 1);
            assert_eq!(driver.committed_statements().len() as u64, committed);
            assert_eq!(driver.open_transactions(), 0);
            assert_eq!(driver.leaked_transactions(), 0);
            assert_eq!(driver.sessions_closed(), 1);
        }
    }

    #[tokio::test]
    async fn test_final_commit_not_written_to_batch_log() {
        let dir = tempfile::tempdir().unwrap();
        let driver = MemoryDriver::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut task = task(10, 4);
        task.log_dir = Some(dir.path().to_path_buf());

        let report = run_worker(&driver, task, &tx).await;
        drop(tx);

        assert!(report.is_success());
        assert_eq!(report.commits, 3);
        let content = std::fs::read_to_string(dir.path().join("0.log")).unwrap();
        let counts: Vec<&str> = content
            .lines()
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(counts, vec!["4", "8"]);

        let mut committed = Vec::new();
        while let Some(event) = rx.recv().await {
            if let LoadEvent::BatchCommitted { committed: c, .. } = event {
                committed.push(c);
            }
        }
        assert_eq!(committed, vec![4, 8, 10]);
    }

    #[tokio::test]
    async fn test_progress_events() {
        let driver = MemoryDriver::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut task = task(25, 50);
        task.progress_interval = 10;

        run_worker(&driver, task, &tx).await;
        drop(tx);

        let mut progress = Vec::new();
        while let Some(event) = rx.recv().await {
            if let LoadEvent::Progress { submitted, .. } = event {
                progress.push(submitted);
            }
        }
        assert_eq!(progress, vec![10, 20]);
    }
}
