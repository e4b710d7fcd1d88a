//! Load coordinator.
//!
//! [`DataLoader`] compiles statement sources, splits the statements into one
//! shard per worker, runs every worker as its own tokio task and waits for all
//! of them before returning a [`LoadReport`].

use crate::batch_log::create_run_directory;
use crate::config::LoaderConfig;
use crate::driver::GraphDriver;
use crate::error::LoaderError;
use crate::events::LoadEvent;
use crate::logging::mask_address;
use crate::metrics::{LoadReport, WorkerReport, WorkerStatus};
use crate::partitioner::{describe_partitioning, partition_statements};
use crate::worker::{run_worker, WorkerTask};
use chrono::{Local, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info};
use typeql_builder::{QueryBuilder, QueryError};

/// Something that compiles to a single statement.
pub trait StatementSource {
    /// Compile (or recompile) the statement.
    fn compile(&mut self) -> Result<(), QueryError>;

    /// The compiled statement text.
    fn statement(&self) -> &str;
}

impl StatementSource for QueryBuilder {
    fn compile(&mut self) -> Result<(), QueryError> {
        self.compile_query().map(|_| ())
    }

    fn statement(&self) -> &str {
        self.query()
    }
}

/// Pre-compiled statement text.
impl StatementSource for String {
    fn compile(&mut self) -> Result<(), QueryError> {
        Ok(())
    }

    fn statement(&self) -> &str {
        self
    }
}

/// Compile every source, in order.
///
/// Stops at the first source that fails to compile.
pub fn compile_statements<S: StatementSource>(
    sources: &mut [S],
) -> Result<Vec<String>, LoaderError> {
    sources
        .iter_mut()
        .enumerate()
        .map(|(index, source)| {
            source
                .compile()
                .map_err(|err| LoaderError::Compile { index, source: err })?;
            Ok(source.statement().to_string())
        })
        .collect()
}

/// Loads compiled statements into a database with parallel workers.
pub struct DataLoader<D: GraphDriver> {
    driver: Arc<D>,
    config: LoaderConfig,
    observer: Option<UnboundedSender<LoadEvent>>,
}

impl<D: GraphDriver> DataLoader<D> {
    /// Create a loader; fails if the configuration is invalid.
    pub fn new(driver: D, config: LoaderConfig) -> Result<Self, LoaderError> {
        Self::with_shared_driver(Arc::new(driver), config)
    }

    /// Create a loader around a driver that is shared with other code.
    pub fn with_shared_driver(driver: Arc<D>, config: LoaderConfig) -> Result<Self, LoaderError> {
        config.validate()?;
        Ok(Self {
            driver,
            config,
            observer: None,
        })
    }

    /// Forward every worker event to `observer` as well as the log.
    pub fn with_observer(mut self, observer: UnboundedSender<LoadEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Compile `sources` and load the resulting statements.
    pub async fn load<S: StatementSource>(
        &self,
        sources: &mut [S],
    ) -> Result<LoadReport, LoaderError> {
        let statements = compile_statements(sources)?;
        self.load_statements(statements).await
    }

    /// Load already compiled statements.
    ///
    /// Worker failures do not abort the run; they are reported per worker in
    /// the returned [`LoadReport`].
    pub async fn load_statements(
        &self,
        statements: Vec<String>,
    ) -> Result<LoadReport, LoaderError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let total = statements.len();

        let shards = partition_statements(statements, self.config.workers)?;
        debug!("{}", describe_partitioning(&shards));

        info!(
            "Loading {} statements into '{}' at {} with {} workers (batch size: {})",
            total,
            self.config.database,
            mask_address(&self.config.address),
            self.config.workers,
            self.config.batch_size
        );

        let log_dir = match &self.config.logs_dir {
            Some(dir) => {
                let run_dir = create_run_directory(dir, Local::now()).await?;
                info!("Writing batch logs to {:?}", run_dir);
                Some(run_dir)
            }
            None => None,
        };

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(shards.len());

        for (worker_id, statements) in shards.into_iter().enumerate() {
            let assigned = statements.len() as u64;
            let task = WorkerTask {
                worker_id,
                database: self.config.database.clone(),
                statements,
                batch_size: self.config.batch_size,
                progress_interval: self.config.progress_interval,
                log_dir: log_dir.clone(),
            };
            let driver = Arc::clone(&self.driver);
            let events = events_tx.clone();

            let handle =
                tokio::spawn(async move { run_worker(driver.as_ref(), task, &events).await });
            handles.push((worker_id, assigned, handle));
        }
        drop(events_tx);

        // Ends once every worker has dropped its sender.
        while let Some(event) = events_rx.recv().await {
            event.log();
            if let Some(observer) = &self.observer {
                if observer.send(event).is_err() {
                    debug!("Load observer dropped, event discarded");
                }
            }
        }

        let mut workers = Vec::with_capacity(handles.len());
        for (worker_id, assigned, handle) in handles {
            match handle.await {
                Ok(report) => workers.push(report),
                Err(e) => {
                    error!("Worker {} did not complete: {}", worker_id, e);
                    workers.push(WorkerReport {
                        worker_id,
                        assigned,
                        submitted: 0,
                        committed: 0,
                        commits: 0,
                        started_at,
                        completed_at: Utc::now(),
                        duration_ms: start.elapsed().as_millis() as u64,
                        status: WorkerStatus::Failed {
                            error: format!("worker task did not complete: {e}"),
                        },
                    });
                }
            }
        }

        let report = LoadReport::from_workers(workers, started_at, start.elapsed());
        info!(
            "Time taken: {:.3}s ({} of {} statements committed, {:.2} statements/sec)",
            report.wall_clock_secs(),
            report.total_committed,
            report.total_statements,
            report.statements_per_second()
        );
        if !report.is_success() {
            error!(
                "{} of {} workers failed",
                report.failed_workers, report.total_workers
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDriver;
    use typeql_builder::Thing;

    #[test]
    fn test_compile_statements_in_order() {
        let mut builders: Vec<QueryBuilder> = (0..3)
            .map(|i| {
                let mut builder = QueryBuilder::new();
                builder
                    .insert_entity("person", "p")
                    .unwrap()
                    .has_typed("id", i, "long");
                builder
            })
            .collect();

        let statements = compile_statements(&mut builders).unwrap();
        assert_eq!(
            statements,
            vec![
                "insert $p isa person, has id 0; ",
                "insert $p isa person, has id 1; ",
                "insert $p isa person, has id 2; ",
            ]
        );
    }

    #[test]
    fn test_compile_error_reports_index() {
        let mut ok = QueryBuilder::new();
        ok.insert_entity("person", "p").unwrap();
        let mut bad = QueryBuilder::new();
        bad.insert_relationship("friendship", "f").unwrap();

        let err = compile_statements(&mut [ok, bad]).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Compile {
                index: 1,
                source: QueryError::MalformedRelationship(_)
            }
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LoaderConfig::new("localhost:1729", "db").with_workers(0);
        assert!(matches!(
            DataLoader::new(MemoryDriver::new(), config),
            Err(LoaderError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_statements_reports_every_worker() {
        let driver = Arc::new(MemoryDriver::new());
        let config = LoaderConfig::new("localhost:1729", "db")
            .with_workers(3)
            .with_batch_size(4);
        let loader = DataLoader::with_shared_driver(Arc::clone(&driver), config).unwrap();

        let statements: Vec<String> = (0..10).map(|i| format!("insert $x{i} isa t;")).collect();
        let report = loader.load_statements(statements.clone()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.total_workers, 3);
        assert_eq!(report.total_committed, 10);
        let assigned: Vec<u64> = report.workers.iter().map(|w| w.assigned).collect();
        assert_eq!(assigned, vec![3, 3, 4]);

        let mut committed = driver.committed_statements();
        committed.sort();
        let mut expected = statements;
        expected.sort();
        assert_eq!(committed, expected);
    }
}
