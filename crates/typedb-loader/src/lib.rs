//! Parallel transactional loader for TypeQL statements.
//!
//! This crate takes compiled statements (usually from
//! [`typeql_builder::QueryBuilder`]) and loads them into a TypeDB database
//! through a pluggable driver, using several concurrent workers that each
//! commit their statements in fixed-size transactions.
//!
//! # Overview
//!
//! ```text
//! sources ──compile──▶ statements ──partition──▶ shard 0 ──▶ worker 0 ─┐
//!                                                shard 1 ──▶ worker 1 ─┼─▶ LoadReport
//!                                                shard N ──▶ worker N ─┘
//! ```
//!
//! Shards are contiguous; the last one takes any remainder. Each worker opens
//! one session, commits every `batch_size` statements and commits the final
//! partial batch at the end. Worker failures are isolated and reported in the
//! [`LoadReport`].
//!
//! # Example
//!
//! ```ignore
//! use typedb_loader::{DataLoader, LoaderConfig};
//!
//! let config = LoaderConfig::new("localhost:1729", "proteins")
//!     .with_workers(4)
//!     .with_batch_size(100)
//!     .with_logs_dir("./load-logs");
//!
//! let loader = DataLoader::new(driver, config)?;
//! let report = loader.load(&mut builders).await?;
//!
//! println!("Committed {} statements in {:.2}s", report.total_committed, report.wall_clock_secs());
//! ```

mod args;
mod batch_log;
mod config;
mod driver;
mod error;
mod events;
mod loader;
mod logging;
mod metrics;
mod partitioner;
mod worker;

pub mod testing;

pub use args::LoadArgs;
pub use batch_log::{create_run_directory, format_line, run_directory, BatchLog};
pub use config::{LoaderConfig, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL, DEFAULT_WORKERS};
pub use driver::{DriverSession, GraphDriver, SessionType, Transaction, TransactionType};
pub use error::LoaderError;
pub use events::LoadEvent;
pub use loader::{compile_statements, DataLoader, StatementSource};
pub use logging::mask_address;
pub use metrics::{LoadReport, WorkerReport, WorkerStatus};
pub use partitioner::{describe_partitioning, partition_statements, shard_ranges};
pub use worker::{run_worker, WorkerTask};
