//! typedb-sync
//!
//! Build TypeQL `match`/`insert` queries from typed entities and relationships,
//! then load them into TypeDB with parallel transactional workers.
//!
//! # Crates
//!
//! - `typeql_builder` - query graph builder and TypeQL compiler
//! - `typedb_loader` - chunk scheduler, load workers and coordinator
//!
//! # Usage
//!
//! ```ignore
//! use clap::Parser;
//! use typedb_sync::{LoadArgs, QueryBuilder, Thing};
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     load: LoadArgs,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     typedb_sync::init_tracing();
//!     let cli = Cli::parse();
//!
//!     let mut builder = QueryBuilder::new();
//!     builder.insert_entity("protein", "p")?.has("protein_id", "Q1");
//!
//!     let report = typedb_sync::run_load(driver, &mut [builder], cli.load.into()).await?;
//!     println!("{}", report.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

use anyhow::Context;

pub use typedb_loader::testing;
pub use typedb_loader::{
    DataLoader, DriverSession, GraphDriver, LoadArgs, LoadEvent, LoadReport, LoaderConfig,
    LoaderError, SessionType, StatementSource, Transaction, TransactionType, WorkerReport,
    WorkerStatus,
};
pub use typeql_builder::{
    AttributeValue, Category, Entity, QueryBuilder, QueryError, Relationship, Thing, Variable,
};

/// Install the global tracing subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Compile `sources` and load them with a loader built from `config`.
///
/// Configuration and compile errors are returned as errors. Worker failures
/// are not: check [`LoadReport::is_success`] on the returned report.
pub async fn run_load<D, S>(
    driver: D,
    sources: &mut [S],
    config: LoaderConfig,
) -> anyhow::Result<LoadReport>
where
    D: GraphDriver,
    S: StatementSource,
{
    let database = config.database.clone();
    let loader = DataLoader::new(driver, config).context("Invalid loader configuration")?;
    let report = loader
        .load(sources)
        .await
        .with_context(|| format!("Failed to load statements into '{database}'"))?;

    for failure in report.failures() {
        tracing::warn!(
            "Worker {} stopped after committing {} of {} statements",
            failure.worker_id,
            failure.committed,
            failure.assigned
        );
    }
    Ok(report)
}
