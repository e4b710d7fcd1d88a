//! Error types for the loader.

use thiserror::Error;
use typeql_builder::QueryError;

/// Errors that can occur while preparing or running a load.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Invalid loader configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A statement source failed to compile
    #[error("Failed to compile statement {index}: {source}")]
    Compile {
        index: usize,
        #[source]
        source: QueryError,
    },

    /// Database driver error
    #[error("Driver error: {0:#}")]
    Driver(#[from] anyhow::Error),

    /// Batch log error
    #[error("Batch log error for {path}: {source}")]
    BatchLog {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
