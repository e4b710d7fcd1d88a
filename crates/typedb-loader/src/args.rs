//! CLI argument definitions for embedding the loader in a command line.

use crate::config::LoaderConfig;
use clap::Args;
use std::path::PathBuf;

/// Loader arguments.
///
/// Flatten this into an application's own `clap` parser and convert it into a
/// [`LoaderConfig`].
#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    /// TypeDB server address (e.g., localhost:1729)
    #[arg(long, env = "TYPEDB_ADDRESS", default_value = "localhost:1729")]
    pub address: String,

    /// Target database name
    #[arg(long, env = "TYPEDB_DATABASE")]
    pub database: String,

    /// Number of statements committed per transaction
    #[arg(long, env = "TYPEDB_BATCH_SIZE", default_value = "50")]
    pub batch_size: usize,

    /// Number of concurrent workers
    #[arg(long, env = "TYPEDB_WORKERS", default_value = "1")]
    pub workers: usize,

    /// Directory for per-worker batch logs
    #[arg(long, env = "TYPEDB_LOGS_DIR")]
    pub logs_dir: Option<PathBuf>,

    /// Statements between progress messages (0 disables them)
    #[arg(long, default_value = "1000")]
    pub progress_interval: u64,
}

impl From<LoadArgs> for LoaderConfig {
    fn from(args: LoadArgs) -> Self {
        Self {
            address: args.address,
            database: args.database,
            batch_size: args.batch_size,
            workers: args.workers,
            logs_dir: args.logs_dir,
            progress_interval: args.progress_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        load: LoadArgs,
    }

    #[test]
    fn test_args_into_config() {
        let cli = TestCli::parse_from([
            "test",
            "--database",
            "proteins",
            "--workers",
            "4",
            "--logs-dir",
            "/tmp/logs",
        ]);
        let config = LoaderConfig::from(cli.load);

        assert_eq!(config.database, "proteins");
        assert_eq!(config.workers, 4);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.logs_dir, Some(PathBuf::from("/tmp/logs")));
    }
}
