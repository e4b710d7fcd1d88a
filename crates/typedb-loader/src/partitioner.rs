//! Work partitioning across load workers.
//!
//! Statements are split into contiguous shards. Every shard but the last gets
//! `len / workers` statements and the last shard takes the remainder, so the
//! last worker can end up with noticeably more work when the statement count
//! is not a multiple of the worker count.

use crate::error::LoaderError;
use std::ops::Range;

/// Index ranges of each shard for `len` items split across `workers`.
pub fn shard_ranges(len: usize, workers: usize) -> Result<Vec<Range<usize>>, LoaderError> {
    if workers == 0 {
        return Err(LoaderError::Config(
            "cannot partition statements across zero workers".into(),
        ));
    }

    let base = len / workers;
    let ranges = (0..workers)
        .map(|i| {
            let start = i * base;
            let end = if i == workers - 1 { len } else { start + base };
            start..end
        })
        .collect();
    Ok(ranges)
}

/// Split statements into one contiguous shard per worker.
///
/// Concatenating the shards in order gives back the original list.
pub fn partition_statements<T>(
    statements: Vec<T>,
    workers: usize,
) -> Result<Vec<Vec<T>>, LoaderError> {
    let ranges = shard_ranges(statements.len(), workers)?;

    let mut shards = Vec::with_capacity(workers);
    let mut rest = statements;
    for range in &ranges[..workers - 1] {
        let tail = rest.split_off(range.len());
        shards.push(rest);
        rest = tail;
    }
    shards.push(rest);

    Ok(shards)
}

/// Describe the partitioning plan for logging.
pub fn describe_partitioning<T>(shards: &[Vec<T>]) -> String {
    let mut lines = Vec::new();
    lines.push("Work distribution:".to_string());

    let mut offset = 0;
    for (worker_id, shard) in shards.iter().enumerate() {
        if shard.is_empty() {
            lines.push(format!("  worker {worker_id}: (no statements)"));
        } else {
            lines.push(format!(
                "  worker {worker_id}: {} statements [{}..{})",
                shard.len(),
                offset,
                offset + shard.len()
            ));
        }
        offset += shard.len();
    }

    lines.join("\n")
}
