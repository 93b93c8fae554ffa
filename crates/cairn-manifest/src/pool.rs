//! Bounded worker pool for per-chunk store operations.
//!
//! Chunk uploads and fetches are independent, so they are dispatched across a
//! Rayon pool. Results are collected through an indexed parallel iterator,
//! which places each result at its input position: ordering is decided at
//! assembly, never by completion timing.

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::Result;
use crate::progress::ProgressCounter;

/// Maximum worker threads used by default (leave cores for the caller).
pub const MAX_WORKER_THREADS: usize = 4;

/// Default thread count: min(cpu_cores / 2, MAX_WORKER_THREADS), at least 1
pub fn default_thread_count() -> usize {
    (num_cpus::get() / 2).clamp(1, MAX_WORKER_THREADS)
}

pub(crate) fn create_pool(threads: Option<usize>) -> Result<ThreadPool> {
    let num_threads = threads.unwrap_or_else(default_thread_count).max(1);
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("cairn-worker-{}", i))
        .build()?)
}

/// Apply `op` to every item on the pool, returning results in input order.
///
/// The first error aborts the batch and is returned; no partial results escape.
pub(crate) fn ordered_map<T, R, F>(
    pool: &ThreadPool,
    items: &[T],
    progress: &ProgressCounter<'_>,
    op: F,
) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync,
{
    pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let out = op(item)?;
                progress.tick();
                Ok(out)
            })
            .collect()
    })
}
