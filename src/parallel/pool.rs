//! Worker threads for the roster matrix.
//!
//! A roster matrix resolves every (source, target) pair, so it is the one query
//! worth spreading over threads. `BUFFSHEET_WORKERS` picks the thread count.

use rayon::ThreadPoolBuilder;
use tracing::warn;

use crate::config::SheetConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Thread count for matrix queries; 0 runs on the shared global pool.
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    pub fn from_config(config: &SheetConfig) -> Self {
        Self::with_workers(config.workers)
    }

    /// Runs `job` inside a dedicated pool of `workers` threads, or on the global pool
    /// when `workers` is 0 or a dedicated pool cannot be started.
    pub fn install<F, R>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return job();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(job),
            Err(err) => {
                warn!(workers = self.workers, "matrix runs on the global pool: {err}");
                job()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn dedicated_pool_has_requested_thread_count() {
        let threads = WorkerPool::with_workers(2).install(rayon::current_num_threads);
        assert_eq!(threads, 2);
    }

    #[test]
    fn pool_follows_configured_workers() {
        let config = SheetConfig {
            workers: 3,
            ..SheetConfig::default()
        };
        let pool = WorkerPool::from_config(&config);
        assert_eq!(pool, WorkerPool::with_workers(3));
        assert_eq!(pool.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn global_pool_still_runs_parallel_iterators() {
        let total: u64 = WorkerPool::default().install(|| (1..=100u64).into_par_iter().sum());
        assert_eq!(total, 5050);
    }
}
