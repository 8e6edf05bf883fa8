//! Dedicated rayon pools sized by the caller's worker count.

use crate::error::{Error, Result};
use rayon::ThreadPool;

/// Build a pool of exactly `workers` threads. `0` is rejected.
pub(crate) fn worker_pool(workers: usize) -> Result<ThreadPool> {
    if workers == 0 {
        return Err(Error::InvalidParameter {
            name: "workers",
            message: "must be at least 1",
        });
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))
}
