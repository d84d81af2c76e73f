//! Fail-fast parallel map over a fixed-size rayon pool.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{AnalysisError, Result};

/// A dedicated pool that runs one phase at a time.
///
/// The first error is kept; items not yet started are skipped once it is set.
pub(crate) struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub(crate) fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("codelink-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub(crate) fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `job` to every item; all results, or the first error.
    pub(crate) fn run<T, R, F>(&self, items: &[T], job: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync,
    {
        let failed = AtomicBool::new(false);
        let first_error: Mutex<Option<AnalysisError>> = Mutex::new(None);

        let results: Vec<Option<R>> = self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    if failed.load(Ordering::Acquire) {
                        return None;
                    }
                    match job(item) {
                        Ok(value) => Some(value),
                        Err(err) => {
                            let mut slot = first_error.lock();
                            if slot.is_none() {
                                *slot = Some(err);
                            }
                            failed.store(true, Ordering::Release);
                            None
                        }
                    }
                })
                .collect()
        });

        if let Some(err) = first_error.into_inner() {
            return Err(err);
        }
        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_collects_in_order() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.workers(), 3);
        let doubled = pool.run(&[1, 2, 3, 4], |n| Ok(n * 2)).unwrap();
        assert_eq!(doubled, vec![2, 4, 6, 8]);
    }

    #[test]
    fn test_first_error_wins() {
        let pool = WorkerPool::new(1).unwrap();
        let started = AtomicUsize::new(0);
        let items: Vec<usize> = (0..50).collect();
        let err = pool
            .run(&items, |n| {
                started.fetch_add(1, Ordering::SeqCst);
                if *n >= 3 {
                    Err(AnalysisError::collect(format!("f{n}"), "bad"))
                } else {
                    Ok(*n)
                }
            })
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Collect { .. }));
        assert!(started.load(Ordering::SeqCst) < items.len());
    }
}
