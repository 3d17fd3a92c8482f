//! Bounded-concurrency execution of independent tasks

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{AcquireError, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

/// Runs independent tasks with at most `max_workers` active at once
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: usize,
}

impl WorkerPool {
    /// Create a pool. A cap of zero is raised to one.
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every task and return their outputs in completion order.
    ///
    /// Stops at the first failure and aborts the tasks still pending or
    /// running. Dropping the returned future aborts all of them as well.
    pub async fn run<T, E, F>(&self, tasks: Vec<F>) -> Result<Vec<T>, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<JoinError> + From<AcquireError> + Send + 'static,
    {
        let total = tasks.len();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut set = JoinSet::new();

        for task in tasks {
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                task.await
            });
        }

        debug!(total, max_workers = self.max_workers, "Worker pool started");

        let mut outputs = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(output)) => outputs.push(output),
                Ok(Err(e)) => {
                    set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    set.abort_all();
                    return Err(E::from(e));
                }
            }
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    enum TestError {
        Task(usize),
        Pool,
    }

    impl From<JoinError> for TestError {
        fn from(_: JoinError) -> Self {
            Self::Pool
        }
    }

    impl From<AcquireError> for TestError {
        fn from(_: AcquireError) -> Self {
            Self::Pool
        }
    }

    #[tokio::test]
    async fn test_runs_all_tasks() {
        let pool = WorkerPool::new(3);
        let tasks: Vec<_> = (1..=5)
            .map(|i| async move { Ok::<_, TestError>(i * 10) })
            .collect();

        let mut outputs = pool.run(tasks).await.unwrap();
        outputs.sort();

        assert_eq!(outputs, vec![10, 20, 30, 40, 50]);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_cap() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(2);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let active = active.clone();
                let peak = peak.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, TestError>(i)
                }
            })
            .collect();

        let outputs = pool.run(tasks).await.unwrap();

        assert_eq!(outputs.len(), 8);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_failure_cancels_the_rest() {
        let finished = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(4);

        let mut tasks = Vec::new();
        for i in 0..4usize {
            let finished = finished.clone();
            tasks.push(async move {
                if i == 0 {
                    return Err(TestError::Task(i));
                }
                tokio::time::sleep(Duration::from_secs(30)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(i)
            });
        }

        let result = pool.run(tasks).await;

        assert!(matches!(result, Err(TestError::Task(0))));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let pool = WorkerPool::new(1);
        let tasks = vec![async move {
            if true {
                panic!("boom");
            }
            Ok::<usize, TestError>(1)
        }];

        let result = pool.run(tasks).await;
        assert!(matches!(result, Err(TestError::Pool)));
    }

    #[test]
    fn test_zero_cap_is_raised() {
        assert_eq!(WorkerPool::new(0).max_workers(), 1);
    }
}
