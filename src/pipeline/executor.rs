//! Bounded execution of capability invocations.
//!
//! One shared, fixed-size pool bounds how many capability calls run at a
//! time, and every call carries a hard wall-clock deadline covering both the
//! wait for a pool slot and the call itself. A timed-out call is abandoned,
//! not cancelled: its pool slot is returned immediately, while the spawned
//! task keeps running outside the pool until its future resolves on its own.
//! Sustained timeout pressure can therefore leave in-flight requests
//! consuming resources, but it can never starve later calls of the pool.
//! Callers must treat a timeout as "unknown outcome".

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};
use tracing::{error, warn};

/// Runs tasks under a shared concurrency bound with per-task timeouts.
pub struct BoundedExecutor {
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedExecutor")
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

impl BoundedExecutor {
    /// Creates an executor with `max_workers` concurrent task slots.
    pub fn new(max_workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_workers)),
        }
    }

    /// Executes `task` with a hard wall-clock bound.
    ///
    /// The deadline covers waiting for a pool slot as well as the task
    /// itself. Returns `Some(output)` when the task finishes in time and
    /// `None` when the deadline elapses or the task panics. The pool bounds
    /// only work the caller is still waiting on: the permit is held here,
    /// not by the spawned task, so an abandoned task frees its slot the
    /// moment this call returns.
    ///
    /// Errors produced *by* the task travel inside `Some` as ordinary values;
    /// only the timeout and panic paths yield `None`.
    pub async fn run_with_timeout<F, T>(&self, timeout: Duration, task: F) -> Option<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = Instant::now() + timeout;

        let _permit = match timeout_at(deadline, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            // The semaphore is never closed; treat it as a missing result if
            // it somehow is.
            Ok(Err(_)) => return None,
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    "no pool slot before the deadline, skipping task"
                );
                return None;
            }
        };

        let handle = tokio::spawn(task);

        match timeout_at(deadline, handle).await {
            Ok(Ok(output)) => Some(output),
            Ok(Err(join_error)) => {
                error!(error = %join_error, "bounded task panicked");
                None
            }
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    "task exceeded its deadline, abandoning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_returns_task_output() {
        let executor = BoundedExecutor::new(2);
        let result = executor
            .run_with_timeout(Duration::from_secs(1), async { 41 + 1 })
            .await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_task_error_travels_inside_some() {
        let executor = BoundedExecutor::new(2);
        let result: Option<Result<(), String>> = executor
            .run_with_timeout(Duration::from_secs(1), async { Err("boom".to_string()) })
            .await;
        assert_eq!(result, Some(Err("boom".to_string())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout_yields_none_promptly() {
        let executor = BoundedExecutor::new(2);
        let start = Instant::now();
        let result: Option<()> = executor
            .run_with_timeout(Duration::from_millis(50), async {
                tokio::time::sleep(Duration::from_secs(30)).await;
            })
            .await;
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_abandoned_task_keeps_running() {
        let executor = BoundedExecutor::new(2);
        let finished = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&finished);
        let result: Option<()> = executor
            .run_with_timeout(Duration::from_millis(20), async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
            })
            .await;
        assert!(result.is_none());
        assert!(!finished.load(Ordering::SeqCst));

        // The abandoned task is detached, not cancelled.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_task_releases_its_pool_slot() {
        let executor = BoundedExecutor::new(1);

        let hung: Option<()> = executor
            .run_with_timeout(Duration::from_millis(50), async {
                tokio::time::sleep(Duration::from_secs(30)).await;
            })
            .await;
        assert!(hung.is_none());

        // The only slot is free again even though the first task is still
        // running detached.
        let result = executor
            .run_with_timeout(Duration::from_secs(1), async { 7 })
            .await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_deadline_covers_waiting_for_a_slot() {
        let executor = Arc::new(BoundedExecutor::new(1));

        // Occupy the only slot with a long-running call.
        let busy = Arc::clone(&executor);
        let holder = tokio::spawn(async move {
            busy.run_with_timeout(Duration::from_secs(5), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        // A queued call must give up at its own deadline, not wait forever.
        let start = Instant::now();
        let result: Option<()> = executor
            .run_with_timeout(Duration::from_millis(100), async {})
            .await;
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(2));

        holder.abort();
    }

    #[tokio::test]
    async fn test_panic_yields_none() {
        let executor = BoundedExecutor::new(2);
        let result: Option<()> = executor
            .run_with_timeout(Duration::from_secs(1), async {
                panic!("injected panic");
            })
            .await;
        assert!(result.is_none());
    }
}
