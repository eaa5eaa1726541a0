//! Best-effort background tasks.
//!
//! Index updates and run persistence happen after the pipeline result is
//! assembled and must never block the caller's receipt of it. Tasks are
//! spawned detached, their failures are logged and dropped (at-most-once, no
//! retries), and `drain` gives shutdown an explicit place to wait for
//! whatever is still in flight.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Fire-and-forget task runner with drain-on-shutdown.
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for BackgroundTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTasks").finish_non_exhaustive()
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTasks {
    /// Creates an empty task set.
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns a detached task. Returns immediately; the task's outcome never
    /// reaches the caller.
    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.handles
            .lock()
            .expect("background task list lock poisoned")
            .push(handle);
        debug!(task = label, "background task spawned");
    }

    /// Number of tasks spawned and not yet drained.
    pub fn pending(&self) -> usize {
        self.handles
            .lock()
            .expect("background task list lock poisoned")
            .len()
    }

    /// Waits up to `timeout` for all spawned tasks to finish. Tasks still
    /// running afterwards are left detached.
    pub async fn drain(&self, timeout: Duration) {
        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self
                .handles
                .lock()
                .expect("background task list lock poisoned");
            guard.drain(..).collect()
        };

        if handles.is_empty() {
            return;
        }

        let wait_all = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    error!(error = %e, "background task panicked");
                }
            }
        };

        if tokio::time::timeout(timeout, wait_all).await.is_err() {
            warn!("background tasks still running at shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spawn_and_drain() {
        let tasks = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            tasks.spawn("test", async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(tasks.pending(), 3);

        tasks.drain(Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawn_does_not_block_caller() {
        let tasks = BackgroundTasks::new();
        let start = std::time::Instant::now();
        tasks.spawn("slow", async {
            tokio::time::sleep(Duration::from_secs(2)).await;
        });
        assert!(start.elapsed() < Duration::from_millis(500));

        // A short drain gives up on the still-sleeping task.
        tasks.drain(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_drain_survives_task_panic() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("panicky", async {
            panic!("injected panic");
        });
        tasks.drain(Duration::from_secs(1)).await;
        assert_eq!(tasks.pending(), 0);
    }
}
