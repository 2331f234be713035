//! Bounded execution pool for per-PR tasks
//!
//! Admission waits for a free slot instead of failing, so a saturated pool
//! applies backpressure to the repository workers that submit into it.
//! Spawned tasks are registered on the run's shared [`TaskTracker`].

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

use crate::error::ScavengerError;

#[derive(Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    size: usize,
}

impl TaskPool {
    pub fn new(size: usize, tracker: TaskTracker) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            tracker,
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks that could start right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a free slot, then spawn `task` holding that slot until it finishes.
    pub async fn submit<F>(&self, task: F) -> Result<(), ScavengerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ScavengerError::PoolClosed)?;

        self.tracker.spawn(async move {
            let _permit = permit;
            task.await;
        });

        Ok(())
    }

    /// Stop admitting tasks. Tasks already running are left to finish.
    pub fn shutdown(&self) {
        self.permits.close();
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }
}
