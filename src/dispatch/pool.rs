//! Fixed-size worker pool executing dispatch jobs.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use super::{DispatchJob, Dispatcher};

/// Errors that can occur when submitting a job.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The pool's workers are gone; the job was not enqueued.
    #[error("Worker pool is no longer running")]
    PoolStopped,
}

/// A fixed-size pool of dispatch workers fed by one bounded queue.
///
/// Cloning shares the queue. The pool lives for the lifetime of the
/// process; there is no cancellation and no graceful drain at shutdown.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    sender: mpsc::Sender<DispatchJob>,
}

impl WorkerPool {
    /// Spawn `workers` resident worker tasks over a queue of `queue_depth`
    /// pending jobs. Both are clamped to at least 1.
    #[must_use]
    pub fn start(workers: usize, queue_depth: usize, dispatcher: Dispatcher) -> Self {
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let dispatcher = Arc::new(dispatcher);

        for worker in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let dispatcher = Arc::clone(&dispatcher);

            tokio::spawn(async move {
                debug!(worker, "Dispatch worker started");
                loop {
                    // The queue lock is released before the job runs.
                    let job = receiver.lock().await.recv().await;
                    let Some(job) = job else {
                        break;
                    };
                    dispatcher.dispatch(job).await;
                }
                debug!(worker, "Dispatch worker stopped");
            });
        }

        Self { sender }
    }

    /// Enqueue a job for asynchronous execution.
    ///
    /// Returns as soon as the job is queued - it never waits for execution,
    /// though it may block briefly while the bounded queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::PoolStopped`] if every worker has exited.
    pub async fn submit(&self, job: DispatchJob) -> Result<(), SubmitError> {
        self.sender
            .send(job)
            .await
            .map_err(|_| SubmitError::PoolStopped)
    }
}
