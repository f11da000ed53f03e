//! Bounded worker pool for oracle-heavy chunk tasks
//!
//! A fixed set of workers pulls jobs from a bounded queue. Submitting waits
//! while the queue is full and resumes once a worker drains an entry. Jobs run
//! on blocking threads and report back through a [`TaskHandle`].

use crate::config::MetricsConfig;
use crate::error::{MetricsError, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to the pool; cloning it shares the same workers and queue
#[derive(Clone)]
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    workers: usize,
}

/// Completion handle of a submitted job
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

/// Per-caller submission handle that yields to other callers every
/// `workers` submissions
pub struct Submitter {
    pool: WorkerPool,
    submitted: usize,
}

impl WorkerPool {
    /// Start `workers` workers behind a queue of `max_queue` slots.
    /// Must be called from within a tokio runtime.
    pub fn new(workers: usize, max_queue: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(max_queue.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        for id in 0..workers {
            tokio::spawn(worker_loop(id, Arc::clone(&receiver)));
        }
        debug!(
            "Started worker pool with {} workers and a queue of {}",
            workers,
            max_queue.max(1)
        );

        Self { sender, workers }
    }

    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.workers, config.max_queue)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue a job, waiting for a free slot when the queue is saturated.
    /// Returns once the job is admitted; await the handle for its result.
    pub async fn submit<T, F>(&self, job: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            // The caller may have given up on the result already
            let _ = tx.send(job());
        });

        self.sender
            .send(job)
            .await
            .map_err(|_| MetricsError::rejected("worker pool is shut down"))?;

        Ok(TaskHandle { receiver: rx })
    }

    pub fn submitter(&self) -> Submitter {
        Submitter {
            pool: self.clone(),
            submitted: 0,
        }
    }
}

impl<T> TaskHandle<T> {
    /// Wait for the job to finish. A job that panicked is reported as rejected.
    pub async fn join(self) -> Result<T> {
        self.receiver
            .await
            .map_err(|_| MetricsError::rejected("task aborted before producing a result"))?
    }
}

impl Submitter {
    pub async fn submit<T, F>(&mut self, job: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let handle = self.pool.submit(job).await?;
        self.submitted += 1;
        if self.submitted % self.pool.workers == 0 {
            tokio::task::yield_now().await;
        }
        Ok(handle)
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

async fn worker_loop(id: usize, queue: Arc<Mutex<mpsc::Receiver<Job>>>) {
    loop {
        let job = {
            let mut receiver = queue.lock().await;
            receiver.recv().await
        };
        let Some(job) = job else {
            debug!("Worker {} stopping: queue closed", id);
            break;
        };
        if let Err(e) = tokio::task::spawn_blocking(job).await {
            warn!("Worker {} task failed: {}", id, e);
        }
    }
}
