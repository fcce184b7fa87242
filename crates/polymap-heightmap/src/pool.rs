//! A fixed-size worker pool fed through an unbounded channel.
//!
//! Jobs are fire-and-forget closures. Submission never blocks, and no
//! ordering between jobs is guaranteed once more than one worker runs.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, unbounded};

use crate::error::HeightmapError;

/// A unit of work executed on a pool thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker threads draining a shared job queue.
pub struct WorkerPool {
    /// Channel sender for submitting jobs. `None` after shutdown.
    job_sender: Option<Sender<Job>>,
    /// Handles to the worker threads (for shutdown).
    worker_handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `thread_count` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`HeightmapError::WorkerSpawn`] if the OS refuses a thread.
    pub fn new(thread_count: usize) -> Result<Self, HeightmapError> {
        let (job_tx, job_rx) = unbounded::<Job>();
        let thread_count = thread_count.max(1);

        let mut handles = Vec::with_capacity(thread_count);
        for index in 0..thread_count {
            let rx = job_rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("heightmap-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        // A panicking job must not take the worker down with it.
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            tracing::error!("Heightmap job panicked");
                        }
                    }
                })
                .map_err(HeightmapError::WorkerSpawn)?;
            handles.push(handle);
        }

        tracing::debug!(threads = thread_count, "Started heightmap worker pool");

        Ok(Self {
            job_sender: Some(job_tx),
            worker_handles: handles,
        })
    }

    /// Create a pool sized from the number of CPU cores, leaving headroom for
    /// the coordination thread.
    pub fn with_defaults() -> Result<Self, HeightmapError> {
        Self::new(default_thread_count())
    }

    /// Queue a job for execution.
    ///
    /// # Errors
    ///
    /// Returns [`HeightmapError::PoolClosed`] after shutdown or if every
    /// worker has exited.
    pub fn execute(&self, job: Job) -> Result<(), HeightmapError> {
        let sender = self.job_sender.as_ref().ok_or(HeightmapError::PoolClosed)?;
        sender.send(job).map_err(|_| HeightmapError::PoolClosed)
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Close the queue and join every worker once it has drained.
    pub fn shutdown(&mut self) {
        self.job_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// `num_cpus - 1`, never less than one.
pub fn default_thread_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}
