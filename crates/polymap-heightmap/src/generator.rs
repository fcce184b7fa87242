//! The heightmap dispatcher.
//!
//! [`HeightmapGenerator::start_run`] fans one [`PointTask`] per raster cell
//! out to a worker pool and returns immediately. The completion callback is
//! never run on a worker: the task that finishes the run queues it, and the
//! thread that owns the generator runs it from
//! [`pump_completions`](HeightmapGenerator::pump_completions) or
//! [`wait_for_completion`](HeightmapGenerator::wait_for_completion).

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use polymap_graph::MeshGraph;

use crate::error::HeightmapError;
use crate::pool::WorkerPool;
use crate::sample::{HeightmapSettings, RasterCoordinate, RunConfiguration};
use crate::store::{Heightmap, ResultStore};
use crate::task::{PointTask, RunContext};
use crate::tracker::{CompletionCallback, CompletionTracker, RunPhase};

/// Rasters larger than this suppress per-cell completion logging.
pub const VERBOSE_LOG_LIMIT: u32 = 150;

/// Read-only progress view that can be moved to other threads.
#[derive(Clone)]
pub struct ProgressHandle {
    tracker: Arc<CompletionTracker>,
}

impl ProgressHandle {
    /// `completed / total` of the current run, or 0 when idle.
    pub fn completion_fraction(&self) -> f32 {
        self.tracker.completion_fraction()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.tracker.phase()
    }
}

/// Samples a mesh graph into a square raster on a worker pool.
pub struct HeightmapGenerator {
    pool: WorkerPool,
    tracker: Arc<CompletionTracker>,
    completions: Receiver<CompletionCallback>,
    store: Mutex<Arc<ResultStore>>,
    faults: Arc<Mutex<Vec<HeightmapError>>>,
}

impl HeightmapGenerator {
    /// Create a generator backed by `worker_threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`HeightmapError::WorkerSpawn`] if a worker cannot be started.
    pub fn new(worker_threads: usize) -> Result<Self, HeightmapError> {
        Ok(Self::with_pool(WorkerPool::new(worker_threads)?))
    }

    /// Create a generator with a CPU-sized worker pool.
    pub fn with_defaults() -> Result<Self, HeightmapError> {
        Ok(Self::with_pool(WorkerPool::with_defaults()?))
    }

    fn with_pool(pool: WorkerPool) -> Self {
        let (tx, rx) = unbounded();
        Self {
            pool,
            tracker: Arc::new(CompletionTracker::new(tx)),
            completions: rx,
            store: Mutex::new(Arc::new(ResultStore::new(0))),
            faults: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Dispatch one task per cell of a `settings.size²` raster and return
    /// without waiting for any of them.
    ///
    /// `on_complete` runs exactly once, on the thread that pumps this
    /// generator, after every sample has been recorded.
    ///
    /// # Errors
    ///
    /// - [`HeightmapError::InvalidRasterSize`] for a zero size; nothing is
    ///   dispatched.
    /// - [`HeightmapError::RunInProgress`] if the previous run's callback has
    ///   not been pumped yet.
    /// - [`HeightmapError::PoolClosed`] if the workers are gone.
    pub fn start_run<F>(
        &self,
        graph: Arc<dyn MeshGraph>,
        settings: HeightmapSettings,
        on_complete: F,
    ) -> Result<(), HeightmapError>
    where
        F: FnOnce() + Send + 'static,
    {
        if settings.size == 0 {
            return Err(HeightmapError::InvalidRasterSize(settings.size));
        }
        let config = RunConfiguration::new(&settings, graph.extent());
        let total = (settings.size as usize)
            .checked_mul(settings.size as usize)
            .ok_or(HeightmapError::InvalidRasterSize(settings.size))?;
        let verbose = settings.size <= VERBOSE_LOG_LIMIT;

        // Armed with the full count up front so no early finisher can see
        // `completed == total` while cells are still being queued.
        self.tracker.begin(total, verbose, Box::new(on_complete))?;

        let store = Arc::new(ResultStore::new(settings.size));
        *self.store.lock().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&store);
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        if !verbose {
            tracing::warn!(
                size = settings.size,
                "Large heightmap; per-pixel completion logging is disabled. \
                 Poll completion_fraction() for progress"
            );
        }
        tracing::info!(
            size = settings.size,
            cells = total,
            scale = config.scale,
            selection = ?config.selection_mode,
            anchor = ?config.anchor_mode,
            workers = self.pool.thread_count(),
            "Dispatching heightmap run"
        );

        let context = Arc::new(RunContext {
            graph,
            config,
            store,
            tracker: Arc::clone(&self.tracker),
            faults: Arc::clone(&self.faults),
        });

        for y in 0..settings.size {
            for x in 0..settings.size {
                let task = PointTask::new(RasterCoordinate::new(x, y), Arc::clone(&context));
                if let Err(err) = self.pool.execute(Box::new(move || task.run())) {
                    tracing::error!("Aborting heightmap run: {err}");
                    self.tracker.abort();
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Run every completion callback that is waiting, on the calling thread.
    ///
    /// Returns the number of callbacks invoked. Call this regularly from the
    /// coordination thread.
    pub fn pump_completions(&self) -> usize {
        let mut fired = 0;
        while let Ok(callback) = self.completions.try_recv() {
            self.fire(callback);
            fired += 1;
        }
        fired
    }

    /// Block until the current run completes or `timeout` elapses, then run
    /// its callback on the calling thread.
    ///
    /// Returns `true` if a callback was invoked.
    pub fn wait_for_completion(&self, timeout: Duration) -> bool {
        match self.completions.recv_timeout(timeout) {
            Ok(callback) => {
                self.fire(callback);
                true
            }
            Err(_) => false,
        }
    }

    fn fire(&self, callback: CompletionCallback) {
        // Idle first so the callback itself may start the next run.
        self.tracker.acknowledge();
        callback();
    }

    /// The finished raster of the last completed run.
    pub fn heightmap(&self) -> Option<Heightmap> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_heightmap()
    }

    /// `completed / total` of the current run, or 0 when idle.
    pub fn completion_fraction(&self) -> f32 {
        self.tracker.completion_fraction()
    }

    /// A cloneable progress view for other threads.
    pub fn progress_handle(&self) -> ProgressHandle {
        ProgressHandle {
            tracker: Arc::clone(&self.tracker),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.tracker.phase()
    }

    /// Whether the current or last run logs every completed cell.
    pub fn is_verbose(&self) -> bool {
        self.tracker.is_verbose()
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// Drain invariant violations recorded by tasks of the current run.
    pub fn take_faults(&self) -> Vec<HeightmapError> {
        std::mem::take(&mut *self.faults.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
