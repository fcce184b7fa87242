//! Heightmap run errors.

/// Errors surfaced by the heightmap dispatcher and its invariant checks.
///
/// Per-cell lookup failures are not errors: they degrade to an open-water
/// sample and never reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum HeightmapError {
    /// The raster size must be positive and its cell count must fit in memory.
    #[error("invalid raster size: {0}")]
    InvalidRasterSize(u32),

    /// A run was started while a previous run had not yet completed.
    #[error("a heightmap run is already in progress")]
    RunInProgress,

    /// More completions were reported than tasks were dispatched.
    #[error("completion overflow: {completed} of {total} tasks already reported")]
    CompletionOverflow {
        /// Completed count observed when the extra report arrived.
        completed: usize,
        /// Total number of tasks in the run.
        total: usize,
    },

    /// A result slot was written more than once.
    #[error("sample {index} was recorded twice")]
    DuplicateSample {
        /// Row-major index of the cell.
        index: usize,
    },

    /// A sample was recorded outside the raster.
    #[error("sample index {index} is outside a store of {len} cells")]
    SampleOutOfRange {
        /// Row-major index that was written.
        index: usize,
        /// Number of cells in the store.
        len: usize,
    },

    /// The worker pool no longer accepts jobs.
    #[error("worker pool is shut down")]
    PoolClosed,

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
