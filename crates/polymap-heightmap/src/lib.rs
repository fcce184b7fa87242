//! Parallel heightmap sampling over a planar mesh graph.
//!
//! A [`HeightmapGenerator`] maps every cell of an `N × N` raster into mesh
//! space, samples the mesh there on a worker pool, and invokes a single
//! completion callback on the coordination thread once the last cell lands.

mod error;
mod generator;
mod pool;
mod sample;
mod store;
mod task;
mod tracker;


pub use error::HeightmapError;
pub use generator::{HeightmapGenerator, ProgressHandle, VERBOSE_LOG_LIMIT};
pub use pool::{Job, WorkerPool, default_thread_count};
pub use sample::{
    HeightmapSettings, RasterCoordinate, RunConfiguration, SampleRecord, SelectionMode,
};
pub use store::{Heightmap, ResultStore};
pub use task::make_sample;
pub use tracker::{CompletionCallback, CompletionTracker, Progress, RunPhase};
