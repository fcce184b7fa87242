//! The unit of work for one raster cell.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use polymap_graph::{MeshGraph, PointInterpolation};

use crate::error::HeightmapError;
use crate::sample::{RasterCoordinate, RunConfiguration, SampleRecord, SelectionMode};
use crate::store::ResultStore;
use crate::tracker::CompletionTracker;

/// State shared by every task of one run.
pub(crate) struct RunContext {
    pub(crate) graph: Arc<dyn MeshGraph>,
    pub(crate) config: RunConfiguration,
    pub(crate) store: Arc<ResultStore>,
    pub(crate) tracker: Arc<CompletionTracker>,
    pub(crate) faults: Arc<Mutex<Vec<HeightmapError>>>,
}

/// Samples one raster cell, records it, and reports completion.
pub(crate) struct PointTask {
    coordinate: RasterCoordinate,
    context: Arc<RunContext>,
}

impl PointTask {
    pub(crate) fn new(coordinate: RasterCoordinate, context: Arc<RunContext>) -> Self {
        Self {
            coordinate,
            context,
        }
    }

    /// Compute the sample for this cell.
    pub(crate) fn execute(&self) -> SampleRecord {
        make_sample(
            self.coordinate,
            self.context.graph.as_ref(),
            &self.context.config,
        )
    }

    /// Execute, store the result, and report to the tracker.
    pub(crate) fn run(self) {
        let sample = self.execute();
        let ctx = &self.context;
        let index = self.coordinate.index(ctx.config.size);

        if let Err(err) = ctx.store.insert(index, sample) {
            self.record_fault(err);
        }

        match ctx.tracker.report_one() {
            Ok(progress) if ctx.tracker.is_verbose() => {
                tracing::debug!(
                    x = self.coordinate.x,
                    y = self.coordinate.y,
                    completed = progress.completed,
                    total = progress.total,
                    percent = progress.fraction() * 100.0,
                    "Created heightmap pixel"
                );
            }
            Ok(_) => {}
            Err(err) => self.record_fault(err),
        }
    }

    fn record_fault(&self, err: HeightmapError) {
        tracing::error!(
            x = self.coordinate.x,
            y = self.coordinate.y,
            "Heightmap invariant violated: {err}"
        );
        self.context
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(err);
    }
}

/// Sample the mesh at a raster cell.
///
/// Cells with no enclosing region, including cells whose lookup panics,
/// become open water at their mesh position.
pub fn make_sample(
    coordinate: RasterCoordinate,
    graph: &dyn MeshGraph,
    config: &RunConfiguration,
) -> SampleRecord {
    let position = coordinate.to_mesh(config.scale);

    let lookup = catch_unwind(AssertUnwindSafe(|| {
        graph.interpolate(position, config.anchor_mode)
    }))
    .unwrap_or_else(|_| {
        tracing::warn!(
            x = coordinate.x,
            y = coordinate.y,
            "Mesh lookup panicked; treating cell as open water"
        );
        None
    });

    match lookup {
        Some(PointInterpolation {
            elevation,
            moisture,
            source,
        }) => {
            let moisture = match config.selection_mode {
                SelectionMode::UsePolygon => source.moisture,
                SelectionMode::InterpolatedWithRegionBiome => moisture,
            };
            // Tags are never blended; both modes take the enclosing region's.
            SampleRecord {
                position,
                elevation,
                moisture,
                tags: source.tags,
            }
        }
        None => SampleRecord::open_water(position),
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use polymap_graph::{AnchorMode, RegionAttributes};

    use super::*;

    /// Returns a fixed bundle inside `[0, limit)` on both axes.
    struct Quadrant {
        limit: f32,
    }

    impl MeshGraph for Quadrant {
        fn extent(&self) -> f32 {
            100.0
        }

        fn interpolate(&self, point: Vec2, anchor: AnchorMode) -> Option<PointInterpolation> {
            if point.x >= self.limit || point.y >= self.limit {
                return None;
            }
            let elevation = match anchor {
                AnchorMode::Vertex => point.x + point.y,
                AnchorMode::TriangleCenter => -(point.x + point.y),
            };
            Some(PointInterpolation {
                elevation,
                moisture: 0.75,
                source: RegionAttributes::new(1.0, 0.25, ["forest"]),
            })
        }
    }

    struct Exploding;

    impl MeshGraph for Exploding {
        fn extent(&self) -> f32 {
            1.0
        }

        fn interpolate(&self, _: Vec2, _: AnchorMode) -> Option<PointInterpolation> {
            panic!("corrupt mesh");
        }
    }

    fn config(selection_mode: SelectionMode, anchor_mode: AnchorMode) -> RunConfiguration {
        RunConfiguration {
            size: 10,
            scale: 10.0,
            selection_mode,
            anchor_mode,
        }
    }

    #[test]
    fn test_use_polygon_takes_region_moisture() {
        let graph = Quadrant { limit: 50.0 };
        let cfg = config(SelectionMode::UsePolygon, AnchorMode::Vertex);
        let sample = make_sample(RasterCoordinate::new(1, 2), &graph, &cfg);
        assert_eq!(sample.position, Vec2::new(10.0, 20.0));
        assert_eq!(sample.elevation, 30.0);
        assert_eq!(sample.moisture, 0.25);
        assert!(sample.tags.contains("forest"));
    }

    #[test]
    fn test_interpolated_mode_blends_moisture_but_not_tags() {
        let graph = Quadrant { limit: 50.0 };
        let cfg = config(SelectionMode::InterpolatedWithRegionBiome, AnchorMode::Vertex);
        let sample = make_sample(RasterCoordinate::new(1, 2), &graph, &cfg);
        assert_eq!(sample.moisture, 0.75);
        assert_eq!(sample.tags.len(), 1);
        assert!(sample.tags.contains("forest"));
    }

    #[test]
    fn test_anchor_mode_is_forwarded() {
        let graph = Quadrant { limit: 50.0 };
        let cfg = config(SelectionMode::UsePolygon, AnchorMode::TriangleCenter);
        let sample = make_sample(RasterCoordinate::new(1, 2), &graph, &cfg);
        assert_eq!(sample.elevation, -30.0);
    }

    #[test]
    fn test_unlocated_cell_is_open_water() {
        let graph = Quadrant { limit: 50.0 };
        let cfg = config(SelectionMode::UsePolygon, AnchorMode::Vertex);
        let sample = make_sample(RasterCoordinate::new(7, 1), &graph, &cfg);
        assert!(sample.is_open_water());
        assert_eq!(sample.position, Vec2::new(70.0, 10.0));
    }

    #[test]
    fn test_panicking_lookup_degrades_to_open_water() {
        let cfg = config(SelectionMode::UsePolygon, AnchorMode::Vertex);
        let sample = make_sample(RasterCoordinate::new(0, 0), &Exploding, &cfg);
        assert_eq!(sample, SampleRecord::default());
    }
}
