//! The point-location and interpolation contract consumed by raster samplers.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Which basis points an interpolation query averages between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorMode {
    /// Blend the centers of the enclosing triangle and its edge neighbors.
    #[default]
    TriangleCenter,
    /// Blend the three corners of the enclosing triangle (barycentric).
    Vertex,
}

/// Attributes attached to a single mesh region (a corner of the subdivision).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionAttributes {
    /// Elevation of the region.
    pub elevation: f32,
    /// Moisture of the region, nominally in `[0, 1]`.
    pub moisture: f32,
    /// Free-form classification labels (`"ocean"`, `"grass"`, ...).
    pub tags: BTreeSet<String>,
}

impl RegionAttributes {
    /// Build attributes from an elevation, a moisture and any number of tags.
    pub fn new<I, S>(elevation: f32, moisture: f32, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elevation,
            moisture,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// The value bundle produced for a point that lies inside the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct PointInterpolation {
    /// Elevation blended from the anchor points.
    pub elevation: f32,
    /// Moisture blended from the anchor points.
    pub moisture: f32,
    /// Attributes of the region that encloses the point (nearest corner).
    pub source: RegionAttributes,
}

/// An irregular planar subdivision that can be sampled at arbitrary points.
///
/// Implementations are queried concurrently from many worker threads and
/// must not mutate shared state during [`interpolate`](Self::interpolate).
pub trait MeshGraph: Send + Sync {
    /// Side length of the square mesh domain `[0, extent]²`.
    fn extent(&self) -> f32;

    /// Locate `point` and interpolate the mesh values there.
    ///
    /// Returns `None` when no enclosing region exists, which callers treat as
    /// open water rather than as an error.
    fn interpolate(&self, point: Vec2, anchor: AnchorMode) -> Option<PointInterpolation>;
}

impl<T: MeshGraph + ?Sized> MeshGraph for std::sync::Arc<T> {
    fn extent(&self) -> f32 {
        (**self).extent()
    }

    fn interpolate(&self, point: Vec2, anchor: AnchorMode) -> Option<PointInterpolation> {
        (**self).interpolate(point, anchor)
    }
}
