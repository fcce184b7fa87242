//! Seeded island meshes for driving the sampler end to end.
//!
//! Corners sit on a jittered grid over `[0, extent]²`; each grid cell is split
//! into two triangles. Elevation comes from an fBm field shaped by a radial
//! falloff so the domain edge is always ocean.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::GraphError;
use crate::mesh::{Corner, TriangleMesh};
use crate::noise_field::{FbmField, FbmParams};
use crate::query::RegionAttributes;

/// Parameters for [`IslandBuilder`].
#[derive(Clone, Debug)]
pub struct IslandParams {
    /// Side length of the mesh domain.
    pub extent: f32,
    /// Number of grid cells along each side.
    pub cells_per_side: u32,
    /// Seed for corner jitter and noise fields.
    pub seed: u64,
    /// Octaves of the elevation field.
    pub octaves: u32,
    /// Base frequency of the elevation field, in cycles per domain.
    pub frequency: f64,
    /// Normalized height below which land becomes ocean.
    pub sea_level: f32,
    /// Corner jitter as a fraction of the cell size, in `[0, 0.5)`.
    pub jitter: f32,
}

impl Default for IslandParams {
    fn default() -> Self {
        Self {
            extent: 1024.0,
            cells_per_side: 64,
            seed: 42,
            octaves: 5,
            frequency: 3.0,
            sea_level: 0.2,
            jitter: 0.35,
        }
    }
}

/// Builds a [`TriangleMesh`] shaped like an island.
pub struct IslandBuilder {
    params: IslandParams,
}

impl IslandBuilder {
    /// Create a builder with the given parameters.
    pub fn new(params: IslandParams) -> Self {
        Self { params }
    }

    /// Generate the mesh.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidParams`] for a zero grid or an out-of-range
    /// jitter, and propagates mesh assembly errors.
    pub fn build(&self) -> Result<TriangleMesh, GraphError> {
        let p = &self.params;
        if p.cells_per_side == 0 {
            return Err(GraphError::InvalidParams("cells_per_side must be positive"));
        }
        if !(0.0..0.5).contains(&p.jitter) {
            return Err(GraphError::InvalidParams("jitter must be in [0, 0.5)"));
        }

        let side = p.cells_per_side as usize + 1;
        let cell = p.extent / p.cells_per_side as f32;
        let mut rng = ChaCha8Rng::seed_from_u64(p.seed);

        let elevation_field = FbmField::new(FbmParams {
            seed: p.seed as u32,
            octaves: p.octaves,
            base_frequency: p.frequency / p.extent as f64,
            ..Default::default()
        });
        let moisture_field = FbmField::new(FbmParams {
            seed: (p.seed as u32).wrapping_add(1),
            octaves: 3,
            base_frequency: 2.0 * p.frequency / p.extent as f64,
            ..Default::default()
        });

        let center = Vec2::splat(p.extent * 0.5);
        let mut corners = Vec::with_capacity(side * side);
        for gy in 0..side {
            for gx in 0..side {
                let mut position = Vec2::new(gx as f32, gy as f32) * cell;
                // Boundary corners stay put so the mesh covers the whole domain.
                if gx > 0 && gx + 1 < side {
                    position.x += rng.random_range(-p.jitter..=p.jitter) * cell;
                }
                if gy > 0 && gy + 1 < side {
                    position.y += rng.random_range(-p.jitter..=p.jitter) * cell;
                }

                let radial = (position.distance(center) / center.x).min(1.0);
                let height = elevation_field.sample_unit(position.x as f64, position.y as f64)
                    as f32
                    * (1.0 - radial * radial);
                let elevation = height - p.sea_level;
                let moisture =
                    moisture_field.sample_unit(position.x as f64, position.y as f64) as f32;

                corners.push(Corner {
                    position,
                    attributes: RegionAttributes::new(
                        elevation,
                        moisture,
                        [classify(elevation)],
                    ),
                });
            }
        }

        let mut triangles = Vec::with_capacity(p.cells_per_side as usize * side * 2);
        for gy in 0..side - 1 {
            for gx in 0..side - 1 {
                let i00 = (gy * side + gx) as u32;
                let i10 = i00 + 1;
                let i01 = i00 + side as u32;
                let i11 = i01 + 1;
                triangles.push([i00, i10, i11]);
                triangles.push([i00, i11, i01]);
            }
        }

        TriangleMesh::new(p.extent, corners, triangles)
    }
}

/// Elevation band label for a corner.
pub fn classify(elevation: f32) -> &'static str {
    if elevation < 0.0 {
        "ocean"
    } else if elevation < 0.05 {
        "coast"
    } else if elevation < 0.3 {
        "lowland"
    } else if elevation < 0.6 {
        "highland"
    } else {
        "peak"
    }
}
