//! Reference triangle mesh with bucketed point location.
//!
//! Triangles are registered in a uniform grid of buckets covering the mesh
//! domain, so locating a point only tests the handful of triangles whose
//! bounding boxes overlap its bucket.

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::error::GraphError;
use crate::query::{AnchorMode, MeshGraph, PointInterpolation, RegionAttributes};

/// Barycentric tolerance for points lying on shared edges.
const EDGE_EPSILON: f32 = 1e-5;

/// A mesh vertex carrying region attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    /// Position in mesh space.
    pub position: Vec2,
    /// Attributes of the region anchored at this corner.
    pub attributes: RegionAttributes,
}

/// Precomputed centroid of a triangle and the mean of its corner values.
#[derive(Debug, Clone, Copy)]
struct Center {
    position: Vec2,
    elevation: f32,
    moisture: f32,
}

/// Uniform grid of triangle buckets over `[0, extent]²`.
#[derive(Debug, Clone)]
struct BucketGrid {
    extent: f32,
    cells_per_side: usize,
    cell_size: f32,
    buckets: Vec<Vec<u32>>,
}

impl BucketGrid {
    fn new(extent: f32, cells_per_side: usize) -> Self {
        Self {
            extent,
            cells_per_side,
            cell_size: extent / cells_per_side as f32,
            buckets: vec![Vec::new(); cells_per_side * cells_per_side],
        }
    }

    /// Bucket coordinate along one axis, clamped into the grid.
    fn clamp_axis(&self, value: f32) -> usize {
        let cell = (value / self.cell_size).floor();
        if cell <= 0.0 {
            0
        } else {
            (cell as usize).min(self.cells_per_side - 1)
        }
    }

    fn insert(&mut self, triangle: u32, min: Vec2, max: Vec2) {
        let (x0, x1) = (self.clamp_axis(min.x), self.clamp_axis(max.x));
        let (y0, y1) = (self.clamp_axis(min.y), self.clamp_axis(max.y));
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.buckets[y * self.cells_per_side + x].push(triangle);
            }
        }
    }

    /// Triangles that may contain `point`, or `None` outside the domain.
    fn candidates(&self, point: Vec2) -> Option<&[u32]> {
        let domain = 0.0..=self.extent;
        if !domain.contains(&point.x) || !domain.contains(&point.y) {
            return None;
        }
        let x = self.clamp_axis(point.x);
        let y = self.clamp_axis(point.y);
        Some(&self.buckets[y * self.cells_per_side + x])
    }
}

/// A triangulated planar subdivision with attributes on its corners.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    extent: f32,
    corners: Vec<Corner>,
    triangles: Vec<[u32; 3]>,
    centers: Vec<Center>,
    /// Neighbor across edge `k`, where edge `k` joins corners `k` and `k + 1`.
    neighbors: Vec<[Option<u32>; 3]>,
    grid: BucketGrid,
}

impl TriangleMesh {
    /// Assemble a mesh from corners and triangle index triples.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the mesh is empty, the extent is not a
    /// positive finite number, or a triangle references a missing corner.
    pub fn new(
        extent: f32,
        corners: Vec<Corner>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self, GraphError> {
        if !extent.is_finite() || extent <= 0.0 {
            return Err(GraphError::InvalidExtent(extent));
        }
        if corners.is_empty() || triangles.is_empty() {
            return Err(GraphError::Empty);
        }
        for (triangle, indices) in triangles.iter().enumerate() {
            if let Some(&corner) = indices.iter().find(|&&c| c as usize >= corners.len()) {
                return Err(GraphError::CornerOutOfRange {
                    triangle,
                    corner,
                    corners: corners.len(),
                });
            }
        }

        let centers = triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|i| &corners[i as usize]);
                Center {
                    position: (a.position + b.position + c.position) / 3.0,
                    elevation: (a.attributes.elevation
                        + b.attributes.elevation
                        + c.attributes.elevation)
                        / 3.0,
                    moisture: (a.attributes.moisture
                        + b.attributes.moisture
                        + c.attributes.moisture)
                        / 3.0,
                }
            })
            .collect();

        let neighbors = build_adjacency(&triangles);

        let cells_per_side = (triangles.len() as f64).sqrt().ceil().max(1.0) as usize;
        let mut grid = BucketGrid::new(extent, cells_per_side);
        for (index, t) in triangles.iter().enumerate() {
            let [a, b, c] = t.map(|i| corners[i as usize].position);
            grid.insert(index as u32, a.min(b).min(c), a.max(b).max(c));
        }

        tracing::debug!(
            corners = corners.len(),
            triangles = triangles.len(),
            buckets = cells_per_side * cells_per_side,
            "Built triangle mesh"
        );

        Ok(Self {
            extent,
            corners,
            triangles,
            centers,
            neighbors,
            grid,
        })
    }

    /// All corners of the mesh.
    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }

    /// All triangles as corner index triples.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Indices of the triangles sharing an edge with `triangle`.
    pub fn neighbors(&self, triangle: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors[triangle]
            .iter()
            .flatten()
            .map(|&n| n as usize)
    }

    /// Find the triangle enclosing `point` and its barycentric weights.
    pub fn locate(&self, point: Vec2) -> Option<(usize, Vec3)> {
        self.grid.candidates(point)?.iter().find_map(|&t| {
            let [a, b, c] = self.triangles[t as usize].map(|i| self.corners[i as usize].position);
            barycentric(point, a, b, c)
                .filter(|w| w.min_element() >= -EDGE_EPSILON)
                .map(|w| (t as usize, w))
        })
    }

    fn blend_vertices(&self, triangle: usize, weights: Vec3) -> (f32, f32) {
        let [a, b, c] = self.triangles[triangle].map(|i| &self.corners[i as usize].attributes);
        let elevation = Vec3::new(a.elevation, b.elevation, c.elevation).dot(weights);
        let moisture = Vec3::new(a.moisture, b.moisture, c.moisture).dot(weights);
        (elevation, moisture)
    }

    /// Inverse-distance blend of the enclosing triangle's center and the
    /// centers of its edge neighbors.
    fn blend_centers(&self, triangle: usize, point: Vec2) -> (f32, f32) {
        let mut total_weight = 0.0;
        let mut elevation = 0.0;
        let mut moisture = 0.0;
        for anchor in std::iter::once(triangle).chain(self.neighbors(triangle)) {
            let center = &self.centers[anchor];
            let weight = 1.0 / (center.position.distance_squared(point) + 1e-6);
            total_weight += weight;
            elevation += center.elevation * weight;
            moisture += center.moisture * weight;
        }
        (elevation / total_weight, moisture / total_weight)
    }
}

impl MeshGraph for TriangleMesh {
    fn extent(&self) -> f32 {
        self.extent
    }

    fn interpolate(&self, point: Vec2, anchor: AnchorMode) -> Option<PointInterpolation> {
        let (triangle, weights) = self.locate(point)?;

        let (elevation, moisture) = match anchor {
            AnchorMode::Vertex => self.blend_vertices(triangle, weights),
            AnchorMode::TriangleCenter => self.blend_centers(triangle, point),
        };

        // The corner with the dominant weight is the region the point falls in.
        let nearest = if weights.x >= weights.y && weights.x >= weights.z {
            0
        } else if weights.y >= weights.z {
            1
        } else {
            2
        };
        let source = self.corners[self.triangles[triangle][nearest] as usize]
            .attributes
            .clone();

        Some(PointInterpolation {
            elevation,
            moisture,
            source,
        })
    }
}

/// Barycentric weights of `p` with respect to triangle `abc`, or `None` if
/// the triangle is degenerate.
fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Option<Vec3> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some(Vec3::new(1.0 - v - w, v, w))
}

fn build_adjacency(triangles: &[[u32; 3]]) -> Vec<[Option<u32>; 3]> {
    let mut edges: FxHashMap<(u32, u32), (u32, usize)> = FxHashMap::default();
    let mut neighbors = vec![[None; 3]; triangles.len()];

    for (index, t) in triangles.iter().enumerate() {
        for edge in 0..3 {
            let (a, b) = (t[edge], t[(edge + 1) % 3]);
            let key = (a.min(b), a.max(b));
            match edges.remove(&key) {
                Some((other, other_edge)) => {
                    neighbors[index][edge] = Some(other);
                    neighbors[other as usize][other_edge] = Some(index as u32);
                }
                None => {
                    edges.insert(key, (index as u32, edge));
                }
            }
        }
    }

    neighbors
}
