//! Errors raised while building a mesh graph.

/// Structural problems detected when assembling a [`TriangleMesh`](crate::TriangleMesh).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The mesh has no corners or no triangles.
    #[error("mesh is empty")]
    Empty,

    /// The mesh domain must have a positive, finite extent.
    #[error("invalid mesh extent: {0}")]
    InvalidExtent(f32),

    /// A triangle references a corner that does not exist.
    #[error("triangle {triangle} references corner {corner}, but only {corners} corners exist")]
    CornerOutOfRange {
        /// Index of the offending triangle.
        triangle: usize,
        /// The out-of-range corner index.
        corner: u32,
        /// Number of corners in the mesh.
        corners: usize,
    },

    /// Builder parameters that cannot produce a mesh.
    #[error("invalid island parameters: {0}")]
    InvalidParams(&'static str),
}
