//! Planar mesh graphs: the interpolation query contract, a bucketed triangle
//! mesh that implements it, and a seeded island builder.

mod error;
mod island;
mod mesh;
mod noise_field;
mod query;

pub use error::GraphError;
pub use island::{IslandBuilder, IslandParams, classify};
pub use mesh::{Corner, TriangleMesh};
pub use noise_field::{FbmField, FbmParams};
pub use query::{AnchorMode, MeshGraph, PointInterpolation, RegionAttributes};
