//! Terrain sampling and triangulation
//!
//! - [`SamplingGrid`]: DEM-aligned sampling cells
//! - [`ElevationSampler`]: elevation at each cell centre, `NoData` filled
//! - [`TerrainGrid`]: sampled cells in UTM, triangulated into a [`TerrainMesh`]

pub mod fill;
pub mod mesh;
pub mod sampling;

pub use fill::fill_nearest_valid;
pub use mesh::{ObstCell, TerrainGrid, TerrainMesh};
pub use sampling::{ElevationSampler, SamplingGrid, MIN_SAMPLES_PER_AXIS};
