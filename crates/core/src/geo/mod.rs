//! Coordinate and extent utilities, and the host layer interfaces

pub mod layer;
pub mod pixel_grid;
pub mod transform;

pub use layer::{
    GridRaster, Interpolation, LanduseLayer, PolygonLayer, RasterSampler, VectorClassifier,
};
pub use pixel_grid::{align_extent_to_pixel_grid, GeoTransform};
pub use transform::{CrsTransformer, ProjTransformer};
