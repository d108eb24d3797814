//! Land-use classification onto simulation surface types

pub mod catalog;
pub mod fire;
pub mod table;

pub use catalog::{LanduseCatalog, SurfaceCatalog, SurfaceType};
pub use fire::{sample_fire_layer, FireCell};
pub use table::{FireSurfaces, LanduseTable, MISSING_CODE};
