//! Terrain to FDS Case Compiler
//!
//! Turns GIS terrain, land-use and wind data into a Fire Dynamics Simulator
//! case: a text input deck and a binary terrain geometry.
//!
//! ## Pipeline
//!
//! - Reprojection of the case extent to the UTM zone of its origin
//! - DEM sampling on a pixel-aligned grid, `NoData` filled from the nearest valid sample
//! - Land-use classification onto a surface catalog
//! - Fire layer boundary conditions over the classified surfaces
//! - Domain sizing into near-square mesh blocks
//! - Ignition vent placement
//! - Bingeom serialization and deck generation
//!
//! The host GIS stays outside: layers and reprojection are injected through
//! the [`RasterSampler`], [`VectorClassifier`] and [`CrsTransformer`] traits.

// Core types and errors
pub mod core_types;
pub mod error;
pub mod progress;

// Geospatial inputs
pub mod geo;
pub mod landuse;
pub mod terrain;

// Case model
pub mod domain;
pub mod ignition;
pub mod wind;

// Outputs
pub mod bingeom;
pub mod case;
pub mod io;

// Orchestration
pub mod config;
pub mod pipeline;

// Re-export core types
pub use core_types::{Crs, Extent, Point2, Point3};
pub use error::{ExportError, Result, WindRowError};
pub use progress::{NullSink, ProgressSink, RecordingSink, TracingSink};

// Re-export layer interfaces
pub use geo::{
    align_extent_to_pixel_grid, CrsTransformer, GeoTransform, GridRaster, Interpolation,
    LanduseLayer, PolygonLayer, ProjTransformer, RasterSampler, VectorClassifier,
};

// Re-export stages
pub use domain::{size_domain, DomainSpec};
pub use ignition::IgnitionSpec;
pub use landuse::{
    FireCell, FireSurfaces, LanduseCatalog, LanduseTable, SurfaceCatalog, SurfaceType,
};
pub use terrain::{ElevationSampler, SamplingGrid, TerrainGrid, TerrainMesh};
pub use wind::{WindSample, WindSource, WindTimeSeries};

// Re-export outputs and orchestration
pub use bingeom::BinGeom;
pub use case::{generate_case, CaseInputs, TerrainSection};
pub use config::{ExportConfig, TerrainKind};
pub use io::write_atomically;
pub use pipeline::{export_case, ExportInputs, ExportSummary};
