//! Simulation domain sizing
//!
//! The domain is the UTM terrain extent relative to the case origin, with a
//! vertical margin around the terrain. It is split into a near-square grid
//! of congruent mesh blocks, declared once and repeated by a multiplier.

use crate::core_types::Extent;
use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Depth below the lowest terrain point.
pub const BOTTOM_MARGIN: f64 = 2.0;

/// Clearance above the highest terrain point, in cells.
pub const TOP_MARGIN_CELLS: f64 = 10.0;

/// Sized simulation domain. Bounding boxes are `[xmin, xmax, ymin, ymax, zmin, zmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    /// Whole domain, relative to the case origin
    pub xb: [f64; 6],
    /// Mesh blocks along x
    pub nmesh_x: u32,
    /// Mesh blocks along y
    pub nmesh_y: u32,
    /// First (south-west) block; the others are translated copies
    pub mesh_xb: [f64; 6],
    /// Cells per block along x, y, z
    pub ijk: [u32; 3],
    pub cell_size: f64,
    /// Mesh count asked for
    pub requested_meshes: u32,
}

impl DomainSpec {
    /// Actual number of mesh blocks, at most the requested count.
    pub fn mesh_count(&self) -> u32 {
        self.nmesh_x * self.nmesh_y
    }

    /// Block dimensions along x, y, z.
    pub fn block_size(&self) -> [f64; 3] {
        [
            self.mesh_xb[1] - self.mesh_xb[0],
            self.mesh_xb[3] - self.mesh_xb[2],
            self.mesh_xb[5] - self.mesh_xb[4],
        ]
    }

    /// Total cell count over all blocks.
    pub fn cell_count(&self) -> u64 {
        self.ijk.iter().map(|&n| u64::from(n)).product::<u64>() * u64::from(self.mesh_count())
    }

    pub fn z_min(&self) -> f64 {
        self.xb[4]
    }

    pub fn z_max(&self) -> f64 {
        self.xb[5]
    }
}

/// Size the domain around `extent` (UTM, origin-relative) and the terrain
/// elevation range.
///
/// # Errors
/// - `InvalidDomainConfig` when `nmesh` is zero
/// - `InvalidConfig` for a non-positive or non-finite cell size
/// - `DegenerateDomain` when the extent is flat along x or y
/// - `CellSizeTooCoarse` when a block is thinner than one cell
pub fn size_domain(
    extent: &Extent,
    z_range: (f64, f64),
    nmesh: u32,
    cell_size: f64,
) -> Result<DomainSpec> {
    if nmesh == 0 {
        return Err(ExportError::InvalidDomainConfig(
            "requested mesh count must be positive".to_string(),
        ));
    }
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(ExportError::InvalidConfig(format!(
            "cell size must be a positive number of meters, got {cell_size}"
        )));
    }

    let xb = [
        extent.x_min,
        extent.x_max,
        extent.y_min,
        extent.y_max,
        z_range.0 - BOTTOM_MARGIN,
        z_range.1 + TOP_MARGIN_CELLS * cell_size,
    ];
    let (dx, dy) = (xb[1] - xb[0], xb[3] - xb[2]);
    if dy.is_nan() || dy <= 0.0 {
        return Err(ExportError::DegenerateDomain(format!(
            "domain height along y is {dy} m"
        )));
    }
    if dx.is_nan() || dx <= 0.0 {
        return Err(ExportError::DegenerateDomain(format!(
            "domain width along x is {dx} m"
        )));
    }

    // Near-square blocks: split in proportion to the aspect ratio
    let ratio = (dx / dy).abs();
    let n = f64::from(nmesh);
    let nmesh_y = ((n / ratio).sqrt().round() as u32).clamp(1, nmesh);
    let nmesh_x = nmesh / nmesh_y;

    let (block_x, block_y) = (dx / f64::from(nmesh_x), dy / f64::from(nmesh_y));
    let block_z = xb[5] - xb[4];
    let mesh_xb = [
        xb[0],
        xb[0] + block_x,
        xb[2],
        xb[2] + block_y,
        xb[4],
        xb[5],
    ];

    let mut ijk = [0u32; 3];
    for (k, (axis, block_size)) in [('x', block_x), ('y', block_y), ('z', block_z)]
        .into_iter()
        .enumerate()
    {
        let cells = (block_size / cell_size).floor();
        if cells < 1.0 {
            return Err(ExportError::CellSizeTooCoarse {
                axis,
                cell_size,
                block_size,
            });
        }
        ijk[k] = cells as u32;
    }

    let spec = DomainSpec {
        xb,
        nmesh_x,
        nmesh_y,
        mesh_xb,
        ijk,
        cell_size,
        requested_meshes: nmesh,
    };
    debug!(
        nmesh_x,
        nmesh_y,
        requested = nmesh,
        i = ijk[0],
        j = ijk[1],
        k = ijk[2],
        "Domain sized"
    );
    Ok(spec)
}
