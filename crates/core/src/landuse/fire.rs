//! Fire layer boundary conditions
//!
//! A fire layer marks burned areas and fire fronts. Terrain cells whose
//! centre lies inside a feature take the burned surface; cells outside
//! every feature but within the buffer distance of one take the fire front
//! surface. Both override the land-use classification.

use super::table::FireSurfaces;
use crate::core_types::{Crs, Point2};
use crate::error::Result;
use crate::geo::{CrsTransformer, VectorClassifier};
use rayon::prelude::*;
use std::f64::consts::TAU;
use tracing::debug;

/// Points sampled on the buffer circle around each cell centre.
pub const BUFFER_SAMPLES: usize = 8;

/// Where a terrain cell lies relative to the fire layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireCell {
    Outside,
    /// Outside every feature, within the buffer of at least one
    Border,
    /// Inside a feature carrying `code`
    Inside(i64),
}

impl FireCell {
    /// Catalog position forced on the cell, `None` to keep its land use.
    ///
    /// A feature code in `1..=surface_count` selects that 1-based surface,
    /// any other code the default burned surface.
    pub fn surface(self, fire: FireSurfaces, surface_count: usize) -> Option<usize> {
        match self {
            FireCell::Outside => None,
            FireCell::Border => Some(fire.border),
            FireCell::Inside(code) => Some(
                usize::try_from(code)
                    .ok()
                    .filter(|c| (1..=surface_count).contains(c))
                    .map_or(fire.inside, |c| c - 1),
            ),
        }
    }
}

/// Classify UTM cell `centers` against `layer`.
///
/// The buffer is sampled at [`BUFFER_SAMPLES`] points on the circle of
/// radius `buffer` metres around each centre.
///
/// # Errors
/// `Reprojection` if the samples cannot be moved into the layer CRS.
pub fn sample_fire_layer(
    layer: &dyn VectorClassifier,
    centers: &[Point2],
    utm_crs: Crs,
    buffer: f64,
    transformer: &dyn CrsTransformer,
) -> Result<Vec<FireCell>> {
    let ring: Vec<(f64, f64)> = (0..BUFFER_SAMPLES)
        .map(|k| {
            let angle = TAU * k as f64 / BUFFER_SAMPLES as f64;
            (buffer * angle.cos(), buffer * angle.sin())
        })
        .collect();
    let mut samples = Vec::with_capacity(centers.len() * (BUFFER_SAMPLES + 1));
    for c in centers {
        samples.push(*c);
        samples.extend(ring.iter().map(|&(dx, dy)| Point2::new(c.x + dx, c.y + dy)));
    }
    let samples = transformer.transform_points(&samples, utm_crs, layer.crs())?;

    let cells: Vec<FireCell> = samples
        .par_chunks(BUFFER_SAMPLES + 1)
        .map(|s| match layer.code_at(s[0]) {
            Some(code) => FireCell::Inside(code),
            None if s[1..].iter().any(|&p| layer.code_at(p).is_some()) => FireCell::Border,
            None => FireCell::Outside,
        })
        .collect();

    let inside = cells
        .iter()
        .filter(|c| matches!(c, FireCell::Inside(_)))
        .count();
    let border = cells.iter().filter(|&&c| c == FireCell::Border).count();
    debug!(inside, border, buffer, "Fire layer sampled");
    Ok(cells)
}
