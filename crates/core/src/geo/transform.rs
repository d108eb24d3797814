//! Reprojection of points and extents between coordinate reference systems.

use crate::core_types::{Crs, Extent, Point2};
use crate::error::{ExportError, Result};
use proj4rs::proj::Proj;

/// Points sampled along each extent edge when reprojecting a bounding box.
pub const EXTENT_EDGE_SAMPLES: usize = 21;

/// Reprojection service injected into the pipeline.
///
/// Implementations only need [`transform_points`](Self::transform_points);
/// single points and extents are derived from it.
pub trait CrsTransformer: Sync {
    /// Transform a batch of points from `from` to `to`.
    ///
    /// # Errors
    /// `Reprojection` if either CRS is unsupported or any point cannot be transformed.
    fn transform_points(&self, points: &[Point2], from: Crs, to: Crs) -> Result<Vec<Point2>>;

    /// Transform one point.
    ///
    /// # Errors
    /// See [`transform_points`](Self::transform_points).
    fn transform_point(&self, point: Point2, from: Crs, to: Crs) -> Result<Point2> {
        if from == to {
            return Ok(point);
        }
        let out = self.transform_points(&[point], from, to)?;
        out.first()
            .copied()
            .ok_or_else(|| reprojection_error(from, to, "transformer returned no point"))
    }

    /// Bounding box, in `to`, of an extent given in `from`.
    ///
    /// Each edge is densified with [`EXTENT_EDGE_SAMPLES`] points so that the
    /// curvature of the projected edges is taken into account.
    ///
    /// # Errors
    /// See [`transform_points`](Self::transform_points).
    fn transform_extent(&self, extent: &Extent, from: Crs, to: Crs) -> Result<Extent> {
        if from == to {
            return Ok(*extent);
        }
        let n = EXTENT_EDGE_SAMPLES - 1;
        // Endpoints are taken verbatim so the corners are transformed exactly
        let lerp = |a: f64, b: f64, i: usize| {
            if i == n {
                b
            } else {
                a + (b - a) * i as f64 / n as f64
            }
        };
        let mut ring = Vec::with_capacity(4 * EXTENT_EDGE_SAMPLES);
        for i in 0..=n {
            let x = lerp(extent.x_min, extent.x_max, i);
            let y = lerp(extent.y_min, extent.y_max, i);
            ring.extend([
                Point2::new(x, extent.y_min),
                Point2::new(x, extent.y_max),
                Point2::new(extent.x_min, y),
                Point2::new(extent.x_max, y),
            ]);
        }
        let projected = self.transform_points(&ring, from, to)?;
        Extent::from_points(projected)
            .filter(Extent::is_finite)
            .ok_or_else(|| reprojection_error(from, to, "extent has no finite transformed points"))
    }
}

pub(crate) fn reprojection_error(from: Crs, to: Crs, reason: impl Into<String>) -> ExportError {
    ExportError::Reprojection {
        from: from.authid(),
        to: to.authid(),
        reason: reason.into(),
    }
}

/// Pure Rust transformer backed by `proj4rs`.
///
/// Knows WGS 84, the WGS 84 UTM zones and Web Mercator; any other CRS is
/// rejected with a `Reprojection` error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjTransformer;

impl ProjTransformer {
    pub fn new() -> Self {
        Self
    }

    fn proj_for(crs: Crs, other: Crs) -> Result<Proj> {
        let definition = crs
            .proj_definition()
            .ok_or_else(|| reprojection_error(crs, other, "CRS not supported"))?;
        Proj::from_proj_string(&definition)
            .map_err(|e| reprojection_error(crs, other, format!("invalid definition: {e:?}")))
    }
}

impl CrsTransformer for ProjTransformer {
    fn transform_points(&self, points: &[Point2], from: Crs, to: Crs) -> Result<Vec<Point2>> {
        if from == to {
            return Ok(points.to_vec());
        }
        let source = Self::proj_for(from, to)?;
        let target = Self::proj_for(to, from)?;

        points
            .iter()
            .map(|p| {
                let mut xyz = if from.is_geographic() {
                    (p.x.to_radians(), p.y.to_radians(), 0.0)
                } else {
                    (p.x, p.y, 0.0)
                };
                proj4rs::transform::transform(&source, &target, &mut xyz).map_err(|e| {
                    reprojection_error(from, to, format!("point ({}, {}): {e:?}", p.x, p.y))
                })?;
                let out = if to.is_geographic() {
                    Point2::new(xyz.0.to_degrees(), xyz.1.to_degrees())
                } else {
                    Point2::new(xyz.0, xyz.1)
                };
                if out.x.is_finite() && out.y.is_finite() {
                    Ok(out)
                } else {
                    Err(reprojection_error(
                        from,
                        to,
                        format!("point ({}, {}) has no finite image", p.x, p.y),
                    ))
                }
            })
            .collect()
    }
}
