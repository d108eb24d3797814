//! Raster pixel grids and extent alignment.

use crate::core_types::{Extent, Point2};
use serde::{Deserialize, Serialize};

/// Fraction of a pixel within which an edge counts as already on the grid.
///
/// Keeps alignment idempotent despite floating point noise in the edges.
pub const ALIGN_TOLERANCE: f64 = 1e-6;

/// North-up affine transform of a raster.
///
/// Column `c` spans `origin_x + c * pixel_width ..= origin_x + (c + 1) * pixel_width`;
/// row `r` spans downwards from `origin_y - r * pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X of the top-left corner of the top-left pixel
    pub origin_x: f64,
    /// Y of the top-left corner of the top-left pixel
    pub origin_y: f64,
    /// Pixel size along x (> 0)
    pub pixel_width: f64,
    /// Pixel size along y (> 0, rows grow southwards)
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width: pixel_width.abs(),
            pixel_height: pixel_height.abs(),
        }
    }

    /// Fractional `(column, row)` of a point, pixel corners at integers.
    pub fn to_pixel(&self, p: Point2) -> (f64, f64) {
        (
            (p.x - self.origin_x) / self.pixel_width,
            (self.origin_y - p.y) / self.pixel_height,
        )
    }

    /// Centre of pixel `(col, row)`.
    pub fn pixel_center(&self, col: usize, row: usize) -> Point2 {
        Point2::new(
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y - (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Extent covered by `ncols` x `nrows` pixels.
    pub fn extent(&self, ncols: usize, nrows: usize) -> Extent {
        Extent::new(
            self.origin_x,
            self.origin_x + ncols as f64 * self.pixel_width,
            self.origin_y - nrows as f64 * self.pixel_height,
            self.origin_y,
        )
    }
}

/// Expand `extent` outward so that every edge falls on a pixel boundary.
///
/// The result contains `extent` and aligning it again returns it unchanged.
/// An edge lying within [`ALIGN_TOLERANCE`] of a boundary snaps onto it, one
/// pixel further out when the boundary itself falls inside `extent`.
pub fn align_extent_to_pixel_grid(extent: &Extent, grid: &GeoTransform) -> Extent {
    let pw = grid.pixel_width;
    let ph = grid.pixel_height;
    let x_at = |col: f64| grid.origin_x + col * pw;
    // Rows count downwards from the top edge
    let y_at = |row: f64| grid.origin_y - row * ph;

    let mut col_min = ((extent.x_min - grid.origin_x) / pw + ALIGN_TOLERANCE).floor();
    let mut col_max = ((extent.x_max - grid.origin_x) / pw - ALIGN_TOLERANCE).ceil();
    let mut row_top = ((grid.origin_y - extent.y_max) / ph + ALIGN_TOLERANCE).floor();
    let mut row_bottom = ((grid.origin_y - extent.y_min) / ph - ALIGN_TOLERANCE).ceil();
    if x_at(col_min) > extent.x_min {
        col_min -= 1.0;
    }
    if x_at(col_max) < extent.x_max {
        col_max += 1.0;
    }
    if y_at(row_top) < extent.y_max {
        row_top -= 1.0;
    }
    if y_at(row_bottom) > extent.y_min {
        row_bottom += 1.0;
    }

    Extent {
        x_min: x_at(col_min),
        x_max: x_at(col_max.max(col_min)),
        y_min: y_at(row_bottom.max(row_top)),
        y_max: y_at(row_top),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GeoTransform {
        GeoTransform::new(1000.0, 5000.0, 10.0, 10.0)
    }

    #[test]
    fn test_align_expands_outward() {
        let e = Extent::new(1013.0, 1047.0, 4921.0, 4988.0);
        let a = align_extent_to_pixel_grid(&e, &grid());
        assert_eq!(a, Extent::new(1010.0, 1050.0, 4920.0, 4990.0));
        assert!(a.contains(&e));
    }

    #[test]
    fn test_align_is_idempotent() {
        let g = GeoTransform::new(356_123.25, 4_512_987.5, 0.3, 0.7);
        let e = Extent::new(356_200.1, 356_911.9, 4_510_000.3, 4_512_000.8);
        let once = align_extent_to_pixel_grid(&e, &g);
        let twice = align_extent_to_pixel_grid(&once, &g);
        assert_eq!(once, twice);
        assert!(once.contains(&e));
    }

    #[test]
    fn test_align_keeps_aligned_edges() {
        let e = Extent::new(1020.0, 1060.0, 4900.0, 4950.0);
        assert_eq!(align_extent_to_pixel_grid(&e, &grid()), e);
    }

    #[test]
    fn test_edges_just_inside_a_boundary_snap_outward() {
        // Every edge sits a nanometre inside the next pixel boundary
        let e = Extent::new(1020.0 - 1e-9, 1060.0 + 1e-9, 4900.0 - 1e-9, 4950.0 + 1e-9);
        let a = align_extent_to_pixel_grid(&e, &grid());
        assert_eq!(a, Extent::new(1010.0, 1070.0, 4890.0, 4960.0));
        assert!(a.contains(&e));
        assert_eq!(align_extent_to_pixel_grid(&a, &grid()), a);
    }

    #[test]
    fn test_align_extent_left_of_origin() {
        let e = Extent::new(985.0, 995.0, 5005.0, 5015.0);
        let a = align_extent_to_pixel_grid(&e, &grid());
        assert_eq!(a, Extent::new(980.0, 1000.0, 5000.0, 5020.0));
    }

    #[test]
    fn test_pixel_helpers() {
        let g = grid();
        assert_eq!(g.pixel_center(0, 0), Point2::new(1005.0, 4995.0));
        assert_eq!(g.to_pixel(Point2::new(1025.0, 4975.0)), (2.5, 2.5));
        assert_eq!(g.extent(3, 2), Extent::new(1000.0, 1030.0, 4980.0, 5000.0));
        assert_eq!(GeoTransform::new(0.0, 0.0, 2.0, -3.0).pixel_height, 3.0);
    }
}
