//! DEM sampling grid and elevation sampler

use super::fill::fill_nearest_valid;
use crate::core_types::{Extent, Point2, Point3};
use crate::error::{ExportError, Result};
use crate::geo::{align_extent_to_pixel_grid, GeoTransform, RasterSampler};
use crate::progress::{ProgressSink, ProgressTicker};
use tracing::{debug, warn};

/// Minimum number of sampling points along each axis.
pub const MIN_SAMPLES_PER_AXIS: usize = 3;

/// Regular grid of sampling cells in the DEM CRS.
///
/// Cells are numbered row-major from the north-west corner: column `c`
/// grows eastwards, row `r` grows southwards. Samples are taken at cell
/// centres; terrain vertices sit on cell corners.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingGrid {
    /// Pixel-aligned extent of the grid (DEM CRS)
    pub extent: Extent,
    /// Cell size along x
    pub dx: f64,
    /// Cell size along y
    pub dy: f64,
    /// Number of columns
    pub nx: usize,
    /// Number of rows
    pub ny: usize,
}

impl SamplingGrid {
    /// Grid covering `extent` (DEM CRS) aligned to the DEM pixels, one
    /// sample every `dem_sampling` pixels.
    ///
    /// # Errors
    /// `InvalidConfig` for a zero sampling factor, `TooFewSamples` if fewer
    /// than [`MIN_SAMPLES_PER_AXIS`] samples fit along an axis.
    pub fn aligned(extent: &Extent, dem: &GeoTransform, dem_sampling: u32) -> Result<Self> {
        if dem_sampling == 0 {
            return Err(ExportError::InvalidConfig(
                "dem_sampling must be at least 1".to_string(),
            ));
        }
        let aligned = align_extent_to_pixel_grid(extent, dem);
        let dx = dem.pixel_width * f64::from(dem_sampling);
        let dy = dem.pixel_height * f64::from(dem_sampling);
        let nx = cell_count(aligned.width(), dx);
        let ny = cell_count(aligned.height(), dy);

        for (axis, count) in [('x', nx), ('y', ny)] {
            if count < MIN_SAMPLES_PER_AXIS {
                return Err(ExportError::TooFewSamples { axis, count });
            }
        }

        // A down-sampled grid may overhang the aligned extent on the east and south
        let extent = Extent::new(
            aligned.x_min,
            aligned.x_min + nx as f64 * dx,
            aligned.y_max - ny as f64 * dy,
            aligned.y_max,
        );
        debug!(nx, ny, dx, dy, "DEM sampling grid");
        Ok(Self {
            extent,
            dx,
            dy,
            nx,
            ny,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    pub fn corner_count(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    /// Centre of cell `(col, row)`.
    pub fn center(&self, col: usize, row: usize) -> Point2 {
        Point2::new(
            self.extent.x_min + (col as f64 + 0.5) * self.dx,
            self.extent.y_max - (row as f64 + 0.5) * self.dy,
        )
    }

    /// Corner `(i, j)`, `i` in `0..=nx`, `j` in `0..=ny`.
    pub fn corner(&self, i: usize, j: usize) -> Point2 {
        Point2::new(
            self.extent.x_min + i as f64 * self.dx,
            self.extent.y_max - j as f64 * self.dy,
        )
    }

    /// All cell centres, row-major.
    pub fn centers(&self) -> Vec<Point2> {
        (0..self.ny)
            .flat_map(|row| (0..self.nx).map(move |col| self.center(col, row)))
            .collect()
    }

    /// All cell corners, row-major.
    pub fn corners(&self) -> Vec<Point2> {
        (0..=self.ny)
            .flat_map(|j| (0..=self.nx).map(move |i| self.corner(i, j)))
            .collect()
    }
}

fn cell_count(length: f64, step: f64) -> usize {
    // Tolerate rounding noise on exact multiples
    (length / step - 1e-6).ceil().max(0.0) as usize
}

/// Samples elevations from a DEM and fills `NoData` gaps.
pub struct ElevationSampler<'a> {
    dem: &'a dyn RasterSampler,
}

impl<'a> ElevationSampler<'a> {
    pub fn new(dem: &'a dyn RasterSampler) -> Self {
        Self { dem }
    }

    /// Elevation of every point (DEM CRS).
    ///
    /// Points on `NoData` take the value of the spatially nearest valid sample.
    ///
    /// # Errors
    /// `EmptyDem` if no point has a valid value.
    pub fn sample(&self, points: &[Point2], sink: &dyn ProgressSink) -> Result<Vec<Point3>> {
        let mut ticker = ProgressTicker::new(sink, "Sampling elevations", points.len());
        let mut raw = Vec::with_capacity(points.len());
        for (done, p) in points.iter().enumerate() {
            raw.push(self.dem.sample(*p).filter(|z| z.is_finite()));
            ticker.tick(done + 1);
        }

        let missing = raw.iter().filter(|z| z.is_none()).count();
        if missing > 0 {
            warn!(
                missing,
                total = points.len(),
                "DEM NoData at sampling points, filling from nearest valid"
            );
        }
        let z = fill_nearest_valid(points, &raw).ok_or(ExportError::EmptyDem(points.len()))?;

        Ok(points
            .iter()
            .zip(z)
            .map(|(p, z)| Point3::new(p.x, p.y, z))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Crs;
    use crate::geo::GridRaster;
    use crate::progress::NullSink;

    fn dem_transform() -> GeoTransform {
        GeoTransform::new(0.0, 100.0, 10.0, 10.0)
    }

    #[test]
    fn test_grid_alignment_and_counts() {
        let grid =
            SamplingGrid::aligned(&Extent::new(12.0, 58.0, 41.0, 89.0), &dem_transform(), 1)
                .unwrap();
        assert_eq!(grid.extent, Extent::new(10.0, 60.0, 40.0, 90.0));
        assert_eq!((grid.nx, grid.ny), (5, 5));
        assert_eq!(grid.center(0, 0), Point2::new(15.0, 85.0));
        assert_eq!(grid.corner(5, 5), Point2::new(60.0, 40.0));
        assert_eq!(grid.centers().len(), 25);
        assert_eq!(grid.corners().len(), grid.corner_count());
    }

    #[test]
    fn test_grid_downsampling_overhangs() {
        let grid =
            SamplingGrid::aligned(&Extent::new(0.0, 70.0, 0.0, 70.0), &dem_transform(), 2).unwrap();
        assert_eq!((grid.nx, grid.ny), (4, 4));
        assert_eq!(grid.dx, 20.0);
        assert_eq!(grid.extent, Extent::new(0.0, 80.0, -10.0, 70.0));
    }

    #[test]
    fn test_grid_too_few_samples() {
        let err = SamplingGrid::aligned(&Extent::new(0.0, 100.0, 80.0, 95.0), &dem_transform(), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::TooFewSamples { axis: 'y', count: 2 }
        ));
        assert!(matches!(
            SamplingGrid::aligned(&Extent::new(0.0, 100.0, 0.0, 100.0), &dem_transform(), 0),
            Err(ExportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sampler_fills_gaps() {
        let dem = GridRaster::from_fn(Crs::from_epsg(32632), dem_transform(), 10, 10, |p| {
            (p.x < 50.0).then_some(100.0 + p.x)
        });
        let points = vec![
            Point2::new(15.0, 55.0),
            Point2::new(45.0, 55.0),
            Point2::new(75.0, 55.0),
        ];
        let sampled = ElevationSampler::new(&dem).sample(&points, &NullSink).unwrap();
        assert_eq!(sampled[0].z, 115.0);
        assert_eq!(sampled[1].z, 145.0);
        // NoData east half: nearest valid sample is the second point
        assert_eq!(sampled[2].z, 145.0);
        assert_eq!((sampled[2].x, sampled[2].y), (75.0, 55.0));
    }

    #[test]
    fn test_sampler_all_nodata() {
        let dem = GridRaster::from_fn(Crs::from_epsg(32632), dem_transform(), 10, 10, |_| None);
        let points = vec![Point2::new(15.0, 55.0), Point2::new(45.0, 55.0)];
        let err = ElevationSampler::new(&dem).sample(&points, &NullSink).unwrap_err();
        assert!(matches!(err, ExportError::EmptyDem(2)));
    }
}
