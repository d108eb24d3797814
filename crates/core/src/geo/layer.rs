//! Capability interfaces for the host's raster and vector layers
//!
//! The pipeline never sees a concrete GIS library type. The host wraps its
//! DEM in a [`RasterSampler`] and its land-use layer in either a
//! [`RasterSampler`] or a [`VectorClassifier`].

use super::pixel_grid::GeoTransform;
use crate::core_types::{Crs, Extent, Point2};
use serde::{Deserialize, Serialize};

/// Read access to a single-band raster.
pub trait RasterSampler: Sync {
    /// CRS of the raster coordinates.
    fn crs(&self) -> Crs;

    /// Pixel grid of the raster.
    fn geo_transform(&self) -> GeoTransform;

    /// Area covered by the raster.
    fn extent(&self) -> Extent;

    /// Value at `point` (raster CRS), `None` for `NoData` or outside the raster.
    fn sample(&self, point: Point2) -> Option<f64>;
}

/// Read access to a categorised vector layer (polygons carrying a code).
pub trait VectorClassifier: Sync {
    /// CRS of the layer coordinates.
    fn crs(&self) -> Crs;

    /// Category code of the feature containing `point`, if any.
    fn code_at(&self, point: Point2) -> Option<i64>;
}

/// Land-use input, either flavour of host layer.
#[derive(Clone, Copy)]
pub enum LanduseLayer<'a> {
    Raster(&'a dyn RasterSampler),
    Vector(&'a dyn VectorClassifier),
}

impl LanduseLayer<'_> {
    pub fn crs(&self) -> Crs {
        match self {
            LanduseLayer::Raster(r) => r.crs(),
            LanduseLayer::Vector(v) => v.crs(),
        }
    }

    /// Category code at `point` (layer CRS), raster values rounded.
    pub fn code_at(&self, point: Point2) -> Option<i64> {
        match self {
            LanduseLayer::Raster(r) => r
                .sample(point)
                .filter(|v| v.is_finite())
                .map(|v| v.round() as i64),
            LanduseLayer::Vector(v) => v.code_at(point),
        }
    }
}

/// In-memory vector layer of coded polygons.
///
/// Each polygon is an outer ring, closed implicitly. Where polygons overlap,
/// the one added last wins.
#[derive(Debug, Clone)]
pub struct PolygonLayer {
    crs: Crs,
    polygons: Vec<CodedPolygon>,
}

#[derive(Debug, Clone)]
struct CodedPolygon {
    ring: Vec<Point2>,
    bbox: Extent,
    code: i64,
}

impl PolygonLayer {
    pub fn new(crs: Crs) -> Self {
        Self {
            crs,
            polygons: Vec::new(),
        }
    }

    /// Add a polygon; rings with fewer than three vertices are dropped.
    pub fn push(&mut self, ring: Vec<Point2>, code: i64) -> bool {
        if ring.len() < 3 {
            return false;
        }
        let Some(bbox) = Extent::from_points(ring.iter().copied()) else {
            return false;
        };
        self.polygons.push(CodedPolygon { ring, bbox, code });
        true
    }

    pub fn with_polygon(mut self, ring: Vec<Point2>, code: i64) -> Self {
        self.push(ring, code);
        self
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Even-odd crossing test of `p` against a closed ring.
fn ring_contains(ring: &[Point2], p: Point2) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < a.x + (b.x - a.x) * (p.y - a.y) / (b.y - a.y) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl VectorClassifier for PolygonLayer {
    fn crs(&self) -> Crs {
        self.crs
    }

    fn code_at(&self, point: Point2) -> Option<i64> {
        self.polygons
            .iter()
            .rev()
            .find(|poly| poly.bbox.contains_point(point) && ring_contains(&poly.ring, point))
            .map(|poly| poly.code)
    }
}

/// How [`GridRaster`] reads values between pixel centres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Value of the pixel containing the point.
    #[default]
    Nearest,
    /// Bilinear blend of the four surrounding pixel centres; falls back to
    /// nearest when one of them is `NoData`.
    Bilinear,
}

/// In-memory raster, row-major from the top-left pixel.
#[derive(Debug, Clone)]
pub struct GridRaster {
    crs: Crs,
    transform: GeoTransform,
    ncols: usize,
    nrows: usize,
    values: Vec<f64>,
    nodata: Option<f64>,
    interpolation: Interpolation,
}

impl GridRaster {
    /// Wrap existing values.
    ///
    /// Returns `None` if `values.len() != ncols * nrows` or the grid is empty.
    pub fn new(
        crs: Crs,
        transform: GeoTransform,
        ncols: usize,
        nrows: usize,
        values: Vec<f64>,
        nodata: Option<f64>,
    ) -> Option<Self> {
        if ncols == 0 || nrows == 0 || values.len() != ncols * nrows {
            return None;
        }
        Some(Self {
            crs,
            transform,
            ncols,
            nrows,
            values,
            nodata,
            interpolation: Interpolation::Nearest,
        })
    }

    /// Build a raster by evaluating `f` at every pixel centre; `None` is `NoData`.
    pub fn from_fn<F>(crs: Crs, transform: GeoTransform, ncols: usize, nrows: usize, f: F) -> Self
    where
        F: Fn(Point2) -> Option<f64>,
    {
        let mut values = Vec::with_capacity(ncols * nrows);
        for row in 0..nrows {
            for col in 0..ncols {
                values.push(f(transform.pixel_center(col, row)).unwrap_or(f64::NAN));
            }
        }
        Self {
            crs,
            transform,
            ncols,
            nrows,
            values,
            nodata: None,
            interpolation: Interpolation::Nearest,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Value of pixel `(col, row)`, `None` for `NoData`.
    pub fn pixel(&self, col: usize, row: usize) -> Option<f64> {
        let v = *self.values.get(row * self.ncols + col)?;
        if v.is_nan() || self.nodata.is_some_and(|nd| v == nd) {
            None
        } else {
            Some(v)
        }
    }

    fn nearest(&self, col: f64, row: f64) -> Option<f64> {
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (c, r) = (col.floor() as usize, row.floor() as usize);
        if c >= self.ncols || r >= self.nrows {
            return None;
        }
        self.pixel(c, r)
    }

    fn bilinear(&self, col: f64, row: f64) -> Option<f64> {
        let nearest = self.nearest(col, row)?;
        // Shift to pixel-centre coordinates and clamp at the raster border
        let fx = (col - 0.5).clamp(0.0, (self.ncols - 1) as f64);
        let fy = (row - 0.5).clamp(0.0, (self.nrows - 1) as f64);
        let (c0, r0) = (fx.floor() as usize, fy.floor() as usize);
        let (c1, r1) = ((c0 + 1).min(self.ncols - 1), (r0 + 1).min(self.nrows - 1));
        let (tx, ty) = (fx - c0 as f64, fy - r0 as f64);

        let corners = (
            self.pixel(c0, r0),
            self.pixel(c1, r0),
            self.pixel(c0, r1),
            self.pixel(c1, r1),
        );
        match corners {
            (Some(v00), Some(v10), Some(v01), Some(v11)) => {
                let top = v00 + (v10 - v00) * tx;
                let bottom = v01 + (v11 - v01) * tx;
                Some(top + (bottom - top) * ty)
            }
            _ => Some(nearest),
        }
    }
}

impl RasterSampler for GridRaster {
    fn crs(&self) -> Crs {
        self.crs
    }

    fn geo_transform(&self) -> GeoTransform {
        self.transform
    }

    fn extent(&self) -> Extent {
        self.transform.extent(self.ncols, self.nrows)
    }

    fn sample(&self, point: Point2) -> Option<f64> {
        let (col, row) = self.transform.to_pixel(point);
        match self.interpolation {
            Interpolation::Nearest => self.nearest(col, row),
            Interpolation::Bilinear => self.bilinear(col, row),
        }
    }
}
