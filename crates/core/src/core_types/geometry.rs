//! Point and extent value types.
//!
//! Points carry no CRS of their own; the CRS is always known from context
//! (the layer or stage that produced them).

use serde::{Deserialize, Serialize};

/// 2D point, `(x, y)` or `(lon, lat)` depending on the CRS.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point, used for terrain vertices.
pub type Point3 = nalgebra::Point3<f64>;

/// Axis-aligned rectangle, invariant `x_min <= x_max` and `y_min <= y_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Extent {
    /// Create an extent, ordering each axis so the invariant holds.
    pub fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self {
            x_min: x0.min(x1),
            x_max: x0.max(x1),
            y_min: y0.min(y1),
            y_max: y0.max(y1),
        }
    }

    /// Smallest extent containing every point, `None` if `points` is empty.
    pub fn from_points<I: IntoIterator<Item = Point2>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extent = Self::new(first.x, first.x, first.y, first.y);
        for p in iter {
            extent.x_min = extent.x_min.min(p.x);
            extent.x_max = extent.x_max.max(p.x);
            extent.y_min = extent.y_min.min(p.y);
            extent.y_max = extent.y_max.max(p.y);
        }
        Some(extent)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// True if `other` lies entirely inside `self` (edges included).
    pub fn contains(&self, other: &Extent) -> bool {
        self.x_min <= other.x_min
            && self.x_max >= other.x_max
            && self.y_min <= other.y_min
            && self.y_max >= other.y_max
    }

    pub fn contains_point(&self, p: Point2) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// Translate so that `origin` becomes `(0, 0)`.
    pub fn relative_to(&self, origin: Point2) -> Self {
        Self {
            x_min: self.x_min - origin.x,
            x_max: self.x_max - origin.x,
            y_min: self.y_min - origin.y,
            y_max: self.y_max - origin.y,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x_min.is_finite()
            && self.x_max.is_finite()
            && self.y_min.is_finite()
            && self.y_max.is_finite()
    }
}
