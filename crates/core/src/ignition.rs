//! Ignition vent placement

use crate::core_types::Point2;
use crate::domain::DomainSpec;
use serde::{Deserialize, Serialize};

/// Height of the ignition vent above the domain floor.
pub const IGNITION_HEIGHT: f64 = 1.0;

/// One-cell ground-level ignition vent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IgnitionSpec {
    /// `[xmin, xmax, ymin, ymax, zmin, zmax]` relative to the case origin
    pub xb: [f64; 6],
}

impl IgnitionSpec {
    /// Square footprint of one cell centred on `fire_origin` (UTM), both z
    /// bounds pinned [`IGNITION_HEIGHT`] above the domain floor.
    pub fn place(fire_origin: Point2, origin: Point2, cell_size: f64, domain: &DomainSpec) -> Self {
        let rel = fire_origin - origin;
        let half = cell_size / 2.0;
        let z = domain.z_min() + IGNITION_HEIGHT;
        Self {
            xb: [rel.x - half, rel.x + half, rel.y - half, rel.y + half, z, z],
        }
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.xb[0] + self.xb[1]) / 2.0,
            (self.xb[2] + self.xb[3]) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Extent;
    use crate::domain::size_domain;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ignition_is_centered_on_origin() {
        let extent = Extent::new(-500.0, 500.0, -500.0, 500.0);
        let domain = size_domain(&extent, (120.0, 180.0), 4, 10.0).unwrap();
        let origin = Point2::new(500_000.0, 5_000_000.0);
        let fire = Point2::new(500_123.4, 4_999_876.5);
        let ign = IgnitionSpec::place(fire, origin, 10.0, &domain);

        let tol = 10.0 / 1e6;
        assert_abs_diff_eq!(ign.center().x, 123.4, epsilon = tol);
        assert_abs_diff_eq!(ign.center().y, -123.5, epsilon = tol);
        assert_abs_diff_eq!(ign.xb[1] - ign.xb[0], 10.0, epsilon = tol);
        assert_eq!(ign.xb[4], 119.0);
        assert_eq!(ign.xb[5], 119.0);
    }
}
