//! Coordinate reference system identifiers.
//!
//! The pipeline only ever needs to name a CRS and hand it to a
//! [`CrsTransformer`](crate::geo::CrsTransformer); it never interprets the
//! projection itself. EPSG codes are enough for that.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of WGS 84 geographic coordinates (lon/lat degrees).
pub const EPSG_WGS84: u32 = 4326;
/// EPSG code of Web Mercator.
pub const EPSG_WEB_MERCATOR: u32 = 3857;

const EPSG_UTM_NORTH_BASE: u32 = 32600;
const EPSG_UTM_SOUTH_BASE: u32 = 32700;

/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    pub const WGS84: Crs = Crs { epsg: EPSG_WGS84 };

    pub const fn from_epsg(epsg: u32) -> Self {
        Self { epsg }
    }

    pub const fn epsg(&self) -> u32 {
        self.epsg
    }

    /// WGS 84 / UTM zone containing the given geographic point.
    ///
    /// Zones are 6 degrees wide starting at 180°W; points on or north of the
    /// equator use the northern hemisphere code.
    pub fn utm_for_lonlat(lon: f64, lat: f64) -> Self {
        let zone = ((lon + 180.0) / 6.0).floor().rem_euclid(60.0) as u32 + 1;
        let base = if lat >= 0.0 {
            EPSG_UTM_NORTH_BASE
        } else {
            EPSG_UTM_SOUTH_BASE
        };
        Self { epsg: base + zone }
    }

    /// UTM zone number and southern-hemisphere flag, if this is a WGS 84 UTM CRS.
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        match self.epsg {
            e if (EPSG_UTM_NORTH_BASE + 1..=EPSG_UTM_NORTH_BASE + 60).contains(&e) => {
                Some((e - EPSG_UTM_NORTH_BASE, false))
            }
            e if (EPSG_UTM_SOUTH_BASE + 1..=EPSG_UTM_SOUTH_BASE + 60).contains(&e) => {
                Some((e - EPSG_UTM_SOUTH_BASE, true))
            }
            _ => None,
        }
    }

    /// True if coordinates are angular degrees.
    pub fn is_geographic(&self) -> bool {
        self.epsg == EPSG_WGS84
    }

    /// `EPSG:<code>` authority identifier.
    pub fn authid(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }

    /// Human readable name, used in the case header.
    pub fn description(&self) -> String {
        match self.utm_zone() {
            Some((zone, false)) => format!("WGS 84 / UTM zone {zone}N"),
            Some((zone, true)) => format!("WGS 84 / UTM zone {zone}S"),
            None if self.epsg == EPSG_WGS84 => "WGS 84".to_string(),
            None if self.epsg == EPSG_WEB_MERCATOR => "WGS 84 / Pseudo-Mercator".to_string(),
            None => self.authid(),
        }
    }

    /// PROJ definition string for the codes the built-in transformer knows.
    pub fn proj_definition(&self) -> Option<String> {
        if let Some((zone, south)) = self.utm_zone() {
            let hemisphere = if south { " +south" } else { "" };
            return Some(format!(
                "+proj=utm +zone={zone}{hemisphere} +datum=WGS84 +units=m +no_defs"
            ));
        }
        match self.epsg {
            EPSG_WGS84 => Some("+proj=longlat +datum=WGS84 +no_defs".to_string()),
            EPSG_WEB_MERCATOR => Some(
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
                 +units=m +nadgrids=@null +no_defs"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.authid(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_zone_selection() {
        // Rome, zone 33N
        assert_eq!(Crs::utm_for_lonlat(12.49, 41.89).epsg(), 32633);
        // Sydney, zone 56S
        assert_eq!(Crs::utm_for_lonlat(151.21, -33.87).epsg(), 32756);
        // Zone boundaries
        assert_eq!(Crs::utm_for_lonlat(-180.0, 10.0).epsg(), 32601);
        assert_eq!(Crs::utm_for_lonlat(180.0, 10.0).epsg(), 32601);
        assert_eq!(Crs::utm_for_lonlat(0.0, 0.0).epsg(), 32631);
        assert_eq!(Crs::utm_for_lonlat(-0.1, -0.1).epsg(), 32730);
    }

    #[test]
    fn test_utm_zone_roundtrip() {
        assert_eq!(Crs::from_epsg(32632).utm_zone(), Some((32, false)));
        assert_eq!(Crs::from_epsg(32760).utm_zone(), Some((60, true)));
        assert_eq!(Crs::from_epsg(32600).utm_zone(), None);
        assert_eq!(Crs::WGS84.utm_zone(), None);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(Crs::from_epsg(32632).description(), "WGS 84 / UTM zone 32N");
        assert_eq!(Crs::from_epsg(32756).description(), "WGS 84 / UTM zone 56S");
        assert_eq!(Crs::WGS84.authid(), "EPSG:4326");
        assert!(Crs::from_epsg(2154).proj_definition().is_none());
        assert!(Crs::from_epsg(32756)
            .proj_definition()
            .is_some_and(|s| s.contains("+south")));
    }
}
