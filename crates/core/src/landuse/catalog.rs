//! Surface-type catalogs
//!
//! Two built-in catalogs:
//! - Landfire FBFM13: the 13 Anderson fuel models plus non-burnable classes
//! - Categorical: a coarse vegetation classification
//!
//! Catalog order is the 1-based surface index referenced by the terrain
//! geometry, so entries are never reordered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulation surface type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceType {
    /// Surface ID written to the deck
    pub id: String,
    /// Display colour
    pub rgb: [u8; 3],
    /// Level-set fuel model, `None` for non-burnable surfaces
    #[serde(default)]
    pub fuel_index: Option<u8>,
    /// Seconds after start at which the surface is set burning
    #[serde(default)]
    pub ignite_time: Option<f64>,
}

impl SurfaceType {
    pub fn new(id: &str, rgb: [u8; 3], fuel_index: Option<u8>) -> Self {
        Self {
            id: id.to_string(),
            rgb,
            fuel_index,
            ignite_time: None,
        }
    }

    pub fn with_ignite_time(mut self, seconds: f64) -> Self {
        self.ignite_time = Some(seconds);
        self
    }
}

/// Ordered list of surface types.
///
/// Surfaces are only ever appended, never reordered or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCatalog {
    name: String,
    surfaces: Vec<SurfaceType>,
}

impl SurfaceCatalog {
    pub fn new(name: impl Into<String>, surfaces: Vec<SurfaceType>) -> Self {
        Self {
            name: name.into(),
            surfaces,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Surface at 0-based `position`.
    pub fn get(&self, position: usize) -> Option<&SurfaceType> {
        self.surfaces.get(position)
    }

    /// 0-based position of surface `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.surfaces.iter().position(|s| s.id == id)
    }

    /// Position of `surface`, appending it when no surface has its ID.
    pub fn position_or_push(&mut self, surface: SurfaceType) -> usize {
        match self.position(&surface.id) {
            Some(position) => position,
            None => {
                self.surfaces.push(surface);
                self.surfaces.len() - 1
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurfaceType> {
        self.surfaces.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.surfaces.iter().map(|s| s.id.as_str())
    }
}

/// Built-in land-use catalog selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanduseCatalog {
    /// Landfire FBFM13 detailed fuel models
    #[default]
    Landfire,
    /// Coarse categorical vegetation classes
    Categorical,
}

impl fmt::Display for LanduseCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanduseCatalog::Landfire => write!(f, "Landfire FBFM13"),
            LanduseCatalog::Categorical => write!(f, "Categorical"),
        }
    }
}

/// Landfire FBFM13 surfaces: `A01`..`A13` then the non-burnable classes.
pub(crate) fn landfire_surfaces() -> Vec<SurfaceType> {
    const FUEL_RGB: [[u8; 3]; 13] = [
        [255, 254, 212],
        [255, 253, 102],
        [236, 212, 99],
        [254, 193, 119],
        [249, 197, 92],
        [217, 196, 152],
        [170, 155, 127],
        [229, 253, 214],
        [162, 191, 90],
        [114, 154, 85],
        [235, 212, 253],
        [163, 177, 243],
        [0, 0, 0],
    ];
    let mut surfaces: Vec<SurfaceType> = (1u8..)
        .zip(FUEL_RGB)
        .map(|(model, rgb)| SurfaceType {
            id: format!("A{model:02}"),
            rgb,
            fuel_index: Some(model),
            ignite_time: None,
        })
        .collect();
    surfaces.extend([
        SurfaceType::new("Urban", [186, 119, 80], None),
        SurfaceType::new("Snow-Ice", [234, 234, 234], None),
        SurfaceType::new("Agriculture", [253, 242, 242], None),
        SurfaceType::new("Water", [137, 183, 221], None),
        SurfaceType::new("Barren", [133, 153, 156], None),
        SurfaceType::new("NA", [255, 255, 255], None),
    ]);
    surfaces
}

pub(crate) fn categorical_surfaces() -> Vec<SurfaceType> {
    vec![
        SurfaceType::new("Broadleaf", [0, 130, 0], Some(8)),
        SurfaceType::new("Shrubland", [170, 200, 80], Some(5)),
        SurfaceType::new("NonVegetated", [200, 200, 200], None),
        SurfaceType::new("Pasture", [230, 230, 80], Some(1)),
        SurfaceType::new("Grassland", [250, 210, 100], Some(3)),
        SurfaceType::new("Conifer", [0, 90, 50], Some(10)),
        SurfaceType::new("Agriculture", [253, 242, 242], Some(1)),
        SurfaceType::new("NA", [255, 255, 255], None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landfire_surfaces() {
        let surfaces = landfire_surfaces();
        assert_eq!(surfaces.len(), 19);
        assert_eq!(surfaces[0].id, "A01");
        assert_eq!(surfaces[12].id, "A13");
        assert_eq!(surfaces[12].fuel_index, Some(13));
        assert_eq!(surfaces[18].id, "NA");
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = SurfaceCatalog::new("test", categorical_surfaces());
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.position("Conifer"), Some(5));
        assert_eq!(catalog.get(7).map(|s| s.id.as_str()), Some("NA"));
        assert!(catalog.get(8).is_none());
        assert_eq!(catalog.ids().count(), 8);
    }

    #[test]
    fn test_position_or_push_appends_once() {
        let mut catalog = SurfaceCatalog::new("test", categorical_surfaces());
        let burned = SurfaceType::new("Burned", [20, 20, 20], None);
        assert_eq!(catalog.position_or_push(burned.clone()), 8);
        assert_eq!(catalog.position_or_push(burned), 8);
        assert_eq!(catalog.position_or_push(SurfaceType::new("NA", [0, 0, 0], None)), 7);
        assert_eq!(catalog.len(), 9);
    }

    #[test]
    fn test_surface_type_from_json() {
        let front: SurfaceType =
            serde_json::from_str(r#"{"id": "Front", "rgb": [255, 0, 0], "ignite_time": 0.0}"#)
                .unwrap();
        assert_eq!(front, SurfaceType::new("Front", [255, 0, 0], None).with_ignite_time(0.0));
        let grass: SurfaceType =
            serde_json::from_str(r#"{"id": "Grass", "rgb": [1, 2, 3], "fuel_index": 1}"#).unwrap();
        assert_eq!(grass.fuel_index, Some(1));
        assert_eq!(grass.ignite_time, None);
    }

    #[test]
    fn test_catalog_selector_serde() {
        let parsed: LanduseCatalog = serde_json::from_str("\"categorical\"").unwrap();
        assert_eq!(parsed, LanduseCatalog::Categorical);
        assert_eq!(LanduseCatalog::default(), LanduseCatalog::Landfire);
    }
}
