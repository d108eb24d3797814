//! Land-use code to surface-type mapping

use super::catalog::{
    categorical_surfaces, landfire_surfaces, LanduseCatalog, SurfaceCatalog, SurfaceType,
};
use crate::error::{ExportError, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Code read where the land-use layer has no value.
pub const MISSING_CODE: i64 = 0;

/// Catalog positions of the surfaces set by a fire layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireSurfaces {
    /// Cells inside a fire feature (burned area)
    pub inside: usize,
    /// Cells within the buffer around a fire feature (fire front)
    pub border: usize,
}

/// Land-use table file: a surface catalog, the code mapping onto it by
/// surface ID, and optionally the fire layer default surfaces.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    name: String,
    surfaces: Vec<SurfaceType>,
    codes: BTreeMap<i64, String>,
    #[serde(default)]
    bc_in_default: Option<String>,
    #[serde(default)]
    bc_out_default: Option<String>,
}

/// Lookup table from raw land-use codes to catalog positions.
///
/// Total: unmapped codes resolve to the position of code [`MISSING_CODE`].
#[derive(Debug, Clone)]
pub struct LanduseTable {
    catalog: SurfaceCatalog,
    mapping: FxHashMap<i64, usize>,
    fallback: usize,
    bc_in: Option<usize>,
    bc_out: Option<usize>,
}

impl LanduseTable {
    /// Build a table; `mapping` must contain [`MISSING_CODE`] and only
    /// positions inside `catalog`.
    ///
    /// Returns `None` otherwise.
    pub fn new(catalog: SurfaceCatalog, mapping: FxHashMap<i64, usize>) -> Option<Self> {
        let fallback = *mapping.get(&MISSING_CODE)?;
        if mapping.values().any(|&p| p >= catalog.len()) {
            return None;
        }
        Some(Self {
            catalog,
            mapping,
            fallback,
            bc_in: None,
            bc_out: None,
        })
    }

    /// Load a table file.
    ///
    /// ```json
    /// {
    ///   "name": "Site survey",
    ///   "surfaces": [
    ///     {"id": "Grass", "rgb": [255, 254, 212], "fuel_index": 1},
    ///     {"id": "Rock", "rgb": [133, 153, 156]}
    ///   ],
    ///   "codes": {"0": "Rock", "11": "Grass"},
    ///   "bc_in_default": "Rock"
    /// }
    /// ```
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `InvalidConfig` if it does not parse
    /// or does not describe a valid table.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        let table = Self::from_json_str(&text).map_err(|e| match e {
            ExportError::InvalidConfig(reason) => {
                ExportError::InvalidConfig(format!("land-use table <{}>: {reason}", path.display()))
            }
            other => other,
        })?;
        info!(
            path = %path.display(),
            surfaces = table.catalog.len(),
            codes = table.mapping.len(),
            "Land-use table loaded"
        );
        Ok(table)
    }

    /// Parse the JSON text of a table file.
    ///
    /// # Errors
    /// `InvalidConfig` for malformed JSON, duplicate surface IDs, codes or
    /// fire defaults naming an unknown surface, or a missing code
    /// [`MISSING_CODE`].
    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: TableFile =
            serde_json::from_str(text).map_err(|e| ExportError::InvalidConfig(e.to_string()))?;
        if file.surfaces.is_empty() {
            return Err(ExportError::InvalidConfig("no surfaces".into()));
        }
        let catalog = SurfaceCatalog::new(file.name, file.surfaces);
        if let Some(dup) = catalog
            .iter()
            .enumerate()
            .find(|&(i, s)| catalog.position(&s.id) != Some(i))
            .map(|(_, s)| s.id.clone())
        {
            return Err(ExportError::InvalidConfig(format!("duplicate surface <{dup}>")));
        }

        let lookup = |id: &str| {
            catalog
                .position(id)
                .ok_or_else(|| ExportError::InvalidConfig(format!("unknown surface <{id}>")))
        };
        let mut mapping = FxHashMap::default();
        for (code, id) in &file.codes {
            mapping.insert(*code, lookup(id)?);
        }
        let bc_in = file.bc_in_default.as_deref().map(lookup).transpose()?;
        let bc_out = file.bc_out_default.as_deref().map(lookup).transpose()?;

        let mut table = Self::new(catalog, mapping).ok_or_else(|| {
            ExportError::InvalidConfig(format!("no surface for code {MISSING_CODE}"))
        })?;
        table.bc_in = bc_in;
        table.bc_out = bc_out;
        Ok(table)
    }

    /// Table of a built-in catalog.
    pub fn builtin(kind: LanduseCatalog) -> Self {
        match kind {
            LanduseCatalog::Landfire => Self::landfire(),
            LanduseCatalog::Categorical => Self::categorical(),
        }
    }

    /// Landfire FBFM13: codes 1-13 are fuel models `A01`-`A13`, 91-99 the
    /// non-burnable classes.
    pub fn landfire() -> Self {
        let surfaces = landfire_surfaces();
        let na = surfaces.len() - 1;
        let mut mapping: FxHashMap<i64, usize> =
            (1..=13).map(|code| (code, (code - 1) as usize)).collect();
        for (code, position) in [(91, 13), (92, 14), (93, 15), (98, 16), (99, 17)] {
            mapping.insert(code, position);
        }
        mapping.insert(MISSING_CODE, na);
        Self {
            catalog: SurfaceCatalog::new("Landfire FBFM13", surfaces),
            mapping,
            fallback: na,
            bc_in: None,
            bc_out: None,
        }
    }

    /// Categorical: codes 1-7 in catalog order, everything else `NA`.
    pub fn categorical() -> Self {
        let surfaces = categorical_surfaces();
        let na = surfaces.len() - 1;
        let mut mapping: FxHashMap<i64, usize> =
            (1..=7).map(|code| (code, (code - 1) as usize)).collect();
        mapping.insert(MISSING_CODE, na);
        Self {
            catalog: SurfaceCatalog::new("Categorical", surfaces),
            mapping,
            fallback: na,
            bc_in: None,
            bc_out: None,
        }
    }

    pub fn catalog(&self) -> &SurfaceCatalog {
        &self.catalog
    }

    /// 0-based catalog position of the fallback surface.
    pub fn fallback(&self) -> usize {
        self.fallback
    }

    /// Catalog position of `code`, in `0..catalog.len()`.
    #[inline]
    pub fn classify(&self, code: i64) -> usize {
        self.mapping.get(&code).copied().unwrap_or(self.fallback)
    }

    /// Classify sampled codes, `None` read as [`MISSING_CODE`].
    pub fn classify_all(&self, codes: &[Option<i64>]) -> Vec<usize> {
        let mut unmapped = 0usize;
        let positions = codes
            .iter()
            .map(|code| {
                let code = code.unwrap_or(MISSING_CODE);
                if !self.mapping.contains_key(&code) {
                    unmapped += 1;
                }
                self.classify(code)
            })
            .collect();
        if unmapped > 0 {
            debug!(
                unmapped,
                catalog = self.catalog.name(),
                "Unmapped land-use codes set to fallback surface"
            );
        }
        positions
    }

    /// Fire layer surfaces, `None` until both are known.
    pub fn fire_surfaces(&self) -> Option<FireSurfaces> {
        Some(FireSurfaces {
            inside: self.bc_in?,
            border: self.bc_out?,
        })
    }

    /// Table able to express fire layer conditions.
    ///
    /// Missing defaults become a non-burnable `Burned` surface inside fire
    /// features and a `Fire_front` surface igniting at start in their
    /// buffer, appended to the catalog unless it already has those IDs.
    pub fn with_fire_surfaces(mut self) -> Self {
        if self.bc_in.is_none() {
            let burned = SurfaceType::new("Burned", [20, 20, 20], None);
            self.bc_in = Some(self.catalog.position_or_push(burned));
        }
        if self.bc_out.is_none() {
            let front = SurfaceType::new("Fire_front", [255, 0, 0], None).with_ignite_time(0.0);
            self.bc_out = Some(self.catalog.position_or_push(front));
        }
        self
    }

    /// Every code with an explicit mapping, sorted.
    pub fn codes(&self) -> Vec<i64> {
        let mut codes: Vec<i64> = self.mapping.keys().copied().collect();
        codes.sort_unstable();
        codes
    }
}
