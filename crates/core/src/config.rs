//! Export configuration
//!
//! Everything the host supplies besides the layers themselves. Missing
//! fields take their defaults when loaded from JSON.

use crate::case::bingeom_filename;
use crate::core_types::{Crs, Extent, Point2};
use crate::error::{ExportError, Result};
use crate::landuse::{LanduseCatalog, LanduseTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How the terrain is written to the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    /// Triangulated `&GEOM` backed by a bingeom file
    #[default]
    Geom,
    /// One `&OBST` per terrain cell, no bingeom
    Obst,
}

/// Parameters of one case export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Case identifier, file stem of both outputs
    pub chid: String,

    /// Output directory
    pub fds_path: PathBuf,

    /// CRS of `extent`, `origin` and `fire_origin`
    pub project_crs: Crs,

    /// Domain extent
    pub extent: Extent,

    /// Case origin, extent centre when unset
    pub origin: Option<Point2>,

    /// Fire ignition point, no ignition when unset
    pub fire_origin: Option<Point2>,

    /// Requested number of mesh blocks
    pub nmesh: u32,

    /// Target cell size (m)
    pub cell_size: f64,

    /// One terrain sample every `dem_sampling` DEM pixels
    pub dem_sampling: u32,

    pub landuse_catalog: LanduseCatalog,

    /// JSON land-use table, replaces `landuse_catalog` when set
    pub landuse_type_filepath: Option<PathBuf>,

    /// Wind CSV, default ramp when unset
    pub wind_filepath: Option<PathBuf>,

    /// Simulation start time (s)
    pub t_begin: f64,

    /// Simulation end time (s)
    pub t_end: f64,

    /// Solver coupling mode, 1 to 4
    pub level_set_mode: u8,

    pub terrain_kind: TerrainKind,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chid: "terrain".to_string(),
            fds_path: PathBuf::from("."),
            project_crs: Crs::WGS84,
            extent: Extent::new(0.0, 0.0, 0.0, 0.0),
            origin: None,
            fire_origin: None,
            nmesh: 4,
            cell_size: 10.0,
            dem_sampling: 1,
            landuse_catalog: LanduseCatalog::default(),
            landuse_type_filepath: None,
            wind_filepath: None,
            t_begin: 0.0,
            t_end: 3600.0,
            level_set_mode: 4,
            terrain_kind: TerrainKind::default(),
        }
    }
}

impl ExportConfig {
    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// `Io` if unreadable, `InvalidConfig` if not valid JSON for this type.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            ExportError::InvalidConfig(format!("<{}>: {e}", path.display()))
        })
    }

    /// Check value ranges that need no layer data.
    ///
    /// # Errors
    /// `InvalidDomainConfig` for a zero mesh count, `InvalidConfig` for
    /// everything else.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ExportError::InvalidConfig(msg));

        if self.chid.is_empty()
            || self
                .chid
                .chars()
                .any(|c| c.is_whitespace() || c == '\'' || c == '"' || c == '/' || c == '\\')
        {
            return invalid(format!(
                "chid <{}> must be non-empty, without spaces, quotes or path separators",
                self.chid
            ));
        }
        if self.nmesh == 0 {
            return Err(ExportError::InvalidDomainConfig(
                "requested mesh count must be positive".to_string(),
            ));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return invalid(format!(
                "cell size must be a positive number of meters, got {}",
                self.cell_size
            ));
        }
        if self.dem_sampling == 0 {
            return invalid("dem_sampling must be at least 1".to_string());
        }
        if !self.t_begin.is_finite() || !self.t_end.is_finite() || self.t_end <= self.t_begin {
            return invalid(format!(
                "t_end {} must be after t_begin {}",
                self.t_end, self.t_begin
            ));
        }
        if !(1..=4).contains(&self.level_set_mode) {
            return invalid(format!(
                "level_set_mode must be 1 to 4, got {}",
                self.level_set_mode
            ));
        }
        if !self.extent.is_finite() {
            return invalid("extent has non-finite bounds".to_string());
        }
        let finite = |p: &Option<Point2>| p.is_none_or(|p| p.x.is_finite() && p.y.is_finite());
        if !finite(&self.origin) || !finite(&self.fire_origin) {
            return invalid("origin and fire origin must be finite".to_string());
        }
        Ok(())
    }

    /// Land-use table of the case: the table file when configured, the
    /// built-in catalog otherwise.
    ///
    /// # Errors
    /// See [`LanduseTable::from_json_file`].
    pub fn landuse_table(&self) -> Result<LanduseTable> {
        match &self.landuse_type_filepath {
            Some(path) => LanduseTable::from_json_file(path),
            None => Ok(LanduseTable::builtin(self.landuse_catalog)),
        }
    }

    /// Case origin in the project CRS.
    pub fn origin_or_center(&self) -> Point2 {
        self.origin.unwrap_or_else(|| self.extent.center())
    }

    /// `<fds_path>/<chid>.fds`
    pub fn fds_file(&self) -> PathBuf {
        self.fds_path.join(format!("{}.fds", self.chid))
    }

    /// `<fds_path>/<chid>_terrain.bingeom`
    pub fn bingeom_file(&self) -> PathBuf {
        self.fds_path.join(bingeom_filename(&self.chid))
    }
}
