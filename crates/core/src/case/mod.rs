//! Case deck text generation
//!
//! The deck is an ordered list of section builders over immutable inputs.
//! Nothing here computes geometry; every number comes from an upstream
//! stage and is only formatted.

pub mod format;
pub mod sections;

use crate::core_types::{Crs, Extent, Point2};
use crate::domain::DomainSpec;
use crate::ignition::IgnitionSpec;
use crate::landuse::SurfaceCatalog;
use crate::terrain::ObstCell;
use crate::wind::WindTimeSeries;
use chrono::NaiveDateTime;

/// Generator name written to the header.
pub const GENERATOR: &str = "terrain2fds";

/// Terrain file name for a case: `<chid>_terrain.bingeom`.
pub fn bingeom_filename(chid: &str) -> String {
    format!("{chid}_terrain.bingeom")
}

/// Terrain representation in the deck.
#[derive(Debug, Clone, Copy)]
pub enum TerrainSection<'a> {
    /// Triangulated terrain stored in a bingeom file.
    Geom {
        filename: &'a str,
        vertex_count: usize,
        face_count: usize,
    },
    /// One block per terrain cell.
    Obst(&'a [ObstCell]),
}

/// Everything the deck refers to.
#[derive(Debug, Clone, Copy)]
pub struct CaseInputs<'a> {
    pub chid: &'a str,
    pub generated_at: NaiveDateTime,
    pub utm_crs: Crs,
    /// Case origin in UTM
    pub utm_origin: Point2,
    /// Case origin as (lon, lat)
    pub wgs84_origin: Point2,
    /// Domain extent in UTM, absolute
    pub utm_extent: Extent,
    pub level_set_mode: u8,
    pub t_begin: f64,
    pub t_end: f64,
    pub domain: &'a DomainSpec,
    pub ignition: Option<&'a IgnitionSpec>,
    pub wind: &'a WindTimeSeries,
    pub catalog: &'a SurfaceCatalog,
    pub terrain: TerrainSection<'a>,
}

/// A section builder.
pub type Section = fn(&CaseInputs<'_>) -> String;

/// Deck sections in output order.
pub const SECTIONS: [(&str, Section); 11] = [
    ("header", sections::header),
    ("head", sections::head),
    ("misc", sections::misc),
    ("mesh", sections::mesh),
    ("boundaries", sections::boundaries),
    ("wind", sections::wind),
    ("ignition", sections::ignition),
    ("output", sections::output),
    ("surfaces", sections::surfaces),
    ("terrain", sections::terrain),
    ("tail", sections::tail),
];

/// Full deck text.
pub fn generate_case(inputs: &CaseInputs<'_>) -> String {
    let mut text = SECTIONS
        .iter()
        .map(|(_, build)| build(inputs))
        .collect::<Vec<_>>()
        .join("\n");
    text.push('\n');
    text
}
