//! Deck section builders, one per block of the deck.

use super::format::{
    list, num, quoted, xb, COMMENT_DECIMALS, DATE_FORMAT, GEO_DECIMALS, LENGTH_DECIMALS,
    RAMP_DECIMALS, RAMP_TIME_DECIMALS, TIME_DECIMALS,
};
use super::{CaseInputs, TerrainSection, GENERATOR};
use crate::wind::WindSource;
use std::fmt::Write;

/// Open boundaries of the domain; the bottom is the terrain.
const OPEN_BOUNDARIES: [&str; 5] = ["XMIN", "XMAX", "YMIN", "YMAX", "ZMAX"];

/// Provenance and summary comments.
pub fn header(c: &CaseInputs<'_>) -> String {
    let mut s = String::new();
    let e = &c.utm_extent;
    let d = c.domain;
    let _ = writeln!(s, "! Generated by {GENERATOR} <{}>", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(s, "! Date: <{}>", c.generated_at.format(DATE_FORMAT));
    let _ = writeln!(s, "!");
    let _ = writeln!(s, "! Domain");
    let _ = writeln!(
        s,
        "! UTM CRS: <{} {}>",
        c.utm_crs.authid(),
        c.utm_crs.description()
    );
    let _ = writeln!(
        s,
        "! UTM origin: <{}, {}>",
        num(c.utm_origin.x, COMMENT_DECIMALS),
        num(c.utm_origin.y, COMMENT_DECIMALS)
    );
    let _ = writeln!(
        s,
        "! WGS84 origin (lon, lat): <{}, {}>",
        num(c.wgs84_origin.x, GEO_DECIMALS),
        num(c.wgs84_origin.y, GEO_DECIMALS)
    );
    let _ = writeln!(
        s,
        "! UTM extent: <{}>",
        list(&[e.x_min, e.x_max, e.y_min, e.y_max], COMMENT_DECIMALS)
    );
    let _ = writeln!(
        s,
        "! Meshes: <{} of {} requested>, cell size: <{} m>",
        d.mesh_count(),
        d.requested_meshes,
        num(d.cell_size, LENGTH_DECIMALS)
    );
    let _ = writeln!(s, "!");
    let _ = writeln!(s, "! Terrain");
    match c.terrain {
        TerrainSection::Geom {
            filename,
            vertex_count,
            face_count,
        } => {
            let _ = writeln!(
                s,
                "! GEOM: <{vertex_count} vertices, {face_count} faces>, file: <{filename}>"
            );
        }
        TerrainSection::Obst(cells) => {
            let _ = writeln!(s, "! OBST: <{} cells>", cells.len());
        }
    }
    let _ = writeln!(s, "!");
    let _ = writeln!(s, "! Landuse");
    let _ = writeln!(
        s,
        "! Catalog: <{}>, surfaces: <{}>",
        c.catalog.name(),
        c.catalog.len()
    );
    let _ = writeln!(s, "!");
    let _ = writeln!(s, "! Wind");
    let source = match &c.wind.source {
        WindSource::Default => "default ramp".to_string(),
        WindSource::File(path) => path.display().to_string(),
    };
    let _ = writeln!(
        s,
        "! Source: <{source}>, samples: <{}>, rejected rows: <{}>",
        c.wind.samples.len(),
        c.wind.rejected.len()
    );
    s
}

/// Run identifier.
pub fn head(c: &CaseInputs<'_>) -> String {
    format!(
        "&HEAD CHID='{chid}' TITLE='Description of {chid}' /\n",
        chid = c.chid
    )
}

/// Solver mode, georeference, times and solver notes.
pub fn misc(c: &CaseInputs<'_>) -> String {
    format!(
        "! MISC LEVEL_SET_MODE parameter
! 1: Wind not affected by the terrain. No fire.
! 2: Wind field established over the terrain, then frozen. No fire.
! 3: Wind field following the terrain, no fire.
! 4: Wind and fire fully-coupled.

&MISC ORIGIN_LAT={lat}
      ORIGIN_LON={lon}
      NORTH_BEARING=0.
      LEVEL_SET_MODE={mode} /

&TIME T_BEGIN={t_begin} T_END={t_end} /

! Example REAC, used when LEVEL_SET_MODE=4
&REAC ID='Wood' SOOT_YIELD=0.02 O=2.5 C=3.4 H=6.2
      HEAT_OF_COMBUSTION=17700. /

! Pressure solver
!PRES VELOCITY_TOLERANCE=1.E-6 MAX_PRESSURE_ITERATIONS=100 /

! Radiation solver
!RADI RADIATION=F /
",
        lat = num(c.wgs84_origin.y, GEO_DECIMALS),
        lon = num(c.wgs84_origin.x, GEO_DECIMALS),
        mode = c.level_set_mode,
        t_begin = num(c.t_begin, TIME_DECIMALS),
        t_end = num(c.t_end, TIME_DECIMALS),
    )
}

/// Mesh multiplier and the first mesh block.
pub fn mesh(c: &CaseInputs<'_>) -> String {
    let d = c.domain;
    let [bx, by, bz] = d.block_size();
    let [i, j, k] = d.ijk;
    format!(
        "! Domain and its boundary conditions
! {nx} x {ny} meshes of {bx} x {by} x {bz} m, {i} x {j} x {k} cells each
&MULT ID='Meshes'
      DX={dx} I_UPPER={i_upper}
      DY={dy} J_UPPER={j_upper} /
&MESH IJK={i},{j},{k} MULT_ID='Meshes'
      XB={mesh_xb} /
",
        nx = d.nmesh_x,
        ny = d.nmesh_y,
        bx = num(bx, LENGTH_DECIMALS),
        by = num(by, LENGTH_DECIMALS),
        bz = num(bz, LENGTH_DECIMALS),
        dx = num(bx, LENGTH_DECIMALS),
        dy = num(by, LENGTH_DECIMALS),
        i_upper = d.nmesh_x.saturating_sub(1),
        j_upper = d.nmesh_y.saturating_sub(1),
        mesh_xb = xb(&d.mesh_xb),
    )
}

/// Open vents on every side but the ground.
pub fn boundaries(_c: &CaseInputs<'_>) -> String {
    OPEN_BOUNDARIES
        .iter()
        .map(|mb| format!("&VENT MB='{mb}' SURF_ID='OPEN' /\n"))
        .collect()
}

/// Wind with its speed and direction ramps.
pub fn wind(c: &CaseInputs<'_>) -> String {
    let mut s = String::from("! Wind\n");
    for row in &c.wind.rejected {
        let _ = writeln!(s, "! Wind file row {} skipped: {}", row.line, row.reason);
    }
    if c.wind.samples.is_empty() {
        s.push_str("! No valid wind samples, wind ramps omitted\n");
        return s;
    }
    s.push_str("&WIND SPEED=1., RAMP_SPEED_T='ws', RAMP_DIRECTION_T='wd' /\n");
    for w in &c.wind.samples {
        let _ = writeln!(
            s,
            "&RAMP ID='ws', T={}, F={} /",
            num(w.time, RAMP_TIME_DECIMALS),
            num(w.speed, RAMP_DECIMALS)
        );
    }
    for w in &c.wind.samples {
        let _ = writeln!(
            s,
            "&RAMP ID='wd', T={}, F={} /",
            num(w.time, RAMP_TIME_DECIMALS),
            num(w.direction, RAMP_DECIMALS)
        );
    }
    s
}

/// Ignition surface and vent.
pub fn ignition(c: &CaseInputs<'_>) -> String {
    match c.ignition {
        Some(ign) => format!(
            "! Fire origin
&SURF ID='Ignition' VEG_LSET_IGNITE_TIME=0. COLOR='RED' /
&VENT ID='Ignition' SURF_ID='Ignition' GEOM=T
      XB={} /
",
            xb(&ign.xb)
        ),
        None => "! No ignition point\n".to_string(),
    }
}

/// Slices and wind devices at the origin.
pub fn output(c: &CaseInputs<'_>) -> String {
    let z = num(c.domain.z_max() - 1.0, LENGTH_DECIMALS);
    let zero = num(0.0, LENGTH_DECIMALS);
    let mut s = format!(
        "! Output quantities
&SLCF AGL_SLICE=1. QUANTITY='LEVEL SET VALUE' /
&SLCF AGL_SLICE=2. QUANTITY='VISIBILITY' /
&SLCF AGL_SLICE=2. QUANTITY='TEMPERATURE' VECTOR=T /
&SLCF AGL_SLICE=12. QUANTITY='VISIBILITY' /
&SLCF AGL_SLICE=12. QUANTITY='TEMPERATURE' VECTOR=T /
&SLCF PBX={zero} QUANTITY='TEMPERATURE' VECTOR=T /
&SLCF PBY={zero} QUANTITY='TEMPERATURE' VECTOR=T /

! Output for wind rose at origin
"
    );
    for (id, quantity) in [("UV", "U"), ("VV", "V"), ("WV", "W")] {
        let _ = writeln!(
            s,
            "&DEVC ID='Origin_{id}' XYZ=0.,0.,{z} QUANTITY='{quantity}-VELOCITY' /"
        );
    }
    s
}

/// Surface catalog in catalog order.
pub fn surfaces(c: &CaseInputs<'_>) -> String {
    let mut s = format!("! Landuse surfaces ({})\n", c.catalog.name());
    for surf in c.catalog.iter() {
        let [r, g, b] = surf.rgb;
        let _ = write!(s, "&SURF ID='{}' RGB={r},{g},{b}", surf.id);
        if let Some(fuel) = surf.fuel_index {
            let _ = write!(s, " VEG_LSET_FUEL_INDEX={fuel}");
        }
        if let Some(t) = surf.ignite_time {
            let _ = write!(s, " VEG_LSET_IGNITE_TIME={}", num(t, TIME_DECIMALS));
        }
        s.push_str(" /\n");
    }
    s
}

/// Terrain geometry reference, or the OBST blocks.
pub fn terrain(c: &CaseInputs<'_>) -> String {
    match c.terrain {
        TerrainSection::Geom { filename, .. } => format!(
            "! Terrain
&GEOM ID='Terrain' IS_TERRAIN=T EXTEND_TERRAIN=F
      SURF_ID={}
      BINARY_FILE='{filename}' /
",
            quoted(c.catalog.ids())
        ),
        TerrainSection::Obst(cells) => {
            let mut s = String::from("! Terrain\n");
            let z_min = c.domain.z_min();
            for cell in cells {
                let f = &cell.footprint;
                let id = c.catalog.get(cell.surface).map_or("INERT", |t| t.id.as_str());
                let _ = writeln!(
                    s,
                    "&OBST XB={} SURF_ID='{id}' /",
                    xb(&[f.x_min, f.x_max, f.y_min, f.y_max, z_min, cell.z])
                );
            }
            s
        }
    }
}

pub fn tail(_c: &CaseInputs<'_>) -> String {
    "&TAIL /".to_string()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::Fixture;
    use super::*;
    use crate::error::WindRowError;
    use crate::wind::{WindSample, WindTimeSeries};

    #[test]
    fn test_header_date_and_origin() {
        let fixture = Fixture::new();
        let text = header(&fixture.inputs());
        assert!(text.contains("! Date: <Tue, 05 Mar 2024, 14:07:09>"));
        assert!(text.contains("! UTM CRS: <EPSG:32632 WGS 84 / UTM zone 32N>"));
        assert!(text.contains("! WGS84 origin (lon, lat): <9.0000000, 45.1300000>"));
        assert!(text.contains("! Meshes: <4 of 4 requested>, cell size: <10.000 m>"));
        assert!(text.contains("file: <hill_terrain.bingeom>"));
    }

    #[test]
    fn test_misc_and_time() {
        let fixture = Fixture::new();
        let text = misc(&fixture.inputs());
        assert!(text.contains("&MISC ORIGIN_LAT=45.1300000\n      ORIGIN_LON=9.0000000\n"));
        assert!(text.contains("LEVEL_SET_MODE=4 /"));
        assert!(text.contains("&TIME T_BEGIN=0.0 T_END=3600.0 /"));
    }

    #[test]
    fn test_mesh_block() {
        let fixture = Fixture::new();
        let text = mesh(&fixture.inputs());
        assert!(text.contains("DX=500.000 I_UPPER=1\n"));
        assert!(text.contains("DY=500.000 J_UPPER=1 /"));
        assert!(text.contains("&MESH IJK=50,50,14 MULT_ID='Meshes'"));
        assert!(text.contains("XB=-500.000,0.000,-500.000,0.000,98.000,240.000 /"));
        assert_eq!(boundaries(&fixture.inputs()).lines().count(), 5);
    }

    #[test]
    fn test_wind_ramps_from_default_series() {
        let fixture = Fixture::new();
        let text = wind(&fixture.inputs());
        let ramps: Vec<&str> = text.lines().filter(|l| l.starts_with("&RAMP")).collect();
        assert_eq!(
            ramps,
            vec![
                "&RAMP ID='ws', T=0, F=10.0 /",
                "&RAMP ID='ws', T=600, F=10.0 /",
                "&RAMP ID='ws', T=1200, F=20.0 /",
                "&RAMP ID='wd', T=0, F=315.0 /",
                "&RAMP ID='wd', T=600, F=270.0 /",
                "&RAMP ID='wd', T=1200, F=360.0 /",
            ]
        );
    }

    #[test]
    fn test_rejected_wind_rows_become_comments() {
        let mut fixture = Fixture::new();
        fixture.wind = WindTimeSeries {
            source: WindSource::Default,
            samples: vec![WindSample::new(0.0, 3.0, 90.0)],
            rejected: vec![WindRowError {
                line: 3,
                raw: "x".into(),
                reason: "expected 3 fields, found 1".into(),
            }],
        };
        let text = wind(&fixture.inputs());
        assert!(text.contains("! Wind file row 3 skipped: expected 3 fields, found 1\n"));
        assert_eq!(text.matches("&RAMP").count(), 2);

        fixture.wind.samples.clear();
        let text = wind(&fixture.inputs());
        assert!(!text.contains("&WIND"));
    }

    #[test]
    fn test_ignition_vent() {
        let fixture = Fixture::new();
        let mut inputs = fixture.inputs();
        assert!(ignition(&inputs).contains("XB=45.000,55.000,15.000,25.000,99.000,99.000 /"));
        inputs.ignition = None;
        assert_eq!(ignition(&inputs), "! No ignition point\n");
    }

    #[test]
    fn test_surfaces_and_geom() {
        let fixture = Fixture::new();
        let inputs = fixture.inputs();
        let text = surfaces(&inputs);
        assert!(text.contains("&SURF ID='A01' RGB=255,254,212 VEG_LSET_FUEL_INDEX=1 /\n"));
        assert!(text.contains("&SURF ID='Water' RGB=137,183,221 /\n"));
        assert_eq!(text.matches("&SURF").count(), 19);

        let geom = terrain(&inputs);
        assert!(geom.contains("SURF_ID='A01','A02','A03'"));
        assert!(geom.contains("'Barren','NA'\n"));
        assert!(geom.contains("BINARY_FILE='hill_terrain.bingeom' /"));
    }

    #[test]
    fn test_fire_surfaces_ignite() {
        let mut fixture = Fixture::new();
        fixture.table = fixture.table.with_fire_surfaces();
        let text = surfaces(&fixture.inputs());
        assert_eq!(text.matches("&SURF").count(), 21);
        assert!(text.contains("&SURF ID='Burned' RGB=20,20,20 /\n"));
        assert!(text.contains("&SURF ID='Fire_front' RGB=255,0,0 VEG_LSET_IGNITE_TIME=0.0 /\n"));
        assert!(terrain(&fixture.inputs()).contains("'NA','Burned','Fire_front'\n"));
    }

    #[test]
    fn test_devices_below_domain_top() {
        let fixture = Fixture::new();
        let text = output(&fixture.inputs());
        assert!(text.contains("&SLCF PBX=0.000 QUANTITY='TEMPERATURE' VECTOR=T /"));
        assert!(text.contains("&DEVC ID='Origin_WV' XYZ=0.,0.,239.000 QUANTITY='W-VELOCITY' /"));
    }
}
