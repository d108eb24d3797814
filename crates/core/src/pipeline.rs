//! Case export orchestrator
//!
//! Runs every stage in order, checking for cancellation between stages.
//! All configuration and data errors are raised before the first file is
//! written; the bingeom is written before the deck that references it.

use crate::bingeom;
use crate::case::{bingeom_filename, generate_case, CaseInputs, TerrainSection};
use crate::config::{ExportConfig, TerrainKind};
use crate::core_types::{Crs, Point2};
use crate::domain::{size_domain, DomainSpec};
use crate::error::{ExportError, Result};
use crate::geo::{CrsTransformer, LanduseLayer, RasterSampler, VectorClassifier};
use crate::ignition::IgnitionSpec;
use crate::io::write_atomically;
use crate::landuse::sample_fire_layer;
use crate::progress::ProgressSink;
use crate::terrain::{ElevationSampler, SamplingGrid, TerrainGrid};
use crate::wind::WindTimeSeries;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Host layers and services for one export.
#[derive(Clone, Copy)]
pub struct ExportInputs<'a> {
    /// Elevation raster
    pub dem: &'a dyn RasterSampler,
    /// Land-use layer; every face gets the fallback surface without one
    pub landuse: Option<LanduseLayer<'a>>,
    /// Burned areas and fire fronts overriding the land use
    pub fire: Option<&'a dyn VectorClassifier>,
    pub transformer: &'a dyn CrsTransformer,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub fds_file: PathBuf,
    /// `None` for OBST terrain
    pub bingeom_file: Option<PathBuf>,
    pub utm_crs: Crs,
    pub vertex_count: usize,
    pub face_count: usize,
    pub domain: DomainSpec,
    pub rejected_wind_rows: usize,
    /// Terrain cells whose surface the fire layer set
    pub fire_cells: usize,
}

impl ExportSummary {
    /// Mesh blocks actually declared.
    pub fn mesh_count(&self) -> u32 {
        self.domain.mesh_count()
    }
}

fn checkpoint(sink: &dyn ProgressSink, stage: &'static str) -> Result<()> {
    if sink.is_cancelled() {
        warn!(stage, "Export cancelled");
        return Err(ExportError::Cancelled(stage));
    }
    sink.info(&format!("{stage}..."));
    Ok(())
}

/// Export the FDS case described by `config` from the host layers.
///
/// # Errors
/// Any [`ExportError`]; on error no output file has been written, except
/// when writing the deck itself fails after the terrain file was written.
pub fn export_case(
    inputs: &ExportInputs<'_>,
    config: &ExportConfig,
    sink: &dyn ProgressSink,
) -> Result<ExportSummary> {
    let result = run(inputs, config, sink);
    if let Err(e) = &result {
        sink.info(&format!("Export failed: {e}"));
    }
    result
}

fn run(
    inputs: &ExportInputs<'_>,
    config: &ExportConfig,
    sink: &dyn ProgressSink,
) -> Result<ExportSummary> {
    let t = inputs.transformer;
    let dem = inputs.dem;

    checkpoint(sink, "Checking parameters")?;
    config.validate()?;
    let mut table = config.landuse_table()?;
    if inputs.fire.is_some() {
        table = table.with_fire_surfaces();
    }

    checkpoint(sink, "Computing origins")?;
    let project_crs = config.project_crs;
    let origin = config.origin_or_center();
    let wgs84_origin = t.transform_point(origin, project_crs, Crs::WGS84)?;
    let utm_crs = Crs::utm_for_lonlat(wgs84_origin.x, wgs84_origin.y);
    let utm_origin = t.transform_point(origin, project_crs, utm_crs)?;
    let fire_origin = config
        .fire_origin
        .map(|p| t.transform_point(p, project_crs, utm_crs))
        .transpose()?;
    sink.info(&format!(
        "Case CRS <{} {}>, origin <{:.1}, {:.1}>",
        utm_crs.authid(),
        utm_crs.description(),
        utm_origin.x,
        utm_origin.y
    ));

    checkpoint(sink, "Computing extents")?;
    let utm_extent = t.transform_extent(&config.extent, project_crs, utm_crs)?;
    let dem_extent = t.transform_extent(&utm_extent, utm_crs, dem.crs())?;
    let grid = SamplingGrid::aligned(&dem_extent, &dem.geo_transform(), config.dem_sampling)?;
    if !dem.extent().contains(&grid.extent) {
        warn!(
            "Terrain extent exceeds the DEM, missing elevations are filled from the nearest sample"
        );
    }
    sink.info(&format!(
        "Sampling grid <{} x {}> cells of <{} x {}>, DEM CRS <{}>",
        grid.nx,
        grid.ny,
        grid.dx,
        grid.dy,
        dem.crs().authid()
    ));

    checkpoint(sink, "Sampling DEM layer")?;
    let centers = grid.centers();
    let sampled = ElevationSampler::new(dem).sample(&centers, sink)?;
    let center_z: Vec<f64> = sampled.iter().map(|p| p.z).collect();

    checkpoint(sink, "Sampling landuse layer")?;
    let cell_surfaces = match inputs.landuse {
        Some(layer) => {
            let points = t.transform_points(&centers, dem.crs(), layer.crs())?;
            let codes: Vec<Option<i64>> = points.iter().map(|&p| layer.code_at(p)).collect();
            table.classify_all(&codes)
        }
        None => {
            sink.info("No landuse layer provided, fallback surface everywhere");
            vec![table.fallback(); centers.len()]
        }
    };

    checkpoint(sink, "Building terrain")?;
    let corners: Vec<Point2> = t
        .transform_points(&grid.corners(), dem.crs(), utm_crs)?
        .into_iter()
        .map(|p| Point2::from(p - utm_origin))
        .collect();
    let mut terrain = TerrainGrid::new(grid.nx, grid.ny, corners, center_z, cell_surfaces)?;
    let z_range = terrain.z_range().ok_or(ExportError::EmptyDem(0))?;
    debug!(nx = terrain.nx(), ny = terrain.ny(), "Terrain grid built");

    let mut fire_cells = 0;
    if let (Some(layer), Some(fire)) = (inputs.fire, table.fire_surfaces()) {
        checkpoint(sink, "Sampling fire layer")?;
        let centers: Vec<Point2> = terrain
            .cell_centers()
            .into_iter()
            .map(|p| p + utm_origin.coords)
            .collect();
        // One sampling step around each feature is the fire front
        let cells = sample_fire_layer(layer, &centers, utm_crs, terrain.cell_spacing(), t)?;
        let surface_count = table.catalog().len();
        let overrides: Vec<Option<usize>> =
            cells.iter().map(|c| c.surface(fire, surface_count)).collect();
        fire_cells = terrain.apply_surface_overrides(&overrides)?;
        sink.info(&format!("<{fire_cells}> terrain cells set from the fire layer"));
    }

    checkpoint(sink, "Sizing domain")?;
    let domain = size_domain(
        &utm_extent.relative_to(utm_origin),
        z_range,
        config.nmesh,
        config.cell_size,
    )?;
    if domain.mesh_count() < config.nmesh {
        warn!(
            requested = config.nmesh,
            actual = domain.mesh_count(),
            "Fewer mesh blocks than requested"
        );
    }
    sink.info(&format!(
        "Domain of <{} x {}> meshes, <{}> cells",
        domain.nmesh_x,
        domain.nmesh_y,
        domain.cell_count()
    ));

    checkpoint(sink, "Placing ignition")?;
    let ignition =
        fire_origin.map(|p| IgnitionSpec::place(p, utm_origin, config.cell_size, &domain));

    checkpoint(sink, "Reading wind")?;
    let wind = WindTimeSeries::load(config.wind_filepath.as_deref())?;
    if !wind.rejected.is_empty() {
        sink.info(&format!(
            "<{}> wind rows skipped, see the deck comments",
            wind.rejected.len()
        ));
    }

    checkpoint(sink, "Generating case")?;
    let bingeom_name = bingeom_filename(&config.chid);
    let surface_count = table.catalog().len();
    let (terrain_bytes, vertex_count, face_count, obst_cells) = match config.terrain_kind {
        TerrainKind::Geom => {
            let mesh = terrain.to_mesh()?;
            let bytes = bingeom::encode(&mesh, surface_count)?;
            (Some(bytes), mesh.vertex_count(), mesh.face_count(), Vec::new())
        }
        TerrainKind::Obst => (None, 0, 0, terrain.obst_cells()),
    };
    let terrain_section = match config.terrain_kind {
        TerrainKind::Geom => TerrainSection::Geom {
            filename: &bingeom_name,
            vertex_count,
            face_count,
        },
        TerrainKind::Obst => TerrainSection::Obst(&obst_cells),
    };
    let case_inputs = CaseInputs {
        chid: &config.chid,
        generated_at: chrono::Local::now().naive_local(),
        utm_crs,
        utm_origin,
        wgs84_origin,
        utm_extent,
        level_set_mode: config.level_set_mode,
        t_begin: config.t_begin,
        t_end: config.t_end,
        domain: &domain,
        ignition: ignition.as_ref(),
        wind: &wind,
        catalog: table.catalog(),
        terrain: terrain_section,
    };
    let text = generate_case(&case_inputs);

    checkpoint(sink, "Writing files")?;
    let bingeom_file = match terrain_bytes {
        Some(bytes) => {
            let path = config.bingeom_file();
            write_atomically(&path, &bytes)?;
            sink.info(&format!("Terrain written to <{}>", path.display()));
            Some(path)
        }
        None => None,
    };
    let fds_file = config.fds_file();
    write_atomically(&fds_file, text.as_bytes())?;
    sink.info(&format!("Case written to <{}>", fds_file.display()));

    info!(
        chid = %config.chid,
        meshes = domain.mesh_count(),
        vertices = vertex_count,
        faces = face_count,
        "Case exported"
    );
    Ok(ExportSummary {
        fds_file,
        bingeom_file,
        utm_crs,
        vertex_count,
        face_count,
        domain,
        rejected_wind_rows: wind.rejected.len(),
        fire_cells,
    })
}
