use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use terrain2fds_core::{
    export_case, Crs, ExportConfig, ExportInputs, Extent, GeoTransform, GridRaster, Interpolation,
    LanduseCatalog, LanduseLayer, Point2, PolygonLayer, ProjTransformer, RasterSampler, TerrainKind,
    TracingSink, VectorClassifier,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Synthetic DEM and land-use are centred here, in UTM zone 32N.
const CENTER_X: f64 = 500_000.0;
const CENTER_Y: f64 = 5_000_000.0;
const DEM_PIXEL: f64 = 10.0;

/// Export an FDS case over a synthetic hill
#[derive(Parser, Debug)]
#[command(name = "terrain2fds-demo")]
#[command(about = "Compile a synthetic terrain into an FDS level-set case", long_about = None)]
struct Args {
    /// Case identifier
    #[arg(long, default_value = "hill")]
    chid: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Side of the square case extent in meters
    #[arg(long, default_value_t = 2000.0)]
    size: f64,

    /// Hill height above the plain in meters
    #[arg(long, default_value_t = 150.0)]
    relief: f64,

    /// Requested number of mesh blocks
    #[arg(short, long, default_value_t = 4)]
    nmesh: u32,

    /// Cell size in meters
    #[arg(short, long, default_value_t = 10.0)]
    cell_size: f64,

    /// One terrain sample every N DEM pixels
    #[arg(short, long, default_value_t = 1)]
    sampling: u32,

    /// Surface catalog (landfire, categorical)
    #[arg(long, default_value = "landfire")]
    catalog: String,

    /// JSON land-use table, replaces the catalog
    #[arg(long)]
    table: Option<PathBuf>,

    /// Write terrain as OBST blocks instead of a GEOM
    #[arg(long)]
    obst: bool,

    /// Wind CSV (time, speed, direction)
    #[arg(short, long)]
    wind: Option<PathBuf>,

    /// Fire origin offset from the case centre, "dx,dy" in meters
    #[arg(long, value_parser = parse_offset)]
    fire: Option<Point2>,

    /// Side in meters of a burned square around the fire origin
    #[arg(long)]
    burned: Option<f64>,

    /// JSON export configuration; overrides every option above except the layer shape
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_offset(s: &str) -> Result<Point2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected dx,dy, got <{s}>"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("<{v}>: {e}"))
    };
    Ok(Point2::new(parse(x)?, parse(y)?))
}

fn parse_catalog(name: &str) -> Option<LanduseCatalog> {
    match name.to_lowercase().as_str() {
        "landfire" | "fbfm13" => Some(LanduseCatalog::Landfire),
        "categorical" | "cat" => Some(LanduseCatalog::Categorical),
        _ => None,
    }
}

fn build_config(args: &Args) -> Result<ExportConfig, String> {
    if let Some(path) = &args.config {
        info!("Loading configuration from {}", path.display());
        return ExportConfig::from_json_file(path).map_err(|e| e.to_string());
    }
    let landuse_catalog =
        parse_catalog(&args.catalog).ok_or_else(|| format!("unknown catalog <{}>", args.catalog))?;
    let half = args.size / 2.0;
    Ok(ExportConfig {
        chid: args.chid.clone(),
        fds_path: args.out_dir.clone(),
        project_crs: Crs::from_epsg(32632),
        extent: Extent::new(CENTER_X - half, CENTER_X + half, CENTER_Y - half, CENTER_Y + half),
        origin: Some(Point2::new(CENTER_X, CENTER_Y)),
        fire_origin: args
            .fire
            .map(|d| Point2::new(CENTER_X + d.x, CENTER_Y + d.y)),
        nmesh: args.nmesh,
        cell_size: args.cell_size,
        dem_sampling: args.sampling,
        landuse_catalog,
        landuse_type_filepath: args.table.clone(),
        wind_filepath: args.wind.clone(),
        terrain_kind: if args.obst {
            TerrainKind::Obst
        } else {
            TerrainKind::Geom
        },
        ..ExportConfig::default()
    })
}

/// DEM one pixel wider than the case on every side, a gaussian hill on a plain.
fn synthetic_dem(size: f64, relief: f64) -> GridRaster {
    let pixels = (size / DEM_PIXEL).ceil() as usize + 2;
    let half = pixels as f64 * DEM_PIXEL / 2.0;
    let transform = GeoTransform::new(CENTER_X - half, CENTER_Y + half, DEM_PIXEL, DEM_PIXEL);
    let spread = (size / 4.0).powi(2);
    GridRaster::from_fn(Crs::from_epsg(32632), transform, pixels, pixels, |p| {
        let r2 = (p.x - CENTER_X).powi(2) + (p.y - CENTER_Y).powi(2);
        Some(100.0 + relief * (-r2 / (2.0 * spread)).exp())
    })
    .with_interpolation(Interpolation::Bilinear)
}

/// Land-use codes in 200 m bands: grass, timber litter, shrub, urban.
fn synthetic_landuse(dem: &GridRaster, catalog: LanduseCatalog) -> GridRaster {
    let codes: [f64; 4] = match catalog {
        LanduseCatalog::Landfire => [1.0, 8.0, 5.0, 91.0],
        LanduseCatalog::Categorical => [5.0, 1.0, 2.0, 3.0],
    };
    GridRaster::from_fn(
        Crs::from_epsg(32632),
        dem.geo_transform(),
        dem.ncols(),
        dem.nrows(),
        |p| {
            let band = ((p.x - CENTER_X).abs() / 200.0) as usize;
            Some(codes[band % codes.len()])
        },
    )
}

/// Burned square of side `side` centred on the fire origin, in UTM zone 32N.
fn burned_area(center: Point2, side: f64) -> PolygonLayer {
    let h = side / 2.0;
    let ring = vec![
        Point2::new(center.x - h, center.y - h),
        Point2::new(center.x + h, center.y - h),
        Point2::new(center.x + h, center.y + h),
        Point2::new(center.x - h, center.y + h),
    ];
    PolygonLayer::new(Crs::from_epsg(32632)).with_polygon(ring, 0)
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dem = synthetic_dem(args.size, args.relief);
    let landuse = synthetic_landuse(&dem, config.landuse_catalog);
    let burned = args.burned.map(|side| {
        let offset = args.fire.unwrap_or_else(Point2::origin);
        burned_area(Point2::new(CENTER_X + offset.x, CENTER_Y + offset.y), side)
    });
    let transformer = ProjTransformer::new();
    let inputs = ExportInputs {
        dem: &dem,
        landuse: Some(LanduseLayer::Raster(&landuse)),
        fire: burned.as_ref().map(|layer| layer as &dyn VectorClassifier),
        transformer: &transformer,
    };

    match export_case(&inputs, &config, &TracingSink) {
        Ok(summary) => {
            println!("\n=== Export complete ===");
            println!("Case:      {}", summary.fds_file.display());
            if let Some(path) = &summary.bingeom_file {
                println!("Terrain:   {}", path.display());
            }
            println!("CRS:       {} {}", summary.utm_crs.authid(), summary.utm_crs.description());
            println!(
                "Meshes:    {} x {} (requested {})",
                summary.domain.nmesh_x, summary.domain.nmesh_y, config.nmesh
            );
            println!("Cells:     {}", summary.domain.cell_count());
            println!(
                "Geometry:  {} vertices, {} faces",
                summary.vertex_count, summary.face_count
            );
            if summary.fire_cells > 0 {
                println!("Fire:      {} cells burned or burning", summary.fire_cells);
            }
            if summary.rejected_wind_rows > 0 {
                println!("Wind:      {} rows skipped", summary.rejected_wind_rows);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Export failed: {e}");
            ExitCode::FAILURE
        }
    }
}
