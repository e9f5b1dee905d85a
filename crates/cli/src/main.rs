//! floodsar CLI - SAR flood detection, forecasting and impact analysis

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use floodsar_algorithms::analysis::{AnalysisConfig, FloodAnalysis, FloodPixelStats};
use floodsar_algorithms::classification::WaterClassifier;
use floodsar_algorithms::hydrology::{low_lying_areas, terrain_summary, PropagationSimulator, TerrainStats};
use floodsar_algorithms::imagery::TrainingPolicy;
use floodsar_algorithms::impact::{annotate_buildings, parse_buildings, Building, ImpactSummary};
use floodsar_algorithms::prediction::{PrecipitationStats, RiskPredictor};
use floodsar_core::io::{read_geotiff, write_geotiff, write_mask};
use floodsar_core::{BoundingBox, Mask, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "floodsar")]
#[command(author, version, about = "SAR flood detection and nowcasting", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Analysis configuration (TOML); missing keys keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Detect new flooding between two SAR acquisitions
    Detect {
        /// Pre-event backscatter (dB)
        before: PathBuf,
        /// Post-event backscatter (dB)
        after: PathBuf,
        /// DEM co-registered with the SAR rasters
        #[arg(short, long)]
        dem: Option<PathBuf>,
        /// Classifier parameters to load before detection
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Keep the loaded/previous classifier instead of refitting per scene
        #[arg(long)]
        pretrained: bool,
        /// Where to save the fitted classifier
        #[arg(long)]
        save_model: Option<PathBuf>,
        /// Output flood mask (GeoTIFF, 0/1)
        #[arg(long)]
        mask: Option<PathBuf>,
        /// Output depth raster (GeoTIFF, meters)
        #[arg(long)]
        depth: Option<PathBuf>,
        /// Output flood polygons (GeoJSON)
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Buildings (GeoJSON, Overpass JSON or a JSON array)
        #[arg(short, long)]
        buildings: Option<PathBuf>,
        /// Output report (JSON); printed when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Predict flood risk from precipitation and terrain
    Predict {
        /// Area of interest: minLon,minLat,maxLon,maxLat
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,
        /// Mean precipitation over the horizon (mm)
        #[arg(long, default_value = "0")]
        precip_mean: f64,
        /// Peak precipitation (mm)
        #[arg(long, default_value = "0")]
        precip_max: f64,
        /// Precipitation comes from observations rather than a simulation
        #[arg(long)]
        measured: bool,
        /// DEM used to derive terrain statistics
        #[arg(short, long)]
        dem: Option<PathBuf>,
        /// Prediction horizon in hours
        #[arg(long, default_value = "6")]
        horizon: f64,
        /// Buildings to rank for evacuation
        #[arg(short, long)]
        buildings: Option<PathBuf>,
        /// Output risk zones (GeoJSON)
        #[arg(long)]
        zones: Option<PathBuf>,
        /// Output report (JSON); printed when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Flag buildings that fall inside a flood mask
    Impact {
        /// Flood mask (GeoTIFF, non-zero = flooded)
        mask: PathBuf,
        /// Buildings (GeoJSON, Overpass JSON or a JSON array)
        buildings: PathBuf,
        /// Output report (JSON); printed when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize a DEM for flood risk
    Terrain {
        /// Input DEM file
        dem: PathBuf,
        /// Percentile defining low-lying cells
        #[arg(short, long, default_value = "10")]
        percentile: f64,
    },
}

// ─── Reports ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DetectReport<'a> {
    statistics: &'a FloodPixelStats,
    water_level_m: Option<f64>,
    forecast: ForecastReport,
    features: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    buildings: Option<BuildingReport>,
}

/// Forecast extent with the simulator's limitation attached.
#[derive(Serialize)]
struct ForecastReport {
    pixels: usize,
    note: &'static str,
}

impl ForecastReport {
    fn new(forecast: &Mask) -> Self {
        Self {
            pixels: forecast.count(),
            note: PropagationSimulator::LIMITATION,
        }
    }
}

#[derive(Serialize)]
struct BuildingReport {
    summary: ImpactSummary,
    flooded: Vec<Building>,
}

impl BuildingReport {
    fn new(annotated: Vec<Building>, summary: ImpactSummary) -> Self {
        Self {
            summary,
            flooded: annotated.into_iter().filter(|b| b.flooded).collect(),
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    info!("Config: {}", path.display());
    Ok(config)
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...")?;
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_mask(path: &Path) -> Result<Mask> {
    let raster: Raster<u8> = read_geotiff(path)
        .with_context(|| format!("Failed to read mask {}", path.display()))?;
    let mut mask = Mask::from_array(raster.data().mapv(|v| v != 0));
    mask.set_transform(*raster.transform());
    Ok(mask)
}

fn read_buildings(path: &Path) -> Result<Vec<Building>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read buildings {}", path.display()))?;
    let buildings = parse_buildings(&text).context("Failed to parse buildings")?;
    info!("Buildings: {}", buildings.len());
    Ok(buildings)
}

fn parse_bbox(s: &str) -> Result<BoundingBox> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid bbox '{}'", s))?;
    let bbox = BoundingBox::from_slice(&values)?;
    if bbox.is_degenerate() {
        bail!("Degenerate bbox '{}'", s);
    }
    Ok(bbox)
}

fn write_text(text: &str, path: &Path) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn emit_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            write_text(&text, path)?;
            println!("Report saved to: {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn done(name: &str, elapsed: std::time::Duration) {
    println!("{} finished", name);
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn info_command(input: &Path) -> Result<()> {
    let raster = read_raster(input)?;
    let (rows, cols) = raster.shape();
    let bbox = raster.bbox();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {}", raster.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
    );
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

struct DetectArgs {
    before: PathBuf,
    after: PathBuf,
    dem: Option<PathBuf>,
    model: Option<PathBuf>,
    pretrained: bool,
    save_model: Option<PathBuf>,
    mask: Option<PathBuf>,
    depth: Option<PathBuf>,
    geojson: Option<PathBuf>,
    buildings: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn detect_command(mut config: AnalysisConfig, args: DetectArgs) -> Result<()> {
    if args.pretrained {
        config.change.training = TrainingPolicy::Pretrained;
    }
    let classifier = match &args.model {
        Some(path) => WaterClassifier::load(path, config.classifier.clone())
            .with_context(|| format!("Failed to load classifier {}", path.display()))?,
        None => WaterClassifier::new(config.classifier.clone()),
    };
    if args.model.is_some() && config.change.training == TrainingPolicy::PerRequest {
        warn!("Loaded classifier will be refit on this scene; pass --pretrained to keep it");
    }
    let analysis = FloodAnalysis::new(Arc::new(classifier), config);

    let before = read_raster(&args.before)?;
    let after = read_raster(&args.after)?;
    let dem = args.dem.as_deref().map(read_raster).transpose()?;

    let start = Instant::now();
    let pb = spinner("Analyzing flood...")?;
    let report = analysis
        .run(&before, &after, dem.as_ref())
        .context("Flood analysis failed")?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if let Some(path) = &args.mask {
        write_mask(&report.mask, path).context("Failed to write mask")?;
        println!("Flood mask saved to: {}", path.display());
    }
    if let Some(path) = &args.depth {
        write_geotiff(&report.depth.depth, path).context("Failed to write depth")?;
        println!("Depth saved to: {}", path.display());
    }
    if let Some(path) = &args.geojson {
        write_text(&report.features.to_geojson_string(), path)?;
        println!("Flood polygons saved to: {}", path.display());
    }
    if let Some(path) = &args.save_model {
        analysis.classifier().save(path).context("Failed to save classifier")?;
        println!("Classifier saved to: {}", path.display());
    }

    let buildings = match &args.buildings {
        Some(path) => {
            let buildings = read_buildings(path)?;
            let (annotated, summary) = analysis.impact(&report, &buildings);
            Some(BuildingReport::new(annotated, summary))
        }
        None => None,
    };

    done("Flood detection", elapsed);
    emit_json(
        &DetectReport {
            statistics: &report.stats,
            water_level_m: report.depth.water_level_m,
            forecast: ForecastReport::new(&report.forecast),
            features: report.features.len(),
            buildings,
        },
        args.output.as_deref(),
    )
}

#[allow(clippy::too_many_arguments)]
fn predict_command(
    config: &AnalysisConfig,
    bbox: &str,
    precip: PrecipitationStats,
    dem: Option<&Path>,
    horizon: f64,
    buildings: Option<&Path>,
    zones: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let bbox = parse_bbox(bbox)?;
    let terrain = match dem {
        Some(path) => terrain_summary(&read_raster(path)?).context("Failed to summarize terrain")?,
        None => {
            info!("No DEM given, using default lowland terrain");
            TerrainStats::default()
        }
    };
    let buildings = buildings.map(read_buildings).transpose()?.unwrap_or_default();

    let predictor = RiskPredictor::new(config.nowcast.clone());
    let report = predictor.nowcast(&bbox, &precip, &terrain, horizon, &buildings, &config.evacuation);

    if let Some(path) = zones {
        write_text(&report.risk_zones.to_geojson_string(), path)?;
        println!("Risk zones saved to: {}", path.display());
    }

    let center = bbox.center();
    emit_json(
        &serde_json::json!({
            "bbox": bbox.to_array(),
            "center": [center.0, center.1],
            "prediction": report.prediction,
            "precipitation": precip,
            "terrain": terrain,
            "evacuation": report.evacuation,
        }),
        output,
    )
}

fn impact_command(mask: &Path, buildings: &Path, output: Option<&Path>) -> Result<()> {
    let mask = read_mask(mask)?;
    let buildings = read_buildings(buildings)?;
    let annotated = annotate_buildings(&buildings, &mask);
    let summary = ImpactSummary::from_buildings(&annotated);
    info!(
        "Flooded buildings: {} of {}",
        summary.flooded_buildings, summary.total_buildings
    );
    emit_json(&BuildingReport::new(annotated, summary), output)
}

fn terrain_command(dem: &Path, percentile: f64) -> Result<()> {
    let dem = read_raster(dem)?;
    let start = Instant::now();
    let summary = terrain_summary(&dem).context("Failed to summarize terrain")?;
    let low = low_lying_areas(&dem, percentile).context("Failed to find low-lying areas")?;
    done("Terrain summary", start.elapsed());
    emit_json(
        &serde_json::json!({
            "terrain": summary,
            "low_lying": low,
            "percentile": percentile,
        }),
        None,
    )
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { input } => info_command(&input),

        Commands::Detect {
            before,
            after,
            dem,
            model,
            pretrained,
            save_model,
            mask,
            depth,
            geojson,
            buildings,
            output,
        } => detect_command(
            config,
            DetectArgs {
                before,
                after,
                dem,
                model,
                pretrained,
                save_model,
                mask,
                depth,
                geojson,
                buildings,
                output,
            },
        ),

        Commands::Predict {
            bbox,
            precip_mean,
            precip_max,
            measured,
            dem,
            horizon,
            buildings,
            zones,
            output,
        } => predict_command(
            &config,
            &bbox,
            PrecipitationStats {
                mean_mm: precip_mean,
                max_mm: precip_max,
                is_simulated: !measured,
            },
            dem.as_deref(),
            horizon,
            buildings.as_deref(),
            zones.as_deref(),
            output.as_deref(),
        ),

        Commands::Impact {
            mask,
            buildings,
            output,
        } => impact_command(&mask, &buildings, output.as_deref()),

        Commands::Terrain { dem, percentile } => terrain_command(&dem, percentile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("17.0, 51.0,17.1,51.1").unwrap();
        assert_eq!(bbox.min_lon, 17.0);
        assert_eq!(bbox.max_lat, 51.1);
        assert!(parse_bbox("17.0,51.0,17.1").is_err());
        assert!(parse_bbox("a,b,c,d").is_err());
        assert!(parse_bbox("1,1,1,2").is_err());
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("floodsar.toml");
        std::fs::write(
            &path,
            "critical_depth_m = 2.0\n\n[propagation]\nsteps = 5\n\n[change]\ntraining = \"pretrained\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.critical_depth_m, 2.0);
        assert_eq!(config.propagation.steps, 5);
        assert_eq!(config.change.training, TrainingPolicy::Pretrained);
        assert_eq!(config.pixel_area_km2, 0.0001);
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.propagation.steps, 3);
    }

    #[test]
    fn test_forecast_report_carries_limitation() {
        let mut forecast = Mask::new(6, 6);
        forecast.fill_rect(1..3, 1..4);
        let json = serde_json::to_value(ForecastReport::new(&forecast)).unwrap();
        assert_eq!(json["pixels"], 6);
        assert_eq!(json["note"], PropagationSimulator::LIMITATION);
    }

    #[test]
    fn test_read_mask_nonzero_is_flooded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.tif");
        let mut mask = Mask::new(4, 5).with_bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        mask.fill_rect(1..3, 2..4);
        write_mask(&mask, &path).unwrap();

        let back = read_mask(&path).unwrap();
        assert_eq!(back.data(), mask.data());
        assert_eq!(back.count(), 4);
    }
}
