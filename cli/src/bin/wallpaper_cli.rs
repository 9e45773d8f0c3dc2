use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cli::SceneConfig;
use color_eyre::eyre::{Result, eyre};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};
use wallmask::{
    SimulatorConfig, WallMap,
    algorithms::DetectorKind,
    compositor,
    pipeline::builder::DetectionPipelineBuilder,
    pricing::{CatalogSource, PriceEstimate, StaticCatalog, fetch_catalog_or_empty},
    service::{DetectionResponse, detect_in_background},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite a scene (photo, walls, patterns) into a PNG
    Render {
        /// Path to the TOML or JSON scene file
        #[arg(short, long)]
        scene: PathBuf,
        /// Override the scene's output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Detect wall outlines from a segmentation mask
    Detect {
        /// Grayscale mask image, white = wall
        #[arg(short, long)]
        mask: PathBuf,
        /// Output file: .geojson for GeoJSON, anything else for JSON polygons
        #[arg(short, long)]
        output: PathBuf,
        /// Photo width the outlines are reported in (defaults to the mask's)
        #[arg(long)]
        native_width: Option<u32>,
        /// Photo height the outlines are reported in (defaults to the mask's)
        #[arg(long)]
        native_height: Option<u32>,
        /// column_scan, centroid_raycast, moore_trace or border_following
        #[arg(long)]
        strategy: Option<DetectorKind>,
        /// Report each connected wall region separately
        #[arg(long)]
        multi: bool,
        /// Douglas-Peucker tolerance in working pixels
        #[arg(long)]
        simplify: Option<f32>,
        #[arg(long, default_value = "127")]
        threshold: u8,
        /// TOML or JSON simulator config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Estimate the price of papering a wall
    Estimate {
        /// Wall width in metres
        #[arg(long)]
        width: f64,
        /// Wall height in metres
        #[arg(long)]
        height: f64,
        /// Catalog id; all papers are listed when omitted
        #[arg(long)]
        paper: Option<String>,
        /// TOML or JSON simulator config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the JSON schema of the simulator config or scene file
    Schema {
        #[arg(long)]
        scene: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { scene, output } => render(&scene, output.as_deref())?,
        Commands::Detect {
            mask,
            output,
            native_width,
            native_height,
            strategy,
            multi,
            simplify,
            threshold,
            config,
        } => {
            let config = load_config(config)?;
            let options = DetectOptions {
                native: native_width.zip(native_height),
                strategy,
                multi,
                simplify,
                threshold,
            };
            detect(&mask, &output, &config, options).await?;
        }
        Commands::Estimate {
            width,
            height,
            paper,
            config,
        } => estimate(width, height, paper.as_deref(), &load_config(config)?)?,
        Commands::Schema { scene } => {
            let schema = if scene {
                serde_json::to_string_pretty(&schemars::schema_for!(SceneConfig))?
            } else {
                serde_json::to_string_pretty(&SimulatorConfig::schema())?
            };
            println!("{schema}");
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<SimulatorConfig> {
    Ok(match path {
        Some(path) => SimulatorConfig::from_file(path)?,
        None => SimulatorConfig::default(),
    })
}

fn render(scene_path: &Path, output: Option<&Path>) -> Result<()> {
    let scene = SceneConfig::from_file(scene_path)?;
    let photo = scene.load_photo()?;
    let (width, height) = photo.dimensions();
    let session = scene.to_session(width, height)?;
    let patterns = scene.load_patterns();
    info!(walls = session.walls().len(), width, height, "Rendering scene");

    let frame = session.render(&photo, &patterns, &scene.simulator.shadow);
    let frame = match scene.split_x {
        Some(split) if scene.simulator.features.before_after => {
            compositor::present(&frame, &photo, &session.view, (width, height), Some(split))
        }
        Some(_) => {
            warn!("split_x ignored, before/after is disabled");
            frame
        }
        None => frame,
    };

    let output = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(&scene.output));
    frame.save(&output)?;
    for summary in session.summary() {
        info!(
            wall = %summary.name,
            points = summary.point_count,
            strokes = summary.stroke_count,
            covered = summary.coverage_area,
            has_pattern = summary.has_pattern,
            "Wall"
        );
    }
    info!("Composite written to {}", output.display());
    Ok(())
}

struct DetectOptions {
    native: Option<(u32, u32)>,
    strategy: Option<DetectorKind>,
    multi: bool,
    simplify: Option<f32>,
    threshold: u8,
}

async fn detect(mask_path: &Path, output: &Path, config: &SimulatorConfig, options: DetectOptions) -> Result<()> {
    if !config.features.auto_detect {
        return Err(eyre!("Automatic detection is disabled in the config"));
    }
    let mask = image::open(mask_path)?.to_luma8();
    let native = options.native.unwrap_or(mask.dimensions());
    let map = WallMap::from_mask(&mask, options.threshold).to_working_resolution(config.detection.working_size);

    let mut builder = DetectionPipelineBuilder::from_config(&config.detection)
        .multi_wall(options.multi && config.features.multi_wall);
    if let Some(strategy) = options.strategy {
        builder = builder.set_strategy(strategy);
    }
    if let Some(tolerance) = options.simplify {
        builder = builder.with_simplification(tolerance);
    }
    let pipeline = Arc::new(builder.build());
    info!("{}", pipeline.info());

    let result = detect_in_background(pipeline, map, native).await?;
    if result.is_empty() {
        warn!("No wall found, please mask the wall manually");
    }

    let is_geojson = output.extension().and_then(|e| e.to_str()) == Some("geojson");
    if is_geojson {
        result.save_geojson(output)?;
    } else {
        let response = DetectionResponse::from(result.clone());
        std::fs::write(output, serde_json::to_string_pretty(&response)?)?;
    }
    info!(walls = result.walls.len(), "Outlines written to {}", output.display());
    Ok(())
}

fn estimate(width: f64, height: f64, paper: Option<&str>, config: &SimulatorConfig) -> Result<()> {
    if !config.features.budget {
        return Err(eyre!("Budget estimates are disabled in the config"));
    }
    let catalog = StaticCatalog::sample();
    let items = match paper {
        Some(id) => vec![
            catalog
                .find(id)
                .cloned()
                .ok_or_else(|| eyre!("Unknown paper '{id}'"))?,
        ],
        None => fetch_catalog_or_empty(&catalog as &dyn CatalogSource),
    };
    for item in items {
        match PriceEstimate::for_item(width, height, &item) {
            Some(estimate) => println!(
                "{:<10} {:<24} {:>8.2}/m2  {:>6.2} m2  {:>10.2}",
                item.id, item.name, item.price_per_area, estimate.area, estimate.total_price
            ),
            None => return Err(eyre!("Width and height must be positive")),
        }
    }
    Ok(())
}
