//cargo run --package wallmask --bin wallmask_demo
use std::sync::Arc;

use image::{GrayImage, Luma, Rgba, RgbaImage};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wallmask::{
    algorithms::DetectorKind,
    compositor::PatternLibrary,
    config::SimulatorConfig,
    interaction::{ActiveTool, EditMode, InteractionController},
    io::walls_to_geojson,
    manager::WallMaskCommand,
    pipeline::builder::DetectionPipelineBuilder,
    pricing::{StaticCatalog, fetch_catalog_or_empty},
    segmentation::WallMap,
    service::detect_in_background,
    session::PhotoRef,
    types::Point,
};

const PHOTO_W: u32 = 800;
const PHOTO_H: u32 = 600;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Wall mask demo");
    println!("==============");

    demo_commands()?;
    demo_strategies()?;
    demo_session().await?;

    println!("Generated files: demo_*.geojson, demo_*.png");
    Ok(())
}

/// A photo-like gradient with a darker floor band.
fn synthetic_photo() -> RgbaImage {
    RgbaImage::from_fn(PHOTO_W, PHOTO_H, |x, y| {
        if y > PHOTO_H * 3 / 4 {
            Rgba([90, 70, 50, 255])
        } else {
            let shade = 200 - (x * 40 / PHOTO_W) as u8;
            Rgba([shade, shade, shade - 10, 255])
        }
    })
}

/// Wall region with a doorway cut out, at classifier resolution.
fn synthetic_segmentation() -> GrayImage {
    GrayImage::from_fn(256, 256, |x, y| {
        let wall = y < 190 && (12..244).contains(&x);
        let doorway = (150..200).contains(&x) && y > 90;
        if wall && !doorway { Luma([230]) } else { Luma([10]) }
    })
}

fn stripes() -> RgbaImage {
    RgbaImage::from_fn(40, 40, |x, _| {
        if x < 20 {
            Rgba([180, 40, 60, 255])
        } else {
            Rgba([240, 220, 200, 255])
        }
    })
}

fn demo_commands() -> color_eyre::Result<()> {
    println!("\nDetection commands");
    println!("------------------");
    for (i, name) in WallMaskCommand::command_names().iter().enumerate() {
        println!("   {}. {}", i + 1, name);
    }
    let command = WallMaskCommand::DetectWithSimplification { tolerance: 1.5 };
    let json = serde_json::to_string(&command)?;
    let parsed: WallMaskCommand = serde_json::from_str(&json)?;
    println!("   {} -> {} -> {}", command, json, parsed);
    Ok(())
}

fn demo_strategies() -> color_eyre::Result<()> {
    println!("\nBoundary strategies");
    println!("-------------------");
    let map = WallMap::from_mask(&synthetic_segmentation(), 127);
    for name in DetectorKind::names() {
        let kind: DetectorKind = name.parse()?;
        let pipeline = DetectionPipelineBuilder::new().set_strategy(kind).build();
        let result = pipeline.process(&map, (PHOTO_W, PHOTO_H))?;
        let points: usize = result.walls.iter().map(|w| w.points.len()).sum();
        println!("   {:<18} {} wall(s), {} points", name, result.walls.len(), points);
        result.save_geojson(format!("demo_{name}.geojson"))?;
    }
    Ok(())
}

async fn demo_session() -> color_eyre::Result<()> {
    println!("\nSession");
    println!("-------");
    let config = SimulatorConfig::default();
    let pipeline = Arc::new(DetectionPipelineBuilder::from_config(&config.detection).build());
    let mut controller = InteractionController::new(config.clone());
    controller.replace_photo(PhotoRef {
        source: "synthetic".into(),
        width: PHOTO_W,
        height: PHOTO_H,
    });

    let ticket = controller.request_detection()?;
    let map = WallMap::from_mask(&synthetic_segmentation(), 127).to_working_resolution(config.detection.working_size);
    let result = detect_in_background(pipeline, map, (PHOTO_W, PHOTO_H)).await?;
    let outcome = controller.complete_detection(ticket, result)?;
    info!(?outcome, "Detection applied");

    // refine with the brush: give back a strip the detector missed
    controller.set_mode(EditMode::Masking)?;
    controller.set_tool(ActiveTool::BrushAdd)?;
    controller.set_brush_radius(30.0);
    controller.pointer_down(Point::new(60.0, 470.0))?;
    controller.pointer_move(Point::new(300.0, 470.0));
    controller.pointer_up(Point::new(500.0, 470.0));
    controller.set_mode(EditMode::View)?;

    let mut patterns = PatternLibrary::new();
    patterns.insert("stripes", stripes());
    controller.session_mut().global.pattern_id = Some("stripes".into());

    let photo = synthetic_photo();
    controller.render(&photo, &patterns).save("demo_composite.png")?;
    controller
        .present(&photo, &patterns, (PHOTO_W, PHOTO_H))
        .save("demo_before_after.png")?;

    let session = controller.session();
    for summary in session.summary() {
        println!(
            "   {} ({}): {} points, {} strokes, {:.0} px covered",
            summary.name, summary.id, summary.point_count, summary.stroke_count, summary.coverage_area
        );
    }
    let geojson = walls_to_geojson(session.walls(), PHOTO_W, PHOTO_H);
    std::fs::write("demo_walls.geojson", serde_json::to_string_pretty(&geojson)?)?;

    let catalog = StaticCatalog::sample();
    if let Some(item) = fetch_catalog_or_empty(&catalog).first()
        && let Some(estimate) = controller.estimate(3.2, 2.6, item)?
    {
        println!(
            "   {} at {:.2}/m2 for {:.2} m2: {:.2}",
            item.name, item.price_per_area, estimate.area, estimate.total_price
        );
    }
    Ok(())
}
