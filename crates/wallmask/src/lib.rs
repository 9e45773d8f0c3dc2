//! # Wall Mask Engine
//!
//! Masking, compositing and boundary detection for a wallpaper simulator.
//! A user photographs a room, outlines one or more walls (by polygon, brush,
//! or automatic detection) and previews a tileable pattern composited onto
//! each wall.
//!
//! ## Core Features
//!
//! - **Wall masks**: polygon fill plus an ordered log of add/remove brush
//!   strokes, evaluated analytically or rasterized per frame
//! - **Compositor**: tiled pattern clipped to the mask, multiply-blended
//!   against the photo, optional shadow gradient, before/after split
//! - **Detection pipeline**: segmentation map in, native-space outlines out,
//!   with interchangeable strategies (column scan, centroid raycast, Moore
//!   tracing, border following)
//! - **Interaction**: zoom/pan-aware pointer handling gated by feature flags
//! - **GeoJSON Support**: export/import of walls and detection results
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wallmask::{DetectionPipeline, segmentation::WallMap};
//!
//! let mask = image::open("segmentation.png")?.to_luma8();
//! let map = WallMap::from_mask(&mask, 127).to_working_resolution(512);
//! let pipeline = DetectionPipeline::builder().build();
//! let result = pipeline.process(&map, (4032, 3024))?;
//! result.save_geojson("walls.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use wallmask::{DetectionPipeline, algorithms::*};
//!
//! let pipeline = DetectionPipeline::builder()
//!     .add_preprocessor(ThresholdPreprocessor { threshold: 150 })
//!     .with_cleanup(2, 1)
//!     .set_strategy(DetectorKind::MooreTrace)
//!     .with_simplification(2.0)
//!     .multi_wall(true)
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithms;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod io;
pub mod manager;
pub mod mask;
pub mod mcp;
pub mod pipeline;
pub mod presets;
pub mod pricing;
pub mod segmentation;
pub mod service;
pub mod session;
pub mod traits;
pub mod typed_geojson;
pub mod types;

pub use config::SimulatorConfig;
pub use error::{Result, WallMaskError};
pub use interaction::InteractionController;
pub use manager::{WallMaskCommand, WallMaskManager};
pub use mask::WallMask;
pub use pipeline::{DetectionPipeline, builder::DetectionPipelineBuilder};
pub use segmentation::WallMap;
pub use session::SessionState;
pub use traits::*;
pub use types::{BrushStroke, BrushTool, DetectedWall, DetectionResult, Point, Polygon, Wall, WallId};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compositor::PatternLibrary,
        config::FeatureFlags,
        interaction::{ActiveTool, EditMode},
        service::{DetectionRequest, DetectionService, LocalDetectionService},
        session::{DetectionOutcome, PhotoRef},
    };
    use base64::{Engine, engine::general_purpose::STANDARD};
    use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn segmentation_png() -> String {
        let image = GrayImage::from_fn(100, 100, |x, y| {
            if (20..80).contains(&x) && (10..70).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    #[test]
    fn detect_refine_and_render() {
        let config = SimulatorConfig::default();
        let service = LocalDetectionService::from_config(&config.detection, config.features.multi_wall);
        let mut controller = InteractionController::new(config);
        controller.replace_photo(PhotoRef {
            source: "test".into(),
            width: 200,
            height: 200,
        });

        let ticket = controller.request_detection().unwrap();
        let response = service.detect(&DetectionRequest {
            image_data: segmentation_png(),
            native_width: 200,
            native_height: 200,
        });
        assert_eq!(response.polygons.len(), 1);
        let result = DetectionResult {
            walls: response.polygons,
            native_width: 200,
            native_height: 200,
            ..DetectionResult::default()
        };
        assert_eq!(
            controller.complete_detection(ticket, result).unwrap(),
            DetectionOutcome::Applied(1)
        );

        // carve a hole in the middle of the detected wall
        controller.set_mode(EditMode::Masking).unwrap();
        controller.set_tool(ActiveTool::BrushRemove).unwrap();
        controller.set_brush_radius(10.0);
        controller.pointer_down(Point::new(100.0, 80.0)).unwrap();
        controller.pointer_up(Point::new(100.0, 80.0));

        let mut patterns = PatternLibrary::new();
        patterns.insert("red", RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])));
        controller.session_mut().global.pattern_id = Some("red".into());
        controller.session_mut().global.opacity = 1.0;

        let photo = RgbaImage::from_pixel(200, 200, Rgba([200, 200, 200, 255]));
        let frame = controller.render(&photo, &patterns);
        assert_eq!(frame.get_pixel(100, 80), &Rgba([200, 200, 200, 255]));
        assert_eq!(frame.get_pixel(5, 5), &Rgba([200, 200, 200, 255]));
        assert_ne!(frame.get_pixel(60, 40), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn disabled_detection_never_touches_walls() {
        let config = SimulatorConfig {
            features: FeatureFlags {
                auto_detect: false,
                ..FeatureFlags::default()
            },
            ..SimulatorConfig::default()
        };
        let mut controller = InteractionController::new(config);
        assert!(controller.request_detection().is_err());
        assert_eq!(controller.session().walls().len(), 1);
    }
}
