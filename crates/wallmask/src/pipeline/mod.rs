pub mod builder;

use tracing::{debug, warn};

use crate::{
    algorithms::split_components,
    error::Result,
    geometry,
    segmentation::WallMap,
    traits::{BoundaryDetector, ImagePreprocessor, OutlineSimplifier},
    types::{DetectedWall, DetectionResult, Point},
};

/// Wall boundary detection: preprocess the wall map, extract one outline per
/// region with the configured strategy, simplify, and scale the result to
/// the photo's native resolution.
pub struct DetectionPipeline {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    detector: Box<dyn BoundaryDetector>,
    postprocessors: Vec<Box<dyn OutlineSimplifier>>,
    min_wall_fraction: f32,
    multi_wall: bool,
    min_component_fraction: f32,
}

impl DetectionPipeline {
    pub fn builder() -> builder::DetectionPipelineBuilder {
        builder::DetectionPipelineBuilder::new()
    }

    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        detector: Box<dyn BoundaryDetector>,
        postprocessors: Vec<Box<dyn OutlineSimplifier>>,
        min_wall_fraction: f32,
        multi_wall: bool,
        min_component_fraction: f32,
    ) -> Self {
        Self {
            preprocessors,
            detector,
            postprocessors,
            min_wall_fraction,
            multi_wall,
            min_component_fraction,
        }
    }

    /// Run detection on a working-resolution map. `native` is the photo's
    /// resolution; outlines are scaled to it linearly.
    ///
    /// An empty result means detection failed (too little wall, or no usable
    /// outline) and the user should mask manually.
    pub fn process(&self, map: &WallMap, native: (u32, u32)) -> Result<DetectionResult> {
        let working = map.dimensions();

        let mut image = map.as_image().clone();
        for preprocessor in &self.preprocessors {
            image = preprocessor.preprocess(&image)?;
        }
        let map = WallMap::new(image);

        let fraction = map.wall_fraction();
        if fraction < self.min_wall_fraction {
            warn!(
                fraction,
                min = self.min_wall_fraction,
                "Too few wall pixels, detection failed"
            );
            return Ok(DetectionResult::empty(working, native));
        }

        let regions = if self.multi_wall {
            let total = working.0 as usize * working.1 as usize;
            let min_pixels = (total as f32 * self.min_component_fraction).ceil() as usize;
            split_components(&map, min_pixels)
        } else {
            vec![map]
        };

        let mut walls = Vec::with_capacity(regions.len());
        for region in &regions {
            let Some(points) = self.outline_for(region)? else {
                continue;
            };
            let name = if self.multi_wall && regions.len() > 1 {
                format!("Detected wall {}", walls.len() + 1)
            } else {
                "Detected wall".to_string()
            };
            walls.push(DetectedWall {
                name,
                points: geometry::scale_points(&points, working, native),
            });
        }

        debug!(
            strategy = self.detector.name(),
            walls = walls.len(),
            "Detection finished"
        );

        Ok(DetectionResult {
            walls,
            working_width: working.0,
            working_height: working.1,
            native_width: native.0,
            native_height: native.1,
        })
    }

    /// One region's outline in working coordinates, falling back to the
    /// region's bounding rectangle when the strategy yields fewer than three
    /// points.
    fn outline_for(&self, region: &WallMap) -> Result<Option<Vec<Point>>> {
        let mut outline = self.detector.extract_outline(region)?;
        for postprocessor in &self.postprocessors {
            outline = postprocessor.simplify(outline);
        }
        geometry::dedup_ring(&mut outline);
        if outline.len() >= 3 {
            return Ok(Some(outline));
        }

        debug!(
            strategy = self.detector.name(),
            points = outline.len(),
            "Outline too short, using region bounds"
        );
        Ok(region.wall_bounds().map(|(x0, y0, x1, y1)| {
            let (x0, y0) = (x0 as f32, y0 as f32);
            let (x1, y1) = (x1 as f32 + 1.0, y1 as f32 + 1.0);
            vec![
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ]
        }))
    }

    pub fn info(&self) -> String {
        format!(
            "DetectionPipeline: {} preprocessors, strategy {}, {} postprocessors, multi_wall {}",
            self.preprocessors.len(),
            self.detector.name(),
            self.postprocessors.len(),
            self.multi_wall
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{CentroidRaycastDetector, DetectorKind};
    use approx::assert_relative_eq;

    fn block_map() -> WallMap {
        WallMap::from_fn(512, 512, |x, y| (100..=400).contains(&x) && (50..=450).contains(&y))
    }

    #[test]
    fn column_scan_finds_block_and_scales_to_native() {
        let pipeline = DetectionPipeline::builder().build();
        let working = pipeline.process(&block_map(), (512, 512)).unwrap();
        let native = pipeline.process(&block_map(), (1024, 1024)).unwrap();

        let outline = &working.primary().unwrap().points;
        assert!(outline.iter().any(|p| p.y == 50.0));
        assert!(outline.iter().any(|p| p.y == 450.0));
        assert!(outline.iter().all(|p| p.y == 50.0 || p.y == 450.0));

        let scaled = &native.primary().unwrap().points;
        assert_eq!(outline.len(), scaled.len());
        for (raw, big) in outline.iter().zip(scaled) {
            assert_relative_eq!(big.x, raw.x * 2.0);
            assert_relative_eq!(big.y, raw.y * 2.0);
        }
    }

    #[test]
    fn every_strategy_yields_a_complete_polygon() {
        for kind in [
            DetectorKind::ColumnScan,
            DetectorKind::CentroidRaycast,
            DetectorKind::MooreTrace,
            DetectorKind::BorderFollowing,
        ] {
            let pipeline = DetectionPipeline::builder().set_strategy(kind).build();
            let result = pipeline.process(&block_map(), (800, 600)).unwrap();
            assert_eq!(result.walls.len(), 1, "{kind}");
            assert!(result.walls[0].points.len() >= 3, "{kind}");
            assert_eq!(result.native_width, 800);
        }
    }

    #[test]
    fn too_little_wall_fails() {
        let map = WallMap::from_fn(100, 100, |x, y| x < 3 && y < 3);
        let pipeline = DetectionPipeline::builder().min_wall_fraction(0.01).build();
        assert!(pipeline.process(&map, (100, 100)).unwrap().is_empty());
    }

    #[test]
    fn falls_back_to_region_bounds() {
        // A one-pixel sliver only gives a two-point outline.
        let map = WallMap::from_fn(100, 100, |x, _| x == 1);
        let pipeline = DetectionPipeline::builder().min_wall_fraction(0.0).build();
        let result = pipeline.process(&map, (100, 100)).unwrap();
        let wall = result.primary().unwrap();
        assert_eq!(
            wall.points,
            vec![
                Point::new(1.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 100.0),
                Point::new(1.0, 100.0),
            ]
        );
    }

    #[test]
    fn multi_wall_reports_each_region() {
        let map = WallMap::from_fn(200, 100, |x, y| {
            (10..80).contains(&x) && (10..90).contains(&y)
                || (120..190).contains(&x) && (20..80).contains(&y)
        });
        let pipeline = DetectionPipeline::builder()
            .set_detector(CentroidRaycastDetector::default())
            .multi_wall(true)
            .build();
        let result = pipeline.process(&map, (400, 200)).unwrap();
        assert_eq!(result.walls.len(), 2);
        assert_eq!(result.walls[0].name, "Detected wall 1");
        assert!(result.walls[0].points.iter().all(|p| p.x < 200.0));
        assert!(result.walls[1].points.iter().all(|p| p.x >= 240.0));
    }
}
