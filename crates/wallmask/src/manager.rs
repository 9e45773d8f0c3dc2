use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::info;

use crate::{
    algorithms::DetectorKind,
    config::DetectionConfig,
    error::{Result, WallMaskError},
    pipeline::builder::DetectionPipelineBuilder,
    segmentation::{LabelScheme, WallMap},
    types::DetectionResult,
};

#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    VariantNames,
    IntoStaticStr,
    PartialEq,
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum WallMaskCommand {
    /// Detect the single dominant wall outline
    #[serde(rename = "detect_wall")]
    DetectWall,

    /// Detect every connected wall region as its own outline
    #[serde(rename = "detect_multiple_walls")]
    DetectMultipleWalls,

    /// Detect the dominant wall, then Douglas-Peucker simplify the outline
    #[serde(rename = "detect_with_simplification")]
    DetectWithSimplification {
        #[schemars(range(min = 0.1, max = 20.0))]
        tolerance: f32,
    },

    /// Detect the dominant wall with a named boundary strategy
    #[serde(rename = "detect_with_strategy")]
    DetectWithStrategy { strategy: DetectorKind },
}

impl WallMaskCommand {
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(WallMaskCommand)
    }

    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::DetectWall => "Detect the dominant wall outline from the loaded segmentation map",
            Self::DetectMultipleWalls => "Detect each connected wall region as a separate outline",
            Self::DetectWithSimplification { .. } => {
                "Detect the dominant wall and simplify its outline with Douglas-Peucker"
            }
            Self::DetectWithStrategy { .. } => "Detect the dominant wall with a specific boundary strategy",
        }
    }

    /// `(name, description, required)` for each parameter.
    pub fn parameters_info(&self) -> Vec<(&'static str, &'static str, bool)> {
        match self {
            Self::DetectWall | Self::DetectMultipleWalls => vec![],
            Self::DetectWithSimplification { .. } => vec![(
                "tolerance",
                "Simplification tolerance in working pixels (higher = fewer points)",
                true,
            )],
            Self::DetectWithStrategy { .. } => vec![(
                "strategy",
                "One of column_scan, centroid_raycast, moore_trace, border_following",
                true,
            )],
        }
    }
}

/// Holds a segmentation map and runs detection commands against it.
#[derive(Debug, Clone, Default)]
pub struct WallMaskManager {
    map: Option<WallMap>,
    native: (u32, u32),
    config: DetectionConfig,
}

impl WallMaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Install a wall map. `native` is the photo resolution outlines are
    /// reported in.
    pub fn set_map(&mut self, map: WallMap, native: (u32, u32)) {
        let map = map.to_working_resolution(self.config.working_size);
        info!(
            working = ?map.dimensions(),
            native = ?native,
            wall_fraction = map.wall_fraction(),
            "Segmentation map loaded"
        );
        self.map = Some(map);
        self.native = native;
    }

    /// Load a grayscale mask image; its own size is taken as native unless
    /// `native` is given.
    pub fn load_mask(&mut self, path: &str, threshold: u8, native: Option<(u32, u32)>) -> Result<()> {
        let image = image::open(path)?.to_luma8();
        self.set_mask(image, threshold, native);
        Ok(())
    }

    pub fn load_mask_from_bytes(&mut self, bytes: &[u8], threshold: u8, native: Option<(u32, u32)>) -> Result<()> {
        let image = image::load_from_memory(bytes)?.to_luma8();
        self.set_mask(image, threshold, native);
        Ok(())
    }

    fn set_mask(&mut self, image: GrayImage, threshold: u8, native: Option<(u32, u32)>) {
        let native = native.unwrap_or(image.dimensions());
        self.set_map(WallMap::from_mask(&image, threshold), native);
    }

    /// Load a semantic label map (one class id per pixel).
    pub fn load_labels(
        &mut self,
        width: u32,
        height: u32,
        labels: Vec<u8>,
        scheme: &LabelScheme,
        native: Option<(u32, u32)>,
    ) -> Result<()> {
        let map = WallMap::from_labels(width, height, &labels, scheme)?;
        self.set_map(map, native.unwrap_or((width, height)));
        Ok(())
    }

    pub fn map(&self) -> Option<&WallMap> {
        self.map.as_ref()
    }

    pub fn execute(&self, command: WallMaskCommand) -> Result<DetectionResult> {
        let map = self.map.as_ref().ok_or(WallMaskError::NoSegmentationLoaded)?;
        let builder = DetectionPipelineBuilder::from_config(&self.config);

        let pipeline = match command {
            WallMaskCommand::DetectWall => builder.build(),
            WallMaskCommand::DetectMultipleWalls => builder.multi_wall(true).build(),
            WallMaskCommand::DetectWithSimplification { tolerance } => {
                builder.with_simplification(tolerance).build()
            }
            WallMaskCommand::DetectWithStrategy { strategy } => builder.set_strategy(strategy).build(),
        };
        pipeline.process(map, self.native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn two_blocks() -> WallMap {
        WallMap::from_fn(128, 64, |x, y| {
            (8..48).contains(&y) && ((4..40).contains(&x) || (70..120).contains(&x))
        })
    }

    fn manager() -> WallMaskManager {
        let mut manager = WallMaskManager::new();
        manager.set_map(two_blocks(), (1280, 640));
        manager
    }

    #[test]
    fn no_map_is_an_error() {
        assert!(matches!(
            WallMaskManager::new().execute(WallMaskCommand::DetectWall),
            Err(WallMaskError::NoSegmentationLoaded)
        ));
    }

    #[test]
    fn multiple_walls_reports_each_region() {
        let result = manager().execute(WallMaskCommand::DetectMultipleWalls).unwrap();
        assert_eq!(result.walls.len(), 2);
        assert_eq!((result.native_width, result.native_height), (1280, 640));
        // largest region first, scaled by 10 to native space
        assert!(result.walls[0].points.iter().all(|p| p.x >= 690.0));
    }

    #[test]
    fn every_command_runs() {
        let manager = manager();
        for command in WallMaskCommand::iter() {
            let result = manager.execute(command.clone()).unwrap();
            assert!(!result.is_empty(), "{command} produced nothing");
        }
    }

    #[test]
    fn ade20k_labels_detect_the_wall_class() {
        // wall (0) block on a floor (3) background
        let (width, height) = (64u32, 32u32);
        let labels: Vec<u8> = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                if (8..56).contains(&x) && (4..24).contains(&y) { 0 } else { 3 }
            })
            .collect();
        let mut manager = WallMaskManager::new();
        manager
            .load_labels(width, height, labels, &LabelScheme::Ade20k, Some((640, 320)))
            .unwrap();

        let result = manager.execute(WallMaskCommand::DetectWall).unwrap();
        assert_eq!(result.walls.len(), 1);
        assert_eq!((result.native_width, result.native_height), (640, 320));
        let points = &result.walls[0].points;
        assert!(points.iter().all(|p| p.x >= 60.0 && p.x <= 580.0));
        assert!(points.iter().all(|p| p.y >= 20.0 && p.y <= 260.0));
    }

    #[test]
    fn label_count_must_match_dimensions() {
        let mut manager = WallMaskManager::new();
        assert!(matches!(
            manager.load_labels(4, 4, vec![0; 15], &LabelScheme::Ade20k, None),
            Err(WallMaskError::InvalidSegmentation(_))
        ));
        assert!(manager.map().is_none());
    }

    #[test]
    fn commands_serialize_with_type_tag() {
        let command = WallMaskCommand::DetectWithStrategy {
            strategy: DetectorKind::MooreTrace,
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "detect_with_strategy");
        assert_eq!(json["params"]["strategy"], "moore_trace");
        assert_eq!(WallMaskCommand::command_names().len(), 4);
    }
}
