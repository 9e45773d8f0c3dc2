//! Immutable simulator configuration.
//!
//! A [`SimulatorConfig`] is built once (defaults, TOML or JSON) and handed to
//! the interaction controller at construction. Feature gating is a plain
//! check on [`FeatureFlags`].

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::DetectorKind,
    error::{Result, WallMaskError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FeatureFlags {
    /// Manual polygon masking.
    pub manual_selection: bool,
    /// Automatic wall detection.
    pub auto_detect: bool,
    /// More than one wall per session.
    pub multi_wall: bool,
    /// Freehand brush refinement.
    pub brush: bool,
    /// Draggable before/after split.
    pub before_after: bool,
    /// Area x price estimation and quote requests.
    pub budget: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            manual_selection: true,
            auto_detect: true,
            multi_wall: true,
            brush: true,
            before_after: true,
            budget: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BrushSettings {
    pub default_radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            default_radius: 20.0,
            min_radius: 5.0,
            max_radius: 80.0,
        }
    }
}

impl BrushSettings {
    pub fn clamp(&self, radius: f32) -> f32 {
        if radius.is_finite() {
            radius.clamp(self.min_radius, self.max_radius)
        } else {
            self.default_radius
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ZoomSettings {
    pub min: f32,
    pub max: f32,
    /// Multiplicative zoom per wheel notch.
    pub wheel_step: f32,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 5.0,
            wheel_step: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectionConfig {
    /// Side of the square working resolution the classifier runs at.
    pub working_size: u32,
    pub strategy: DetectorKind,
    /// Column count for the column scan.
    pub columns: usize,
    /// Minimum run height for the column scan, as a fraction of image height.
    pub min_run_fraction: f32,
    /// Ray count for the centroid raycast (72 = every 5 degrees).
    pub ray_count: usize,
    /// Radial decimation tolerance for traced contours, in working pixels.
    pub trace_tolerance: f32,
    pub max_trace_steps: usize,
    /// Below this share of wall pixels detection is reported as failed.
    pub min_wall_fraction: f32,
    /// Smallest connected region reported as its own wall.
    pub min_component_fraction: f32,
    /// Optional Douglas-Peucker tolerance applied after extraction.
    pub simplify_tolerance: Option<f32>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            working_size: 512,
            strategy: DetectorKind::ColumnScan,
            columns: 40,
            min_run_fraction: 0.03,
            ray_count: 72,
            trace_tolerance: 3.0,
            max_trace_steps: 200_000,
            min_wall_fraction: 0.01,
            min_component_fraction: 0.01,
            simplify_tolerance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ShadowSettings {
    pub enabled: bool,
    /// Black alpha at the top of the wall.
    pub top_alpha: f32,
    /// Black alpha at the bottom of the wall.
    pub bottom_alpha: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            top_alpha: 0.1,
            bottom_alpha: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SimulatorConfig {
    pub features: FeatureFlags,
    pub default_opacity: f32,
    pub default_scale: f32,
    pub brush: BrushSettings,
    /// Vertex handle grab radius in screen pixels.
    pub vertex_grab_radius: f32,
    /// Half-width of the before/after handle hit zone in screen pixels.
    pub split_handle_tolerance: f32,
    pub zoom: ZoomSettings,
    pub detection: DetectionConfig,
    pub shadow: ShadowSettings,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            features: FeatureFlags::default(),
            default_opacity: 0.85,
            default_scale: 0.5,
            brush: BrushSettings::default(),
            vertex_grab_radius: 8.0,
            split_handle_tolerance: 12.0,
            zoom: ZoomSettings::default(),
            detection: DetectionConfig::default(),
            shadow: ShadowSettings::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(WallMaskError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SimulatorConfig)
    }

    fn validate(self) -> Result<Self> {
        if self.zoom.min <= 0.0 || self.zoom.min > self.zoom.max {
            return Err(WallMaskError::InvalidConfig(format!(
                "zoom range {}..{} is empty or non-positive",
                self.zoom.min, self.zoom.max
            )));
        }
        if self.brush.min_radius > self.brush.max_radius {
            return Err(WallMaskError::InvalidConfig(
                "brush min_radius exceeds max_radius".to_string(),
            ));
        }
        if self.detection.working_size == 0 {
            return Err(WallMaskError::InvalidConfig(
                "detection working_size must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_simulator_presets() {
        let config = SimulatorConfig::default();
        assert_eq!(config.default_opacity, 0.85);
        assert_eq!(config.default_scale, 0.5);
        assert_eq!(config.detection.working_size, 512);
        assert_eq!(config.detection.strategy, DetectorKind::ColumnScan);
        assert!(config.features.before_after);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SimulatorConfig::from_toml_str(
            r#"
            default_opacity = 0.6

            [features]
            multi_wall = false

            [detection]
            strategy = "moore_trace"
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.default_opacity, 0.6);
        assert!(!config.features.multi_wall);
        assert!(config.features.brush);
        assert_eq!(config.detection.strategy, DetectorKind::MooreTrace);
        assert_eq!(config.detection.columns, 40);
    }

    #[test]
    fn json_round_trip() {
        let config = SimulatorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SimulatorConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn inverted_zoom_range_is_rejected() {
        let err = SimulatorConfig::from_toml_str("[zoom]\nmin = 4.0\nmax = 2.0\n").unwrap_err();
        assert!(matches!(err, WallMaskError::InvalidConfig(_)));
    }
}
