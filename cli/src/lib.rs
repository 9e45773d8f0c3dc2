use std::fs;
use std::path::Path;

use image::RgbaImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use wallmask::{
    BrushStroke, Point, SessionState, SimulatorConfig, Wall, WallMaskError,
    compositor::PatternLibrary,
    session::PhotoRef,
};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    WallMask(#[from] WallMaskError),
    #[error("Scene has no walls and no walls_geojson file")]
    NoWalls,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

pub type Result<T> = std::result::Result<T, CliError>;

/// A texture available to the scene's walls.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PatternSource {
    pub id: String,
    pub path: String,
}

/// A wall as written in a scene file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SceneWall {
    pub name: String,
    #[serde(default)]
    pub polygon: Vec<[f32; 2]>,
    #[serde(default)]
    pub strokes: Vec<BrushStroke>,
    pub pattern_id: Option<String>,
    pub opacity: Option<f32>,
    pub scale: Option<f32>,
}

/// Everything needed to render one composite offline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SceneConfig {
    pub photo: String,
    pub output: String,
    #[serde(default)]
    pub patterns: Vec<PatternSource>,
    /// Session-wide pattern, used by walls without their own.
    pub pattern_id: Option<String>,
    pub opacity: Option<f32>,
    pub scale: Option<f32>,
    #[serde(default)]
    pub walls: Vec<SceneWall>,
    /// Walls exported by `detect` or a previous session; appended after `walls`.
    pub walls_geojson: Option<String>,
    /// Screen x of the before/after divider; no split when absent.
    pub split_x: Option<f32>,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl SceneConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load the scene
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Walls declared inline, then any from `walls_geojson`.
    pub fn resolve_walls(&self) -> Result<Vec<Wall>> {
        let mut walls: Vec<Wall> = self
            .walls
            .iter()
            .enumerate()
            .map(|(i, scene)| {
                let mut wall = Wall::new(format!("scene-{}", i + 1), scene.name.clone())
                    .with_polygon(scene.polygon.iter().map(|&p| Point::from(p)).collect::<Vec<_>>());
                wall.brush_strokes = scene.strokes.clone();
                wall.pattern_id = scene.pattern_id.clone();
                wall.opacity = scene.opacity;
                wall.pattern_scale = scene.scale;
                wall
            })
            .collect();
        if let Some(path) = &self.walls_geojson {
            let (imported, _) = wallmask::io::walls_from_geojson_str(&fs::read_to_string(path)?)?;
            walls.extend(imported);
        }
        if walls.is_empty() {
            return Err(CliError::NoWalls);
        }
        Ok(walls)
    }

    /// Session for a photo of the given size with the scene's walls and
    /// render parameters applied.
    pub fn to_session(&self, width: u32, height: u32) -> Result<SessionState> {
        let mut session = SessionState::new(&self.simulator);
        session.replace_photo(PhotoRef {
            source: self.photo.clone(),
            width,
            height,
        });
        let ids: Vec<_> = session.walls().iter().map(|w| w.id.clone()).collect();
        for id in &ids {
            session.remove_wall(id)?;
        }
        for wall in self.resolve_walls()? {
            let id = session.add_wall(Some(wall.name.clone()));
            let target = session.wall_mut(&id)?;
            *target = Wall { id, ..wall };
        }
        session.global.pattern_id = self.pattern_id.clone();
        if let Some(opacity) = self.opacity {
            session.global.opacity = opacity;
        }
        if let Some(scale) = self.scale {
            session.global.scale = scale;
        }
        if let Some(split) = self.split_x {
            session.slider_x = split;
        }
        Ok(session)
    }

    /// Load every listed pattern. Failures leave the pattern unavailable
    /// rather than aborting the render.
    pub fn load_patterns(&self) -> PatternLibrary {
        let mut library = PatternLibrary::new();
        for source in &self.patterns {
            if !library.load(source.id.clone(), &source.path) {
                warn!(id = %source.id, path = %source.path, "Pattern unavailable, wall renders transparent");
            }
        }
        library
    }

    pub fn load_photo(&self) -> Result<RgbaImage> {
        Ok(image::open(&self.photo)?.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
photo = "room.jpg"
output = "out.png"
pattern_id = "linen"
opacity = 0.7

[[patterns]]
id = "linen"
path = "linen.png"

[[walls]]
name = "Back wall"
polygon = [[10.0, 10.0], [90.0, 10.0], [90.0, 60.0], [10.0, 60.0]]

[[walls]]
name = "Side wall"
pattern_id = "brick"
scale = 2.0
polygon = [[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]]

[[walls.strokes]]
tool = "remove"
radius = 3.0
points = [{ x = 1.0, y = 1.0 }]

[simulator.features]
before_after = false
"#;

    #[test]
    fn scene_loads_from_toml() {
        let scene = SceneConfig::from_toml(SCENE).unwrap();
        assert_eq!(scene.walls.len(), 2);
        assert_eq!(scene.walls[1].strokes.len(), 1);
        assert!(!scene.simulator.features.before_after);
        assert!(scene.simulator.features.brush);
        assert_eq!(scene.simulator.default_opacity, 0.85);
    }

    #[test]
    fn scene_builds_session() {
        let scene = SceneConfig::from_toml(SCENE).unwrap();
        let session = scene.to_session(100, 80).unwrap();
        assert_eq!(session.walls().len(), 2);
        assert_eq!(session.walls()[0].name, "Back wall");
        assert_eq!(session.walls()[1].pattern_id.as_deref(), Some("brick"));
        assert_eq!(session.walls()[1].brush_strokes.len(), 1);
        assert_eq!(session.global.opacity, 0.7);
        assert_eq!(session.slider_x, 50.0);
    }

    #[test]
    fn missing_pattern_file_renders_the_bare_photo() {
        let mut scene = SceneConfig::from_toml(SCENE).unwrap();
        scene.patterns[0].path = "no/such/linen.png".into();
        let session = scene.to_session(100, 80).unwrap();
        let patterns = scene.load_patterns();
        assert!(patterns.get("linen").is_none());

        // back wall uses the global linen, the side wall asks for an unlisted brick
        let photo = image::RgbaImage::from_pixel(100, 80, image::Rgba([120, 140, 160, 255]));
        let frame = session.render(&photo, &patterns, &scene.simulator.shadow);
        assert_eq!(frame, photo);
    }

    #[test]
    fn scene_without_walls_is_rejected() {
        let scene = SceneConfig::from_json(r#"{"photo": "a.png", "output": "b.png"}"#).unwrap();
        assert!(matches!(scene.resolve_walls(), Err(CliError::NoWalls)));
    }

    #[test]
    fn scene_survives_json() {
        let scene = SceneConfig::from_toml(SCENE).unwrap();
        assert_eq!(SceneConfig::from_json(&scene.to_json().unwrap()).unwrap(), scene);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            SceneConfig::from_file("scene.yaml"),
            Err(CliError::UnsupportedFileFormat)
        ));
    }
}
