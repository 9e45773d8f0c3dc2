//! Ephemeral per-session state: the photo, its walls, and view state.
//!
//! There is exactly one mutator (the UI event loop). Detection results come
//! back asynchronously and are matched against a generation counter so a
//! result computed for an older request or a replaced photo is dropped.

use image::RgbaImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    compositor::{self, PatternLibrary, RenderParams, WallLayer},
    config::{ShadowSettings, SimulatorConfig},
    error::{Result, WallMaskError},
    interaction::{ActiveTool, EditMode, ViewTransform},
    mask::{WallMask, covered_pixels},
    presets::RoomPreset,
    types::{DetectionResult, Point, Wall, WallId},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PhotoRef {
    /// Path or URL the photo was loaded from.
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Session-wide render parameters used where a wall has no override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GlobalRenderParams {
    pub pattern_id: Option<String>,
    pub opacity: f32,
    pub scale: f32,
}

/// Handle for one in-flight detection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// Number of walls created or updated.
    Applied(usize),
    /// A newer request or a photo change superseded this result.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WallSummary {
    pub id: WallId,
    pub name: String,
    pub point_count: usize,
    pub stroke_count: usize,
    pub has_pattern: bool,
    /// Covered pixels at photo resolution, or polygon area without a photo.
    pub coverage_area: f32,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    photo: Option<PhotoRef>,
    walls: Vec<Wall>,
    selected: Option<WallId>,
    pub mode: EditMode,
    pub tool: ActiveTool,
    pub global: GlobalRenderParams,
    pub view: ViewTransform,
    /// Before/after divider in screen space.
    pub slider_x: f32,
    default_opacity: f32,
    default_scale: f32,
    next_wall: u64,
    detection_generation: u64,
}

impl SessionState {
    pub fn new(config: &SimulatorConfig) -> Self {
        let mut session = Self {
            photo: None,
            walls: Vec::new(),
            selected: None,
            mode: EditMode::View,
            tool: ActiveTool::Polygon,
            global: GlobalRenderParams {
                pattern_id: None,
                opacity: config.default_opacity,
                scale: config.default_scale,
            },
            view: ViewTransform::default(),
            slider_x: 0.0,
            default_opacity: config.default_opacity,
            default_scale: config.default_scale,
            next_wall: 1,
            detection_generation: 0,
        };
        session.add_wall(None);
        session
    }

    pub fn photo(&self) -> Option<&PhotoRef> {
        self.photo.as_ref()
    }

    /// Install a new photo. All wall state is dropped at once and any
    /// pending detection is invalidated.
    pub fn replace_photo(&mut self, photo: PhotoRef) {
        info!(source = %photo.source, width = photo.width, height = photo.height, "Photo replaced");
        // the view resets to identity, so the photo spans exactly its own
        // width on screen until the host reports a viewport
        self.view = ViewTransform::default();
        self.center_slider(photo.width);
        self.photo = Some(photo);
        self.walls.clear();
        self.selected = None;
        self.mode = EditMode::View;
        self.detection_generation += 1;
        self.add_wall(None);
    }

    /// Put the before/after divider in the middle of a viewport
    /// `viewport_width` screen pixels wide.
    pub fn center_slider(&mut self, viewport_width: u32) {
        self.slider_x = viewport_width as f32 / 2.0;
    }

    /// Replace the session with a preset room.
    pub fn load_preset(&mut self, preset: &RoomPreset, width: u32, height: u32) {
        self.replace_photo(PhotoRef {
            source: preset.image_url.to_string(),
            width,
            height,
        });
        self.walls = preset.walls();
        self.selected = self.walls.first().map(|w| w.id.clone());
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall(&self, id: &WallId) -> Option<&Wall> {
        self.walls.iter().find(|w| &w.id == id)
    }

    pub fn wall_mut(&mut self, id: &WallId) -> Result<&mut Wall> {
        self.walls
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| WallMaskError::UnknownWall(id.clone()))
    }

    pub fn selected_id(&self) -> Option<&WallId> {
        self.selected.as_ref()
    }

    pub fn selected_wall(&self) -> Option<&Wall> {
        self.selected.as_ref().and_then(|id| self.wall(id))
    }

    pub fn selected_wall_mut(&mut self) -> Option<&mut Wall> {
        let id = self.selected.clone()?;
        self.walls.iter_mut().find(|w| w.id == id)
    }

    pub fn select(&mut self, id: Option<WallId>) -> Result<()> {
        if let Some(id) = &id
            && self.wall(id).is_none()
        {
            return Err(WallMaskError::UnknownWall(id.clone()));
        }
        self.selected = id;
        Ok(())
    }

    /// Append a wall and select it.
    pub fn add_wall(&mut self, name: Option<String>) -> WallId {
        let n = self.next_wall;
        self.next_wall += 1;
        let id = WallId::new(format!("wall-{n}"));
        let name = name.unwrap_or_else(|| format!("Wall {n}"));
        self.walls.push(Wall::new(id.clone(), name));
        self.selected = Some(id.clone());
        id
    }

    pub fn remove_wall(&mut self, id: &WallId) -> Result<Wall> {
        let index = self
            .walls
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| WallMaskError::UnknownWall(id.clone()))?;
        let wall = self.walls.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = self.walls.last().map(|w| w.id.clone());
        }
        Ok(wall)
    }

    /// Topmost (last in list) wall whose polygon contains `p`.
    pub fn wall_at(&self, p: Point) -> Option<&Wall> {
        self.walls.iter().rev().find(|w| w.polygon.contains(p))
    }

    /// Pattern and sanitized parameters for a wall, falling back to the
    /// session-wide values.
    pub fn effective_params(&self, wall: &Wall) -> (Option<String>, RenderParams) {
        let pattern = wall.pattern_id.clone().or_else(|| self.global.pattern_id.clone());
        let params = RenderParams::sanitized(
            wall.opacity.unwrap_or(self.global.opacity),
            wall.pattern_scale.unwrap_or(self.global.scale),
            self.default_opacity,
            self.default_scale,
        );
        (pattern, params)
    }

    fn wall_mask<'a>(&self, wall: &'a Wall, width: u32, height: u32) -> WallMask<'a> {
        if self.walls.len() == 1 {
            WallMask::with_default_fallback(wall, width, height)
        } else {
            WallMask::new(wall)
        }
    }

    pub fn begin_detection(&mut self) -> DetectionTicket {
        self.detection_generation += 1;
        debug!(generation = self.detection_generation, "Detection requested");
        DetectionTicket(self.detection_generation)
    }

    /// Apply a detection result. Stale tickets are ignored; an empty result
    /// is a user-facing failure and leaves the walls untouched.
    ///
    /// With `multi_wall` the detected walls are appended (an untouched
    /// default wall is dropped first); otherwise the primary outline
    /// replaces the selected wall's polygon.
    pub fn apply_detection(
        &mut self,
        ticket: DetectionTicket,
        result: DetectionResult,
        multi_wall: bool,
    ) -> Result<DetectionOutcome> {
        if ticket.0 != self.detection_generation {
            debug!(
                ticket = ticket.0,
                current = self.detection_generation,
                "Discarding stale detection result"
            );
            return Ok(DetectionOutcome::Stale);
        }
        if result.is_empty() {
            return Err(WallMaskError::DetectionFailed(
                "no wall region found".to_string(),
            ));
        }

        if multi_wall {
            self.walls.retain(|w| !w.is_untouched());
            let count = result.walls.len();
            let mut first = None;
            for detected in result.walls {
                let id = self.add_wall(Some(detected.name.clone()));
                if let Ok(wall) = self.wall_mut(&id) {
                    wall.polygon = detected.polygon();
                }
                first.get_or_insert(id);
            }
            self.selected = first;
            info!(walls = count, "Detected walls added");
            return Ok(DetectionOutcome::Applied(count));
        }

        let Some(primary) = result.walls.into_iter().next() else {
            return Ok(DetectionOutcome::Applied(0));
        };
        if self.selected_wall().is_none() {
            self.add_wall(Some(primary.name.clone()));
        }
        if let Some(wall) = self.selected_wall_mut() {
            wall.polygon = primary.polygon();
        }
        info!("Detected outline applied to selected wall");
        Ok(DetectionOutcome::Applied(1))
    }

    pub fn summary(&self) -> Vec<WallSummary> {
        self.walls
            .iter()
            .map(|wall| {
                let coverage_area = match &self.photo {
                    Some(photo) => covered_pixels(
                        &self.wall_mask(wall, photo.width, photo.height).rasterize(photo.width, photo.height),
                    ) as f32,
                    None => wall.polygon.area(),
                };
                WallSummary {
                    id: wall.id.clone(),
                    name: wall.name.clone(),
                    point_count: wall.polygon.len(),
                    stroke_count: wall.brush_strokes.len(),
                    has_pattern: self.effective_params(wall).0.is_some(),
                    coverage_area,
                }
            })
            .collect()
    }

    /// Composite every wall over `photo` in model space. Pure: depends only
    /// on the session, the photo and the loaded patterns.
    pub fn render(
        &self,
        photo: &RgbaImage,
        patterns: &PatternLibrary,
        shadow: &ShadowSettings,
    ) -> RgbaImage {
        let (width, height) = photo.dimensions();
        let layers: Vec<WallLayer<'_>> = self
            .walls
            .iter()
            .map(|wall| {
                let (pattern_id, params) = self.effective_params(wall);
                WallLayer {
                    mask: self.wall_mask(wall, width, height).rasterize(width, height),
                    pattern: pattern_id.as_deref().and_then(|id| patterns.get(id)),
                    params,
                }
            })
            .collect();
        compositor::render(photo, &layers, shadow)
    }
}
