//! Pointer-driven editing of the session, gated by the feature flags.

use image::RgbaImage;
use tracing::debug;

use crate::{
    compositor::{self, PatternLibrary},
    config::SimulatorConfig,
    error::{Result, WallMaskError},
    interaction::{ActiveTool, EditMode, PointerEvent},
    presets::RoomPreset,
    pricing::{self, CatalogItem, PriceEstimate, QuoteRequest, QuoteSink},
    session::{DetectionOutcome, DetectionTicket, PhotoRef, SessionState},
    types::{BrushStroke, DetectionResult, Point, WallId},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    Slider,
    Vertex(usize),
    Pan(Point),
}

/// Owns the session and turns pointer/wheel input into edits.
#[derive(Debug, Clone)]
pub struct InteractionController {
    config: SimulatorConfig,
    session: SessionState,
    brush_radius: f32,
    transient: Option<BrushStroke>,
    drag: Option<Drag>,
}

impl InteractionController {
    pub fn new(config: SimulatorConfig) -> Self {
        let session = SessionState::new(&config);
        let brush_radius = config.brush.default_radius;
        Self {
            config,
            session,
            brush_radius,
            transient: None,
            drag: None,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// The uncommitted stroke being painted, for cursor/preview drawing.
    pub fn transient_stroke(&self) -> Option<&BrushStroke> {
        self.transient.as_ref()
    }

    pub fn brush_radius(&self) -> f32 {
        self.brush_radius
    }

    pub fn set_brush_radius(&mut self, radius: f32) -> f32 {
        self.brush_radius = self.config.brush.clamp(radius);
        self.brush_radius
    }

    /// Vertex handle radius in model units; constant on screen.
    pub fn handle_radius(&self) -> f32 {
        self.session
            .view
            .screen_to_model_len(self.config.vertex_grab_radius)
    }

    pub fn pointer_event(&self, screen: Point) -> PointerEvent {
        PointerEvent::from_screen(screen, &self.session.view)
    }

    /// Swap the background photo. Any gesture in progress belongs to the
    /// old photo and is dropped along with its walls.
    pub fn replace_photo(&mut self, photo: PhotoRef) {
        self.abandon_transient();
        self.session.replace_photo(photo);
    }

    pub fn load_preset(&mut self, preset: &RoomPreset, width: u32, height: u32) {
        self.abandon_transient();
        self.session.load_preset(preset, width, height);
    }

    pub fn set_mode(&mut self, mode: EditMode) -> Result<()> {
        let (polygon_enabled, brush_enabled) = (self.config.features.manual_selection, self.config.features.brush);
        if mode == EditMode::Masking && !polygon_enabled && !brush_enabled {
            return Err(WallMaskError::FeatureDisabled("manual_selection"));
        }
        self.abandon_transient();
        if mode == EditMode::Masking {
            if self.session.selected_wall().is_none() {
                self.session.add_wall(None);
            }
            // fall back to whichever tool is enabled
            let tool = self.session.tool;
            if tool == ActiveTool::Polygon && !polygon_enabled {
                self.session.tool = ActiveTool::BrushAdd;
            } else if tool.brush().is_some() && !brush_enabled {
                self.session.tool = ActiveTool::Polygon;
            }
        }
        self.session.mode = mode;
        Ok(())
    }

    pub fn set_tool(&mut self, tool: ActiveTool) -> Result<()> {
        match tool {
            ActiveTool::Polygon if !self.config.features.manual_selection => {
                return Err(WallMaskError::FeatureDisabled("manual_selection"));
            }
            ActiveTool::BrushAdd | ActiveTool::BrushRemove if !self.config.features.brush => {
                return Err(WallMaskError::FeatureDisabled("brush"));
            }
            _ => {}
        }
        self.abandon_transient();
        self.session.tool = tool;
        Ok(())
    }

    fn abandon_transient(&mut self) {
        if self.transient.take().is_some() {
            debug!("Abandoned uncommitted stroke");
        }
        self.drag = None;
    }

    fn near_slider(&self, screen: Point) -> bool {
        self.config.features.before_after
            && (screen.x - self.session.slider_x).abs() <= self.config.split_handle_tolerance
    }

    pub fn pointer_down(&mut self, screen: Point) -> Result<()> {
        let event = self.pointer_event(screen);
        match self.session.mode {
            EditMode::View => {
                if self.near_slider(screen) {
                    self.drag = Some(Drag::Slider);
                    return Ok(());
                }
                let hit = self.session.wall_at(event.model()).map(|w| w.id.clone());
                self.session.select(hit)
            }
            EditMode::Masking => match self.session.tool.brush() {
                Some(tool) => {
                    if self.session.selected_wall().is_none() {
                        return Err(WallMaskError::NoWallSelected);
                    }
                    self.transient = Some(BrushStroke::new(tool, self.brush_radius, event.model()));
                    Ok(())
                }
                None => {
                    let grab = self.handle_radius();
                    let Some(wall) = self.session.selected_wall_mut() else {
                        return Err(WallMaskError::NoWallSelected);
                    };
                    match wall.polygon.nearest_vertex(event.model(), grab) {
                        Some(index) => self.drag = Some(Drag::Vertex(index)),
                        None => wall.polygon.points.push(event.model()),
                    }
                    Ok(())
                }
            },
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let event = self.pointer_event(screen);
        if let Some(stroke) = self.transient.as_mut() {
            if stroke.points.last() != Some(&event.model()) {
                stroke.points.push(event.model());
            }
            return;
        }
        match self.drag {
            Some(Drag::Slider) => self.session.slider_x = screen.x.max(0.0),
            Some(Drag::Vertex(index)) => {
                if let Some(wall) = self.session.selected_wall_mut()
                    && let Some(vertex) = wall.polygon.points.get_mut(index)
                {
                    *vertex = event.model();
                }
            }
            Some(Drag::Pan(last)) => {
                self.session.view.pan_by(screen.x - last.x, screen.y - last.y);
                self.drag = Some(Drag::Pan(screen));
            }
            None => {}
        }
    }

    /// Finish the gesture; a brush stroke in progress is committed to the
    /// selected wall.
    pub fn pointer_up(&mut self, screen: Point) {
        self.pointer_move(screen);
        self.drag = None;
        if let Some(stroke) = self.transient.take()
            && let Some(wall) = self.session.selected_wall_mut()
        {
            wall.commit_stroke(stroke);
        }
    }

    /// Begin a pan gesture (e.g. middle button or space-drag).
    pub fn begin_pan(&mut self, screen: Point) {
        self.abandon_transient();
        self.drag = Some(Drag::Pan(screen));
    }

    /// Wheel zoom around the pointer. Only active while masking; returns
    /// whether the view changed.
    pub fn wheel(&mut self, screen: Point, notches: f32) -> bool {
        if self.session.mode != EditMode::Masking || notches == 0.0 {
            return false;
        }
        let zoom = &self.config.zoom;
        let before = self.session.view;
        self.session
            .view
            .zoom_at(screen, zoom.wheel_step.powf(notches), zoom.min, zoom.max);
        self.session.view != before
    }

    pub fn undo_last_point(&mut self) -> Option<Point> {
        self.session.selected_wall_mut()?.polygon.points.pop()
    }

    /// Empty the selected polygon. Does nothing unless the user confirmed.
    pub fn clear_polygon(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }
        match self.session.selected_wall_mut() {
            Some(wall) => {
                wall.polygon.points.clear();
                true
            }
            None => false,
        }
    }

    pub fn add_wall(&mut self) -> Result<WallId> {
        if !self.config.features.multi_wall && !self.session.walls().is_empty() {
            return Err(WallMaskError::FeatureDisabled("multi_wall"));
        }
        self.abandon_transient();
        Ok(self.session.add_wall(None))
    }

    pub fn select_wall(&mut self, id: Option<WallId>) -> Result<()> {
        self.abandon_transient();
        self.session.select(id)
    }

    pub fn request_detection(&mut self) -> Result<DetectionTicket> {
        if !self.config.features.auto_detect {
            return Err(WallMaskError::FeatureDisabled("auto_detect"));
        }
        Ok(self.session.begin_detection())
    }

    pub fn complete_detection(
        &mut self,
        ticket: DetectionTicket,
        result: DetectionResult,
    ) -> Result<DetectionOutcome> {
        let multi = self.config.features.multi_wall;
        self.session.apply_detection(ticket, result, multi)
    }

    /// Price for papering a `width` x `height` metre wall with `item`;
    /// `Ok(None)` until both dimensions are positive.
    pub fn estimate(&self, width_meters: f64, height_meters: f64, item: &CatalogItem) -> Result<Option<PriceEstimate>> {
        if !self.config.features.budget {
            return Err(WallMaskError::FeatureDisabled("budget"));
        }
        Ok(PriceEstimate::for_item(width_meters, height_meters, item))
    }

    /// Send a quote request. The session is left as is whatever the outcome.
    pub fn submit_quote(&self, sink: &dyn QuoteSink, request: &QuoteRequest) -> Result<()> {
        if !self.config.features.budget {
            return Err(WallMaskError::FeatureDisabled("budget"));
        }
        pricing::submit_quote(sink, request)
    }

    /// Model-space composite for the current state.
    pub fn render(&self, photo: &RgbaImage, patterns: &PatternLibrary) -> RgbaImage {
        self.session.render(photo, patterns, &self.config.shadow)
    }

    /// Screen-space frame: the composite under the view transform, with the
    /// before/after split applied when enabled.
    pub fn present(&self, photo: &RgbaImage, patterns: &PatternLibrary, viewport: (u32, u32)) -> RgbaImage {
        let frame = self.render(photo, patterns);
        let split = self
            .config
            .features
            .before_after
            .then_some(self.session.slider_x);
        compositor::present(&frame, photo, &self.session.view, viewport, split)
    }
}
