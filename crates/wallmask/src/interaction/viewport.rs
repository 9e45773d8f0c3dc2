use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Point;

/// The shared content transform: `screen = model * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViewTransform {
    pub zoom: f32,
    pub pan: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::default(),
        }
    }
}

impl ViewTransform {
    pub fn model_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    pub fn screen_to_model(&self, p: Point) -> Point {
        let zoom = self.zoom.max(f32::EPSILON);
        Point::new((p.x - self.pan.x) / zoom, (p.y - self.pan.y) / zoom)
    }

    /// A screen-constant length expressed in model units.
    pub fn screen_to_model_len(&self, len: f32) -> f32 {
        len / self.zoom.max(f32::EPSILON)
    }

    /// Multiply zoom by `factor` keeping the model point under `anchor`
    /// (screen space) fixed. The resulting zoom is clamped to `[min, max]`.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32, min: f32, max: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let fixed = self.screen_to_model(anchor);
        self.zoom = (self.zoom * factor).clamp(min, max);
        self.pan = Point::new(anchor.x - fixed.x * self.zoom, anchor.y - fixed.y * self.zoom);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.x += dx;
        self.pan.y += dy;
    }
}

/// A pointer position in both coordinate spaces, produced by
/// [`PointerEvent::from_screen`] so tools never convert ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PointerEvent {
    pub screen_x: f32,
    pub screen_y: f32,
    pub model_x: f32,
    pub model_y: f32,
}

impl PointerEvent {
    pub fn from_screen(screen: Point, view: &ViewTransform) -> Self {
        let model = view.screen_to_model(screen);
        Self {
            screen_x: screen.x,
            screen_y: screen.y,
            model_x: model.x,
            model_y: model.y,
        }
    }

    pub fn screen(&self) -> Point {
        Point::new(self.screen_x, self.screen_y)
    }

    pub fn model(&self) -> Point {
        Point::new(self.model_x, self.model_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn transforms_are_inverse() {
        let view = ViewTransform {
            zoom: 2.5,
            pan: Point::new(-40.0, 12.0),
        };
        let model = Point::new(123.0, 45.5);
        let back = view.screen_to_model(view.model_to_screen(model));
        assert_relative_eq!(back.x, model.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, model.y, epsilon = 1e-4);
    }

    #[test]
    fn zoom_keeps_anchor_fixed_and_clamps() {
        let mut view = ViewTransform::default();
        let anchor = Point::new(200.0, 150.0);
        let before = view.screen_to_model(anchor);
        view.zoom_at(anchor, 1.1, 0.5, 5.0);
        let after = view.screen_to_model(anchor);
        assert_relative_eq!(before.x, after.x, epsilon = 1e-3);
        assert_relative_eq!(before.y, after.y, epsilon = 1e-3);

        for _ in 0..100 {
            view.zoom_at(anchor, 1.1, 0.5, 5.0);
        }
        assert_relative_eq!(view.zoom, 5.0);
        for _ in 0..100 {
            view.zoom_at(anchor, 1.0 / 1.1, 0.5, 5.0);
        }
        assert_relative_eq!(view.zoom, 0.5);
    }

    #[test]
    fn pointer_event_carries_both_spaces() {
        let view = ViewTransform {
            zoom: 2.0,
            pan: Point::new(10.0, 20.0),
        };
        let event = PointerEvent::from_screen(Point::new(30.0, 40.0), &view);
        assert_eq!(event.model(), Point::new(10.0, 10.0));
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["screenX"], 30.0);
        assert_eq!(json["modelY"], 10.0);
    }
}
