use std::fmt;

use geo_types::{Coord, LineString};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::geometry;

/// A point in model space: the untransformed pixel space of the photo.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        geometry::distance(*self, *other)
    }

    /// Pure linear scale, used to move detector output between resolutions.
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for Coord<f32> {
    fn from(p: Point) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

/// Axis-aligned bounds in model space. `max` is exclusive for containment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self { min: *first, max: *first };
        for p in &points[1..] {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    /// The preview rectangle covering 10%–90% of a frame in both axes.
    pub fn centered_default(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            min: Point::new(w * 0.1, h * 0.1),
            max: Point::new(w * 0.9, h * 0.9),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Corners in clockwise order starting top-left.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(vec![
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ])
    }
}

/// An implicitly closed ring of points. Fewer than three points is "incomplete"
/// and never defines a region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= 3
    }

    /// Even-odd containment. Incomplete polygons contain nothing.
    pub fn contains(&self, p: Point) -> bool {
        self.is_complete() && geometry::point_in_polygon(p, &self.points)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.points.iter().map(|p| p.scaled(sx, sy)).collect())
    }

    /// Convert to a closed geo-types polygon for area/centroid queries.
    pub fn to_geo_polygon(&self) -> geo_types::Polygon<f32> {
        let coords: Vec<Coord<f32>> = self.points.iter().map(|&p| p.into()).collect();
        geo_types::Polygon::new(LineString::new(coords), vec![])
    }

    pub fn area(&self) -> f32 {
        use geo::Area;
        if !self.is_complete() {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    pub fn centroid(&self) -> Option<Point> {
        use geo::Centroid;
        if !self.is_complete() {
            return None;
        }
        self.to_geo_polygon()
            .centroid()
            .map(|c| Point::new(c.x(), c.y()))
    }

    /// Index of the vertex nearest to `p` within `radius`, if any.
    pub fn nearest_vertex(&self, p: Point, radius: f32) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.distance(&p)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BrushTool {
    Add,
    Remove,
}

/// A freehand path painted with a circular brush. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct BrushStroke {
    pub tool: BrushTool,
    pub radius: f32,
    pub points: Vec<Point>,
}

impl BrushStroke {
    pub fn new(tool: BrushTool, radius: f32, start: Point) -> Self {
        Self {
            tool,
            radius: radius.max(0.0),
            points: vec![start],
        }
    }

    /// Whether `p` lies within `radius` of the stroke path.
    pub fn covers(&self, p: Point) -> bool {
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance(&p) <= self.radius,
            path => path
                .windows(2)
                .any(|seg| geometry::distance_to_segment(p, seg[0], seg[1]) <= self.radius),
        }
    }

    /// Bounds of the painted area (path bounds grown by the radius).
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox = BoundingBox::from_points(&self.points)?;
        bbox.min.x -= self.radius;
        bbox.min.y -= self.radius;
        bbox.max.x += self.radius;
        bbox.max.y += self.radius;
        Some(bbox)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct WallId(pub String);

impl WallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WallId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The mutable unit of masking: a polygon plus an append-only stroke log,
/// with optional per-wall overrides of the session's render parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Wall {
    pub id: WallId,
    pub name: String,
    #[serde(default)]
    pub polygon: Polygon,
    #[serde(default)]
    pub brush_strokes: Vec<BrushStroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_scale: Option<f32>,
}

impl Wall {
    pub fn new(id: impl Into<WallId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            polygon: Polygon::default(),
            brush_strokes: Vec::new(),
            pattern_id: None,
            opacity: None,
            pattern_scale: None,
        }
    }

    pub fn with_polygon(mut self, polygon: impl Into<Polygon>) -> Self {
        self.polygon = polygon.into();
        self
    }

    /// Append a finished stroke. Order is significant for the coverage fold.
    pub fn commit_stroke(&mut self, stroke: BrushStroke) {
        self.brush_strokes.push(stroke);
    }

    /// Untouched walls have neither a usable polygon nor strokes.
    pub fn is_untouched(&self) -> bool {
        self.polygon.is_empty() && self.brush_strokes.is_empty()
    }
}

impl From<String> for WallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One detected outline, in the photo's native coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct DetectedWall {
    pub name: String,
    pub points: Vec<Point>,
}

impl DetectedWall {
    pub fn polygon(&self) -> Polygon {
        Polygon::new(self.points.clone())
    }
}

/// Output of a detection run. Empty means detection failed and the user has
/// to mask manually; it never carries a polygon with fewer than three points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct DetectionResult {
    pub walls: Vec<DetectedWall>,
    pub working_width: u32,
    pub working_height: u32,
    pub native_width: u32,
    pub native_height: u32,
}

impl DetectionResult {
    pub fn empty(working: (u32, u32), native: (u32, u32)) -> Self {
        Self {
            walls: Vec::new(),
            working_width: working.0,
            working_height: working.1,
            native_width: native.0,
            native_height: native.1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    /// The first outline, for single-wall callers.
    pub fn primary(&self) -> Option<&DetectedWall> {
        self.walls.first()
    }
}
