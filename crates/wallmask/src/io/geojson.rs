use std::path::Path;

use geo::EuclideanLength;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use crate::{
    error::{Result, WallMaskError},
    typed_geojson::{TypedFeature, TypedFeatureCollection, TypedGeoJson, WallGeoJson, WallProperties},
    types::{DetectedWall, DetectionResult, Point, Polygon, Wall, WallId},
};

/// GeoJSON rings are explicitly closed; ours are implicit.
fn ring(points: &[Point]) -> Vec<Vec<f64>> {
    let mut ring: Vec<Vec<f64>> = points.iter().map(|p| vec![p.x as f64, p.y as f64]).collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }
    ring
}

fn open_ring(coords: &[Vec<f64>]) -> Vec<Point> {
    let mut points: Vec<Point> = coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| Point::new(c[0] as f32, c[1] as f32))
        .collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Incomplete polygons have no valid GeoJSON ring and export without geometry.
fn polygon_geometry(polygon: &Polygon) -> Option<Geometry> {
    polygon
        .is_complete()
        .then(|| Geometry::new(Value::Polygon(vec![ring(&polygon.points)])))
}

fn perimeter(polygon: &Polygon) -> f64 {
    if !polygon.is_complete() {
        return 0.0;
    }
    polygon.to_geo_polygon().exterior().euclidean_length() as f64
}

fn wall_properties(wall: &Wall) -> WallProperties {
    WallProperties {
        id: wall.id.to_string(),
        name: wall.name.clone(),
        point_count: wall.polygon.len(),
        stroke_count: wall.brush_strokes.len(),
        area: wall.polygon.area() as f64,
        perimeter: perimeter(&wall.polygon),
        pattern_id: wall.pattern_id.clone(),
    }
}

fn metadata(width: u32, height: u32, count: usize) -> JsonObject {
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("image_width".to_string(), width.into());
    foreign_members.insert("image_height".to_string(), height.into());
    foreign_members.insert("wall_count".to_string(), count.into());
    foreign_members
}

fn image_dimensions(collection: &FeatureCollection) -> Result<(u32, u32)> {
    let foreign = collection
        .foreign_members
        .as_ref()
        .ok_or_else(|| WallMaskError::InvalidGeoJson("missing image metadata".into()))?;
    let read = |key: &str| {
        foreign
            .get(key)
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .ok_or_else(|| WallMaskError::InvalidGeoJson(format!("missing or invalid {key}")))
    };
    Ok((read("image_width")?, read("image_height")?))
}

pub fn walls_to_typed_geojson(walls: &[Wall], width: u32, height: u32) -> WallGeoJson {
    let features = walls
        .iter()
        .map(|wall| TypedFeature::new(polygon_geometry(&wall.polygon), wall_properties(wall)))
        .collect();
    TypedGeoJson::FeatureCollection(TypedFeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(metadata(width, height, walls.len())),
    })
}

/// Export wall polygons. Brush strokes are summarised in the properties only.
pub fn walls_to_geojson(walls: &[Wall], width: u32, height: u32) -> FeatureCollection {
    let features = walls
        .iter()
        .map(|wall| Feature {
            bbox: None,
            geometry: polygon_geometry(&wall.polygon),
            id: Some(geojson::feature::Id::String(wall.id.to_string())),
            properties: serde_json::to_value(wall_properties(wall))
                .ok()
                .and_then(|v| v.as_object().cloned()),
            foreign_members: None,
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(metadata(width, height, walls.len())),
    }
}

/// Rebuild walls from an exported collection. Returns the walls and the
/// image dimensions they were drawn against.
pub fn walls_from_geojson_str(geojson_str: &str) -> Result<(Vec<Wall>, (u32, u32))> {
    let collection: FeatureCollection = geojson_str.parse()?;
    let dimensions = image_dimensions(&collection)?;

    let mut walls = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.iter().enumerate() {
        let props = feature.properties.as_ref();
        let text = |key: &str| props.and_then(|p| p.get(key)).and_then(|v| v.as_str());
        let id = text("id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("wall-{}", i + 1));
        let name = text("name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("Wall {}", i + 1));
        let points = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Polygon(rings)) => rings.first().map(|r| open_ring(r)).unwrap_or_default(),
            _ => Vec::new(),
        };
        let mut wall = Wall::new(WallId::new(id), name).with_polygon(points);
        wall.pattern_id = text("pattern_id").map(str::to_string);
        walls.push(wall);
    }
    Ok((walls, dimensions))
}

impl DetectionResult {
    /// Detected outlines in native coordinates as a FeatureCollection.
    pub fn to_geojson(&self) -> FeatureCollection {
        let walls: Vec<Wall> = self
            .walls
            .iter()
            .enumerate()
            .map(|(i, detected)| {
                Wall::new(WallId::new(format!("detected-{}", i + 1)), detected.name.clone())
                    .with_polygon(detected.polygon())
            })
            .collect();
        walls_to_geojson(&walls, self.native_width, self.native_height)
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson())?)
    }

    pub fn save_geojson(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }

    /// Load a result written by [`DetectionResult::save_geojson`]. The
    /// working resolution is not stored and is reported as the native one.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self> {
        let (walls, (width, height)) = walls_from_geojson_str(geojson_str)?;
        let detected = walls
            .into_iter()
            .filter(|w| w.polygon.is_complete())
            .map(|w| DetectedWall {
                name: w.name,
                points: w.polygon.points,
            })
            .collect();
        Ok(Self {
            walls: detected,
            working_width: width,
            working_height: height,
            native_width: width,
            native_height: height,
        })
    }

    pub fn from_geojson_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_geojson_str(&std::fs::read_to_string(path)?)
    }
}
