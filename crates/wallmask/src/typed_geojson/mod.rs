use std::marker::PhantomData;

use geojson::{Geometry, JsonObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Properties attached to each exported wall feature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS, JsonSchema)]
#[ts(export)]
#[schemars(description = "Properties for wall outline features")]
pub struct WallProperties {
    #[schemars(description = "Stable wall identifier")]
    pub id: String,
    #[schemars(description = "Display name of the wall")]
    pub name: String,
    #[schemars(description = "Number of polygon vertices")]
    pub point_count: usize,
    #[schemars(description = "Number of committed brush strokes")]
    #[serde(default)]
    pub stroke_count: usize,
    #[schemars(description = "Polygon area in square pixels")]
    pub area: f64,
    #[schemars(description = "Polygon perimeter in pixels")]
    pub perimeter: f64,
    #[schemars(description = "Pattern applied to the wall, if any")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
}

pub type WallGeoJson = TypedGeoJson<WallProperties>;

/// A GeoJSON Feature whose properties deserialize into `P`.
#[derive(Serialize, Deserialize, Debug)]
pub struct TypedFeature<P> {
    #[serde(flatten)]
    pub feature: geojson::Feature,
    #[serde(skip)]
    _properties: PhantomData<P>,
}

impl<P> TypedFeature<P>
where
    for<'de> P: Serialize + Deserialize<'de>,
{
    pub fn new(geometry: Option<Geometry>, properties: P) -> Self {
        let feature = geojson::Feature {
            bbox: None,
            geometry,
            id: None,
            properties: serde_json::to_value(properties).ok().and_then(|v| v.as_object().cloned()),
            foreign_members: None,
        };
        Self {
            feature,
            _properties: PhantomData,
        }
    }

    pub fn properties(&self) -> Option<P> {
        self.feature
            .properties
            .as_ref()
            .and_then(|p| serde_json::from_value(serde_json::Value::Object(p.clone())).ok())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TypedFeatureCollection<P> {
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<TypedFeature<P>>,
    pub foreign_members: Option<JsonObject>,
}

#[derive(Serialize, Deserialize, Debug)]
pub enum TypedGeoJson<P> {
    Geometry(Geometry),
    Feature(TypedFeature<P>),
    FeatureCollection(TypedFeatureCollection<P>),
}

impl<P> TypedGeoJson<P> {
    pub fn as_feature_collection(&self) -> Option<&TypedFeatureCollection<P>> {
        match self {
            TypedGeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn into_feature_collection(self) -> Option<TypedFeatureCollection<P>> {
        match self {
            TypedGeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }
}

impl<P> TypedFeatureCollection<P> {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[TypedFeature<P>] {
        &self.features
    }
}

impl WallGeoJson {
    /// The wall with the largest polygon area.
    pub fn largest_wall(&self) -> Option<&TypedFeature<WallProperties>> {
        self.as_feature_collection()?.features.iter().max_by(|a, b| {
            let area_a = a.properties().map(|p| p.area).unwrap_or(0.0);
            let area_b = b.properties().map(|p| p.area).unwrap_or(0.0);
            area_a.total_cmp(&area_b)
        })
    }

    /// Walls that carry brush edits on top of their polygon.
    pub fn brushed_walls(&self) -> Vec<&TypedFeature<WallProperties>> {
        self.as_feature_collection()
            .map(|fc| {
                fc.features
                    .iter()
                    .filter(|f| f.properties().is_some_and(|p| p.stroke_count > 0))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn image_dimensions(&self) -> Option<(u32, u32)> {
        let foreign = self.as_feature_collection()?.foreign_members.as_ref()?;
        let width = foreign.get("image_width")?.as_u64()? as u32;
        let height = foreign.get("image_height")?.as_u64()? as u32;
        Some((width, height))
    }

    pub fn wall_count(&self) -> Option<usize> {
        self.as_feature_collection()?
            .foreign_members
            .as_ref()?
            .get("wall_count")?
            .as_u64()
            .map(|v| v as usize)
    }
}
