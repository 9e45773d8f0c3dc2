//! The detection service boundary: base64 image in, native-space outlines out.
//!
//! Detection never blocks the interaction loop. [`detect_in_background`] runs
//! a pipeline on tokio's blocking pool; the session pairs each request with a
//! ticket so results for a replaced photo are discarded.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::{
    config::DetectionConfig,
    error::{Result, WallMaskError},
    pipeline::{DetectionPipeline, builder::DetectionPipelineBuilder},
    segmentation::WallMap,
    types::{DetectedWall, DetectionResult},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DetectionRequest {
    /// Base64 PNG/JPEG of the segmentation mask, optionally as a data URL.
    pub image_data: String,
    pub native_width: u32,
    pub native_height: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct DetectionResponse {
    /// Empty on failure.
    pub polygons: Vec<DetectedWall>,
}

impl From<DetectionResult> for DetectionResponse {
    fn from(result: DetectionResult) -> Self {
        Self {
            polygons: result.walls,
        }
    }
}

pub trait DetectionService: Send + Sync {
    /// Never errors: failures produce an empty response so the caller can
    /// fall back to manual masking.
    fn detect(&self, request: &DetectionRequest) -> DetectionResponse;
}

/// In-process service backed by a [`DetectionPipeline`].
pub struct LocalDetectionService {
    pipeline: Arc<DetectionPipeline>,
    working_size: u32,
    threshold: u8,
}

impl LocalDetectionService {
    pub fn new(pipeline: Arc<DetectionPipeline>, working_size: u32, threshold: u8) -> Self {
        Self {
            pipeline,
            working_size: working_size.max(1),
            threshold,
        }
    }

    pub fn from_config(config: &DetectionConfig, multi_wall: bool) -> Self {
        let pipeline = DetectionPipelineBuilder::from_config(config)
            .multi_wall(multi_wall)
            .build();
        Self::new(Arc::new(pipeline), config.working_size, 127)
    }

    fn run(&self, request: &DetectionRequest) -> Result<DetectionResult> {
        let map = decode_wall_map(&request.image_data, self.threshold)?
            .to_working_resolution(self.working_size);
        self.pipeline
            .process(&map, (request.native_width, request.native_height))
    }
}

impl DetectionService for LocalDetectionService {
    fn detect(&self, request: &DetectionRequest) -> DetectionResponse {
        match self.run(request) {
            Ok(result) => {
                info!(walls = result.walls.len(), "Wall detection complete");
                result.into()
            }
            Err(e) => {
                warn!(error = %e, "Wall detection failed");
                DetectionResponse::default()
            }
        }
    }
}

/// Decode a base64 (or data URL) encoded mask image into a wall map.
pub fn decode_wall_map(image_data: &str, threshold: u8) -> Result<WallMap> {
    let payload = match image_data.split_once(";base64,") {
        Some((_, data)) => data,
        None => image_data,
    };
    let bytes = STANDARD.decode(payload.trim())?;
    let image = image::load_from_memory(&bytes)?.to_luma8();
    Ok(WallMap::from_mask(&image, threshold))
}

/// Run a pipeline off the async executor.
pub async fn detect_in_background(
    pipeline: Arc<DetectionPipeline>,
    map: WallMap,
    native: (u32, u32),
) -> Result<DetectionResult> {
    tokio::task::spawn_blocking(move || pipeline.process(&map, native))
        .await
        .map_err(|e| WallMaskError::DetectionFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn encoded_mask(data_url: bool) -> String {
        let image = GrayImage::from_fn(64, 64, |x, y| {
            let wall = (8..56).contains(&x) && (4..60).contains(&y);
            Luma([if wall { 255 } else { 0 }])
        });
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let encoded = STANDARD.encode(bytes);
        if data_url {
            format!("data:image/png;base64,{encoded}")
        } else {
            encoded
        }
    }

    #[test]
    fn local_service_detects_and_scales() {
        let service = LocalDetectionService::from_config(&DetectionConfig::default(), false);
        let response = service.detect(&DetectionRequest {
            image_data: encoded_mask(true),
            native_width: 1280,
            native_height: 960,
        });
        assert_eq!(response.polygons.len(), 1);
        let points = &response.polygons[0].points;
        assert!(points.len() >= 3);
        assert!(points.iter().all(|p| p.x <= 1280.0 && p.y <= 960.0));
    }

    #[test]
    fn garbage_input_yields_empty_response() {
        let service = LocalDetectionService::from_config(&DetectionConfig::default(), false);
        let response = service.detect(&DetectionRequest {
            image_data: "not base64!".into(),
            native_width: 10,
            native_height: 10,
        });
        assert!(response.polygons.is_empty());
    }

    #[tokio::test]
    async fn background_detection_matches_inline() {
        let pipeline = Arc::new(DetectionPipelineBuilder::new().build());
        let map = decode_wall_map(&encoded_mask(false), 127).unwrap();
        let inline = pipeline.process(&map, (128, 128)).unwrap();
        let background = detect_in_background(pipeline, map, (128, 128)).await.unwrap();
        assert_eq!(inline, background);
    }
}
