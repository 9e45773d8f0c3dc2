use image::GrayImage;

use crate::{error::Result, segmentation::WallMap, types::Point};

/// Trait for cleaning a segmentation before boundary extraction
pub trait ImagePreprocessor: Send + Sync {
    /// Preprocess the input image (e.g., threshold, morphological close)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for turning a wall map into one outline ring
pub trait BoundaryDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extract an implicitly closed outline in the map's pixel space.
    /// An empty or short result means the strategy found nothing usable.
    fn extract_outline(&self, map: &WallMap) -> Result<Vec<Point>>;
}

/// Trait for outline point reduction
pub trait OutlineSimplifier: Send + Sync {
    fn simplify(&self, outline: Vec<Point>) -> Vec<Point>;
}
