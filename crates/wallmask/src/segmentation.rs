//! Binary wall/non-wall maps, the input of every boundary detector.

use image::{GrayImage, Luma, imageops::FilterType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WallMaskError};

pub const WALL: u8 = 255;

/// Which classifier labels count as "wall".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "scheme", content = "classes")]
pub enum LabelScheme {
    /// ADE20K: wall (0) and building (1).
    #[default]
    Ade20k,
    /// PASCAL VOC has no wall class; background (0) is the closest proxy.
    PascalVoc,
    Custom(Vec<u8>),
}

impl LabelScheme {
    pub fn wall_classes(&self) -> &[u8] {
        match self {
            LabelScheme::Ade20k => &[0, 1],
            LabelScheme::PascalVoc => &[0],
            LabelScheme::Custom(classes) => classes,
        }
    }

    pub fn is_wall(&self, label: u8) -> bool {
        self.wall_classes().contains(&label)
    }
}

/// A binary segmentation: `255` marks wall pixels, `0` everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct WallMap {
    image: GrayImage,
}

impl WallMap {
    /// Wrap an image, treating any non-zero pixel as wall.
    pub fn new(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel[0] != 0 {
                pixel[0] = WALL;
            }
        }
        Self { image }
    }

    /// Threshold a grayscale probability mask: pixels above `threshold` are wall.
    pub fn from_mask(mask: &GrayImage, threshold: u8) -> Self {
        Self {
            image: imageproc::contrast::threshold(mask, threshold),
        }
    }

    /// Build from a flat row-major label map produced by a semantic classifier.
    pub fn from_labels(
        width: u32,
        height: u32,
        labels: &[u8],
        scheme: &LabelScheme,
    ) -> Result<Self> {
        let expected = width as usize * height as usize;
        if labels.len() != expected {
            return Err(WallMaskError::InvalidSegmentation(format!(
                "expected {expected} labels for {width}x{height}, got {}",
                labels.len()
            )));
        }
        let image = GrayImage::from_fn(width, height, |x, y| {
            let label = labels[(y * width + x) as usize];
            Luma([if scheme.is_wall(label) { WALL } else { 0 }])
        });
        Ok(Self { image })
    }

    pub fn from_fn(width: u32, height: u32, is_wall: impl Fn(u32, u32) -> bool) -> Self {
        Self {
            image: GrayImage::from_fn(width, height, |x, y| {
                Luma([if is_wall(x, y) { WALL } else { 0 }])
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Out-of-bounds coordinates are never wall.
    pub fn is_wall(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        self.image.get_pixel(x as u32, y as u32)[0] != 0
    }

    /// Nearest-neighbour resample, keeping the map binary.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Self {
            image: image::imageops::resize(&self.image, width, height, FilterType::Nearest),
        }
    }

    /// Resample to the square working resolution detectors run at.
    pub fn to_working_resolution(&self, size: u32) -> Self {
        self.resized(size, size)
    }

    pub fn wall_pixel_count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn wall_fraction(&self) -> f32 {
        let total = self.width() as usize * self.height() as usize;
        if total == 0 {
            return 0.0;
        }
        self.wall_pixel_count() as f32 / total as f32
    }

    /// Mean position of all wall pixels.
    pub fn centroid(&self) -> Option<(f32, f32)> {
        let (mut sx, mut sy, mut n) = (0.0f64, 0.0f64, 0usize);
        for (x, y, p) in self.image.enumerate_pixels() {
            if p[0] != 0 {
                sx += x as f64;
                sy += y as f64;
                n += 1;
            }
        }
        (n > 0).then(|| ((sx / n as f64) as f32, (sy / n as f64) as f32))
    }

    /// Inclusive pixel bounds `(min_x, min_y, max_x, max_y)` of the wall pixels.
    pub fn wall_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in self.image.enumerate_pixels() {
            if p[0] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ade20k_treats_wall_and_building_as_wall() {
        let labels = [0u8, 1, 2, 3];
        let map = WallMap::from_labels(2, 2, &labels, &LabelScheme::Ade20k).unwrap();
        assert!(map.is_wall(0, 0));
        assert!(map.is_wall(1, 0));
        assert!(!map.is_wall(0, 1));
        assert!(!map.is_wall(1, 1));
    }

    #[test]
    fn label_length_mismatch_is_an_error() {
        let err = WallMap::from_labels(3, 3, &[0u8; 4], &LabelScheme::PascalVoc).unwrap_err();
        assert!(matches!(err, WallMaskError::InvalidSegmentation(_)));
    }

    #[test]
    fn nearest_resize_stays_binary() {
        let map = WallMap::from_fn(100, 100, |x, _| x < 50);
        let small = map.resized(10, 10);
        assert!(small.as_image().pixels().all(|p| p[0] == 0 || p[0] == WALL));
        assert!(small.is_wall(2, 5));
        assert!(!small.is_wall(8, 5));
    }

    #[test]
    fn centroid_and_bounds_of_rectangle() {
        let map = WallMap::from_fn(50, 50, |x, y| (10..=20).contains(&x) && (5..=15).contains(&y));
        let (cx, cy) = map.centroid().unwrap();
        assert!((cx - 15.0).abs() < 1e-4);
        assert!((cy - 10.0).abs() < 1e-4);
        assert_eq!(map.wall_bounds(), Some((10, 5, 20, 15)));
        assert!(!map.is_wall(-1, 10));
    }

    #[test]
    fn empty_map_has_no_centroid() {
        let map = WallMap::from_fn(8, 8, |_, _| false);
        assert_eq!(map.centroid(), None);
        assert_eq!(map.wall_fraction(), 0.0);
    }
}
