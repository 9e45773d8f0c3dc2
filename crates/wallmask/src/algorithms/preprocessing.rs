use image::GrayImage;
use imageproc::distance_transform::Norm;

use crate::{error::Result, traits::ImagePreprocessor};

/// Simple thresholding preprocessor
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(image, self.threshold))
    }
}

/// Gaussian blur, for soft probability masks before thresholding
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::filter::gaussian_blur_f32(image, self.sigma))
    }
}

/// Dilate then erode: fills pin holes left by furniture and fixtures.
#[derive(Debug, Clone)]
pub struct MorphologicalClose {
    pub radius: u8,
}

impl Default for MorphologicalClose {
    fn default() -> Self {
        Self { radius: 2 }
    }
}

impl ImagePreprocessor for MorphologicalClose {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if self.radius == 0 {
            return Ok(image.clone());
        }
        Ok(imageproc::morphology::close(image, Norm::LInf, self.radius))
    }
}

/// Erode then dilate: drops speckles misclassified as wall.
#[derive(Debug, Clone)]
pub struct MorphologicalOpen {
    pub radius: u8,
}

impl Default for MorphologicalOpen {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl ImagePreprocessor for MorphologicalOpen {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if self.radius == 0 {
            return Ok(image.clone());
        }
        Ok(imageproc::morphology::open(image, Norm::LInf, self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn close_fills_single_pixel_hole() {
        let mut image = GrayImage::from_pixel(20, 20, Luma([255u8]));
        image.put_pixel(10, 10, Luma([0u8]));
        let closed = MorphologicalClose { radius: 1 }.preprocess(&image).unwrap();
        assert_eq!(closed.get_pixel(10, 10)[0], 255);
    }

    #[test]
    fn open_removes_speckle() {
        let mut image = GrayImage::new(20, 20);
        image.put_pixel(5, 5, Luma([255u8]));
        let opened = MorphologicalOpen { radius: 1 }.preprocess(&image).unwrap();
        assert_eq!(opened.get_pixel(5, 5)[0], 0);
    }

    #[test]
    fn threshold_binarizes() {
        let image = GrayImage::from_fn(4, 1, |x, _| Luma([(x * 80) as u8]));
        let binary = ThresholdPreprocessor { threshold: 100 }.preprocess(&image).unwrap();
        let values: Vec<u8> = binary.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }
}
