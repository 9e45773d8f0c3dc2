use std::{collections::HashMap, path::Path};

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

/// Loaded wallpaper textures keyed by pattern id. A failed load is stored as
/// `None` so the compositor can render that layer as absent.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: HashMap<String, Option<RgbaImage>>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, image: RgbaImage) {
        self.patterns.insert(id.into(), Some(image));
    }

    /// Load a texture from disk. Failures are logged and recorded, never
    /// propagated.
    pub fn load(&mut self, id: impl Into<String>, path: impl AsRef<Path>) -> bool {
        let id = id.into();
        let path = path.as_ref();
        match image::open(path) {
            Ok(image) => {
                debug!(pattern = %id, path = %path.display(), "Pattern loaded");
                self.patterns.insert(id, Some(image.to_rgba8()));
                true
            }
            Err(e) => {
                warn!(pattern = %id, path = %path.display(), error = %e, "Pattern failed to load");
                self.patterns.insert(id, None);
                false
            }
        }
    }

    /// Decode a texture from bytes (e.g. a fetched catalog image).
    pub fn load_from_memory(&mut self, id: impl Into<String>, bytes: &[u8]) -> bool {
        let id = id.into();
        match image::load_from_memory(bytes) {
            Ok(image) => {
                self.patterns.insert(id, Some(image.to_rgba8()));
                true
            }
            Err(e) => {
                warn!(pattern = %id, error = %e, "Pattern failed to decode");
                self.patterns.insert(id, None);
                false
            }
        }
    }

    /// The loaded texture, or `None` if unknown or failed.
    pub fn get(&self, id: &str) -> Option<&RgbaImage> {
        self.patterns.get(id).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.patterns.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }
}

/// Sample a tiled pattern drawn at `scale` for model pixel `(x, y)`.
pub fn sample_tiled(pattern: &RgbaImage, x: u32, y: u32, scale: f32) -> Rgba<u8> {
    let (w, h) = pattern.dimensions();
    if w == 0 || h == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let px = ((x as f32 + 0.5) / scale).floor() as i64;
    let py = ((y as f32 + 0.5) / scale).floor() as i64;
    *pattern.get_pixel(px.rem_euclid(w as i64) as u32, py.rem_euclid(h as i64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_repeat_with_scale() {
        let pattern = RgbaImage::from_fn(2, 2, |x, y| Rgba([(x * 100) as u8, (y * 100) as u8, 0, 255]));
        assert_eq!(sample_tiled(&pattern, 0, 0, 1.0), sample_tiled(&pattern, 2, 2, 1.0));
        // at scale 2 each texel covers two model pixels
        assert_eq!(sample_tiled(&pattern, 0, 0, 2.0), sample_tiled(&pattern, 1, 1, 2.0));
        assert_eq!(sample_tiled(&pattern, 2, 0, 2.0)[0], 100);
    }

    #[test]
    fn failed_load_is_recorded_as_absent() {
        let mut library = PatternLibrary::new();
        assert!(!library.load("missing", "/definitely/not/here.png"));
        assert!(library.contains("missing"));
        assert!(library.get("missing").is_none());
        assert!(!library.load_from_memory("junk", b"not an image"));
        assert!(library.get("junk").is_none());
    }
}
