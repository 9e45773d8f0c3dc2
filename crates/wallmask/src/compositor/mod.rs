//! Per-frame compositing of wallpaper patterns onto the photo.
//!
//! Every function here is a pure function of its inputs: identical inputs
//! give pixel-identical frames.

pub mod blend;
pub mod pattern;

pub use blend::{BlendMode, blend_pixel};
pub use pattern::{PatternLibrary, sample_tiled};

use image::{GrayImage, Rgba, RgbaImage};
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    config::ShadowSettings, interaction::viewport::ViewTransform, mask::covered_rows,
    types::Point,
};

pub const MIN_PATTERN_SCALE: f32 = 1e-3;

/// Resolved render parameters for one wall layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderParams {
    pub opacity: f32,
    pub scale: f32,
    pub blend: BlendMode,
}

impl RenderParams {
    /// Clamp opacity to `[0, 1]` and scale to a positive epsilon. Non-finite
    /// values fall back to the given defaults.
    pub fn sanitized(opacity: f32, scale: f32, default_opacity: f32, default_scale: f32) -> Self {
        let opacity = if opacity.is_finite() { opacity } else { default_opacity };
        let scale = if scale.is_finite() { scale } else { default_scale };
        Self {
            opacity: opacity.clamp(0.0, 1.0),
            scale: scale.max(MIN_PATTERN_SCALE),
            blend: BlendMode::Multiply,
        }
    }
}

/// One wall's inputs to the frame: its rasterized coverage, the pattern to
/// show in it, and how to blend.
#[derive(Debug, Clone)]
pub struct WallLayer<'a> {
    pub mask: GrayImage,
    pub pattern: Option<&'a RgbaImage>,
    pub params: RenderParams,
}

/// Build a wall's finished layer: the tiled pattern clipped to the mask
/// (source-in), darkened by the vertical shadow gradient where the pattern
/// is opaque (source-atop). A missing pattern gives a fully transparent
/// layer.
pub fn render_wall_layer(
    mask: &GrayImage,
    pattern: Option<&RgbaImage>,
    scale: f32,
    shadow: &ShadowSettings,
) -> RgbaImage {
    let (width, height) = mask.dimensions();
    let mut layer = RgbaImage::new(width, height);
    let Some(pattern) = pattern else {
        return layer;
    };
    let Some((top, bottom)) = covered_rows(mask) else {
        return layer;
    };
    let scale = scale.max(MIN_PATTERN_SCALE);
    let span = (bottom - top).max(1) as f32;

    layer
        .par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            let shade = if shadow.enabled && (top..=bottom).contains(&y) {
                let t = (y - top) as f32 / span;
                (shadow.top_alpha + (shadow.bottom_alpha - shadow.top_alpha) * t).clamp(0.0, 1.0)
            } else {
                0.0
            };
            for x in 0..width {
                let coverage = mask.get_pixel(x, y)[0];
                if coverage == 0 {
                    continue;
                }
                let texel = sample_tiled(pattern, x, y, scale);
                let alpha = (texel[3] as u32 * coverage as u32 / 255) as u8;
                if alpha == 0 {
                    continue;
                }
                let darken = |c: u8| (c as f32 * (1.0 - shade)).round() as u8;
                let i = x as usize * 4;
                row[i..i + 4].copy_from_slice(&[
                    darken(texel[0]),
                    darken(texel[1]),
                    darken(texel[2]),
                    alpha,
                ]);
            }
        });
    layer
}

/// Composite wall layers over the photo in list order. Each layer is blended
/// against the original photo pixel, so where walls overlap the last one in
/// the list wins.
pub fn compose(photo: &RgbaImage, layers: &[(RgbaImage, RenderParams)]) -> RgbaImage {
    let (width, height) = photo.dimensions();
    let mut frame = photo.clone();
    let layers: Vec<_> = layers
        .iter()
        .filter(|(layer, _)| layer.dimensions() == (width, height))
        .collect();
    frame
        .par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for x in 0..width {
                let base = *photo.get_pixel(x, y);
                let mut out = base;
                for (layer, params) in &layers {
                    let top = *layer.get_pixel(x, y);
                    if top[3] == 0 {
                        continue;
                    }
                    out = blend_pixel(base, top, params.blend, params.opacity);
                }
                let i = x as usize * 4;
                row[i..i + 4].copy_from_slice(&out.0);
            }
        });
    frame
}

/// Render every wall layer and composite the frame in model space.
pub fn render(photo: &RgbaImage, walls: &[WallLayer<'_>], shadow: &ShadowSettings) -> RgbaImage {
    let layers: Vec<(RgbaImage, RenderParams)> = walls
        .iter()
        .map(|wall| {
            (
                render_wall_layer(&wall.mask, wall.pattern, wall.params.scale, shadow),
                wall.params,
            )
        })
        .collect();
    compose(photo, &layers)
}

/// Map the model-space frame to a screen viewport through the view
/// transform. With a split position, screen columns left of it show the
/// untouched photo and the rest show the composite. Pixels outside the
/// photo are transparent.
pub fn present(
    frame: &RgbaImage,
    photo: &RgbaImage,
    view: &ViewTransform,
    viewport: (u32, u32),
    split_x: Option<f32>,
) -> RgbaImage {
    let (vw, vh) = viewport;
    let (fw, fh) = frame.dimensions();
    let mut screen = RgbaImage::new(vw, vh);
    if vw == 0 || vh == 0 {
        return screen;
    }
    screen
        .par_chunks_mut(vw as usize * 4)
        .enumerate()
        .for_each(|(sy, row)| {
            for sx in 0..vw {
                let centre = Point::new(sx as f32 + 0.5, sy as f32 + 0.5);
                let model = view.screen_to_model(centre);
                if model.x < 0.0 || model.y < 0.0 {
                    continue;
                }
                let (mx, my) = (model.x.floor() as u32, model.y.floor() as u32);
                if mx >= fw || my >= fh {
                    continue;
                }
                let source = match split_x {
                    Some(split) if centre.x < split => photo,
                    _ => frame,
                };
                let pixel = source
                    .get_pixel_checked(mx, my)
                    .copied()
                    .unwrap_or(Rgba([0, 0, 0, 0]));
                let i = sx as usize * 4;
                row[i..i + 4].copy_from_slice(&pixel.0);
            }
        });
    screen
}
