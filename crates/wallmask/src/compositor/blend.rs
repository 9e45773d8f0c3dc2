use image::Rgba;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    Normal,
    /// Darkens the photo through the pattern, keeping its shading.
    #[default]
    Multiply,
}

/// Composite `top` over `base` with the given mode and layer opacity.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    // Fully transparent top contributes nothing.
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }
    if mode == BlendMode::Normal && opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let opacity = opacity.clamp(0.0, 1.0);
    let base_rgb = [0, 1, 2].map(|i| base[i] as f32 / 255.0);
    let top_rgb = [0, 1, 2].map(|i| top[i] as f32 / 255.0);
    let base_a = base[3] as f32 / 255.0;
    let top_a = (top[3] as f32 / 255.0) * opacity;

    let blended = match mode {
        BlendMode::Normal => top_rgb,
        BlendMode::Multiply => [0, 1, 2].map(|i| base_rgb[i] * top_rgb[i]),
    };

    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let c = (blended[i] * top_a + base_rgb[i] * base_a * (1.0 - top_a)) / out_a;
        (c * 255.0).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
