use std::collections::HashMap;

use image::Luma;
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::segmentation::WallMap;

/// Split a map into its 8-connected wall regions, largest first. Regions
/// smaller than `min_pixels` are dropped.
pub fn split_components(map: &WallMap, min_pixels: usize) -> Vec<WallMap> {
    let labels = connected_components(map.as_image(), Connectivity::Eight, Luma([0u8]));

    let mut counts: HashMap<u32, usize> = HashMap::new();
    for pixel in labels.pixels() {
        if pixel[0] != 0 {
            *counts.entry(pixel[0]).or_default() += 1;
        }
    }

    let mut regions: Vec<(u32, usize)> = counts
        .into_iter()
        .filter(|&(_, count)| count >= min_pixels.max(1))
        .collect();
    regions.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let (width, height) = map.dimensions();
    regions
        .into_iter()
        .map(|(label, _)| WallMap::from_fn(width, height, |x, y| labels.get_pixel(x, y)[0] == label))
        .collect()
}
