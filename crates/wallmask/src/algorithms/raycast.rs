use std::f32::consts::TAU;

use crate::{error::Result, segmentation::WallMap, traits::BoundaryDetector, types::Point};

/// Casts rays from a hub inside the wall region and records, per ray, the
/// last wall pixel before the first non-wall pixel or the image border.
///
/// The hub is the centroid of the wall pixels. For concave regions the
/// centroid can fall outside the wall, in which case the nearest wall pixel
/// found by an expanding square ring search is used instead.
#[derive(Debug, Clone)]
pub struct CentroidRaycastDetector {
    pub rays: usize,
}

impl Default for CentroidRaycastDetector {
    fn default() -> Self {
        Self { rays: 72 }
    }
}

impl CentroidRaycastDetector {
    fn find_hub(map: &WallMap) -> Option<(i64, i64)> {
        let (cx, cy) = map.centroid()?;
        let hub = (cx.floor() as i64, cy.floor() as i64);
        if map.is_wall(hub.0, hub.1) {
            return Some(hub);
        }
        let max_radius = map.width().max(map.height()) as i64;
        for r in 1..=max_radius {
            for dx in -r..=r {
                for dy in -r..=r {
                    if dx.abs() != r && dy.abs() != r {
                        continue;
                    }
                    if map.is_wall(hub.0 + dx, hub.1 + dy) {
                        return Some((hub.0 + dx, hub.1 + dy));
                    }
                }
            }
        }
        None
    }
}

impl BoundaryDetector for CentroidRaycastDetector {
    fn name(&self) -> &'static str {
        "centroid_raycast"
    }

    fn extract_outline(&self, map: &WallMap) -> Result<Vec<Point>> {
        let Some((hx, hy)) = Self::find_hub(map) else {
            return Ok(Vec::new());
        };
        let rays = self.rays.max(3);
        let max_steps = (map.width() + map.height()) as usize;
        let (ox, oy) = (hx as f32 + 0.5, hy as f32 + 0.5);

        let mut outline = Vec::with_capacity(rays);
        for i in 0..rays {
            let theta = i as f32 * TAU / rays as f32;
            let (dy, dx) = theta.sin_cos();
            let mut edge = (hx, hy);
            for step in 1..=max_steps {
                let px = (ox + dx * step as f32).floor() as i64;
                let py = (oy + dy * step as f32).floor() as i64;
                if !map.is_wall(px, py) {
                    break;
                }
                edge = (px, py);
            }
            outline.push(Point::new(edge.0 as f32, edge.1 as f32));
        }
        outline.dedup();
        Ok(outline)
    }
}
