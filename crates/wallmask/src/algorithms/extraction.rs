use imageproc::contours::{BorderType, find_contours};

use crate::{
    error::Result, geometry, segmentation::WallMap, traits::BoundaryDetector, types::Point,
};

/// Suzuki-Abe border following via imageproc. Picks the outer border with
/// the largest enclosed area, so interior holes and small islands are ignored.
#[derive(Debug, Clone)]
pub struct BorderFollowingDetector {
    pub tolerance: f32,
}

impl Default for BorderFollowingDetector {
    fn default() -> Self {
        Self { tolerance: 3.0 }
    }
}

impl BoundaryDetector for BorderFollowingDetector {
    fn name(&self) -> &'static str {
        "border_following"
    }

    fn extract_outline(&self, map: &WallMap) -> Result<Vec<Point>> {
        let contours = find_contours::<i32>(map.as_image());

        let largest = contours
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer)
            .map(|contour| {
                contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x as f32, p.y as f32))
                    .collect::<Vec<_>>()
            })
            .max_by(|a, b| {
                shoelace(a)
                    .partial_cmp(&shoelace(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        Ok(largest
            .map(|ring| geometry::decimate_ring(&ring, self.tolerance))
            .unwrap_or_default())
    }
}

fn shoelace(ring: &[Point]) -> f32 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        sum += (ring[j].x + ring[i].x) * (ring[j].y - ring[i].y);
        j = i;
    }
    (sum / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_largest_region() {
        let map = WallMap::from_fn(100, 100, |x, y| {
            let big = (40..90).contains(&x) && (20..80).contains(&y);
            let small = (5..10).contains(&x) && (5..10).contains(&y);
            big || small
        });
        let outline = BorderFollowingDetector::default().extract_outline(&map).unwrap();
        assert!(outline.len() >= 4);
        assert!(outline.iter().all(|p| p.x >= 40.0 && p.y >= 20.0));
    }

    #[test]
    fn ignores_holes() {
        let map = WallMap::from_fn(60, 60, |x, y| {
            let outer = (5..55).contains(&x) && (5..55).contains(&y);
            let hole = (20..40).contains(&x) && (20..40).contains(&y);
            outer && !hole
        });
        let outline = BorderFollowingDetector { tolerance: 1.0 }.extract_outline(&map).unwrap();
        let xs: Vec<f32> = outline.iter().map(|p| p.x).collect();
        assert!(xs.contains(&5.0) && xs.contains(&54.0));
    }

    #[test]
    fn empty_map_has_no_outline() {
        let map = WallMap::from_fn(10, 10, |_, _| false);
        assert!(BorderFollowingDetector::default().extract_outline(&map).unwrap().is_empty());
    }
}
