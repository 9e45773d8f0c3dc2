use crate::{
    error::Result, geometry, segmentation::WallMap, traits::BoundaryDetector, types::Point,
};

/// Clockwise neighbourhood starting west.
const DIRS: [(i64, i64); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

fn dir_index(dx: i64, dy: i64) -> Option<usize> {
    DIRS.iter().position(|&d| d == (dx, dy))
}

/// Moore-neighbourhood boundary tracing of the first wall region in raster
/// order. The traced ring is radially decimated with `tolerance`.
#[derive(Debug, Clone)]
pub struct MooreTraceDetector {
    pub tolerance: f32,
    /// Safety budget for pathological shapes that never return to the start.
    pub max_steps: usize,
}

impl Default for MooreTraceDetector {
    fn default() -> Self {
        Self {
            tolerance: 3.0,
            max_steps: 200_000,
        }
    }
}

impl MooreTraceDetector {
    fn start_pixel(map: &WallMap) -> Option<(i64, i64)> {
        (0..map.height() as i64)
            .flat_map(|y| (0..map.width() as i64).map(move |x| (x, y)))
            .find(|&(x, y)| map.is_wall(x, y))
    }

    pub fn trace(&self, map: &WallMap) -> Vec<Point> {
        let Some(start) = Self::start_pixel(map) else {
            return Vec::new();
        };
        let mut contour = vec![Point::new(start.0 as f32, start.1 as f32)];
        let mut current = start;
        // Raster order guarantees the west neighbour of the start is background.
        let mut backtrack = 0usize;

        for _ in 0..self.max_steps {
            let mut next = None;
            for k in 1..=8 {
                let idx = (backtrack + k) % 8;
                let (dx, dy) = DIRS[idx];
                let candidate = (current.0 + dx, current.1 + dy);
                if map.is_wall(candidate.0, candidate.1) {
                    next = Some((candidate, (backtrack + k - 1) % 8));
                    break;
                }
            }
            // isolated pixel
            let Some((candidate, previous)) = next else {
                break;
            };

            let (bx, by) = DIRS[previous];
            let back_pixel = (current.0 + bx, current.1 + by);
            backtrack = dir_index(back_pixel.0 - candidate.0, back_pixel.1 - candidate.1)
                .unwrap_or(0);
            current = candidate;

            if current == start {
                break;
            }
            contour.push(Point::new(current.0 as f32, current.1 as f32));
        }
        contour
    }
}

impl BoundaryDetector for MooreTraceDetector {
    fn name(&self) -> &'static str {
        "moore_trace"
    }

    fn extract_outline(&self, map: &WallMap) -> Result<Vec<Point>> {
        let contour = self.trace(map);
        Ok(geometry::decimate_ring(&contour, self.tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_border(map: &WallMap, p: &Point) -> bool {
        let (x, y) = (p.x as i64, p.y as i64);
        map.is_wall(x, y)
            && DIRS.iter().any(|(dx, dy)| !map.is_wall(x + dx, y + dy))
    }

    #[test]
    fn traces_rectangle_perimeter() {
        let map = WallMap::from_fn(30, 30, |x, y| (10..20).contains(&x) && (10..20).contains(&y));
        let contour = MooreTraceDetector::default().trace(&map);
        assert_eq!(contour.len(), 36);
        assert!(contour.iter().all(|p| is_border(&map, p)));
        assert_eq!(contour[0], Point::new(10.0, 10.0));
        assert_eq!(contour[1], Point::new(11.0, 10.0));
    }

    #[test]
    fn decimated_outline_stays_on_border() {
        let map = WallMap::from_fn(64, 64, |x, y| {
            let (dx, dy) = (x as f32 - 32.0, y as f32 - 32.0);
            dx * dx + dy * dy <= 400.0
        });
        let outline = MooreTraceDetector::default().extract_outline(&map).unwrap();
        assert!(outline.len() >= 8);
        assert!(outline.iter().all(|p| is_border(&map, p)));
        for pair in outline[..outline.len() - 1].windows(2) {
            assert!(pair[0].distance(&pair[1]) >= 3.0);
        }
    }

    #[test]
    fn single_pixel_and_empty_maps() {
        let dot = WallMap::from_fn(5, 5, |x, y| x == 2 && y == 2);
        assert_eq!(MooreTraceDetector::default().trace(&dot), vec![Point::new(2.0, 2.0)]);
        let empty = WallMap::from_fn(5, 5, |_, _| false);
        assert!(MooreTraceDetector::default().trace(&empty).is_empty());
    }

    #[test]
    fn step_budget_bounds_the_walk() {
        let map = WallMap::from_fn(100, 100, |x, y| (5..95).contains(&x) && (5..95).contains(&y));
        let detector = MooreTraceDetector {
            tolerance: 0.0,
            max_steps: 10,
        };
        assert_eq!(detector.trace(&map).len(), 11);
    }
}
