use crate::{error::Result, segmentation::WallMap, traits::BoundaryDetector, types::Point};

/// Samples evenly spaced columns and keeps the longest vertical run of wall
/// pixels in each. The outline walks the run tops left to right, then the
/// bottoms right to left. Concave notches between sample columns are lost.
#[derive(Debug, Clone)]
pub struct ColumnScanDetector {
    pub columns: usize,
    /// Runs shorter than this share of the image height are ignored.
    pub min_run_fraction: f32,
}

impl Default for ColumnScanDetector {
    fn default() -> Self {
        Self {
            columns: 40,
            min_run_fraction: 0.03,
        }
    }
}

impl ColumnScanDetector {
    /// Inclusive `(top, bottom)` of the longest wall run in column `x`.
    fn longest_run(map: &WallMap, x: u32) -> Option<(u32, u32)> {
        let mut best: Option<(u32, u32)> = None;
        let mut start: Option<u32> = None;
        for y in 0..=map.height() {
            let wall = y < map.height() && map.is_wall(x as i64, y as i64);
            match (wall, start) {
                (true, None) => start = Some(y),
                (false, Some(top)) => {
                    let bottom = y - 1;
                    if best.is_none_or(|(t, b)| bottom - top > b - t) {
                        best = Some((top, bottom));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        best
    }
}

impl BoundaryDetector for ColumnScanDetector {
    fn name(&self) -> &'static str {
        "column_scan"
    }

    fn extract_outline(&self, map: &WallMap) -> Result<Vec<Point>> {
        let (width, height) = map.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }
        let columns = self.columns.clamp(1, width as usize);
        let min_run = (height as f32 * self.min_run_fraction).max(1.0);
        let step = width as f32 / columns as f32;

        let mut tops = Vec::with_capacity(columns);
        let mut bottoms = Vec::with_capacity(columns);
        for i in 0..columns {
            let x = (((i as f32 + 0.5) * step) as u32).min(width - 1);
            if let Some((top, bottom)) = Self::longest_run(map, x)
                && (bottom - top + 1) as f32 >= min_run
            {
                tops.push(Point::new(x as f32, top as f32));
                bottoms.push(Point::new(x as f32, bottom as f32));
            }
        }

        tops.extend(bottoms.into_iter().rev());
        Ok(tops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_block() -> WallMap {
        WallMap::from_fn(512, 512, |x, y| (100..=400).contains(&x) && (50..=450).contains(&y))
    }

    #[test]
    fn finds_tops_and_bottoms_of_block() {
        let outline = ColumnScanDetector::default().extract_outline(&wall_block()).unwrap();
        assert!(outline.len() >= 6);
        let half = outline.len() / 2;
        assert!(outline[..half].iter().all(|p| p.y == 50.0));
        assert!(outline[half..].iter().all(|p| p.y == 450.0));
        assert!(outline.iter().all(|p| (100.0..=400.0).contains(&p.x)));
        // tops run left to right, bottoms back right to left
        assert!(outline[..half].windows(2).all(|w| w[0].x < w[1].x));
        assert!(outline[half..].windows(2).all(|w| w[0].x > w[1].x));
    }

    #[test]
    fn short_runs_are_ignored() {
        let map = WallMap::from_fn(100, 100, |_, y| y == 10);
        let outline = ColumnScanDetector::default().extract_outline(&map).unwrap();
        assert!(outline.is_empty());
    }

    #[test]
    fn longest_run_wins_over_earlier_short_run() {
        let map = WallMap::from_fn(10, 100, |_, y| y < 5 || (20..80).contains(&y));
        assert_eq!(ColumnScanDetector::longest_run(&map, 3), Some((20, 79)));
    }
}
