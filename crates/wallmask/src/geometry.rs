//! Pure geometric helpers shared by the mask model, the detectors and the
//! interaction layer. None of these fail; degenerate input yields a neutral
//! answer (`false`, an empty list, or the input unchanged).

use geo_types::{Coord, LineString};

use crate::types::Point;

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Shortest distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    distance(p, Point::new(a.x + t * abx, a.y + t * aby))
}

/// Ray-casting point-in-polygon test with the even-odd rule.
///
/// The ring is implicitly closed. Rings with fewer than three points contain
/// nothing.
pub fn point_in_polygon(p: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// X coordinates where the horizontal line `y` crosses the ring's edges,
/// sorted ascending. Uses the same half-open edge rule as
/// [`point_in_polygon`] so scanline fills agree with the point test.
pub fn scanline_crossings(y: f32, ring: &[Point]) -> Vec<f32> {
    let mut xs = Vec::new();
    if ring.len() < 3 {
        return xs;
    }
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > y) != (b.y > y) {
            xs.push((b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x);
        }
        j = i;
    }
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs
}

/// Radial-distance decimation of an open polyline: a point is kept only if it
/// lies at least `tolerance` away from the last kept point. The first and last
/// points are always retained.
pub fn radial_decimate(points: &[Point], tolerance: f32) -> Vec<Point> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut kept = vec![first];
    for &p in rest {
        if let Some(last) = kept.last()
            && distance(*last, p) >= tolerance
        {
            kept.push(p);
        }
    }
    if let Some(&last) = points.last()
        && kept.last() != Some(&last)
    {
        kept.push(last);
    }
    kept
}

/// Radial decimation for a closed ring. After decimating as an open
/// polyline, a trailing point within `tolerance` of the first is dropped
/// since the ring closes on its own.
pub fn decimate_ring(points: &[Point], tolerance: f32) -> Vec<Point> {
    let mut kept = radial_decimate(points, tolerance);
    while kept.len() > 3 {
        match (kept.first(), kept.last()) {
            (Some(&first), Some(&last)) if distance(first, last) < tolerance => {
                kept.pop();
            }
            _ => break,
        }
    }
    kept
}

/// Douglas-Peucker simplification using geo's implementation.
pub fn simplify_douglas_peucker(points: &[Point], tolerance: f32) -> Vec<Point> {
    use geo::Simplify;
    if points.len() < 3 {
        return points.to_vec();
    }
    let line = LineString::new(points.iter().map(|&p| Coord::from(p)).collect());
    line.simplify(&tolerance)
        .coords()
        .map(|c| Point::new(c.x, c.y))
        .collect()
}

/// Map points from one resolution to another by a pure linear scale.
pub fn scale_points(points: &[Point], from: (u32, u32), to: (u32, u32)) -> Vec<Point> {
    if from.0 == 0 || from.1 == 0 {
        return Vec::new();
    }
    let sx = to.0 as f32 / from.0 as f32;
    let sy = to.1 as f32 / from.1 as f32;
    points.iter().map(|p| p.scaled(sx, sy)).collect()
}

/// Remove consecutive duplicates, including a trailing copy of the first point.
pub fn dedup_ring(points: &mut Vec<Point>) {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn even_odd_handles_concave_ring() {
        // U shape opening upwards
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 30.0),
            Point::new(20.0, 30.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 40.0),
            Point::new(0.0, 40.0),
        ];
        assert!(point_in_polygon(Point::new(5.0, 10.0), &ring));
        assert!(!point_in_polygon(Point::new(15.0, 10.0), &ring));
        assert!(point_in_polygon(Point::new(15.0, 35.0), &ring));
    }

    #[test]
    fn scanline_agrees_with_point_test() {
        let ring = vec![
            Point::new(2.0, 1.0),
            Point::new(18.0, 4.0),
            Point::new(12.0, 19.0),
            Point::new(3.0, 14.0),
        ];
        for y in 0..20 {
            let cy = y as f32 + 0.5;
            let xs = scanline_crossings(cy, &ring);
            for x in 0..20 {
                let cx = x as f32 + 0.5;
                let right = xs.iter().filter(|&&xc| xc > cx).count();
                assert_eq!(
                    right % 2 == 1,
                    point_in_polygon(Point::new(cx, cy), &ring),
                    "mismatch at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_relative_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_relative_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
        assert_relative_eq!(distance_to_segment(Point::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn radial_decimation_keeps_endpoints() {
        let points: Vec<Point> = (0..=10).map(|i| Point::new(i as f32, 0.0)).collect();
        let kept = radial_decimate(&points, 3.0);
        assert_eq!(kept.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(kept.last(), Some(&Point::new(10.0, 0.0)));
        assert_eq!(
            kept,
            vec![
                Point::new(0.0, 0.0),
                Point::new(3.0, 0.0),
                Point::new(6.0, 0.0),
                Point::new(9.0, 0.0),
                Point::new(10.0, 0.0),
            ]
        );
    }

    #[test]
    fn ring_decimation_drops_closing_point() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 1.0),
        ];
        let kept = decimate_ring(&ring, 3.0);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept.last(), Some(&Point::new(0.0, 10.0)));
    }

    #[test]
    fn scaling_is_linear() {
        let raw = vec![Point::new(100.0, 50.0), Point::new(400.0, 450.0)];
        let scaled = scale_points(&raw, (512, 512), (1024, 768));
        for (r, s) in raw.iter().zip(&scaled) {
            assert_relative_eq!(s.x, r.x * (1024.0 / 512.0));
            assert_relative_eq!(s.y, r.y * (768.0 / 512.0));
        }
    }

    #[test]
    fn douglas_peucker_collapses_collinear_points() {
        let points: Vec<Point> = (0..=10).map(|i| Point::new(i as f32, 0.0)).collect();
        let simplified = simplify_douglas_peucker(&points, 0.5);
        assert_eq!(simplified, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
    }
}
