use crate::{geometry, traits::OutlineSimplifier, types::Point};

/// Douglas-Peucker simplifier using geo crate's implementation
#[derive(Debug, Clone)]
pub struct DouglasPeuckerSimplifier {
    pub tolerance: f32,
}

impl OutlineSimplifier for DouglasPeuckerSimplifier {
    fn simplify(&self, outline: Vec<Point>) -> Vec<Point> {
        if outline.len() <= 3 || self.tolerance <= 0.0 {
            return outline;
        }
        // Close the ring so the closing edge takes part, then reopen it.
        let mut closed = outline.clone();
        closed.push(outline[0]);
        let mut simplified = geometry::simplify_douglas_peucker(&closed, self.tolerance);
        geometry::dedup_ring(&mut simplified);
        if simplified.len() < 3 { outline } else { simplified }
    }
}

/// Radial-distance decimation for rings
#[derive(Debug, Clone)]
pub struct RadialDecimation {
    pub tolerance: f32,
}

impl OutlineSimplifier for RadialDecimation {
    fn simplify(&self, outline: Vec<Point>) -> Vec<Point> {
        if self.tolerance <= 0.0 {
            return outline;
        }
        geometry::decimate_ring(&outline, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn douglas_peucker_reduces_dense_rectangle_to_corners() {
        let mut ring = Vec::new();
        for x in 0..=10 {
            ring.push(Point::new(x as f32 * 10.0, 0.0));
        }
        for y in 1..=10 {
            ring.push(Point::new(100.0, y as f32 * 10.0));
        }
        for x in (0..10).rev() {
            ring.push(Point::new(x as f32 * 10.0, 100.0));
        }
        for y in (1..10).rev() {
            ring.push(Point::new(0.0, y as f32 * 10.0));
        }
        let simplified = DouglasPeuckerSimplifier { tolerance: 1.0 }.simplify(ring);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn triangles_pass_through() {
        let tri = vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(0.0, 5.0)];
        assert_eq!(DouglasPeuckerSimplifier { tolerance: 10.0 }.simplify(tri.clone()), tri);
    }
}
