//! Wall coverage: polygon fill folded with the ordered brush-stroke log.
//!
//! Coverage is the left-to-right fold of the polygon base and every stroke,
//! where an `Add` stroke sets covered pixels and a `Remove` stroke clears
//! them. The analytic test ([`WallMask::is_inside`]) and the raster
//! ([`WallMask::rasterize`]) sample the same rule, the raster at pixel
//! centres.

use image::{GrayImage, Luma};
use rayon::prelude::*;

use crate::{
    geometry,
    types::{BoundingBox, BrushStroke, BrushTool, Point, Polygon, Wall},
};

pub const COVERED: u8 = 255;

/// What the fold starts from before strokes are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskBase<'a> {
    Polygon(&'a Polygon),
    /// Preview rectangle for an untouched sole wall.
    Fallback(BoundingBox),
    Empty,
}

#[derive(Debug, Clone)]
pub struct WallMask<'a> {
    base: MaskBase<'a>,
    strokes: &'a [BrushStroke],
}

impl<'a> WallMask<'a> {
    /// Coverage for a wall with no preview fallback.
    pub fn new(wall: &'a Wall) -> Self {
        let base = if wall.polygon.is_complete() {
            MaskBase::Polygon(&wall.polygon)
        } else {
            MaskBase::Empty
        };
        Self {
            base,
            strokes: &wall.brush_strokes,
        }
    }

    /// Coverage for the session's sole wall: a wall with no points and no
    /// strokes falls back to the centred 10%–90% rectangle of the frame.
    /// Once masking has started an incomplete polygon covers nothing.
    pub fn with_default_fallback(wall: &'a Wall, frame_width: u32, frame_height: u32) -> Self {
        let mut mask = Self::new(wall);
        if wall.is_untouched() {
            mask.base = MaskBase::Fallback(BoundingBox::centered_default(frame_width, frame_height));
        }
        mask
    }

    pub fn base(&self) -> &MaskBase<'a> {
        &self.base
    }

    /// True when the fold can never cover anything.
    pub fn is_empty(&self) -> bool {
        matches!(self.base, MaskBase::Empty)
            && !self.strokes.iter().any(|s| s.tool == BrushTool::Add && !s.points.is_empty())
    }

    pub fn is_inside(&self, p: Point) -> bool {
        let mut inside = match &self.base {
            MaskBase::Polygon(polygon) => polygon.contains(p),
            MaskBase::Fallback(rect) => rect.contains(p),
            MaskBase::Empty => false,
        };
        for stroke in self.strokes {
            if stroke.covers(p) {
                inside = stroke.tool == BrushTool::Add;
            }
        }
        inside
    }

    /// Rasterize to an alpha mask of the given size by folding draw
    /// operations in commit order.
    pub fn rasterize(&self, width: u32, height: u32) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return mask;
        }
        match &self.base {
            MaskBase::Polygon(polygon) => fill_polygon(&mut mask, polygon),
            MaskBase::Fallback(rect) => fill_rect(&mut mask, rect),
            MaskBase::Empty => {}
        }
        for stroke in self.strokes {
            stamp_stroke(&mut mask, stroke);
        }
        mask
    }
}

/// Count of covered pixels in a rasterized mask.
pub fn covered_pixels(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] > 0).count()
}

/// Row range `[first, last]` containing coverage, if any.
pub fn covered_rows(mask: &GrayImage) -> Option<(u32, u32)> {
    let width = mask.width() as usize;
    if width == 0 {
        return None;
    }
    let rows: Vec<bool> = mask
        .as_raw()
        .chunks(width)
        .map(|row| row.iter().any(|&v| v > 0))
        .collect();
    let first = rows.iter().position(|&r| r)?;
    let last = rows.iter().rposition(|&r| r)?;
    Some((first as u32, last as u32))
}

/// First and one-past-last pixel index whose centre lies in `[lo, hi)`.
fn pixel_span(lo: f32, hi: f32, limit: u32) -> (u32, u32) {
    let start = (lo - 0.5).ceil().max(0.0);
    let end = (hi - 0.5).ceil().max(0.0);
    (
        (start as u32).min(limit),
        (end as u32).min(limit),
    )
}

fn fill_polygon(mask: &mut GrayImage, polygon: &Polygon) {
    let width = mask.width();
    let ring = &polygon.points;
    mask.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let xs = geometry::scanline_crossings(y as f32 + 0.5, ring);
            for pair in xs.chunks_exact(2) {
                let (x0, x1) = pixel_span(pair[0], pair[1], width);
                row[x0 as usize..x1.max(x0) as usize].fill(COVERED);
            }
        });
}

fn fill_rect(mask: &mut GrayImage, rect: &BoundingBox) {
    let (x0, x1) = pixel_span(rect.min.x, rect.max.x, mask.width());
    let (y0, y1) = pixel_span(rect.min.y, rect.max.y, mask.height());
    for y in y0..y1 {
        for x in x0..x1 {
            mask.put_pixel(x, y, Luma([COVERED]));
        }
    }
}

fn stamp_stroke(mask: &mut GrayImage, stroke: &BrushStroke) {
    let Some(bounds) = stroke.bounding_box() else {
        return;
    };
    let (width, height) = mask.dimensions();
    let (x0, x1) = pixel_span(bounds.min.x, bounds.max.x + 1.0, width);
    let (y0, y1) = pixel_span(bounds.min.y, bounds.max.y + 1.0, height);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let value = match stroke.tool {
        BrushTool::Add => COVERED,
        BrushTool::Remove => 0,
    };
    mask.par_chunks_mut(width as usize)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(y, row)| {
            let cy = y as f32 + 0.5;
            for x in x0..x1 {
                if stroke.covers(Point::new(x as f32 + 0.5, cy)) {
                    row[x as usize] = value;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_wall() -> Wall {
        Wall::new("w1", "Wall").with_polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ])
    }

    fn disk(tool: BrushTool, radius: f32, x: f32, y: f32) -> BrushStroke {
        BrushStroke::new(tool, radius, Point::new(x, y))
    }

    #[test]
    fn polygon_only_coverage() {
        let wall = square_wall();
        let mask = WallMask::new(&wall);
        assert!(mask.is_inside(Point::new(50.0, 50.0)));
        assert!(!mask.is_inside(Point::new(150.0, 50.0)));
    }

    #[test]
    fn add_then_larger_remove_restores_polygon_only_coverage() {
        let plain = square_wall();
        let mut edited = square_wall();
        edited.commit_stroke(disk(BrushTool::Add, 10.0, 100.0, 50.0));
        edited.commit_stroke(disk(BrushTool::Remove, 30.0, 100.0, 50.0));
        let mut cut = square_wall();
        cut.commit_stroke(disk(BrushTool::Remove, 30.0, 100.0, 50.0));

        // Where the removal reaches, both the add and the polygon are cleared;
        // elsewhere the add left no trace.
        let edited_mask = WallMask::new(&edited).rasterize(140, 120);
        let cut_mask = WallMask::new(&cut).rasterize(140, 120);
        assert_eq!(edited_mask, cut_mask);

        let plain_mask = WallMask::new(&plain).rasterize(140, 120);
        let outside_polygon = Point::new(105.0, 50.0);
        assert!(!WallMask::new(&edited).is_inside(outside_polygon));
        assert!(!WallMask::new(&plain).is_inside(outside_polygon));
        assert_eq!(plain_mask.get_pixel(20, 20), edited_mask.get_pixel(20, 20));
    }

    #[test]
    fn add_outside_polygon_then_covering_remove_matches_polygon() {
        let plain = square_wall();
        let mut edited = square_wall();
        edited.commit_stroke(disk(BrushTool::Add, 8.0, 120.0, 50.0));
        edited.commit_stroke(disk(BrushTool::Remove, 12.0, 120.0, 50.0));
        assert_eq!(
            WallMask::new(&edited).rasterize(160, 120),
            WallMask::new(&plain).rasterize(160, 120)
        );
    }

    #[test]
    fn remove_then_add_restores_added_area() {
        let mut wall = square_wall();
        wall.commit_stroke(disk(BrushTool::Remove, 30.0, 50.0, 50.0));
        wall.commit_stroke(disk(BrushTool::Add, 10.0, 50.0, 50.0));
        let mask = WallMask::new(&wall);
        assert!(mask.is_inside(Point::new(50.0, 50.0)));
        assert!(mask.is_inside(Point::new(55.0, 50.0)));
        assert!(!mask.is_inside(Point::new(70.0, 50.0)));
        assert!(mask.is_inside(Point::new(90.0, 50.0)));
    }

    #[test]
    fn degenerate_polygons_cover_nothing() {
        for n in 0..3 {
            let points: Vec<Point> = (0..n).map(|i| Point::new(i as f32 * 40.0, 10.0)).collect();
            let wall = Wall::new("w", "Wall").with_polygon(points);
            let mask = WallMask::new(&wall);
            assert!(mask.is_empty());
            assert!(!mask.is_inside(Point::new(20.0, 10.0)));
            assert_eq!(covered_pixels(&mask.rasterize(64, 64)), 0);
        }
    }

    #[test]
    fn brush_only_disk_coverage() {
        let mut wall = Wall::new("w", "Wall");
        wall.commit_stroke(disk(BrushTool::Add, 20.0, 300.0, 300.0));
        let mask = WallMask::new(&wall);
        assert!(mask.is_inside(Point::new(310.0, 300.0)));
        assert!(!mask.is_inside(Point::new(330.0, 300.0)));

        let raster = mask.rasterize(400, 400);
        assert_eq!(raster.get_pixel(305, 305).0[0], COVERED);
        assert_eq!(raster.get_pixel(330, 300).0[0], 0);
        let area = covered_pixels(&raster) as f32;
        let expected = std::f32::consts::PI * 400.0;
        assert!((area - expected).abs() / expected < 0.05);
    }

    #[test]
    fn fallback_only_for_untouched_wall() {
        let wall = Wall::new("w", "Wall");
        let mask = WallMask::with_default_fallback(&wall, 100, 100);
        assert!(mask.is_inside(Point::new(50.0, 50.0)));
        assert!(!mask.is_inside(Point::new(5.0, 5.0)));
        assert_eq!(covered_pixels(&mask.rasterize(100, 100)), 80 * 80);

        let mut stroked = Wall::new("w", "Wall");
        stroked.commit_stroke(disk(BrushTool::Add, 5.0, 10.0, 10.0));
        let mask = WallMask::with_default_fallback(&stroked, 100, 100);
        assert!(!mask.is_inside(Point::new(50.0, 50.0)));

        for n in 1..3 {
            let points: Vec<Point> = (0..n).map(|i| Point::new(30.0 + i as f32 * 20.0, 40.0)).collect();
            let started = Wall::new("w", "Wall").with_polygon(points);
            let mask = WallMask::with_default_fallback(&started, 100, 100);
            assert!(mask.is_empty());
            assert_eq!(covered_pixels(&mask.rasterize(100, 100)), 0);
        }
    }

    #[test]
    fn raster_matches_analytic_test_at_pixel_centres() {
        let mut wall = Wall::new("w", "Wall").with_polygon(vec![
            Point::new(5.0, 3.0),
            Point::new(60.0, 10.0),
            Point::new(45.0, 58.0),
            Point::new(8.0, 40.0),
        ]);
        let mut stroke = BrushStroke::new(BrushTool::Remove, 6.0, Point::new(10.0, 10.0));
        stroke.points.push(Point::new(50.0, 40.0));
        wall.commit_stroke(stroke);
        wall.commit_stroke(disk(BrushTool::Add, 4.0, 30.0, 25.0));

        let mask = WallMask::new(&wall);
        let raster = mask.rasterize(64, 64);
        for (x, y, px) in raster.enumerate_pixels() {
            let expected = mask.is_inside(Point::new(x as f32 + 0.5, y as f32 + 0.5));
            assert_eq!(px.0[0] == COVERED, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn covered_rows_reports_extent() {
        let wall = square_wall();
        let raster = WallMask::new(&wall).rasterize(120, 120);
        assert_eq!(covered_rows(&raster), Some((0, 99)));
        assert_eq!(covered_rows(&GrayImage::new(4, 4)), None);
    }
}
