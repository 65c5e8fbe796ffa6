//! The mutable RGBA raster strokes are composited onto.
//!
//! A [`Canvas`] is allocated once per engine, filled opaque black, and
//! mutated only through [`fill_polygon`](Canvas::fill_polygon) and
//! [`stroke_outline`](Canvas::stroke_outline). Geometry may lie partly
//! or fully outside the buffer; out-of-bounds pixels are clipped
//! silently rather than treated as errors.
//!
//! Filling uses an even-odd scanline walk evaluated at pixel centers,
//! so a pixel is covered exactly when its center lies inside the
//! polygon and each covered pixel is blended exactly once per call.

use std::f64::consts::{FRAC_PI_2, TAU};

use image::{Rgba, RgbaImage};

use crate::blend;
use crate::types::EngineError;

/// A fixed-size RGBA raster with alpha-composited polygon painting.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// Allocate a `width x height` canvas filled opaque black.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDimensions`] if either dimension
    /// is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        })
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Composite a filled regular polygon onto the canvas.
    ///
    /// `edge_count` vertices are spaced equally around
    /// `(center_x, center_y)` at distance `radius`, rotated by
    /// `rotation` radians. `alpha` is on the 0-255 scale and is
    /// clamped at the blend boundary. A polygon too small to cover
    /// any pixel center paints nothing.
    pub fn fill_polygon(
        &mut self,
        center_x: f64,
        center_y: f64,
        edge_count: u32,
        radius: f64,
        rotation: f64,
        color: [u8; 3],
        alpha: f64,
    ) {
        let vertices = polygon_vertices(center_x, center_y, edge_count, radius, rotation);
        self.fill_even_odd(&vertices, color, alpha);
    }

    /// Composite only the polygon boundary, one pixel wide.
    ///
    /// Same geometry as [`fill_polygon`](Self::fill_polygon). Boundary
    /// pixels are deduplicated across segments before blending, so the
    /// pixels shared by adjacent edges blend once per call.
    pub fn stroke_outline(
        &mut self,
        center_x: f64,
        center_y: f64,
        edge_count: u32,
        radius: f64,
        rotation: f64,
        color: [u8; 3],
        alpha: f64,
    ) {
        let vertices = polygon_vertices(center_x, center_y, edge_count, radius, rotation);
        let mut boundary: Vec<(i64, i64)> = Vec::new();
        for i in 0..vertices.len() {
            segment_pixels(vertices[i], vertices[(i + 1) % vertices.len()], &mut boundary);
        }
        boundary.sort_unstable();
        boundary.dedup();
        for (x, y) in boundary {
            self.blend_pixel(x, y, color, alpha);
        }
    }

    /// Immutable copy of the current pixel buffer. Never mutates
    /// canvas state.
    #[must_use]
    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    /// Even-odd scanline fill of a closed polygon, one blend per
    /// covered pixel.
    #[allow(clippy::cast_possible_truncation)]
    fn fill_even_odd(&mut self, vertices: &[(f64, f64)], color: [u8; 3], alpha: f64) {
        let min_y = vertices.iter().map(|v| v.1).fold(f64::INFINITY, f64::min);
        let max_y = vertices
            .iter()
            .map(|v| v.1)
            .fold(f64::NEG_INFINITY, f64::max);
        if !(min_y.is_finite() && max_y.is_finite()) {
            return;
        }

        let width = i64::from(self.pixels.width());
        let height = i64::from(self.pixels.height());

        // Rows whose center y + 0.5 falls within [min_y, max_y].
        let row_start = ((min_y - 0.5).ceil() as i64).max(0);
        let row_end = ((max_y - 0.5).floor() as i64).min(height - 1);

        let mut crossings: Vec<f64> = Vec::with_capacity(vertices.len());
        for row in row_start..=row_end {
            #[allow(clippy::cast_precision_loss)]
            let yc = row as f64 + 0.5;

            crossings.clear();
            for i in 0..vertices.len() {
                let (x0, y0) = vertices[i];
                let (x1, y1) = vertices[(i + 1) % vertices.len()];
                // Half-open crossing rule: an edge contributes when the
                // scanline separates its endpoints, which keeps the
                // total crossing count even for a closed polygon.
                if (y0 <= yc) == (y1 <= yc) {
                    continue;
                }
                let t = (yc - y0) / (y1 - y0);
                crossings.push((x1 - x0).mul_add(t, x0));
            }
            crossings.sort_unstable_by(f64::total_cmp);

            for pair in crossings.chunks_exact(2) {
                // Pixels whose center x + 0.5 lies in [pair[0], pair[1]).
                let first = ((pair[0] - 0.5).ceil() as i64).max(0);
                let last = ((pair[1] - 0.5).ceil() as i64).min(width);
                for x in first..last {
                    self.blend_pixel(x, row, color, alpha);
                }
            }
        }
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: [u8; 3], alpha: f64) {
        if x < 0 || y < 0 || x >= i64::from(self.pixels.width()) || y >= i64::from(self.pixels.height())
        {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y) = (x as u32, y as u32);
        let pixel = self.pixels.get_pixel_mut(x, y);
        *pixel = blend::source_over(*pixel, color, alpha);
    }
}

/// Vertices of a regular polygon.
///
/// Vertices start at `rotation - pi/2`, with an extra half-step for
/// even edge counts, so an unrotated odd-sided polygon points straight
/// up and an unrotated even-sided one rests on a flat edge.
fn polygon_vertices(
    center_x: f64,
    center_y: f64,
    edge_count: u32,
    radius: f64,
    rotation: f64,
) -> Vec<(f64, f64)> {
    let step = TAU / f64::from(edge_count.max(1));
    let mut start = rotation - FRAC_PI_2;
    if edge_count % 2 == 0 {
        start += step / 2.0;
    }
    (0..edge_count)
        .map(|i| {
            let angle = f64::from(i).mul_add(step, start);
            (
                radius.mul_add(angle.cos(), center_x),
                radius.mul_add(angle.sin(), center_y),
            )
        })
        .collect()
}

/// Append the pixels along one width-1 segment, endpoint inclusive.
///
/// Simple DDA walk; duplicates (including the shared endpoint of
/// adjacent polygon edges) are removed by the caller's dedup pass.
#[allow(clippy::cast_possible_truncation)]
fn segment_pixels(a: (f64, f64), b: (f64, f64), out: &mut Vec<(i64, i64)>) {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
    if !steps.is_finite() {
        return;
    }
    let count = steps as i64;
    for i in 0..=count {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f64 / steps;
        let x = dx.mul_add(t, a.0).floor() as i64;
        let y = dy.mul_add(t, a.1).floor() as i64;
        out.push((x, y));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_rejected() {
        assert!(matches!(
            Canvas::new(0, 5),
            Err(EngineError::InvalidDimensions { width: 0, height: 5 })
        ));
    }

    #[test]
    fn zero_height_rejected() {
        assert!(matches!(
            Canvas::new(5, 0),
            Err(EngineError::InvalidDimensions { width: 5, height: 0 })
        ));
    }

    #[test]
    fn new_canvas_is_opaque_black() {
        let canvas = Canvas::new(8, 6).unwrap();
        let snapshot = canvas.snapshot();
        assert_eq!(snapshot.dimensions(), (8, 6));
        for pixel in snapshot.pixels() {
            assert_eq!(*pixel, Rgba([0, 0, 0, 255]));
        }
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut canvas = Canvas::new(20, 20).unwrap();
        let before = canvas.snapshot();
        canvas.fill_polygon(10.0, 10.0, 4, 8.0, 0.0, [255, 0, 0], 255.0);
        // The earlier snapshot must not observe the later fill.
        for pixel in before.pixels() {
            assert_eq!(*pixel, Rgba([0, 0, 0, 255]));
        }
        assert_ne!(before.as_raw(), canvas.snapshot().as_raw());
    }

    #[test]
    fn opaque_fill_sets_exact_color() {
        let mut canvas = Canvas::new(20, 20).unwrap();
        canvas.fill_polygon(10.0, 10.0, 4, 8.0, 0.0, [10, 20, 30], 255.0);
        let snapshot = canvas.snapshot();
        // Center is well inside any 8px-radius square.
        assert_eq!(*snapshot.get_pixel(10, 10), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn fill_blends_each_pixel_at_most_once() {
        let mut canvas = Canvas::new(30, 30).unwrap();
        // White at alpha 128 over black yields exactly 128; a pixel
        // blended twice would read 192.
        canvas.fill_polygon(15.0, 15.0, 5, 10.0, 0.3, [255, 255, 255], 128.0);
        let mut covered = 0;
        for pixel in canvas.snapshot().pixels() {
            assert!(
                pixel[0] == 0 || pixel[0] == 128,
                "unexpected channel value {} (double blend?)",
                pixel[0]
            );
            if pixel[0] == 128 {
                covered += 1;
            }
        }
        assert!(covered > 0, "fill covered no pixels");
    }

    #[test]
    fn outline_blends_each_pixel_at_most_once() {
        let mut canvas = Canvas::new(30, 30).unwrap();
        canvas.stroke_outline(15.0, 15.0, 3, 9.0, 0.0, [255, 255, 255], 128.0);
        let mut covered = 0;
        for pixel in canvas.snapshot().pixels() {
            assert!(
                pixel[0] == 0 || pixel[0] == 128,
                "unexpected channel value {} (double blend at a shared vertex?)",
                pixel[0]
            );
            if pixel[0] == 128 {
                covered += 1;
            }
        }
        assert!(covered > 0, "outline covered no pixels");
    }

    #[test]
    fn outline_does_not_fill_interior() {
        let mut canvas = Canvas::new(40, 40).unwrap();
        canvas.stroke_outline(20.0, 20.0, 4, 12.0, 0.0, [255, 255, 255], 255.0);
        // The center sits far from every boundary segment.
        assert_eq!(*canvas.snapshot().get_pixel(20, 20), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn triangle_points_up() {
        let mut canvas = Canvas::new(20, 20).unwrap();
        canvas.fill_polygon(10.0, 10.0, 3, 5.0, 0.0, [255, 255, 255], 255.0);
        let snapshot = canvas.snapshot();
        // Apex vertex lands at (10, 5); the row just below it is covered.
        assert_eq!(*snapshot.get_pixel(10, 10), Rgba([255, 255, 255, 255]));
        assert_eq!(*snapshot.get_pixel(10, 4), Rgba([0, 0, 0, 255]));
        assert_eq!(*snapshot.get_pixel(10, 16), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn fully_outside_polygon_is_clipped_silently() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.fill_polygon(-50.0, -50.0, 4, 10.0, 0.0, [255, 255, 255], 255.0);
        for pixel in canvas.snapshot().pixels() {
            assert_eq!(*pixel, Rgba([0, 0, 0, 255]));
        }
    }

    #[test]
    fn partially_outside_polygon_clips_to_bounds() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.fill_polygon(0.0, 0.0, 4, 6.0, 0.0, [255, 255, 255], 255.0);
        let snapshot = canvas.snapshot();
        // The corner is covered; the far side of the canvas is not.
        assert_eq!(*snapshot.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*snapshot.get_pixel(9, 9), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn zero_alpha_fill_changes_nothing() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.fill_polygon(5.0, 5.0, 4, 4.0, 0.0, [255, 255, 255], 0.0);
        for pixel in canvas.snapshot().pixels() {
            assert_eq!(*pixel, Rgba([0, 0, 0, 255]));
        }
    }

    #[test]
    fn sub_pixel_polygon_paints_nothing() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        // Radius too small to reach any pixel center.
        canvas.fill_polygon(5.0, 5.0, 4, 0.1, 0.0, [255, 255, 255], 255.0);
        for pixel in canvas.snapshot().pixels() {
            assert_eq!(*pixel, Rgba([0, 0, 0, 255]));
        }
    }

    #[test]
    fn polygon_vertices_lie_on_radius() {
        let vertices = polygon_vertices(50.0, 50.0, 5, 12.0, 0.7);
        assert_eq!(vertices.len(), 5);
        for (x, y) in vertices {
            let dist = (x - 50.0).hypot(y - 50.0);
            assert!((dist - 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn even_polygon_rests_on_flat_edge() {
        // An unrotated square's vertices sit on the diagonals, so its
        // bottom edge is horizontal.
        let vertices = polygon_vertices(0.0, 0.0, 4, 1.0, 0.0);
        let max_y = vertices.iter().map(|v| v.1).fold(f64::NEG_INFINITY, f64::max);
        let on_bottom = vertices
            .iter()
            .filter(|v| (v.1 - max_y).abs() < 1e-9)
            .count();
        assert_eq!(on_bottom, 2);
    }
}
