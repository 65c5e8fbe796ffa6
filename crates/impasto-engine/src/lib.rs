//! impasto-engine: painterly stroke rendering core (sans-IO).
//!
//! Repeatedly stamps semi-transparent regular polygons onto an
//! opaque-black canvas, sampling each stroke's color from a source
//! photograph. Stroke size decays geometrically while opacity grows
//! linearly, so early cycles establish broad structure and later
//! cycles pick out detail; once strokes shrink below a configured
//! threshold, contrasting outlines emphasize their edges.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! rasters and returns pixel buffers. Decoding, encoding, flag
//! parsing, and batch orchestration live in `impasto-cli`.

pub mod blend;
pub mod canvas;
pub mod engine;
pub mod types;

pub use canvas::Canvas;
pub use engine::{EngineState, StrokeEngine};
pub use types::{EngineError, RgbImage, RgbaImage, StrokeParameters};

/// Run a full painting pass in one call.
///
/// Constructs a [`StrokeEngine`] over `source` with the given
/// parameters and seed, steps it `cycles` times, and bakes the canvas
/// into a flat pixel buffer. Callers that want intermediate frames or
/// progress reporting should drive [`StrokeEngine::step`] themselves.
///
/// # Errors
///
/// Returns [`EngineError::InvalidParameters`] or
/// [`EngineError::InvalidDimensions`] if `params` is inconsistent,
/// and [`EngineError::EmptySource`] if `source` has zero area.
pub fn paint(
    source: &RgbImage,
    params: &StrokeParameters,
    seed: u64,
    cycles: u64,
) -> Result<RgbaImage, EngineError> {
    let mut engine = StrokeEngine::new(source, params.clone(), seed)?;
    for _ in 0..cycles {
        engine.step();
    }
    Ok(engine.output())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    fn small_params() -> StrokeParameters {
        StrokeParameters {
            dest_width: 64,
            dest_height: 64,
            ..StrokeParameters::default()
        }
    }

    #[test]
    fn paint_zero_cycles_returns_black_canvas() {
        let source = RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]));
        let raster = paint(&source, &small_params(), 1, 0).unwrap();
        assert_eq!(raster.dimensions(), (64, 64));
        for pixel in raster.pixels() {
            assert_eq!(pixel.0, [0, 0, 0, 255]);
        }
    }

    #[test]
    fn paint_is_reproducible_for_a_fixed_seed() {
        let source = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        let params = StrokeParameters {
            dest_width: 200,
            dest_height: 200,
            stroke_ratio: 0.9,
            ..StrokeParameters::default()
        };
        let first = paint(&source, &params, 99, 500).unwrap();
        let second = paint(&source, &params, 99, 500).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn paint_rejects_invalid_parameters() {
        let source = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let params = StrokeParameters {
            stroke_reduction: 1.0,
            ..small_params()
        };
        assert!(matches!(
            paint(&source, &params, 1, 10),
            Err(EngineError::InvalidParameters(_))
        ));
    }

    #[test]
    fn paint_rejects_empty_source() {
        let source = RgbImage::new(0, 0);
        assert!(matches!(
            paint(&source, &small_params(), 1, 10),
            Err(EngineError::EmptySource)
        ));
    }
}
