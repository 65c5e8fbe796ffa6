//! Shared types for the impasto painting engine.

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can reference source
/// rasters without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// painted canvas without depending on `image` directly.
pub use image::RgbaImage;

/// Errors detected while constructing a painting run.
///
/// All variants are reported synchronously by [`StrokeEngine::new`]
/// (or [`Canvas::new`]); the engine is never built in a
/// partially-valid state, and `step()` itself cannot fail.
///
/// [`StrokeEngine::new`]: crate::engine::StrokeEngine::new
/// [`Canvas::new`]: crate::canvas::Canvas::new
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Destination canvas has a zero dimension.
    #[error("invalid canvas dimensions {width}x{height}: both must be nonzero")]
    InvalidDimensions {
        /// Requested canvas width in pixels.
        width: u32,
        /// Requested canvas height in pixels.
        height: u32,
    },

    /// A stroke parameter violates its documented range.
    #[error("invalid stroke parameters: {0}")]
    InvalidParameters(String),

    /// The source raster has zero area.
    #[error("source raster has zero area")]
    EmptySource,
}

/// Configuration for one painting run.
///
/// Immutable once the engine is constructed. The engine does not clamp
/// or repair out-of-range values; [`validate`](Self::validate) rejects
/// them up front and [`StrokeEngine::new`] refuses to build on
/// violation.
///
/// # Invariants
///
/// - `dest_width`, `dest_height` nonzero
/// - `stroke_ratio` in (0, 1]
/// - `stroke_reduction` in [0, 1)
/// - `stroke_jitter_ratio` finite and >= 0
/// - `stroke_inversion_threshold` in [0, 1]
/// - `initial_alpha` finite and > 0 (0-255 additive scale)
/// - `alpha_increase` finite and >= 0
/// - `3 <= min_edge_count <= max_edge_count`
///
/// [`StrokeEngine::new`]: crate::engine::StrokeEngine::new
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeParameters {
    /// Width of the destination canvas in pixels.
    pub dest_width: u32,

    /// Height of the destination canvas in pixels.
    pub dest_height: u32,

    /// Initial stroke size as a fraction of `dest_width`.
    pub stroke_ratio: f64,

    /// Fraction the stroke size shrinks by on each cycle
    /// (geometric decay).
    pub stroke_reduction: f64,

    /// Stroke placement jitter as a fraction of `dest_width`; the
    /// absolute jitter radius is `round(stroke_jitter_ratio *
    /// dest_width)` pixels.
    pub stroke_jitter_ratio: f64,

    /// Fraction of the *initial* stroke size below which the
    /// edge-emphasis rule adds contrasting outlines.
    pub stroke_inversion_threshold: f64,

    /// Starting per-stroke opacity on a 0-255 additive scale.
    pub initial_alpha: f64,

    /// Opacity added on each cycle (linear growth, never clamped by
    /// the schedule; the blend boundary clamps).
    pub alpha_increase: f64,

    /// Minimum number of polygon edges per stroke.
    pub min_edge_count: u32,

    /// Maximum number of polygon edges per stroke (inclusive).
    pub max_edge_count: u32,
}

impl StrokeParameters {
    /// Default destination width in pixels.
    pub const DEFAULT_DEST_WIDTH: u32 = 1000;
    /// Default destination height in pixels.
    pub const DEFAULT_DEST_HEIGHT: u32 = 1000;
    /// Default initial stroke size fraction.
    pub const DEFAULT_STROKE_RATIO: f64 = 0.75;
    /// Default per-cycle stroke shrink fraction.
    pub const DEFAULT_STROKE_REDUCTION: f64 = 0.002;
    /// Default jitter fraction.
    pub const DEFAULT_STROKE_JITTER_RATIO: f64 = 0.001;
    /// Default edge-emphasis activation threshold.
    pub const DEFAULT_STROKE_INVERSION_THRESHOLD: f64 = 0.05;
    /// Default starting opacity (0-255 scale).
    pub const DEFAULT_INITIAL_ALPHA: f64 = 0.1;
    /// Default per-cycle opacity growth.
    pub const DEFAULT_ALPHA_INCREASE: f64 = 0.02;
    /// Default minimum polygon edge count.
    pub const DEFAULT_MIN_EDGE_COUNT: u32 = 3;
    /// Default maximum polygon edge count.
    pub const DEFAULT_MAX_EDGE_COUNT: u32 = 4;

    /// Check every parameter against its documented range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDimensions`] if either destination
    /// dimension is zero, or [`EngineError::InvalidParameters`] naming
    /// the first offending field otherwise. NaN fails every range
    /// check.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.dest_width == 0 || self.dest_height == 0 {
            return Err(EngineError::InvalidDimensions {
                width: self.dest_width,
                height: self.dest_height,
            });
        }
        if !(self.stroke_ratio > 0.0 && self.stroke_ratio <= 1.0) {
            return Err(invalid("stroke_ratio must be in (0, 1]", self.stroke_ratio));
        }
        if !(self.stroke_reduction >= 0.0 && self.stroke_reduction < 1.0) {
            return Err(invalid(
                "stroke_reduction must be in [0, 1)",
                self.stroke_reduction,
            ));
        }
        if !(self.stroke_jitter_ratio >= 0.0 && self.stroke_jitter_ratio.is_finite()) {
            return Err(invalid(
                "stroke_jitter_ratio must be finite and >= 0",
                self.stroke_jitter_ratio,
            ));
        }
        if !(0.0..=1.0).contains(&self.stroke_inversion_threshold) {
            return Err(invalid(
                "stroke_inversion_threshold must be in [0, 1]",
                self.stroke_inversion_threshold,
            ));
        }
        if !(self.initial_alpha > 0.0 && self.initial_alpha.is_finite()) {
            return Err(invalid(
                "initial_alpha must be finite and > 0",
                self.initial_alpha,
            ));
        }
        if !(self.alpha_increase >= 0.0 && self.alpha_increase.is_finite()) {
            return Err(invalid(
                "alpha_increase must be finite and >= 0",
                self.alpha_increase,
            ));
        }
        if self.min_edge_count < 3 {
            return Err(EngineError::InvalidParameters(format!(
                "min_edge_count must be >= 3, got {}",
                self.min_edge_count
            )));
        }
        if self.max_edge_count < self.min_edge_count {
            return Err(EngineError::InvalidParameters(format!(
                "max_edge_count ({}) must be >= min_edge_count ({})",
                self.max_edge_count, self.min_edge_count
            )));
        }
        Ok(())
    }
}

fn invalid(rule: &str, value: f64) -> EngineError {
    EngineError::InvalidParameters(format!("{rule}, got {value}"))
}

impl Default for StrokeParameters {
    fn default() -> Self {
        Self {
            dest_width: Self::DEFAULT_DEST_WIDTH,
            dest_height: Self::DEFAULT_DEST_HEIGHT,
            stroke_ratio: Self::DEFAULT_STROKE_RATIO,
            stroke_reduction: Self::DEFAULT_STROKE_REDUCTION,
            stroke_jitter_ratio: Self::DEFAULT_STROKE_JITTER_RATIO,
            stroke_inversion_threshold: Self::DEFAULT_STROKE_INVERSION_THRESHOLD,
            initial_alpha: Self::DEFAULT_INITIAL_ALPHA,
            alpha_increase: Self::DEFAULT_ALPHA_INCREASE,
            min_edge_count: Self::DEFAULT_MIN_EDGE_COUNT,
            max_edge_count: Self::DEFAULT_MAX_EDGE_COUNT,
        }
    }
}
