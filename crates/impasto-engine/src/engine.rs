//! The decaying-stroke painting engine.
//!
//! Each [`step`](StrokeEngine::step) samples one source pixel, maps it
//! into destination space with jitter, and stamps a random regular
//! polygon of that color onto the canvas. Stroke size decays
//! geometrically while opacity grows linearly, so early cycles block
//! in broad structure and later cycles add fine detail; once strokes
//! shrink below the inversion threshold, a contrasting outline keeps
//! their silhouettes visible against what has already been painted.
//!
//! Strokes are strictly sequential: every stroke's visual effect
//! depends on the canvas state left by all prior strokes. Safe
//! parallelism lives one level up: independent engines over separate
//! canvases, sharing a read-only source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp1;

use crate::canvas::Canvas;
use crate::types::{EngineError, RgbImage, RgbaImage, StrokeParameters};

/// Scalar state evolved by [`StrokeEngine::step`].
///
/// Kept separate from the immutable [`StrokeParameters`] so a cycle
/// reads configuration and mutates state through distinct values.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    /// Current stroke radius in destination pixels.
    pub stroke_size: f64,
    /// Snapshot of the starting stroke size, read only by the
    /// inversion-threshold comparison.
    pub initial_stroke_size: f64,
    /// Current per-stroke opacity on the 0-255 additive scale.
    pub alpha: f64,
    /// Number of completed cycles.
    pub cycle_index: u64,
}

/// One painting run over a borrowed source raster.
///
/// The engine owns its [`Canvas`] and its random generator; the
/// source is borrowed read-only for the engine's lifetime, so a batch
/// driver can share one decoded image across several engines.
///
/// # Determinism
///
/// For a fixed seed, parameter set, and source, a run is bit-for-bit
/// reproducible. Each cycle draws from the generator in a fixed
/// order: sample x, sample y, jitter x, jitter y, edge count,
/// rotation. Jitter draws are skipped entirely when the jitter radius
/// is zero.
pub struct StrokeEngine<'a> {
    source: &'a RgbImage,
    params: StrokeParameters,
    state: EngineState,
    stroke_jitter: i64,
    canvas: Canvas,
    rng: StdRng,
}

impl<'a> StrokeEngine<'a> {
    /// Build an engine over `source` with a validated parameter set
    /// and a seeded generator, allocating the opaque-black canvas.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameters`] or
    /// [`EngineError::InvalidDimensions`] if `params` violates its
    /// documented ranges, and [`EngineError::EmptySource`] if the
    /// source raster has zero area.
    pub fn new(
        source: &'a RgbImage,
        params: StrokeParameters,
        seed: u64,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        if source.width() == 0 || source.height() == 0 {
            return Err(EngineError::EmptySource);
        }

        let canvas = Canvas::new(params.dest_width, params.dest_height)?;
        let initial_stroke_size = params.stroke_ratio * f64::from(params.dest_width);
        #[allow(clippy::cast_possible_truncation)]
        let stroke_jitter =
            (params.stroke_jitter_ratio * f64::from(params.dest_width)).round() as i64;

        Ok(Self {
            source,
            state: EngineState {
                stroke_size: initial_stroke_size,
                initial_stroke_size,
                alpha: params.initial_alpha,
                cycle_index: 0,
            },
            stroke_jitter,
            canvas,
            rng: StdRng::seed_from_u64(seed),
            params,
        })
    }

    /// Paint exactly one stroke, then advance the decay schedule.
    ///
    /// The cycle runs in a fixed order: sample a source pixel, map
    /// the continuous sample coordinate into destination space and
    /// jitter it, pick the polygon shape, composite the fill, apply
    /// the edge-emphasis rule if active, then shrink the stroke and
    /// grow the alpha. Painting happens at the pre-decay size and
    /// opacity.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn step(&mut self) {
        let source_w = f64::from(self.source.width());
        let source_h = f64::from(self.source.height());

        // The continuous coordinate feeds the destination mapping;
        // the truncated one feeds the color lookup.
        let sample_x: f64 = self.rng.random_range(0.0..source_w);
        let sample_y: f64 = self.rng.random_range(0.0..source_h);
        let color = self.source.get_pixel(sample_x as u32, sample_y as u32).0;

        let mut dest_x = sample_x * f64::from(self.params.dest_width) / source_w;
        let mut dest_y = sample_y * f64::from(self.params.dest_height) / source_h;
        #[allow(clippy::cast_precision_loss)]
        {
            dest_x += jitter_offset(&mut self.rng, self.stroke_jitter) as f64;
            dest_y += jitter_offset(&mut self.rng, self.stroke_jitter) as f64;
        }

        let edge_count = sample_edge_count(
            &mut self.rng,
            self.params.min_edge_count,
            self.params.max_edge_count,
        );
        // Right-skewed orientation: most strokes sit near the base
        // rotation, a long tail spins further.
        let rotation: f64 = self.rng.sample(Exp1);

        self.canvas.fill_polygon(
            dest_x,
            dest_y,
            edge_count,
            self.state.stroke_size,
            rotation,
            color,
            self.state.alpha,
        );

        if self.inversion_active() {
            let luma = (u32::from(color[0]) + u32::from(color[1]) + u32::from(color[2])) / 3;
            let outline = if luma < 128 {
                [255, 255, 255]
            } else {
                [0, 0, 0]
            };
            self.canvas.stroke_outline(
                dest_x,
                dest_y,
                edge_count,
                self.state.stroke_size,
                rotation,
                outline,
                self.state.alpha * 2.0,
            );
        }

        self.state.stroke_size -= self.params.stroke_reduction * self.state.stroke_size;
        self.state.alpha += self.params.alpha_increase;
        self.state.cycle_index += 1;
    }

    /// Bake the canvas into a flat pixel buffer.
    ///
    /// Valid at any point in a run and consumes nothing: calling it
    /// mid-run yields a true intermediate frame and stepping may
    /// continue afterwards.
    #[must_use]
    pub fn output(&self) -> RgbaImage {
        self.canvas.snapshot()
    }

    /// Whether the edge-emphasis rule fires on the next step.
    #[must_use]
    pub fn inversion_active(&self) -> bool {
        self.state.stroke_size
            <= self.params.stroke_inversion_threshold * self.state.initial_stroke_size
    }

    /// Current stroke radius in destination pixels.
    #[must_use]
    pub fn stroke_size(&self) -> f64 {
        self.state.stroke_size
    }

    /// Current per-stroke opacity on the 0-255 additive scale.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.state.alpha
    }

    /// Number of completed cycles.
    #[must_use]
    pub fn cycle_index(&self) -> u64 {
        self.state.cycle_index
    }

    /// The full evolving scalar state.
    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The parameter set this engine was built with.
    #[must_use]
    pub fn params(&self) -> &StrokeParameters {
        &self.params
    }
}

/// Uniform integer offset in `[-radius, radius)`.
///
/// Exactly zero when `radius` is zero, drawing nothing from the
/// generator.
fn jitter_offset<R: Rng>(rng: &mut R, radius: i64) -> i64 {
    if radius == 0 {
        return 0;
    }
    -radius + rng.random_range(0..2 * radius)
}

/// Edge count drawn uniformly from `[min, max]`, both ends inclusive.
fn sample_edge_count<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    rng.random_range(min..=max)
}
