//! impasto: batch painterly rendering from the command line.
//!
//! Takes an image file or a directory of images, paints each one with
//! a fresh [`StrokeEngine`], and writes the results into the output
//! directory as `<stem>_<cycles>cycles_<seed>.<ext>`. Every input
//! file gets its own engine seeded with the same value, so a whole
//! batch is reproducible from one `--seed`.
//!
//! An invalid stroke parameter set aborts before any file is touched;
//! per-file decode or encode failures are logged and the batch moves
//! on.

use std::error::Error;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use image::RgbaImage;
use impasto_engine::{EngineError, RgbImage, StrokeEngine, StrokeParameters};
use log::{info, warn};
use rand::Rng;

/// Paint photographs into layered polygon strokes.
#[derive(Parser)]
#[command(name = "impasto", version)]
struct Cli {
    /// Input image file, or a directory scanned (non-recursively)
    /// for .jpg/.jpeg/.png files.
    input: PathBuf,

    /// Directory output images are written to (created if missing).
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = OutputType::Png)]
    output_type: OutputType,

    /// Number of strokes painted per image.
    #[arg(long, default_value_t = 10_000)]
    cycles: u64,

    /// Seed for the per-file stroke engines; drawn from entropy when
    /// omitted. Reusing a seed reproduces a run bit-for-bit.
    #[arg(long)]
    seed: Option<u64>,

    /// Width of the destination canvas; 0 uses the source width.
    #[arg(long, default_value_t = 0)]
    dest_width: u32,

    /// Height of the destination canvas; 0 uses the source height.
    #[arg(long, default_value_t = 0)]
    dest_height: u32,

    /// Initial stroke size as a fraction of the destination width.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_STROKE_RATIO)]
    stroke_ratio: f64,

    /// Fraction the stroke size shrinks by on each cycle.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_STROKE_REDUCTION)]
    stroke_reduction: f64,

    /// Stroke placement jitter as a fraction of the destination width.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_STROKE_JITTER_RATIO)]
    stroke_jitter_ratio: f64,

    /// Fraction of the initial stroke size below which outlines are
    /// added for visibility.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_STROKE_INVERSION_THRESHOLD)]
    stroke_inversion_threshold: f64,

    /// Starting stroke opacity on a 0-255 scale.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_INITIAL_ALPHA)]
    initial_alpha: f64,

    /// Opacity added on each cycle.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_ALPHA_INCREASE)]
    alpha_increase: f64,

    /// Minimum number of polygon edges per stroke.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_MIN_EDGE_COUNT)]
    min_edges: u32,

    /// Maximum number of polygon edges per stroke.
    #[arg(long, default_value_t = StrokeParameters::DEFAULT_MAX_EDGE_COUNT)]
    max_edges: u32,
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputType {
    /// Lossless PNG.
    Png,
    /// Lossy JPEG (RGBA is flattened to RGB for encoding).
    Jpg,
}

impl OutputType {
    const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let inputs = collect_inputs(&cli.input)?;
    if inputs.is_empty() {
        warn!("no .jpg/.jpeg/.png files found under {}", cli.input.display());
        return Ok(());
    }

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    info!(
        "painting {} file(s), {} cycles each, seed {seed}",
        inputs.len(),
        cli.cycles
    );

    std::fs::create_dir_all(&cli.output_dir)?;

    for (index, path) in inputs.iter().enumerate() {
        info!(
            "[{} of {}] {}",
            index + 1,
            inputs.len(),
            path.display()
        );
        if let Err(err) = paint_file(&cli, path, seed) {
            match err {
                // A bad parameter set fails the same way for every
                // file; abort instead of warning N times.
                FileError::Engine(
                    inner @ (EngineError::InvalidParameters(_)
                    | EngineError::InvalidDimensions { .. }),
                ) => return Err(inner.into()),
                other => warn!("skipping {}: {other}", path.display()),
            }
        }
    }

    Ok(())
}

/// Why one input file could not be painted.
#[derive(Debug)]
enum FileError {
    Image(image::ImageError),
    Engine(EngineError),
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(err) => err.fmt(f),
            Self::Engine(err) => err.fmt(f),
        }
    }
}

impl Error for FileError {}

impl From<image::ImageError> for FileError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

impl From<EngineError> for FileError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Decode one source image, run a fresh engine over it, and encode
/// the result.
fn paint_file(cli: &Cli, path: &Path, seed: u64) -> Result<(), FileError> {
    let source: RgbImage = image::open(path)?.to_rgb8();

    // 0 means "inherit from the source", resolved here so the engine
    // always sees concrete dimensions.
    let params = StrokeParameters {
        dest_width: resolve_dimension(cli.dest_width, source.width()),
        dest_height: resolve_dimension(cli.dest_height, source.height()),
        stroke_ratio: cli.stroke_ratio,
        stroke_reduction: cli.stroke_reduction,
        stroke_jitter_ratio: cli.stroke_jitter_ratio,
        stroke_inversion_threshold: cli.stroke_inversion_threshold,
        initial_alpha: cli.initial_alpha,
        alpha_increase: cli.alpha_increase,
        min_edge_count: cli.min_edges,
        max_edge_count: cli.max_edges,
    };

    let mut engine = StrokeEngine::new(&source, params, seed)?;
    let tick = (cli.cycles / 10).max(1);
    for cycle in 1..=cli.cycles {
        engine.step();
        if cycle % tick == 0 {
            info!("  {cycle}/{} strokes", cli.cycles);
        }
    }

    let out_path = cli.output_dir.join(output_file_name(
        path,
        cli.cycles,
        seed,
        cli.output_type,
    ));
    save_raster(engine.output(), cli.output_type, &out_path)?;
    info!("wrote {}", out_path.display());
    Ok(())
}

fn save_raster(raster: RgbaImage, output_type: OutputType, path: &Path) -> Result<(), FileError> {
    match output_type {
        OutputType::Png => raster.save(path)?,
        // The JPEG encoder rejects RGBA; flatten first. The canvas is
        // fully opaque so no color information is lost.
        OutputType::Jpg => image::DynamicImage::ImageRgba8(raster).to_rgb8().save(path)?,
    }
    Ok(())
}

/// The input itself if it is a file, otherwise its directory entries
/// with a supported extension, sorted by name.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_supported_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            ext.eq_ignore_ascii_case("jpg")
                || ext.eq_ignore_ascii_case("jpeg")
                || ext.eq_ignore_ascii_case("png")
        })
}

fn output_file_name(input: &Path, cycles: u64, seed: u64, output_type: OutputType) -> String {
    let stem = input
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("image");
    format!("{stem}_{cycles}cycles_{seed}.{}", output_type.extension())
}

const fn resolve_dimension(requested: u32, source: u32) -> u32 {
    if requested == 0 { source } else { requested }
}
