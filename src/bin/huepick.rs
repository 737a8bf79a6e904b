//! Print a fixed-size palette for an image, optionally writing a striped
//! swatch.
//!
//! Usage:
//!   huepick photo.jpg -n 6 --format hsv --stripes swatch.png

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use huepick::format::format_palette;
use huepick::{
    ColorFormat, DEFAULT_TOLERANCE, MedianCut, PaletteConfig, PixelView, SizePolicy,
};

#[derive(Parser, Debug)]
#[command(version, about = "Extract a representative color palette from an image")]
struct Cli {
    /// Image to read
    image: PathBuf,

    /// Number of colors in the palette
    #[arg(short = 'n', long, default_value_t = 5)]
    colors: usize,

    /// Minimum RGB distance between palette colors (0 to 441.67)
    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f32,

    /// Output format: rgb, hsv or hex
    #[arg(short, long, default_value_t = ColorFormat::Hex)]
    format: ColorFormat,

    /// Prefix each line with a true-color block
    #[arg(long)]
    swatch: bool,

    /// Write the palette as a striped image to this path
    #[arg(long, value_name = "OUT")]
    stripes: Option<PathBuf>,

    /// Width of each stripe in pixels
    #[arg(long, default_value_t = 100)]
    stripe_width: u32,

    /// Height of the striped image in pixels
    #[arg(long, default_value_t = 300)]
    stripe_height: u32,

    /// Pre-reduce candidates with median cut before deduplicating
    #[arg(long)]
    quantize: bool,

    /// Return every distinct color instead of failing when fewer than requested exist
    #[arg(long)]
    clamp: bool,

    /// Leave pure black and pure white out of the palette
    #[arg(long)]
    exclude_black_white: bool,

    /// Upper bound on refinement passes
    #[arg(long, default_value_t = 100)]
    max_attempts: u32,

    /// Tolerance decrease per refinement pass
    #[arg(long, default_value_t = 5.0)]
    relax_step: f32,

    /// Extra median-cut candidates requested per refinement pass
    #[arg(long, default_value_t = 4)]
    quantizer_step: usize,

    /// Abort refinement after this many milliseconds
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,

    /// Log refinement passes to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> PaletteConfig {
        let mut config = PaletteConfig::new(self.colors)
            .tolerance(self.tolerance)
            .relax_step(self.relax_step)
            .max_attempts(self.max_attempts)
            .quantizer_step(self.quantizer_step)
            .exclude_black_white(self.exclude_black_white)
            .size_policy(if self.clamp {
                SizePolicy::Clamp
            } else {
                SizePolicy::Strict
            });
        if let Some(ms) = self.deadline_ms {
            config = config.deadline(Duration::from_millis(ms));
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if !cli.image.is_file() {
        bail!("input file {} does not exist", cli.image.display());
    }

    let img = image::open(&cli.image)
        .with_context(|| format!("failed to decode {}", cli.image.display()))?
        .to_rgba8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    let bgra: Vec<u8> = img
        .pixels()
        .flat_map(|p| [p.0[2], p.0[1], p.0[0], p.0[3]])
        .collect();
    let view = PixelView::from_bgra(&bgra, w, h)?;

    let config = cli.config();
    let result = if cli.quantize {
        let quantizer = MedianCut::new().refine(true);
        huepick::extract_palette_with(&view, &config, &quantizer)
    } else {
        huepick::extract_palette(&view, &config)
    };
    let extraction = result
        .with_context(|| format!("palette extraction failed for {}", cli.image.display()))?;

    log::info!(
        "{} distinct colors, accepted tolerance {:.2} after {} passes",
        extraction.distinct_colors(),
        extraction.tolerance(),
        extraction.attempts()
    );

    print!(
        "{}",
        format_palette(extraction.palette(), cli.format, cli.swatch)
    );

    if let Some(out) = &cli.stripes {
        let swatch = extraction
            .palette()
            .render_stripes(cli.stripe_width, cli.stripe_height)?;
        let path = available_path(out);
        image::save_buffer(
            &path,
            &swatch.to_rgba_bytes(),
            swatch.width() as u32,
            swatch.height() as u32,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

/// `path` itself if free, otherwise the first of `stem(1).ext`,
/// `stem(2).ext`, ... that does not exist.
fn available_path(path: &Path) -> PathBuf {
    first_free(path, |p| p.exists())
}

fn first_free(path: &Path, exists: impl Fn(&Path) -> bool) -> PathBuf {
    if !exists(path) {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1u32..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}({n}).{ext}"),
                None => format!("{stem}({n})"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !exists(candidate.as_path()))
        .unwrap_or_else(|| path.to_path_buf())
}
