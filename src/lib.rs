//! Fixed-size palette extraction.
//!
//! Counts the opaque colors of an image, drops colors that sit closer than a
//! tolerance to one already kept, and lowers that tolerance step by step until
//! exactly the requested number of colors remain. The palette can then be
//! printed ([`format`]) or rendered as a striped swatch ([`stripes`]).
//!
//! ```
//! use huepick::{PaletteConfig, PixelView, extract_palette};
//!
//! // 2x1 BGRA: one red pixel, one blue pixel.
//! let bytes = [0, 0, 255, 255, 255, 0, 0, 255];
//! let view = PixelView::from_bgra(&bytes, 2, 1)?;
//! let result = extract_palette(&view, &PaletteConfig::new(2))?;
//! assert_eq!(result.palette().len(), 2);
//! # Ok::<(), huepick::PaletteError>(())
//! ```

#![forbid(unsafe_code)]

pub mod color;
pub mod dedup;
pub mod error;
pub mod format;
pub mod histogram;
pub mod median_cut;
pub mod palette;
pub mod pixels;
pub mod refine;
pub mod stripes;

pub use color::{Color, Hsv, MAX_TOLERANCE};
pub use dedup::dedup_similar;
pub use error::{ErrorKind, PaletteError, Result};
pub use format::ColorFormat;
pub use histogram::ColorCounts;
pub use median_cut::{MedianCut, Quantizer};
pub use palette::Palette;
pub use pixels::{Pixel, PixelBuffer, PixelView};
pub use refine::Extraction;
pub use stripes::render_stripes;

use core::time::Duration;

/// Tolerance used when none is given.
pub const DEFAULT_TOLERANCE: f32 = 60.0;

/// What to do when more colors are requested than the image contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    /// Fail with [`PaletteError::SizeTooLarge`] when more colors are
    /// requested than the image has. Exactly as many is accepted.
    #[default]
    Strict,
    /// Return every distinct color instead.
    Clamp,
}

/// Configuration for palette extraction.
#[derive(Debug, Clone)]
pub struct PaletteConfig {
    /// Number of colors wanted. Must be at least 1.
    pub colors: usize,
    /// Minimum Euclidean RGB distance between kept colors, `0..=MAX_TOLERANCE`.
    pub tolerance: f32,
    /// How much the tolerance drops after each short pass.
    pub relax_step: f32,
    /// Upper bound on deduplication passes.
    pub max_attempts: u32,
    pub size_policy: SizePolicy,
    /// Leave pure black and pure white out of the candidates.
    pub exclude_black_white: bool,
    /// Extra candidates requested from a quantizer after each short pass.
    pub quantizer_step: usize,
    /// Give up once relaxation has run this long.
    pub deadline: Option<Duration>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: 5,
            tolerance: DEFAULT_TOLERANCE,
            relax_step: 5.0,
            max_attempts: 100,
            size_policy: SizePolicy::Strict,
            exclude_black_white: false,
            quantizer_step: 4,
            deadline: None,
        }
    }
}

impl PaletteConfig {
    pub fn new(colors: usize) -> Self {
        Self {
            colors,
            ..Self::default()
        }
    }

    pub fn colors(mut self, n: usize) -> Self {
        self.colors = n;
        self
    }

    pub fn tolerance(mut self, t: f32) -> Self {
        self.tolerance = t;
        self
    }

    pub fn relax_step(mut self, step: f32) -> Self {
        self.relax_step = step;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn size_policy(mut self, policy: SizePolicy) -> Self {
        self.size_policy = policy;
        self
    }

    pub fn exclude_black_white(mut self, exclude: bool) -> Self {
        self.exclude_black_white = exclude;
        self
    }

    pub fn quantizer_step(mut self, step: usize) -> Self {
        self.quantizer_step = step;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Extract a palette by scanning every pixel of `view`.
pub fn extract_palette(view: &PixelView<'_>, config: &PaletteConfig) -> Result<Extraction> {
    refine::run(view, config, None)
}

/// Extract a palette from candidates produced by `quantizer`.
///
/// The quantizer gets the image's frequency table, filtered by
/// `exclude_black_white`, and is asked for more candidates after each short
/// pass. Passes that bring no new candidates, and every pass once the request
/// covers all distinct colors, lower the tolerance as well.
pub fn extract_palette_with(
    view: &PixelView<'_>,
    config: &PaletteConfig,
    quantizer: &dyn Quantizer,
) -> Result<Extraction> {
    refine::run(view, config, Some(quantizer))
}
