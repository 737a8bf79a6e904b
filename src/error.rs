use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PaletteError>;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("requested {requested} colors but the image only has {available} distinct opaque colors")]
    SizeTooLarge { requested: usize, available: usize },

    #[error(
        "palette refinement gave up after {attempts} passes: found {found} of {requested} colors at tolerance {tolerance:.2}"
    )]
    RefinementExhausted {
        attempts: u32,
        found: usize,
        requested: usize,
        tolerance: f32,
    },

    #[error("palette refinement exceeded its deadline after {attempts} passes ({elapsed_ms} ms)")]
    DeadlineExceeded { attempts: u32, elapsed_ms: u64 },

    #[error("pixel ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("unsupported pixel layout: {0} bytes per pixel (expected 3 or 4)")]
    UnsupportedLayout(usize),

    #[error("row stride {stride} is shorter than a row of pixels ({min} bytes)")]
    StrideTooSmall { stride: usize, min: usize },

    #[error("pixel buffer length {len} is too small, {required} bytes required")]
    BufferTooSmall { len: usize, required: usize },
}

/// Coarse classification of [`PaletteError`], for callers that only need to
/// branch on what went wrong rather than on the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was malformed (zero size, empty input, bad buffer).
    InvalidRequest,
    /// More colors were requested than the image can provide.
    SizeTooLarge,
    /// Relaxation stopped before the requested size was reached.
    RefinementExhausted,
    /// A pixel lookup fell outside the buffer.
    OutOfBounds,
}

impl PaletteError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_)
            | Self::ZeroDimension
            | Self::UnsupportedLayout(_)
            | Self::StrideTooSmall { .. }
            | Self::BufferTooSmall { .. } => ErrorKind::InvalidRequest,
            Self::SizeTooLarge { .. } => ErrorKind::SizeTooLarge,
            Self::RefinementExhausted { .. } | Self::DeadlineExceeded { .. } => {
                ErrorKind::RefinementExhausted
            }
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
        }
    }
}
