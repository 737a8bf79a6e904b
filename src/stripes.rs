//! Striped swatch rendering.
//!
//! Each color becomes one vertical band. A single template row is painted
//! band by band (bands never share bytes, so each is an independent unit of
//! work), then copied into every row of the output.

use crate::color::Color;
use crate::error::{PaletteError, Result};
use crate::pixels::PixelBuffer;

#[cfg(feature = "threads")]
use rayon::prelude::*;

const BPP: usize = PixelBuffer::BYTES_PER_PIXEL;

/// Render `colors` as equal-width vertical bands on an opaque BGRA buffer of
/// `stripe_width * colors.len()` by `height` pixels.
pub fn render_stripes(colors: &[Color], stripe_width: u32, height: u32) -> Result<PixelBuffer> {
    if colors.is_empty() {
        return Err(PaletteError::invalid("cannot render stripes without colors"));
    }
    if stripe_width == 0 || height == 0 {
        return Err(PaletteError::invalid(format!(
            "stripe dimensions must be non-zero, got {stripe_width}x{height}"
        )));
    }

    let band_width = stripe_width as usize;
    let width = band_width
        .checked_mul(colors.len())
        .ok_or_else(|| PaletteError::invalid("stripe image width overflows usize"))?;

    let mut buffer = PixelBuffer::new(width, height as usize)?;
    let stride = buffer.stride();
    let band_len = band_width * BPP;

    let mut template = vec![0u8; stride];
    paint_bands(&mut template, band_len, colors);
    copy_rows(buffer.as_bytes_mut(), stride, &template);

    log::debug!(
        "rendered {} stripes into {}x{} swatch",
        colors.len(),
        width,
        height
    );
    Ok(buffer)
}

fn fill_band(band: &mut [u8], color: Color) {
    for px in band.chunks_exact_mut(BPP) {
        px.copy_from_slice(&[color.b, color.g, color.r, u8::MAX]);
    }
}

#[cfg(feature = "threads")]
fn paint_bands(row: &mut [u8], band_len: usize, colors: &[Color]) {
    row.par_chunks_mut(band_len)
        .zip(colors.par_iter())
        .for_each(|(band, color)| fill_band(band, *color));
}

#[cfg(not(feature = "threads"))]
fn paint_bands(row: &mut [u8], band_len: usize, colors: &[Color]) {
    row.chunks_mut(band_len)
        .zip(colors)
        .for_each(|(band, color)| fill_band(band, *color));
}

#[cfg(feature = "threads")]
fn copy_rows(data: &mut [u8], stride: usize, template: &[u8]) {
    data.par_chunks_mut(stride)
        .for_each(|row| row.copy_from_slice(template));
}

#[cfg(not(feature = "threads"))]
fn copy_rows(data: &mut [u8], stride: usize, template: &[u8]) {
    data.chunks_mut(stride)
        .for_each(|row| row.copy_from_slice(template));
}
