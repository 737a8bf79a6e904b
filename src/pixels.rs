//! Bounds-checked access to raw B, G, R, [A] pixel buffers.

use crate::color::Color;
use crate::error::{PaletteError, Result};

/// One pixel as read from a [`PixelView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub color: Color,
    /// 255 for 3-byte layouts.
    pub alpha: u8,
}

impl Pixel {
    pub fn is_opaque(self) -> bool {
        self.alpha == u8::MAX
    }
}

/// A read-only view over a decoded image's bytes.
///
/// Channel order is fixed: blue, green, red, then alpha for 4-byte layouts.
/// The view borrows the bytes, so it cannot outlive the decoded image.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    stride: usize,
}

impl<'a> PixelView<'a> {
    /// Wrap a buffer, checking that every `(x, y)` inside the dimensions maps
    /// to bytes that exist.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        stride: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PaletteError::ZeroDimension);
        }
        if bytes_per_pixel != 3 && bytes_per_pixel != 4 {
            return Err(PaletteError::UnsupportedLayout(bytes_per_pixel));
        }
        let row_len = width
            .checked_mul(bytes_per_pixel)
            .ok_or_else(|| PaletteError::invalid("row length overflows usize"))?;
        if stride < row_len {
            return Err(PaletteError::StrideTooSmall {
                stride,
                min: row_len,
            });
        }
        // Last row only needs its pixels, not the trailing padding.
        let required = (height - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(|| PaletteError::invalid("buffer size overflows usize"))?;
        if data.len() < required {
            return Err(PaletteError::BufferTooSmall {
                len: data.len(),
                required,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            bytes_per_pixel,
            stride,
        })
    }

    /// Tightly packed BGRA.
    pub fn from_bgra(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(data, width, height, 4, width.saturating_mul(4))
    }

    /// Tightly packed BGR.
    pub fn from_bgr(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(data, width, height, 3, width.saturating_mul(3))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn has_alpha(&self) -> bool {
        self.bytes_per_pixel == 4
    }

    /// Read the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Result<Pixel> {
        if x >= self.width || y >= self.height {
            return Err(PaletteError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let offset = x * self.bytes_per_pixel + y * self.stride;
        Ok(self.decode(&self.data[offset..offset + self.bytes_per_pixel]))
    }

    /// Iterate pixels row-major, left to right, top to bottom.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        (0..self.height).flat_map(move |y| {
            let start = y * self.stride;
            self.data[start..start + self.width * self.bytes_per_pixel]
                .chunks_exact(self.bytes_per_pixel)
                .map(move |px| self.decode(px))
        })
    }

    fn decode(&self, px: &[u8]) -> Pixel {
        Pixel {
            color: Color::new(px[2], px[1], px[0]),
            alpha: if self.bytes_per_pixel == 4 { px[3] } else { u8::MAX },
        }
    }
}

/// An owned, tightly packed BGRA buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl PixelBuffer {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// A fully transparent black buffer.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PaletteError::ZeroDimension);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(Self::BYTES_PER_PIXEL))
            .ok_or_else(|| PaletteError::invalid("buffer size overflows usize"))?;
        Ok(Self {
            data: vec![0; len],
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width * Self::BYTES_PER_PIXEL
    }

    pub fn view(&self) -> PixelView<'_> {
        PixelView {
            data: &self.data,
            width: self.width,
            height: self.height,
            bytes_per_pixel: Self::BYTES_PER_PIXEL,
            stride: self.stride(),
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Result<Pixel> {
        self.view().pixel(x, y)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Copy into R, G, B, A order for encoders that expect it.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.data
            .chunks_exact(Self::BYTES_PER_PIXEL)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bgr_channel_order() {
        let data = [10, 20, 30, 40, 50, 60];
        let view = PixelView::from_bgr(&data, 2, 1).unwrap();
        let px = view.pixel(1, 0).unwrap();
        assert_eq!(px.color, Color::new(60, 50, 40));
        assert!(px.is_opaque());
    }

    #[test]
    fn honors_stride_padding() {
        // 1x2 BGRA with 4 bytes of padding per row.
        let data = [1, 2, 3, 255, 0, 0, 0, 0, 4, 5, 6, 7];
        let view = PixelView::new(&data, 1, 2, 4, 8).unwrap();
        let px = view.pixel(0, 1).unwrap();
        assert_eq!(px.color, Color::new(6, 5, 4));
        assert_eq!(px.alpha, 7);
        assert!(!px.is_opaque());

        let all: Vec<_> = view.pixels().map(|p| p.color).collect();
        assert_eq!(all, vec![Color::new(3, 2, 1), Color::new(6, 5, 4)]);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let data = [0u8; 16];
        let view = PixelView::from_bgra(&data, 2, 2).unwrap();
        assert!(matches!(
            view.pixel(2, 0),
            Err(PaletteError::OutOfBounds { x: 2, y: 0, .. })
        ));
        assert!(matches!(
            view.pixel(0, 5),
            Err(PaletteError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn rejects_bad_layouts() {
        let data = [0u8; 16];
        assert!(matches!(
            PixelView::new(&data, 0, 2, 4, 8),
            Err(PaletteError::ZeroDimension)
        ));
        assert!(matches!(
            PixelView::new(&data, 2, 2, 2, 4),
            Err(PaletteError::UnsupportedLayout(2))
        ));
        assert!(matches!(
            PixelView::new(&data, 2, 2, 4, 7),
            Err(PaletteError::StrideTooSmall { stride: 7, min: 8 })
        ));
        assert!(matches!(
            PixelView::new(&data, 2, 3, 4, 8),
            Err(PaletteError::BufferTooSmall {
                len: 16,
                required: 24
            })
        ));
    }

    #[test]
    fn last_row_needs_no_padding() {
        let data = [0u8; 11];
        assert!(PixelView::new(&data, 1, 2, 3, 8).is_ok());
    }

    #[test]
    fn buffer_swizzles_to_rgba() {
        let mut buf = PixelBuffer::new(1, 1).unwrap();
        buf.as_bytes_mut().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buf.to_rgba_bytes(), vec![3, 2, 1, 4]);
        assert_eq!(buf.pixel(0, 0).unwrap().color, Color::new(3, 2, 1));
    }
}
