use crate::color::Color;
use crate::error::Result;
use crate::pixels::PixelBuffer;

/// A finished palette, ordered by hue for presentation.
///
/// Colors are distinct and pairwise at least the extraction's effective
/// tolerance apart. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Build a palette from already-separated colors, sorting by hue.
    ///
    /// The sort is stable, so grays (hue 0) and other equal hues keep the
    /// order they were given in.
    pub(crate) fn from_separated(mut colors: Vec<Color>) -> Self {
        hue_sort(&mut colors);
        Self { colors }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Color> {
        self.colors.iter()
    }

    /// sRGB triplets, for encoders that take a flat palette.
    pub fn entries(&self) -> Vec<[u8; 3]> {
        self.colors.iter().map(|c| (*c).into()).collect()
    }

    /// Render as vertical stripes, one per color.
    pub fn render_stripes(&self, stripe_width: u32, height: u32) -> Result<PixelBuffer> {
        crate::stripes::render_stripes(&self.colors, stripe_width, height)
    }

    pub fn into_colors(self) -> Vec<Color> {
        self.colors
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a Color;
    type IntoIter = core::slice::Iter<'a, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

/// Order by HSV hue, ascending.
fn hue_sort(colors: &mut [Color]) {
    colors.sort_by(|a, b| {
        a.hue()
            .partial_cmp(&b.hue())
            .unwrap_or(core::cmp::Ordering::Equal)
    });
}
