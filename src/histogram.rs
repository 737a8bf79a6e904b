use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::color::Color;
use crate::pixels::PixelView;

/// Occurrence count and first-seen scan position for one distinct color.
#[derive(Debug, Clone, Copy)]
struct CountEntry {
    count: u32,
    first_seen: usize,
}

/// Frequency table of the opaque colors in an image.
///
/// Built by a single row-major pass on one thread; the first-seen positions
/// that break ties in [`ColorCounts::ascending`] depend on that order.
#[derive(Debug, Clone, Default)]
pub struct ColorCounts {
    entries: HashMap<Color, CountEntry>,
    total: u64,
}

impl ColorCounts {
    /// Count every opaque pixel of `view`.
    ///
    /// Pixels with alpha below 255 are skipped. With `exclude_black_white`,
    /// pure black and pure white are skipped as well.
    pub fn from_view(view: &PixelView<'_>, exclude_black_white: bool) -> Self {
        let mut counts = Self::default();
        for (index, pixel) in view.pixels().enumerate() {
            if !pixel.is_opaque() {
                continue;
            }
            if exclude_black_white && (pixel.color == Color::BLACK || pixel.color == Color::WHITE)
            {
                continue;
            }
            counts.add(pixel.color, index);
        }
        log::trace!(
            "counted {} opaque pixels, {} distinct colors",
            counts.total,
            counts.entries.len()
        );
        counts
    }

    fn add(&mut self, color: Color, index: usize) {
        self.total += 1;
        match self.entries.entry(color) {
            Entry::Occupied(mut e) => {
                let e = e.get_mut();
                e.count = e.count.saturating_add(1);
            }
            Entry::Vacant(e) => {
                e.insert(CountEntry {
                    count: 1,
                    first_seen: index,
                });
            }
        }
    }

    /// Number of distinct opaque colors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pixels that were counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, color: Color) -> u32 {
        self.entries.get(&color).map_or(0, |e| e.count)
    }

    /// Distinct colors with their counts, in first-seen scan order.
    pub fn weighted(&self) -> Vec<(Color, u32)> {
        let mut pairs: Vec<(Color, CountEntry)> =
            self.entries.iter().map(|(c, e)| (*c, *e)).collect();
        pairs.sort_unstable_by_key(|(_, e)| e.first_seen);
        pairs.into_iter().map(|(c, e)| (c, e.count)).collect()
    }

    /// Distinct colors, rarest first. Equal counts keep first-seen scan order.
    ///
    /// Feeding this to the deduplicator lets rare accents win over the
    /// dominant shades near them.
    pub fn ascending(&self) -> Vec<Color> {
        let mut pairs: Vec<(Color, CountEntry)> =
            self.entries.iter().map(|(c, e)| (*c, *e)).collect();
        pairs.sort_unstable_by_key(|(_, e)| (e.count, e.first_seen));
        pairs.into_iter().map(|(c, _)| c).collect()
    }
}
