use crate::color::Color;

/// A source of candidate colors that reduces an image's color set to roughly
/// `max_colors` representatives before deduplication.
///
/// `histogram` holds every distinct opaque color of the image that survived
/// the black/white policy, with its pixel count, in first-seen scan order.
/// Output is treated as untrusted: duplicates are merged, excluded colors are
/// dropped and the order is re-derived from the weights by the caller.
pub trait Quantizer {
    /// Representative colors with their weights (pixel counts or similar).
    fn quantize(&self, histogram: &[(Color, u32)], max_colors: usize) -> Vec<(Color, u32)>;
}

/// Weighted median cut in RGB space.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianCut {
    /// Run three rounds of weighted k-means over the box centroids.
    pub refine: bool,
}

impl MedianCut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refine(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }
}

impl Quantizer for MedianCut {
    fn quantize(&self, histogram: &[(Color, u32)], max_colors: usize) -> Vec<(Color, u32)> {
        median_cut(histogram.to_vec(), max_colors, self.refine)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    rgb: [f32; 3],
    weight: f32,
    count: u32,
}

/// A box of color entries for median cut subdivision.
#[derive(Debug, Clone)]
struct ColorBox {
    entries: Vec<Entry>,
}

impl ColorBox {
    fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    fn total_weight(&self) -> f32 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    fn total_count(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.count))
    }

    /// Range (max - min) along each channel.
    fn ranges(&self) -> [f32; 3] {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for e in &self.entries {
            for axis in 0..3 {
                min[axis] = min[axis].min(e.rgb[axis]);
                max[axis] = max[axis].max(e.rgb[axis]);
            }
        }
        [max[0] - min[0], max[1] - min[1], max[2] - min[2]]
    }

    /// Heavy boxes with wide spread split first.
    fn priority(&self) -> f32 {
        let [r, g, b] = self.ranges();
        self.total_weight() * r.max(g).max(b)
    }

    fn centroid(&self) -> [f32; 3] {
        weighted_mean(self.entries.iter().map(|e| (e.rgb, e.weight)))
    }

    /// Split along the widest channel at the weighted median.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let [r, g, b] = self.ranges();
        let axis = if r >= g && r >= b {
            0
        } else if g >= b {
            1
        } else {
            2
        };

        self.entries.sort_by(|a, b| {
            a.rgb[axis]
                .partial_cmp(&b.rgb[axis])
                .unwrap_or(core::cmp::Ordering::Equal)
        });

        let half_weight = self.total_weight() / 2.0;
        let mut accumulated = 0.0f32;
        let mut split_idx = 1;

        for (i, e) in self.entries.iter().enumerate() {
            accumulated += e.weight;
            if accumulated >= half_weight && i + 1 < self.entries.len() {
                split_idx = i + 1;
                break;
            }
        }

        split_idx = split_idx.clamp(1, self.entries.len() - 1);

        let right = self.entries.split_off(split_idx);
        (ColorBox::new(self.entries), ColorBox::new(right))
    }
}

fn weighted_mean(items: impl Iterator<Item = ([f32; 3], f32)>) -> [f32; 3] {
    let mut sum = [0.0f32; 3];
    let mut w_sum = 0.0f32;
    for (rgb, w) in items {
        for axis in 0..3 {
            sum[axis] += rgb[axis] * w;
        }
        w_sum += w;
    }
    if w_sum < 1e-10 {
        return [0.0; 3];
    }
    [sum[0] / w_sum, sum[1] / w_sum, sum[2] / w_sum]
}

fn to_color(rgb: [f32; 3]) -> Color {
    let ch = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Color::new(ch(rgb[0]), ch(rgb[1]), ch(rgb[2]))
}

/// Reduce weighted colors to at most `max_colors` box centroids.
///
/// Each returned color carries the summed weight of the entries it
/// represents. With `refine`, centroids are moved by three rounds of
/// weighted k-means and weights are re-summed per final cluster.
pub fn median_cut(
    histogram: Vec<(Color, u32)>,
    max_colors: usize,
    refine: bool,
) -> Vec<(Color, u32)> {
    if histogram.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    if histogram.len() <= max_colors {
        return histogram;
    }

    let entries: Vec<Entry> = histogram
        .into_iter()
        .map(|(c, count)| Entry {
            rgb: [c.r as f32, c.g as f32, c.b as f32],
            weight: count as f32,
            count,
        })
        .collect();

    let mut boxes = Vec::with_capacity(max_colors);
    boxes.push(ColorBox::new(entries));

    while boxes.len() < max_colors {
        let best_idx = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() >= 2)
            .max_by(|(_, a), (_, b)| {
                a.priority()
                    .partial_cmp(&b.priority())
                    .unwrap_or(core::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i);

        let Some(idx) = best_idx else {
            break;
        };

        let to_split = boxes.swap_remove(idx);
        let (left, right) = to_split.split();
        boxes.push(left);
        boxes.push(right);
    }

    if refine {
        return kmeans_refine(&boxes);
    }

    boxes
        .iter()
        .map(|b| (to_color(b.centroid()), b.total_count()))
        .collect()
}

/// Three rounds of weighted k-means seeded from the box centroids.
fn kmeans_refine(boxes: &[ColorBox]) -> Vec<(Color, u32)> {
    let all_entries: Vec<&Entry> = boxes.iter().flat_map(|b| &b.entries).collect();
    let mut centroids: Vec<[f32; 3]> = boxes.iter().map(|b| b.centroid()).collect();
    let k = centroids.len();
    let mut assignment = vec![0usize; all_entries.len()];

    for _ in 0..3 {
        for (slot, e) in assignment.iter_mut().zip(&all_entries) {
            *slot = nearest(&centroids, e.rgb);
        }
        for (i, centroid) in centroids.iter_mut().enumerate() {
            let members = all_entries
                .iter()
                .zip(&assignment)
                .filter(|(_, a)| **a == i)
                .map(|(e, _)| (e.rgb, e.weight));
            let mean = weighted_mean(members);
            // Empty clusters keep their previous position.
            if assignment.iter().any(|a| *a == i) {
                *centroid = mean;
            }
        }
    }

    let mut counts = vec![0u32; k];
    for (e, a) in all_entries.iter().zip(&assignment) {
        counts[*a] = counts[*a].saturating_add(e.count);
    }

    centroids
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(c, count)| (to_color(c), count))
        .collect()
}

fn nearest(centroids: &[[f32; 3]], rgb: [f32; 3]) -> usize {
    let dist = |c: &[f32; 3]| {
        let d = [c[0] - rgb[0], c[1] - rgb[1], c[2] - rgb[2]];
        d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
    };
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            dist(a)
                .partial_cmp(&dist(b))
                .unwrap_or(core::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
