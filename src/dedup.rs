use crate::color::{Color, MAX_DISTANCE_SQ};

/// Drop every color that lies closer than `tolerance` to an earlier survivor.
///
/// Greedy and order dependent: colors are visited in input order, and each
/// color still standing knocks out every other standing color within
/// `tolerance` (Euclidean RGB). A color that has been knocked out never
/// knocks out anything itself. The result keeps input order.
///
/// A tolerance of 0 keeps everything. Negative or NaN tolerances are treated
/// as 0.
pub fn dedup_similar(colors: &[Color], tolerance: f32) -> Vec<Color> {
    let threshold = threshold_sq(tolerance);
    let n = colors.len();
    let mut kept = vec![true; n];

    for i in 0..n {
        if !kept[i] {
            continue;
        }
        for j in 0..n {
            if j == i || !kept[j] {
                continue;
            }
            if (colors[i].distance_sq(colors[j]) as u64) < threshold {
                kept[j] = false;
            }
        }
    }

    colors
        .iter()
        .zip(kept)
        .filter_map(|(c, keep)| keep.then_some(*c))
        .collect()
}

/// `distance < t` on integers: `d² < t²` with `d² ∈ ℕ` is the same as
/// `d² < ⌈t²⌉`.
fn threshold_sq(tolerance: f32) -> u64 {
    if tolerance.is_nan() || tolerance <= 0.0 {
        return 0;
    }
    let t = tolerance as f64;
    // Anything past the largest possible distance eliminates every pair.
    (t * t).ceil().min(MAX_DISTANCE_SQ as f64 + 1.0) as u64
}

/// Smallest pairwise distance in `colors`, or `None` with fewer than two.
pub fn min_pairwise_distance(colors: &[Color]) -> Option<f32> {
    let mut best: Option<u32> = None;
    for (i, a) in colors.iter().enumerate() {
        for b in &colors[i + 1..] {
            let d = a.distance_sq(*b);
            best = Some(best.map_or(d, |cur| cur.min(d)));
        }
    }
    best.map(|d| (d as f32).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tolerance_keeps_all() {
        let colors = vec![Color::new(1, 1, 1), Color::new(1, 1, 2), Color::new(9, 9, 9)];
        assert_eq!(dedup_similar(&colors, 0.0), colors);
    }

    #[test]
    fn first_of_a_close_pair_survives() {
        let a = Color::new(100, 100, 100);
        let b = Color::new(103, 100, 100);
        let far = Color::new(0, 0, 255);
        assert_eq!(dedup_similar(&[a, b, far], 5.0), vec![a, far]);
        assert_eq!(dedup_similar(&[b, a, far], 5.0), vec![b, far]);
    }

    #[test]
    fn boundary_distance_is_kept() {
        // Exactly 5 apart: `distance < tolerance` is false.
        let a = Color::new(0, 0, 0);
        let b = Color::new(3, 4, 0);
        assert_eq!(dedup_similar(&[a, b], 5.0), vec![a, b]);
        assert_eq!(dedup_similar(&[a, b], 5.01), vec![a]);
    }

    #[test]
    fn dropped_colors_do_not_eliminate() {
        // a drops b; b would have dropped c, but c is 10 away from a.
        let a = Color::new(0, 0, 0);
        let b = Color::new(5, 0, 0);
        let c = Color::new(10, 0, 0);
        assert_eq!(dedup_similar(&[a, b, c], 6.0), vec![a, c]);
    }

    #[test]
    fn every_survivor_gets_a_turn() {
        let a = Color::new(0, 0, 0);
        let b = Color::new(50, 0, 0);
        let c = Color::new(60, 0, 0);
        // a keeps b and c (both ≥ 40 away), then b drops c.
        assert_eq!(dedup_similar(&[a, b, c], 40.0), vec![a, b]);
    }

    #[test]
    fn huge_tolerance_leaves_one() {
        let colors = vec![Color::BLACK, Color::WHITE, Color::new(1, 2, 3)];
        assert_eq!(dedup_similar(&colors, 1000.0), vec![Color::BLACK]);
        assert_eq!(
            dedup_similar(&colors, crate::color::MAX_TOLERANCE + 0.01),
            vec![Color::BLACK]
        );
    }

    #[test]
    fn nan_tolerance_keeps_all() {
        let colors = vec![Color::BLACK, Color::new(0, 0, 1)];
        assert_eq!(dedup_similar(&colors, f32::NAN), colors);
    }

    #[test]
    fn min_pairwise() {
        assert_eq!(min_pairwise_distance(&[Color::BLACK]), None);
        let d = min_pairwise_distance(&[Color::BLACK, Color::new(3, 4, 0), Color::WHITE]);
        assert_eq!(d, Some(5.0));
    }
}
