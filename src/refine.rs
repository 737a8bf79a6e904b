//! The relaxation loop: scan, deduplicate, and loosen the tolerance (or ask
//! the quantizer for more candidates) until the palette is full.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Instant;

use crate::color::{Color, MAX_TOLERANCE};
use crate::dedup::dedup_similar;
use crate::error::{PaletteError, Result};
use crate::histogram::ColorCounts;
use crate::median_cut::Quantizer;
use crate::palette::Palette;
use crate::pixels::PixelView;
use crate::{PaletteConfig, SizePolicy};

/// A successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    palette: Palette,
    tolerance: f32,
    attempts: u32,
    distinct_colors: usize,
}

impl Extraction {
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn into_palette(self) -> Palette {
        self.palette
    }

    /// Tolerance of the accepted pass. Lower than the requested tolerance
    /// when relaxation happened.
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Number of deduplication passes, including the accepted one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Distinct opaque colors found in the image.
    pub fn distinct_colors(&self) -> usize {
        self.distinct_colors
    }
}

/// Loop state. Never visible to callers.
#[derive(Debug)]
struct Relaxation {
    attempt: u32,
    tolerance: f32,
    offset: usize,
    most_candidates: Option<usize>,
}

impl Relaxation {
    fn new(tolerance: f32) -> Self {
        Self {
            attempt: 0,
            tolerance,
            offset: 0,
            most_candidates: None,
        }
    }

    fn lower_tolerance(&mut self, step: f32) -> bool {
        if self.tolerance <= 0.0 {
            return false;
        }
        self.tolerance = (self.tolerance - step).max(0.0);
        true
    }

    /// Ask the quantizer for more candidates while it can still return colors
    /// it has not returned yet. A pass that brings no new distinct candidates
    /// also lowers the tolerance, and so does every pass once the request
    /// already covers all `distinct` colors.
    fn widen(
        &mut self,
        requested: usize,
        got: usize,
        distinct: usize,
        config: &PaletteConfig,
    ) -> bool {
        let grew = self.most_candidates.is_none_or(|most| got > most);
        self.most_candidates = Some(self.most_candidates.map_or(got, |most| most.max(got)));

        let can_ask_more = requested < distinct;
        let lowered = if grew && can_ask_more {
            false
        } else {
            self.lower_tolerance(config.relax_step)
        };
        if can_ask_more {
            self.offset += config.quantizer_step;
        }
        lowered || can_ask_more
    }
}

pub(crate) fn run(
    view: &PixelView<'_>,
    config: &PaletteConfig,
    quantizer: Option<&dyn Quantizer>,
) -> Result<Extraction> {
    validate(config)?;

    let counts = ColorCounts::from_view(view, config.exclude_black_white);
    let distinct = counts.len();
    let target = resolve_target(config, distinct)?;

    let (ascending, weighted) = match quantizer {
        None => (counts.ascending(), Vec::new()),
        Some(_) => (Vec::new(), counts.weighted()),
    };

    let started = Instant::now();
    let mut state = Relaxation::new(config.tolerance);

    loop {
        state.attempt += 1;

        let requested = target + state.offset;
        let candidates: Cow<'_, [Color]> = match quantizer {
            None => Cow::Borrowed(&ascending),
            Some(q) => Cow::Owned(order_by_weight(
                q.quantize(&weighted, requested),
                config.exclude_black_white,
            )),
        };

        let mut kept = dedup_similar(&candidates, state.tolerance);
        log::debug!(
            "pass {}: {} candidates, {} kept at tolerance {:.2} (want {})",
            state.attempt,
            candidates.len(),
            kept.len(),
            state.tolerance,
            target
        );

        if kept.len() >= target {
            kept.truncate(target);
            return Ok(Extraction {
                palette: Palette::from_separated(kept),
                tolerance: state.tolerance,
                attempts: state.attempt,
                distinct_colors: distinct,
            });
        }

        let exhausted = PaletteError::RefinementExhausted {
            attempts: state.attempt,
            found: kept.len(),
            requested: target,
            tolerance: state.tolerance,
        };

        if state.attempt >= config.max_attempts {
            log::warn!("{exhausted}");
            return Err(exhausted);
        }

        if let Some(deadline) = config.deadline {
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                let err = PaletteError::DeadlineExceeded {
                    attempts: state.attempt,
                    elapsed_ms: elapsed.as_millis() as u64,
                };
                log::warn!("{err}");
                return Err(err);
            }
        }

        let relaxed = match quantizer {
            None => state.lower_tolerance(config.relax_step),
            Some(_) => state.widen(requested, candidates.len(), distinct, config),
        };
        if !relaxed {
            log::warn!("no further relaxation possible: {exhausted}");
            return Err(exhausted);
        }
    }
}

fn validate(config: &PaletteConfig) -> Result<()> {
    if config.colors == 0 {
        return Err(PaletteError::invalid("palette size must be at least 1"));
    }
    if !config.tolerance.is_finite() || !(0.0..=MAX_TOLERANCE).contains(&config.tolerance) {
        return Err(PaletteError::invalid(format!(
            "tolerance must be between 0 and {MAX_TOLERANCE}, got {}",
            config.tolerance
        )));
    }
    if !config.relax_step.is_finite() || config.relax_step <= 0.0 {
        return Err(PaletteError::invalid(format!(
            "relaxation step must be positive, got {}",
            config.relax_step
        )));
    }
    if config.max_attempts == 0 {
        return Err(PaletteError::invalid("max_attempts must be at least 1"));
    }
    if config.quantizer_step == 0 {
        return Err(PaletteError::invalid("quantizer_step must be at least 1"));
    }
    Ok(())
}

fn resolve_target(config: &PaletteConfig, distinct: usize) -> Result<usize> {
    if distinct == 0 {
        return Err(PaletteError::SizeTooLarge {
            requested: config.colors,
            available: 0,
        });
    }
    if config.colors <= distinct {
        return Ok(config.colors);
    }
    match config.size_policy {
        SizePolicy::Strict => Err(PaletteError::SizeTooLarge {
            requested: config.colors,
            available: distinct,
        }),
        SizePolicy::Clamp => {
            log::info!(
                "requested {} colors, image has {distinct}; clamping",
                config.colors
            );
            Ok(distinct)
        }
    }
}

/// Merge duplicate quantizer outputs and order rarest first, ties in output
/// order. Pure black and white are dropped when excluded.
fn order_by_weight(raw: Vec<(Color, u32)>, exclude_black_white: bool) -> Vec<Color> {
    let mut merged: Vec<(Color, u64)> = Vec::with_capacity(raw.len());
    let mut index: HashMap<Color, usize> = HashMap::with_capacity(raw.len());
    for (color, weight) in raw {
        if exclude_black_white && (color == Color::BLACK || color == Color::WHITE) {
            continue;
        }
        match index.get(&color) {
            Some(&i) => merged[i].1 += weight as u64,
            None => {
                index.insert(color, merged.len());
                merged.push((color, weight as u64));
            }
        }
    }
    // Stable sort keeps output order among equal weights.
    merged.sort_by_key(|(_, w)| *w);
    merged.into_iter().map(|(c, _)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Fixed(Vec<(Color, u32)>);

    impl Quantizer for Fixed {
        fn quantize(&self, _histogram: &[(Color, u32)], max_colors: usize) -> Vec<(Color, u32)> {
            self.0.iter().copied().take(max_colors).collect()
        }
    }

    /// Returns one color fewer than asked for, padded with a repeat of the
    /// first, the way rounding can make two centroids collide.
    struct RepeatsFirst;

    impl Quantizer for RepeatsFirst {
        fn quantize(&self, histogram: &[(Color, u32)], max_colors: usize) -> Vec<(Color, u32)> {
            let mut out: Vec<(Color, u32)> = histogram
                .iter()
                .copied()
                .take(max_colors.saturating_sub(1))
                .collect();
            if let Some(&first) = histogram.first() {
                out.push(first);
            }
            out
        }
    }

    fn bgra(colors: &[Color]) -> Vec<u8> {
        colors.iter().flat_map(|c| [c.b, c.g, c.r, 255]).collect()
    }

    #[test]
    fn merges_quantizer_duplicates() {
        let a = Color::new(1, 0, 0);
        let b = Color::new(2, 0, 0);
        let c = Color::new(3, 0, 0);
        let ordered = order_by_weight(vec![(a, 5), (b, 3), (a, 1), (c, 3)], false);
        assert_eq!(ordered, vec![b, c, a]);
    }

    #[test]
    fn merged_candidates_drop_excluded_colors() {
        let red = Color::new(255, 0, 0);
        let raw = vec![(Color::BLACK, 1), (red, 2), (Color::WHITE, 3)];
        assert_eq!(order_by_weight(raw.clone(), true), vec![red]);
        assert_eq!(order_by_weight(raw, false).len(), 3);
    }

    #[test]
    fn colliding_quantizer_output_asks_for_more() {
        let image: Vec<Color> = [0u8, 50, 100, 150, 200]
            .iter()
            .map(|&r| Color::new(r, 0, 0))
            .collect();
        let data = bgra(&image);
        let view = PixelView::from_bgra(&data, 5, 1).unwrap();
        let config = PaletteConfig::new(4).tolerance(0.0);
        let out = run(&view, &config, Some(&RepeatsFirst)).unwrap();
        assert_eq!(out.palette().len(), 4);
        assert_eq!(out.tolerance(), 0.0);
        assert_eq!(out.attempts(), 2);
    }

    #[test]
    fn quantizer_mode_reaches_every_distinct_color() {
        let image: Vec<Color> = (0u8..40).map(|i| Color::new(i * 6, 255 - i * 6, i)).collect();
        let data = bgra(&image);
        let view = PixelView::from_bgra(&data, 40, 1).unwrap();
        let quantizer = crate::MedianCut::new().refine(true);
        for colors in [1, 7, 23, 40] {
            let config = PaletteConfig::new(colors).tolerance(0.0);
            let out = run(&view, &config, Some(&quantizer)).unwrap();
            assert_eq!(out.palette().len(), colors);
        }
    }

    #[test]
    fn lowers_tolerance_until_full() {
        let data = bgra(&[Color::new(0, 0, 0), Color::new(10, 0, 0)]);
        let view = PixelView::from_bgra(&data, 2, 1).unwrap();
        let config = PaletteConfig::new(2).tolerance(100.0).relax_step(5.0);
        let out = run(&view, &config, None).unwrap();
        assert_eq!(out.palette().len(), 2);
        assert_eq!(out.tolerance(), 10.0);
        assert_eq!(out.attempts(), 19);
    }

    #[test]
    fn attempt_bound_is_reported() {
        let data = bgra(&[Color::new(0, 0, 0), Color::new(10, 0, 0)]);
        let view = PixelView::from_bgra(&data, 2, 1).unwrap();
        let config = PaletteConfig::new(2)
            .tolerance(100.0)
            .relax_step(5.0)
            .max_attempts(3);
        let err = run(&view, &config, None).unwrap_err();
        assert!(matches!(
            err,
            PaletteError::RefinementExhausted {
                attempts: 3,
                found: 1,
                requested: 2,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::RefinementExhausted);
    }

    #[test]
    fn zero_deadline_stops_after_first_pass() {
        let data = bgra(&[Color::new(0, 0, 0), Color::new(10, 0, 0)]);
        let view = PixelView::from_bgra(&data, 2, 1).unwrap();
        let config = PaletteConfig::new(2)
            .tolerance(100.0)
            .deadline(std::time::Duration::ZERO);
        assert!(matches!(
            run(&view, &config, None),
            Err(PaletteError::DeadlineExceeded { attempts: 1, .. })
        ));
    }

    #[test]
    fn quantizer_offset_grows_before_tolerance_drops() {
        let colors: Vec<(Color, u32)> = [0u8, 10, 80, 120, 160, 200]
            .iter()
            .map(|&r| (Color::new(r, 0, 0), 1))
            .collect();
        let image: Vec<Color> = colors.iter().map(|(c, _)| *c).collect();
        let data = bgra(&image);
        let view = PixelView::from_bgra(&data, 6, 1).unwrap();
        // First pass sees four candidates and loses one to the 0/10 pair; the
        // second pass asks for five.
        let config = PaletteConfig::new(4).tolerance(30.0).quantizer_step(1);
        let out = run(&view, &config, Some(&Fixed(colors))).unwrap();
        assert_eq!(out.palette().len(), 4);
        assert_eq!(out.tolerance(), 30.0);
        assert_eq!(out.attempts(), 2);
    }

    #[test]
    fn stalled_quantizer_falls_back_to_tolerance() {
        let colors = vec![(Color::new(0, 0, 0), 1), (Color::new(20, 0, 0), 1)];
        let image: Vec<Color> = colors.iter().map(|(c, _)| *c).collect();
        let data = bgra(&image);
        let view = PixelView::from_bgra(&data, 2, 1).unwrap();
        let config = PaletteConfig::new(2).tolerance(30.0).relax_step(10.0);
        let out = run(&view, &config, Some(&Fixed(colors))).unwrap();
        assert_eq!(out.palette().len(), 2);
        assert_eq!(out.tolerance(), 20.0);
    }

    #[test]
    fn quantizer_that_cannot_deliver_is_exhausted() {
        let image = [Color::new(0, 0, 0), Color::new(200, 0, 0)];
        let data = bgra(&image);
        let view = PixelView::from_bgra(&data, 2, 1).unwrap();
        let only_one = Fixed(vec![(Color::new(100, 0, 0), 2)]);
        let config = PaletteConfig::new(2).tolerance(10.0);
        let err = run(&view, &config, Some(&only_one)).unwrap_err();
        assert!(matches!(
            err,
            PaletteError::RefinementExhausted {
                found: 1,
                tolerance,
                ..
            } if tolerance == 0.0
        ));
    }

    #[test]
    fn clamp_policy_shrinks_target() {
        let data = bgra(&[Color::new(0, 0, 0), Color::new(255, 0, 0)]);
        let view = PixelView::from_bgra(&data, 2, 1).unwrap();
        let config = PaletteConfig::new(5)
            .tolerance(0.0)
            .size_policy(SizePolicy::Clamp);
        let out = run(&view, &config, None).unwrap();
        assert_eq!(out.palette().len(), 2);

        let strict = PaletteConfig::new(5).tolerance(0.0);
        assert!(matches!(
            run(&view, &strict, None),
            Err(PaletteError::SizeTooLarge {
                requested: 5,
                available: 2
            })
        ));
    }

    #[test]
    fn bad_parameters_rejected_before_scanning() {
        let data = bgra(&[Color::new(0, 0, 0)]);
        let view = PixelView::from_bgra(&data, 1, 1).unwrap();
        for config in [
            PaletteConfig::new(0),
            PaletteConfig::new(1).tolerance(-1.0),
            PaletteConfig::new(1).tolerance(f32::NAN),
            PaletteConfig::new(1).tolerance(500.0),
            PaletteConfig::new(1).relax_step(0.0),
            PaletteConfig::new(1).max_attempts(0),
            PaletteConfig::new(1).quantizer_step(0),
        ] {
            let err = run(&view, &config, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{config:?}");
        }
    }
}
