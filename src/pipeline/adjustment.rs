/// Brightness / contrast / level adjustment
///
/// `apply` is a pure function of its source buffer and parameters. Every
/// parameter change re-runs it against the stored original (or log) buffer,
/// never against the previous output, so rounding error cannot compound.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::data::raster::{DisplayBuffer, RasterBuffer};

pub const BRIGHTNESS_RANGE: (i32, i32) = (-100, 100);
pub const CONTRAST_RANGE: (f32, f32) = (0.0, 2.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentParams {
    pub brightness: i32,
    pub contrast: f32,
    pub black_point: f32,
    pub white_point: f32,
}

impl Default for AdjustmentParams {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 1.0,
            black_point: 0.0,
            white_point: 1.0,
        }
    }
}

impl AdjustmentParams {
    /// Force every field into its documented range
    pub fn clamped(self) -> Self {
        Self {
            brightness: self.brightness.clamp(BRIGHTNESS_RANGE.0, BRIGHTNESS_RANGE.1),
            contrast: clamp_finite(self.contrast, CONTRAST_RANGE.0, CONTRAST_RANGE.1, 1.0),
            black_point: clamp_finite(self.black_point, 0.0, 1.0, 0.0),
            white_point: clamp_finite(self.white_point, 0.0, 1.0, 1.0),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Level remapping is only engaged off the identity and away from the
    /// degenerate equal-points case.
    fn remaps_levels(&self) -> bool {
        (self.black_point > 0.0 || self.white_point < 1.0) && self.black_point != self.white_point
    }
}

fn clamp_finite(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v.clamp(lo, hi)
    } else {
        fallback
    }
}

/// One adjustable control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdjustField {
    Brightness(i32),
    Contrast(f32),
    BlackPoint(f32),
    WhitePoint(f32),
}

impl std::fmt::Display for AdjustField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustField::Brightness(v) => write!(f, "Brightness {:+}", v),
            AdjustField::Contrast(v) => write!(f, "Contrast {:.2}", v),
            AdjustField::BlackPoint(v) => write!(f, "Black point {:.3}", v),
            AdjustField::WhitePoint(v) => write!(f, "White point {:.3}", v),
        }
    }
}

/// Produce an 8-bit display buffer from `source`.
///
/// 1. normalize to [0,1] over the buffer's own finite range (uniform → 0)
/// 2. remap levels between black and white point, clipped to [0,1]
/// 3. scale to [0,255], apply `x * contrast + brightness`, clip, narrow
pub fn apply(source: &RasterBuffer, params: &AdjustmentParams) -> DisplayBuffer {
    let started = Instant::now();
    let params = params.clamped();

    let Some((min, max)) = source.range() else {
        return DisplayBuffer::zeros(source.width, source.height, source.channels);
    };
    let (min, max) = (min as f64, max as f64);
    let span = max - min;

    let black = params.black_point as f64;
    let white = params.white_point as f64;
    let remap = params.remaps_levels();
    let contrast = params.contrast as f64;
    let brightness = params.brightness as f64;

    let data = source
        .data
        .iter()
        .map(|&v| {
            let v = v as f64;
            let mut x = if !v.is_finite() {
                if v == f64::INFINITY {
                    1.0
                } else {
                    0.0
                }
            } else if span > 0.0 {
                (v - min) / span
            } else {
                0.0
            };
            if remap {
                x = ((x - black) / (white - black)).clamp(0.0, 1.0);
            }
            let scaled = (x * 255.0).trunc();
            (scaled * contrast + brightness).clamp(0.0, 255.0) as u8
        })
        .collect();

    log::debug!(
        "Adjusted {}×{}×{} in {:.1} ms",
        source.width,
        source.height,
        source.channels,
        started.elapsed().as_secs_f64() * 1000.0
    );
    DisplayBuffer::new(source.width, source.height, source.channels, data)
}

/// 256-bin histogram over every sample of a display buffer
pub fn histogram(display: &DisplayBuffer) -> [u32; 256] {
    let mut bins = [0u32; 256];
    for &v in &display.data {
        bins[v as usize] += 1;
    }
    bins
}

/// Current slider state
#[derive(Debug, Clone, Default)]
pub struct Adjuster {
    params: AdjustmentParams,
}

impl Adjuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &AdjustmentParams {
        &self.params
    }

    /// Update one field; returns false if the value did not change.
    pub fn set(&mut self, field: AdjustField) -> bool {
        let mut next = self.params;
        match field {
            AdjustField::Brightness(v) => next.brightness = v,
            AdjustField::Contrast(v) => next.contrast = v,
            AdjustField::BlackPoint(v) => next.black_point = v,
            AdjustField::WhitePoint(v) => next.white_point = v,
        }
        let next = next.clamped();
        let changed = next != self.params;
        self.params = next;
        changed
    }

    pub fn reset(&mut self) {
        self.params = AdjustmentParams::default();
    }

    pub fn render(&self, source: &RasterBuffer) -> DisplayBuffer {
        apply(source, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> RasterBuffer {
        RasterBuffer::new(5, 1, 1, vec![100.0, 200.0, 300.0, 400.0, 500.0])
    }

    #[test]
    fn test_default_params_stretch_full_range() {
        let out = apply(&ramp(), &AdjustmentParams::default());
        assert_eq!(out.data, vec![0, 63, 127, 191, 255]);
    }

    #[test]
    fn test_default_apply_is_idempotent() {
        let source = RasterBuffer::new(3, 2, 1, vec![7.0, 1e4, 42.5, 3.0, 900.0, 12.0]);
        let params = AdjustmentParams::default();
        let once = apply(&source, &params);
        let twice = apply(&source, &params);
        assert_eq!(once, twice);

        // Already-normalized output survives another pass within one level
        let again = apply(&RasterBuffer::from_display(&once), &params);
        for (a, b) in once.data.iter().zip(&again.data) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_source_is_never_mutated() {
        let source = ramp();
        let copy = source.clone();
        let mut adjuster = Adjuster::new();
        adjuster.set(AdjustField::Brightness(50));
        let _ = adjuster.render(&source);
        assert_eq!(source, copy);
    }

    #[test]
    fn test_equal_black_and_white_point_passes_through() {
        let params = AdjustmentParams {
            black_point: 0.2,
            white_point: 0.2,
            ..AdjustmentParams::default()
        };
        let out = apply(&ramp(), &params);
        assert_eq!(out, apply(&ramp(), &AdjustmentParams::default()));
    }

    #[test]
    fn test_level_remap_clips() {
        let params = AdjustmentParams {
            black_point: 0.25,
            white_point: 0.75,
            ..AdjustmentParams::default()
        };
        let out = apply(&ramp(), &params);
        assert_eq!(out.data, vec![0, 0, 127, 255, 255]);
    }

    #[test]
    fn test_inverted_levels_do_not_panic() {
        let params = AdjustmentParams {
            black_point: 0.8,
            white_point: 0.2,
            ..AdjustmentParams::default()
        };
        let out = apply(&ramp(), &params);
        assert_eq!(out.data[0], 255);
        assert_eq!(out.data[4], 0);
    }

    #[test]
    fn test_uniform_image_is_guarded() {
        let out = apply(&RasterBuffer::filled(3, 3, 77.0), &AdjustmentParams::default());
        assert!(out.data.iter().all(|&v| v == 0));

        let bright = AdjustmentParams {
            brightness: 40,
            ..AdjustmentParams::default()
        };
        let out = apply(&RasterBuffer::filled(2, 2, 77.0), &bright);
        assert!(out.data.iter().all(|&v| v == 40));
    }

    #[test]
    fn test_contrast_and_brightness_clip() {
        let params = AdjustmentParams {
            brightness: -100,
            contrast: 2.0,
            ..AdjustmentParams::default()
        };
        let out = apply(&ramp(), &params);
        // 0*2-100 → 0, 63*2-100 = 26, 127*2-100 = 154, 191*2-100 → 255
        assert_eq!(out.data, vec![0, 26, 154, 255, 255]);
    }

    #[test]
    fn test_rgb_shape_preserved() {
        let source = RasterBuffer::new(2, 1, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = apply(&source, &AdjustmentParams::default());
        assert!(out.is_rgb());
        assert_eq!(out.data.len(), 6);
        assert_eq!(out.data[5], 255);
    }

    #[test]
    fn test_adjuster_clamps_and_resets() {
        let mut adjuster = Adjuster::new();
        assert!(adjuster.set(AdjustField::Brightness(500)));
        assert_eq!(adjuster.params().brightness, 100);
        assert!(!adjuster.set(AdjustField::Brightness(100)));
        adjuster.set(AdjustField::Contrast(f32::NAN));
        assert_eq!(adjuster.params().contrast, 1.0);
        adjuster.set(AdjustField::WhitePoint(-1.0));
        assert_eq!(adjuster.params().white_point, 0.0);
        adjuster.reset();
        assert!(adjuster.params().is_default());
    }

    #[test]
    fn test_histogram_counts_every_sample() {
        let display = DisplayBuffer::new(2, 2, 1, vec![0, 0, 255, 9]);
        let bins = histogram(&display);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[9], 1);
        assert_eq!(bins[255], 1);
        assert_eq!(bins.iter().sum::<u32>(), 4);
    }
}
