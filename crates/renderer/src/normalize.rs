//! Percentile clipping, linear renormalization and the antialiased point.

use crate::target::{PixelIndex, Target};
use smlm_common::Rgb;

/// Fraction of the point color spilled into the neighbour pixel, per pixel
/// of sub-pixel offset.
pub const FRINGE_WEIGHT: f64 = 0.3;

/// Percentile of the finite values, `p` in [0, 1].
///
/// Linear interpolation between order statistics at `h = (n - 1)·p`.
/// Returns `None` when no finite value exists.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    quantile_in_place(finite, p)
}

/// Percentile computed only over nonzero values.
///
/// Sparse rasters are mostly background; including the zeros would drag
/// any threshold below the first occupied pixel.
pub fn nonzero_percentile(values: &[f64], p: f64) -> Option<f64> {
    let nonzero: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| *v != 0.0 && v.is_finite())
        .collect();
    quantile_in_place(nonzero, p)
}

fn quantile_in_place(mut values: Vec<f64>, p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let h = (values.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let frac = h - lo as f64;

    let (_, lo_val, upper) = values.select_nth_unstable_by(lo, f64::total_cmp);
    let lo_val = *lo_val;
    if frac == 0.0 || upper.is_empty() {
        return Some(lo_val);
    }
    let hi_val = upper.iter().copied().fold(f64::INFINITY, f64::min);
    Some(lo_val + frac * (hi_val - lo_val))
}

/// Clip `values` at their nonzero `clip` percentile and rescale to [0, 1].
///
/// `None` disables clipping and scales by the maximum instead. Returns the
/// threshold used; a raster with no nonzero value is left untouched and
/// reports 0.
pub fn clip_normalize(values: &mut [f64], clip: Option<f64>) -> f64 {
    let threshold = nonzero_percentile(values, clip.unwrap_or(1.0)).unwrap_or(0.0);
    if threshold <= 0.0 {
        return 0.0;
    }
    for v in values.iter_mut() {
        *v = v.min(threshold).max(0.0) / threshold;
    }
    threshold
}

/// Map `value` linearly from `[min, max]` onto [0, 1], clamped.
///
/// A zero-width range maps everything to the mid value 0.5.
#[inline]
pub fn normalize_to_range(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span.abs() < f64::EPSILON || !span.is_finite() {
        return 0.5;
    }
    ((value - min) / span).clamp(0.0, 1.0)
}

/// Rasterize one antialiased point at continuous pixel coordinates.
///
/// Three taps: `color × thickness` on the nearest pixel, plus a fringe of
/// `0.3 × thickness × |offset|` on the one horizontal and one vertical
/// neighbour the point leans towards. Contributions add onto `buf`.
pub fn splat_antialiased(buf: &mut [Rgb], target: &Target, x_px: f64, y_px: f64, color: Rgb, thickness: f64) {
    if !x_px.is_finite() || !y_px.is_finite() {
        return;
    }
    let col = x_px.round();
    let row = y_px.round();
    let dx = x_px - col;
    let dy = y_px - row;
    let center = PixelIndex {
        row: row as i64,
        col: col as i64,
    };

    deposit(buf, target, center, color * thickness);

    if dx != 0.0 {
        let side = PixelIndex {
            row: center.row,
            col: center.col + dx.signum() as i64,
        };
        deposit(buf, target, side, color * (FRINGE_WEIGHT * thickness * dx.abs()));
    }
    if dy != 0.0 {
        let side = PixelIndex {
            row: center.row + dy.signum() as i64,
            col: center.col,
        };
        deposit(buf, target, side, color * (FRINGE_WEIGHT * thickness * dy.abs()));
    }
}

#[inline]
fn deposit(buf: &mut [Rgb], target: &Target, index: PixelIndex, color: Rgb) {
    if let Some(offset) = target.offset(index) {
        buf[offset] += color;
    }
}
