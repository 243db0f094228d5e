//! Anisotropic Gaussian splatting.

use super::{precision_columns, GaussianParams, KernelNormalization, Tally};
use crate::accumulator::Deposit;
use crate::target::Target;
use smlm_common::{PointSource, RenderResult};
use std::f64::consts::PI;

/// Accepted sigma range (nm). Points outside are skipped.
pub const MIN_SIGMA_NM: f64 = 1e-3;
pub const MAX_SIGMA_NM: f64 = 1000.0;

/// Kernel of one point in pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Kernel {
    var_x: f64,
    var_y: f64,
    cov_xy: f64,
    det: f64,
    amplitude: f64,
}

impl Kernel {
    /// Build from pixel-unit standard deviations and covariance.
    ///
    /// Returns the kernel and whether the covariance had to be dropped.
    fn new(sigma_x: f64, sigma_y: f64, cov_xy: f64, normalization: KernelNormalization) -> (Self, bool) {
        let var_x = sigma_x * sigma_x;
        let var_y = sigma_y * sigma_y;
        let full_det = var_x * var_y - cov_xy * cov_xy;

        let (cov_xy, det, fallback) = if cov_xy == 0.0 {
            (0.0, var_x * var_y, false)
        } else if full_det > 0.0 && full_det.is_finite() {
            (cov_xy, full_det, false)
        } else {
            (0.0, var_x * var_y, true)
        };

        let amplitude = match normalization {
            KernelNormalization::Integral => 1.0 / (2.0 * PI * det.sqrt()),
            KernelNormalization::Maximum => 1.0,
        };

        (
            Self {
                var_x,
                var_y,
                cov_xy,
                det,
                amplitude,
            },
            fallback,
        )
    }

    /// Kernel value at offset (dx, dy) from the center.
    #[inline]
    fn eval(&self, dx: f64, dy: f64) -> f64 {
        let q = if self.cov_xy == 0.0 {
            dx * dx / self.var_x + dy * dy / self.var_y
        } else {
            (self.var_y * dx * dx - 2.0 * self.cov_xy * dx * dy + self.var_x * dy * dy) / self.det
        };
        self.amplitude * (-0.5 * q).exp()
    }
}

/// Splat every point as a 2D normal kernel over a ±`n_sigmas` box.
pub(crate) fn rasterize<P, D>(
    params: &GaussianParams,
    target: &Target,
    points: &P,
    acc: &mut D,
) -> RenderResult<Tally>
where
    P: PointSource + ?Sized,
    D: Deposit,
{
    let precision = if params.use_precision {
        Some(precision_columns(points)?)
    } else {
        None
    };
    let covariance = if params.use_precision {
        points.sigma_xy()
    } else {
        None
    };
    let fixed = params.fixed_sigma.unwrap_or(0.0);
    let pixel_size = target.pixel_size();

    let mut tally = Tally::default();
    let xs = points.x();
    let ys = points.y();

    for i in 0..points.len() {
        let (sx_nm, sy_nm) = match precision {
            Some((sx, sy)) => (sx[i] * 1000.0, sy[i] * 1000.0),
            None => (fixed, fixed),
        };
        if !sigma_in_range(sx_nm) || !sigma_in_range(sy_nm) {
            tally.skipped += 1;
            continue;
        }

        let cov_px = covariance
            .map(|c| c[i] * 1e6 / (pixel_size * pixel_size))
            .filter(|c| c.is_finite())
            .unwrap_or(0.0);
        let (sx_px, sy_px) = (sx_nm / pixel_size, sy_nm / pixel_size);
        let (kernel, fallback) = Kernel::new(sx_px, sy_px, cov_px, params.normalization);
        if fallback {
            tally.covariance_fallbacks += 1;
        }

        let (cx, cy) = target.physical_to_pixel(xs[i], ys[i]);
        if !cx.is_finite() || !cy.is_finite() {
            tally.skipped += 1;
            continue;
        }
        let Some((col_lo, col_hi)) = Target::clip_span(cx, params.n_sigmas * sx_px, target.width()) else {
            continue;
        };
        let Some((row_lo, row_hi)) = Target::clip_span(cy, params.n_sigmas * sy_px, target.height()) else {
            continue;
        };

        let width = target.width();
        for row in row_lo..=row_hi {
            let dy = row as f64 - cy;
            let row_base = (row as usize - 1) * width;
            for col in col_lo..=col_hi {
                let w = kernel.eval(col as f64 - cx, dy);
                if w > 0.0 {
                    acc.deposit(row_base + col as usize - 1, w, i);
                }
            }
        }
    }

    Ok(tally)
}

#[inline]
fn sigma_in_range(sigma_nm: f64) -> bool {
    (MIN_SIGMA_NM..=MAX_SIGMA_NM).contains(&sigma_nm)
}
