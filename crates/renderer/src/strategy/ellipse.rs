//! Ellipse outlines oriented by the localization covariance.

use super::circle::radius_in_range;
use super::{precision_columns, trace_outline, OutlineParams, Tally};
use crate::target::Target;
use smlm_common::{PointSource, RenderResult, Rgb};

/// Orientation of the covariance ellipse: θ = ½·atan2(2σxy, σx² − σy²).
pub fn ellipse_angle(sigma_x: f64, sigma_y: f64, sigma_xy: f64) -> f64 {
    0.5 * (2.0 * sigma_xy).atan2(sigma_x * sigma_x - sigma_y * sigma_y)
}

/// Draw one ellipse per point with radii σx, σy scaled by `radius_factor`,
/// rotated by the covariance angle. A fixed radius draws unrotated circles.
pub(crate) fn rasterize<P>(
    params: &OutlineParams,
    target: &Target,
    points: &P,
    colors: &[Rgb],
    buf: &mut [Rgb],
) -> RenderResult<Tally>
where
    P: PointSource + ?Sized,
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
    let fixed = params.fixed_radius.unwrap_or(0.0);

    let mut tally = Tally::default();
    let xs = points.x();
    let ys = points.y();

    for i in 0..points.len() {
        let (rx_nm, ry_nm, theta) = match precision {
            Some((sx, sy)) => {
                let theta = covariance
                    .map(|c| ellipse_angle(sx[i], sy[i], c[i]))
                    .filter(|t| t.is_finite())
                    .unwrap_or(0.0);
                (
                    sx[i] * 1000.0 * params.radius_factor,
                    sy[i] * 1000.0 * params.radius_factor,
                    theta,
                )
            }
            None => (fixed, fixed, 0.0),
        };
        if !radius_in_range(rx_nm) || !radius_in_range(ry_nm) {
            tally.skipped += 1;
            continue;
        }

        let center = target.physical_to_pixel(xs[i], ys[i]);
        trace_outline(
            buf,
            target,
            center,
            (target.nm_to_pixels(rx_nm), target.nm_to_pixels(ry_nm)),
            theta,
            colors[i],
            params.line_width,
        );
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smlm_common::PointCloud;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_angle() {
        assert_eq!(ellipse_angle(2.0, 1.0, 0.0), 0.0);
        assert!((ellipse_angle(1.0, 1.0, 0.5) - FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_axis_aligned_extent() {
        let target = Target::new(31, 31, 100.0, (0.0, 3.1), (0.0, 3.1)).unwrap();
        // rx = 1000 nm (10 px), ry = 300 nm (3 px)
        let cloud = PointCloud::new(vec![1.55], vec![1.55])
            .unwrap()
            .with_precision(vec![1.0], vec![0.3])
            .unwrap();
        let mut buf = vec![Rgb::BLACK; target.len()];
        rasterize(&OutlineParams::default(), &target, &cloud, &[Rgb::WHITE], &mut buf).unwrap();

        let lit = |row: usize, col: usize| buf[(row - 1) * 31 + (col - 1)].r > 0.0;
        assert!(lit(16, 26));
        assert!(lit(16, 6));
        assert!(!lit(26, 16));
        assert!(!lit(6, 16));
    }
}
