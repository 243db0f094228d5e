//! Circle outlines with radius from localization precision.

use super::{precision_columns, trace_outline, OutlineParams, Tally};
use crate::target::Target;
use smlm_common::{PointSource, RenderResult, Rgb};

/// Accepted outline radius range (nm). Points outside are skipped.
pub const MIN_RADIUS_NM: f64 = 0.1;
pub const MAX_RADIUS_NM: f64 = 10_000.0;

pub(crate) fn radius_in_range(radius_nm: f64) -> bool {
    (MIN_RADIUS_NM..=MAX_RADIUS_NM).contains(&radius_nm)
}

/// Draw one circle per point in that point's color.
///
/// The radius is the mean of σx and σy scaled by `radius_factor`, or the
/// fixed radius as given.
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
    let fixed = params.fixed_radius.unwrap_or(0.0);

    let mut tally = Tally::default();
    let xs = points.x();
    let ys = points.y();

    for i in 0..points.len() {
        let radius_nm = match precision {
            Some((sx, sy)) => 0.5 * (sx[i] + sy[i]) * 1000.0 * params.radius_factor,
            None => fixed,
        };
        if !radius_in_range(radius_nm) {
            tally.skipped += 1;
            continue;
        }

        let radius_px = target.nm_to_pixels(radius_nm);
        let center = target.physical_to_pixel(xs[i], ys[i]);
        trace_outline(
            buf,
            target,
            center,
            (radius_px, radius_px),
            0.0,
            colors[i],
            params.line_width,
        );
    }

    Ok(tally)
}
