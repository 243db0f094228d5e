//! Nearest-pixel binning.

use super::Tally;
use crate::accumulator::Deposit;
use crate::target::Target;
use smlm_common::PointSource;

/// Add one unit of weight per point at its nearest pixel.
///
/// Points outside the target are dropped.
pub(crate) fn rasterize<P, D>(target: &Target, points: &P, acc: &mut D) -> Tally
where
    P: PointSource + ?Sized,
    D: Deposit,
{
    let xs = points.x();
    let ys = points.y();

    for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        if let Some(offset) = target.offset(target.physical_to_pixel_index(x, y)) {
            acc.deposit(offset, 1.0, i);
        }
    }

    Tally::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::GrayBuffer;
    use smlm_common::{PointCloud, Rgb};

    #[test]
    fn test_counts_per_pixel() {
        let target = Target::new(4, 4, 100.0, (0.0, 0.4), (0.0, 0.4)).unwrap();
        let cloud = PointCloud::new(vec![0.05, 0.05, 0.25, 9.0], vec![0.05, 0.05, 0.15, 9.0]).unwrap();
        let mut acc = GrayBuffer::new(target.len());
        rasterize(&target, &cloud, &mut acc);

        let pixels = acc.into_gray(None);
        assert_eq!(pixels[0], Rgb::WHITE);
        assert_eq!(pixels[4 + 2], Rgb::gray(0.5));
        assert_eq!(pixels.iter().filter(|p| p.r > 0.0).count(), 2);
    }
}
