//! Multi-channel overlay compositing.
//!
//! Each channel is rendered on the shared target in a single manual color,
//! optionally scaled by its own brightest channel value, then all channels
//! are summed and clipped to white.

use crate::color::ColorMapping;
use crate::colormap::ColormapRegistry;
use crate::raster::RgbImage;
use crate::render::{render, RenderInfo, RenderOutput, RenderRequest, BACKEND};
use crate::strategy::Strategy;
use crate::target::Target;
use smlm_common::{PointSource, RenderError, RenderResult, Rgb};
use std::time::Instant;
use tracing::debug;

/// One overlay channel: a point set and the color it is drawn in.
#[derive(Debug, Clone, Copy)]
pub struct OverlayChannel<'a, P: ?Sized> {
    pub points: &'a P,
    pub color: Rgb,
}

impl<'a, P: ?Sized> OverlayChannel<'a, P> {
    pub fn new(points: &'a P, color: Rgb) -> Self {
        Self { points, color }
    }
}

/// Render every channel with `strategy` and composite the results.
///
/// `normalize` scales each channel by its maximum channel value before
/// summing; outline strategies are never scaled.
pub fn render_overlay<P>(
    channels: &[OverlayChannel<'_, P>],
    target: &Target,
    strategy: &Strategy,
    normalize: bool,
    brightness_clip: Option<f64>,
) -> RenderResult<RenderOutput>
where
    P: PointSource + ?Sized,
{
    if channels.is_empty() {
        return Err(RenderError::invalid_parameter(
            "channels",
            "overlay needs at least one channel",
        ));
    }

    let start = Instant::now();
    let registry = ColormapRegistry::empty();
    let mut images = Vec::with_capacity(channels.len());
    let mut n_points = 0;
    let mut skipped_points = 0;
    let mut covariance_fallbacks = 0;

    for (index, channel) in channels.iter().enumerate() {
        let request = RenderRequest::new(
            target.clone(),
            strategy.clone(),
            ColorMapping::manual(channel.color),
        )
        .with_brightness_clip(brightness_clip);
        let output = render(channel.points, &request, &registry)?;
        debug!(
            channel = index,
            n_points = output.info.n_points,
            "Rendered overlay channel"
        );

        n_points += output.info.n_points;
        skipped_points += output.info.skipped_points;
        covariance_fallbacks += output.info.covariance_fallbacks;
        images.push(output.image);
    }

    let image = combine_channels(&images, normalize && !strategy.is_outline())?;
    let info = RenderInfo {
        elapsed: start.elapsed(),
        backend: BACKEND,
        n_points,
        skipped_points,
        covariance_fallbacks,
        output_size: (target.width(), target.height()),
        pixel_size: target.pixel_size(),
        strategy: strategy.tag(),
        color_mode: "overlay",
        field_range: None,
    };
    Ok(RenderOutput { image, info })
}

/// Sum same-sized channel images pixelwise and clamp to [0, 1].
///
/// With `normalize`, each image is first divided by its own maximum channel
/// value; all-black images are left as they are.
pub fn combine_channels(images: &[RgbImage], normalize: bool) -> RenderResult<RgbImage> {
    let Some(first) = images.first() else {
        return Err(RenderError::invalid_parameter(
            "channels",
            "overlay needs at least one channel",
        ));
    };
    let (width, height) = (first.width(), first.height());
    if let Some(bad) = images
        .iter()
        .find(|img| img.width() != width || img.height() != height)
    {
        return Err(RenderError::InvalidTarget(format!(
            "channel of size {}x{} does not match {}x{}",
            bad.width(),
            bad.height(),
            width,
            height
        )));
    }

    let mut combined = RgbImage::new(width, height);
    for image in images {
        let scale = if normalize {
            let max = image.max_channel_value();
            if max > 0.0 {
                1.0 / max
            } else {
                1.0
            }
        } else {
            1.0
        };
        for (out, px) in combined.pixels_mut().iter_mut().zip(image.pixels()) {
            *out += *px * scale;
        }
    }
    combined.clamp();
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: Rgb) -> RgbImage {
        RgbImage::from_pixels(2, 1, vec![color; 2]).unwrap()
    }

    #[test]
    fn test_red_plus_green_is_yellow() {
        let combined = combine_channels(
            &[solid(Rgb::new(1.0, 0.0, 0.0)), solid(Rgb::new(0.0, 1.0, 0.0))],
            false,
        )
        .unwrap();
        assert_eq!(combined.get(1, 1), Some(Rgb::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_sum_is_clamped() {
        let combined = combine_channels(&[solid(Rgb::gray(0.8)), solid(Rgb::gray(0.9))], false).unwrap();
        assert!(combined.pixels().iter().all(|p| p.max_channel() <= 1.0));
    }

    #[test]
    fn test_normalize_per_channel() {
        let dim = RgbImage::from_pixels(2, 1, vec![Rgb::new(0.25, 0.0, 0.0), Rgb::BLACK]).unwrap();
        let combined = combine_channels(&[dim], true).unwrap();
        assert_eq!(combined.get(1, 1), Some(Rgb::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let other = RgbImage::new(3, 3);
        assert!(combine_channels(&[solid(Rgb::WHITE), other], false).is_err());
        assert!(combine_channels(&[], false).is_err());
    }
}
