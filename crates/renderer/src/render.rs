//! Render orchestration: validate, resolve lookups, dispatch, time.

use crate::accumulator::{BlendBuffer, FieldSumBuffer, GrayBuffer};
use crate::color::{ColorMapping, ResolvedColor, DEFAULT_CLIP_PERCENTILE};
use crate::colormap::ColorSource;
use crate::raster::RgbImage;
use crate::strategy::{circle, ellipse, gaussian, histogram, Strategy, Tally};
use crate::target::Target;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smlm_common::{PointSource, RenderError, RenderResult, Rgb};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Backend tag reported in [`RenderInfo`].
pub const BACKEND: &str = "cpu";

/// Everything a render needs besides the points and the color lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub target: Target,
    #[serde(default)]
    pub strategy: Strategy,
    pub color: ColorMapping,
    /// Percentile at which per-pixel brightness is clipped for every mode
    /// but `Intensity`, which carries its own. `None` disables clipping.
    #[serde(default = "default_brightness_clip")]
    pub brightness_clip: Option<f64>,
}

fn default_brightness_clip() -> Option<f64> {
    Some(DEFAULT_CLIP_PERCENTILE)
}

impl RenderRequest {
    pub fn new(target: Target, strategy: Strategy, color: ColorMapping) -> Self {
        Self {
            target,
            strategy,
            color,
            brightness_clip: default_brightness_clip(),
        }
    }

    pub fn with_brightness_clip(mut self, clip: Option<f64>) -> Self {
        self.brightness_clip = clip;
        self
    }

    /// Check parameters and the strategy × color pairing.
    pub fn validate(&self) -> RenderResult<()> {
        self.strategy.validate()?;
        self.color.validate()?;
        self.strategy.check_pairing(&self.color)?;
        if let Some(clip) = self.brightness_clip {
            if !(clip > 0.0 && clip <= 1.0) {
                return Err(RenderError::invalid_parameter(
                    "brightness_clip",
                    format!("must be in (0, 1], got {}", clip),
                ));
            }
        }
        Ok(())
    }
}

/// Metadata describing a finished render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderInfo {
    pub elapsed: Duration,
    pub backend: &'static str,
    /// Points handed to the renderer
    pub n_points: usize,
    /// Points dropped for a degenerate sigma or radius
    pub skipped_points: usize,
    /// Points whose covariance was not positive definite
    pub covariance_fallbacks: usize,
    /// (width, height)
    pub output_size: (usize, usize),
    /// Pixel size (nm)
    pub pixel_size: f64,
    pub strategy: &'static str,
    pub color_mode: &'static str,
    /// Normalization range for field coloring, for building a legend
    pub field_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub image: RgbImage,
    pub info: RenderInfo,
}

/// Render `points` into an RGB raster.
///
/// All configuration and lookup errors are raised before any accumulator
/// is allocated. Per-point problems are counted in [`RenderInfo`].
pub fn render<P, C>(points: &P, request: &RenderRequest, colors: &C) -> RenderResult<RenderOutput>
where
    P: PointSource + ?Sized,
    C: ColorSource + ?Sized,
{
    let start = Instant::now();
    request.validate()?;
    request.strategy.check_inputs(points)?;
    let resolved = request.color.resolve(points, colors)?;

    let target = &request.target;
    let clip = request.brightness_clip;
    debug!(
        strategy = request.strategy.tag(),
        color = request.color.tag(),
        width = target.width(),
        height = target.height(),
        pixel_size_nm = target.pixel_size(),
        n_points = points.len(),
        "Rendering localizations"
    );

    let (pixels, tally) = match (&request.strategy, &resolved) {
        (Strategy::Histogram, ResolvedColor::Intensity { colormap, clip }) => {
            let mut acc = GrayBuffer::new(target.len());
            let tally = histogram::rasterize(target, points, &mut acc);
            (acc.into_colormapped(colormap, Some(*clip)), tally)
        }
        (Strategy::Histogram, ResolvedColor::Grayscale) => {
            let mut acc = GrayBuffer::new(target.len());
            let tally = histogram::rasterize(target, points, &mut acc);
            (acc.into_gray(clip), tally)
        }
        (
            Strategy::Histogram,
            ResolvedColor::Field {
                values,
                range,
                colormap,
            },
        ) => {
            let mut acc = FieldSumBuffer::new(target.len(), values);
            let tally = histogram::rasterize(target, points, &mut acc);
            (acc.into_pixels(colormap, *range, clip), tally)
        }
        (Strategy::Histogram, ResolvedColor::Categorical { .. } | ResolvedColor::Manual(_)) => {
            let point_colors = resolved.point_colors(points.len());
            let mut acc = BlendBuffer::new(target.len(), &point_colors);
            let tally = histogram::rasterize(target, points, &mut acc);
            (acc.into_pixels(clip), tally)
        }
        (Strategy::Gaussian(params), ResolvedColor::Intensity { colormap, clip }) => {
            let mut acc = GrayBuffer::new(target.len());
            let tally = gaussian::rasterize(params, target, points, &mut acc)?;
            (acc.into_colormapped(colormap, Some(*clip)), tally)
        }
        (Strategy::Gaussian(params), ResolvedColor::Grayscale) => {
            let mut acc = GrayBuffer::new(target.len());
            let tally = gaussian::rasterize(params, target, points, &mut acc)?;
            (acc.into_gray(clip), tally)
        }
        (
            Strategy::Gaussian(params),
            ResolvedColor::Field { .. } | ResolvedColor::Categorical { .. } | ResolvedColor::Manual(_),
        ) => {
            let point_colors = resolved.point_colors(points.len());
            let mut acc = BlendBuffer::new(target.len(), &point_colors);
            let tally = gaussian::rasterize(params, target, points, &mut acc)?;
            (acc.into_pixels(clip), tally)
        }
        (
            Strategy::Circle(params),
            ResolvedColor::Field { .. } | ResolvedColor::Categorical { .. } | ResolvedColor::Manual(_),
        ) => {
            let point_colors = resolved.point_colors(points.len());
            let mut buf = vec![Rgb::BLACK; target.len()];
            let tally = circle::rasterize(params, target, points, &point_colors, &mut buf)?;
            (clamped(buf), tally)
        }
        (
            Strategy::Ellipse(params),
            ResolvedColor::Field { .. } | ResolvedColor::Categorical { .. } | ResolvedColor::Manual(_),
        ) => {
            let point_colors = resolved.point_colors(points.len());
            let mut buf = vec![Rgb::BLACK; target.len()];
            let tally = ellipse::rasterize(params, target, points, &point_colors, &mut buf)?;
            (clamped(buf), tally)
        }
        (
            Strategy::Circle(_) | Strategy::Ellipse(_),
            ResolvedColor::Intensity { .. } | ResolvedColor::Grayscale,
        ) => {
            return Err(RenderError::unsupported(
                request.strategy.tag(),
                request.color.tag(),
            ));
        }
    };

    let image = RgbImage::from_pixels(target.width(), target.height(), pixels)?;
    let info = finish_info(start, points.len(), tally, request, resolved.field_range());
    Ok(RenderOutput { image, info })
}

/// Render independent requests in parallel, one private set of buffers per
/// job. Results keep the order of `jobs`.
pub fn render_batch<P, C>(jobs: &[(&P, RenderRequest)], colors: &C) -> Vec<RenderResult<RenderOutput>>
where
    P: PointSource + Sync + ?Sized,
    C: ColorSource + Sync + ?Sized,
{
    jobs.par_iter()
        .map(|(points, request)| render(*points, request, colors))
        .collect()
}

fn clamped(mut buf: Vec<Rgb>) -> Vec<Rgb> {
    for px in &mut buf {
        *px = px.clamped();
    }
    buf
}

fn finish_info(
    start: Instant,
    n_points: usize,
    tally: Tally,
    request: &RenderRequest,
    field_range: Option<(f64, f64)>,
) -> RenderInfo {
    let elapsed = start.elapsed();
    let target = &request.target;

    if tally.covariance_fallbacks > 0 {
        warn!(
            count = tally.covariance_fallbacks,
            "Non-positive-definite covariance, drew axis-aligned kernels"
        );
    }
    debug!(
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        skipped = tally.skipped,
        covariance_fallbacks = tally.covariance_fallbacks,
        "Render complete"
    );

    RenderInfo {
        elapsed,
        backend: BACKEND,
        n_points,
        skipped_points: tally.skipped,
        covariance_fallbacks: tally.covariance_fallbacks,
        output_size: (target.width(), target.height()),
        pixel_size: target.pixel_size(),
        strategy: request.strategy.tag(),
        color_mode: request.color.tag(),
        field_range,
    }
}
