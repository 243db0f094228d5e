//! Point-to-raster strategies.
//!
//! - Histogram: one count per point at its nearest pixel
//! - Gaussian: anisotropic normal kernel per point
//! - Circle / Ellipse: antialiased outlines sized by localization precision

pub(crate) mod circle;
pub(crate) mod ellipse;
pub(crate) mod gaussian;
pub(crate) mod histogram;

use crate::color::ColorMapping;
use crate::normalize::splat_antialiased;
use crate::target::Target;
use serde::{Deserialize, Serialize};
use smlm_common::{PointSource, RenderError, RenderResult, Rgb};
use std::f64::consts::PI;

/// Smallest number of samples along any outline.
pub const MIN_OUTLINE_SAMPLES: usize = 12;

/// How a point becomes pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Histogram,
    Gaussian(GaussianParams),
    Circle(OutlineParams),
    Ellipse(OutlineParams),
}

/// Amplitude convention of the Gaussian kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelNormalization {
    /// Unit integral: amplitude 1/(2π√det Σ).
    #[default]
    Integral,
    /// Unit peak.
    Maximum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianParams {
    /// Half-width of the evaluated box, in standard deviations
    pub n_sigmas: f64,
    /// Take sigma from per-point precision instead of `fixed_sigma`
    pub use_precision: bool,
    /// Fixed sigma (nm)
    pub fixed_sigma: Option<f64>,
    pub normalization: KernelNormalization,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self {
            n_sigmas: 3.0,
            use_precision: true,
            fixed_sigma: None,
            normalization: KernelNormalization::Integral,
        }
    }
}

impl GaussianParams {
    /// Every point drawn with the same `sigma` (nm).
    pub fn fixed(sigma: f64) -> Self {
        Self {
            use_precision: false,
            fixed_sigma: Some(sigma),
            ..Default::default()
        }
    }

    pub fn with_normalization(mut self, normalization: KernelNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn validate(&self) -> RenderResult<()> {
        if !(self.n_sigmas > 0.0) || !self.n_sigmas.is_finite() {
            return Err(RenderError::invalid_parameter(
                "n_sigmas",
                format!("must be > 0, got {}", self.n_sigmas),
            ));
        }
        check_optional_positive("fixed_sigma", self.fixed_sigma)?;
        if !self.use_precision && self.fixed_sigma.is_none() {
            return Err(RenderError::invalid_parameter(
                "fixed_sigma",
                "required when use_precision is false",
            ));
        }
        Ok(())
    }
}

/// Widest accepted outline, in pixels.
pub const MAX_LINE_WIDTH: f64 = 64.0;

/// Parameters shared by the circle and ellipse outlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineParams {
    /// Multiplier applied to precision-derived radii
    pub radius_factor: f64,
    /// Outline width in pixels. Widths above 1 draw concentric rings.
    pub line_width: f64,
    pub use_precision: bool,
    /// Fixed radius (nm)
    pub fixed_radius: Option<f64>,
}

impl Default for OutlineParams {
    fn default() -> Self {
        Self {
            radius_factor: 1.0,
            line_width: 1.0,
            use_precision: true,
            fixed_radius: None,
        }
    }
}

impl OutlineParams {
    /// Every outline drawn with the same `radius` (nm).
    pub fn fixed(radius: f64) -> Self {
        Self {
            use_precision: false,
            fixed_radius: Some(radius),
            ..Default::default()
        }
    }

    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn validate(&self) -> RenderResult<()> {
        if !(self.radius_factor > 0.0) || !self.radius_factor.is_finite() {
            return Err(RenderError::invalid_parameter(
                "radius_factor",
                format!("must be > 0, got {}", self.radius_factor),
            ));
        }
        if !(self.line_width > 0.0 && self.line_width <= MAX_LINE_WIDTH) {
            return Err(RenderError::invalid_parameter(
                "line_width",
                format!("must be in (0, {}], got {}", MAX_LINE_WIDTH, self.line_width),
            ));
        }
        check_optional_positive("fixed_radius", self.fixed_radius)?;
        if !self.use_precision && self.fixed_radius.is_none() {
            return Err(RenderError::invalid_parameter(
                "fixed_radius",
                "required when use_precision is false",
            ));
        }
        Ok(())
    }
}

fn check_optional_positive(param: &str, value: Option<f64>) -> RenderResult<()> {
    match value {
        Some(v) if !(v > 0.0) || !v.is_finite() => Err(RenderError::invalid_parameter(
            param,
            format!("must be > 0, got {}", v),
        )),
        _ => Ok(()),
    }
}

impl Strategy {
    pub fn gaussian(params: GaussianParams) -> RenderResult<Self> {
        params.validate()?;
        Ok(Strategy::Gaussian(params))
    }

    pub fn circle(params: OutlineParams) -> RenderResult<Self> {
        params.validate()?;
        Ok(Strategy::Circle(params))
    }

    pub fn ellipse(params: OutlineParams) -> RenderResult<Self> {
        params.validate()?;
        Ok(Strategy::Ellipse(params))
    }

    /// Short strategy name used in errors and render metadata.
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::Histogram => "histogram",
            Strategy::Gaussian(_) => "gaussian",
            Strategy::Circle(_) => "circle",
            Strategy::Ellipse(_) => "ellipse",
        }
    }

    /// Outline strategies draw RGB directly and have no scalar buffer.
    pub fn is_outline(&self) -> bool {
        matches!(self, Strategy::Circle(_) | Strategy::Ellipse(_))
    }

    pub fn validate(&self) -> RenderResult<()> {
        match self {
            Strategy::Histogram => Ok(()),
            Strategy::Gaussian(params) => params.validate(),
            Strategy::Circle(params) | Strategy::Ellipse(params) => params.validate(),
        }
    }

    /// Reject strategy × color pairs that have no rendering.
    pub fn check_pairing(&self, color: &ColorMapping) -> RenderResult<()> {
        if self.is_outline() && color.is_scalar() {
            return Err(RenderError::unsupported(self.tag(), color.tag()));
        }
        Ok(())
    }

    /// Fail early on short columns, or when per-point precision is
    /// requested but absent.
    pub fn check_inputs<P: PointSource + ?Sized>(&self, points: &P) -> RenderResult<()> {
        points.check_columns()?;
        let use_precision = match self {
            Strategy::Histogram => false,
            Strategy::Gaussian(params) => params.use_precision,
            Strategy::Circle(params) | Strategy::Ellipse(params) => params.use_precision,
        };
        if use_precision {
            precision_columns(points)?;
        }
        Ok(())
    }
}

/// Per-point precision columns (σx, σy), both required.
pub(crate) fn precision_columns<P: PointSource + ?Sized>(points: &P) -> RenderResult<(&[f64], &[f64])> {
    let sigma_x = points
        .sigma_x()
        .ok_or(RenderError::MissingPrecision("sigma_x"))?;
    let sigma_y = points
        .sigma_y()
        .ok_or(RenderError::MissingPrecision("sigma_y"))?;
    Ok((sigma_x, sigma_y))
}

/// Per-point diagnostics collected by a rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub skipped: usize,
    pub covariance_fallbacks: usize,
}

/// Draw an (optionally rotated) elliptical outline centered at continuous
/// pixel coordinates `center`, radii in pixels.
///
/// A `line_width` above 1 draws `ceil(line_width)` rings spread evenly over
/// the width, one pixel apart for integer widths; each ring keeps full
/// thickness. Narrower lines scale the contribution down.
pub(crate) fn trace_outline(
    buf: &mut [Rgb],
    target: &Target,
    center: (f64, f64),
    radii: (f64, f64),
    theta: f64,
    color: Rgb,
    line_width: f64,
) {
    let thickness = line_width.min(1.0);
    let rings = (line_width.ceil() as usize).max(1);
    let (sin_t, cos_t) = theta.sin_cos();

    for ring in 0..rings {
        let offset = if rings == 1 {
            0.0
        } else {
            -(line_width - 1.0) / 2.0 + ring as f64 * (line_width - 1.0) / (rings - 1) as f64
        };
        let (rx, ry) = (radii.0 + offset, radii.1 + offset);
        if rx <= 0.0 || ry <= 0.0 {
            continue;
        }

        let samples = ((2.0 * PI * rx.max(ry)).ceil() as usize).max(MIN_OUTLINE_SAMPLES);
        for k in 0..samples {
            let t = 2.0 * PI * k as f64 / samples as f64;
            let (ex, ey) = (rx * t.cos(), ry * t.sin());
            let x = center.0 + ex * cos_t - ey * sin_t;
            let y = center.1 + ex * sin_t + ey * cos_t;
            splat_antialiased(buf, target, x, y, color, thickness);
        }
    }
}
