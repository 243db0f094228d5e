//! Render configuration surface.
//!
//! A configuration names exactly one resolution mode (fixed `zoom` over a
//! reference grid, or absolute `pixel_size`), a strategy, and exactly one
//! color mode. Example:
//!
//! ```json
//! {
//!   "pixel_size": 10.0,
//!   "strategy": { "type": "gaussian", "n_sigmas": 3.0 },
//!   "field": { "attribute": "z", "colormap": "turbo" },
//!   "clip_percentile": 0.99
//! }
//! ```

use crate::color::{ColorMapping, FieldRange, DEFAULT_CLIP_PERCENTILE};
use crate::render::RenderRequest;
use crate::strategy::Strategy;
use crate::target::{Target, DEFAULT_MARGIN};
use serde::{Deserialize, Serialize};
use smlm_common::{PixelWindow, PointSource, ReferenceGrid, RenderError, RenderResult, Rgb};
use std::path::Path;
use tracing::debug;

fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

fn default_clip_percentile() -> f64 {
    DEFAULT_CLIP_PERCENTILE
}

fn default_field_colormap() -> String {
    "viridis".to_string()
}

fn default_palette() -> String {
    "tab10".to_string()
}

/// User-facing render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Magnification over the reference grid (fixed-resolution mode)
    #[serde(default)]
    pub zoom: Option<f64>,

    /// Reference-grid window for fixed-resolution mode
    #[serde(default)]
    pub roi: Option<PixelWindow>,

    /// Absolute pixel size in nm (data-bounds mode)
    #[serde(default)]
    pub pixel_size: Option<f64>,

    /// Fractional margin around the data (data-bounds mode)
    #[serde(default = "default_margin")]
    pub margin: f64,

    #[serde(default)]
    pub strategy: Strategy,

    /// Intensity mode through this colormap
    #[serde(default)]
    pub colormap: Option<String>,

    #[serde(default)]
    pub field: Option<FieldSelection>,

    #[serde(default)]
    pub categorical: Option<CategoricalSelection>,

    /// Manual mode with this color
    #[serde(default)]
    pub color: Option<Rgb>,

    #[serde(default)]
    pub grayscale: bool,

    /// Brightness clip percentile in (0, 1]
    #[serde(default = "default_clip_percentile")]
    pub clip_percentile: f64,

    /// Disable brightness clipping for every mode but intensity
    #[serde(default)]
    pub disable_clipping: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub attribute: String,
    #[serde(default = "default_field_colormap")]
    pub colormap: String,
    #[serde(default)]
    pub range: FieldRange,
    #[serde(default)]
    pub clip_percentiles: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSelection {
    pub attribute: String,
    #[serde(default = "default_palette")]
    pub palette: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            zoom: None,
            roi: None,
            pixel_size: None,
            margin: DEFAULT_MARGIN,
            strategy: Strategy::Histogram,
            colormap: None,
            field: None,
            categorical: None,
            color: None,
            grayscale: false,
            clip_percentile: DEFAULT_CLIP_PERCENTILE,
            disable_clipping: false,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check selections and parameters without touching any point data.
    pub fn validate(&self) -> RenderResult<()> {
        self.resolution_mode()?;
        if self.roi.is_some() && self.zoom.is_none() {
            return Err(RenderError::invalid_parameter(
                "roi",
                "only valid together with zoom",
            ));
        }
        if !(self.margin >= 0.0) || !self.margin.is_finite() {
            return Err(RenderError::invalid_parameter(
                "margin",
                format!("must be >= 0, got {}", self.margin),
            ));
        }
        if !(self.clip_percentile > 0.0 && self.clip_percentile <= 1.0) {
            return Err(RenderError::invalid_parameter(
                "clip_percentile",
                format!("must be in (0, 1], got {}", self.clip_percentile),
            ));
        }
        self.strategy.validate()?;
        let color = self.color_mapping()?;
        color.validate()?;
        self.strategy.check_pairing(&color)
    }

    /// The single selected color mode.
    pub fn color_mapping(&self) -> RenderResult<ColorMapping> {
        let mut selected = Vec::new();
        if let Some(colormap) = &self.colormap {
            selected.push(ColorMapping::Intensity {
                colormap: colormap.clone(),
                clip_percentile: self.clip_percentile,
            });
        }
        if let Some(field) = &self.field {
            selected.push(ColorMapping::Field {
                attribute: field.attribute.clone(),
                colormap: field.colormap.clone(),
                range: field.range,
                clip_percentiles: field.clip_percentiles,
            });
        }
        if let Some(cat) = &self.categorical {
            selected.push(ColorMapping::categorical(&cat.attribute, &cat.palette));
        }
        if let Some(color) = self.color {
            selected.push(ColorMapping::manual(color));
        }
        if self.grayscale {
            selected.push(ColorMapping::Grayscale);
        }

        match selected.len() {
            0 => Err(RenderError::MissingSelection(
                "one of colormap, field, categorical, color or grayscale".to_string(),
            )),
            1 => Ok(selected.remove(0)),
            _ => {
                let names: Vec<&str> = selected.iter().map(ColorMapping::tag).collect();
                Err(RenderError::ConflictingSelection(format!(
                    "color modes {}",
                    names.join(", ")
                )))
            }
        }
    }

    /// Build the output target.
    ///
    /// Fixed-resolution mode needs `reference`; data-bounds mode reads the
    /// point extent.
    pub fn resolve_target<P>(&self, points: &P, reference: Option<&ReferenceGrid>) -> RenderResult<Target>
    where
        P: PointSource + ?Sized,
    {
        match self.resolution_mode()? {
            Resolution::Zoom(zoom) => {
                let grid = reference.ok_or_else(|| {
                    RenderError::MissingSelection(
                        "reference grid for fixed-resolution rendering".to_string(),
                    )
                })?;
                Target::from_reference_grid(grid, zoom, self.roi)
            }
            Resolution::PixelSize(pixel_size) => Target::from_points(points, pixel_size, self.margin),
        }
    }

    /// Validate and turn the configuration into a ready render request.
    pub fn resolve<P>(&self, points: &P, reference: Option<&ReferenceGrid>) -> RenderResult<RenderRequest>
    where
        P: PointSource + ?Sized,
    {
        self.validate()?;
        let color = self.color_mapping()?;
        let target = self.resolve_target(points, reference)?;
        let brightness_clip = if self.disable_clipping {
            None
        } else {
            Some(self.clip_percentile)
        };

        debug!(
            strategy = self.strategy.tag(),
            color = color.tag(),
            width = target.width(),
            height = target.height(),
            pixel_size_nm = target.pixel_size(),
            "Resolved render configuration"
        );

        Ok(RenderRequest::new(target, self.strategy.clone(), color).with_brightness_clip(brightness_clip))
    }

    fn resolution_mode(&self) -> RenderResult<Resolution> {
        match (self.zoom, self.pixel_size) {
            (Some(_), Some(_)) => Err(RenderError::ConflictingSelection(
                "zoom and pixel_size are mutually exclusive".to_string(),
            )),
            (None, None) => Err(RenderError::MissingSelection(
                "a resolution: zoom or pixel_size".to_string(),
            )),
            (Some(zoom), None) => {
                if !(zoom > 0.0) || !zoom.is_finite() {
                    return Err(RenderError::invalid_parameter(
                        "zoom",
                        format!("must be > 0, got {}", zoom),
                    ));
                }
                Ok(Resolution::Zoom(zoom))
            }
            (None, Some(pixel_size)) => {
                if !(pixel_size > 0.0) || !pixel_size.is_finite() {
                    return Err(RenderError::invalid_parameter(
                        "pixel_size",
                        format!("must be > 0 nm, got {}", pixel_size),
                    ));
                }
                Ok(Resolution::PixelSize(pixel_size))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Resolution {
    Zoom(f64),
    PixelSize(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_selection() {
        let config = RenderConfig::default();
        assert!(matches!(
            config.validate(),
            Err(RenderError::MissingSelection(_))
        ));
    }

    #[test]
    fn test_two_color_modes_conflict() {
        let config = RenderConfig {
            pixel_size: Some(10.0),
            colormap: Some("hot".into()),
            grayscale: true,
            ..Default::default()
        };
        let err = config.color_mapping().unwrap_err();
        assert!(matches!(err, RenderError::ConflictingSelection(ref msg) if msg.contains("intensity")));
    }

    #[test]
    fn test_two_resolutions_conflict() {
        let config = RenderConfig {
            zoom: Some(4.0),
            pixel_size: Some(10.0),
            grayscale: true,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RenderError::ConflictingSelection(_))
        ));
    }

    #[test]
    fn test_json_defaults() {
        let config = RenderConfig::from_json(r#"{"pixel_size": 20.0, "colormap": "hot"}"#).unwrap();
        assert_eq!(config.margin, DEFAULT_MARGIN);
        assert_eq!(config.clip_percentile, DEFAULT_CLIP_PERCENTILE);
        assert_eq!(config.strategy, Strategy::Histogram);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_pair_rejected() {
        let config = RenderConfig::from_json(
            r#"{"pixel_size": 20.0, "grayscale": true, "strategy": {"type": "ellipse"}}"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(RenderError::UnsupportedCombination { .. })
        ));
    }
}
