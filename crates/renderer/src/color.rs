//! Color mapping modes.
//!
//! A mapping either shares one grayscale weight buffer across all points
//! (`Intensity`, `Grayscale`) or gives each point its own RGB color
//! (`Field`, `Categorical`, `Manual`) that is blended by kernel weight.

use crate::colormap::{ColorSource, Colormap, Palette};
use crate::normalize::{normalize_to_range, percentile};
use serde::{Deserialize, Serialize};
use smlm_common::{PointSource, RenderError, RenderResult, Rgb};

/// Default clip percentile for brightness normalization.
pub const DEFAULT_CLIP_PERCENTILE: f64 = 0.99;

/// Percentiles used for an automatic field range when none are given.
pub const DEFAULT_FIELD_PERCENTILES: (f64, f64) = (0.01, 0.99);

fn default_clip_percentile() -> f64 {
    DEFAULT_CLIP_PERCENTILE
}

/// How point contributions become colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColorMapping {
    /// Shared density buffer, clipped at a nonzero percentile, then mapped
    /// through a colormap.
    Intensity {
        colormap: String,
        #[serde(default = "default_clip_percentile")]
        clip_percentile: f64,
    },
    /// Per-point color from a named attribute through a colormap.
    Field {
        attribute: String,
        colormap: String,
        #[serde(default)]
        range: FieldRange,
        #[serde(default)]
        clip_percentiles: Option<(f64, f64)>,
    },
    /// Per-point palette color from an integer-valued attribute.
    Categorical { attribute: String, palette: String },
    /// One fixed color for every point.
    Manual { color: Rgb },
    /// Shared density buffer rendered as gray levels.
    Grayscale,
}

/// Value range used to normalize a field attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRange {
    /// Derived from percentiles of the attribute values.
    #[default]
    Auto,
    Explicit { min: f64, max: f64 },
}

impl ColorMapping {
    pub fn intensity(colormap: impl Into<String>, clip_percentile: f64) -> RenderResult<Self> {
        let mapping = ColorMapping::Intensity {
            colormap: colormap.into(),
            clip_percentile,
        };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Field coloring with an automatic range over the default percentiles.
    pub fn field(attribute: impl Into<String>, colormap: impl Into<String>) -> Self {
        ColorMapping::Field {
            attribute: attribute.into(),
            colormap: colormap.into(),
            range: FieldRange::Auto,
            clip_percentiles: None,
        }
    }

    pub fn categorical(attribute: impl Into<String>, palette: impl Into<String>) -> Self {
        ColorMapping::Categorical {
            attribute: attribute.into(),
            palette: palette.into(),
        }
    }

    pub fn manual(color: Rgb) -> Self {
        ColorMapping::Manual { color }
    }

    /// Short mode name used in errors and render metadata.
    pub fn tag(&self) -> &'static str {
        match self {
            ColorMapping::Intensity { .. } => "intensity",
            ColorMapping::Field { .. } => "field",
            ColorMapping::Categorical { .. } => "categorical",
            ColorMapping::Manual { .. } => "manual",
            ColorMapping::Grayscale => "grayscale",
        }
    }

    /// True for modes that accumulate a shared grayscale weight.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ColorMapping::Intensity { .. } | ColorMapping::Grayscale)
    }

    pub fn validate(&self) -> RenderResult<()> {
        match self {
            ColorMapping::Intensity { clip_percentile, .. } => {
                if !(*clip_percentile > 0.0 && *clip_percentile <= 1.0) {
                    return Err(RenderError::invalid_parameter(
                        "clip_percentile",
                        format!("must be in (0, 1], got {}", clip_percentile),
                    ));
                }
            }
            ColorMapping::Field {
                attribute,
                range,
                clip_percentiles,
                ..
            } => {
                check_attribute_name(attribute)?;
                if let FieldRange::Explicit { min, max } = range {
                    if !min.is_finite() || !max.is_finite() || min > max {
                        return Err(RenderError::invalid_parameter(
                            "range",
                            format!("expected finite min <= max, got ({}, {})", min, max),
                        ));
                    }
                }
                if let Some((lo, hi)) = clip_percentiles {
                    if !(0.0 <= *lo && lo <= hi && *hi <= 1.0) {
                        return Err(RenderError::invalid_parameter(
                            "clip_percentiles",
                            format!("expected 0 <= low <= high <= 1, got ({}, {})", lo, hi),
                        ));
                    }
                }
            }
            ColorMapping::Categorical { attribute, .. } => check_attribute_name(attribute)?,
            ColorMapping::Manual { color } => {
                if !color.is_finite() {
                    return Err(RenderError::invalid_parameter(
                        "color",
                        "channels must be finite",
                    ));
                }
            }
            ColorMapping::Grayscale => {}
        }
        Ok(())
    }

    /// Look up colormaps, palettes and attribute columns for one render.
    pub(crate) fn resolve<'p, P, C>(&self, points: &'p P, source: &C) -> RenderResult<ResolvedColor<'p>>
    where
        P: PointSource + ?Sized,
        C: ColorSource + ?Sized,
    {
        let resolved = match self {
            ColorMapping::Intensity {
                colormap,
                clip_percentile,
            } => ResolvedColor::Intensity {
                colormap: source.colormap(colormap)?,
                clip: *clip_percentile,
            },
            ColorMapping::Grayscale => ResolvedColor::Grayscale,
            ColorMapping::Field {
                attribute,
                colormap,
                range,
                clip_percentiles,
            } => {
                let colormap = source.colormap(colormap)?;
                let values = points.checked_column(attribute)?;
                let range = match range {
                    FieldRange::Explicit { min, max } => (*min, *max),
                    FieldRange::Auto => auto_field_range(values, *clip_percentiles),
                };
                ResolvedColor::Field {
                    values,
                    range,
                    colormap,
                }
            }
            ColorMapping::Categorical { attribute, palette } => ResolvedColor::Categorical {
                palette: source.palette(palette)?,
                values: points.checked_column(attribute)?,
            },
            ColorMapping::Manual { color } => ResolvedColor::Manual(*color),
        };
        Ok(resolved)
    }
}

fn check_attribute_name(attribute: &str) -> RenderResult<()> {
    if attribute.trim().is_empty() {
        return Err(RenderError::invalid_parameter(
            "attribute",
            "attribute name must not be empty",
        ));
    }
    Ok(())
}

/// Field range from percentiles of all values, `(0.01, 0.99)` by default.
///
/// No finite value at all yields `(0, 0)`, which normalizes to the mid value.
pub fn auto_field_range(values: &[f64], percentiles: Option<(f64, f64)>) -> (f64, f64) {
    let (lo, hi) = percentiles.unwrap_or(DEFAULT_FIELD_PERCENTILES);
    match (percentile(values, lo), percentile(values, hi)) {
        (Some(min), Some(max)) => (min, max),
        _ => (0.0, 0.0),
    }
}

/// A color mapping with its lookups done.
pub(crate) enum ResolvedColor<'p> {
    Intensity { colormap: Colormap, clip: f64 },
    Grayscale,
    Field {
        values: &'p [f64],
        range: (f64, f64),
        colormap: Colormap,
    },
    Categorical { values: &'p [f64], palette: Palette },
    Manual(Rgb),
}

impl ResolvedColor<'_> {
    /// The field range, when coloring by a field.
    pub fn field_range(&self) -> Option<(f64, f64)> {
        match self {
            ResolvedColor::Field { range, .. } => Some(*range),
            _ => None,
        }
    }

    /// Color of every point, for the per-point modes.
    pub fn point_colors(&self, n: usize) -> Vec<Rgb> {
        match self {
            ResolvedColor::Field {
                values,
                range,
                colormap,
            } => values
                .iter()
                .map(|&v| colormap.sample(normalize_to_range(v, range.0, range.1)))
                .collect(),
            ResolvedColor::Categorical { values, palette } => {
                values.iter().map(|&v| palette.color_for(v)).collect()
            }
            ResolvedColor::Manual(color) => vec![*color; n],
            ResolvedColor::Intensity { .. } | ResolvedColor::Grayscale => vec![Rgb::WHITE; n],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::ColormapRegistry;
    use smlm_common::PointCloud;

    #[test]
    fn test_auto_range_full_percentiles() {
        assert_eq!(auto_field_range(&[0.0, 10.0, 20.0], Some((0.0, 1.0))), (0.0, 20.0));
        assert_eq!(auto_field_range(&[], None), (0.0, 0.0));
    }

    #[test]
    fn test_intensity_clip_validated() {
        assert!(ColorMapping::intensity("hot", 0.0).is_err());
        assert!(ColorMapping::intensity("hot", 1.5).is_err());
        assert!(ColorMapping::intensity("hot", 1.0).is_ok());
    }

    #[test]
    fn test_field_validation() {
        let bad_range = ColorMapping::Field {
            attribute: "z".into(),
            colormap: "viridis".into(),
            range: FieldRange::Explicit { min: 2.0, max: 1.0 },
            clip_percentiles: None,
        };
        assert!(bad_range.validate().is_err());
        assert!(ColorMapping::field("", "viridis").validate().is_err());
    }

    #[test]
    fn test_resolve_missing_attribute() {
        let cloud = PointCloud::new(vec![0.0], vec![0.0]).unwrap();
        let registry = ColormapRegistry::builtin();
        let err = ColorMapping::field("z", "viridis")
            .resolve(&cloud, &registry)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::MissingAttribute(name) if name == "z"));
    }

    #[test]
    fn test_resolve_unknown_colormap_first() {
        let cloud = PointCloud::new(vec![0.0], vec![0.0]).unwrap();
        let registry = ColormapRegistry::builtin();
        let err = ColorMapping::field("z", "nope")
            .resolve(&cloud, &registry)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::UnknownColormap(_)));
    }

    #[test]
    fn test_serde_tags() {
        let json = r#"{"mode": "intensity", "colormap": "hot"}"#;
        let mapping: ColorMapping = serde_json::from_str(json).unwrap();
        assert_eq!(
            mapping,
            ColorMapping::Intensity {
                colormap: "hot".into(),
                clip_percentile: DEFAULT_CLIP_PERCENTILE,
            }
        );

        let gray: ColorMapping = serde_json::from_str(r#"{"mode": "grayscale"}"#).unwrap();
        assert_eq!(gray, ColorMapping::Grayscale);
    }
}
