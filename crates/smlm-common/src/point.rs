//! Point (localization) data model.
//!
//! Rendering only ever reads points. Sources hand out whole columns so a
//! renderer resolves each accessor once per call, outside its hot loop.

use crate::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only access to a set of localizations, column by column.
///
/// Positions are in micrometers. `sigma_x`/`sigma_y` are per-axis
/// localization precisions (μm) and `sigma_xy` the x/y covariance (μm²).
pub trait PointSource {
    /// Number of localizations.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn x(&self) -> &[f64];

    fn y(&self) -> &[f64];

    fn sigma_x(&self) -> Option<&[f64]>;

    fn sigma_y(&self) -> Option<&[f64]>;

    fn sigma_xy(&self) -> Option<&[f64]>;

    /// Per-point brightness (photon count).
    fn photons(&self) -> Option<&[f64]>;

    /// Look up an open-ended named scalar column.
    fn attribute(&self, name: &str) -> Option<&[f64]>;

    /// Resolve a column by name, including the built-in columns
    /// (`x`, `y`, `sigma_x`, `sigma_y`, `sigma_xy`, `photons`).
    ///
    /// Fails with [`RenderError::MissingAttribute`] when absent.
    fn column(&self, name: &str) -> RenderResult<&[f64]> {
        let builtin = match name {
            "x" => Some(self.x()),
            "y" => Some(self.y()),
            "sigma_x" => self.sigma_x(),
            "sigma_y" => self.sigma_y(),
            "sigma_xy" => self.sigma_xy(),
            "photons" | "brightness" => self.photons(),
            _ => None,
        };
        builtin
            .or_else(|| self.attribute(name))
            .ok_or_else(|| RenderError::MissingAttribute(name.to_string()))
    }

    /// Like [`PointSource::column`], but also fails with
    /// [`RenderError::InvalidParameter`] unless the column has one value
    /// per point.
    fn checked_column(&self, name: &str) -> RenderResult<&[f64]> {
        let values = self.column(name)?;
        check_column_len(name, values, self.len())?;
        Ok(values)
    }

    /// Check that every built-in column holds exactly `len()` values.
    fn check_columns(&self) -> RenderResult<()> {
        let len = self.len();
        check_column_len("x", self.x(), len)?;
        check_column_len("y", self.y(), len)?;
        let optional = [
            ("sigma_x", self.sigma_x()),
            ("sigma_y", self.sigma_y()),
            ("sigma_xy", self.sigma_xy()),
            ("photons", self.photons()),
        ];
        for (name, values) in optional {
            if let Some(values) = values {
                check_column_len(name, values, len)?;
            }
        }
        Ok(())
    }
}

/// Fail with [`RenderError::InvalidParameter`] unless `values` holds `len`
/// entries.
pub fn check_column_len(name: &str, values: &[f64], len: usize) -> RenderResult<()> {
    if values.len() != len {
        return Err(RenderError::invalid_parameter(
            name,
            format!("expected {} values, got {}", len, values.len()),
        ));
    }
    Ok(())
}

/// A single localization, row oriented. Used to build a [`PointCloud`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub sigma_x: Option<f64>,
    #[serde(default)]
    pub sigma_y: Option<f64>,
    #[serde(default)]
    pub sigma_xy: Option<f64>,
    #[serde(default)]
    pub photons: Option<f64>,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl Localization {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn with_precision(mut self, sigma_x: f64, sigma_y: f64) -> Self {
        self.sigma_x = Some(sigma_x);
        self.sigma_y = Some(sigma_y);
        self
    }

    pub fn with_covariance(mut self, sigma_xy: f64) -> Self {
        self.sigma_xy = Some(sigma_xy);
        self
    }

    pub fn with_photons(mut self, photons: f64) -> Self {
        self.photons = Some(photons);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Column-oriented point storage implementing [`PointSource`].
///
/// Deserialization applies the same length checks as the builders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "PointColumns")]
pub struct PointCloud {
    x: Vec<f64>,
    y: Vec<f64>,
    sigma_x: Option<Vec<f64>>,
    sigma_y: Option<Vec<f64>>,
    sigma_xy: Option<Vec<f64>>,
    photons: Option<Vec<f64>>,
    attributes: BTreeMap<String, Vec<f64>>,
}

impl PointCloud {
    /// Create a cloud from position columns.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> RenderResult<Self> {
        if x.len() != y.len() {
            return Err(RenderError::invalid_parameter(
                "y",
                format!("expected {} values, got {}", x.len(), y.len()),
            ));
        }
        Ok(Self {
            x,
            y,
            ..Default::default()
        })
    }

    /// Attach per-axis precisions (μm).
    pub fn with_precision(mut self, sigma_x: Vec<f64>, sigma_y: Vec<f64>) -> RenderResult<Self> {
        self.check_len("sigma_x", &sigma_x)?;
        self.check_len("sigma_y", &sigma_y)?;
        self.sigma_x = Some(sigma_x);
        self.sigma_y = Some(sigma_y);
        Ok(self)
    }

    /// Attach x/y covariances (μm²).
    pub fn with_covariance(mut self, sigma_xy: Vec<f64>) -> RenderResult<Self> {
        self.check_len("sigma_xy", &sigma_xy)?;
        self.sigma_xy = Some(sigma_xy);
        Ok(self)
    }

    pub fn with_photons(mut self, photons: Vec<f64>) -> RenderResult<Self> {
        self.check_len("photons", &photons)?;
        self.photons = Some(photons);
        Ok(self)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<f64>) -> RenderResult<Self> {
        let name = name.into();
        self.check_len(&name, &values)?;
        self.attributes.insert(name, values);
        Ok(self)
    }

    /// Build columns from row-oriented localizations.
    ///
    /// An optional column (precision, covariance, photons, any named
    /// attribute) must be present on every localization or on none.
    pub fn from_localizations(locs: &[Localization]) -> RenderResult<Self> {
        let x = locs.iter().map(|l| l.x).collect();
        let y = locs.iter().map(|l| l.y).collect();
        let mut cloud = Self::new(x, y)?;

        cloud.sigma_x = collect_optional(locs, "sigma_x", |l| l.sigma_x)?;
        cloud.sigma_y = collect_optional(locs, "sigma_y", |l| l.sigma_y)?;
        cloud.sigma_xy = collect_optional(locs, "sigma_xy", |l| l.sigma_xy)?;
        cloud.photons = collect_optional(locs, "photons", |l| l.photons)?;

        let mut names: Vec<&String> = locs.iter().flat_map(|l| l.attributes.keys()).collect();
        names.sort();
        names.dedup();
        for name in names {
            if let Some(values) = collect_optional(locs, name, |l| l.attributes.get(name).copied())? {
                cloud.attributes.insert(name.clone(), values);
            }
        }

        Ok(cloud)
    }

    /// Names of the open-ended attribute columns.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    fn check_len(&self, name: &str, values: &[f64]) -> RenderResult<()> {
        check_column_len(name, values, self.x.len())
    }
}

/// Unchecked wire form of a [`PointCloud`].
#[derive(Deserialize)]
struct PointColumns {
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default)]
    sigma_x: Option<Vec<f64>>,
    #[serde(default)]
    sigma_y: Option<Vec<f64>>,
    #[serde(default)]
    sigma_xy: Option<Vec<f64>>,
    #[serde(default)]
    photons: Option<Vec<f64>>,
    #[serde(default)]
    attributes: BTreeMap<String, Vec<f64>>,
}

impl TryFrom<PointColumns> for PointCloud {
    type Error = RenderError;

    fn try_from(columns: PointColumns) -> RenderResult<Self> {
        let cloud = PointCloud {
            x: columns.x,
            y: columns.y,
            sigma_x: columns.sigma_x,
            sigma_y: columns.sigma_y,
            sigma_xy: columns.sigma_xy,
            photons: columns.photons,
            attributes: columns.attributes,
        };
        cloud.check_columns()?;
        for (name, values) in &cloud.attributes {
            cloud.check_len(name, values)?;
        }
        Ok(cloud)
    }
}

fn collect_optional<F>(locs: &[Localization], name: &str, get: F) -> RenderResult<Option<Vec<f64>>>
where
    F: Fn(&Localization) -> Option<f64>,
{
    let values: Vec<Option<f64>> = locs.iter().map(get).collect();
    let present = values.iter().filter(|v| v.is_some()).count();
    if present == 0 {
        return Ok(None);
    }
    if present != values.len() {
        return Err(RenderError::invalid_parameter(
            name,
            format!("present on {} of {} localizations", present, values.len()),
        ));
    }
    Ok(Some(values.into_iter().flatten().collect()))
}

impl PointSource for PointCloud {
    fn len(&self) -> usize {
        self.x.len()
    }

    fn x(&self) -> &[f64] {
        &self.x
    }

    fn y(&self) -> &[f64] {
        &self.y
    }

    fn sigma_x(&self) -> Option<&[f64]> {
        self.sigma_x.as_deref()
    }

    fn sigma_y(&self) -> Option<&[f64]> {
        self.sigma_y.as_deref()
    }

    fn sigma_xy(&self) -> Option<&[f64]> {
        self.sigma_xy.as_deref()
    }

    fn photons(&self) -> Option<&[f64]> {
        self.photons.as_deref()
    }

    fn attribute(&self, name: &str) -> Option<&[f64]> {
        self.attributes.get(name).map(Vec::as_slice)
    }
}
