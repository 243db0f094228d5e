//! Colormaps, categorical palettes and the registry that names them.
//!
//! A colormap is a pure [0, 1] → RGB function; a palette is an ordered RGB
//! list. Renderers never hold lookup tables themselves: they ask a
//! [`ColorSource`] by identifier, and an unknown identifier is a hard error.
//!
//! Registries can be extended from JSON:
//!
//! ```json
//! {
//!   "colormaps": {
//!     "ice": { "stops": [ { "value": 0.0, "color": "#000000" },
//!                         { "value": 1.0, "color": "#A0E0FF" } ] }
//!   },
//!   "palettes": { "pair": ["#FF00FF", "#00FF00"] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use smlm_common::{Rgb, RenderError, RenderResult};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Lookup of colormaps and palettes by identifier.
pub trait ColorSource {
    fn colormap(&self, id: &str) -> RenderResult<Colormap>;

    fn palette(&self, id: &str) -> RenderResult<Palette>;
}

/// A gradient stop: position in [0, 1] and its color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub color: Rgb,
}

#[derive(Clone)]
enum ColormapKind {
    Stops(Vec<ColorStop>),
    Function(Arc<dyn Fn(f64) -> Rgb + Send + Sync>),
}

/// Continuous [0, 1] → RGB lookup.
#[derive(Clone)]
pub struct Colormap {
    name: String,
    kind: ColormapKind,
}

impl fmt::Debug for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ColormapKind::Stops(stops) => format!("{} stops", stops.len()),
            ColormapKind::Function(_) => "function".to_string(),
        };
        f.debug_struct("Colormap")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl Colormap {
    /// Piecewise-linear colormap through explicit stops.
    ///
    /// Needs at least two stops in strictly ascending order spanning
    /// exactly [0, 1].
    pub fn from_stops(name: impl Into<String>, stops: Vec<ColorStop>) -> RenderResult<Self> {
        let name = name.into();
        if stops.len() < 2 {
            return Err(RenderError::invalid_parameter(
                format!("colormap '{}'", name),
                "must have at least 2 color stops",
            ));
        }
        if stops.windows(2).any(|w| !(w[1].value > w[0].value)) {
            return Err(RenderError::invalid_parameter(
                format!("colormap '{}'", name),
                "color stops must be in ascending value order",
            ));
        }
        let first = stops[0].value;
        let last = stops[stops.len() - 1].value;
        if first != 0.0 || last != 1.0 {
            return Err(RenderError::invalid_parameter(
                format!("colormap '{}'", name),
                format!("stops must span [0, 1], got [{}, {}]", first, last),
            ));
        }
        Ok(Self {
            name,
            kind: ColormapKind::Stops(stops),
        })
    }

    /// Colormap through evenly spaced colors.
    pub fn uniform(name: impl Into<String>, colors: &[Rgb]) -> RenderResult<Self> {
        let last = colors.len().saturating_sub(1).max(1) as f64;
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, &color)| ColorStop {
                value: i as f64 / last,
                color,
            })
            .collect();
        Self::from_stops(name, stops)
    }

    /// Wrap an arbitrary pure function.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64) -> Rgb + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: ColormapKind::Function(Arc::new(f)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color at `t`, clamped to [0, 1]. NaN samples the low end.
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match &self.kind {
            ColormapKind::Function(f) => f(t),
            ColormapKind::Stops(stops) => {
                for pair in stops.windows(2) {
                    let (low, high) = (&pair[0], &pair[1]);
                    if t <= high.value {
                        let frac = (t - low.value) / (high.value - low.value);
                        return low.color.lerp(&high.color, frac);
                    }
                }
                stops[stops.len() - 1].color
            }
        }
    }
}

/// Ordered list of categorical colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(name: impl Into<String>, colors: Vec<Rgb>) -> RenderResult<Self> {
        let name = name.into();
        if colors.is_empty() {
            return Err(RenderError::invalid_parameter(
                format!("palette '{}'", name),
                "must contain at least one color",
            ));
        }
        Ok(Self { name, colors })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Color for a category value.
    ///
    /// The value is rounded to an integer and mapped 1-based with
    /// wraparound: category 1 is the first color, category `len + 1` is the
    /// first color again, category 0 is the last. Non-finite values take
    /// the first color.
    pub fn color_for(&self, value: f64) -> Rgb {
        let len = self.colors.len();
        let category = value.round();
        if !category.is_finite() {
            return self.colors[0];
        }
        // Whole f64 values reduce exactly, at any magnitude.
        let index = (category - 1.0).rem_euclid(len as f64) as usize;
        self.colors[index.min(len - 1)]
    }
}

/// Named colormaps and palettes.
#[derive(Debug, Clone)]
pub struct ColormapRegistry {
    colormaps: HashMap<String, Colormap>,
    palettes: HashMap<String, Palette>,
}

impl Default for ColormapRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ColormapRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            colormaps: HashMap::new(),
            palettes: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in colormaps and palettes.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, hexes) in BUILTIN_COLORMAPS {
            let colors: Vec<Rgb> = hexes.iter().filter_map(|h| Rgb::from_hex(h)).collect();
            if let Ok(cmap) = Colormap::uniform(*name, &colors) {
                registry.insert_colormap(cmap);
            }
        }
        for (name, hexes) in BUILTIN_PALETTES {
            let colors: Vec<Rgb> = hexes.iter().filter_map(|h| Rgb::from_hex(h)).collect();
            if let Ok(palette) = Palette::new(*name, colors) {
                registry.insert_palette(palette);
            }
        }
        registry
    }

    /// Built-ins extended (and overridden) by definitions in a JSON string.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        let defs: RegistryDefinition = serde_json::from_str(json)?;
        let mut registry = Self::builtin();
        registry.extend_from(defs)?;
        Ok(registry)
    }

    /// Built-ins extended by definitions in a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn insert_colormap(&mut self, colormap: Colormap) {
        self.colormaps.insert(colormap.name().to_string(), colormap);
    }

    pub fn insert_palette(&mut self, palette: Palette) {
        self.palettes.insert(palette.name().to_string(), palette);
    }

    /// Sorted colormap identifiers.
    pub fn colormap_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.colormaps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sorted palette identifiers.
    pub fn palette_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.palettes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn extend_from(&mut self, defs: RegistryDefinition) -> RenderResult<()> {
        for (name, def) in defs.colormaps {
            let stops = def
                .stops
                .iter()
                .map(|s| {
                    parse_color(&name, &s.color).map(|color| ColorStop {
                        value: s.value,
                        color,
                    })
                })
                .collect::<RenderResult<Vec<_>>>()?;
            self.insert_colormap(Colormap::from_stops(name, stops)?);
        }
        for (name, hexes) in defs.palettes {
            let colors = hexes
                .iter()
                .map(|h| parse_color(&name, h))
                .collect::<RenderResult<Vec<_>>>()?;
            self.insert_palette(Palette::new(name, colors)?);
        }
        Ok(())
    }
}

impl ColorSource for ColormapRegistry {
    fn colormap(&self, id: &str) -> RenderResult<Colormap> {
        self.colormaps
            .get(id)
            .cloned()
            .ok_or_else(|| RenderError::UnknownColormap(id.to_string()))
    }

    fn palette(&self, id: &str) -> RenderResult<Palette> {
        self.palettes
            .get(id)
            .cloned()
            .ok_or_else(|| RenderError::UnknownPalette(id.to_string()))
    }
}

fn parse_color(owner: &str, hex: &str) -> RenderResult<Rgb> {
    Rgb::from_hex(hex).ok_or_else(|| {
        RenderError::ConfigError(format!("'{}': invalid hex color '{}'", owner, hex))
    })
}

/// JSON layout accepted by [`ColormapRegistry::from_json`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct RegistryDefinition {
    #[serde(default)]
    colormaps: HashMap<String, ColormapDefinition>,
    #[serde(default)]
    palettes: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ColormapDefinition {
    stops: Vec<StopDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct StopDefinition {
    value: f64,
    color: String,
}

/// Evenly spaced samples of common perceptual colormaps.
const BUILTIN_COLORMAPS: &[(&str, &[&str])] = &[
    ("gray", &["#000000", "#FFFFFF"]),
    ("hot", &["#000000", "#800000", "#FF0000", "#FF8000", "#FFFF00", "#FFFFFF"]),
    (
        "inferno",
        &[
            "#000004", "#1B0C41", "#4A0C6B", "#781C6D", "#A52C60", "#CF4446", "#ED6925", "#FB9B06",
            "#F7D13D", "#FCFFA4",
        ],
    ),
    (
        "magma",
        &[
            "#000004", "#180F3D", "#440F76", "#721F81", "#9E2F7F", "#CD4071", "#F1605D", "#FD9668",
            "#FECA8D", "#FCFDBF",
        ],
    ),
    (
        "viridis",
        &[
            "#440154", "#482878", "#3E4989", "#31688E", "#26828E", "#1F9E89", "#35B779", "#6ECE58",
            "#B5DE2B", "#FDE725",
        ],
    ),
    (
        "turbo",
        &[
            "#30123B", "#4145AB", "#4675ED", "#39A2FC", "#1BCFD4", "#24ECA6", "#61FC6C", "#A4FC3B",
            "#D1E834", "#F3C63A", "#FE9B2D", "#F36315", "#D93806", "#B11901", "#7A0402",
        ],
    ),
];

const BUILTIN_PALETTES: &[(&str, &[&str])] = &[
    (
        "tab10",
        &[
            "#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2", "#7F7F7F",
            "#BCBD22", "#17BECF",
        ],
    ),
    (
        "set1",
        &[
            "#E41A1C", "#377EB8", "#4DAF4A", "#984EA3", "#FF7F00", "#FFFF33", "#A65628", "#F781BF",
            "#999999",
        ],
    ),
];
