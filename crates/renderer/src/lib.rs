//! Raster rendering of single-molecule localization point clouds.
//!
//! Rendering strategies:
//! - Histogram binning
//! - Anisotropic Gaussian splatting
//! - Circle and ellipse precision outlines
//!
//! Color modes:
//! - Intensity colormap with sparse-aware percentile clipping
//! - Field coloring with intensity-weighted blending
//! - Categorical palettes
//! - Manual color and grayscale
//!
//! Multi-channel overlays are composited from manual-color renders.

mod accumulator;
pub mod color;
pub mod colormap;
pub mod config;
pub mod normalize;
pub mod overlay;
pub mod png;
pub mod raster;
pub mod render;
pub mod strategy;
pub mod target;

pub use color::{auto_field_range, ColorMapping, FieldRange};
pub use colormap::{ColorSource, ColorStop, Colormap, ColormapRegistry, Palette};
pub use config::{CategoricalSelection, FieldSelection, RenderConfig};
pub use overlay::{combine_channels, render_overlay, OverlayChannel};
pub use raster::RgbImage;
pub use render::{render, render_batch, RenderInfo, RenderOutput, RenderRequest};
pub use strategy::{GaussianParams, KernelNormalization, OutlineParams, Strategy, MAX_LINE_WIDTH};
pub use target::{PixelIndex, Target, DEFAULT_MARGIN};

pub use smlm_common::{
    Localization, PixelWindow, PointCloud, PointSource, ReferenceGrid, RenderError, RenderResult, Rgb,
};
