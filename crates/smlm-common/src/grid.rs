//! Reference pixel grids for fixed-resolution rendering.
//!
//! A reference grid is the camera grid the localizations were fitted on,
//! described by its pixel edge coordinates (μm) along each axis.

use crate::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};

/// Relative tolerance when comparing cell widths.
const CELL_TOLERANCE: f64 = 1e-6;

/// Pixel edge coordinates of a reference grid.
///
/// Cells must be square and evenly spaced: fixed-resolution targets derive
/// one pixel size from the grid and place pixel centers by it on both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridEdges")]
pub struct ReferenceGrid {
    /// `nx + 1` strictly increasing x edges (μm)
    x_edges: Vec<f64>,
    /// `ny + 1` strictly increasing y edges (μm)
    y_edges: Vec<f64>,
}

impl ReferenceGrid {
    /// Create a grid from explicit edge arrays.
    pub fn new(x_edges: Vec<f64>, y_edges: Vec<f64>) -> RenderResult<Self> {
        validate_edges("x", &x_edges)?;
        validate_edges("y", &y_edges)?;
        let cell = x_edges[1] - x_edges[0];
        validate_spacing("x", &x_edges, cell)?;
        validate_spacing("y", &y_edges, cell)?;
        Ok(Self { x_edges, y_edges })
    }

    /// Regular grid of `nx` × `ny` square pixels starting at `origin` (μm).
    pub fn uniform(nx: usize, ny: usize, pixel_size_nm: f64, origin: (f64, f64)) -> RenderResult<Self> {
        if !(pixel_size_nm > 0.0) {
            return Err(RenderError::InvalidGrid(format!(
                "pixel size must be > 0, got {}",
                pixel_size_nm
            )));
        }
        let step = pixel_size_nm / 1000.0;
        let x_edges = (0..=nx).map(|i| origin.0 + i as f64 * step).collect();
        let y_edges = (0..=ny).map(|j| origin.1 + j as f64 * step).collect();
        Self::new(x_edges, y_edges)
    }

    /// Number of pixels along x.
    pub fn nx(&self) -> usize {
        self.x_edges.len() - 1
    }

    /// Number of pixels along y.
    pub fn ny(&self) -> usize {
        self.y_edges.len() - 1
    }

    pub fn x_edges(&self) -> &[f64] {
        &self.x_edges
    }

    pub fn y_edges(&self) -> &[f64] {
        &self.y_edges
    }

    /// Pixel size in nanometers. Every cell shares it.
    pub fn pixel_size_nm(&self) -> f64 {
        (self.x_edges[1] - self.x_edges[0]) * 1000.0
    }

    /// The full grid as a window.
    pub fn full_window(&self) -> PixelWindow {
        PixelWindow {
            x: [0, self.nx()],
            y: [0, self.ny()],
        }
    }

    /// Physical (x_range, y_range) covered by a window, from cell edges.
    pub fn window_bounds(&self, window: &PixelWindow) -> RenderResult<((f64, f64), (f64, f64))> {
        window.validate_within(self.nx(), self.ny())?;
        Ok((
            (self.x_edges[window.x[0]], self.x_edges[window.x[1]]),
            (self.y_edges[window.y[0]], self.y_edges[window.y[1]]),
        ))
    }
}

fn validate_edges(axis: &str, edges: &[f64]) -> RenderResult<()> {
    if edges.len() < 2 {
        return Err(RenderError::InvalidGrid(format!(
            "{} axis needs at least 2 edges, got {}",
            axis,
            edges.len()
        )));
    }
    if edges.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(RenderError::InvalidGrid(format!(
            "{} edges must be strictly increasing",
            axis
        )));
    }
    Ok(())
}

fn validate_spacing(axis: &str, edges: &[f64], cell: f64) -> RenderResult<()> {
    if let Some(w) = edges
        .windows(2)
        .map(|w| w[1] - w[0])
        .find(|width| ((width - cell) / cell).abs() > CELL_TOLERANCE)
    {
        return Err(RenderError::InvalidGrid(format!(
            "{} cells must be {} μm wide like the first x cell, found {}",
            axis, cell, w
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct GridEdges {
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
}

impl TryFrom<GridEdges> for ReferenceGrid {
    type Error = RenderError;

    fn try_from(edges: GridEdges) -> RenderResult<Self> {
        ReferenceGrid::new(edges.x_edges, edges.y_edges)
    }
}

/// A sub-window of a reference grid in pixel indices.
///
/// Indices are zero-based and half-open: `x: [2, 10]` covers reference
/// columns 2 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    pub x: [usize; 2],
    pub y: [usize; 2],
}

impl PixelWindow {
    pub fn new(x: [usize; 2], y: [usize; 2]) -> Self {
        Self { x, y }
    }

    pub fn width(&self) -> usize {
        self.x[1].saturating_sub(self.x[0])
    }

    pub fn height(&self) -> usize {
        self.y[1].saturating_sub(self.y[0])
    }

    fn validate_within(&self, nx: usize, ny: usize) -> RenderResult<()> {
        if self.width() == 0 || self.height() == 0 {
            return Err(RenderError::InvalidGrid(format!(
                "window {:?} is empty",
                self
            )));
        }
        if self.x[1] > nx || self.y[1] > ny {
            return Err(RenderError::InvalidGrid(format!(
                "window {:?} exceeds grid of {}x{} pixels",
                self, nx, ny
            )));
        }
        Ok(())
    }
}
