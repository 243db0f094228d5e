//! Output raster geometry and physical ↔ pixel mapping.
//!
//! Pixel indices are 1-based. Pixel (1, 1) is the top-left cell and its
//! center sits half a pixel from the range minimum on each axis, so the
//! continuous pixel coordinate of a pixel center is an integer. Rows follow
//! y, columns follow x.

use serde::{Deserialize, Serialize};
use smlm_common::{PixelWindow, PointSource, ReferenceGrid, RenderError, RenderResult};

/// Default fractional margin added around data bounds.
pub const DEFAULT_MARGIN: f64 = 0.05;

/// A 1-based (row, column) pixel index. May lie outside the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelIndex {
    pub row: i64,
    pub col: i64,
}

/// Full description of an output raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    width: usize,
    height: usize,
    /// Pixel size in nanometers
    pixel_size: f64,
    /// Physical x coverage (μm)
    x_range: (f64, f64),
    /// Physical y coverage (μm)
    y_range: (f64, f64),
}

impl Target {
    /// Create a target from explicit geometry.
    pub fn new(
        width: usize,
        height: usize,
        pixel_size: f64,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTarget(format!(
                "size must be positive, got {}x{}",
                width, height
            )));
        }
        if !(pixel_size > 0.0) || !pixel_size.is_finite() {
            return Err(RenderError::InvalidTarget(format!(
                "pixel size must be > 0 nm, got {}",
                pixel_size
            )));
        }
        for (axis, (lo, hi)) in [("x", x_range), ("y", y_range)] {
            if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
                return Err(RenderError::InvalidTarget(format!(
                    "{} range must satisfy min < max, got ({}, {})",
                    axis, lo, hi
                )));
            }
        }

        Ok(Self {
            width,
            height,
            pixel_size,
            x_range,
            y_range,
        })
    }

    /// Fixed-resolution target: magnify a reference grid (or a window of it)
    /// by `zoom`.
    ///
    /// The extent comes from the reference cell edges, so it does not depend
    /// on where the points are.
    pub fn from_reference_grid(
        grid: &ReferenceGrid,
        zoom: f64,
        window: Option<PixelWindow>,
    ) -> RenderResult<Self> {
        if !(zoom > 0.0) || !zoom.is_finite() {
            return Err(RenderError::invalid_parameter(
                "zoom",
                format!("must be > 0, got {}", zoom),
            ));
        }

        let window = window.unwrap_or_else(|| grid.full_window());
        let (x_range, y_range) = grid.window_bounds(&window)?;
        let pixel_size = grid.pixel_size_nm() / zoom;
        let width = ((window.width() as f64 * zoom).round() as usize).max(1);
        let height = ((window.height() as f64 * zoom).round() as usize).max(1);

        Self::new(width, height, pixel_size, x_range, y_range)
    }

    /// Data-bounds target: the extent of all points widened by a fractional
    /// `margin` of the span on each side, sampled at `pixel_size` nm.
    ///
    /// An axis with zero span is padded by one pixel on each side instead.
    pub fn from_points<P>(points: &P, pixel_size: f64, margin: f64) -> RenderResult<Self>
    where
        P: PointSource + ?Sized,
    {
        if !(pixel_size > 0.0) || !pixel_size.is_finite() {
            return Err(RenderError::invalid_parameter(
                "pixel_size",
                format!("must be > 0 nm, got {}", pixel_size),
            ));
        }
        if !(margin >= 0.0) || !margin.is_finite() {
            return Err(RenderError::invalid_parameter(
                "margin",
                format!("must be >= 0, got {}", margin),
            ));
        }
        if points.is_empty() {
            return Err(RenderError::EmptyPointSet);
        }

        let pixel_um = pixel_size / 1000.0;
        let x_range = padded_extent(points.x(), margin, pixel_um)?;
        let y_range = padded_extent(points.y(), margin, pixel_um)?;

        let width = pixel_count(x_range.1 - x_range.0, pixel_um);
        let height = pixel_count(y_range.1 - y_range.0, pixel_um);

        Self::new(width, height, pixel_size, x_range, y_range)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel size in nanometers.
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn x_range(&self) -> (f64, f64) {
        self.x_range
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.y_range
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert a length in nanometers to pixels.
    #[inline]
    pub fn nm_to_pixels(&self, nm: f64) -> f64 {
        nm / self.pixel_size
    }

    /// Continuous pixel coordinates `(x_px, y_px)` of a physical position.
    ///
    /// Integer values are pixel centers: x_px = 1.0 is the center of column 1.
    #[inline]
    pub fn physical_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.x_range.0) * 1000.0 / self.pixel_size + 0.5,
            (y - self.y_range.0) * 1000.0 / self.pixel_size + 0.5,
        )
    }

    /// Nearest pixel to a physical position. May be out of bounds.
    #[inline]
    pub fn physical_to_pixel_index(&self, x: f64, y: f64) -> PixelIndex {
        let (px, py) = self.physical_to_pixel(x, y);
        PixelIndex {
            row: py.round() as i64,
            col: px.round() as i64,
        }
    }

    /// Physical position (μm) of a pixel center.
    pub fn pixel_to_physical(&self, index: PixelIndex) -> (f64, f64) {
        (
            self.x_range.0 + (index.col as f64 - 0.5) * self.pixel_size / 1000.0,
            self.y_range.0 + (index.row as f64 - 0.5) * self.pixel_size / 1000.0,
        )
    }

    #[inline]
    pub fn in_bounds(&self, index: PixelIndex) -> bool {
        index.row >= 1
            && index.row <= self.height as i64
            && index.col >= 1
            && index.col <= self.width as i64
    }

    /// Row-major buffer offset of an in-bounds pixel.
    #[inline]
    pub(crate) fn offset(&self, index: PixelIndex) -> Option<usize> {
        if self.in_bounds(index) {
            Some((index.row as usize - 1) * self.width + (index.col as usize - 1))
        } else {
            None
        }
    }

    /// Inclusive 1-based index span `[center - radius, center + radius]`
    /// clipped to `1..=limit`. `None` when nothing remains.
    #[inline]
    pub(crate) fn clip_span(center: f64, radius: f64, limit: usize) -> Option<(i64, i64)> {
        let lo = ((center - radius).floor() as i64).max(1);
        let hi = ((center + radius).ceil() as i64).min(limit as i64);
        (lo <= hi).then_some((lo, hi))
    }
}

/// `ceil(span / pixel)`, ignoring float noise just above an integer.
fn pixel_count(span: f64, pixel: f64) -> usize {
    ((span / pixel - 1e-9).ceil() as usize).max(1)
}

fn padded_extent(values: &[f64], margin: f64, pixel_um: f64) -> RenderResult<(f64, f64)> {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return Err(RenderError::InvalidTarget(
            "points have no finite coordinates".to_string(),
        ));
    }

    let span = hi - lo;
    let pad = if span > 0.0 { span * margin } else { pixel_um };
    Ok((lo - pad, hi + pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smlm_common::PointCloud;

    #[test]
    fn test_pixel_one_center_offset() {
        let target = Target::new(10, 10, 100.0, (0.0, 1.0), (0.0, 1.0)).unwrap();
        assert_eq!(target.physical_to_pixel(0.05, 0.05), (1.0, 1.0));
        assert_eq!(
            target.physical_to_pixel_index(0.05, 0.05),
            PixelIndex { row: 1, col: 1 }
        );
    }

    #[test]
    fn test_in_bounds() {
        let target = Target::new(4, 3, 100.0, (0.0, 0.4), (0.0, 0.3)).unwrap();
        assert!(target.in_bounds(PixelIndex { row: 1, col: 1 }));
        assert!(target.in_bounds(PixelIndex { row: 3, col: 4 }));
        assert!(!target.in_bounds(PixelIndex { row: 4, col: 1 }));
        assert!(!target.in_bounds(PixelIndex { row: 1, col: 0 }));
        assert_eq!(target.offset(PixelIndex { row: 2, col: 3 }), Some(6));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        assert!(Target::new(0, 10, 100.0, (0.0, 1.0), (0.0, 1.0)).is_err());
        assert!(Target::new(10, 10, 0.0, (0.0, 1.0), (0.0, 1.0)).is_err());
        assert!(Target::new(10, 10, 100.0, (1.0, 1.0), (0.0, 1.0)).is_err());
    }

    #[test]
    fn test_from_points_margin() {
        let cloud = PointCloud::new(vec![0.0, 4.0], vec![1.0, 2.0]).unwrap();
        let target = Target::from_points(&cloud, 500.0, 0.25).unwrap();
        assert_eq!(target.x_range(), (-1.0, 5.0));
        assert_eq!(target.y_range(), (0.75, 2.25));
        assert_eq!(target.width(), 12);
        assert_eq!(target.height(), 3);
    }

    #[test]
    fn test_from_points_single_point() {
        let cloud = PointCloud::new(vec![1.0], vec![1.0]).unwrap();
        let target = Target::from_points(&cloud, 50.0, 0.05).unwrap();
        assert_eq!(target.width(), 2);
        assert_eq!(target.height(), 2);
    }

    #[test]
    fn test_from_points_empty() {
        let cloud = PointCloud::new(vec![], vec![]).unwrap();
        assert!(matches!(
            Target::from_points(&cloud, 50.0, 0.05),
            Err(RenderError::EmptyPointSet)
        ));
    }

    #[test]
    fn test_from_reference_grid_window() {
        let grid = ReferenceGrid::uniform(64, 32, 100.0, (0.0, 0.0)).unwrap();
        let target =
            Target::from_reference_grid(&grid, 4.0, Some(PixelWindow::new([8, 24], [0, 10]))).unwrap();
        assert_eq!(target.width(), 64);
        assert_eq!(target.height(), 40);
        assert!((target.pixel_size() - 25.0).abs() < 1e-9);
        assert!((target.x_range().0 - 0.8).abs() < 1e-12);
        assert!((target.x_range().1 - 2.4).abs() < 1e-12);
    }

    #[test]
    fn test_clip_span() {
        assert_eq!(Target::clip_span(5.0, 2.0, 10), Some((3, 7)));
        assert_eq!(Target::clip_span(1.0, 3.0, 10), Some((1, 4)));
        assert_eq!(Target::clip_span(-10.0, 2.0, 10), None);
    }
}
