//! Per-render accumulation buffers and their final color resolution.
//!
//! Every render call allocates its own zeroed buffers, feeds them through
//! [`Deposit`], then resolves them into RGB once. Nothing here outlives a
//! single call.

use crate::colormap::Colormap;
use crate::normalize::{clip_normalize, normalize_to_range};
use smlm_common::Rgb;

/// Sink for point contributions.
///
/// `offset` is a row-major pixel offset, `weight` the kernel value at that
/// pixel and `point` the index of the contributing point, so buffers that
/// carry per-point colors or values can look them up.
pub(crate) trait Deposit {
    fn deposit(&mut self, offset: usize, weight: f64, point: usize);
}

/// One scalar per pixel: counts or summed kernel weights.
pub(crate) struct GrayBuffer {
    values: Vec<f64>,
}

impl GrayBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    /// Clip, renormalize and map every pixel, background included, through
    /// `colormap`.
    pub fn into_colormapped(mut self, colormap: &Colormap, clip: Option<f64>) -> Vec<Rgb> {
        clip_normalize(&mut self.values, clip);
        self.values.iter().map(|&v| colormap.sample(v)).collect()
    }

    /// Clip and renormalize into gray levels.
    pub fn into_gray(mut self, clip: Option<f64>) -> Vec<Rgb> {
        clip_normalize(&mut self.values, clip);
        self.values.into_iter().map(Rgb::gray).collect()
    }
}

impl Deposit for GrayBuffer {
    #[inline]
    fn deposit(&mut self, offset: usize, weight: f64, _point: usize) {
        self.values[offset] += weight;
    }
}

/// Total weight and weighted color numerators of one pixel.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WeightedColor {
    pub weight: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Intensity-weighted color blending.
///
/// Hue is the weight-averaged point color; luminance is the total weight
/// after clipping and renormalization.
pub(crate) struct BlendBuffer<'c> {
    cells: Vec<WeightedColor>,
    colors: &'c [Rgb],
}

impl<'c> BlendBuffer<'c> {
    pub fn new(len: usize, colors: &'c [Rgb]) -> Self {
        Self {
            cells: vec![WeightedColor::default(); len],
            colors,
        }
    }

    pub fn into_pixels(self, clip: Option<f64>) -> Vec<Rgb> {
        let mut brightness: Vec<f64> = self.cells.iter().map(|c| c.weight).collect();
        clip_normalize(&mut brightness, clip);

        self.cells
            .iter()
            .zip(brightness)
            .map(|(cell, level)| {
                if cell.weight > 0.0 {
                    Rgb::new(cell.r, cell.g, cell.b) * (level / cell.weight)
                } else {
                    Rgb::BLACK
                }
            })
            .collect()
    }
}

impl Deposit for BlendBuffer<'_> {
    #[inline]
    fn deposit(&mut self, offset: usize, weight: f64, point: usize) {
        let color = self.colors[point];
        let cell = &mut self.cells[offset];
        cell.weight += weight;
        cell.r += weight * color.r;
        cell.g += weight * color.g;
        cell.b += weight * color.b;
    }
}

/// Per-pixel point count and attribute sum for binned field coloring.
pub(crate) struct FieldSumBuffer<'v> {
    count: Vec<f64>,
    sum: Vec<f64>,
    values: &'v [f64],
}

impl<'v> FieldSumBuffer<'v> {
    pub fn new(len: usize, values: &'v [f64]) -> Self {
        Self {
            count: vec![0.0; len],
            sum: vec![0.0; len],
            values,
        }
    }

    /// Color each occupied pixel by its mean attribute value, scaled by the
    /// clipped count. Without clipping the raw count is used, so overlapping
    /// points saturate.
    pub fn into_pixels(self, colormap: &Colormap, range: (f64, f64), clip: Option<f64>) -> Vec<Rgb> {
        let mut brightness = self.count.clone();
        if clip.is_some() {
            clip_normalize(&mut brightness, clip);
        }

        self.count
            .iter()
            .zip(&self.sum)
            .zip(brightness)
            .map(|((&count, &sum), level)| {
                if count > 0.0 {
                    let mean = sum / count;
                    colormap.sample(normalize_to_range(mean, range.0, range.1)) * level
                } else {
                    Rgb::BLACK
                }
            })
            .collect()
    }
}

impl Deposit for FieldSumBuffer<'_> {
    #[inline]
    fn deposit(&mut self, offset: usize, weight: f64, point: usize) {
        self.count[offset] += weight;
        self.sum[offset] += weight * self.values[point];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray() -> Colormap {
        Colormap::from_fn("gray", Rgb::gray)
    }

    #[test]
    fn test_gray_buffer_maps_background() {
        let mut buf = GrayBuffer::new(3);
        buf.deposit(1, 2.0, 0);
        buf.deposit(2, 1.0, 0);
        let red = Colormap::from_fn("red", |t| Rgb::new(1.0, t, t));
        let pixels = buf.into_colormapped(&red, Some(1.0));
        assert_eq!(pixels[0], Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(pixels[1], Rgb::WHITE);
        assert_eq!(pixels[2], Rgb::new(1.0, 0.5, 0.5));
    }

    #[test]
    fn test_blend_averages_by_weight() {
        let colors = [Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 0.0, 1.0)];
        let mut buf = BlendBuffer::new(2, &colors);
        buf.deposit(0, 3.0, 0);
        buf.deposit(0, 1.0, 1);
        let pixels = buf.into_pixels(Some(1.0));
        assert_eq!(pixels[0], Rgb::new(0.75, 0.0, 0.25));
        assert_eq!(pixels[1], Rgb::BLACK);
    }

    #[test]
    fn test_blend_brightness_follows_weight() {
        let colors = [Rgb::WHITE];
        let mut buf = BlendBuffer::new(2, &colors);
        buf.deposit(0, 2.0, 0);
        buf.deposit(1, 1.0, 0);
        let pixels = buf.into_pixels(Some(1.0));
        assert_eq!(pixels[0], Rgb::WHITE);
        assert_eq!(pixels[1], Rgb::gray(0.5));
    }

    #[test]
    fn test_field_sum_count_average() {
        let values = [0.0, 10.0, 4.0];
        let mut buf = FieldSumBuffer::new(2, &values);
        buf.deposit(0, 1.0, 0);
        buf.deposit(0, 1.0, 1);
        buf.deposit(1, 1.0, 2);
        let pixels = buf.into_pixels(&gray(), (0.0, 10.0), Some(1.0));
        assert_eq!(pixels[0], Rgb::gray(0.5));
        assert!((pixels[1].r - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_field_sum_unclipped_saturates() {
        let values = [10.0, 10.0];
        let mut buf = FieldSumBuffer::new(1, &values);
        buf.deposit(0, 1.0, 0);
        buf.deposit(0, 1.0, 1);
        let pixels = buf.into_pixels(&gray(), (0.0, 10.0), None);
        assert_eq!(pixels[0], Rgb::gray(2.0));
    }
}
