//! Dense row-major RGB raster produced by every render.

use smlm_common::{RenderError, RenderResult, Rgb};

/// A `width × height` floating-point RGB image.
///
/// Pixel (1, 1) of the target is element 0; rows follow y.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl RgbImage {
    /// All-black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width * height],
        }
    }

    /// Wrap an existing row-major pixel buffer.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> RenderResult<Self> {
        if pixels.len() != width * height {
            return Err(RenderError::InvalidTarget(format!(
                "pixel buffer of length {} does not match {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// (height, width), matching row/column order.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Pixel at a 1-based (row, col), or `None` when outside.
    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        if row == 0 || col == 0 || row > self.height || col > self.width {
            return None;
        }
        Some(self.pixels[(row - 1) * self.width + (col - 1)])
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<Rgb> {
        self.pixels
    }

    /// Largest channel value anywhere in the image.
    pub fn max_channel_value(&self) -> f64 {
        self.pixels
            .iter()
            .map(Rgb::max_channel)
            .fold(0.0, f64::max)
    }

    /// Clamp every channel to [0, 1] in place.
    pub fn clamp(&mut self) {
        for px in &mut self.pixels {
            *px = px.clamped();
        }
    }

    /// Scale every channel by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        for px in &mut self.pixels {
            *px = *px * factor;
        }
    }

    /// Quantize to packed 8-bit RGB, 3 bytes per pixel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for px in &self.pixels {
            out.extend_from_slice(&px.to_u8());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_is_one_based() {
        let mut image = RgbImage::new(3, 2);
        image.pixels_mut()[4] = Rgb::WHITE;
        assert_eq!(image.get(2, 2), Some(Rgb::WHITE));
        assert_eq!(image.get(0, 1), None);
        assert_eq!(image.get(3, 1), None);
    }

    #[test]
    fn test_from_pixels_length_checked() {
        assert!(RgbImage::from_pixels(2, 2, vec![Rgb::BLACK; 3]).is_err());
    }

    #[test]
    fn test_clamp_and_max() {
        let mut image =
            RgbImage::from_pixels(2, 1, vec![Rgb::new(2.0, -1.0, 0.5), Rgb::gray(0.25)]).unwrap();
        assert_eq!(image.max_channel_value(), 2.0);
        image.clamp();
        assert_eq!(image.get(1, 1), Some(Rgb::new(1.0, 0.0, 0.5)));
    }

    #[test]
    fn test_to_rgb8() {
        let image = RgbImage::from_pixels(1, 1, vec![Rgb::new(1.0, 0.5, 0.0)]).unwrap();
        assert_eq!(image.to_rgb8(), vec![255, 128, 0]);
    }
}
