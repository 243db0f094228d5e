//! PNG encoding for rendered rasters.
//!
//! Two encodings are produced:
//! - **Indexed PNG (color type 3)** when the quantized image has ≤256 unique
//!   colors. Sparse renders (mostly background) usually qualify.
//! - **Truecolor PNG (color type 2)** otherwise.

use crate::raster::RgbImage;
use rayon::prelude::*;
use smlm_common::{RenderError, RenderResult};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode a raster as PNG, choosing indexed or truecolor automatically.
pub fn encode_png(image: &RgbImage) -> RenderResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let (width, height) = (image.width(), image.height());

    let palette = if width * height >= PARALLEL_THRESHOLD {
        extract_palette_parallel(&rgb)
    } else {
        extract_palette_sequential(&rgb)
    };

    match palette {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_truecolor(&rgb, width, height),
    }
}

/// Encode and write a raster to `path`.
pub fn write_png(image: &RgbImage, path: impl AsRef<Path>) -> RenderResult<()> {
    let bytes = encode_png(image)?;
    std::fs::write(path, bytes)
        .map_err(|e| RenderError::EncodeError(format!("failed to write PNG: {}", e)))
}

#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
}

#[inline(always)]
fn unpack_color(packed: u32) -> [u8; 3] {
    [packed as u8, (packed >> 8) as u8, (packed >> 16) as u8]
}

fn extract_palette_sequential(rgb: &[u8]) -> Option<(Vec<[u8; 3]>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<[u8; 3]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(rgb.len() / 3);

    for px in rgb.chunks_exact(3) {
        let packed = pack_color(px[0], px[1], px[2]);
        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push([px[0], px[1], px[2]]);
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Collect unique colors per chunk in parallel, merge, then map pixels to
/// palette indices in parallel.
fn extract_palette_parallel(rgb: &[u8]) -> Option<(Vec<[u8; 3]>, Vec<u8>)> {
    let num_pixels = rgb.len() / 3;
    let chunk_pixels = (num_pixels / rayon::current_num_threads()).max(256);

    let unique_colors: Vec<u32> = rgb
        .par_chunks(chunk_pixels * 3)
        .flat_map(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(3) {
                local.insert(pack_color(px[0], px[1], px[2]), ());
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys().collect::<Vec<_>>()
        })
        .collect();

    let mut global: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<[u8; 3]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in unique_colors {
        if !global.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            global.insert(packed, palette.len() as u8);
            palette.push(unpack_color(packed));
        }
    }

    let mut indices = vec![0u8; num_pixels];
    indices
        .par_chunks_mut(chunk_pixels)
        .zip(rgb.par_chunks(chunk_pixels * 3))
        .for_each(|(idx_chunk, px_chunk)| {
            for (idx, px) in idx_chunk.iter_mut().zip(px_chunk.chunks_exact(3)) {
                *idx = global
                    .get(&pack_color(px[0], px[1], px[2]))
                    .copied()
                    .unwrap_or(0);
            }
        });

    Some((palette, indices))
}

fn encode_indexed(width: usize, height: usize, palette: &[[u8; 3]], indices: &[u8]) -> RenderResult<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flatten().copied().collect();
    write_chunk(&mut png, b"PLTE", &plte);

    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn encode_truecolor(rgb: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 2));

    let idat = deflate_scanlines(rgb, width * 3, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

/// Prefix each `row_bytes`-long scanline with filter type 0 and zlib it.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> RenderResult<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| RenderError::EncodeError(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::EncodeError(format!("IDAT compression failed: {}", e)))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
