//! # Bayer 16x16 Ordered Dithering
//!
//! This module converts a color raster into a packed 1-bit buffer suitable
//! for label and thermal printers, which can only place a dot or leave the
//! paper blank.
//!
//! ## Algorithm
//!
//! For each pixel position (x, y):
//!
//! 1. `luminance = (R + G + B) / 3` on 0-255 channel values (alpha ignored)
//! 2. `threshold = BAYER16[y mod 16][x mod 16]`, or a flat 128 with dithering off
//! 3. If `luminance < threshold`, the pixel is ink (bit 1); otherwise paper (bit 0)
//!
//! With dithering off this is a plain 50% cutoff: crisp for barcodes, which
//! are already black and white. With dithering on, the threshold varies over
//! a tileable 16x16 grid so that a flat gray of luminance L inks exactly
//! `255 - L` of the 256 cells in a tile.
//!
//! ## The Bayer Matrix
//!
//! The 16x16 matrix is built recursively from the 2x2 seed:
//!
//! ```text
//! M(1)  = [0]
//! M(2n) = | 4·M(n) + 0   4·M(n) + 2 |
//!         | 4·M(n) + 3   4·M(n) + 1 |
//! ```
//!
//! It holds every value 0-255 exactly once. Its values are part of the output
//! format: two renderers using the same table produce bit-identical buffers.
//!
//! ## Bit Packing
//!
//! ```text
//!   pixel x:  0 1 2 3 4 5 6 7 | 8 9 ...
//!   byte 0:   7 6 5 4 3 2 1 0 | byte 1 ...   (bit index, MSB = leftmost)
//! ```
//!
//! Every row starts on a fresh byte, so the row stride is `ceil(width / 8)`
//! bytes and the unused low bits of a row's last byte are zero.
//!
//! ## Usage Example
//!
//! ```
//! use barcoder::raster::{RasterImage, BLACK};
//! use barcoder::render::dither::to_bitonal;
//!
//! let img = RasterImage::filled(12, 2, BLACK).unwrap();
//! let mono = to_bitonal(&img, false).unwrap();
//!
//! assert_eq!(mono.stride(), 2);
//! assert_eq!(mono.data(), &[0xFF, 0xF0, 0xFF, 0xF0]);
//! ```

use image::{GrayImage, Luma, Rgba};
use tracing::debug;

use crate::error::{BarcoderError, Result};
use crate::raster::RasterImage;

/// Bayer 16x16 threshold matrix.
///
/// Values are thresholds in 0-255. Row index is `y mod 16`, column index is
/// `x mod 16`.
pub const BAYER16: [[u8; 16]; 16] = [
    [0, 128, 32, 160, 8, 136, 40, 168, 2, 130, 34, 162, 10, 138, 42, 170],
    [192, 64, 224, 96, 200, 72, 232, 104, 194, 66, 226, 98, 202, 74, 234, 106],
    [48, 176, 16, 144, 56, 184, 24, 152, 50, 178, 18, 146, 58, 186, 26, 154],
    [240, 112, 208, 80, 248, 120, 216, 88, 242, 114, 210, 82, 250, 122, 218, 90],
    [12, 140, 44, 172, 4, 132, 36, 164, 14, 142, 46, 174, 6, 134, 38, 166],
    [204, 76, 236, 108, 196, 68, 228, 100, 206, 78, 238, 110, 198, 70, 230, 102],
    [60, 188, 28, 156, 52, 180, 20, 148, 62, 190, 30, 158, 54, 182, 22, 150],
    [252, 124, 220, 92, 244, 116, 212, 84, 254, 126, 222, 94, 246, 118, 214, 86],
    [3, 131, 35, 163, 11, 139, 43, 171, 1, 129, 33, 161, 9, 137, 41, 169],
    [195, 67, 227, 99, 203, 75, 235, 107, 193, 65, 225, 97, 201, 73, 233, 105],
    [51, 179, 19, 147, 59, 187, 27, 155, 49, 177, 17, 145, 57, 185, 25, 153],
    [243, 115, 211, 83, 251, 123, 219, 91, 241, 113, 209, 81, 249, 121, 217, 89],
    [15, 143, 47, 175, 7, 135, 39, 167, 13, 141, 45, 173, 5, 133, 37, 165],
    [207, 79, 239, 111, 199, 71, 231, 103, 205, 77, 237, 109, 197, 69, 229, 101],
    [63, 191, 31, 159, 55, 183, 23, 151, 61, 189, 29, 157, 53, 181, 21, 149],
    [255, 127, 223, 95, 247, 119, 215, 87, 253, 125, 221, 93, 245, 117, 213, 85],
];

/// Cutoff used when dithering is disabled.
pub const FLAT_THRESHOLD: u8 = 128;

/// Threshold for pixel `(x, y)`.
#[inline]
pub fn threshold(x: usize, y: usize, dither: bool) -> u8 {
    if dither {
        BAYER16[y & 15][x & 15]
    } else {
        FLAT_THRESHOLD
    }
}

/// Unweighted channel average, 0 = black, 255 = white. Alpha is ignored.
#[inline]
pub fn luminance(px: Rgba<u8>) -> u8 {
    let [r, g, b, _] = px.0;
    ((r as u16 + g as u16 + b as u16) / 3) as u8
}

/// Whether pixel `(x, y)` with the given luminance gets a dot.
#[inline]
pub fn is_ink(x: usize, y: usize, luminance: u8, dither: bool) -> bool {
    luminance < threshold(x, y, dither)
}

/// Pack a row of boolean pixel values into bytes.
///
/// - Bit 7 (MSB) = leftmost pixel
/// - 1 = ink, 0 = paper
/// - A partial final byte is padded with zeros
///
/// ```
/// use barcoder::render::dither::pack_row;
///
/// let row = vec![true, true, true, true, false, false, false, false];
/// assert_eq!(pack_row(&row), vec![0xF0]);
///
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

/// A packed 1-bit-per-pixel image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitonalBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitonalBuffer {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row: `ceil(width / 8)`.
    pub fn stride(&self) -> usize {
        self.width.div_ceil(8)
    }

    /// Packed rows, exactly `stride * height` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Whether pixel `(x, y)` is ink. `false` outside the image.
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte_idx = y * self.stride() + x / 8;
        let bit_idx = 7 - (x % 8);
        self.data
            .get(byte_idx)
            .is_some_and(|byte| (byte >> bit_idx) & 1 == 1)
    }

    /// Number of ink pixels.
    pub fn ink_count(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Black-on-white grayscale rendering, for previews.
    pub fn to_gray_image(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = if self.get(x, y) { 0u8 } else { 255u8 };
                img.put_pixel(x as u32, y as u32, Luma([color]));
            }
        }
        img
    }
}

/// Convert a color raster to a packed bitonal buffer.
///
/// ## Parameters
///
/// - `source`: raster with at least three color channels
/// - `dither_enabled`: use the Bayer matrix instead of the flat 128 cutoff
///
/// ## Errors
///
/// [`BarcoderError::UnsupportedFormat`] if the source has fewer than three
/// color channels.
pub fn to_bitonal(source: &RasterImage, dither_enabled: bool) -> Result<BitonalBuffer> {
    if source.format().color_channels() < 3 {
        return Err(BarcoderError::UnsupportedFormat(format!(
            "bitonal conversion needs RGB channels, got {:?}",
            source.format()
        )));
    }

    let width = source.width();
    let height = source.height();
    debug!(width, height, dither_enabled, "Converting to bitonal");

    let mut data = Vec::with_capacity(width.div_ceil(8) * height);
    let mut row_pixels = Vec::with_capacity(width);

    for y in 0..height {
        row_pixels.clear();
        for x in 0..width {
            let lum = source.pixel(x, y).map(luminance).unwrap_or(255);
            row_pixels.push(is_ink(x, y, lum, dither_enabled));
        }
        data.extend(pack_row(&row_pixels));
    }

    Ok(BitonalBuffer {
        width,
        height,
        data,
    })
}

// ============================================================================
// TESTS
// ============================================================================
