//! # Raster Images
//!
//! A stride-aware pixel buffer. Barcode renderers hand one of these to the
//! compositor, and the compositor hands a fresh one back.
//!
//! ## Memory Layout
//!
//! Rows are stored top to bottom. Each row starts `stride` bytes after the
//! previous one, and only the first `width * bytes_per_pixel` bytes of a row
//! hold pixels. Anything after that is alignment padding and is never read.
//!
//! ```text
//!              width * bpp          padding
//!          ├──────────────────────┤├──────┤
//! row 0    │ p0 │ p1 │ ... │ pW-1 ││ .... │
//! row 1    │ p0 │ p1 │ ... │ pW-1 ││ .... │
//!          ├──────────────────────────────┤
//!                      stride
//! ```
//!
//! The last row may be short (no trailing padding), which is how most
//! graphics libraries hand out sub-images.

use image::{Rgba, RgbaImage};

use crate::error::{BarcoderError, Result};

/// Fully transparent black, the default canvas background.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Opaque white.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Opaque black.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Byte layout of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit red, green, blue, alpha
    Rgba8,
    /// 8-bit blue, green, red, alpha (native order of many 2D libraries)
    Bgra8,
    /// 8-bit red, green, blue, no alpha
    Rgb8,
    /// 8-bit luminance only
    Luma8,
}

impl PixelFormat {
    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Luma8 => 1,
        }
    }

    /// Number of color (non-alpha) channels.
    pub const fn color_channels(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 | PixelFormat::Rgb8 => 3,
            PixelFormat::Luma8 => 1,
        }
    }

    fn decode(self, px: &[u8]) -> Rgba<u8> {
        match self {
            PixelFormat::Rgba8 => Rgba([px[0], px[1], px[2], px[3]]),
            PixelFormat::Bgra8 => Rgba([px[2], px[1], px[0], px[3]]),
            PixelFormat::Rgb8 => Rgba([px[0], px[1], px[2], 255]),
            PixelFormat::Luma8 => Rgba([px[0], px[0], px[0], 255]),
        }
    }

    fn encode(self, color: Rgba<u8>, px: &mut [u8]) {
        let [r, g, b, a] = color.0;
        match self {
            PixelFormat::Rgba8 => px.copy_from_slice(&[r, g, b, a]),
            PixelFormat::Bgra8 => px.copy_from_slice(&[b, g, r, a]),
            PixelFormat::Rgb8 => px.copy_from_slice(&[r, g, b]),
            PixelFormat::Luma8 => px[0] = ((r as u16 + g as u16 + b as u16) / 3) as u8,
        }
    }
}

/// A row-major pixel buffer with an explicit row stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap an existing pixel buffer.
    ///
    /// Fails with [`BarcoderError::InvalidArgument`] when either dimension is
    /// zero, when `stride` is shorter than one row of pixels, or when `data`
    /// cannot hold `height` rows.
    pub fn new(
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BarcoderError::InvalidArgument(format!(
                "raster dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let row_bytes = width
            .checked_mul(format.bytes_per_pixel())
            .ok_or_else(|| BarcoderError::InvalidArgument("raster width overflows".into()))?;
        if stride < row_bytes {
            return Err(BarcoderError::InvalidArgument(format!(
                "stride {} is smaller than row size {}",
                stride, row_bytes
            )));
        }

        let required = stride
            .checked_mul(height - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| BarcoderError::InvalidArgument("raster size overflows".into()))?;
        if data.len() < required {
            return Err(BarcoderError::InvalidArgument(format!(
                "pixel buffer holds {} bytes, {}x{} with stride {} needs {}",
                data.len(),
                width,
                height,
                stride,
                required
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Allocate a tightly packed RGBA raster with every pixel set to `color`.
    pub fn filled(width: usize, height: usize, color: Rgba<u8>) -> Result<Self> {
        let stride = width
            .checked_mul(4)
            .ok_or_else(|| BarcoderError::InvalidArgument("raster width overflows".into()))?;
        let len = stride
            .checked_mul(height)
            .ok_or_else(|| BarcoderError::InvalidArgument("raster size overflows".into()))?;

        let mut data = Vec::with_capacity(len);
        for _ in 0..width.saturating_mul(height) {
            data.extend_from_slice(&color.0);
        }
        Self::new(width, height, stride, PixelFormat::Rgba8, data)
    }

    /// Take ownership of an `image` crate RGBA buffer.
    pub fn from_rgba_image(img: RgbaImage) -> Result<Self> {
        let (w, h) = img.dimensions();
        let (w, h) = (w as usize, h as usize);
        Self::new(w, h, w * 4, PixelFormat::Rgba8, img.into_raw())
    }

    /// Copy into a tightly packed `image` crate RGBA buffer.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(px) = self.pixel(x, y) {
                    out.put_pixel(x as u32, y as u32, px);
                }
            }
        }
        out
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The backing buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel bytes of row `y`, padding excluded.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data
            .get(start..start + self.width * self.format.bytes_per_pixel())
    }

    /// Read pixel `(x, y)` as RGBA. Returns `None` outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba<u8>> {
        if x >= self.width {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let row = self.row(y)?;
        row.get(x * bpp..(x + 1) * bpp)
            .map(|px| self.format.decode(px))
    }

    /// Overwrite pixel `(x, y)`. Writes outside the image are dropped.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba<u8>) {
        if x >= self.width || y >= self.height {
            return;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = y * self.stride + x * bpp;
        if let Some(px) = self.data.get_mut(start..start + bpp) {
            self.format.encode(color, px);
        }
    }

    /// Draw `color` over pixel `(x, y)` with source-over alpha compositing.
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Rgba<u8>) {
        match color.0[3] {
            0 => {}
            255 => self.set_pixel(x, y, color),
            _ => {
                if let Some(dst) = self.pixel(x, y) {
                    self.set_pixel(x, y, source_over(color, dst));
                }
            }
        }
    }
}

/// Non-premultiplied source-over compositing of `src` onto `dst`.
pub fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as u32;
    let da = dst.0[3] as u32;
    // dst weight after src coverage, scaled by 255
    let dw = da * (255 - sa);
    let out_a = sa * 255 + dw;
    if out_a == 0 {
        return TRANSPARENT;
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src.0[c] as u32 * sa * 255 + dst.0[c] as u32 * dw + out_a / 2) / out_a;
        out[c] = v.min(255) as u8;
    }
    out[3] = ((out_a + 127) / 255).min(255) as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            RasterImage::new(0, 4, 16, PixelFormat::Rgba8, vec![0; 64]),
            Err(BarcoderError::InvalidArgument(_))
        ));
        assert!(matches!(
            RasterImage::new(4, 0, 16, PixelFormat::Rgba8, vec![0; 64]),
            Err(BarcoderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_short_stride() {
        let result = RasterImage::new(4, 1, 15, PixelFormat::Rgba8, vec![0; 16]);
        assert!(matches!(result, Err(BarcoderError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let result = RasterImage::new(4, 2, 16, PixelFormat::Rgba8, vec![0; 31]);
        assert!(matches!(result, Err(BarcoderError::InvalidArgument(_))));
    }

    #[test]
    fn test_last_row_may_omit_padding() {
        // 2 rows, 3 RGB pixels wide, stride 12: row 0 = 12 bytes, row 1 = 9 bytes
        let img = RasterImage::new(3, 2, 12, PixelFormat::Rgb8, vec![7; 21]).unwrap();
        assert_eq!(img.row(1).unwrap().len(), 9);
    }

    #[test]
    fn test_padded_rows_skip_padding() {
        // 2x2 RGBA with 4 padding bytes per row filled with 0xEE
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 2, 3, 255, 4, 5, 6, 255, 0xEE, 0xEE, 0xEE, 0xEE]);
        data.extend_from_slice(&[7, 8, 9, 255, 10, 11, 12, 255, 0xEE, 0xEE, 0xEE, 0xEE]);
        let img = RasterImage::new(2, 2, 12, PixelFormat::Rgba8, data).unwrap();

        assert_eq!(img.pixel(0, 1), Some(Rgba([7, 8, 9, 255])));
        assert_eq!(img.pixel(1, 1), Some(Rgba([10, 11, 12, 255])));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.pixel(0, 2), None);
    }

    #[test]
    fn test_bgra_decodes_to_rgba() {
        let img = RasterImage::new(1, 1, 4, PixelFormat::Bgra8, vec![30, 20, 10, 200]).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Rgba([10, 20, 30, 200])));
    }

    #[test]
    fn test_luma_expands_to_gray() {
        let img = RasterImage::new(1, 1, 1, PixelFormat::Luma8, vec![90]).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Rgba([90, 90, 90, 255])));
    }

    #[test]
    fn test_filled() {
        let img = RasterImage::filled(3, 2, WHITE).unwrap();
        assert_eq!(img.stride(), 12);
        assert_eq!(img.data().len(), 24);
        assert!(img.data().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_set_pixel_out_of_bounds_is_dropped() {
        let mut img = RasterImage::filled(2, 2, WHITE).unwrap();
        img.set_pixel(2, 0, BLACK);
        img.set_pixel(0, 2, BLACK);
        assert!(img.data().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_rgba_image_conversion_keeps_pixels() {
        let mut data = vec![0u8; 2 * 12];
        data[4..8].copy_from_slice(&[1, 2, 3, 4]);
        let img = RasterImage::new(2, 2, 12, PixelFormat::Rgba8, data).unwrap();

        let rgba = img.to_rgba_image();
        assert_eq!(rgba.dimensions(), (2, 2));
        assert_eq!(*rgba.get_pixel(1, 0), Rgba([1, 2, 3, 4]));

        let back = RasterImage::from_rgba_image(rgba).unwrap();
        assert_eq!(back.stride(), 8);
        assert_eq!(back.pixel(1, 0), Some(Rgba([1, 2, 3, 4])));
    }

    #[test]
    fn test_source_over() {
        // Opaque source wins, transparent source is a no-op
        assert_eq!(source_over(BLACK, WHITE), BLACK);
        assert_eq!(source_over(TRANSPARENT, WHITE), WHITE);

        // Half-transparent black over white lands near mid gray
        let mixed = source_over(Rgba([0, 0, 0, 128]), WHITE);
        assert_eq!(mixed.0[3], 255);
        assert!((mixed.0[0] as i32 - 127).abs() <= 1);

        // Anything over transparent keeps its own color
        let over_clear = source_over(Rgba([200, 100, 50, 128]), TRANSPARENT);
        assert_eq!(over_clear, Rgba([200, 100, 50, 128]));
    }
}
