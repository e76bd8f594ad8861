//! # Canvas Compositing
//!
//! Fits a rendered barcode into a fixed-size label canvas.
//!
//! Barcode renderers produce whatever size the symbol needs. Label stock does
//! not care: it has a fixed width and height in dots. This module allocates a
//! canvas of the requested size, fills it with a background color and draws
//! the source onto it under one of three scale policies.
//!
//! ## Scale Modes
//!
//! ```text
//!   source 6x2, canvas 4x4
//!
//!   Stretch            Shrink             None
//!   ┌────┐             ┌────┐             ┌────┐
//!   │████│             │    │             │    │
//!   │████│             │████│             │████│  (1 column cropped
//!   │████│             │████│             │████│   on each side)
//!   │████│             │    │             │    │
//!   └────┘             └────┘             └────┘
//!   fill, distort      fit, keep aspect   1:1, center, clip
//! ```
//!
//! ## Resampling
//!
//! Stretch and Shrink resample with a linear (triangle) filter whenever the
//! drawn size differs from the source size. When the sizes match the source
//! pixels are copied exactly. None never resamples.
//!
//! Shrink computes a fractional destination rectangle; its edges are rounded
//! to whole pixels before drawing.
//!
//! The filter runs on premultiplied alpha, so the color of a fully
//! transparent pixel never bleeds into its opaque neighbours.

use image::{Rgba, RgbaImage, imageops::FilterType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BarcoderError, Result};
use crate::raster::RasterImage;

/// Resampling filter used by [`ScaleMode::Stretch`] and [`ScaleMode::Shrink`].
pub const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// How the source is fitted into the canvas.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Fill the canvas exactly, distorting the aspect ratio if needed.
    Stretch,
    /// Scale down to fit, keep aspect ratio, never enlarge, center.
    #[default]
    Shrink,
    /// Draw 1:1, centered, clipped to the canvas.
    None,
}

impl ScaleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleMode::Stretch => "stretch",
            ScaleMode::Shrink => "shrink",
            ScaleMode::None => "none",
        }
    }
}

/// A destination rectangle in canvas space, in fractional pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DrawRect {
    /// Round the edges to whole pixels: `(left, top, width, height)`.
    ///
    /// Width and height are at least 1 so a very thin source stays visible.
    pub fn snap(&self) -> (i64, i64, usize, usize) {
        let left = self.x.round() as i64;
        let top = self.y.round() as i64;
        let right = (self.x + self.width).round() as i64;
        let bottom = (self.y + self.height).round() as i64;
        (
            left,
            top,
            (right - left).max(1) as usize,
            (bottom - top).max(1) as usize,
        )
    }
}

/// Placement of a `src_w x src_h` source under [`ScaleMode::Shrink`].
///
/// ```text
/// scale = min(canvas_w / src_w, canvas_h / src_h, 1.0)
/// draw  = src * scale
/// x, y  = (canvas - draw) / 2
/// ```
pub fn shrink_rect(src_w: usize, src_h: usize, canvas_w: usize, canvas_h: usize) -> DrawRect {
    let scale = (canvas_w as f32 / src_w as f32)
        .min(canvas_h as f32 / src_h as f32)
        .min(1.0);

    let width = src_w as f32 * scale;
    let height = src_h as f32 * scale;

    DrawRect {
        x: (canvas_w as f32 - width) / 2.0,
        y: (canvas_h as f32 - height) / 2.0,
        width,
        height,
    }
}

/// Integer offset of the source under [`ScaleMode::None`].
///
/// Division truncates toward zero, so an oversized source with an odd
/// overhang loses one more column on the right than on the left.
pub fn center_offset(src_w: usize, src_h: usize, canvas_w: usize, canvas_h: usize) -> (i64, i64) {
    (
        (canvas_w as i64 - src_w as i64) / 2,
        (canvas_h as i64 - src_h as i64) / 2,
    )
}

/// Draw `source` onto a new `canvas_width x canvas_height` RGBA canvas.
///
/// Every canvas pixel starts as `background`; the source is drawn over it
/// with source-over alpha compositing. The source is never modified.
///
/// ## Errors
///
/// [`BarcoderError::InvalidArgument`] if either canvas dimension is zero.
/// Nothing is allocated in that case.
///
/// ## Example
///
/// ```
/// use barcoder::raster::{RasterImage, BLACK, WHITE};
/// use barcoder::render::canvas::{compose, ScaleMode};
///
/// let src = RasterImage::filled(2, 2, BLACK).unwrap();
/// let out = compose(&src, 4, 4, ScaleMode::None, WHITE).unwrap();
///
/// assert_eq!(out.pixel(1, 1), Some(BLACK));
/// assert_eq!(out.pixel(0, 0), Some(WHITE));
/// ```
pub fn compose(
    source: &RasterImage,
    canvas_width: usize,
    canvas_height: usize,
    mode: ScaleMode,
    background: Rgba<u8>,
) -> Result<RasterImage> {
    if canvas_width == 0 || canvas_height == 0 {
        return Err(BarcoderError::InvalidArgument(format!(
            "canvas dimensions must be positive, got {}x{}",
            canvas_width, canvas_height
        )));
    }

    debug!(
        src_w = source.width(),
        src_h = source.height(),
        canvas_width,
        canvas_height,
        mode = mode.as_str(),
        "Composing canvas"
    );

    let mut canvas = RasterImage::filled(canvas_width, canvas_height, background)?;

    match mode {
        ScaleMode::Stretch => {
            draw_scaled(&mut canvas, source, 0, 0, canvas_width, canvas_height)?;
        }
        ScaleMode::Shrink => {
            let rect = shrink_rect(source.width(), source.height(), canvas_width, canvas_height);
            let (x, y, w, h) = rect.snap();
            debug!(x, y, w, h, "Shrink placement");
            draw_scaled(&mut canvas, source, x, y, w, h)?;
        }
        ScaleMode::None => {
            let (x, y) =
                center_offset(source.width(), source.height(), canvas_width, canvas_height);
            blit(&mut canvas, source, x, y);
        }
    }

    Ok(canvas)
}

/// Resample `source` to `width x height` and draw it at `(x, y)`.
fn draw_scaled(
    canvas: &mut RasterImage,
    source: &RasterImage,
    x: i64,
    y: i64,
    width: usize,
    height: usize,
) -> Result<()> {
    if (width, height) == (source.width(), source.height()) {
        blit(canvas, source, x, y);
        return Ok(());
    }

    let mut premultiplied = source.to_rgba_image();
    premultiply(&mut premultiplied);
    let mut resized =
        image::imageops::resize(&premultiplied, width as u32, height as u32, RESAMPLE_FILTER);
    unpremultiply(&mut resized);

    let resized = RasterImage::from_rgba_image(resized)?;
    blit(canvas, &resized, x, y);
    Ok(())
}

fn premultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px.0[3] as u16;
        for c in 0..3 {
            px.0[c] = ((px.0[c] as u16 * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px.0[3] as u16;
        if a == 0 {
            px.0 = [0, 0, 0, 0];
            continue;
        }
        for c in 0..3 {
            px.0[c] = ((px.0[c] as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Draw `source` 1:1 with its top-left corner at `(x, y)`, clipped to the canvas.
fn blit(canvas: &mut RasterImage, source: &RasterImage, x: i64, y: i64) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + source.width() as i64).min(canvas.width() as i64);
    let y1 = (y + source.height() as i64).min(canvas.height() as i64);

    for dy in y0..y1 {
        for dx in x0..x1 {
            if let Some(px) = source.pixel((dx - x) as usize, (dy - y) as usize) {
                canvas.blend_pixel(dx as usize, dy as usize, px);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
