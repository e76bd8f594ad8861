//! # Generate Pipeline
//!
//! One request in, one encoded image out:
//!
//! ```text
//! render_symbol ──► compose (width x height) ──► PNG
//!                                         └──► to_bitonal ──► PNG preview | raw bytes
//! ```
//!
//! Both the HTTP handlers and the CLI go through [`generate`].

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::barcode::{self, RenderOptions, Symbology};
use crate::error::{BarcoderError, Result};
use crate::raster::{RasterImage, TRANSPARENT, WHITE};
use crate::render::canvas::{self, ScaleMode};
use crate::render::dither::{self, BitonalBuffer};

fn default_format() -> String {
    "CODE_128".to_string()
}

fn default_size() -> usize {
    200
}

/// What [`generate`] should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// PNG of the composed RGBA canvas.
    #[default]
    Png,
    /// PNG of the 1-bit buffer, black on white.
    Bitonal,
    /// The packed 1-bit buffer itself.
    Raw,
}

/// A barcode generation request.
///
/// Field defaults match the HTTP API: a 200x200 Code 128 on white, shrunk
/// to fit, returned as PNG.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub content: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_size")]
    pub width: usize,
    #[serde(default = "default_size")]
    pub height: usize,
    /// Quiet zone in modules.
    #[serde(default)]
    pub margin: usize,
    /// Shorthand for `mode = stretch`.
    #[serde(default)]
    pub stretch: bool,
    /// Explicit scale mode; wins over `stretch`.
    #[serde(default)]
    pub mode: Option<ScaleMode>,
    /// `#RRGGBB`, `#RRGGBBAA` or `transparent`. White when absent.
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub output: OutputKind,
    /// Ordered dithering for bitonal output.
    #[serde(default)]
    pub dither: bool,
}

impl GenerateRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: default_format(),
            width: default_size(),
            height: default_size(),
            margin: 0,
            stretch: false,
            mode: None,
            background: None,
            output: OutputKind::Png,
            dither: false,
        }
    }

    pub fn scale_mode(&self) -> ScaleMode {
        match self.mode {
            Some(mode) => mode,
            None if self.stretch => ScaleMode::Stretch,
            None => ScaleMode::Shrink,
        }
    }
}

/// Encoded output of [`generate`].
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub content_type: &'static str,
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

/// Parse `#RRGGBB`, `#RRGGBBAA` (leading `#` optional) or `transparent`.
pub fn parse_color(s: &str) -> Result<Rgba<u8>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("transparent") {
        return Ok(TRANSPARENT);
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    let invalid = || BarcoderError::InvalidArgument(format!("invalid color '{}'", s));
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return Err(invalid());
    }

    let mut out = [255u8; 4];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(chunk).map_err(|_| invalid())?;
        out[i] = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
    }
    Ok(Rgba(out))
}

/// Render, compose and encode a barcode.
pub fn generate(req: &GenerateRequest) -> Result<GeneratedImage> {
    let symbology = Symbology::from_str(&req.format)
        .ok_or_else(|| BarcoderError::UnknownSymbology(req.format.clone()))?;
    let background = match &req.background {
        Some(color) => parse_color(color)?,
        None => WHITE,
    };
    let mode = req.scale_mode();

    debug!(
        format = symbology.as_str(),
        width = req.width,
        height = req.height,
        mode = mode.as_str(),
        output = ?req.output,
        "Generating barcode"
    );

    let options = RenderOptions {
        width: req.width,
        height: req.height,
        margin: req.margin,
    };
    let symbol = barcode::render_symbol(&req.content, symbology, &options)?;
    let composed = canvas::compose(&symbol, req.width, req.height, mode, background)?;

    match req.output {
        OutputKind::Png => Ok(GeneratedImage {
            content_type: "image/png",
            width: req.width,
            height: req.height,
            bytes: encode_png(&composed)?,
        }),
        OutputKind::Bitonal => {
            let mono = dither::to_bitonal(&composed, req.dither)?;
            Ok(GeneratedImage {
                content_type: "image/png",
                width: req.width,
                height: req.height,
                bytes: encode_bitonal_png(&mono)?,
            })
        }
        OutputKind::Raw => {
            let mono = dither::to_bitonal(&composed, req.dither)?;
            Ok(GeneratedImage {
                content_type: "application/octet-stream",
                width: req.width,
                height: req.height,
                bytes: mono.into_bytes(),
            })
        }
    }
}

/// Encode an RGBA raster as PNG.
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>> {
    let img = DynamicImage::ImageRgba8(raster.to_rgba_image());
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| BarcoderError::Image(format!("PNG encoding failed: {}", e)))?;
    Ok(png_bytes)
}

/// Encode a bitonal buffer as a black-on-white grayscale PNG.
pub fn encode_bitonal_png(mono: &BitonalBuffer) -> Result<Vec<u8>> {
    let img = mono.to_gray_image();
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| BarcoderError::Image(format!("PNG encoding failed: {}", e)))?;
    Ok(png_bytes)
}
