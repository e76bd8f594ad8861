//! # Rendering Module
//!
//! Turns rendered symbols into printable output.
//!
//! ## Modules
//!
//! - [`canvas`]: Fit a raster onto a fixed-size canvas (stretch, shrink, none)
//! - [`dither`]: Bayer 16x16 ordered dithering and 1-bit packing
//!
//! ## Usage Example
//!
//! ```
//! use barcoder::raster::{RasterImage, BLACK, WHITE};
//! use barcoder::render::{canvas::{self, ScaleMode}, dither};
//!
//! let src = RasterImage::filled(10, 10, BLACK).unwrap();
//! let label = canvas::compose(&src, 10, 10, ScaleMode::Stretch, WHITE).unwrap();
//! let mono = dither::to_bitonal(&label, true).unwrap();
//!
//! assert_eq!(mono.data().len(), 2 * 10);
//! ```

pub mod canvas;
pub mod dither;
