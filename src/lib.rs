//! # Barcoder - Barcode Images for Label Printers
//!
//! Barcoder renders barcodes and fits them onto fixed-size label canvases.
//! It provides:
//!
//! - **Symbol rendering**: Code 128, Code 39, EAN, QR, PDF417 and more,
//!   encoded by established crates and painted as pixels
//! - **Canvas compositing**: stretch, shrink-to-fit or 1:1 placement on a
//!   canvas of exactly the requested size
//! - **Bitonal output**: 1-bit packed buffers with optional Bayer 16x16
//!   ordered dithering, for thermal and label printers
//! - **HTTP server**: a small API returning PNG or raw bitonal bytes
//!
//! ## Quick Start
//!
//! ```
//! use barcoder::{
//!     barcode::{render_symbol, RenderOptions, Symbology},
//!     raster::WHITE,
//!     render::{canvas::{compose, ScaleMode}, dither::to_bitonal},
//! };
//!
//! // Render the symbol at roughly 384x120 pixels
//! let options = RenderOptions { width: 384, height: 120, margin: 4 };
//! let symbol = render_symbol("HELLO-42", Symbology::Code128, &options)?;
//!
//! // Place it on a 384x120 label, shrinking if it is too big
//! let label = compose(&symbol, 384, 120, ScaleMode::Shrink, WHITE)?;
//!
//! // Pack for the printer
//! let mono = to_bitonal(&label, false)?;
//! assert_eq!(mono.data().len(), 48 * 120);
//!
//! # Ok::<(), barcoder::error::BarcoderError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`raster`] | Stride-aware pixel buffers |
//! | [`render`] | Canvas compositing and dithering |
//! | [`barcode`] | Symbol encoding and rendering |
//! | [`generate`] | Request-to-image pipeline |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod barcode;
pub mod error;
pub mod generate;
pub mod raster;
pub mod render;
pub mod server;

// Re-exports for convenience
pub use error::BarcoderError;
pub use raster::RasterImage;
pub use render::canvas::ScaleMode;
