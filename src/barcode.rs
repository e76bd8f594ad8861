//! # Barcode Symbol Rendering
//!
//! Turns content plus a symbology into a black-on-white [`RasterImage`].
//!
//! Encoding is mostly delegated: the common linear symbologies go through
//! the `barcoders` crate, QR codes through `qrcode`, PDF417 through `pdf417`,
//! and Aztec, Data Matrix and UPC-E through `rxing`. MSI and Plessey are
//! simple enough to encode here. Either way this module only obtains the
//! module pattern and paints the modules as pixels.
//!
//! ## Supported Formats
//!
//! | Name | Kind | Encoder |
//! |------|------|---------|
//! | `AZTEC` | 2D | rxing |
//! | `CODABAR` | 1D | barcoders |
//! | `CODE_39` | 1D | barcoders |
//! | `CODE_93` | 1D | barcoders |
//! | `CODE_128` | 1D | barcoders (character set B) |
//! | `DATA_MATRIX` | 2D | rxing (ECC 200) |
//! | `EAN_8` | 1D | barcoders |
//! | `EAN_13` | 1D | barcoders |
//! | `ITF` | 1D | barcoders (interleaved 2 of 5) |
//! | `MSI` | 1D | built in (no check digit) |
//! | `PDF_417` | 2D stacked | pdf417 |
//! | `PLESSEY` | 1D | built in (CRC-8 check) |
//! | `QR_CODE` | 2D | qrcode |
//! | `UPC_A` | 1D | barcoders (as EAN-13 with a leading 0) |
//! | `UPC_E` | 1D | rxing |
//!
//! ## Sizing
//!
//! The requested width and height are a size hint. Each module is drawn as
//! an integer block of pixels, using the largest block that still fits the
//! hint (never less than one pixel). Linear symbols are drawn as tall as the
//! requested height. The result is usually smaller than the hint; the canvas
//! compositor centers it afterwards.

use std::fmt;

use barcoders::sym::codabar::Codabar;
use barcoders::sym::code39::Code39;
use barcoders::sym::code93::Code93;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::tf::TF;
use qrcode::{EcLevel, QrCode};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use tracing::debug;

use crate::error::{BarcoderError, Result};
use crate::raster::{BLACK, RasterImage, WHITE};

/// Barcode symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbology {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    Msi,
    Pdf417,
    Plessey,
    QrCode,
    UpcA,
    UpcE,
}

const ALL: &[Symbology] = &[
    Symbology::Aztec,
    Symbology::Codabar,
    Symbology::Code39,
    Symbology::Code93,
    Symbology::Code128,
    Symbology::DataMatrix,
    Symbology::Ean8,
    Symbology::Ean13,
    Symbology::Itf,
    Symbology::Msi,
    Symbology::Pdf417,
    Symbology::Plessey,
    Symbology::QrCode,
    Symbology::UpcA,
    Symbology::UpcE,
];

impl Symbology {
    /// All supported symbologies, in listing order.
    pub fn all() -> &'static [Symbology] {
        ALL
    }

    /// Canonical upper-case name, e.g. `CODE_128`.
    pub fn as_str(self) -> &'static str {
        match self {
            Symbology::Aztec => "AZTEC",
            Symbology::Codabar => "CODABAR",
            Symbology::Code39 => "CODE_39",
            Symbology::Code93 => "CODE_93",
            Symbology::Code128 => "CODE_128",
            Symbology::DataMatrix => "DATA_MATRIX",
            Symbology::Ean8 => "EAN_8",
            Symbology::Ean13 => "EAN_13",
            Symbology::Itf => "ITF",
            Symbology::Msi => "MSI",
            Symbology::Pdf417 => "PDF_417",
            Symbology::Plessey => "PLESSEY",
            Symbology::QrCode => "QR_CODE",
            Symbology::UpcA => "UPC_A",
            Symbology::UpcE => "UPC_E",
        }
    }

    /// Parse a canonical name, ignoring case.
    pub fn from_str(s: &str) -> Option<Self> {
        ALL.iter()
            .copied()
            .find(|sym| sym.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Whether the symbol is a single row of bars.
    pub fn is_linear(self) -> bool {
        !matches!(
            self,
            Symbology::Aztec | Symbology::DataMatrix | Symbology::QrCode | Symbology::Pdf417
        )
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of all supported symbologies.
pub fn list_formats() -> Vec<&'static str> {
    ALL.iter().map(|s| s.as_str()).collect()
}

/// Size hint and quiet zone for [`render_symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Target width in pixels.
    pub width: usize,
    /// Target height in pixels.
    pub height: usize,
    /// Quiet zone on every side, in modules.
    pub margin: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            margin: 0,
        }
    }
}

/// A grid of dark/light modules as produced by an encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    pub columns: usize,
    pub rows: usize,
    /// Row-major, `true` = dark.
    pub modules: Vec<bool>,
}

impl ModuleGrid {
    fn linear(bars: Vec<u8>) -> Self {
        Self {
            columns: bars.len(),
            rows: 1,
            modules: bars.into_iter().map(|m| m == 1).collect(),
        }
    }

    pub fn is_dark(&self, col: usize, row: usize) -> bool {
        col < self.columns
            && self
                .modules
                .get(row * self.columns + col)
                .copied()
                .unwrap_or(false)
    }
}

/// Encode `content` into its module pattern.
pub fn encode(content: &str, symbology: Symbology) -> Result<ModuleGrid> {
    let fail = |e: &dyn fmt::Debug| {
        BarcoderError::Encode(format!("{} rejected '{}': {:?}", symbology, content, e))
    };

    let grid = match symbology {
        Symbology::Codabar => {
            ModuleGrid::linear(Codabar::new(content).map_err(|e| fail(&e))?.encode())
        }
        Symbology::Code39 => {
            ModuleGrid::linear(Code39::new(content).map_err(|e| fail(&e))?.encode())
        }
        Symbology::Code93 => {
            ModuleGrid::linear(Code93::new(content).map_err(|e| fail(&e))?.encode())
        }
        Symbology::Code128 => {
            // Character set B covers upper/lower case letters, digits and punctuation
            let prefixed = format!("\u{0181}{}", content);
            ModuleGrid::linear(Code128::new(&prefixed).map_err(|e| fail(&e))?.encode())
        }
        Symbology::Ean8 => {
            let digits = strip_check_digit(content, 7)?;
            ModuleGrid::linear(EAN8::new(&digits).map_err(|e| fail(&e))?.encode())
        }
        Symbology::Ean13 => {
            let digits = strip_check_digit(content, 12)?;
            ModuleGrid::linear(EAN13::new(&digits).map_err(|e| fail(&e))?.encode())
        }
        Symbology::UpcA => {
            let digits = strip_check_digit(content, 11)?;
            let ean = format!("0{}", digits);
            ModuleGrid::linear(EAN13::new(&ean).map_err(|e| fail(&e))?.encode())
        }
        Symbology::Itf => {
            ModuleGrid::linear(TF::interleaved(content).map_err(|e| fail(&e))?.encode())
        }
        Symbology::UpcE => encode_rxing(content, BarcodeFormat::UPC_E, true)?,
        Symbology::Msi => encode_msi(content)?,
        Symbology::Plessey => encode_plessey(content)?,
        Symbology::QrCode => encode_qr(content)?,
        Symbology::Pdf417 => encode_pdf417(content)?,
        Symbology::Aztec => encode_rxing(content, BarcodeFormat::AZTEC, false)?,
        Symbology::DataMatrix => encode_rxing(content, BarcodeFormat::DATA_MATRIX, false)?,
    };

    if grid.columns == 0 || grid.rows == 0 {
        return Err(BarcoderError::Encode(format!(
            "{} produced an empty symbol",
            symbology
        )));
    }
    Ok(grid)
}

/// Accept EAN/UPC payloads with or without their trailing check digit.
///
/// Returns the payload without the check digit; the encoder recomputes it.
fn strip_check_digit(content: &str, payload_len: usize) -> Result<String> {
    let content = content.trim();
    if !content.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BarcoderError::Encode(format!(
            "'{}' must contain digits only",
            content
        )));
    }

    if content.len() == payload_len {
        return Ok(content.to_string());
    }
    if content.len() == payload_len + 1 {
        let (payload, check) = content.split_at(payload_len);
        let expected = gtin_check_digit(payload);
        if check.as_bytes()[0] - b'0' != expected {
            return Err(BarcoderError::Encode(format!(
                "check digit of '{}' should be {}",
                content, expected
            )));
        }
        return Ok(payload.to_string());
    }

    Err(BarcoderError::Encode(format!(
        "'{}' must have {} or {} digits",
        content,
        payload_len,
        payload_len + 1
    )))
}

/// GS1 mod-10 check digit: weights 3,1,3,... from the rightmost digit.
fn gtin_check_digit(payload: &str) -> u8 {
    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 0 { d * 3 } else { d }
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// MSI: start bar, four bits per digit (most significant first), stop.
///
/// Bit 1 is a wide bar and narrow space, bit 0 a narrow bar and wide space.
fn encode_msi(content: &str) -> Result<ModuleGrid> {
    const START: &[u8] = &[1, 1, 0];
    const STOP: &[u8] = &[1, 0, 0, 1];

    if content.is_empty() || !content.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BarcoderError::Encode(format!(
            "MSI content '{}' must contain digits only",
            content
        )));
    }

    let mut bars = START.to_vec();
    for digit in content.bytes().map(|b| b - b'0') {
        for shift in (0..4).rev() {
            bars.extend_from_slice(bit_bars(digit >> shift & 1 == 1));
        }
    }
    bars.extend_from_slice(STOP);
    Ok(ModuleGrid::linear(bars))
}

/// Plessey: start nibble, hex digits (least significant bit first), an
/// 8-bit CRC over the data bits, then a termination bar.
fn encode_plessey(content: &str) -> Result<ModuleGrid> {
    const START: [bool; 4] = [true, true, false, true];
    const TERMINATION: &[u8] = &[1, 1];

    let mut data = Vec::with_capacity(content.len() * 4);
    for c in content.chars() {
        let nibble = c.to_digit(16).ok_or_else(|| {
            BarcoderError::Encode(format!(
                "Plessey content '{}' must contain hex digits only",
                content
            ))
        })?;
        data.extend((0..4).map(|shift| nibble >> shift & 1 == 1));
    }
    if data.is_empty() {
        return Err(BarcoderError::Encode("Plessey content is empty".into()));
    }

    let crc = plessey_crc(&data);
    let mut bars = Vec::new();
    for bit in START.iter().chain(&data).chain(&crc) {
        bars.extend_from_slice(bit_bars(*bit));
    }
    bars.extend_from_slice(TERMINATION);
    Ok(ModuleGrid::linear(bars))
}

/// Two-width bit encoding shared by MSI and Plessey.
fn bit_bars(bit: bool) -> &'static [u8] {
    if bit { &[1, 1, 0] } else { &[1, 0, 0] }
}

/// Plessey generator polynomial x^8 + x^7 + x^6 + x^5 + x^3 + 1, highest
/// power first.
const PLESSEY_POLY: [bool; 9] = [true, true, true, true, false, true, false, false, true];

/// Remainder of `bits * x^8` divided by [`PLESSEY_POLY`].
fn plessey_crc(bits: &[bool]) -> [bool; 8] {
    let mut register = bits.to_vec();
    register.extend([false; 8]);
    for i in 0..bits.len() {
        if register[i] {
            for (j, &p) in PLESSEY_POLY.iter().enumerate() {
                register[i + j] ^= p;
            }
        }
    }

    let mut crc = [false; 8];
    crc.copy_from_slice(&register[bits.len()..]);
    crc
}

/// Encode through `rxing` at one pixel per module.
///
/// `rxing` surrounds linear symbols with a quiet zone; for those the middle
/// row is taken and its light edges trimmed, since every linear pattern
/// starts and ends with a bar.
fn encode_rxing(content: &str, format: BarcodeFormat, linear: bool) -> Result<ModuleGrid> {
    let matrix = MultiFormatWriter::default()
        .encode(content, &format, 1, 1)
        .map_err(|e| {
            BarcoderError::Encode(format!("{:?} rejected '{}': {:?}", format, content, e))
        })?;

    let width = matrix.getWidth();
    let height = matrix.getHeight();

    if linear {
        let row: Vec<bool> = (0..width).map(|x| matrix.get(x, height / 2)).collect();
        let first = row.iter().position(|&dark| dark).unwrap_or(0);
        let last = row.iter().rposition(|&dark| dark).map_or(0, |i| i + 1);
        let bars = row[first..last.max(first)].iter().map(|&dark| dark as u8).collect();
        return Ok(ModuleGrid::linear(bars));
    }

    let mut modules = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            modules.push(matrix.get(x, y));
        }
    }
    Ok(ModuleGrid {
        columns: width as usize,
        rows: height as usize,
        modules,
    })
}

fn encode_qr(content: &str) -> Result<ModuleGrid> {
    let code = QrCode::with_error_correction_level(content, EcLevel::L)
        .map_err(|e| BarcoderError::Encode(format!("QR code generation failed: {}", e)))?;

    let size = code.width();
    let mut modules = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            modules.push(code[(x, y)] == qrcode::Color::Dark);
        }
    }

    Ok(ModuleGrid {
        columns: size,
        rows: size,
        modules,
    })
}

/// PDF417 grid sizes tried in order, as (columns, rows).
///
/// A symbol holds at most 928 codewords, so the largest grid stays below that.
const PDF417_LAYOUTS: &[(u8, u8)] = &[
    (4, 10),
    (6, 16),
    (8, 24),
    (10, 32),
    (14, 48),
    (15, 60),
];

/// Height of one PDF417 row, in modules.
const PDF417_ROW_HEIGHT: usize = 3;

fn encode_pdf417(content: &str) -> Result<ModuleGrid> {
    use pdf417::{END_PATTERN, PDF417, PDF417Encoder, START_PATTERN};

    for &(cols, rows) in PDF417_LAYOUTS {
        let mut codewords = vec![0u16; cols as usize * rows as usize];
        let Some((level, filled)) = PDF417Encoder::new(codewords.as_mut_slice(), false)
            .append_ascii(content)
            .fit_seal()
        else {
            continue;
        };

        // start + left row indicator + data columns + right row indicator + end
        let width = START_PATTERN.size() as usize
            + 17
            + cols as usize * 17
            + 17
            + END_PATTERN.size() as usize;
        let height = rows as usize;

        let barcode = PDF417::new(filled, rows, cols, level);
        let bits: Vec<bool> = barcode.bits().take(width * height).collect();
        if bits.len() < width * height {
            return Err(BarcoderError::Encode("PDF417 symbol is truncated".into()));
        }

        // Stretch every row to the conventional 3:1 aspect
        let mut modules = Vec::with_capacity(width * height * PDF417_ROW_HEIGHT);
        for row in bits.chunks(width) {
            for _ in 0..PDF417_ROW_HEIGHT {
                modules.extend_from_slice(row);
            }
        }

        return Ok(ModuleGrid {
            columns: width,
            rows: height * PDF417_ROW_HEIGHT,
            modules,
        });
    }

    Err(BarcoderError::Encode(format!(
        "'{}' does not fit in a PDF417 symbol",
        content
    )))
}

/// Render `content` as an opaque black-on-white RGBA raster.
///
/// ## Errors
///
/// - [`BarcoderError::InvalidArgument`] for blank content, a zero size hint
///   or a quiet zone too large to address
/// - [`BarcoderError::Encode`] if the encoder rejects the content
pub fn render_symbol(
    content: &str,
    symbology: Symbology,
    options: &RenderOptions,
) -> Result<RasterImage> {
    if content.trim().is_empty() {
        return Err(BarcoderError::InvalidArgument(
            "Content must be provided.".to_string(),
        ));
    }
    if options.width == 0 || options.height == 0 {
        return Err(BarcoderError::InvalidArgument(format!(
            "symbol size must be positive, got {}x{}",
            options.width, options.height
        )));
    }

    let grid = encode(content, symbology)?;
    let quiet = options.margin;
    let total_cols = with_quiet_zone(grid.columns, quiet)?;

    let image = if symbology.is_linear() {
        let module = (options.width / total_cols).max(1);
        paint(&grid, module, 1, quiet, options.height)
    } else {
        let total_rows = with_quiet_zone(grid.rows, quiet)?;
        let module = (options.width / total_cols)
            .min(options.height / total_rows)
            .max(1);
        let height = total_rows
            .checked_mul(module)
            .ok_or_else(|| too_large(total_rows, module))?;
        paint(&grid, module, module, quiet, height)
    }?;

    debug!(
        format = symbology.as_str(),
        columns = grid.columns,
        rows = grid.rows,
        width = image.width(),
        height = image.height(),
        "Rendered symbol"
    );

    Ok(image)
}

/// `modules + 2 * quiet`, or `InvalidArgument` on overflow.
fn with_quiet_zone(modules: usize, quiet: usize) -> Result<usize> {
    quiet
        .checked_mul(2)
        .and_then(|q| q.checked_add(modules))
        .ok_or_else(|| {
            BarcoderError::InvalidArgument(format!("margin {} is too large", quiet))
        })
}

fn too_large(modules: usize, module_size: usize) -> BarcoderError {
    BarcoderError::InvalidArgument(format!(
        "{} modules of {} px do not fit in memory",
        modules, module_size
    ))
}

/// Paint `grid` with `module_w x module_h` pixel blocks and a quiet zone of
/// `quiet` modules.
///
/// A one-row grid is repeated down the full `height`; other grids occupy
/// `rows * module_h` pixels plus the vertical quiet zone.
fn paint(
    grid: &ModuleGrid,
    module_w: usize,
    module_h: usize,
    quiet: usize,
    height: usize,
) -> Result<RasterImage> {
    let total_cols = with_quiet_zone(grid.columns, quiet)?;
    let width = total_cols
        .checked_mul(module_w)
        .ok_or_else(|| too_large(total_cols, module_w))?;
    let mut img = RasterImage::filled(width, height.max(1), WHITE)?;

    let linear = grid.rows == 1;
    let offset_x = quiet * module_w;
    let offset_y = if linear { 0 } else { quiet * module_h };

    for y in 0..img.height() {
        let row = if linear {
            0
        } else if y < offset_y {
            continue;
        } else {
            (y - offset_y) / module_h
        };
        if row >= grid.rows {
            continue;
        }

        for col in 0..grid.columns {
            if !grid.is_dark(col, row) {
                continue;
            }
            for dx in 0..module_w {
                img.set_pixel(offset_x + col * module_w + dx, y, BLACK);
            }
        }
    }

    Ok(img)
}
