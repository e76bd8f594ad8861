//! # Label Pipeline Tests
//!
//! End-to-end checks of the compose → bitonal pipeline and the HTTP API.
//!
//! Pixel expectations are written out as ASCII art where practical:
//! `#` = ink, `.` = paper.

use barcoder::BarcoderError;
use barcoder::barcode::{self, RenderOptions, Symbology};
use barcoder::generate::{GenerateRequest, OutputKind, generate};
use barcoder::raster::{BLACK, PixelFormat, RasterImage, WHITE};
use barcoder::render::canvas::{ScaleMode, compose};
use barcoder::render::dither::{BitonalBuffer, to_bitonal};
use barcoder::server::{ServerConfig, router};
use image::Rgba;
use pretty_assertions::assert_eq;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Render a bitonal buffer as lines of `#` and `.`.
fn ascii(mono: &BitonalBuffer) -> Vec<String> {
    (0..mono.height())
        .map(|y| {
            (0..mono.width())
                .map(|x| if mono.get(x, y) { '#' } else { '.' })
                .collect()
        })
        .collect()
}

fn lines(art: &[&str]) -> Vec<String> {
    art.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn black_source_stretched_to_same_size_is_all_black() {
    let src = RasterImage::filled(10, 10, BLACK).unwrap();
    let out = compose(&src, 10, 10, ScaleMode::Stretch, WHITE).unwrap();

    let mono = to_bitonal(&out, false).unwrap();
    assert_eq!(mono.ink_count(), 100);
}

#[test]
fn small_source_centered_without_scaling() {
    let src = RasterImage::filled(2, 2, BLACK).unwrap();
    let out = compose(&src, 4, 4, ScaleMode::None, WHITE).unwrap();
    let mono = to_bitonal(&out, false).unwrap();

    assert_eq!(ascii(&mono), lines(&["....", ".##.", ".##.", "...."]));
}

#[test]
fn alternating_luminance_packs_to_0xaa() {
    let mut img = RasterImage::filled(8, 1, WHITE).unwrap();
    for x in [0, 2, 4, 6] {
        img.set_pixel(x, 0, BLACK);
    }
    let mono = to_bitonal(&img, false).unwrap();
    assert_eq!(mono.data(), &[0xAA]);
}

#[test]
fn oversized_source_is_cropped_symmetrically() {
    // 6x2 bar pattern: ##..##  into a 4x4 canvas → offset (-1, 1)
    let mut src = RasterImage::filled(6, 2, WHITE).unwrap();
    for y in 0..2 {
        for x in [0, 1, 4, 5] {
            src.set_pixel(x, y, BLACK);
        }
    }
    let out = compose(&src, 4, 4, ScaleMode::None, WHITE).unwrap();
    let mono = to_bitonal(&out, false).unwrap();

    assert_eq!(ascii(&mono), lines(&["....", "#..#", "#..#", "...."]));
}

#[test]
fn shrink_keeps_aspect_and_centers() {
    // 8x2 black into 4x4: scale 0.5 → 4x1 at y = 1.5, snapped to row 2
    let src = RasterImage::filled(8, 2, BLACK).unwrap();
    let out = compose(&src, 4, 4, ScaleMode::Shrink, WHITE).unwrap();
    let mono = to_bitonal(&out, false).unwrap();

    assert_eq!(ascii(&mono), lines(&["....", "....", "####", "...."]));
}

#[test]
fn stretch_distorts_to_fill() {
    let src = RasterImage::filled(8, 2, BLACK).unwrap();
    let out = compose(&src, 4, 4, ScaleMode::Stretch, WHITE).unwrap();
    let mono = to_bitonal(&out, false).unwrap();

    assert_eq!(mono.ink_count(), 16);
}

#[test]
fn dithered_gray_has_halftone_density() {
    let level = 64u8;
    let src = RasterImage::filled(32, 32, Rgba([level, level, level, 255])).unwrap();
    let mono = to_bitonal(&src, true).unwrap();

    // Four full tiles, each inking 255 - L cells
    assert_eq!(mono.ink_count(), 4 * (255 - level as usize));

    let flat = to_bitonal(&src, false).unwrap();
    assert_eq!(flat.ink_count(), 32 * 32);
}

#[test]
fn bgra_padded_input_matches_rgba_input() {
    // Same 3x2 picture in two layouts
    let colors = [
        [10, 200, 30],
        [250, 250, 250],
        [0, 0, 0],
        [128, 128, 128],
        [90, 100, 110],
        [255, 0, 255],
    ];

    let mut rgba = RasterImage::filled(3, 2, WHITE).unwrap();
    let mut bgra_data = vec![0u8; 2 * 20];
    for (i, [r, g, b]) in colors.iter().copied().enumerate() {
        let (x, y) = (i % 3, i / 3);
        rgba.set_pixel(x, y, Rgba([r, g, b, 255]));
        let at = y * 20 + x * 4;
        bgra_data[at..at + 4].copy_from_slice(&[b, g, r, 255]);
    }
    let bgra = RasterImage::new(3, 2, 20, PixelFormat::Bgra8, bgra_data).unwrap();

    for dither in [false, true] {
        assert_eq!(
            to_bitonal(&rgba, dither).unwrap(),
            to_bitonal(&bgra, dither).unwrap()
        );
    }

    let a = compose(&rgba, 5, 5, ScaleMode::None, WHITE).unwrap();
    let b = compose(&bgra, 5, 5, ScaleMode::None, WHITE).unwrap();
    assert_eq!(a, b);
}

#[test]
fn invalid_inputs_fail_without_output() {
    let src = RasterImage::filled(2, 2, BLACK).unwrap();
    assert!(matches!(
        compose(&src, 0, 10, ScaleMode::None, WHITE),
        Err(BarcoderError::InvalidArgument(_))
    ));
    assert!(matches!(
        RasterImage::new(0, 0, 0, PixelFormat::Rgba8, Vec::new()),
        Err(BarcoderError::InvalidArgument(_))
    ));

    let gray = RasterImage::new(2, 2, 2, PixelFormat::Luma8, vec![0; 4]).unwrap();
    assert!(matches!(
        to_bitonal(&gray, true),
        Err(BarcoderError::UnsupportedFormat(_))
    ));
    // The compositor still accepts it, and its output can be dithered
    let composed = compose(&gray, 2, 2, ScaleMode::None, WHITE).unwrap();
    assert_eq!(to_bitonal(&composed, false).unwrap().ink_count(), 4);
}

// ============================================================================
// PIPELINE
// ============================================================================

#[test]
fn rendered_qr_survives_the_pipeline() {
    let options = RenderOptions {
        width: 120,
        height: 120,
        margin: 0,
    };
    let symbol = barcode::render_symbol("barcoder", Symbology::QrCode, &options).unwrap();
    let label = compose(&symbol, 120, 120, ScaleMode::Shrink, WHITE).unwrap();
    let mono = to_bitonal(&label, false).unwrap();

    // Symbol smaller than the canvas: shrink never enlarges, so ink count
    // equals the symbol's own dark pixels
    let symbol_ink = to_bitonal(&symbol, false).unwrap().ink_count();
    assert_eq!(mono.ink_count(), symbol_ink);
    assert!(symbol_ink > 0);
}

#[test]
fn every_format_generates() {
    let samples = [
        ("CODABAR", "A40156B"),
        ("CODE_39", "HELLO"),
        ("CODE_93", "HELLO"),
        ("CODE_128", "Hello, world"),
        ("EAN_8", "9638507"),
        ("EAN_13", "590123412345"),
        ("UPC_A", "036000291452"),
        ("ITF", "12345678"),
        ("QR_CODE", "https://example.com"),
        ("PDF_417", "PDF417"),
        ("AZTEC", "Aztec label"),
        ("DATA_MATRIX", "Data Matrix label"),
        ("UPC_E", "0123456"),
        ("MSI", "80523"),
        ("PLESSEY", "01AF"),
    ];
    assert_eq!(samples.len(), barcode::list_formats().len());

    for (format, content) in samples {
        let mut req = GenerateRequest::new(content);
        req.format = format.to_string();
        req.width = 300;
        req.height = 100;
        req.output = OutputKind::Raw;
        req.margin = 2;

        let out = generate(&req).unwrap_or_else(|e| panic!("{} failed: {}", format, e));
        assert_eq!(out.bytes.len(), 300usize.div_ceil(8) * 100, "{}", format);
        assert!(out.bytes.iter().any(|&b| b != 0), "{} has no ink", format);
    }
}

// ============================================================================
// HTTP API
// ============================================================================

mod http {
    use super::*;
    use pretty_assertions::assert_eq;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    async fn call(request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = router(ServerConfig::default())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn formats_lists_every_symbology() {
        let (status, _, body) = call(
            Request::get("/api/formats").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(names.len(), Symbology::all().len());
        assert!(names.iter().any(|n| n == "PDF_417"));
        assert!(names.iter().any(|n| n == "AZTEC"));
    }

    #[tokio::test]
    async fn generate_get_returns_png() {
        let (status, content_type, body) = call(
            Request::get("/api/generate?content=HELLO&format=code_39&width=300&height=80")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));

        let img = image::load_from_memory(&body).unwrap();
        assert_eq!((img.width(), img.height()), (300, 80));
    }

    #[tokio::test]
    async fn generate_post_returns_raw_bits() {
        let body = serde_json::json!({
            "content": "42",
            "format": "QR_CODE",
            "width": 64,
            "height": 64,
            "output": "raw",
            "dither": true
        });
        let (status, content_type, bytes) = call(
            Request::post("/api/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(bytes.len(), 8 * 64);
    }

    #[tokio::test]
    async fn generate_rejects_bad_requests() {
        let cases = [
            "/api/generate?content=%20",
            "/api/generate?content=abc&format=MAXICODE",
            "/api/generate?content=abc&width=0",
            "/api/generate?content=abc&width=100000",
            "/api/generate?content=x&format=QR_CODE&margin=100000",
            "/api/generate?content=x&format=QR_CODE&margin=18446744073709551615",
        ];
        for uri in cases {
            let (status, _, _) = call(Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        }
    }
}
