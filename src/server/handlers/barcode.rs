//! Barcode API handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::{
    barcode,
    error::BarcoderError,
    generate::{self, GenerateRequest},
};

use super::super::state::AppState;

/// GET /api/formats - List supported barcode formats.
pub async fn formats() -> Json<Vec<&'static str>> {
    Json(barcode::list_formats())
}

/// GET /api/generate - Generate a barcode from query parameters.
pub async fn generate_get(
    State(state): State<Arc<AppState>>,
    Query(req): Query<GenerateRequest>,
) -> Result<Response, (StatusCode, String)> {
    generate_core(&state, req).await
}

/// POST /api/generate - Generate a barcode from a JSON body.
pub async fn generate_post(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, (StatusCode, String)> {
    generate_core(&state, req).await
}

async fn generate_core(
    state: &AppState,
    req: GenerateRequest,
) -> Result<Response, (StatusCode, String)> {
    if req.content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Content must be provided.".to_string(),
        ));
    }
    if req.width > state.config.max_width || req.height > state.config.max_height {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Canvas {}x{} exceeds the {}x{} limit",
                req.width, req.height, state.config.max_width, state.config.max_height
            ),
        ));
    }
    if req.margin > state.config.max_margin() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Margin {} exceeds the {} module limit",
                req.margin,
                state.config.max_margin()
            ),
        ));
    }

    // Move CPU-intensive work to blocking thread pool
    let image = tokio::task::spawn_blocking(move || generate::generate(&req))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Processing error: {}", e),
            )
        })?
        .map_err(error_response)?;

    let headers = [
        (header::CONTENT_TYPE, image.content_type.to_string()),
        (
            HeaderName::from_static("x-image-width"),
            image.width.to_string(),
        ),
        (
            HeaderName::from_static("x-image-height"),
            image.height.to_string(),
        ),
    ];

    Ok((headers, image.bytes).into_response())
}

/// Map a library error to a status code and plain-text message.
fn error_response(e: BarcoderError) -> (StatusCode, String) {
    if e.is_client_error() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        warn!(error = %e, "Barcode generation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status() {
        let (status, msg) = error_response(BarcoderError::UnknownSymbology("AZTEC".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(msg.contains("AZTEC"));

        let (status, _) = error_response(BarcoderError::Image("boom".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
