//! # HTTP Server for Barcode Generation
//!
//! Exposes the generate pipeline over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! barcoder serve --listen 0.0.0.0:8080
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/api/formats` | JSON array of format names |
//! | GET | `/api/generate?content=...` | PNG or raw bitonal bytes |
//! | POST | `/api/generate` (JSON body) | PNG or raw bitonal bytes |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::get,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::BarcoderError;

/// Build the application router.
pub fn router(config: ServerConfig) -> Router {
    let app_state = Arc::new(AppState::new(config));

    Router::new()
        .route("/api/formats", get(handlers::barcode::formats))
        .route(
            "/api/generate",
            get(handlers::barcode::generate_get).post(handlers::barcode::generate_post),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use barcoder::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), barcoder::error::BarcoderError> {
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), BarcoderError> {
    let listen_addr = config.listen_addr.clone();
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| {
            BarcoderError::Transport(format!("Failed to bind to {}: {}", listen_addr, e))
        })?;

    info!(addr = %listen_addr, "Barcoder HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| BarcoderError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
