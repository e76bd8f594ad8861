//! # Error Types
//!
//! This module defines error types used throughout the barcoder library.

use thiserror::Error;

/// Main error type for barcoder operations
#[derive(Debug, Error)]
pub enum BarcoderError {
    /// Non-positive dimensions, empty buffers, malformed parameters
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Source pixel format lacks the channels an operation needs
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Barcode format name not recognized
    #[error("Unknown barcode format: '{0}'")]
    UnknownSymbology(String),

    /// The symbol encoder rejected the content
    #[error("Encode error: {0}")]
    Encode(String),

    /// Image container encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Server/listener errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BarcoderError {
    /// Whether the error was caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BarcoderError::InvalidArgument(_)
                | BarcoderError::UnsupportedFormat(_)
                | BarcoderError::UnknownSymbology(_)
                | BarcoderError::Encode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BarcoderError>;
