//! Error types for jpeg-recompress operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jpeg-recompress operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while searching for a recompression quality.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to load the source image.
    #[error("Image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// The encoder rejected the image or quality level.
    #[error("Encode failed ({codec}) at quality {quality}: {message}")]
    Encode {
        /// Codec identifier.
        codec: String,
        /// Quality level that was requested.
        quality: u8,
        /// Error message from the codec.
        message: String,
    },

    /// The decoder could not read back the encoded bytes.
    #[error("Decode failed ({codec}): {message}")]
    Decode {
        /// Codec identifier.
        codec: String,
        /// Error message from the codec.
        message: String,
    },

    /// Image dimensions don't match between reference and test images.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height).
        expected: (usize, usize),
        /// Actual dimensions (width, height).
        actual: (usize, usize),
    },

    /// Sample statistics need at least two pixels.
    #[error("Image has {pixels} pixel(s); at least 2 are required for sample statistics")]
    TooFewPixels {
        /// Number of pixels in the image.
        pixels: usize,
    },

    /// Search configuration rejected before the search starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
