use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while planning, cropping or storing an image.
#[derive(Debug, Error)]
pub enum FaceCropError {
    /// Bad dimensions, face box or crop policy.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The input bytes are not a readable PNG or JPEG.
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    /// The file extension maps to no supported output encoding.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The face detection backend failed outright.
    #[error("face detector failed: {0}")]
    DetectorError(String),

    /// Encoding the cropped image failed.
    #[error("failed to encode image: {0}")]
    EncodeError(String),

    /// Reading or writing a file or folder failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation was working on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The output side length is zero.
    #[error("output size must be > 0")]
    InvalidOutputSize,

    /// JPEG quality outside `1..=100`.
    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    /// The thread pool for a parallel run could not be built.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl FaceCropError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
