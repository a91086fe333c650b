//! Error types for the gemini-watermark-inpaint crate.

/// Errors raised while loading or validating calibration data.
///
/// These are fatal at engine construction: no engine is produced.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    /// The calibration table contains no entries.
    #[error("calibration table is empty")]
    Empty,

    /// The calibration data is not valid JSON for the expected schema.
    #[error("failed to parse calibration data: {0}")]
    Parse(#[from] serde_json::Error),

    /// An entry carries geometry that cannot describe a watermark region.
    #[error("calibration entry {index} is invalid: {reason}")]
    InvalidEntry {
        /// Position of the entry in the table.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors that can occur during watermark removal and file processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Calibration data could not be loaded.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// The image has zero area or a pixel buffer that does not match its dimensions.
    #[error("invalid image ({width}x{height}): {reason}")]
    InvalidImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Why the image was rejected.
        reason: &'static str,
    },

    /// The input file exceeds the configured size limit.
    #[error("file too large ({size} bytes, limit {limit} bytes)")]
    FileTooLarge {
        /// File size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
