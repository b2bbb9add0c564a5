//! Error types for the lighting prefilter

use thiserror::Error;

/// Result type for prefilter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while filtering an environment
#[derive(Error, Debug)]
pub enum Error {
    /// Input does not have six square faces
    #[error("Not a cubemap: {width}x{height} with {faces} face(s)")]
    NotACubemap { width: u32, height: u32, faces: u32 },

    /// Destination face size must be at least one texel
    #[error("Invalid face size: {0}")]
    InvalidFaceSize(u32),

    /// Output buffer allocation failed
    #[error("Out of memory: failed to reserve {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Strip decoding or encoding failed
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Strip dimensions do not describe six stacked faces
    #[error("Invalid strip layout: {width}x{height}")]
    InvalidStrip { width: u32, height: u32 },
}
