//! Error types for glforge.

use thiserror::Error;

use crate::shader::ShaderError;

/// Errors produced by texture, framebuffer, mesh, context and manifest operations.
#[derive(Debug, Error)]
pub enum GlError {
    /// A shader stage failed to load, compile or link.
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// Width or height was zero.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A texture configuration was rejected before reaching the driver.
    #[error("invalid texture config: {0}")]
    InvalidTexture(String),

    /// The driver refused to create an object.
    #[error("driver error: {0}")]
    Driver(String),

    /// A framebuffer did not pass the completeness check.
    #[error("framebuffer incomplete: status 0x{0:04X}")]
    IncompleteFramebuffer(u32),

    /// An element count does not fit in the driver's signed 32-bit count type.
    #[error("{what} count {count} exceeds the driver limit")]
    CountOverflow { what: &'static str, count: usize },

    /// The current context cannot run the requested feature.
    #[error("unsupported by this context: {0}")]
    Unsupported(String),

    /// An image could not be decoded.
    #[error("image error: {0}")]
    Image(String),

    /// A file could not be read.
    #[error("I/O error: {0}")]
    Io(String),

    /// A manifest could not be parsed or failed validation.
    #[error("invalid manifest: {0}")]
    Manifest(String),
}
