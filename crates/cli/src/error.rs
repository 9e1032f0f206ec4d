//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: GL helper error (bad texture config, undecodable image)
//! - 11: I/O error (unreadable manifest or image)
//! - 12: input error (invalid manifest)
//! - 13: serialization error

use glforge_core::GlError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
pub enum CliError {
    /// A library-level error that is not about I/O or manifest content.
    Gl(GlError),
    /// A file could not be read.
    Io(String),
    /// The manifest was malformed or failed validation.
    Input(String),
    /// JSON output could not be produced.
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Gl(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Gl(e) => write!(f, "{e}"),
            CliError::Io(msg) | CliError::Input(msg) | CliError::Serialization(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

impl From<GlError> for CliError {
    fn from(e: GlError) -> Self {
        match e {
            GlError::Io(msg) => CliError::Io(msg),
            GlError::Manifest(msg) => CliError::Input(msg),
            other => CliError::Gl(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
