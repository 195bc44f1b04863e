//! Error types for voxdraw

use thiserror::Error;

/// Result type alias using voxdraw's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core voxdraw operations
#[derive(Error, Debug)]
pub enum Error {
    /// Export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
