//! Application errors.

use thiserror::Error;

/// Errors surfaced by the interactive application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Console or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be encoded or decoded.
    #[error("Malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard input closed while an answer was expected.
    #[error("Input closed before an answer was given")]
    InputClosed,
}
