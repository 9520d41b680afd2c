//! Error types for mixbridge-core

use thiserror::Error;

/// Result type alias for mixbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bridge core
#[derive(Debug, Error)]
pub enum Error {
    /// A logical track, plugin, or parameter index is outside the
    /// currently-known state. A miss, not a crash: callers surface it
    /// as "not found" and may retry after another discovery pass.
    #[error("not found: {0}")]
    NotFound(String),

    /// A value payload matched none of the recognized unit keys for the
    /// requested semantic type.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A plugin selection was attempted with no strip selected.
    #[error("no strip selected")]
    NoStripSelected,

    /// Socket-level failure (bind or send)
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// OSC packet encoding failure
    #[error("OSC encode error: {0}")]
    OscEncode(String),
}

impl From<rosc::OscError> for Error {
    fn from(err: rosc::OscError) -> Self {
        Error::OscEncode(err.to_string())
    }
}
