//! Error types for resurrect-core

use thiserror::Error;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for resurrect-core
#[derive(Error, Debug)]
pub enum Error {
    /// A save was requested for a value that is neither workspace-,
    /// window-, nor tab-shaped.
    #[error("state shape is neither workspace, window, nor tab")]
    UnknownStateType,

    /// A save target has no workspace name or title to derive a file name from.
    #[error("cannot derive a file name: {0}")]
    NameUnresolved(String),

    /// JSON encode/decode failed.
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File open/read/write/remove failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Load succeeded but the structure is unusable (e.g. empty window list).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The `current_state` file names a state type we do not recognize.
    #[error("current_state file is corrupt: {0}")]
    CorruptCurrentState(String),

    /// A host multiplexer operation failed.
    #[error("mux error: {0}")]
    Mux(String),
}

impl Error {
    /// Shorthand for host-operation failures at the adapter boundary.
    pub fn mux(message: impl Into<String>) -> Self {
        Self::Mux(message.into())
    }
}
