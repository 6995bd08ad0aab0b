//! Error types for vistra.

use thiserror::Error;

/// The main error type for vistra operations.
#[derive(Error, Debug)]
pub enum VistraError {
    /// Vistra has not been initialized.
    #[error("vistra not initialized - call vistra::init() first")]
    NotInitialized,

    /// Vistra has already been initialized.
    #[error("vistra already initialized")]
    AlreadyInitialized,

    /// The requested Jupyter display backend name is not recognized.
    #[error("invalid Jupyter plotting backend '{0}' - use one of: ipyvtklink, panel, ipygany, static, pythreejs, client, server, trame, none")]
    InvalidBackendName(String),

    /// An optional display module required by the requested backend is not available.
    #[error("the '{0}' module is required for this backend and is not available")]
    MissingModule(String),

    /// The observer is already attached to an engine object.
    #[error("observer is already attached to an engine object - detach it first")]
    AlreadyObserving,

    /// No warning or error has been captured by the observer.
    #[error("no event has been captured by this observer")]
    NoEventCaptured,

    /// The engine reported an error during a processing call.
    #[error("engine error: {0}")]
    EngineError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for vistra operations.
pub type Result<T> = std::result::Result<T, VistraError>;
