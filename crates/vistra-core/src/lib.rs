//! Core abstractions for vistra.
//!
//! This crate provides the fundamental types used throughout vistra:
//! - [`VistraError`] and the crate-wide [`Result`] alias
//! - Global state management ([`Context`]) and configuration ([`Options`])
//! - The engine diagnostics bridge ([`Observer`], [`ErrorCatcher`])

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod observers;
pub mod options;
pub mod state;

pub use error::{Result, VistraError};
pub use observers::{
    ErrorCatcher, EventCallback, EventChannel, EventKind, EventSource, ObservedEvent, Observer,
};
pub use options::{JupyterBackend, Options, TrameOptions};
pub use state::{with_context, with_context_mut, Context};
