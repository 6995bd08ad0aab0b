//! vistra: a friendly Rust object model over a native 3D visualization engine.
//!
//! The engine does the heavy lifting (rendering, mesh algorithms, file
//! formats); vistra wraps it with a small, typed surface: process-wide
//! configuration, Jupyter notebook display-backend selection, and a bridge
//! that captures the engine's warning/error event streams as structured
//! records.
//!
//! # Quick Start
//!
//! ```no_run
//! use vistra::*;
//!
//! fn main() -> Result<()> {
//!     // Initialize vistra
//!     init()?;
//!
//!     // Make the trame display stack available and select it
//!     register_display_module("trame")?;
//!     register_display_module("ipywidgets")?;
//!     set_jupyter_backend(Some("trame"))?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Engine diagnostics
//!
//! The engine reports problems through per-object event channels rather than
//! return values. Wrap a block of engine calls in an [`ErrorCatcher`] to
//! collect them, or to fail at the first reported error:
//!
//! ```no_run
//! use vistra::{ErrorCatcher, EventSource, Result};
//!
//! fn process<S: EventSource>(alg: &mut S) -> Result<()> {
//!     let mut catcher = ErrorCatcher::new().with_raise_errors(true);
//!     catcher.run(alg, |_alg| {
//!         // drive the engine here
//!         Ok(())
//!     })
//! }
//! ```

pub mod jupyter;

// Re-export core types
pub use vistra_core::{
    error::{Result, VistraError},
    observers::{
        ErrorCatcher, EventCallback, EventChannel, EventKind, EventSource, ObservedEvent, Observer,
    },
    options::{JupyterBackend, Options, TrameOptions},
    state::{with_context, with_context_mut, Context},
};

pub use jupyter::{
    jupyter_backend, launch_jupyter_server, register_display_module, set_jupyter_backend,
    validate_jupyter_backend,
};

/// Initializes vistra with default settings.
///
/// This must be called before any other vistra functions.
pub fn init() -> Result<()> {
    let _ = env_logger::try_init();
    vistra_core::state::init_context()?;
    log::info!("vistra initialized");
    Ok(())
}

/// Returns whether vistra has been initialized.
pub fn is_initialized() -> bool {
    vistra_core::state::is_initialized()
}

/// Shuts down vistra and clears all global state.
pub fn shutdown() {
    vistra_core::state::shutdown_context();
    log::info!("vistra shut down");
}
