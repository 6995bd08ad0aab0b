//! Jupyter notebook display backend selection.
//!
//! A backend is a named strategy for displaying a 3D scene inside a notebook
//! environment. Selection is table-driven: each entry records the optional
//! display modules the backend needs, its deprecation notice if any, and
//! whether it is served by a background display server.

use vistra_core::error::{Result, VistraError};
use vistra_core::options::JupyterBackend;
use vistra_core::state::{try_with_context, try_with_context_mut};

/// Legacy alias accepted for backwards compatibility, mapped to `ipyvtklink`
/// before the allow-list check.
const DEPRECATED_ALIAS: &str = "ipyvtk_simple";

struct BackendEntry {
    token: &'static str,
    backend: JupyterBackend,
    /// Optional display modules that must be available.
    requires: &'static [&'static str],
    /// Deprecation notice, emitted unless a gallery build is in progress.
    deprecation: Option<&'static str>,
}

const BACKENDS: &[BackendEntry] = &[
    BackendEntry {
        token: "ipyvtklink",
        backend: JupyterBackend::IpyVtkLink,
        requires: &["ipyvtklink"],
        deprecation: Some(
            "the 'ipyvtklink' backend is deprecated and has been replaced by the 'trame' backend",
        ),
    },
    BackendEntry {
        token: "panel",
        backend: JupyterBackend::Panel,
        requires: &["panel"],
        deprecation: Some("the 'panel' backend is deprecated and is planned for future removal"),
    },
    BackendEntry {
        token: "ipygany",
        backend: JupyterBackend::IpyGany,
        requires: &["ipygany"],
        deprecation: Some("the 'ipygany' backend is deprecated and is planned for future removal"),
    },
    BackendEntry {
        token: "static",
        backend: JupyterBackend::Static,
        requires: &[],
        deprecation: None,
    },
    BackendEntry {
        token: "pythreejs",
        backend: JupyterBackend::PyThreeJs,
        requires: &["pythreejs"],
        deprecation: Some(
            "the 'pythreejs' backend is deprecated and is planned for future removal",
        ),
    },
    BackendEntry {
        token: "client",
        backend: JupyterBackend::Client,
        requires: &["trame", "ipywidgets"],
        deprecation: None,
    },
    BackendEntry {
        token: "server",
        backend: JupyterBackend::Server,
        requires: &["trame", "ipywidgets"],
        deprecation: None,
    },
    BackendEntry {
        token: "trame",
        backend: JupyterBackend::Trame,
        requires: &["trame", "ipywidgets"],
        deprecation: None,
    },
];

/// Registers an optional display module as available in this process.
///
/// Backend validation resolves per-backend requirements against the set of
/// registered modules.
pub fn register_display_module(name: impl Into<String>) -> Result<()> {
    try_with_context_mut(|ctx| ctx.register_display_module(name.into()))
        .ok_or(VistraError::NotInitialized)
}

/// Validates a Jupyter display backend name.
///
/// Returns the normalized backend, with the `"none"` token (and an absent
/// name) normalized to `None`. Matching is case-insensitive. Fails with
/// [`VistraError::InvalidBackendName`] for names outside the allow-list and
/// with [`VistraError::MissingModule`] when a required optional display
/// module is unavailable; it never silently falls back.
pub fn validate_jupyter_backend(backend: Option<&str>) -> Result<Option<JupyterBackend>> {
    let mut token = backend.unwrap_or("none").to_ascii_lowercase();

    if token == DEPRECATED_ALIAS {
        require_module("ipyvtklink")?;
        token = "ipyvtklink".to_string();
    }

    if token == "none" {
        return Ok(None);
    }

    let entry = BACKENDS
        .iter()
        .find(|entry| entry.token == token)
        .ok_or(VistraError::InvalidBackendName(token))?;

    for module in entry.requires {
        require_module(module)?;
    }

    if let Some(notice) = entry.deprecation {
        let building_gallery =
            try_with_context(|ctx| ctx.options.building_gallery).ok_or(VistraError::NotInitialized)?;
        if !building_gallery {
            log::warn!("{notice}");
        }
    }

    Ok(Some(entry.backend))
}

/// Sets the display backend for Jupyter notebooks.
///
/// Validates the name, stores the normalized value in the global options, and
/// for server-oriented backends launches the background display server named
/// by `Options::trame.jupyter_server_name`. On validation failure the stored
/// backend setting is left unchanged.
pub fn set_jupyter_backend(backend: Option<&str>) -> Result<Option<JupyterBackend>> {
    let validated = validate_jupyter_backend(backend)?;

    try_with_context_mut(|ctx| ctx.options.jupyter_backend = validated)
        .ok_or(VistraError::NotInitialized)?;

    if validated.is_some_and(JupyterBackend::is_server_backed) {
        launch_jupyter_server()?;
    }

    Ok(validated)
}

/// Returns the currently configured Jupyter display backend.
pub fn jupyter_backend() -> Result<Option<JupyterBackend>> {
    try_with_context(|ctx| ctx.options.jupyter_backend).ok_or(VistraError::NotInitialized)
}

/// Launches the background display server if it is not already running.
///
/// The launch registry is keyed by the configured server name, so repeated
/// calls for the same name are no-ops and never create duplicate servers.
pub fn launch_jupyter_server() -> Result<()> {
    let newly_launched = try_with_context_mut(|ctx| {
        let name = ctx.options.trame.jupyter_server_name.clone();
        ctx.mark_server_launched(&name).then_some(name)
    })
    .ok_or(VistraError::NotInitialized)?;

    if let Some(name) = newly_launched {
        log::info!("launched Jupyter display server '{name}'");
    }
    Ok(())
}

fn require_module(name: &str) -> Result<()> {
    let available =
        try_with_context(|ctx| ctx.has_display_module(name)).ok_or(VistraError::NotInitialized)?;
    if available {
        Ok(())
    } else {
        Err(VistraError::MissingModule(name.to_string()))
    }
}
