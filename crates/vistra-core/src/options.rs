//! Configuration options for vistra.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Global configuration options for vistra.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    /// The active Jupyter display backend, or `None` for no notebook display.
    ///
    /// Unset until the selector stores a validated value.
    pub jupyter_backend: Option<JupyterBackend>,

    /// Whether a documentation gallery build is in progress.
    ///
    /// Deprecation notices for legacy backends are suppressed while this is set.
    pub building_gallery: bool,

    /// Options for the trame-based display server.
    pub trame: TrameOptions,
}

impl Options {
    /// Saves the options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Loads options from a JSON file previously written by [`Options::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let options = serde_json::from_reader(BufReader::new(file))?;
        Ok(options)
    }
}

/// Options for the trame-based Jupyter display server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrameOptions {
    /// Name under which the background display server is launched.
    ///
    /// The launch registry is keyed by this name, so repeated launches for
    /// the same name are no-ops.
    pub jupyter_server_name: String,

    /// Whether connections go through a jupyter-server-proxy.
    pub server_proxy_enabled: bool,
}

impl Default for TrameOptions {
    fn default() -> Self {
        Self {
            jupyter_server_name: "vistra-jupyter".to_string(),
            server_proxy_enabled: false,
        }
    }
}

/// A named strategy for displaying a 3D scene inside a notebook environment.
///
/// The `none` token used by the selector is represented as
/// `Option::<JupyterBackend>::None` rather than a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JupyterBackend {
    /// Render remotely and stream images back over ipyvtklink (deprecated).
    IpyVtkLink,
    /// Display through a panel vtkjs pane (deprecated).
    Panel,
    /// Stream meshes for client-side ipygany rendering (deprecated).
    IpyGany,
    /// Display a single static image.
    Static,
    /// Stream meshes for client-side pythreejs rendering (deprecated).
    PyThreeJs,
    /// Serialize the scene for client-side rendering through trame.
    Client,
    /// Render remotely and stream images back through trame.
    Server,
    /// Combined client/server trame backend.
    Trame,
}

impl JupyterBackend {
    /// Returns the canonical lower-case token for this backend.
    pub fn as_token(self) -> &'static str {
        match self {
            Self::IpyVtkLink => "ipyvtklink",
            Self::Panel => "panel",
            Self::IpyGany => "ipygany",
            Self::Static => "static",
            Self::PyThreeJs => "pythreejs",
            Self::Client => "client",
            Self::Server => "server",
            Self::Trame => "trame",
        }
    }

    /// Returns whether this backend is served by a background display server.
    pub fn is_server_backed(self) -> bool {
        matches!(self, Self::Client | Self::Server | Self::Trame)
    }
}

impl std::fmt::Display for JupyterBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}
