//! Global state management for vistra.

use std::collections::BTreeSet;
use std::sync::{OnceLock, RwLock};

use crate::error::{Result, VistraError};
use crate::options::Options;

/// Global context singleton.
static CONTEXT: OnceLock<RwLock<Context>> = OnceLock::new();

/// The global context containing all vistra state.
#[derive(Default)]
pub struct Context {
    /// Whether vistra has been initialized.
    pub initialized: bool,

    /// Global options.
    pub options: Options,

    /// Optional display modules available in this process.
    display_modules: BTreeSet<String>,

    /// Names of background display servers that have been launched.
    launched_servers: BTreeSet<String>,
}

impl Context {
    /// Registers an optional display module as available.
    ///
    /// The backend selector resolves per-backend requirements against this
    /// set; a backend whose module has not been registered fails validation.
    pub fn register_display_module(&mut self, name: impl Into<String>) {
        self.display_modules.insert(name.into());
    }

    /// Returns whether an optional display module is available.
    pub fn has_display_module(&self, name: &str) -> bool {
        self.display_modules.contains(name)
    }

    /// Records a display server launch for `name`.
    ///
    /// Returns `true` if this is the first launch for that name. The registry
    /// is keyed by name, so a second call is a no-op returning `false`.
    pub fn mark_server_launched(&mut self, name: &str) -> bool {
        self.launched_servers.insert(name.to_string())
    }

    /// Returns whether a display server with the given name has been launched.
    pub fn is_server_launched(&self, name: &str) -> bool {
        self.launched_servers.contains(name)
    }

    /// Returns the number of distinct display servers launched so far.
    pub fn launched_server_count(&self) -> usize {
        self.launched_servers.len()
    }
}

/// Initializes the global context.
///
/// This should be called once at the start of the program.
pub fn init_context() -> Result<()> {
    let context = RwLock::new(Context::default());

    CONTEXT
        .set(context)
        .map_err(|_| VistraError::AlreadyInitialized)?;

    with_context_mut(|ctx| {
        ctx.initialized = true;
    });

    Ok(())
}

/// Returns whether the context has been initialized.
pub fn is_initialized() -> bool {
    CONTEXT
        .get()
        .and_then(|lock| lock.read().ok())
        .is_some_and(|ctx| ctx.initialized)
}

/// Access the global context for reading.
///
/// # Panics
///
/// Panics if vistra has not been initialized.
pub fn with_context<F, R>(f: F) -> R
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get().expect("vistra not initialized");
    let guard = lock.read().expect("context lock poisoned");
    f(&guard)
}

/// Access the global context for writing.
///
/// # Panics
///
/// Panics if vistra has not been initialized.
pub fn with_context_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get().expect("vistra not initialized");
    let mut guard = lock.write().expect("context lock poisoned");
    f(&mut guard)
}

/// Try to access the global context for reading.
///
/// Returns `None` if vistra has not been initialized.
pub fn try_with_context<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get()?;
    let guard = lock.read().ok()?;
    Some(f(&guard))
}

/// Try to access the global context for writing.
///
/// Returns `None` if vistra has not been initialized.
pub fn try_with_context_mut<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get()?;
    let mut guard = lock.write().ok()?;
    Some(f(&mut guard))
}

/// Shuts down the global context.
///
/// Note: Due to `OnceLock` semantics, the context cannot be re-initialized
/// after shutdown in the same process.
pub fn shutdown_context() {
    if let Some(lock) = CONTEXT.get() {
        if let Ok(mut ctx) = lock.write() {
            ctx.initialized = false;
            ctx.options = Options::default();
            ctx.display_modules.clear();
            ctx.launched_servers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Context methods are tested directly on a local value; the singleton
    // lifecycle is covered by the integration tests in the vistra crate.

    #[test]
    fn display_module_registry() {
        let mut ctx = Context::default();
        assert!(!ctx.has_display_module("trame"));
        ctx.register_display_module("trame");
        assert!(ctx.has_display_module("trame"));
        assert!(!ctx.has_display_module("panel"));
    }

    #[test]
    fn server_launch_is_recorded_once() {
        let mut ctx = Context::default();
        assert!(ctx.mark_server_launched("vistra-jupyter"));
        assert!(!ctx.mark_server_launched("vistra-jupyter"));
        assert!(ctx.is_server_launched("vistra-jupyter"));
        assert_eq!(ctx.launched_server_count(), 1);

        assert!(ctx.mark_server_launched("other"));
        assert_eq!(ctx.launched_server_count(), 2);
    }
}
