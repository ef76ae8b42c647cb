//! Directive registry and discovery.

use crate::directive::Directive;
use crate::plugin::{Plugin, PluginHub};
use gqlweave_core::config::DirectiveConfig;
use gqlweave_core::diagnostics::Diagnostics;
use gqlweave_core::error::Error;
use gqlweave_functions::host::Host;
use gqlweave_functions::lib_function::LibFunction;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Raw configuration block not yet expanded into directives.
struct PendingConfig {
    directives: IndexMap<String, DirectiveConfig>,
    base_path: PathBuf,
}

#[derive(Default)]
struct ControllerState {
    directives: IndexMap<String, Arc<Directive>>,
    loading_errors: Vec<Arc<Error>>,
    pending: Option<PendingConfig>,
    model: Option<PathBuf>,
}

/// Registry of the directives known to a schema-owning context.
///
/// Directives arrive from two sides: plugins observed through a
/// [`PluginHub`], and a raw configuration block expanded lazily on the
/// first directive query. Registration is last-write-wins in both
/// cases. Failures during discovery and expansion never propagate; they
/// accumulate as loading errors and are reported through the injected
/// diagnostics handle.
pub struct DirectiveController {
    host: Arc<Host>,
    diagnostics: Diagnostics,
    state: Mutex<ControllerState>,
}

impl DirectiveController {
    /// Creates a controller owned by `host`.
    pub fn new(host: Arc<Host>, diagnostics: Diagnostics) -> Arc<Self> {
        Arc::new(Self {
            host,
            diagnostics,
            state: Mutex::new(ControllerState::default()),
        })
    }

    /// The host this controller belongs to.
    pub fn host(&self) -> &Arc<Host> {
        &self.host
    }

    /// Subscribes to plugin registrations on `hub`.
    ///
    /// Every plugin contribution is fetched guarded: a failing plugin
    /// becomes a loading error and the remaining plugins still load.
    pub fn watch_plugins(self: &Arc<Self>, hub: &PluginHub) {
        let controller = Arc::clone(self);
        hub.subscribe(Box::new(move |plugin| controller.load_plugin(plugin)));
    }

    fn load_plugin(&self, plugin: &Arc<dyn Plugin>) {
        match plugin.directives(&self.host) {
            Ok(directives) => self.load_directives(directives),
            Err(error) => {
                let error = Error::chain(
                    format!(
                        "Could not load directives from plugin \"{}\"",
                        plugin.name()
                    ),
                    error,
                );
                self.diagnostics.warning(error.to_string());
                self.lock().loading_errors.push(Arc::new(error));
            }
        }
    }

    /// Registers directives, overwriting existing entries with the same
    /// name.
    pub fn load_directives(&self, directives: Vec<Directive>) {
        let mut state = self.lock();
        for directive in directives {
            state
                .directives
                .insert(directive.name().to_string(), Arc::new(directive));
        }
    }

    /// Stores the raw configuration block for lazy expansion.
    ///
    /// Storing has no side effect beyond keeping the block; expansion
    /// runs at most once, on the first directive query afterwards, so
    /// that runtimes registered later than this call still resolve.
    pub fn set_config(
        &self,
        directives: IndexMap<String, DirectiveConfig>,
        base_path: impl Into<PathBuf>,
    ) {
        self.lock().pending = Some(PendingConfig {
            directives,
            base_path: base_path.into(),
        });
    }

    /// Sets the path of the user model SDL document.
    pub fn set_model(&self, model: impl Into<PathBuf>) {
        self.lock().model = Some(model.into());
    }

    /// Reads the model SDL document, if one is configured.
    ///
    /// A read failure becomes a loading error and `None`.
    pub fn model(&self) -> Option<String> {
        let path = self.lock().model.clone()?;
        match std::fs::read_to_string(&path) {
            Ok(model) => Some(model),
            Err(error) => {
                let error = Error::chain(
                    format!("Could not read model document {}", path.display()),
                    error.into(),
                );
                self.diagnostics.warning(error.to_string());
                self.lock().loading_errors.push(Arc::new(error));
                None
            }
        }
    }

    /// Looks up a directive by name.
    pub fn get(&self, name: &str) -> Option<Arc<Directive>> {
        let mut state = self.lock();
        self.expand_pending(&mut state);
        state.directives.get(name).cloned()
    }

    /// Returns all registered directives.
    pub fn directives(&self) -> Vec<Arc<Directive>> {
        let mut state = self.lock();
        self.expand_pending(&mut state);
        state.directives.values().cloned().collect()
    }

    /// Reads a directive's SDL declaration safely.
    ///
    /// A failing declaration becomes a loading error and `None`; the
    /// directive simply contributes no SDL.
    pub fn definition_of(&self, directive: &Directive) -> Option<String> {
        match directive.definition() {
            Ok(definition) => Some(definition),
            Err(error) => {
                let error = Error::chain(
                    format!(
                        "Could not get \"{}\" directive definition",
                        directive.name()
                    ),
                    error,
                );
                self.diagnostics.warning(error.to_string());
                self.lock().loading_errors.push(Arc::new(error));
                None
            }
        }
    }

    /// Errors recorded during discovery and lazy expansion.
    pub fn loading_errors(&self) -> Vec<Arc<Error>> {
        self.lock().loading_errors.clone()
    }

    /// Expands the pending configuration block, once.
    fn expand_pending(&self, state: &mut ControllerState) {
        let Some(pending) = state.pending.take() else {
            return;
        };
        for (name, config) in pending.directives {
            let Some(runtime) = self.host.runtimes().get(&config.resolver.runtime) else {
                let error = Error::Config(format!(
                    "Could not load directive \"{name}\": unknown runtime \"{}\"",
                    config.resolver.runtime
                ));
                self.diagnostics.warning(error.to_string());
                state.loading_errors.push(Arc::new(error));
                continue;
            };
            let handler = if config.resolver.handler.is_absolute() {
                config.resolver.handler.clone()
            } else {
                pending.base_path.join(&config.resolver.handler)
            };
            let resolver = Arc::new(LibFunction::new(name.clone(), handler, runtime));
            match Directive::new(&name, config.definition, resolver) {
                Ok(directive) => {
                    state.directives.insert(name, Arc::new(directive));
                }
                Err(error) => {
                    let error =
                        Error::chain(format!("Could not load directive \"{name}\""), error);
                    self.diagnostics.warning(error.to_string());
                    state.loading_errors.push(Arc::new(error));
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for DirectiveController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("DirectiveController")
            .field("directives", &state.directives.keys().collect::<Vec<_>>())
            .field("loading_errors", &state.loading_errors.len())
            .field("pending", &state.pending.is_some())
            .finish()
    }
}
