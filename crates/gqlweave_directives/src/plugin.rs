//! Plugin-contributed directives.
//!
//! The plugin system itself is an external collaborator; the engine
//! only needs a registration stream to observe. [`PluginHub`] is that
//! stream: subscribers see every plugin registered before they
//! subscribed, then every later registration, in order.

use crate::directive::Directive;
use gqlweave_core::error::Result;
use gqlweave_functions::host::Host;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// A plugin that can contribute directives to the engine.
pub trait Plugin: Send + Sync {
    /// The plugin name, used in loading-error messages.
    fn name(&self) -> &str;

    /// The directives contributed by this plugin.
    ///
    /// A failing contribution is recorded as a loading error by the
    /// controller and does not abort discovery.
    fn directives(&self, host: &Arc<Host>) -> Result<Vec<Directive>> {
        let _ = host;
        Ok(Vec::new())
    }
}

type PluginCallback = Box<dyn Fn(&Arc<dyn Plugin>) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    plugins: Vec<Arc<dyn Plugin>>,
    subscribers: Vec<PluginCallback>,
}

/// Replay-then-live registry of plugins.
#[derive(Default)]
pub struct PluginHub {
    inner: Mutex<HubInner>,
}

impl PluginHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin and notifies every subscriber.
    pub fn register(&self, plugin: Arc<dyn Plugin>) {
        let mut inner = self.lock();
        for subscriber in &inner.subscribers {
            subscriber(&plugin);
        }
        inner.plugins.push(plugin);
    }

    /// Subscribes to plugin registrations.
    ///
    /// Already-registered plugins are replayed to the callback before it
    /// starts receiving live registrations.
    pub fn subscribe(&self, callback: PluginCallback) {
        let mut inner = self.lock();
        for plugin in &inner.plugins {
            callback(plugin);
        }
        inner.subscribers.push(callback);
    }

    /// Returns the registered plugins.
    pub fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.lock().plugins.clone()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for PluginHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .plugins()
            .iter()
            .map(|plugin| plugin.name().to_string())
            .collect();
        f.debug_struct("PluginHub").field("plugins", &names).finish()
    }
}
