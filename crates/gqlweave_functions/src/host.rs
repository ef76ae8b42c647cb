//! The ambient engine context.

use crate::registry::FunctionRegistry;
use crate::runtime::RuntimeRegistry;
use std::fmt;
use std::sync::Arc;

/// The owning application handle shared across the engine.
///
/// Holds the function and runtime registries. Host-capable functions
/// receive this handle when run; functions crossing a process boundary
/// never do.
#[derive(Default)]
pub struct Host {
    functions: FunctionRegistry,
    runtimes: RuntimeRegistry,
}

impl Host {
    /// Creates a shared host handle.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The function registry.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// The runtime registry.
    pub fn runtimes(&self) -> &RuntimeRegistry {
        &self.runtimes
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("functions", &self.functions)
            .field("runtimes", &self.runtimes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionValue, NativeFunction};
    use serde_json::json;

    #[test]
    fn test_host_owns_registries() {
        let host = Host::new();
        host.functions()
            .register(Arc::new(NativeFunction::new("f", |_| {
                FunctionValue::Value(json!(1))
            })));

        assert!(host.functions().get("f").is_some());
        assert!(host.runtimes().get("node").is_none());
    }
}
