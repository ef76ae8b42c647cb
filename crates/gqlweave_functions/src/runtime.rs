//! Runtime interface for functions executed outside the engine.
//!
//! Runtimes are external collaborators: the engine only needs a way to
//! hand a handler path and a serialized invocation payload to a named
//! runtime and get a [`FunctionValue`] back. Process management lives
//! behind this trait.

use crate::function::FunctionValue;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Executes function handlers for a particular language runtime.
pub trait Runtime: Send + Sync {
    /// The name the runtime is registered under.
    fn name(&self) -> &str;

    /// Executes `handler` with a serialized invocation payload.
    fn exec(&self, handler: &Path, payload: Value) -> FunctionValue;
}

/// Registry of runtimes addressable by name.
///
/// Registration is last-write-wins, like the function registry.
#[derive(Default)]
pub struct RuntimeRegistry {
    runtimes: Mutex<FxHashMap<String, Arc<dyn Runtime>>>,
}

impl RuntimeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a runtime under its own name.
    pub fn register(&self, runtime: Arc<dyn Runtime>) {
        let name = runtime.name().to_string();
        self.lock().insert(name, runtime);
    }

    /// Looks up a runtime by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Runtime>> {
        self.lock().get(name).cloned()
    }

    /// Returns the registered names.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<String, Arc<dyn Runtime>>> {
        match self.runtimes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoRuntime;

    impl Runtime for EchoRuntime {
        fn name(&self) -> &str {
            "echo"
        }

        fn exec(&self, handler: &Path, payload: Value) -> FunctionValue {
            FunctionValue::Value(json!({
                "handler": handler.display().to_string(),
                "payload": payload,
            }))
        }
    }

    #[test]
    fn test_register_and_exec() {
        let registry = RuntimeRegistry::new();
        registry.register(Arc::new(EchoRuntime));

        let runtime = registry.get("echo").unwrap();
        match runtime.exec(Path::new("f.js"), json!({"a": 1})) {
            FunctionValue::Value(value) => {
                assert_eq!(value["handler"], json!("f.js"));
                assert_eq!(value["payload"], json!({"a": 1}));
            }
            other => panic!("expected immediate value, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_runtime() {
        let registry = RuntimeRegistry::new();
        assert!(registry.get("node").is_none());
    }
}
