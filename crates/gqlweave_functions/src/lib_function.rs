//! Functions delegated to an external runtime.

use crate::function::{Function, FunctionValue, Invocation};
use crate::host::Host;
use crate::runtime::Runtime;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A function whose handler is executed by a named [`Runtime`].
///
/// Lib functions never receive the host handle: the runtime may run the
/// handler in another process, and the handle does not cross that
/// boundary.
pub struct LibFunction {
    name: String,
    handler: PathBuf,
    runtime: Arc<dyn Runtime>,
}

impl LibFunction {
    /// Creates a function bound to a handler and a runtime.
    pub fn new(
        name: impl Into<String>,
        handler: impl Into<PathBuf>,
        runtime: Arc<dyn Runtime>,
    ) -> Self {
        Self {
            name: name.into(),
            handler: handler.into(),
            runtime,
        }
    }

    /// The handler path executed by the runtime.
    pub fn handler(&self) -> &Path {
        &self.handler
    }

    /// The runtime executing the handler.
    pub fn runtime(&self) -> &Arc<dyn Runtime> {
        &self.runtime
    }
}

impl Function for LibFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, _host: Option<Arc<Host>>, invocation: Invocation) -> FunctionValue {
        let payload = serde_json::to_value(&invocation).unwrap_or(Value::Null);
        self.runtime.exec(&self.handler, payload)
    }
}

impl fmt::Debug for LibFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibFunction")
            .field("name", &self.name)
            .field("handler", &self.handler)
            .field("runtime", &self.runtime.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct PayloadRuntime;

    impl Runtime for PayloadRuntime {
        fn name(&self) -> &str {
            "payload"
        }

        fn exec(&self, _handler: &Path, payload: Value) -> FunctionValue {
            FunctionValue::Value(payload)
        }
    }

    #[test]
    fn test_run_serializes_invocation() {
        let function = LibFunction::new("f", "functions/f.js", Arc::new(PayloadRuntime));
        assert!(!function.accepts_host());

        let mut invocation = Invocation::payload(Some(json!("input")));
        invocation
            .field_args
            .insert("limit".to_string(), json!(10));

        match function.run(None, invocation) {
            FunctionValue::Value(payload) => {
                assert_eq!(payload["current"], json!("input"));
                assert_eq!(payload["field_args"]["limit"], json!(10));
            }
            other => panic!("expected immediate value, got {other:?}"),
        }
    }
}
