//! The function capability resolving directive and field values.
//!
//! A [`Function`] produces a value in one of three execution models: an
//! immediately available value, a single value computed asynchronously,
//! or a stream of values delivered over time. The schema layer settles
//! whichever model it receives into the single value field resolution
//! expects.

use crate::host::Host;
use crate::observable::Observable;
use gqlweave_core::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Named arguments extracted from a directive usage or a field
/// invocation.
pub type Args = serde_json::Map<String, Value>;

/// Future type for asynchronously produced values.
pub type ValueFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'static>>;

/// The value produced by running a [`Function`].
pub enum FunctionValue {
    /// An immediately available value.
    Value(Value),
    /// A single value produced asynchronously.
    Future(ValueFuture),
    /// A stream of values delivered over time.
    Stream(Observable),
}

impl FunctionValue {
    /// An immediately available null value.
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// Wraps a future producing a single value.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::Future(Box::pin(future))
    }
}

impl From<Value> for FunctionValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Future(_) => f.write_str("Future(..)"),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Information about the field a directive resolver is attached to.
#[derive(Debug, Clone, Serialize)]
pub struct FieldContext {
    /// Name of the type owning the field.
    pub type_name: String,
    /// Name of the field being resolved.
    pub field_name: String,
    /// Whether the field's declared type is a list type.
    pub list: bool,
    /// Name of the directive usage that triggered this invocation.
    pub directive: Option<String>,
}

/// A single function invocation.
///
/// Directive resolvers receive the directive usage arguments, the field
/// arguments, and the value produced by the previous resolver in the
/// field's chain. Functions invoked directly, such as the target of a
/// registry lookup, receive their payload through `current`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Invocation {
    /// Literal arguments of the directive usage.
    pub directive_args: Args,
    /// Arguments supplied to the field by the query.
    pub field_args: Args,
    /// The value produced by the previous resolver in the chain, or the
    /// payload of a direct invocation.
    pub current: Option<Value>,
    /// The field the invocation resolves, when known.
    pub field: Option<FieldContext>,
}

impl Invocation {
    /// An invocation carrying a single payload value.
    pub fn payload(value: Option<Value>) -> Self {
        Self {
            current: value,
            ..Self::default()
        }
    }
}

/// An invocable unit that resolves directive and field values.
pub trait Function: Send + Sync {
    /// The name the function is registered under.
    fn name(&self) -> &str;

    /// Whether the host handle may be passed to [`Function::run`].
    ///
    /// Functions that cross a process or isolation boundary must not
    /// receive the host; the handle does not survive serialization.
    fn accepts_host(&self) -> bool {
        false
    }

    /// Runs the function.
    ///
    /// `host` is `Some` only when [`Function::accepts_host`] returns
    /// true.
    fn run(&self, host: Option<Arc<Host>>, invocation: Invocation) -> FunctionValue;
}

/// An in-process function backed by a closure.
pub struct NativeFunction {
    name: String,
    accepts_host: bool,
    func: Box<dyn Fn(Option<Arc<Host>>, Invocation) -> FunctionValue + Send + Sync>,
}

impl NativeFunction {
    /// Creates a function that never receives the host handle.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Invocation) -> FunctionValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            accepts_host: false,
            func: Box::new(move |_, invocation| func(invocation)),
        }
    }

    /// Creates a function that receives the host handle when run.
    pub fn with_host<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<Arc<Host>>, Invocation) -> FunctionValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            accepts_host: true,
            func: Box::new(func),
        }
    }
}

impl Function for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts_host(&self) -> bool {
        self.accepts_host
    }

    fn run(&self, host: Option<Arc<Host>>, invocation: Invocation) -> FunctionValue {
        (self.func)(host, invocation)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("accepts_host", &self.accepts_host)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_native_function_runs_closure() {
        let function = NativeFunction::new("double", |invocation| {
            let input = invocation
                .current
                .and_then(|value| value.as_i64())
                .unwrap_or(0);
            FunctionValue::Value(json!(input * 2))
        });

        assert_eq!(function.name(), "double");
        assert!(!function.accepts_host());

        let produced = function.run(None, Invocation::payload(Some(json!(21))));
        match produced {
            FunctionValue::Value(value) => assert_eq!(value, json!(42)),
            other => panic!("expected immediate value, got {other:?}"),
        }
    }

    #[test]
    fn test_with_host_sets_capability() {
        let function = NativeFunction::with_host("needs-host", |host, _| {
            FunctionValue::Value(json!(host.is_some()))
        });

        assert!(function.accepts_host());
    }

    #[tokio::test]
    async fn test_future_value_settles() {
        let function = NativeFunction::new("later", |_| {
            FunctionValue::future(async { Ok(json!("done")) })
        });

        match function.run(None, Invocation::default()) {
            FunctionValue::Future(future) => {
                assert_eq!(future.await.unwrap(), json!("done"));
            }
            other => panic!("expected future, got {other:?}"),
        }
    }

    #[test]
    fn test_invocation_payload() {
        let invocation = Invocation::payload(Some(json!({"id": 1})));
        assert_eq!(invocation.current, Some(json!({"id": 1})));
        assert!(invocation.directive_args.is_empty());
        assert!(invocation.field_args.is_empty());
        assert!(invocation.field.is_none());
    }
}
