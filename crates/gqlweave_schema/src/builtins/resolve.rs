//! The `@resolve` directive.

use gqlweave_core::diagnostics::Diagnostics;
use gqlweave_core::error::Result;
use gqlweave_directives::directive::Directive;
use gqlweave_functions::function::{FunctionValue, Invocation, NativeFunction};
use gqlweave_functions::host::Host;
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = "resolve";
const DEFINITION: &str = "directive @resolve(to: String) on FIELD_DEFINITION";

/// Builds the `@resolve` directive.
pub(crate) fn directive(diagnostics: &Diagnostics) -> Result<Directive> {
    let diagnostics = diagnostics.clone();
    let resolver = Arc::new(NativeFunction::with_host(NAME, move |host, invocation| {
        FunctionValue::future(run(diagnostics.clone(), host, invocation))
    }));
    Directive::new(NAME, DEFINITION, resolver)
}

/// Delegates the field to the function named by the `to` argument.
///
/// The target receives the chain's current value when one exists, else
/// the field arguments. A stream result settles per the field's
/// declared type: every emitted value for a list field, the first one
/// otherwise. Failures degrade to null.
async fn run(
    diagnostics: Diagnostics,
    host: Option<Arc<Host>>,
    invocation: Invocation,
) -> gqlweave_core::error::Result<Value> {
    let Some(host) = host else {
        return Ok(Value::Null);
    };
    let Some(to) = invocation
        .directive_args
        .get("to")
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return Ok(Value::Null);
    };
    let Some(function) = host.functions().get(&to) else {
        diagnostics.error(format!("Could not find \"{to}\" function"));
        return Ok(Value::Null);
    };

    let payload = invocation.current.clone().or_else(|| {
        (!invocation.field_args.is_empty())
            .then(|| Value::Object(invocation.field_args.clone()))
    });
    let target_host = function.accepts_host().then(|| Arc::clone(&host));
    let produced = function.run(target_host, Invocation::payload(payload));

    let list = invocation.field.as_ref().is_some_and(|field| field.list);
    let settled = match produced {
        FunctionValue::Value(value) => Ok(value),
        FunctionValue::Future(future) => future.await,
        FunctionValue::Stream(observable) if list => {
            observable.collect().await.map(Value::Array)
        }
        FunctionValue::Stream(observable) => observable
            .first()
            .await
            .map(|first| first.unwrap_or(Value::Null)),
    };
    match settled {
        Ok(value) => Ok(flatten(value)),
        Err(error) => {
            diagnostics.error(format!("Could not run \"{to}\" function: {error}"));
            Ok(Value::Null)
        }
    }
}

/// Renders objects as JSON text so scalar-typed fields stay readable.
fn flatten(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(flatten).collect()),
        Value::Object(_) => Value::String(serde_json::to_string(&value).unwrap_or_default()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlweave_functions::function::FieldContext;
    use gqlweave_functions::observable::Observable;
    use serde_json::json;

    fn invocation(to: &str, list: bool) -> Invocation {
        let mut invocation = Invocation::default();
        invocation.directive_args.insert("to".to_string(), json!(to));
        invocation.field = Some(FieldContext {
            type_name: "Query".to_string(),
            field_name: "f".to_string(),
            list,
            directive: Some(NAME.to_string()),
        });
        invocation
    }

    fn host_with(name: &str, function: impl Fn(Invocation) -> FunctionValue + Send + Sync + 'static) -> Arc<Host> {
        let host = Host::new();
        host.functions()
            .register(Arc::new(NativeFunction::new(name, function)));
        host
    }

    #[tokio::test]
    async fn test_delegates_to_registered_function() {
        let host = host_with("fn", |_| FunctionValue::Value(json!("bar")));
        let value = run(Diagnostics::default(), Some(host), invocation("fn", false))
            .await
            .unwrap();
        assert_eq!(value, json!("bar"));
    }

    #[tokio::test]
    async fn test_unknown_function_degrades_to_null() {
        let (diagnostics, sink) = Diagnostics::memory();
        let value = run(diagnostics, Some(Host::new()), invocation("fn", false))
            .await
            .unwrap();

        assert_eq!(value, Value::Null);
        assert!(sink.contains("Could not find \"fn\" function"));
    }

    #[tokio::test]
    async fn test_stream_on_list_field_collects_all() {
        let host = host_with("fn", |_| {
            FunctionValue::Stream(Observable::of([json!(1), json!(2), json!(3)]))
        });
        let value = run(Diagnostics::default(), Some(host), invocation("fn", true))
            .await
            .unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_stream_on_scalar_field_takes_first() {
        let host = host_with("fn", |_| {
            FunctionValue::Stream(Observable::of([json!(1), json!(2), json!(3)]))
        });
        let value = run(Diagnostics::default(), Some(host), invocation("fn", false))
            .await
            .unwrap();
        assert_eq!(value, json!(1));
    }

    #[tokio::test]
    async fn test_failing_function_degrades_to_null() {
        let host = host_with("fn", |_| {
            FunctionValue::future(async {
                Err(gqlweave_core::error::Error::Function("boom".to_string()))
            })
        });
        let (diagnostics, sink) = Diagnostics::memory();
        let value = run(diagnostics, Some(host), invocation("fn", false))
            .await
            .unwrap();

        assert_eq!(value, Value::Null);
        assert!(sink.contains("Could not run \"fn\" function"));
    }

    #[tokio::test]
    async fn test_current_value_wins_over_field_args() {
        let host = host_with("fn", |call| {
            FunctionValue::Value(call.current.unwrap_or(Value::Null))
        });
        let mut call = invocation("fn", false);
        call.current = Some(json!("piped"));
        call.field_args.insert("ignored".to_string(), json!(true));

        let value = run(Diagnostics::default(), Some(host), call).await.unwrap();
        assert_eq!(value, json!("piped"));
    }

    #[tokio::test]
    async fn test_object_results_are_stringified() {
        let host = host_with("fn", |_| {
            FunctionValue::Value(json!({"id": 1}))
        });
        let value = run(Diagnostics::default(), Some(host), invocation("fn", false))
            .await
            .unwrap();
        assert_eq!(value, json!("{\"id\":1}"));
    }
}
