//! The `@subscribe` directive.

use gqlweave_core::diagnostics::Diagnostics;
use gqlweave_core::error::Result;
use gqlweave_directives::directive::Directive;
use gqlweave_functions::function::{FunctionValue, Invocation, NativeFunction};
use gqlweave_functions::host::Host;
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = super::SUBSCRIBE_DIRECTIVE;
const DEFINITION: &str = "directive @subscribe(to: String) on FIELD_DEFINITION";

/// Builds the `@subscribe` directive.
pub(crate) fn directive(diagnostics: &Diagnostics) -> Result<Directive> {
    let diagnostics = diagnostics.clone();
    let resolver = Arc::new(NativeFunction::with_host(NAME, move |host, invocation| {
        run(&diagnostics, host, &invocation)
    }));
    Directive::new(NAME, DEFINITION, resolver)
}

/// Produces the subscription source for a field.
///
/// Runs once per subscription setup, not per event: the named function
/// is invoked with the field arguments and whatever it produces is
/// handed to the schema layer, which bridges a stream into pull-based
/// iteration. A plain value degrades to a single-emission subscription.
fn run(
    diagnostics: &Diagnostics,
    host: Option<Arc<Host>>,
    invocation: &Invocation,
) -> FunctionValue {
    let Some(host) = host else {
        return FunctionValue::null();
    };
    let Some(to) = invocation.directive_args.get("to").and_then(Value::as_str) else {
        return FunctionValue::null();
    };
    let Some(function) = host.functions().get(to) else {
        diagnostics.error(format!("Could not find \"{to}\" function"));
        return FunctionValue::null();
    };

    let payload = Some(Value::Object(invocation.field_args.clone()));
    let target_host = function.accepts_host().then(|| Arc::clone(&host));
    function.run(target_host, Invocation::payload(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlweave_functions::observable::Observable;
    use serde_json::json;

    fn invocation(to: Option<&str>) -> Invocation {
        let mut invocation = Invocation::default();
        if let Some(to) = to {
            invocation.directive_args.insert("to".to_string(), json!(to));
        }
        invocation
    }

    #[tokio::test]
    async fn test_passes_stream_through() {
        let host = Host::new();
        host.functions()
            .register(Arc::new(NativeFunction::new("events", |_| {
                FunctionValue::Stream(Observable::of([json!("e1"), json!("e2")]))
            })));

        match run(&Diagnostics::default(), Some(host), &invocation(Some("events"))) {
            FunctionValue::Stream(observable) => {
                assert_eq!(
                    observable.collect().await.unwrap(),
                    vec![json!("e1"), json!("e2")]
                );
            }
            other => panic!("expected stream, got {other:?}"),
        }
    }

    #[test]
    fn test_target_receives_field_args() {
        let host = Host::new();
        host.functions()
            .register(Arc::new(NativeFunction::new("events", |call| {
                FunctionValue::Value(call.current.unwrap_or(Value::Null))
            })));

        let mut call = invocation(Some("events"));
        call.field_args.insert("room".to_string(), json!("general"));

        match run(&Diagnostics::default(), Some(host), &call) {
            FunctionValue::Value(value) => {
                assert_eq!(value, json!({"room": "general"}));
            }
            other => panic!("expected immediate value, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_function_degrades_to_null() {
        let (diagnostics, sink) = Diagnostics::memory();
        match run(&diagnostics, Some(Host::new()), &invocation(Some("events"))) {
            FunctionValue::Value(value) => assert_eq!(value, Value::Null),
            other => panic!("expected immediate value, got {other:?}"),
        }
        assert!(sink.contains("Could not find \"events\" function"));
    }

    #[test]
    fn test_missing_to_argument() {
        match run(&Diagnostics::default(), Some(Host::new()), &invocation(None)) {
            FunctionValue::Value(value) => assert_eq!(value, Value::Null),
            other => panic!("expected immediate value, got {other:?}"),
        }
    }
}
