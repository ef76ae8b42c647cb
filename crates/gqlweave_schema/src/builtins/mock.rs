//! The `@mock` directive.

use gqlweave_core::diagnostics::Diagnostics;
use gqlweave_core::error::Result;
use gqlweave_directives::directive::Directive;
use gqlweave_functions::function::{FunctionValue, Invocation, NativeFunction};
use handlebars::Handlebars;
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = "mock";
const DEFINITION: &str = "directive @mock(with: String) on FIELD_DEFINITION";

/// Builds the `@mock` directive.
pub(crate) fn directive(diagnostics: &Diagnostics) -> Result<Directive> {
    let diagnostics = diagnostics.clone();
    let resolver = Arc::new(NativeFunction::new(NAME, move |invocation| {
        FunctionValue::Value(run(&diagnostics, &invocation))
    }));
    Directive::new(NAME, DEFINITION, resolver)
}

/// Returns the already-resolved value if one exists, else the `with`
/// argument rendered against the field arguments, else null.
fn run(diagnostics: &Diagnostics, invocation: &Invocation) -> Value {
    if let Some(current) = &invocation.current {
        return current.clone();
    }
    let Some(with) = invocation
        .directive_args
        .get("with")
        .and_then(Value::as_str)
    else {
        return Value::Null;
    };
    if invocation.field_args.is_empty() {
        return Value::String(with.to_string());
    }
    match Handlebars::new().render_template(with, &invocation.field_args) {
        Ok(rendered) => Value::String(rendered),
        Err(error) => {
            diagnostics.error(format!("Could not render field template: {error}"));
            Value::Null
        }
    }
}
