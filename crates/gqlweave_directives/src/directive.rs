//! Schema-attachable directives.

use gqlweave_core::error::{Error, Result};
use gqlweave_functions::function::Function;
use std::fmt;
use std::sync::Arc;

type DefinitionFn = dyn Fn() -> Result<String> + Send + Sync;

/// A named schema annotation carrying an SDL declaration and a
/// resolver.
///
/// The name and resolver are fixed at construction. The SDL declaration
/// is computed on demand because some contributors derive it from state
/// that is not available until the schema is actually generated; the
/// computation may fail, and callers read it through the controller's
/// safe accessor rather than propagating the failure.
pub struct Directive {
    name: String,
    definition: Box<DefinitionFn>,
    resolver: Arc<dyn Function>,
}

impl Directive {
    /// Creates a directive with a fixed SDL declaration.
    pub fn new(
        name: impl Into<String>,
        definition: impl Into<String>,
        resolver: Arc<dyn Function>,
    ) -> Result<Self> {
        let definition = definition.into();
        Self::with_definition_fn(name, move || Ok(definition.clone()), resolver)
    }

    /// Creates a directive whose SDL declaration is computed on demand.
    pub fn with_definition_fn<F>(
        name: impl Into<String>,
        definition: F,
        resolver: Arc<dyn Function>,
    ) -> Result<Self>
    where
        F: Fn() -> Result<String> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Directive(
                "directive name must be a non-empty string".to_string(),
            ));
        }
        Ok(Self {
            name,
            definition: Box::new(definition),
            resolver,
        })
    }

    /// The identifying key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The SDL declaration contributed to the schema document.
    pub fn definition(&self) -> Result<String> {
        (self.definition)()
    }

    /// The resolver run for each usage of this directive.
    pub fn resolver(&self) -> &Arc<dyn Function> {
        &self.resolver
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("name", &self.name)
            .field("resolver", &self.resolver.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlweave_functions::function::{FunctionValue, NativeFunction};
    use serde_json::json;

    fn noop_resolver() -> Arc<dyn Function> {
        Arc::new(NativeFunction::new("noop", |_| {
            FunctionValue::Value(json!(null))
        }))
    }

    #[test]
    fn test_new_stores_definition() {
        let directive = Directive::new(
            "mock",
            "directive @mock(with: String) on FIELD_DEFINITION",
            noop_resolver(),
        )
        .unwrap();

        assert_eq!(directive.name(), "mock");
        assert_eq!(
            directive.definition().unwrap(),
            "directive @mock(with: String) on FIELD_DEFINITION"
        );
        assert_eq!(directive.resolver().name(), "noop");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = Directive::new("", "directive @x on FIELD_DEFINITION", noop_resolver());
        assert!(result.is_err());
    }

    #[test]
    fn test_lazy_definition_may_fail() {
        let directive = Directive::with_definition_fn(
            "broken",
            || Err(Error::Directive("definition unavailable".to_string())),
            noop_resolver(),
        )
        .unwrap();

        assert_eq!(directive.name(), "broken");
        assert!(directive.definition().is_err());
    }
}
