//! Built-in directives with reserved semantics.
//!
//! Every engine ships three directives layered on the generic
//! mechanism: `@mock` resolves a field to a templated constant,
//! `@resolve` delegates a field to a registered function, and
//! `@subscribe` marks a field as a subscription source.

mod mock;
mod resolve;
mod subscribe;

use gqlweave_core::diagnostics::Diagnostics;
use gqlweave_core::error::Result;
use gqlweave_directives::directive::Directive;

/// Name of the reserved subscription marker directive.
pub const SUBSCRIBE_DIRECTIVE: &str = "subscribe";

/// The directives every engine ships with.
pub fn builtin_directives(diagnostics: &Diagnostics) -> Result<Vec<Directive>> {
    Ok(vec![
        mock::directive(diagnostics)?,
        resolve::directive(diagnostics)?,
        subscribe::directive(diagnostics)?,
    ])
}
