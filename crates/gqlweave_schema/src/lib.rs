//! Directive-driven executable schema generation.
//!
//! This crate turns an SDL document annotated with custom directives
//! into an executable schema:
//! - `generate`: The schema generator
//! - `builtins`: The built-in `@mock`, `@resolve` and `@subscribe`
//!   directives
//! - `observer`: The push-to-pull bridge consumed by subscription
//!   fields

pub mod builtins;
pub mod generate;
pub mod observer;
mod validate;

pub use builtins::{builtin_directives, SUBSCRIBE_DIRECTIVE};
pub use generate::SchemaGenerator;
pub use observer::{IterStep, StreamObserver};
