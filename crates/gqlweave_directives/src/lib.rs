//! Directive registry and discovery for gqlweave.
//!
//! This crate defines the directive data model and the controller that
//! aggregates directives from plugins and configuration:
//! - `directive`: The `Directive` data holder
//! - `controller`: The `DirectiveController` registry
//! - `plugin`: Plugin-contributed directives

pub mod controller;
pub mod directive;
pub mod plugin;

pub use controller::DirectiveController;
pub use directive::Directive;
pub use plugin::{Plugin, PluginHub};
