//! Function capability for gqlweave.
//!
//! This crate provides the invocable units the engine wires into
//! schemas, and the infrastructure around them:
//! - `function`: The `Function` trait and its value/invocation types
//! - `lib_function`: Functions delegated to an external runtime
//! - `registry`: Name-keyed function registry
//! - `runtime`: The runtime interface and registry
//! - `observable`: Push-based value streams
//! - `host`: The ambient engine context

pub mod function;
pub mod host;
pub mod lib_function;
pub mod observable;
pub mod registry;
pub mod runtime;

pub use function::{Args, FieldContext, Function, FunctionValue, Invocation, NativeFunction};
pub use host::Host;
pub use lib_function::LibFunction;
pub use observable::{Emitter, Observable, Signal, SubscriptionHandle};
pub use registry::FunctionRegistry;
pub use runtime::{Runtime, RuntimeRegistry};
