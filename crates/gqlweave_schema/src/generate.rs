//! Executable-schema generation.
//!
//! The generator concatenates directive SDL declarations with the user
//! model, parses the result, and walks every type, field and directive
//! usage to attach execution logic. Resolution failures never abort the
//! build: a broken directive degrades to an unresolved field plus a
//! diagnostic, and schema-level validation findings are logged while
//! the schema is still produced.

use crate::builtins::SUBSCRIBE_DIRECTIVE;
use crate::observer::StreamObserver;
use crate::validate;
use async_graphql::dynamic::{
    Enum, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface, InterfaceField,
    Object, ResolverContext, Scalar, Schema, Subscription, SubscriptionField,
    SubscriptionFieldFuture, TypeRef, Union,
};
use async_graphql_parser::parse_schema;
use async_graphql_parser::types::{
    BaseType, ConstDirective, FieldDefinition, InputValueDefinition, ObjectType, ServiceDocument,
    Type, TypeKind, TypeSystemDefinition,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use gqlweave_core::diagnostics::Diagnostics;
use gqlweave_core::error::{Error, Result};
use gqlweave_directives::controller::DirectiveController;
use gqlweave_directives::directive::Directive;
use gqlweave_functions::function::{Args, FieldContext, FunctionValue, Invocation};
use gqlweave_functions::host::Host;
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::sync::Arc;

/// One directive usage resolved against the controller, in declaration
/// order.
struct ChainLink {
    name: String,
    args: Args,
    directive: Arc<Directive>,
}

/// Root operation type names, from the schema definition or the
/// conventional defaults.
struct RootTypes {
    query: String,
    mutation: Option<String>,
    subscription: Option<String>,
}

impl RootTypes {
    fn from_document(document: &ServiceDocument) -> Self {
        let mut roots = Self {
            query: "Query".to_string(),
            mutation: Some("Mutation".to_string()),
            subscription: Some("Subscription".to_string()),
        };
        for definition in &document.definitions {
            if let TypeSystemDefinition::Schema(schema) = definition {
                if let Some(query) = &schema.node.query {
                    roots.query = query.node.to_string();
                }
                if let Some(mutation) = &schema.node.mutation {
                    roots.mutation = Some(mutation.node.to_string());
                }
                if let Some(subscription) = &schema.node.subscription {
                    roots.subscription = Some(subscription.node.to_string());
                }
            }
        }
        roots
    }
}

/// Generates executable schemas from directive declarations and a user
/// model.
pub struct SchemaGenerator {
    host: Arc<Host>,
    diagnostics: Diagnostics,
}

impl SchemaGenerator {
    /// Creates a generator owned by `host`.
    pub fn new(host: Arc<Host>, diagnostics: Diagnostics) -> Self {
        Self { host, diagnostics }
    }

    /// Builds the executable schema.
    ///
    /// SDL is collected from every known directive (through the safe
    /// definition accessor) and from `model`, falling back to the
    /// controller's configured model document. Returns `Ok(None)` when
    /// there is nothing to build from, since a system with no schema is
    /// a valid state, and when the wired schema fails validation, which
    /// is reported but never raised.
    pub fn generate(
        &self,
        directives: Option<&DirectiveController>,
        model: Option<&str>,
    ) -> Result<Option<Schema>> {
        let mut sources = Vec::new();
        if let Some(controller) = directives {
            for directive in controller.directives() {
                if let Some(definition) = controller.definition_of(&directive) {
                    sources.push(definition);
                }
            }
        }
        let model = match model {
            Some(model) => Some(model.to_string()),
            None => directives.and_then(|controller| controller.model()),
        };
        if let Some(model) = model {
            sources.push(model);
        }
        if sources.is_empty() {
            return Ok(None);
        }

        let document = parse_schema(sources.join("\n"))
            .map_err(|error| Error::Schema(format!("could not parse schema document: {error}")))?;

        validate::check_document(&document, &self.diagnostics);

        let roots = RootTypes::from_document(&document);
        let defined: FxHashSet<String> = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                TypeSystemDefinition::Type(ty) => Some(ty.node.name.node.to_string()),
                _ => None,
            })
            .collect();
        let mutation = roots.mutation.filter(|name| defined.contains(name));
        let subscription = roots.subscription.filter(|name| defined.contains(name));

        let mut builder = Schema::build(&roots.query, mutation.as_deref(), subscription.as_deref());
        for definition in &document.definitions {
            let TypeSystemDefinition::Type(ty) = definition else {
                continue;
            };
            let name = ty.node.name.node.to_string();
            match &ty.node.kind {
                TypeKind::Scalar => {
                    if !validate::BUILT_IN_SCALARS.contains(&name.as_str()) {
                        builder = builder.register(Scalar::new(name));
                    }
                }
                TypeKind::Object(object) => {
                    if subscription.as_deref() == Some(name.as_str()) {
                        builder =
                            builder.register(self.build_subscription(&name, object, directives));
                    } else {
                        builder = builder.register(self.build_object(&name, object, directives));
                    }
                }
                TypeKind::Interface(interface) => {
                    let mut built = Interface::new(name);
                    for field in &interface.fields {
                        let mut interface_field = InterfaceField::new(
                            field.node.name.node.to_string(),
                            type_ref(&field.node.ty.node),
                        );
                        for argument in &field.node.arguments {
                            interface_field = interface_field.argument(input_value(&argument.node));
                        }
                        built = built.field(interface_field);
                    }
                    builder = builder.register(built);
                }
                TypeKind::Union(union_type) => {
                    let mut built = Union::new(name);
                    for member in &union_type.members {
                        built = built.possible_type(member.node.to_string());
                    }
                    builder = builder.register(built);
                }
                TypeKind::Enum(enum_type) => {
                    let mut built = Enum::new(name);
                    for value in &enum_type.values {
                        built = built.item(value.node.value.node.to_string());
                    }
                    builder = builder.register(built);
                }
                TypeKind::InputObject(input_object) => {
                    let mut built = InputObject::new(name);
                    for field in &input_object.fields {
                        built = built.field(input_value(&field.node));
                    }
                    builder = builder.register(built);
                }
            }
        }

        match builder.finish() {
            Ok(schema) => Ok(Some(schema)),
            Err(error) => {
                self.diagnostics
                    .error("There were some errors when validating the GraphQL schema:");
                self.diagnostics.error(error.to_string());
                Ok(None)
            }
        }
    }

    fn build_object(
        &self,
        type_name: &str,
        object: &ObjectType,
        directives: Option<&DirectiveController>,
    ) -> Object {
        let mut built = Object::new(type_name);
        for implements in &object.implements {
            built = built.implement(implements.node.to_string());
        }
        for field in &object.fields {
            built = built.field(self.build_field(type_name, &field.node, directives));
        }
        built
    }

    /// Wires one field: its declared arguments, and a resolver running
    /// the field's directive chain in declaration order. A field with
    /// no directives resolves by parent-property lookup.
    fn build_field(
        &self,
        type_name: &str,
        field: &FieldDefinition,
        directives: Option<&DirectiveController>,
    ) -> Field {
        let field_name = field.name.node.to_string();
        let mut chain = Vec::new();
        for usage in &field.directives {
            let Some(link) = self.resolve_usage(&usage.node, directives) else {
                continue;
            };
            if link.name == SUBSCRIBE_DIRECTIVE {
                // A subscription source ends directive processing for
                // the field; outside the subscription root it attaches
                // nothing.
                break;
            }
            chain.push(link);
        }

        let context = Arc::new(FieldContext {
            type_name: type_name.to_string(),
            field_name: field_name.clone(),
            list: is_list(&field.ty.node),
            directive: None,
        });
        let chain = Arc::new(chain);
        let host = Arc::clone(&self.host);
        let diagnostics = self.diagnostics.clone();

        let mut built = Field::new(field_name, type_ref(&field.ty.node), move |ctx| {
            let chain = Arc::clone(&chain);
            let context = Arc::clone(&context);
            let host = Arc::clone(&host);
            let diagnostics = diagnostics.clone();
            let field_args = extract_args(&ctx);
            let parent = parent_property(&ctx, &context.field_name);
            FieldFuture::new(async move {
                if chain.is_empty() {
                    return Ok(parent.map(FieldValue::value));
                }
                match run_chain(&host, &diagnostics, &chain, &context, field_args).await {
                    Value::Null => Ok(None),
                    value => Ok(Some(FieldValue::value(to_gql_value(value)))),
                }
            })
        });
        for argument in &field.arguments {
            built = built.argument(input_value(&argument.node));
        }
        built
    }

    fn build_subscription(
        &self,
        type_name: &str,
        object: &ObjectType,
        directives: Option<&DirectiveController>,
    ) -> Subscription {
        let mut built = Subscription::new(type_name);
        for field in &object.fields {
            built = built.field(self.build_subscription_field(type_name, &field.node, directives));
        }
        built
    }

    /// Wires one subscription field. The subscription source resolver
    /// runs exactly once per subscription setup and produces the
    /// stream; each emission is then bridged through a
    /// [`StreamObserver`] into the pull-based shape execution expects.
    fn build_subscription_field(
        &self,
        type_name: &str,
        field: &FieldDefinition,
        directives: Option<&DirectiveController>,
    ) -> SubscriptionField {
        let field_name = field.name.node.to_string();
        let mut source = None;
        for usage in &field.directives {
            let Some(link) = self.resolve_usage(&usage.node, directives) else {
                continue;
            };
            if link.name == SUBSCRIBE_DIRECTIVE {
                // A field has at most one effective subscription source.
                source = Some(link);
                break;
            }
        }

        let context = Arc::new(FieldContext {
            type_name: type_name.to_string(),
            field_name: field_name.clone(),
            list: is_list(&field.ty.node),
            directive: source.as_ref().map(|link| link.name.clone()),
        });
        let source = Arc::new(source);
        let host = Arc::clone(&self.host);
        let diagnostics = self.diagnostics.clone();

        let mut built =
            SubscriptionField::new(field_name, type_ref(&field.ty.node), move |ctx| {
                let source = Arc::clone(&source);
                let context = Arc::clone(&context);
                let host = Arc::clone(&host);
                let diagnostics = diagnostics.clone();
                let field_args = extract_args(&ctx);
                SubscriptionFieldFuture::new(async move {
                    let Some(link) = source.as_ref().as_ref() else {
                        return Ok(futures::stream::empty().boxed());
                    };
                    let resolver = link.directive.resolver();
                    let target_host = resolver.accepts_host().then(|| Arc::clone(&host));
                    let invocation = Invocation {
                        directive_args: link.args.clone(),
                        field_args,
                        current: None,
                        field: Some(context.as_ref().clone()),
                    };
                    let stream = match resolver.run(target_host, invocation) {
                        FunctionValue::Stream(observable) => {
                            let observer =
                                StreamObserver::new(context.field_name.clone(), observable)
                                    .map_err(to_schema_error)?;
                            let field = context.field_name.clone();
                            observer
                                .into_stream()
                                .map(move |step| {
                                    let item =
                                        step.value.get(&field).cloned().unwrap_or(Value::Null);
                                    Ok(FieldValue::value(to_gql_value(item)))
                                })
                                .boxed()
                        }
                        FunctionValue::Future(future) => match future.await {
                            Ok(value) => single_emission(value),
                            Err(error) => {
                                diagnostics.error(format!(
                                    "Could not run \"{}\" directive resolver: {error}",
                                    link.name
                                ));
                                futures::stream::empty().boxed()
                            }
                        },
                        FunctionValue::Value(value) => single_emission(value),
                    };
                    Ok(stream)
                })
            });
        for argument in &field.arguments {
            built = built.argument(input_value(&argument.node));
        }
        built
    }

    /// Resolves one directive usage against the controller, logging a
    /// lookup miss and leaving the field untouched.
    fn resolve_usage(
        &self,
        usage: &ConstDirective,
        directives: Option<&DirectiveController>,
    ) -> Option<ChainLink> {
        let name = usage.name.node.to_string();
        match directives.and_then(|controller| controller.get(&name)) {
            Some(directive) => Some(ChainLink {
                args: literal_args(usage),
                name,
                directive,
            }),
            None => {
                self.diagnostics
                    .error(format!("Could not find \"{name}\" directive"));
                None
            }
        }
    }
}

/// Runs a field's directive chain in declaration order.
///
/// Each resolver receives the previous link's settled value as its
/// current value; a failing link degrades the whole field to null.
async fn run_chain(
    host: &Arc<Host>,
    diagnostics: &Diagnostics,
    chain: &[ChainLink],
    context: &FieldContext,
    field_args: Args,
) -> Value {
    let mut current: Option<Value> = None;
    for link in chain {
        let resolver = link.directive.resolver();
        let target_host = resolver.accepts_host().then(|| Arc::clone(host));
        let invocation = Invocation {
            directive_args: link.args.clone(),
            field_args: field_args.clone(),
            current: current.take(),
            field: Some(FieldContext {
                directive: Some(link.name.clone()),
                ..context.clone()
            }),
        };
        match settle(resolver.run(target_host, invocation), context.list).await {
            Ok(value) => current = Some(value),
            Err(error) => {
                diagnostics.error(format!(
                    "Could not run \"{}\" directive resolver: {error}",
                    link.name
                ));
                return Value::Null;
            }
        }
    }
    current.unwrap_or(Value::Null)
}

/// Settles a produced value into the single value field resolution
/// expects: futures are awaited; a stream drains to an ordered array on
/// a list field and to its first emission otherwise.
async fn settle(produced: FunctionValue, list: bool) -> Result<Value> {
    match produced {
        FunctionValue::Value(value) => Ok(value),
        FunctionValue::Future(future) => future.await,
        FunctionValue::Stream(observable) if list => Ok(Value::Array(observable.collect().await?)),
        FunctionValue::Stream(observable) => {
            Ok(observable.first().await?.unwrap_or(Value::Null))
        }
    }
}

fn single_emission<'a>(value: Value) -> BoxStream<'a, async_graphql::Result<FieldValue<'a>>> {
    if value.is_null() {
        futures::stream::empty().boxed()
    } else {
        futures::stream::once(async move { Ok(FieldValue::value(to_gql_value(value))) }).boxed()
    }
}

/// Extracts the literal arguments of a directive usage.
fn literal_args(usage: &ConstDirective) -> Args {
    let mut args = Args::new();
    for (name, value) in &usage.arguments {
        if let Ok(value) = value.node.clone().into_json() {
            args.insert(name.node.to_string(), value);
        }
    }
    args
}

/// Extracts the field arguments supplied by the query.
fn extract_args(ctx: &ResolverContext<'_>) -> Args {
    let mut args = Args::new();
    for (name, value) in ctx.args.as_index_map() {
        let value = value.clone().into_json().unwrap_or(Value::Null);
        args.insert(name.to_string(), value);
    }
    args
}

/// Looks the field up on the parent object, the default resolution for
/// fields without directives.
fn parent_property(ctx: &ResolverContext<'_>, field_name: &str) -> Option<async_graphql::Value> {
    match ctx.parent_value.as_value() {
        Some(async_graphql::Value::Object(object)) => object.get(field_name).cloned(),
        _ => None,
    }
}

fn input_value(definition: &InputValueDefinition) -> InputValue {
    let mut input = InputValue::new(
        definition.name.node.to_string(),
        type_ref(&definition.ty.node),
    );
    if let Some(default) = &definition.default_value {
        input = input.default_value(default.node.clone());
    }
    input
}

fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::Named(name.to_string().into()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn is_list(ty: &Type) -> bool {
    matches!(ty.base, BaseType::List(_))
}

fn to_gql_value(value: Value) -> async_graphql::Value {
    async_graphql::Value::from_json(value).unwrap_or(async_graphql::Value::Null)
}

fn to_schema_error(error: Error) -> async_graphql::Error {
    async_graphql::Error::new(error.to_string())
}
