//! Advisory checks over the parsed schema document.
//!
//! Nothing here gates generation; findings surface through the
//! diagnostics channel only, and the schema is still built.

use async_graphql_parser::types::{
    BaseType, ServiceDocument, Type, TypeKind, TypeSystemDefinition,
};
use gqlweave_core::diagnostics::Diagnostics;
use rustc_hash::FxHashSet;

pub(crate) const BUILT_IN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];
const BUILT_IN_DIRECTIVES: [&str; 4] = ["deprecated", "specifiedBy", "skip", "include"];

/// Reports advisory findings for `document`.
pub(crate) fn check_document(document: &ServiceDocument, diagnostics: &Diagnostics) {
    let mut declared_directives: FxHashSet<&str> =
        BUILT_IN_DIRECTIVES.iter().copied().collect();
    let mut declared_types: FxHashSet<&str> = BUILT_IN_SCALARS.iter().copied().collect();
    let mut seen_types: FxHashSet<&str> = FxHashSet::default();

    for definition in &document.definitions {
        match definition {
            TypeSystemDefinition::Directive(directive) => {
                declared_directives.insert(directive.node.name.node.as_str());
            }
            TypeSystemDefinition::Type(ty) => {
                let name = ty.node.name.node.as_str();
                if !seen_types.insert(name) && !ty.node.extend {
                    diagnostics.warning(format!(
                        "Type \"{name}\" is defined more than once in the schema document"
                    ));
                }
                declared_types.insert(name);
            }
            TypeSystemDefinition::Schema(_) => {}
        }
    }

    for definition in &document.definitions {
        let TypeSystemDefinition::Type(ty) = definition else {
            continue;
        };
        let type_name = ty.node.name.node.as_str();
        let fields = match &ty.node.kind {
            TypeKind::Object(object) => &object.fields,
            TypeKind::Interface(interface) => &interface.fields,
            _ => continue,
        };
        for field in fields {
            let field_name = field.node.name.node.as_str();
            if let Some(unknown) = unknown_base(&field.node.ty.node, &declared_types) {
                diagnostics.warning(format!(
                    "Field \"{type_name}.{field_name}\" references unknown type \"{unknown}\""
                ));
            }
            for usage in &field.node.directives {
                let directive_name = usage.node.name.node.as_str();
                if !declared_directives.contains(directive_name) {
                    diagnostics.warning(format!(
                        "Directive \"@{directive_name}\" on \"{type_name}.{field_name}\" is \
                         used but never declared in the schema document"
                    ));
                }
            }
        }
    }
}

/// Returns the named base type of `ty` when it is not declared.
fn unknown_base<'a>(ty: &'a Type, declared: &FxHashSet<&str>) -> Option<&'a str> {
    match &ty.base {
        BaseType::Named(name) => {
            let name = name.as_str();
            (!declared.contains(name)).then_some(name)
        }
        BaseType::List(inner) => unknown_base(inner, declared),
    }
}
