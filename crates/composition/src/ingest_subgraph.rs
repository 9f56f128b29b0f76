//! This is a separate module because we want to use only the public API of [Subgraphs] and avoid
//! mixing GraphQL parser logic and types with our internals.

mod directive_definitions;
mod directives;
mod enums;
mod fields;
mod nested_key_fields;
mod schema_definitions;

use self::{
    directive_definitions::{DirectiveDefinitions, DirectiveLocations},
    directives::*,
    nested_key_fields::ingest_nested_key_fields,
    schema_definitions::*,
};
use crate::{
    subgraphs::{self, DefinitionId, DefinitionKind, DirectiveSiteFlags, SubgraphId},
    Subgraphs,
};
use async_graphql_parser::{types as ast, Positioned};
use async_graphql_value::{ConstValue, Name};
use std::collections::HashSet;

/// _Service is a special type exposed by subgraphs. It should not be composed.
const SERVICE_TYPE_NAME: &str = "_Service";

/// _Entity is a special union type exposed by subgraphs. It should not be composed.
const ENTITY_UNION_NAME: &str = "_Entity";

pub(crate) struct Context<'a> {
    subgraph_id: SubgraphId,
    subgraphs: &'a mut Subgraphs,
    directive_matcher: DirectiveMatcher<'a>,
    directive_definitions: DirectiveDefinitions,
    root_type_matcher: RootTypeMatcher<'a>,
}

pub(crate) fn ingest_subgraph(document: &ast::ServiceDocument, name: &str, url: &str, subgraphs: &mut Subgraphs) {
    let subgraph_id = subgraphs.push_subgraph(name, url);

    let mut matcher_errors = Vec::new();
    let directive_matcher = ingest_directive_definitions(document, |error| matcher_errors.push(error));

    for error in matcher_errors {
        subgraphs.push_ingestion_diagnostic(subgraph_id, error);
    }

    for directive_name in directive_matcher.iter_composed_directives() {
        subgraphs.insert_composed_directive(subgraph_id, directive_name);
    }

    let directive_definitions = DirectiveDefinitions::new(&directive_matcher, document);
    let root_type_matcher = ingest_schema_definitions(document, subgraph_id, subgraphs);

    let mut ctx = Context {
        subgraph_id,
        subgraphs,
        directive_matcher,
        directive_definitions,
        root_type_matcher,
    };

    ingest_top_level_definitions(document, &mut ctx);
    ingest_definition_bodies(document, &mut ctx);
    ingest_nested_key_fields(&mut ctx);
}

fn ingest_top_level_definitions(document: &ast::ServiceDocument, ctx: &mut Context<'_>) {
    let subgraph_id = ctx.subgraph_id;

    // Names for which a full (non-extension) definition has already been
    // seen, for duplicate detection. Extensions merge into their base.
    let mut base_definitions: HashSet<&str> = HashSet::new();

    for definition in &document.definitions {
        let ast::TypeSystemDefinition::Type(type_definition) = definition else {
            continue;
        };

        let type_definition = &type_definition.node;
        let type_name = type_definition.name.node.as_str();

        match type_name {
            name if name == SERVICE_TYPE_NAME || name == ENTITY_UNION_NAME => continue,
            name if name.starts_with("__") => continue,
            _ => (),
        }

        let kind = match &type_definition.kind {
            ast::TypeKind::Object(_) => DefinitionKind::Object,
            ast::TypeKind::Interface(_) => DefinitionKind::Interface,
            ast::TypeKind::Union(_) => DefinitionKind::Union,
            ast::TypeKind::InputObject(_) => DefinitionKind::InputObject,
            ast::TypeKind::Scalar => DefinitionKind::Scalar,
            ast::TypeKind::Enum(_) => DefinitionKind::Enum,
        };

        let is_extension = type_definition.extend || has_extends_directive(type_definition, &ctx.directive_matcher);

        let definition_id = match ctx.subgraphs.definition_by_name(type_name, subgraph_id) {
            Some(existing) => {
                let existing_kind = ctx.subgraphs.walk(existing).kind();

                if existing_kind != kind {
                    ctx.subgraphs.push_ingestion_diagnostic(
                        subgraph_id,
                        format!(
                            "Cannot extend the {} type `{type_name}` as {} — the kinds are incompatible.",
                            existing_kind.as_str(),
                            kind.as_str(),
                        ),
                    );
                    continue;
                }

                if !is_extension && !base_definitions.insert(type_name) {
                    ctx.subgraphs.push_ingestion_diagnostic(
                        subgraph_id,
                        format!("Duplicate definition of the type `{type_name}`."),
                    );
                    continue;
                }

                existing
            }
            None => {
                if !is_extension {
                    base_definitions.insert(type_name);
                }

                let description = type_definition
                    .description
                    .as_ref()
                    .map(|description| ctx.subgraphs.strings.intern(description.node.as_str()));

                let directives = ctx.subgraphs.new_directive_site();
                ctx.subgraphs
                    .push_definition(subgraph_id, type_name, kind, description, directives)
            }
        };

        let location = match kind {
            DefinitionKind::Object => DirectiveLocations::OBJECT,
            DefinitionKind::Interface => DirectiveLocations::INTERFACE,
            DefinitionKind::Union => DirectiveLocations::UNION,
            DefinitionKind::InputObject => DirectiveLocations::INPUT_OBJECT,
            DefinitionKind::Scalar => DirectiveLocations::SCALAR,
            DefinitionKind::Enum => DirectiveLocations::ENUM,
        };

        let directive_site = ctx.subgraphs.walk(definition_id).directives().id;
        ingest_directives(ctx, directive_site, &type_definition.directives, location, |_| {
            type_name.to_owned()
        });

        if matches!(kind, DefinitionKind::Object | DefinitionKind::Interface) {
            ingest_keys(definition_id, &type_definition.directives, ctx);
        }

        if let DefinitionKind::Object = kind {
            match ctx.root_type_matcher.match_name(type_name) {
                RootTypeMatch::Query => ctx.subgraphs.set_query_type(subgraph_id, definition_id),
                RootTypeMatch::Mutation => ctx.subgraphs.set_mutation_type(subgraph_id, definition_id),
                RootTypeMatch::Subscription => ctx.subgraphs.set_subscription_type(subgraph_id, definition_id),
                RootTypeMatch::NotRootButHasDefaultRootName => {
                    ctx.subgraphs.push_ingestion_diagnostic(
                        subgraph_id,
                        format!(
                            "The {type_name} type has the default name for a root but is itself not a root. This is not valid in a federation context."
                        ),
                    );
                }
                RootTypeMatch::NotRoot => (),
            }
        }
    }
}

fn has_extends_directive(type_definition: &ast::TypeDefinition, matcher: &DirectiveMatcher<'_>) -> bool {
    type_definition
        .directives
        .iter()
        .any(|directive| matcher.is_extends(directive.node.name.node.as_str()))
}

fn ingest_definition_bodies(document: &ast::ServiceDocument, ctx: &mut Context<'_>) {
    let subgraph_id = ctx.subgraph_id;

    let type_definitions = document.definitions.iter().filter_map(|definition| match definition {
        ast::TypeSystemDefinition::Type(type_definition) => Some(&type_definition.node),
        _ => None,
    });

    for definition in type_definitions {
        let type_name = definition.name.node.as_str();

        if type_name == SERVICE_TYPE_NAME || type_name == ENTITY_UNION_NAME || type_name.starts_with("__") {
            continue;
        }

        // Definitions that failed to register (duplicates, kind clashes) were
        // already reported, their bodies are skipped.
        let Some(definition_id) = ctx.subgraphs.definition_by_name(type_name, subgraph_id) else {
            continue;
        };

        match &definition.kind {
            ast::TypeKind::Union(union) => {
                for member in &union.members {
                    let member_name = ctx.subgraphs.strings.intern(member.node.as_str());
                    ctx.subgraphs.push_type_reference(subgraph_id, member_name);

                    let Some(member_id) = ctx.subgraphs.definition_by_name(member.node.as_str(), subgraph_id) else {
                        continue;
                    };

                    if !ctx.subgraphs.push_union_member(definition_id, member_id) {
                        ctx.subgraphs.push_ingestion_diagnostic(
                            subgraph_id,
                            format!(
                                "Duplicate member `{}` on the union `{type_name}`.",
                                member.node.as_str(),
                            ),
                        );
                    }
                }
            }
            ast::TypeKind::InputObject(input_object) => {
                fields::ingest_input_fields(ctx, definition_id, &input_object.fields);
            }
            ast::TypeKind::Interface(interface) => {
                ingest_interface_impls(ctx, definition_id, &interface.implements);
                fields::ingest_fields(ctx, definition_id, &interface.fields);
            }
            ast::TypeKind::Object(object) => {
                ingest_interface_impls(ctx, definition_id, &object.implements);
                fields::ingest_fields(ctx, definition_id, &object.fields);
            }
            ast::TypeKind::Enum(enum_type) => {
                enums::ingest_enum(ctx, definition_id, enum_type);
            }
            ast::TypeKind::Scalar => (),
        }
    }
}

fn ingest_interface_impls(ctx: &mut Context<'_>, definition_id: DefinitionId, implements: &[Positioned<Name>]) {
    let implementer_name = ctx.subgraphs.walk(definition_id).name().id;

    for implemented in implements {
        let implemented = ctx.subgraphs.strings.intern(implemented.node.as_str());
        ctx.subgraphs.push_type_reference(ctx.subgraph_id, implemented);
        ctx.subgraphs
            .push_interface_impl(ctx.subgraph_id, implementer_name, implemented);
    }
}

pub(crate) fn ast_value_to_subgraph_value(value: &ConstValue, subgraphs: &mut Subgraphs) -> subgraphs::Value {
    match &value {
        ConstValue::Null => subgraphs::Value::Null,
        ConstValue::Binary(_) => unreachable!("binary value in a GraphQL document"),
        ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
            subgraphs::Value::Int(number.as_i64().unwrap_or_default())
        }
        ConstValue::Number(number) => subgraphs::Value::Float(number.as_f64().unwrap_or_default()),
        ConstValue::String(s) => subgraphs::Value::String(subgraphs.strings.intern(s.as_str())),
        ConstValue::Boolean(b) => subgraphs::Value::Boolean(*b),
        ConstValue::Enum(e) => subgraphs::Value::Enum(subgraphs.strings.intern(e.as_str())),
        ConstValue::List(list) => subgraphs::Value::List(
            list.iter()
                .map(|value| ast_value_to_subgraph_value(value, subgraphs))
                .collect(),
        ),
        ConstValue::Object(object) => subgraphs::Value::Object(
            object
                .iter()
                .map(|(key, value)| {
                    (
                        subgraphs.strings.intern(key.as_str()),
                        ast_value_to_subgraph_value(value, subgraphs),
                    )
                })
                .collect(),
        ),
    }
}
