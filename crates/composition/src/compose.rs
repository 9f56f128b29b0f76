mod context;
mod directives;
mod entity_interface;
mod enums;
mod fields;
mod input_object;
mod interface;
mod object;
mod subscription_filter;

pub(crate) use self::context::Context;

use self::{context::TypeUsage, directives::collect_composed_directives};
use crate::{
    composition_ir::{self as ir, CompositionIr},
    graph,
    subgraphs::{DefinitionKind, DefinitionWalker, FieldWalker, StringId, Subgraphs},
    Diagnostics,
};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub(crate) fn compose_subgraphs(ctx: &mut Context<'_>) {
    validate_subgraph_names(ctx);

    let subgraphs = ctx.subgraphs;

    subgraphs.iter_definition_groups(|definitions| {
        compose_definitions(ctx, definitions);
    });

    validate_root_type_consistency(ctx);
    validate_query_root(ctx);
    interface::validate_composed_interfaces(ctx);
    graph::validate_resolvability(ctx);
}

/// A federated schema without an accessible query root cannot serve any
/// request.
fn validate_query_root(ctx: &mut Context<'_>) {
    let Some(query_type) = ctx.ir().query_type else {
        ctx.diagnostics
            .push_fatal("The composed schema has no query root type.".to_owned());
        return;
    };

    let inaccessible = ctx
        .ir()
        .get_definition(query_type)
        .is_some_and(|definition| definition.is_inaccessible());

    if inaccessible {
        ctx.diagnostics
            .push_fatal("The query root type must not be @inaccessible.".to_owned());
    }
}

/// Subgraph names must be unique and non-empty. All name problems are
/// aggregated into one error, ingestion of the subgraphs themselves is
/// unaffected.
fn validate_subgraph_names(ctx: &mut Context<'_>) {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for subgraph in ctx.subgraphs.iter_subgraphs() {
        let name = subgraph.name().as_str();

        if name.is_empty() {
            problems.push("a subgraph has an empty name".to_owned());
            continue;
        }

        if !seen.insert(name) {
            problems.push(format!("the subgraph name `{name}` is used more than once"));
        }
    }

    if !problems.is_empty() {
        ctx.diagnostics
            .push_fatal(format!("Invalid subgraph names: {}.", problems.join("; ")));
    }
}

fn compose_definitions<'a>(ctx: &mut Context<'a>, definitions: &[DefinitionWalker<'a>]) {
    let first = definitions[0];

    // The entity interface / interface object pairing is the one sanctioned
    // case where kinds may differ within a group.
    let is_entity_interface = definitions
        .iter()
        .any(|definition| definition.kind() == DefinitionKind::Interface && definition.is_entity())
        || definitions.iter().any(|definition| definition.directives().interface_object());

    if is_entity_interface {
        entity_interface::merge_entity_interface_definitions(ctx, first, definitions);
        return;
    }

    // The first subgraph to define a type sets its structural kind.
    if let Some(incompatible) = definitions.iter().find(|definition| definition.kind() != first.kind()) {
        ctx.diagnostics.push_fatal(format!(
            "The type `{}` is defined as {} in the subgraph `{}` but as {} in the subgraph `{}`.",
            first.name().as_str(),
            first.kind().as_str(),
            first.subgraph().name().as_str(),
            incompatible.kind().as_str(),
            incompatible.subgraph().name().as_str(),
        ));
        return;
    }

    match first.kind() {
        DefinitionKind::Object => object::merge_object_definitions(ctx, first, definitions),
        DefinitionKind::Interface => interface::merge_interface_definitions(ctx, first, definitions),
        DefinitionKind::Union => merge_union_definitions(ctx, first, definitions),
        DefinitionKind::InputObject => input_object::merge_input_object_definitions(ctx, first, definitions),
        DefinitionKind::Scalar => merge_scalar_definitions(ctx, first, definitions),
        DefinitionKind::Enum => enums::merge_enum_definitions(ctx, first, definitions),
    }
}

fn merge_scalar_definitions<'a>(ctx: &mut Context<'a>, first: DefinitionWalker<'a>, definitions: &[DefinitionWalker<'a>]) {
    let mut definition = ir::DefinitionIr::new(first.name().id, DefinitionKind::Scalar);
    definition.description = definitions.iter().find_map(|def| def.description()).map(|d| d.id);
    definition.directives = collect_composed_directives(definitions.iter().map(|def| def.directives()));
    definition.subgraphs = definitions.iter().map(|def| def.subgraph_id()).collect();
    ctx.insert_definition(definition);
}

fn merge_union_definitions<'a>(ctx: &mut Context<'a>, first: DefinitionWalker<'a>, definitions: &[DefinitionWalker<'a>]) {
    let mut definition = ir::DefinitionIr::new(first.name().id, DefinitionKind::Union);
    definition.description = definitions.iter().find_map(|def| def.description()).map(|d| d.id);
    definition.directives = collect_composed_directives(definitions.iter().map(|def| def.directives()));
    definition.subgraphs = definitions.iter().map(|def| def.subgraph_id()).collect();

    for def in definitions {
        for member in def.union_members() {
            if member.kind() != DefinitionKind::Object {
                ctx.diagnostics.push_fatal(format!(
                    "[{}] The union member `{}` of `{}` is {}, not an object type.",
                    def.subgraph().name().as_str(),
                    member.name().as_str(),
                    def.name().as_str(),
                    member.kind().as_str(),
                ));
                continue;
            }

            definition.union_members.insert(member.name().id);
        }
    }

    ctx.insert_definition(definition);
}

/// The root operation types of all subgraphs must agree on their names, so
/// that each operation merges into a single federated type.
fn validate_root_type_consistency(ctx: &mut Context<'_>) {
    let operations: [(&str, fn(crate::subgraphs::SubgraphWalker<'_>) -> Option<DefinitionWalker<'_>>); 3] = [
        ("query", |subgraph| subgraph.query_type()),
        ("mutation", |subgraph| subgraph.mutation_type()),
        ("subscription", |subgraph| subgraph.subscription_type()),
    ];

    for (operation, get_root) in operations {
        let names: BTreeSet<StringId> = ctx
            .subgraphs
            .iter_subgraphs()
            .filter_map(get_root)
            .map(|definition| definition.name().id)
            .collect();

        if names.len() > 1 {
            let names = names
                .iter()
                .map(|name| ctx.subgraphs.walk(*name).as_str())
                .join("`, `");
            ctx.diagnostics.push_fatal(format!(
                "The {operation} root type has inconsistent names across subgraphs: `{names}`.",
            ));
        }
    }
}
