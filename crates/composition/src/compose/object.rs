use super::*;
use crate::subgraphs::{FieldArgumentWalker, StringWalker, SubgraphId};

pub(super) fn merge_object_definitions<'a>(
    ctx: &mut Context<'a>,
    first: DefinitionWalker<'a>,
    definitions: &[DefinitionWalker<'a>],
) {
    let object_name = first.name();

    let mut is_root = false;
    for definition in definitions {
        let subgraph = definition.subgraph();

        if subgraph.query_type().map(|def| def.id) == Some(definition.id) {
            ctx.set_query(object_name.id);
            is_root = true;
        }
        if subgraph.mutation_type().map(|def| def.id) == Some(definition.id) {
            ctx.set_mutation(object_name.id);
            is_root = true;
        }
        if subgraph.subscription_type().map(|def| def.id) == Some(definition.id) {
            ctx.set_subscription(object_name.id);
            is_root = true;
        }
    }

    let mut definition_ir = ir::DefinitionIr::new(object_name.id, DefinitionKind::Object);
    definition_ir.description = definitions.iter().find_map(|def| def.description()).map(|d| d.id);
    definition_ir.directives = collect_composed_directives(definitions.iter().map(|def| def.directives()));
    definition_ir.subgraphs = definitions.iter().map(|def| def.subgraph_id()).collect();

    for definition in definitions {
        definition_ir.implements.extend(definition.implemented_interfaces());

        for key in definition.entity_keys() {
            definition_ir.keys.push(ir::KeyIr {
                subgraph_id: definition.subgraph_id(),
                key_id: key.id,
                is_interface_object: false,
                resolvable: key.is_resolvable(),
            });
        }
    }

    ctx.insert_definition(definition_ir);

    let subgraphs = ctx.subgraphs;
    subgraphs.iter_field_groups(object_name.id, |fields| {
        let Some(first_field) = fields.first() else {
            return;
        };
        compose_object_fields(ctx, *first_field, fields, is_root);
    });
}

pub(super) fn compose_object_fields<'a>(
    ctx: &mut Context<'a>,
    first: FieldWalker<'a>,
    fields: &[FieldWalker<'a>],
    parent_is_root: bool,
) {
    let field_name = first.name();
    let parent_name = first.parent_definition().name();

    validate_shareability(ctx, first, fields, parent_is_root);
    validate_inaccessible_references(ctx, first, fields);

    let overrides = collect_overrides(ctx, fields);

    let resolvable_in = if fields.iter().any(|field| field.directives().r#override().is_some()) {
        Vec::new()
    } else {
        fields
            .iter()
            .filter(|field| !field.directives().external())
            .map(|field| field.parent_definition().subgraph_id())
            .collect()
    };

    let provides = fields
        .iter()
        .filter_map(|field| {
            field.directives().provides().map(|provides| {
                (
                    field.parent_definition().subgraph_id(),
                    ctx.subgraphs.render_selection_set(provides),
                )
            })
        })
        .collect();

    let requires = fields
        .iter()
        .filter_map(|field| {
            field.directives().requires().map(|requires| {
                (
                    field.parent_definition().subgraph_id(),
                    ctx.subgraphs.render_selection_set(requires),
                )
            })
        })
        .collect();

    let description = fields.iter().find_map(|field| field.description()).map(|d| d.id);
    let directives = collect_composed_directives(fields.iter().map(|field| field.directives()));

    let requires_authentication = fields.iter().any(|field| {
        field.directives().authenticated() || field.parent_definition().directives().authenticated()
    });

    let mut requires_scopes: Vec<Vec<_>> = fields
        .iter()
        .flat_map(|field| {
            field
                .directives()
                .requires_scopes()
                .iter()
                .chain(field.parent_definition().directives().requires_scopes())
                .cloned()
        })
        .collect();
    requires_scopes.sort();
    requires_scopes.dedup();

    let subscription_filter = fields.iter().find_map(|field| {
        field
            .directives()
            .subscription_filter()
            .and_then(|condition| subscription_filter::validate_subscription_filter(ctx, *field, condition))
    });

    let Some(field_type) = fields::compose_output_field_types(ctx, fields.iter().copied()) else {
        return;
    };

    let arguments = merge_field_arguments(ctx, first, fields);

    ctx.insert_field(ir::FieldIr {
        parent_name: parent_name.id,
        field_name: field_name.id,
        field_type,
        arguments,
        directives,
        description,
        default: None,
        resolvable_in,
        provides,
        requires,
        overrides,
        requires_authentication,
        requires_scopes,
        subscription_filter,
    });
}

/// A field defined in more than one subgraph must be marked shareable — or be
/// external, part of an entity key, overridden, or live on an entity, where
/// key jumps already coordinate resolution — in all of them. Fields of root
/// operation types are shareable by definition.
fn validate_shareability<'a>(
    ctx: &mut Context<'a>,
    first: FieldWalker<'a>,
    fields: &[FieldWalker<'a>],
    parent_is_root: bool,
) {
    if parent_is_root || fields.len() < 2 {
        return;
    }

    // Interface fields are required to be consistent, not shareable. This
    // also covers interface object contributions merging under the interface
    // name.
    if fields
        .iter()
        .any(|field| field.parent_definition().kind() == DefinitionKind::Interface)
    {
        return;
    }

    let field_is_exempt = |field: &FieldWalker<'a>| {
        let directives = field.directives();
        directives.shareable()
            || field.parent_definition().directives().shareable()
            || field.parent_definition().is_entity()
            || directives.external()
            || field.is_part_of_key()
            || directives.r#override().is_some()
    };

    let unmarked: Vec<&str> = fields
        .iter()
        .filter(|field| !field_is_exempt(field))
        .map(|field| field.parent_definition().subgraph().name().as_str())
        .collect();

    if unmarked.len() < 2 {
        return;
    }

    let marked: Vec<&str> = fields
        .iter()
        .filter(|field| field_is_exempt(field))
        .map(|field| field.parent_definition().subgraph().name().as_str())
        .collect();

    let mut message = format!(
        "The field `{}.{}` is defined in multiple subgraphs but is not marked `@shareable` in `{}`",
        first.parent_definition().name().as_str(),
        first.name().as_str(),
        unmarked.join("`, `"),
    );

    if !marked.is_empty() {
        message.push_str(&format!(" (it is shareable in `{}`)", marked.join("`, `")));
    }

    message.push('.');

    ctx.diagnostics.push_fatal(message);
}

/// An accessible field must not point to an `@inaccessible` type: the field
/// would remain visible in the client schema with nothing to resolve to.
fn validate_inaccessible_references<'a>(ctx: &mut Context<'a>, first: FieldWalker<'a>, fields: &[FieldWalker<'a>]) {
    let inaccessibly_typed = fields.iter().any(|field| {
        !field.directives().inaccessible()
            && field
                .r#type()
                .definition(field.parent_definition().subgraph_id())
                .filter(|definition| definition.directives().inaccessible())
                .is_some()
    });

    if !inaccessibly_typed {
        return;
    }

    let non_marked_subgraphs = fields
        .iter()
        .filter(|field| !field.directives().inaccessible())
        .map(|field| field.parent_definition().subgraph().name().as_str())
        .join("`, `");

    ctx.diagnostics.push_fatal(format!(
        "The field `{}.{}` is of an @inaccessible type, but is itself not marked as @inaccessible in `{non_marked_subgraphs}`.",
        first.parent_definition().name().as_str(),
        first.name().as_str(),
    ));
}

fn collect_overrides<'a>(ctx: &mut Context<'a>, fields: &[FieldWalker<'a>]) -> Vec<(SubgraphId, StringId)> {
    let mut overrides = Vec::new();

    for field in fields {
        let Some(override_directive) = field.directives().r#override() else {
            continue;
        };

        let field_subgraph = field.parent_definition().subgraph();

        if override_directive.from == field_subgraph.name().id {
            ctx.diagnostics.push_fatal(format!(
                r#"Source and destination subgraphs "{}" are the same for overridden field "{}.{}"."#,
                ctx.subgraphs.walk(override_directive.from).as_str(),
                field.parent_definition().name().as_str(),
                field.name().as_str(),
            ));
            continue;
        }

        if let Some(override_source) = fields
            .iter()
            .find(|other| other.parent_definition().subgraph().name().id == override_directive.from)
        {
            if override_source.directives().r#override().is_some() {
                ctx.diagnostics.push_fatal(format!(
                    r#"Field "{}.{}" on subgraph "{}" is also marked with directive @override in subgraph "{}". Only one @override directive is allowed per field."#,
                    override_source.parent_definition().name().as_str(),
                    override_source.name().as_str(),
                    override_source.parent_definition().subgraph().name().as_str(),
                    field.parent_definition().subgraph().name().as_str(),
                ));
            }
        }

        overrides.push((field.parent_definition().subgraph_id(), override_directive.from));
    }

    overrides
}

/// The arguments of a composed field are the intersection of the subgraphs'
/// arguments for that field. A required argument that is not defined
/// everywhere cannot be in the intersection, and that is an error.
pub(super) fn merge_field_arguments<'a>(
    ctx: &mut Context<'a>,
    first: FieldWalker<'a>,
    fields: &[FieldWalker<'a>],
) -> Vec<ir::InputValueIr> {
    let parent_definition_name = first.parent_definition().name();
    let field_name = first.name();

    let intersection: BTreeSet<StringId> = first
        .arguments()
        .map(|argument| argument.name().id)
        .filter(|argument_name| {
            fields[1..]
                .iter()
                .all(|field| field.argument_by_name(*argument_name).is_some())
        })
        .collect();

    let mut all_arguments = fields
        .iter()
        .flat_map(|field| field.arguments())
        .map(|argument| (argument.name().id, argument))
        .collect::<Vec<_>>();

    all_arguments.sort_by_key(|(name, _)| *name);

    let mut merged = Vec::new();
    let mut start = 0;

    while start < all_arguments.len() {
        let argument_name = all_arguments[start].0;
        let end = all_arguments[start..].partition_point(|(name, _)| *name == argument_name) + start;
        let arguments: Vec<&FieldArgumentWalker<'a>> = all_arguments[start..end].iter().map(|(_, arg)| arg).collect();

        start = end;

        let default = compose_argument_defaults(ctx, &arguments).cloned();

        if !intersection.contains(&argument_name) {
            if let Some(required) = arguments.iter().find(|argument| argument.r#type().is_required()) {
                required_argument_not_in_intersection_error(
                    ctx,
                    fields,
                    required,
                    parent_definition_name,
                    field_name,
                    argument_name,
                );
            }

            continue;
        }

        let directives = collect_composed_directives(arguments.iter().map(|argument| argument.directives()));

        let Some(argument_type) = fields::compose_argument_types(ctx, &arguments) else {
            continue;
        };

        let argument_is_inaccessible = arguments.iter().any(|argument| argument.directives().inaccessible());
        let argument_type_is_inaccessible = arguments.iter().any(|argument| {
            argument
                .r#type()
                .definition(argument.field().parent_definition().subgraph_id())
                .map(|definition| definition.directives().inaccessible())
                .unwrap_or(false)
        });

        if argument_type_is_inaccessible && !argument_is_inaccessible {
            ctx.diagnostics.push_fatal(format!(
                "The argument `{}.{}({}:)` is of an @inaccessible type, but is itself not marked as @inaccessible.",
                parent_definition_name.as_str(),
                field_name.as_str(),
                ctx.subgraphs.walk(argument_name).as_str(),
            ));
        }

        let description = arguments
            .iter()
            .find_map(|argument| argument.description())
            .map(|description| description.id);

        merged.push(ir::InputValueIr {
            name: argument_name,
            r#type: argument_type,
            directives,
            description,
            default,
        });
    }

    merged
}

/// Default values on shared arguments are validated for consistency: wherever
/// a default is specified, it has to be the same.
fn compose_argument_defaults<'a, 'b>(
    ctx: &mut Context<'a>,
    arguments: &'b [&FieldArgumentWalker<'a>],
) -> Option<&'b crate::subgraphs::Value> {
    let mut default: Option<(&crate::subgraphs::Value, &FieldArgumentWalker<'a>)> = None;

    for argument in arguments {
        let Some(value) = argument.default() else { continue };

        match &mut default {
            None => {
                default = Some((value, argument));
            }
            Some((default, _)) if *default == value => (),
            Some((_, other_argument)) => {
                ctx.diagnostics.push_fatal(format!(
                    r#"The argument {}.{}({}:) has incompatible default values in subgraphs "{}" and "{}"."#,
                    argument.field().parent_definition().name().as_str(),
                    argument.field().name().as_str(),
                    argument.name().as_str(),
                    other_argument.field().parent_definition().subgraph().name().as_str(),
                    argument.field().parent_definition().subgraph().name().as_str(),
                ));
            }
        }
    }

    default.map(|(default, _)| default)
}

fn required_argument_not_in_intersection_error<'a>(
    ctx: &mut Context<'a>,
    fields: &[FieldWalker<'a>],
    required_argument: &FieldArgumentWalker<'a>,
    parent_definition_name: StringWalker<'a>,
    field_name: StringWalker<'a>,
    argument_name: StringId,
) {
    let subgraph_where_required = required_argument
        .field()
        .parent_definition()
        .subgraph()
        .name()
        .as_str();
    let subgraphs_where_missing = fields
        .iter()
        .filter(|field| field.argument_by_name(argument_name).is_none())
        .map(|field| field.parent_definition().subgraph().name().as_str())
        .collect::<Vec<_>>();

    ctx.diagnostics.push_fatal(format!(
        "The argument `{}.{}({}:)` is required in `{}` but missing in `{}`.",
        parent_definition_name.as_str(),
        field_name.as_str(),
        ctx.subgraphs.walk(argument_name).as_str(),
        subgraph_where_required,
        subgraphs_where_missing.join("`, `"),
    ));
}
