use super::*;

/// Input object fields merge by intersection: a field only stays in the
/// composed input object if every subgraph defining the type accepts it. A
/// required field that is not defined everywhere is an error, because the
/// subgraphs that lack it could never be queried.
pub(super) fn merge_input_object_definitions<'a>(
    ctx: &mut Context<'a>,
    first: DefinitionWalker<'a>,
    definitions: &[DefinitionWalker<'a>],
) {
    let input_object_name = first.name();

    let mut definition_ir = ir::DefinitionIr::new(input_object_name.id, DefinitionKind::InputObject);
    definition_ir.description = definitions.iter().find_map(|def| def.description()).map(|d| d.id);
    definition_ir.directives = collect_composed_directives(definitions.iter().map(|def| def.directives()));
    definition_ir.subgraphs = definitions.iter().map(|def| def.subgraph_id()).collect();
    ctx.insert_definition(definition_ir);

    let definition_count = definitions.len();
    let subgraphs = ctx.subgraphs;

    subgraphs.iter_field_groups(input_object_name.id, |fields| {
        let Some(first_field) = fields.first() else {
            return;
        };

        if fields.len() < definition_count {
            if let Some(required) = fields.iter().find(|field| field.r#type().is_required() && field.default().is_none()) {
                let subgraphs_where_missing = definitions
                    .iter()
                    .filter(|definition| definition.find_field(first_field.name().id).is_none())
                    .map(|definition| definition.subgraph().name().as_str())
                    .join("`, `");

                ctx.diagnostics.push_fatal(format!(
                    "The input field `{}.{}` is required in `{}` but missing in `{}`.",
                    required.parent_definition().name().as_str(),
                    required.name().as_str(),
                    required.parent_definition().subgraph().name().as_str(),
                    subgraphs_where_missing,
                ));
            }

            // Not in the intersection: the field is dropped from the
            // composed input object.
            return;
        }

        let default = compose_input_field_defaults(ctx, fields).cloned();

        let Some(field_type) = fields::compose_input_field_types(ctx, fields.iter().copied()) else {
            return;
        };

        let description = fields.iter().find_map(|field| field.description()).map(|d| d.id);
        let directives = collect_composed_directives(fields.iter().map(|field| field.directives()));

        ctx.insert_field(ir::FieldIr {
            parent_name: input_object_name.id,
            field_name: first_field.name().id,
            field_type,
            arguments: Vec::new(),
            directives,
            description,
            default,
            resolvable_in: Vec::new(),
            provides: Vec::new(),
            requires: Vec::new(),
            overrides: Vec::new(),
            requires_authentication: false,
            requires_scopes: Vec::new(),
            subscription_filter: None,
        });
    });
}

fn compose_input_field_defaults<'a, 'b>(
    ctx: &mut Context<'a>,
    fields: &'b [FieldWalker<'a>],
) -> Option<&'b crate::subgraphs::Value> {
    let mut default: Option<(&'b crate::subgraphs::Value, &'b FieldWalker<'a>)> = None;

    for field in fields {
        let Some(value) = field.default() else { continue };

        match &mut default {
            None => default = Some((value, field)),
            Some((default, _)) if *default == value => (),
            Some((_, other_field)) => {
                ctx.diagnostics.push_fatal(format!(
                    r#"The input field {}.{} has incompatible default values in subgraphs "{}" and "{}"."#,
                    field.parent_definition().name().as_str(),
                    field.name().as_str(),
                    other_field.parent_definition().subgraph().name().as_str(),
                    field.parent_definition().subgraph().name().as_str(),
                ));
            }
        }
    }

    default.map(|(default, _)| default)
}
