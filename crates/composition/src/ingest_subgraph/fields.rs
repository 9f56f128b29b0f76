use super::*;
use crate::subgraphs::FieldIngest;

pub(super) fn ingest_fields(
    ctx: &mut Context<'_>,
    definition_id: DefinitionId,
    fields: &[Positioned<ast::FieldDefinition>],
) {
    for field in fields {
        let field = &field.node;
        let field_name = field.name.node.as_str();

        if field_name.starts_with("__") || matches!(field_name, "_entities" | "_service") {
            continue;
        }

        let field_type = match ctx.subgraphs.intern_field_type(&field.ty.node) {
            Ok(field_type) => field_type,
            Err(error) => {
                let type_name = ctx.subgraphs.walk(definition_id).name().as_str().to_owned();
                ctx.subgraphs.push_ingestion_diagnostic(
                    ctx.subgraph_id,
                    format!("Invalid type for the field `{type_name}.{field_name}`: {error}"),
                );
                continue;
            }
        };

        let referenced_type = ctx.subgraphs.walk(field_type).type_name().id;
        ctx.subgraphs.push_type_reference(ctx.subgraph_id, referenced_type);

        let description = field
            .description
            .as_ref()
            .map(|description| ctx.subgraphs.strings.intern(description.node.as_str()));

        let directives = ctx.subgraphs.new_directive_site();

        ingest_directives(ctx, directives, &field.directives, DirectiveLocations::FIELD_DEFINITION, |ctx| {
            format!("{}.{field_name}", ctx.subgraphs.walk(definition_id).name().as_str())
        });

        let Some(field_id) = ctx.subgraphs.push_field(FieldIngest {
            parent_definition_id: definition_id,
            field_name,
            field_type,
            description,
            directives,
        }) else {
            let type_name = ctx.subgraphs.walk(definition_id).name().as_str().to_owned();
            ctx.subgraphs.push_ingestion_diagnostic(
                ctx.subgraph_id,
                format!("Duplicate definition of the field `{type_name}.{field_name}`."),
            );
            continue;
        };

        ingest_field_arguments(ctx, field_id, &field.arguments);
    }
}

fn ingest_field_arguments(
    ctx: &mut Context<'_>,
    field_id: crate::subgraphs::FieldId,
    arguments: &[Positioned<ast::InputValueDefinition>],
) {
    for argument in arguments {
        let argument = &argument.node;
        let argument_name = ctx.subgraphs.strings.intern(argument.name.node.as_str());

        let r#type = match ctx.subgraphs.intern_field_type(&argument.ty.node) {
            Ok(r#type) => r#type,
            Err(error) => {
                let field = ctx.subgraphs.walk_field(field_id);
                let location = format!("{}.{}", field.parent_definition().name().as_str(), field.name().as_str());
                let argument_name = ctx.subgraphs.strings.resolve(argument_name).to_owned();
                ctx.subgraphs.push_ingestion_diagnostic(
                    ctx.subgraph_id,
                    format!("Invalid type for the argument `{location}({argument_name}:)`: {error}"),
                );
                continue;
            }
        };

        let referenced_type = ctx.subgraphs.walk(r#type).type_name().id;
        ctx.subgraphs.push_type_reference(ctx.subgraph_id, referenced_type);

        let description = argument
            .description
            .as_ref()
            .map(|description| ctx.subgraphs.strings.intern(description.node.as_str()));

        let directives = ctx.subgraphs.new_directive_site();

        ingest_directives(
            ctx,
            directives,
            &argument.directives,
            DirectiveLocations::ARGUMENT_DEFINITION,
            |ctx| {
                let field = ctx.subgraphs.walk_field(field_id);
                format!(
                    "{}.{}({}:)",
                    field.parent_definition().name().as_str(),
                    field.name().as_str(),
                    ctx.subgraphs.strings.resolve(argument_name),
                )
            },
        );

        let default = argument
            .default_value
            .as_ref()
            .map(|default| ast_value_to_subgraph_value(&default.node, ctx.subgraphs));

        if ctx
            .subgraphs
            .insert_field_argument(field_id, argument_name, r#type, directives, description, default)
            .is_none()
        {
            let field = ctx.subgraphs.walk_field(field_id);
            let location = format!("{}.{}", field.parent_definition().name().as_str(), field.name().as_str());
            let argument_name = ctx.subgraphs.strings.resolve(argument_name).to_owned();
            ctx.subgraphs.push_ingestion_diagnostic(
                ctx.subgraph_id,
                format!("Duplicate definition of the argument `{location}({argument_name}:)`."),
            );
        }
    }
}

/// Input object fields are stored as fields without arguments.
pub(super) fn ingest_input_fields(
    ctx: &mut Context<'_>,
    definition_id: DefinitionId,
    fields: &[Positioned<ast::InputValueDefinition>],
) {
    for field in fields {
        let field = &field.node;
        let field_name = field.name.node.as_str();

        let field_type = match ctx.subgraphs.intern_field_type(&field.ty.node) {
            Ok(field_type) => field_type,
            Err(error) => {
                let type_name = ctx.subgraphs.walk(definition_id).name().as_str().to_owned();
                ctx.subgraphs.push_ingestion_diagnostic(
                    ctx.subgraph_id,
                    format!("Invalid type for the input field `{type_name}.{field_name}`: {error}"),
                );
                continue;
            }
        };

        let referenced_type = ctx.subgraphs.walk(field_type).type_name().id;
        ctx.subgraphs.push_type_reference(ctx.subgraph_id, referenced_type);

        let description = field
            .description
            .as_ref()
            .map(|description| ctx.subgraphs.strings.intern(description.node.as_str()));

        let directives = ctx.subgraphs.new_directive_site();

        ingest_directives(
            ctx,
            directives,
            &field.directives,
            DirectiveLocations::INPUT_FIELD_DEFINITION,
            |ctx| format!("{}.{field_name}", ctx.subgraphs.walk(definition_id).name().as_str()),
        );

        match ctx.subgraphs.push_field(FieldIngest {
            parent_definition_id: definition_id,
            field_name,
            field_type,
            description,
            directives,
        }) {
            Some(field_id) => {
                if let Some(default) = &field.default_value {
                    let default = ast_value_to_subgraph_value(&default.node, ctx.subgraphs);
                    ctx.subgraphs.insert_field_default(field_id, default);
                }
            }
            None => {
                let type_name = ctx.subgraphs.walk(definition_id).name().as_str().to_owned();
                ctx.subgraphs.push_ingestion_diagnostic(
                    ctx.subgraph_id,
                    format!("Duplicate definition of the input field `{type_name}.{field_name}`."),
                );
            }
        }
    }
}
