use super::*;
use crate::subgraphs::EnumValueRecord;

pub(super) fn ingest_enum(ctx: &mut Context<'_>, definition_id: DefinitionId, enum_type: &ast::EnumType) {
    for value_definition in &enum_type.values {
        let value_definition = &value_definition.node;
        let value = ctx.subgraphs.strings.intern(value_definition.value.node.as_str());

        let description = value_definition
            .description
            .as_ref()
            .map(|description| ctx.subgraphs.strings.intern(description.node.as_str()));

        let directives = ctx.subgraphs.new_directive_site();

        ingest_directives(
            ctx,
            directives,
            &value_definition.directives,
            DirectiveLocations::ENUM_VALUE,
            |ctx| {
                format!(
                    "{}.{}",
                    ctx.subgraphs.walk(definition_id).name().as_str(),
                    ctx.subgraphs.strings.resolve(value),
                )
            },
        );

        if ctx
            .subgraphs
            .push_enum_value(definition_id, value, EnumValueRecord { directives, description })
            .is_none()
        {
            let enum_name = ctx.subgraphs.walk(definition_id).name().as_str().to_owned();
            let value = ctx.subgraphs.strings.resolve(value).to_owned();
            ctx.subgraphs.push_ingestion_diagnostic(
                ctx.subgraph_id,
                format!("Duplicate enum value `{value}` on the enum `{enum_name}`."),
            );
        }
    }
}
