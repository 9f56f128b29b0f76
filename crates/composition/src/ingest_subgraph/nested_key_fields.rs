use super::*;
use crate::subgraphs::{DefinitionWalker, KeySelection, NestedKeyFields};

/// After all bodies are ingested, walk the composite keys of the subgraph and
/// mark the fields selected on _other_ types as nested key fields. Those
/// fields do not need to be `@shareable` to appear in multiple subgraphs.
pub(super) fn ingest_nested_key_fields(ctx: &mut Context<'_>) {
    let subgraph_id = ctx.subgraph_id;

    ctx.subgraphs.with_nested_key_fields(|subgraphs, nested_key_fields| {
        let subgraph = subgraphs.walk(subgraph_id);

        for definition in subgraph.definitions() {
            for key in definition.entity_keys() {
                mark_nested_selections(definition, key.fields(), nested_key_fields, true);
            }
        }
    });
}

fn mark_nested_selections(
    definition: DefinitionWalker<'_>,
    selections: &[KeySelection],
    nested_key_fields: &mut NestedKeyFields,
    is_root: bool,
) {
    for selection in selections {
        let Some(field) = definition.find_field(selection.field) else {
            continue;
        };

        if !is_root {
            nested_key_fields.insert(field.field_id());
        }

        if selection.subselection.is_empty() {
            continue;
        }

        let field_type_name = field.r#type().record().definition_name;
        let Some(nested_definition) = definition
            .subgraphs
            .definition_by_name_id(field_type_name, definition.subgraph_id())
        else {
            continue;
        };

        mark_nested_selections(
            definition.walk(nested_definition),
            &selection.subselection,
            nested_key_fields,
            false,
        );
    }
}
