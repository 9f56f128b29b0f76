use super::*;

/// How enum values merge depends on how the enum is used across all
/// subgraphs:
///
/// - Input only: the intersection of the values. A value missing somewhere
///   can always be omitted by clients, but a value no subgraph accepts must
///   not be offered.
/// - Output only: the union of the values. Any subgraph may return any of its
///   values.
/// - Both: the definitions must agree exactly, anything else breaks one side.
pub(super) fn merge_enum_definitions<'a>(
    ctx: &mut Context<'a>,
    first: DefinitionWalker<'a>,
    definitions: &[DefinitionWalker<'a>],
) {
    let enum_name = first.name();

    let mut definition_ir = ir::DefinitionIr::new(enum_name.id, DefinitionKind::Enum);
    definition_ir.description = definitions.iter().find_map(|def| def.description()).map(|d| d.id);
    definition_ir.directives = collect_composed_directives(definitions.iter().map(|def| def.directives()));
    definition_ir.subgraphs = definitions.iter().map(|def| def.subgraph_id()).collect();

    let all_values: Vec<StringId> = {
        let mut values: Vec<StringId> = definitions
            .iter()
            .flat_map(|def| def.enum_values())
            .map(|value| value.name().id)
            .collect();
        values.sort_by_key(|value| ctx.subgraphs.walk(*value).as_str());
        values.dedup();
        values
    };

    let merged_values: Vec<StringId> = match ctx.type_usage(enum_name.id) {
        None | Some(TypeUsage::Output) => all_values.into_iter().collect(),
        Some(TypeUsage::Input) => all_values
            .into_iter()
            .filter(|value| definitions.iter().all(|def| def.enum_value(*value).is_some()))
            .collect(),
        Some(TypeUsage::Both) => {
            let mut consistent = Vec::new();

            for value in all_values {
                let missing_in: Vec<&str> = definitions
                    .iter()
                    .filter(|def| def.enum_value(value).is_none())
                    .map(|def| def.subgraph().name().as_str())
                    .collect();

                if missing_in.is_empty() {
                    consistent.push(value);
                } else {
                    ctx.diagnostics.push_fatal(format!(
                        "The enum `{}` is used both in input and output positions, so its values must match in all subgraphs, but `{}` is missing in `{}`.",
                        enum_name.as_str(),
                        ctx.subgraphs.walk(value).as_str(),
                        missing_in.join("`, `"),
                    ));
                }
            }

            consistent
        }
    };

    for value in merged_values {
        let sites = definitions
            .iter()
            .filter_map(|def| def.enum_value(value))
            .collect::<Vec<_>>();

        let directives = collect_composed_directives(sites.iter().map(|site| site.directives()));
        let description = sites.iter().find_map(|site| site.description()).map(|d| d.id);

        definition_ir.enum_values.push(ir::EnumValueIr {
            value,
            description,
            directives,
        });
    }

    ctx.insert_definition(definition_ir);
}
