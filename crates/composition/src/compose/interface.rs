use super::*;
use crate::subgraphs::{wrapping_is_at_least_as_restrictive, FieldTypeRecord};

pub(super) fn merge_interface_definitions<'a>(
    ctx: &mut Context<'a>,
    first: DefinitionWalker<'a>,
    definitions: &[DefinitionWalker<'a>],
) {
    let interface_name = first.name();

    let mut definition_ir = ir::DefinitionIr::new(interface_name.id, DefinitionKind::Interface);
    definition_ir.description = definitions.iter().find_map(|def| def.description()).map(|d| d.id);
    definition_ir.directives = collect_composed_directives(definitions.iter().map(|def| def.directives()));
    definition_ir.subgraphs = definitions.iter().map(|def| def.subgraph_id()).collect();

    for definition in definitions {
        definition_ir.implements.extend(definition.implemented_interfaces());
    }

    ctx.insert_definition(definition_ir);

    let subgraphs = ctx.subgraphs;
    subgraphs.iter_field_groups(interface_name.id, |fields| {
        let Some(first_field) = fields.first() else {
            return;
        };
        object::compose_object_fields(ctx, *first_field, fields, false);
    });
}

/// The same conformance contract the normalizer checks per subgraph, but over
/// the merged shapes: a subgraph may rely on an interface field that another
/// subgraph's definition of the implementing type does not carry, which only
/// becomes visible after the merge.
pub(super) fn validate_composed_interfaces(ctx: &mut Context<'_>) {
    let mut errors = Vec::new();

    {
        let ir = ctx.ir();

        let mut fields_by_parent: BTreeMap<StringId, Vec<&ir::FieldIr>> = BTreeMap::new();
        for field in &ir.fields {
            fields_by_parent.entry(field.parent_name).or_default().push(field);
        }
        let empty = Vec::new();

        for definition in &ir.definitions {
            for implemented in &definition.implements {
                let Some(interface) = ir.get_definition(*implemented) else {
                    continue;
                };

                if interface.kind != DefinitionKind::Interface {
                    continue;
                }

                // Implementers of an entity interface receive the interface's
                // remaining fields when the federated graph is emitted, so
                // they satisfy it by construction.
                let is_entity_interface_implementer = ir
                    .entity_interfaces
                    .get(implemented)
                    .is_some_and(|implementers| implementers.contains(&definition.name));

                if is_entity_interface_implementer {
                    continue;
                }

                let implementer_fields = fields_by_parent.get(&definition.name).unwrap_or(&empty);
                let interface_fields = fields_by_parent.get(&interface.name).unwrap_or(&empty);

                if let Some(error) = check_composed_conformance(
                    ctx.subgraphs,
                    ir,
                    definition,
                    interface,
                    implementer_fields,
                    interface_fields,
                ) {
                    errors.push(error);
                }
            }
        }
    }

    for error in errors {
        ctx.diagnostics.push_fatal(error);
    }
}

fn check_composed_conformance(
    subgraphs: &Subgraphs,
    ir: &CompositionIr,
    implementer: &ir::DefinitionIr,
    interface: &ir::DefinitionIr,
    implementer_fields: &[&ir::FieldIr],
    interface_fields: &[&ir::FieldIr],
) -> Option<String> {
    let mut unimplemented_fields = Vec::new();
    let mut violations = Vec::new();

    for interface_field in interface_fields {
        let field_name = subgraphs.walk(interface_field.field_name).as_str();

        let Some(implementer_field) = implementer_fields
            .iter()
            .find(|field| field.field_name == interface_field.field_name)
        else {
            unimplemented_fields.push(field_name.to_owned());
            continue;
        };

        if !composed_type_conforms(ir, &implementer_field.field_type, &interface_field.field_type) {
            violations.push(format!(
                "`{field_name}` must be compatible with `{}` declared on the interface, found `{}`",
                render_type(subgraphs, &interface_field.field_type),
                render_type(subgraphs, &implementer_field.field_type),
            ));
        }

        let interface_field_inaccessible = interface_field
            .directives
            .iter()
            .any(|directive| matches!(directive, ir::Directive::Inaccessible));
        let implementer_field_inaccessible = implementer_field
            .directives
            .iter()
            .any(|directive| matches!(directive, ir::Directive::Inaccessible));

        if implementer_field_inaccessible && !interface_field_inaccessible && !interface.is_inaccessible() {
            violations.push(format!(
                "`{field_name}` is @inaccessible on the implementer but not on the interface"
            ));
        }

        for interface_argument in &interface_field.arguments {
            let argument_name = subgraphs.walk(interface_argument.name).as_str();

            let Some(implementer_argument) = implementer_field
                .arguments
                .iter()
                .find(|argument| argument.name == interface_argument.name)
            else {
                violations.push(format!("the argument `{field_name}({argument_name}:)` is missing"));
                continue;
            };

            if implementer_argument.r#type != interface_argument.r#type {
                violations.push(format!(
                    "the argument `{field_name}({argument_name}:)` must have the type `{}` declared on the interface, found `{}`",
                    render_type(subgraphs, &interface_argument.r#type),
                    render_type(subgraphs, &implementer_argument.r#type),
                ));
            }
        }

        for implementer_argument in &implementer_field.arguments {
            let declared = interface_field
                .arguments
                .iter()
                .any(|argument| argument.name == implementer_argument.name);

            if !declared && implementer_argument.r#type.is_required() {
                violations.push(format!(
                    "the additional argument `{field_name}({}:)` must be nullable",
                    subgraphs.walk(implementer_argument.name).as_str(),
                ));
            }
        }
    }

    if unimplemented_fields.is_empty() && violations.is_empty() {
        return None;
    }

    let mut message = format!(
        "The composed {} `{}` does not satisfy the interface `{}`.",
        implementer.kind.as_str(),
        subgraphs.walk(implementer.name).as_str(),
        subgraphs.walk(interface.name).as_str(),
    );

    if !unimplemented_fields.is_empty() {
        message.push_str(&format!(" Unimplemented fields: {}.", unimplemented_fields.join(", ")));
    }

    for violation in violations {
        message.push_str(&format!(" Also, {violation}."));
    }

    Some(message)
}

fn composed_type_conforms(ir: &CompositionIr, implementer: &FieldTypeRecord, interface: &FieldTypeRecord) -> bool {
    if implementer.definition_name != interface.definition_name {
        let narrows = ir
            .get_definition(interface.definition_name)
            .is_some_and(|declared| match declared.kind {
                DefinitionKind::Interface => ir
                    .get_definition(implementer.definition_name)
                    .is_some_and(|definition| definition.implements.contains(&interface.definition_name)),
                DefinitionKind::Union => declared.union_members.contains(&implementer.definition_name),
                _ => false,
            });

        if !narrows {
            return false;
        }
    }

    wrapping_is_at_least_as_restrictive(&implementer.wrapping, &interface.wrapping)
}

pub(super) fn render_type(subgraphs: &Subgraphs, record: &FieldTypeRecord) -> String {
    record.render(subgraphs.walk(record.definition_name).as_str())
}
