use crate::{
    subgraphs::{
        wrapping_is_at_least_as_restrictive, DefinitionKind, DefinitionWalker, FieldTypeRecord, FieldWalker,
        SubgraphId,
    },
    Subgraphs,
};

/// Every type implementing an interface must satisfy the structural contract
/// of the interface: define all of its fields, with response types at least
/// as restrictive, identical required arguments, and any extra argument
/// nullable. All violations for one implementing type are aggregated into a
/// single error.
pub(super) fn validate_interface_conformance(subgraphs: &mut Subgraphs, subgraph_id: SubgraphId) {
    let mut errors = Vec::new();

    for (impl_subgraph, implementer, implementee) in subgraphs.iter_interface_impls() {
        if impl_subgraph != subgraph_id {
            continue;
        }

        let Some(implementer_id) = subgraphs.definition_by_name_id(implementer, subgraph_id) else {
            continue;
        };
        let Some(interface_id) = subgraphs.definition_by_name_id(implementee, subgraph_id) else {
            // Reported by the type reference check.
            continue;
        };

        let implementer = subgraphs.walk(implementer_id);
        let interface = subgraphs.walk(interface_id);

        if interface.kind() != DefinitionKind::Interface {
            errors.push(format!(
                "The type `{}` cannot implement `{}`, which is {} and not an interface.",
                implementer.name().as_str(),
                interface.name().as_str(),
                a_or_an(interface.kind().as_str()),
            ));
            continue;
        }

        if let Some(error) = check_conformance(implementer, interface) {
            errors.push(error);
        }
    }

    for error in errors {
        subgraphs.push_ingestion_diagnostic(subgraph_id, error);
    }
}

fn check_conformance(implementer: DefinitionWalker<'_>, interface: DefinitionWalker<'_>) -> Option<String> {
    let mut unimplemented_fields = Vec::new();
    let mut field_type_violations = Vec::new();
    let mut argument_violations = Vec::new();

    for interface_field in interface.fields() {
        let Some(implementer_field) = implementer.find_field(interface_field.name().id) else {
            unimplemented_fields.push(interface_field.name().as_str().to_owned());
            continue;
        };

        if !response_type_conforms(implementer_field, interface_field) {
            field_type_violations.push(format!(
                "`{}` must be compatible with `{}` declared on the interface, found `{}`",
                implementer_field.name().as_str(),
                interface_field.r#type(),
                implementer_field.r#type(),
            ));
        }

        for interface_argument in interface_field.arguments() {
            let Some(implementer_argument) = implementer_field.argument_by_name(interface_argument.name().id) else {
                argument_violations.push(format!(
                    "the argument `{}({}:)` is missing",
                    interface_field.name().as_str(),
                    interface_argument.name().as_str(),
                ));
                continue;
            };

            if implementer_argument.r#type().record() != interface_argument.r#type().record() {
                argument_violations.push(format!(
                    "the argument `{}({}:)` must have the type `{}` declared on the interface, found `{}`",
                    interface_field.name().as_str(),
                    interface_argument.name().as_str(),
                    interface_argument.r#type(),
                    implementer_argument.r#type(),
                ));
            }
        }

        for implementer_argument in implementer_field.arguments() {
            let declared_on_interface = interface_field
                .argument_by_name(implementer_argument.name().id)
                .is_some();

            if !declared_on_interface && implementer_argument.r#type().is_required() {
                argument_violations.push(format!(
                    "the additional argument `{}({}:)` must be nullable",
                    interface_field.name().as_str(),
                    implementer_argument.name().as_str(),
                ));
            }
        }
    }

    if unimplemented_fields.is_empty() && field_type_violations.is_empty() && argument_violations.is_empty() {
        return None;
    }

    let mut message = format!(
        "The {} `{}` does not satisfy the interface `{}`.",
        implementer.kind().as_str(),
        implementer.name().as_str(),
        interface.name().as_str(),
    );

    if !unimplemented_fields.is_empty() {
        message.push_str(&format!(" Unimplemented fields: {}.", unimplemented_fields.join(", ")));
    }

    for violation in field_type_violations.iter().chain(&argument_violations) {
        message.push_str(&format!(" Also, {violation}."));
    }

    Some(message)
}

/// The response type of an implemented field may be more restrictive than the
/// interface's declaration, and it may be narrowed to a type implementing the
/// declared interface or belonging to the declared union.
fn response_type_conforms(implementer_field: FieldWalker<'_>, interface_field: FieldWalker<'_>) -> bool {
    let impl_record: &FieldTypeRecord = implementer_field.r#type().record();
    let interface_record: &FieldTypeRecord = interface_field.r#type().record();

    if impl_record.definition_name != interface_record.definition_name {
        let subgraph_id = implementer_field.parent_definition().subgraph_id();
        let subgraphs = implementer_field.subgraphs;

        let narrows_to_implementer = subgraphs
            .definition_by_name_id(interface_record.definition_name, subgraph_id)
            .map(|declared| subgraphs.walk(declared))
            .is_some_and(|declared| match declared.kind() {
                DefinitionKind::Interface => subgraphs.iter_interface_impls().any(|(subgraph, implementer, implementee)| {
                    subgraph == subgraph_id
                        && implementer == impl_record.definition_name
                        && implementee == interface_record.definition_name
                }),
                DefinitionKind::Union => declared
                    .union_members()
                    .any(|member| member.name().id == impl_record.definition_name),
                _ => false,
            });

        if !narrows_to_implementer {
            return false;
        }
    }

    wrapping_is_at_least_as_restrictive(&impl_record.wrapping, &interface_record.wrapping)
}

fn a_or_an(noun: &str) -> String {
    match noun.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => format!("an {noun}"),
        _ => format!("a {noun}"),
    }
}
