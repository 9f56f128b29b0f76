use super::*;

/// An entity interface is an interface with a `@key`. Subgraphs that cannot
/// define the interface itself contribute to it through an object type
/// annotated with `@interfaceObject` carrying the same key; the object stands
/// in for all concrete implementers of the interface in that subgraph, and
/// its fields are added to the composed interface and to every implementer.
pub(super) fn merge_entity_interface_definitions<'a>(
    ctx: &mut Context<'a>,
    first: DefinitionWalker<'a>,
    definitions: &[DefinitionWalker<'a>],
) {
    let interface_name = first.name();

    let interface_defs = || {
        definitions
            .iter()
            .filter(|definition| definition.kind() == DefinitionKind::Interface)
    };

    let Some(interface_def) = interface_defs().next().copied() else {
        ctx.diagnostics.push_fatal(format!(
            "The entity interface `{}` is not defined as an interface in any subgraph.",
            interface_name.as_str(),
        ));
        return;
    };

    // Every subgraph defining the interface must know the same set of
    // implementers, otherwise a key jump into that subgraph can produce
    // concrete types the other subgraphs cannot represent.
    let all_implementers: BTreeSet<StringId> = interface_defs()
        .flat_map(|interface| {
            interface
                .subgraph()
                .interface_implementers(interface_name.id)
                .map(|definition| definition.name().id)
        })
        .collect();

    for interface in interface_defs() {
        let implementers: BTreeSet<StringId> = interface
            .subgraph()
            .interface_implementers(interface_name.id)
            .map(|definition| definition.name().id)
            .collect();

        if implementers != all_implementers {
            let subgraph_name = interface.subgraph().name().as_str();
            let missing = all_implementers
                .difference(&implementers)
                .map(|id| ctx.subgraphs.walk(*id).as_str())
                .join(", ");
            ctx.diagnostics.push_fatal(format!(
                r#"[{subgraph_name}]: The interface `{}` is an entity interface, but the subgraph is missing some of its supergraph implementation types. It should define: {missing}."#,
                interface_name.as_str(),
            ));
        }

        if interface.directives().interface_object() {
            ctx.diagnostics.push_fatal(format!(
                "[{}] The @interfaceObject directive is not valid on interfaces (on `{}`).",
                interface.subgraph().name().as_str(),
                interface_name.as_str(),
            ));
        }
    }

    let Some(expected_key) = interface_def.entity_keys().next() else {
        ctx.diagnostics.push_fatal(format!(
            "The entity interface `{}` is missing a key in the `{}` subgraph.",
            interface_name.as_str(),
            interface_def.subgraph().name().as_str(),
        ));
        return;
    };

    let mut definition_ir = ir::DefinitionIr::new(interface_name.id, DefinitionKind::Interface);
    definition_ir.description = definitions.iter().find_map(|def| def.description()).map(|d| d.id);
    definition_ir.directives = collect_composed_directives(definitions.iter().map(|def| def.directives()));
    definition_ir.subgraphs = definitions.iter().map(|def| def.subgraph_id()).collect();

    for definition in interface_defs() {
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

    // The object type definitions are the interface object counterparts of
    // the entity interface. This is the one sanctioned case of a definition
    // changing kind: the object is promoted into the interface.
    for definition in definitions.iter().filter(|definition| definition.kind() == DefinitionKind::Object) {
        if !definition.directives().interface_object() {
            ctx.diagnostics.push_fatal(format!(
                "`{}` is an entity interface but the object type `{}` is missing the @interfaceObject directive in the `{}` subgraph.",
                interface_name.as_str(),
                definition.name().as_str(),
                definition.subgraph().name().as_str(),
            ));
        }

        match definition.entity_keys().next() {
            None => {
                ctx.diagnostics.push_fatal(format!(
                    "The object type `{}` is annotated with @interfaceObject but missing a key in the `{}` subgraph.",
                    definition.name().as_str(),
                    definition.subgraph().name().as_str(),
                ));
            }
            Some(key) if key.canonical() == expected_key.canonical() => (),
            Some(_) => {
                ctx.diagnostics.push_fatal(format!(
                    "[{}] The object type `{}` is annotated with @interfaceObject but has a different key than the entity interface `{}`.",
                    definition.subgraph().name().as_str(),
                    definition.name().as_str(),
                    interface_name.as_str(),
                ));
            }
        }

        for key in definition.entity_keys() {
            definition_ir.keys.push(ir::KeyIr {
                subgraph_id: definition.subgraph_id(),
                key_id: key.id,
                is_interface_object: true,
                resolvable: key.is_resolvable(),
            });
        }
    }

    // Each concrete implementer must carry the same key as the entity
    // interface, otherwise interface object contributions cannot be resolved
    // on it.
    for implementer in ctx.subgraphs.iter_implementers_for_interface(interface_name.id) {
        match implementer.entity_keys().next() {
            Some(key) if key.canonical() == expected_key.canonical() => (),
            Some(_) => ctx.diagnostics.push_fatal(format!(
                "[{}] The object type `{}` implements the entity interface `{}` but does not have the same key. The key must match exactly.",
                implementer.subgraph().name().as_str(),
                implementer.name().as_str(),
                interface_name.as_str(),
            )),
            None => ctx.diagnostics.push_fatal(format!(
                "[{}] The object type `{}` implements the entity interface `{}` but is missing its key.",
                implementer.subgraph().name().as_str(),
                implementer.name().as_str(),
                interface_name.as_str(),
            )),
        }
    }

    ctx.record_entity_interface(
        interface_name.id,
        ctx.subgraphs
            .iter_implementers_for_interface(interface_name.id)
            .map(|implementer| implementer.name().id)
            .collect(),
    );

    ctx.insert_definition(definition_ir);

    // Fields from the interface definitions and the interface object
    // definitions merge under the interface's name, so the regular field
    // group composition covers both.
    let subgraphs = ctx.subgraphs;
    subgraphs.iter_field_groups(interface_name.id, |fields| {
        let Some(first_field) = fields.first() else {
            return;
        };
        object::compose_object_fields(ctx, *first_field, fields, false);
    });
}
