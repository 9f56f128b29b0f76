use super::{Directive, FederatedGraph, Field, InputValueDefinition, StringId, TypeDefinition, TypeDefinitionKind};
use std::fmt::Write as _;

const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Boolean", "Int", "Float"];
const INDENT: &str = "  ";

/// Render the router-facing SDL, including the join scaffolding that records
/// which subgraph contributes what.
pub fn render_federated_sdl(graph: &FederatedGraph) -> String {
    let mut sdl = String::new();

    render_schema_definition(graph, &mut sdl);
    render_join_graph_enum(graph, &mut sdl);

    for (idx, definition) in graph.type_definitions.iter().enumerate() {
        render_type_definition(graph, super::TypeDefinitionId(idx), definition, &mut sdl, RenderMode::Federated);
    }

    sdl
}

/// Render the client-facing SDL: inaccessible types, fields, arguments and
/// enum values are removed, and so is all federation scaffolding.
pub fn render_api_sdl(graph: &FederatedGraph) -> String {
    let mut sdl = String::new();

    render_schema_definition(graph, &mut sdl);

    for (idx, definition) in graph.type_definitions.iter().enumerate() {
        if FederatedGraph::is_inaccessible(&definition.directives) {
            continue;
        }

        render_type_definition(graph, super::TypeDefinitionId(idx), definition, &mut sdl, RenderMode::Api);
    }

    sdl
}

#[derive(Clone, Copy, PartialEq)]
enum RenderMode {
    Federated,
    Api,
}

fn render_schema_definition(graph: &FederatedGraph, sdl: &mut String) {
    let roots = [
        ("query", graph.query_type, "Query"),
        ("mutation", graph.mutation_type, "Mutation"),
        ("subscription", graph.subscription_type, "Subscription"),
    ];

    let needs_schema_definition = roots.iter().any(|(_, root, default_name)| {
        root.is_some_and(|root| graph.str(graph.type_definitions[root.0].name) != *default_name)
    });

    if !needs_schema_definition {
        return;
    }

    sdl.push_str("schema {\n");

    for (operation, root, _) in roots {
        if let Some(root) = root {
            let name = graph.str(graph.type_definitions[root.0].name);
            writeln!(sdl, "{INDENT}{operation}: {name}").ok();
        }
    }

    sdl.push_str("}\n\n");
}

/// The `join__Graph` enum maps an enum value per subgraph to its name and
/// url, so the join directives can refer to subgraphs by value.
fn render_join_graph_enum(graph: &FederatedGraph, sdl: &mut String) {
    if graph.subgraphs.is_empty() {
        return;
    }

    sdl.push_str("enum join__Graph {\n");

    for subgraph in &graph.subgraphs {
        let name = graph.str(subgraph.name);
        let url = graph.str(subgraph.url);
        writeln!(
            sdl,
            "{INDENT}{} @join__graph(name: \"{name}\", url: \"{url}\")",
            join_graph_enum_value(name),
        )
        .ok();
    }

    sdl.push_str("}\n\n");
}

pub(crate) fn join_graph_enum_value(subgraph_name: &str) -> String {
    let mut out = String::with_capacity(subgraph_name.len());

    for character in subgraph_name.chars() {
        if character.is_ascii_alphanumeric() {
            out.push(character.to_ascii_uppercase());
        } else {
            out.push('_');
        }
    }

    if out.chars().next().map_or(true, |first| first.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}

fn render_type_definition(
    graph: &FederatedGraph,
    definition_id: super::TypeDefinitionId,
    definition: &TypeDefinition,
    sdl: &mut String,
    mode: RenderMode,
) {
    let name = graph.str(definition.name);

    if definition.kind == TypeDefinitionKind::Scalar && BUILTIN_SCALARS.contains(&name) {
        return;
    }

    render_description(graph, definition.description, "", sdl);

    let keyword = match definition.kind {
        TypeDefinitionKind::Scalar => "scalar",
        TypeDefinitionKind::Object => "type",
        TypeDefinitionKind::Interface => "interface",
        TypeDefinitionKind::Union => "union",
        TypeDefinitionKind::Enum => "enum",
        TypeDefinitionKind::InputObject => "input",
    };

    sdl.push_str(keyword);
    sdl.push(' ');
    sdl.push_str(name);

    if !definition.implements.is_empty() {
        let implements = definition
            .implements
            .iter()
            .map(|interface| graph.str(*interface))
            .collect::<Vec<_>>()
            .join(" & ");
        sdl.push_str(" implements ");
        sdl.push_str(&implements);
    }

    render_directives(graph, &definition.directives, sdl, mode);

    if mode == RenderMode::Federated {
        for key in &definition.keys {
            let subgraph_name = graph.str(graph.subgraphs[key.subgraph_id.0].name);
            let graph_value = join_graph_enum_value(subgraph_name);
            let fields = graph.str(key.fields);

            write!(sdl, " @join__type(graph: {graph_value}, key: \"{fields}\"").ok();

            if !key.resolvable {
                sdl.push_str(", resolvable: false");
            }

            if key.is_interface_object {
                sdl.push_str(", isInterfaceObject: true");
            }

            sdl.push(')');
        }
    }

    match definition.kind {
        TypeDefinitionKind::Scalar => {
            sdl.push_str("\n\n");
        }
        TypeDefinitionKind::Union => {
            let members = definition
                .union_members
                .iter()
                .map(|member| graph.str(*member))
                .filter(|member| {
                    mode == RenderMode::Federated || member_is_accessible(graph, member)
                })
                .collect::<Vec<_>>()
                .join(" | ");
            sdl.push_str(" = ");
            sdl.push_str(&members);
            sdl.push_str("\n\n");
        }
        TypeDefinitionKind::Enum => {
            sdl.push_str(" {\n");

            for value in &definition.enum_values {
                if mode == RenderMode::Api && FederatedGraph::is_inaccessible(&value.directives) {
                    continue;
                }

                render_description(graph, value.description, INDENT, sdl);
                sdl.push_str(INDENT);
                sdl.push_str(graph.str(value.value));
                render_directives(graph, &value.directives, sdl, mode);
                sdl.push('\n');
            }

            sdl.push_str("}\n\n");
        }
        TypeDefinitionKind::Object | TypeDefinitionKind::Interface | TypeDefinitionKind::InputObject => {
            sdl.push_str(" {\n");

            for field in graph.fields_of(definition_id) {
                if mode == RenderMode::Api && FederatedGraph::is_inaccessible(&field.directives) {
                    continue;
                }

                render_field(graph, field, sdl, mode);
            }

            sdl.push_str("}\n\n");
        }
    }
}

fn member_is_accessible(graph: &FederatedGraph, member: &str) -> bool {
    graph
        .definition_by_name(member)
        .map(|definition| !FederatedGraph::is_inaccessible(&definition.directives))
        .unwrap_or(true)
}

fn render_field(graph: &FederatedGraph, field: &Field, sdl: &mut String, mode: RenderMode) {
    render_description(graph, field.description, INDENT, sdl);

    sdl.push_str(INDENT);
    sdl.push_str(graph.str(field.name));

    if !field.arguments.is_empty() {
        let arguments = field
            .arguments
            .iter()
            .filter(|argument| mode == RenderMode::Federated || !FederatedGraph::is_inaccessible(&argument.directives))
            .map(|argument| render_input_value(graph, argument, mode))
            .collect::<Vec<_>>();

        if !arguments.is_empty() {
            write!(sdl, "({})", arguments.join(", ")).ok();
        }
    }

    sdl.push_str(": ");
    sdl.push_str(&field.r#type.render(graph));

    if let Some(default) = field.default {
        write!(sdl, " = {}", graph.str(default)).ok();
    }

    render_directives(graph, &field.directives, sdl, mode);

    if mode == RenderMode::Federated {
        render_join_field(graph, field, sdl);
    }

    sdl.push('\n');
}

fn render_join_field(graph: &FederatedGraph, field: &Field, sdl: &mut String) {
    for subgraph_id in &field.resolvable_in {
        let graph_value = join_graph_enum_value(graph.str(graph.subgraphs[subgraph_id.0].name));
        let provides = field
            .provides
            .iter()
            .find(|(provides_subgraph, _)| provides_subgraph == subgraph_id)
            .map(|(_, selection)| format!(", provides: \"{}\"", graph.str(*selection)))
            .unwrap_or_default();
        let requires = field
            .requires
            .iter()
            .find(|(requires_subgraph, _)| requires_subgraph == subgraph_id)
            .map(|(_, selection)| format!(", requires: \"{}\"", graph.str(*selection)))
            .unwrap_or_default();

        write!(sdl, " @join__field(graph: {graph_value}{provides}{requires})").ok();
    }

    for (subgraph_id, from) in &field.overrides {
        let graph_value = join_graph_enum_value(graph.str(graph.subgraphs[subgraph_id.0].name));
        write!(
            sdl,
            " @join__field(graph: {graph_value}, override: \"{}\")",
            graph.str(*from),
        )
        .ok();
    }
}

fn render_input_value(graph: &FederatedGraph, input_value: &InputValueDefinition, mode: RenderMode) -> String {
    let mut out = format!("{}: {}", graph.str(input_value.name), input_value.r#type.render(graph));

    if let Some(default) = input_value.default {
        write!(out, " = {}", graph.str(default)).ok();
    }

    render_directives(graph, &input_value.directives, &mut out, mode);

    out
}

fn render_directives(graph: &FederatedGraph, directives: &[Directive], sdl: &mut String, mode: RenderMode) {
    for directive in directives {
        match directive {
            Directive::Inaccessible => {
                if mode == RenderMode::Federated {
                    sdl.push_str(" @inaccessible");
                }
            }
            Directive::Authenticated => {
                if mode == RenderMode::Federated {
                    sdl.push_str(" @authenticated");
                }
            }
            Directive::Deprecated { reason } => match reason {
                Some(reason) => {
                    write!(sdl, " @deprecated(reason: \"{}\")", graph.str(*reason)).ok();
                }
                None => sdl.push_str(" @deprecated"),
            },
            Directive::RequiresScopes(scopes) => {
                if mode == RenderMode::Federated {
                    let scopes = scopes
                        .iter()
                        .map(|scopes| {
                            format!(
                                "[{}]",
                                scopes
                                    .iter()
                                    .map(|scope| format!("\"{}\"", graph.str(*scope)))
                                    .collect::<Vec<_>>()
                                    .join(", "),
                            )
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(sdl, " @requiresScopes(scopes: [{scopes}])").ok();
                }
            }
            Directive::Tag(tag) => {
                if mode == RenderMode::Federated {
                    write!(sdl, " @tag(name: \"{}\")", graph.str(*tag)).ok();
                }
            }
            Directive::Other { name, arguments } => {
                let arguments_str = graph.str(*arguments);

                if arguments_str.is_empty() {
                    write!(sdl, " @{}", graph.str(*name)).ok();
                } else {
                    write!(sdl, " @{}({arguments_str})", graph.str(*name)).ok();
                }
            }
        }
    }
}

fn render_description(graph: &FederatedGraph, description: Option<StringId>, indent: &str, sdl: &mut String) {
    let Some(description) = description else {
        return;
    };

    writeln!(sdl, "{indent}\"\"\"{}\"\"\"", graph.str(description)).ok();
}
