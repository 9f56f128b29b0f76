use crate::{
    composition_ir::{self as ir, CompositionIr},
    federated_graph as federated,
    result::CompositionArtifacts,
    router_config::{ConfigurationData, FieldConfiguration, RequiredFieldsConfiguration, SubgraphConfiguration},
    subgraphs::{canonicalize_selection_str, DefinitionKind, StringId, Subgraphs, Value, BUILTIN_SCALARS},
};
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// Convert the composition IR into the federated graph and the router
/// configuration artifacts.
pub(crate) fn emit_federated_graph(ir: CompositionIr, subgraphs: &Subgraphs) -> CompositionArtifacts {
    let mut emitter = Emitter {
        strings: IndexSet::new(),
        subgraphs,
    };

    let mut graph = federated::FederatedGraph::default();

    for subgraph in subgraphs.iter_subgraphs() {
        let name = emitter.insert_str(subgraph.name().as_str());
        let url = emitter.insert_str(subgraph.url().as_str());
        graph.subgraphs.push(federated::Subgraph { name, url });
    }

    let mut definition_ids: BTreeMap<StringId, federated::TypeDefinitionId> = BTreeMap::new();

    for definition in &ir.definitions {
        let name_str = subgraphs.walk(definition.name).as_str();

        if definition.kind == DefinitionKind::Scalar && BUILTIN_SCALARS.contains(&name_str) {
            continue;
        }

        let id = federated::TypeDefinitionId(graph.type_definitions.len());
        definition_ids.insert(definition.name, id);

        let type_definition = emitter.emit_definition(definition);
        graph.type_definitions.push(type_definition);
    }

    let fields = collect_fields_with_entity_interface_copies(&ir);

    let mut emitted_fields = Vec::new();
    for (parent_name, field) in &fields {
        let Some(parent_definition_id) = definition_ids.get(parent_name) else {
            continue;
        };

        let emitted = emitter.emit_field(*parent_definition_id, field);
        let sort_key = (
            *parent_definition_id,
            subgraphs.walk(field.field_name).as_str().to_owned(),
        );
        emitted_fields.push((sort_key, emitted));
    }

    emitted_fields.sort_by(|(a, _), (b, _)| a.cmp(b));
    graph.fields = emitted_fields.into_iter().map(|(_, field)| field).collect();

    graph.query_type = ir.query_type.and_then(|name| definition_ids.get(&name).copied());
    graph.mutation_type = ir.mutation_type.and_then(|name| definition_ids.get(&name).copied());
    graph.subscription_type = ir.subscription_type.and_then(|name| definition_ids.get(&name).copied());

    let configuration_by_type_name = build_federated_configuration(&ir, &fields, subgraphs);
    let field_configurations = build_field_configurations(&ir, subgraphs);
    let subgraph_configurations = build_subgraph_configurations(&ir, subgraphs);

    graph.strings = emitter.strings.into_iter().collect();

    CompositionArtifacts {
        federated_graph: graph,
        configuration_by_type_name,
        field_configurations,
        subgraph_configurations,
    }
}

struct Emitter<'a> {
    strings: IndexSet<String>,
    subgraphs: &'a Subgraphs,
}

impl Emitter<'_> {
    fn insert_str(&mut self, string: &str) -> federated::StringId {
        let idx = self
            .strings
            .get_index_of(string)
            .unwrap_or_else(|| self.strings.insert_full(string.to_owned()).0);
        federated::StringId(idx)
    }

    fn insert(&mut self, id: StringId) -> federated::StringId {
        let string = self.subgraphs.walk(id).as_str();
        self.insert_str(string)
    }

    fn emit_definition(&mut self, definition: &ir::DefinitionIr) -> federated::TypeDefinition {
        federated::TypeDefinition {
            name: self.insert(definition.name),
            kind: match definition.kind {
                DefinitionKind::Scalar => federated::TypeDefinitionKind::Scalar,
                DefinitionKind::Object => federated::TypeDefinitionKind::Object,
                DefinitionKind::Interface => federated::TypeDefinitionKind::Interface,
                DefinitionKind::Union => federated::TypeDefinitionKind::Union,
                DefinitionKind::Enum => federated::TypeDefinitionKind::Enum,
                DefinitionKind::InputObject => federated::TypeDefinitionKind::InputObject,
            },
            description: definition.description.map(|id| self.insert(id)),
            directives: self.emit_directives(&definition.directives),
            implements: definition.implements.iter().map(|id| self.insert(*id)).collect(),
            union_members: definition.union_members.iter().map(|id| self.insert(*id)).collect(),
            enum_values: definition
                .enum_values
                .iter()
                .map(|value| federated::EnumValue {
                    value: self.insert(value.value),
                    description: value.description.map(|id| self.insert(id)),
                    directives: self.emit_directives(&value.directives),
                })
                .collect(),
            keys: definition
                .keys
                .iter()
                .map(|key| {
                    let rendered = self
                        .subgraphs
                        .render_selection_set(self.subgraphs.walk(key.key_id).fields());
                    federated::Key {
                        subgraph_id: federated::SubgraphId(key.subgraph_id.idx()),
                        fields: self.insert_str(&rendered),
                        resolvable: key.resolvable,
                        is_interface_object: key.is_interface_object,
                    }
                })
                .collect(),
            subgraphs: definition
                .subgraphs
                .iter()
                .map(|subgraph_id| federated::SubgraphId(subgraph_id.idx()))
                .collect(),
        }
    }

    fn emit_field(&mut self, parent_definition_id: federated::TypeDefinitionId, field: &ir::FieldIr) -> federated::Field {
        federated::Field {
            parent_definition_id,
            name: self.insert(field.field_name),
            r#type: self.emit_field_type(&field.field_type),
            arguments: field
                .arguments
                .iter()
                .map(|argument| federated::InputValueDefinition {
                    name: self.insert(argument.name),
                    r#type: self.emit_field_type(&argument.r#type),
                    directives: self.emit_directives(&argument.directives),
                    description: argument.description.map(|id| self.insert(id)),
                    default: argument.default.as_ref().map(|default| {
                        let rendered = render_value(default, self.subgraphs);
                        self.insert_str(&rendered)
                    }),
                })
                .collect(),
            directives: self.emit_directives(&field.directives),
            description: field.description.map(|id| self.insert(id)),
            default: field.default.as_ref().map(|default| {
                let rendered = render_value(default, self.subgraphs);
                self.insert_str(&rendered)
            }),
            resolvable_in: field
                .resolvable_in
                .iter()
                .map(|subgraph_id| federated::SubgraphId(subgraph_id.idx()))
                .collect(),
            provides: field
                .provides
                .iter()
                .map(|(subgraph_id, selection)| {
                    (federated::SubgraphId(subgraph_id.idx()), self.insert_str(selection))
                })
                .collect(),
            requires: field
                .requires
                .iter()
                .map(|(subgraph_id, selection)| {
                    (federated::SubgraphId(subgraph_id.idx()), self.insert_str(selection))
                })
                .collect(),
            overrides: field
                .overrides
                .iter()
                .map(|(subgraph_id, from)| (federated::SubgraphId(subgraph_id.idx()), self.insert(*from)))
                .collect(),
        }
    }

    fn emit_field_type(&mut self, record: &crate::subgraphs::FieldTypeRecord) -> federated::FieldType {
        federated::FieldType {
            wrapping: record
                .wrapping
                .iter()
                .map(|wrapper| match wrapper {
                    crate::subgraphs::TypeWrapper::NonNull => federated::WrapperKind::NonNull,
                    crate::subgraphs::TypeWrapper::List => federated::WrapperKind::List,
                })
                .collect(),
            definition_name: self.insert(record.definition_name),
        }
    }

    fn emit_directives(&mut self, directives: &[ir::Directive]) -> Vec<federated::Directive> {
        directives
            .iter()
            .map(|directive| match directive {
                ir::Directive::Inaccessible => federated::Directive::Inaccessible,
                ir::Directive::Authenticated => federated::Directive::Authenticated,
                ir::Directive::Deprecated { reason } => federated::Directive::Deprecated {
                    reason: reason.map(|id| self.insert(id)),
                },
                ir::Directive::RequiresScopes(scopes) => federated::Directive::RequiresScopes(
                    scopes
                        .iter()
                        .map(|scopes| scopes.iter().map(|scope| self.insert(*scope)).collect())
                        .collect(),
                ),
                ir::Directive::Tag(tag) => federated::Directive::Tag(self.insert(*tag)),
                ir::Directive::Other { name, arguments } => {
                    let rendered = arguments
                        .iter()
                        .map(|(name, value)| {
                            format!(
                                "{}: {}",
                                self.subgraphs.walk(*name).as_str(),
                                render_value(value, self.subgraphs),
                            )
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    federated::Directive::Other {
                        name: self.insert(*name),
                        arguments: self.insert_str(&rendered),
                    }
                }
            })
            .collect()
    }
}

/// The composed fields, plus copies of entity interface fields onto each
/// concrete implementer that does not define them itself.
fn collect_fields_with_entity_interface_copies(ir: &CompositionIr) -> Vec<(StringId, ir::FieldIr)> {
    let mut fields: Vec<(StringId, ir::FieldIr)> = ir
        .fields
        .iter()
        .map(|field| (field.parent_name, field.clone()))
        .collect();

    for (interface_name, implementers) in &ir.entity_interfaces {
        let interface_fields: Vec<&ir::FieldIr> = ir
            .fields
            .iter()
            .filter(|field| field.parent_name == *interface_name)
            .collect();

        for implementer in implementers {
            for interface_field in &interface_fields {
                let already_defined = ir
                    .fields
                    .iter()
                    .any(|field| field.parent_name == *implementer && field.field_name == interface_field.field_name);

                if already_defined {
                    continue;
                }

                let mut copy = (*interface_field).clone();
                copy.parent_name = *implementer;
                fields.push((*implementer, copy));
            }
        }
    }

    fields
}

/// Render a directive argument or default value as a GraphQL literal.
pub(crate) fn render_value(value: &Value, subgraphs: &Subgraphs) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::String(id) => format!("\"{}\"", escape_string(subgraphs.walk(*id).as_str())),
        Value::Int(int) => int.to_string(),
        Value::Float(float) => float.to_string(),
        Value::Boolean(true) => "true".to_owned(),
        Value::Boolean(false) => "false".to_owned(),
        Value::Enum(id) => subgraphs.walk(*id).as_str().to_owned(),
        Value::Object(fields) => {
            let fields = fields
                .iter()
                .map(|(name, value)| {
                    format!("{}: {}", subgraphs.walk(*name).as_str(), render_value(value, subgraphs))
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{fields}}}")
        }
        Value::List(values) => {
            let values = values
                .iter()
                .map(|value| render_value(value, subgraphs))
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{values}]")
        }
    }
}

fn escape_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

fn build_federated_configuration(
    ir: &CompositionIr,
    fields: &[(StringId, ir::FieldIr)],
    subgraphs: &Subgraphs,
) -> BTreeMap<String, ConfigurationData> {
    let mut configurations = BTreeMap::new();

    for definition in &ir.definitions {
        if !matches!(definition.kind, DefinitionKind::Object | DefinitionKind::Interface) {
            continue;
        }

        let type_name = subgraphs.walk(definition.name).as_str().to_owned();

        let field_names: Vec<String> = fields
            .iter()
            .filter(|(parent, _)| *parent == definition.name)
            .map(|(_, field)| subgraphs.walk(field.field_name).as_str().to_owned())
            .collect();

        let keys = definition
            .keys
            .iter()
            .map(|key| RequiredFieldsConfiguration {
                field_name: String::new(),
                selection_set: subgraphs.render_canonical_selection_set(subgraphs.walk(key.key_id).fields()),
                disable_entity_resolver: !key.resolvable,
            })
            .collect();

        let mut provides = Vec::new();
        let mut requires = Vec::new();

        for (_, field) in fields.iter().filter(|(parent, _)| *parent == definition.name) {
            let field_name = subgraphs.walk(field.field_name).as_str();

            for (_, selection) in &field.provides {
                provides.push(RequiredFieldsConfiguration {
                    field_name: field_name.to_owned(),
                    selection_set: canonicalize_selection_str(selection).unwrap_or_else(|| selection.clone()),
                    disable_entity_resolver: false,
                });
            }

            for (_, selection) in &field.requires {
                requires.push(RequiredFieldsConfiguration {
                    field_name: field_name.to_owned(),
                    selection_set: canonicalize_selection_str(selection).unwrap_or_else(|| selection.clone()),
                    disable_entity_resolver: false,
                });
            }
        }

        let entity_interface_concrete_type_names = ir
            .entity_interfaces
            .get(&definition.name)
            .map(|implementers| {
                implementers
                    .iter()
                    .map(|name| subgraphs.walk(*name).as_str().to_owned())
                    .collect()
            })
            .unwrap_or_default();

        let is_root_node = [ir.query_type, ir.mutation_type, ir.subscription_type]
            .into_iter()
            .flatten()
            .any(|root| root == definition.name);

        configurations.insert(
            type_name.clone(),
            ConfigurationData {
                type_name,
                field_names,
                is_root_node,
                keys,
                provides,
                requires,
                entity_interface_concrete_type_names,
            },
        );
    }

    configurations
}

fn build_field_configurations(ir: &CompositionIr, subgraphs: &Subgraphs) -> Vec<FieldConfiguration> {
    let mut configurations = Vec::new();

    for field in &ir.fields {
        let has_arguments = !field.arguments.is_empty();
        let has_authorization = field.requires_authentication || !field.requires_scopes.is_empty();

        if !has_arguments && !has_authorization && field.subscription_filter.is_none() {
            continue;
        }

        configurations.push(FieldConfiguration {
            type_name: subgraphs.walk(field.parent_name).as_str().to_owned(),
            field_name: subgraphs.walk(field.field_name).as_str().to_owned(),
            argument_names: field
                .arguments
                .iter()
                .map(|argument| subgraphs.walk(argument.name).as_str().to_owned())
                .collect(),
            requires_authentication: field.requires_authentication,
            required_scopes: field
                .requires_scopes
                .iter()
                .map(|scopes| {
                    scopes
                        .iter()
                        .map(|scope| subgraphs.walk(*scope).as_str().to_owned())
                        .collect()
                })
                .collect(),
            subscription_filter_condition: field.subscription_filter.clone(),
        });
    }

    configurations
}

fn build_subgraph_configurations(ir: &CompositionIr, subgraphs: &Subgraphs) -> Vec<SubgraphConfiguration> {
    let mut configurations = Vec::new();

    for subgraph in subgraphs.iter_subgraphs() {
        let mut configuration_data_by_type_name = BTreeMap::new();

        for definition in subgraph.definitions() {
            if !matches!(definition.kind(), DefinitionKind::Object | DefinitionKind::Interface) {
                continue;
            }

            let type_name = definition.name().as_str().to_owned();

            let field_names: Vec<String> = definition
                .fields()
                .map(|field| field.name().as_str().to_owned())
                .collect();

            let keys = definition
                .entity_keys()
                .map(|key| RequiredFieldsConfiguration {
                    field_name: String::new(),
                    selection_set: key.canonical(),
                    disable_entity_resolver: !key.is_resolvable(),
                })
                .collect();

            let mut provides = Vec::new();
            let mut requires = Vec::new();

            for field in definition.fields() {
                if let Some(selections) = field.directives().provides() {
                    provides.push(RequiredFieldsConfiguration {
                        field_name: field.name().as_str().to_owned(),
                        selection_set: subgraphs.render_canonical_selection_set(selections),
                        disable_entity_resolver: false,
                    });
                }

                if let Some(selections) = field.directives().requires() {
                    requires.push(RequiredFieldsConfiguration {
                        field_name: field.name().as_str().to_owned(),
                        selection_set: subgraphs.render_canonical_selection_set(selections),
                        disable_entity_resolver: false,
                    });
                }
            }

            let entity_interface_concrete_type_names = ir
                .entity_interfaces
                .get(&definition.name().id)
                .map(|implementers| {
                    implementers
                        .iter()
                        .map(|name| subgraphs.walk(*name).as_str().to_owned())
                        .collect()
                })
                .unwrap_or_default();

            configuration_data_by_type_name.insert(
                type_name.clone(),
                ConfigurationData {
                    type_name,
                    field_names,
                    is_root_node: definition.is_root(),
                    keys,
                    provides,
                    requires,
                    entity_interface_concrete_type_names,
                },
            );
        }

        configurations.push(SubgraphConfiguration {
            name: subgraph.name().as_str().to_owned(),
            url: subgraph.url().as_str().to_owned(),
            configuration_data_by_type_name,
        });
    }

    configurations
}
