//! The resolvability graph: a directed multigraph over (subgraph, type name)
//! pairs proving that every field exposed by the composed schema is reachable
//! through some chain of subgraph queries.
//!
//! Field edges connect a type to the named return type of each of its fields,
//! within one subgraph, with one edge per concrete member type when the
//! return type is abstract. Entity jump edges connect the same entity across
//! subgraphs wherever the origin subgraph can produce one of the target's
//! resolvable key field sets.

use crate::{
    compose::Context,
    composition_ir::{CompositionIr, Directive, FieldIr},
    subgraphs::{DefinitionKind, DefinitionWalker, KeySelection, StringId, SubgraphId, Subgraphs},
};
use fixedbitset::FixedBitSet;
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap, HashSet};

pub(crate) fn validate_resolvability(ctx: &mut Context<'_>) {
    let graph = ResolvabilityGraph::build(ctx.subgraphs);
    let (errors, warnings) = graph.validate(ctx.subgraphs, ctx.ir());

    for error in errors {
        ctx.diagnostics.push_fatal(error);
    }

    for warning in warnings {
        ctx.diagnostics.push_warning(warning);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

struct Node {
    subgraph_id: SubgraphId,
    type_name: StringId,
    is_root: bool,
}

enum EdgeLabel {
    Field(StringId),
    KeyJump,
}

struct Edge {
    target: NodeId,
    label: EdgeLabel,
}

pub(crate) struct ResolvabilityGraph {
    nodes: Vec<Node>,
    node_ids: HashMap<(SubgraphId, StringId), NodeId>,
    edges: Vec<Vec<Edge>>,

    /// (subgraph, type name, field name) of fields resolvable through an
    /// `@provides` selection in that subgraph.
    provided_fields: HashSet<(SubgraphId, StringId, StringId)>,
}

impl ResolvabilityGraph {
    fn build(subgraphs: &Subgraphs) -> Self {
        let mut graph = ResolvabilityGraph {
            nodes: Vec::new(),
            node_ids: HashMap::new(),
            edges: Vec::new(),
            provided_fields: HashSet::new(),
        };

        // Nodes for every composite definition in every subgraph.
        for subgraph in subgraphs.iter_subgraphs() {
            for definition in subgraph.definitions() {
                if matches!(definition.kind(), DefinitionKind::Object | DefinitionKind::Interface) {
                    graph.add_node(definition.subgraph_id(), definition.name().id, definition.is_root());
                }
            }
        }

        graph.collect_provided_fields(subgraphs);

        // Field edges.
        for subgraph in subgraphs.iter_subgraphs() {
            let subgraph_id = subgraph.id;

            for definition in subgraph.definitions() {
                if !matches!(definition.kind(), DefinitionKind::Object | DefinitionKind::Interface) {
                    continue;
                }

                let Some(&source) = graph.node_ids.get(&(subgraph_id, definition.name().id)) else {
                    continue;
                };

                for field in definition.fields() {
                    if !graph.field_is_resolvable_locally(field.parent_definition().name().id, field) {
                        continue;
                    }

                    let return_type = field.r#type().record().definition_name;
                    let field_name = field.name().id;
                    graph.add_field_edges(subgraphs, subgraph_id, source, field_name, return_type);
                }
            }
        }

        graph.add_entity_jump_edges(subgraphs);

        graph
    }

    fn add_node(&mut self, subgraph_id: SubgraphId, type_name: StringId, is_root: bool) -> NodeId {
        if let Some(id) = self.node_ids.get(&(subgraph_id, type_name)) {
            return *id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            subgraph_id,
            type_name,
            is_root,
        });
        self.edges.push(Vec::new());
        self.node_ids.insert((subgraph_id, type_name), id);
        id
    }

    /// An edge to the named return type, fanning out to concrete members for
    /// abstract types.
    fn add_field_edges(
        &mut self,
        subgraphs: &Subgraphs,
        subgraph_id: SubgraphId,
        source: NodeId,
        field_name: StringId,
        return_type: StringId,
    ) {
        let Some(definition_id) = subgraphs.definition_by_name_id(return_type, subgraph_id) else {
            return;
        };
        let definition = subgraphs.walk(definition_id);

        match definition.kind() {
            DefinitionKind::Object => {
                if let Some(&target) = self.node_ids.get(&(subgraph_id, return_type)) {
                    self.edges[source.0].push(Edge {
                        target,
                        label: EdgeLabel::Field(field_name),
                    });
                }
            }
            DefinitionKind::Interface => {
                if let Some(&target) = self.node_ids.get(&(subgraph_id, return_type)) {
                    self.edges[source.0].push(Edge {
                        target,
                        label: EdgeLabel::Field(field_name),
                    });
                }

                let implementers: Vec<StringId> = subgraphs
                    .walk(subgraph_id)
                    .interface_implementers(return_type)
                    .map(|implementer| implementer.name().id)
                    .collect();

                for implementer in implementers {
                    if let Some(&target) = self.node_ids.get(&(subgraph_id, implementer)) {
                        self.edges[source.0].push(Edge {
                            target,
                            label: EdgeLabel::Field(field_name),
                        });
                    }
                }
            }
            DefinitionKind::Union => {
                let members: Vec<StringId> = definition.union_members().map(|member| member.name().id).collect();

                for member in members {
                    if let Some(&target) = self.node_ids.get(&(subgraph_id, member)) {
                        self.edges[source.0].push(Edge {
                            target,
                            label: EdgeLabel::Field(field_name),
                        });
                    }
                }
            }
            _ => (),
        }
    }

    /// `@provides(fields: ...)` makes the selected external fields resolvable
    /// along that path. We record them as resolvable in the whole subgraph,
    /// which over-approximates, but only for fields the subgraph does carry.
    fn collect_provided_fields(&mut self, subgraphs: &Subgraphs) {
        for subgraph in subgraphs.iter_subgraphs() {
            for definition in subgraph.definitions() {
                for field in definition.fields() {
                    let Some(provides) = field.directives().provides() else {
                        continue;
                    };

                    let return_type = field.r#type().record().definition_name;
                    let Some(provided_definition) = subgraphs.definition_by_name_id(return_type, subgraph.id) else {
                        continue;
                    };

                    self.mark_provided(subgraphs, subgraphs.walk(provided_definition), provides);
                }
            }
        }
    }

    fn mark_provided(&mut self, subgraphs: &Subgraphs, definition: DefinitionWalker<'_>, selections: &[KeySelection]) {
        for selection in selections {
            self.provided_fields
                .insert((definition.subgraph_id(), definition.name().id, selection.field));

            if selection.subselection.is_empty() {
                continue;
            }

            let Some(field) = definition.find_field(selection.field) else {
                continue;
            };
            let nested_name = field.r#type().record().definition_name;
            let Some(nested) = subgraphs.definition_by_name_id(nested_name, definition.subgraph_id()) else {
                continue;
            };

            self.mark_provided(subgraphs, subgraphs.walk(nested), &selection.subselection);
        }
    }

    fn field_is_resolvable_locally(&self, parent_name: StringId, field: crate::subgraphs::FieldWalker<'_>) -> bool {
        if !field.directives().external() {
            return true;
        }

        field.is_part_of_key()
            || self
                .provided_fields
                .contains(&(field.parent_definition().subgraph_id(), parent_name, field.name().id))
    }

    /// An entity can be entered from another subgraph's view of the same type
    /// whenever the origin can produce all the fields of one of the target's
    /// resolvable keys.
    fn add_entity_jump_edges(&mut self, subgraphs: &Subgraphs) {
        let mut jumps = Vec::new();

        for subgraph in subgraphs.iter_subgraphs() {
            for definition in subgraph.definitions() {
                for key in definition.entity_keys().filter(|key| key.is_resolvable()) {
                    let type_name = definition.name().id;
                    let Some(&target) = self.node_ids.get(&(definition.subgraph_id(), type_name)) else {
                        continue;
                    };

                    for origin_subgraph in subgraphs.iter_subgraphs() {
                        if origin_subgraph.id == definition.subgraph_id() {
                            continue;
                        }

                        let Some(&origin) = self.node_ids.get(&(origin_subgraph.id, type_name)) else {
                            continue;
                        };

                        let Some(origin_definition_id) = subgraphs.definition_by_name_id(type_name, origin_subgraph.id)
                        else {
                            continue;
                        };

                        if can_satisfy_key(subgraphs, subgraphs.walk(origin_definition_id), key.fields()) {
                            jumps.push((origin, target));
                        }
                    }
                }
            }
        }

        for (origin, target) in jumps {
            self.edges[origin.0].push(Edge {
                target,
                label: EdgeLabel::KeyJump,
            });
        }
    }

    fn validate(&self, subgraphs: &Subgraphs, ir: &CompositionIr) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let (reachable, parents) = self.reachable_from_roots();

        // Type names reachable in at least one subgraph.
        let mut reachable_type_names: BTreeSet<StringId> = BTreeSet::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if reachable.contains(idx) {
                reachable_type_names.insert(node.type_name);
            }
        }

        for field in &ir.fields {
            let Some(parent) = ir.get_definition(field.parent_name) else {
                continue;
            };

            if !matches!(parent.kind, DefinitionKind::Object | DefinitionKind::Interface) {
                continue;
            }

            // Hidden fields are not exposed through any client query.
            if is_inaccessible(&field.directives) || parent.is_inaccessible() {
                continue;
            }

            // An unreachable parent type means no query path references the
            // field at all. The type itself gets an advisory below.
            if !reachable_type_names.contains(&field.parent_name) {
                continue;
            }

            if let Some(error) = self.validate_field(subgraphs, field, &reachable, &parents) {
                errors.push(error);
            }
        }

        for definition in &ir.definitions {
            if !matches!(definition.kind, DefinitionKind::Object | DefinitionKind::Interface)
                || definition.is_inaccessible()
            {
                continue;
            }

            let has_nodes = definition
                .subgraphs
                .iter()
                .any(|subgraph_id| self.node_ids.contains_key(&(*subgraph_id, definition.name)));

            if has_nodes && !reachable_type_names.contains(&definition.name) {
                warnings.push(format!(
                    "The type `{}` is not reachable from any root operation type.",
                    subgraphs.walk(definition.name).as_str(),
                ));
            }
        }

        (errors, warnings)
    }

    /// A composed field is resolvable if some subgraph both defines it and
    /// can be reached, at the parent type, from a root operation type.
    fn validate_field(
        &self,
        subgraphs: &Subgraphs,
        field: &FieldIr,
        reachable: &FixedBitSet,
        parents: &[Option<(NodeId, Option<StringId>)>],
    ) -> Option<String> {
        let mut defined_in = Vec::new();

        for subgraph in subgraphs.iter_subgraphs() {
            let Some(definition_id) = subgraphs.definition_by_name_id(field.parent_name, subgraph.id) else {
                continue;
            };
            let definition = subgraphs.walk(definition_id);

            let Some(subgraph_field) = definition.find_field(field.field_name) else {
                continue;
            };

            if !self.field_is_resolvable_locally(field.parent_name, subgraph_field) {
                continue;
            }

            defined_in.push(subgraph.id);

            let node = self.node_ids.get(&(subgraph.id, field.parent_name));
            if node.is_some_and(|node| reachable.contains(node.0)) {
                return None;
            }
        }

        if defined_in.is_empty() {
            // Interface fields contributed by an @interfaceObject have no
            // concrete definition under the implementer's name.
            return None;
        }

        let reachable_in = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(idx, node)| node.type_name == field.parent_name && reachable.contains(*idx))
            .map(|(idx, _)| NodeId(idx))
            .collect::<Vec<_>>();

        let parent_type = subgraphs.walk(field.parent_name).as_str();
        let field_name = subgraphs.walk(field.field_name).as_str();
        let defined_in_names = defined_in
            .iter()
            .map(|subgraph_id| subgraphs.walk(*subgraph_id).name().as_str())
            .join("`, `");

        let (reachable_names, example_path) = match reachable_in.first() {
            Some(node) => (
                reachable_in
                    .iter()
                    .map(|node| subgraphs.walk(self.nodes[node.0].subgraph_id).name().as_str())
                    .join("`, `"),
                self.render_root_path(subgraphs, *node, parents),
            ),
            None => (String::new(), String::new()),
        };

        Some(format!(
            "The field `{parent_type}.{field_name}` is unresolvable: it is only defined in the subgraph(s) `{defined_in_names}`, but `{parent_type}` is reached through `{reachable_names}` (for example via `{example_path}`). Add a `@key` on `{parent_type}` shared with `{defined_in_names}`, or define the field as `@shareable` in a reachable subgraph.",
        ))
    }

    /// Breadth-first reachability from all root operation type nodes, with
    /// parent pointers for error path reconstruction.
    #[allow(clippy::type_complexity)]
    fn reachable_from_roots(&self) -> (FixedBitSet, Vec<Option<(NodeId, Option<StringId>)>>) {
        let mut reachable = FixedBitSet::with_capacity(self.nodes.len());
        let mut parents: Vec<Option<(NodeId, Option<StringId>)>> = vec![None; self.nodes.len()];
        let mut queue = std::collections::VecDeque::new();

        for (idx, node) in self.nodes.iter().enumerate() {
            if node.is_root {
                reachable.insert(idx);
                queue.push_back(NodeId(idx));
            }
        }

        while let Some(node) = queue.pop_front() {
            for edge in &self.edges[node.0] {
                if reachable.contains(edge.target.0) {
                    continue;
                }

                reachable.insert(edge.target.0);
                let label = match edge.label {
                    EdgeLabel::Field(name) => Some(name),
                    EdgeLabel::KeyJump => None,
                };
                parents[edge.target.0] = Some((node, label));
                queue.push_back(edge.target);
            }
        }

        (reachable, parents)
    }

    fn render_root_path(
        &self,
        subgraphs: &Subgraphs,
        node: NodeId,
        parents: &[Option<(NodeId, Option<StringId>)>],
    ) -> String {
        let mut segments = Vec::new();
        let mut current = node;

        while let Some((parent, label)) = parents[current.0] {
            if let Some(label) = label {
                segments.push(subgraphs.walk(label).as_str().to_owned());
            }
            current = parent;
        }

        segments.push(subgraphs.walk(self.nodes[current.0].type_name).as_str().to_owned());
        segments.reverse();
        segments.join(".")
    }
}

/// Whether the definition can produce every field of the key selection set,
/// recursively through nested selections.
fn can_satisfy_key(subgraphs: &Subgraphs, definition: DefinitionWalker<'_>, selections: &[KeySelection]) -> bool {
    selections.iter().all(|selection| {
        let Some(field) = definition.find_field(selection.field) else {
            return false;
        };

        if selection.subselection.is_empty() {
            return true;
        }

        let nested_name = field.r#type().record().definition_name;
        let Some(nested) = subgraphs.definition_by_name_id(nested_name, definition.subgraph_id()) else {
            return false;
        };

        can_satisfy_key(subgraphs, subgraphs.walk(nested), &selection.subselection)
    })
}

fn is_inaccessible(directives: &[Directive]) -> bool {
    directives.iter().any(|directive| matches!(directive, Directive::Inaccessible))
}
