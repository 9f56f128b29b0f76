mod render_sdl;

pub use render_sdl::{render_api_sdl, render_federated_sdl};

use serde::{Deserialize, Serialize};

/// An interned string in a [FederatedGraph].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StringId(pub usize);

/// A type definition in a [FederatedGraph].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeDefinitionId(pub usize);

/// A subgraph in a [FederatedGraph].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubgraphId(pub usize);

/// The composed, router-facing schema: all definitions of the federated
/// schema, annotated with the join metadata the query planner needs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FederatedGraph {
    pub strings: Vec<String>,
    pub subgraphs: Vec<Subgraph>,
    pub type_definitions: Vec<TypeDefinition>,
    /// Sorted by parent type definition, then field name.
    pub fields: Vec<Field>,

    pub query_type: Option<TypeDefinitionId>,
    pub mutation_type: Option<TypeDefinitionId>,
    pub subscription_type: Option<TypeDefinitionId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subgraph {
    pub name: StringId,
    pub url: StringId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDefinitionKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: StringId,
    pub kind: TypeDefinitionKind,
    pub description: Option<StringId>,
    pub directives: Vec<Directive>,
    pub implements: Vec<StringId>,
    pub union_members: Vec<StringId>,
    pub enum_values: Vec<EnumValue>,
    pub keys: Vec<Key>,
    /// The subgraphs that contributed a definition of the type.
    pub subgraphs: Vec<SubgraphId>,
}

/// A `@key` on an entity or entity interface, with the selection set rendered
/// in the `fields` mini-language.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Key {
    pub subgraph_id: SubgraphId,
    pub fields: StringId,
    pub resolvable: bool,
    pub is_interface_object: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnumValue {
    pub value: StringId,
    pub description: Option<StringId>,
    pub directives: Vec<Directive>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Field {
    pub parent_definition_id: TypeDefinitionId,
    pub name: StringId,
    pub r#type: FieldType,
    pub arguments: Vec<InputValueDefinition>,
    pub directives: Vec<Directive>,
    pub description: Option<StringId>,
    /// Rendered GraphQL literal, for input object fields.
    pub default: Option<StringId>,

    /// The subgraphs where the field can be resolved. Empty means all of the
    /// parent type's subgraphs.
    pub resolvable_in: Vec<SubgraphId>,
    /// `@provides` selection sets by declaring subgraph.
    pub provides: Vec<(SubgraphId, StringId)>,
    /// `@requires` selection sets by declaring subgraph.
    pub requires: Vec<(SubgraphId, StringId)>,
    /// `@override`: (overriding subgraph, name of the overridden subgraph).
    pub overrides: Vec<(SubgraphId, StringId)>,
}

/// A named type with its list/non-null wrappers, outermost first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    pub wrapping: Vec<WrapperKind>,
    pub definition_name: StringId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapperKind {
    NonNull,
    List,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputValueDefinition {
    pub name: StringId,
    pub r#type: FieldType,
    pub directives: Vec<Directive>,
    pub description: Option<StringId>,
    /// Rendered GraphQL literal.
    pub default: Option<StringId>,
}

/// A directive application on a composed schema element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    Inaccessible,
    Authenticated,
    Deprecated { reason: Option<StringId> },
    RequiresScopes(Vec<Vec<StringId>>),
    Tag(StringId),
    /// A directive propagated through `@composeDirective`, with its arguments
    /// rendered as they appear between the parentheses.
    Other { name: StringId, arguments: StringId },
}

impl FederatedGraph {
    /// Resolve an interned string.
    pub fn str(&self, id: StringId) -> &str {
        &self.strings[id.0]
    }

    /// The fields of a type definition, relying on [FederatedGraph::fields]
    /// being sorted by parent.
    pub fn fields_of(&self, definition_id: TypeDefinitionId) -> &[Field] {
        let start = self
            .fields
            .partition_point(|field| field.parent_definition_id < definition_id);
        let len = self.fields[start..]
            .iter()
            .take_while(|field| field.parent_definition_id == definition_id)
            .count();
        &self.fields[start..start + len]
    }

    /// Find a type definition by name.
    pub fn definition_by_name(&self, name: &str) -> Option<&TypeDefinition> {
        self.type_definitions
            .iter()
            .find(|definition| self.str(definition.name) == name)
    }

    pub(crate) fn is_inaccessible(directives: &[Directive]) -> bool {
        directives.iter().any(|directive| matches!(directive, Directive::Inaccessible))
    }
}

impl FieldType {
    /// Render with the name resolved, e.g. `[Post!]!`.
    pub fn render(&self, graph: &FederatedGraph) -> String {
        fn render_inner(wrapping: &[WrapperKind], name: &str) -> String {
            match wrapping.split_first() {
                None => name.to_owned(),
                Some((WrapperKind::NonNull, rest)) => format!("{}!", render_inner(rest, name)),
                Some((WrapperKind::List, rest)) => format!("[{}]", render_inner(rest, name)),
            }
        }
        render_inner(&self.wrapping, graph.str(self.definition_name))
    }
}
