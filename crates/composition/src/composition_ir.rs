use crate::{
    router_config::SubscriptionFilterCondition,
    subgraphs::{self, DefinitionKind, FieldTypeRecord, StringId, SubgraphId},
};
use std::collections::{BTreeMap, BTreeSet};

/// The intermediate representation of the federated schema produced by
/// composition. It is distinct from the final federated graph because it is
/// accumulated out of order during composition, with names still interned in
/// the subgraphs.
///
/// This is a **write only** data structure during composition. The source of
/// truth for the contents of the federated graph is the subgraphs.
#[derive(Default)]
pub(crate) struct CompositionIr {
    pub(crate) definitions_by_name: BTreeMap<StringId, usize>,
    pub(crate) definitions: Vec<DefinitionIr>,
    pub(crate) fields: Vec<FieldIr>,

    /// The root operation types, by definition name.
    pub(crate) query_type: Option<StringId>,
    pub(crate) mutation_type: Option<StringId>,
    pub(crate) subscription_type: Option<StringId>,

    /// Entity interface name -> concrete implementer names. The interface's
    /// fields are added to each implementer when the federated graph is
    /// emitted.
    pub(crate) entity_interfaces: BTreeMap<StringId, BTreeSet<StringId>>,
}

impl CompositionIr {
    pub(crate) fn insert_definition(&mut self, definition: DefinitionIr) -> usize {
        let idx = self.definitions.len();
        self.definitions_by_name.insert(definition.name, idx);
        self.definitions.push(definition);
        idx
    }

    pub(crate) fn get_definition(&self, name: StringId) -> Option<&DefinitionIr> {
        self.definitions_by_name.get(&name).map(|idx| &self.definitions[*idx])
    }
}

/// A composed type definition of any kind.
pub(crate) struct DefinitionIr {
    pub(crate) name: StringId,
    pub(crate) kind: DefinitionKind,
    pub(crate) description: Option<StringId>,
    pub(crate) directives: Vec<Directive>,

    /// The subgraphs that contributed a definition of the type, in input
    /// order.
    pub(crate) subgraphs: Vec<SubgraphId>,

    /// `@key`s, for entities and entity interfaces.
    pub(crate) keys: Vec<KeyIr>,

    pub(crate) implements: BTreeSet<StringId>,
    pub(crate) union_members: BTreeSet<StringId>,
    pub(crate) enum_values: Vec<EnumValueIr>,
}

impl DefinitionIr {
    pub(crate) fn new(name: StringId, kind: DefinitionKind) -> Self {
        DefinitionIr {
            name,
            kind,
            description: None,
            directives: Vec::new(),
            subgraphs: Vec::new(),
            keys: Vec::new(),
            implements: BTreeSet::new(),
            union_members: BTreeSet::new(),
            enum_values: Vec::new(),
        }
    }

    pub(crate) fn is_inaccessible(&self) -> bool {
        self.directives.iter().any(|directive| matches!(directive, Directive::Inaccessible))
    }
}

pub(crate) struct EnumValueIr {
    pub(crate) value: StringId,
    pub(crate) description: Option<StringId>,
    pub(crate) directives: Vec<Directive>,
}

pub(crate) struct KeyIr {
    pub(crate) subgraph_id: SubgraphId,
    pub(crate) key_id: subgraphs::KeyId,
    pub(crate) is_interface_object: bool,
    pub(crate) resolvable: bool,
}

#[derive(Clone)]
pub(crate) struct FieldIr {
    pub(crate) parent_name: StringId,
    pub(crate) field_name: StringId,
    pub(crate) field_type: FieldTypeRecord,
    pub(crate) arguments: Vec<InputValueIr>,
    pub(crate) directives: Vec<Directive>,
    pub(crate) description: Option<StringId>,

    /// Default value, for input object fields.
    pub(crate) default: Option<subgraphs::Value>,

    /// The subgraphs in which this field is resolvable. Empty means all of
    /// the parent type's subgraphs.
    pub(crate) resolvable_in: Vec<SubgraphId>,

    /// `@provides` field sets, rendered, by declaring subgraph.
    pub(crate) provides: Vec<(SubgraphId, String)>,

    /// `@requires` field sets, rendered, by declaring subgraph.
    pub(crate) requires: Vec<(SubgraphId, String)>,

    /// `@override(from: ...)`: (overriding subgraph, overridden subgraph name).
    pub(crate) overrides: Vec<(SubgraphId, StringId)>,

    pub(crate) requires_authentication: bool,
    pub(crate) requires_scopes: Vec<Vec<StringId>>,
    pub(crate) subscription_filter: Option<SubscriptionFilterCondition>,
}

#[derive(Clone)]
pub(crate) struct InputValueIr {
    pub(crate) name: StringId,
    pub(crate) r#type: FieldTypeRecord,
    pub(crate) directives: Vec<Directive>,
    pub(crate) description: Option<StringId>,
    pub(crate) default: Option<subgraphs::Value>,
}

/// A directive on a composed schema element.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Directive {
    Inaccessible,
    Authenticated,
    Deprecated { reason: Option<StringId> },
    RequiresScopes(Vec<Vec<StringId>>),
    Tag(StringId),
    Other {
        name: StringId,
        arguments: Vec<(StringId, subgraphs::Value)>,
    },
}
