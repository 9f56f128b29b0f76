use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct DefinitionId(pub(super) usize);

impl DefinitionId {
    pub(crate) const MIN: DefinitionId = DefinitionId(usize::MIN);
    pub(crate) const MAX: DefinitionId = DefinitionId(usize::MAX);
}

// Invariant: `definitions` is sorted by `Definition::subgraph_id`. We rely on it for binary search.
#[derive(Default)]
pub(super) struct Definitions {
    definitions: Vec<Definition>,
    // (subgraph, implementer, implemented interface)
    interface_impls: BTreeSet<(SubgraphId, StringId, StringId)>,
}

pub(crate) struct Definition {
    subgraph_id: SubgraphId,
    name: StringId,
    kind: DefinitionKind,
    description: Option<StringId>,
    directives: DirectiveSiteId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DefinitionKind {
    Object,
    Interface,
    Union,
    InputObject,
    Scalar,
    Enum,
}

impl DefinitionKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::Object => "object",
            DefinitionKind::Interface => "interface",
            DefinitionKind::Union => "union",
            DefinitionKind::InputObject => "input object",
            DefinitionKind::Scalar => "scalar",
            DefinitionKind::Enum => "enum",
        }
    }
}

impl Subgraphs {
    pub(crate) fn definition_by_name_id(&self, name: StringId, subgraph_id: SubgraphId) -> Option<DefinitionId> {
        self.definition_names.get(&(name, subgraph_id)).copied()
    }

    pub(crate) fn definition_by_name(&self, name: &str, subgraph_id: SubgraphId) -> Option<DefinitionId> {
        let interned_name = self.strings.lookup(name)?;
        self.definition_by_name_id(interned_name, subgraph_id)
    }

    pub(crate) fn iter_interface_impls(&self) -> impl Iterator<Item = (SubgraphId, StringId, StringId)> + '_ {
        self.definitions.interface_impls.iter().copied()
    }

    pub(crate) fn iter_implementers_for_interface(
        &self,
        interface_name: StringId,
    ) -> impl Iterator<Item = DefinitionWalker<'_>> + '_ {
        self.definitions
            .interface_impls
            .iter()
            .filter(move |(_, _, implementee)| *implementee == interface_name)
            .filter_map(move |(subgraph_id, implementer, _)| {
                self.definition_by_name_id(*implementer, *subgraph_id)
            })
            .map(|id| self.walk(id))
    }

    pub(crate) fn push_definition(
        &mut self,
        subgraph_id: SubgraphId,
        name: &str,
        kind: DefinitionKind,
        description: Option<StringId>,
        directives: DirectiveSiteId,
    ) -> DefinitionId {
        let name = self.strings.intern(name);
        let definition = Definition {
            subgraph_id,
            name,
            kind,
            description,
            directives,
        };
        let id = DefinitionId(self.definitions.definitions.push_return_idx(definition));
        self.definition_names.insert((name, subgraph_id), id);
        id
    }

    pub(crate) fn push_interface_impl(
        &mut self,
        subgraph_id: SubgraphId,
        implementer: StringId,
        implemented_interface: StringId,
    ) {
        self.definitions
            .interface_impls
            .insert((subgraph_id, implementer, implemented_interface));
    }
}

pub(crate) type DefinitionWalker<'a> = Walker<'a, DefinitionId>;

impl<'a> DefinitionWalker<'a> {
    fn definition(self) -> &'a Definition {
        &self.subgraphs.definitions.definitions[self.id.0]
    }

    pub(crate) fn name(self) -> StringWalker<'a> {
        self.walk(self.definition().name)
    }

    pub(crate) fn kind(self) -> DefinitionKind {
        self.definition().kind
    }

    pub(crate) fn description(self) -> Option<StringWalker<'a>> {
        self.definition().description.map(|id| self.walk(id))
    }

    pub(crate) fn directives(self) -> DirectiveSiteWalker<'a> {
        self.walk(self.definition().directives)
    }

    pub(crate) fn subgraph_id(self) -> SubgraphId {
        self.definition().subgraph_id
    }

    pub(crate) fn subgraph(self) -> SubgraphWalker<'a> {
        self.walk(self.definition().subgraph_id)
    }

    /// The interfaces this definition implements, in its own subgraph.
    pub(crate) fn implemented_interfaces(self) -> impl Iterator<Item = StringId> + 'a {
        let subgraph_id = self.definition().subgraph_id;
        let name = self.definition().name;
        self.subgraphs
            .definitions
            .interface_impls
            .range((subgraph_id, name, StringId::MIN)..=(subgraph_id, name, StringId::MAX))
            .map(|(_, _, implementee)| *implementee)
    }

    pub(crate) fn is_root(self) -> bool {
        let subgraph = self.subgraph();
        [subgraph.query_type(), subgraph.mutation_type(), subgraph.subscription_type()]
            .into_iter()
            .flatten()
            .any(|root| root.id == self.id)
    }
}

impl<'a> SubgraphWalker<'a> {
    pub(crate) fn definitions(self) -> impl Iterator<Item = DefinitionWalker<'a>> {
        let subgraph_id = self.id;
        let definitions = &self.subgraphs.definitions.definitions;
        let start = definitions.partition_point(|def| def.subgraph_id < subgraph_id);
        definitions[start..]
            .iter()
            .take_while(move |def| def.subgraph_id == subgraph_id)
            .enumerate()
            .map(move |(idx, _)| self.walk(DefinitionId(idx + start)))
    }

    pub(crate) fn interface_implementers(self, interface_name: StringId) -> impl Iterator<Item = DefinitionWalker<'a>> {
        let subgraph_id = self.id;
        self.subgraphs
            .definitions
            .interface_impls
            .iter()
            .filter(move |(subgraph, _, implementee)| *subgraph == subgraph_id && *implementee == interface_name)
            .filter_map(move |(subgraph, implementer, _)| {
                self.subgraphs.definition_by_name_id(*implementer, *subgraph)
            })
            .map(move |id| self.walk(id))
    }
}
