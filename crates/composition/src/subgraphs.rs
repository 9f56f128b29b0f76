mod definitions;
mod directives;
mod enums;
mod field_types;
mod fields;
mod keys;
mod strings;
mod unions;
mod walkers;

pub(crate) use self::{
    definitions::{DefinitionId, DefinitionKind, DefinitionWalker},
    directives::*,
    enums::{EnumValueRecord, EnumValueWalker},
    field_types::*,
    fields::*,
    keys::*,
    strings::{StringId, StringWalker},
    walkers::*,
};

use crate::VecExt;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// A set of subgraphs to be composed.
#[derive(Default)]
pub struct Subgraphs {
    pub(crate) strings: strings::Strings,
    subgraphs: Vec<Subgraph>,
    definitions: definitions::Definitions,
    directives: directives::Directives,
    enums: enums::Enums,
    fields: fields::Fields,
    field_types: field_types::FieldTypes,
    keys: keys::Keys,
    unions: unions::Unions,

    /// Every named type referenced from a field, argument, union member or
    /// interface implementation, for the undefined-type cross-check.
    type_references: BTreeSet<(SubgraphId, StringId)>,

    ingestion_diagnostics: crate::Diagnostics,

    // Secondary indexes.

    // We want a BTreeMap because we need range queries. The name comes first,
    // then the subgraph, because we want to know which definitions have the
    // same name but live in different subgraphs.
    //
    // (definition name, subgraph_id) -> definition id
    definition_names: BTreeMap<(StringId, SubgraphId), DefinitionId>,
}

impl Subgraphs {
    /// Add a subgraph to compose.
    pub fn ingest(&mut self, subgraph_schema: &async_graphql_parser::types::ServiceDocument, name: &str, url: &str) {
        crate::ingest_subgraph::ingest_subgraph(subgraph_schema, name, url, self);
        crate::validate::validate_subgraph(self);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subgraphs.is_empty()
    }

    /// Iterate over groups of definitions to compose. The definitions are
    /// grouped by name. The argument is a closure that receives each group as
    /// argument. The order of iteration is deterministic.
    pub(crate) fn iter_definition_groups<'a>(&'a self, mut compose_fn: impl FnMut(&[DefinitionWalker<'a>])) {
        let mut buf = Vec::new();
        for (_, group) in &self.definition_names.iter().chunk_by(|((name, _), _)| name) {
            buf.clear();
            buf.extend(group.into_iter().map(move |(_, definition_id)| self.walk(*definition_id)));
            compose_fn(&buf);
        }
    }

    pub(crate) fn push_ingestion_diagnostic(&mut self, subgraph: SubgraphId, message: String) {
        let subgraph_name = self.walk(subgraph).name().as_str();
        let message = format!("[{subgraph_name}]: {message}");
        self.ingestion_diagnostics.push_fatal(message);
    }

    pub(crate) fn push_subgraph(&mut self, name: &str, url: &str) -> SubgraphId {
        let subgraph = Subgraph {
            name: self.strings.intern(name),
            url: self.strings.intern(url),
            query_type: None,
            mutation_type: None,
            subscription_type: None,
        };
        SubgraphId(self.subgraphs.push_return_idx(subgraph))
    }

    pub(crate) fn walk<Id>(&self, id: Id) -> Walker<'_, Id> {
        Walker { id, subgraphs: self }
    }

    /// Iterates all builtin scalars _that are in use in at least one subgraph_.
    pub(crate) fn iter_builtin_scalars(&self) -> impl Iterator<Item = StringWalker<'_>> + '_ {
        BUILTIN_SCALARS
            .into_iter()
            .filter_map(|name| self.strings.lookup(name))
            .map(|string| self.walk(string))
    }

    pub(crate) fn iter_subgraphs(&self) -> impl Iterator<Item = SubgraphWalker<'_>> {
        (0..self.subgraphs.len()).map(|idx| self.walk(SubgraphId(idx)))
    }

    pub(crate) fn emit_ingestion_diagnostics(&self, diagnostics: &mut crate::Diagnostics) {
        diagnostics.clone_all_from(&self.ingestion_diagnostics);
    }

    pub(crate) fn push_type_reference(&mut self, subgraph_id: SubgraphId, name: StringId) {
        self.type_references.insert((subgraph_id, name));
    }

    pub(crate) fn iter_type_references(
        &self,
        subgraph_id: SubgraphId,
    ) -> impl Iterator<Item = StringWalker<'_>> + '_ {
        self.type_references
            .range((subgraph_id, StringId::MIN)..=(subgraph_id, StringId::MAX))
            .map(move |(_, name)| self.walk(*name))
    }

    pub(crate) fn last_subgraph_id(&self) -> SubgraphId {
        SubgraphId(self.subgraphs.len() - 1)
    }

    pub(crate) fn set_query_type(&mut self, subgraph_id: SubgraphId, definition_id: DefinitionId) {
        self.subgraphs[subgraph_id.0].query_type = Some(definition_id);
    }

    pub(crate) fn set_mutation_type(&mut self, subgraph_id: SubgraphId, definition_id: DefinitionId) {
        self.subgraphs[subgraph_id.0].mutation_type = Some(definition_id);
    }

    pub(crate) fn set_subscription_type(&mut self, subgraph_id: SubgraphId, definition_id: DefinitionId) {
        self.subgraphs[subgraph_id.0].subscription_type = Some(definition_id);
    }
}

pub(crate) const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Boolean", "Int", "Float"];

pub(crate) struct Subgraph {
    /// The name of the subgraph. It is not contained in the GraphQL schema of
    /// the subgraph, it only makes sense within a project.
    name: StringId,
    url: StringId,

    query_type: Option<DefinitionId>,
    mutation_type: Option<DefinitionId>,
    subscription_type: Option<DefinitionId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct SubgraphId(usize);

impl SubgraphId {
    pub(crate) fn idx(self) -> usize {
        self.0
    }
}

pub(crate) type SubgraphWalker<'a> = Walker<'a, SubgraphId>;

impl<'a> SubgraphWalker<'a> {
    fn subgraph(self) -> &'a Subgraph {
        &self.subgraphs.subgraphs[self.id.0]
    }

    pub(crate) fn name(self) -> StringWalker<'a> {
        self.walk(self.subgraph().name)
    }

    pub(crate) fn url(self) -> StringWalker<'a> {
        self.walk(self.subgraph().url)
    }

    pub(crate) fn query_type(self) -> Option<DefinitionWalker<'a>> {
        self.subgraph().query_type.map(|id| self.walk(id))
    }

    pub(crate) fn mutation_type(self) -> Option<DefinitionWalker<'a>> {
        self.subgraph().mutation_type.map(|id| self.walk(id))
    }

    pub(crate) fn subscription_type(self) -> Option<DefinitionWalker<'a>> {
        self.subgraph().subscription_type.map(|id| self.walk(id))
    }
}
