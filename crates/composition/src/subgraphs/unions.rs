use super::*;

#[derive(Default)]
pub(super) struct Unions {
    members: BTreeSet<(DefinitionId, DefinitionId)>,
}

impl Subgraphs {
    /// Returns false when the member is already part of the union.
    pub(crate) fn push_union_member(&mut self, union_id: DefinitionId, member_id: DefinitionId) -> bool {
        self.unions.members.insert((union_id, member_id))
    }
}

impl<'a> DefinitionWalker<'a> {
    pub(crate) fn union_members(self) -> impl Iterator<Item = DefinitionWalker<'a>> + 'a {
        let id = self.id;
        self.subgraphs
            .unions
            .members
            .range((id, DefinitionId::MIN)..=(id, DefinitionId::MAX))
            .map(move |(_, member)| self.walk(*member))
    }
}
