use super::*;

#[derive(Default)]
pub(super) struct Enums {
    values: BTreeMap<(DefinitionId, StringId), EnumValueRecord>,
}

#[derive(Clone, Copy)]
pub(crate) struct EnumValueRecord {
    pub(crate) directives: DirectiveSiteId,
    pub(crate) description: Option<StringId>,
}

impl Subgraphs {
    /// Returns `None` when the value is already defined on the enum.
    pub(crate) fn push_enum_value(
        &mut self,
        enum_id: DefinitionId,
        enum_value: StringId,
        record: EnumValueRecord,
    ) -> Option<()> {
        match self.enums.values.insert((enum_id, enum_value), record) {
            Some(_) => None,
            None => Some(()),
        }
    }
}

pub(crate) type EnumValueWalker<'a> = Walker<'a, (StringId, EnumValueRecord)>;

impl<'a> EnumValueWalker<'a> {
    pub(crate) fn name(self) -> StringWalker<'a> {
        self.walk(self.id.0)
    }

    pub(crate) fn directives(self) -> DirectiveSiteWalker<'a> {
        self.walk(self.id.1.directives)
    }

    pub(crate) fn description(self) -> Option<StringWalker<'a>> {
        self.id.1.description.map(|id| self.walk(id))
    }
}

impl<'a> DefinitionWalker<'a> {
    pub(crate) fn enum_values(self) -> impl Iterator<Item = EnumValueWalker<'a>> + 'a {
        let id = self.id;
        self.subgraphs
            .enums
            .values
            .range((id, StringId::MIN)..=(id, StringId::MAX))
            .map(move |((_, value), record)| self.walk((*value, *record)))
    }

    pub(crate) fn enum_value(self, name: StringId) -> Option<EnumValueWalker<'a>> {
        self.subgraphs
            .enums
            .values
            .get(&(self.id, name))
            .map(|record| self.walk((name, *record)))
    }
}
