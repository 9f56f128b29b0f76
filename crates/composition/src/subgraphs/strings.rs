use indexmap::IndexSet;

use super::Walker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct StringId(usize);

impl StringId {
    pub(crate) const MIN: StringId = StringId(usize::MIN);
    pub(crate) const MAX: StringId = StringId(usize::MAX);
}

#[derive(Default)]
pub(crate) struct Strings {
    strings: IndexSet<String>,
}

impl Strings {
    pub(crate) fn intern(&mut self, string: impl AsRef<str>) -> StringId {
        let idx = self
            .strings
            .get_index_of(string.as_ref())
            .unwrap_or_else(|| self.strings.insert_full(string.as_ref().to_owned()).0);

        StringId(idx)
    }

    /// Like [intern](Self::intern), but does not insert missing strings.
    pub(crate) fn lookup(&self, string: &str) -> Option<StringId> {
        self.strings.get_index_of(string).map(StringId)
    }

    pub(crate) fn resolve(&self, id: StringId) -> &str {
        self.strings
            .get_index(id.0)
            .expect("invalid StringId")
            .as_str()
    }
}

pub(crate) type StringWalker<'a> = Walker<'a, StringId>;

impl<'a> StringWalker<'a> {
    pub(crate) fn as_str(self) -> &'a str {
        self.subgraphs.strings.resolve(self.id)
    }
}
