use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct DirectiveSiteId(usize);

/// A directive argument or default value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Value {
    Null,
    String(StringId),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Enum(StringId),
    Object(Vec<(StringId, Value)>),
    List(Vec<Value>),
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct DirectiveSiteFlags: u8 {
        const SHAREABLE = 1;
        const EXTERNAL = 1 << 1;
        const INACCESSIBLE = 1 << 2;
        const INTERFACE_OBJECT = 1 << 3;
        const EXTENDS = 1 << 4;
        const AUTHENTICATED = 1 << 5;
    }
}

/// Corresponds to an `@override(from: ...)` directive.
#[derive(Debug)]
pub(crate) struct OverrideDirective {
    pub(crate) from: StringId,
}

/// Corresponds to an `@deprecated` directive.
#[derive(Debug)]
pub(crate) struct Deprecated {
    pub(crate) reason: Option<StringId>,
}

type Arguments = Vec<(StringId, Value)>;

#[derive(Default)]
pub(super) struct Directives {
    site_flags: Vec<DirectiveSiteFlags>,

    deprecated: BTreeMap<DirectiveSiteId, Deprecated>,
    overrides: BTreeMap<DirectiveSiteId, OverrideDirective>,
    provides: BTreeMap<DirectiveSiteId, Vec<KeySelection>>,
    requires: BTreeMap<DirectiveSiteId, Vec<KeySelection>>,
    requires_scopes: BTreeMap<DirectiveSiteId, Vec<Vec<StringId>>>,
    subscription_filters: BTreeMap<DirectiveSiteId, Value>,

    tags: BTreeSet<(DirectiveSiteId, StringId)>,

    /// From @composeDirective: (subgraph_id, directive name).
    composed_directives: BTreeSet<(SubgraphId, StringId)>,

    /// Applications of directives registered with @composeDirective.
    ///
    /// Invariant: sorted by site id, because directive sites are created and
    /// ingested in order.
    composed_directive_instances: Vec<(DirectiveSiteId, StringId, Arguments)>,
}

impl Subgraphs {
    pub(crate) fn new_directive_site(&mut self) -> DirectiveSiteId {
        let id = DirectiveSiteId(self.directives.site_flags.len());
        self.directives.site_flags.push(DirectiveSiteFlags::default());
        id
    }

    pub(crate) fn set_site_flag(&mut self, id: DirectiveSiteId, flag: DirectiveSiteFlags) {
        self.directives.site_flags[id.0] |= flag;
    }

    pub(crate) fn insert_deprecated(&mut self, id: DirectiveSiteId, reason: Option<&str>) {
        let reason = reason.map(|reason| self.strings.intern(reason));
        self.directives.deprecated.insert(id, Deprecated { reason });
    }

    pub(crate) fn insert_override(&mut self, id: DirectiveSiteId, from: StringId) {
        self.directives.overrides.insert(id, OverrideDirective { from });
    }

    pub(crate) fn insert_provides(&mut self, id: DirectiveSiteId, fields: &str) -> Result<(), String> {
        let fields = self.selection_set_from_str(fields)?;
        self.directives.provides.insert(id, fields);
        Ok(())
    }

    pub(crate) fn insert_requires(&mut self, id: DirectiveSiteId, fields: &str) -> Result<(), String> {
        let fields = self.selection_set_from_str(fields)?;
        self.directives.requires.insert(id, fields);
        Ok(())
    }

    pub(crate) fn append_requires_scopes(&mut self, id: DirectiveSiteId, scopes: Vec<StringId>) {
        self.directives.requires_scopes.entry(id).or_default().push(scopes);
    }

    pub(crate) fn insert_subscription_filter(&mut self, id: DirectiveSiteId, condition: Value) {
        self.directives.subscription_filters.insert(id, condition);
    }

    pub(crate) fn insert_tag(&mut self, id: DirectiveSiteId, tag: &str) {
        let tag = self.strings.intern(tag);
        self.directives.tags.insert((id, tag));
    }

    pub(crate) fn insert_composed_directive(&mut self, subgraph_id: SubgraphId, directive_name: &str) {
        let directive_name = self.strings.intern(directive_name);
        self.directives
            .composed_directives
            .insert((subgraph_id, directive_name));
    }

    pub(crate) fn is_composed_directive(&self, subgraph_id: SubgraphId, directive_name: StringId) -> bool {
        self.directives
            .composed_directives
            .contains(&(subgraph_id, directive_name))
    }

    pub(crate) fn insert_composed_directive_instance(
        &mut self,
        id: DirectiveSiteId,
        directive_name: &str,
        arguments: Arguments,
    ) {
        let directive_name = self.strings.intern(directive_name);
        self.directives
            .composed_directive_instances
            .push((id, directive_name, arguments));
    }
}

pub(crate) type DirectiveSiteWalker<'a> = Walker<'a, DirectiveSiteId>;

impl<'a> DirectiveSiteWalker<'a> {
    fn flags(self) -> DirectiveSiteFlags {
        self.subgraphs.directives.site_flags[self.id.0]
    }

    pub(crate) fn shareable(self) -> bool {
        self.flags().contains(DirectiveSiteFlags::SHAREABLE)
    }

    pub(crate) fn external(self) -> bool {
        self.flags().contains(DirectiveSiteFlags::EXTERNAL)
    }

    pub(crate) fn inaccessible(self) -> bool {
        self.flags().contains(DirectiveSiteFlags::INACCESSIBLE)
    }

    pub(crate) fn interface_object(self) -> bool {
        self.flags().contains(DirectiveSiteFlags::INTERFACE_OBJECT)
    }

    pub(crate) fn extends(self) -> bool {
        self.flags().contains(DirectiveSiteFlags::EXTENDS)
    }

    pub(crate) fn authenticated(self) -> bool {
        self.flags().contains(DirectiveSiteFlags::AUTHENTICATED)
    }

    pub(crate) fn deprecated(self) -> Option<&'a Deprecated> {
        self.subgraphs.directives.deprecated.get(&self.id)
    }

    /// ```graphql,ignore
    /// type Query {
    ///   getRandomMammoth: Mammoth @override(from: "steppe")
    ///                             ^^^^^^^^^^^^^^^^^^^^^^^^^
    /// }
    /// ```
    pub(crate) fn r#override(self) -> Option<&'a OverrideDirective> {
        self.subgraphs.directives.overrides.get(&self.id)
    }

    /// ```graphql,ignore
    /// type MyObject {
    ///   id: ID!
    ///   others: [OtherObject!] @provides(fields: "size weight")
    ///                          ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
    /// }
    /// ```
    pub(crate) fn provides(self) -> Option<&'a [KeySelection]> {
        self.subgraphs
            .directives
            .provides
            .get(&self.id)
            .map(|provides| &**provides)
    }

    /// ```graphql,ignore
    /// extend type Farm @key(fields: "id") {
    ///   id: ID! @external
    ///   chiliId: ID! @external
    ///   chiliDetails: ChiliVariety @requires(fields: "chiliId")
    ///                              ^^^^^^^^^^^^^^^^^^^^^^^^^^^^
    /// }
    /// ```
    pub(crate) fn requires(self) -> Option<&'a [KeySelection]> {
        self.subgraphs
            .directives
            .requires
            .get(&self.id)
            .map(|requires| &**requires)
    }

    pub(crate) fn requires_scopes(self) -> &'a [Vec<StringId>] {
        self.subgraphs
            .directives
            .requires_scopes
            .get(&self.id)
            .map(|scopes| &**scopes)
            .unwrap_or_default()
    }

    pub(crate) fn subscription_filter(self) -> Option<&'a Value> {
        self.subgraphs.directives.subscription_filters.get(&self.id)
    }

    pub(crate) fn tags(self) -> impl Iterator<Item = StringWalker<'a>> {
        self.subgraphs
            .directives
            .tags
            .range((self.id, StringId::MIN)..=(self.id, StringId::MAX))
            .map(move |(_, tag)| self.walk(*tag))
    }

    pub(crate) fn iter_composed_directives(self) -> impl Iterator<Item = (StringId, &'a Arguments)> {
        let instances = &self.subgraphs.directives.composed_directive_instances;
        let start = instances.partition_point(|(id, _, _)| *id < self.id);
        instances[start..]
            .iter()
            .take_while(move |(id, _, _)| *id == self.id)
            .map(|(_, name, arguments)| (*name, arguments))
    }
}
