use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FieldId(pub(crate) DefinitionId, pub(crate) StringId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ArgumentId(DefinitionId, StringId, StringId);

/// Fields of objects, interfaces and input objects, plus output field
/// arguments.
#[derive(Default)]
pub(super) struct Fields {
    definition_fields: BTreeMap<FieldId, FieldTuple>,
    field_arguments: BTreeMap<ArgumentId, ArgumentTuple>,

    /// Default values of input object fields.
    field_defaults: BTreeMap<FieldId, Value>,

    /// Groups of fields to compose. The fields are grouped by parent type
    /// name and field name.
    field_groups: BTreeSet<(StringId, StringId, DefinitionId)>,
}

/// A field in an object, interface or input object type.
#[derive(Clone, Copy)]
pub(crate) struct FieldTuple {
    r#type: FieldTypeId,
    description: Option<StringId>,
    directives: DirectiveSiteId,
}

#[derive(Clone)]
pub(crate) struct ArgumentTuple {
    r#type: FieldTypeId,
    description: Option<StringId>,
    directives: DirectiveSiteId,
    default: Option<Value>,
}

pub(crate) struct FieldIngest<'a> {
    pub(crate) parent_definition_id: DefinitionId,
    pub(crate) field_name: &'a str,
    pub(crate) field_type: FieldTypeId,
    pub(crate) description: Option<StringId>,
    pub(crate) directives: DirectiveSiteId,
}

impl Subgraphs {
    /// Returns `None` when a field with the same name already exists on the
    /// definition.
    pub(crate) fn push_field(
        &mut self,
        FieldIngest {
            parent_definition_id,
            field_name,
            field_type,
            description,
            directives,
        }: FieldIngest<'_>,
    ) -> Option<FieldId> {
        let name = self.strings.intern(field_name);
        let field_id = FieldId(parent_definition_id, name);

        if self.fields.definition_fields.contains_key(&field_id) {
            return None;
        }

        self.fields.definition_fields.insert(
            field_id,
            FieldTuple {
                r#type: field_type,
                description,
                directives,
            },
        );

        let parent_definition_name = self.walk(parent_definition_id).name().id;
        self.fields
            .field_groups
            .insert((parent_definition_name, name, parent_definition_id));

        Some(field_id)
    }

    /// Returns `None` when an argument with the same name already exists on
    /// the field. Duplicate argument names are a recorded error, not a panic.
    pub(crate) fn insert_field_argument(
        &mut self,
        FieldId(definition_id, field_name): FieldId,
        argument_name: StringId,
        r#type: FieldTypeId,
        directives: DirectiveSiteId,
        description: Option<StringId>,
        default: Option<Value>,
    ) -> Option<ArgumentId> {
        let argument_id = ArgumentId(definition_id, field_name, argument_name);

        if self.fields.field_arguments.contains_key(&argument_id) {
            return None;
        }

        self.fields.field_arguments.insert(
            argument_id,
            ArgumentTuple {
                r#type,
                description,
                directives,
                default,
            },
        );

        Some(argument_id)
    }

    pub(crate) fn insert_field_default(&mut self, field_id: FieldId, default: Value) {
        self.fields.field_defaults.insert(field_id, default);
    }

    pub(crate) fn walk_field(&self, field_id: FieldId) -> FieldWalker<'_> {
        FieldWalker {
            id: (field_id, self.fields.definition_fields[&field_id]),
            subgraphs: self,
        }
    }

    /// Iterate over groups of fields to compose. The fields are grouped by
    /// parent type name and field name. The argument is a closure that
    /// receives each group as an argument. The order of iteration is
    /// deterministic.
    pub(crate) fn iter_field_groups<'a>(&'a self, parent_name: StringId, mut compose_fn: impl FnMut(&[FieldWalker<'a>])) {
        let mut buf = Vec::new();
        for (_, group) in &self
            .fields
            .field_groups
            .range((parent_name, StringId::MIN, DefinitionId::MIN)..(parent_name, StringId::MAX, DefinitionId::MAX))
            .chunk_by(|(_, field_name, _)| field_name)
        {
            buf.clear();
            buf.extend(group.into_iter().map(|(_, field_name, definition_id)| {
                let field_id = FieldId(*definition_id, *field_name);
                FieldWalker {
                    id: (field_id, self.fields.definition_fields[&field_id]),
                    subgraphs: self,
                }
            }));
            compose_fn(&buf);
        }
    }
}

pub(crate) type FieldWalker<'a> = Walker<'a, (FieldId, FieldTuple)>;

impl<'a> FieldWalker<'a> {
    pub(crate) fn field_id(self) -> FieldId {
        self.id.0
    }

    /// ```graphql,ignore
    /// id: ID!
    /// ^^
    /// ```
    pub(crate) fn name(self) -> StringWalker<'a> {
        let (FieldId(_, name), _) = self.id;
        self.walk(name)
    }

    /// ```graphql,ignore
    /// type MyObject {
    ///   nested: [Nested!]!
    ///           ^^^^^^^^^^
    /// }
    /// ```
    pub(crate) fn r#type(self) -> FieldTypeWalker<'a> {
        let (_, tuple) = self.id;
        self.walk(tuple.r#type)
    }

    pub(crate) fn description(self) -> Option<StringWalker<'a>> {
        let (_, tuple) = self.id;
        tuple.description.map(|id| self.walk(id))
    }

    pub(crate) fn directives(self) -> DirectiveSiteWalker<'a> {
        let (_, tuple) = self.id;
        self.walk(tuple.directives)
    }

    pub(crate) fn parent_definition(self) -> DefinitionWalker<'a> {
        let (FieldId(parent_definition_id, _), _) = self.id;
        self.walk(parent_definition_id)
    }

    /// The default value, for input object fields.
    pub(crate) fn default(self) -> Option<&'a Value> {
        self.subgraphs.fields.field_defaults.get(&self.id.0)
    }

    /// ```graphql,ignore
    /// type Query {
    ///   findManyUser(filters: FindManyUserFilter, searchQuery: String): [User!]!
    ///                ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
    /// }
    /// ```
    pub(crate) fn arguments(self) -> impl Iterator<Item = FieldArgumentWalker<'a>> {
        let (FieldId(definition_id, field_name), _) = self.id;
        self.subgraphs
            .fields
            .field_arguments
            .range(
                ArgumentId(definition_id, field_name, StringId::MIN)
                    ..ArgumentId(definition_id, field_name, StringId::MAX),
            )
            .map(|(argument_id, tuple)| FieldArgumentWalker {
                id: (*argument_id, tuple.clone()),
                subgraphs: self.subgraphs,
            })
    }

    pub(crate) fn argument_by_name(self, name: StringId) -> Option<FieldArgumentWalker<'a>> {
        let (FieldId(definition_id, field_name), _) = self.id;
        let argument_id = ArgumentId(definition_id, field_name, name);
        self.subgraphs
            .fields
            .field_arguments
            .get(&argument_id)
            .map(|tuple| FieldArgumentWalker {
                id: (argument_id, tuple.clone()),
                subgraphs: self.subgraphs,
            })
    }
}

impl<'a> DefinitionWalker<'a> {
    pub(crate) fn fields(self) -> impl Iterator<Item = FieldWalker<'a>> + 'a {
        self.subgraphs
            .fields
            .definition_fields
            .range(FieldId(self.id, StringId::MIN)..=FieldId(self.id, StringId::MAX))
            .map(|(id, tuple)| FieldWalker {
                id: (*id, *tuple),
                subgraphs: self.subgraphs,
            })
    }

    pub(crate) fn find_field(self, name: StringId) -> Option<FieldWalker<'a>> {
        self.subgraphs
            .fields
            .definition_fields
            .get(&FieldId(self.id, name))
            .map(|tuple| FieldWalker {
                id: (FieldId(self.id, name), *tuple),
                subgraphs: self.subgraphs,
            })
    }
}

pub(crate) type FieldArgumentWalker<'a> = Walker<'a, (ArgumentId, ArgumentTuple)>;

impl<'a> FieldArgumentWalker<'a> {
    pub(crate) fn name(&self) -> StringWalker<'a> {
        let (ArgumentId(_, _, name), _) = self.id;
        self.walk(name)
    }

    pub(crate) fn r#type(&self) -> FieldTypeWalker<'a> {
        self.walk(self.id.1.r#type)
    }

    pub(crate) fn directives(&self) -> DirectiveSiteWalker<'a> {
        self.walk(self.id.1.directives)
    }

    pub(crate) fn default(&self) -> Option<&Value> {
        self.id.1.default.as_ref()
    }

    pub(crate) fn description(&self) -> Option<StringWalker<'a>> {
        self.id.1.description.map(|id| self.walk(id))
    }

    pub(crate) fn field(&self) -> FieldWalker<'a> {
        let (ArgumentId(definition_id, field_name, _), _) = self.id;
        self.subgraphs.walk_field(FieldId(definition_id, field_name))
    }
}
