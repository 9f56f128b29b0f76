use super::*;
use async_graphql_parser::types as ast;
use std::{collections::HashMap, fmt};

/// The hard limit on list/non-null wrapping depth. Deeper types are a fatal
/// ingestion error, never silently truncated.
pub(crate) const MAXIMUM_TYPE_NESTING: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FieldTypeId(usize);

/// A GraphQL type reference: a named type with zero or more list and non-null
/// wrappers around it.
///
/// ```graphql,ignore
/// type Query {
///     recentPosts: [Post!]!
///                  ^^^^^^^^
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FieldTypeRecord {
    pub(crate) definition_name: StringId,
    /// Wrappers from the outside in. A `NonNull` applies to whatever follows
    /// it: the next list wrapper, or the named type itself.
    pub(crate) wrapping: Vec<TypeWrapper>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum TypeWrapper {
    NonNull,
    List,
}

impl FieldTypeRecord {
    pub(crate) fn is_required(&self) -> bool {
        matches!(self.wrapping.first(), Some(TypeWrapper::NonNull))
    }

    /// Render with the given name for the named type, e.g. `[Post!]!`.
    pub(crate) fn render(&self, definition_name: &str) -> String {
        fn render_inner(wrapping: &[TypeWrapper], definition_name: &str) -> String {
            match wrapping.split_first() {
                None => definition_name.to_owned(),
                Some((TypeWrapper::NonNull, rest)) => format!("{}!", render_inner(rest, definition_name)),
                Some((TypeWrapper::List, rest)) => format!("[{}]", render_inner(rest, definition_name)),
            }
        }
        render_inner(&self.wrapping, definition_name)
    }
}

#[derive(Default)]
pub(super) struct FieldTypes {
    records: Vec<FieldTypeRecord>,
    ids: HashMap<FieldTypeRecord, FieldTypeId>,
}

impl Subgraphs {
    /// Returns an error when the wrapping exceeds [MAXIMUM_TYPE_NESTING].
    pub(crate) fn intern_field_type(&mut self, field_type: &ast::Type) -> Result<FieldTypeId, String> {
        let mut wrapping = Vec::new();
        let mut current = field_type;

        let name = loop {
            if wrapping.len() >= MAXIMUM_TYPE_NESTING {
                return Err(format!(
                    "Type wrapping exceeds the maximum nesting of {MAXIMUM_TYPE_NESTING} levels.",
                ));
            }

            if !current.nullable {
                wrapping.push(TypeWrapper::NonNull);
            }

            match &current.base {
                ast::BaseType::Named(name) => break name.as_str(),
                ast::BaseType::List(inner) => {
                    wrapping.push(TypeWrapper::List);
                    current = inner;
                }
            }
        };

        let record = FieldTypeRecord {
            definition_name: self.strings.intern(name),
            wrapping,
        };

        Ok(self.intern_field_type_record(record))
    }

    pub(crate) fn intern_field_type_record(&mut self, record: FieldTypeRecord) -> FieldTypeId {
        if let Some(id) = self.field_types.ids.get(&record) {
            return *id;
        }

        let id = FieldTypeId(self.field_types.records.push_return_idx(record.clone()));
        self.field_types.ids.insert(record, id);
        id
    }
}

pub(crate) type FieldTypeWalker<'a> = Walker<'a, FieldTypeId>;

impl<'a> FieldTypeWalker<'a> {
    pub(crate) fn record(self) -> &'a FieldTypeRecord {
        &self.subgraphs.field_types.records[self.id.0]
    }

    /// The name of the named type at the innermost position.
    pub(crate) fn type_name(self) -> StringWalker<'a> {
        self.walk(self.record().definition_name)
    }

    /// The definition with the name returned by `type_name` in `subgraph`.
    pub(crate) fn definition(self, subgraph: SubgraphId) -> Option<DefinitionWalker<'a>> {
        self.subgraphs
            .definition_by_name_id(self.record().definition_name, subgraph)
            .map(|id| self.walk(id))
    }

    pub(crate) fn is_required(self) -> bool {
        self.record().is_required()
    }
}

impl fmt::Display for FieldTypeWalker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.record().render(self.type_name().as_str()))
    }
}

/// Which of the two possible merged types to produce when the nullability of
/// the merged types diverges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MergePolicy {
    /// Keep the non-null wrapper at each divergence. Used for shared input
    /// positions (arguments, input object fields).
    MostRestrictive,
    /// Drop the non-null wrapper at each divergence. Used for shared output
    /// field types: the field must be nullable if the weakest subgraph only
    /// guarantees that much.
    LeastRestrictive,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TypeMergeConflict {
    /// The innermost named types differ.
    NameMismatch,
    /// The list nesting of the two types differs.
    StructureMismatch,
    /// The two types diverged in nullability in both directions. Depths are
    /// wrapper positions in the merged type, outermost first.
    OppositeDivergence { first_depth: usize, second_depth: usize },
}

impl TypeMergeConflict {
    pub(crate) fn explain(&self, first: &str, second: &str) -> String {
        match self {
            TypeMergeConflict::NameMismatch | TypeMergeConflict::StructureMismatch => {
                format!("the types `{first}` and `{second}` are incompatible")
            }
            TypeMergeConflict::OppositeDivergence {
                first_depth,
                second_depth,
            } => format!(
                "the types `{first}` and `{second}` diverge in nullability in opposite directions (at nesting levels {first_depth} and {second_depth})"
            ),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RestrictiveSide {
    First,
    Second,
}

/// Merge two wrapped types describing the same named type.
///
/// The walk copies layers as long as both sides agree. The first nullability
/// divergence locks a direction: the side with the extra non-null wrapper is
/// the more restrictive one, and every later divergence must keep pointing
/// the same way, otherwise the types genuinely conflict. List nesting and the
/// named type must match exactly.
pub(crate) fn merge_field_types(
    first: &FieldTypeRecord,
    second: &FieldTypeRecord,
    policy: MergePolicy,
) -> Result<FieldTypeRecord, TypeMergeConflict> {
    if first.definition_name != second.definition_name {
        return Err(TypeMergeConflict::NameMismatch);
    }

    let mut merged = Vec::new();
    let mut restrictive_side: Option<(RestrictiveSide, usize)> = None;
    let mut i = 0;
    let mut j = 0;

    let mut diverge = |side: RestrictiveSide, depth: usize| match restrictive_side {
        Some((locked_side, locked_depth)) if locked_side != side => Err(TypeMergeConflict::OppositeDivergence {
            first_depth: locked_depth,
            second_depth: depth,
        }),
        Some(_) => Ok(()),
        None => {
            restrictive_side = Some((side, depth));
            Ok(())
        }
    };

    loop {
        match (first.wrapping.get(i), second.wrapping.get(j)) {
            (Some(TypeWrapper::NonNull), Some(TypeWrapper::NonNull)) => {
                merged.push(TypeWrapper::NonNull);
                i += 1;
                j += 1;
            }
            (Some(TypeWrapper::List), Some(TypeWrapper::List)) => {
                merged.push(TypeWrapper::List);
                i += 1;
                j += 1;
            }
            (Some(TypeWrapper::NonNull), _) => {
                diverge(RestrictiveSide::First, merged.len())?;
                if let MergePolicy::MostRestrictive = policy {
                    merged.push(TypeWrapper::NonNull);
                }
                i += 1;
            }
            (_, Some(TypeWrapper::NonNull)) => {
                diverge(RestrictiveSide::Second, merged.len())?;
                if let MergePolicy::MostRestrictive = policy {
                    merged.push(TypeWrapper::NonNull);
                }
                j += 1;
            }
            (Some(TypeWrapper::List), None) | (None, Some(TypeWrapper::List)) => {
                return Err(TypeMergeConflict::StructureMismatch);
            }
            (None, None) => break,
        }
    }

    Ok(FieldTypeRecord {
        definition_name: first.definition_name,
        wrapping: merged,
    })
}

/// Whether `sub` can be used where `sup` is expected: same named type, same
/// list nesting, and `sub` is non-null everywhere `sup` is.
pub(crate) fn is_at_least_as_restrictive(sub: &FieldTypeRecord, sup: &FieldTypeRecord) -> bool {
    sub.definition_name == sup.definition_name && wrapping_is_at_least_as_restrictive(&sub.wrapping, &sup.wrapping)
}

/// The wrapper-only part of [is_at_least_as_restrictive], for callers that
/// handle named type covariance themselves.
pub(crate) fn wrapping_is_at_least_as_restrictive(sub: &[TypeWrapper], sup: &[TypeWrapper]) -> bool {
    let mut i = 0;
    let mut j = 0;

    loop {
        match (sub.get(i), sup.get(j)) {
            (Some(TypeWrapper::NonNull), Some(TypeWrapper::NonNull)) => {
                i += 1;
                j += 1;
            }
            (Some(TypeWrapper::List), Some(TypeWrapper::List)) => {
                i += 1;
                j += 1;
            }
            // An extra non-null on the implementer side is fine.
            (Some(TypeWrapper::NonNull), _) => {
                i += 1;
            }
            // The supertype requires non-null where the subtype does not.
            (_, Some(TypeWrapper::NonNull)) => return false,
            (Some(TypeWrapper::List), None) | (None, Some(TypeWrapper::List)) => return false,
            (None, None) => return true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: StringId) -> FieldTypeRecord {
        FieldTypeRecord {
            definition_name: name,
            wrapping: Vec::new(),
        }
    }

    fn with_wrapping(name: StringId, wrapping: &[TypeWrapper]) -> FieldTypeRecord {
        FieldTypeRecord {
            definition_name: name,
            wrapping: wrapping.to_vec(),
        }
    }

    const NAME: StringId = StringId::MIN;

    #[test]
    fn merging_identical_types_is_identity() {
        use TypeWrapper::*;

        for record in [
            named(NAME),
            with_wrapping(NAME, &[NonNull]),
            with_wrapping(NAME, &[NonNull, List, NonNull]),
            with_wrapping(NAME, &[List, List]),
        ] {
            for policy in [MergePolicy::MostRestrictive, MergePolicy::LeastRestrictive] {
                assert_eq!(merge_field_types(&record, &record, policy), Ok(record.clone()));
            }
        }
    }

    #[test]
    fn single_divergence_follows_policy() {
        use TypeWrapper::*;

        let nullable = named(NAME);
        let required = with_wrapping(NAME, &[NonNull]);

        assert_eq!(
            merge_field_types(&nullable, &required, MergePolicy::MostRestrictive),
            Ok(required.clone())
        );
        assert_eq!(
            merge_field_types(&nullable, &required, MergePolicy::LeastRestrictive),
            Ok(nullable.clone())
        );
        assert_eq!(
            merge_field_types(&required, &nullable, MergePolicy::MostRestrictive),
            Ok(required.clone())
        );

        // Inside a list as well.
        let list_of_nullable = with_wrapping(NAME, &[List]);
        let list_of_required = with_wrapping(NAME, &[List, NonNull]);

        assert_eq!(
            merge_field_types(&list_of_nullable, &list_of_required, MergePolicy::MostRestrictive),
            Ok(list_of_required.clone())
        );
        assert_eq!(
            merge_field_types(&list_of_nullable, &list_of_required, MergePolicy::LeastRestrictive),
            Ok(list_of_nullable.clone())
        );
    }

    #[test]
    fn opposite_divergences_conflict() {
        use TypeWrapper::*;

        // `[A]!` vs `[A!]`: the first is more restrictive outside, the second inside.
        let first = with_wrapping(NAME, &[NonNull, List]);
        let second = with_wrapping(NAME, &[List, NonNull]);

        let conflict = merge_field_types(&first, &second, MergePolicy::MostRestrictive).unwrap_err();
        assert_eq!(
            conflict,
            TypeMergeConflict::OppositeDivergence {
                first_depth: 0,
                second_depth: 2,
            }
        );

        // Same direction twice is fine: `[A!]!` vs `[A]`.
        let first = with_wrapping(NAME, &[NonNull, List, NonNull]);
        let second = with_wrapping(NAME, &[List]);

        assert_eq!(
            merge_field_types(&first, &second, MergePolicy::LeastRestrictive),
            Ok(second.clone())
        );
        assert_eq!(
            merge_field_types(&first, &second, MergePolicy::MostRestrictive),
            Ok(first.clone())
        );
    }

    #[test]
    fn list_nesting_mismatch_conflicts() {
        use TypeWrapper::*;

        let scalar = named(NAME);
        let list = with_wrapping(NAME, &[List]);
        let nested_list = with_wrapping(NAME, &[List, List]);

        for (a, b) in [(&scalar, &list), (&list, &nested_list), (&scalar, &nested_list)] {
            assert_eq!(
                merge_field_types(a, b, MergePolicy::MostRestrictive),
                Err(TypeMergeConflict::StructureMismatch)
            );
        }
    }

    #[test]
    fn name_mismatch_conflicts() {
        let first = named(StringId::MIN);
        let second = named(StringId::MAX);

        assert_eq!(
            merge_field_types(&first, &second, MergePolicy::LeastRestrictive),
            Err(TypeMergeConflict::NameMismatch)
        );
    }

    #[test]
    fn restrictiveness_ordering() {
        use TypeWrapper::*;

        let nullable = named(NAME);
        let required = with_wrapping(NAME, &[NonNull]);
        let list_of_required = with_wrapping(NAME, &[List, NonNull]);
        let required_list_of_required = with_wrapping(NAME, &[NonNull, List, NonNull]);

        assert!(is_at_least_as_restrictive(&required, &nullable));
        assert!(!is_at_least_as_restrictive(&nullable, &required));
        assert!(is_at_least_as_restrictive(&required, &required));
        assert!(is_at_least_as_restrictive(&required_list_of_required, &list_of_required));
        assert!(!is_at_least_as_restrictive(&list_of_required, &required_list_of_required));
        assert!(!is_at_least_as_restrictive(&required, &list_of_required));
    }

    #[test]
    fn rendering() {
        use TypeWrapper::*;

        assert_eq!(named(NAME).render("Post"), "Post");
        assert_eq!(with_wrapping(NAME, &[NonNull]).render("Post"), "Post!");
        assert_eq!(with_wrapping(NAME, &[NonNull, List, NonNull]).render("Post"), "[Post!]!");
        assert_eq!(with_wrapping(NAME, &[List, List]).render("Post"), "[[Post]]");
    }
}
