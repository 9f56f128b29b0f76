use super::*;
use std::fmt;

/// All the keys (`@key(...)`) in all the subgraphs in one container.
///
/// Invariant: `keys` is sorted by `Key::definition_id`. We rely on it for
/// binary search.
#[derive(Default)]
pub(super) struct Keys {
    pub(super) keys: Vec<Key>,
    pub(super) nested_key_fields: NestedKeyFields,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct KeyId(pub(super) usize);

/// Corresponds to an `@key` annotation.
#[derive(Debug, PartialEq, PartialOrd)]
pub(crate) struct Key {
    pub(super) definition_id: DefinitionId,
    pub(super) selection_set: Vec<KeySelection>,
    pub(super) resolvable: bool,
}

/// One field inside the selection set of a `@key`, `@provides` or
/// `@requires`, together with its nested selections.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct KeySelection {
    pub(crate) field: StringId,
    pub(crate) subselection: Vec<KeySelection>,
}

/// Fields that take part in a composite key defined _on another type_.
///
/// ```graphql,ignore
/// type Entity @key(fields: "name nested { identifier }") {
///   name: String!
///   nested: Nested!
/// }
///
/// type Nested {
///   identifier: ID!
/// }
/// ```
///
/// `Nested.identifier` is a nested key field.
#[derive(Default)]
pub(crate) struct NestedKeyFields {
    fields: BTreeSet<FieldId>,
}

impl NestedKeyFields {
    pub(crate) fn insert(&mut self, field_id: FieldId) {
        self.fields.insert(field_id);
    }

    pub(crate) fn contains(&self, field_id: &FieldId) -> bool {
        self.fields.contains(field_id)
    }
}

impl Subgraphs {
    pub(crate) fn push_key(
        &mut self,
        definition_id: DefinitionId,
        fields_arg: &str,
        resolvable: bool,
    ) -> Result<(), String> {
        let selection_set = self.selection_set_from_str(fields_arg)?;
        self.keys.keys.push(Key {
            definition_id,
            selection_set,
            resolvable,
        });
        Ok(())
    }

    /// Parse the string value of a `fields:` argument into a selection set.
    pub(crate) fn selection_set_from_str(&mut self, fields: &str) -> Result<Vec<KeySelection>, String> {
        let raw = parse_key_fields(fields).map_err(|err| err.to_string())?;

        fn intern_selections(raw: Vec<RawSelection<'_>>, subgraphs: &mut Subgraphs) -> Vec<KeySelection> {
            raw.into_iter()
                .map(|selection| KeySelection {
                    field: subgraphs.strings.intern(selection.field),
                    subselection: intern_selections(selection.subselection, subgraphs),
                })
                .collect()
        }

        Ok(intern_selections(raw, self))
    }

    /// The selection set in the order it was written, e.g. `b a { c d }`.
    pub(crate) fn render_selection_set(&self, selection_set: &[KeySelection]) -> String {
        let mut out = String::new();
        self.render_selections(selection_set, &mut out, false);
        out
    }

    /// The selection set with lexicographically sorted sibling fields. Two
    /// selection sets are the same key if and only if their canonical
    /// renderings are equal.
    pub(crate) fn render_canonical_selection_set(&self, selection_set: &[KeySelection]) -> String {
        let mut out = String::new();
        self.render_selections(selection_set, &mut out, true);
        out
    }

    fn render_selections(&self, selection_set: &[KeySelection], out: &mut String, canonical: bool) {
        let mut selections: Vec<&KeySelection> = selection_set.iter().collect();

        if canonical {
            selections.sort_by_key(|selection| self.strings.resolve(selection.field));
        }

        for (idx, selection) in selections.into_iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }

            out.push_str(self.strings.resolve(selection.field));

            if !selection.subselection.is_empty() {
                out.push_str(" { ");
                self.render_selections(&selection.subselection, out, canonical);
                out.push_str(" }");
            }
        }
    }

    pub(crate) fn with_nested_key_fields<F>(&mut self, handler: F)
    where
        F: FnOnce(&Subgraphs, &mut NestedKeyFields),
    {
        let mut nested_key_fields = std::mem::take(&mut self.keys.nested_key_fields);
        handler(self, &mut nested_key_fields);
        self.keys.nested_key_fields = nested_key_fields;
    }
}

pub(crate) type KeyWalker<'a> = Walker<'a, KeyId>;

impl<'a> KeyWalker<'a> {
    fn key(self) -> &'a Key {
        &self.subgraphs.keys.keys[self.id.0]
    }

    pub(crate) fn fields(self) -> &'a [KeySelection] {
        &self.key().selection_set
    }

    pub(crate) fn is_resolvable(self) -> bool {
        self.key().resolvable
    }

    pub(crate) fn canonical(self) -> String {
        self.subgraphs.render_canonical_selection_set(self.fields())
    }
}

impl<'a> DefinitionWalker<'a> {
    pub(crate) fn is_entity(self) -> bool {
        self.entity_keys().next().is_some()
    }

    pub(crate) fn entity_keys(self) -> impl Iterator<Item = KeyWalker<'a>> {
        let start = self
            .subgraphs
            .keys
            .keys
            .partition_point(|key| key.definition_id < self.id);
        self.subgraphs.keys.keys[start..]
            .iter()
            .take_while(move |key| key.definition_id == self.id)
            .enumerate()
            .map(move |(idx, _)| self.walk(KeyId(start + idx)))
    }
}

impl FieldWalker<'_> {
    /// Returns true iff there is an `@key` directive containing this field,
    /// possibly with others as part of a composite key.
    pub(crate) fn is_part_of_key(self) -> bool {
        let (field_id, _) = self.id;
        let field_name = field_id.1;
        self.parent_definition()
            .entity_keys()
            .flat_map(|key| key.fields().iter())
            .any(|selection| selection.field == field_name)
            || self.subgraphs.keys.nested_key_fields.contains(&field_id)
    }
}

/// A field selection parsed out of the `fields` argument mini-language, with
/// names still borrowed from the source string.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RawSelection<'a> {
    pub(crate) field: &'a str,
    pub(crate) subselection: Vec<RawSelection<'a>>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum KeyParseError<'a> {
    /// A `{` with no field name directly before it.
    UnopenedBrace { position: usize },
    /// A `}` at the root scope.
    UnbalancedClosingBrace { position: usize },
    /// A `{ }` with no fields inside.
    EmptyScope { position: usize },
    /// The input ended inside a nested scope.
    UnclosedScope { open_scopes: usize },
    /// The whole selection set contains no fields.
    EmptyKey,
    /// A token that is not a valid GraphQL name.
    InvalidFieldName { token: &'a str },
}

impl fmt::Display for KeyParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyParseError::UnopenedBrace { position } => {
                write!(f, "`{{` at offset {position} does not follow a field name")
            }
            KeyParseError::UnbalancedClosingBrace { position } => {
                write!(f, "unbalanced `}}` at offset {position}: no matching `{{`")
            }
            KeyParseError::EmptyScope { position } => {
                write!(f, "the nested selection closed at offset {position} contains no fields")
            }
            KeyParseError::UnclosedScope { open_scopes } => {
                write!(f, "the selection set ends with {open_scopes} unclosed `{{`")
            }
            KeyParseError::EmptyKey => f.write_str("the selection set contains no fields"),
            KeyParseError::InvalidFieldName { token } => {
                write!(f, "`{token}` is not a valid field name")
            }
        }
    }
}

/// Parse the selection set mini-language of `@key`, `@provides` and
/// `@requires`: whitespace separated field names, `{ ... }` for nested
/// selections, nothing else. A single left-to-right scan over the characters,
/// maintaining the stack of open scopes and the field name being read.
pub(crate) fn parse_key_fields(raw: &str) -> Result<Vec<RawSelection<'_>>, KeyParseError<'_>> {
    fn flush_token<'a>(
        raw: &'a str,
        scopes: &mut [Vec<RawSelection<'a>>],
        token_start: &mut Option<usize>,
        can_open_scope: &mut bool,
        end: usize,
    ) -> Result<(), KeyParseError<'a>> {
        let Some(start) = token_start.take() else {
            return Ok(());
        };

        let token = &raw[start..end];

        if !is_valid_field_name(token) {
            return Err(KeyParseError::InvalidFieldName { token });
        }

        scopes
            .last_mut()
            .expect("scope stack is never empty")
            .push(RawSelection {
                field: token,
                subselection: Vec::new(),
            });
        *can_open_scope = true;
        Ok(())
    }

    let mut scopes: Vec<Vec<RawSelection<'_>>> = vec![Vec::new()];
    let mut token_start: Option<usize> = None;
    // Whether the last element of the current scope is a field that `{` may
    // attach a nested selection to.
    let mut can_open_scope = false;

    for (position, character) in raw.char_indices() {
        match character {
            c if c.is_whitespace() || c == ',' => {
                flush_token(raw, &mut scopes, &mut token_start, &mut can_open_scope, position)?;
            }
            '{' => {
                flush_token(raw, &mut scopes, &mut token_start, &mut can_open_scope, position)?;

                if !can_open_scope {
                    return Err(KeyParseError::UnopenedBrace { position });
                }

                scopes.push(Vec::new());
                can_open_scope = false;
            }
            '}' => {
                flush_token(raw, &mut scopes, &mut token_start, &mut can_open_scope, position)?;

                if scopes.len() == 1 {
                    return Err(KeyParseError::UnbalancedClosingBrace { position });
                }

                let subselection = scopes.pop().expect("scope stack is never empty");

                if subselection.is_empty() {
                    return Err(KeyParseError::EmptyScope { position });
                }

                scopes
                    .last_mut()
                    .expect("scope stack is never empty")
                    .last_mut()
                    .expect("a scope is only opened after a field")
                    .subselection = subselection;
                can_open_scope = false;
            }
            _ => {
                token_start.get_or_insert(position);
            }
        }
    }

    flush_token(raw, &mut scopes, &mut token_start, &mut can_open_scope, raw.len())?;

    if scopes.len() > 1 {
        return Err(KeyParseError::UnclosedScope {
            open_scopes: scopes.len() - 1,
        });
    }

    let root = scopes.pop().expect("scope stack is never empty");

    if root.is_empty() {
        return Err(KeyParseError::EmptyKey);
    }

    Ok(root)
}

/// Reparse an already rendered selection set string and render it
/// canonically, with sibling fields sorted lexicographically. Returns `None`
/// for strings that do not parse, which cannot happen for strings produced
/// by our own renderer.
pub(crate) fn canonicalize_selection_str(raw: &str) -> Option<String> {
    fn render(selections: &mut [RawSelection<'_>], out: &mut String) {
        selections.sort_by_key(|selection| selection.field);

        for (idx, selection) in selections.iter_mut().enumerate() {
            if idx > 0 {
                out.push(' ');
            }

            out.push_str(selection.field);

            if !selection.subselection.is_empty() {
                out.push_str(" { ");
                render(&mut selection.subselection, out);
                out.push_str(" }");
            }
        }
    }

    let mut parsed = parse_key_fields(raw).ok()?;
    let mut out = String::new();
    render(&mut parsed, &mut out);
    Some(out)
}

fn is_valid_field_name(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else { return false };

    (first == '_' || first.is_ascii_alphabetic()) && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(field: &str) -> RawSelection<'_> {
        RawSelection {
            field,
            subselection: Vec::new(),
        }
    }

    #[test]
    fn flat_key() {
        assert_eq!(parse_key_fields("a b c"), Ok(vec![flat("a"), flat("b"), flat("c")]));
    }

    #[test]
    fn composite_key() {
        assert_eq!(
            parse_key_fields("a { b c } d"),
            Ok(vec![
                RawSelection {
                    field: "a",
                    subselection: vec![flat("b"), flat("c")],
                },
                flat("d"),
            ])
        );
    }

    #[test]
    fn deeply_nested_key() {
        assert_eq!(
            parse_key_fields("id org { id owner { id } }"),
            Ok(vec![
                flat("id"),
                RawSelection {
                    field: "org",
                    subselection: vec![
                        flat("id"),
                        RawSelection {
                            field: "owner",
                            subselection: vec![flat("id")],
                        },
                    ],
                },
            ])
        );
    }

    #[test]
    fn commas_and_extra_whitespace_are_insignificant() {
        assert_eq!(
            parse_key_fields("  a,\n\tb  "),
            Ok(vec![flat("a"), flat("b")])
        );
    }

    #[test]
    fn unclosed_scope() {
        assert_eq!(parse_key_fields("a {"), Err(KeyParseError::UnclosedScope { open_scopes: 1 }));
        assert_eq!(
            parse_key_fields("a { b { c }"),
            Err(KeyParseError::UnclosedScope { open_scopes: 1 })
        );
    }

    #[test]
    fn unbalanced_closing_brace() {
        assert_eq!(parse_key_fields("}"), Err(KeyParseError::UnbalancedClosingBrace { position: 0 }));
        assert_eq!(
            parse_key_fields("a { b } }"),
            Err(KeyParseError::UnbalancedClosingBrace { position: 8 })
        );
    }

    #[test]
    fn empty_scope() {
        assert_eq!(parse_key_fields("a { }"), Err(KeyParseError::EmptyScope { position: 4 }));
        assert_eq!(parse_key_fields("a {}"), Err(KeyParseError::EmptyScope { position: 3 }));
    }

    #[test]
    fn brace_without_preceding_field() {
        assert_eq!(parse_key_fields("{ a }"), Err(KeyParseError::UnopenedBrace { position: 0 }));
        assert_eq!(
            parse_key_fields("a { b } { c }"),
            Err(KeyParseError::UnopenedBrace { position: 8 })
        );
    }

    #[test]
    fn invalid_field_names() {
        assert_eq!(
            parse_key_fields("valid 9starts_with_digit"),
            Err(KeyParseError::InvalidFieldName {
                token: "9starts_with_digit"
            })
        );
        assert_eq!(
            parse_key_fields("emoji🦀"),
            Err(KeyParseError::InvalidFieldName { token: "emoji🦀" })
        );
        assert_eq!(
            parse_key_fields("a(b: 1)"),
            Err(KeyParseError::InvalidFieldName { token: "a(b:" })
        );
    }

    #[test]
    fn empty_key() {
        assert_eq!(parse_key_fields(""), Err(KeyParseError::EmptyKey));
        assert_eq!(parse_key_fields("   "), Err(KeyParseError::EmptyKey));
    }

    #[test]
    fn underscore_names() {
        assert_eq!(parse_key_fields("_id __typename"), Ok(vec![flat("_id"), flat("__typename")]));
    }
}
