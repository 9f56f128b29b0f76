mod consts;

use self::consts::*;
use super::*;
use crate::subgraphs::DirectiveSiteId;
use std::{borrow::Cow, collections::BTreeSet};

/// Ingest and validate all directives on a directive site.
///
/// `location_name` computes the dotted path of the site for error messages,
/// e.g. `Query.users(filter:)`.
pub(super) fn ingest_directives(
    ctx: &mut Context<'_>,
    directive_site_id: DirectiveSiteId,
    directives_node: &[Positioned<ast::ConstDirective>],
    location: DirectiveLocations,
    location_name: impl Fn(&mut Context<'_>) -> String,
) {
    validate_directives(ctx, directives_node, location, &location_name);

    for directive in directives_node {
        let directive = &directive.node;
        let directive_name = directive.name.node.as_str();

        let flag = [
            (ctx.directive_matcher.is_shareable(directive_name), DirectiveSiteFlags::SHAREABLE),
            (ctx.directive_matcher.is_external(directive_name), DirectiveSiteFlags::EXTERNAL),
            (ctx.directive_matcher.is_inaccessible(directive_name), DirectiveSiteFlags::INACCESSIBLE),
            (
                ctx.directive_matcher.is_interface_object(directive_name),
                DirectiveSiteFlags::INTERFACE_OBJECT,
            ),
            (ctx.directive_matcher.is_extends(directive_name), DirectiveSiteFlags::EXTENDS),
            (
                ctx.directive_matcher.is_authenticated(directive_name),
                DirectiveSiteFlags::AUTHENTICATED,
            ),
        ]
        .into_iter()
        .find_map(|(matches, flag)| matches.then_some(flag));

        if let Some(flag) = flag {
            ctx.subgraphs.set_site_flag(directive_site_id, flag);
            continue;
        }

        if ctx.directive_matcher.is_override(directive_name) {
            let from = directive.get_argument("from").and_then(|value| match &value.node {
                ConstValue::String(s) => Some(ctx.subgraphs.strings.intern(s.as_str())),
                _ => None,
            });

            let Some(from) = from else { continue };

            ctx.subgraphs.insert_override(directive_site_id, from);
            continue;
        }

        if ctx.directive_matcher.is_requires(directive_name) {
            let fields_arg = directive.get_argument("fields").map(|value| &value.node);
            let Some(ConstValue::String(fields_arg)) = fields_arg else {
                continue;
            };

            if let Err(error) = ctx.subgraphs.insert_requires(directive_site_id, fields_arg) {
                let location_name = location_name(ctx);
                ctx.subgraphs.push_ingestion_diagnostic(
                    ctx.subgraph_id,
                    format!("Invalid `fields` argument in `@requires` on `{location_name}`: {error}"),
                );
            }
            continue;
        }

        if ctx.directive_matcher.is_provides(directive_name) {
            let fields_arg = directive.get_argument("fields").map(|value| &value.node);
            let Some(ConstValue::String(fields_arg)) = fields_arg else {
                continue;
            };

            if let Err(error) = ctx.subgraphs.insert_provides(directive_site_id, fields_arg) {
                let location_name = location_name(ctx);
                ctx.subgraphs.push_ingestion_diagnostic(
                    ctx.subgraph_id,
                    format!("Invalid `fields` argument in `@provides` on `{location_name}`: {error}"),
                );
            }
            continue;
        }

        if ctx.directive_matcher.is_tag(directive_name) {
            let Some(name) = directive.get_argument("name") else {
                continue;
            };

            if let ConstValue::String(name) = &name.node {
                ctx.subgraphs.insert_tag(directive_site_id, name.as_str());
            }
            continue;
        }

        if ctx.directive_matcher.is_requires_scopes(directive_name) {
            let scopes = directive
                .get_argument("scopes")
                .into_iter()
                .filter_map(|scopes| match &scopes.node {
                    ConstValue::List(list) => Some(list),
                    _ => None,
                })
                .flatten();

            for scope_group in scopes {
                let inner_scopes: Vec<subgraphs::StringId> = match scope_group {
                    ConstValue::List(scopes) => scopes
                        .iter()
                        .filter_map(|scope| match scope {
                            ConstValue::String(string) => Some(ctx.subgraphs.strings.intern(string.as_str())),
                            _ => None,
                        })
                        .collect(),
                    _ => continue,
                };
                ctx.subgraphs.append_requires_scopes(directive_site_id, inner_scopes);
            }
            continue;
        }

        if ctx.directive_matcher.is_subscription_filter(directive_name) {
            if let Some(condition) = directive.get_argument("condition") {
                let condition = ast_value_to_subgraph_value(&condition.node, ctx.subgraphs);
                ctx.subgraphs.insert_subscription_filter(directive_site_id, condition);
            }
            continue;
        }

        if directive_name == "deprecated" {
            let reason = directive.get_argument("reason").and_then(|value| match &value.node {
                ConstValue::String(s) => Some(s.as_str()),
                _ => None,
            });

            ctx.subgraphs.insert_deprecated(directive_site_id, reason);
            continue;
        }

        let directive_name_id = ctx.subgraphs.strings.intern(directive_name);
        if ctx.subgraphs.is_composed_directive(ctx.subgraph_id, directive_name_id) {
            let arguments = directive
                .arguments
                .iter()
                .map(|(name, value)| {
                    (
                        ctx.subgraphs.strings.intern(name.node.as_str()),
                        ast_value_to_subgraph_value(&value.node, ctx.subgraphs),
                    )
                })
                .collect();
            ctx.subgraphs
                .insert_composed_directive_instance(directive_site_id, directive_name, arguments);
        }
    }
}

/// Check every directive application on the site against the known directive
/// definitions: the directive must be defined, the location allowed, a
/// non-repeatable directive must not repeat, required arguments must be
/// present, and arguments must be known and unique. All problems with one
/// application are aggregated into a single diagnostic.
fn validate_directives(
    ctx: &mut Context<'_>,
    directives_node: &[Positioned<ast::ConstDirective>],
    location: DirectiveLocations,
    location_name: &impl Fn(&mut Context<'_>) -> String,
) {
    for (idx, directive) in directives_node.iter().enumerate() {
        let directive = &directive.node;
        let directive_name = directive.name.node.as_str();
        let mut reasons = Vec::new();

        match ctx.directive_definitions.get(directive_name) {
            None => reasons.push(format!("the directive `@{directive_name}` is not defined")),
            Some(definition) => {
                if !definition.locations.contains(location) {
                    reasons.push(format!(
                        "the directive `@{directive_name}` is not valid in the {} position",
                        location.position_name(),
                    ));
                }

                if !definition.repeatable
                    && directives_node[..idx]
                        .iter()
                        .any(|previous| previous.node.name.node == directive.name.node)
                {
                    reasons.push(format!(
                        "the directive `@{directive_name}` is not repeatable, but it is applied more than once"
                    ));
                }

                for (argument_name, required) in &definition.arguments {
                    if *required
                        && !directive
                            .arguments
                            .iter()
                            .any(|(name, _)| name.node.as_str() == argument_name)
                    {
                        reasons.push(format!("the required argument `{argument_name}` is missing"));
                    }
                }

                for (arg_idx, (argument_name, _)) in directive.arguments.iter().enumerate() {
                    if !definition
                        .arguments
                        .iter()
                        .any(|(known, _)| known == argument_name.node.as_str())
                    {
                        reasons.push(format!(
                            "the argument `{}` is not defined on `@{directive_name}`",
                            argument_name.node
                        ));
                    }

                    if directive.arguments[..arg_idx]
                        .iter()
                        .any(|(previous, _)| previous.node == argument_name.node)
                    {
                        reasons.push(format!("the argument `{}` is defined more than once", argument_name.node));
                    }
                }
            }
        }

        if !reasons.is_empty() {
            let location_name = location_name(ctx);
            ctx.subgraphs.push_ingestion_diagnostic(
                ctx.subgraph_id,
                format!(
                    "Invalid application of `@{directive_name}` on `{location_name}`: {}.",
                    reasons.join("; ")
                ),
            );
        }
    }
}

pub(super) fn ingest_keys(
    definition_id: DefinitionId,
    directives_node: &[Positioned<ast::ConstDirective>],
    ctx: &mut Context<'_>,
) {
    for directive in directives_node {
        let directive = &directive.node;
        let directive_name = directive.name.node.as_str();

        if !ctx.directive_matcher.is_key(directive_name) {
            continue;
        }

        let fields_arg = directive.get_argument("fields").map(|value| &value.node);
        let Some(ConstValue::String(fields_arg)) = fields_arg else {
            continue;
        };
        let is_resolvable = directive
            .get_argument("resolvable")
            .and_then(|value| match value.node {
                ConstValue::Boolean(b) => Some(b),
                _ => None,
            })
            .unwrap_or(true); // defaults to true

        if let Err(error) = ctx.subgraphs.push_key(definition_id, fields_arg, is_resolvable) {
            let type_name = ctx.subgraphs.walk(definition_id).name().as_str().to_owned();
            ctx.subgraphs.push_ingestion_diagnostic(
                ctx.subgraph_id,
                format!("Invalid `fields` argument in `@key` on `{type_name}`: {error}"),
            );
        }
    }
}

pub(super) fn ingest_directive_definitions(
    document: &ast::ServiceDocument,
    mut push_error: impl FnMut(String),
) -> DirectiveMatcher<'_> {
    let schema_definition_directives = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            ast::TypeSystemDefinition::Schema(schema) => Some(schema),
            _ => None,
        })
        .flat_map(|definition| definition.node.directives.iter());

    let mut directive_matcher = schema_definition_directives
        .clone()
        .map(|directive| &directive.node)
        .find(|directive| DirectiveMatcher::is_federation_directive(directive))
        .map(DirectiveMatcher::new)
        .unwrap_or_default();

    let mut composed_directives = BTreeSet::new();

    for name in schema_definition_directives
        .filter(|directive| directive_matcher.is_compose_directive(directive.node.name.node.as_str()))
        .filter_map(|directive| directive.node.get_argument("name"))
        .filter_map(|directive_name| match &directive_name.node {
            ConstValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    {
        composed_directives.insert(name.trim_start_matches('@'));

        if !name.starts_with('@') {
            push_error(format!(
                "The `{name}` directive is missing the `@` prefix in @composeDirective."
            ));
        }
    }

    directive_matcher.composed_directives = composed_directives;

    directive_matcher
}

/// This struct is the source of truth for matching federation directives by name when ingesting a
/// subgraph's GraphQL SDL.
///
/// The names of federation directives are influenced by `@link` directives on schema definitions
/// or extensions in two ways:
///
/// - Imports in link directives bring the directives in scope, with optional renaming.
///   Example: `@link(url: "...", import: [{ name: "@shareable", as: "@federationShareable"}])`
///   Example: `@link(url: "...", import: ["@key"])`
///
/// - The `as` argument: `@link(url: "...", as: "compositionDirectives")`
///   - In the absence of an `@link` or `as` argument, all directives are in scope prefixed with
///     `@federation__`, for example `@federation__shareable`.
///   - With an `@link(as: "something")`, they are in scope under the `@something__` prefix.
///
/// Last rule: if a directive is `import`ed, it is no longer available under the prefix.
#[derive(Debug)]
pub(crate) struct DirectiveMatcher<'a> {
    shareable: Cow<'a, str>,
    key: Cow<'a, str>,
    external: Cow<'a, str>,
    provides: Cow<'a, str>,
    requires: Cow<'a, str>,
    inaccessible: Cow<'a, str>,
    interface_object: Cow<'a, str>,
    r#override: Cow<'a, str>,
    compose_directive: Cow<'a, str>,
    requires_scopes: Cow<'a, str>,
    authenticated: Cow<'a, str>,
    extends: Cow<'a, str>,
    tag: Cow<'a, str>,

    composed_directives: BTreeSet<&'a str>,
}

const DEFAULT_FEDERATION_PREFIX: &str = "federation__";

impl Default for DirectiveMatcher<'_> {
    fn default() -> Self {
        DirectiveMatcher {
            authenticated: Cow::Borrowed(AUTHENTICATED),
            compose_directive: Cow::Borrowed(COMPOSE_DIRECTIVE),
            composed_directives: BTreeSet::new(),
            extends: Cow::Borrowed(EXTENDS),
            external: Cow::Borrowed(EXTERNAL),
            inaccessible: Cow::Borrowed(INACCESSIBLE),
            interface_object: Cow::Borrowed(INTERFACE_OBJECT),
            key: Cow::Borrowed(KEY),
            provides: Cow::Borrowed(PROVIDES),
            r#override: Cow::Borrowed(OVERRIDE),
            requires: Cow::Borrowed(REQUIRES),
            requires_scopes: Cow::Borrowed(REQUIRES_SCOPES),
            shareable: Cow::Borrowed(SHAREABLE),
            tag: Cow::Borrowed(TAG),
        }
    }
}

impl<'a> DirectiveMatcher<'a> {
    pub(crate) fn is_federation_directive(directive: &ast::ConstDirective) -> bool {
        if directive.name.node != "link" {
            return false;
        }

        directive
            .get_argument("url")
            .map(|url| match &url.node {
                ConstValue::String(s) => s.contains("dev/federation/v2"),
                _ => false,
            })
            .unwrap_or_default()
    }

    /// Matcher for federation directives in a given subgraph. See [DirectiveMatcher] for more docs.
    pub(crate) fn new(directive: &'a ast::ConstDirective) -> DirectiveMatcher<'a> {
        let mut r#as = None;
        let mut imported: Vec<(&str, &str)> = Vec::new();

        for (arg_name, arg_value) in &directive.arguments {
            match (arg_name.node.as_str(), &arg_value.node) {
                ("as", ConstValue::String(value)) => r#as = Some(value.as_str()),
                ("import", ConstValue::List(imports)) => read_imports(imports, &mut imported),
                _ => (),
            }
        }

        let federation_prefix = r#as
            .map(|prefix| Cow::Owned(format!("{prefix}__")))
            .unwrap_or(Cow::Borrowed(DEFAULT_FEDERATION_PREFIX));
        let final_name = |directive_name: &str| {
            imported
                .iter()
                .find(|(original, _alias)| *original == directive_name)
                .map(|(_, alias)| Cow::Borrowed(*alias))
                .unwrap_or_else(|| Cow::Owned(format!("{federation_prefix}{directive_name}")))
        };

        DirectiveMatcher {
            authenticated: final_name(AUTHENTICATED),
            compose_directive: final_name(COMPOSE_DIRECTIVE),
            composed_directives: BTreeSet::new(),
            extends: final_name(EXTENDS),
            external: final_name(EXTERNAL),
            inaccessible: final_name(INACCESSIBLE),
            interface_object: final_name(INTERFACE_OBJECT),
            key: final_name(KEY),
            provides: final_name(PROVIDES),
            r#override: final_name(OVERRIDE),
            requires: final_name(REQUIRES),
            requires_scopes: final_name(REQUIRES_SCOPES),
            shareable: final_name(SHAREABLE),
            tag: final_name(TAG),
        }
    }

    pub(crate) fn iter_federation_directive_names(&self) -> impl Iterator<Item = (&str, FederationDirectiveName)> {
        [
            (self.authenticated.as_ref(), FederationDirectiveName::Authenticated),
            (self.compose_directive.as_ref(), FederationDirectiveName::ComposeDirective),
            (self.extends.as_ref(), FederationDirectiveName::Extends),
            (self.external.as_ref(), FederationDirectiveName::External),
            (self.inaccessible.as_ref(), FederationDirectiveName::Inaccessible),
            (self.interface_object.as_ref(), FederationDirectiveName::InterfaceObject),
            (self.key.as_ref(), FederationDirectiveName::Key),
            (self.provides.as_ref(), FederationDirectiveName::Provides),
            (self.r#override.as_ref(), FederationDirectiveName::Override),
            (self.requires.as_ref(), FederationDirectiveName::Requires),
            (self.requires_scopes.as_ref(), FederationDirectiveName::RequiresScopes),
            (self.shareable.as_ref(), FederationDirectiveName::Shareable),
            (self.tag.as_ref(), FederationDirectiveName::Tag),
        ]
        .into_iter()
    }

    pub(crate) fn iter_composed_directives(&self) -> impl Iterator<Item = &str> {
        self.composed_directives.iter().copied()
    }

    pub(crate) fn is_compose_directive(&self, directive_name: &str) -> bool {
        self.compose_directive == directive_name
    }

    pub(crate) fn is_extends(&self, directive_name: &str) -> bool {
        self.extends == directive_name
    }

    pub(crate) fn is_external(&self, directive_name: &str) -> bool {
        self.external == directive_name
    }

    pub(crate) fn is_interface_object(&self, directive_name: &str) -> bool {
        self.interface_object == directive_name
    }

    pub(crate) fn is_shareable(&self, directive_name: &str) -> bool {
        self.shareable == directive_name
    }

    pub(crate) fn is_override(&self, directive_name: &str) -> bool {
        self.r#override == directive_name
    }

    pub(crate) fn is_requires(&self, directive_name: &str) -> bool {
        self.requires == directive_name
    }

    pub(crate) fn is_provides(&self, directive_name: &str) -> bool {
        self.provides == directive_name
    }

    pub(crate) fn is_key(&self, directive_name: &str) -> bool {
        self.key == directive_name
    }

    pub(crate) fn is_inaccessible(&self, directive_name: &str) -> bool {
        self.inaccessible == directive_name
    }

    pub(crate) fn is_authenticated(&self, directive_name: &str) -> bool {
        self.authenticated == directive_name
    }

    pub(crate) fn is_requires_scopes(&self, directive_name: &str) -> bool {
        self.requires_scopes == directive_name
    }

    pub(crate) fn is_tag(&self, directive_name: &str) -> bool {
        self.tag == directive_name
    }

    pub(crate) fn is_subscription_filter(&self, directive_name: &str) -> bool {
        directive_name == SUBSCRIPTION_FILTER
    }
}

/// The federation directives the matcher resolves, by canonical name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FederationDirectiveName {
    Authenticated,
    ComposeDirective,
    Extends,
    External,
    Inaccessible,
    InterfaceObject,
    Key,
    Override,
    Provides,
    Requires,
    RequiresScopes,
    Shareable,
    Tag,
}

fn read_imports<'a>(ast_imports: &'a [ConstValue], out: &mut Vec<(&'a str, &'a str)>) {
    for import in ast_imports {
        match import {
            ConstValue::String(import) => {
                let import = import.trim_start_matches('@');
                out.push((import, import));
            }
            ConstValue::Object(object) => {
                if let Some(ConstValue::String(name)) = object.get("name") {
                    let alias = object.get("as").and_then(|value| match value {
                        ConstValue::String(s) => Some(s),
                        _ => None,
                    });
                    out.push((
                        name.trim_start_matches('@'),
                        alias.unwrap_or(name).trim_start_matches('@'),
                    ));
                }
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod federation_directives_matcher_tests {
    #![allow(clippy::panic)]

    use super::*;

    fn with_matcher_for_schema(graphql_sdl: &str, test: impl FnOnce(DirectiveMatcher<'_>)) {
        let ast = async_graphql_parser::parse_schema(graphql_sdl).unwrap();
        let matcher = ingest_directive_definitions(&ast, |error| panic!("{error}"));
        test(matcher);
    }

    #[test]
    fn no_link_declaration() {
        with_matcher_for_schema("type Irrelevant { id: ID! }", |matcher| {
            assert!(matcher.is_shareable("shareable"));
            assert!(matcher.is_key("key"));
            assert!(!matcher.is_key("@key"));
            assert!(!matcher.is_key("federation__key"));
            assert!(!matcher.is_shareable("federation__shareable"));
        });
    }

    #[test]
    fn bare_link_declaration() {
        let schema = r#"extend schema @link(url: "https://specs.apollo.dev/federation/v2.3")"#;
        with_matcher_for_schema(schema, |matcher| {
            assert!(matcher.is_key("federation__key"));
            assert!(matcher.is_shareable("federation__shareable"));
            assert!(!matcher.is_key("key"));
            assert!(!matcher.is_key("@key"));
            assert!(!matcher.is_shareable("shareable"));
        });
    }

    #[test]
    fn irrelevant_link_declaration() {
        let schema = r#"extend schema @link(url: "https://bad.horse", as: "horse")"#;
        with_matcher_for_schema(schema, |matcher| {
            assert!(matcher.is_key("key"));
            assert!(matcher.is_shareable("shareable"));
            assert!(!matcher.is_key("federation__key"));
            assert!(!matcher.is_shareable("federation__shareable"));
            assert!(!matcher.is_key("@key"));
        });
    }

    #[test]
    fn alias() {
        let schema = r#"extend schema @link(url: "https://specs.apollo.dev/federation/v2.3", as: "romulans")"#;
        with_matcher_for_schema(schema, |matcher| {
            assert!(!matcher.is_key("federation__key"));
            assert!(matcher.is_key("romulans__key"));
            assert!(!matcher.is_shareable("federation__shareable"));
            assert!(!matcher.is_shareable("@federation__shareable"));
            assert!(matcher.is_shareable("romulans__shareable"));
            assert!(!matcher.is_key("key"));
            assert!(!matcher.is_key("@key"));
            assert!(!matcher.is_shareable("shareable"));
        });
    }

    #[test]
    fn direct_import_and_alias() {
        let schema = r#"
            extend schema @link(
                url: "https://specs.apollo.dev/federation/v2.3",
                as: "romulans"
                import: [{ name: "@shareable", as: "partageable" }]
            )
        "#;
        with_matcher_for_schema(schema, |matcher| {
            assert!(!matcher.is_key("federation__key"));
            assert!(!matcher.is_shareable("romulans__shareable"));
            assert!(!matcher.is_shareable("romulans__partageable"));
            assert!(!matcher.is_shareable("@federation__shareable"));
            assert!(!matcher.is_key("key"));

            assert!(matcher.is_key("romulans__key"));
            assert!(matcher.is_shareable("partageable"));
        });
    }

    #[test]
    fn regular_imports() {
        let schema = r#"
            extend schema @link(
                url: "https://specs.apollo.dev/federation/v2.3",
                as: "romulans"
                import: [{ name: "@key" }, "@shareable"]
            )
        "#;
        with_matcher_for_schema(schema, |matcher| {
            assert!(!matcher.is_key("federation__key"));
            assert!(!matcher.is_shareable("federation__shareable"));
            assert!(!matcher.is_shareable("romulans__shareable"));

            assert!(matcher.is_key("key"));
            assert!(matcher.is_shareable("shareable"));
        });
    }
}
