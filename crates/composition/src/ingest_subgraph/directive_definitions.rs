use super::{directives::FederationDirectiveName, DirectiveMatcher};
use async_graphql_parser::types as ast;
use std::collections::HashMap;

bitflags::bitflags! {
    /// The type system directive locations a directive may be applied at.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct DirectiveLocations: u16 {
        const SCHEMA = 1;
        const SCALAR = 1 << 1;
        const OBJECT = 1 << 2;
        const FIELD_DEFINITION = 1 << 3;
        const ARGUMENT_DEFINITION = 1 << 4;
        const INTERFACE = 1 << 5;
        const UNION = 1 << 6;
        const ENUM = 1 << 7;
        const ENUM_VALUE = 1 << 8;
        const INPUT_OBJECT = 1 << 9;
        const INPUT_FIELD_DEFINITION = 1 << 10;
        /// Executable locations, which we do not validate against in a type
        /// system document.
        const EXECUTABLE = 1 << 11;
    }
}

impl DirectiveLocations {
    pub(crate) fn position_name(self) -> &'static str {
        match self {
            DirectiveLocations::SCHEMA => "schema",
            DirectiveLocations::SCALAR => "scalar",
            DirectiveLocations::OBJECT => "object",
            DirectiveLocations::FIELD_DEFINITION => "field definition",
            DirectiveLocations::ARGUMENT_DEFINITION => "argument definition",
            DirectiveLocations::INTERFACE => "interface",
            DirectiveLocations::UNION => "union",
            DirectiveLocations::ENUM => "enum",
            DirectiveLocations::ENUM_VALUE => "enum value",
            DirectiveLocations::INPUT_OBJECT => "input object",
            DirectiveLocations::INPUT_FIELD_DEFINITION => "input field definition",
            _ => "unknown",
        }
    }
}

fn convert_location(location: ast::DirectiveLocation) -> DirectiveLocations {
    match location {
        ast::DirectiveLocation::Schema => DirectiveLocations::SCHEMA,
        ast::DirectiveLocation::Scalar => DirectiveLocations::SCALAR,
        ast::DirectiveLocation::Object => DirectiveLocations::OBJECT,
        ast::DirectiveLocation::FieldDefinition => DirectiveLocations::FIELD_DEFINITION,
        ast::DirectiveLocation::ArgumentDefinition => DirectiveLocations::ARGUMENT_DEFINITION,
        ast::DirectiveLocation::Interface => DirectiveLocations::INTERFACE,
        ast::DirectiveLocation::Union => DirectiveLocations::UNION,
        ast::DirectiveLocation::Enum => DirectiveLocations::ENUM,
        ast::DirectiveLocation::EnumValue => DirectiveLocations::ENUM_VALUE,
        ast::DirectiveLocation::InputObject => DirectiveLocations::INPUT_OBJECT,
        ast::DirectiveLocation::InputFieldDefinition => DirectiveLocations::INPUT_FIELD_DEFINITION,
        _ => DirectiveLocations::EXECUTABLE,
    }
}

/// A directive definition as relevant to use-site validation.
pub(crate) struct DirectiveDefinitionRecord {
    pub(crate) locations: DirectiveLocations,
    pub(crate) repeatable: bool,
    /// (argument name, is required)
    pub(crate) arguments: Vec<(String, bool)>,
}

/// All directive definitions in scope in one subgraph: the GraphQL built-ins,
/// the federation set under the names resolved by the [DirectiveMatcher], and
/// any directive definitions in the document itself.
pub(crate) struct DirectiveDefinitions {
    definitions: HashMap<String, DirectiveDefinitionRecord>,
}

impl DirectiveDefinitions {
    pub(crate) fn new(matcher: &DirectiveMatcher<'_>, document: &ast::ServiceDocument) -> Self {
        let mut definitions = HashMap::new();

        for (resolved_name, directive) in matcher.iter_federation_directive_names() {
            definitions.insert(resolved_name.to_owned(), federation_directive_definition(directive));
        }

        definitions.insert(
            "deprecated".to_owned(),
            DirectiveDefinitionRecord {
                locations: DirectiveLocations::FIELD_DEFINITION
                    | DirectiveLocations::ARGUMENT_DEFINITION
                    | DirectiveLocations::ENUM_VALUE
                    | DirectiveLocations::INPUT_FIELD_DEFINITION,
                repeatable: false,
                arguments: vec![("reason".to_owned(), false)],
            },
        );

        definitions.insert(
            "specifiedBy".to_owned(),
            DirectiveDefinitionRecord {
                locations: DirectiveLocations::SCALAR,
                repeatable: false,
                arguments: vec![("url".to_owned(), true)],
            },
        );

        definitions.insert(
            "link".to_owned(),
            DirectiveDefinitionRecord {
                locations: DirectiveLocations::SCHEMA,
                repeatable: true,
                arguments: vec![
                    ("url".to_owned(), true),
                    ("as".to_owned(), false),
                    ("for".to_owned(), false),
                    ("import".to_owned(), false),
                ],
            },
        );

        definitions.insert(
            "openfed__subscriptionFilter".to_owned(),
            DirectiveDefinitionRecord {
                locations: DirectiveLocations::FIELD_DEFINITION,
                repeatable: false,
                arguments: vec![("condition".to_owned(), true)],
            },
        );

        // Directives defined in the document itself. These take precedence
        // over our defaults, so a subgraph may redefine e.g. @tag.
        for definition in &document.definitions {
            let ast::TypeSystemDefinition::Directive(directive_definition) = definition else {
                continue;
            };
            let directive_definition = &directive_definition.node;

            let locations = directive_definition
                .locations
                .iter()
                .map(|location| convert_location(location.node))
                .collect();

            let arguments = directive_definition
                .arguments
                .iter()
                .map(|argument| {
                    let argument = &argument.node;
                    let required = !argument.ty.node.nullable && argument.default_value.is_none();
                    (argument.name.node.to_string(), required)
                })
                .collect();

            definitions.insert(
                directive_definition.name.node.to_string(),
                DirectiveDefinitionRecord {
                    locations,
                    repeatable: directive_definition.is_repeatable,
                    arguments,
                },
            );
        }

        DirectiveDefinitions { definitions }
    }

    pub(crate) fn get(&self, directive_name: &str) -> Option<&DirectiveDefinitionRecord> {
        self.definitions.get(directive_name)
    }
}

fn federation_directive_definition(directive: FederationDirectiveName) -> DirectiveDefinitionRecord {
    use FederationDirectiveName as N;

    let composite = DirectiveLocations::OBJECT | DirectiveLocations::INTERFACE;
    let everywhere = DirectiveLocations::all() & !DirectiveLocations::EXECUTABLE & !DirectiveLocations::SCHEMA;

    let (locations, repeatable, arguments) = match directive {
        N::Authenticated => (
            composite | DirectiveLocations::FIELD_DEFINITION | DirectiveLocations::SCALAR | DirectiveLocations::ENUM,
            false,
            vec![],
        ),
        N::ComposeDirective => (DirectiveLocations::SCHEMA, true, vec![("name", true)]),
        N::Extends => (composite, false, vec![]),
        N::External => (DirectiveLocations::OBJECT | DirectiveLocations::FIELD_DEFINITION, false, vec![]),
        N::Inaccessible => (everywhere, false, vec![]),
        N::InterfaceObject => (DirectiveLocations::OBJECT, false, vec![]),
        N::Key => (composite, true, vec![("fields", true), ("resolvable", false)]),
        N::Override => (
            DirectiveLocations::FIELD_DEFINITION,
            false,
            vec![("from", true), ("label", false)],
        ),
        N::Provides => (DirectiveLocations::FIELD_DEFINITION, false, vec![("fields", true)]),
        N::Requires => (DirectiveLocations::FIELD_DEFINITION, false, vec![("fields", true)]),
        N::RequiresScopes => (
            composite | DirectiveLocations::FIELD_DEFINITION | DirectiveLocations::SCALAR | DirectiveLocations::ENUM,
            false,
            vec![("scopes", true)],
        ),
        N::Shareable => (DirectiveLocations::OBJECT | DirectiveLocations::FIELD_DEFINITION, true, vec![]),
        N::Tag => (everywhere | DirectiveLocations::SCHEMA, true, vec![("name", true)]),
    };

    DirectiveDefinitionRecord {
        locations,
        repeatable,
        arguments: arguments
            .into_iter()
            .map(|(name, required)| (name.to_owned(), required))
            .collect(),
    }
}
