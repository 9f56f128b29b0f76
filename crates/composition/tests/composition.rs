use federation_composition::{compose, render_api_sdl, render_federated_sdl, Subgraphs};
use pretty_assertions::assert_eq;

fn compose_subgraphs(subgraphs_sdl: &[(&str, &str)]) -> federation_composition::CompositionResult {
    let mut subgraphs = Subgraphs::default();

    for (name, sdl) in subgraphs_sdl {
        let parsed = async_graphql_parser::parse_schema(sdl)
            .unwrap_or_else(|err| panic!("failed to parse the {name} subgraph: {err}"));
        subgraphs.ingest(&parsed, name, &format!("http://{name}.example.com/graphql"));
    }

    compose(&subgraphs)
}

fn expect_success(subgraphs_sdl: &[(&str, &str)]) -> federation_composition::CompositionArtifacts {
    match compose_subgraphs(subgraphs_sdl).into_result() {
        Ok(artifacts) => artifacts,
        Err(diagnostics) => panic!(
            "expected composition to succeed, got errors:\n{}",
            diagnostics.iter_errors().collect::<Vec<_>>().join("\n"),
        ),
    }
}

fn expect_errors(subgraphs_sdl: &[(&str, &str)]) -> Vec<String> {
    match compose_subgraphs(subgraphs_sdl).into_result() {
        Ok(_) => panic!("expected composition to fail"),
        Err(diagnostics) => diagnostics.iter_errors().map(str::to_owned).collect(),
    }
}

#[test]
fn no_subgraphs_is_an_error() {
    let errors = expect_errors(&[]);
    assert!(errors[0].contains("At least one subgraph"), "{errors:?}");
}

#[test]
fn duplicate_and_empty_subgraph_names_are_one_aggregated_error() {
    let errors = expect_errors(&[
        ("books", "type Query { a: String }"),
        ("books", "type Query { b: String }"),
        ("", "type Query { c: String }"),
    ]);

    let name_errors: Vec<&String> = errors.iter().filter(|error| error.contains("Invalid subgraph names")).collect();
    assert_eq!(name_errors.len(), 1, "{errors:?}");
    assert!(name_errors[0].contains("books"), "{errors:?}");
    assert!(name_errors[0].contains("empty name"), "{errors:?}");
}

#[test]
fn disjoint_subgraphs_compose_to_the_union() {
    let artifacts = expect_success(&[
        (
            "books",
            r#"
            type Query { books: [Book!]! }
            type Book { id: ID! title: String! }
            "#,
        ),
        (
            "authors",
            r#"
            type Query { authors: [Author!]! }
            type Author { id: ID! name: String! }
            "#,
        ),
    ]);

    let graph = &artifacts.federated_graph;

    for type_name in ["Query", "Book", "Author"] {
        assert!(graph.definition_by_name(type_name).is_some(), "missing {type_name}");
    }

    let query_id = graph.query_type.expect("no query root");
    let query_fields: Vec<&str> = graph
        .fields_of(query_id)
        .iter()
        .map(|field| graph.str(field.name))
        .collect();

    assert_eq!(query_fields, vec!["authors", "books"]);
}

#[test]
fn composing_the_output_is_idempotent() {
    let first = expect_success(&[
        ("books", "type Query { books: [Book!]! } type Book { id: ID! title: String! }"),
        ("authors", "type Query { authors: [Author!]! } type Author { id: ID! name: String! }"),
    ]);

    let api_sdl = render_api_sdl(&first.federated_graph);
    let second = expect_success(&[("merged", &api_sdl)]);

    let mut first_names: Vec<String> = first
        .federated_graph
        .type_definitions
        .iter()
        .map(|definition| first.federated_graph.str(definition.name).to_owned())
        .collect();
    let mut second_names: Vec<String> = second
        .federated_graph
        .type_definitions
        .iter()
        .map(|definition| second.federated_graph.str(definition.name).to_owned())
        .collect();

    first_names.sort();
    second_names.sort();

    assert_eq!(first_names, second_names);
}

#[test]
fn unshareable_value_type_field_is_a_violation_naming_both_subgraphs() {
    let errors = expect_errors(&[
        (
            "inventory",
            "type Query { product: Product } type Product { price: Float }",
        ),
        (
            "reviews",
            "type Query { topProduct: Product } type Product { price: Float }",
        ),
    ]);

    let shareability: Vec<&String> = errors
        .iter()
        .filter(|error| error.contains("Product.price") && error.contains("@shareable"))
        .collect();
    assert_eq!(shareability.len(), 1, "{errors:?}");
    assert!(shareability[0].contains("inventory"), "{errors:?}");
    assert!(shareability[0].contains("reviews"), "{errors:?}");
}

#[test]
fn shareable_in_all_subgraphs_resolves_the_violation() {
    expect_success(&[
        (
            "inventory",
            "type Query { product: Product } type Product { price: Float @shareable }",
        ),
        (
            "reviews",
            "type Query { topProduct: Product } type Product { price: Float @shareable }",
        ),
    ]);
}

#[test]
fn field_on_unreachable_value_type_is_unresolvable() {
    let errors = expect_errors(&[
        ("gadgets", "type Query { widget: Widget } type Widget { id: ID! }"),
        ("metrics", "type Widget { size: Int }"),
    ]);

    let unresolvable: Vec<&String> = errors.iter().filter(|error| error.contains("unresolvable")).collect();
    assert!(!unresolvable.is_empty(), "{errors:?}");
    assert!(unresolvable[0].contains("Widget.size"), "{errors:?}");
    assert!(unresolvable[0].contains("metrics"), "{errors:?}");
    assert!(unresolvable[0].contains("Query.widget"), "{errors:?}");
}

#[test]
fn a_key_makes_the_field_resolvable() {
    expect_success(&[
        (
            "gadgets",
            r#"type Query { widget: Widget } type Widget @key(fields: "id") { id: ID! }"#,
        ),
        (
            "metrics",
            r#"type Widget @key(fields: "id") { id: ID! size: Int }"#,
        ),
    ]);
}

#[test]
fn missing_interface_field_is_aggregated_per_type() {
    let errors = expect_errors(&[(
        "main",
        r#"
        type Query { media: [Media!]! }
        interface Media { id: ID! title: String! }
        type Book implements Media { id: ID! }
        "#,
    )]);

    let conformance: Vec<&String> = errors
        .iter()
        .filter(|error| error.contains("does not satisfy the interface"))
        .collect();
    assert!(!conformance.is_empty(), "{errors:?}");
    assert!(conformance[0].contains("Unimplemented fields: title"), "{errors:?}");
}

#[test]
fn narrowing_a_nullable_interface_field_is_accepted() {
    expect_success(&[(
        "main",
        r#"
        type Query { media: [Media!]! }
        interface Media { title: String }
        type Book implements Media { title: String! }
        "#,
    )]);
}

#[test]
fn widening_a_non_nullable_interface_field_is_rejected() {
    let errors = expect_errors(&[(
        "main",
        r#"
        type Query { media: [Media!]! }
        interface Media { title: String! }
        type Book implements Media { title: String }
        "#,
    )]);

    assert!(
        errors.iter().any(|error| error.contains("does not satisfy the interface")),
        "{errors:?}"
    );
}

#[test]
fn output_field_types_merge_to_the_least_restrictive() {
    let artifacts = expect_success(&[
        (
            "users",
            r#"
            type Query { users: [User!]! }
            type User @key(fields: "id") { id: ID! name: String! }
            "#,
        ),
        (
            "contact",
            r#"
            type User @key(fields: "id") { id: ID! name: String email: String! }
            "#,
        ),
    ]);

    let graph = &artifacts.federated_graph;
    let user = graph.definition_by_name("User").unwrap();
    let user_id = graph
        .type_definitions
        .iter()
        .position(|definition| definition.name == user.name)
        .unwrap();

    let name_field = graph
        .fields_of(federation_composition::TypeDefinitionId(user_id))
        .iter()
        .find(|field| graph.str(field.name) == "name")
        .expect("User.name is missing");

    assert_eq!(name_field.r#type.render(graph), "String");
}

#[test]
fn opposite_nullability_divergences_are_a_conflict() {
    let errors = expect_errors(&[
        (
            "a",
            r#"type Query { things: Thing } type Thing @key(fields: "id") { id: ID! items: [String]! }"#,
        ),
        (
            "b",
            r#"type Thing @key(fields: "id") { id: ID! items: [String!] }"#,
        ),
    ]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("Thing.items") && error.contains("opposite directions")),
        "{errors:?}"
    );
}

#[test]
fn argument_types_merge_to_the_most_restrictive() {
    let artifacts = expect_success(&[
        (
            "search",
            r#"type Query { search(term: String): [String!]! }"#,
        ),
        (
            "search2",
            r#"type Query { search(term: String!): [String!]! }"#,
        ),
    ]);

    let configuration = artifacts
        .field_configurations
        .iter()
        .find(|configuration| configuration.type_name == "Query" && configuration.field_name == "search")
        .expect("missing field configuration for Query.search");

    assert_eq!(configuration.argument_names, vec!["term"]);

    let graph = &artifacts.federated_graph;
    let query_id = artifacts.federated_graph.query_type.unwrap();
    let search = graph
        .fields_of(query_id)
        .iter()
        .find(|field| graph.str(field.name) == "search")
        .unwrap();

    assert_eq!(search.arguments[0].r#type.render(graph), "String!");
}

#[test]
fn required_argument_missing_in_another_subgraph_is_an_error() {
    let errors = expect_errors(&[
        ("a", "type Query { search(term: String!): [String!]! }"),
        ("b", "type Query { search: [String!]! }"),
    ]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("search") && error.contains("required in `a`")),
        "{errors:?}"
    );
}

#[test]
fn enums_used_only_in_output_merge_by_union() {
    let artifacts = expect_success(&[
        ("a", "type Query { status: Status } enum Status { OPEN }"),
        ("b", "type Query { other: Status @shareable } enum Status { CLOSED }"),
    ]);

    let graph = &artifacts.federated_graph;
    let status = graph.definition_by_name("Status").unwrap();
    let values: Vec<&str> = status.enum_values.iter().map(|value| graph.str(value.value)).collect();

    assert_eq!(values, vec!["CLOSED", "OPEN"]);
}

#[test]
fn enums_used_only_in_input_merge_by_intersection() {
    let artifacts = expect_success(&[
        ("a", "type Query { search(status: Status): String } enum Status { OPEN CLOSED }"),
        ("b", "type Query { count(status: Status): Int } enum Status { OPEN ARCHIVED }"),
    ]);

    let graph = &artifacts.federated_graph;
    let status = graph.definition_by_name("Status").unwrap();
    let values: Vec<&str> = status.enum_values.iter().map(|value| graph.str(value.value)).collect();

    assert_eq!(values, vec!["OPEN"]);
}

#[test]
fn enums_used_in_both_positions_must_match() {
    let errors = expect_errors(&[
        (
            "a",
            "type Query { status: Status search(status: Status): String } enum Status { OPEN CLOSED }",
        ),
        ("b", "type Query { ignored: Int } enum Status { OPEN }"),
    ]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("Status") && error.contains("CLOSED") && error.contains("`b`")),
        "{errors:?}"
    );
}

#[test]
fn inaccessible_is_filtered_from_the_api_sdl_but_not_the_federated_sdl() {
    let artifacts = expect_success(&[(
        "main",
        r#"
        type Query { product: Product secret: Secret @inaccessible }
        type Product { name: String price: Float @inaccessible }
        type Secret @inaccessible { code: String }
        "#,
    )]);

    let federated = render_federated_sdl(&artifacts.federated_graph);
    let api = render_api_sdl(&artifacts.federated_graph);

    assert!(federated.contains("price"), "{federated}");
    assert!(federated.contains("Secret"), "{federated}");
    assert!(federated.contains("@inaccessible"), "{federated}");

    assert!(!api.contains("price"), "{api}");
    assert!(!api.contains("Secret"), "{api}");
    assert!(!api.contains("@inaccessible"), "{api}");
}

#[test]
fn accessible_field_of_inaccessible_type_is_an_error() {
    let errors = expect_errors(&[(
        "main",
        r#"
        type Query { secret: Secret }
        type Secret @inaccessible { code: String }
        "#,
    )]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("Query.secret") && error.contains("@inaccessible")),
        "{errors:?}"
    );
}

#[test]
fn duplicate_type_definitions_in_one_subgraph_are_an_error() {
    let errors = expect_errors(&[(
        "main",
        "type Query { a: String } type Thing { a: String } type Thing { b: String }",
    )]);

    assert!(
        errors.iter().any(|error| error.contains("Duplicate definition of the type `Thing`")),
        "{errors:?}"
    );
}

#[test]
fn extensions_merge_into_their_base_type() {
    let artifacts = expect_success(&[(
        "main",
        r#"
        type Query { thing: Thing }
        type Thing { a: String }
        extend type Thing { b: Int }
        "#,
    )]);

    let graph = &artifacts.federated_graph;
    let thing = graph.definition_by_name("Thing").unwrap();
    let thing_id = graph
        .type_definitions
        .iter()
        .position(|definition| definition.name == thing.name)
        .unwrap();

    let field_names: Vec<&str> = graph
        .fields_of(federation_composition::TypeDefinitionId(thing_id))
        .iter()
        .map(|field| graph.str(field.name))
        .collect();

    assert_eq!(field_names, vec!["a", "b"]);
}

#[test]
fn undefined_referenced_type_is_an_error() {
    let errors = expect_errors(&[("main", "type Query { thing: Thing }")]);

    assert!(
        errors.iter().any(|error| error.contains("`Thing`") && error.contains("not defined")),
        "{errors:?}"
    );
}

#[test]
fn unknown_directive_is_an_error() {
    let errors = expect_errors(&[("main", "type Query { a: String @whatever }")]);

    assert!(
        errors.iter().any(|error| error.contains("@whatever") && error.contains("not defined")),
        "{errors:?}"
    );
}

#[test]
fn directive_validation_aggregates_all_reasons() {
    let errors = expect_errors(&[(
        "main",
        r#"type Query { a: String @override(label: 3, label: 3) }"#,
    )]);

    let directive_errors: Vec<&String> = errors
        .iter()
        .filter(|error| error.contains("Invalid application of `@override`"))
        .collect();

    assert_eq!(directive_errors.len(), 1, "{errors:?}");
    assert!(directive_errors[0].contains("required argument `from` is missing"), "{errors:?}");
    assert!(directive_errors[0].contains("more than once"), "{errors:?}");
}

#[test]
fn default_root_type_name_conflicting_with_custom_mapping_is_an_error() {
    let errors = expect_errors(&[(
        "main",
        r#"
        schema { query: RootQuery }
        type RootQuery { a: String }
        type Query { b: String }
        "#,
    )]);

    assert!(
        errors.iter().any(|error| error.contains("default name for a root")),
        "{errors:?}"
    );
}

#[test]
fn incompatible_kinds_across_subgraphs_are_an_error() {
    let errors = expect_errors(&[
        ("a", "type Query { thing: Thing } type Thing { a: String }"),
        ("b", "type Query { other: String @shareable } enum Thing { A }"),
    ]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("`Thing`") && error.contains("object") && error.contains("enum")),
        "{errors:?}"
    );
}

#[test]
fn input_object_fields_merge_by_intersection() {
    let artifacts = expect_success(&[
        (
            "a",
            "type Query { search(filter: Filter): String } input Filter { name: String age: Int }",
        ),
        (
            "b",
            "type Query { count(filter: Filter): Int } input Filter { name: String }",
        ),
    ]);

    let graph = &artifacts.federated_graph;
    let filter = graph.definition_by_name("Filter").unwrap();
    let filter_id = graph
        .type_definitions
        .iter()
        .position(|definition| definition.name == filter.name)
        .unwrap();

    let field_names: Vec<&str> = graph
        .fields_of(federation_composition::TypeDefinitionId(filter_id))
        .iter()
        .map(|field| graph.str(field.name))
        .collect();

    assert_eq!(field_names, vec!["name"]);
}

#[test]
fn required_input_field_missing_in_a_subgraph_is_an_error() {
    let errors = expect_errors(&[
        (
            "a",
            "type Query { search(filter: Filter): String } input Filter { name: String must: Int! }",
        ),
        (
            "b",
            "type Query { count(filter: Filter): Int } input Filter { name: String }",
        ),
    ]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("Filter.must") && error.contains("required in `a`")),
        "{errors:?}"
    );
}

#[test]
fn entity_keys_end_up_in_the_router_configuration() {
    let artifacts = expect_success(&[
        (
            "products",
            r#"
            type Query { products: [Product!]! }
            type Product @key(fields: "sku org { id }") {
                sku: ID!
                org: Organization!
                name: String!
            }
            type Organization { id: ID! }
            "#,
        ),
        (
            "pricing",
            r#"
            type Product @key(fields: "sku org { id }") {
                sku: ID!
                org: Organization!
                price: Float!
            }
            type Organization { id: ID! }
            "#,
        ),
    ]);

    let product = artifacts
        .configuration_by_type_name
        .get("Product")
        .expect("missing Product configuration");

    assert!(!product.is_root_node);
    assert_eq!(product.keys.len(), 2);
    assert_eq!(product.keys[0].selection_set, "org { id } sku");
    assert!(!product.keys[0].disable_entity_resolver);

    let query = artifacts.configuration_by_type_name.get("Query").unwrap();
    assert!(query.is_root_node);

    let products_subgraph = artifacts
        .subgraph_configurations
        .iter()
        .find(|subgraph| subgraph.name == "products")
        .unwrap();
    assert!(products_subgraph
        .configuration_data_by_type_name
        .contains_key("Product"));
}

#[test]
fn non_resolvable_keys_disable_the_entity_resolver() {
    let artifacts = expect_success(&[
        (
            "reviews",
            r#"
            type Query { reviews: [Review!]! }
            type Review { body: String! author: User! }
            type User @key(fields: "id", resolvable: false) { id: ID! }
            "#,
        ),
        (
            "users",
            r#"
            type Query { user(id: ID!): User }
            type User @key(fields: "id") { id: ID! name: String! }
            "#,
        ),
    ]);

    let user = artifacts.configuration_by_type_name.get("User").unwrap();
    let disabled: Vec<bool> = user.keys.iter().map(|key| key.disable_entity_resolver).collect();
    assert!(disabled.contains(&true), "{user:?}");
    assert!(disabled.contains(&false), "{user:?}");
}

#[test]
fn authorization_metadata_lands_in_field_configurations() {
    let artifacts = expect_success(&[(
        "main",
        r#"
        type Query {
            me: String @authenticated
            confidential: String @requiresScopes(scopes: [["read:secrets"]])
        }
        "#,
    )]);

    let me = artifacts
        .field_configurations
        .iter()
        .find(|configuration| configuration.field_name == "me")
        .unwrap();
    assert!(me.requires_authentication);

    let confidential = artifacts
        .field_configurations
        .iter()
        .find(|configuration| configuration.field_name == "confidential")
        .unwrap();
    assert_eq!(confidential.required_scopes, vec![vec!["read:secrets".to_owned()]]);
}

#[test]
fn interface_objects_contribute_fields_to_implementers() {
    let artifacts = expect_success(&[
        (
            "content",
            r#"
            type Query { media(id: ID!): Media }
            interface Media @key(fields: "id") { id: ID! title: String! }
            type Book implements Media @key(fields: "id") { id: ID! title: String! pages: Int! }
            "#,
        ),
        (
            "reviews",
            r#"
            type Media @key(fields: "id") @interfaceObject { id: ID! reviewCount: Int! }
            "#,
        ),
    ]);

    let graph = &artifacts.federated_graph;

    let media = graph.definition_by_name("Media").unwrap();
    assert!(media.keys.iter().any(|key| key.is_interface_object));

    let book = graph.definition_by_name("Book").unwrap();
    let book_id = graph
        .type_definitions
        .iter()
        .position(|definition| definition.name == book.name)
        .unwrap();
    let book_fields: Vec<&str> = graph
        .fields_of(federation_composition::TypeDefinitionId(book_id))
        .iter()
        .map(|field| graph.str(field.name))
        .collect();

    assert_eq!(book_fields, vec!["id", "pages", "reviewCount", "title"]);

    let media_configuration = artifacts.configuration_by_type_name.get("Media").unwrap();
    assert_eq!(media_configuration.entity_interface_concrete_type_names, vec!["Book"]);
}

#[test]
fn interface_object_without_the_directive_is_an_error() {
    let errors = expect_errors(&[
        (
            "content",
            r#"
            type Query { media(id: ID!): Media }
            interface Media @key(fields: "id") { id: ID! title: String! }
            type Book implements Media @key(fields: "id") { id: ID! title: String! }
            "#,
        ),
        (
            "reviews",
            r#"
            type Media @key(fields: "id") { id: ID! reviewCount: Int! }
            "#,
        ),
    ]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("@interfaceObject") && error.contains("reviews")),
        "{errors:?}"
    );
}

#[test]
fn overridden_fields_change_ownership() {
    let artifacts = expect_success(&[
        (
            "products",
            r#"
            type Query { products: [Product!]! }
            type Product @key(fields: "id") { id: ID! name: String! }
            "#,
        ),
        (
            "catalog",
            r#"
            type Product @key(fields: "id") { id: ID! name: String! @override(from: "products") }
            "#,
        ),
    ]);

    let graph = &artifacts.federated_graph;
    let product = graph.definition_by_name("Product").unwrap();
    let product_id = graph
        .type_definitions
        .iter()
        .position(|definition| definition.name == product.name)
        .unwrap();

    let name_field = graph
        .fields_of(federation_composition::TypeDefinitionId(product_id))
        .iter()
        .find(|field| graph.str(field.name) == "name")
        .unwrap();

    assert_eq!(name_field.overrides.len(), 1);
    let (overriding_subgraph, from) = &name_field.overrides[0];
    assert_eq!(graph.str(graph.subgraphs[overriding_subgraph.0].name), "catalog");
    assert_eq!(graph.str(*from), "products");
}

#[test]
fn overriding_from_the_same_subgraph_is_an_error() {
    let errors = expect_errors(&[
        (
            "products",
            r#"
            type Query { products: [Product!]! }
            type Product @key(fields: "id") { id: ID! name: String! @override(from: "products") }
            "#,
        ),
    ]);

    assert!(
        errors
            .iter()
            .any(|error| error.contains("Source and destination subgraphs")),
        "{errors:?}"
    );
}

#[test]
fn link_renamed_federation_directives_are_honored() {
    expect_success(&[
        (
            "inventory",
            r#"
            extend schema @link(url: "https://specs.apollo.dev/federation/v2.3", import: [{ name: "@shareable", as: "@partageable" }])
            type Query { product: Product }
            type Product { price: Float @partageable }
            "#,
        ),
        (
            "reviews",
            "type Query { topProduct: Product } type Product { price: Float @shareable }",
        ),
    ]);
}
