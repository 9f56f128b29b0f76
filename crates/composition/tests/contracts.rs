use federation_composition::{build_contract, compose, render_api_sdl, Subgraphs};
use std::collections::BTreeSet;

fn compose_single(sdl: &str) -> federation_composition::CompositionArtifacts {
    let mut subgraphs = Subgraphs::default();
    let parsed = async_graphql_parser::parse_schema(sdl).expect("parse error");
    subgraphs.ingest(&parsed, "main", "http://main.example.com/graphql");
    compose(&subgraphs).into_result().expect("composition failed")
}

#[test]
fn excluded_tags_become_inaccessible_in_the_contract() {
    let artifacts = compose_single(
        r#"
        type Query {
            products: [Product!]!
            internalReport: String @tag(name: "internal")
        }
        type Product {
            name: String!
            margin: Float @tag(name: "internal")
            price: Float @tag(name: "public")
        }
        "#,
    );

    let excluded: BTreeSet<String> = ["internal".to_owned()].into_iter().collect();
    let contract = build_contract(&artifacts.federated_graph, &excluded).expect("contract failed");

    let api = render_api_sdl(&contract);

    assert!(!api.contains("internalReport"), "{api}");
    assert!(!api.contains("margin"), "{api}");
    assert!(api.contains("price"), "{api}");
    assert!(api.contains("products"), "{api}");

    // The source graph is untouched.
    let original_api = render_api_sdl(&artifacts.federated_graph);
    assert!(original_api.contains("margin"), "{original_api}");
}

#[test]
fn excluding_tags_on_types_and_enum_values() {
    let artifacts = compose_single(
        r#"
        type Query {
            status: Status
            audit: Audit @tag(name: "beta")
        }
        enum Status {
            OPEN
            LEGACY @tag(name: "beta")
        }
        type Audit @tag(name: "beta") {
            entries: [String!]!
        }
        "#,
    );

    let excluded: BTreeSet<String> = ["beta".to_owned()].into_iter().collect();
    let contract = build_contract(&artifacts.federated_graph, &excluded).expect("contract failed");

    let api = render_api_sdl(&contract);

    assert!(!api.contains("LEGACY"), "{api}");
    assert!(!api.contains("Audit"), "{api}");
    assert!(api.contains("OPEN"), "{api}");
}

#[test]
fn a_contract_must_keep_an_accessible_query_root() {
    let artifacts = compose_single(
        r#"
        type Query {
            everything: String @tag(name: "all")
        }
        "#,
    );

    let excluded: BTreeSet<String> = ["all".to_owned()].into_iter().collect();
    let diagnostics = build_contract(&artifacts.federated_graph, &excluded).expect_err("contract should fail");

    assert!(
        diagnostics
            .iter_errors()
            .any(|error| error.contains("every field of the query root")),
        "{:?}",
        diagnostics.iter_errors().collect::<Vec<_>>(),
    );
}

#[test]
fn contracts_without_exclusions_are_the_identity() {
    let artifacts = compose_single("type Query { a: String }");

    let contract = build_contract(&artifacts.federated_graph, &BTreeSet::new()).expect("contract failed");

    assert_eq!(render_api_sdl(&contract), render_api_sdl(&artifacts.federated_graph));
}
