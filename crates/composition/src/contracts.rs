use crate::{
    federated_graph::{Directive, FederatedGraph},
    Diagnostics,
};
use std::collections::BTreeSet;

/// Derive a contract: a tag-filtered view of an already composed graph.
///
/// Every schema element carrying one of the excluded `@tag` names is marked
/// `@inaccessible` in the returned graph, without re-running subgraph
/// composition. The client schema of the contract is obtained by rendering
/// the result with [render_api_sdl](crate::render_api_sdl).
///
/// This is a pure filter pass over the composed artifact: the input graph is
/// the single source of truth and is never mutated.
pub fn build_contract(graph: &FederatedGraph, excluded_tags: &BTreeSet<String>) -> Result<FederatedGraph, Diagnostics> {
    let mut contract = graph.clone();
    let mut diagnostics = Diagnostics::default();

    let is_excluded = |graph: &FederatedGraph, directives: &[Directive]| {
        directives.iter().any(|directive| match directive {
            Directive::Tag(tag) => excluded_tags.contains(graph.str(*tag)),
            _ => false,
        })
    };

    for definition in &mut contract.type_definitions {
        if is_excluded(graph, &definition.directives) && !FederatedGraph::is_inaccessible(&definition.directives) {
            definition.directives.push(Directive::Inaccessible);
        }

        for enum_value in &mut definition.enum_values {
            if is_excluded(graph, &enum_value.directives) && !FederatedGraph::is_inaccessible(&enum_value.directives) {
                enum_value.directives.push(Directive::Inaccessible);
            }
        }
    }

    for field in &mut contract.fields {
        if is_excluded(graph, &field.directives) && !FederatedGraph::is_inaccessible(&field.directives) {
            field.directives.push(Directive::Inaccessible);
        }

        for argument in &mut field.arguments {
            if is_excluded(graph, &argument.directives) && !FederatedGraph::is_inaccessible(&argument.directives) {
                argument.directives.push(Directive::Inaccessible);
            }
        }
    }

    validate_contract(&contract, &mut diagnostics);

    if diagnostics.any_fatal() {
        Err(diagnostics)
    } else {
        Ok(contract)
    }
}

/// The contract must keep a usable query root: excluding the whole query
/// type, or every one of its fields, leaves nothing for clients to query.
fn validate_contract(contract: &FederatedGraph, diagnostics: &mut Diagnostics) {
    let Some(query_type) = contract.query_type else {
        diagnostics.push_fatal("The contract has no query root type.".to_owned());
        return;
    };

    let query_definition = &contract.type_definitions[query_type.0];

    if FederatedGraph::is_inaccessible(&query_definition.directives) {
        diagnostics.push_fatal("The contract excludes the query root type.".to_owned());
        return;
    }

    let has_accessible_field = contract
        .fields_of(query_type)
        .iter()
        .any(|field| !FederatedGraph::is_inaccessible(&field.directives));

    if !has_accessible_field {
        diagnostics.push_fatal("The contract excludes every field of the query root type.".to_owned());
    }
}
