mod interface_conformance;

use crate::{
    subgraphs::{SubgraphId, BUILTIN_SCALARS},
    Subgraphs,
};

/// Cross-checks run once a subgraph is fully ingested: every referenced type
/// must be defined, and every type implementing an interface must conform to
/// it structurally.
pub(crate) fn validate_subgraph(subgraphs: &mut Subgraphs) {
    let subgraph_id = subgraphs.last_subgraph_id();

    validate_type_references(subgraphs, subgraph_id);
    interface_conformance::validate_interface_conformance(subgraphs, subgraph_id);
}

fn validate_type_references(subgraphs: &mut Subgraphs, subgraph_id: SubgraphId) {
    let mut errors = Vec::new();

    for reference in subgraphs.iter_type_references(subgraph_id) {
        let name = reference.as_str();

        if BUILTIN_SCALARS.contains(&name) {
            continue;
        }

        if subgraphs.definition_by_name_id(reference.id, subgraph_id).is_none() {
            errors.push(format!("The type `{name}` is referenced but not defined in the subgraph."));
        }
    }

    for error in errors {
        subgraphs.push_ingestion_diagnostic(subgraph_id, error);
    }
}
