#![doc = include_str!("../README.md")]

mod compose;
mod composition_ir;
mod contracts;
mod diagnostics;
mod emit_federated_graph;
mod federated_graph;
mod graph;
mod ingest_subgraph;
mod result;
mod router_config;
mod subgraphs;
mod validate;

pub use self::{
    contracts::build_contract,
    diagnostics::Diagnostics,
    federated_graph::{render_api_sdl, render_federated_sdl, FederatedGraph, TypeDefinitionId},
    result::{CompositionArtifacts, CompositionResult},
    router_config::{
        ConfigurationData, FieldConfiguration, RequiredFieldsConfiguration, SubgraphConfiguration,
        SubscriptionFilterCondition,
    },
    subgraphs::Subgraphs,
};

use self::{
    compose::{compose_subgraphs, Context},
    emit_federated_graph::emit_federated_graph,
};

/// Compose the subgraphs into a federated graph.
///
/// The composition is all or nothing: either the subgraphs are compatible and
/// the result carries the complete artifact set, or it carries the complete
/// list of diagnostics and no artifacts.
pub fn compose(subgraphs: &Subgraphs) -> CompositionResult {
    let mut diagnostics = Diagnostics::default();

    if subgraphs.is_empty() {
        diagnostics.push_fatal("At least one subgraph is required for composition.".to_owned());
        return CompositionResult {
            artifacts: None,
            diagnostics,
        };
    }

    let mut context = Context::new(subgraphs, &mut diagnostics);

    compose_subgraphs(&mut context);

    if context.diagnostics.any_fatal() {
        return CompositionResult {
            artifacts: None,
            diagnostics,
        };
    }

    let artifacts = emit_federated_graph(context.into_ir(), subgraphs);

    CompositionResult {
        artifacts: Some(artifacts),
        diagnostics,
    }
}

trait VecExt<T> {
    fn push_return_idx(&mut self, elem: T) -> usize;
}

impl<T> VecExt<T> for Vec<T> {
    fn push_return_idx(&mut self, elem: T) -> usize {
        let idx = self.len();
        self.push(elem);
        idx
    }
}
