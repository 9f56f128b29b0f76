use crate::{
    federated_graph::FederatedGraph,
    router_config::{ConfigurationData, FieldConfiguration, SubgraphConfiguration},
    Diagnostics,
};
use std::collections::BTreeMap;

/// The result of a [`compose()`](crate::compose()) invocation.
pub struct CompositionResult {
    pub(crate) artifacts: Option<CompositionArtifacts>,
    pub(crate) diagnostics: Diagnostics,
}

impl CompositionResult {
    /// Simplify the result data to a yes-no answer: did composition succeed?
    ///
    /// `Ok()` contains the complete [CompositionArtifacts].
    /// `Err()` contains all [Diagnostics].
    pub fn into_result(self) -> Result<CompositionArtifacts, Diagnostics> {
        if self.diagnostics.any_fatal() {
            return Err(self.diagnostics);
        }

        match self.artifacts {
            Some(artifacts) => Ok(artifacts),
            None => Err(self.diagnostics),
        }
    }

    /// Composition warnings and errors.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Everything composition produces on success.
pub struct CompositionArtifacts {
    /// The composed, router-facing graph, including federation scaffolding.
    pub federated_graph: FederatedGraph,

    /// Root/child classification and key, provides and requires field sets,
    /// per federated type name. This is the hand-off contract to the query
    /// routing layer.
    pub configuration_by_type_name: BTreeMap<String, ConfigurationData>,

    /// Per-field routing metadata: argument names, authorization requirements
    /// and subscription filter conditions. Only fields that carry any of
    /// those are listed.
    pub field_configurations: Vec<FieldConfiguration>,

    /// One entry per subgraph, for query plan generation.
    pub subgraph_configurations: Vec<SubgraphConfiguration>,
}
