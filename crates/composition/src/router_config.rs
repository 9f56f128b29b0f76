use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root/child classification and the resolved key, provides and requires
/// field sets of one composed type. This is the hand-off contract to the
/// query routing layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationData {
    pub type_name: String,
    /// The names of the fields the type carries.
    pub field_names: Vec<String>,
    pub is_root_node: bool,
    pub keys: Vec<RequiredFieldsConfiguration>,
    pub provides: Vec<RequiredFieldsConfiguration>,
    pub requires: Vec<RequiredFieldsConfiguration>,
    /// For entity interfaces, the names of the concrete implementing types.
    pub entity_interface_concrete_type_names: Vec<String>,
}

/// A field-set requirement: a `@key`, `@provides` or `@requires` selection.
///
/// The selection set is rendered canonically: sibling fields sorted
/// lexicographically, single spaces, `{ ... }` for nested selections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredFieldsConfiguration {
    /// The field carrying the directive. Empty for `@key`.
    pub field_name: String,
    pub selection_set: String,
    /// For keys declared with `resolvable: false`.
    pub disable_entity_resolver: bool,
}

/// Per-field routing metadata. Only fields with argument, authorization or
/// subscription filter requirements are listed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfiguration {
    pub type_name: String,
    pub field_name: String,
    pub argument_names: Vec<String>,
    pub requires_authentication: bool,
    /// OR of ANDed scopes.
    pub required_scopes: Vec<Vec<String>>,
    pub subscription_filter_condition: Option<SubscriptionFilterCondition>,
}

/// One subgraph's view of the composed schema, for query plan generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgraphConfiguration {
    pub name: String,
    pub url: String,
    pub configuration_data_by_type_name: BTreeMap<String, ConfigurationData>,
}

/// The validated and lowered condition tree of an
/// `@openfed__subscriptionFilter` directive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionFilterCondition {
    And(Vec<SubscriptionFilterCondition>),
    Or(Vec<SubscriptionFilterCondition>),
    Not(Box<SubscriptionFilterCondition>),
    In {
        field_path: Vec<String>,
        values: Vec<serde_json::Value>,
    },
}
