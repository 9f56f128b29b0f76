use federation_composition::{compose, SubscriptionFilterCondition, Subgraphs};

fn compose_single(sdl: &str) -> federation_composition::CompositionResult {
    let mut subgraphs = Subgraphs::default();
    let parsed = async_graphql_parser::parse_schema(sdl).expect("parse error");
    subgraphs.ingest(&parsed, "events", "http://events.example.com/graphql");
    compose(&subgraphs)
}

const SCHEMA_PREFIX: &str = r#"
    type Query { noop: String }
    type Subscription {
        messageReceived: Message @openfed__subscriptionFilter(condition: CONDITION)
    }
    type Message {
        id: ID!
        channel: Channel!
        priority: Int!
    }
    type Channel {
        name: String!
        hidden: String @inaccessible
    }
"#;

fn schema_with_condition(condition: &str) -> String {
    SCHEMA_PREFIX.replace("CONDITION", condition)
}

#[test]
fn valid_in_condition_is_lowered() {
    let result = compose_single(&schema_with_condition(
        r#"{ IN: { fieldPath: "channel.name", values: ["updates", "alerts"] } }"#,
    ));

    let artifacts = result.into_result().expect("composition failed");
    let configuration = artifacts
        .field_configurations
        .iter()
        .find(|configuration| configuration.field_name == "messageReceived")
        .expect("missing field configuration");

    let condition = configuration
        .subscription_filter_condition
        .as_ref()
        .expect("missing condition");

    match condition {
        SubscriptionFilterCondition::In { field_path, values } => {
            assert_eq!(field_path, &["channel", "name"]);
            assert_eq!(values.len(), 2);
        }
        other => panic!("expected an IN condition, got {other:?}"),
    }
}

#[test]
fn and_or_not_nest() {
    let result = compose_single(&schema_with_condition(
        r#"{ AND: [
            { IN: { fieldPath: "priority", values: [1, 2] } },
            { NOT: { IN: { fieldPath: "channel.name", values: ["muted"] } } }
        ] }"#,
    ));

    let artifacts = result.into_result().expect("composition failed");
    let configuration = artifacts
        .field_configurations
        .iter()
        .find(|configuration| configuration.field_name == "messageReceived")
        .unwrap();

    match configuration.subscription_filter_condition.as_ref().unwrap() {
        SubscriptionFilterCondition::And(conditions) => {
            assert_eq!(conditions.len(), 2);
            assert!(matches!(conditions[1], SubscriptionFilterCondition::Not(_)));
        }
        other => panic!("expected an AND condition, got {other:?}"),
    }
}

#[test]
fn duplicate_values_are_deduplicated() {
    let result = compose_single(&schema_with_condition(
        r#"{ IN: { fieldPath: "priority", values: [3, 3, 3] } }"#,
    ));

    let artifacts = result.into_result().expect("composition failed");
    let configuration = artifacts
        .field_configurations
        .iter()
        .find(|configuration| configuration.field_name == "messageReceived")
        .unwrap();

    match configuration.subscription_filter_condition.as_ref().unwrap() {
        SubscriptionFilterCondition::In { values, .. } => assert_eq!(values.len(), 1),
        other => panic!("expected an IN condition, got {other:?}"),
    }
}

#[test]
fn six_levels_of_nesting_fail_with_a_single_depth_diagnostic() {
    // Five NOTs around an IN: six condition levels with a ceiling of five.
    let result = compose_single(&schema_with_condition(
        r#"{ NOT: { NOT: { NOT: { NOT: { NOT: { IN: { fieldPath: "priority", values: [1] } } } } } } }"#,
    ));

    let errors: Vec<String> = match result.into_result() {
        Ok(_) => panic!("expected composition to fail"),
        Err(diagnostics) => diagnostics.iter_errors().map(str::to_owned).collect(),
    };

    let depth_errors: Vec<&String> = errors
        .iter()
        .filter(|error| error.contains("maximum condition depth"))
        .collect();

    assert_eq!(depth_errors.len(), 1, "{errors:?}");
}

#[test]
fn five_levels_of_nesting_pass() {
    compose_single(&schema_with_condition(
        r#"{ NOT: { NOT: { NOT: { NOT: { IN: { fieldPath: "priority", values: [1] } } } } } }"#,
    ))
    .into_result()
    .expect("five levels should compose");
}

#[test]
fn unknown_field_in_path_is_an_error() {
    let result = compose_single(&schema_with_condition(
        r#"{ IN: { fieldPath: "channel.missing", values: ["x"] } }"#,
    ));

    let errors: Vec<String> = result
        .into_result()
        .err()
        .expect("expected composition to fail")
        .iter_errors()
        .map(str::to_owned)
        .collect();

    assert!(
        errors
            .iter()
            .any(|error| error.contains("missing") && error.contains("does not exist")),
        "{errors:?}"
    );
}

#[test]
fn inaccessible_fields_in_path_are_rejected() {
    let result = compose_single(&schema_with_condition(
        r#"{ IN: { fieldPath: "channel.hidden", values: ["x"] } }"#,
    ));

    let errors: Vec<String> = result
        .into_result()
        .err()
        .expect("expected composition to fail")
        .iter_errors()
        .map(str::to_owned)
        .collect();

    assert!(
        errors.iter().any(|error| error.contains("@inaccessible")),
        "{errors:?}"
    );
}

#[test]
fn non_leaf_terminal_field_is_rejected() {
    let result = compose_single(&schema_with_condition(
        r#"{ IN: { fieldPath: "channel", values: ["x"] } }"#,
    ));

    let errors: Vec<String> = result
        .into_result()
        .err()
        .expect("expected composition to fail")
        .iter_errors()
        .map(str::to_owned)
        .collect();

    assert!(
        errors.iter().any(|error| error.contains("must end in a scalar or enum")),
        "{errors:?}"
    );
}

#[test]
fn object_values_are_rejected() {
    let result = compose_single(&schema_with_condition(
        r#"{ IN: { fieldPath: "priority", values: [{ nested: true }] } }"#,
    ));

    let errors: Vec<String> = result
        .into_result()
        .err()
        .expect("expected composition to fail")
        .iter_errors()
        .map(str::to_owned)
        .collect();

    assert!(
        errors.iter().any(|error| error.contains("invalid entries")),
        "{errors:?}"
    );
}

#[test]
fn unrecognized_condition_keys_are_rejected() {
    let result = compose_single(&schema_with_condition(
        r#"{ XOR: [{ IN: { fieldPath: "priority", values: [1] } }] }"#,
    ));

    let errors: Vec<String> = result
        .into_result()
        .err()
        .expect("expected composition to fail")
        .iter_errors()
        .map(str::to_owned)
        .collect();

    assert!(errors.iter().any(|error| error.contains("XOR")), "{errors:?}");
}
