use super::*;

pub(super) const DEFAULT_QUERY_TYPE_NAME: &str = "Query";
pub(super) const DEFAULT_MUTATION_TYPE_NAME: &str = "Mutation";
pub(super) const DEFAULT_SUBSCRIPTION_TYPE_NAME: &str = "Subscription";

/// Reads `schema` definitions and extensions to determine which object types
/// act as the root operation types of the subgraph.
pub(super) fn ingest_schema_definitions<'a>(
    document: &'a ast::ServiceDocument,
    subgraph_id: SubgraphId,
    subgraphs: &mut Subgraphs,
) -> RootTypeMatcher<'a> {
    let mut matcher = RootTypeMatcher::default();

    for definition in &document.definitions {
        let ast::TypeSystemDefinition::Schema(schema_definition) = definition else {
            continue;
        };
        let schema_definition = &schema_definition.node;

        if let Some(query) = &schema_definition.query {
            if matcher.query.is_some() {
                subgraphs.push_ingestion_diagnostic(
                    subgraph_id,
                    "The query root is mapped more than once in schema definitions.".to_owned(),
                );
            }
            matcher.query = Some(query.node.as_str());
        }

        if let Some(mutation) = &schema_definition.mutation {
            matcher.mutation = Some(mutation.node.as_str());
        }

        if let Some(subscription) = &schema_definition.subscription {
            matcher.subscription = Some(subscription.node.as_str());
        }
    }

    matcher
}

/// Maps object type names to root operations.
///
/// A subgraph can use the default root type names (`Query`, `Mutation`,
/// `Subscription`) implicitly, or map custom names in a `schema` definition.
/// Using a default root name for a non-root type while a different type is
/// explicitly mapped to that operation is an error.
#[derive(Debug, Default)]
pub(super) struct RootTypeMatcher<'a> {
    query: Option<&'a str>,
    mutation: Option<&'a str>,
    subscription: Option<&'a str>,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum RootTypeMatch {
    Query,
    Mutation,
    Subscription,
    NotRootButHasDefaultRootName,
    NotRoot,
}

impl RootTypeMatcher<'_> {
    pub(super) fn match_name(&self, name: &str) -> RootTypeMatch {
        let candidates = [
            (self.query, DEFAULT_QUERY_TYPE_NAME, RootTypeMatch::Query),
            (self.mutation, DEFAULT_MUTATION_TYPE_NAME, RootTypeMatch::Mutation),
            (self.subscription, DEFAULT_SUBSCRIPTION_TYPE_NAME, RootTypeMatch::Subscription),
        ];

        for (mapped, default_name, matched) in candidates {
            match mapped {
                Some(mapped) if mapped == name => return matched,
                // An explicit mapping to another type exists: the default
                // name is now just a regular type name, which is not
                // permitted in a federated context.
                Some(_) if name == default_name => return RootTypeMatch::NotRootButHasDefaultRootName,
                None if name == default_name => return matched,
                _ => (),
            }
        }

        RootTypeMatch::NotRoot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_are_roots() {
        let matcher = RootTypeMatcher::default();

        assert_eq!(matcher.match_name("Query"), RootTypeMatch::Query);
        assert_eq!(matcher.match_name("Mutation"), RootTypeMatch::Mutation);
        assert_eq!(matcher.match_name("Subscription"), RootTypeMatch::Subscription);
        assert_eq!(matcher.match_name("User"), RootTypeMatch::NotRoot);
    }

    #[test]
    fn custom_mapping_displaces_default_name() {
        let matcher = RootTypeMatcher {
            query: Some("MyQuery"),
            mutation: None,
            subscription: None,
        };

        assert_eq!(matcher.match_name("MyQuery"), RootTypeMatch::Query);
        assert_eq!(matcher.match_name("Query"), RootTypeMatch::NotRootButHasDefaultRootName);
        assert_eq!(matcher.match_name("Mutation"), RootTypeMatch::Mutation);
    }
}
