use super::*;
use crate::{
    router_config::SubscriptionFilterCondition,
    subgraphs::{SubgraphId, Value},
};

/// The hard ceiling on condition nesting. Exceeding it produces a single
/// depth-exceeded diagnostic instead of unbounded recursion.
pub(crate) const MAX_SUBSCRIPTION_FILTER_DEPTH: usize = 5;

const CONDITION_KEYS: [&str; 4] = ["AND", "OR", "NOT", "IN"];

/// Validate and lower the `condition` argument of
/// `@openfed__subscriptionFilter` into a structured condition tree. All
/// problems with one directive application are aggregated into a single
/// path-qualified error.
pub(super) fn validate_subscription_filter<'a>(
    ctx: &mut Context<'a>,
    field: FieldWalker<'a>,
    condition: &Value,
) -> Option<SubscriptionFilterCondition> {
    let field_coords = format!(
        "{}.{}",
        field.parent_definition().name().as_str(),
        field.name().as_str()
    );
    let subgraph_id = field.parent_definition().subgraph_id();

    let host = field
        .r#type()
        .definition(subgraph_id)
        .filter(|definition| definition.kind() == DefinitionKind::Object);

    let Some(host) = host else {
        ctx.diagnostics.push_fatal(format!(
            "Invalid @openfed__subscriptionFilter on `{field_coords}`: the field must return an object type defined in the subgraph.",
        ));
        return None;
    };

    let mut validator = Validator {
        subgraphs: ctx.subgraphs,
        subgraph_id,
        errors: Vec::new(),
        depth_exceeded: false,
    };

    let lowered = validator.validate_condition(condition, host, 0, "condition");

    if validator.errors.is_empty() {
        lowered
    } else {
        ctx.diagnostics.push_fatal(format!(
            "Invalid @openfed__subscriptionFilter on `{field_coords}`: {}.",
            validator.errors.join("; "),
        ));
        None
    }
}

struct Validator<'a> {
    subgraphs: &'a Subgraphs,
    subgraph_id: SubgraphId,
    errors: Vec<String>,
    depth_exceeded: bool,
}

impl<'a> Validator<'a> {
    fn validate_condition(
        &mut self,
        condition: &Value,
        host: DefinitionWalker<'a>,
        depth: usize,
        path: &str,
    ) -> Option<SubscriptionFilterCondition> {
        if depth >= MAX_SUBSCRIPTION_FILTER_DEPTH || self.depth_exceeded {
            if !self.depth_exceeded {
                self.errors.push(format!(
                    "`{path}` exceeds the maximum condition depth of {MAX_SUBSCRIPTION_FILTER_DEPTH}"
                ));
                self.depth_exceeded = true;
            }
            return None;
        }

        let Value::Object(object_fields) = condition else {
            self.errors.push(format!("`{path}` must be an object"));
            return None;
        };

        if object_fields.len() != 1 {
            self.errors.push(format!(
                "`{path}` must contain exactly one of {}, found {} fields",
                CONDITION_KEYS.join(", "),
                object_fields.len(),
            ));
            return None;
        }

        let (key, value) = &object_fields[0];
        let key_str = self.subgraphs.strings.resolve(*key);
        let nested_path = format!("{path}.{key_str}");

        match key_str {
            "AND" | "OR" => {
                let Value::List(items) = value else {
                    self.errors.push(format!("`{nested_path}` must be a list of conditions"));
                    return None;
                };

                if items.is_empty() || items.len() > 5 {
                    self.errors.push(format!(
                        "`{nested_path}` must contain between 1 and 5 conditions, found {}",
                        items.len(),
                    ));
                    return None;
                }

                let mut conditions = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{nested_path}[{idx}]");
                    conditions.push(self.validate_condition(item, host, depth + 1, &item_path)?);
                }

                Some(if key_str == "AND" {
                    SubscriptionFilterCondition::And(conditions)
                } else {
                    SubscriptionFilterCondition::Or(conditions)
                })
            }
            "NOT" => self
                .validate_condition(value, host, depth + 1, &nested_path)
                .map(|condition| SubscriptionFilterCondition::Not(Box::new(condition))),
            "IN" => self.validate_in_condition(value, host, depth, &nested_path),
            _ => {
                self.errors.push(format!(
                    "`{path}` contains the unrecognized key `{key_str}`, expected one of {}",
                    CONDITION_KEYS.join(", "),
                ));
                None
            }
        }
    }

    fn validate_in_condition(
        &mut self,
        condition: &Value,
        host: DefinitionWalker<'a>,
        depth: usize,
        path: &str,
    ) -> Option<SubscriptionFilterCondition> {
        if depth >= MAX_SUBSCRIPTION_FILTER_DEPTH || self.depth_exceeded {
            if !self.depth_exceeded {
                self.errors.push(format!(
                    "`{path}` exceeds the maximum condition depth of {MAX_SUBSCRIPTION_FILTER_DEPTH}"
                ));
                self.depth_exceeded = true;
            }
            return None;
        }

        let Value::Object(object_fields) = condition else {
            self.errors.push(format!("`{path}` must be an object"));
            return None;
        };

        let mut field_path = None;
        let mut values = None;
        let mut valid = true;

        for (key, value) in object_fields {
            match self.subgraphs.strings.resolve(*key) {
                "fieldPath" => match value {
                    Value::String(raw_path) => {
                        let raw_path = self.subgraphs.strings.resolve(*raw_path).to_owned();
                        match self.validate_field_path(&raw_path, host, path) {
                            Some(segments) => field_path = Some(segments),
                            None => valid = false,
                        }
                    }
                    _ => {
                        self.errors.push(format!("`{path}.fieldPath` must be a string"));
                        valid = false;
                    }
                },
                "values" => match self.validate_values(value, path) {
                    Some(validated) => values = Some(validated),
                    None => valid = false,
                },
                other => {
                    self.errors
                        .push(format!("`{path}` contains the unrecognized field `{other}`"));
                    valid = false;
                }
            }
        }

        if field_path.is_none() && valid {
            self.errors.push(format!("`{path}.fieldPath` is required"));
            valid = false;
        }

        if values.is_none() && valid {
            self.errors.push(format!("`{path}.values` is required"));
            valid = false;
        }

        if !valid {
            return None;
        }

        Some(SubscriptionFilterCondition::In {
            field_path: field_path.unwrap_or_default(),
            values: values.unwrap_or_default(),
        })
    }

    /// Walk the dotted field path starting at the host object type, in the
    /// subgraph the directive was declared in.
    fn validate_field_path(&mut self, raw_path: &str, host: DefinitionWalker<'a>, path: &str) -> Option<Vec<String>> {
        let segments: Vec<&str> = raw_path.split('.').collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            self.errors
                .push(format!("`{path}.fieldPath` (`{raw_path}`) contains an empty segment"));
            return None;
        }

        let mut current = host;

        for (idx, segment) in segments.iter().enumerate() {
            let field = self
                .subgraphs
                .strings
                .lookup(segment)
                .and_then(|name| current.find_field(name));

            let Some(field) = field else {
                self.errors.push(format!(
                    "`{path}.fieldPath` (`{raw_path}`): the field `{segment}` does not exist on `{}` in the subgraph `{}`",
                    current.name().as_str(),
                    current.subgraph().name().as_str(),
                ));
                return None;
            };

            if field.directives().inaccessible() {
                self.errors.push(format!(
                    "`{path}.fieldPath` (`{raw_path}`): the field `{}.{segment}` is @inaccessible",
                    current.name().as_str(),
                ));
                return None;
            }

            let named_type = field.r#type().record().definition_name;
            let definition = self.subgraphs.definition_by_name_id(named_type, self.subgraph_id);
            let is_last = idx + 1 == segments.len();

            if is_last {
                let is_leaf = match definition {
                    None => crate::subgraphs::BUILTIN_SCALARS.contains(&self.subgraphs.strings.resolve(named_type)),
                    Some(definition) => matches!(
                        self.subgraphs.walk(definition).kind(),
                        DefinitionKind::Scalar | DefinitionKind::Enum
                    ),
                };

                if !is_leaf {
                    self.errors.push(format!(
                        "`{path}.fieldPath` (`{raw_path}`): the path must end in a scalar or enum, but `{segment}` is of type `{}`",
                        self.subgraphs.strings.resolve(named_type),
                    ));
                    return None;
                }
            } else {
                match definition.map(|definition| self.subgraphs.walk(definition)) {
                    Some(definition) if definition.kind() == DefinitionKind::Object => current = definition,
                    _ => {
                        self.errors.push(format!(
                            "`{path}.fieldPath` (`{raw_path}`): `{segment}` must be an object type to be traversed",
                        ));
                        return None;
                    }
                }
            }
        }

        Some(segments.into_iter().map(str::to_owned).collect())
    }

    /// Values are coerced to a deduplicated list of scalar literals. Nested
    /// lists and objects are invalid.
    fn validate_values(&mut self, value: &Value, path: &str) -> Option<Vec<serde_json::Value>> {
        let items = match value {
            Value::List(items) => items.as_slice(),
            Value::Object(_) | Value::Null => {
                self.errors
                    .push(format!("`{path}.values` must be a list of scalar values"));
                return None;
            }
            scalar => std::slice::from_ref(scalar),
        };

        let mut invalid_indices = Vec::new();
        let mut values: Vec<serde_json::Value> = Vec::new();

        for (idx, item) in items.iter().enumerate() {
            match self.scalar_to_json(item) {
                Some(json) => {
                    if !values.contains(&json) {
                        values.push(json);
                    }
                }
                None => invalid_indices.push(idx.to_string()),
            }
        }

        if !invalid_indices.is_empty() {
            self.errors.push(format!(
                "`{path}.values` contains invalid entries at indices [{}]",
                invalid_indices.join(", "),
            ));
            return None;
        }

        if values.is_empty() {
            self.errors.push(format!("`{path}.values` must not be empty"));
            return None;
        }

        Some(values)
    }

    fn scalar_to_json(&self, value: &Value) -> Option<serde_json::Value> {
        match value {
            Value::Null => Some(serde_json::Value::Null),
            Value::String(id) | Value::Enum(id) => {
                Some(serde_json::Value::String(self.subgraphs.strings.resolve(*id).to_owned()))
            }
            Value::Int(int) => Some(serde_json::Value::Number((*int).into())),
            Value::Float(float) => serde_json::Number::from_f64(*float).map(serde_json::Value::Number),
            Value::Boolean(boolean) => Some(serde_json::Value::Bool(*boolean)),
            Value::Object(_) | Value::List(_) => None,
        }
    }
}
