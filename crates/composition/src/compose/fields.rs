use super::*;
use crate::subgraphs::{merge_field_types, FieldArgumentWalker, FieldTypeRecord, MergePolicy};

/// The merged type of a shared output field: the least restrictive of the
/// subgraph types, since the field is only as non-nullable as the weakest
/// guarantee.
pub(super) fn compose_output_field_types<'a>(
    ctx: &mut Context<'a>,
    mut fields: impl Iterator<Item = FieldWalker<'a>>,
) -> Option<FieldTypeRecord> {
    let first = fields.next()?;
    let mut merged = first.r#type().record().clone();

    for field in fields {
        match merge_field_types(&merged, field.r#type().record(), MergePolicy::LeastRestrictive) {
            Ok(next) => merged = next,
            Err(conflict) => {
                let first_type = first.r#type().to_string();
                let second_type = field.r#type().to_string();
                ctx.diagnostics.push_fatal(format!(
                    "The field `{}.{}` has incompatible types in the subgraphs `{}` and `{}`: {}.",
                    first.parent_definition().name().as_str(),
                    first.name().as_str(),
                    first.parent_definition().subgraph().name().as_str(),
                    field.parent_definition().subgraph().name().as_str(),
                    conflict.explain(&first_type, &second_type),
                ));
                return None;
            }
        }
    }

    Some(merged)
}

/// The merged type of a shared argument or input field: the most restrictive
/// of the subgraph types, since every subgraph must be able to accept the
/// value.
pub(super) fn compose_input_field_types<'a>(
    ctx: &mut Context<'a>,
    mut fields: impl Iterator<Item = FieldWalker<'a>>,
) -> Option<FieldTypeRecord> {
    let first = fields.next()?;
    let mut merged = first.r#type().record().clone();

    for field in fields {
        match merge_field_types(&merged, field.r#type().record(), MergePolicy::MostRestrictive) {
            Ok(next) => merged = next,
            Err(conflict) => {
                let first_type = first.r#type().to_string();
                let second_type = field.r#type().to_string();
                ctx.diagnostics.push_fatal(format!(
                    "The input field `{}.{}` has incompatible types in the subgraphs `{}` and `{}`: {}.",
                    first.parent_definition().name().as_str(),
                    first.name().as_str(),
                    first.parent_definition().subgraph().name().as_str(),
                    field.parent_definition().subgraph().name().as_str(),
                    conflict.explain(&first_type, &second_type),
                ));
                return None;
            }
        }
    }

    Some(merged)
}

pub(super) fn compose_argument_types<'a>(
    ctx: &mut Context<'a>,
    arguments: &[&FieldArgumentWalker<'a>],
) -> Option<FieldTypeRecord> {
    let (first, rest) = arguments.split_first()?;
    let mut merged = first.r#type().record().clone();

    for argument in rest {
        match merge_field_types(&merged, argument.r#type().record(), MergePolicy::MostRestrictive) {
            Ok(next) => merged = next,
            Err(conflict) => {
                let first_type = first.r#type().to_string();
                let second_type = argument.r#type().to_string();
                let field = first.field();
                ctx.diagnostics.push_fatal(format!(
                    "The argument `{}.{}({}:)` has incompatible types in the subgraphs `{}` and `{}`: {}.",
                    field.parent_definition().name().as_str(),
                    field.name().as_str(),
                    first.name().as_str(),
                    field.parent_definition().subgraph().name().as_str(),
                    argument.field().parent_definition().subgraph().name().as_str(),
                    conflict.explain(&first_type, &second_type),
                ));
                return None;
            }
        }
    }

    Some(merged)
}
