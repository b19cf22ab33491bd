use super::{QueryModifier, list_to_vec};
use crate::{
    builder::{QueryBuilder, SortDirection},
    config::Configuration,
    errors::ModifierError,
    params::{ParamMap, ParamValue},
};

/// Orders the result by a comma-separated list of fields, `-field` for descending.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortModifier;

/// Split a sort token into its field and direction
#[must_use]
pub fn parse_sort_token(token: &str) -> (&str, SortDirection) {
    match token.strip_prefix('-') {
        Some(field) => (field.trim(), SortDirection::Desc),
        None => (token, SortDirection::Asc),
    }
}

fn sort_tokens(parameter: &str, value: &ParamValue) -> Result<Vec<String>, ModifierError> {
    match value {
        ParamValue::Null => Ok(Vec::new()),
        ParamValue::Scalar(raw) => Ok(list_to_vec(raw)),
        ParamValue::Sequence(items) => Ok(items.iter().flat_map(|item| list_to_vec(item)).collect()),
        ParamValue::Map(_) => Err(ModifierError::invalid_parameter(
            parameter,
            value.to_json().to_string(),
        )),
    }
}

impl QueryModifier for SortModifier {
    fn modify<B: QueryBuilder>(
        &self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        let Some(value) = params.get(config.sort()) else {
            return Ok(builder);
        };

        let tokens = sort_tokens(config.sort(), value)?;
        if tokens.is_empty() {
            return Err(ModifierError::no_data(config.sort()));
        }

        // Validate everything before the builder sees any ordering
        let orders = tokens
            .iter()
            .map(|token| {
                let (field, direction) = parse_sort_token(token);
                if config.is_filterable(field) {
                    Ok((field, direction))
                } else {
                    Err(ModifierError::invalid_field(field))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(count = orders.len(), "Applying sort");
        Ok(orders
            .into_iter()
            .fold(builder, |builder, (field, direction)| {
                builder.order_by(field, direction)
            }))
    }
}
