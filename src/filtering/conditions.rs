use indexmap::IndexMap;
use serde_json::Value;

use super::{
    QueryModifier,
    expression::{FilterExpression, FilterOperation},
};
use crate::{
    builder::QueryBuilder,
    config::{Configuration, FilterType},
    errors::ModifierError,
    params::{ParamMap, ParamValue},
};

/// Applies a filter for every whitelisted field present in the request.
///
/// Fields are visited in whitelist order, so the request's key order never
/// changes the generated clause sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterModifier;

impl QueryModifier for FilterModifier {
    fn modify<B: QueryBuilder>(
        &self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        if config.filterable_fields().is_empty() {
            return Ok(builder);
        }

        let mut filters = FilterApplier::new(config.filter_type());
        config
            .filterable_fields()
            .keys()
            .filter_map(|field| params.get(field).map(|value| (field, value)))
            .try_fold(builder, |builder, (field, value)| {
                filters.apply(builder, field, value)
            })
    }
}

/// Map keys that carry a position rather than a name (`0`, `1`, ...)
fn is_positional(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn has_expression_keys(map: &IndexMap<String, ParamValue>) -> bool {
    map.contains_key("value") || map.contains_key("operator")
}

/// Normalize one filter parameter into an expression.
///
/// # Errors
///
/// `MalformedFilter` when a map mixes positional entries with `value`/`operator`.
pub fn parse_filter(field: &str, value: &ParamValue) -> Result<FilterExpression, ModifierError> {
    match value {
        ParamValue::Map(map) if has_expression_keys(map) => {
            if map.keys().any(|key| is_positional(key)) {
                return Err(ModifierError::malformed_filter(field));
            }
            Ok(FilterExpression::from_map(map))
        }
        ParamValue::Map(map) => Ok(FilterExpression::include(
            map.values().map(ParamValue::to_json).collect(),
        )),
        ParamValue::Sequence(items) => Ok(FilterExpression::include(
            items.iter().cloned().map(Value::String).collect(),
        )),
        ParamValue::Scalar(raw) => Ok(FilterExpression::from_scalar(raw)),
        ParamValue::Null => Ok(FilterExpression::default()),
    }
}

/// Set operations take a list; a single value is a list of one
fn as_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        single => vec![single],
    }
}

/// Tracks the AND/OR state of one filter pass.
///
/// The first comparison always joins with AND; the rest follow the filter type.
/// Set membership clauses always join with AND and leave that state alone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FilterApplier {
    filter_type: FilterType,
    first: bool,
}

impl FilterApplier {
    pub(crate) fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            first: true,
        }
    }

    pub(crate) fn apply<B: QueryBuilder>(
        &mut self,
        builder: B,
        field: &str,
        value: &ParamValue,
    ) -> Result<B, ModifierError> {
        if value.is_empty() {
            return Ok(builder);
        }

        let expression = parse_filter(field, value)?;
        let Some(value) = expression.value.clone() else {
            tracing::trace!(field, "Filter without a value skipped");
            return Ok(builder);
        };
        let operation = expression.operation()?;

        tracing::trace!(field, operator = %expression.operator, "Applying filter");

        Ok(match operation {
            FilterOperation::Include => builder.filter_in(field, &as_list(value)),
            FilterOperation::Exclude => builder.filter_not_in(field, &as_list(value)),
            FilterOperation::Compare(operator) => {
                let use_or = !self.first && self.filter_type == FilterType::Or;
                self.first = false;
                if use_or {
                    builder.or_filter(field, operator, &value)
                } else {
                    builder.filter(field, operator, &value)
                }
            }
        })
    }
}
