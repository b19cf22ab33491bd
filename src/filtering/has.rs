//! Relation existence and relation count filters.
//!
//! ```text
//! ?has=comments                                       at least one comment
//! ?has=comments,tags                                  at least one of each
//! ?has[comments][count]=3                             three or more comments
//! ?has={"comments":{"count":{"operator":"<","value":2},"approved":"1"}}
//!                                                     fewer than two approved comments
//! ```
//!
//! Keys of a constraint other than `count` are filters on the related table. They go
//! through the same parsing as top-level filters, always joined with AND, and must be
//! listed in [`Configuration::relation_fields`].

use indexmap::IndexMap;
use serde_json::Value;

use super::{
    QueryModifier,
    conditions::FilterApplier,
    expression::{FilterCountExpression, Operator},
    list_to_vec,
};
use crate::{
    builder::QueryBuilder,
    config::{Configuration, FilterType},
    errors::ModifierError,
    json::JsonDecoder,
    params::{ParamMap, ParamValue},
};

const COUNT_KEY: &str = "count";

/// One parsed relation constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct HasQuery {
    pub relation: String,
    pub count: FilterCountExpression,
    /// Filters on the related table, in request order
    pub constraints: IndexMap<String, ParamValue>,
}

impl HasQuery {
    /// Plain existence check: at least one related row
    pub fn exists(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            count: FilterCountExpression::default(),
            constraints: IndexMap::new(),
        }
    }

    /// Split `count` out of a constraint map
    ///
    /// # Errors
    ///
    /// Whatever [`FilterCountExpression::from_param`] reports for the count.
    pub fn build(
        relation: impl Into<String>,
        mut constraints: IndexMap<String, ParamValue>,
    ) -> Result<Self, ModifierError> {
        let count = match constraints.shift_remove(COUNT_KEY) {
            Some(raw) => FilterCountExpression::from_param(&raw)?,
            None => FilterCountExpression::default(),
        };
        Ok(Self {
            relation: relation.into(),
            count,
            constraints,
        })
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.count.operator
    }
}

/// Decode a scalar into a JSON object, if it is one
fn decode_object(raw: &str) -> Option<IndexMap<String, ParamValue>> {
    let mut decoder = JsonDecoder::new();
    if !decoder.decode(raw) {
        return None;
    }
    match decoder.into_data() {
        Some(object @ Value::Object(_)) => match ParamValue::from(object) {
            ParamValue::Map(map) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Normalize the constraint given for one relation
fn constraint_map(
    parameter: &str,
    value: &ParamValue,
) -> Result<IndexMap<String, ParamValue>, ModifierError> {
    match value {
        ParamValue::Null => Ok(IndexMap::new()),
        ParamValue::Scalar(raw) => Ok(decode_object(raw).unwrap_or_default()),
        ParamValue::Map(map) => Ok(map.clone()),
        ParamValue::Sequence(_) => Err(ModifierError::invalid_parameter(
            parameter,
            value.to_json().to_string(),
        )),
    }
}

fn plain(names: Vec<String>) -> Vec<(String, IndexMap<String, ParamValue>)> {
    names
        .into_iter()
        .map(|name| (name, IndexMap::new()))
        .collect()
}

/// Normalize the `has` parameter into `(relation, constraint)` pairs, in request order.
///
/// # Errors
///
/// `InvalidParameter` for constraint shapes that cannot be read.
pub fn parse_has(
    parameter: &str,
    value: &ParamValue,
) -> Result<Vec<(String, IndexMap<String, ParamValue>)>, ModifierError> {
    match value {
        ParamValue::Null => Ok(Vec::new()),
        ParamValue::Scalar(raw) => match decode_object(raw) {
            Some(map) => parse_has(parameter, &ParamValue::Map(map)),
            None => Ok(plain(list_to_vec(raw))),
        },
        ParamValue::Sequence(items) => Ok(plain(
            items.iter().flat_map(|item| list_to_vec(item)).collect(),
        )),
        ParamValue::Map(map) => {
            let mut relations = Vec::with_capacity(map.len());
            for (key, constraint) in map {
                match constraint {
                    // `has[]=a,b&has[c][count]=2` leaves `a,b` under a positional key
                    ParamValue::Scalar(names) if key.bytes().all(|b| b.is_ascii_digit()) => {
                        relations.extend(plain(list_to_vec(names)));
                    }
                    _ if key.trim().is_empty() => {}
                    _ => relations.push((key.clone(), constraint_map(parameter, constraint)?)),
                }
            }
            Ok(relations)
        }
    }
}

/// Requires related rows to exist, optionally counted and constrained.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasModifier;

impl HasModifier {
    fn apply_query<B: QueryBuilder>(
        builder: B,
        query: HasQuery,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        let HasQuery {
            relation,
            count,
            constraints,
        } = query;

        if constraints.is_empty() {
            tracing::trace!(%relation, operator = %count.operator, count = count.value, "Applying has");
            return Ok(builder.has(&relation, count.operator, count.value));
        }

        let whitelist = config.relation_fields(&relation);
        if let Some(field) = constraints
            .keys()
            .find(|field| whitelist.is_none_or(|fields| !fields.contains_key(*field)))
        {
            return Err(ModifierError::invalid_field(format!("{relation}.{field}")));
        }

        tracing::trace!(
            %relation,
            operator = %count.operator,
            count = count.value,
            constraints = constraints.len(),
            "Applying constrained has"
        );
        builder.where_has(&relation, count.operator, count.value, |related| {
            let mut filters = FilterApplier::new(FilterType::And);
            constraints
                .iter()
                .try_fold(related, |related, (field, value)| {
                    filters.apply(related, field, value)
                })
        })
    }
}

impl QueryModifier for HasModifier {
    fn modify<B: QueryBuilder>(
        &self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        let Some(value) = params.get(config.has()) else {
            return Ok(builder);
        };
        if value.is_empty() || value.as_scalar().is_some_and(|raw| raw.trim().is_empty()) {
            return Ok(builder);
        }

        parse_has(config.has(), value)?
            .into_iter()
            .try_fold(builder, |builder, (relation, constraints)| {
                if builder.relation(&relation).is_none() {
                    return Err(ModifierError::invalid_relation(relation));
                }
                let query = HasQuery::build(relation, constraints)?;
                Self::apply_query(builder, query, config)
            })
    }
}
