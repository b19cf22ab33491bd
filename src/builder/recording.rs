use indexmap::IndexMap;
use serde_json::Value;

use super::{QueryBuilder, Relation, SortDirection};
use crate::{config::SearchMode, errors::ModifierError, filtering::expression::Operator};

/// One call made against a [`RecordingBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderCall {
    Where {
        field: String,
        operator: Operator,
        value: Value,
    },
    OrWhere {
        field: String,
        operator: Operator,
        value: Value,
    },
    WhereIn {
        field: String,
        values: Vec<Value>,
    },
    WhereNotIn {
        field: String,
        values: Vec<Value>,
    },
    OrderBy {
        field: String,
        direction: SortDirection,
    },
    Limit(u64),
    Offset(u64),
    Select(Vec<String>),
    Has {
        relation: String,
        operator: Operator,
        count: u64,
    },
    WhereHas {
        relation: String,
        operator: Operator,
        count: u64,
        /// Calls made against the related builder
        constraints: Vec<BuilderCall>,
    },
    Search {
        term: String,
        mode: SearchMode,
        scope: Vec<String>,
    },
}

/// Builder that records calls instead of producing a query.
///
/// The recorded sequence is deterministic for a given parameter map and
/// configuration, which makes it the natural fixture for pipeline tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingBuilder {
    model: String,
    relations: IndexMap<String, Relation>,
    searchable: bool,
    calls: Vec<BuilderCall>,
}

impl RecordingBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// Advertise search support
    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    #[must_use]
    pub fn calls(&self) -> &[BuilderCall] {
        &self.calls
    }

    #[must_use]
    pub fn into_calls(self) -> Vec<BuilderCall> {
        self.calls
    }

    fn record(mut self, call: BuilderCall) -> Self {
        self.calls.push(call);
        self
    }
}

impl QueryBuilder for RecordingBuilder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn filter(self, field: &str, operator: Operator, value: &Value) -> Self {
        self.record(BuilderCall::Where {
            field: field.to_string(),
            operator,
            value: value.clone(),
        })
    }

    fn or_filter(self, field: &str, operator: Operator, value: &Value) -> Self {
        self.record(BuilderCall::OrWhere {
            field: field.to_string(),
            operator,
            value: value.clone(),
        })
    }

    fn filter_in(self, field: &str, values: &[Value]) -> Self {
        self.record(BuilderCall::WhereIn {
            field: field.to_string(),
            values: values.to_vec(),
        })
    }

    fn filter_not_in(self, field: &str, values: &[Value]) -> Self {
        self.record(BuilderCall::WhereNotIn {
            field: field.to_string(),
            values: values.to_vec(),
        })
    }

    fn order_by(self, field: &str, direction: SortDirection) -> Self {
        self.record(BuilderCall::OrderBy {
            field: field.to_string(),
            direction,
        })
    }

    fn limit(self, limit: u64) -> Self {
        self.record(BuilderCall::Limit(limit))
    }

    fn offset(self, offset: u64) -> Self {
        self.record(BuilderCall::Offset(offset))
    }

    fn select(self, fields: &[String]) -> Self {
        self.record(BuilderCall::Select(fields.to_vec()))
    }

    fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    fn has(self, relation: &str, operator: Operator, count: u64) -> Self {
        self.record(BuilderCall::Has {
            relation: relation.to_string(),
            operator,
            count,
        })
    }

    fn where_has<F>(
        self,
        relation: &str,
        operator: Operator,
        count: u64,
        constrain: F,
    ) -> Result<Self, ModifierError>
    where
        F: FnOnce(Self) -> Result<Self, ModifierError>,
    {
        let related = self
            .relation(relation)
            .ok_or_else(|| ModifierError::invalid_relation(relation))?;
        let constraints = constrain(Self::new(related.table.clone()))?.into_calls();

        Ok(self.record(BuilderCall::WhereHas {
            relation: relation.to_string(),
            operator,
            count,
            constraints,
        }))
    }

    fn supports_search(&self) -> bool {
        self.searchable
    }

    fn search(self, term: &str, mode: SearchMode, scope: &[String]) -> Self {
        self.record(BuilderCall::Search {
            term: term.to_string(),
            mode,
            scope: scope.to_vec(),
        })
    }
}
