//! # Query Builder Capability
//!
//! The modifiers never build SQL themselves. They drive a [`QueryBuilder`], which
//! exposes the small set of clause-adding operations the pipeline needs. The
//! builder is passed by value: every operation consumes it and returns the updated
//! builder, so a pipeline run owns it exclusively.
//!
//! Two implementations ship with the crate:
//!
//! - [`SeaQueryBuilder`]: renders a sea-query `SelectStatement` for `SQLite`,
//!   `PostgreSQL` and `MySQL`
//! - [`RecordingBuilder`]: records every call, for tests and dry runs
//!
//! Values are passed as `serde_json::Value` so that typed JSON filters
//! (`{"value": 5}`) keep their type until the backend binds them.

pub mod recording;
pub mod sea;

pub use recording::{BuilderCall, RecordingBuilder};
pub use sea::SeaQueryBuilder;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{config::SearchMode, errors::ModifierError, filtering::expression::Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl From<SortDirection> for sea_orm::Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Self::Asc,
            SortDirection::Desc => Self::Desc,
        }
    }
}

/// A relation of the builder's model.
///
/// Related rows match when `related.foreign_key = parent.local_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    /// Table of the related model
    pub table: String,
    /// Join column on the related table
    pub foreign_key: String,
    /// Join column on the parent table
    pub local_key: String,
}

impl Relation {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
            local_key: local_key.into(),
        }
    }

    /// `parent.id = related.<foreign_key>`
    pub fn has_many(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(name, table, foreign_key, "id")
    }

    /// `parent.<local_key> = related.id`
    pub fn belongs_to(
        name: impl Into<String>,
        table: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self::new(name, table, "id", local_key)
    }
}

/// Clause-adding operations used by the modifier pipeline.
pub trait QueryBuilder: Sized {
    /// Name of the underlying model, used in diagnostics
    fn model_name(&self) -> &str;

    /// Comparison clause joined with AND
    #[must_use]
    fn filter(self, field: &str, operator: Operator, value: &Value) -> Self;

    /// Comparison clause joined with OR
    #[must_use]
    fn or_filter(self, field: &str, operator: Operator, value: &Value) -> Self;

    #[must_use]
    fn filter_in(self, field: &str, values: &[Value]) -> Self;

    #[must_use]
    fn filter_not_in(self, field: &str, values: &[Value]) -> Self;

    #[must_use]
    fn order_by(self, field: &str, direction: SortDirection) -> Self;

    #[must_use]
    fn limit(self, limit: u64) -> Self;

    #[must_use]
    fn offset(self, offset: u64) -> Self;

    /// Restrict the selected columns
    #[must_use]
    fn select(self, fields: &[String]) -> Self;

    /// Look up a relation of the model by name
    fn relation(&self, name: &str) -> Option<&Relation>;

    /// Require the number of related rows to satisfy `operator count`
    #[must_use]
    fn has(self, relation: &str, operator: Operator, count: u64) -> Self;

    /// Like [`QueryBuilder::has`], counting only related rows that pass the
    /// constraints `constrain` adds to a builder over the related table.
    ///
    /// # Errors
    ///
    /// Propagates errors from `constrain`, and reports `InvalidRelation` if the
    /// relation does not exist.
    fn where_has<F>(
        self,
        relation: &str,
        operator: Operator,
        count: u64,
        constrain: F,
    ) -> Result<Self, ModifierError>
    where
        F: FnOnce(Self) -> Result<Self, ModifierError>;

    /// Whether [`QueryBuilder::search`] is available
    fn supports_search(&self) -> bool {
        false
    }

    /// Free-text search. An empty `scope` lets the builder pick the columns.
    #[must_use]
    fn search(self, term: &str, mode: SearchMode, scope: &[String]) -> Self;
}
