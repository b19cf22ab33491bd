//! # Query Modifiers
//!
//! Each modifier reads one concern out of the raw request parameters and applies it
//! to the builder. They are independent of each other; the order they run in is the
//! order in [`Configuration::modifiers`](crate::Configuration::modifiers).
//!
//! | Modifier           | Parameter (default) | Builder calls                    |
//! |--------------------|---------------------|----------------------------------|
//! | [`FieldSelection`] | `fields`            | `select`                         |
//! | [`Filter`]         | any whitelisted key | `filter`, `or_filter`, `filter_in`, `filter_not_in` |
//! | [`Sort`]           | `sort`              | `order_by`                       |
//! | [`Paging`]         | `limit`, `page`     | `limit`, `offset`                |
//! | [`Search`]         | `q`                 | `search`                         |
//! | [`Has`]            | `has`               | `has`, `where_has`               |
//!
//! [`FieldSelection`]: Modifier::FieldSelection
//! [`Filter`]: Modifier::Filter
//! [`Sort`]: Modifier::Sort
//! [`Paging`]: Modifier::Paging
//! [`Search`]: Modifier::Search
//! [`Has`]: Modifier::Has
//!
//! ## Query Parameter Examples
//!
//! ```text
//! GET /posts?status=published                      status = 'published'
//! GET /posts?views={"operator":">","value":100}    views > 100
//! GET /posts?views[operator]=>&views[value]=100    views > 100
//! GET /posts?id[]=1&id[]=2                         id IN (1, 2)
//! GET /posts?id={"operator":"exclude","value":[3]} id NOT IN (3)
//! GET /posts?sort=-created_at,title                ORDER BY created_at DESC, title ASC
//! GET /posts?limit=10&page=3                       LIMIT 10 OFFSET 20
//! GET /posts?fields=id,title                       SELECT id, title
//! GET /posts?q=rust                                free-text search
//! GET /posts?has=comments                          at least one comment
//! GET /posts?has={"comments":{"count":{"operator":">","value":5}}}
//! ```

pub mod conditions;
pub mod expression;
pub mod fields;
pub mod has;
pub mod pagination;
pub mod search;
pub mod sort;

pub use conditions::FilterModifier;
pub use expression::{FilterCountExpression, FilterExpression, FilterOperation, Operator};
pub use fields::FieldSelectionModifier;
pub use has::{HasModifier, HasQuery};
pub use pagination::PagingModifier;
pub use search::SearchModifier;
pub use sort::SortModifier;

use serde::{Deserialize, Serialize};

use crate::{
    builder::QueryBuilder, config::Configuration, errors::ModifierError, params::ParamMap,
};

/// One stage of the pipeline.
pub trait QueryModifier {
    /// Inspect `params` and return the builder with this modifier's clauses added.
    ///
    /// # Errors
    ///
    /// Any [`ModifierError`] aborts the modifier; the builder is dropped with it.
    fn modify<B: QueryBuilder>(
        &self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError>;
}

/// Identifies a modifier in [`Configuration::modifiers`](crate::Configuration::modifiers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    FieldSelection,
    Filter,
    Sort,
    Paging,
    Search,
    Has,
}

impl Modifier {
    /// Modifiers enabled by default, in order. `Has` is opt-in.
    pub const DEFAULTS: [Self; 5] = [
        Self::FieldSelection,
        Self::Filter,
        Self::Sort,
        Self::Paging,
        Self::Search,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FieldSelection => "field_selection",
            Self::Filter => "filter",
            Self::Sort => "sort",
            Self::Paging => "paging",
            Self::Search => "search",
            Self::Has => "has",
        }
    }

    /// Run the modifier this variant identifies
    ///
    /// # Errors
    ///
    /// Whatever the modifier reports.
    pub fn modify<B: QueryBuilder>(
        self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        match self {
            Self::FieldSelection => FieldSelectionModifier.modify(params, builder, config),
            Self::Filter => FilterModifier.modify(params, builder, config),
            Self::Sort => SortModifier.modify(params, builder, config),
            Self::Paging => PagingModifier.modify(params, builder, config),
            Self::Search => SearchModifier.modify(params, builder, config),
            Self::Has => HasModifier.modify(params, builder, config),
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones
pub(crate) fn list_to_vec(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
