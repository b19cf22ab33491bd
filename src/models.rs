use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::params::{ParamMap, ParamValue};

/// Query parameters understood by the collection endpoints, under their default names.
///
/// Filters use the column name as the parameter name and are not listed here; they
/// accept a plain value (`?status=open`), a list (`?id[]=1&id[]=2`), a nested map
/// (`?views[operator]=>&views[value]=10`) or a JSON expression:
/// ```json
/// {"operator": ">", "value": 10}
/// ```
/// Supported operators are `=`, `!=`, `<>`, `>`, `>=`, `<`, `<=`, `like`, `not like`,
/// `include` and `exclude`.
///
/// # Sorting
/// Comma-separated columns, `-` for descending: `-created_at,title`
///
/// # Pagination
/// `limit` rows per page, `page` starting at 1.
///
/// # Relations
/// `has=comments`, or a JSON object with a count and filters on the related table:
/// ```json
/// {"comments": {"count": {"operator": ">=", "value": 2}, "approved": "1"}}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CollectionQuery {
    /// Columns to sort by, `-` prefix for descending.
    ///
    /// Example: `-created_at,title`
    #[param(example = "-created_at,title")]
    pub sort: Option<String>,
    /// Columns to return.
    ///
    /// Example: `id,title`
    #[param(example = "id,title")]
    pub fields: Option<String>,
    /// Page size, a positive integer.
    #[param(example = 20)]
    pub limit: Option<u64>,
    /// Page number, starting at 1.
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Free-text search term.
    #[param(example = "rust")]
    pub q: Option<String>,
    /// Relation constraints, as a comma-separated list or a JSON object.
    #[param(example = json!({"comments": {"count": {"operator": ">=", "value": 2}}}))]
    pub has: Option<String>,
}

impl From<&CollectionQuery> for ParamMap {
    fn from(query: &CollectionQuery) -> Self {
        [
            ("sort", query.sort.clone()),
            ("fields", query.fields.clone()),
            ("limit", query.limit.map(|limit| limit.to_string())),
            ("page", query.page.map(|page| page.to_string())),
            ("q", query.q.clone()),
            ("has", query.has.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, ParamValue::Scalar(value))))
        .collect()
    }
}
