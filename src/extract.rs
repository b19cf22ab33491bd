//! Axum extractor producing a [`ParamMap`] from the request's query string.
//!
//! ```rust,ignore
//! async fn list_posts(
//!     State(state): State<AppState>,
//!     QueryParams(params): QueryParams,
//! ) -> Result<Json<Vec<Post>>, ModifierError> {
//!     let builder = apply(&params, SeaQueryBuilder::for_entity::<post::Entity>(), &state.config)?;
//!     ...
//! }
//! ```
//!
//! Unlike `axum::extract::Query`, extraction never fails: bracket keys, repeated keys
//! and JSON-valued parameters are kept as they are, and validation happens in the
//! modifiers.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::params::ParamMap;

/// Raw query parameters of the request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(pub ParamMap);

impl QueryParams {
    #[must_use]
    pub fn into_inner(self) -> ParamMap {
        self.0
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let params = parts
            .uri
            .query()
            .map(ParamMap::from_query)
            .unwrap_or_default();
        tracing::trace!(params = params.len(), "Extracted query parameters");
        Ok(Self(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use axum::http::Request;

    async fn extract(uri: &str) -> ParamMap {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        let QueryParams(params) = QueryParams::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        params
    }

    #[tokio::test]
    async fn test_extracts_bracket_parameters() {
        let params = extract("/posts?id%5B%5D=1&id%5B%5D=2&views%5Boperator%5D=%3E").await;
        assert_eq!(
            params.get("id"),
            Some(&ParamValue::Sequence(vec!["1".into(), "2".into()]))
        );
        assert!(params.get("views").and_then(ParamValue::as_map).is_some());
    }

    #[tokio::test]
    async fn test_missing_query_is_empty() {
        assert!(extract("/posts").await.is_empty());
    }
}
