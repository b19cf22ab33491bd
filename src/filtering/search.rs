use super::QueryModifier;
use crate::{
    builder::QueryBuilder,
    config::{Configuration, SearchMode},
    errors::ModifierError,
    params::ParamMap,
};

// Basic safety limit
pub const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Escape character used in `LIKE ... ESCAPE`. Needs no quoting on any backend.
pub(crate) const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards so client text only matches literally.
/// Escapes `%` and `_` with [`LIKE_ESCAPE`].
pub(crate) fn escape_like_wildcards(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_') {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Trim the term and cap it at [`MAX_SEARCH_QUERY_LENGTH`] characters
fn sanitize_term(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(MAX_SEARCH_QUERY_LENGTH) {
        Some((index, _)) => trimmed[..index].trim_end(),
        None => trimmed,
    }
}

/// Free-text search over the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchModifier;

impl QueryModifier for SearchModifier {
    fn modify<B: QueryBuilder>(
        &self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        let Some(value) = params.get(config.search()) else {
            return Ok(builder);
        };
        let term = match value.as_scalar() {
            Some(raw) => sanitize_term(raw),
            None if value.is_empty() => return Ok(builder),
            None => {
                return Err(ModifierError::invalid_parameter(
                    config.search(),
                    value.to_json().to_string(),
                ));
            }
        };
        if term.is_empty() {
            return Ok(builder);
        }

        if !builder.supports_search() {
            return Err(ModifierError::search_not_supported(builder.model_name()));
        }

        let scope: Vec<String> = match config.search_mode() {
            SearchMode::ColumnLimited => {
                config.filterable_fields().keys().cloned().collect()
            }
            SearchMode::Wildcard => Vec::new(),
        };

        tracing::debug!(
            model = builder.model_name(),
            mode = ?config.search_mode(),
            columns = scope.len(),
            "Applying search"
        );
        Ok(builder.search(term, config.search_mode(), &scope))
    }
}
