use super::QueryModifier;
use crate::{
    builder::QueryBuilder,
    config::Configuration,
    errors::ModifierError,
    params::{ParamMap, ParamValue},
};

/// Applies `limit` and the offset derived from `page`.
///
/// ```text
/// ?limit=10&page=3   ->  LIMIT 10 OFFSET 20
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PagingModifier;

fn scalar<'a>(parameter: &str, value: &'a ParamValue) -> Result<&'a str, ModifierError> {
    match value {
        ParamValue::Scalar(raw) => Ok(raw.trim()),
        ParamValue::Null => Ok(""),
        other => Err(ModifierError::invalid_parameter(
            parameter,
            other.to_json().to_string(),
        )),
    }
}

/// Parse a positive page size
///
/// # Errors
///
/// `NoData` for an empty value, `InvalidParameter` for anything that is not a
/// positive integer.
pub fn parse_limit(parameter: &str, value: &ParamValue) -> Result<u64, ModifierError> {
    let raw = scalar(parameter, value)?;
    if raw.is_empty() {
        return Err(ModifierError::no_data(parameter));
    }
    match raw.parse::<u64>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(ModifierError::invalid_parameter(parameter, raw)),
    }
}

/// Parse a 1-based page number
///
/// # Errors
///
/// `InvalidParameter` for zero, negative or non-numeric pages.
pub fn parse_page(parameter: &str, value: &ParamValue) -> Result<u64, ModifierError> {
    let raw = scalar(parameter, value)?;
    match raw.parse::<u64>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(ModifierError::invalid_parameter(parameter, raw)),
    }
}

/// Offset of the first row on `page`
#[must_use]
pub fn calculate_offset(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit)
}

impl QueryModifier for PagingModifier {
    fn modify<B: QueryBuilder>(
        &self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        let requested = params
            .get(config.limit())
            .map(|value| parse_limit(config.limit(), value))
            .transpose()?;
        let page = params
            .get(config.page())
            .map(|value| parse_page(config.page(), value))
            .transpose()?
            .unwrap_or(1);

        let Some(limit) = requested.or(config.default_limit()) else {
            if page > 1 {
                tracing::debug!(page, "Page requested without a limit, ignoring");
            }
            return Ok(builder);
        };
        let limit = match config.max_limit() {
            Some(max) if limit > max => {
                tracing::debug!(requested = limit, max, "Clamping limit");
                max
            }
            _ => limit,
        };

        let offset = calculate_offset(page, limit);
        tracing::trace!(limit, offset, "Applying paging");
        Ok(builder.limit(limit).offset(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuilderCall, RecordingBuilder};

    fn run(query: &str, config: &Configuration) -> Result<Vec<BuilderCall>, ModifierError> {
        PagingModifier
            .modify(&ParamMap::from_query(query), RecordingBuilder::new("Post"), config)
            .map(RecordingBuilder::into_calls)
    }

    #[test]
    fn test_page_and_limit() {
        let calls = run("page=3&limit=10", &Configuration::default()).unwrap();
        assert_eq!(calls, vec![BuilderCall::Limit(10), BuilderCall::Offset(20)]);
    }

    #[test]
    fn test_first_page_has_zero_offset() {
        let calls = run("limit=25", &Configuration::default()).unwrap();
        assert_eq!(calls, vec![BuilderCall::Limit(25), BuilderCall::Offset(0)]);
    }

    #[test]
    fn test_invalid_pages() {
        for page in ["0", "-1", "abc", "1.5"] {
            let err = run(&format!("page={page}&limit=10"), &Configuration::default()).unwrap_err();
            assert_eq!(err, ModifierError::invalid_parameter("page", page));
        }
    }

    #[test]
    fn test_invalid_limits() {
        for limit in ["0", "-5", "ten"] {
            let err = run(&format!("limit={limit}"), &Configuration::default()).unwrap_err();
            assert_eq!(err, ModifierError::invalid_parameter("limit", limit));
        }
        assert_eq!(
            run("limit=", &Configuration::default()).unwrap_err(),
            ModifierError::no_data("limit")
        );
    }

    #[test]
    fn test_default_limit() {
        let mut config = Configuration::default();
        config.set_default_limit(Some(20));
        let calls = run("page=2", &config).unwrap();
        assert_eq!(calls, vec![BuilderCall::Limit(20), BuilderCall::Offset(20)]);
    }

    #[test]
    fn test_max_limit_clamps() {
        let mut config = Configuration::default();
        config.set_max_limit(Some(100));
        let calls = run("limit=5000&page=2", &config).unwrap();
        assert_eq!(calls, vec![BuilderCall::Limit(100), BuilderCall::Offset(100)]);
    }

    #[test]
    fn test_page_without_limit_is_ignored() {
        assert!(run("page=4", &Configuration::default()).unwrap().is_empty());
    }

    #[test]
    fn test_offset_saturates() {
        assert_eq!(calculate_offset(u64::MAX, 10), u64::MAX);
        assert_eq!(calculate_offset(1, 10), 0);
    }
}
