use super::{QueryModifier, list_to_vec};
use crate::{
    builder::QueryBuilder,
    config::Configuration,
    errors::ModifierError,
    params::{ParamMap, ParamValue},
};

/// Restricts the selected columns to `?fields=a,b,c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSelectionModifier;

impl QueryModifier for FieldSelectionModifier {
    fn modify<B: QueryBuilder>(
        &self,
        params: &ParamMap,
        builder: B,
        config: &Configuration,
    ) -> Result<B, ModifierError> {
        let Some(value) = params.get(config.fields()) else {
            return Ok(builder);
        };

        let fields = match value {
            ParamValue::Null => Vec::new(),
            ParamValue::Scalar(raw) => list_to_vec(raw),
            ParamValue::Sequence(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
            ParamValue::Map(_) => {
                return Err(ModifierError::invalid_parameter(
                    config.fields(),
                    value.to_json().to_string(),
                ));
            }
        };
        if fields.is_empty() {
            return Err(ModifierError::no_data(config.fields()));
        }

        tracing::trace!(?fields, "Selecting fields");
        Ok(builder.select(&fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuilderCall, RecordingBuilder};

    fn run(params: &ParamMap) -> Result<Vec<BuilderCall>, ModifierError> {
        FieldSelectionModifier
            .modify(params, RecordingBuilder::new("Post"), &Configuration::default())
            .map(RecordingBuilder::into_calls)
    }

    #[test]
    fn test_select_in_given_order() {
        let calls = run(&ParamMap::from_query("fields=title,+id")).unwrap();
        assert_eq!(
            calls,
            vec![BuilderCall::Select(vec!["title".into(), "id".into()])]
        );
    }

    #[test]
    fn test_sequence_of_fields() {
        let calls = run(&ParamMap::from_query("fields[]=id&fields[]=body")).unwrap();
        assert_eq!(
            calls,
            vec![BuilderCall::Select(vec!["id".into(), "body".into()])]
        );
    }

    #[test]
    fn test_absent_is_noop() {
        assert!(run(&ParamMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_fields_is_no_data() {
        assert_eq!(
            run(&ParamMap::from_query("fields=")).unwrap_err(),
            ModifierError::no_data("fields")
        );
        assert_eq!(
            run(&ParamMap::from_query("fields=,,")).unwrap_err(),
            ModifierError::no_data("fields")
        );
    }

    #[test]
    fn test_map_is_rejected() {
        let err = run(&ParamMap::from_query("fields[a]=id")).unwrap_err();
        assert!(matches!(err, ModifierError::InvalidParameter { .. }));
    }
}
