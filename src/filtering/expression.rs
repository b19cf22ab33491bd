//! Parsed filter clauses.
//!
//! A [`FilterExpression`] is the normalized `{operator, value}` pair behind one
//! filter parameter; a [`FilterCountExpression`] is the `{operator, value}` count
//! constraint of a relation filter. Operators are parsed into the closed
//! [`Operator`] set before they reach a builder, so client text never ends up in a
//! query as an operator.

use indexmap::IndexMap;
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::{errors::ModifierError, json::JsonDecoder, params::ParamValue};

/// Comparison operators accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality (`=` or `==`)
    Eq,
    /// Not equal (`!=` or `<>`)
    NotEq,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Gte,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Lte,
    /// LIKE pattern matching
    Like,
    /// NOT LIKE pattern matching
    NotLike,
}

impl Operator {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::NotLike => "not like",
        }
    }

    /// Pattern operators cannot be used for relation counts
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Like | Self::NotLike)
    }
}

impl FromStr for Operator {
    type Err = ModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            "like" => Ok(Self::Like),
            "not like" => Ok(Self::NotLike),
            _ => Err(ModifierError::invalid_operator(s)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a filter expression asks the builder to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperation {
    Compare(Operator),
    /// `whereIn`
    Include,
    /// `whereNotIn`
    Exclude,
}

pub const INCLUDE: &str = "include";
pub const EXCLUDE: &str = "exclude";

/// One filter clause before it is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    /// `None` means no filter was requested
    pub value: Option<Value>,
    pub operator: String,
}

impl Default for FilterExpression {
    fn default() -> Self {
        Self {
            value: None,
            operator: Self::DEFAULT_OPERATOR.to_string(),
        }
    }
}

impl FilterExpression {
    pub const DEFAULT_OPERATOR: &'static str = "=";

    pub fn new(value: impl Into<Value>, operator: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            value: (!value.is_null()).then_some(value),
            operator: operator.into(),
        }
    }

    /// Equality against the literal string
    #[must_use]
    pub fn literal(value: &str) -> Self {
        Self::new(value, Self::DEFAULT_OPERATOR)
    }

    /// Set membership over `values`, order preserved
    #[must_use]
    pub fn include(values: Vec<Value>) -> Self {
        Self::new(Value::Array(values), INCLUDE)
    }

    /// Build from a nested parameter map with optional `value` and `operator` keys
    #[must_use]
    pub fn from_map(map: &IndexMap<String, ParamValue>) -> Self {
        let value = map
            .get("value")
            .map(ParamValue::to_json)
            .filter(|v| !v.is_null());
        let operator = match map.get("operator") {
            None | Some(ParamValue::Null) => Self::DEFAULT_OPERATOR.to_string(),
            Some(ParamValue::Scalar(s)) => s.clone(),
            Some(other) => other.to_json().to_string(),
        };
        Self { value, operator }
    }

    /// Build from a decoded JSON structure. Arrays carry no `value` key and
    /// therefore produce an empty expression.
    #[must_use]
    pub fn from_json(decoded: &Value) -> Self {
        let value = decoded.get("value").filter(|v| !v.is_null()).cloned();
        let operator = match decoded.get("operator") {
            None | Some(Value::Null) => Self::DEFAULT_OPERATOR.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Self { value, operator }
    }

    /// Parse a scalar parameter: JSON if it decodes to a structure, otherwise the
    /// literal string compared with `=`.
    #[must_use]
    pub fn from_scalar(raw: &str) -> Self {
        let mut decoder = JsonDecoder::new();
        if decoder.decode(raw) {
            decoder
                .data()
                .map_or_else(|| Self::literal(raw), Self::from_json)
        } else {
            Self::literal(raw)
        }
    }

    /// The operator with `==` canonicalized to `=`
    #[must_use]
    pub fn normalized_operator(&self) -> &str {
        let operator = self.operator.trim();
        if operator == "==" { "=" } else { operator }
    }

    /// Resolve the operator token into an operation
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperator` for anything outside the supported set.
    pub fn operation(&self) -> Result<FilterOperation, ModifierError> {
        let operator = self.normalized_operator();
        if operator.eq_ignore_ascii_case(INCLUDE) {
            Ok(FilterOperation::Include)
        } else if operator.eq_ignore_ascii_case(EXCLUDE) {
            Ok(FilterOperation::Exclude)
        } else {
            operator.parse().map(FilterOperation::Compare)
        }
    }
}

/// Count constraint of a `has` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCountExpression {
    pub value: u64,
    pub operator: Operator,
}

impl Default for FilterCountExpression {
    fn default() -> Self {
        Self {
            value: 1,
            operator: Operator::Gte,
        }
    }
}

const COUNT_PARAMETER: &str = "count";

impl FilterCountExpression {
    /// Parse the `count` entry of a relation constraint.
    ///
    /// Accepts a map or JSON object with optional `value` and `operator`, or a bare
    /// integer.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for counts that are not non-negative integers,
    /// `InvalidOperator` for unknown or pattern operators.
    pub fn from_param(param: &ParamValue) -> Result<Self, ModifierError> {
        match param {
            ParamValue::Map(map) => {
                let value = map.get("value").and_then(ParamValue::as_scalar);
                let operator = map.get("operator").and_then(ParamValue::as_scalar);
                Self::from_parts(value, operator)
            }
            ParamValue::Scalar(raw) => {
                let mut decoder = JsonDecoder::new();
                let decoded = if decoder.decode(raw) {
                    decoder.into_data()
                } else {
                    None
                };
                match decoded {
                    Some(Value::Object(object)) => Self::from_json(&Value::Object(object)),
                    Some(other) => Err(ModifierError::invalid_parameter(
                        COUNT_PARAMETER,
                        other.to_string(),
                    )),
                    None => Self::from_parts(Some(raw), None),
                }
            }
            ParamValue::Null | ParamValue::Sequence(_) if param.is_empty() => Ok(Self::default()),
            ParamValue::Null | ParamValue::Sequence(_) => Err(ModifierError::invalid_parameter(
                COUNT_PARAMETER,
                param.to_json().to_string(),
            )),
        }
    }

    /// Parse a decoded JSON count object
    ///
    /// # Errors
    ///
    /// As for [`FilterCountExpression::from_param`].
    pub fn from_json(decoded: &Value) -> Result<Self, ModifierError> {
        let value = match decoded.get("value") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let operator = match decoded.get("operator") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Self::from_parts(value.as_deref(), operator.as_deref())
    }

    fn from_parts(value: Option<&str>, operator: Option<&str>) -> Result<Self, ModifierError> {
        let mut count = Self::default();

        if let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) {
            count.value = raw
                .parse()
                .map_err(|_| ModifierError::invalid_parameter(COUNT_PARAMETER, raw))?;
        }

        if let Some(raw) = operator.filter(|o| !o.trim().is_empty()) {
            let parsed: Operator = raw.parse()?;
            if parsed.is_pattern() {
                return Err(ModifierError::invalid_operator(raw));
            }
            count.operator = parsed;
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========================================================================
    // Operator parsing
    // ========================================================================

    #[test]
    fn test_operator_symbols() {
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Eq);
        assert_eq!("==".parse::<Operator>().unwrap(), Operator::Eq);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEq);
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Gte);
        assert_eq!("<".parse::<Operator>().unwrap(), Operator::Lt);
    }

    #[test]
    fn test_operator_words_are_case_insensitive() {
        assert_eq!("LIKE".parse::<Operator>().unwrap(), Operator::Like);
        assert_eq!("Not   Like".parse::<Operator>().unwrap(), Operator::NotLike);
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = "; DROP TABLE".parse::<Operator>().unwrap_err();
        assert_eq!(err, ModifierError::invalid_operator("; DROP TABLE"));
    }

    // ========================================================================
    // FilterExpression
    // ========================================================================

    #[test]
    fn test_default_operator() {
        let expr = FilterExpression::from_map(&IndexMap::from([(
            "value".to_string(),
            ParamValue::from("5"),
        )]));
        assert_eq!(expr.operator, "=");
        assert_eq!(expr.value, Some(json!("5")));
    }

    #[test]
    fn test_double_equals_normalized() {
        let expr = FilterExpression::new(5, "==");
        assert_eq!(expr.normalized_operator(), "=");
        assert_eq!(
            expr.operation().unwrap(),
            FilterOperation::Compare(Operator::Eq)
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let expr = FilterExpression::new(5, "=");
        assert_eq!(expr.normalized_operator(), "=");
    }

    #[test]
    fn test_include_and_exclude() {
        assert_eq!(
            FilterExpression::new(json!([1]), "include").operation().unwrap(),
            FilterOperation::Include
        );
        assert_eq!(
            FilterExpression::new(json!([1]), "exclude").operation().unwrap(),
            FilterOperation::Exclude
        );
    }

    #[test]
    fn test_scalar_json_expression() {
        let expr = FilterExpression::from_scalar(r#"{"value":5,"operator":">"}"#);
        assert_eq!(expr.value, Some(json!(5)));
        assert_eq!(expr.operator, ">");
    }

    #[test]
    fn test_scalar_literal_expression() {
        let expr = FilterExpression::from_scalar("hello");
        assert_eq!(expr.value, Some(json!("hello")));
        assert_eq!(expr.operator, "=");
    }

    #[test]
    fn test_json_without_value_is_empty() {
        assert_eq!(FilterExpression::from_scalar(r#"{"operator":">"}"#).value, None);
        assert_eq!(FilterExpression::from_scalar("[1,2]").value, None);
        assert_eq!(FilterExpression::from_scalar(r#"{"value":null}"#).value, None);
    }

    // ========================================================================
    // FilterCountExpression
    // ========================================================================

    #[test]
    fn test_count_defaults() {
        let count = FilterCountExpression::default();
        assert_eq!(count.value, 1);
        assert_eq!(count.operator, Operator::Gte);
        assert_eq!(FilterCountExpression::from_param(&ParamValue::Null).unwrap(), count);
    }

    #[test]
    fn test_count_from_map() {
        let param = ParamValue::from(json!({"operator": ">", "value": 5}));
        let count = FilterCountExpression::from_param(&param).unwrap();
        assert_eq!(count.value, 5);
        assert_eq!(count.operator, Operator::Gt);
    }

    #[test]
    fn test_count_from_json_string() {
        let param = ParamValue::from(r#"{"operator":"<","value":"3"}"#);
        let count = FilterCountExpression::from_param(&param).unwrap();
        assert_eq!(count.value, 3);
        assert_eq!(count.operator, Operator::Lt);
    }

    #[test]
    fn test_count_from_bare_integer() {
        let count = FilterCountExpression::from_param(&ParamValue::from("4")).unwrap();
        assert_eq!(count.value, 4);
        assert_eq!(count.operator, Operator::Gte);
    }

    #[test]
    fn test_count_rejects_negative() {
        let err = FilterCountExpression::from_param(&ParamValue::from("-2")).unwrap_err();
        assert_eq!(err, ModifierError::invalid_parameter("count", "-2"));
    }

    #[test]
    fn test_count_rejects_like() {
        let param = ParamValue::from(json!({"operator": "like", "value": 1}));
        let err = FilterCountExpression::from_param(&param).unwrap_err();
        assert_eq!(err, ModifierError::invalid_operator("like"));
    }
}
