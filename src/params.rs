//! Raw request parameters.
//!
//! The pipeline never looks at query strings or JSON directly. Both are converted
//! once, at the boundary, into a [`ParamMap`] whose values are a closed set of
//! shapes ([`ParamValue`]); the modifiers pattern-match on those shapes.
//!
//! Query strings follow the usual PHP/Rails conventions:
//!
//! ```text
//! ?status=open                      -> status: Scalar("open")
//! ?id=1&id=2  or  ?id[]=1&id[]=2    -> id: Sequence(["1", "2"])
//! ?views[operator]=>&views[value]=5 -> views: Map { operator: ">", value: "5" }
//! ?views={"operator":">","value":5} -> views: Scalar(...) decoded later as JSON
//! ?x[a]=1&x=2                       -> x: Map { a: "1", 1: "2" }
//! ```

use indexmap::IndexMap;
use serde_json::Value;

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Null,
    Scalar(String),
    Sequence(Vec<String>),
    Map(IndexMap<String, ParamValue>),
}

impl ParamValue {
    /// `true` for null, the empty string, and empty sequences or maps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Scalar(s) => s.is_empty(),
            Self::Sequence(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, ParamValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to a JSON value. Scalars stay strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Scalar(s) => Value::String(s.clone()),
            Self::Sequence(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Short description of the shape, used in log output
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Map(_) => "map",
        }
    }
}

/// Render a JSON scalar the way it would appear in a query string
fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Array(items) => {
                let scalars: Option<Vec<String>> = items.iter().map(json_scalar_to_string).collect();
                match scalars {
                    Some(scalars) => Self::Sequence(scalars),
                    // Nested structures keep their positions as keys
                    None => Self::Map(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(index, item)| (index.to_string(), Self::from(item)))
                            .collect(),
                    ),
                }
            }
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
            scalar => Self::Scalar(json_scalar_to_string(&scalar).unwrap_or_default()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Sequence(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Sequence(values.into_iter().map(str::to_string).collect())
    }
}

/// Insertion-ordered map of request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap(IndexMap<String, ParamValue>);

impl ParamMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// Repeated keys and `key[]` collect into a sequence, `key[sub]` builds nested
    /// maps. A leading `?` is ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let (base, segments) = split_key(&key);
            if base.is_empty() {
                continue;
            }

            if segments.is_empty() {
                insert_repeatable(&mut params.0, base.to_string(), value.into_owned());
            } else {
                let target = params
                    .0
                    .entry(base.to_string())
                    .or_insert_with(|| ParamValue::Map(IndexMap::new()));
                insert_path(target, &segments, value.into_owned());
            }
        }

        params
    }

    /// Build from a JSON object; anything else yields an empty map.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| (key, ParamValue::from(value)))
                .collect(),
            _ => Self::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<IndexMap<String, ParamValue>> for ParamMap {
    fn from(map: IndexMap<String, ParamValue>) -> Self {
        Self(map)
    }
}

/// Split `a[b][c]` into `("a", ["b", "c"])`. Keys with unbalanced brackets are
/// taken literally.
fn split_key(key: &str) -> (&str, Vec<String>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };

    let base = &key[..open];
    let mut rest = &key[open..];
    let mut segments = Vec::new();

    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return (key, Vec::new());
        };
        segments.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() {
        return (key, Vec::new());
    }

    (base, segments)
}

/// Insert a leaf value, turning a repeated key into a sequence
fn insert_repeatable(map: &mut IndexMap<String, ParamValue>, key: String, value: String) {
    let slot = map.entry(key).or_insert(ParamValue::Null);
    match slot {
        ParamValue::Scalar(previous) => {
            let previous = std::mem::take(previous);
            *slot = ParamValue::Sequence(vec![previous, value]);
        }
        ParamValue::Sequence(items) => items.push(value),
        // `x[a]=1&x=2` keeps `a` and files `2` under the next position
        ParamValue::Map(map) if !map.is_empty() => {
            let index = map.len().to_string();
            map.insert(index, ParamValue::Scalar(value));
        }
        _ => *slot = ParamValue::Scalar(value),
    }
}

fn insert_path(target: &mut ParamValue, segments: &[String], value: String) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };

    // Trailing `[]` appends to a sequence
    if head.is_empty() && tail.is_empty() {
        match target {
            ParamValue::Sequence(items) => items.push(value),
            ParamValue::Scalar(previous) => {
                let previous = std::mem::take(previous);
                *target = ParamValue::Sequence(vec![previous, value]);
            }
            ParamValue::Map(map) if !map.is_empty() => {
                let index = map.len().to_string();
                map.insert(index, ParamValue::Scalar(value));
            }
            _ => *target = ParamValue::Sequence(vec![value]),
        }
        return;
    }

    // Mixing `[]` and `[key]` keeps list positions as keys
    match target {
        ParamValue::Map(_) => {}
        ParamValue::Sequence(items) => {
            let map = std::mem::take(items)
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), ParamValue::Scalar(item)))
                .collect();
            *target = ParamValue::Map(map);
        }
        _ => *target = ParamValue::Map(IndexMap::new()),
    }

    if let ParamValue::Map(map) = target {
        let key = if head.is_empty() {
            map.len().to_string()
        } else {
            head.clone()
        };

        if tail.is_empty() {
            insert_repeatable(map, key, value);
        } else {
            let child = map
                .entry(key)
                .or_insert_with(|| ParamValue::Map(IndexMap::new()));
            insert_path(child, tail, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_query_values() {
        let params = ParamMap::from_query("status=open&title=hello%20world");
        assert_eq!(params.get("status"), Some(&ParamValue::from("open")));
        assert_eq!(params.get("title"), Some(&ParamValue::from("hello world")));
    }

    #[test]
    fn test_leading_question_mark_is_ignored() {
        let params = ParamMap::from_query("?sort=-name");
        assert_eq!(params.get("sort"), Some(&ParamValue::from("-name")));
    }

    #[test]
    fn test_repeated_keys_become_sequence() {
        let params = ParamMap::from_query("id=1&id=2&id=3");
        assert_eq!(params.get("id"), Some(&ParamValue::from(vec!["1", "2", "3"])));
    }

    #[test]
    fn test_bracket_sequence() {
        let params = ParamMap::from_query("id[]=b&id[]=a");
        assert_eq!(params.get("id"), Some(&ParamValue::from(vec!["b", "a"])));
    }

    #[test]
    fn test_nested_map() {
        let params = ParamMap::from_query("views[operator]=%3E&views[value]=5");
        let map = params.get("views").and_then(ParamValue::as_map).unwrap();
        assert_eq!(map.get("operator"), Some(&ParamValue::from(">")));
        assert_eq!(map.get("value"), Some(&ParamValue::from("5")));
    }

    #[test]
    fn test_deeply_nested_map() {
        let params = ParamMap::from_query("has[comments][count][value]=5");
        let expected = ParamValue::from(json!({"comments": {"count": {"value": "5"}}}));
        assert_eq!(params.get("has"), Some(&expected));
    }

    #[test]
    fn test_mixed_list_and_keys_keep_positions() {
        let params = ParamMap::from_query("status[]=a&status[value]=b");
        let map = params.get("status").and_then(ParamValue::as_map).unwrap();
        assert_eq!(map.get("0"), Some(&ParamValue::from("a")));
        assert_eq!(map.get("value"), Some(&ParamValue::from("b")));
    }

    #[test]
    fn test_plain_key_after_nested_keeps_map() {
        let params = ParamMap::from_query("x[a]=1&x=2");
        let map = params.get("x").and_then(ParamValue::as_map).unwrap();
        assert_eq!(map.get("a"), Some(&ParamValue::from("1")));
        assert_eq!(map.get("1"), Some(&ParamValue::from("2")));
    }

    #[test]
    fn test_unbalanced_brackets_taken_literally() {
        let params = ParamMap::from_query("a[b=1");
        assert_eq!(params.get("a[b"), Some(&ParamValue::from("1")));
    }

    #[test]
    fn test_key_order_is_preserved() {
        let params = ParamMap::from_query("z=1&a=2&m=3");
        let keys: Vec<&String> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_from_json() {
        let params = ParamMap::from_json(json!({
            "views": {"value": 5, "operator": ">"},
            "id": [1, 2],
            "deleted_at": null,
            "published": true
        }));

        let views = params.get("views").and_then(ParamValue::as_map).unwrap();
        assert_eq!(views.get("value"), Some(&ParamValue::from("5")));
        assert_eq!(params.get("id"), Some(&ParamValue::from(vec!["1", "2"])));
        assert_eq!(params.get("deleted_at"), Some(&ParamValue::Null));
        assert_eq!(params.get("published"), Some(&ParamValue::from("true")));
    }

    #[test]
    fn test_from_json_non_object_is_empty() {
        assert!(ParamMap::from_json(json!([1, 2])).is_empty());
    }

    #[test]
    fn test_is_empty_shapes() {
        assert!(ParamValue::Null.is_empty());
        assert!(ParamValue::from("").is_empty());
        assert!(ParamValue::Sequence(vec![]).is_empty());
        assert!(ParamValue::Map(IndexMap::new()).is_empty());
        assert!(!ParamValue::from("0").is_empty());
    }

    #[test]
    fn test_to_json_round_trips_shape() {
        let value = ParamValue::from(json!({"a": ["x", "y"], "b": null}));
        assert_eq!(value.to_json(), json!({"a": ["x", "y"], "b": null}));
    }
}
