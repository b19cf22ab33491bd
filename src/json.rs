use serde_json::Value;

/// Lenient JSON decoding for filter values.
///
/// Decoding never fails loudly: a value that is not a JSON object or array simply
/// leaves the decoder unsuccessful, which callers treat as "use the literal string".
#[derive(Debug, Default, Clone)]
pub struct JsonDecoder {
    data: Option<Value>,
}

impl JsonDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to decode `input`, returning whether a structured value was found.
    ///
    /// Bare JSON scalars (`5`, `"x"`, `true`) do not count as structured.
    pub fn decode(&mut self, input: &str) -> bool {
        self.data = match serde_json::from_str::<Value>(input.trim()) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::trace!(error = %e, "Filter value is not JSON, using literal");
                None
            }
        };
        self.success()
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.data.is_some()
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn into_data(self) -> Option<Value> {
        self.data
    }
}
