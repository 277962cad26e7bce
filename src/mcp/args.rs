//! Argument extraction for tool handlers.
//!
//! Agents send numbers as strings and strings as numbers, so scalar fields are
//! normalized to their form representation here. Nothing is validated: a
//! missing required field is sent empty and the ERP reports the problem.

use serde_json::{Map, Value};

use crate::erp::{CodecError, NestedPayload};

#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    /// Non-object arguments are treated as empty.
    pub fn new(arguments: Value) -> Self {
        match arguments {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    fn scalar(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Null | Value::Object(_) | Value::Array(_) => None,
        }
    }

    /// Scalar field, empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.scalar(key).unwrap_or_default()
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.scalar(key).unwrap_or_else(|| default.to_string())
    }

    /// Optional filter; absent and empty values are both dropped.
    pub fn optional(&self, key: &str) -> Option<String> {
        self.scalar(key).filter(|value| !value.is_empty())
    }

    /// Structured field sent to the ERP as one JSON document.
    pub fn nested(&self, key: &str) -> Result<NestedPayload, CodecError> {
        NestedPayload::from_argument(key, self.values.get(key))
    }
}
