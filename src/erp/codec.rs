//! Payload codec for the Tiny ERP form API.
//!
//! Tiny's v2 API receives nested resources (orders, products, contacts, ...)
//! as a JSON document placed inside a single form field. That document must be
//! stringified exactly once: stringifying it twice produces a JSON string
//! literal that the ERP accepts but reads as empty.
//!
//! The types here make the second pass unrepresentable. A [`NestedPayload`] is
//! consumed by [`encode`], and the resulting [`EncodedJson`] can only be placed
//! into a form, never fed back into a `serde_json::Value`.

use serde_json::Value;
use thiserror::Error;

use super::ErpError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Argument '{field}' must be a JSON object or array")]
    NotAnObject { field: String },

    #[error("Argument '{field}' is a string but does not contain a JSON object or array")]
    InvalidEmbeddedJson { field: String },
}

/// A structured tool argument that will travel as one JSON form field.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedPayload {
    field: String,
    value: Value,
}

impl NestedPayload {
    /// Accepts an object or array argument.
    ///
    /// Some agents send the document already serialized. A string holding a
    /// JSON object or array is decoded here so it gets serialized once on the
    /// way out instead of being wrapped in a second layer of quotes.
    pub fn from_argument(field: &str, value: Option<&Value>) -> Result<Self, CodecError> {
        let value = match value {
            Some(value @ (Value::Object(_) | Value::Array(_))) => value.clone(),
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
                _ => {
                    return Err(CodecError::InvalidEmbeddedJson {
                        field: field.to_string(),
                    })
                }
            },
            _ => {
                return Err(CodecError::NotAnObject {
                    field: field.to_string(),
                })
            }
        };

        Ok(Self {
            field: field.to_string(),
            value,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// JSON text produced by [`encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedJson(String);

impl EncodedJson {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn into_string(self) -> String {
        self.0
    }
}

/// Serializes a nested payload to compact JSON. Key order and non-ASCII
/// characters are preserved as received.
pub fn encode(payload: NestedPayload) -> EncodedJson {
    EncodedJson(payload.value.to_string())
}

pub fn decode(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text)
}

/// Parses an upstream response body.
///
/// Tiny answers HTTP 200 even for business errors and signals them with
/// `retorno.status == "Erro"`. Those become [`ErpError::Rejected`].
pub fn decode_response(endpoint: &str, body: &[u8]) -> Result<Value, ErpError> {
    let value: Value = serde_json::from_slice(body).map_err(|source| ErpError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })?;

    if let Some(retorno) = value.get("retorno") {
        if retorno.get("status").and_then(Value::as_str) == Some("Erro") {
            return Err(ErpError::Rejected {
                endpoint: endpoint.to_string(),
                message: rejection_message(retorno),
            });
        }
    }

    Ok(value)
}

fn rejection_message(retorno: &Value) -> String {
    let messages: Vec<&str> = retorno
        .get("erros")
        .and_then(Value::as_array)
        .map(|erros| {
            erros
                .iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text.as_str()),
                    other => other.get("erro").and_then(Value::as_str),
                })
                .collect()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        retorno.to_string()
    } else {
        messages.join("; ")
    }
}
