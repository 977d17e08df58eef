//! Marshalling values and errors into response bytes.
//!
//! The encoding names here are the values the `encoding` option may
//! take. Not every named encoding has a marshaller — `xml` resolves to
//! a content type but cannot be produced, which callers surface as a
//! server-side configuration failure.

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::error::CommandError;

/// JSON encoding name.
pub const JSON: &str = "json";
/// XML encoding name. Recognized, but no marshaller exists for it.
pub const XML: &str = "xml";
/// Plain-text encoding name.
pub const TEXT: &str = "text";

/// Failure to turn a value into response bytes.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("no marshaller found for encoding {0:?}")]
    NoMarshaller(String),
    #[error("output cannot be marshalled as text")]
    NotText,
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Marshal a materialized value per the requested encoding.
pub fn marshal_value(value: &Value, encoding: &str) -> Result<Bytes, MarshalError> {
    match encoding {
        JSON => Ok(serde_json::to_vec(value)?.into()),
        TEXT => marshal_text(value),
        other => Err(MarshalError::NoMarshaller(other.to_string())),
    }
}

// Text output is for scalar results only; structured values have no
// canonical text form.
fn marshal_text(value: &Value) -> Result<Bytes, MarshalError> {
    match value {
        Value::Null => Ok(Bytes::new()),
        Value::String(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string().into_bytes().into()),
        Value::Array(_) | Value::Object(_) => Err(MarshalError::NotText),
    }
}

/// Marshal a terminal command error as the response body.
///
/// Errors always have a wire form. JSON keeps the structured
/// `{"Message", "Code"}` shape; every other encoding degrades to the
/// bare message line.
pub fn marshal_error(error: &CommandError, encoding: &str) -> Bytes {
    match encoding {
        JSON => serde_json::to_vec(error)
            .map(Bytes::from)
            .unwrap_or_else(|_| Bytes::from(error.message.clone())),
        _ => Bytes::from(format!("{}\n", error.message)),
    }
}
