//! Payload - リクエストボディから `message` を取り出す
//!
//! チェック順序は固定です:
//! 1. 空ボディ → `EmptyPayload`
//! 2. JSON として壊れている → `MalformedJson`
//! 3. `message` がない / object ではない → `InvalidMessageShape`

use serde_json::{Map, Value};

use super::errors::RequestError;

/// Field name to decoded JSON value.
pub type Payload = Map<String, Value>;

/// Parse a raw request body and return its `message` object.
pub fn parse_message(body: &[u8]) -> Result<Payload, RequestError> {
    if body.is_empty() {
        return Err(RequestError::EmptyPayload);
    }

    let document: Value =
        serde_json::from_slice(body).map_err(|e| RequestError::MalformedJson(e.to_string()))?;

    match document {
        Value::Object(mut root) => match root.remove("message") {
            Some(Value::Object(message)) => Ok(message),
            _ => Err(RequestError::InvalidMessageShape),
        },
        _ => Err(RequestError::InvalidMessageShape),
    }
}
