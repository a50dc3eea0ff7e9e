//! Content-type aware body decoding.
//!
//! Slack sends slash commands and interactive payloads form-encoded, and
//! Events API callbacks as JSON.

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::error::ReceiverError;

/// Declared body encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    FormUrlEncoded,
    Json,
    /// Anything else, including a missing header
    Unrecognized(Option<String>),
}

impl ContentType {
    /// Classify a `Content-Type` header value, ignoring parameters and case.
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return ContentType::Unrecognized(None);
        };

        let media_type = raw.split(';').next().unwrap_or_default().trim();

        if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            ContentType::FormUrlEncoded
        } else if media_type.eq_ignore_ascii_case("application/json") {
            ContentType::Json
        } else {
            ContentType::Unrecognized(Some(raw.to_string()))
        }
    }
}

/// Decode a raw body according to its declared content type.
///
/// Form bodies with a string `payload` field decode to that field's JSON.
/// Unrecognized types get a best-effort JSON parse; if that fails the error
/// is logged and returned.
pub fn decode_body(raw_body: &str, content_type: &ContentType) -> Result<Value, ReceiverError> {
    match content_type {
        ContentType::FormUrlEncoded => {
            let fields = parse_form(raw_body);

            match fields.get("payload") {
                Some(Value::String(payload)) => Ok(serde_json::from_str(payload)?),
                _ => Ok(Value::Object(fields)),
            }
        }
        ContentType::Json => Ok(serde_json::from_str(raw_body)?),
        ContentType::Unrecognized(declared) => {
            warn!(
                content_type = ?declared,
                "unexpected_content_type_parsing_as_json"
            );

            serde_json::from_str(raw_body).map_err(|e| {
                error!(
                    error = %e,
                    content_type = ?declared,
                    body_length = raw_body.len(),
                    "body_json_fallback_failed"
                );
                ReceiverError::from(e)
            })
        }
    }
}

/// Parse `a=1&b=2` into a JSON object.
///
/// A key that appears more than once collects its values into an array.
fn parse_form(raw_body: &str) -> Map<String, Value> {
    let mut fields = Map::new();

    for (key, value) in url::form_urlencoded::parse(raw_body.as_bytes()) {
        let value = Value::String(value.into_owned());

        match fields.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key.into_owned(), value);
            }
        }
    }

    fields
}
