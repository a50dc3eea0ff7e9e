//! Request and response envelopes for the Lambda proxy integration.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReceiverError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

// =============================================================================
// Inbound (API Gateway → receiver)
// =============================================================================

/// Raw invocation payload from API Gateway.
///
/// Header names arrive with whatever casing the client sent; use
/// [`InboundRequest::header`] rather than indexing `headers` directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    /// Routing metadata, carried through untouched
    #[serde(default)]
    pub request_context: Value,
}

/// API Gateway sends `null` instead of `{}` when there are no headers.
fn nullable_map<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<HashMap<String, T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl InboundRequest {
    /// Case-insensitive header lookup.
    ///
    /// Single-value headers win; otherwise the first multi-value entry is used.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .or_else(|| {
                self.multi_value_headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .and_then(|(_, values)| values.first())
                    .map(String::as_str)
            })
    }

    /// The body bytes exactly as Slack signed them.
    pub fn raw_body_bytes(&self) -> Result<Vec<u8>, ReceiverError> {
        match &self.body {
            None => Ok(Vec::new()),
            Some(body) if self.is_base64_encoded => Ok(STANDARD.decode(body)?),
            Some(body) => Ok(body.as_bytes().to_vec()),
        }
    }

    /// The signed body as text.
    pub fn raw_body(&self) -> Result<String, ReceiverError> {
        Ok(String::from_utf8(self.raw_body_bytes()?)?)
    }
}

// =============================================================================
// Outbound (receiver → API Gateway)
// =============================================================================

/// Proxy integration response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
}

impl OutboundResponse {
    /// A response with the given status and an empty body.
    pub fn empty(status_code: u16) -> Self {
        Self {
            status_code,
            headers: None,
            body: String::new(),
            is_base64_encoded: None,
        }
    }

    /// A 200 response carrying plain text, with no content type.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::empty(200)
        }
    }

    /// A 200 response carrying a serialized JSON document.
    pub fn json(value: &Value) -> Self {
        Self {
            headers: Some(HashMap::from([(
                CONTENT_TYPE.to_string(),
                APPLICATION_JSON.to_string(),
            )])),
            body: value.to_string(),
            ..Self::empty(200)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_api_gateway_event() {
        let event = json!({
            "resource": "/slack/events",
            "path": "/slack/events",
            "httpMethod": "POST",
            "headers": {
                "content-type": "application/json",
                "X-Slack-Signature": "v0=abc"
            },
            "multiValueHeaders": null,
            "body": "{\"type\":\"event_callback\"}",
            "isBase64Encoded": false,
            "requestContext": { "stage": "prod" }
        });

        let request: InboundRequest = serde_json::from_value(event).unwrap();

        assert_eq!(request.http_method.as_deref(), Some("POST"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("x-slack-signature"), Some("v0=abc"));
        assert!(request.multi_value_headers.is_empty());
        assert_eq!(request.request_context["stage"], "prod");
    }

    #[test]
    fn test_header_falls_back_to_multi_value() {
        let request = InboundRequest {
            multi_value_headers: HashMap::from([(
                "X-Slack-Retry-Num".to_string(),
                vec!["2".to_string(), "3".to_string()],
            )]),
            ..Default::default()
        };

        assert_eq!(request.header("x-slack-retry-num"), Some("2"));
        assert_eq!(request.header("X-Missing"), None);
    }

    #[test]
    fn test_raw_body_plain_and_missing() {
        let mut request = InboundRequest {
            body: Some("token=abc".to_string()),
            ..Default::default()
        };
        assert_eq!(request.raw_body().unwrap(), "token=abc");

        request.body = None;
        assert_eq!(request.raw_body().unwrap(), "");
    }

    #[test]
    fn test_raw_body_base64() {
        let request = InboundRequest {
            body: Some(STANDARD.encode("{\"ok\":true}")),
            is_base64_encoded: true,
            ..Default::default()
        };

        assert_eq!(request.raw_body().unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn test_raw_body_base64_not_utf8() {
        let request = InboundRequest {
            body: Some(STANDARD.encode([0xff, 0xfe, b'{'])),
            is_base64_encoded: true,
            ..Default::default()
        };

        assert_eq!(request.raw_body_bytes().unwrap(), vec![0xff, 0xfe, b'{']);
        assert!(matches!(request.raw_body(), Err(ReceiverError::InvalidUtf8(_))));
    }

    #[test]
    fn test_raw_body_bad_base64() {
        let request = InboundRequest {
            body: Some("%%% not base64".to_string()),
            is_base64_encoded: true,
            ..Default::default()
        };

        assert!(matches!(
            request.raw_body(),
            Err(ReceiverError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_outbound_serialization_skips_empty_fields() {
        let json = serde_json::to_value(OutboundResponse::empty(404)).unwrap();
        assert_eq!(json, json!({ "statusCode": 404, "body": "" }));

        let json = serde_json::to_value(OutboundResponse::json(&json!({ "x": 1 }))).unwrap();
        assert_eq!(
            json,
            json!({
                "statusCode": 200,
                "headers": { "Content-Type": "application/json" },
                "body": "{\"x\":1}"
            })
        );
    }
}
