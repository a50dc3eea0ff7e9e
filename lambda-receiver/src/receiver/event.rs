//! Normalized events handed to the dispatch layer.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::ack::{AckResponse, Acknowledger};
use crate::error::ReceiverError;
use crate::lambda::InboundRequest;

pub const RETRY_NUM_HEADER: &str = "X-Slack-Retry-Num";
pub const RETRY_REASON_HEADER: &str = "X-Slack-Retry-Reason";

/// Extra properties computed from the raw request and attached to each event.
pub type CustomPropertiesExtractor =
    Arc<dyn Fn(&InboundRequest) -> Map<String, Value> + Send + Sync>;

/// A decoded request plus the means to acknowledge it.
#[derive(Debug, Clone)]
pub struct ReceiverEvent {
    pub body: Value,
    pub ack: Acknowledger,
    /// Slack's delivery attempt counter, present on retries
    pub retry_num: Option<u32>,
    pub retry_reason: Option<String>,
    pub custom_properties: Map<String, Value>,
}

impl ReceiverEvent {
    /// Shorthand for `self.ack.ack(response)`.
    pub fn ack(&self, response: Option<AckResponse>) -> Result<(), ReceiverError> {
        self.ack.ack(response)
    }
}

/// What to do with a decoded body before any dispatch happens.
#[derive(Debug, Clone, PartialEq)]
pub enum Preflight {
    /// `ssl_check` health check: answer 200 with an empty body
    SslCheck,
    /// `url_verification` handshake: echo the challenge
    UrlVerification { challenge: Value },
    Dispatch,
}

impl Preflight {
    pub fn inspect(body: &Value) -> Self {
        if body.get("ssl_check").map(is_truthy).unwrap_or(false) {
            return Preflight::SslCheck;
        }

        if body.get("type").and_then(Value::as_str) == Some("url_verification") {
            return Preflight::UrlVerification {
                challenge: body.get("challenge").cloned().unwrap_or(Value::Null),
            };
        }

        Preflight::Dispatch
    }
}

/// Loose truthiness: form fields arrive as strings such as `"1"`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Wrap a decoded body into an event with a fresh acknowledger.
pub fn translate(
    request: &InboundRequest,
    body: Value,
    extractor: Option<&CustomPropertiesExtractor>,
) -> ReceiverEvent {
    ReceiverEvent {
        body,
        ack: Acknowledger::new(),
        retry_num: request
            .header(RETRY_NUM_HEADER)
            .and_then(|v| v.trim().parse().ok()),
        retry_reason: request.header(RETRY_REASON_HEADER).map(str::to_string),
        custom_properties: extractor.map(|extract| extract(request)).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_preflight_ssl_check() {
        assert_eq!(Preflight::inspect(&json!({ "ssl_check": "1" })), Preflight::SslCheck);
        assert_eq!(Preflight::inspect(&json!({ "ssl_check": true })), Preflight::SslCheck);
        assert_eq!(Preflight::inspect(&json!({ "ssl_check": 1 })), Preflight::SslCheck);
    }

    #[test]
    fn test_preflight_falsy_ssl_check_dispatches() {
        for flag in [json!(""), json!(0), json!(false), json!(null)] {
            assert_eq!(
                Preflight::inspect(&json!({ "ssl_check": flag })),
                Preflight::Dispatch
            );
        }
    }

    #[test]
    fn test_preflight_url_verification() {
        let body = json!({ "type": "url_verification", "challenge": "abc", "token": "t" });

        assert_eq!(
            Preflight::inspect(&body),
            Preflight::UrlVerification { challenge: json!("abc") }
        );
    }

    #[test]
    fn test_preflight_non_object_body_dispatches() {
        assert_eq!(Preflight::inspect(&json!([1, 2])), Preflight::Dispatch);
        assert_eq!(Preflight::inspect(&json!("text")), Preflight::Dispatch);
    }

    #[test]
    fn test_translate_reads_retry_headers() {
        let request = InboundRequest {
            headers: HashMap::from([
                ("x-slack-retry-num".to_string(), "2".to_string()),
                ("X-Slack-Retry-Reason".to_string(), "http_timeout".to_string()),
            ]),
            ..Default::default()
        };

        let event = translate(&request, json!({ "type": "event_callback" }), None);

        assert_eq!(event.retry_num, Some(2));
        assert_eq!(event.retry_reason.as_deref(), Some("http_timeout"));
        assert!(event.custom_properties.is_empty());
        assert!(!event.ack.is_acknowledged());
    }

    #[test]
    fn test_translate_custom_properties() {
        let request = InboundRequest {
            path: Some("/slack/events".to_string()),
            ..Default::default()
        };
        let extractor: CustomPropertiesExtractor = Arc::new(|request: &InboundRequest| {
            let mut props = Map::new();
            props.insert("path".to_string(), json!(request.path));
            props
        });

        let event = translate(&request, json!({}), Some(&extractor));

        assert_eq!(event.custom_properties["path"], "/slack/events");
        assert_eq!(event.retry_num, None);
    }
}
