//! Error types for the receiver pipeline.

use thiserror::Error;

/// Errors raised while turning a Lambda invocation into a dispatched event.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// A listener called `ack` a second time for the same invocation.
    #[error("the ack function was called multiple times for this request")]
    MultipleAck,

    /// The body was not valid JSON (directly or inside a form `payload`).
    #[error("failed to parse request body as JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// `isBase64Encoded` was set but the body was not valid base64.
    #[error("failed to decode base64 request body: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The decoded body bytes were not UTF-8.
    #[error("request body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Signature verification is enabled but no signing secret was configured.
    #[error("signature verification is enabled but SLACK_SIGNING_SECRET is not set")]
    MissingSigningSecret,
}
