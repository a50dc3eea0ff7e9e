//! Slack request receiver for Lambda.
//!
//! This module turns one API Gateway invocation into at most one dispatched
//! event and exactly one response:
//! - Verifies the `X-Slack-Signature` HMAC and timestamp freshness
//! - Decodes form or JSON bodies
//! - Answers `ssl_check` and `url_verification` without dispatching
//! - Enforces a single `ack` per invocation and warns when it is late
//! - Maps the acknowledgment (or its absence) to a proxy response

pub mod ack;
pub mod body;
pub mod event;
pub mod handler;
pub mod response;
pub mod signature;

pub use ack::{AckResponse, AckState, Acknowledger};
pub use body::{decode_body, ContentType};
pub use event::{translate, CustomPropertiesExtractor, Preflight, ReceiverEvent};
pub use handler::{Receiver, ReceiverSettings};
pub use response::marshal_response;
pub use signature::{verify_signature, verify_signature_at};
