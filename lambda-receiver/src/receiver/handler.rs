//! Per-invocation request pipeline.
//!
//! ```text
//! verify → decode → (ssl_check | url_verification) → translate → dispatch → marshal
//! ```
//!
//! Nothing is shared between invocations except the immutable settings and
//! the processor.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;
use tracing::{error, info, warn};

use super::ack::Acknowledger;
use super::body::{decode_body, ContentType};
use super::event::{translate, CustomPropertiesExtractor, Preflight, ReceiverEvent};
use super::response::marshal_response;
use super::signature::{verify_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::dispatch::EventProcessor;
use crate::lambda::types::CONTENT_TYPE;
use crate::lambda::{InboundRequest, OutboundResponse};

/// Immutable receiver settings, usually built by `Config::receiver_settings`.
#[derive(Debug, Clone)]
pub struct ReceiverSettings {
    pub signing_secret: String,
    pub signature_verification: bool,
    pub signature_max_age: u64,
    /// How long a listener may run before `ack_not_called` is logged
    pub ack_warning: Duration,
}

/// Adapter between Lambda invocations and an [`EventProcessor`].
#[derive(Clone)]
pub struct Receiver {
    settings: Arc<ReceiverSettings>,
    processor: Arc<dyn EventProcessor>,
    custom_properties: Option<CustomPropertiesExtractor>,
}

impl Receiver {
    pub fn new(settings: ReceiverSettings, processor: impl EventProcessor + 'static) -> Self {
        Self {
            settings: Arc::new(settings),
            processor: Arc::new(processor),
            custom_properties: None,
        }
    }

    /// Attach extra request-derived properties to every dispatched event.
    pub fn with_custom_properties(mut self, extractor: CustomPropertiesExtractor) -> Self {
        self.custom_properties = Some(extractor);
        self
    }

    /// Handle one invocation, always producing exactly one response.
    ///
    /// - Bad or stale signature → 401 (including a body that cannot be
    ///   recovered for verification)
    /// - Unreadable or undecodable body → 400
    /// - `ssl_check` → 200, empty body
    /// - `url_verification` → 200, `{"challenge": ...}`
    /// - Otherwise the dispatch outcome, see [`marshal_response`]
    pub async fn handle(&self, request: InboundRequest) -> OutboundResponse {
        let raw_bytes = request
            .raw_body_bytes()
            .map_err(|e| warn!(error = %e, "request_body_unreadable"))
            .ok();

        // a body that cannot be recovered cannot be authenticated either
        if self.settings.signature_verification {
            let verified = raw_bytes.as_deref().is_some_and(|bytes| {
                verify_signature(
                    &self.settings.signing_secret,
                    bytes,
                    request.header(SIGNATURE_HEADER),
                    request.header(TIMESTAMP_HEADER),
                    self.settings.signature_max_age,
                )
            });

            if !verified {
                warn!(path = ?request.path, "request_signature_rejected");
                return OutboundResponse::empty(401);
            }
        }

        let Some(raw_bytes) = raw_bytes else {
            return OutboundResponse::empty(400);
        };

        let raw_body = match String::from_utf8(raw_bytes) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "request_body_not_utf8");
                return OutboundResponse::empty(400);
            }
        };

        let content_type = ContentType::from_header(request.header(CONTENT_TYPE));
        let body = match decode_body(&raw_body, &content_type) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, content_type = ?content_type, "request_body_invalid");
                return OutboundResponse::empty(400);
            }
        };

        match Preflight::inspect(&body) {
            Preflight::SslCheck => {
                info!("ssl_check_received");
                return OutboundResponse::empty(200);
            }
            Preflight::UrlVerification { challenge } => {
                info!("url_verification_received");
                return OutboundResponse::json(&json!({ "challenge": challenge }));
            }
            Preflight::Dispatch => {}
        }

        let event = translate(&request, body, self.custom_properties.as_ref());
        let ack = event.ack.clone();

        info!(
            payload_type = ?event.body.get("type").and_then(|v| v.as_str()),
            retry_num = ?event.retry_num,
            "event_dispatching"
        );

        let outcome = self.dispatch(event, &ack).await;

        marshal_response(outcome, ack.state())
    }

    /// Run the processor to completion, logging once if it has not
    /// acknowledged by the time `ack_warning` elapses.
    async fn dispatch(&self, event: ReceiverEvent, ack: &Acknowledger) -> anyhow::Result<()> {
        let processing = AssertUnwindSafe(self.processor.process_event(event)).catch_unwind();
        tokio::pin!(processing);

        let warning = tokio::time::sleep(self.settings.ack_warning);
        tokio::pin!(warning);
        let mut warned = false;

        let outcome = loop {
            tokio::select! {
                outcome = &mut processing => break outcome,
                _ = &mut warning, if !warned => {
                    warned = true;
                    if !ack.is_acknowledged() {
                        error!(
                            waited_ms = self.settings.ack_warning.as_millis() as u64,
                            hint = "listener did not call ack in time; make sure every listener calls ack()",
                            "ack_not_called"
                        );
                    }
                }
            }
        };

        match outcome {
            Ok(result) => result,
            Err(panic) => Err(anyhow::anyhow!("listener panicked: {}", panic_message(panic.as_ref()))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
