//! Slack Lambda Receiver - AWS Lambda entry point.
//!
//! Each invocation is an API Gateway proxy event carrying one Slack request.
//! The receiver verifies and decodes it, dispatches it to the router, and
//! returns the proxy response built from the listener's acknowledgment.

use anyhow::Context;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use receiver::{Config, InboundRequest, OutboundResponse, Receiver, ReceiverEvent, Router};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).without_time())
        .init();

    info!("lambda_receiver_starting");

    // Load configuration from environment
    let config = Config::from_env();
    info!(
        signing_secret_set = config.signing_secret.is_some(),
        signature_verification = config.signature_verification,
        signature_max_age = config.signature_max_age,
        ack_warning_ms = config.ack_warning_ms,
        "config_loaded"
    );

    let settings = config
        .receiver_settings()
        .context("Invalid receiver configuration")?;

    let receiver = Receiver::new(settings, router());

    lambda_runtime::run(service_fn(|event: LambdaEvent<InboundRequest>| {
        let receiver = receiver.clone();
        async move {
            let (request, context) = event.into_parts();
            info!(request_id = %context.request_id, "invocation_received");
            Ok::<OutboundResponse, Error>(receiver.handle(request).await)
        }
    }))
    .await
}

/// Default listeners: acknowledge Events API callbacks so Slack does not retry.
fn router() -> Router {
    Router::new().payload_type("event_callback", |event: ReceiverEvent| async move {
        info!(
            event_type = ?event.body.pointer("/event/type").and_then(|v| v.as_str()),
            team_id = ?event.body.get("team_id").and_then(|v| v.as_str()),
            "event_callback_received"
        );
        event.ack(None)?;
        Ok::<_, anyhow::Error>(())
    })
}
