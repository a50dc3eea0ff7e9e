//! Slack Local Server - runs the Lambda receiver behind a plain HTTP listener.
//!
//! This binary provides a thin web server that:
//! - Wraps each HTTP request into the same `InboundRequest` API Gateway sends
//! - Runs it through the receiver pipeline
//! - Writes the resulting `OutboundResponse` back as HTTP
//!
//! Point a Slack app's request URL (through a tunnel) at `/slack/events`.

use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use receiver::{Config, InboundRequest, OutboundResponse, Receiver, ReceiverEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("local_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        signing_secret_set = config.signing_secret.is_some(),
        signature_verification = config.signature_verification,
        "config_loaded"
    );

    let settings = config
        .receiver_settings()
        .context("Invalid receiver configuration")?;

    let receiver = Receiver::new(settings, local_router());

    // Build the router
    let app = Router::new()
        .route("/health", get(health))
        .route("/slack/events", post(slack_events))
        .layer(TraceLayer::new_for_http())
        .with_state(receiver);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "local_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("local_server_shutdown_complete");

    Ok(())
}

/// Listeners used locally: echo slash commands, acknowledge everything else.
fn local_router() -> receiver::Router {
    receiver::Router::new()
        .payload_type("event_callback", |event: ReceiverEvent| async move {
            event.ack(None)?;
            Ok::<_, anyhow::Error>(())
        })
        .payload_type("block_actions", |event: ReceiverEvent| async move {
            event.ack(None)?;
            Ok::<_, anyhow::Error>(())
        })
        .command("/echo", |event: ReceiverEvent| async move {
            let text = event
                .body
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            event.ack(Some(text.into()))?;
            Ok::<_, anyhow::Error>(())
        })
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Slack request endpoint.
async fn slack_events(
    State(receiver): State<Receiver>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = into_inbound(&method, &uri, &headers, &body);
    into_http(receiver.handle(request).await)
}

/// Wrap an HTTP request the way API Gateway would.
///
/// Bodies that are not valid UTF-8 are passed base64-encoded so the signed
/// bytes survive untouched. Repeated header names go to
/// `multi_value_headers` with every value kept.
fn into_inbound(method: &Method, uri: &Uri, headers: &HeaderMap, body: &Bytes) -> InboundRequest {
    let mut single = HashMap::new();
    let mut multi = HashMap::new();

    for name in headers.keys() {
        let mut values: Vec<String> = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect();

        if values.len() > 1 {
            multi.insert(name.as_str().to_string(), values);
        } else if let Some(value) = values.pop() {
            single.insert(name.as_str().to_string(), value);
        } else {
            warn!(header = %name, "request_header_not_ascii");
        }
    }

    let (body, is_base64_encoded) = match String::from_utf8(body.to_vec()) {
        Ok(text) => (text, false),
        Err(_) => (STANDARD.encode(body), true),
    };

    InboundRequest {
        http_method: Some(method.to_string()),
        path: Some(uri.path().to_string()),
        headers: single,
        multi_value_headers: multi,
        body: Some(body),
        is_base64_encoded,
        ..Default::default()
    }
}

/// Convert the proxy response into an HTTP response.
fn into_http(response: OutboundResponse) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or_else(|_| {
        warn!(status_code = response.status_code, "invalid_status_code");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut headers = HeaderMap::new();
    for (name, value) in response.headers.unwrap_or_default() {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "invalid_response_header"),
        }
    }

    (status, headers, response.body).into_response()
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("local_server_shutting_down");
}
