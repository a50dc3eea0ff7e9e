//! The dispatch layer contract.
//!
//! The receiver hands each [`ReceiverEvent`] to an [`EventProcessor`], which
//! may acknowledge it at most once. [`Router`] is a minimal processor that
//! picks one handler per request.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info};

use crate::receiver::ReceiverEvent;

/// Processes one normalized event.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process_event(&self, event: ReceiverEvent) -> Result<()>;
}

#[async_trait]
impl<F, Fut> EventProcessor for F
where
    F: Fn(ReceiverEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn process_event(&self, event: ReceiverEvent) -> Result<()> {
        (self)(event).await
    }
}

type Handler = Arc<dyn Fn(ReceiverEvent) -> BoxFuture<'static, Result<()>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    /// Slash command name, e.g. `/weather`
    Command(String),
    /// Payload `type`, e.g. `event_callback` or `block_actions`
    PayloadType(String),
}

impl Route {
    fn matches(&self, body: &Value) -> bool {
        match self {
            Route::Command(name) => body.get("command").and_then(Value::as_str) == Some(name.as_str()),
            Route::PayloadType(kind) => body.get("type").and_then(Value::as_str) == Some(kind.as_str()),
        }
    }
}

/// Ordered list of handlers; the first matching route handles the event.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<(Route, Handler)>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a slash command by name.
    pub fn command<F, Fut>(self, name: &str, handler: F) -> Self
    where
        F: Fn(ReceiverEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.route(Route::Command(name.to_string()), handler)
    }

    /// Handle payloads whose `type` field equals `kind`.
    pub fn payload_type<F, Fut>(self, kind: &str, handler: F) -> Self
    where
        F: Fn(ReceiverEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.route(Route::PayloadType(kind.to_string()), handler)
    }

    fn route<F, Fut>(mut self, route: Route, handler: F) -> Self
    where
        F: Fn(ReceiverEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |event: ReceiverEvent| handler(event).boxed());
        self.routes.push((route, handler));
        self
    }
}

#[async_trait]
impl EventProcessor for Router {
    async fn process_event(&self, event: ReceiverEvent) -> Result<()> {
        let handler = self
            .routes
            .iter()
            .find(|(route, _)| route.matches(&event.body))
            .map(|(route, handler)| (route.clone(), Arc::clone(handler)));

        match handler {
            Some((route, handler)) => {
                debug!(route = ?route, "router_handler_matched");
                handler(event).await
            }
            None => {
                let payload_type = event.body.get("type").and_then(|v| v.as_str());
                let command = event.body.get("command").and_then(|v| v.as_str());
                info!(payload_type = ?payload_type, command = ?command, "router_no_handler");
                Ok(())
            }
        }
    }
}
