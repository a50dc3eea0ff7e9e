//! Single-use acknowledgment for one invocation.
//!
//! Every event handed to the dispatch layer carries an [`Acknowledger`].
//! The first call stores the response; any further call is an error.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::debug;

use crate::error::ReceiverError;

/// Value a listener hands back through `ack`.
#[derive(Debug, Clone, PartialEq)]
pub enum AckResponse {
    /// Returned as the raw body with no content type
    Text(String),
    /// Returned serialized, with `Content-Type: application/json`
    Json(Value),
}

impl Default for AckResponse {
    fn default() -> Self {
        AckResponse::Text(String::new())
    }
}

impl From<&str> for AckResponse {
    fn from(text: &str) -> Self {
        AckResponse::Text(text.to_string())
    }
}

impl From<String> for AckResponse {
    fn from(text: String) -> Self {
        AckResponse::Text(text)
    }
}

impl From<Value> for AckResponse {
    fn from(value: Value) -> Self {
        AckResponse::Json(value)
    }
}

/// Acknowledgment state machine: `Pending` → `Acknowledged`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AckState {
    #[default]
    Pending,
    Acknowledged(AckResponse),
}

/// Cloneable handle to one invocation's [`AckState`].
#[derive(Debug, Clone, Default)]
pub struct Acknowledger {
    state: Arc<Mutex<AckState>>,
}

impl Acknowledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledge the request. `None` acknowledges with an empty body.
    ///
    /// Returns [`ReceiverError::MultipleAck`] if already acknowledged; the
    /// first stored response is kept.
    pub fn ack(&self, response: Option<AckResponse>) -> Result<(), ReceiverError> {
        let mut state = self.lock();

        if let AckState::Acknowledged(_) = *state {
            return Err(ReceiverError::MultipleAck);
        }

        debug!("request_acknowledged");
        *state = AckState::Acknowledged(response.unwrap_or_default());
        Ok(())
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(*self.lock(), AckState::Acknowledged(_))
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AckState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, AckState> {
        // the state is always left valid, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
