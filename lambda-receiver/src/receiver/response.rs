//! Turns the dispatch outcome into the Lambda proxy response.

use serde_json::Value;
use tracing::{debug, error, info};

use super::ack::{AckResponse, AckState};
use crate::lambda::OutboundResponse;

/// Build the single response for an invocation.
///
/// | dispatch | ack state      | response                         |
/// |----------|----------------|----------------------------------|
/// | `Err`    | any            | 500, empty body                  |
/// | `Ok`     | text           | 200, text body                   |
/// | `Ok`     | JSON           | 200, JSON body with content type |
/// | `Ok`     | pending        | 404, empty body                  |
pub fn marshal_response(dispatch: anyhow::Result<()>, state: AckState) -> OutboundResponse {
    if let Err(e) = dispatch {
        error!(error = %e, "dispatch_failed");
        debug!(error = ?e, stored_response = ?state, "dispatch_failed_detail");
        return OutboundResponse::empty(500);
    }

    match state {
        AckState::Acknowledged(AckResponse::Text(text))
        | AckState::Acknowledged(AckResponse::Json(Value::String(text))) => {
            OutboundResponse::text(text)
        }
        AckState::Acknowledged(AckResponse::Json(value)) => OutboundResponse::json(&value),
        AckState::Pending => {
            info!("event_not_acknowledged");
            OutboundResponse::empty(404)
        }
    }
}
