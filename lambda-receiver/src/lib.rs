//! Slack Lambda receiver - request adapter between API Gateway and a Slack app.
//!
//! This library provides the shared modules for two binaries:
//! - `slack-lambda-receiver`: AWS Lambda entry point
//! - `slack-local`: Local HTTP server wrapping the same pipeline
//!
//! ## Architecture
//!
//! ```text
//! API Gateway → InboundRequest → Receiver → EventProcessor (ack) → OutboundResponse
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod installation;
pub mod lambda;
pub mod receiver;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{EventProcessor, Router};
pub use error::ReceiverError;
pub use installation::{
    installation_key, Installation, InstallationError, InstallationQuery, InstallationStore,
    MemoryInstallationStore,
};
pub use lambda::{InboundRequest, OutboundResponse};
pub use receiver::{AckResponse, Receiver, ReceiverEvent, ReceiverSettings};
