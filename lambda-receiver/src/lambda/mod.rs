//! Lambda invocation shapes.
//!
//! The hosting runtime hands the receiver an API Gateway proxy event and
//! expects a proxy response back:
//!
//! ```text
//! API Gateway → InboundRequest → Receiver → OutboundResponse → API Gateway
//! ```

pub mod types;

pub use types::{InboundRequest, OutboundResponse};
