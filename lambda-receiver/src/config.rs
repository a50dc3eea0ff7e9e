//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::error::ReceiverError;
use crate::receiver::ReceiverSettings;

/// Default freshness window for `X-Slack-Request-Timestamp`, in seconds.
pub const DEFAULT_SIGNATURE_MAX_AGE: u64 = 300;

/// Default delay before warning that a listener has not acknowledged.
pub const DEFAULT_ACK_WARNING_MS: u64 = 3001;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Slack signing secret used for HMAC request verification
    pub signing_secret: Option<String>,

    /// Whether incoming requests must carry a valid Slack signature
    pub signature_verification: bool,

    /// Maximum age in seconds for request timestamps
    pub signature_max_age: u64,

    /// Delay in milliseconds before logging a missing acknowledgment
    pub ack_warning_ms: u64,

    /// Port for the local development server
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            signing_secret: env::var("SLACK_SIGNING_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),

            signature_verification: parse_bool("SLACK_SIGNATURE_VERIFICATION", true),

            signature_max_age: parse_number("SLACK_SIGNATURE_MAX_AGE", DEFAULT_SIGNATURE_MAX_AGE),

            ack_warning_ms: parse_number("UNHANDLED_ACK_WARNING_MS", DEFAULT_ACK_WARNING_MS),

            port: parse_number("PORT", 3000),
        }
    }

    /// Build the per-receiver settings, rejecting an unusable combination.
    pub fn receiver_settings(&self) -> Result<ReceiverSettings, ReceiverError> {
        if self.signature_verification && self.signing_secret.is_none() {
            return Err(ReceiverError::MissingSigningSecret);
        }

        if !self.signature_verification {
            warn!("signature_verification_disabled");
        }

        Ok(ReceiverSettings {
            signing_secret: self.signing_secret.clone().unwrap_or_default(),
            signature_verification: self.signature_verification,
            signature_max_age: self.signature_max_age,
            ack_warning: Duration::from_millis(self.ack_warning_ms),
        })
    }
}

/// Parse a numeric variable, warning and falling back on garbage.
fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "invalid_number_using_default");
            default
        }
    }
}

/// Parse a boolean flag such as "true", "0" or "no".
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "invalid_bool_using_default");
            default
        }
    }
}
