//! Slack request signature verification.
//!
//! Slack signs every request using HMAC-SHA256.
//! Reference: https://api.slack.com/authentication/verifying-requests-from-slack

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `v0=<hex digest>`.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Header carrying the request time in Unix epoch seconds.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Verify a Slack request signature against the system clock.
///
/// See [`verify_signature_at`] for the rules.
pub fn verify_signature(
    signing_secret: &str,
    raw_body: impl AsRef<[u8]>,
    signature: Option<&str>,
    timestamp: Option<&str>,
    max_age_seconds: u64,
) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    verify_signature_at(signing_secret, raw_body, signature, timestamp, now, max_age_seconds)
}

/// Verify a Slack request signature at a given point in time.
///
/// Slack requests include two headers for verification:
/// - `X-Slack-Request-Timestamp`: Unix epoch seconds when the request was sent
/// - `X-Slack-Signature`: `<version>=<hex>` where the hex is the HMAC-SHA256 of
///   `<version>:<timestamp>:<raw body>`
///
/// The version is taken from the header verbatim and is not itself checked.
/// Only stale timestamps are rejected; a timestamp in the future passes.
///
/// # Returns
///
/// `true` if the signature is valid and not stale, `false` otherwise.
pub fn verify_signature_at(
    signing_secret: &str,
    raw_body: impl AsRef<[u8]>,
    signature: Option<&str>,
    timestamp: Option<&str>,
    now_secs: u64,
    max_age_seconds: u64,
) -> bool {
    let (signature, timestamp) = match (signature, timestamp) {
        (Some(signature), Some(timestamp)) => (signature, timestamp),
        _ => {
            warn!(
                has_signature = signature.is_some(),
                has_timestamp = timestamp.is_some(),
                "signature_missing_headers"
            );
            return false;
        }
    };

    let request_time: u64 = match timestamp.trim().parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(timestamp = %timestamp, "signature_invalid_timestamp");
            return false;
        }
    };

    // Replay window: reject anything older than max_age
    if request_time < now_secs.saturating_sub(max_age_seconds) {
        warn!(
            request_time = request_time,
            current_time = now_secs,
            max_age_seconds = max_age_seconds,
            "request_timestamp_stale"
        );
        return false;
    }

    let (version, hash) = match signature.split_once('=') {
        Some(parts) => parts,
        None => {
            warn!("signature_malformed");
            return false;
        }
    };

    let provided = match hex::decode(hash) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(version = %version, "signature_not_hex");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(signing_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("signature_invalid_key");
            return false;
        }
    };

    mac.update(format!("{}:{}:", version, timestamp).as_bytes());
    mac.update(raw_body.as_ref());

    // verify_slice compares in constant time
    let valid = mac.verify_slice(&provided).is_ok();

    if !valid {
        warn!(version = %version, "signature_mismatch");
    }

    valid
}
