//! Bearer credential decoding.
//!
//! Credentials are opaque three-segment dot-separated tokens; only the
//! middle segment is ever interpreted, as base64url-encoded JSON. Every
//! function here returns `None` on any malformed input - a credential that
//! cannot be decoded is a credential without a known expiry, never an error.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::Value;

/// Decode the payload segment of a bearer credential as JSON.
pub fn decode_payload(token: &str) -> Option<Value> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 2 {
        return None;
    }
    // Tokens arrive unpadded, but tolerate padded output from older backends.
    let payload = parts[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Extract the expiry from a credential, converted to epoch milliseconds.
///
/// Returns `None` when the credential is malformed or carries no `exp`
/// claim; callers treat that as "never expires".
pub fn decode_expiry_ms(token: &str) -> Option<i64> {
    let payload = decode_payload(token)?;
    let exp = payload.get("exp")?;
    let secs = exp
        .as_i64()
        .or_else(|| exp.as_f64().map(|f| f as i64))?;
    Some(secs * 1000)
}

/// Extract the subject identifier from a credential, if present.
pub fn decode_subject(token: &str) -> Option<String> {
    let payload = decode_payload(token)?;
    match payload.get("sub")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
