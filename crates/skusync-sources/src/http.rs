//! Shared HTTP plumbing for the adapters
//!
//! Maps transport-level failures into the [`SourceError`] taxonomy in one
//! place so the adapters only deal with their payload shapes.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use skusync_core::ports::source_adapter::SourceError;

/// Longest error-body excerpt carried into an error message
const BODY_SNIPPET_LEN: usize = 200;

/// Builds a reqwest client with the configured per-request timeout
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SourceError::Config(format!("failed to build HTTP client: {e}")))
}

/// Maps a transport error (no response received) to a source error
///
/// Timeouts and connection failures are transient; anything else is a
/// non-retryable API failure.
pub(crate) fn transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() || err.is_connect() {
        SourceError::Transient {
            status: None,
            message: err.to_string(),
        }
    } else {
        SourceError::Api {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Checks the response status and decodes a JSON body
///
/// Error statuses are classified via [`SourceError::from_status`], carrying
/// a short excerpt of the body for diagnostics.
pub(crate) async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, SourceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::from_status(
            status.as_u16(),
            truncate(&body, BODY_SNIPPET_LEN),
        ));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| SourceError::Decode(e.to_string()))
}

// ============================================================================
// Raw payload field readers
// ============================================================================

/// Reads a string field, tolerating numeric values
pub(crate) fn json_str(raw: &serde_json::Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a numeric field, tolerating stringified numbers
pub(crate) fn json_f64(raw: &serde_json::Value, key: &str) -> Option<f64> {
    match raw.get(key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a boolean field, tolerating 0/1 and "true"/"false"
pub(crate) fn json_bool(raw: &serde_json::Value, key: &str) -> Option<bool> {
    match raw.get(key)? {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => n.as_i64().map(|v| v != 0),
        serde_json::Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
