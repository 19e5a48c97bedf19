//! Response values returned by the request client.

use serde::Deserialize;

/// A successful (HTTP 200) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status line, e.g. "200 OK".
    pub status: String,
    pub status_code: u16,
    /// Raw response body. May be empty.
    pub body: Vec<u8>,
}

/// Error payload returned by the KMS server on non-200 responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(rename = "errMessage", default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Extract a non-empty `errMessage` from `body`, if it has one.
    pub fn message_from(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorResponse>(body)
            .ok()
            .and_then(|resp| resp.message)
            .filter(|msg| !msg.is_empty())
    }
}

/// Render a status as an HTTP status line ("404 Not Found").
pub(crate) fn status_line(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_str().to_string(),
    }
}
