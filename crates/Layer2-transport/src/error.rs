//! Transport-specific error types
//!
//! TransportError는 HTTP/스트림 계층의 세부 에러를 관리합니다.
//! codexec_foundation::Error와의 변환을 지원합니다.

use codexec_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur while talking to the backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Network error (connection refused, DNS, reset, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Request or connect timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Success status, but the body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built (bad URL, unserializable body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Duplex stream failure
    #[error("Stream error: {0}")]
    Stream(String),
}

impl TransportError {
    /// Create from HTTP status code and body
    ///
    /// The message is the server's `detail` field when the body carries one,
    /// otherwise a generic message keyed by the status code.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let message =
            extract_detail(body).unwrap_or_else(|| format!("HTTP error! status: {}", status));
        TransportError::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Try to extract a human-readable message from an error body
///
/// Handles `{"detail": "..."}` and validation errors of the form
/// `{"detail": [{"msg": "..."}]}`.
fn extract_detail(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let detail = json.get("detail")?;

    if let Some(text) = detail.as_str() {
        let text = text.trim();
        return (!text.is_empty()).then(|| text.to_string());
    }

    detail
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item.get("msg"))
        .and_then(|msg| msg.as_str())
        .map(|msg| msg.to_string())
}

// ============================================================================
// codexec_foundation::Error 변환
// ============================================================================

impl From<TransportError> for FoundationError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401, message } => FoundationError::Auth(message),
            TransportError::Status { status: 404, message } => FoundationError::NotFound(message),
            TransportError::Status { status, message } => FoundationError::Transport {
                status: Some(status),
                message,
            },
            TransportError::Network(msg) | TransportError::Timeout(msg) => {
                FoundationError::Transport {
                    status: None,
                    message: msg,
                }
            }
            TransportError::InvalidResponse(msg) => FoundationError::Protocol(msg),
            TransportError::InvalidRequest(msg) => FoundationError::InvalidInput(msg),
            TransportError::Stream(msg) => FoundationError::Stream(msg),
        }
    }
}
