//! Error types for codexec
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;
use tracing::warn;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when a failure carries nothing a user could act on
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Message shown when the server answered with something the client cannot read
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from server";

/// codexec 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 전송 관련
    // ========================================================================
    /// HTTP/network failure. `status` is `None` when no response arrived.
    #[error("Transport error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    // ========================================================================
    // 인증 관련
    // ========================================================================
    #[error("Authentication error: {0}")]
    Auth(String),

    // ========================================================================
    // 리소스 관련
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // 인터랙티브 세션 / 스트림 관련
    // ========================================================================
    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Transport 에러 생성 헬퍼
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Transport {
            status,
            message: message.into(),
        }
    }

    /// 인증 실패로 강제 로그아웃이 필요한 에러인지 확인
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// HTTP status, if the failure came from a server response
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            Error::Auth(_) => Some(401),
            Error::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// 사용자에게 보여줄 메시지
    ///
    /// Server-provided messages pass through as-is. Failures without one
    /// (dropped connections, I/O, serialization) collapse to
    /// [`UNKNOWN_ERROR_MESSAGE`], and undecodable replies to
    /// [`UNEXPECTED_RESPONSE_MESSAGE`]; the detail only goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport {
                status: Some(_),
                message,
            } if !message.trim().is_empty() => message.clone(),
            Error::Transport { .. } | Error::Io(_) | Error::Json(_) => {
                UNKNOWN_ERROR_MESSAGE.to_string()
            }
            Error::Protocol(detail) => {
                warn!("Unexpected response: {}", detail);
                UNEXPECTED_RESPONSE_MESSAGE.to_string()
            }
            Error::Auth(msg)
            | Error::NotFound(msg)
            | Error::Handshake(msg)
            | Error::Stream(msg)
            | Error::InvalidInput(msg)
            | Error::Config(msg)
            | Error::Storage(msg) => {
                if msg.trim().is_empty() {
                    UNKNOWN_ERROR_MESSAGE.to_string()
                } else {
                    msg.clone()
                }
            }
        }
    }
}
