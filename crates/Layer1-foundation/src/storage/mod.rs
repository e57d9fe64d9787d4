//! Storage module for codexec
//!
//! - `json`: JSON - 범용 파일 저장/로드
//! - `credential`: 로그인 토큰 영구 저장

mod credential;
mod json;

// JSON Storage (범용)
pub use json::{JsonStore, APP_DIR_NAME};

// Credential Storage
pub use credential::{CredentialStore, CREDENTIALS_FILE};
