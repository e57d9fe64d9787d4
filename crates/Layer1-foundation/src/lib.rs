//! # codexec-foundation
//!
//! Foundation layer for codexec:
//! - Core: 공용 타입 (Language, Credential, Artifact, Job, Session)
//! - Error: 에러 분류 (Transport, Auth, NotFound, Handshake, Stream, Protocol)
//! - Storage: JsonStore (범용), CredentialStore (로그인 토큰)
//! - Config: 통합 설정 (ClientConfig)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  codexec-cli                                            │
//! │     │                                                   │
//! │     ├── codexec-account (SessionAuth, FileRegistry)     │
//! │     └── codexec-task    (JobController, Interactive)    │
//! │                     │                                   │
//! │                     ▼                                   │
//! │          codexec-transport (HTTP + duplex streams)      │
//! │                     │                                   │
//! │                     ▼                                   │
//! │          codexec-foundation (types, errors, config)     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result, UNEXPECTED_RESPONSE_MESSAGE, UNKNOWN_ERROR_MESSAGE};

// ============================================================================
// Core (핵심 타입)
// ============================================================================
pub use self::core::{
    // Artifact
    ArtifactContent,
    ArtifactDraft,
    ArtifactId,
    ArtifactSummary,
    // Auth
    Credential,
    // Job
    JobId,
    JobRecord,
    JobStatus,
    // Language
    Language,
    // Interactive Session
    SessionId,
    ShareLink,
    SubmitRequest,
    UserIdentity,
};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{ClientConfig, DeliveryMode, CLIENT_CONFIG_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{CredentialStore, JsonStore, CREDENTIALS_FILE};
