//! Core Module - 핵심 타입
//!
//! ## 타입 계층
//!
//! - `language.rs`: 지원 언어 (Language)
//! - `types.rs`: 데이터 타입 (Credential, Artifact, Job, Session 등)

pub mod language;
pub mod types;

pub use language::Language;

// Auth
pub use types::{Credential, UserIdentity};

// Artifact
pub use types::{ArtifactContent, ArtifactDraft, ArtifactId, ArtifactSummary, ShareLink};

// Job
pub use types::{JobId, JobRecord, JobStatus, SubmitRequest};

// Interactive Session
pub use types::SessionId;
