//! Core Types - 공용 타입 정의
//!
//! 모든 레이어에서 공통으로 사용하는 타입들

use crate::core::Language;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Credential - 인증 토큰
// ============================================================================

/// Opaque bearer token
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

/// Identity resolved from a valid credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub username: String,
}

// ============================================================================
// Artifact - 저장된 코드
// ============================================================================

/// Server-assigned artifact identifier
///
/// The server currently sends integers; the client only ever echoes the value
/// back, so it is kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ArtifactId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => ArtifactId(n.to_string()),
            Raw::Text(s) => ArtifactId(s),
        })
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of a save request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDraft {
    pub filename: String,
    pub language: Language,
    pub code: String,
}

impl ArtifactDraft {
    pub fn new(filename: impl Into<String>, language: Language, code: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            language,
            code: code.into(),
        }
    }
}

/// Listing entry (and the response of a save)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub id: ArtifactId,
    pub filename: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// RFC 3339, or a naive timestamp taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

/// Full artifact content, as returned by fetch and fetch-shared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactContent {
    pub filename: String,
    pub language: Language,
    pub code: String,
    /// Only present on shared fetches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
}

/// Unprivileged, read-only reference to an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
    pub share_id: String,
}

impl ShareLink {
    /// Parse a share URL (`.../files/shared/<id>`) or a bare share id.
    ///
    /// Returns `None` when no id segment can be found.
    pub fn parse(reference: &str) -> Option<Self> {
        let trimmed = reference.trim();
        let without_suffix = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        let share_id = without_suffix.rsplit('/').next().unwrap_or_default();
        if share_id.is_empty() || share_id.contains(':') {
            return None;
        }

        Some(Self {
            url: trimmed.to_string(),
            share_id: share_id.to_string(),
        })
    }
}

// ============================================================================
// Job - 배치 실행
// ============================================================================

/// Execution job identifier, assigned by the server at submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status keyword reported by the execution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Submitted,
    Queued,
    Running,
    Completed,
    Error,
    /// Anything the client does not recognize
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// Batch execution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub code: String,
    pub language: Language,
    #[serde(default)]
    pub stdin: Option<String>,
}

impl SubmitRequest {
    pub fn new(code: impl Into<String>, language: Language) -> Self {
        Self {
            code: code.into(),
            language,
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }
}

/// Job record as listed by `/submissions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
}

// ============================================================================
// Interactive Session
// ============================================================================

/// Interactive session identifier from the handshake
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("secret-token");
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("secret"));
        assert_eq!(cred.token(), "secret-token");
    }

    #[test]
    fn test_artifact_id_accepts_numbers_and_strings() {
        let summary: ArtifactSummary = serde_json::from_str(
            r#"{"id": 42, "filename": "hello", "language": "python", "owner_username": "ana",
                "created_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(summary.id.as_str(), "42");
        assert_eq!(summary.owner_username.as_deref(), Some("ana"));

        let naive: ArtifactSummary = serde_json::from_str(
            r#"{"id": 7, "filename": "a", "language": "c", "created_at": "2024-05-01T10:00:00.123456"}"#,
        )
        .unwrap();
        assert_eq!(
            naive.created_at.map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00.123456+00:00".to_string())
        );

        let id: ArtifactId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id, ArtifactId::new("abc"));
    }

    #[test]
    fn test_share_link_parse() {
        let link = ShareLink::parse("http://localhost:3000/files/shared/Ab3dE9xQ").unwrap();
        assert_eq!(link.share_id, "Ab3dE9xQ");

        let link = ShareLink::parse("http://host/files/shared/Ab3dE9xQ/?ref=x").unwrap();
        assert_eq!(link.share_id, "Ab3dE9xQ");

        let link = ShareLink::parse("Ab3dE9xQ").unwrap();
        assert_eq!(link.share_id, "Ab3dE9xQ");

        assert!(ShareLink::parse("").is_none());
        assert!(ShareLink::parse("http://").is_none());
    }

    #[test]
    fn test_job_status_unknown_keyword() {
        let status: JobStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, JobStatus::Unknown);
        assert!(!status.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_submit_request_serializes_null_stdin() {
        let req = SubmitRequest::new("print(1)", Language::Python);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["language"], "python");
        assert!(value["stdin"].is_null());
    }
}
