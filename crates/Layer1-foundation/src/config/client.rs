//! Client Config - 통합 설정
//!
//! 서버 주소, 폴링 간격, 상태 전달 방식 등을 관리하는 ClientConfig

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// 설정 파일명
pub const CLIENT_CONFIG_FILE: &str = "config.json";

/// 기본 서버 주소
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// 기본 API prefix
pub const DEFAULT_API_PREFIX: &str = "/api";

/// 기본 폴링 간격 (2초)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// Environment overrides
pub const ENV_SERVER_URL: &str = "CODEXEC_SERVER";
pub const ENV_DELIVERY: &str = "CODEXEC_DELIVERY";
pub const ENV_POLL_INTERVAL_MS: &str = "CODEXEC_POLL_INTERVAL_MS";

// ============================================================================
// Delivery Mode
// ============================================================================

/// How job status updates reach the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// `GET /status/{id}` on a fixed interval
    #[default]
    Poll,
    /// Status frames over `/ws/status/{id}`
    Push,
}

impl FromStr for DeliveryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" | "polling" => Ok(DeliveryMode::Poll),
            "push" | "ws" | "websocket" => Ok(DeliveryMode::Push),
            other => Err(Error::Config(format!("Unknown delivery mode: {}", other))),
        }
    }
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMode::Poll => write!(f, "poll"),
            DeliveryMode::Push => write!(f, "push"),
        }
    }
}

// ============================================================================
// Client Config (통합)
// ============================================================================

/// codexec 통합 설정
///
/// Every field is optional so that global, project and environment layers
/// can be merged; the `effective_*` accessors apply defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 백엔드 주소 (`http://host:port`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// API 경로 prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,

    /// 상태 폴링 간격 (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    /// HTTP 요청 타임아웃 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// 연결 타임아웃 (초) - HTTP 연결과 스트림 연결 모두
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    /// 상태 전달 방식
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryMode>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Self::default()
        }
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 + 환경 변수 병합 로드
    pub fn load() -> Result<Self> {
        let global = JsonStore::global().ok();
        let project = JsonStore::current_project().ok();
        let mut config = Self::load_from(global.as_ref(), project.as_ref())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 주어진 저장소들에서 병합 로드 (뒤의 것이 우선)
    pub fn load_from(global: Option<&JsonStore>, project: Option<&JsonStore>) -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Some(store) = global {
            if let Some(global_config) = store.load_optional::<ClientConfig>(CLIENT_CONFIG_FILE)? {
                debug!("Loaded global config from {}", store.base_dir().display());
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Some(store) = project {
            if let Some(project_config) = store.load_optional::<ClientConfig>(CLIENT_CONFIG_FILE)? {
                debug!("Loaded project config from {}", store.base_dir().display());
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    /// 환경 변수 적용
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
            self.server_url = Some(url);
        }
        if let Some(mode) = lookup(ENV_DELIVERY).filter(|v| !v.trim().is_empty()) {
            self.delivery = Some(mode.parse()?);
        }
        if let Some(ms) = lookup(ENV_POLL_INTERVAL_MS).filter(|v| !v.trim().is_empty()) {
            let ms = ms.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{} must be a number of milliseconds: {}", ENV_POLL_INTERVAL_MS, e))
            })?;
            self.poll_interval_ms = Some(ms);
        }
        Ok(())
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: ClientConfig) {
        if other.server_url.is_some() {
            self.server_url = other.server_url;
        }
        if other.api_prefix.is_some() {
            self.api_prefix = other.api_prefix;
        }
        if other.poll_interval_ms.is_some() {
            self.poll_interval_ms = other.poll_interval_ms;
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
        if other.connect_timeout_secs.is_some() {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        if other.delivery.is_some() {
            self.delivery = other.delivery;
        }
    }

    // ========================================================================
    // Effective values
    // ========================================================================

    pub fn effective_server_url(&self) -> &str {
        self.server_url
            .as_deref()
            .map(|s| s.trim_end_matches('/'))
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    /// API prefix, normalized to a leading slash and no trailing slash
    /// (empty string for "no prefix")
    pub fn effective_api_prefix(&self) -> String {
        let raw = self.api_prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX).trim();
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        // zero would spin; clamp to a sane floor
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS).max(10))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    pub fn effective_delivery(&self) -> DeliveryMode {
        self.delivery.unwrap_or_default()
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(prefix.into());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = Some(ms);
        self
    }

    pub fn delivery(mut self, mode: DeliveryMode) -> Self {
        self.delivery = Some(mode);
        self
    }
}

fn default_version() -> u32 {
    1
}
