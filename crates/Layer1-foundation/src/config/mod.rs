//! Config - 통합 설정 관리
//!
//! - `client.rs` - ClientConfig 통합 설정 (서버 주소, 폴링, 전달 방식)

mod client;

pub use client::{
    ClientConfig, DeliveryMode, CLIENT_CONFIG_FILE, DEFAULT_API_PREFIX, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SERVER_URL, ENV_DELIVERY, ENV_POLL_INTERVAL_MS, ENV_SERVER_URL,
};
