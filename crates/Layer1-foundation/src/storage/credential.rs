//! Credential 영구 저장
//!
//! The bearer token survives process restarts in `credentials.json`.
//! Writing `None` removes the file so nothing lingers after logout.

use super::JsonStore;
use crate::core::Credential;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 자격 증명 파일명
pub const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    token: Credential,
}

/// Durable storage for the current credential
#[derive(Debug, Clone)]
pub struct CredentialStore {
    store: JsonStore,
}

impl CredentialStore {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// 글로벌 저장소 사용
    pub fn global() -> Result<Self> {
        Ok(Self::new(JsonStore::global()?))
    }

    /// Persisted credential, if any.
    ///
    /// An unreadable or blank file counts as "no credential".
    pub fn load(&self) -> Option<Credential> {
        match self.store.load_optional::<StoredCredential>(CREDENTIALS_FILE) {
            Ok(Some(stored)) if !stored.token.is_blank() => Some(stored.token),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unreadable credential file: {}", e);
                None
            }
        }
    }

    /// Persist `Some`, clear on `None`
    pub fn store(&self, credential: Option<&Credential>) -> Result<()> {
        match credential {
            Some(token) => {
                debug!("Persisting credential");
                self.store.save_private(
                    CREDENTIALS_FILE,
                    &StoredCredential {
                        token: token.clone(),
                    },
                )
            }
            None => {
                debug!("Clearing persisted credential");
                self.store.remove(CREDENTIALS_FILE)
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.store.exists(CREDENTIALS_FILE)
    }
}
