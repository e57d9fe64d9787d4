//! Session Auth State - 인증 상태 관리
//!
//! `SessionAuth` is the only writer of the current credential. Every other
//! component receives a [`CredentialReader`] and reads the latest value from it.
//!
//! ```text
//! Unauthenticated ──login──▶ PendingIdentity ──resolved──▶ Authenticated
//!        ▲                         │                            │
//!        └──── resolution fails ───┘                            │
//!        └──────────────── logout / recheck fails ──────────────┘
//! ```
//!
//! Each credential change bumps a generation counter. A resolution result is
//! applied only while its generation is still current, so the latest
//! credential always wins.

use codexec_foundation::{Credential, CredentialStore, Error, Result, UserIdentity};
use codexec_transport::{HttpTransport, RequestOptions};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

// ============================================================================
// State
// ============================================================================

/// 인증 상태
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// 로그인 전 (또는 로그아웃 후)
    #[default]
    Unauthenticated,
    /// Credential 수신, identity 확인 중
    PendingIdentity,
    /// 확인 완료
    Authenticated(UserIdentity),
}

impl AuthState {
    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

// ============================================================================
// Credential Reader
// ============================================================================

/// Read-only view of the current credential
#[derive(Debug, Clone)]
pub struct CredentialReader {
    rx: watch::Receiver<Option<Credential>>,
}

impl CredentialReader {
    /// Latest credential (cloned; never held across an await)
    pub fn current(&self) -> Option<Credential> {
        self.rx.borrow().clone()
    }

    pub fn is_present(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait until the credential changes. `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Reader over a fixed credential with no writer (batch tools, tests)
    pub fn fixed(credential: Option<Credential>) -> Self {
        let (_tx, rx) = watch::channel(credential);
        Self { rx }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    username: &'a str,
    password: &'a str,
}

// ============================================================================
// Session Auth
// ============================================================================

/// Owner of the credential and the resolved identity
pub struct SessionAuth {
    transport: HttpTransport,
    store: Option<CredentialStore>,
    credential_tx: watch::Sender<Option<Credential>>,
    state_tx: watch::Sender<AuthState>,
    /// 현재 credential 세대. 전이 적용은 이 락 안에서만 일어난다.
    generation: Mutex<u64>,
}

impl SessionAuth {
    /// Credential persisted through `store`
    pub fn new(transport: HttpTransport, store: CredentialStore) -> Self {
        Self::build(transport, Some(store))
    }

    /// Credential kept in memory only
    pub fn in_memory(transport: HttpTransport) -> Self {
        Self::build(transport, None)
    }

    fn build(transport: HttpTransport, store: Option<CredentialStore>) -> Self {
        let (credential_tx, _) = watch::channel(None);
        let (state_tx, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            transport,
            store,
            credential_tx,
            state_tx,
            generation: Mutex::new(0),
        }
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    /// Read-only credential handle for dependent components
    pub fn credentials(&self) -> CredentialReader {
        CredentialReader {
            rx: self.credential_tx.subscribe(),
        }
    }

    /// Auth state observer
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Resolved identity, if authenticated
    pub fn identity(&self) -> Option<UserIdentity> {
        self.state_tx.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state_tx.borrow().is_authenticated()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Install a credential and resolve it to an identity.
    ///
    /// On resolution failure the credential is discarded (memory and storage)
    /// and the call fails with [`Error::Auth`].
    pub async fn login(&self, credential: Credential) -> Result<UserIdentity> {
        if credential.is_blank() {
            return Err(Error::InvalidInput("Credential must not be empty".to_string()));
        }

        let generation = {
            let mut current = self.generation.lock().await;
            *current += 1;
            self.credential_tx.send_replace(Some(credential.clone()));
            self.persist(Some(&credential));
            self.state_tx.send_replace(AuthState::PendingIdentity);
            *current
        };

        debug!("Resolving identity (generation {})", generation);
        self.resolve(generation, credential).await
    }

    /// Drop the credential and clear persisted state
    pub async fn logout(&self) -> Result<()> {
        let mut current = self.generation.lock().await;
        *current += 1;
        self.credential_tx.send_replace(None);
        self.state_tx.send_replace(AuthState::Unauthenticated);
        info!("Logged out");

        match &self.store {
            Some(store) => store.store(None),
            None => Ok(()),
        }
    }

    /// Load the persisted credential, if any, and resolve it
    pub async fn restore(&self) -> Result<Option<UserIdentity>> {
        let Some(credential) = self.store.as_ref().and_then(|store| store.load()) else {
            debug!("No persisted credential");
            return Ok(None);
        };
        self.login(credential).await.map(Some)
    }

    /// Re-resolve the current credential.
    ///
    /// `Ok(None)` when there is no credential to check.
    pub async fn recheck(&self) -> Result<Option<UserIdentity>> {
        let (generation, credential) = {
            let current = self.generation.lock().await;
            let credential = self.credential_tx.borrow().clone();
            (*current, credential)
        };

        match credential {
            Some(credential) => self.resolve(generation, credential).await.map(Some),
            None => Ok(None),
        }
    }

    /// Exchange username/password for a credential, then log in
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<UserIdentity> {
        let token: TokenResponse = self
            .transport
            .request_json(
                "/token",
                RequestOptions::post().form([("username", username), ("password", password)]),
            )
            .await?;

        info!("Signed in as {}", username);
        self.login(Credential::new(token.access_token)).await
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::InvalidInput(
                "Username and password are required".to_string(),
            ));
        }

        self.transport
            .request_empty(
                "/register",
                RequestOptions::post().json(&Registration { username, password }),
            )
            .await?;
        info!("Registered {}", username);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn resolve(&self, generation: u64, credential: Credential) -> Result<UserIdentity> {
        let result = self
            .transport
            .request_json::<UserIdentity>("/users/me", RequestOptions::get().bearer(Some(&credential)))
            .await;

        let current = self.generation.lock().await;
        if *current != generation {
            debug!(
                "Discarding identity result for generation {} (current {})",
                generation, *current
            );
            return Err(Error::Auth(
                "Credential was replaced before it could be verified".to_string(),
            ));
        }

        match result {
            Ok(identity) => {
                info!("Authenticated as {}", identity.username);
                self.state_tx
                    .send_replace(AuthState::Authenticated(identity.clone()));
                Ok(identity)
            }
            Err(e) => {
                let err = Error::from(e);
                warn!("Identity resolution failed, logging out: {}", err);
                self.credential_tx.send_replace(None);
                self.state_tx.send_replace(AuthState::Unauthenticated);
                self.persist(None);
                Err(Error::Auth(err.user_message()))
            }
        }
    }

    fn persist(&self, credential: Option<&Credential>) {
        if let Some(store) = &self.store {
            if let Err(e) = store.store(credential) {
                error!("Failed to persist credential state: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for SessionAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuth")
            .field("base_url", &self.transport.base_url())
            .field("state", &*self.state_tx.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_state_identity() {
        let state = AuthState::Authenticated(UserIdentity {
            username: "ana".into(),
        });
        assert!(state.is_authenticated());
        assert_eq!(state.identity().map(|i| i.username.as_str()), Some("ana"));
        assert_eq!(AuthState::PendingIdentity.identity(), None);
        assert_eq!(AuthState::default(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_fixed_reader() {
        let reader = CredentialReader::fixed(Some(Credential::new("t")));
        assert_eq!(reader.current(), Some(Credential::new("t")));
        assert!(reader.is_present());
        assert!(!CredentialReader::fixed(None).is_present());
    }

    #[tokio::test]
    async fn test_blank_login_rejected() {
        let auth = SessionAuth::in_memory(HttpTransport::new("http://localhost:8000", "/api").unwrap());
        let err = auth.login(Credential::new("  ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(auth.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_without_login() {
        let auth = SessionAuth::in_memory(HttpTransport::new("http://localhost:8000", "/api").unwrap());
        let reader = auth.credentials();
        auth.logout().await.unwrap();
        assert!(!reader.is_present());
        assert_eq!(auth.recheck().await.unwrap(), None);
    }
}
