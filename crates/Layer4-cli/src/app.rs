//! Shared wiring for all commands

use anyhow::{bail, Result};
use codexec_account::{FileRegistry, SessionAuth};
use codexec_foundation::{ClientConfig, CredentialStore, DeliveryMode, UserIdentity};
use codexec_task::{InteractiveBridge, JobController};
use codexec_transport::HttpTransport;

/// Configured clients plus the session auth state
pub struct App {
    pub config: ClientConfig,
    pub transport: HttpTransport,
    pub auth: SessionAuth,
}

impl App {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config)?;
        let auth = SessionAuth::new(transport.clone(), CredentialStore::global()?);
        Ok(Self {
            config,
            transport,
            auth,
        })
    }

    /// Restore the saved credential; fail when there is none or it is no longer valid
    pub async fn require_login(&self) -> Result<UserIdentity> {
        match self.auth.restore().await {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => bail!("Not logged in. Run `codexec login` first."),
            Err(e) => bail!(
                "Session is no longer valid ({}). Run `codexec login` again.",
                e.user_message()
            ),
        }
    }

    pub fn files(&self) -> FileRegistry {
        FileRegistry::new(self.transport.clone(), self.auth.credentials())
    }

    /// Job controller; `delivery` overrides the configured mechanism
    pub fn jobs(&self, delivery: Option<DeliveryMode>) -> JobController {
        let config = match delivery {
            Some(mode) => self.config.clone().delivery(mode),
            None => self.config.clone(),
        };
        JobController::from_config(self.transport.clone(), self.auth.credentials(), &config)
    }

    pub fn bridge(&self) -> InteractiveBridge {
        InteractiveBridge::websocket(self.transport.clone(), self.auth.credentials())
    }
}
