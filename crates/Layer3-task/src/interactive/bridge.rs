//! Interactive Bridge - 2단계 세션 생성
//!
//! Phase 1 asks the server for a session id (`POST /repl/start`). Phase 2
//! opens `/ws/interactive/{session_id}` with that id. A failure in either
//! phase is a handshake failure and leaves nothing allocated.

use super::session::InteractiveSession;
use codexec_account::CredentialReader;
use codexec_foundation::{Error, Language, Result, SessionId};
use codexec_transport::{path_segment, HttpTransport, RequestOptions, StreamConnector, WsConnector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct StartRequest {
    language: Language,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    session_id: Option<String>,
}

/// Creates interactive sessions
#[derive(Clone)]
pub struct InteractiveBridge {
    transport: HttpTransport,
    credentials: CredentialReader,
    connector: Arc<dyn StreamConnector>,
}

impl InteractiveBridge {
    pub fn new(
        transport: HttpTransport,
        credentials: CredentialReader,
        connector: Arc<dyn StreamConnector>,
    ) -> Self {
        Self {
            transport,
            credentials,
            connector,
        }
    }

    /// Bridge over WebSocket streams derived from the transport's base URL
    pub fn websocket(transport: HttpTransport, credentials: CredentialReader) -> Self {
        let connector = WsConnector::new(transport.clone());
        Self::new(transport, credentials, Arc::new(connector))
    }

    /// Start a brand-new session. Session ids are never reused.
    pub async fn start(&self, language: Language) -> Result<InteractiveSession> {
        if !language.is_interactive() {
            return Err(Error::InvalidInput(format!(
                "{} does not support interactive mode",
                language.display_name()
            )));
        }

        let session_id = self.handshake(language).await?;

        let endpoint = format!("/ws/interactive/{}", path_segment(session_id.as_str()));
        let stream = self.connector.open(&endpoint).await.map_err(|e| {
            warn!("Could not attach to session {}: {}", session_id, e);
            Error::Handshake(format!("Could not connect to interactive session: {}", e))
        })?;

        Ok(InteractiveSession::attach(session_id, language, stream))
    }

    async fn handshake(&self, language: Language) -> Result<SessionId> {
        let options = RequestOptions::post()
            .json(&StartRequest { language })
            .bearer(self.credentials.current().as_ref());

        let response: StartResponse = self
            .transport
            .request_json("/repl/start", options)
            .await
            .map_err(|e| {
                let err = Error::from(e);
                warn!("Session handshake failed: {}", err);
                Error::Handshake(err.user_message())
            })?;

        match response.session_id {
            Some(id) if !id.trim().is_empty() => {
                debug!("Handshake returned session {}", id);
                Ok(SessionId::new(id))
            }
            _ => Err(Error::Handshake(
                "Server did not return a session id".to_string(),
            )),
        }
    }
}
