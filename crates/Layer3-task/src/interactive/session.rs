//! Interactive Session - live stream state machine
//!
//! ```text
//! Live ──exit──────────▶ Closed(Exited)
//!  │ ──remote close────▶ Closed(RemoteClosed)
//!  └ ──transport error─▶ Closed(TransportError)
//! ```
//!
//! Every external event maps to exactly one transition. All paths into
//! `Closed`, including drop, go through `finish`, which closes the stream once.

use codexec_foundation::{Error, Language, Result, SessionId};
use codexec_transport::{DuplexStream, StreamEvent};
use tracing::{debug, info, warn};

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// 사용자가 종료
    Exited,
    /// 서버가 연결을 닫음
    RemoteClosed,
    /// 전송 오류
    TransportError(String),
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::Exited => write!(f, "exited"),
            CloseReason::RemoteClosed => write!(f, "closed by server"),
            CloseReason::TransportError(msg) => write!(f, "connection error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Live,
    Closed(CloseReason),
}

/// Something the session surface should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Program output, in arrival order
    Output(String),
    /// The session ended; no further events follow
    Closed(CloseReason),
}

/// A live interactive execution bound to one duplex stream
#[derive(Debug)]
pub struct InteractiveSession {
    id: SessionId,
    language: Language,
    stream: DuplexStream,
    transcript: String,
    state: SessionState,
}

impl InteractiveSession {
    /// Bind an open stream to its session id. The session starts `Live`.
    pub(crate) fn attach(id: SessionId, language: Language, stream: DuplexStream) -> Self {
        info!("Interactive {} session {} started", language, id);
        Self {
            id,
            language,
            stream,
            transcript: String::new(),
            state: SessionState::Live,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == SessionState::Live
    }

    pub fn close_reason(&self) -> Option<&CloseReason> {
        match &self.state {
            SessionState::Closed(reason) => Some(reason),
            SessionState::Live => None,
        }
    }

    /// Output and echoed input, in display order
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Send user input verbatim and echo it into the transcript
    pub fn send_input(&mut self, input: &str) -> Result<()> {
        if !self.is_live() {
            return Err(Error::Stream(format!("Session {} is closed", self.id)));
        }

        if let Err(e) = self.stream.send_text(input) {
            let reason = CloseReason::TransportError(e.to_string());
            self.finish(reason);
            return Err(Error::Stream(e.to_string()));
        }

        self.transcript.push_str(input);
        if !input.ends_with('\n') {
            self.transcript.push('\n');
        }
        Ok(())
    }

    /// Wait for the next inbound event.
    ///
    /// Returns `None` once the session is closed.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if !self.is_live() {
            return None;
        }

        let event = match self.stream.recv().await {
            Some(StreamEvent::Message(text)) => {
                self.transcript.push_str(&text);
                SessionEvent::Output(text)
            }
            Some(StreamEvent::Closed) | None => SessionEvent::Closed(self.finish(CloseReason::RemoteClosed)),
            Some(StreamEvent::Error(reason)) => {
                warn!("Session {} stream error: {}", self.id, reason);
                SessionEvent::Closed(self.finish(CloseReason::TransportError(reason)))
            }
        };
        Some(event)
    }

    /// Leave the session. `false` if it was already closed.
    pub fn exit(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.finish(CloseReason::Exited);
        true
    }

    /// Single disposer for every termination path
    fn finish(&mut self, reason: CloseReason) -> CloseReason {
        if let SessionState::Closed(existing) = &self.state {
            return existing.clone();
        }

        if self.stream.close() {
            debug!("Closed stream for session {}", self.id);
        }
        info!("Interactive session {} {}", self.id, reason);
        self.state = SessionState::Closed(reason.clone());
        reason
    }
}

impl Drop for InteractiveSession {
    fn drop(&mut self) {
        self.finish(CloseReason::Exited);
    }
}
