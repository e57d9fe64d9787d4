//! Duplex Stream - 양방향 메시지 채널
//!
//! A [`DuplexStream`] is the client end of a long-lived bidirectional
//! connection. The socket itself is driven by background reader/writer tasks;
//! the owner only sees two ordered channels:
//!
//! - inbound: [`StreamEvent`]s in arrival order
//! - outbound: text frames and a single close request
//!
//! [`duplex_pair`] creates a stream together with its [`StreamPeer`] (the far
//! end), which is what [`WsConnector`] wires to a real WebSocket and what tests
//! drive directly.

use crate::error::TransportError;
use crate::http::HttpTransport;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Default timeout for establishing a stream
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Events
// ============================================================================

/// Inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One text frame (binary frames are decoded lossily)
    Message(String),
    /// The remote side closed the connection
    Closed,
    /// Transport-level failure; no further events follow
    Error(String),
}

/// Outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

// ============================================================================
// Duplex Stream (client end)
// ============================================================================

/// Client end of a duplex connection
///
/// `close` is idempotent and also runs on drop, so the underlying connection
/// is released on every path that discards the stream.
pub struct DuplexStream {
    label: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    inbound: mpsc::UnboundedReceiver<StreamEvent>,
    closed: bool,
}

impl DuplexStream {
    /// Send a text frame verbatim
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Stream(format!("{} is closed", self.label)));
        }
        self.outbound
            .send(Outbound::Text(text.into()))
            .map_err(|_| TransportError::Stream(format!("{} connection dropped", self.label)))
    }

    /// Next inbound event; `None` once closed locally or when the peer is gone
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.closed {
            return None;
        }
        self.inbound.recv().await
    }

    /// Close the stream.
    ///
    /// Returns `true` only for the call that actually closed it.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        // peer may already be gone
        let _ = self.outbound.send(Outbound::Close);
        self.inbound.close();
        debug!("Closed stream {}", self.label);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for DuplexStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DuplexStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplexStream")
            .field("label", &self.label)
            .field("closed", &self.closed)
            .finish()
    }
}

// ============================================================================
// Stream Peer (far end)
// ============================================================================

/// Far end of a [`DuplexStream`]
pub struct StreamPeer {
    inbound: mpsc::UnboundedSender<StreamEvent>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl StreamPeer {
    /// Deliver a text frame to the client end. `false` if it is gone.
    pub fn emit_text(&self, text: impl Into<String>) -> bool {
        self.inbound.send(StreamEvent::Message(text.into())).is_ok()
    }

    /// Signal a remote close
    pub fn emit_close(&self) -> bool {
        self.inbound.send(StreamEvent::Closed).is_ok()
    }

    /// Signal a transport error
    pub fn emit_error(&self, reason: impl Into<String>) -> bool {
        self.inbound.send(StreamEvent::Error(reason.into())).is_ok()
    }

    /// Wait for the next frame sent by the client end
    pub async fn next_outbound(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    /// Everything the client end has sent so far
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Whether the client end has been dropped or closed
    pub fn is_client_gone(&self) -> bool {
        self.inbound.is_closed()
    }
}

/// Create a connected stream/peer pair
pub fn duplex_pair(label: impl Into<String>) -> (DuplexStream, StreamPeer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let stream = DuplexStream {
        label: label.into(),
        outbound: outbound_tx,
        inbound: inbound_rx,
        closed: false,
    };
    let peer = StreamPeer {
        inbound: inbound_tx,
        outbound: outbound_rx,
    };
    (stream, peer)
}

// ============================================================================
// Connector
// ============================================================================

/// Opens duplex streams for an endpoint path (`/ws/status/{id}`, ...)
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn open(&self, endpoint: &str) -> Result<DuplexStream, TransportError>;
}

/// WebSocket connector
#[derive(Debug, Clone)]
pub struct WsConnector {
    transport: HttpTransport,
    connect_timeout: Duration,
}

impl WsConnector {
    /// Stream URLs are derived from the transport's base URL
    pub fn new(transport: HttpTransport) -> Self {
        Self {
            transport,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url_for(&self, endpoint: &str) -> Result<Url, TransportError> {
        self.transport.stream_url(endpoint)
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn open(&self, endpoint: &str) -> Result<DuplexStream, TransportError> {
        let url = self.url_for(endpoint)?;
        info!("Opening stream {}", url.path());

        let (ws_stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::Timeout(format!("Timeout connecting to {}", url.path())))?
            .map_err(|e| TransportError::Stream(format!("WebSocket connect failed: {}", e)))?;

        let (mut write, mut read) = ws_stream.split();
        let (stream, peer) = duplex_pair(url.path());
        let StreamPeer {
            inbound,
            outbound: mut outbound_rx,
        } = peer;

        // writer task: client end → socket
        let writer_label = url.path().to_string();
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                match frame {
                    Outbound::Text(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!("Write to {} failed: {}", writer_label, e);
                            break;
                        }
                    }
                    Outbound::Close => break,
                }
            }
            // either an explicit close or the client end was dropped
            let _ = write.send(Message::Close(None)).await;
            let _ = write.close().await;
            debug!("Writer for {} finished", writer_label);
        });

        // reader task: socket → client end, in arrival order.
        // Stops as soon as the client end closes, even if the server never
        // answers the close frame.
        let reader_label = url.path().to_string();
        tokio::spawn(async move {
            let terminal = loop {
                let next = tokio::select! {
                    next = read.next() => next,
                    _ = inbound.closed() => {
                        debug!("Reader for {} stopped: stream closed locally", reader_label);
                        return;
                    }
                };
                let event = match next {
                    Some(Ok(Message::Text(text))) => StreamEvent::Message(text),
                    Some(Ok(Message::Binary(data))) => {
                        StreamEvent::Message(String::from_utf8_lossy(&data).into_owned())
                    }
                    Some(Ok(Message::Close(_))) | None => break StreamEvent::Closed,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break StreamEvent::Error(e.to_string()),
                };
                if inbound.send(event).is_err() {
                    // client end closed; stop reading
                    debug!("Reader for {} stopped: stream closed locally", reader_label);
                    return;
                }
            };
            let _ = inbound.send(terminal);
            debug!("Reader for {} finished", reader_label);
        });

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (mut stream, peer) = duplex_pair("test");
        peer.emit_text("a");
        peer.emit_text("b");
        peer.emit_close();

        assert_eq!(stream.recv().await, Some(StreamEvent::Message("a".into())));
        assert_eq!(stream.recv().await, Some(StreamEvent::Message("b".into())));
        assert_eq!(stream.recv().await, Some(StreamEvent::Closed));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut stream, mut peer) = duplex_pair("test");
        stream.send_text("2+2\n").unwrap();

        assert!(stream.close());
        assert!(!stream.close());
        drop(stream);

        assert_eq!(
            peer.drain_outbound(),
            vec![Outbound::Text("2+2\n".into()), Outbound::Close]
        );
        assert!(peer.is_client_gone());
    }

    #[tokio::test]
    async fn test_drop_closes() {
        let (stream, mut peer) = duplex_pair("test");
        drop(stream);
        assert_eq!(peer.next_outbound().await, Some(Outbound::Close));
        assert_eq!(peer.next_outbound().await, None);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (mut stream, peer) = duplex_pair("test");
        stream.close();
        assert!(matches!(stream.send_text("x"), Err(TransportError::Stream(_))));
        assert_eq!(stream.recv().await, None);
        assert!(!peer.emit_text("late"));
    }
}
