//! Shared test doubles

use async_trait::async_trait;
use codexec_transport::{duplex_pair, DuplexStream, StreamConnector, StreamPeer, TransportError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Connector handing out pre-made in-memory streams, in order
#[derive(Default)]
pub struct PairConnector {
    streams: Mutex<VecDeque<DuplexStream>>,
    opened: Mutex<Vec<String>>,
}

impl PairConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one stream; the returned peer plays the server side
    pub fn offer(&self, label: &str) -> StreamPeer {
        let (stream, peer) = duplex_pair(label);
        self.streams.lock().unwrap().push_back(stream);
        peer
    }

    /// Endpoints requested so far
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamConnector for PairConnector {
    async fn open(&self, endpoint: &str) -> Result<DuplexStream, TransportError> {
        self.opened.lock().unwrap().push(endpoint.to_string());
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Stream("connection refused".to_string()))
    }
}
