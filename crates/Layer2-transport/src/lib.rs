//! # codexec-transport
//!
//! Transport layer for codexec.
//! Every backend interaction goes through this crate.
//!
//! ## Features
//! - Stateless HTTP client with bearer injection and uniform error decoding
//! - Duplex streams (WebSocket) exposed as ordered event channels
//! - In-memory stream pairs for driving sessions without a socket

pub mod error;
pub mod http;
pub mod stream;

pub use error::TransportError;
pub use http::{path_segment, HttpTransport, RequestBody, RequestOptions};
pub use stream::{
    duplex_pair, DuplexStream, Outbound, StreamConnector, StreamEvent, StreamPeer, WsConnector,
};
