//! Interactive sessions: handshake, live stream, teardown

pub mod bridge;
pub mod session;

pub use bridge::InteractiveBridge;
pub use session::{CloseReason, InteractiveSession, SessionEvent, SessionState};
