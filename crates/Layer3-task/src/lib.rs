//! # codexec-task
//!
//! Execution layer for codexec.
//! Turns code into tracked batch jobs or live interactive sessions.
//!
//! - [`JobController`]: submit, then follow status through a [`JobObserver`]
//!   ([`PollingObserver`] or [`PushObserver`])
//! - [`InteractiveBridge`]: handshake, then attach an [`InteractiveSession`]
//! - [`ModeSelector`]: batch / interactive switching per language

pub mod interactive;
pub mod job;
pub mod mode;

pub use interactive::{CloseReason, InteractiveBridge, InteractiveSession, SessionEvent, SessionState};
pub use job::{
    JobController, JobHandle, JobObserver, JobPhase, JobSnapshot, JobTracker, JobUpdate,
    PollingObserver, PushObserver, SubmitAck, Transition, NO_OUTPUT,
};
pub use mode::{ModeSelector, RunMode};
