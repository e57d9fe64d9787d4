//! Batch jobs: submission, status tracking, delivery

pub mod controller;
pub mod observer;
pub mod state;

pub use controller::{JobController, JobHandle};
pub use observer::{JobObserver, PollingObserver, PushObserver};
pub use state::{JobPhase, JobSnapshot, JobTracker, JobUpdate, SubmitAck, Transition, NO_OUTPUT};
