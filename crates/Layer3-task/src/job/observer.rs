//! Job observers - status delivery
//!
//! Two interchangeable ways to follow a job after submission:
//! - [`PollingObserver`]: `GET /status/{id}` at a fixed interval
//! - [`PushObserver`]: `/ws/status/{id}` duplex stream, one update per frame
//!
//! Either way the observer returns only once the tracker is terminal, and the
//! timer or stream is released on return (or when the future is dropped).

use super::state::{JobSnapshot, JobTracker, JobUpdate, Transition};
use async_trait::async_trait;
use codexec_account::CredentialReader;
use codexec_foundation::Error;
use codexec_transport::{path_segment, HttpTransport, RequestOptions, StreamConnector, StreamEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Status delivery mechanism
#[async_trait]
pub trait JobObserver: Send + Sync {
    /// Observer name (for logs)
    fn name(&self) -> &'static str;

    /// Follow the job until the tracker is terminal, publishing every change
    async fn observe(&self, tracker: &mut JobTracker, updates: &watch::Sender<JobSnapshot>);
}

fn publish(tracker: &JobTracker, updates: &watch::Sender<JobSnapshot>, transition: Transition) {
    if transition != Transition::Ignored {
        updates.send_replace(tracker.snapshot());
    }
}

// ============================================================================
// Polling
// ============================================================================

/// Fixed-interval status polling
pub struct PollingObserver {
    transport: HttpTransport,
    credentials: CredentialReader,
    interval: Duration,
}

impl PollingObserver {
    pub fn new(transport: HttpTransport, credentials: CredentialReader, interval: Duration) -> Self {
        Self {
            transport,
            credentials,
            interval,
        }
    }
}

#[async_trait]
impl JobObserver for PollingObserver {
    fn name(&self) -> &'static str {
        "poll"
    }

    async fn observe(&self, tracker: &mut JobTracker, updates: &watch::Sender<JobSnapshot>) {
        let endpoint = format!("/status/{}", path_segment(tracker.id().as_str()));

        while !tracker.is_terminal() {
            tokio::time::sleep(self.interval).await;

            let options = RequestOptions::get().bearer(self.credentials.current().as_ref());
            let transition = match self.transport.request_json::<JobUpdate>(&endpoint, options).await {
                Ok(update) => {
                    debug!("Job {} status: {:?}", tracker.id(), update.status);
                    tracker.apply(update)
                }
                Err(e) => {
                    // 폴링 실패는 재시도 없이 종료
                    let err = Error::from(e);
                    warn!("Polling job {} failed: {}", tracker.id(), err);
                    tracker.fail(format!("Error fetching status: {}", err.user_message()))
                }
            };
            publish(tracker, updates, transition);
        }

        info!("Job {} finished: {}", tracker.id(), tracker.phase());
    }
}

// ============================================================================
// Push
// ============================================================================

/// Status updates pushed over a duplex stream
pub struct PushObserver {
    connector: Arc<dyn StreamConnector>,
}

impl PushObserver {
    pub fn new(connector: Arc<dyn StreamConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl JobObserver for PushObserver {
    fn name(&self) -> &'static str {
        "push"
    }

    async fn observe(&self, tracker: &mut JobTracker, updates: &watch::Sender<JobSnapshot>) {
        let endpoint = format!("/ws/status/{}", path_segment(tracker.id().as_str()));

        let mut stream = match self.connector.open(&endpoint).await {
            Ok(stream) => stream,
            Err(e) => {
                let err = Error::from(e);
                warn!("Could not open status stream for job {}: {}", tracker.id(), err);
                let transition = tracker.fail(format!("Status stream unavailable: {}", err.user_message()));
                publish(tracker, updates, transition);
                return;
            }
        };

        while !tracker.is_terminal() {
            let transition = match stream.recv().await {
                Some(StreamEvent::Message(frame)) => match serde_json::from_str::<JobUpdate>(&frame) {
                    Ok(update) => tracker.apply(update),
                    Err(e) => {
                        warn!("Skipping malformed status frame for job {}: {}", tracker.id(), e);
                        continue;
                    }
                },
                Some(StreamEvent::Error(reason)) => {
                    warn!("Status stream for job {} failed: {}", tracker.id(), reason);
                    tracker.fail(format!("Status stream error: {}", reason))
                }
                Some(StreamEvent::Closed) | None => {
                    tracker.fail("Status stream closed before the job finished")
                }
            };
            publish(tracker, updates, transition);
        }

        stream.close();
        info!("Job {} finished: {}", tracker.id(), tracker.phase());
    }
}
