//! Job Controller - submit and follow batch runs

use super::observer::{JobObserver, PollingObserver, PushObserver};
use super::state::{JobSnapshot, JobTracker, SubmitAck};
use codexec_account::CredentialReader;
use codexec_foundation::{ClientConfig, DeliveryMode, Error, JobRecord, Result, SubmitRequest};
use codexec_transport::{HttpTransport, RequestOptions, StreamConnector, WsConnector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Batch execution controller
///
/// Written once against [`JobObserver`]; the delivery mechanism is picked at
/// construction time.
#[derive(Clone)]
pub struct JobController {
    transport: HttpTransport,
    credentials: CredentialReader,
    observer: Arc<dyn JobObserver>,
}

impl JobController {
    pub fn new(
        transport: HttpTransport,
        credentials: CredentialReader,
        observer: Arc<dyn JobObserver>,
    ) -> Self {
        Self {
            transport,
            credentials,
            observer,
        }
    }

    /// Controller that polls `/status/{id}`
    pub fn polling(transport: HttpTransport, credentials: CredentialReader, interval: Duration) -> Self {
        let observer = PollingObserver::new(transport.clone(), credentials.clone(), interval);
        Self::new(transport, credentials, Arc::new(observer))
    }

    /// Controller that listens on `/ws/status/{id}`
    pub fn push(
        transport: HttpTransport,
        credentials: CredentialReader,
        connector: Arc<dyn StreamConnector>,
    ) -> Self {
        Self::new(transport, credentials, Arc::new(PushObserver::new(connector)))
    }

    /// Delivery mechanism chosen by configuration
    pub fn from_config(transport: HttpTransport, credentials: CredentialReader, config: &ClientConfig) -> Self {
        match config.effective_delivery() {
            DeliveryMode::Poll => Self::polling(transport, credentials, config.poll_interval()),
            DeliveryMode::Push => {
                let connector = WsConnector::new(transport.clone()).with_timeout(config.connect_timeout());
                Self::push(transport, credentials, Arc::new(connector))
            }
        }
    }

    pub fn observer_name(&self) -> &'static str {
        self.observer.name()
    }

    /// Submit a job. The returned tracker carries the assigned id.
    pub async fn submit(&self, request: &SubmitRequest) -> Result<JobTracker> {
        let options = RequestOptions::post()
            .json(request)
            .bearer(self.credentials.current().as_ref());

        let ack: SubmitAck = self.transport.request_json("/submit", options).await?;
        if ack.id.as_str().is_empty() {
            return Err(Error::Protocol("Submit response without a job id".to_string()));
        }

        info!("Submitted {} job {}", request.language, ack.id);
        Ok(JobTracker::accepted(ack))
    }

    /// Submit and follow until terminal
    pub async fn run(&self, request: &SubmitRequest) -> Result<JobSnapshot> {
        let (updates, _) = watch::channel(JobSnapshot::idle());
        self.run_with(request, &updates).await
    }

    /// Submit and follow until terminal, publishing every phase through `updates`.
    ///
    /// A failed submission resets `updates` to idle and returns the error.
    pub async fn run_with(
        &self,
        request: &SubmitRequest,
        updates: &watch::Sender<JobSnapshot>,
    ) -> Result<JobSnapshot> {
        updates.send_replace(JobSnapshot::submitting());

        let mut tracker = match self.submit(request).await {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!("Submission failed: {}", e);
                updates.send_replace(JobSnapshot::idle());
                return Err(e);
            }
        };
        updates.send_replace(tracker.snapshot());

        if !tracker.is_terminal() {
            self.observer.observe(&mut tracker, updates).await;
        }
        if !tracker.is_terminal() {
            tracker.fail("Observation ended before the job finished");
            updates.send_replace(tracker.snapshot());
        }

        Ok(tracker.snapshot())
    }

    /// Run on a background task
    pub fn spawn(&self, request: SubmitRequest) -> JobHandle {
        let (tx, rx) = watch::channel(JobSnapshot::idle());
        let controller = self.clone();
        let task = tokio::spawn(async move { controller.run_with(&request, &tx).await });

        JobHandle {
            updates: rx,
            task: Some(task),
        }
    }

    /// Past submissions of the current user
    pub async fn submissions(&self) -> Result<Vec<JobRecord>> {
        let options = RequestOptions::get().bearer(self.credentials.current().as_ref());
        Ok(self
            .transport
            .request("/submissions", options)
            .await?
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for JobController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobController")
            .field("base_url", &self.transport.base_url())
            .field("observer", &self.observer.name())
            .finish()
    }
}

// ============================================================================
// Job Handle
// ============================================================================

/// Handle to a spawned job.
///
/// Dropping the handle abandons the job: observation stops and the timer or
/// stream is released.
pub struct JobHandle {
    updates: watch::Receiver<JobSnapshot>,
    task: Option<JoinHandle<Result<JobSnapshot>>>,
}

impl JobHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> JobSnapshot {
        self.updates.borrow().clone()
    }

    /// Progress observer
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.updates.clone()
    }

    /// Wait for the final snapshot
    pub async fn wait(mut self) -> Result<JobSnapshot> {
        let Some(task) = self.task.take() else {
            return Err(Error::Stream("Job observation was abandoned".to_string()));
        };
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Error::Stream("Job observation was abandoned".to_string())),
            Err(e) => Err(Error::Stream(format!("Job observation failed: {}", e))),
        }
    }

    /// Stop observing. In-flight results are discarded.
    pub fn abandon(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.abandon();
    }
}
