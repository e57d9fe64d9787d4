//! Job state machine
//!
//! `Idle → Submitting → Queued → Running → {Completed | Failed}`
//!
//! A [`JobTracker`] exists only once the server has assigned a job id, so no
//! terminal state can be observed before submission succeeded. Once terminal,
//! every further update is ignored.

use codexec_foundation::{JobId, JobStatus};
use serde::{Deserialize, Serialize};

/// Shown when a terminal job produced nothing
pub const NO_OUTPUT: &str = "No output.";

const EXECUTION_FAILED: &str = "Execution failed";

/// Client-side job phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobPhase {
    /// Nothing submitted
    #[default]
    Idle,
    /// Submit request in flight
    Submitting,
    /// Accepted, waiting for a worker
    Queued,
    /// Executing
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error, or observation failed
    Failed,
}

impl JobPhase {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }

    /// Position in the lifecycle; transitions never go backwards
    fn rank(&self) -> u8 {
        match self {
            JobPhase::Idle => 0,
            JobPhase::Submitting => 1,
            JobPhase::Queued => 2,
            JobPhase::Running => 3,
            JobPhase::Completed | JobPhase::Failed => 4,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            JobPhase::Idle => "Idle",
            JobPhase::Submitting => "Submitting",
            JobPhase::Queued => "Queued",
            JobPhase::Running => "Running",
            JobPhase::Completed => "Completed",
            JobPhase::Failed => "Failed",
        }
    }

    /// Get a symbol for the state (for terminal output)
    pub fn symbol(&self) -> &'static str {
        match self {
            JobPhase::Idle => "·",
            JobPhase::Submitting => "↑",
            JobPhase::Queued => "◎",
            JobPhase::Running => "⟳",
            JobPhase::Completed => "✓",
            JobPhase::Failed => "✗",
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl JobPhase {
    /// Phase for a server status keyword; `None` for unrecognized keywords
    pub fn from_status(status: JobStatus) -> Option<Self> {
        match status {
            JobStatus::Submitted | JobStatus::Queued => Some(JobPhase::Queued),
            JobStatus::Running => Some(JobPhase::Running),
            JobStatus::Completed => Some(JobPhase::Completed),
            JobStatus::Error => Some(JobPhase::Failed),
            JobStatus::Unknown => None,
        }
    }
}

// ============================================================================
// Update
// ============================================================================

/// One status update, from a poll response or a push frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub output: Option<String>,
    /// Explicit error; terminal even without a terminal status
    #[serde(default)]
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// `POST /submit` reply. Only the id is required; a missing status means queued.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitAck {
    pub id: JobId,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub output: Option<String>,
}

/// Result of applying an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved to a later non-terminal phase
    Advanced,
    /// Same phase, or nothing recognizable in the update
    Unchanged,
    /// Reached a terminal phase
    Terminal,
    /// Already terminal, or the update would move backwards
    Ignored,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Published view of a job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: Option<JobId>,
    pub phase: JobPhase,
    /// Only set once terminal
    pub output: Option<String>,
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn submitting() -> Self {
        Self {
            phase: JobPhase::Submitting,
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Output for display: program output, or a placeholder
    pub fn display_output(&self) -> &str {
        match self.output.as_deref() {
            Some(output) if !output.is_empty() => output,
            _ => NO_OUTPUT,
        }
    }

    /// Human-readable failure, if the job failed
    pub fn failure_message(&self) -> Option<&str> {
        if self.phase != JobPhase::Failed {
            return None;
        }
        Some(
            self.error
                .as_deref()
                .or(self.output.as_deref())
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(EXECUTION_FAILED),
        )
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Per-job state machine
#[derive(Debug, Clone)]
pub struct JobTracker {
    id: JobId,
    phase: JobPhase,
    output: Option<String>,
    error: Option<String>,
}

impl JobTracker {
    /// Start tracking a job the server just accepted
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            phase: JobPhase::Queued,
            output: None,
            error: None,
        }
    }

    /// Tracker seeded with the submit reply
    pub fn accepted(ack: SubmitAck) -> Self {
        let mut tracker = Self::new(ack.id);
        tracker.apply(JobUpdate {
            status: ack.status,
            output: ack.output,
            error: None,
        });
        tracker
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Apply one update
    pub fn apply(&mut self, update: JobUpdate) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }

        if let Some(error) = update.error {
            let message = if error.trim().is_empty() {
                EXECUTION_FAILED.to_string()
            } else {
                error
            };
            self.phase = JobPhase::Failed;
            self.output = update.output;
            self.error = Some(message);
            return Transition::Terminal;
        }

        let Some(next) = update.status.and_then(JobPhase::from_status) else {
            return Transition::Unchanged;
        };

        if next.rank() < self.phase.rank() {
            return Transition::Ignored;
        }
        if next == self.phase {
            return Transition::Unchanged;
        }

        self.phase = next;
        if next.is_terminal() {
            self.output = update.output;
            Transition::Terminal
        } else {
            Transition::Advanced
        }
    }

    /// Mark the job failed (observation error). No-op once terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }
        self.phase = JobPhase::Failed;
        self.error = Some(message.into());
        Transition::Terminal
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: Some(self.id.clone()),
            phase: self.phase,
            output: self.output.clone(),
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> JobTracker {
        JobTracker::new(JobId::new("job-1"))
    }

    #[test]
    fn test_happy_path() {
        let mut t = tracker();
        assert_eq!(t.phase(), JobPhase::Queued);
        assert_eq!(t.apply(JobUpdate::status(JobStatus::Running)), Transition::Advanced);
        assert_eq!(
            t.apply(JobUpdate::status(JobStatus::Completed).with_output("1\n")),
            Transition::Terminal
        );

        let snap = t.snapshot();
        assert_eq!(snap.phase, JobPhase::Completed);
        assert_eq!(snap.output.as_deref(), Some("1\n"));
        assert_eq!(snap.id, Some(JobId::new("job-1")));
    }

    #[test]
    fn test_terminal_is_idempotent() {
        let mut t = tracker();
        t.apply(JobUpdate::status(JobStatus::Completed).with_output("ok"));

        assert_eq!(
            t.apply(JobUpdate::status(JobStatus::Error).with_output("late")),
            Transition::Ignored
        );
        assert_eq!(t.apply(JobUpdate::status(JobStatus::Running)), Transition::Ignored);
        assert_eq!(t.fail("stream dropped"), Transition::Ignored);

        let snap = t.snapshot();
        assert_eq!(snap.phase, JobPhase::Completed);
        assert_eq!(snap.output.as_deref(), Some("ok"));
        assert_eq!(snap.error, None);
    }

    #[test]
    fn test_no_regression() {
        let mut t = tracker();
        t.apply(JobUpdate::status(JobStatus::Running));
        assert_eq!(t.apply(JobUpdate::status(JobStatus::Queued)), Transition::Ignored);
        assert_eq!(t.apply(JobUpdate::status(JobStatus::Running)), Transition::Unchanged);
        assert_eq!(t.phase(), JobPhase::Running);
    }

    #[test]
    fn test_output_ignored_before_terminal() {
        let mut t = tracker();
        t.apply(JobUpdate::status(JobStatus::Running).with_output("partial"));
        assert_eq!(t.snapshot().output, None);
    }

    #[test]
    fn test_error_field_is_terminal() {
        let mut t = tracker();
        let update = JobUpdate {
            error: Some("Container crashed".into()),
            ..JobUpdate::default()
        };
        assert_eq!(t.apply(update), Transition::Terminal);

        let snap = t.snapshot();
        assert_eq!(snap.phase, JobPhase::Failed);
        assert_eq!(snap.failure_message(), Some("Container crashed"));
    }

    #[test]
    fn test_unknown_status_is_unchanged() {
        let mut t = tracker();
        assert_eq!(t.apply(JobUpdate::status(JobStatus::Unknown)), Transition::Unchanged);
        assert_eq!(t.apply(JobUpdate::default()), Transition::Unchanged);
        assert_eq!(t.phase(), JobPhase::Queued);
    }

    #[test]
    fn test_error_status_keeps_output_as_message() {
        let mut t = tracker();
        t.apply(JobUpdate::status(JobStatus::Error).with_output("SyntaxError: invalid syntax"));
        let snap = t.snapshot();
        assert_eq!(snap.failure_message(), Some("SyntaxError: invalid syntax"));
        assert_eq!(snap.display_output(), "SyntaxError: invalid syntax");
    }

    #[test]
    fn test_display_output_placeholder() {
        let mut t = tracker();
        t.apply(JobUpdate::status(JobStatus::Completed));
        assert_eq!(t.snapshot().display_output(), NO_OUTPUT);
        assert_eq!(t.snapshot().failure_message(), None);
    }

    #[test]
    fn test_update_decoding() {
        let update: JobUpdate =
            serde_json::from_str(r#"{"status": "completed", "output": "ok"}"#).unwrap();
        assert_eq!(update, JobUpdate::status(JobStatus::Completed).with_output("ok"));

        let update: JobUpdate = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert_eq!(update.error.as_deref(), Some("boom"));

        assert!(serde_json::from_str::<JobUpdate>("{not json").is_err());
        assert!(serde_json::from_str::<JobUpdate>(r#"{"status": 3}"#).is_err());
    }

    #[test]
    fn test_submit_ack_minimal_and_full() {
        let ack: SubmitAck = serde_json::from_str(r#"{"id": "job-1"}"#).unwrap();
        let t = JobTracker::accepted(ack);
        assert_eq!(t.id(), &JobId::new("job-1"));
        assert_eq!(t.phase(), JobPhase::Queued);

        let ack: SubmitAck = serde_json::from_str(
            r#"{"id": "job-2", "user_id": "ana", "status": "running", "language": "python"}"#,
        )
        .unwrap();
        assert_eq!(JobTracker::accepted(ack).phase(), JobPhase::Running);

        assert!(serde_json::from_str::<SubmitAck>(r#"{"status": "queued"}"#).is_err());
    }
}
