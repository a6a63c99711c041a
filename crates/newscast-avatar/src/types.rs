//! Job state machine and platform wire types.

use std::time::Instant;

use serde::Deserialize;
use tracing::debug;

/// Lifecycle of a remote rendering job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Uploading assets and creating the remote task.
    Submitting,
    /// The platform accepted the task.
    Queued,
    /// The platform reports the task in progress.
    Processing,
    Completed,
    Failed,
    /// The wait budget ran out; the remote job's fate is unknown.
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }
}

/// A platform-assigned identifier for an uploaded file.
///
/// Scoped to one render invocation; never reused across jobs.
#[derive(Debug, Clone)]
pub struct RemoteAsset {
    pub id: String,
}

/// One remote rendering job, mutated only by the polling loop.
///
/// Transitions are monotonic: a terminal state is never left, and the only
/// repeated observation recorded is the `Processing` self-loop.
#[derive(Debug, Clone)]
pub struct VideoJob {
    task_id: String,
    state: JobState,
    submitted_at: Instant,
    deadline: Option<Instant>,
    video_url: Option<String>,
    error: Option<String>,
    trace: Vec<JobState>,
}

impl VideoJob {
    pub(crate) fn new(submitted_at: Instant) -> Self {
        Self {
            task_id: String::new(),
            state: JobState::Submitting,
            submitted_at,
            deadline: None,
            video_url: None,
            error: None,
            trace: vec![JobState::Submitting],
        }
    }

    pub(crate) fn set_task_id(&mut self, task_id: String) {
        self.task_id = task_id;
    }

    pub(crate) fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub(crate) fn record_result(&mut self, video_url: String) {
        self.video_url = Some(video_url);
    }

    pub(crate) fn record_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// Wall-clock instant past which polling gives up; set when polling
    /// starts.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Result URL reported by the platform, present once `Completed`.
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    /// Platform error message, present once `Failed`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Every state observed, in order.
    pub fn trace(&self) -> &[JobState] {
        &self.trace
    }

    pub(crate) fn advance(&mut self, next: JobState) {
        debug_assert!(
            !self.state.is_terminal(),
            "no transition leaves a terminal state"
        );
        if next == self.state && next != JobState::Processing {
            return;
        }
        debug!(task_id = %self.task_id, from = ?self.state, to = ?next, "job state transition");
        self.state = next;
        self.trace.push(next);
    }
}

/// KreadoAI response envelope: `code == 0` means success.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadData {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateData {
    pub task_id: String,
}

/// Payload of one status poll.
#[derive(Debug, Deserialize)]
pub struct StatusData {
    pub status: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What one status poll means for the state machine.
#[derive(Debug)]
pub(crate) enum PollOutcome {
    Queued,
    Processing,
    Completed { video_url: String },
    Failed(String),
    /// Unknown status string, or `completed` without a result URL. Treated
    /// as a transport-level hiccup for this attempt and re-polled.
    Unrecognized(String),
}

impl StatusData {
    pub(crate) fn outcome(self) -> PollOutcome {
        match self.status.as_str() {
            "pending" => PollOutcome::Queued,
            "processing" => PollOutcome::Processing,
            "completed" => match self.video_url {
                Some(video_url) => PollOutcome::Completed { video_url },
                None => PollOutcome::Unrecognized("completed without video_url".to_string()),
            },
            "failed" => PollOutcome::Failed(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ),
            other => PollOutcome::Unrecognized(other.to_string()),
        }
    }
}

/// DashScope answers in one shot, no job to poll.
#[derive(Debug, Deserialize)]
pub(crate) struct DashscopeResponse {
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<DashscopeData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DashscopeData {
    pub video_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(!JobState::Queued.is_terminal());
    }

    #[test]
    fn processing_self_loop_is_recorded() {
        let mut job = VideoJob::new(Instant::now());
        job.advance(JobState::Queued);
        job.advance(JobState::Processing);
        job.advance(JobState::Processing);
        job.advance(JobState::Completed);
        assert_eq!(
            job.trace(),
            &[
                JobState::Submitting,
                JobState::Queued,
                JobState::Processing,
                JobState::Processing,
                JobState::Completed,
            ]
        );
    }

    #[test]
    fn repeated_queued_is_not_recorded() {
        let mut job = VideoJob::new(Instant::now());
        job.advance(JobState::Queued);
        job.advance(JobState::Queued);
        assert_eq!(job.trace(), &[JobState::Submitting, JobState::Queued]);
    }

    #[test]
    fn result_and_error_are_recorded() {
        let mut job = VideoJob::new(Instant::now());
        assert!(job.deadline().is_none());
        assert!(job.video_url().is_none());

        job.record_result("https://cdn/v.mp4".to_string());
        job.record_error("boom".to_string());
        assert_eq!(job.video_url(), Some("https://cdn/v.mp4"));
        assert_eq!(job.error(), Some("boom"));
    }

    #[test]
    fn status_outcomes() {
        let status = |s: &str, url: Option<&str>, err: Option<&str>| StatusData {
            status: s.to_string(),
            video_url: url.map(str::to_string),
            error: err.map(str::to_string),
        };

        assert!(matches!(
            status("pending", None, None).outcome(),
            PollOutcome::Queued
        ));
        assert!(matches!(
            status("processing", None, None).outcome(),
            PollOutcome::Processing
        ));
        assert!(matches!(
            status("completed", Some("https://cdn/v.mp4"), None).outcome(),
            PollOutcome::Completed { .. }
        ));
        // completed without a URL is not a success.
        assert!(matches!(
            status("completed", None, None).outcome(),
            PollOutcome::Unrecognized(_)
        ));
        assert!(matches!(
            status("failed", None, Some("render error")).outcome(),
            PollOutcome::Failed(msg) if msg == "render error"
        ));
        assert!(matches!(
            status("exploded", None, None).outcome(),
            PollOutcome::Unrecognized(_)
        ));
    }
}
