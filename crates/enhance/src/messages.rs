//! Upscaler response envelopes and task-status classification.
//!
//! Both endpoints wrap their payload in `{"data": {...}}`. Status reads
//! are turned into a [`PollOutcome`] so the polling loop branches on a
//! tagged value instead of on error control flow.

use serde::Deserialize;

use crate::state_codes::StateCodeTable;

/// Envelope returned by the task-creation endpoint.
#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    pub data: Option<CreateTaskData>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskData {
    pub task_id: Option<String>,
}

impl CreateTaskResponse {
    /// The task id, if present and non-empty.
    pub fn task_id(self) -> Option<String> {
        self.data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
    }
}

/// Envelope returned by the task-status endpoint.
#[derive(Debug, Deserialize)]
pub struct TaskStatusResponse {
    pub data: Option<TaskStatus>,
}

/// One snapshot of a remote task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskStatus {
    /// Completion percentage (0-100).
    #[serde(default)]
    pub progress: i32,
    /// Provider state code; negative values are failures.
    #[serde(default)]
    pub state: i32,
    /// URL of the enhanced image once available.
    #[serde(default)]
    pub image: Option<String>,
}

/// What the poller should do after one status read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still queued or processing.
    Continuing { progress: u8, state: i32 },
    /// Finished with an enhanced image.
    Succeeded { image_url: String },
    /// The provider reported a failure code.
    Failed { code: i32, reason: String },
}

impl TaskStatus {
    /// Classify this snapshot.
    ///
    /// A snapshot at 100% without an image is still in progress.
    pub fn classify(&self, table: &StateCodeTable) -> PollOutcome {
        if table.is_failure(self.state) {
            return PollOutcome::Failed {
                code: self.state,
                reason: table.message_for(self.state),
            };
        }

        match self.image.as_deref() {
            Some(url) if self.progress >= 100 && !url.is_empty() => PollOutcome::Succeeded {
                image_url: url.to_string(),
            },
            _ => PollOutcome::Continuing {
                progress: self.progress.clamp(0, 100) as u8,
                state: self.state,
            },
        }
    }
}
