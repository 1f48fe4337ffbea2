use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of one run: `Created -> Running -> {Completed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Created,
    Running,
    /// Every worker exited before the caller's token fired.
    Completed,
    /// The caller's token fired first.
    Cancelled,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunStatus::Created => "created",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Cancelled)
    }
}

/// Per-run identity owned by a single scenario runner and handed back in
/// the run's [`RunSummary`](super::RunSummary) once it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    request_id: String,
    start_time: Option<DateTime<Utc>>,
    status: RunStatus,
}

impl RunState {
    #[must_use]
    pub const fn new(request_id: String) -> Self {
        Self {
            request_id,
            start_time: None,
            status: RunStatus::Created,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Set once, when the run leaves `Created`.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    pub(super) fn start(&mut self) {
        self.start_time = Some(Utc::now());
        self.status = RunStatus::Running;
    }

    pub(super) const fn finish(&mut self, status: RunStatus) {
        self.status = status;
    }
}
