//! Progress events emitted during a run

use tokio::sync::mpsc;
use uuid::Uuid;

use super::report::ReportEntry;

/// Live progress of a run, in the order things happen
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    RunStarted { run_id: Uuid, total: usize },
    RecordStarted { index: usize, line: usize },
    RecordFinished(ReportEntry),
    Settling { delay_ms: u64 },
    Cancelled { remaining: usize },
    RunFinished { applied: usize, failed: usize, not_attempted: usize },
}

impl ProgressEvent {
    /// Event name for logs
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::RecordStarted { .. } => "record_started",
            Self::RecordFinished(_) => "record_finished",
            Self::Settling { .. } => "settling",
            Self::Cancelled { .. } => "cancelled",
            Self::RunFinished { .. } => "run_finished",
        }
    }
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// Create a progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}
