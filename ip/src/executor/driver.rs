//! Batch driver: ordered, paced traversal of a batch

use std::time::Instant;

use chrono::Utc;
use recordreader::{Batch, Record};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::target::Target;

use super::adapter::RecordAdapter;
use super::cancel::CancelToken;
use super::config::ExecutorConfig;
use super::isolation::isolate;
use super::progress::{ProgressEvent, ProgressSender};
use super::report::{Outcome, ReportEntry, RunReport};

/// Replays a batch into a target one record at a time
///
/// Records run strictly in batch order. Each record's steps complete (or
/// fail) before the settle delay starts, and the next record starts only once
/// the delay has elapsed. A failed record never stops the run.
pub struct Executor {
    config: ExecutorConfig,
    adapter: RecordAdapter,
    progress: Option<ProgressSender>,
}

impl Executor {
    /// Create an executor; invalid configuration is the only fatal error
    pub fn new(config: ExecutorConfig) -> Result<Self, ConfigError> {
        debug!(?config, "Executor::new: called");
        config.validate()?;
        Ok(Self {
            adapter: RecordAdapter::new(config.step_timeout()),
            config,
            progress: None,
        })
    }

    /// Publish progress events to a channel
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.progress {
            debug!(event_type = event.event_type(), "Executor::emit");
            // No subscriber is fine
            let _ = tx.send(event);
        }
    }

    /// Replay every record of the batch into the target, without cancellation
    pub async fn run(&self, batch: &Batch, target: &mut dyn Target) -> RunReport {
        self.run_with_cancel(batch, target, &CancelToken::new()).await
    }

    /// Replay every record of the batch, stopping between records once `cancel` fires
    ///
    /// Always returns a report with one entry per record. After cancellation,
    /// records that were never started are reported as not attempted. The
    /// token belongs to this run only; a later run takes its own.
    pub async fn run_with_cancel(&self, batch: &Batch, target: &mut dyn Target, cancel: &CancelToken) -> RunReport {
        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        info!(
            %run_id,
            target = target.name(),
            records = batch.len(),
            settle_delay_ms = self.config.settle_delay_ms,
            step_timeout_ms = self.config.step_timeout_ms,
            "Import run starting"
        );
        self.emit(ProgressEvent::RunStarted {
            run_id,
            total: batch.len(),
        });

        let mut entries = Vec::with_capacity(batch.len());
        let mut cancelled = false;

        for record in batch {
            if record.index > 0 && !self.settle(cancel).await {
                cancelled = true;
                break;
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            entries.push(self.process(batch, record, target).await);
        }

        if cancelled {
            let remaining = batch.len() - entries.len();
            warn!(%run_id, remaining, "Import run cancelled");
            self.emit(ProgressEvent::Cancelled { remaining });
            entries.extend(batch.iter().skip(entries.len()).map(|record| ReportEntry {
                index: record.index,
                line: record.line,
                outcome: Outcome::NotAttempted,
                warning: None,
                duration_ms: 0,
            }));
        }

        let report = RunReport {
            run_id,
            target: target.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            cancelled,
            entries,
        };
        info!(%run_id, "Import run finished: {}", report.summary());
        self.emit(ProgressEvent::RunFinished {
            applied: report.applied(),
            failed: report.failed(),
            not_attempted: report.not_attempted(),
        });
        report
    }

    /// Wait out the settle delay; false if cancelled meanwhile
    async fn settle(&self, cancel: &CancelToken) -> bool {
        let delay = self.config.settle_delay();
        self.emit(ProgressEvent::Settling {
            delay_ms: self.config.settle_delay_ms,
        });
        tokio::select! {
            _ = tokio::time::sleep(delay) => !cancel.is_cancelled(),
            _ = cancel.cancelled() => false,
        }
    }

    async fn process(&self, batch: &Batch, record: &Record, target: &mut dyn Target) -> ReportEntry {
        debug!(index = record.index, line = record.line, "Executor::process: called");
        self.emit(ProgressEvent::RecordStarted {
            index: record.index,
            line: record.line,
        });

        let warning = record.mismatch.map(|m| {
            warn!(index = record.index, line = record.line, %m, "Schema mismatch");
            m.to_string()
        });

        let start = Instant::now();
        let outcome = isolate(record.index, self.adapter.apply(target, record, batch.schema())).await;
        let entry = ReportEntry {
            index: record.index,
            line: record.line,
            outcome,
            warning,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        debug!(index = entry.index, outcome = %entry.outcome, "Executor::process: finished");
        self.emit(ProgressEvent::RecordFinished(entry.clone()));
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{FailureKind, progress_channel};
    use crate::target::{Fault, MemoryTarget};
    use recordreader::{Profile, RecordReader};
    use std::time::Duration;

    fn executor(settle_delay_ms: u64, step_timeout_ms: u64) -> Executor {
        Executor::new(ExecutorConfig {
            settle_delay_ms,
            step_timeout_ms,
        })
        .unwrap()
    }

    fn keywords(words: &[&str]) -> Batch {
        RecordReader::new(Profile::Keyword.schema()).read_str(&words.join("\n"))
    }

    #[tokio::test]
    async fn test_report_has_entry_per_record_in_order() {
        let batch = keywords(&["a", "b", "c", "d"]);
        let mut target = MemoryTarget::new();

        let report = executor(0, 1000).run(&batch, &mut target).await;

        let indexes: Vec<_> = report.entries.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
        assert!(report.is_success());

        let stored: Vec<_> = target.entries().iter().map(|e| e[0].value.clone()).collect();
        assert_eq!(stored, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_settle_delay_between_records() {
        let batch = keywords(&["a", "b", "c"]);
        let mut target = MemoryTarget::new().with_ack_latency(Duration::from_millis(5));

        executor(40, 1000).run(&batch, &mut target).await;

        let spans = target.spans();
        assert_eq!(spans.len(), 3);
        for pair in spans.windows(2) {
            let gap = pair[1].first_started - pair[0].last_finished.unwrap();
            assert!(gap >= Duration::from_millis(40), "gap was {:?}", gap);
        }
    }

    #[tokio::test]
    async fn test_steps_never_overlap() {
        let batch = keywords(&["a", "b", "c"]);
        let mut target = MemoryTarget::new().with_ack_latency(Duration::from_millis(2));

        executor(0, 1000).run(&batch, &mut target).await;

        for pair in target.steps().windows(2) {
            assert!(pair[0].finished.unwrap() <= pair[1].started);
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_records() {
        let batch = keywords(&["a", "b", "c"]);
        let mut target = MemoryTarget::new().with_fault(1, Fault::Reject);

        let report = executor(0, 1000).run(&batch, &mut target).await;

        assert!(report.entries[0].outcome.is_applied());
        assert_eq!(report.entries[1].outcome.failure_kind(), Some(FailureKind::TargetRejected));
        assert!(report.entries[2].outcome.is_applied());
        assert_eq!(target.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_settle_delay_honored_after_failure() {
        let batch = keywords(&["a", "b"]);
        let mut target = MemoryTarget::new().with_fault(0, Fault::Reject);

        executor(30, 1000).run(&batch, &mut target).await;

        let spans = target.spans();
        let gap = spans[1].first_started - spans[0].last_finished.unwrap();
        assert!(gap >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_panicking_target_is_isolated() {
        let batch = keywords(&["a", "b"]);
        let mut target = MemoryTarget::new().with_fault(0, Fault::Panic);

        let report = executor(0, 1000).run(&batch, &mut target).await;

        assert_eq!(report.entries[0].outcome.failure_kind(), Some(FailureKind::Panicked));
        assert!(report.entries[1].outcome.is_applied());
    }

    #[tokio::test]
    async fn test_cancel_before_run_attempts_nothing() {
        let batch = keywords(&["a", "b"]);
        let mut target = MemoryTarget::new();
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = executor(0, 1000).run_with_cancel(&batch, &mut target, &cancel).await;

        assert!(report.cancelled);
        assert_eq!(report.len(), 2);
        assert_eq!(report.not_attempted(), 2);
        assert!(target.steps().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_settle_reports_remainder() {
        let batch = keywords(&["a", "b", "c", "d"]);
        let mut target = MemoryTarget::new();
        let (tx, mut rx) = progress_channel();
        let executor = executor(200, 1000).with_progress(tx);
        let cancel = CancelToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let ProgressEvent::RecordFinished(entry) = event {
                    if entry.index == 1 {
                        token.cancel();
                    }
                }
            }
        });

        let started = Instant::now();
        let report = executor.run_with_cancel(&batch, &mut target, &cancel).await;

        assert!(report.cancelled);
        assert_eq!(report.len(), 4);
        assert!(report.entries[0].outcome.is_applied());
        assert!(report.entries[1].outcome.is_applied());
        assert_eq!(report.entries[2].outcome, Outcome::NotAttempted);
        assert_eq!(report.entries[3].outcome, Outcome::NotAttempted);
        assert_eq!(target.entries().len(), 2);
        // One full settle (between 0 and 1), then cancelled mid-settle
        assert!(started.elapsed() < Duration::from_millis(390));
    }

    #[tokio::test]
    async fn test_progress_event_sequence() {
        let batch = keywords(&["a", "b"]);
        let mut target = MemoryTarget::new();
        let (tx, mut rx) = progress_channel();

        executor(0, 1000).with_progress(tx).run(&batch, &mut target).await;

        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type());
        }
        assert_eq!(
            types,
            vec![
                "run_started",
                "record_started",
                "record_finished",
                "settling",
                "record_started",
                "record_finished",
                "run_finished",
            ]
        );
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_warning_not_failure() {
        let batch = RecordReader::new(Profile::Address.schema())
            .read_str("Jacob,Tingen Law,123 Main St,VA,Richmond,23226,US");
        let mut target = MemoryTarget::new();

        let report = executor(0, 1000).run(&batch, &mut target).await;

        assert!(report.entries[0].outcome.is_applied());
        assert!(report.entries[0].warning.as_deref().unwrap().contains("expected 9"));
    }

    #[tokio::test]
    async fn test_cancelled_run_does_not_leak_into_next_run() {
        let batch = keywords(&["a", "b"]);
        let mut target = MemoryTarget::new();
        let executor = executor(0, 1000);
        let cancel = CancelToken::new();
        cancel.cancel();

        let first = executor.run_with_cancel(&batch, &mut target, &cancel).await;
        let second = executor.run(&batch, &mut target).await;

        assert_eq!(first.not_attempted(), 2);
        assert!(!second.cancelled);
        assert!(second.is_success());
        assert_eq!(target.entries().len(), 2);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let result = Executor::new(ExecutorConfig {
            settle_delay_ms: 0,
            step_timeout_ms: 0,
        });
        assert!(matches!(result, Err(ConfigError::ZeroStepTimeout)));
    }
}
