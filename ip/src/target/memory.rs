//! In-memory settings store

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use recordreader::Field;
use tracing::debug;

use super::{Step, Target, TargetError};

/// Failure to inject into one entry, keyed by its open-entry ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Refuse the commit
    Reject,
    /// Never acknowledge the commit
    Stall,
    /// Report the entry surface as missing on open
    Unreachable,
    /// Panic during commit
    Panic,
}

/// A performed step with its timing
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Which entry (counted by open-entry calls, from 0) the step belongs to
    pub ordinal: usize,
    pub step: Step,
    pub started: Instant,
    /// None when the step was never acknowledged
    pub finished: Option<Instant>,
}

/// First step start and last acknowledgment of one entry
#[derive(Debug, Clone, Copy)]
pub struct EntrySpan {
    pub ordinal: usize,
    pub first_started: Instant,
    pub last_finished: Option<Instant>,
}

/// Keeps committed entries in memory and logs every step
///
/// Commits always append, so replaying a batch stores every entry twice.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    draft: Option<Vec<Field>>,
    entries: Vec<Vec<Field>>,
    steps: Vec<StepRecord>,
    faults: HashMap<usize, Fault>,
    ack_latency: Duration,
    opened: usize,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a fault into the n-th opened entry
    pub fn with_fault(mut self, ordinal: usize, fault: Fault) -> Self {
        self.faults.insert(ordinal, fault);
        self
    }

    /// Delay every acknowledgment, as a UI finishing an update would
    pub fn with_ack_latency(mut self, latency: Duration) -> Self {
        self.ack_latency = latency;
        self
    }

    /// Committed entries in commit order
    pub fn entries(&self) -> &[Vec<Field>] {
        &self.entries
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Timing of each opened entry, in open order
    pub fn spans(&self) -> Vec<EntrySpan> {
        let mut spans: Vec<EntrySpan> = Vec::new();
        for record in &self.steps {
            match spans.last_mut() {
                Some(span) if span.ordinal == record.ordinal => {
                    span.last_finished = record.finished;
                }
                _ => spans.push(EntrySpan {
                    ordinal: record.ordinal,
                    first_started: record.started,
                    last_finished: record.finished,
                }),
            }
        }
        spans
    }

    fn current_fault(&self) -> Option<Fault> {
        let ordinal = self.opened.checked_sub(1)?;
        self.faults.get(&ordinal).copied()
    }

    async fn apply_step(&mut self, ordinal: usize, step: &Step) -> Result<(), TargetError> {
        match step {
            Step::OpenEntry => {
                if self.current_fault() == Some(Fault::Unreachable) {
                    return Err(TargetError::Unreachable {
                        surface: "entry".to_string(),
                        reason: "entry surface not present".to_string(),
                    });
                }
                if self.draft.replace(Vec::new()).is_some() {
                    debug!(ordinal, "MemoryTarget: discarding unfinished draft");
                }
            }
            Step::SetField { name, value } => {
                let Some(draft) = self.draft.as_mut() else {
                    return Err(TargetError::OutOfOrder {
                        step: step.to_string(),
                        reason: "no entry open".to_string(),
                    });
                };
                draft.push(Field {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
            Step::Commit => {
                match self.current_fault() {
                    Some(Fault::Reject) => {
                        self.draft = None;
                        return Err(TargetError::Rejected {
                            step: step.to_string(),
                            reason: "entry refused".to_string(),
                        });
                    }
                    Some(Fault::Stall) => std::future::pending::<()>().await,
                    Some(Fault::Panic) => panic!("memory target fault at entry {}", ordinal),
                    _ => {}
                }
                let Some(draft) = self.draft.take() else {
                    return Err(TargetError::OutOfOrder {
                        step: step.to_string(),
                        reason: "no entry open".to_string(),
                    });
                };
                self.entries.push(draft);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Target for MemoryTarget {
    fn name(&self) -> &str {
        "memory"
    }

    async fn perform(&mut self, step: &Step) -> Result<(), TargetError> {
        if matches!(step, Step::OpenEntry) {
            self.opened += 1;
        }
        let ordinal = self.opened.saturating_sub(1);
        debug!(ordinal, %step, "MemoryTarget::perform: called");

        let position = self.steps.len();
        self.steps.push(StepRecord {
            ordinal,
            step: step.clone(),
            started: Instant::now(),
            finished: None,
        });

        let result = self.apply_step(ordinal, step).await;

        if !self.ack_latency.is_zero() {
            tokio::time::sleep(self.ack_latency).await;
        }
        self.steps[position].finished = Some(Instant::now());
        result
    }
}
