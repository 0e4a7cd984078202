//! Run report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The target explicitly refused the interaction
    TargetRejected,
    /// A step was not acknowledged within the step timeout
    TargetTimeout,
    /// The expected interaction surface was absent
    TargetUnreachable,
    /// A required field was empty after alignment
    MissingRequiredField,
    /// The target implementation panicked mid-record
    Panicked,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TargetRejected => "TargetRejected",
            Self::TargetTimeout => "TargetTimeout",
            Self::TargetUnreachable => "TargetUnreachable",
            Self::MissingRequiredField => "MissingRequiredField",
            Self::Panicked => "Panicked",
        };
        f.write_str(s)
    }
}

/// A record's failure: kind plus human-readable detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

impl Failure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

/// Terminal state of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Applied,
    Failed { kind: FailureKind, reason: String },
    NotAttempted,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Failure kind, if the record failed
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Self::Failed {
            kind: failure.kind,
            reason: failure.reason,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Failed { kind, .. } => write!(f, "failed ({})", kind),
            Self::NotAttempted => write!(f, "not attempted"),
        }
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Position in the batch
    pub index: usize,

    /// Source line number
    pub line: usize,

    pub outcome: Outcome,

    /// Soft schema mismatch noted while the record was still attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Time spent in the record's interaction, excluding the settle delay
    pub duration_ms: u64,
}

/// Ordered outcome ledger for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The run was stopped before every record was attempted
    pub cancelled: bool,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn applied(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failed()).count()
    }

    pub fn not_attempted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == Outcome::NotAttempted)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.entries.iter().filter(|e| e.warning.is_some()).count()
    }

    /// Every record applied and the run ran to completion
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.entries.iter().all(|e| e.outcome.is_applied())
    }

    /// Outcomes in batch order
    pub fn outcomes(&self) -> Vec<&Outcome> {
        self.entries.iter().map(|e| &e.outcome).collect()
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} records: {} applied, {} failed",
            self.len(),
            self.applied(),
            self.failed()
        );
        if self.cancelled {
            summary.push_str(&format!(", {} not attempted (cancelled)", self.not_attempted()));
        }
        summary
    }
}
