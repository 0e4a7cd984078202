//! Target error types

use thiserror::Error;

use crate::executor::FailureKind;

/// Errors a target signals while performing a step
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Target rejected {step}: {reason}")]
    Rejected { step: String, reason: String },

    #[error("Interaction surface unavailable ({surface}): {reason}")]
    Unreachable { surface: String, reason: String },

    #[error("Step {step} issued out of order: {reason}")]
    OutOfOrder { step: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TargetError {
    /// Report category for this error
    pub fn kind(&self) -> FailureKind {
        match self {
            TargetError::Rejected { .. } => FailureKind::TargetRejected,
            TargetError::OutOfOrder { .. } => FailureKind::TargetRejected,
            TargetError::Json(_) => FailureKind::TargetRejected,
            TargetError::Unreachable { .. } => FailureKind::TargetUnreachable,
            TargetError::Io(_) => FailureKind::TargetUnreachable,
            TargetError::Network(_) => FailureKind::TargetUnreachable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = TargetError::Rejected {
            step: "commit".to_string(),
            reason: "duplicate".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::TargetRejected);

        let err = TargetError::Unreachable {
            surface: "entry form".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::TargetUnreachable);

        let err = TargetError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.kind(), FailureKind::TargetUnreachable);
    }

    #[test]
    fn test_rejected_message() {
        let err = TargetError::Rejected {
            step: "commit".to_string(),
            reason: "keyword already muted".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("commit"));
        assert!(msg.contains("keyword already muted"));
    }
}
