//! Import targets
//!
//! A target is the external, single-writer system records are replayed into.
//! Every record is delivered as the same sub-protocol:
//!
//! ```text
//! open-entry -> set-field(name, value)* -> commit
//! ```
//!
//! A step's future resolving is the target's acknowledgment. The executor
//! holds the target by `&mut` for the whole run, so two steps can never be in
//! flight at once.

mod error;
mod form;
mod memory;
mod store;

use async_trait::async_trait;
use tracing::debug;

use crate::config::TargetConfig;
use crate::error::ConfigError;

pub use error::TargetError;
pub use form::FormTarget;
pub use memory::{EntrySpan, Fault, MemoryTarget, StepRecord};
pub use store::{AutofillAddress, StoreFormat, StoreTarget};

/// One atomic action against a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Open a fresh entry surface (new-entry dialog, draft record)
    OpenEntry,
    /// Set one field of the open entry
    SetField { name: String, value: String },
    /// Save the open entry
    Commit,
}

impl Step {
    /// Short step name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OpenEntry => "open-entry",
            Self::SetField { .. } => "set-field",
            Self::Commit => "commit",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetField { name, .. } => write!(f, "set-field({})", name),
            other => f.write_str(other.kind()),
        }
    }
}

/// A stateful system that accepts one step at a time
#[async_trait]
pub trait Target: Send {
    /// Target name for logs and reports
    fn name(&self) -> &str;

    /// Perform one step, resolving once the target acknowledges it
    async fn perform(&mut self, step: &Step) -> Result<(), TargetError>;
}

/// Build the target described by configuration
pub fn build_target(config: &TargetConfig) -> Result<Box<dyn Target>, ConfigError> {
    debug!(?config, "build_target: called");
    let target: Box<dyn Target> = match config {
        TargetConfig::Memory => Box::new(MemoryTarget::new()),
        TargetConfig::Store { path, format } => Box::new(StoreTarget::new(path.clone(), *format)),
        TargetConfig::Form { open_url, save_url } => Box::new(FormTarget::new(open_url, save_url)?),
    };
    Ok(target)
}
