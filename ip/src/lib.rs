//! ImportPacer - sequential rate-limited record importer
//!
//! ImportPacer replays a batch of delimited records into an external system
//! that can only accept one change at a time: a settings page, a form, a
//! single-writer store. Every record becomes the same small protocol of
//! steps, records run strictly in order, and a settle delay separates each
//! pair of records so the target can finish updating before the next one.
//!
//! # Core Concepts
//!
//! - **One at a time**: the target is borrowed mutably for the whole run
//! - **Paced**: a fixed settle delay between every pair of records
//! - **Isolated**: a failing or panicking record becomes a report entry
//! - **Accounted**: the run report has exactly one entry per record
//!
//! # Modules
//!
//! - [`executor`] - Batch driver, record adapter, run report
//! - [`target`] - Target trait plus memory, store and form targets
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod target;

// Re-export commonly used types
pub use config::{Config, TargetConfig};
pub use error::ConfigError;
pub use executor::{
    CancelToken, Executor, ExecutorConfig, Failure, FailureKind, Outcome, ProgressEvent, RecordAdapter, ReportEntry,
    RunReport, progress_channel,
};
pub use target::{FormTarget, MemoryTarget, Step, StoreFormat, StoreTarget, Target, TargetError, build_target};

pub use recordreader::{Batch, FieldSchema, Profile, Record, RecordReader};
