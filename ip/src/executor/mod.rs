//! Sequential rate-limited import executor
//!
//! Replays a batch of records into a single-writer target, one record at a
//! time, with a settle delay between records. Built from three layers:
//!
//! - [`Executor`]: ordered traversal, pacing, cancellation, the run report
//! - [`RecordAdapter`]: one record to `open-entry -> set-field* -> commit`
//! - [`isolate`]: turns every error or panic of a record into an outcome

mod adapter;
mod cancel;
mod config;
mod driver;
mod isolation;
mod progress;
mod report;

pub use adapter::RecordAdapter;
pub use cancel::CancelToken;
pub use config::ExecutorConfig;
pub use driver::Executor;
pub use isolation::isolate;
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender, progress_channel};
pub use report::{Failure, FailureKind, Outcome, ReportEntry, RunReport};
