//! Failure isolation around each record

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::warn;

use super::report::{Failure, FailureKind, Outcome};

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "target panicked".to_string()
    }
}

/// Run one record's interaction and turn every way it can fail into an outcome
///
/// Errors and panics alike end as `Outcome::Failed`; nothing escapes into the
/// caller's control flow.
pub async fn isolate<F>(index: usize, interaction: F) -> Outcome
where
    F: Future<Output = Result<(), Failure>>,
{
    let failure = match AssertUnwindSafe(interaction).catch_unwind().await {
        Ok(Ok(())) => return Outcome::Applied,
        Ok(Err(failure)) => failure,
        Err(payload) => Failure::new(FailureKind::Panicked, panic_message(payload.as_ref())),
    };

    warn!(index, kind = %failure.kind, reason = %failure.reason, "Record failed");
    failure.into()
}
