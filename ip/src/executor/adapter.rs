//! Per-record adapter: one record in, one sequence of steps out

use std::time::Duration;

use recordreader::{FieldSchema, Record};
use tracing::debug;

use crate::target::{Step, Target};

use super::report::{Failure, FailureKind};

/// Turns a record into its interaction steps and drives them in order
#[derive(Debug, Clone)]
pub struct RecordAdapter {
    step_timeout: Duration,
}

impl RecordAdapter {
    pub fn new(step_timeout: Duration) -> Self {
        Self { step_timeout }
    }

    /// Steps for one record: open, one set per field in schema order, commit
    pub fn plan(record: &Record) -> Vec<Step> {
        let mut steps = Vec::with_capacity(record.fields.len() + 2);
        steps.push(Step::OpenEntry);
        steps.extend(record.fields.iter().map(|f| Step::SetField {
            name: f.name.clone(),
            value: f.value.clone(),
        }));
        steps.push(Step::Commit);
        steps
    }

    /// First required field left empty, if any
    pub fn missing_required<'a>(record: &Record, schema: &'a FieldSchema) -> Option<&'a str> {
        schema
            .fields()
            .iter()
            .filter(|spec| spec.required)
            .find(|spec| record.get(&spec.name).is_none_or(str::is_empty))
            .map(|spec| spec.name.as_str())
    }

    /// Apply one record, stopping at the first step that fails
    pub async fn apply(&self, target: &mut dyn Target, record: &Record, schema: &FieldSchema) -> Result<(), Failure> {
        debug!(index = record.index, "RecordAdapter::apply: called");

        if let Some(name) = Self::missing_required(record, schema) {
            return Err(Failure::new(
                FailureKind::MissingRequiredField,
                format!("required field '{}' is empty", name),
            ));
        }

        for step in Self::plan(record) {
            match tokio::time::timeout(self.step_timeout, target.perform(&step)).await {
                Ok(Ok(())) => debug!(index = record.index, %step, "RecordAdapter::apply: acknowledged"),
                Ok(Err(e)) => return Err(Failure::new(e.kind(), e.to_string())),
                Err(_) => {
                    return Err(Failure::new(
                        FailureKind::TargetTimeout,
                        format!("{} not acknowledged within {}ms", step, self.step_timeout.as_millis()),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Fault, MemoryTarget};
    use recordreader::Profile;

    fn keyword_record(value: &str) -> (Record, FieldSchema) {
        let schema = Profile::Keyword.schema();
        let record = Record::aligned(0, 1, vec![value.to_string()], &schema);
        (record, schema)
    }

    #[test]
    fn test_plan_order() {
        let schema = FieldSchema::parse(&["a", "b"]).unwrap();
        let record = Record::aligned(0, 1, vec!["1".to_string(), "2".to_string()], &schema);

        let kinds: Vec<_> = RecordAdapter::plan(&record).iter().map(|s| s.to_string()).collect();
        assert_eq!(kinds, vec!["open-entry", "set-field(a)", "set-field(b)", "commit"]);
    }

    #[tokio::test]
    async fn test_apply_success() {
        let (record, schema) = keyword_record("spoilers");
        let mut target = MemoryTarget::new();
        let adapter = RecordAdapter::new(Duration::from_secs(1));

        adapter.apply(&mut target, &record, &schema).await.unwrap();
        assert_eq!(target.entries().len(), 1);
        assert_eq!(target.steps().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_required_field_issues_no_steps() {
        let (record, schema) = keyword_record("");
        let mut target = MemoryTarget::new();
        let adapter = RecordAdapter::new(Duration::from_secs(1));

        let failure = adapter.apply(&mut target, &record, &schema).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::MissingRequiredField);
        assert!(failure.reason.contains("keyword"));
        assert!(target.steps().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_maps_to_target_rejected() {
        let (record, schema) = keyword_record("spoilers");
        let mut target = MemoryTarget::new().with_fault(0, Fault::Reject);
        let adapter = RecordAdapter::new(Duration::from_secs(1));

        let failure = adapter.apply(&mut target, &record, &schema).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::TargetRejected);
    }

    #[tokio::test]
    async fn test_stalled_step_times_out() {
        let (record, schema) = keyword_record("spoilers");
        let mut target = MemoryTarget::new().with_fault(0, Fault::Stall);
        let adapter = RecordAdapter::new(Duration::from_millis(50));

        let failure = adapter.apply(&mut target, &record, &schema).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::TargetTimeout);
        assert!(failure.reason.contains("commit"));
    }

    #[tokio::test]
    async fn test_unreachable_stops_before_fields() {
        let (record, schema) = keyword_record("spoilers");
        let mut target = MemoryTarget::new().with_fault(0, Fault::Unreachable);
        let adapter = RecordAdapter::new(Duration::from_secs(1));

        let failure = adapter.apply(&mut target, &record, &schema).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::TargetUnreachable);
        assert_eq!(target.steps().len(), 1);
    }
}
