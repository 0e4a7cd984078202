//! Record and batch types

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::FieldSchema;

/// A named field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Difference between the schema's field count and a line's value count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMismatch {
    pub expected: usize,
    pub found: usize,
}

impl std::fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.found < self.expected {
            write!(
                f,
                "expected {} fields, found {}; {} trailing fields left empty",
                self.expected,
                self.found,
                self.expected - self.found
            )
        } else {
            write!(
                f,
                "expected {} fields, found {}; {} extra values dropped",
                self.expected,
                self.found,
                self.found - self.expected
            )
        }
    }
}

/// One line's worth of fields, aligned to a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Position in the batch (0-based)
    pub index: usize,

    /// Source line number (1-based)
    pub line: usize,

    /// Field values in schema order
    pub fields: Vec<Field>,

    /// Set when the line did not carry exactly one value per schema field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<SchemaMismatch>,
}

impl Record {
    /// Align raw values to a schema
    ///
    /// Missing trailing values become empty strings, extra values are dropped.
    pub fn aligned(index: usize, line: usize, values: Vec<String>, schema: &FieldSchema) -> Self {
        let found = values.len();
        let mismatch = (found != schema.len()).then_some(SchemaMismatch {
            expected: schema.len(),
            found,
        });
        if let Some(m) = &mismatch {
            debug!(index, line, %m, "Record::aligned: schema mismatch");
        }

        let mut values = values.into_iter();
        let fields = schema
            .names()
            .map(|name| Field {
                name: name.to_string(),
                value: values.next().unwrap_or_default(),
            })
            .collect();

        Self {
            index,
            line,
            fields,
            mismatch,
        }
    }

    /// Value of a field by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.value.as_str())
    }
}

/// The full ordered set of records from one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    schema: FieldSchema,
    records: Vec<Record>,
}

impl Batch {
    /// Build a batch from already-aligned records, renumbering them in order
    pub fn new(schema: FieldSchema, records: Vec<Record>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Record { index, ..record })
            .collect();
        Self { schema, records }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Records whose line did not match the schema's field count
    pub fn mismatched(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.mismatch.is_some())
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
