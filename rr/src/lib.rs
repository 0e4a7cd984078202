//! RecordReader - flat delimited record reader
//!
//! Splits plain text into an ordered batch of records, one record per line,
//! fields separated by a single delimiter. Each record is aligned against a
//! fixed field schema: missing trailing fields become empty strings and extra
//! fields are dropped, both noted as a soft schema mismatch.
//!
//! There is no quoting or escaping. A field that contains the delimiter shifts
//! every later field of that line.
//!
//! # Example
//!
//! ```ignore
//! use recordreader::{Profile, RecordReader};
//!
//! let reader = RecordReader::new(Profile::Address.schema());
//! let batch = reader.read_str("Jacob,Tingen Law,123 Main St,VA,Richmond,23226,US,8045551234,j@x.com\n");
//! assert_eq!(batch.len(), 1);
//! assert_eq!(batch.records()[0].get("city"), Some("Richmond"));
//! ```

pub mod error;
mod reader;
mod record;
mod schema;

pub use error::{ReadError, SchemaError};
pub use reader::{RecordReader, split_line};
pub use record::{Batch, Field, Record, SchemaMismatch};
pub use schema::{ADDRESS_FIELDS, FieldSchema, FieldSpec, Profile};

/// Default field delimiter
pub const DEFAULT_DELIMITER: char = ',';
