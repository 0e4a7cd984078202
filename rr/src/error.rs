//! Record reader error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors building a field schema
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Field schema must name at least one field")]
    Empty,

    #[error("Field name must not be empty")]
    EmptyFieldName,

    #[error("Duplicate field name in schema: {name}")]
    DuplicateField { name: String },
}

/// Errors reading record input
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read records from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
