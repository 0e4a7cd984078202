//! Configuration error types

use recordreader::SchemaError;
use thiserror::Error;

/// Errors detected before a run starts; these are the only fatal ones
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("step-timeout-ms must be greater than zero")]
    ZeroStepTimeout,

    #[error("Invalid field schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Target '{kind}' requires setting '{setting}'")]
    MissingTargetSetting { kind: &'static str, setting: &'static str },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
