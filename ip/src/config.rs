//! ImportPacer configuration types and loading

use eyre::{Context, Result};
use recordreader::{FieldSchema, Profile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::executor::ExecutorConfig;
use crate::target::StoreFormat;

/// Main ImportPacer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pacing and step deadline
    #[serde(flatten)]
    pub executor: ExecutorConfig,

    /// Built-in schema used when no explicit field schema is given
    pub profile: Profile,

    /// Explicit ordered field names; `name!` marks a required field
    #[serde(rename = "field-schema", skip_serializing_if = "Option::is_none")]
    pub field_schema: Option<FieldSchema>,

    /// Where records are replayed
    pub target: TargetConfig,
}

impl Config {
    /// Validate configuration before any record is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.executor.validate()?;
        self.target.validate()
    }

    /// Field schema in effect: explicit schema, else the profile's
    pub fn schema(&self) -> FieldSchema {
        self.field_schema.clone().unwrap_or_else(|| self.profile.schema())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .importpacer.yml
        let local_config = PathBuf::from(".importpacer.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/importpacer/importpacer.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("importpacer").join("importpacer.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Target selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetConfig {
    /// In-memory store, nothing leaves the process
    #[default]
    Memory,

    /// JSON-lines settings store file
    Store {
        path: PathBuf,
        #[serde(default)]
        format: StoreFormat,
    },

    /// HTTP form: entry page plus save endpoint
    Form {
        #[serde(rename = "open-url")]
        open_url: String,
        #[serde(rename = "save-url")]
        save_url: String,
    },
}

impl TargetConfig {
    /// Kind name as used in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Store { .. } => "store",
            Self::Form { .. } => "form",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Memory => Ok(()),
            Self::Store { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::MissingTargetSetting {
                        kind: "store",
                        setting: "path",
                    });
                }
                Ok(())
            }
            Self::Form { open_url, save_url } => {
                for (setting, url) in [("open-url", open_url), ("save-url", save_url)] {
                    if url.trim().is_empty() {
                        return Err(ConfigError::MissingTargetSetting { kind: "form", setting });
                    }
                    reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;
                }
                Ok(())
            }
        }
    }
}
