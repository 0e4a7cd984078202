//! File-backed settings store
//!
//! Each committed entry becomes one JSON line appended to the store file.
//! The `autofill` format shapes entries like a browser autofill address.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use recordreader::Field;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Step, Target, TargetError};

/// Shape of the stored JSON documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Field names as keys, values as strings
    #[default]
    Plain,
    /// Autofill address entry built from the address profile fields
    Autofill,
}

impl std::str::FromStr for StoreFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "autofill" => Ok(Self::Autofill),
            _ => Err(format!("Unknown store format: {}", s)),
        }
    }
}

/// Autofill address entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillAddress {
    pub full_names: Vec<String>,
    pub company_name: String,
    pub address_lines: String,
    /// State or province
    pub address_level1: String,
    /// City
    pub address_level2: String,
    pub postal_code: String,
    pub country_code: String,
    pub phone_numbers: Vec<String>,
    pub email_addresses: Vec<String>,
}

impl AutofillAddress {
    /// Map address profile fields; unknown fields are ignored
    pub fn from_fields(fields: &[Field]) -> Self {
        let get = |name: &str| {
            fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.value.clone())
                .unwrap_or_default()
        };
        Self {
            full_names: vec![get("name")],
            company_name: get("company"),
            address_lines: get("address"),
            address_level1: get("state"),
            address_level2: get("city"),
            postal_code: get("postal"),
            country_code: get("country"),
            phone_numbers: vec![get("phone")],
            email_addresses: vec![get("email")],
        }
    }
}

/// Appends committed entries to a JSON-lines file
pub struct StoreTarget {
    path: PathBuf,
    format: StoreFormat,
    draft: Option<Vec<Field>>,
}

impl StoreTarget {
    pub fn new(path: PathBuf, format: StoreFormat) -> Self {
        debug!(path = %path.display(), ?format, "StoreTarget::new: called");
        Self {
            path,
            format,
            draft: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&self, fields: &[Field]) -> Result<Value, TargetError> {
        let doc = match self.format {
            StoreFormat::Plain => {
                let map: Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.name.clone(), Value::String(f.value.clone())))
                    .collect();
                Value::Object(map)
            }
            StoreFormat::Autofill => serde_json::to_value(AutofillAddress::from_fields(fields))?,
        };
        Ok(doc)
    }

    fn store_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    async fn store_dir_exists(&self) -> bool {
        tokio::fs::metadata(self.store_dir())
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    /// Append one complete line
    ///
    /// The write runs on the blocking pool and is not cancelled when the
    /// commit times out, so a line is never left half written.
    async fn append(&self, doc: &Value) -> Result<(), TargetError> {
        let mut line = serde_json::to_string(doc)?;
        line.push('\n');

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
            file.write_all(line.as_bytes())
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(())
    }
}

#[async_trait]
impl Target for StoreTarget {
    fn name(&self) -> &str {
        "store"
    }

    async fn perform(&mut self, step: &Step) -> Result<(), TargetError> {
        debug!(%step, "StoreTarget::perform: called");
        match step {
            Step::OpenEntry => {
                if !self.store_dir_exists().await {
                    return Err(TargetError::Unreachable {
                        surface: self.path.display().to_string(),
                        reason: format!("store directory {} does not exist", self.store_dir().display()),
                    });
                }
                if self.draft.replace(Vec::new()).is_some() {
                    warn!("StoreTarget: discarding unfinished entry");
                }
                Ok(())
            }
            Step::SetField { name, value } => match self.draft.as_mut() {
                Some(draft) => {
                    draft.push(Field {
                        name: name.clone(),
                        value: value.clone(),
                    });
                    Ok(())
                }
                None => Err(TargetError::OutOfOrder {
                    step: step.to_string(),
                    reason: "no entry open".to_string(),
                }),
            },
            Step::Commit => {
                let draft = self.draft.take().ok_or_else(|| TargetError::OutOfOrder {
                    step: step.to_string(),
                    reason: "no entry open".to_string(),
                })?;
                if draft.iter().all(|f| f.value.is_empty()) {
                    return Err(TargetError::Rejected {
                        step: step.to_string(),
                        reason: "entry has no values".to_string(),
                    });
                }
                let doc = self.document(&draft)?;
                self.append(&doc).await
            }
        }
    }
}
