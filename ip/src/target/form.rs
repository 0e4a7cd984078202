//! HTTP form target
//!
//! Drives a web form the way a person would: load the entry page, fill the
//! inputs, press save. Loading the page is `open-entry`; inputs are staged
//! locally; `commit` posts the staged fields as JSON to the save endpoint.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ConfigError;

use super::{Step, Target, TargetError};

/// Submits entries to an HTTP form endpoint
pub struct FormTarget {
    http: Client,
    open_url: Url,
    save_url: Url,
    staged: Option<Map<String, Value>>,
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl FormTarget {
    pub fn new(open_url: &str, save_url: &str) -> Result<Self, ConfigError> {
        Self::with_client(Client::builder().build()?, open_url, save_url)
    }

    /// Use a preconfigured HTTP client (proxies, TLS, cookies)
    pub fn with_client(http: Client, open_url: &str, save_url: &str) -> Result<Self, ConfigError> {
        debug!(%open_url, %save_url, "FormTarget::with_client: called");
        Ok(Self {
            http,
            open_url: parse_url(open_url)?,
            save_url: parse_url(save_url)?,
            staged: None,
        })
    }

    async fn open(&mut self) -> Result<(), TargetError> {
        let unreachable = |reason: String| TargetError::Unreachable {
            surface: self.open_url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(self.open_url.clone())
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unreachable(format!("HTTP {}", status)));
        }

        if self.staged.replace(Map::new()).is_some() {
            warn!("FormTarget: discarding unsaved form");
        }
        Ok(())
    }

    async fn save(&mut self, step: &Step) -> Result<(), TargetError> {
        let staged = self.staged.take().ok_or_else(|| TargetError::OutOfOrder {
            step: step.to_string(),
            reason: "form not open".to_string(),
        })?;

        let response = self
            .http
            .post(self.save_url.clone())
            .json(&staged)
            .send()
            .await
            .map_err(|e| TargetError::Unreachable {
                surface: self.save_url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "FormTarget::save: accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TargetError::Rejected {
            step: step.to_string(),
            reason: format!("HTTP {}: {}", status, body.trim()),
        })
    }
}

#[async_trait]
impl Target for FormTarget {
    fn name(&self) -> &str {
        "form"
    }

    async fn perform(&mut self, step: &Step) -> Result<(), TargetError> {
        debug!(%step, "FormTarget::perform: called");
        match step {
            Step::OpenEntry => self.open().await,
            Step::SetField { name, value } => match self.staged.as_mut() {
                Some(form) => {
                    form.insert(name.clone(), Value::String(value.clone()));
                    Ok(())
                }
                None => Err(TargetError::OutOfOrder {
                    step: step.to_string(),
                    reason: "form not open".to_string(),
                }),
            },
            Step::Commit => self.save(step).await,
        }
    }
}
