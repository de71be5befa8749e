//! Configuration types for azsearch-migrate.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// The documents endpoint rejects `top` values beyond this.
const MAX_PAGE_SIZE: usize = 1000;

/// Main migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Service and index to read from.
    pub source: ServiceConfig,
    /// Service and index to write to.
    pub target: ServiceConfig,
    /// Migration options.
    #[serde(default)]
    pub options: MigrationOptions,
}

/// One search service plus the index to read from or write to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name; resolves to `https://{name}.search.windows.net`.
    #[serde(default)]
    pub service: Option<String>,
    /// Full endpoint URL; takes precedence over `service`. Useful for
    /// sovereign clouds and local emulators.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Admin API key, sent as the `api-key` header on every request.
    pub api_key: String,
    /// Index name.
    pub index: String,
    /// REST API version appended to every request.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

/// Tuning knobs for a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Documents per search page and per upload batch.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Seconds to wait before the first verification count.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    /// Give up polling the target count after this many seconds.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
    /// Read everything but write nothing; previews schema changes.
    #[serde(default)]
    pub dry_run: bool,
    /// Debug-log the key of every copied document.
    #[serde(default)]
    pub trace_documents: bool,
    /// Keep copying documents when schema transfer fails. Off by default;
    /// the documents land in whatever index the target already has.
    #[serde(default)]
    pub continue_on_schema_error: bool,
}

fn default_api_version() -> String {
    "2020-06-30".to_string()
}

fn default_page_size() -> usize {
    50
}

fn default_settle_secs() -> u64 {
    5
}

fn default_verify_timeout_secs() -> u64 {
    30
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            settle_secs: default_settle_secs(),
            verify_timeout_secs: default_verify_timeout_secs(),
            dry_run: false,
            trace_documents: false,
            continue_on_schema_error: false,
        }
    }
}

impl ServiceConfig {
    /// Resolves the base URL for this service, without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `service` nor `endpoint` is set, or the
    /// endpoint is not an http(s) URL.
    pub fn endpoint_url(&self) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim_end_matches('/');
            if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
                return Err(Error::Config(format!(
                    "invalid endpoint '{endpoint}': expected an http(s) URL"
                )));
            }
            return Ok(trimmed.to_string());
        }
        match self.service.as_deref() {
            Some(name) if !name.is_empty() => Ok(format!("https://{name}.search.windows.net")),
            _ => Err(Error::Config(
                "either 'service' or 'endpoint' must be set".to_string(),
            )),
        }
    }
}

impl MigrationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint cannot be resolved, a key or index
    /// name is empty, the page size is out of range, or source and target
    /// point at the same index.
    pub fn validate(&self) -> Result<()> {
        let source_url = self.source.endpoint_url()?;
        let target_url = self.target.endpoint_url()?;

        for (label, service) in [("source", &self.source), ("target", &self.target)] {
            if service.index.is_empty() {
                return Err(Error::Config(format!("{label} index name cannot be empty")));
            }
            if service.api_key.is_empty() {
                return Err(Error::Config(format!("{label} api_key cannot be empty")));
            }
            if service.api_version.is_empty() {
                return Err(Error::Config(format!("{label} api_version cannot be empty")));
            }
        }

        if self.options.page_size == 0 || self.options.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        // The target index is deleted before it is recreated.
        if source_url == target_url && self.source.index == self.target.index {
            return Err(Error::Config(
                "source and target are the same index; the migration would delete its own source"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
