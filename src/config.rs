//! Provider configuration for azurefleet
//!
//! Handles loading configuration from, in increasing precedence:
//! - Default values
//! - A configuration file (`--config`, `AZUREFLEET_CONFIG`,
//!   `./azurefleet.toml` or `~/.azurefleet/config.toml`)
//! - Environment variables

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::client::{DEFAULT_API_VERSION, DEFAULT_ENDPOINT};
use crate::api::ArmFleetsClient;
use crate::model::Sensitive;
use crate::poller::PollPolicy;
use crate::resource::Timeouts;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Azure Resource Manager settings
    pub azure: AzureConfig,

    /// Long-running operation polling
    pub polling: PollPolicy,

    /// Lifecycle timeouts
    pub timeouts: Timeouts,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Azure Resource Manager settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Subscription fleets are created in
    pub subscription_id: String,

    /// Resource Manager endpoint
    pub resource_manager_endpoint: String,

    /// `api-version` of the fleets API
    pub api_version: String,

    /// Bearer token, normally supplied by the host runtime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<Sensitive>,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            subscription_id: String::new(),
            resource_manager_endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,

    /// Output format: `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::find_config_file(config_path) {
            Some(path) => Self::from_file(&path)?,
            None => ProviderConfig::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Rejects settings the poller cannot use.
    pub fn validate(&self) -> Result<()> {
        let polling = &self.polling;
        if !polling.backoff_multiplier.is_finite() || polling.backoff_multiplier < 1.0 {
            bail!(
                "polling.backoff_multiplier must be a finite number of at least 1.0, got {}",
                polling.backoff_multiplier
            );
        }
        if !polling.jitter.is_finite() || !(0.0..=1.0).contains(&polling.jitter) {
            bail!(
                "polling.jitter must be a finite number between 0.0 and 1.0, got {}",
                polling.jitter
            );
        }
        Ok(())
    }

    /// The first configuration file that exists, in precedence order.
    ///
    /// An explicit path is returned even when missing, so that reading it
    /// reports the error.
    fn find_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit_path {
            return Some(path.to_path_buf());
        }

        let mut candidates = Vec::new();
        if let Ok(env_config) = std::env::var("AZUREFLEET_CONFIG") {
            candidates.push(PathBuf::from(env_config));
        }
        candidates.push(PathBuf::from("azurefleet.toml"));
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".azurefleet").join("config.toml"));
        }

        candidates.into_iter().find(|path| path.exists())
    }

    /// Load from a specific file, choosing the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(subscription_id) = std::env::var("AZURE_SUBSCRIPTION_ID") {
            self.azure.subscription_id = subscription_id;
        }

        if let Ok(endpoint) = std::env::var("AZUREFLEET_ENDPOINT") {
            self.azure.resource_manager_endpoint = endpoint;
        }

        if let Ok(token) = std::env::var("AZURE_ACCESS_TOKEN") {
            self.azure.access_token = Some(Sensitive::new(token));
        }

        if let Ok(level) = std::env::var("AZUREFLEET_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Builds an ARM client from the `azure` section.
    pub fn fleets_client(&self) -> Result<ArmFleetsClient> {
        let mut builder = ArmFleetsClient::builder()
            .endpoint(&self.azure.resource_manager_endpoint)
            .api_version(&self.azure.api_version);
        if let Some(token) = &self.azure.access_token {
            builder = builder.token(token.expose());
        }
        builder.build().context("Failed to build Azure Resource Manager client")
    }
}
