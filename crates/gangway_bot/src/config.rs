//! Bot configuration.

use derive_getters::Getters;
use gangway_error::{ConfigError, GangwayResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use typed_builder::TypedBuilder;

/// Configuration for the bot process.
///
/// Secrets (store API key, chat token, beta bearer tokens) come from the
/// environment, not from this file.
#[derive(Debug, Clone, Serialize, Deserialize, Getters, TypedBuilder)]
pub struct BotConfig {
    /// Record store configuration
    #[builder(setter(into))]
    store: StoreConfig,
    /// Beta-distribution API configuration
    #[serde(default)]
    #[builder(default)]
    beta: BetaConfig,
    /// How often the cache services re-validate against the store (minutes)
    #[serde(default = "default_refresh_interval_minutes")]
    #[builder(default = default_refresh_interval_minutes())]
    refresh_interval_minutes: u64,
    /// Minimum gap between registration-prompt DMs to one tester (minutes)
    #[serde(default = "default_registration_throttle_minutes")]
    #[builder(default = default_registration_throttle_minutes())]
    registration_throttle_minutes: u64,
}

impl BotConfig {
    /// Load bot configuration from a TOML file.
    #[tracing::instrument(skip(path))]
    pub fn from_file(path: impl AsRef<Path>) -> GangwayResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)).into())
    }
}

/// Record store endpoints and base.
#[derive(Debug, Clone, Serialize, Deserialize, Getters, TypedBuilder)]
pub struct StoreConfig {
    /// REST endpoint
    #[serde(default = "default_store_api_url")]
    #[builder(default = default_store_api_url(), setter(into))]
    api_url: String,
    /// Web UI endpoint, for record deep links
    #[serde(default = "default_store_web_url")]
    #[builder(default = default_store_web_url(), setter(into))]
    web_url: String,
    /// Base holding the pipeline's tables
    #[builder(setter(into))]
    base_id: String,
}

/// Beta-distribution API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Getters, TypedBuilder)]
pub struct BetaConfig {
    /// REST endpoint
    #[serde(default = "default_beta_api_url")]
    #[builder(default = default_beta_api_url(), setter(into))]
    api_url: String,
}

impl Default for BetaConfig {
    fn default() -> Self {
        Self {
            api_url: default_beta_api_url(),
        }
    }
}

fn default_refresh_interval_minutes() -> u64 {
    30
}

fn default_registration_throttle_minutes() -> u64 {
    30
}

fn default_store_api_url() -> String {
    "https://api.airtable.com/v0".to_string()
}

fn default_store_web_url() -> String {
    "https://airtable.com".to_string()
}

fn default_beta_api_url() -> String {
    gangway_beta::DEFAULT_BETA_API_URL.to_string()
}
